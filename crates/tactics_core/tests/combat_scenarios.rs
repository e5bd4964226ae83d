//! End-to-end combat scenarios through the public simulation surface.

use tactics_core::combat::{AttackOutcome, CombatRules};
use tactics_core::config::SimConfig;
use tactics_core::hex::{HexCoord, HexDirection};
use tactics_core::math::Fixed;
use tactics_core::simulation::{BattleOutcome, SimEvent, Simulation, UnitCommand};
use tactics_core::unit::{UnitId, UnitSpawn};
use tactics_test_utils::fixtures::{board_with, duel, guard, headless_config, raider, SpawnExt};

fn sim_with(spawns: Vec<UnitSpawn>, config: SimConfig) -> (Simulation, Vec<UnitId>) {
    let (board, ids) = board_with(10, 10, spawns);
    (Simulation::with_board(board, config, 0).unwrap(), ids)
}

fn attacked(events: &[SimEvent]) -> &AttackOutcome {
    match events.first() {
        Some(SimEvent::Attacked(outcome)) => outcome,
        other => panic!("expected an attack, got {other:?}"),
    }
}

#[test]
fn backstab_against_heavy_defense_deals_nothing() {
    // Attacker south of the defender strikes north; the defender faces north.
    let (mut sim, ids) = sim_with(
        vec![
            guard(2, 2).with_stats(4, 0),
            raider(2, 3).facing(HexDirection::North).with_stats(0, 10),
        ],
        headless_config(),
    );

    let events = sim.issue(ids[0], UnitCommand::AttackTo(HexCoord::new(2, 3))).unwrap();
    let outcome = attacked(&events);
    assert_eq!(outcome.angle_delta, Fixed::ZERO);
    assert_eq!(outcome.attack, 6);
    assert_eq!(outcome.defense, 10);
    assert_eq!(outcome.damage, 0);

    let defender = sim.unit(ids[1]).unwrap();
    assert_eq!(defender.health.current, defender.health.max);
    assert_eq!(defender.recent_hit_count(), 1);
}

#[test]
fn backstab_against_light_defense_deals_two() {
    let (mut sim, ids) = sim_with(
        vec![
            guard(2, 2).with_stats(4, 0),
            raider(2, 3).facing(HexDirection::North).with_stats(0, 4),
        ],
        headless_config(),
    );

    let events = sim.issue(ids[0], UnitCommand::AttackTo(HexCoord::new(2, 3))).unwrap();
    assert_eq!(attacked(&events).damage, 2);
    assert_eq!(sim.unit(ids[1]).unwrap().health.current, 8);
}

#[test]
fn preview_shows_breakdown_without_committing() {
    let (sim, guard_id, raider_id) = duel();
    let before = sim.state_hash();

    let preview = sim.preview_attack(guard_id, HexCoord::new(4, 5)).unwrap();
    assert_eq!(preview.defender, raider_id);
    assert_eq!(preview.backstab_bonus, 2);
    assert_eq!(sim.state_hash(), before);
    assert!(preview.to_string().contains("damage=4"));
}

#[test]
fn flanking_allies_shield_the_defender() {
    // Defender on (4,5); attacker comes from the south at (4,4). The flank
    // tiles are the defender's south-east (5,4) and south-west (3,4) cells.
    let base = vec![
        guard(4, 4).with_stats(8, 0),
        raider(4, 5).facing(HexDirection::South).with_stats(0, 2),
    ];

    let (sim, ids) = sim_with(base.clone(), headless_config());
    let alone = sim.preview_attack(ids[0], HexCoord::new(4, 5)).unwrap();
    assert_eq!(alone.flanking_bonus, 0);

    let mut one = base.clone();
    one.push(raider(5, 4));
    let (sim, ids) = sim_with(one, headless_config());
    assert_eq!(sim.preview_attack(ids[0], HexCoord::new(4, 5)).unwrap().flanking_bonus, 1);

    let mut two = base;
    two.push(raider(5, 4));
    two.push(raider(3, 4));
    let (sim, ids) = sim_with(two, headless_config());
    let flanked = sim.preview_attack(ids[0], HexCoord::new(4, 5)).unwrap();
    assert_eq!(flanked.flanking_bonus, 2);
    assert_eq!(flanked.damage, alone.damage - 2);
}

#[test]
fn repeated_hits_wear_down_defense_then_recover() {
    // Three guards surround one heavily armoured raider and take turns.
    let (mut sim, ids) = sim_with(
        vec![
            guard(4, 4).with_stats(5, 0),
            guard(5, 4).with_stats(5, 0),
            guard(3, 4).with_stats(5, 0),
            raider(4, 5)
                .facing(HexDirection::South)
                .with_stats(0, 5)
                .unarmed(),
        ],
        headless_config(),
    );
    let target = HexCoord::new(4, 5);
    let raider_id = ids[3];

    let first = sim.issue(ids[0], UnitCommand::AttackTo(target)).unwrap();
    assert_eq!(attacked(&first).recent_hits_malus, 0);
    let second = sim.issue(ids[1], UnitCommand::AttackTo(target)).unwrap();
    assert_eq!(attacked(&second).recent_hits_malus, 1);
    let third = sim.issue(ids[2], UnitCommand::AttackTo(target)).unwrap();
    assert_eq!(attacked(&third).recent_hits_malus, 2);
    assert_eq!(sim.unit(raider_id).map(|u| u.recent_hit_count()), Some(3));

    // All three hits happened at t=0; a turn later they are gone.
    sim.set_time_scale(Fixed::from_num(10)).unwrap();
    for _ in 0..20 {
        sim.tick();
    }
    let raider = sim.unit(raider_id).expect("unarmed raider should survive");
    assert_eq!(raider.health.current, 7);
    assert_eq!(raider.recent_hit_count(), 0);
}

#[test]
fn defense_floor_changes_damage_against_worn_defenders() {
    let spawns = vec![
        guard(4, 4).with_stats(3, 0),
        guard(5, 4).with_stats(3, 0),
        guard(3, 4).with_stats(3, 0),
        raider(4, 5).facing(HexDirection::South).with_stats(0, 1).with_hp(20),
    ];
    let run = |rules: CombatRules| {
        let (mut sim, ids) = sim_with(spawns.clone(), SimConfig { combat: rules, ..headless_config() });
        let target = HexCoord::new(4, 5);
        sim.issue(ids[0], UnitCommand::AttackTo(target)).unwrap();
        sim.issue(ids[1], UnitCommand::AttackTo(target)).unwrap();
        let third = sim.issue(ids[2], UnitCommand::AttackTo(target)).unwrap();
        attacked(&third).clone()
    };

    // Two recent hits: raw defense 1 - 2 = -1. Flank tiles of (4,5) seen
    // from (4,4) hold guards, not raider allies, so no flanking bonus.
    let raw = run(CombatRules::default());
    assert_eq!(raw.defense, -1);
    assert_eq!(raw.damage, 4);

    let floored = run(CombatRules::default().with_defense_floor(1));
    assert_eq!(floored.defense, 1);
    assert_eq!(floored.damage, 2);
}

#[test]
fn match_ends_in_victory_when_last_hostile_dies() {
    let (mut sim, ids) = sim_with(
        vec![
            guard(4, 4).with_stats(10, 0),
            raider(4, 5).facing(HexDirection::North).with_hp(1),
        ],
        headless_config(),
    );
    assert_eq!(sim.outcome(), BattleOutcome::InProgress);

    let events = sim.issue(ids[0], UnitCommand::AttackTo(HexCoord::new(4, 5))).unwrap();
    assert!(events.iter().any(|e| matches!(e, SimEvent::Died { unit, .. } if *unit == ids[1])));
    assert_eq!(sim.outcome(), BattleOutcome::Victory { survivors: 1 });
}

#[test]
fn agents_close_in_and_fight() {
    let mut config = headless_config();
    config.agent.random_move_percent = 0;
    // Straight down column 2, then a strike at about t=40s.
    let (mut sim, _) = sim_with(
        vec![guard(2, 2).facing(HexDirection::North), raider(2, 7)],
        config,
    );

    let mut saw_attack = false;
    for _ in 0..20 * 120 {
        let events = sim.tick();
        saw_attack |= events
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::Attacked(_)));
        if saw_attack {
            break;
        }
    }
    assert!(saw_attack, "raider never reached the guard");
}

//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the simulation
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! A match must replay exactly from its seed. Sources of non-determinism
//! include:
//!
//! - **Floating-point math**: We use fixed-point arithmetic via
//!   [`tactics_core::math::Fixed`] for time, positions and angles.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Units are always visited in ascending id order.
//!
//! - **System randomness**: The agent controller draws from one seeded
//!   `ChaCha8Rng`; nothing else is random.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual operations (combat, moves, agent choices)
//! 2. **Property tests**: Random boards must still replay identically
//! 3. **Integration tests**: Full autoplay matches are reproducible
//! 4. **Parallel tests**: Running N simulations in parallel all match

use std::thread;

use tactics_core::simulation::Simulation;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for deterministic simulation).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the simulation was deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the simulation produced different hashes across runs.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Simulation is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel simulation runs.
#[derive(Debug, Clone)]
pub struct ParallelSimResult {
    /// Final state hash from each simulation.
    pub hashes: Vec<u64>,
    /// Number of ticks each simulation ran.
    pub ticks: u64,
    /// Number of simulations run.
    pub num_sims: usize,
}

impl ParallelSimResult {
    /// Check if all simulations produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all simulations matched.
    ///
    /// # Panics
    ///
    /// Panics if simulations produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel simulations diverged!\n\
                 Simulations: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_sims,
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a simulation multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run the simulation
/// * `ticks` - Number of ticks to simulate per run
/// * `setup` - Function to create initial simulation state
/// * `step` - Function to advance simulation by one tick
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```
/// use tactics_test_utils::determinism::verify_determinism;
/// use tactics_test_utils::fixtures::skirmish;
///
/// let result = verify_determinism(
///     3,   // Run 3 times
///     100, // 100 ticks each
///     || skirmish(42),
///     |sim| { sim.tick(); },
///     |sim| sim.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Simplified determinism verification for [`Simulation`].
///
/// Runs the simulation twice with identical setup and verifies the final
/// state hashes match exactly.
pub fn verify_simulation_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> Simulation,
{
    let result = verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |sim| {
            sim.tick();
        },
        Simulation::state_hash,
    );
    result.is_deterministic
}

/// Run N simulations on scoped threads and collect final hashes.
///
/// This is useful for catching non-determinism that only manifests
/// under thread scheduling variations, memory layout differences, etc.
///
/// # Panics
///
/// Panics if a simulation thread panics.
pub fn run_parallel_simulations<F>(setup_fn: F, num_sims: usize, num_ticks: u64) -> ParallelSimResult
where
    F: Fn() -> Simulation + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sims)
            .map(|_| {
                s.spawn(|| {
                    let mut sim = setup_fn();
                    for _ in 0..num_ticks {
                        sim.tick();
                    }
                    sim.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("simulation thread panicked"))
            .collect()
    });

    ParallelSimResult {
        hashes,
        ticks: num_ticks,
        num_sims,
    }
}

/// Compare two simulation runs tick-by-tick, finding first divergence.
///
/// Useful for debugging non-determinism by finding exactly when
/// simulations start to differ.
///
/// # Returns
///
/// `None` if simulations are deterministic, `Some(tick)` if they diverge
/// at that tick.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> Simulation,
{
    let mut sim1 = setup_fn();
    let mut sim2 = setup_fn();

    if sim1.state_hash() != sim2.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        sim1.tick();
        sim2.tick();

        if sim1.state_hash() != sim2.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Proptest strategies for boards, units and commands.
pub mod strategies {
    use proptest::prelude::*;
    use tactics_core::hex::{HexCoord, HexDirection};
    use tactics_core::simulation::UnitCommand;
    use tactics_core::unit::{Controller, Faction, UnitSpawn};

    /// Generate a coordinate on a `width` × `height` board.
    pub fn arb_hex_coord(width: i32, height: i32) -> impl Strategy<Value = HexCoord> {
        (0..width, 0..height).prop_map(|(col, row)| HexCoord::new(col, row))
    }

    /// Generate a coordinate anywhere, including negative columns and rows.
    pub fn arb_any_hex_coord() -> impl Strategy<Value = HexCoord> {
        (-500i32..500, -500i32..500).prop_map(|(col, row)| HexCoord::new(col, row))
    }

    /// Generate a facing.
    pub fn arb_direction() -> impl Strategy<Value = HexDirection> {
        (0usize..6).prop_map(HexDirection::from_index)
    }

    /// Generate a faction.
    pub fn arb_faction() -> impl Strategy<Value = Faction> {
        prop_oneof![Just(Faction::Player), Just(Faction::Hostile)]
    }

    /// Generate attack or defense values (0-12).
    pub fn arb_stat() -> impl Strategy<Value = i32> {
        0i32..12
    }

    /// Generate health values (1-20).
    pub fn arb_health() -> impl Strategy<Value = u32> {
        1u32..20
    }

    /// Generate an agent-controlled unit on a `width` × `height` board.
    pub fn arb_agent_spawn(width: i32, height: i32) -> impl Strategy<Value = UnitSpawn> {
        (
            arb_faction(),
            arb_hex_coord(width, height),
            arb_direction(),
            arb_health(),
            arb_stat(),
            arb_stat(),
        )
            .prop_map(|(faction, position, facing, max_hp, attack, defense)| UnitSpawn {
                name: faction.name().to_string(),
                faction,
                controller: Controller::AgentControlled,
                position,
                facing,
                max_hp,
                hp: None,
                attack,
                defense,
                can_move: true,
                can_attack: true,
            })
    }

    /// Generate a list of unit templates. Templates may collide on a tile;
    /// callers skip the ones the board rejects.
    pub fn arb_spawn_list(
        width: i32,
        height: i32,
        max_units: usize,
    ) -> impl Strategy<Value = Vec<UnitSpawn>> {
        proptest::collection::vec(arb_agent_spawn(width, height), 1..max_units)
    }

    /// Generate a player command toward any tile on the board.
    pub fn arb_command(width: i32, height: i32) -> impl Strategy<Value = UnitCommand> {
        prop_oneof![
            arb_hex_coord(width, height).prop_map(UnitCommand::MoveTo),
            arb_hex_coord(width, height).prop_map(UnitCommand::AttackTo),
        ]
    }
}

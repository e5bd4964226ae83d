//! Headless battle runner for scripted play, batch runs and CI verification.
//!
//! This crate drives a [`tactics_core`] simulation without any presentation
//! layer. It enables:
//!
//! - **Scripted play**: an external controller commands player units over
//!   JSON lines, exactly the surface a HUD would use
//! - **Batch runs**: many seeded autoplay battles in parallel, summarized
//! - **CI verification**: replay one seed several times and compare hashes
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (tick, move, attack, preview, etc.)
//! - **stdout**: Events, state and replies (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p tactics_headless -- run --scenario duel
//!
//! # Play a scenario file to the end and print the board
//! cargo run -p tactics_headless -- simulate --scenario crates/tactics_headless/scenarios/skirmish.ron
//!
//! # Verify determinism
//! cargo run -p tactics_headless -- verify --seed 12345 --runs 5
//! ```

pub mod ascii_visualizer;
pub mod batch;
pub mod game_runner;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use ascii_visualizer::{render_board, AsciiConfig};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults, DeterminismReport};
pub use game_runner::{run_game, GameConfig, GameResult};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use scenario::{Scenario, ScenarioError};

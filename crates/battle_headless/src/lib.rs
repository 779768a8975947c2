//! Headless battle runner for scripted playtesting and CI verification.
//!
//! This crate plays [`battle_core`] sessions without graphics. A scripted
//! [`Pilot`] drives the hero, upgrade offers are resolved by preference,
//! and every match is summarized as JSON. This enables:
//!
//! - **Balance checks**: Every hero/pilot pairing over several levels
//! - **CI verification**: Config validation and determinism checks
//!
//! # Example
//!
//! ```bash
//! # One match with the default config
//! cargo run -p battle_headless -- run --hero guanyu --pilot raider
//!
//! # Every pairing, three levels each
//! cargo run -p battle_headless -- batch --levels 3 --output results/
//!
//! # Check a config file
//! cargo run -p battle_headless -- validate assets/data/battle.ron
//! ```

pub mod batch;
pub mod config_loader;
pub mod metrics;
pub mod pilot;
pub mod runner;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use config_loader::{default_config_path, load_config, load_or_default, LoadError};
pub use metrics::{BatchSummary, MatchMetrics, MetricsCollector};
pub use pilot::Pilot;
pub use runner::{run_campaign, run_match, CampaignReport, RunConfig};

//! Fantasy Pipeline
//!
//! Fetches weekly NFL player stats from SportsDataIO, scores them with
//! standard fantasy rules and upserts players, games and player stats into
//! Postgres. Re-running a week overwrites the earlier scores in place.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod persistence;
pub mod pipeline;
pub mod scoring;
pub mod secrets;
pub mod store;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result};
pub use fetcher::{SportsDataIOFetcher, StatSource};
pub use models::*;
pub use persistence::{persist_week, PersistOutcome};
pub use pipeline::FantasyPipeline;
pub use scoring::calculate_fantasy_points;
pub use store::{InMemoryStatStore, PgStatStore, StatStore};

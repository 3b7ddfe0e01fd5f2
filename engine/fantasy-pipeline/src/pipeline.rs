//! One invocation: resolve week/year, fetch, normalize, score, persist.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::fetcher::{SportsDataIOFetcher, StatSource};
use crate::models::*;
use crate::normalizer::normalize_all;
use crate::persistence::persist_week;
use crate::scoring::calculate_fantasy_points;
use crate::store::{PgStatStore, StatStore};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

/// Week used for test-mode invocations that do not name one
const DEFAULT_TEST_WEEK: i32 = 1;

pub struct FantasyPipeline {
    config: PipelineConfig,
    source: Arc<dyn StatSource>,
    store: Arc<dyn StatStore>,
}

impl FantasyPipeline {
    pub fn new(
        config: PipelineConfig,
        source: Arc<dyn StatSource>,
        store: Arc<dyn StatStore>,
    ) -> Self {
        Self { config, source, store }
    }

    /// SportsDataIO source plus a Postgres store that connects on first use
    pub fn from_config(config: PipelineConfig) -> Result<Self> {
        let source = SportsDataIOFetcher::new(&config)?;
        let store = PgStatStore::new(&config.database);
        Ok(Self::new(config, Arc::new(source), Arc::new(store)))
    }

    pub fn store(&self) -> &Arc<dyn StatStore> {
        &self.store
    }

    /// Run the invocation and convert any failure into a structured response
    pub async fn handle(&self, event: &InvocationEvent) -> InvocationResponse {
        match self.run(event).await {
            Ok(summary) => {
                info!("{}", summary.message);
                InvocationResponse::ok(summary)
            }
            Err(e) => {
                error!("Pipeline failed: {}", e);
                InvocationResponse::from_error(&e)
            }
        }
    }

    pub async fn run(&self, event: &InvocationEvent) -> Result<PipelineSummary> {
        let year = event.year.unwrap_or(self.config.sportsdataio.default_season);

        let (week, players, data_source) = match (&event.test_data, event.test_mode) {
            (Some(test_data), true) => {
                let week = event.requested_week().unwrap_or(DEFAULT_TEST_WEEK);
                info!(
                    "Test mode: using {} supplied records for week {} year {}",
                    test_data.len(),
                    week,
                    year
                );
                (week, score_all(test_data.clone()), TEST_DATA_SOURCE.to_string())
            }
            _ => {
                let fetched = self.source.fetch_week(year, event.requested_week()).await?;
                info!(
                    "Retrieved {} player records for week {} year {}",
                    fetched.rows.len(),
                    fetched.week,
                    year
                );

                let records = normalize_all(&fetched.rows, fetched.week, year, self.source.label());
                (fetched.week, score_all(records), self.source.label().to_string())
            }
        };

        if players.is_empty() {
            return Ok(PipelineSummary {
                message: "No players found from API".to_string(),
                week,
                year,
                total_players_found: 0,
                players_persisted: 0,
                data_source,
            });
        }

        let outcome = persist_week(
            self.store.as_ref(),
            week,
            year,
            &players,
            Utc::now().date_naive(),
        )
        .await?;

        Ok(PipelineSummary {
            message: format!(
                "Successfully processed {} players from {}",
                outcome.persisted, data_source
            ),
            week,
            year,
            total_players_found: players.len(),
            players_persisted: outcome.persisted,
            data_source,
        })
    }
}

/// Fill in scores that were not computed upstream
fn score_all(mut records: Vec<PlayerRecord>) -> Vec<PlayerRecord> {
    for record in &mut records {
        if record.stats.fantasy_points.is_none() && record.malformed_fields.is_empty() {
            record.stats.fantasy_points = Some(calculate_fantasy_points(&record.stats.line));
        }
    }
    records
}

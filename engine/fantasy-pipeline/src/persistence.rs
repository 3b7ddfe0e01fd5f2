//! Idempotent storage of one week of player records.

use crate::error::{PipelineError, Result};
use crate::models::PlayerRecord;
use crate::scoring::{calculate_fantasy_points, to_fixed_point};
use crate::store::{StatBatch, StatStore};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

/// A record that was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub index: usize,
    pub name: String,
    pub team: String,
    pub error: String,
}

/// Result of persisting a week
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistOutcome {
    pub game_id: i32,
    pub total: usize,
    pub persisted: usize,
    pub failures: Vec<RecordFailure>,
}

/// Store a week's records.
///
/// The game row is upserted and committed first. Every record is then
/// upserted on its own inside a single batch: a record that fails is logged
/// and skipped, the rest still commit. Schema, game and commit failures are
/// returned to the caller. An empty `players` slice still creates the game.
pub async fn persist_week(
    store: &dyn StatStore,
    week: i32,
    year: i32,
    players: &[PlayerRecord],
    processing_date: NaiveDate,
) -> Result<PersistOutcome> {
    store.ensure_schema().await?;

    let game_id = store.upsert_game(week, year, processing_date).await?;

    let mut batch = store.begin_batch().await?;
    let mut persisted = 0;
    let mut failures = Vec::new();

    for (index, record) in players.iter().enumerate() {
        match persist_record(batch.as_mut(), game_id, record).await {
            Ok(player_id) => {
                debug!("Saved {} ({}) as player {}", record.name, record.team, player_id);
                persisted += 1;
            }
            Err(e) => {
                warn!("Error saving player {} ({}): {}", display_name(record), record.team, e);
                failures.push(RecordFailure {
                    index,
                    name: record.name.clone(),
                    team: record.team.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    batch.commit().await?;

    info!(
        "Persisted {}/{} players for week {} year {} ({} skipped)",
        persisted,
        players.len(),
        week,
        year,
        failures.len()
    );

    Ok(PersistOutcome {
        game_id,
        total: players.len(),
        persisted,
        failures,
    })
}

async fn persist_record(
    batch: &mut dyn StatBatch,
    game_id: i32,
    record: &PlayerRecord,
) -> Result<i32> {
    if !record.malformed_fields.is_empty() {
        return Err(PipelineError::invalid_record(format!(
            "non-numeric values in {}",
            record.malformed_fields.join(", ")
        )));
    }

    let points = record
        .stats
        .fantasy_points
        .unwrap_or_else(|| calculate_fantasy_points(&record.stats.line));

    let fixed = to_fixed_point(points)
        .ok_or_else(|| PipelineError::invalid_record("fantasy points are not a finite number"))?;

    batch.upsert_player_stat(game_id, record, &fixed).await
}

fn display_name(record: &PlayerRecord) -> &str {
    if record.name.is_empty() {
        "Unknown"
    } else {
        &record.name
    }
}

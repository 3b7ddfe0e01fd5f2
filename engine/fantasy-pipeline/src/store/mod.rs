//! Storage backends for players, games and player stats.
//!
//! Three tables:
//!
//! - `players`, unique on `(name, team)`; position is overwritten on conflict
//! - `games`, unique on `(week, year)`; game date is overwritten on conflict
//! - `player_stats`, unique on `(player_id, game_id)` and referencing both;
//!   fantasy points and `updated_at` are overwritten on conflict
//!
//! [`PgStatStore`] is the production backend. [`InMemoryStatStore`] enforces
//! the same keys and column limits without a database.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStatStore;
pub use postgres::PgStatStore;

use crate::error::Result;
use crate::models::PlayerRecord;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Column limits shared by the schema and the in-memory backend
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_TEAM_LEN: usize = 3;
pub const MAX_POSITION_LEN: usize = 5;

/// Largest magnitude a `NUMERIC(5,1)` column holds
pub const MAX_FANTASY_POINTS: f64 = 9999.9;

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StoredGame {
    pub id: i32,
    pub week: i32,
    pub year: i32,
    pub game_date: Option<NaiveDate>,
}

/// A player stat row joined with its player and game
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct StoredPlayerStat {
    pub name: String,
    pub team: String,
    pub position: String,
    pub week: i32,
    pub year: i32,
    pub fantasy_points: BigDecimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub players: i64,
    pub games: i64,
    pub player_stats: i64,
}

/// Durable store for weekly fantasy results
#[async_trait]
pub trait StatStore: Send + Sync {
    /// Create the three tables if they do not exist
    async fn ensure_schema(&self) -> Result<()>;

    /// Insert or refresh the game for `(week, year)` and return its id.
    /// Committed on its own, before any player rows.
    async fn upsert_game(&self, week: i32, year: i32, game_date: NaiveDate) -> Result<i32>;

    /// Open the unit of work that holds a week's player rows
    async fn begin_batch(&self) -> Result<Box<dyn StatBatch>>;

    async fn counts(&self) -> Result<TableCounts>;

    async fn game(&self, week: i32, year: i32) -> Result<Option<StoredGame>>;

    async fn player_stat(
        &self,
        name: &str,
        team: &str,
        week: i32,
        year: i32,
    ) -> Result<Option<StoredPlayerStat>>;
}

/// Player rows for one week, committed together
#[async_trait]
pub trait StatBatch: Send {
    /// Upsert the player and its stat row for `game_id`, returning the player id.
    ///
    /// Either both rows are written or neither; a failure leaves the batch
    /// usable for the next record.
    async fn upsert_player_stat(
        &mut self,
        game_id: i32,
        record: &PlayerRecord,
        fantasy_points: &BigDecimal,
    ) -> Result<i32>;

    async fn commit(self: Box<Self>) -> Result<()>;
}

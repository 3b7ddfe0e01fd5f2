use super::{StatBatch, StatStore, StoredGame, StoredPlayerStat, TableCounts};
use crate::config::DatabaseConfig;
use crate::error::{PipelineError, Result};
use crate::models::PlayerRecord;
use crate::secrets::resolve_connect_options;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnection, PgPoolOptions};
use sqlx::{Connection, PgPool, Postgres, Transaction};
use tokio::sync::OnceCell;
use tracing::info;

/// Idempotent schema, one statement per entry
pub const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS players (
        id SERIAL PRIMARY KEY,
        name VARCHAR(100) NOT NULL,
        team VARCHAR(3) NOT NULL DEFAULT '',
        position VARCHAR(5) NOT NULL DEFAULT '',
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (name, team)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS games (
        id SERIAL PRIMARY KEY,
        week INTEGER NOT NULL,
        year INTEGER NOT NULL,
        game_date DATE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (week, year)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS player_stats (
        id SERIAL PRIMARY KEY,
        player_id INTEGER NOT NULL REFERENCES players(id),
        game_id INTEGER NOT NULL REFERENCES games(id),
        fantasy_points NUMERIC(5,1) NOT NULL DEFAULT 0,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        UNIQUE (player_id, game_id)
    )
    "#,
];

/// Postgres-backed stat store.
///
/// Credentials are resolved and the pool is built on first use, so a run that
/// never persists anything needs no database configuration.
pub struct PgStatStore {
    config: DatabaseConfig,
    pool: OnceCell<PgPool>,
}

impl PgStatStore {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            config: config.clone(),
            pool: OnceCell::new(),
        }
    }

    /// Resolve credentials and open a connection immediately
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let store = Self::new(config);
        store.pool().await?.acquire().await?;
        Ok(store)
    }

    async fn pool(&self) -> Result<&PgPool> {
        self.pool
            .get_or_try_init(|| async {
                let options = resolve_connect_options(&self.config)?;
                let pool = PgPoolOptions::new()
                    .max_connections(self.config.max_connections)
                    .connect_lazy_with(options);
                Ok::<_, PipelineError>(pool)
            })
            .await
    }
}

#[async_trait]
impl StatStore for PgStatStore {
    async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(self.pool().await?).await?;
        }
        Ok(())
    }

    async fn upsert_game(&self, week: i32, year: i32, game_date: NaiveDate) -> Result<i32> {
        let game_id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO games (week, year, game_date)
            VALUES ($1, $2, $3)
            ON CONFLICT (week, year)
            DO UPDATE SET game_date = EXCLUDED.game_date
            RETURNING id
            "#,
        )
        .bind(week)
        .bind(year)
        .bind(game_date)
        .fetch_one(self.pool().await?)
        .await?;

        info!("Upserted game week {} year {} as id {}", week, year, game_id);
        Ok(game_id)
    }

    async fn begin_batch(&self) -> Result<Box<dyn StatBatch>> {
        let tx = self.pool().await?.begin().await?;
        Ok(Box::new(PgStatBatch { tx }))
    }

    async fn counts(&self) -> Result<TableCounts> {
        let (players, games, player_stats): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM players),
                (SELECT COUNT(*) FROM games),
                (SELECT COUNT(*) FROM player_stats)
            "#,
        )
        .fetch_one(self.pool().await?)
        .await?;

        Ok(TableCounts { players, games, player_stats })
    }

    async fn game(&self, week: i32, year: i32) -> Result<Option<StoredGame>> {
        let game = sqlx::query_as::<_, StoredGame>(
            "SELECT id, week, year, game_date FROM games WHERE week = $1 AND year = $2",
        )
        .bind(week)
        .bind(year)
        .fetch_optional(self.pool().await?)
        .await?;
        Ok(game)
    }

    async fn player_stat(
        &self,
        name: &str,
        team: &str,
        week: i32,
        year: i32,
    ) -> Result<Option<StoredPlayerStat>> {
        let stat = sqlx::query_as::<_, StoredPlayerStat>(
            r#"
            SELECT p.name, p.team, p.position, g.week, g.year, s.fantasy_points, s.updated_at
            FROM player_stats s
            JOIN players p ON p.id = s.player_id
            JOIN games g ON g.id = s.game_id
            WHERE p.name = $1 AND p.team = $2 AND g.week = $3 AND g.year = $4
            "#,
        )
        .bind(name)
        .bind(team)
        .bind(week)
        .bind(year)
        .fetch_optional(self.pool().await?)
        .await?;
        Ok(stat)
    }
}

/// One transaction per week; each record runs inside its own savepoint so a
/// failed record does not poison the transaction.
struct PgStatBatch {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StatBatch for PgStatBatch {
    async fn upsert_player_stat(
        &mut self,
        game_id: i32,
        record: &PlayerRecord,
        fantasy_points: &BigDecimal,
    ) -> Result<i32> {
        let mut savepoint = Connection::begin(&mut *self.tx).await?;

        match upsert_rows(&mut savepoint, game_id, record, fantasy_points).await {
            Ok(player_id) => {
                savepoint.commit().await?;
                Ok(player_id)
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(e)
            }
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

async fn upsert_rows(
    conn: &mut PgConnection,
    game_id: i32,
    record: &PlayerRecord,
    fantasy_points: &BigDecimal,
) -> Result<i32> {
    let player_id: i32 = sqlx::query_scalar(
        r#"
        INSERT INTO players (name, team, position)
        VALUES ($1, $2, $3)
        ON CONFLICT (name, team)
        DO UPDATE SET position = EXCLUDED.position
        RETURNING id
        "#,
    )
    .bind(&record.name)
    .bind(&record.team)
    .bind(&record.position)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO player_stats (player_id, game_id, fantasy_points)
        VALUES ($1, $2, $3)
        ON CONFLICT (player_id, game_id)
        DO UPDATE SET
            fantasy_points = EXCLUDED.fantasy_points,
            updated_at = NOW()
        "#,
    )
    .bind(player_id)
    .bind(game_id)
    .bind(fantasy_points)
    .execute(&mut *conn)
    .await?;

    Ok(player_id)
}

use super::{
    StatBatch, StatStore, StoredGame, StoredPlayerStat, TableCounts, MAX_FANTASY_POINTS,
    MAX_NAME_LEN, MAX_POSITION_LEN, MAX_TEAM_LEN,
};
use crate::error::{PipelineError, Result};
use crate::models::PlayerRecord;
use async_trait::async_trait;
use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct PlayerRow {
    id: i32,
    name: String,
    team: String,
    position: String,
}

#[derive(Debug, Clone)]
struct GameRow {
    id: i32,
    week: i32,
    year: i32,
    game_date: NaiveDate,
}

#[derive(Debug, Clone)]
struct StatRow {
    player_id: i32,
    game_id: i32,
    fantasy_points: BigDecimal,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    schema_ready: bool,
    players: Vec<PlayerRow>,
    games: Vec<GameRow>,
    stats: Vec<StatRow>,
    next_player_id: i32,
    next_game_id: i32,
}

impl Tables {
    fn require_schema(&self) -> Result<()> {
        if self.schema_ready {
            Ok(())
        } else {
            Err(PipelineError::Internal("schema has not been created".to_string()))
        }
    }

    fn upsert_player(&mut self, record: &PlayerRecord) -> i32 {
        if let Some(row) = self
            .players
            .iter_mut()
            .find(|row| row.name == record.name && row.team == record.team)
        {
            row.position = record.position.clone();
            return row.id;
        }

        self.next_player_id += 1;
        let id = self.next_player_id;
        self.players.push(PlayerRow {
            id,
            name: record.name.clone(),
            team: record.team.clone(),
            position: record.position.clone(),
        });
        id
    }

    fn upsert_stat(&mut self, player_id: i32, game_id: i32, fantasy_points: &BigDecimal) {
        let now = Utc::now();
        if let Some(row) = self
            .stats
            .iter_mut()
            .find(|row| row.player_id == player_id && row.game_id == game_id)
        {
            row.fantasy_points = fantasy_points.clone();
            row.updated_at = now;
            return;
        }

        self.stats.push(StatRow {
            player_id,
            game_id,
            fantasy_points: fantasy_points.clone(),
            updated_at: now,
        });
    }
}

/// Same checks the Postgres column types apply
fn check_columns(record: &PlayerRecord, fantasy_points: &BigDecimal) -> Result<()> {
    let limits = [
        ("name", &record.name, MAX_NAME_LEN),
        ("team", &record.team, MAX_TEAM_LEN),
        ("position", &record.position, MAX_POSITION_LEN),
    ];
    for (column, value, max) in limits {
        if value.chars().count() > max {
            return Err(PipelineError::invalid_record(format!(
                "value too long for {column} (max {max}): '{value}'"
            )));
        }
    }

    let points = fantasy_points.to_f64().unwrap_or(f64::INFINITY);
    if points.abs() > MAX_FANTASY_POINTS {
        return Err(PipelineError::invalid_record(format!(
            "fantasy points {fantasy_points} overflow NUMERIC(5,1)"
        )));
    }

    Ok(())
}

/// In-memory stat store with the same keys and limits as the SQL schema
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatStore for InMemoryStatStore {
    async fn ensure_schema(&self) -> Result<()> {
        self.tables.lock().await.schema_ready = true;
        Ok(())
    }

    async fn upsert_game(&self, week: i32, year: i32, game_date: NaiveDate) -> Result<i32> {
        let mut tables = self.tables.lock().await;
        tables.require_schema()?;

        if let Some(row) = tables
            .games
            .iter_mut()
            .find(|row| row.week == week && row.year == year)
        {
            row.game_date = game_date;
            return Ok(row.id);
        }

        tables.next_game_id += 1;
        let id = tables.next_game_id;
        tables.games.push(GameRow { id, week, year, game_date });
        Ok(id)
    }

    async fn begin_batch(&self) -> Result<Box<dyn StatBatch>> {
        self.tables.lock().await.require_schema()?;

        Ok(Box::new(InMemoryStatBatch {
            target: Arc::clone(&self.tables),
            pending: Vec::new(),
        }))
    }

    async fn counts(&self) -> Result<TableCounts> {
        let tables = self.tables.lock().await;
        tables.require_schema()?;

        Ok(TableCounts {
            players: tables.players.len() as i64,
            games: tables.games.len() as i64,
            player_stats: tables.stats.len() as i64,
        })
    }

    async fn game(&self, week: i32, year: i32) -> Result<Option<StoredGame>> {
        let tables = self.tables.lock().await;
        tables.require_schema()?;

        Ok(tables
            .games
            .iter()
            .find(|row| row.week == week && row.year == year)
            .map(|row| StoredGame {
                id: row.id,
                week: row.week,
                year: row.year,
                game_date: Some(row.game_date),
            }))
    }

    async fn player_stat(
        &self,
        name: &str,
        team: &str,
        week: i32,
        year: i32,
    ) -> Result<Option<StoredPlayerStat>> {
        let tables = self.tables.lock().await;
        tables.require_schema()?;

        let Some(player) = tables.players.iter().find(|p| p.name == name && p.team == team) else {
            return Ok(None);
        };
        let Some(game) = tables.games.iter().find(|g| g.week == week && g.year == year) else {
            return Ok(None);
        };

        Ok(tables
            .stats
            .iter()
            .find(|s| s.player_id == player.id && s.game_id == game.id)
            .map(|stat| StoredPlayerStat {
                name: player.name.clone(),
                team: player.team.clone(),
                position: player.position.clone(),
                week: game.week,
                year: game.year,
                fantasy_points: stat.fantasy_points.clone(),
                updated_at: stat.updated_at,
            }))
    }
}

struct PendingStat {
    player_id: i32,
    game_id: i32,
    record: PlayerRecord,
    fantasy_points: BigDecimal,
}

/// Validates rows as they arrive and applies them row by row on commit, so
/// writes committed by others in the meantime are kept
struct InMemoryStatBatch {
    target: Arc<Mutex<Tables>>,
    pending: Vec<PendingStat>,
}

impl InMemoryStatBatch {
    /// Id the player has, or will get on commit if nothing else inserts first
    fn player_id_for(&self, tables: &Tables, record: &PlayerRecord) -> i32 {
        let same_key = |name: &str, team: &str| name == record.name && team == record.team;

        if let Some(row) = tables.players.iter().find(|row| same_key(&row.name, &row.team)) {
            return row.id;
        }
        if let Some(stat) = self
            .pending
            .iter()
            .find(|stat| same_key(&stat.record.name, &stat.record.team))
        {
            return stat.player_id;
        }

        let new_players = self
            .pending
            .iter()
            .filter(|stat| stat.player_id > tables.next_player_id)
            .map(|stat| stat.player_id)
            .max()
            .unwrap_or(tables.next_player_id);
        new_players + 1
    }
}

#[async_trait]
impl StatBatch for InMemoryStatBatch {
    async fn upsert_player_stat(
        &mut self,
        game_id: i32,
        record: &PlayerRecord,
        fantasy_points: &BigDecimal,
    ) -> Result<i32> {
        check_columns(record, fantasy_points)?;

        let tables = self.target.lock().await;
        if !tables.games.iter().any(|game| game.id == game_id) {
            return Err(PipelineError::invalid_record(format!(
                "game {game_id} does not exist"
            )));
        }

        let player_id = self.player_id_for(&tables, record);
        drop(tables);

        self.pending.push(PendingStat {
            player_id,
            game_id,
            record: record.clone(),
            fantasy_points: fantasy_points.clone(),
        });
        Ok(player_id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tables = self.target.lock().await;
        for stat in &self.pending {
            let player_id = tables.upsert_player(&stat.record);
            tables.upsert_stat(player_id, stat.game_id, &stat.fantasy_points);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn points(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 8).unwrap()
    }

    #[tokio::test]
    async fn test_operations_require_schema() {
        let store = InMemoryStatStore::new();
        assert!(store.upsert_game(1, 2024, date()).await.is_err());
        assert!(store.counts().await.is_err());

        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();
        assert_eq!(store.counts().await.unwrap(), TableCounts::default());
    }

    #[tokio::test]
    async fn test_game_upsert_reuses_id_and_overwrites_date() {
        let store = InMemoryStatStore::new();
        store.ensure_schema().await.unwrap();

        let first = store.upsert_game(1, 2024, date()).await.unwrap();
        let later = NaiveDate::from_ymd_opt(2024, 9, 10).unwrap();
        let second = store.upsert_game(1, 2024, later).await.unwrap();
        let other = store.upsert_game(2, 2024, date()).await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(store.game(1, 2024).await.unwrap().unwrap().game_date, Some(later));
    }

    #[tokio::test]
    async fn test_uncommitted_batch_is_invisible() {
        let store = InMemoryStatStore::new();
        store.ensure_schema().await.unwrap();
        let game_id = store.upsert_game(1, 2024, date()).await.unwrap();

        let mut batch = store.begin_batch().await.unwrap();
        batch
            .upsert_player_stat(game_id, &PlayerRecord::new("A", "KC", "QB"), &points("10.0"))
            .await
            .unwrap();
        assert_eq!(store.counts().await.unwrap().players, 0);

        batch.commit().await.unwrap();
        assert_eq!(store.counts().await.unwrap().players, 1);
        assert_eq!(store.counts().await.unwrap().player_stats, 1);
    }

    #[tokio::test]
    async fn test_column_limits_reject_record() {
        let store = InMemoryStatStore::new();
        store.ensure_schema().await.unwrap();
        let game_id = store.upsert_game(1, 2024, date()).await.unwrap();
        let mut batch = store.begin_batch().await.unwrap();

        let long_team = PlayerRecord::new("A", "KANSAS", "QB");
        let err = batch
            .upsert_player_stat(game_id, &long_team, &points("1.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidRecord(_)));

        let overflow = batch
            .upsert_player_stat(game_id, &PlayerRecord::new("B", "KC", "QB"), &points("10000.0"))
            .await;
        assert!(overflow.is_err());

        let missing_game = batch
            .upsert_player_stat(game_id + 1, &PlayerRecord::new("C", "KC", "QB"), &points("1.0"))
            .await;
        assert!(missing_game.is_err());

        batch.commit().await.unwrap();
        assert_eq!(store.counts().await.unwrap().players, 0);
    }

    #[tokio::test]
    async fn test_commit_keeps_writes_made_after_batch_began() {
        let store = InMemoryStatStore::new();
        store.ensure_schema().await.unwrap();
        let week_one = store.upsert_game(1, 2024, date()).await.unwrap();

        let mut slow = store.begin_batch().await.unwrap();
        slow.upsert_player_stat(week_one, &PlayerRecord::new("A", "KC", "QB"), &points("10.0"))
            .await
            .unwrap();

        let week_two = store.upsert_game(2, 2024, date()).await.unwrap();
        let mut fast = store.begin_batch().await.unwrap();
        fast.upsert_player_stat(week_two, &PlayerRecord::new("B", "BUF", "WR"), &points("5.0"))
            .await
            .unwrap();
        fast.commit().await.unwrap();

        slow.commit().await.unwrap();

        assert_eq!(
            store.counts().await.unwrap(),
            TableCounts { players: 2, games: 2, player_stats: 2 }
        );
        assert!(store.player_stat("B", "BUF", 2, 2024).await.unwrap().is_some());
        assert!(store.player_stat("A", "KC", 1, 2024).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_batch_reports_stable_player_ids() {
        let store = InMemoryStatStore::new();
        store.ensure_schema().await.unwrap();
        let game_id = store.upsert_game(1, 2024, date()).await.unwrap();

        let mut batch = store.begin_batch().await.unwrap();
        let first = batch
            .upsert_player_stat(game_id, &PlayerRecord::new("A", "KC", "QB"), &points("1.0"))
            .await
            .unwrap();
        let second = batch
            .upsert_player_stat(game_id, &PlayerRecord::new("B", "KC", "QB"), &points("1.0"))
            .await
            .unwrap();
        let again = batch
            .upsert_player_stat(game_id, &PlayerRecord::new("A", "KC", "RB"), &points("2.0"))
            .await
            .unwrap();
        batch.commit().await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first, again);
        let a = store.player_stat("A", "KC", 1, 2024).await.unwrap().unwrap();
        assert_eq!(a.position, "RB");
        assert_eq!(a.fantasy_points, points("2.0"));
        assert_eq!(store.counts().await.unwrap().players, 2);
    }
}

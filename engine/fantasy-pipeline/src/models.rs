use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Data-source label for records fetched from SportsDataIO
pub const SPORTSDATA_SOURCE: &str = "sportsdata.io";

/// Data-source label for records supplied in a test-mode invocation
pub const TEST_DATA_SOURCE: &str = "test_data_generator";

/// SportsDataIO player game stats row (`PlayerGameStatsByWeek`).
///
/// Every column, identity and stat alike, is kept as raw JSON and read by the
/// normalizer, so one off-type value only affects its own row. A row that is
/// not a JSON object decodes with no columns and `is_object` unset.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(from = "serde_json::Value")]
pub struct PlayerGameStats {
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,

    #[serde(skip)]
    pub is_object: bool,
}

impl Default for PlayerGameStats {
    fn default() -> Self {
        Self {
            fields: serde_json::Map::new(),
            is_object: true,
        }
    }
}

impl From<serde_json::Value> for PlayerGameStats {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Object(fields) => Self { fields, is_object: true },
            _ => Self {
                fields: serde_json::Map::new(),
                is_object: false,
            },
        }
    }
}

impl PlayerGameStats {
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.fields.get(column)
    }

    pub fn player_id(&self) -> Option<i64> {
        self.get("PlayerID").and_then(serde_json::Value::as_i64)
    }

    /// `Name` when the provider sent it as a string
    pub fn name(&self) -> Option<&str> {
        self.get("Name").and_then(serde_json::Value::as_str)
    }
}

/// Body of the `CurrentWeek` endpoint: a bare number or `{"Week": n}`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum CurrentWeek {
    Number(i32),
    Object {
        #[serde(rename = "Week")]
        week: i32,
    },
}

impl CurrentWeek {
    pub fn week(self) -> i32 {
        match self {
            CurrentWeek::Number(week) | CurrentWeek::Object { week } => week,
        }
    }
}

/// The statistical categories that feed the scoring formula
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    pub passing_yards: f64,
    pub passing_tds: f64,
    pub interceptions: f64,
    pub rushing_yards: f64,
    pub rushing_tds: f64,
    pub receiving_yards: f64,
    pub receiving_tds: f64,
    pub receptions: f64,
    pub fumbles: f64,
}

/// Stat line plus the score computed from it, if any
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(flatten)]
    pub line: StatLine,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fantasy_points: Option<f64>,
}

/// Canonical player record handed to the persistence layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub team: String,

    #[serde(default)]
    pub position: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default)]
    pub stats: PlayerStats,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Provider columns whose values could not be read as numbers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub malformed_fields: Vec<String>,
}

impl PlayerRecord {
    pub fn new(
        name: impl Into<String>,
        team: impl Into<String>,
        position: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            team: team.into(),
            position: position.into(),
            ..Self::default()
        }
    }

    pub fn with_stats(mut self, line: StatLine) -> Self {
        self.stats.line = line;
        self
    }
}

/// One pipeline invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(default)]
    pub test_mode: bool,

    /// Records to persist instead of fetching, honoured when `test_mode` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data: Option<Vec<PlayerRecord>>,
}

impl InvocationEvent {
    pub fn for_week(week: i32, year: i32) -> Self {
        Self {
            week: Some(week),
            year: Some(year),
            ..Self::default()
        }
    }

    /// Week requested by the caller; `0` counts as unspecified
    pub fn requested_week(&self) -> Option<i32> {
        self.week.filter(|week| *week != 0)
    }

    /// Read an event from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Summary of one successful invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub message: String,
    pub week: i32,
    pub year: i32,
    pub total_players_found: usize,
    pub players_persisted: usize,
    pub data_source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Summary(PipelineSummary),
    Message(String),
}

/// Structured result of an invocation; never a panic or process exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

impl InvocationResponse {
    pub fn ok(summary: PipelineSummary) -> Self {
        Self {
            status_code: 200,
            body: ResponseBody::Summary(summary),
        }
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: ResponseBody::Message(message.into()),
        }
    }

    /// Failure response carrying the error's status and text
    pub fn from_error(err: &PipelineError) -> Self {
        Self::failure(err.status_code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn summary(&self) -> Option<&PipelineSummary> {
        match &self.body {
            ResponseBody::Summary(summary) => Some(summary),
            ResponseBody::Message(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_current_week_shapes() {
        let bare: CurrentWeek = serde_json::from_value(json!(7)).unwrap();
        let object: CurrentWeek =
            serde_json::from_value(json!({"Week": 9, "Season": 2024})).unwrap();
        assert_eq!(bare.week(), 7);
        assert_eq!(object.week(), 9);
    }

    #[test]
    fn test_raw_row_keeps_stat_columns() {
        let row: PlayerGameStats = serde_json::from_value(json!({
            "PlayerID": 19801,
            "Name": "Josh Allen",
            "Team": "BUF",
            "Position": "QB",
            "Week": 3,
            "PassingYards": 263.0,
            "PassingTouchdowns": 2.0
        }))
        .unwrap();

        assert!(row.is_object);
        assert_eq!(row.player_id(), Some(19801));
        assert_eq!(row.name(), Some("Josh Allen"));
        assert_eq!(row.get("Week"), Some(&json!(3)));
        assert_eq!(row.get("PassingYards"), Some(&json!(263.0)));
    }

    #[test]
    fn test_off_type_row_does_not_break_the_week() {
        let rows: Vec<PlayerGameStats> = serde_json::from_value(json!([
            {"Name": "Josh Allen", "Team": "BUF", "Position": "QB", "Week": 3},
            {"Name": "Odd Row", "Team": 12, "Position": ["WR"], "Week": "3"},
            null
        ]))
        .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].name(), Some("Josh Allen"));
        assert_eq!(rows[1].name(), Some("Odd Row"));
        assert_eq!(rows[1].get("Week"), Some(&json!("3")));
        assert!(!rows[2].is_object);
    }

    #[test]
    fn test_player_record_uses_fixture_shape() {
        let record: PlayerRecord = serde_json::from_value(json!({
            "name": "Travis Kelce",
            "team": "KC",
            "position": "TE",
            "week": 1,
            "year": 2024,
            "stats": {"receiving_yards": 93, "receptions": 7, "fantasy_points": 16.3},
            "source_url": "test_data_generator"
        }))
        .unwrap();

        assert_eq!(record.stats.line.receiving_yards, 93.0);
        assert_eq!(record.stats.line.passing_yards, 0.0);
        assert_eq!(record.stats.fantasy_points, Some(16.3));
        assert!(record.malformed_fields.is_empty());
    }

    #[test]
    fn test_week_zero_is_unspecified() {
        let event: InvocationEvent =
            serde_json::from_value(json!({"week": 0, "year": 2024})).unwrap();
        assert_eq!(event.requested_week(), None);
        assert_eq!(InvocationEvent::for_week(5, 2024).requested_week(), Some(5));
    }

    #[test]
    fn test_event_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"week": 4, "year": 2023}}"#).unwrap();

        let event = InvocationEvent::from_file(file.path()).unwrap();
        assert_eq!(event.requested_week(), Some(4));
        assert_eq!(event.year, Some(2023));
        assert!(!event.test_mode);
    }

    #[test]
    fn test_bad_event_file_is_an_error() {
        let missing = InvocationEvent::from_file(Path::new("/nonexistent/event.json")).unwrap_err();
        assert!(matches!(missing, PipelineError::Io(_)));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let garbled = InvocationEvent::from_file(file.path()).unwrap_err();
        assert!(matches!(garbled, PipelineError::Serialization(_)));
        assert_eq!(InvocationResponse::from_error(&garbled).status_code, 500);
    }

    #[test]
    fn test_failure_body_is_plain_string() {
        let response = InvocationResponse::failure(400, "SPORTSDATA_API_KEY required");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["body"], json!("SPORTSDATA_API_KEY required"));
        assert!(!response.is_success());
    }
}

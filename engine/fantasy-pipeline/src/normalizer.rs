//! Projection of raw provider rows onto the canonical player record.

use crate::models::{PlayerGameStats, PlayerRecord, PlayerStats, StatLine};
use serde_json::Value;

/// Provider identity columns
pub const NAME: &str = "Name";
pub const TEAM: &str = "Team";
pub const POSITION: &str = "Position";

/// Provider column names for each scored category
pub const PASSING_YARDS: &str = "PassingYards";
pub const PASSING_TOUCHDOWNS: &str = "PassingTouchdowns";
pub const INTERCEPTIONS: &str = "Interceptions";
pub const RUSHING_YARDS: &str = "RushingYards";
pub const RUSHING_TOUCHDOWNS: &str = "RushingTouchdowns";
pub const RECEIVING_YARDS: &str = "ReceivingYards";
pub const RECEIVING_TOUCHDOWNS: &str = "ReceivingTouchdowns";
pub const RECEPTIONS: &str = "Receptions";
pub const FUMBLES: &str = "Fumbles";

/// Map a raw row to `{name, team, position, stats}`.
///
/// Missing strings become empty and numeric identity values are kept as
/// text. Missing or null stats become zero. Any other value reads as empty or
/// zero and its column name is listed in `malformed_fields`, as is `row` for
/// a row that is not an object. The score is left unset.
pub fn normalize(raw: &PlayerGameStats, week: i32, year: i32, source: &str) -> PlayerRecord {
    let mut malformed_fields = Vec::new();
    if !raw.is_object {
        malformed_fields.push("row".to_string());
    }

    let mut text = |column: &str| -> String {
        read_text(raw.get(column)).unwrap_or_else(|| {
            malformed_fields.push(column.to_string());
            String::new()
        })
    };
    let name = text(NAME);
    let team = text(TEAM);
    let position = text(POSITION);

    let mut stat = |column: &str| -> f64 {
        read_number(raw.get(column)).unwrap_or_else(|| {
            malformed_fields.push(column.to_string());
            0.0
        })
    };

    let line = StatLine {
        passing_yards: stat(PASSING_YARDS),
        passing_tds: stat(PASSING_TOUCHDOWNS),
        interceptions: stat(INTERCEPTIONS),
        rushing_yards: stat(RUSHING_YARDS),
        rushing_tds: stat(RUSHING_TOUCHDOWNS),
        receiving_yards: stat(RECEIVING_YARDS),
        receiving_tds: stat(RECEIVING_TOUCHDOWNS),
        receptions: stat(RECEPTIONS),
        fumbles: stat(FUMBLES),
    };

    PlayerRecord {
        name,
        team,
        position,
        week: Some(week),
        year: Some(year),
        stats: PlayerStats { line, fantasy_points: None },
        source_url: Some(source.to_string()),
        malformed_fields,
    }
}

/// Normalize a whole week of rows, preserving order
pub fn normalize_all(
    rows: &[PlayerGameStats],
    week: i32,
    year: i32,
    source: &str,
) -> Vec<PlayerRecord> {
    rows.iter().map(|row| normalize(row, week, year, source)).collect()
}

/// `None` means the value is present but unusable
fn read_text(value: Option<&Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => Some(String::new()),
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(_) => None,
    }
}

fn read_number(value: Option<&Value>) -> Option<f64> {
    match value {
        None | Some(Value::Null) => Some(0.0),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Some(_) => None,
    }
}

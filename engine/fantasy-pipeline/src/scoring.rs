//! Standard (non-PPR-bonus) fantasy scoring.
//!
//! 1 point per 25 passing yards, 4 per passing TD, -2 per interception,
//! 1 point per 10 rushing or receiving yards, 6 per rushing or receiving TD,
//! 1 per reception and -2 per fumble. The result is rounded to one decimal
//! place, ties away from zero.

use crate::models::StatLine;
use bigdecimal::BigDecimal;

const PASSING_YARDS_PER_POINT: f64 = 25.0;
const PASSING_TD_POINTS: f64 = 4.0;
const INTERCEPTION_POINTS: f64 = -2.0;
const RUSHING_YARDS_PER_POINT: f64 = 10.0;
const RUSHING_TD_POINTS: f64 = 6.0;
const RECEIVING_YARDS_PER_POINT: f64 = 10.0;
const RECEIVING_TD_POINTS: f64 = 6.0;
const RECEPTION_POINTS: f64 = 1.0;
const FUMBLE_POINTS: f64 = -2.0;

/// Calculate fantasy points for a stat line, rounded to one decimal place
pub fn calculate_fantasy_points(line: &StatLine) -> f64 {
    let passing = line.passing_yards / PASSING_YARDS_PER_POINT
        + line.passing_tds * PASSING_TD_POINTS
        + line.interceptions * INTERCEPTION_POINTS;

    let rushing =
        line.rushing_yards / RUSHING_YARDS_PER_POINT + line.rushing_tds * RUSHING_TD_POINTS;

    let receiving = line.receiving_yards / RECEIVING_YARDS_PER_POINT
        + line.receiving_tds * RECEIVING_TD_POINTS
        + line.receptions * RECEPTION_POINTS;

    let fumbles = line.fumbles * FUMBLE_POINTS;

    round_to_tenth(passing + rushing + receiving + fumbles)
}

/// Round to one decimal place, halves away from zero
pub fn round_to_tenth(points: f64) -> f64 {
    let rounded = (points * 10.0).round() / 10.0;
    // normalise -0.0 so a zero score always prints as 0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Fixed-point value with scale 1 for the `NUMERIC(5,1)` column.
///
/// Returns `None` for NaN or infinite input.
pub fn to_fixed_point(points: f64) -> Option<BigDecimal> {
    if !points.is_finite() {
        return None;
    }
    let tenths = (round_to_tenth(points) * 10.0).round() as i64;
    Some((BigDecimal::from(tenths) / BigDecimal::from(10)).with_scale(1))
}

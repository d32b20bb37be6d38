//! Evaluation scoring helpers
//!
//! Converts raw per-dimension inputs (human grader UI or AI suggestion)
//! into a consistent, clamped, labeled evaluation record. Every persisted
//! evaluation goes through this pipeline, so no code path can store an
//! out-of-range score or a label that disagrees with its numeric value.
//!
//! Rounding convention: aggregate scores round half-up (3.5 -> 4, 2.5 -> 3).

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{Dimension, Level};

/// Minimum dimension/aggregate score
pub const MIN_SCORE: i64 = 1;
/// Maximum dimension/aggregate score
pub const MAX_SCORE: i64 = 4;

/// Clamp a raw score into the inclusive [1,4] range
pub fn clamp_score(raw: i64) -> i64 {
    raw.clamp(MIN_SCORE, MAX_SCORE)
}

/// Extract a numeric score from an arbitrary JSON value, if possible
fn numeric_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// For every rubric dimension, take the corresponding raw score when present
/// and numeric, clamped into [1,4]; otherwise substitute `fallback`.
pub fn normalize_dimension_scores(
    dimensions: &[Dimension],
    raw: &serde_json::Map<String, Value>,
    fallback: i64,
) -> BTreeMap<String, i64> {
    let fallback = clamp_score(fallback);
    dimensions
        .iter()
        .map(|dim| {
            let score = raw
                .get(&dim.name)
                .and_then(numeric_score)
                .map(clamp_score)
                .unwrap_or(fallback);
            (dim.name.clone(), score)
        })
        .collect()
}

/// Arithmetic mean of all dimension scores, rounded half-up and clamped
/// into [1,4]. Returns `None` for an empty map.
pub fn average_score(scores: &BTreeMap<String, i64>) -> Option<i64> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.values().sum();
    let n = scores.len() as i64;
    // Integer round-half-up: floor((2*sum + n) / (2*n)) for non-negative sums
    let rounded = (2 * sum + n) / (2 * n);
    Some(clamp_score(rounded))
}

/// Normalize a legacy level token into the canonical four-level scheme.
///
/// Accepts a canonical label, a prior-generation letter grade (A/B/C/D),
/// an ordinal 1-4, or a 0-100 percentage score. Unrecognized input falls
/// back to the lowest level as a conservative default.
pub fn level_from_legacy(value: &Value) -> Level {
    match value {
        Value::String(s) => {
            let token = s.trim();
            if let Ok(level) = token.parse::<Level>() {
                return level;
            }
            match token.to_ascii_uppercase().as_str() {
                "A" => Level::Excellent,
                "B" => Level::Good,
                "C" => Level::Pass,
                "D" => Level::Improve,
                _ => token
                    .parse::<i64>()
                    .map(level_from_number)
                    .unwrap_or(Level::Improve),
            }
        }
        Value::Number(n) => n
            .as_f64()
            .map(|f| level_from_number(f.round() as i64))
            .unwrap_or(Level::Improve),
        _ => Level::Improve,
    }
}

/// Numbers in [1,4] are ordinal scores; anything larger is read as a
/// percentage on the legacy 0-100 scale.
fn level_from_number(n: i64) -> Level {
    if (MIN_SCORE..=MAX_SCORE).contains(&n) {
        return Level::from_score(n);
    }
    if n >= 90 {
        Level::Excellent
    } else if n >= 75 {
        Level::Good
    } else if n >= 60 {
        Level::Pass
    } else {
        Level::Improve
    }
}

/// Map each dimension score to its Chinese display label
pub fn dimension_labels(scores: &BTreeMap<String, i64>) -> BTreeMap<String, &'static str> {
    scores
        .iter()
        .map(|(name, score)| (name.clone(), Level::from_score(*score).label()))
        .collect()
}

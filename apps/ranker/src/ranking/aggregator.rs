//! Score Aggregator: folds model-reported score entries into a complete `ScoreMap`.
//!
//! Algorithm:
//! 1. Fold entries keyed by exact criterion text; the first occurrence wins.
//! 2. Clamp each score: integers in 0..=5 are kept, everything else becomes 0.
//! 3. Walk the governing criteria in order; missing criteria score 0, and entries that
//!    reference unknown criteria are dropped.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::ranking::models::{CriteriaSet, ScoreEntry, ScoreMap};

pub const MIN_SCORE: u8 = 0;
pub const MAX_SCORE: u8 = 5;

/// Builds the score map for one resume. Never fails.
pub fn aggregate(entries: &[ScoreEntry], criteria: &CriteriaSet) -> ScoreMap {
    let mut folded: HashMap<&str, u8> = HashMap::with_capacity(entries.len());

    for entry in entries {
        if folded.contains_key(entry.criterion.as_str()) {
            warn!(
                "Duplicate score for criterion '{}', keeping the first",
                entry.criterion
            );
            continue;
        }
        folded.insert(entry.criterion.as_str(), clamp_score(&entry.criterion, &entry.score));
    }

    let scores = criteria
        .iter()
        .map(|criterion| {
            let score = folded.remove(criterion.text()).unwrap_or_else(|| {
                warn!("No score for criterion: {}", criterion.text());
                MIN_SCORE
            });
            (criterion.text().to_string(), score)
        })
        .collect();

    for extraneous in folded.keys() {
        debug!("Dropping score for unknown criterion '{extraneous}'");
    }

    ScoreMap::from_ordered(scores)
}

/// JSON integers (or integral floats) within 0..=5 pass through unchanged. Anything else,
/// strings included, is coerced to 0 rather than dropped.
fn clamp_score(criterion: &str, raw: &Value) -> u8 {
    match as_integer(raw) {
        Some(n) if (i64::from(MIN_SCORE)..=i64::from(MAX_SCORE)).contains(&n) => n as u8,
        _ => {
            warn!("Invalid score value for {criterion}: {raw}, using 0");
            MIN_SCORE
        }
    }
}

fn as_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    }
}

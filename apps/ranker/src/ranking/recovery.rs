//! Response Recovery: turns raw completion text into typed values.
//!
//! Each task kind runs an ordered chain of parse attempts; the first attempt that yields
//! a value wins:
//!
//! | Stage              | Criteria | Scores | Name |
//! |--------------------|----------|--------|------|
//! | `Strict`           | yes      | yes    | yes  |
//! | `Repaired`         | yes      | yes    | yes  |
//! | `CompleteObjects`  |          | yes    |      |
//! | `PositionalPairs`  |          | yes    |      |
//!
//! What happens when every stage fails is task-specific: criteria surface the error,
//! scores and names hand back an error the caller downgrades to a safe default.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ranking::models::{NameRecord, ScoreEntry};

const PREVIEW_CHARS: usize = 500;

static COMPLETE_SCORE_OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\{\s*"criterion"\s*:\s*"((?:[^"\\]|\\.)*)"\s*,\s*"score"\s*:\s*(-?\d+)\s*,\s*"justification"\s*:\s*"((?:[^"\\]|\\.)*)"\s*\}"#,
    )
    .expect("complete score object pattern is valid")
});

static CRITERION_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""criterion"\s*:\s*"((?:[^"\\]|\\.)*)""#).expect("criterion pattern is valid")
});

static SCORE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""score"\s*:\s*(-?\d+)"#).expect("score pattern is valid"));

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("trailing comma pattern is valid"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("response is not valid JSON: {0}")]
    Malformed(String),

    #[error("response has the wrong shape (expected {expected})")]
    WrongShape { expected: &'static str },

    #[error("response contained no usable {0}")]
    NoUsableItems(&'static str),
}

/// The stage that produced a recovered value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    Strict,
    Repaired,
    CompleteObjects,
    PositionalPairs,
}

impl RecoveryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryStage::Strict => "strict",
            RecoveryStage::Repaired => "repaired",
            RecoveryStage::CompleteObjects => "complete_objects",
            RecoveryStage::PositionalPairs => "positional_pairs",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Recovered<T> {
    pub value: T,
    pub stage: RecoveryStage,
}

type Attempt<T> = fn(&str) -> Result<T, RecoveryError>;

const CRITERIA_STAGES: &[(RecoveryStage, Attempt<Vec<String>>)] = &[
    (RecoveryStage::Strict, decode_criteria),
    (RecoveryStage::Repaired, repaired_criteria),
];

const SCORE_STAGES: &[(RecoveryStage, Attempt<Vec<ScoreEntry>>)] = &[
    (RecoveryStage::Strict, decode_scores),
    (RecoveryStage::Repaired, repaired_scores),
    (RecoveryStage::CompleteObjects, complete_score_objects),
    (RecoveryStage::PositionalPairs, positional_score_pairs),
];

const NAME_STAGES: &[(RecoveryStage, Attempt<NameRecord>)] = &[
    (RecoveryStage::Strict, decode_name),
    (RecoveryStage::Repaired, repaired_name),
];

// ────────────────────────────────────────────────────────────────────────────
// Entry points
// ────────────────────────────────────────────────────────────────────────────

/// Recovers the criteria list. Order and duplicates are preserved here; de-duplication
/// belongs to `CriteriaSet`.
pub fn recover_criteria(raw: &str) -> Result<Recovered<Vec<String>>, RecoveryError> {
    run_cascade("criteria", raw, CRITERIA_STAGES)
}

/// Recovers score entries. An `Err` means every stage failed; callers score all
/// criteria 0 instead of failing the resume.
pub fn recover_scores(raw: &str) -> Result<Recovered<Vec<ScoreEntry>>, RecoveryError> {
    run_cascade("scores", raw, SCORE_STAGES)
}

/// Recovers the name record, falling back to an empty record with confidence 0.
pub fn recover_name(raw: &str) -> NameRecord {
    match run_cascade("name", raw, NAME_STAGES) {
        Ok(recovered) => recovered.value,
        Err(e) => {
            warn!("Name response could not be recovered ({e}), continuing without a name");
            NameRecord::unrecovered()
        }
    }
}

fn run_cascade<T>(
    label: &str,
    raw: &str,
    stages: &[(RecoveryStage, Attempt<T>)],
) -> Result<Recovered<T>, RecoveryError> {
    debug!("Raw {label} response: {}", preview(raw));

    let mut last_error = RecoveryError::Malformed("empty response".to_string());
    for (stage, attempt) in stages {
        match attempt(raw) {
            Ok(value) => {
                if *stage != RecoveryStage::Strict {
                    info!("Recovered {label} response at stage '{}'", stage.as_str());
                }
                return Ok(Recovered {
                    value,
                    stage: *stage,
                });
            }
            Err(e) => {
                debug!("{label} stage '{}' failed: {e}", stage.as_str());
                last_error = e;
            }
        }
    }

    warn!("All recovery stages failed for {label} response: {last_error}");
    Err(last_error)
}

fn preview(raw: &str) -> String {
    if raw.chars().count() > PREVIEW_CHARS {
        format!("{}...", raw.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        raw.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strict decoders (shape + per-item validation)
// ────────────────────────────────────────────────────────────────────────────

fn parse_json(text: &str) -> Result<Value, RecoveryError> {
    serde_json::from_str(text.trim()).map_err(|e| RecoveryError::Malformed(e.to_string()))
}

fn decode_criteria(text: &str) -> Result<Vec<String>, RecoveryError> {
    let Value::Array(items) = parse_json(text)? else {
        return Err(RecoveryError::WrongShape {
            expected: "array of strings",
        });
    };

    let criteria: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s),
            Value::String(_) => {
                warn!("Dropping blank criterion");
                None
            }
            other => {
                warn!("Dropping non-string criterion: {other}");
                None
            }
        })
        .collect();

    if criteria.is_empty() {
        return Err(RecoveryError::NoUsableItems("criteria"));
    }
    Ok(criteria)
}

fn decode_scores(text: &str) -> Result<Vec<ScoreEntry>, RecoveryError> {
    let value = parse_json(text)?;
    let Some(items) = value.get("scores").and_then(Value::as_array) else {
        return Err(RecoveryError::WrongShape {
            expected: "object with a 'scores' array",
        });
    };

    Ok(items.iter().filter_map(score_entry_from_value).collect())
}

fn score_entry_from_value(item: &Value) -> Option<ScoreEntry> {
    let (Some(criterion), Some(score)) = (
        item.get("criterion").and_then(Value::as_str),
        item.get("score"),
    ) else {
        warn!("Invalid score object format: {item}");
        return None;
    };

    Some(ScoreEntry {
        criterion: criterion.to_string(),
        score: score.clone(),
        justification: item
            .get("justification")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

fn decode_name(text: &str) -> Result<NameRecord, RecoveryError> {
    let Value::Object(fields) = parse_json(text)? else {
        return Err(RecoveryError::WrongShape {
            expected: "object with name, confidence and source",
        });
    };

    Ok(NameRecord::new(
        string_field(&fields, "name").trim(),
        confidence_field(&fields),
        string_field(&fields, "source"),
    ))
}

fn string_field<'a>(fields: &'a Map<String, Value>, key: &str) -> &'a str {
    fields.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn confidence_field(fields: &Map<String, Value>) -> u8 {
    fields
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|f| f.is_finite())
        .map(|f| f.round().clamp(0.0, 100.0) as u8)
        .unwrap_or(0)
}

// ────────────────────────────────────────────────────────────────────────────
// Structural repair
// ────────────────────────────────────────────────────────────────────────────

fn repaired_criteria(raw: &str) -> Result<Vec<String>, RecoveryError> {
    decode_criteria(&repair(raw, '[')?)
}

fn repaired_scores(raw: &str) -> Result<Vec<ScoreEntry>, RecoveryError> {
    decode_scores(&repair(raw, '{')?)
}

fn repaired_name(raw: &str) -> Result<NameRecord, RecoveryError> {
    decode_name(&repair(raw, '{')?)
}

/// Strips code fences, cuts from the first `open` to the last matching closer and removes
/// trailing commas. Brackets of the other kind in surrounding prose are ignored.
fn repair(raw: &str, open: char) -> Result<String, RecoveryError> {
    let text = strip_json_fences(raw);
    let close = if open == '{' { '}' } else { ']' };
    let no_span = || RecoveryError::Malformed(format!("no '{open}...{close}' span found"));

    let start = text.find(open).ok_or_else(no_span)?;
    let end = text.rfind(close).filter(|&end| end > start).ok_or_else(no_span)?;

    Ok(TRAILING_COMMA
        .replace_all(&text[start..=end], "$1")
        .into_owned())
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pattern-based partial recovery (scores only)
// ────────────────────────────────────────────────────────────────────────────

/// Collects every complete `{criterion, score, justification}` object, ignoring whatever
/// broken structure surrounds them. Repeated criteria keep the first match.
fn complete_score_objects(raw: &str) -> Result<Vec<ScoreEntry>, RecoveryError> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();

    for caps in COMPLETE_SCORE_OBJECT.captures_iter(raw) {
        let criterion = unescape(&caps[1]);
        if !seen.insert(criterion.clone()) {
            warn!("Skipping duplicate criterion: {criterion}");
            continue;
        }
        entries.push(
            ScoreEntry::new(criterion, parse_score(&caps[2])).with_justification(unescape(&caps[3])),
        );
    }

    if entries.is_empty() {
        return Err(RecoveryError::NoUsableItems("complete score objects"));
    }
    info!(
        "Reconstructed {} complete score objects from malformed response",
        entries.len()
    );
    Ok(entries)
}

/// Pairs loose `"criterion"` and `"score"` fields by position. Only applies when both
/// sequences have the same, nonzero length.
fn positional_score_pairs(raw: &str) -> Result<Vec<ScoreEntry>, RecoveryError> {
    let criteria: Vec<String> = CRITERION_FIELD
        .captures_iter(raw)
        .map(|caps| unescape(&caps[1]))
        .collect();
    let scores: Vec<Value> = SCORE_FIELD
        .captures_iter(raw)
        .map(|caps| parse_score(&caps[1]))
        .collect();

    if criteria.is_empty() || criteria.len() != scores.len() {
        return Err(RecoveryError::NoUsableItems("criterion/score pairs"));
    }

    info!(
        "Recovered {} criterion/score pairs by position",
        criteria.len()
    );
    Ok(criteria
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(i, (criterion, score))| {
            ScoreEntry::new(criterion, score)
                .with_justification(format!("Recovered from partial response (item {})", i + 1))
        })
        .collect())
}

fn parse_score(digits: &str) -> Value {
    digits
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or(Value::Null)
}

/// Decodes JSON string escapes in a regex capture, keeping the raw text if they are
/// malformed.
fn unescape(captured: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{captured}\""))
        .unwrap_or_else(|_| captured.to_string())
}

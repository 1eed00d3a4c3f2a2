//! Domain types shared by recovery, aggregation and the ranking table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

const REQUIRED_PREFIX: &str = "[Required] ";
const PREFERRED_PREFIX: &str = "[Preferred] ";

/// Importance marker embedded as a literal prefix of the criterion text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Importance {
    Required,
    Preferred,
}

/// One ranking requirement. The text is kept verbatim (prefix included) because it is
/// the key the scoring response is matched against.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Criterion(String);

impl Criterion {
    /// Returns `None` when the text is blank after trimming.
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    pub fn importance(&self) -> Option<Importance> {
        if self.0.starts_with(REQUIRED_PREFIX) {
            Some(Importance::Required)
        } else if self.0.starts_with(PREFERRED_PREFIX) {
            Some(Importance::Preferred)
        } else {
            None
        }
    }
}

/// Strips a recognised importance prefix from a criterion string.
pub fn display_name(text: &str) -> &str {
    text.strip_prefix(REQUIRED_PREFIX)
        .or_else(|| text.strip_prefix(PREFERRED_PREFIX))
        .unwrap_or(text)
}

/// Ordered, text-unique criteria for one job description. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CriteriaSet(Vec<Criterion>);

impl CriteriaSet {
    /// Trims, drops blanks and keeps the first occurrence of each text.
    /// Returns `None` if nothing usable is left.
    pub fn from_texts<I, S>(texts: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let criteria: Vec<Criterion> = texts
            .into_iter()
            .filter_map(Criterion::new)
            .filter(|c| seen.insert(c.text().to_string()))
            .collect();

        if criteria.is_empty() {
            None
        } else {
            Some(Self(criteria))
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.0.iter().map(|c| c.text().to_string()).collect()
    }

    pub fn as_slice(&self) -> &[Criterion] {
        &self.0
    }
}

/// A single score item as the model reported it. `score` stays loosely typed until
/// aggregation clamps it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub criterion: String,
    pub score: serde_json::Value,
    #[serde(default)]
    pub justification: String,
}

impl ScoreEntry {
    pub fn new(criterion: impl Into<String>, score: impl Into<serde_json::Value>) -> Self {
        Self {
            criterion: criterion.into(),
            score: score.into(),
            justification: String::new(),
        }
    }

    pub fn with_justification(mut self, justification: impl Into<String>) -> Self {
        self.justification = justification.into();
        self
    }
}

/// Per-resume mapping from criterion text to a 0..=5 score, in criteria order.
///
/// Built only through `ScoreAggregator`, which guarantees the key set equals the
/// governing `CriteriaSet`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScoreMap {
    entries: Vec<(String, u8)>,
}

impl ScoreMap {
    pub(crate) fn from_ordered(entries: Vec<(String, u8)>) -> Self {
        Self { entries }
    }

    #[cfg(test)]
    pub fn get(&self, criterion: &str) -> Option<u8> {
        self.entries
            .iter()
            .find(|(key, _)| key == criterion)
            .map(|(_, score)| *score)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u8)> {
        self.entries.iter().map(|(key, score)| (key.as_str(), *score))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, score)| u32::from(*score)).sum()
    }
}

/// Candidate name as proposed by the model, or as decided by `NamePolicy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRecord {
    pub name: String,
    /// 0..=100
    pub confidence: u8,
    pub source: String,
}

impl NameRecord {
    pub fn new(name: impl Into<String>, confidence: u8, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            confidence: confidence.min(100),
            source: source.into(),
        }
    }

    /// Used when the name response could not be recovered at all.
    pub fn unrecovered() -> Self {
        Self::new("", 0, "")
    }
}

/// Outcome of processing one resume. `error` set means `scores` is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeResult {
    pub candidate_name: String,
    pub scores: ScoreMap,
    pub error: Option<String>,
}

impl ResumeResult {
    pub fn scored(candidate_name: impl Into<String>, scores: ScoreMap) -> Self {
        Self {
            candidate_name: candidate_name.into(),
            scores,
            error: None,
        }
    }

    pub fn failed(candidate_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            candidate_name: candidate_name.into(),
            scores: ScoreMap::default(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Candidate identifier derived from an upload's filename: stem, underscores as spaces,
/// each word title-cased.
pub fn fallback_identifier(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };

    let titled = stem
        .replace('_', " ")
        .split_whitespace()
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");

    if !titled.is_empty() {
        titled
    } else if !base.trim().is_empty() {
        base.trim().to_string()
    } else {
        "Unknown Candidate".to_string()
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

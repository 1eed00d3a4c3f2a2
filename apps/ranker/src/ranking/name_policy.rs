//! Name acceptance: decide whether a model-proposed candidate name is trusted.
//!
//! Rule chain, evaluated in order; the first failing rule sends the record to the
//! filename fallback:
//! 1. empty name
//! 2. exact (case-insensitive) match against the placeholder block-list
//! 3. placeholder markers (brackets, braces, angle brackets, "example")
//! 4. structure: at least two whitespace-separated parts, each at least two characters
//! 5. length: at most `max_name_chars` characters
//! 6. confidence: at least `confidence_threshold`
//!
//! Self-reported confidence is necessary but never sufficient.

use tracing::{info, warn};

use crate::ranking::models::NameRecord;
use crate::ranking::prompts::PROMPT_EXAMPLE_NAME;

pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 70;
pub const DEFAULT_MAX_NAME_CHARS: usize = 50;
pub const FALLBACK_CONFIDENCE: u8 = 100;
const CONTENT_SOURCE: &str = "content_extraction";

/// Template names models tend to echo back instead of reading the resume.
const DEFAULT_BLOCKED_NAMES: &[&str] = &[
    "john smith",
    "john doe",
    "jane doe",
    "jane smith",
    "emily j. miller",
    "james wilson",
    "sarah johnson",
    "[actual extracted name]",
    "your name",
    "candidate name",
    "first last",
    "full name",
    "resume",
];

const DEFAULT_PLACEHOLDER_MARKERS: &[&str] = &["[", "]", "{", "}", "<", ">", "example"];

/// Why a proposed name was accepted or sent to the fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameVerdict {
    Accepted,
    EmptyResult,
    ExampleName,
    Placeholder,
    InvalidStructure,
    TooLong,
    LowConfidence,
}

impl NameVerdict {
    /// Source tag written into the final record for this verdict.
    pub fn source_tag(&self) -> &'static str {
        match self {
            NameVerdict::Accepted => CONTENT_SOURCE,
            NameVerdict::EmptyResult => "empty_result",
            NameVerdict::ExampleName => "example_name_rejected",
            NameVerdict::Placeholder => "placeholder_rejected",
            NameVerdict::InvalidStructure => "invalid_structure",
            NameVerdict::TooLong => "name_too_long",
            NameVerdict::LowConfidence => "filename_fallback",
        }
    }
}

/// Immutable block-lists and thresholds, injected into the pipeline through `AppState`.
#[derive(Debug, Clone)]
pub struct NamePolicy {
    blocked_names: Vec<String>,
    placeholder_markers: Vec<String>,
    pub confidence_threshold: u8,
    pub max_name_chars: usize,
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_BLOCKED_NAMES.iter().copied(),
            DEFAULT_PLACEHOLDER_MARKERS.iter().copied(),
        )
    }
}

impl NamePolicy {
    /// Builds a policy from custom lists. The prompt's own example name is always
    /// blocked.
    pub fn new<N, M>(blocked_names: N, placeholder_markers: M) -> Self
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        M: IntoIterator,
        M::Item: AsRef<str>,
    {
        let mut blocked: Vec<String> = blocked_names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .collect();
        let example = PROMPT_EXAMPLE_NAME.to_lowercase();
        if !blocked.contains(&example) {
            blocked.push(example);
        }

        Self {
            blocked_names: blocked,
            placeholder_markers: placeholder_markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .collect(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            max_name_chars: DEFAULT_MAX_NAME_CHARS,
        }
    }

    pub fn with_confidence_threshold(mut self, threshold: u8) -> Self {
        self.confidence_threshold = threshold.min(100);
        self
    }

    /// Runs the rule chain without building the final record.
    pub fn evaluate(&self, record: &NameRecord) -> NameVerdict {
        let name = record.name.trim();
        let lowered = name.to_lowercase();

        if name.is_empty() {
            return NameVerdict::EmptyResult;
        }
        if self.blocked_names.iter().any(|blocked| *blocked == lowered) {
            return NameVerdict::ExampleName;
        }
        if self
            .placeholder_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
        {
            return NameVerdict::Placeholder;
        }

        let parts: Vec<&str> = name.split_whitespace().collect();
        if parts.len() < 2 || parts.iter().any(|part| part.chars().count() < 2) {
            return NameVerdict::InvalidStructure;
        }
        if name.chars().count() > self.max_name_chars {
            return NameVerdict::TooLong;
        }
        if record.confidence < self.confidence_threshold {
            return NameVerdict::LowConfidence;
        }

        NameVerdict::Accepted
    }

    /// Final name decision. Always produces a record.
    pub fn accept(&self, record: NameRecord, fallback_identifier: &str) -> NameRecord {
        let verdict = self.evaluate(&record);

        match verdict {
            NameVerdict::Accepted => {
                let source = if record.source.trim().is_empty() {
                    CONTENT_SOURCE.to_string()
                } else {
                    record.source
                };
                NameRecord::new(record.name.trim(), record.confidence, source)
            }
            NameVerdict::LowConfidence => {
                info!(
                    "Low confidence score ({}), using '{fallback_identifier}' instead",
                    record.confidence
                );
                self.fallback(verdict, fallback_identifier)
            }
            _ => {
                warn!(
                    "Rejected extracted name '{}' ({}), using '{fallback_identifier}'",
                    record.name,
                    verdict.source_tag()
                );
                self.fallback(verdict, fallback_identifier)
            }
        }
    }

    fn fallback(&self, verdict: NameVerdict, fallback_identifier: &str) -> NameRecord {
        NameRecord::new(fallback_identifier, FALLBACK_CONFIDENCE, verdict.source_tag())
    }
}

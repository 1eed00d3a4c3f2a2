//! Completion: the seam between the ranking pipeline and whatever language model
//! produces the raw text.
//!
//! Implementations only move text. Prompts are rendered here, and parsing the reply
//! belongs to `recovery`.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::llm_client::LlmError;
use crate::ranking::models::Criterion;
use crate::ranking::prompts::{
    EXTRACT_CRITERIA_PROMPT_TEMPLATE, EXTRACT_CRITERIA_SYSTEM, EXTRACT_NAME_PROMPT_TEMPLATE,
    EXTRACT_NAME_SYSTEM, PROMPT_EXAMPLE_NAME, SCORE_RESUME_PROMPT_TEMPLATE, SCORE_RESUME_SYSTEM,
};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    ExtractCriteria,
    ExtractName,
    ScoreResume,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::ExtractCriteria => "extract_criteria",
            TaskKind::ExtractName => "extract_name",
            TaskKind::ScoreResume => "score_resume",
        }
    }
}

/// One completion request with its typed inputs.
#[derive(Debug, Clone, Copy)]
pub enum CompletionTask<'a> {
    ExtractCriteria {
        job_description: &'a str,
    },
    ExtractName {
        resume_text: &'a str,
        filename: &'a str,
    },
    ScoreResume {
        resume_text: &'a str,
        criteria: &'a [Criterion],
    },
}

impl CompletionTask<'_> {
    pub fn kind(&self) -> TaskKind {
        match self {
            CompletionTask::ExtractCriteria { .. } => TaskKind::ExtractCriteria,
            CompletionTask::ExtractName { .. } => TaskKind::ExtractName,
            CompletionTask::ScoreResume { .. } => TaskKind::ScoreResume,
        }
    }

    /// Returns `(system, prompt)`.
    pub fn render(&self) -> (&'static str, String) {
        match *self {
            CompletionTask::ExtractCriteria { job_description } => (
                EXTRACT_CRITERIA_SYSTEM,
                fill(
                    EXTRACT_CRITERIA_PROMPT_TEMPLATE,
                    &[("job_description", job_description)],
                ),
            ),
            CompletionTask::ExtractName {
                resume_text,
                filename,
            } => (
                EXTRACT_NAME_SYSTEM,
                fill(
                    EXTRACT_NAME_PROMPT_TEMPLATE,
                    &[
                        ("example_name", PROMPT_EXAMPLE_NAME),
                        ("filename", filename),
                        ("resume_text", resume_text),
                    ],
                ),
            ),
            CompletionTask::ScoreResume {
                resume_text,
                criteria,
            } => {
                let texts: Vec<&str> = criteria.iter().map(Criterion::text).collect();
                let criteria_json =
                    serde_json::to_string_pretty(&texts).unwrap_or_else(|_| "[]".to_string());
                (
                    SCORE_RESUME_SYSTEM,
                    fill(
                        SCORE_RESUME_PROMPT_TEMPLATE,
                        &[
                            ("criteria_json", criteria_json.as_str()),
                            ("resume_text", resume_text),
                        ],
                    ),
                )
            }
        }
    }
}

/// Substitutes `{key}` placeholders in one pass, so placeholder-like text inside the
/// substituted values is never expanded.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            values
                .iter()
                .find(|(key, _)| *key == &caps[1])
                .map(|(_, value)| value.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Produces raw model text for a task. Malformed-but-present output is returned as
/// `Ok`; only transport or availability failures are errors.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn run(&self, task: &CompletionTask<'_>) -> Result<String, LlmError>;
}

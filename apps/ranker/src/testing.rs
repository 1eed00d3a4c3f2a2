//! In-memory collaborators for pipeline and handler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::documents::{DocumentProcessor, ExtractionError, UploadedFile};
use crate::llm_client::LlmError;
use crate::ranking::completion::{Completion, CompletionTask};
use crate::ranking::name_policy::NamePolicy;
use crate::state::AppState;

/// Filenames ending in this suffix fail extraction in `PlainTextDocuments`.
pub const CORRUPT_SUFFIX: &str = ".corrupt";

type Reply = Option<String>;

/// Replies per task kind. Name replies are keyed by filename and score replies by a
/// substring of the resume text; `None` simulates a transport failure. Score replies can
/// be delayed per substring to force out-of-order completion.
pub struct ScriptedCompletion {
    criteria: Reply,
    names: Vec<(String, Reply)>,
    default_name: Reply,
    scores: Vec<(String, Reply)>,
    default_scores: Reply,
    score_delays: Vec<(String, Duration)>,
    calls: AtomicUsize,
}

impl Default for ScriptedCompletion {
    fn default() -> Self {
        Self {
            criteria: Some("[]".to_string()),
            names: Vec::new(),
            default_name: Some(String::new()),
            scores: Vec::new(),
            default_scores: Some(String::new()),
            score_delays: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criteria(mut self, raw: &str) -> Self {
        self.criteria = Some(raw.to_string());
        self
    }

    pub fn failing_criteria(mut self) -> Self {
        self.criteria = None;
        self
    }

    pub fn with_name_for(mut self, filename: &str, raw: &str) -> Self {
        self.names.push((filename.to_string(), Some(raw.to_string())));
        self
    }

    pub fn failing_name_for(mut self, filename: &str) -> Self {
        self.names.push((filename.to_string(), None));
        self
    }

    pub fn with_default_name(mut self, raw: &str) -> Self {
        self.default_name = Some(raw.to_string());
        self
    }

    pub fn with_scores_for(mut self, needle: &str, raw: &str) -> Self {
        self.scores.push((needle.to_string(), Some(raw.to_string())));
        self
    }

    pub fn failing_scores_for(mut self, needle: &str) -> Self {
        self.scores.push((needle.to_string(), None));
        self
    }

    pub fn with_default_scores(mut self, raw: &str) -> Self {
        self.default_scores = Some(raw.to_string());
        self
    }

    pub fn delaying_scores_for(mut self, needle: &str, delay: Duration) -> Self {
        self.score_delays.push((needle.to_string(), delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Completion for ScriptedCompletion {
    async fn run(&self, task: &CompletionTask<'_>) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let CompletionTask::ScoreResume { resume_text, .. } = *task {
            if let Some((_, delay)) = self
                .score_delays
                .iter()
                .find(|(needle, _)| resume_text.contains(needle.as_str()))
            {
                tokio::time::sleep(*delay).await;
            }
        }

        let reply = match *task {
            CompletionTask::ExtractCriteria { .. } => &self.criteria,
            CompletionTask::ExtractName { filename, .. } => self
                .names
                .iter()
                .find(|(key, _)| key == filename)
                .map(|(_, reply)| reply)
                .unwrap_or(&self.default_name),
            CompletionTask::ScoreResume { resume_text, .. } => self
                .scores
                .iter()
                .find(|(needle, _)| resume_text.contains(needle.as_str()))
                .map(|(_, reply)| reply)
                .unwrap_or(&self.default_scores),
        };

        reply.clone().ok_or_else(|| LlmError::Api {
            status: 503,
            message: format!("scripted {} outage", task.kind().as_str()),
        })
    }
}

/// Treats every upload as UTF-8 text.
pub struct PlainTextDocuments;

impl DocumentProcessor for PlainTextDocuments {
    fn extract_text(&self, file: &UploadedFile) -> Result<String, ExtractionError> {
        if file.bytes.is_empty() {
            return Err(ExtractionError::Empty);
        }
        if file.filename.ends_with(CORRUPT_SUFFIX) {
            return Err(ExtractionError::Pdf("corrupt test fixture".to_string()));
        }
        Ok(String::from_utf8_lossy(&file.bytes).trim().to_string())
    }
}

pub fn test_config() -> Config {
    Config {
        anthropic_api_key: "test-key".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        max_concurrent_resumes: 2,
        max_upload_bytes: 1024 * 1024,
        name_confidence_threshold: 70,
    }
}

pub fn test_state(completion: ScriptedCompletion) -> AppState {
    AppState {
        config: test_config(),
        completion: Arc::new(completion),
        documents: Arc::new(PlainTextDocuments),
        name_policy: Arc::new(NamePolicy::default()),
    }
}

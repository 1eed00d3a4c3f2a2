//! Pipeline: per-request orchestration.
//!
//! job description -> criteria (recovery) -> CriteriaSet; then for each resume:
//! text -> name (recovery + NamePolicy) -> scores (recovery + aggregator) -> ResumeResult.
//!
//! A resume failing at any stage becomes an error row and never affects its siblings.
//! Resumes run concurrently up to `max_concurrent`; results are put back in upload order
//! before the table sorts them, so completion order never leaks into the report.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::documents::{extract_blocking, DocumentProcessor, UploadedFile};
use crate::errors::AppError;
use crate::ranking::aggregator::aggregate;
use crate::ranking::completion::{Completion, CompletionTask};
use crate::ranking::models::{
    fallback_identifier, CriteriaSet, Importance, NameRecord, ResumeResult,
};
use crate::ranking::name_policy::NamePolicy;
use crate::ranking::recovery::{recover_criteria, recover_name, recover_scores};
use crate::ranking::table::RankingTable;
use crate::state::AppState;

pub const EMPTY_RESUME_MESSAGE: &str = "Resume content cannot be empty";

#[derive(Clone)]
pub struct RankingPipeline {
    completion: Arc<dyn Completion>,
    documents: Arc<dyn DocumentProcessor>,
    name_policy: Arc<NamePolicy>,
    max_concurrent: usize,
}

impl RankingPipeline {
    pub fn new(
        completion: Arc<dyn Completion>,
        documents: Arc<dyn DocumentProcessor>,
        name_policy: Arc<NamePolicy>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            completion,
            documents,
            name_policy,
            max_concurrent: max_concurrent.max(1),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.completion),
            Arc::clone(&state.documents),
            Arc::clone(&state.name_policy),
            state.config.max_concurrent_resumes,
        )
    }

    // ────────────────────────────────────────────────────────────────────────
    // Criteria
    // ────────────────────────────────────────────────────────────────────────

    /// Extracts the job description's text, then its criteria. Any failure aborts the
    /// request: there is nothing to score against.
    pub async fn criteria_from_document(&self, file: UploadedFile) -> Result<CriteriaSet, AppError> {
        let filename = file.filename.clone();
        let text = extract_blocking(Arc::clone(&self.documents), file).await?;
        if text.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "No text could be extracted from '{filename}'"
            )));
        }
        self.extract_criteria(&text).await
    }

    pub async fn extract_criteria(&self, job_description: &str) -> Result<CriteriaSet, AppError> {
        if job_description.trim().is_empty() {
            return Err(AppError::Validation(
                "Job description text cannot be empty".to_string(),
            ));
        }

        let raw = self
            .completion
            .run(&CompletionTask::ExtractCriteria { job_description })
            .await
            .map_err(|e| AppError::Llm(e.to_string()))?;

        let recovered = recover_criteria(&raw).map_err(|e| {
            AppError::Validation(format!(
                "Could not extract criteria from the job description: {e}"
            ))
        })?;

        let criteria = CriteriaSet::from_texts(recovered.value).ok_or_else(|| {
            AppError::Validation("No criteria could be extracted from the job description".to_string())
        })?;

        let required = criteria
            .iter()
            .filter(|c| c.importance() == Some(Importance::Required))
            .count();
        info!(
            "Extracted {} criteria ({} required) at stage '{}'",
            criteria.len(),
            required,
            recovered.stage.as_str()
        );
        Ok(criteria)
    }

    // ────────────────────────────────────────────────────────────────────────
    // Resumes
    // ────────────────────────────────────────────────────────────────────────

    /// Never fails: every failure is folded into an error row.
    pub async fn score_resume(&self, file: UploadedFile, criteria: &CriteriaSet) -> ResumeResult {
        let fallback = fallback_identifier(&file.filename);
        let filename = file.filename.clone();

        let text = match extract_blocking(Arc::clone(&self.documents), file).await {
            Ok(text) => text,
            Err(e) => {
                error!("Error processing resume '{filename}': {e}");
                return ResumeResult::failed(fallback, e.to_string());
            }
        };
        if text.trim().is_empty() {
            error!("Error processing resume '{filename}': {EMPTY_RESUME_MESSAGE}");
            return ResumeResult::failed(fallback, EMPTY_RESUME_MESSAGE);
        }

        let proposed = match self
            .completion
            .run(&CompletionTask::ExtractName {
                resume_text: &text,
                filename: &filename,
            })
            .await
        {
            Ok(raw) => recover_name(&raw),
            Err(e) => {
                warn!("Name extraction failed for '{filename}': {e}");
                NameRecord::unrecovered()
            }
        };
        let name = self.name_policy.accept(proposed, &fallback);

        let raw = match self
            .completion
            .run(&CompletionTask::ScoreResume {
                resume_text: &text,
                criteria: criteria.as_slice(),
            })
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                error!("Error processing resume '{filename}': {e}");
                return ResumeResult::failed(fallback, format!("Failed to score resume: {e}"));
            }
        };

        let entries = match recover_scores(&raw) {
            Ok(recovered) => recovered.value,
            Err(_) => {
                warn!("Using default scores (0) for all criteria for '{filename}'");
                Vec::new()
            }
        };
        let scores = aggregate(&entries, criteria);

        info!(
            "Scored '{}' as '{}' ({}), total {}",
            filename,
            name.name,
            name.source,
            scores.total()
        );
        ResumeResult::scored(name.name, scores)
    }

    /// Results come back in upload order.
    pub async fn score_batch(
        &self,
        files: Vec<UploadedFile>,
        criteria: &CriteriaSet,
    ) -> Vec<ResumeResult> {
        let batch_id = Uuid::new_v4();
        info!(
            %batch_id,
            "Scoring {} resumes against {} criteria ({} at a time)",
            files.len(),
            criteria.len(),
            self.max_concurrent
        );

        let mut indexed: Vec<(usize, ResumeResult)> = stream::iter(files.into_iter().enumerate())
            .map(|(index, file)| {
                let span = info_span!("resume", %batch_id, index, file = %file.filename);
                async move { (index, self.score_resume(file, criteria).await) }.instrument(span)
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<ResumeResult> = indexed.into_iter().map(|(_, result)| result).collect();

        info!(
            %batch_id,
            "Batch finished: {} scored, {} failed",
            results.iter().filter(|r| !r.is_error()).count(),
            results.iter().filter(|r| r.is_error()).count()
        );
        results
    }

    pub async fn rank(
        &self,
        files: Vec<UploadedFile>,
        criteria: &CriteriaSet,
    ) -> Result<RankingTable, AppError> {
        let results = self.score_batch(files, criteria).await;
        RankingTable::build(&results)
    }
}

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::documents::UploadedFile;
use crate::errors::AppError;
use crate::ranking::models::CriteriaSet;
use crate::ranking::pipeline::RankingPipeline;
use crate::ranking::table::RankingTable;
use crate::state::AppState;

pub const CSV_FILENAME: &str = "resume_scores.csv";

#[derive(Debug, Serialize)]
pub struct CriteriaResponse {
    pub criteria: Vec<String>,
}

/// POST /extract-criteria
/// Multipart field `file`: the job description (PDF or DOCX).
pub async fn handle_extract_criteria(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CriteriaResponse>, AppError> {
    let mut form = UploadForm::read(multipart?).await?;
    let job_description = form.file("file")?;
    info!("Extracting criteria from '{}'", job_description.filename);

    let criteria = RankingPipeline::from_state(&state)
        .criteria_from_document(job_description)
        .await?;

    Ok(Json(CriteriaResponse {
        criteria: criteria.texts(),
    }))
}

/// POST /score-resumes
/// Multipart fields: `criteria` (JSON array, `{"criteria": [...]}` or comma-separated
/// text) and one or more `resumes` files. Responds with the CSV report.
pub async fn handle_score_resumes(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut form = UploadForm::read(multipart?).await?;
    let raw_criteria = form
        .text("criteria")
        .ok_or_else(|| AppError::Validation("Missing 'criteria' field".to_string()))?;
    let criteria = parse_criteria_field(&raw_criteria)?;
    let resumes = form.resumes()?;
    info!(
        "Scoring {} resumes against {} provided criteria",
        resumes.len(),
        criteria.len()
    );

    let table = RankingPipeline::from_state(&state)
        .rank(resumes, &criteria)
        .await?;
    csv_response(&table)
}

/// POST /all
/// Multipart fields: `job_description` file and one or more `resumes` files.
pub async fn handle_full_pipeline(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut form = UploadForm::read(multipart?).await?;
    let job_description = form.file("job_description")?;
    let resumes = form.resumes()?;

    let pipeline = RankingPipeline::from_state(&state);
    let criteria = pipeline.criteria_from_document(job_description).await?;
    info!(
        "Extracted {} criteria, scoring {} resumes",
        criteria.len(),
        resumes.len()
    );

    let table = pipeline.rank(resumes, &criteria).await?;
    csv_response(&table)
}

fn csv_response(table: &RankingTable) -> Result<Response, AppError> {
    let body = table.to_csv()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={CSV_FILENAME}"),
            ),
        ],
        body,
    )
        .into_response())
}

/// Accepts a JSON array, an object with a `criteria` array, or comma-separated text.
/// Any other JSON shape is rejected.
pub fn parse_criteria_field(raw: &str) -> Result<CriteriaSet, AppError> {
    let invalid = |detail: &str| AppError::Validation(format!("Invalid criteria format: {detail}"));

    let texts: Vec<String> = match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Array(items)) => string_items(items),
        Ok(Value::Object(mut object)) => match object.remove("criteria") {
            Some(Value::Array(items)) => string_items(items),
            _ => return Err(invalid("expected array or object with 'criteria' key")),
        },
        Ok(_) => return Err(invalid("expected array or object with 'criteria' key")),
        Err(_) => raw
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
    };

    CriteriaSet::from_texts(texts).ok_or_else(|| invalid("No valid criteria provided"))
}

fn string_items(items: Vec<Value>) -> Vec<String> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(text) => Some(text),
            other => {
                warn!("Dropping non-string criterion: {other}");
                None
            }
        })
        .collect()
}

/// Every multipart part, buffered in arrival order.
struct UploadForm {
    parts: Vec<(String, UploadedFile)>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut parts = Vec::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            parts.push((name, UploadedFile::new(filename, bytes)));
        }
        Ok(Self { parts })
    }

    fn file(&mut self, field: &str) -> Result<UploadedFile, AppError> {
        let index = self
            .parts
            .iter()
            .position(|(name, _)| name == field)
            .ok_or_else(|| AppError::Validation(format!("Missing '{field}' file")))?;
        Ok(self.parts.remove(index).1)
    }

    fn text(&self, field: &str) -> Option<String> {
        self.parts
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, part)| String::from_utf8_lossy(&part.bytes).into_owned())
    }

    fn resumes(&mut self) -> Result<Vec<UploadedFile>, AppError> {
        let (resumes, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.parts)
            .into_iter()
            .partition(|(name, _)| name == "resumes");
        self.parts = rest;

        if resumes.is_empty() {
            return Err(AppError::Validation(
                "At least one resume file is required".to_string(),
            ));
        }
        Ok(resumes.into_iter().map(|(_, file)| file).collect())
    }
}

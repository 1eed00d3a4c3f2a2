//! RankingTable: flattens per-resume results into display rows and the CSV report.
//!
//! Columns are criterion texts with the importance prefix stripped, in first-seen order
//! across scored results. Rows sort by total descending; error rows carry no total and
//! always sort after every scored row, including rows that scored 0.

use std::cmp::Reverse;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::ranking::models::{display_name, ResumeResult};

pub const NAME_HEADER: &str = "Candidate Name";
pub const TOTAL_HEADER: &str = "Total Score";
pub const ERROR_HEADER: &str = "Error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRow {
    pub candidate_name: String,
    /// One score per table column. Empty for error rows.
    pub cells: Vec<u8>,
    /// `None` means the resume could not be scored, which is not the same as scoring 0.
    pub total: Option<u32>,
    pub error: Option<String>,
}

impl RankingRow {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingTable {
    pub columns: Vec<String>,
    pub rows: Vec<RankingRow>,
}

impl RankingTable {
    /// Fails with `BatchFailed` when no resume produced scores.
    pub fn build(results: &[ResumeResult]) -> Result<Self, AppError> {
        if results.is_empty() {
            return Err(AppError::BatchFailed("No resumes were processed".to_string()));
        }
        if results.iter().all(ResumeResult::is_error) {
            let details = results
                .iter()
                .map(|r| {
                    format!(
                        "{}: {}",
                        r.candidate_name,
                        r.error.as_deref().unwrap_or_default()
                    )
                })
                .collect::<Vec<_>>()
                .join("; ");
            warn!("All {} resumes failed", results.len());
            return Err(AppError::BatchFailed(format!(
                "All resumes failed to process. {details}"
            )));
        }

        let mut columns: Vec<String> = Vec::new();
        for result in results.iter().filter(|r| !r.is_error()) {
            for key in result.scores.keys() {
                let column = display_name(key);
                if !columns.iter().any(|c| c == column) {
                    columns.push(column.to_string());
                }
            }
        }

        let mut rows: Vec<RankingRow> = results
            .iter()
            .map(|result| match &result.error {
                Some(error) => RankingRow {
                    candidate_name: result.candidate_name.clone(),
                    cells: Vec::new(),
                    total: None,
                    error: Some(error.clone()),
                },
                None => {
                    let cells: Vec<u8> = columns
                        .iter()
                        .map(|column| {
                            // first criterion wins when two collapse to the same column
                            result
                                .scores
                                .iter()
                                .find(|(key, _)| display_name(key) == column.as_str())
                                .map(|(_, score)| score)
                                .unwrap_or(0)
                        })
                        .collect();
                    let total = cells.iter().map(|&s| u32::from(s)).sum();
                    RankingRow {
                        candidate_name: result.candidate_name.clone(),
                        cells,
                        total: Some(total),
                        error: None,
                    }
                }
            })
            .collect();

        // stable: ties keep upload order
        rows.sort_by_key(|row| (row.total.is_none(), Reverse(row.total.unwrap_or(0))));

        info!(
            "Ranked {} resumes ({} failed) over {} criteria",
            rows.len(),
            rows.iter().filter(|r| r.is_error()).count(),
            columns.len()
        );

        Ok(Self { columns, rows })
    }

    pub fn has_errors(&self) -> bool {
        self.rows.iter().any(RankingRow::is_error)
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.columns.len() + 3);
        header.push(NAME_HEADER.to_string());
        header.extend(self.columns.iter().cloned());
        header.push(TOTAL_HEADER.to_string());
        if self.has_errors() {
            header.push(ERROR_HEADER.to_string());
        }
        header
    }

    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let with_errors = self.has_errors();
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(self.header())?;

        for row in &self.rows {
            let mut record = Vec::with_capacity(self.columns.len() + 3);
            record.push(row.candidate_name.clone());
            match row.total {
                Some(total) => {
                    record.extend(row.cells.iter().map(u8::to_string));
                    record.push(total.to_string());
                }
                None => {
                    record.extend(std::iter::repeat(String::new()).take(self.columns.len() + 1));
                }
            }
            if with_errors {
                record.push(row.error.clone().unwrap_or_default());
            }
            writer.write_record(&record)?;
        }

        writer
            .into_inner()
            .map_err(|e| anyhow!("failed to flush CSV report: {e}"))
    }
}

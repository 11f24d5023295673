//! Completion-report artifact for jobs that never produced one.
//!
//! The report body is opaque to the rest of the system: backends only append
//! classified errors and persist the artifact at the path the workflow
//! engine expects (`Report.<retry_count>.pkl` under the job cache).

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One classified error inside a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub category: String,
    pub code: i64,
    pub kind: String,
    pub message: String,
}

/// Synthesized job completion report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobReport {
    errors: Vec<ReportEntry>,
}

impl JobReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a classified error.
    pub fn add_error(&mut self, category: &str, code: i64, kind: &str, message: &str) {
        self.errors.push(ReportEntry {
            category: category.to_string(),
            code,
            kind: kind.to_string(),
            message: message.to_string(),
        });
    }

    pub fn errors(&self) -> &[ReportEntry] {
        &self.errors
    }

    pub fn save(&self, path: &Utf8Path) -> Result<(), ReportError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn load(path: &Utf8Path) -> Result<Self, ReportError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

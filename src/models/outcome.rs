use serde::{Deserialize, Serialize};

use crate::models::SeriesProvenance;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failure,
}

/// Result of consolidating one catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub status: OutcomeStatus,
    pub detail: String,
    pub valid_lines: usize,
    pub total_lines: usize,
}

impl FileOutcome {
    pub fn success(provenance: &SeriesProvenance) -> Self {
        Self {
            file_name: provenance.source_file.clone(),
            status: OutcomeStatus::Success,
            detail: format!(
                "{} of {} lines parsed ({} discarded)",
                provenance.valid_lines,
                provenance.total_lines,
                provenance.error_lines()
            ),
            valid_lines: provenance.valid_lines,
            total_lines: provenance.total_lines,
        }
    }

    pub fn failure(file_name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            status: OutcomeStatus::Failure,
            detail: detail.into(),
            valid_lines: 0,
            total_lines: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

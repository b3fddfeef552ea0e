//! CSV import pipeline: parsing, per-row validation, reference resolution and
//! batch orchestration for candidates, exam results and survey responses.

pub mod candidates;
pub mod exam_results;
pub mod parser;
pub mod service;
pub mod survey_responses;
pub mod template;
pub mod validators;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

pub use parser::{parse_rows, preview, CsvPreview, CsvRow, ParseError};
pub use service::{ImportPreview, ImportService, ImportSummary};
pub use template::template;

/// The three record families a CSV upload can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Candidates,
    ExamResults,
    SurveyResponses,
}

impl ImportKind {
    pub const ALL: [ImportKind; 3] = [
        ImportKind::Candidates,
        ImportKind::ExamResults,
        ImportKind::SurveyResponses,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ImportKind::Candidates => "candidates",
            ImportKind::ExamResults => "exam_results",
            ImportKind::SurveyResponses => "survey_responses",
        }
    }

    pub const fn required_columns(self) -> &'static [&'static str] {
        match self {
            ImportKind::Candidates => &["full_name", "email"],
            ImportKind::ExamResults => &["candidate_email", "exam_title", "score", "result_date"],
            ImportKind::SurveyResponses => &["candidate_email", "survey_type", "rating"],
        }
    }

    pub const fn optional_columns(self) -> &'static [&'static str] {
        match self {
            ImportKind::Candidates => &[
                "phone",
                "linkedin_url",
                "github_url",
                "portfolio_url",
                "resume_url",
                "photo_url",
                "role",
                "skill_level",
                "is_public",
                "cohort_name",
            ],
            ImportKind::ExamResults => &["max_score", "result_status", "feedback"],
            ImportKind::SurveyResponses => &["feedback", "reviewer_name", "submitted_at"],
        }
    }

    pub fn template_filename(self) -> String {
        format!("{}_template.csv", self.as_str())
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown import type '{0}' (expected candidates, exam_results or survey_responses)")]
pub struct UnknownImportKind(pub String);

impl FromStr for ImportKind {
    type Err = UnknownImportKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        ImportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| UnknownImportKind(value.to_string()))
    }
}

/// Why a single row was rejected. The batch carries on without it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("invalid {field} '{value}': expected {expected}")]
    Validation {
        field: &'static str,
        value: String,
        expected: String,
    },
    #[error("{entity} not found: {key}")]
    ReferenceNotFound { entity: &'static str, key: String },
    #[error("duplicate {entity}: '{key}' already exists")]
    Duplicate { entity: &'static str, key: String },
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RowError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { entity, key } => RowError::Duplicate { entity, key },
            StoreError::NotFound { entity, key } => RowError::ReferenceNotFound { entity, key },
            other => RowError::Store(other),
        }
    }
}

/// Failure that stops a whole batch.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to read import file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("record store unavailable while importing row {row}: {source}")]
    StoreUnavailable {
        row: usize,
        #[source]
        source: StoreError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_route_segments() {
        assert_eq!("candidates".parse::<ImportKind>(), Ok(ImportKind::Candidates));
        assert_eq!("Exam_Results".parse::<ImportKind>(), Ok(ImportKind::ExamResults));
        assert_eq!(
            "survey-responses".parse::<ImportKind>(),
            Ok(ImportKind::SurveyResponses)
        );
        assert_eq!(
            "events".parse::<ImportKind>(),
            Err(UnknownImportKind("events".to_string()))
        );
    }

    #[test]
    fn store_conflicts_become_duplicates() {
        let error = RowError::from(StoreError::Conflict {
            entity: "candidate",
            key: "ada@example.com".to_string(),
        });
        assert_eq!(
            error.to_string(),
            "duplicate candidate: 'ada@example.com' already exists"
        );

        let unavailable = RowError::from(StoreError::Unavailable("timeout".to_string()));
        assert!(matches!(unavailable, RowError::Store(ref inner) if inner.is_unavailable()));
    }

    #[test]
    fn template_filenames_follow_kind() {
        assert_eq!(
            ImportKind::SurveyResponses.template_filename(),
            "survey_responses_template.csv"
        );
    }
}

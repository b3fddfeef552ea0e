use std::fs;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::parser::{self, CsvRow};
use super::{candidates, exam_results, survey_responses};
use super::{ImportError, ImportKind, RowError};
use crate::config::ImportConfig;
use crate::store::TalentStore;

/// Outcome of one batch. Row failures are counted and described, never raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub kind: ImportKind,
    pub imported: usize,
    pub errors: usize,
    pub error_details: Vec<String>,
}

impl ImportSummary {
    fn new(kind: ImportKind) -> Self {
        Self {
            kind,
            imported: 0,
            errors: 0,
            error_details: Vec::new(),
        }
    }

    fn reject(&mut self, row: &CsvRow, error: &RowError) {
        self.errors += 1;
        self.error_details
            .push(format!("Row {}: {}", row.number(), error));
    }

    /// The first `limit` error details; callers decide how many to surface.
    pub fn error_preview(&self, limit: usize) -> &[String] {
        &self.error_details[..self.error_details.len().min(limit)]
    }

    pub fn message(&self) -> String {
        format!(
            "Successfully imported {} records. {} errors.",
            self.imported, self.errors
        )
    }
}

/// First rows of an upload, plus the required columns its header lacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportPreview {
    pub kind: ImportKind,
    pub columns: Vec<String>,
    pub rows: Vec<CsvRow>,
    pub missing_columns: Vec<&'static str>,
}

impl ImportPreview {
    pub fn build(kind: ImportKind, text: &str, limit: usize) -> Result<Self, ImportError> {
        let preview = parser::preview(text, limit)?;
        let missing_columns = kind
            .required_columns()
            .iter()
            .copied()
            .filter(|column| !preview.headers.iter().any(|header| header == column))
            .collect();

        Ok(Self {
            kind,
            columns: preview.headers,
            rows: preview.rows,
            missing_columns,
        })
    }
}

/// Runs CSV batches against a store, one row at a time.
///
/// Batches submitted through the same service never interleave, so the
/// find-or-create lookups for exams and surveys see each other's writes.
pub struct ImportService<S> {
    store: Arc<S>,
    limits: ImportConfig,
    batch: Mutex<()>,
}

impl<S> ImportService<S>
where
    S: TalentStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_limits(store, ImportConfig::default())
    }

    pub fn with_limits(store: Arc<S>, limits: ImportConfig) -> Self {
        Self {
            store,
            limits,
            batch: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn limits(&self) -> ImportConfig {
        self.limits
    }

    /// Parses the first configured number of rows without writing anything.
    pub fn preview(&self, kind: ImportKind, text: &str) -> Result<ImportPreview, ImportError> {
        ImportPreview::build(kind, text, self.limits.preview_rows)
    }

    pub fn import_path(
        &self,
        kind: ImportKind,
        path: impl AsRef<Path>,
    ) -> Result<ImportSummary, ImportError> {
        let text = fs::read_to_string(path)?;
        self.import_text(kind, &text)
    }

    /// Reads `reader` to the end and drops it before any row is processed.
    pub fn import_reader<R: Read>(
        &self,
        kind: ImportKind,
        mut reader: R,
    ) -> Result<ImportSummary, ImportError> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        drop(reader);
        self.import_text(kind, &text)
    }

    pub fn import_text(&self, kind: ImportKind, text: &str) -> Result<ImportSummary, ImportError> {
        self.import_text_at(kind, text, Utc::now())
    }

    /// `now` stamps enrollments and survey responses that carry no date.
    pub fn import_text_at(
        &self,
        kind: ImportKind,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<ImportSummary, ImportError> {
        let rows = parser::parse_rows(text)?;
        let _batch = self.batch.lock().expect("import batch mutex poisoned");

        let mut summary = ImportSummary::new(kind);
        for row in &rows {
            match self.import_row(kind, row, now) {
                Ok(()) => {
                    summary.imported += 1;
                    debug!(kind = %kind, row = row.number(), "row imported");
                }
                Err(RowError::Store(source)) if source.is_unavailable() => {
                    warn!(kind = %kind, row = row.number(), error = %source, "import aborted");
                    return Err(ImportError::StoreUnavailable {
                        row: row.number(),
                        source,
                    });
                }
                Err(error) => {
                    warn!(
                        kind = %kind,
                        row = row.number(),
                        line = row.line(),
                        error = %error,
                        "row rejected"
                    );
                    summary.reject(row, &error);
                }
            }
        }

        info!(
            kind = %kind,
            imported = summary.imported,
            errors = summary.errors,
            "import finished"
        );
        Ok(summary)
    }

    fn import_row(
        &self,
        kind: ImportKind,
        row: &CsvRow,
        now: DateTime<Utc>,
    ) -> Result<(), RowError> {
        let store = self.store.as_ref();
        match kind {
            ImportKind::Candidates => {
                let import = candidates::parse_row(row)?;
                candidates::write_row(store, import, now.date_naive())?;
            }
            ImportKind::ExamResults => {
                let import = exam_results::parse_row(row)?;
                exam_results::write_row(store, import)?;
            }
            ImportKind::SurveyResponses => {
                let import = survey_responses::parse_row(row)?;
                survey_responses::write_row(store, import, now)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::ParseError;
    use crate::store::faulty::FaultyStore;
    use crate::store::{InMemoryTalentStore, NewCandidate};

    fn faulty_service_with_ada() -> (Arc<FaultyStore>, ImportService<FaultyStore>) {
        let store = Arc::new(FaultyStore::new());
        store
            .insert_candidate(NewCandidate {
                full_name: "Ada Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                ..NewCandidate::default()
            })
            .expect("candidate inserted");
        let service = ImportService::new(Arc::clone(&store));
        (store, service)
    }

    fn service() -> ImportService<InMemoryTalentStore> {
        ImportService::new(Arc::new(InMemoryTalentStore::new()))
    }

    #[test]
    fn rejected_rows_are_labelled_with_their_number() {
        let service = service();
        let summary = service
            .import_text(
                ImportKind::Candidates,
                "full_name,email\nAda,ada@example.com\n,grace@example.com\nLin,bad-email\n",
            )
            .expect("batch runs");

        assert_eq!(summary.imported, 1);
        assert_eq!(summary.errors, 2);
        assert_eq!(
            summary.error_details[0],
            "Row 2: missing required field 'full_name'"
        );
        assert!(summary.error_details[1].starts_with("Row 3: invalid email 'bad-email'"));
        assert_eq!(summary.error_preview(1).len(), 1);
        assert_eq!(summary.error_preview(10).len(), 2);
    }

    #[test]
    fn empty_file_is_a_file_level_error() {
        let error = service()
            .import_text(ImportKind::Candidates, "")
            .expect_err("empty file");
        assert!(matches!(error, ImportError::Parse(ParseError::Empty)));
    }

    #[test]
    fn reader_input_is_supported() {
        let reader = std::io::Cursor::new("full_name,email\nAda,ada@example.com\n");
        let summary = service()
            .import_reader(ImportKind::Candidates, reader)
            .expect("batch runs");
        assert_eq!(summary.message(), "Successfully imported 1 records. 0 errors.");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let error = service()
            .import_path(ImportKind::Candidates, "/nonexistent/candidates.csv")
            .expect_err("missing file");
        assert!(matches!(error, ImportError::Io(_)));
    }

    #[test]
    fn preview_uses_configured_row_limit() {
        let service = ImportService::with_limits(
            Arc::new(InMemoryTalentStore::new()),
            ImportConfig {
                preview_rows: 2,
                error_preview: 10,
            },
        );
        let preview = service
            .preview(ImportKind::Candidates, "full_name,email
A,a@x.io
B,b@x.io
C,c@x.io
")
            .expect("preview");
        assert_eq!(preview.rows.len(), 2);
        assert!(preview.missing_columns.is_empty());
    }

    #[test]
    fn preview_flags_missing_required_columns() {
        let preview = ImportPreview::build(
            ImportKind::ExamResults,
            "candidate_email,score\nada@example.com,90\n",
            5,
        )
        .expect("preview");
        assert_eq!(preview.columns, ["candidate_email", "score"]);
        assert_eq!(preview.missing_columns, ["exam_title", "result_date"]);
        assert_eq!(preview.rows.len(), 1);
    }

    #[test]
    fn unreachable_store_aborts_the_batch() {
        let store = Arc::new(FaultyStore::new());
        let service = ImportService::new(Arc::clone(&store));
        let csv = "full_name,email\nAda,ada@example.com\nGrace,grace@example.com\n";

        store.fail("insert_candidate");
        let error = service
            .import_text(ImportKind::Candidates, csv)
            .expect_err("store offline");
        match error {
            ImportError::StoreUnavailable { row, source } => {
                assert_eq!(row, 1);
                assert!(source.is_unavailable());
            }
            other => panic!("expected store outage, got {other:?}"),
        }
        assert!(store.inner.list_candidates().expect("list").is_empty());
    }

    #[test]
    fn exam_created_by_a_concurrent_writer_is_a_row_duplicate() {
        let (store, service) = faulty_service_with_ada();
        store.hide("find_exam_by_title");
        let csv = "candidate_email,exam_title,score,result_date\n\
                   ada@example.com,Final Exam,90,2025-03-01\n\
                   ada@example.com,Final Exam,85,2025-03-02\n\
                   ada@example.com,Midterm,70,2025-02-01\n";

        let summary = service
            .import_text(ImportKind::ExamResults, csv)
            .expect("batch runs");

        assert_eq!(summary.imported, 2);
        assert_eq!(
            summary.error_details,
            ["Row 2: duplicate exam: 'Final Exam' already exists"]
        );
        let titles: Vec<String> = store
            .inner
            .list_exams()
            .expect("list")
            .into_iter()
            .map(|exam| exam.title)
            .collect();
        assert_eq!(titles, ["Final Exam", "Midterm"]);
    }

    #[test]
    fn survey_created_by_a_concurrent_writer_is_a_row_duplicate() {
        let (store, service) = faulty_service_with_ada();
        store.hide("find_survey_by_title");
        let csv = "candidate_email,survey_type,rating\n\
                   ada@example.com,technical,4\n\
                   ada@example.com,Technical,5\n";

        let summary = service
            .import_text(ImportKind::SurveyResponses, csv)
            .expect("batch runs");

        assert_eq!(summary.imported, 1);
        assert_eq!(
            summary.error_details,
            ["Row 2: duplicate survey: 'technical Survey' already exists"]
        );
        assert_eq!(store.inner.list_surveys().expect("list").len(), 1);
    }
}

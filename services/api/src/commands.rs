use crate::infra::{parse_kind, Services};
use clap::Args;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use talent_directory::config::{AppConfig, ImportConfig};
use talent_directory::error::AppError;
use talent_directory::imports::{template, CsvRow, ImportKind, ImportSummary};
use talent_directory::store::InMemoryTalentStore;
use talent_directory::telemetry;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// Import type: candidates, exam_results or survey_responses
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: ImportKind,
    /// CSV file to check
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Candidates CSV loaded first so exam and survey rows can resolve emails
    #[arg(long)]
    pub(crate) with_candidates: Option<PathBuf>,
    /// Maximum number of row errors to print (defaults to APP_IMPORT_ERROR_PREVIEW)
    #[arg(long)]
    pub(crate) max_errors: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    /// Import type: candidates, exam_results or survey_responses
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: ImportKind,
    /// CSV file to preview
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Number of data rows to show (defaults to APP_IMPORT_PREVIEW_ROWS)
    #[arg(long)]
    pub(crate) rows: Option<usize>,
}

#[derive(Args, Debug)]
pub(crate) struct TemplateArgs {
    /// Import type: candidates, exam_results or survey_responses
    #[arg(long, value_parser = parse_kind)]
    pub(crate) kind: ImportKind,
    /// Write the template to this path instead of stdout
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ImportReport<'a> {
    kind: ImportKind,
    imported: usize,
    errors: usize,
    error_details: &'a [String],
    omitted_errors: usize,
    message: String,
}

impl<'a> ImportReport<'a> {
    fn new(summary: &'a ImportSummary, limit: usize) -> Self {
        let error_details = summary.error_preview(limit);
        Self {
            kind: summary.kind,
            imported: summary.imported,
            errors: summary.errors,
            error_details,
            omitted_errors: summary.error_details.len() - error_details.len(),
            message: summary.message(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PreviewReport<'a> {
    kind: ImportKind,
    columns: &'a [String],
    missing_columns: &'a [&'static str],
    rows: &'a [CsvRow],
}

fn load_limits() -> Result<ImportConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config.imports)
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let ImportArgs {
        kind,
        file,
        with_candidates,
        max_errors,
    } = args;

    let limits = load_limits()?;
    let services = Services::new(Arc::new(InMemoryTalentStore::new()), limits);

    if let Some(path) = with_candidates {
        let seeded = services.imports.import_path(ImportKind::Candidates, &path)?;
        info!(
            path = %path.display(),
            imported = seeded.imported,
            errors = seeded.errors,
            "reference candidates loaded"
        );
    }

    let summary = services.imports.import_path(kind, &file)?;
    let report = ImportReport::new(&summary, max_errors.unwrap_or(limits.error_preview));
    print_json(&report)
}

pub(crate) fn run_preview(args: PreviewArgs) -> Result<(), AppError> {
    let PreviewArgs { kind, file, rows } = args;

    let mut limits = load_limits()?;
    if let Some(rows) = rows {
        limits.preview_rows = rows;
    }
    let services = Services::new(Arc::new(InMemoryTalentStore::new()), limits);

    let text = fs::read_to_string(&file)?;
    let preview = services.imports.preview(kind, &text)?;
    print_json(&PreviewReport {
        kind: preview.kind,
        columns: &preview.columns,
        missing_columns: &preview.missing_columns,
        rows: &preview.rows,
    })
}

pub(crate) fn run_template(args: TemplateArgs) -> Result<(), AppError> {
    let contents = template(args.kind);
    match args.out {
        Some(path) => {
            fs::write(&path, contents)?;
            eprintln!("wrote {} template to {}", args.kind, path.display());
        }
        None => print!("{contents}"),
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::Other, err)))?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use talent_directory::imports::ImportService;

    #[test]
    fn report_truncates_error_details() {
        let service = ImportService::new(Arc::new(InMemoryTalentStore::new()));
        let summary = service
            .import_text(
                ImportKind::Candidates,
                "full_name,email\nA,bad\nB,worse\nC,c@example.com\n",
            )
            .expect("batch runs");

        let report = ImportReport::new(&summary, 1);
        assert_eq!(report.imported, 1);
        assert_eq!(report.errors, 2);
        assert_eq!(report.error_details.len(), 1);
        assert_eq!(report.omitted_errors, 1);
        assert!(report.error_details[0].starts_with("Row 1: invalid email"));
    }

    #[test]
    fn template_can_be_written_to_a_file() {
        let path = std::env::temp_dir().join(format!(
            "talent-directory-template-{}.csv",
            std::process::id()
        ));
        run_template(TemplateArgs {
            kind: ImportKind::SurveyResponses,
            out: Some(path.clone()),
        })
        .expect("template written");

        let written = fs::read_to_string(&path).expect("template readable");
        assert_eq!(written, template(ImportKind::SurveyResponses));
        fs::remove_file(path).ok();
    }
}

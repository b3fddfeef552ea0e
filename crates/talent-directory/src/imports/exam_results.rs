use chrono::NaiveDate;

use super::parser::CsvRow;
use super::validators::{
    date_field, email_field, enum_field, integer_field, invalid, optional, optional_owned,
    required,
};
use super::RowError;
use crate::store::{ExamRecord, ExamResultRecord, NewExam, NewExamResult, ResultStatus, TalentStore};

pub const DEFAULT_MAX_SCORE: i64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct ExamResultImport {
    pub candidate_email: String,
    pub exam_title: String,
    pub score: i64,
    pub max_score: i64,
    pub result_status: ResultStatus,
    pub result_date: NaiveDate,
    pub feedback: Option<String>,
}

pub fn parse_row(row: &CsvRow) -> Result<ExamResultImport, RowError> {
    let candidate_email = required(row, "candidate_email")?;
    let exam_title = required(row, "exam_title")?;
    let score = required(row, "score")?;
    let result_date = required(row, "result_date")?;

    let candidate_email = email_field("candidate_email", candidate_email)?;
    let score_value = integer_field("score", score)?;
    if score_value < 0 {
        return Err(invalid("score", score, "a non-negative whole number"));
    }
    let result_date = date_field("result_date", result_date)?;

    let max_score = match optional(row, "max_score") {
        Some(raw) => {
            let value = integer_field("max_score", raw)?;
            if value <= 0 {
                return Err(invalid("max_score", raw, "a positive whole number"));
            }
            value
        }
        None => DEFAULT_MAX_SCORE,
    };

    let result_status = optional(row, "result_status")
        .map(|value| {
            enum_field(
                "result_status",
                value,
                &ResultStatus::ALLOWED,
                ResultStatus::parse,
            )
        })
        .transpose()?
        .unwrap_or(ResultStatus::Completed);

    Ok(ExamResultImport {
        candidate_email,
        exam_title: exam_title.to_string(),
        score: score_value,
        max_score,
        result_status,
        result_date,
        feedback: optional_owned(row, "feedback"),
    })
}

pub fn write_row<S>(store: &S, import: ExamResultImport) -> Result<ExamResultRecord, RowError>
where
    S: TalentStore + ?Sized,
{
    let candidate = store
        .find_candidate_by_email(&import.candidate_email)?
        .ok_or_else(|| RowError::ReferenceNotFound {
            entity: "candidate",
            key: import.candidate_email.clone(),
        })?;

    let exam = find_or_create_exam(store, &import)?;

    let result = store.insert_exam_result(NewExamResult {
        candidate_id: candidate.candidate_id,
        exam_id: exam.exam_id,
        score: import.score,
        max_score: Some(import.max_score),
        result_status: Some(import.result_status),
        result_date: import.result_date,
        feedback: import.feedback,
    })?;
    Ok(result)
}

/// Exams are keyed by title. A new exam is dated by the first result that
/// mentions it.
fn find_or_create_exam<S>(store: &S, import: &ExamResultImport) -> Result<ExamRecord, RowError>
where
    S: TalentStore + ?Sized,
{
    if let Some(exam) = store.find_exam_by_title(&import.exam_title)? {
        return Ok(exam);
    }

    let exam = store.insert_exam(NewExam {
        title: import.exam_title.clone(),
        exam_date: import.result_date,
        max_score: Some(import.max_score),
    })?;
    Ok(exam)
}

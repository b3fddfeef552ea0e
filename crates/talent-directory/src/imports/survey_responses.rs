use chrono::{DateTime, Utc};

use super::parser::CsvRow;
use super::validators::{
    email_field, enum_field, integer_field, invalid, optional, optional_owned, required,
    timestamp_field,
};
use super::RowError;
use crate::store::{
    NewSurvey, NewSurveyResponse, SurveyRecord, SurveyResponseRecord, SurveyType, TalentStore,
};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyResponseImport {
    pub candidate_email: String,
    pub survey_type: SurveyType,
    pub rating: i64,
    pub feedback: Option<String>,
    pub reviewer_name: Option<String>,
    /// `None` means "stamp with the import time".
    pub submitted_at: Option<DateTime<Utc>>,
}

pub fn parse_row(row: &CsvRow) -> Result<SurveyResponseImport, RowError> {
    let candidate_email = required(row, "candidate_email")?;
    let survey_type = required(row, "survey_type")?;
    let rating = required(row, "rating")?;

    let candidate_email = email_field("candidate_email", candidate_email)?;
    let survey_type = enum_field(
        "survey_type",
        survey_type,
        &SurveyType::ALLOWED,
        SurveyType::parse,
    )?;
    let rating_value = integer_field("rating", rating)?;
    if !(MIN_RATING..=MAX_RATING).contains(&rating_value) {
        return Err(invalid("rating", rating, "a whole number from 1 to 5"));
    }
    let submitted_at = optional(row, "submitted_at")
        .map(|value| timestamp_field("submitted_at", value))
        .transpose()?;

    Ok(SurveyResponseImport {
        candidate_email,
        survey_type,
        rating: rating_value,
        feedback: optional_owned(row, "feedback"),
        reviewer_name: optional_owned(row, "reviewer_name"),
        submitted_at,
    })
}

pub fn write_row<S>(
    store: &S,
    import: SurveyResponseImport,
    now: DateTime<Utc>,
) -> Result<SurveyResponseRecord, RowError>
where
    S: TalentStore + ?Sized,
{
    let candidate = store
        .find_candidate_by_email(&import.candidate_email)?
        .ok_or_else(|| RowError::ReferenceNotFound {
            entity: "candidate",
            key: import.candidate_email.clone(),
        })?;

    let survey = find_or_create_survey(store, import.survey_type)?;

    let response = store.insert_survey_response(NewSurveyResponse {
        candidate_id: candidate.candidate_id,
        survey_id: survey.survey_id,
        rating: Some(import.rating),
        feedback: import.feedback,
        reviewer_name: import.reviewer_name,
        submitted_at: import.submitted_at.unwrap_or(now),
    })?;
    Ok(response)
}

fn find_or_create_survey<S>(store: &S, survey_type: SurveyType) -> Result<SurveyRecord, RowError>
where
    S: TalentStore + ?Sized,
{
    let title = survey_type.survey_title();
    if let Some(survey) = store.find_survey_by_title(&title)? {
        return Ok(survey);
    }

    let survey = store.insert_survey(NewSurvey {
        title,
        survey_type,
        max_rating: Some(MAX_RATING),
    })?;
    Ok(survey)
}

use chrono::NaiveDate;
use tracing::warn;

use super::parser::CsvRow;
use super::validators::{email_field, enum_field, is_truthy, optional, optional_owned, required};
use super::RowError;
use crate::store::{CandidateRecord, EnrollmentRecord, NewCandidate, SkillLevel, TalentStore};

/// A validated candidate row, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateImport {
    pub candidate: NewCandidate,
    pub cohort_name: Option<String>,
}

pub fn parse_row(row: &CsvRow) -> Result<CandidateImport, RowError> {
    let full_name = required(row, "full_name")?;
    let email = required(row, "email")?;

    let email = email_field("email", email)?;
    let skill_level = optional(row, "skill_level")
        .map(|value| enum_field("skill_level", value, &SkillLevel::ALLOWED, SkillLevel::parse))
        .transpose()?;

    let candidate = NewCandidate {
        full_name: full_name.to_string(),
        email,
        phone: optional_owned(row, "phone"),
        linkedin_url: optional_owned(row, "linkedin_url"),
        github_url: optional_owned(row, "github_url"),
        portfolio_url: optional_owned(row, "portfolio_url"),
        resume_url: optional_owned(row, "resume_url"),
        photo_url: optional_owned(row, "photo_url"),
        profile_summary: None,
        role: optional_owned(row, "role"),
        skill_level,
        is_public: optional(row, "is_public").is_some_and(is_truthy),
    };

    Ok(CandidateImport {
        candidate,
        cohort_name: optional_owned(row, "cohort_name"),
    })
}

/// Inserts the candidate and, when a cohort was named, enrolls it as of `today`.
///
/// The cohort is resolved before anything is written. If the enrollment fails
/// the candidate is deleted again.
pub fn write_row<S>(
    store: &S,
    import: CandidateImport,
    today: NaiveDate,
) -> Result<CandidateRecord, RowError>
where
    S: TalentStore + ?Sized,
{
    let cohort = match import.cohort_name.as_deref() {
        Some(name) => Some(store.find_cohort_by_name(name)?.ok_or_else(|| {
            RowError::ReferenceNotFound {
                entity: "cohort",
                key: name.to_string(),
            }
        })?),
        None => None,
    };

    let candidate = store.insert_candidate(import.candidate)?;

    if let Some(cohort) = cohort {
        let enrollment = EnrollmentRecord {
            candidate_id: candidate.candidate_id.clone(),
            cohort_id: cohort.cohort_id,
            enrollment_date: Some(today),
            completion_status: None,
        };
        if let Err(error) = store.enroll(enrollment) {
            if let Err(rollback) = store.delete_candidate(&candidate.candidate_id) {
                warn!(
                    candidate_id = %candidate.candidate_id,
                    error = %rollback,
                    "could not remove candidate after failed enrollment"
                );
            }
            return Err(error.into());
        }
    }

    Ok(candidate)
}

//! View models built from the store's nested candidate query.
//!
//! Everything here is a pure function of a [`CandidateAggregate`]: no store
//! access, no clock.

mod skills;
mod summary;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::store::{
    CandidateAggregate, CandidateId, CandidateRecord, ChallengeId, CohortId, CohortRecord, EventId,
    ExamId, ResultStatus, SkillLevel, SurveyId, SurveyType,
};

pub use skills::{derive_skills, DEFAULT_SKILLS, GENERAL_TOPIC};
pub use summary::synthesize_summary;

/// Overall rating reported for a candidate nobody has rated yet.
pub const DEFAULT_OVERALL_RATING: f64 = 4.5;

pub const DEFAULT_MAX_SCORE: i64 = 100;
pub const UNASSIGNED_COHORT_NAME: &str = "No Cohort Assigned";
pub const UNKNOWN_PROGRAM: &str = "Unknown Program";
pub const UNSPECIFIED_ROLE: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub full_name: String,
    pub email: String,
    pub cohort_id: Option<CohortId>,
    pub role: String,
    pub skill_level: Option<SkillLevel>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub resume_url: Option<String>,
    pub photo_url: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Candidate {
    pub fn from_record(record: &CandidateRecord, cohort_id: Option<CohortId>) -> Self {
        Self {
            id: record.candidate_id.clone(),
            full_name: record.full_name.clone(),
            email: record.email.clone(),
            cohort_id,
            role: record
                .role
                .clone()
                .filter(|role| !role.trim().is_empty())
                .unwrap_or_else(|| UNSPECIFIED_ROLE.to_string()),
            skill_level: record.skill_level,
            linkedin_url: record.linkedin_url.clone(),
            github_url: record.github_url.clone(),
            portfolio_url: record.portfolio_url.clone(),
            resume_url: record.resume_url.clone(),
            photo_url: record.photo_url.clone(),
            is_public: record.is_public,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Cohort as shown on a profile or a cohort card. Counts are filled in by the
/// directory service; a profile leaves them at zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cohort {
    pub id: Option<CohortId>,
    pub name: String,
    pub program_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub candidate_count: usize,
    pub avg_performance: f64,
}

impl Cohort {
    pub fn from_record(record: &CohortRecord) -> Self {
        Self {
            id: Some(record.cohort_id.clone()),
            name: record.cohort_name.clone(),
            program_name: record
                .program_name
                .clone()
                .unwrap_or_else(|| UNKNOWN_PROGRAM.to_string()),
            start_date: Some(record.start_date),
            end_date: Some(record.end_date),
            candidate_count: 0,
            avg_performance: 0.0,
        }
    }

    pub fn unassigned() -> Self {
        Self {
            id: None,
            name: UNASSIGNED_COHORT_NAME.to_string(),
            program_name: UNKNOWN_PROGRAM.to_string(),
            start_date: None,
            end_date: None,
            candidate_count: 0,
            avg_performance: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skill {
    pub name: String,
    pub level: i64,
    pub max_level: i64,
    /// Set on the placeholder skills shown before any challenge was scored.
    pub estimated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeResult {
    pub id: String,
    pub candidate_id: CandidateId,
    pub challenge_id: ChallengeId,
    pub challenge_title: String,
    pub topic: String,
    pub date: DateTime<Utc>,
    pub score: i64,
    pub max_score: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExamOutcome {
    Passed,
    Failed,
    Pending,
}

impl ExamOutcome {
    fn from_status(status: Option<ResultStatus>) -> Self {
        match status {
            Some(ResultStatus::Passed) => ExamOutcome::Passed,
            Some(ResultStatus::Failed) => ExamOutcome::Failed,
            _ => ExamOutcome::Pending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exam {
    pub id: String,
    pub candidate_id: CandidateId,
    pub exam_id: ExamId,
    pub exam_name: String,
    pub date_taken: NaiveDate,
    pub score: i64,
    pub max_score: i64,
    pub result: ExamOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Certification {
    pub id: String,
    pub candidate_id: CandidateId,
    pub cert_name: String,
    pub provider: String,
    pub issue_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub cert_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Survey {
    pub id: String,
    pub candidate_id: CandidateId,
    pub survey_id: SurveyId,
    pub survey_type: SurveyType,
    pub rating: Option<i64>,
    pub comment: String,
    pub date: DateTime<Utc>,
    pub reviewer_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: EventId,
    pub candidate_id: CandidateId,
    pub event_name: String,
    pub role: String,
    pub date: Option<NaiveDate>,
    pub resources_url: Option<String>,
}

/// Everything the profile page shows about one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateProfile {
    pub candidate: Candidate,
    /// First enrollment, or the unassigned placeholder.
    pub cohort: Cohort,
    pub enrolled_cohorts: usize,
    pub skills: Vec<Skill>,
    pub challenge_results: Vec<ChallengeResult>,
    pub exams: Vec<Exam>,
    pub certifications: Vec<Certification>,
    pub surveys: Vec<Survey>,
    pub events: Vec<Event>,
    /// Hand-written summary stored on the candidate, if any.
    pub stored_summary: Option<String>,
    pub generated_summary: String,
    pub overall_rating: f64,
}

impl CandidateProfile {
    pub fn from_aggregate(aggregate: &CandidateAggregate) -> Self {
        let first_enrollment = aggregate.cohorts.first();
        let candidate = Candidate::from_record(
            &aggregate.candidate,
            first_enrollment.map(|row| row.record.cohort_id.clone()),
        );
        let cohort = first_enrollment
            .and_then(|row| row.joined.as_ref())
            .map(Cohort::from_record)
            .unwrap_or_else(Cohort::unassigned);

        let challenge_results: Vec<ChallengeResult> = aggregate
            .challenge_results
            .iter()
            .map(|row| {
                let challenge = row.joined.as_ref();
                ChallengeResult {
                    id: row.record.result_id.clone(),
                    candidate_id: row.record.candidate_id.clone(),
                    challenge_id: row.record.challenge_id.clone(),
                    challenge_title: challenge
                        .map(|challenge| challenge.title.clone())
                        .unwrap_or_else(|| "Unknown Challenge".to_string()),
                    topic: challenge
                        .and_then(|challenge| challenge.topic.clone())
                        .filter(|topic| !topic.is_empty())
                        .unwrap_or_else(|| GENERAL_TOPIC.to_string()),
                    date: row.record.submitted_at,
                    score: row.record.score,
                    max_score: effective_max(row.record.max_score),
                }
            })
            .collect();

        let exams = aggregate
            .exam_results
            .iter()
            .map(|row| Exam {
                id: row.record.result_id.clone(),
                candidate_id: row.record.candidate_id.clone(),
                exam_id: row.record.exam_id.clone(),
                exam_name: row
                    .joined
                    .as_ref()
                    .map(|exam| exam.title.clone())
                    .unwrap_or_else(|| "Unknown Exam".to_string()),
                date_taken: row.record.result_date,
                score: row.record.score,
                max_score: effective_max(row.record.max_score),
                result: ExamOutcome::from_status(row.record.result_status),
            })
            .collect();

        let certifications = aggregate
            .certificates
            .iter()
            .map(|certificate| Certification {
                id: certificate.certificate_id.clone(),
                candidate_id: certificate.candidate_id.clone(),
                cert_name: certificate.title.clone(),
                provider: certificate.issuer.clone(),
                issue_date: certificate.issue_date,
                expiration_date: certificate.expiration_date,
                cert_url: certificate.certificate_url.clone(),
            })
            .collect();

        let surveys: Vec<Survey> = aggregate
            .survey_responses
            .iter()
            .map(|row| Survey {
                id: row.record.response_id.clone(),
                candidate_id: row.record.candidate_id.clone(),
                survey_id: row.record.survey_id.clone(),
                survey_type: row
                    .joined
                    .as_ref()
                    .map_or(SurveyType::Overall, |survey| survey.survey_type),
                rating: row.record.rating,
                comment: row.record.feedback.clone().unwrap_or_default(),
                date: row.record.submitted_at,
                reviewer_name: row
                    .record
                    .reviewer_name
                    .clone()
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| "Anonymous".to_string()),
            })
            .collect();

        let events = aggregate
            .events
            .iter()
            .map(|row| {
                let event = row.joined.as_ref();
                Event {
                    id: row.record.event_id.clone(),
                    candidate_id: row.record.candidate_id.clone(),
                    event_name: event
                        .map(|event| event.title.clone())
                        .unwrap_or_else(|| "Unknown Event".to_string()),
                    role: row
                        .record
                        .participation_role
                        .clone()
                        .unwrap_or_else(|| "Participant".to_string()),
                    date: event.and_then(|event| event.event_date),
                    resources_url: event.and_then(|event| event.resources_url.clone()),
                }
            })
            .collect();

        let mut profile = Self {
            skills: derive_skills(&challenge_results),
            overall_rating: overall_rating(&surveys),
            candidate,
            cohort,
            enrolled_cohorts: aggregate.cohorts.len(),
            challenge_results,
            exams,
            certifications,
            surveys,
            events,
            stored_summary: aggregate
                .candidate
                .profile_summary
                .clone()
                .filter(|summary| !summary.trim().is_empty()),
            generated_summary: String::new(),
        };
        profile.generated_summary = synthesize_summary(&profile);
        profile
    }

    /// The stored summary when one was written, otherwise the generated one.
    pub fn summary(&self) -> &str {
        self.stored_summary
            .as_deref()
            .unwrap_or(&self.generated_summary)
    }
}

/// Mean of the ratings that were given, or [`DEFAULT_OVERALL_RATING`].
pub fn overall_rating(surveys: &[Survey]) -> f64 {
    mean_rating(surveys).unwrap_or(DEFAULT_OVERALL_RATING)
}

pub(crate) fn mean_rating(surveys: &[Survey]) -> Option<f64> {
    let ratings: Vec<i64> = surveys.iter().filter_map(|survey| survey.rating).collect();
    if ratings.is_empty() {
        return None;
    }
    Some(ratings.iter().sum::<i64>() as f64 / ratings.len() as f64)
}

/// A missing or zero maximum is read as the default scale of 100.
pub(crate) fn effective_max(max_score: Option<i64>) -> i64 {
    max_score
        .filter(|max| *max != 0)
        .unwrap_or(DEFAULT_MAX_SCORE)
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! record_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(CandidateId);
record_id!(CohortId);
record_id!(ExamId);
record_id!(SurveyId);
record_id!(ChallengeId);
record_id!(EventId);

/// Self-reported proficiency captured on the candidate record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub const ALLOWED: [&'static str; 3] = ["beginner", "intermediate", "advanced"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

/// Category a survey belongs to; surveys are keyed by `"{type} Survey"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyType {
    Leadership,
    Collaboration,
    Technical,
    Overall,
    Challenge,
    Rating,
}

impl SurveyType {
    pub const ALLOWED: [&'static str; 6] = [
        "leadership",
        "collaboration",
        "technical",
        "overall",
        "challenge",
        "rating",
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "leadership" => Some(Self::Leadership),
            "collaboration" => Some(Self::Collaboration),
            "technical" => Some(Self::Technical),
            "overall" => Some(Self::Overall),
            "challenge" => Some(Self::Challenge),
            "rating" => Some(Self::Rating),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leadership => "leadership",
            Self::Collaboration => "collaboration",
            Self::Technical => "technical",
            Self::Overall => "overall",
            Self::Challenge => "challenge",
            Self::Rating => "rating",
        }
    }

    pub fn survey_title(self) -> String {
        format!("{} Survey", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Passed,
    Failed,
    Pending,
    Completed,
}

impl ResultStatus {
    pub const ALLOWED: [&'static str; 4] = ["passed", "failed", "pending", "completed"];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub candidate_id: CandidateId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub resume_url: Option<String>,
    pub photo_url: Option<String>,
    pub profile_summary: Option<String>,
    pub role: Option<String>,
    pub skill_level: Option<SkillLevel>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the store assigns the id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewCandidate {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub profile_summary: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
    #[serde(default)]
    pub is_public: bool,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateUpdate {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub portfolio_url: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub profile_summary: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl CandidateUpdate {
    pub(crate) fn apply(self, record: &mut CandidateRecord) {
        fn set<T>(slot: &mut T, value: Option<T>) {
            if let Some(value) = value {
                *slot = value;
            }
        }
        fn set_opt<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut record.full_name, self.full_name);
        set(&mut record.email, self.email);
        set_opt(&mut record.phone, self.phone);
        set_opt(&mut record.linkedin_url, self.linkedin_url);
        set_opt(&mut record.github_url, self.github_url);
        set_opt(&mut record.portfolio_url, self.portfolio_url);
        set_opt(&mut record.resume_url, self.resume_url);
        set_opt(&mut record.photo_url, self.photo_url);
        set_opt(&mut record.profile_summary, self.profile_summary);
        set_opt(&mut record.role, self.role);
        set_opt(&mut record.skill_level, self.skill_level);
        set(&mut record.is_public, self.is_public);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortRecord {
    pub cohort_id: CohortId,
    pub cohort_name: String,
    pub program_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCohort {
    pub cohort_name: String,
    #[serde(default)]
    pub program_name: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Partial cohort edit; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortUpdate {
    #[serde(default)]
    pub cohort_name: Option<String>,
    #[serde(default)]
    pub program_name: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CohortUpdate {
    pub(crate) fn apply(self, record: &mut CohortRecord) {
        if let Some(name) = self.cohort_name {
            record.cohort_name = name;
        }
        if self.program_name.is_some() {
            record.program_name = self.program_name;
        }
        if let Some(start) = self.start_date {
            record.start_date = start;
        }
        if let Some(end) = self.end_date {
            record.end_date = end;
        }
        if self.notes.is_some() {
            record.notes = self.notes;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub candidate_id: CandidateId,
    pub cohort_id: CohortId,
    pub enrollment_date: Option<NaiveDate>,
    pub completion_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamRecord {
    pub exam_id: ExamId,
    pub title: String,
    pub exam_date: NaiveDate,
    pub max_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExam {
    pub title: String,
    pub exam_date: NaiveDate,
    pub max_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResultRecord {
    pub result_id: String,
    pub candidate_id: CandidateId,
    pub exam_id: ExamId,
    pub score: i64,
    pub max_score: Option<i64>,
    pub result_status: Option<ResultStatus>,
    pub result_date: NaiveDate,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExamResult {
    pub candidate_id: CandidateId,
    pub exam_id: ExamId,
    pub score: i64,
    pub max_score: Option<i64>,
    pub result_status: Option<ResultStatus>,
    pub result_date: NaiveDate,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyRecord {
    pub survey_id: SurveyId,
    pub title: String,
    pub survey_type: SurveyType,
    pub max_rating: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSurvey {
    pub title: String,
    pub survey_type: SurveyType,
    pub max_rating: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyResponseRecord {
    pub response_id: String,
    pub candidate_id: CandidateId,
    pub survey_id: SurveyId,
    pub rating: Option<i64>,
    pub feedback: Option<String>,
    pub reviewer_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSurveyResponse {
    pub candidate_id: CandidateId,
    pub survey_id: SurveyId,
    pub rating: Option<i64>,
    pub feedback: Option<String>,
    pub reviewer_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeRecord {
    pub challenge_id: ChallengeId,
    pub title: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChallenge {
    pub title: String,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResultRecord {
    pub result_id: String,
    pub candidate_id: CandidateId,
    pub challenge_id: ChallengeId,
    pub score: i64,
    pub max_score: Option<i64>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChallengeResult {
    pub candidate_id: CandidateId,
    pub challenge_id: ChallengeId,
    pub score: i64,
    pub max_score: Option<i64>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: EventId,
    pub title: String,
    pub event_date: Option<NaiveDate>,
    pub resources_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub resources_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRecord {
    pub candidate_id: CandidateId,
    pub event_id: EventId,
    pub participation_role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificateRecord {
    pub certificate_id: String,
    pub candidate_id: CandidateId,
    pub title: String,
    pub issuer: String,
    pub issue_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub certificate_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCertificate {
    pub candidate_id: CandidateId,
    pub title: String,
    pub issuer: String,
    pub issue_date: NaiveDate,
    pub expiration_date: Option<NaiveDate>,
    pub certificate_url: Option<String>,
}

/// A record paired with the row it references, as returned by a joined query.
/// The joined side is optional because the reference may have been deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Joined<T, U> {
    pub record: T,
    pub joined: Option<U>,
}

/// Nested query result for a single candidate with every related collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAggregate {
    pub candidate: CandidateRecord,
    pub cohorts: Vec<Joined<EnrollmentRecord, CohortRecord>>,
    pub challenge_results: Vec<Joined<ChallengeResultRecord, ChallengeRecord>>,
    pub exam_results: Vec<Joined<ExamResultRecord, ExamRecord>>,
    pub survey_responses: Vec<Joined<SurveyResponseRecord, SurveyRecord>>,
    pub events: Vec<Joined<ParticipationRecord, EventRecord>>,
    pub certificates: Vec<CertificateRecord>,
}

impl CandidateAggregate {
    pub fn bare(candidate: CandidateRecord) -> Self {
        Self {
            candidate,
            cohorts: Vec::new(),
            challenge_results: Vec::new(),
            exam_results: Vec::new(),
            survey_responses: Vec::new(),
            events: Vec::new(),
            certificates: Vec::new(),
        }
    }
}

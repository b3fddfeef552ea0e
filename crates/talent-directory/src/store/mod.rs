//! Record-store contract consumed by the importers and the directory service.
//!
//! The hosted backend is an external collaborator; this module only describes the
//! operations the rest of the crate needs from it and ships an in-memory
//! implementation used by the binary and the tests.

#[cfg(test)]
pub(crate) mod faulty;
mod memory;
pub mod records;

pub use memory::InMemoryTalentStore;
pub use records::{
    CandidateAggregate, CandidateId, CandidateRecord, CandidateUpdate, CertificateRecord,
    ChallengeId, ChallengeRecord, ChallengeResultRecord, CohortId, CohortRecord, CohortUpdate,
    EnrollmentRecord, EventId, EventRecord, ExamId, ExamRecord, ExamResultRecord, Joined,
    NewCandidate, NewCertificate, NewChallenge, NewChallengeResult, NewCohort, NewEvent, NewExam,
    NewExamResult, NewSurvey, NewSurveyResponse, ParticipationRecord, ResultStatus, SkillLevel,
    SurveyId, SurveyRecord, SurveyResponseRecord, SurveyType,
};

/// Storage abstraction so importers and services can be exercised in isolation.
///
/// Implementations enforce the uniqueness constraints the importers rely on:
/// candidate email (case-insensitive), exam title, survey title, challenge
/// title, one enrollment per candidate/cohort pair and one participation per
/// candidate/event pair. A violation is reported as
/// [`StoreError::Conflict`].
pub trait TalentStore: Send + Sync {
    fn insert_candidate(&self, candidate: NewCandidate) -> Result<CandidateRecord, StoreError>;
    fn update_candidate(
        &self,
        id: &CandidateId,
        update: CandidateUpdate,
    ) -> Result<CandidateRecord, StoreError>;
    /// Removes the candidate together with every row that references it.
    fn delete_candidate(&self, id: &CandidateId) -> Result<(), StoreError>;
    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, StoreError>;
    fn find_candidate_by_email(&self, email: &str)
        -> Result<Option<CandidateRecord>, StoreError>;
    fn list_candidates(&self) -> Result<Vec<CandidateRecord>, StoreError>;
    fn candidate_aggregate(
        &self,
        id: &CandidateId,
    ) -> Result<Option<CandidateAggregate>, StoreError>;

    fn insert_cohort(&self, cohort: NewCohort) -> Result<CohortRecord, StoreError>;
    fn find_cohort_by_name(&self, name: &str) -> Result<Option<CohortRecord>, StoreError>;
    fn list_cohorts(&self) -> Result<Vec<CohortRecord>, StoreError>;
    fn update_cohort(
        &self,
        id: &CohortId,
        update: CohortUpdate,
    ) -> Result<CohortRecord, StoreError>;
    /// Removes the cohort and its enrollments.
    fn delete_cohort(&self, id: &CohortId) -> Result<(), StoreError>;
    fn enroll(&self, enrollment: EnrollmentRecord) -> Result<EnrollmentRecord, StoreError>;
    fn unenroll(&self, candidate: &CandidateId, cohort: &CohortId) -> Result<(), StoreError>;
    fn list_enrollments(&self) -> Result<Vec<EnrollmentRecord>, StoreError>;

    fn find_exam_by_title(&self, title: &str) -> Result<Option<ExamRecord>, StoreError>;
    fn insert_exam(&self, exam: NewExam) -> Result<ExamRecord, StoreError>;
    fn list_exams(&self) -> Result<Vec<ExamRecord>, StoreError>;
    fn insert_exam_result(&self, result: NewExamResult) -> Result<ExamResultRecord, StoreError>;

    fn find_survey_by_title(&self, title: &str) -> Result<Option<SurveyRecord>, StoreError>;
    fn insert_survey(&self, survey: NewSurvey) -> Result<SurveyRecord, StoreError>;
    fn list_surveys(&self) -> Result<Vec<SurveyRecord>, StoreError>;
    fn insert_survey_response(
        &self,
        response: NewSurveyResponse,
    ) -> Result<SurveyResponseRecord, StoreError>;

    fn insert_challenge(&self, challenge: NewChallenge) -> Result<ChallengeRecord, StoreError>;
    /// Fails with [`StoreError::NotFound`] when the candidate or the challenge
    /// is unknown.
    fn insert_challenge_result(
        &self,
        result: NewChallengeResult,
    ) -> Result<ChallengeResultRecord, StoreError>;

    fn insert_event(&self, event: NewEvent) -> Result<EventRecord, StoreError>;
    fn list_events(&self) -> Result<Vec<EventRecord>, StoreError>;
    fn insert_participation(
        &self,
        participation: ParticipationRecord,
    ) -> Result<ParticipationRecord, StoreError>;

    fn insert_certificate(
        &self,
        certificate: NewCertificate,
    ) -> Result<CertificateRecord, StoreError>;
    fn list_certificates(&self) -> Result<Vec<CertificateRecord>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} '{key}' already exists")]
    Conflict { entity: &'static str, key: String },
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

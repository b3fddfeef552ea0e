//! Test double that forwards to [`InMemoryTalentStore`] until told to fail.

use std::collections::HashSet;
use std::sync::Mutex;

use super::records::*;
use super::{InMemoryTalentStore, StoreError, TalentStore};

#[derive(Debug, Default)]
pub(crate) struct FaultyStore {
    pub(crate) inner: InMemoryTalentStore,
    failing: Mutex<HashSet<&'static str>>,
    hidden: Mutex<HashSet<&'static str>>,
}

impl FaultyStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every later call to `operation` fails as unavailable. `"*"` fails them all.
    pub(crate) fn fail(&self, operation: &'static str) {
        self.failing
            .lock()
            .expect("faulty store mutex poisoned")
            .insert(operation);
    }

    /// Later calls to the lookup `operation` find nothing, as if another writer
    /// inserted the row between the lookup and the insert.
    pub(crate) fn hide(&self, operation: &'static str) {
        self.hidden
            .lock()
            .expect("faulty store mutex poisoned")
            .insert(operation);
    }

    fn hides(&self, operation: &'static str) -> bool {
        self.hidden
            .lock()
            .expect("faulty store mutex poisoned")
            .contains(operation)
    }

    fn check(&self, operation: &'static str) -> Result<(), StoreError> {
        let failing = self.failing.lock().expect("faulty store mutex poisoned");
        if failing.contains(operation) || failing.contains("*") {
            return Err(StoreError::Unavailable(format!("{operation} is offline")));
        }
        Ok(())
    }
}

impl TalentStore for FaultyStore {
    fn insert_candidate(&self, candidate: NewCandidate) -> Result<CandidateRecord, StoreError> {
        self.check("insert_candidate")?;
        self.inner.insert_candidate(candidate)
    }

    fn update_candidate(
        &self,
        id: &CandidateId,
        update: CandidateUpdate,
    ) -> Result<CandidateRecord, StoreError> {
        self.check("update_candidate")?;
        self.inner.update_candidate(id, update)
    }

    fn delete_candidate(&self, id: &CandidateId) -> Result<(), StoreError> {
        self.check("delete_candidate")?;
        self.inner.delete_candidate(id)
    }

    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, StoreError> {
        self.check("fetch_candidate")?;
        self.inner.fetch_candidate(id)
    }

    fn find_candidate_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CandidateRecord>, StoreError> {
        self.check("find_candidate_by_email")?;
        self.inner.find_candidate_by_email(email)
    }

    fn list_candidates(&self) -> Result<Vec<CandidateRecord>, StoreError> {
        self.check("list_candidates")?;
        self.inner.list_candidates()
    }

    fn candidate_aggregate(
        &self,
        id: &CandidateId,
    ) -> Result<Option<CandidateAggregate>, StoreError> {
        self.check("candidate_aggregate")?;
        self.inner.candidate_aggregate(id)
    }

    fn insert_cohort(&self, cohort: NewCohort) -> Result<CohortRecord, StoreError> {
        self.check("insert_cohort")?;
        self.inner.insert_cohort(cohort)
    }

    fn find_cohort_by_name(&self, name: &str) -> Result<Option<CohortRecord>, StoreError> {
        self.check("find_cohort_by_name")?;
        self.inner.find_cohort_by_name(name)
    }

    fn list_cohorts(&self) -> Result<Vec<CohortRecord>, StoreError> {
        self.check("list_cohorts")?;
        self.inner.list_cohorts()
    }

    fn update_cohort(
        &self,
        id: &CohortId,
        update: CohortUpdate,
    ) -> Result<CohortRecord, StoreError> {
        self.check("update_cohort")?;
        self.inner.update_cohort(id, update)
    }

    fn delete_cohort(&self, id: &CohortId) -> Result<(), StoreError> {
        self.check("delete_cohort")?;
        self.inner.delete_cohort(id)
    }

    fn enroll(&self, enrollment: EnrollmentRecord) -> Result<EnrollmentRecord, StoreError> {
        self.check("enroll")?;
        self.inner.enroll(enrollment)
    }

    fn unenroll(&self, candidate: &CandidateId, cohort: &CohortId) -> Result<(), StoreError> {
        self.check("unenroll")?;
        self.inner.unenroll(candidate, cohort)
    }

    fn list_enrollments(&self) -> Result<Vec<EnrollmentRecord>, StoreError> {
        self.check("list_enrollments")?;
        self.inner.list_enrollments()
    }

    fn find_exam_by_title(&self, title: &str) -> Result<Option<ExamRecord>, StoreError> {
        self.check("find_exam_by_title")?;
        if self.hides("find_exam_by_title") {
            return Ok(None);
        }
        self.inner.find_exam_by_title(title)
    }

    fn insert_exam(&self, exam: NewExam) -> Result<ExamRecord, StoreError> {
        self.check("insert_exam")?;
        self.inner.insert_exam(exam)
    }

    fn list_exams(&self) -> Result<Vec<ExamRecord>, StoreError> {
        self.check("list_exams")?;
        self.inner.list_exams()
    }

    fn insert_exam_result(&self, result: NewExamResult) -> Result<ExamResultRecord, StoreError> {
        self.check("insert_exam_result")?;
        self.inner.insert_exam_result(result)
    }

    fn find_survey_by_title(&self, title: &str) -> Result<Option<SurveyRecord>, StoreError> {
        self.check("find_survey_by_title")?;
        if self.hides("find_survey_by_title") {
            return Ok(None);
        }
        self.inner.find_survey_by_title(title)
    }

    fn insert_survey(&self, survey: NewSurvey) -> Result<SurveyRecord, StoreError> {
        self.check("insert_survey")?;
        self.inner.insert_survey(survey)
    }

    fn list_surveys(&self) -> Result<Vec<SurveyRecord>, StoreError> {
        self.check("list_surveys")?;
        self.inner.list_surveys()
    }

    fn insert_survey_response(
        &self,
        response: NewSurveyResponse,
    ) -> Result<SurveyResponseRecord, StoreError> {
        self.check("insert_survey_response")?;
        self.inner.insert_survey_response(response)
    }

    fn insert_challenge(&self, challenge: NewChallenge) -> Result<ChallengeRecord, StoreError> {
        self.check("insert_challenge")?;
        self.inner.insert_challenge(challenge)
    }

    fn insert_challenge_result(
        &self,
        result: NewChallengeResult,
    ) -> Result<ChallengeResultRecord, StoreError> {
        self.check("insert_challenge_result")?;
        self.inner.insert_challenge_result(result)
    }

    fn insert_event(&self, event: NewEvent) -> Result<EventRecord, StoreError> {
        self.check("insert_event")?;
        self.inner.insert_event(event)
    }

    fn list_events(&self) -> Result<Vec<EventRecord>, StoreError> {
        self.check("list_events")?;
        self.inner.list_events()
    }

    fn insert_participation(
        &self,
        participation: ParticipationRecord,
    ) -> Result<ParticipationRecord, StoreError> {
        self.check("insert_participation")?;
        self.inner.insert_participation(participation)
    }

    fn insert_certificate(
        &self,
        certificate: NewCertificate,
    ) -> Result<CertificateRecord, StoreError> {
        self.check("insert_certificate")?;
        self.inner.insert_certificate(certificate)
    }

    fn list_certificates(&self) -> Result<Vec<CertificateRecord>, StoreError> {
        self.check("list_certificates")?;
        self.inner.list_certificates()
    }
}

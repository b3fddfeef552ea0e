use std::sync::Mutex;

use chrono::Utc;

use super::records::*;
use super::{StoreError, TalentStore};

#[derive(Debug, Default)]
struct Tables {
    sequence: u64,
    candidates: Vec<CandidateRecord>,
    cohorts: Vec<CohortRecord>,
    enrollments: Vec<EnrollmentRecord>,
    exams: Vec<ExamRecord>,
    exam_results: Vec<ExamResultRecord>,
    surveys: Vec<SurveyRecord>,
    survey_responses: Vec<SurveyResponseRecord>,
    challenges: Vec<ChallengeRecord>,
    challenge_results: Vec<ChallengeResultRecord>,
    events: Vec<EventRecord>,
    participations: Vec<ParticipationRecord>,
    certificates: Vec<CertificateRecord>,
}

impl Tables {
    fn next_id(&mut self, prefix: &str) -> String {
        self.sequence += 1;
        format!("{prefix}-{:06}", self.sequence)
    }

    fn candidate(&self, id: &CandidateId) -> Result<&CandidateRecord, StoreError> {
        self.candidates
            .iter()
            .find(|candidate| &candidate.candidate_id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "candidate",
                key: id.0.clone(),
            })
    }

    fn email_taken(&self, email: &str, except: Option<&CandidateId>) -> bool {
        let folded = fold_email(email);
        self.candidates.iter().any(|candidate| {
            fold_email(&candidate.email) == folded && Some(&candidate.candidate_id) != except
        })
    }

    fn cohort_mut(&mut self, id: &CohortId) -> Result<&mut CohortRecord, StoreError> {
        self.cohorts
            .iter_mut()
            .find(|cohort| &cohort.cohort_id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "cohort",
                key: id.0.clone(),
            })
    }
}

/// Emails compare with the same Unicode lowercasing the importers apply.
fn fold_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Process-local store with the same uniqueness rules as the hosted schema.
/// Every table keeps insertion order.
#[derive(Debug, Default)]
pub struct InMemoryTalentStore {
    tables: Mutex<Tables>,
}

impl InMemoryTalentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("store mutex poisoned")
    }
}

impl TalentStore for InMemoryTalentStore {
    fn insert_candidate(&self, candidate: NewCandidate) -> Result<CandidateRecord, StoreError> {
        let mut tables = self.lock();
        if tables.email_taken(&candidate.email, None) {
            return Err(StoreError::Conflict {
                entity: "candidate",
                key: candidate.email,
            });
        }

        let now = Utc::now();
        let record = CandidateRecord {
            candidate_id: CandidateId(tables.next_id("cand")),
            full_name: candidate.full_name,
            email: candidate.email,
            phone: candidate.phone,
            linkedin_url: candidate.linkedin_url,
            github_url: candidate.github_url,
            portfolio_url: candidate.portfolio_url,
            resume_url: candidate.resume_url,
            photo_url: candidate.photo_url,
            profile_summary: candidate.profile_summary,
            role: candidate.role,
            skill_level: candidate.skill_level,
            is_public: candidate.is_public,
            created_at: now,
            updated_at: now,
        };
        tables.candidates.push(record.clone());
        Ok(record)
    }

    fn update_candidate(
        &self,
        id: &CandidateId,
        update: CandidateUpdate,
    ) -> Result<CandidateRecord, StoreError> {
        let mut tables = self.lock();
        if let Some(email) = update.email.as_deref() {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::Conflict {
                    entity: "candidate",
                    key: email.to_string(),
                });
            }
        }

        let record = tables
            .candidates
            .iter_mut()
            .find(|candidate| &candidate.candidate_id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "candidate",
                key: id.0.clone(),
            })?;
        update.apply(record);
        record.updated_at = Utc::now();
        Ok(record.clone())
    }

    fn delete_candidate(&self, id: &CandidateId) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables.candidate(id)?;

        tables.candidates.retain(|row| &row.candidate_id != id);
        tables.enrollments.retain(|row| &row.candidate_id != id);
        tables.exam_results.retain(|row| &row.candidate_id != id);
        tables.survey_responses.retain(|row| &row.candidate_id != id);
        tables.challenge_results.retain(|row| &row.candidate_id != id);
        tables.participations.retain(|row| &row.candidate_id != id);
        tables.certificates.retain(|row| &row.candidate_id != id);
        Ok(())
    }

    fn fetch_candidate(&self, id: &CandidateId) -> Result<Option<CandidateRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .candidates
            .iter()
            .find(|candidate| &candidate.candidate_id == id)
            .cloned())
    }

    fn find_candidate_by_email(
        &self,
        email: &str,
    ) -> Result<Option<CandidateRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .candidates
            .iter()
            .find(|candidate| fold_email(&candidate.email) == fold_email(email))
            .cloned())
    }

    fn list_candidates(&self) -> Result<Vec<CandidateRecord>, StoreError> {
        Ok(self.lock().candidates.clone())
    }

    fn candidate_aggregate(
        &self,
        id: &CandidateId,
    ) -> Result<Option<CandidateAggregate>, StoreError> {
        let tables = self.lock();
        let Some(candidate) = tables
            .candidates
            .iter()
            .find(|candidate| &candidate.candidate_id == id)
            .cloned()
        else {
            return Ok(None);
        };

        let cohorts = tables
            .enrollments
            .iter()
            .filter(|row| &row.candidate_id == id)
            .map(|row| Joined {
                record: row.clone(),
                joined: tables
                    .cohorts
                    .iter()
                    .find(|cohort| cohort.cohort_id == row.cohort_id)
                    .cloned(),
            })
            .collect();

        let challenge_results = tables
            .challenge_results
            .iter()
            .filter(|row| &row.candidate_id == id)
            .map(|row| Joined {
                record: row.clone(),
                joined: tables
                    .challenges
                    .iter()
                    .find(|challenge| challenge.challenge_id == row.challenge_id)
                    .cloned(),
            })
            .collect();

        let exam_results = tables
            .exam_results
            .iter()
            .filter(|row| &row.candidate_id == id)
            .map(|row| Joined {
                record: row.clone(),
                joined: tables
                    .exams
                    .iter()
                    .find(|exam| exam.exam_id == row.exam_id)
                    .cloned(),
            })
            .collect();

        let survey_responses = tables
            .survey_responses
            .iter()
            .filter(|row| &row.candidate_id == id)
            .map(|row| Joined {
                record: row.clone(),
                joined: tables
                    .surveys
                    .iter()
                    .find(|survey| survey.survey_id == row.survey_id)
                    .cloned(),
            })
            .collect();

        let events = tables
            .participations
            .iter()
            .filter(|row| &row.candidate_id == id)
            .map(|row| Joined {
                record: row.clone(),
                joined: tables
                    .events
                    .iter()
                    .find(|event| event.event_id == row.event_id)
                    .cloned(),
            })
            .collect();

        let certificates = tables
            .certificates
            .iter()
            .filter(|row| &row.candidate_id == id)
            .cloned()
            .collect();

        Ok(Some(CandidateAggregate {
            candidate,
            cohorts,
            challenge_results,
            exam_results,
            survey_responses,
            events,
            certificates,
        }))
    }

    fn insert_cohort(&self, cohort: NewCohort) -> Result<CohortRecord, StoreError> {
        let mut tables = self.lock();
        let record = CohortRecord {
            cohort_id: CohortId(tables.next_id("cohort")),
            cohort_name: cohort.cohort_name,
            program_name: cohort.program_name,
            start_date: cohort.start_date,
            end_date: cohort.end_date,
            notes: cohort.notes,
        };
        tables.cohorts.push(record.clone());
        Ok(record)
    }

    fn find_cohort_by_name(&self, name: &str) -> Result<Option<CohortRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .cohorts
            .iter()
            .find(|cohort| cohort.cohort_name == name.trim())
            .cloned())
    }

    fn list_cohorts(&self) -> Result<Vec<CohortRecord>, StoreError> {
        Ok(self.lock().cohorts.clone())
    }

    fn update_cohort(
        &self,
        id: &CohortId,
        update: CohortUpdate,
    ) -> Result<CohortRecord, StoreError> {
        let mut tables = self.lock();
        if let Some(name) = update.cohort_name.as_deref() {
            if tables
                .cohorts
                .iter()
                .any(|cohort| cohort.cohort_name == name && &cohort.cohort_id != id)
            {
                return Err(StoreError::Conflict {
                    entity: "cohort",
                    key: name.to_string(),
                });
            }
        }
        let record = tables.cohort_mut(id)?;
        update.apply(record);
        Ok(record.clone())
    }

    fn delete_cohort(&self, id: &CohortId) -> Result<(), StoreError> {
        let mut tables = self.lock();
        tables.cohort_mut(id)?;
        tables.cohorts.retain(|cohort| &cohort.cohort_id != id);
        tables.enrollments.retain(|row| &row.cohort_id != id);
        Ok(())
    }

    fn enroll(&self, enrollment: EnrollmentRecord) -> Result<EnrollmentRecord, StoreError> {
        let mut tables = self.lock();
        tables.candidate(&enrollment.candidate_id)?;
        if !tables
            .cohorts
            .iter()
            .any(|cohort| cohort.cohort_id == enrollment.cohort_id)
        {
            return Err(StoreError::NotFound {
                entity: "cohort",
                key: enrollment.cohort_id.0.clone(),
            });
        }
        if tables.enrollments.iter().any(|row| {
            row.candidate_id == enrollment.candidate_id && row.cohort_id == enrollment.cohort_id
        }) {
            return Err(StoreError::Conflict {
                entity: "enrollment",
                key: format!("{}/{}", enrollment.candidate_id, enrollment.cohort_id),
            });
        }
        tables.enrollments.push(enrollment.clone());
        Ok(enrollment)
    }

    fn unenroll(&self, candidate: &CandidateId, cohort: &CohortId) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let before = tables.enrollments.len();
        tables
            .enrollments
            .retain(|row| !(&row.candidate_id == candidate && &row.cohort_id == cohort));
        if tables.enrollments.len() == before {
            return Err(StoreError::NotFound {
                entity: "enrollment",
                key: format!("{candidate}/{cohort}"),
            });
        }
        Ok(())
    }

    fn list_enrollments(&self) -> Result<Vec<EnrollmentRecord>, StoreError> {
        Ok(self.lock().enrollments.clone())
    }

    fn find_exam_by_title(&self, title: &str) -> Result<Option<ExamRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables.exams.iter().find(|exam| exam.title == title).cloned())
    }

    fn insert_exam(&self, exam: NewExam) -> Result<ExamRecord, StoreError> {
        let mut tables = self.lock();
        if tables.exams.iter().any(|row| row.title == exam.title) {
            return Err(StoreError::Conflict {
                entity: "exam",
                key: exam.title,
            });
        }
        let record = ExamRecord {
            exam_id: ExamId(tables.next_id("exam")),
            title: exam.title,
            exam_date: exam.exam_date,
            max_score: exam.max_score,
        };
        tables.exams.push(record.clone());
        Ok(record)
    }

    fn list_exams(&self) -> Result<Vec<ExamRecord>, StoreError> {
        Ok(self.lock().exams.clone())
    }

    fn insert_exam_result(&self, result: NewExamResult) -> Result<ExamResultRecord, StoreError> {
        let mut tables = self.lock();
        tables.candidate(&result.candidate_id)?;
        let record = ExamResultRecord {
            result_id: tables.next_id("exam-result"),
            candidate_id: result.candidate_id,
            exam_id: result.exam_id,
            score: result.score,
            max_score: result.max_score,
            result_status: result.result_status,
            result_date: result.result_date,
            feedback: result.feedback,
        };
        tables.exam_results.push(record.clone());
        Ok(record)
    }

    fn find_survey_by_title(&self, title: &str) -> Result<Option<SurveyRecord>, StoreError> {
        let tables = self.lock();
        Ok(tables
            .surveys
            .iter()
            .find(|survey| survey.title == title)
            .cloned())
    }

    fn insert_survey(&self, survey: NewSurvey) -> Result<SurveyRecord, StoreError> {
        let mut tables = self.lock();
        if tables.surveys.iter().any(|row| row.title == survey.title) {
            return Err(StoreError::Conflict {
                entity: "survey",
                key: survey.title,
            });
        }
        let record = SurveyRecord {
            survey_id: SurveyId(tables.next_id("survey")),
            title: survey.title,
            survey_type: survey.survey_type,
            max_rating: survey.max_rating,
        };
        tables.surveys.push(record.clone());
        Ok(record)
    }

    fn list_surveys(&self) -> Result<Vec<SurveyRecord>, StoreError> {
        Ok(self.lock().surveys.clone())
    }

    fn insert_survey_response(
        &self,
        response: NewSurveyResponse,
    ) -> Result<SurveyResponseRecord, StoreError> {
        let mut tables = self.lock();
        tables.candidate(&response.candidate_id)?;
        let record = SurveyResponseRecord {
            response_id: tables.next_id("response"),
            candidate_id: response.candidate_id,
            survey_id: response.survey_id,
            rating: response.rating,
            feedback: response.feedback,
            reviewer_name: response.reviewer_name,
            submitted_at: response.submitted_at,
        };
        tables.survey_responses.push(record.clone());
        Ok(record)
    }

    fn insert_challenge(&self, challenge: NewChallenge) -> Result<ChallengeRecord, StoreError> {
        let mut tables = self.lock();
        if tables.challenges.iter().any(|row| row.title == challenge.title) {
            return Err(StoreError::Conflict {
                entity: "challenge",
                key: challenge.title,
            });
        }
        let record = ChallengeRecord {
            challenge_id: ChallengeId(tables.next_id("challenge")),
            title: challenge.title,
            topic: challenge.topic,
        };
        tables.challenges.push(record.clone());
        Ok(record)
    }

    fn insert_challenge_result(
        &self,
        result: NewChallengeResult,
    ) -> Result<ChallengeResultRecord, StoreError> {
        let mut tables = self.lock();
        tables.candidate(&result.candidate_id)?;
        if !tables
            .challenges
            .iter()
            .any(|challenge| challenge.challenge_id == result.challenge_id)
        {
            return Err(StoreError::NotFound {
                entity: "challenge",
                key: result.challenge_id.0,
            });
        }
        let record = ChallengeResultRecord {
            result_id: tables.next_id("challenge-result"),
            candidate_id: result.candidate_id,
            challenge_id: result.challenge_id,
            score: result.score,
            max_score: result.max_score,
            submitted_at: result.submitted_at,
        };
        tables.challenge_results.push(record.clone());
        Ok(record)
    }

    fn insert_event(&self, event: NewEvent) -> Result<EventRecord, StoreError> {
        let mut tables = self.lock();
        let record = EventRecord {
            event_id: EventId(tables.next_id("event")),
            title: event.title,
            event_date: event.event_date,
            resources_url: event.resources_url,
        };
        tables.events.push(record.clone());
        Ok(record)
    }

    fn list_events(&self) -> Result<Vec<EventRecord>, StoreError> {
        Ok(self.lock().events.clone())
    }

    fn insert_participation(
        &self,
        participation: ParticipationRecord,
    ) -> Result<ParticipationRecord, StoreError> {
        let mut tables = self.lock();
        tables.candidate(&participation.candidate_id)?;
        if !tables
            .events
            .iter()
            .any(|event| event.event_id == participation.event_id)
        {
            return Err(StoreError::NotFound {
                entity: "event",
                key: participation.event_id.0,
            });
        }
        if tables.participations.iter().any(|row| {
            row.candidate_id == participation.candidate_id && row.event_id == participation.event_id
        }) {
            return Err(StoreError::Conflict {
                entity: "participation",
                key: format!("{}/{}", participation.candidate_id, participation.event_id),
            });
        }
        tables.participations.push(participation.clone());
        Ok(participation)
    }

    fn insert_certificate(
        &self,
        certificate: NewCertificate,
    ) -> Result<CertificateRecord, StoreError> {
        let mut tables = self.lock();
        tables.candidate(&certificate.candidate_id)?;
        let record = CertificateRecord {
            certificate_id: tables.next_id("certificate"),
            candidate_id: certificate.candidate_id,
            title: certificate.title,
            issuer: certificate.issuer,
            issue_date: certificate.issue_date,
            expiration_date: certificate.expiration_date,
            certificate_url: certificate.certificate_url,
        };
        tables.certificates.push(record.clone());
        Ok(record)
    }

    fn list_certificates(&self) -> Result<Vec<CertificateRecord>, StoreError> {
        Ok(self.lock().certificates.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_candidate(name: &str, email: &str) -> NewCandidate {
        NewCandidate {
            full_name: name.to_string(),
            email: email.to_string(),
            ..NewCandidate::default()
        }
    }

    #[test]
    fn candidate_email_is_unique_ignoring_case() {
        let store = InMemoryTalentStore::new();
        store
            .insert_candidate(new_candidate("Ada", "ada@example.com"))
            .expect("first insert");

        match store.insert_candidate(new_candidate("Ada Again", "ADA@example.com")) {
            Err(StoreError::Conflict { entity, .. }) => assert_eq!(entity, "candidate"),
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn delete_candidate_cascades_to_enrollments() {
        let store = InMemoryTalentStore::new();
        let candidate = store
            .insert_candidate(new_candidate("Ada", "ada@example.com"))
            .expect("insert");
        let cohort = store
            .insert_cohort(NewCohort {
                cohort_name: "Cohort A".to_string(),
                program_name: None,
                start_date: NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid"),
                end_date: NaiveDate::from_ymd_opt(2025, 4, 25).expect("valid"),
                notes: None,
            })
            .expect("cohort");
        store
            .enroll(EnrollmentRecord {
                candidate_id: candidate.candidate_id.clone(),
                cohort_id: cohort.cohort_id,
                enrollment_date: None,
                completion_status: None,
            })
            .expect("enroll");

        store
            .delete_candidate(&candidate.candidate_id)
            .expect("delete");
        assert!(store.list_enrollments().expect("list").is_empty());
        assert!(store
            .fetch_candidate(&candidate.candidate_id)
            .expect("fetch")
            .is_none());
    }

    #[test]
    fn update_rejects_email_owned_by_another_candidate() {
        let store = InMemoryTalentStore::new();
        store
            .insert_candidate(new_candidate("Ada", "ada@example.com"))
            .expect("insert");
        let grace = store
            .insert_candidate(new_candidate("Grace", "grace@example.com"))
            .expect("insert");

        let update = CandidateUpdate {
            email: Some("ada@example.com".to_string()),
            ..CandidateUpdate::default()
        };
        assert!(matches!(
            store.update_candidate(&grace.candidate_id, update),
            Err(StoreError::Conflict { .. })
        ));
    }

    #[test]
    fn email_uniqueness_folds_non_ascii_case() {
        let store = InMemoryTalentStore::new();
        store
            .insert_candidate(new_candidate("Émile", "émile@example.com"))
            .expect("first insert");

        assert!(matches!(
            store.insert_candidate(new_candidate("Émile Again", "ÉMILE@example.com")),
            Err(StoreError::Conflict { .. })
        ));
        let found = store
            .find_candidate_by_email(" Émile@Example.com ")
            .expect("lookup");
        assert_eq!(found.map(|c| c.full_name), Some("Émile".to_string()));
    }

    #[test]
    fn delete_cohort_drops_its_enrollments() {
        let store = InMemoryTalentStore::new();
        let candidate = store
            .insert_candidate(new_candidate("Ada", "ada@example.com"))
            .expect("insert");
        let cohort = store
            .insert_cohort(NewCohort {
                cohort_name: "Cohort A".to_string(),
                program_name: None,
                start_date: NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid"),
                end_date: NaiveDate::from_ymd_opt(2025, 4, 25).expect("valid"),
                notes: None,
            })
            .expect("cohort");
        store
            .enroll(EnrollmentRecord {
                candidate_id: candidate.candidate_id.clone(),
                cohort_id: cohort.cohort_id.clone(),
                enrollment_date: None,
                completion_status: None,
            })
            .expect("enroll");

        store.delete_cohort(&cohort.cohort_id).expect("delete");
        assert!(store.list_cohorts().expect("list").is_empty());
        assert!(store.list_enrollments().expect("list").is_empty());
        assert!(matches!(
            store.delete_cohort(&cohort.cohort_id),
            Err(StoreError::NotFound { entity: "cohort", .. })
        ));
    }

    #[test]
    fn challenge_results_need_a_known_challenge() {
        let store = InMemoryTalentStore::new();
        let candidate = store
            .insert_candidate(new_candidate("Ada", "ada@example.com"))
            .expect("insert");

        let result = store.insert_challenge_result(NewChallengeResult {
            candidate_id: candidate.candidate_id,
            challenge_id: ChallengeId("challenge-404".to_string()),
            score: 80,
            max_score: None,
            submitted_at: Utc::now(),
        });
        assert!(matches!(
            result,
            Err(StoreError::NotFound { entity: "challenge", .. })
        ));
    }

    #[test]
    fn unenroll_missing_pair_is_not_found() {
        let store = InMemoryTalentStore::new();
        let result = store.unenroll(
            &CandidateId("cand-1".to_string()),
            &CohortId("cohort-1".to_string()),
        );
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}

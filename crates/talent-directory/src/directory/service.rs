use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::exports::{self, CsvExport, ExportDataset, ExportError};
use crate::imports::validators::is_valid_email;
use crate::profiles::{effective_max, Candidate, CandidateProfile, Cohort};
use crate::store::{
    CandidateId, CandidateRecord, CandidateUpdate, CertificateRecord, ChallengeId,
    ChallengeRecord, ChallengeResultRecord, CohortId, CohortRecord, CohortUpdate,
    EnrollmentRecord, EventId, EventRecord, NewCandidate, NewCertificate, NewChallenge,
    NewChallengeResult, NewCohort, NewEvent, ParticipationRecord, SkillLevel, StoreError,
    TalentStore,
};

/// Filters for the public directory. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DirectoryQuery {
    /// Case-insensitive substring of the name or role.
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub skill_level: Option<SkillLevel>,
}

/// What the public directory shows for one candidate. Contact details stay
/// private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicCard {
    pub id: CandidateId,
    pub full_name: String,
    pub role: String,
    pub skill_level: Option<SkillLevel>,
    pub photo_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub portfolio_url: Option<String>,
    pub cohort_name: Option<String>,
}

/// Score submitted for one challenge attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChallengeScore {
    pub challenge_id: ChallengeId,
    pub score: i64,
    #[serde(default)]
    pub max_score: Option<i64>,
}

/// Certificate details as entered by an admin; the candidate comes from the
/// route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CertificateDraft {
    pub title: String,
    pub issuer: String,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
    #[serde(default)]
    pub certificate_url: Option<String>,
}

/// Admin console and public directory operations over a [`TalentStore`].
pub struct DirectoryService<S> {
    store: Arc<S>,
}

impl<S> DirectoryService<S>
where
    S: TalentStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All candidates, newest first, each with its first cohort.
    pub fn list_candidates(&self) -> Result<Vec<Candidate>, DirectoryError> {
        let first_cohorts = self.first_cohorts()?;
        let candidates = newest_first(self.store.list_candidates()?);

        Ok(candidates
            .iter()
            .map(|record| {
                Candidate::from_record(record, first_cohorts.get(&record.candidate_id).cloned())
            })
            .collect())
    }

    pub fn create_candidate(
        &self,
        candidate: NewCandidate,
    ) -> Result<CandidateRecord, DirectoryError> {
        let candidate = normalize_new_candidate(candidate)?;
        let record = self.store.insert_candidate(candidate)?;
        info!(candidate_id = %record.candidate_id, "candidate created");
        Ok(record)
    }

    pub fn update_candidate(
        &self,
        id: &CandidateId,
        update: CandidateUpdate,
    ) -> Result<CandidateRecord, DirectoryError> {
        let update = normalize_update(update)?;
        Ok(self.store.update_candidate(id, update)?)
    }

    pub fn delete_candidate(&self, id: &CandidateId) -> Result<(), DirectoryError> {
        self.store.delete_candidate(id)?;
        info!(candidate_id = %id, "candidate deleted");
        Ok(())
    }

    pub fn candidate_profile(&self, id: &CandidateId) -> Result<CandidateProfile, DirectoryError> {
        let aggregate = self
            .store
            .candidate_aggregate(id)?
            .ok_or_else(|| candidate_not_found(id))?;
        Ok(CandidateProfile::from_aggregate(&aggregate))
    }

    pub fn create_cohort(&self, cohort: NewCohort) -> Result<CohortRecord, DirectoryError> {
        let name = required("cohort_name", &cohort.cohort_name)?;
        check_cohort_dates(cohort.start_date, cohort.end_date)?;
        if self.store.find_cohort_by_name(&name)?.is_some() {
            return Err(DirectoryError::Conflict {
                entity: "cohort",
                key: name,
            });
        }

        let record = self.store.insert_cohort(NewCohort {
            cohort_name: name,
            ..cohort
        })?;
        info!(cohort_id = %record.cohort_id, "cohort created");
        Ok(record)
    }

    /// Applies a partial edit. The resulting date range is validated against
    /// the stored dates for whichever side the edit leaves alone.
    pub fn update_cohort(
        &self,
        id: &CohortId,
        update: CohortUpdate,
    ) -> Result<CohortRecord, DirectoryError> {
        let current = self
            .store
            .list_cohorts()?
            .into_iter()
            .find(|cohort| &cohort.cohort_id == id)
            .ok_or_else(|| DirectoryError::NotFound {
                entity: "cohort",
                key: id.0.clone(),
            })?;
        let cohort_name = update
            .cohort_name
            .as_deref()
            .map(|name| required("cohort_name", name))
            .transpose()?;
        check_cohort_dates(
            update.start_date.unwrap_or(current.start_date),
            update.end_date.unwrap_or(current.end_date),
        )?;

        let record = self.store.update_cohort(
            id,
            CohortUpdate {
                cohort_name,
                ..update
            },
        )?;
        info!(cohort_id = %id, "cohort updated");
        Ok(record)
    }

    pub fn delete_cohort(&self, id: &CohortId) -> Result<(), DirectoryError> {
        self.store.delete_cohort(id)?;
        info!(cohort_id = %id, "cohort deleted");
        Ok(())
    }

    /// Cohorts with the most recent start first. `candidate_count` counts
    /// enrollments; `avg_performance` is the mean exam percentage of enrolled
    /// candidates, rounded to a whole number.
    pub fn list_cohorts(&self) -> Result<Vec<Cohort>, DirectoryError> {
        let mut cohorts = self.store.list_cohorts()?;
        cohorts.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        let enrollments = self.store.list_enrollments()?;

        let mut views = Vec::with_capacity(cohorts.len());
        for record in &cohorts {
            let members: Vec<&CandidateId> = enrollments
                .iter()
                .filter(|enrollment| enrollment.cohort_id == record.cohort_id)
                .map(|enrollment| &enrollment.candidate_id)
                .collect();

            let mut percentages = Vec::new();
            for member in &members {
                if let Some(aggregate) = self.store.candidate_aggregate(member)? {
                    percentages.extend(aggregate.exam_results.iter().map(|row| {
                        row.record.score as f64 * 100.0
                            / effective_max(row.record.max_score) as f64
                    }));
                }
            }

            let mut view = Cohort::from_record(record);
            view.candidate_count = members.len();
            if !percentages.is_empty() {
                view.avg_performance =
                    (percentages.iter().sum::<f64>() / percentages.len() as f64).round();
            }
            views.push(view);
        }
        Ok(views)
    }

    pub fn assign_to_cohort(
        &self,
        candidate_id: &CandidateId,
        cohort_id: &CohortId,
        today: NaiveDate,
    ) -> Result<EnrollmentRecord, DirectoryError> {
        let enrollment = self.store.enroll(EnrollmentRecord {
            candidate_id: candidate_id.clone(),
            cohort_id: cohort_id.clone(),
            enrollment_date: Some(today),
            completion_status: None,
        })?;
        info!(candidate_id = %candidate_id, cohort_id = %cohort_id, "candidate enrolled");
        Ok(enrollment)
    }

    pub fn remove_from_cohort(
        &self,
        candidate_id: &CandidateId,
        cohort_id: &CohortId,
    ) -> Result<(), DirectoryError> {
        self.store.unenroll(candidate_id, cohort_id)?;
        Ok(())
    }

    pub fn create_challenge(
        &self,
        challenge: NewChallenge,
    ) -> Result<ChallengeRecord, DirectoryError> {
        let record = self.store.insert_challenge(NewChallenge {
            title: required("title", &challenge.title)?,
            topic: optional_text(challenge.topic),
        })?;
        info!(challenge_id = %record.challenge_id, "challenge created");
        Ok(record)
    }

    /// Stores a scored attempt. Scored challenges replace the estimated skills
    /// on the candidate's profile.
    pub fn record_challenge_result(
        &self,
        candidate_id: &CandidateId,
        score: ChallengeScore,
        submitted_at: DateTime<Utc>,
    ) -> Result<ChallengeResultRecord, DirectoryError> {
        if score.score < 0 {
            return Err(DirectoryError::Validation {
                field: "score",
                message: format!("{} is negative", score.score),
            });
        }
        if let Some(max_score) = score.max_score {
            if max_score <= 0 {
                return Err(DirectoryError::Validation {
                    field: "max_score",
                    message: format!("{max_score} is not positive"),
                });
            }
            if score.score > max_score {
                return Err(DirectoryError::Validation {
                    field: "score",
                    message: format!("{} exceeds the maximum {max_score}", score.score),
                });
            }
        }

        let record = self.store.insert_challenge_result(NewChallengeResult {
            candidate_id: candidate_id.clone(),
            challenge_id: score.challenge_id,
            score: score.score,
            max_score: score.max_score,
            submitted_at,
        })?;
        info!(
            candidate_id = %candidate_id,
            challenge_id = %record.challenge_id,
            "challenge result recorded"
        );
        Ok(record)
    }

    pub fn create_event(&self, event: NewEvent) -> Result<EventRecord, DirectoryError> {
        let record = self.store.insert_event(NewEvent {
            title: required("title", &event.title)?,
            event_date: event.event_date,
            resources_url: optional_text(event.resources_url),
        })?;
        info!(event_id = %record.event_id, "event created");
        Ok(record)
    }

    pub fn add_participation(
        &self,
        candidate_id: &CandidateId,
        event_id: &EventId,
        participation_role: Option<String>,
    ) -> Result<ParticipationRecord, DirectoryError> {
        let record = self.store.insert_participation(ParticipationRecord {
            candidate_id: candidate_id.clone(),
            event_id: event_id.clone(),
            participation_role: optional_text(participation_role),
        })?;
        info!(candidate_id = %candidate_id, event_id = %event_id, "participation recorded");
        Ok(record)
    }

    pub fn record_certificate(
        &self,
        candidate_id: &CandidateId,
        certificate: CertificateDraft,
    ) -> Result<CertificateRecord, DirectoryError> {
        if let Some(expiration) = certificate.expiration_date {
            if expiration < certificate.issue_date {
                return Err(DirectoryError::Validation {
                    field: "expiration_date",
                    message: format!(
                        "{expiration} is before the issue date {}",
                        certificate.issue_date
                    ),
                });
            }
        }

        let record = self.store.insert_certificate(NewCertificate {
            candidate_id: candidate_id.clone(),
            title: required("title", &certificate.title)?,
            issuer: required("issuer", &certificate.issuer)?,
            issue_date: certificate.issue_date,
            expiration_date: certificate.expiration_date,
            certificate_url: optional_text(certificate.certificate_url),
        })?;
        info!(
            candidate_id = %candidate_id,
            certificate_id = %record.certificate_id,
            "certificate recorded"
        );
        Ok(record)
    }

    /// Replaces the stored summary with a freshly generated one.
    pub fn regenerate_summary(&self, id: &CandidateId) -> Result<CandidateRecord, DirectoryError> {
        let profile = self.candidate_profile(id)?;
        let update = CandidateUpdate {
            profile_summary: Some(profile.generated_summary),
            ..CandidateUpdate::default()
        };
        let record = self.store.update_candidate(id, update)?;
        info!(candidate_id = %id, "profile summary regenerated");
        Ok(record)
    }

    pub fn public_directory(
        &self,
        query: &DirectoryQuery,
    ) -> Result<Vec<PublicCard>, DirectoryError> {
        let cohort_names: HashMap<CohortId, String> = self
            .store
            .list_cohorts()?
            .into_iter()
            .map(|cohort| (cohort.cohort_id, cohort.cohort_name))
            .collect();
        let first_cohorts = self.first_cohorts()?;

        let search = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);
        let role = query
            .role
            .as_deref()
            .map(str::trim)
            .filter(|role| !role.is_empty());

        let cards = self
            .store
            .list_candidates()?
            .into_iter()
            .filter(|candidate| candidate.is_public)
            .filter(|candidate| {
                search.as_deref().map_or(true, |term| {
                    candidate.full_name.to_lowercase().contains(term)
                        || candidate
                            .role
                            .as_deref()
                            .is_some_and(|role| role.to_lowercase().contains(term))
                })
            })
            .filter(|candidate| role.map_or(true, |role| candidate.role.as_deref() == Some(role)))
            .filter(|candidate| {
                query
                    .skill_level
                    .map_or(true, |level| candidate.skill_level == Some(level))
            })
            .map(|candidate| {
                let cohort_name = first_cohorts
                    .get(&candidate.candidate_id)
                    .and_then(|cohort_id| cohort_names.get(cohort_id))
                    .cloned();
                let view = Candidate::from_record(&candidate, None);
                PublicCard {
                    id: view.id,
                    full_name: view.full_name,
                    role: view.role,
                    skill_level: view.skill_level,
                    photo_url: view.photo_url,
                    linkedin_url: view.linkedin_url,
                    github_url: view.github_url,
                    portfolio_url: view.portfolio_url,
                    cohort_name,
                }
            })
            .collect();
        Ok(cards)
    }

    /// Profile of a public candidate. Private candidates look exactly like
    /// missing ones.
    pub fn public_profile(&self, id: &CandidateId) -> Result<CandidateProfile, DirectoryError> {
        let profile = self.candidate_profile(id)?;
        if !profile.candidate.is_public {
            return Err(candidate_not_found(id));
        }
        Ok(profile)
    }

    pub fn export(
        &self,
        dataset: ExportDataset,
        today: NaiveDate,
    ) -> Result<CsvExport, DirectoryError> {
        let export = match dataset {
            ExportDataset::Candidates => {
                let candidates = newest_first(self.store.list_candidates()?);
                exports::export(dataset, &candidates, today)?
            }
            ExportDataset::Cohorts => {
                let mut cohorts = self.store.list_cohorts()?;
                cohorts.sort_by(|a, b| b.start_date.cmp(&a.start_date));
                exports::export(dataset, &cohorts, today)?
            }
            ExportDataset::Exams => {
                let mut exams = self.store.list_exams()?;
                exams.sort_by(|a, b| b.exam_date.cmp(&a.exam_date));
                exports::export(dataset, &exams, today)?
            }
            ExportDataset::Surveys => exports::export(dataset, &self.store.list_surveys()?, today)?,
            ExportDataset::Events => exports::export(dataset, &self.store.list_events()?, today)?,
            ExportDataset::Certificates => {
                exports::export(dataset, &self.store.list_certificates()?, today)?
            }
        };
        info!(dataset = %dataset, filename = %export.filename, "dataset exported");
        Ok(export)
    }

    /// First enrollment per candidate, in store order.
    fn first_cohorts(&self) -> Result<HashMap<CandidateId, CohortId>, DirectoryError> {
        let mut first = HashMap::new();
        for enrollment in self.store.list_enrollments()? {
            first
                .entry(enrollment.candidate_id)
                .or_insert(enrollment.cohort_id);
        }
        Ok(first)
    }
}

/// Store order is insertion order, so reversing first keeps rows created in the
/// same instant newest first too.
fn newest_first(mut candidates: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    candidates.reverse();
    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    candidates
}

fn normalize_new_candidate(candidate: NewCandidate) -> Result<NewCandidate, DirectoryError> {
    let full_name = candidate.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(DirectoryError::Validation {
            field: "full_name",
            message: "must not be blank".to_string(),
        });
    }
    let email = normalize_email(&candidate.email)?;
    Ok(NewCandidate {
        full_name,
        email,
        ..candidate
    })
}

fn normalize_update(update: CandidateUpdate) -> Result<CandidateUpdate, DirectoryError> {
    let full_name = match update.full_name {
        Some(name) if name.trim().is_empty() => {
            return Err(DirectoryError::Validation {
                field: "full_name",
                message: "must not be blank".to_string(),
            })
        }
        Some(name) => Some(name.trim().to_string()),
        None => None,
    };
    let email = update.email.as_deref().map(normalize_email).transpose()?;
    Ok(CandidateUpdate {
        full_name,
        email,
        ..update
    })
}

fn normalize_email(email: &str) -> Result<String, DirectoryError> {
    let email = email.trim();
    if !is_valid_email(email) {
        return Err(DirectoryError::Validation {
            field: "email",
            message: format!("'{email}' is not a valid email address"),
        });
    }
    Ok(email.to_lowercase())
}

/// Trimmed text that must not be blank.
fn required(field: &'static str, value: &str) -> Result<String, DirectoryError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(DirectoryError::Validation {
            field,
            message: "must not be blank".to_string(),
        });
    }
    Ok(value.to_string())
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn check_cohort_dates(start: NaiveDate, end: NaiveDate) -> Result<(), DirectoryError> {
    if end < start {
        return Err(DirectoryError::Validation {
            field: "end_date",
            message: format!("{end} is before the start date {start}"),
        });
    }
    Ok(())
}

fn candidate_not_found(id: &CandidateId) -> DirectoryError {
    DirectoryError::NotFound {
        entity: "candidate",
        key: id.0.clone(),
    }
}

/// Error raised by the directory service.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },
    #[error("{entity} '{key}' already exists")]
    Conflict { entity: &'static str, key: String },
    #[error(transparent)]
    Store(StoreError),
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl From<StoreError> for DirectoryError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { entity, key } => DirectoryError::Conflict { entity, key },
            StoreError::NotFound { entity, key } => DirectoryError::NotFound { entity, key },
            other => DirectoryError::Store(other),
        }
    }
}

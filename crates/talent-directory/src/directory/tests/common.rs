use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::directory::{directory_router, DirectoryService};
use crate::imports::ImportService;
use crate::store::faulty::FaultyStore;
use crate::store::{
    CandidateRecord, CohortRecord, EnrollmentRecord, NewCandidate, NewCohort, SkillLevel,
    TalentStore,
};

pub(super) struct Harness {
    pub(super) store: Arc<FaultyStore>,
    pub(super) directory: Arc<DirectoryService<FaultyStore>>,
    pub(super) imports: Arc<ImportService<FaultyStore>>,
}

impl Harness {
    pub(super) fn router(&self) -> axum::Router {
        directory_router(Arc::clone(&self.directory), Arc::clone(&self.imports))
    }
}

pub(super) fn build_harness() -> Harness {
    let store = Arc::new(FaultyStore::new());
    Harness {
        directory: Arc::new(DirectoryService::new(Arc::clone(&store))),
        imports: Arc::new(ImportService::new(Arc::clone(&store))),
        store,
    }
}

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn seed_candidate(
    store: &FaultyStore,
    full_name: &str,
    role: Option<&str>,
    skill_level: Option<SkillLevel>,
    is_public: bool,
) -> CandidateRecord {
    let email = format!(
        "{}@example.com",
        full_name.to_lowercase().replace(' ', ".")
    );
    store
        .insert_candidate(NewCandidate {
            full_name: full_name.to_string(),
            email,
            role: role.map(str::to_string),
            skill_level,
            is_public,
            ..NewCandidate::default()
        })
        .expect("candidate inserted")
}

pub(super) fn seed_cohort(store: &FaultyStore, name: &str, start: NaiveDate) -> CohortRecord {
    store
        .insert_cohort(NewCohort {
            cohort_name: name.to_string(),
            program_name: Some("Backend Bootcamp".to_string()),
            start_date: start,
            end_date: start + chrono::Duration::days(90),
            notes: None,
        })
        .expect("cohort inserted")
}

pub(super) fn enroll(store: &FaultyStore, candidate: &CandidateRecord, cohort: &CohortRecord) {
    store
        .enroll(EnrollmentRecord {
            candidate_id: candidate.candidate_id.clone(),
            cohort_id: cohort.cohort_id.clone(),
            enrollment_date: Some(cohort.start_date),
            completion_status: None,
        })
        .expect("enrollment inserted");
}

pub(super) fn csv_request(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "text/csv")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub(super) fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("json body")))
        .expect("request builds")
}

pub(super) fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

pub(super) async fn read_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    serde_json::from_str(&read_body(response).await).expect("json payload")
}

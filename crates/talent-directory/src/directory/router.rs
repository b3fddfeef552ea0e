use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::service::{
    CertificateDraft, ChallengeScore, DirectoryError, DirectoryQuery, DirectoryService,
};
use crate::exports::ExportDataset;
use crate::imports::{template, ImportError, ImportKind, ImportService};
use crate::store::{
    CandidateId, CandidateUpdate, CohortId, CohortUpdate, EventId, NewCandidate, NewChallenge,
    NewCohort, NewEvent, TalentStore,
};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ParticipationBody {
    #[serde(default)]
    participation_role: Option<String>,
}

/// Services shared by every route.
pub struct DirectoryState<S> {
    pub directory: Arc<DirectoryService<S>>,
    pub imports: Arc<ImportService<S>>,
}

impl<S> Clone for DirectoryState<S> {
    fn clone(&self) -> Self {
        Self {
            directory: Arc::clone(&self.directory),
            imports: Arc::clone(&self.imports),
        }
    }
}

/// Router builder exposing imports, exports, the admin console and the public
/// directory.
pub fn directory_router<S>(
    directory: Arc<DirectoryService<S>>,
    imports: Arc<ImportService<S>>,
) -> Router
where
    S: TalentStore + 'static,
{
    Router::new()
        .route("/api/v1/imports/:kind", post(import_handler::<S>))
        .route("/api/v1/imports/:kind/preview", post(preview_handler::<S>))
        .route("/api/v1/imports/:kind/template", get(template_handler))
        .route("/api/v1/exports/:dataset", get(export_handler::<S>))
        .route(
            "/api/v1/candidates",
            get(list_candidates_handler::<S>).post(create_candidate_handler::<S>),
        )
        .route(
            "/api/v1/candidates/:candidate_id",
            get(profile_handler::<S>)
                .patch(update_candidate_handler::<S>)
                .delete(delete_candidate_handler::<S>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/summary",
            post(regenerate_summary_handler::<S>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/cohorts/:cohort_id",
            post(assign_cohort_handler::<S>).delete(remove_cohort_handler::<S>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/challenge-results",
            post(record_challenge_result_handler::<S>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/events/:event_id",
            post(add_participation_handler::<S>),
        )
        .route(
            "/api/v1/candidates/:candidate_id/certificates",
            post(record_certificate_handler::<S>),
        )
        .route(
            "/api/v1/cohorts",
            get(list_cohorts_handler::<S>).post(create_cohort_handler::<S>),
        )
        .route(
            "/api/v1/cohorts/:cohort_id",
            patch(update_cohort_handler::<S>).delete(delete_cohort_handler::<S>),
        )
        .route("/api/v1/challenges", post(create_challenge_handler::<S>))
        .route("/api/v1/events", post(create_event_handler::<S>))
        .route("/api/v1/directory", get(public_directory_handler::<S>))
        .route(
            "/api/v1/directory/:candidate_id",
            get(public_profile_handler::<S>),
        )
        .with_state(DirectoryState { directory, imports })
}

pub(crate) async fn import_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(kind): Path<String>,
    body: String,
) -> Response
where
    S: TalentStore + 'static,
{
    let kind = match kind.parse::<ImportKind>() {
        Ok(kind) => kind,
        Err(error) => return error_response(StatusCode::NOT_FOUND, error.to_string()),
    };

    // Parsing and row-by-row store writes block; run them on the blocking pool.
    let imports = Arc::clone(&state.imports);
    let outcome = tokio::task::spawn_blocking(move || imports.import_text(kind, &body)).await;

    match outcome {
        Ok(Ok(summary)) => {
            let payload = json!({
                "kind": summary.kind,
                "imported": summary.imported,
                "errors": summary.errors,
                "error_details": summary.error_details,
                "message": summary.message(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Ok(Err(error)) => import_error_response(error),
        Err(join_error) => {
            error!(%kind, error = %join_error, "import task failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "import task failed".to_string(),
            )
        }
    }
}

pub(crate) async fn preview_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(kind): Path<String>,
    body: String,
) -> Response
where
    S: TalentStore + 'static,
{
    let kind = match kind.parse::<ImportKind>() {
        Ok(kind) => kind,
        Err(error) => return error_response(StatusCode::NOT_FOUND, error.to_string()),
    };

    match state.imports.preview(kind, &body) {
        Ok(preview) => (StatusCode::OK, Json(preview)).into_response(),
        Err(error) => import_error_response(error),
    }
}

pub(crate) async fn template_handler(Path(kind): Path<String>) -> Response {
    match kind.parse::<ImportKind>() {
        Ok(kind) => csv_response(template(kind).to_string(), &kind.template_filename()),
        Err(error) => error_response(StatusCode::NOT_FOUND, error.to_string()),
    }
}

pub(crate) async fn export_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(dataset): Path<String>,
) -> Response
where
    S: TalentStore + 'static,
{
    let dataset = match dataset.parse::<ExportDataset>() {
        Ok(dataset) => dataset,
        Err(error) => return error_response(StatusCode::NOT_FOUND, error.to_string()),
    };

    match state.directory.export(dataset, Utc::now().date_naive()) {
        Ok(export) => csv_response(export.csv, &export.filename),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn list_candidates_handler<S>(State(state): State<DirectoryState<S>>) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.list_candidates() {
        Ok(candidates) => (StatusCode::OK, Json(candidates)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn create_candidate_handler<S>(
    State(state): State<DirectoryState<S>>,
    Json(candidate): Json<NewCandidate>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.create_candidate(candidate) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn profile_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state
        .directory
        .candidate_profile(&CandidateId(candidate_id))
    {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn update_candidate_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(candidate_id): Path<String>,
    Json(update): Json<CandidateUpdate>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state
        .directory
        .update_candidate(&CandidateId(candidate_id), update)
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn delete_candidate_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.delete_candidate(&CandidateId(candidate_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn regenerate_summary_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state
        .directory
        .regenerate_summary(&CandidateId(candidate_id))
    {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn assign_cohort_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path((candidate_id, cohort_id)): Path<(String, String)>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.assign_to_cohort(
        &CandidateId(candidate_id),
        &CohortId(cohort_id),
        Utc::now().date_naive(),
    ) {
        Ok(enrollment) => (StatusCode::CREATED, Json(enrollment)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn remove_cohort_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path((candidate_id, cohort_id)): Path<(String, String)>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state
        .directory
        .remove_from_cohort(&CandidateId(candidate_id), &CohortId(cohort_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn list_cohorts_handler<S>(State(state): State<DirectoryState<S>>) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.list_cohorts() {
        Ok(cohorts) => (StatusCode::OK, Json(cohorts)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn create_cohort_handler<S>(
    State(state): State<DirectoryState<S>>,
    Json(cohort): Json<NewCohort>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.create_cohort(cohort) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn update_cohort_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(cohort_id): Path<String>,
    Json(update): Json<CohortUpdate>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.update_cohort(&CohortId(cohort_id), update) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn delete_cohort_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(cohort_id): Path<String>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.delete_cohort(&CohortId(cohort_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn create_challenge_handler<S>(
    State(state): State<DirectoryState<S>>,
    Json(challenge): Json<NewChallenge>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.create_challenge(challenge) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn record_challenge_result_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(candidate_id): Path<String>,
    Json(score): Json<ChallengeScore>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state
        .directory
        .record_challenge_result(&CandidateId(candidate_id), score, Utc::now())
    {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn create_event_handler<S>(
    State(state): State<DirectoryState<S>>,
    Json(event): Json<NewEvent>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.create_event(event) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn add_participation_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path((candidate_id, event_id)): Path<(String, String)>,
    Json(body): Json<ParticipationBody>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.add_participation(
        &CandidateId(candidate_id),
        &EventId(event_id),
        body.participation_role,
    ) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn record_certificate_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(candidate_id): Path<String>,
    Json(certificate): Json<CertificateDraft>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state
        .directory
        .record_certificate(&CandidateId(candidate_id), certificate)
    {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn public_directory_handler<S>(
    State(state): State<DirectoryState<S>>,
    Query(query): Query<DirectoryQuery>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.public_directory(&query) {
        Ok(cards) => (StatusCode::OK, Json(cards)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

pub(crate) async fn public_profile_handler<S>(
    State(state): State<DirectoryState<S>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: TalentStore + 'static,
{
    match state.directory.public_profile(&CandidateId(candidate_id)) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(error) => directory_error_response(error),
    }
}

fn csv_response(csv: String, filename: &str) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response()
}

fn import_error_response(error: ImportError) -> Response {
    let status = match error {
        ImportError::Io(_) | ImportError::Parse(_) => StatusCode::BAD_REQUEST,
        ImportError::StoreUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, error.to_string())
}

fn directory_error_response(error: DirectoryError) -> Response {
    let status = match &error {
        DirectoryError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DirectoryError::NotFound { .. } => StatusCode::NOT_FOUND,
        DirectoryError::Conflict { .. } => StatusCode::CONFLICT,
        DirectoryError::Store(store) if store.is_unavailable() => StatusCode::SERVICE_UNAVAILABLE,
        DirectoryError::Store(_) | DirectoryError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, error.to_string())
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use microjob_core::enums::{JobAction, JobStatus, VoteDecision};
use microjob_core::ids::{Identity, JobId};
use microjob_core::job::Job;
use registry::storage::ContentRef;
use registry::{ErrorKind, JobFilter, RegistryError};
use serde::{Deserialize, Serialize};

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/{id}", get(get_job))
        .route("/jobs/{id}/actions", get(allowed_actions))
        .route("/jobs/{id}/apply", post(apply_to_job))
        .route("/jobs/{id}/submit", post(submit_result))
        .route("/jobs/{id}/votes", post(cast_vote))
        .route("/jobs/{id}/claim", post(claim_reward))
        .route("/jobs/{id}/cancel", post(cancel_job))
        .route("/uploads", post(upload))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

pub enum ApiError {
    Registry(RegistryError),
    BadRequest(String),
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        ApiError::Registry(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::Registry(e) => {
                let status = match e.kind() {
                    ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    ErrorKind::InvalidTransition | ErrorKind::DuplicateVote => StatusCode::CONFLICT,
                    ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
                };
                (status, format!("{:?}", e.kind()), e.to_string())
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, "InvalidInput".to_string(), message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub poster: Option<String>,
    pub worker: Option<String>,
}

impl ListQuery {
    fn filters(&self) -> Result<Vec<JobFilter>, ApiError> {
        let mut filters = Vec::new();
        if let Some(raw) = &self.status {
            let status: JobStatus = raw
                .parse()
                .map_err(|e| ApiError::BadRequest(format!("{e}")))?;
            filters.push(JobFilter::Status(status));
        }
        if let Some(poster) = &self.poster {
            filters.push(JobFilter::PostedBy(Identity::new(poster.as_str())));
        }
        if let Some(worker) = &self.worker {
            filters.push(JobFilter::WorkedBy(Identity::new(worker.as_str())));
        }
        Ok(filters)
    }
}

async fn list_jobs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Job>> {
    let filters = query.filters()?;
    let mut jobs = match filters.first() {
        Some(first) => state.registry.list_jobs_filtered(first),
        None => state.registry.list_jobs(),
    };
    jobs.retain(|job| filters.iter().all(|f| f.matches(job)));
    Ok(Json(jobs))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobRequest {
    pub poster: String,
    pub description: String,
    pub reward: u64,
    /// Unix seconds.
    pub deadline: u64,
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> ApiResult<Job> {
    let job = state.registry.create_job(
        &Identity::new(req.poster),
        &req.description,
        req.reward,
        req.deadline,
    )?;
    Ok(Json(job))
}

async fn get_job(State(state): State<Arc<AppState>>, Path(id): Path<u64>) -> ApiResult<Job> {
    Ok(Json(state.registry.get_job(JobId(id))?))
}

#[derive(Debug, Deserialize)]
pub struct ActionsQuery {
    pub identity: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActionsResponse {
    pub job_id: JobId,
    pub identity: Identity,
    pub actions: Vec<JobAction>,
}

async fn allowed_actions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(query): Query<ActionsQuery>,
) -> ApiResult<ActionsResponse> {
    let job_id = JobId(id);
    let identity = Identity::new(query.identity);
    let actions = state.registry.allowed_actions(job_id, &identity)?;
    Ok(Json(ActionsResponse {
        job_id,
        identity,
        actions: actions.into_iter().collect(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActorRequest {
    pub identity: String,
}

async fn apply_to_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Job> {
    let job = state
        .registry
        .apply_to_job(JobId(id), &Identity::new(req.identity))?;
    Ok(Json(job))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitRequest {
    pub identity: String,
    pub result_reference: String,
}

async fn submit_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<SubmitRequest>,
) -> ApiResult<Job> {
    let job = state.registry.submit_result(
        JobId(id),
        &Identity::new(req.identity),
        &req.result_reference,
    )?;
    Ok(Json(job))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteRequest {
    pub identity: String,
    pub decision: VoteDecision,
}

async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<VoteRequest>,
) -> ApiResult<Job> {
    let job = state
        .registry
        .cast_vote(JobId(id), &Identity::new(req.identity), req.decision)?;
    Ok(Json(job))
}

async fn claim_reward(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Job> {
    let job = state
        .registry
        .claim_reward(JobId(id), &Identity::new(req.identity))?;
    Ok(Json(job))
}

async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(req): Json<ActorRequest>,
) -> ApiResult<Job> {
    let job = state
        .registry
        .cancel_job(JobId(id), &Identity::new(req.identity))?;
    Ok(Json(job))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadRequest {
    pub name: String,
    /// Hex-encoded file contents, optionally `0x`-prefixed.
    pub content: String,
}

async fn upload(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UploadRequest>,
) -> ApiResult<ContentRef> {
    let bytes = hex::decode(req.content.trim_start_matches("0x"))
        .map_err(|e| ApiError::BadRequest(format!("invalid hex content: {e}")))?;
    let content = state
        .store
        .upload(&req.name, &bytes)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(Json(content))
}

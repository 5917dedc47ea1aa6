//! REST handlers: submit, inspect and search.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};

use super::error::{ApiError, ApiResult};
use super::state::AppState;
use crate::jobs::{InstallJob, JobId, JobStatus};
use crate::packages::{PackageCatalog, PackagePage};

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    #[serde(default)]
    pub package: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct EnqueueResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

/// Checks a submitted package name and returns it trimmed.
///
/// Empty names, names starting with `-` (they would read as installer
/// options) and names containing whitespace or control characters are rejected.
pub fn validate_package(raw: Option<&str>) -> ApiResult<&str> {
    let name = raw.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiError::bad_request("package required"));
    }
    if name.starts_with('-') {
        return Err(ApiError::bad_request("package must not start with '-'"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ApiError::bad_request("package must be a single name"));
    }
    Ok(name)
}

/// `POST /enqueue` `{"package": "vim"}` → `{"job_id": "…", "status": "queued"}`.
pub async fn enqueue(
    State(state): State<AppState>,
    body: Result<Json<EnqueueRequest>, JsonRejection>,
) -> ApiResult<Json<EnqueueResponse>> {
    let Json(req) = body.map_err(|rej| ApiError::bad_request(rej.body_text()))?;
    let package = validate_package(req.package.as_deref())?;

    let job = state.store.enqueue(package).await;
    tracing::info!(job_id = %job.job_id, package = %job.package, "install queued");
    Ok(Json(EnqueueResponse {
        job_id: job.job_id,
        status: job.status,
    }))
}

/// `GET /queue` → every job record.
pub async fn queue(State(state): State<AppState>) -> Json<Vec<InstallJob>> {
    Json(state.store.list().await)
}

/// `GET /jobs/{job_id}` → one job record.
pub async fn job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<InstallJob>> {
    let not_found = || ApiError::not_found("job not found");
    let job_id: JobId = job_id.parse().map_err(|_| not_found())?;
    state.store.get(&job_id).await.map(Json).ok_or_else(not_found)
}

#[derive(Debug, Deserialize)]
pub struct PackagesQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
    pub size: Option<usize>,
}

/// `GET /packages?q=&page=&size=` → paged catalog search.
pub async fn packages(
    State(state): State<AppState>,
    Query(query): Query<PackagesQuery>,
) -> Json<PackagePage> {
    Json(state.catalog.search(
        query.q.as_deref(),
        query.page.unwrap_or(1),
        query.size.unwrap_or(PackageCatalog::DEFAULT_PAGE_SIZE),
    ))
}

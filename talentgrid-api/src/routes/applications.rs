/// Application endpoints
///
/// # Endpoints
///
/// - `POST /v1/job-postings/:id/applications` - Apply (once per candidate)
/// - `GET  /v1/job-postings/:id/applications`
/// - `PUT  /v1/applications/:id/status` - Review

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use talentgrid_shared::models::{
    application::{Application, ApplicationStatus, CreateApplication},
    job_posting::JobPosting,
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyRequest {
    pub candidate_id: Uuid,

    #[validate(length(max = 10000, message = "Cover letter must be at most 10000 characters"))]
    pub cover_letter: Option<String>,

    #[validate(custom(function = "super::http_url"))]
    pub resume_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

/// Apply to a job posting
///
/// # Errors
///
/// - `404 Not Found`: No such posting or candidate
/// - `409 Conflict`: The candidate already applied
/// - `422 Unprocessable Entity`: The posting is closed
pub async fn apply(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ApplyRequest>,
) -> ApiResult<(StatusCode, Json<Application>)> {
    req.validate()?;

    let posting = JobPosting::find_by_id(&state.db, job_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job posting {job_id} not found")))?;
    if !posting.is_open() {
        return Err(ApiError::Unprocessable {
            code: "job_closed",
            message: format!("job posting {job_id} is closed"),
        });
    }

    state.registry.find_identity(req.candidate_id).await?;

    let data = CreateApplication {
        job_id,
        candidate_id: req.candidate_id,
        cover_letter: req.cover_letter,
        resume_url: req.resume_url,
    };
    let application = Application::create(&state.db, &data)
        .await?
        .ok_or_else(|| data.already_applied())?;

    info!(
        application_id = %application.id,
        job_id = %job_id,
        candidate_id = %application.candidate_id,
        "Application submitted"
    );
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn list_by_job(
    State(state): State<AppState>,
    ApiPath(job_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Application>>> {
    if JobPosting::find_by_id(&state.db, job_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("job posting {job_id} not found")));
    }

    Ok(Json(Application::list_by_job(&state.db, job_id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<Application>> {
    let application = Application::update_status(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("application {id} not found")))?;

    info!(application_id = %id, status = req.status.as_str(), "Application reviewed");
    Ok(Json(application))
}

/// Job posting endpoints
///
/// # Endpoints
///
/// - `POST /v1/job-postings` - Publish a posting (companies only)
/// - `GET  /v1/job-postings/:id`
/// - `POST /v1/job-postings/:id/close`
/// - `GET  /v1/job-postings/:id/matches?limit=N` - Rank profiles against the posting
/// - `GET  /v1/organizations/:id/job-postings`
///
/// New postings are embedded into the enrichment service's `jobs`
/// collection in the background.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use talentgrid_shared::{
    enrichment::{resolve_hits, Collection},
    models::{
        job_posting::{ensure_can_post, CreateJobPosting, EmploymentType, JobPosting},
        membership::MembershipStatus,
        profile::Profile,
    },
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Default number of ranked candidates
const DEFAULT_MATCH_LIMIT: u32 = 10;

/// Upper bound on ranked candidates per request
const MAX_MATCH_LIMIT: u32 = 50;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateJobPostingRequest {
    pub organization_id: Uuid,

    /// Must hold an active membership in the organization
    pub posted_by: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    pub employment_type: EmploymentType,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    #[validate(custom(function = "super::http_urls"))]
    pub attachments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CandidateMatch {
    pub identity_id: Uuid,
    pub score: f32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub job_id: Uuid,
    pub matches: Vec<CandidateMatch>,
}

async fn find_posting(state: &AppState, id: Uuid) -> ApiResult<JobPosting> {
    JobPosting::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job posting {id} not found")))
}

/// Publish a job posting
///
/// # Errors
///
/// - `403 Forbidden`: `posted_by` is not an active member of the organization
/// - `404 Not Found`: Organization or poster does not exist
/// - `422 Unprocessable Entity`: Validation failed, or the organization is an institute
pub async fn create_job_posting(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateJobPostingRequest>,
) -> ApiResult<(StatusCode, Json<JobPosting>)> {
    req.validate()?;

    let organization = state.registry.find_organization(req.organization_id).await?;
    ensure_can_post(&organization)?;

    if let Some(poster) = req.posted_by {
        let is_active_member = state
            .registry
            .list_by_identity(poster)
            .await?
            .iter()
            .any(|m| m.organization_id == organization.id && m.status == MembershipStatus::Active);

        if !is_active_member {
            return Err(ApiError::Forbidden(format!(
                "identity {poster} is not an active member of organization {}",
                organization.id
            )));
        }
    }

    let posting = JobPosting::create(
        &state.db,
        CreateJobPosting {
            organization_id: organization.id,
            posted_by: req.posted_by,
            title: req.title,
            description: req.description,
            location: req.location,
            employment_type: req.employment_type,
            skills: req.skills,
            attachments: req.attachments,
        },
    )
    .await?;

    if let Some(client) = state.enrichment.clone() {
        let document_id = posting.id.to_string();
        let text = posting.document_text();
        tokio::spawn(async move {
            if let Err(e) = client.sync_document(Collection::Jobs, &document_id, &text).await {
                warn!(job_id = %document_id, error = %e, "Job posting sync failed");
            }
        });
    }

    info!(
        job_id = %posting.id,
        organization_id = %posting.organization_id,
        "Job posting published"
    );
    Ok((StatusCode::CREATED, Json(posting)))
}

pub async fn get_job_posting(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<JobPosting>> {
    Ok(Json(find_posting(&state, id).await?))
}

pub async fn close_job_posting(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<JobPosting>> {
    let posting = JobPosting::close(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("job posting {id} not found")))?;

    info!(job_id = %id, "Job posting closed");
    Ok(Json(posting))
}

pub async fn list_by_organization(
    State(state): State<AppState>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<JobPosting>>> {
    state.registry.find_organization(organization_id).await?;
    Ok(Json(
        JobPosting::list_by_organization(&state.db, organization_id).await?,
    ))
}

/// Rank candidate profiles against a posting
///
/// # Errors
///
/// - `404 Not Found`: No such posting
/// - `502 Bad Gateway`: The enrichment service failed
/// - `503 Service Unavailable`: Enrichment is not configured
pub async fn match_candidates(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<MatchQuery>,
) -> ApiResult<Json<MatchResponse>> {
    let client = state.enrichment.clone().ok_or_else(|| {
        ApiError::ServiceUnavailable("Candidate matching is not configured".to_string())
    })?;

    let limit = query
        .limit
        .unwrap_or(DEFAULT_MATCH_LIMIT)
        .clamp(1, MAX_MATCH_LIMIT);

    let posting = find_posting(&state, id).await?;
    let hits = client
        .search(Collection::Profiles, &posting.document_text(), limit)
        .await?;

    let point_ids: Vec<Uuid> = hits.iter().map(|hit| hit.id).collect();
    let candidates = Profile::identity_ids_for_points(&state.db, &point_ids).await?;
    let matches = resolve_hits(&hits, &candidates)
        .into_iter()
        .map(|(identity_id, score)| CandidateMatch { identity_id, score })
        .collect();

    Ok(Json(MatchResponse {
        job_id: posting.id,
        matches,
    }))
}

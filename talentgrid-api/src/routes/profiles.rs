/// Profile endpoints
///
/// # Endpoints
///
/// - `GET /v1/identities/:id/profile`
/// - `PUT /v1/identities/:id/profile` - Create or replace the profile
/// - `PUT /v1/identities/:id/profile/resume-details` - Apply parsed resume content
///
/// After an upsert the profile is handed to the enrichment service in the
/// background: the resume (if any) is queued for parsing and the profile text
/// is embedded into the `profiles` collection. Enrichment failures are logged
/// and never fail the request.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath},
};
use axum::{
    extract::State,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use talentgrid_shared::{
    enrichment::{Collection, EnrichmentClient},
    models::profile::{Education, Profile, ResumeDetails, UpsertProfile, WorkExperience},
};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertProfileRequest {
    #[validate(length(max = 255, message = "Headline must be at most 255 characters"))]
    pub headline: Option<String>,

    pub bio: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub experience: Vec<WorkExperience>,

    #[serde(default)]
    pub education: Vec<Education>,

    /// Permanent URL of an uploaded resume
    #[validate(custom(function = "super::http_url"))]
    pub resume_url: Option<String>,

    /// Permanent URLs of gallery media
    #[serde(default)]
    #[validate(custom(function = "super::http_urls"))]
    pub media: Vec<String>,
}

pub async fn get_profile(
    State(state): State<AppState>,
    ApiPath(identity_id): ApiPath<Uuid>,
) -> ApiResult<Json<Profile>> {
    Profile::find(&state.db, identity_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("profile {identity_id} not found")))
}

/// Create or replace a profile
///
/// # Errors
///
/// - `404 Not Found`: No such identity
/// - `422 Unprocessable Entity`: Validation failed
pub async fn upsert_profile(
    State(state): State<AppState>,
    ApiPath(identity_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpsertProfileRequest>,
) -> ApiResult<Json<Profile>> {
    req.validate()?;
    state.registry.find_identity(identity_id).await?;

    let profile = Profile::upsert(
        &state.db,
        identity_id,
        UpsertProfile {
            headline: req.headline,
            bio: req.bio,
            location: req.location,
            skills: req.skills,
            experience: req.experience,
            education: req.education,
            resume_url: req.resume_url,
            media: req.media,
        },
    )
    .await?;

    if let Some(client) = &state.enrichment {
        spawn_profile_enrichment(client.clone(), &profile, true);
    }

    info!(identity_id = %identity_id, "Profile saved");
    Ok(Json(profile))
}

/// Apply structured resume content, e.g. delivered by the enrichment service
///
/// Overwrites skills, experience and education; other fields are kept.
pub async fn apply_resume_details(
    State(state): State<AppState>,
    ApiPath(identity_id): ApiPath<Uuid>,
    ApiJson(details): ApiJson<ResumeDetails>,
) -> ApiResult<Json<Profile>> {
    let profile = Profile::apply_resume_details(&state.db, identity_id, &details)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("profile {identity_id} not found")))?;

    // The resume was already parsed; only refresh the embedding
    if let Some(client) = &state.enrichment {
        spawn_profile_enrichment(client.clone(), &profile, false);
    }

    info!(
        identity_id = %identity_id,
        skills = profile.skills.len(),
        "Resume details applied to profile"
    );
    Ok(Json(profile))
}

fn spawn_profile_enrichment(client: Arc<EnrichmentClient>, profile: &Profile, parse_resume: bool) {
    let identity_id = profile.identity_id;
    let resume_url = profile.resume_url.clone().filter(|_| parse_resume);
    let text = profile.document_text();

    tokio::spawn(async move {
        if let Some(resume_url) = resume_url {
            if let Err(e) = client.submit_resume(identity_id, &resume_url).await {
                warn!(identity_id = %identity_id, error = %e, "Resume parsing request failed");
            }
        }

        if text.is_empty() {
            return;
        }
        if let Err(e) = client
            .sync_document(Collection::Profiles, &identity_id.to_string(), &text)
            .await
        {
            warn!(identity_id = %identity_id, error = %e, "Profile sync failed");
        }
    });
}

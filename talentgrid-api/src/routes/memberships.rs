/// Membership endpoints
///
/// # Endpoints
///
/// - `GET    /v1/identities/:id/memberships` - Memberships held by an identity
/// - `GET    /v1/organizations/:id/memberships` - Memberships in an organization
/// - `POST   /v1/organizations/:id/memberships` - Grant a role
/// - `GET    /v1/organizations/:id/memberships/:identity_id/:role` - One membership
/// - `PUT    /v1/organizations/:id/memberships/status` - Change a membership's status
/// - `DELETE /v1/organizations/:id/memberships` - Revoke a role
///
/// A membership is addressed by (identity, organization, role); the
/// organization comes from the path and the rest from the JSON body.
///
/// # Example
///
/// ```text
/// POST /v1/organizations/7c9e.../memberships
/// Content-Type: application/json
///
/// {
///   "identity_id": "0f8f...",
///   "role": "student",
///   "status": "active"
/// }
/// ```

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
};
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use talentgrid_shared::models::membership::{
    GrantMembership, Membership, MembershipKey, MembershipStatus, OrgRole,
};
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub identity_id: Uuid,
    pub role: String,

    /// Defaults to pending
    #[serde(default)]
    pub status: MembershipStatus,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub identity_id: Uuid,
    pub role: String,
    pub status: MembershipStatus,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub identity_id: Uuid,
    pub role: String,
}

fn key(identity_id: Uuid, organization_id: Uuid, role: &str) -> ApiResult<MembershipKey> {
    Ok(MembershipKey::new(
        identity_id,
        organization_id,
        OrgRole::parse(role)?,
    ))
}

pub async fn list_by_identity(
    State(state): State<AppState>,
    ApiPath(identity_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Membership>>> {
    Ok(Json(state.registry.list_by_identity(identity_id).await?))
}

pub async fn list_by_organization(
    State(state): State<AppState>,
    ApiPath(organization_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Membership>>> {
    Ok(Json(state.registry.list_by_organization(organization_id).await?))
}

/// Fetch one membership by its (organization, identity, role) triple
pub async fn get_membership(
    State(state): State<AppState>,
    ApiPath((organization_id, identity_id, role)): ApiPath<(Uuid, Uuid, String)>,
) -> ApiResult<Json<Membership>> {
    let key = key(identity_id, organization_id, &role)?;
    Ok(Json(state.registry.find_membership(&key).await?))
}

/// Grant a role
///
/// # Errors
///
/// - `404 Not Found`: Identity or organization does not exist
/// - `409 Conflict`: The identity already holds this role here
/// - `422 Unprocessable Entity`: Invalid role label or date order
pub async fn grant(
    State(state): State<AppState>,
    ApiPath(organization_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<GrantRequest>,
) -> ApiResult<(StatusCode, Json<Membership>)> {
    let data = GrantMembership {
        identity_id: req.identity_id,
        organization_id,
        role: OrgRole::parse(&req.role)?,
        status: req.status,
        start_date: req.start_date,
        end_date: req.end_date,
    };

    let membership = state.registry.grant(data).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// Move a membership to another status
///
/// # Errors
///
/// - `404 Not Found`: No such membership
pub async fn transition(
    State(state): State<AppState>,
    ApiPath(organization_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<TransitionRequest>,
) -> ApiResult<Json<Membership>> {
    let key = key(req.identity_id, organization_id, &req.role)?;
    debug!(membership = %key, status = req.status.as_str(), "Transition requested");

    Ok(Json(state.registry.transition(&key, req.status).await?))
}

/// Revoke a role
///
/// # Errors
///
/// - `404 Not Found`: No such membership
pub async fn revoke(
    State(state): State<AppState>,
    ApiPath(organization_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RevokeRequest>,
) -> ApiResult<StatusCode> {
    let key = key(req.identity_id, organization_id, &req.role)?;
    state.registry.revoke(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

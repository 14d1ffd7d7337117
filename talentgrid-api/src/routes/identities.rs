/// Identity endpoints
///
/// # Endpoints
///
/// - `POST   /v1/identities` - Sign up
/// - `GET    /v1/identities/:id` - Fetch an identity
/// - `PATCH  /v1/identities/:id` - Update an identity
/// - `DELETE /v1/identities/:id` - Delete an identity and its memberships
///
/// Password hashes are never serialized. Changing an existing password
/// requires the current one.

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
use talentgrid_shared::{
    credentials,
    models::identity::{CreateIdentity, Identity, RoleSet, UpdateIdentity},
};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Signup request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateIdentityRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Optional; identities may sign in through an external provider
    pub password: Option<String>,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub full_name: Option<String>,

    /// Platform role tags ("student", "professional", ...)
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Update request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateIdentityRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// `null` clears the name
    #[serde(default, deserialize_with = "super::double_option")]
    pub full_name: Option<Option<String>>,

    /// Replaces the whole role set
    pub roles: Option<Vec<String>>,

    pub is_verified: Option<bool>,

    /// New password
    pub password: Option<String>,

    /// Required when the identity already has a password
    pub current_password: Option<String>,
}

/// Hashes a password after checking its strength
fn hash_new_password(password: &str) -> ApiResult<String> {
    credentials::validate_password_strength(password)?;
    Ok(credentials::hash_password(password)?)
}

/// Sign up
///
/// # Errors
///
/// - `409 Conflict`: Email already registered
/// - `422 Unprocessable Entity`: Validation failed or weak password
pub async fn create_identity(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateIdentityRequest>,
) -> ApiResult<(StatusCode, Json<Identity>)> {
    req.validate()?;

    let password_hash = req.password.as_deref().map(hash_new_password).transpose()?;

    let identity = state
        .registry
        .create_identity(CreateIdentity {
            email: req.email,
            password_hash,
            full_name: req.full_name,
            roles: RoleSet::from(req.roles),
        })
        .await?;

    info!(identity_id = %identity.id, "Identity signed up");
    Ok((StatusCode::CREATED, Json(identity)))
}

pub async fn get_identity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Identity>> {
    Ok(Json(state.registry.find_identity(id).await?))
}

/// Update an identity
///
/// # Errors
///
/// - `403 Forbidden`: Wrong or missing current password
/// - `404 Not Found`: No such identity
/// - `409 Conflict`: Email already registered to another identity
pub async fn update_identity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateIdentityRequest>,
) -> ApiResult<Json<Identity>> {
    req.validate()?;

    let password_hash = match req.password.as_deref() {
        Some(password) => {
            let current = state.registry.find_identity(id).await?;
            if let Some(existing_hash) = current.password_hash.as_deref() {
                let supplied = req.current_password.as_deref().ok_or_else(|| {
                    ApiError::Forbidden("current_password is required".to_string())
                })?;
                if !credentials::verify_password(supplied, existing_hash)? {
                    return Err(ApiError::Forbidden(
                        "current_password is incorrect".to_string(),
                    ));
                }
            }
            Some(Some(hash_new_password(password)?))
        }
        None => None,
    };

    let identity = state
        .registry
        .update_identity(
            id,
            UpdateIdentity {
                email: req.email,
                password_hash,
                full_name: req.full_name,
                roles: req.roles.map(RoleSet::from),
                is_verified: req.is_verified,
            },
        )
        .await?;

    Ok(Json(identity))
}

pub async fn delete_identity(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.registry.delete_identity(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

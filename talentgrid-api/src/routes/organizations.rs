/// Organization endpoints
///
/// # Endpoints
///
/// - `POST   /v1/organizations` - Create a company or institute
/// - `GET    /v1/organizations/:id`
/// - `PATCH  /v1/organizations/:id` - Update (kind cannot change)
/// - `DELETE /v1/organizations/:id` - Delete with all memberships
///
/// When `created_by` is given, that identity becomes an active admin of the
/// new organization in the same operation.

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
use serde::Deserialize;
use serde_json::Value as JsonValue;
use talentgrid_shared::models::organization::{
    CreateOrganization, Organization, OrganizationKind, UpdateOrganization,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn json_object(value: &JsonValue) -> Result<(), ValidationError> {
    if value.is_object() {
        Ok(())
    } else {
        let mut error = ValidationError::new("object");
        error.message = Some("Must be a JSON object".into());
        Err(error)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub kind: OrganizationKind,

    pub description: Option<String>,

    #[validate(custom(function = "super::http_url"))]
    pub website: Option<String>,

    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,

    #[validate(custom(function = "json_object"))]
    pub metadata: Option<JsonValue>,

    #[validate(custom(function = "super::http_url"))]
    pub logo_url: Option<String>,

    /// Becomes an active admin
    pub created_by: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateOrganizationRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub is_verified: Option<bool>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub website: Option<Option<String>>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub location: Option<Option<String>>,

    /// Merged into the existing metadata
    #[validate(custom(function = "json_object"))]
    pub metadata: Option<JsonValue>,

    #[serde(default, deserialize_with = "super::double_option")]
    pub logo_url: Option<Option<String>>,
}

impl UpdateOrganizationRequest {
    /// URL fields nested in `Option<Option<_>>` are checked by hand
    fn check_urls(&self) -> ApiResult<()> {
        for (field, value) in [("website", &self.website), ("logo_url", &self.logo_url)] {
            if let Some(Some(url)) = value {
                super::http_url(url).map_err(|_| {
                    crate::error::ApiError::invalid_field(field, "Must be an http(s) URL")
                })?;
            }
        }
        Ok(())
    }
}

/// Create an organization
///
/// # Errors
///
/// - `404 Not Found`: `created_by` is not an identity (nothing is created)
/// - `422 Unprocessable Entity`: Validation failed
pub async fn create_organization(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    req.validate()?;

    let organization = state
        .registry
        .create_organization(CreateOrganization {
            name: req.name,
            kind: req.kind,
            description: req.description,
            website: req.website,
            location: req.location,
            metadata: req
                .metadata
                .unwrap_or_else(|| JsonValue::Object(Default::default())),
            logo_url: req.logo_url,
            created_by: req.created_by,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn get_organization(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Organization>> {
    Ok(Json(state.registry.find_organization(id).await?))
}

pub async fn update_organization(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateOrganizationRequest>,
) -> ApiResult<Json<Organization>> {
    req.validate()?;
    req.check_urls()?;

    let organization = state
        .registry
        .update_organization(
            id,
            UpdateOrganization {
                name: req.name,
                is_verified: req.is_verified,
                description: req.description,
                website: req.website,
                location: req.location,
                metadata: req.metadata,
                logo_url: req.logo_url,
            },
        )
        .await?;

    Ok(Json(organization))
}

pub async fn delete_organization(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.registry.delete_organization(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Gig endpoints
///
/// - `POST /v1/gigs`
/// - `GET  /v1/gigs/:id`
/// - `GET  /v1/identities/:id/gigs`

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
use talentgrid_shared::models::gig::{CreateGig, Gig, GigStatus};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateGigRequest {
    pub owner_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Description must not be empty"))]
    pub description: String,

    #[validate(range(min = 0, message = "Price must not be negative"))]
    pub price_cents: i64,

    pub currency: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "super::http_urls"))]
    pub media: Vec<String>,

    #[serde(default)]
    pub status: GigStatus,
}

pub async fn create_gig(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateGigRequest>,
) -> ApiResult<(StatusCode, Json<Gig>)> {
    req.validate()?;
    state.registry.find_identity(req.owner_id).await?;

    let data = CreateGig {
        owner_id: req.owner_id,
        title: req.title,
        description: req.description,
        price_cents: req.price_cents,
        currency: req.currency.unwrap_or_else(|| "USD".to_string()),
        media: req.media,
        status: req.status,
    }
    .normalize()?;

    let gig = Gig::create(&state.db, data).await?;
    Ok((StatusCode::CREATED, Json(gig)))
}

pub async fn get_gig(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Gig>> {
    Gig::find_by_id(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("gig {id} not found")))
}

pub async fn list_by_owner(
    State(state): State<AppState>,
    ApiPath(owner_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Gig>>> {
    state.registry.find_identity(owner_id).await?;
    Ok(Json(Gig::list_by_owner(&state.db, owner_id).await?))
}

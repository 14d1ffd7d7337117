/// Conversation endpoints
///
/// - `POST /v1/conversations` - Start a conversation between identities
/// - `GET  /v1/conversations/:id/messages`
/// - `POST /v1/conversations/:id/messages` - Only participants may post

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
use talentgrid_shared::models::conversation::{
    Conversation, CreateConversation, CreateMessage, Message,
};
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateConversationRequest {
    #[validate(length(max = 255, message = "Subject must be at most 255 characters"))]
    pub subject: Option<String>,

    pub participant_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PostMessageRequest {
    pub sender_id: Uuid,

    #[validate(length(min = 1, max = 10000, message = "Message must be 1-10000 characters"))]
    pub body: String,

    #[serde(default)]
    #[validate(custom(function = "super::http_urls"))]
    pub attachments: Vec<String>,
}

async fn find_conversation(state: &AppState, id: Uuid) -> ApiResult<Conversation> {
    Conversation::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("conversation {id} not found")))
}

/// Start a conversation
///
/// # Errors
///
/// - `404 Not Found`: A participant does not exist
/// - `422 Unprocessable Entity`: Fewer than two distinct participants
pub async fn create_conversation(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateConversationRequest>,
) -> ApiResult<(StatusCode, Json<Conversation>)> {
    req.validate()?;

    let data = CreateConversation {
        subject: req.subject,
        participant_ids: req.participant_ids,
    }
    .normalize()?;

    for participant in &data.participant_ids {
        state.registry.find_identity(*participant).await?;
    }

    let conversation = Conversation::create(&state.db, data).await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Message>>> {
    let conversation = find_conversation(&state, id).await?;
    Ok(Json(
        Message::list_by_conversation(&state.db, conversation.id).await?,
    ))
}

/// Post a message
///
/// # Errors
///
/// - `403 Forbidden`: Sender is not a participant
/// - `404 Not Found`: No such conversation
pub async fn post_message(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<PostMessageRequest>,
) -> ApiResult<(StatusCode, Json<Message>)> {
    req.validate()?;

    let conversation = find_conversation(&state, id).await?;
    if !conversation.has_participant(req.sender_id) {
        return Err(ApiError::Forbidden(format!(
            "identity {} is not a participant of conversation {id}",
            req.sender_id
        )));
    }

    let message = Message::create(
        &state.db,
        conversation.id,
        CreateMessage {
            sender_id: req.sender_id,
            body: req.body,
            attachments: req.attachments,
        },
    )
    .await?;

    debug!(conversation_id = %id, message_id = %message.id, "Message posted");
    Ok((StatusCode::CREATED, Json(message)))
}

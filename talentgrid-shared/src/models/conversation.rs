/// Conversations and messages
///
/// A conversation has a fixed set of at least two distinct participants.
/// Only participants may post messages to it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE conversations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     subject VARCHAR(255),
///     participant_ids UUID[] NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE messages (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     conversation_id UUID NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
///     sender_id UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
///     body TEXT NOT NULL,
///     attachments JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{RegistryError, RegistryResult};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conversation {
    pub id: Uuid,
    pub subject: Option<String>,
    pub participant_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, identity_id: Uuid) -> bool {
        self.participant_ids.contains(&identity_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateConversation {
    pub subject: Option<String>,
    pub participant_ids: Vec<Uuid>,
}

impl CreateConversation {
    /// Removes duplicate participants, keeping first-seen order
    ///
    /// Fails unless at least two distinct identities remain.
    pub fn normalize(mut self) -> RegistryResult<Self> {
        let mut seen = Vec::with_capacity(self.participant_ids.len());
        for id in self.participant_ids {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }

        if seen.len() < 2 {
            return Err(RegistryError::invalid(
                "a conversation needs at least two distinct participants",
            ));
        }

        self.participant_ids = seen;
        Ok(self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,

    #[sqlx(json)]
    pub attachments: Vec<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMessage {
    pub sender_id: Uuid,
    pub body: String,

    #[serde(default)]
    pub attachments: Vec<String>,
}

impl Conversation {
    pub async fn create(pool: &PgPool, data: CreateConversation) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(
            r#"
            INSERT INTO conversations (subject, participant_ids)
            VALUES ($1, $2)
            RETURNING id, subject, participant_ids, created_at
            "#,
        )
        .bind(data.subject)
        .bind(data.participant_ids)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Conversation>(
            "SELECT id, subject, participant_ids, created_at FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

impl Message {
    pub async fn create(
        pool: &PgPool,
        conversation_id: Uuid,
        data: CreateMessage,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (conversation_id, sender_id, body, attachments)
            VALUES ($1, $2, $3, $4)
            RETURNING id, conversation_id, sender_id, body, attachments, created_at
            "#,
        )
        .bind(conversation_id)
        .bind(data.sender_id)
        .bind(data.body)
        .bind(Json(data.attachments))
        .fetch_one(pool)
        .await
    }

    /// Messages of a conversation in posting order
    pub async fn list_by_conversation(
        pool: &PgPool,
        conversation_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Message>(
            r#"
            SELECT id, conversation_id, sender_id, body, attachments, created_at
            FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(conversation_id)
        .fetch_all(pool)
        .await
    }
}

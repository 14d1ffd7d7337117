/// Gig model and database operations
///
/// A gig is a priced service an individual offers, e.g. "Logo design".
/// Prices are integer cents in an ISO 4217 currency.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE gigs (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
///     currency CHAR(3) NOT NULL DEFAULT 'USD',
///     media JSONB NOT NULL DEFAULT '[]',
///     status VARCHAR(10) NOT NULL DEFAULT 'draft',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{RegistryError, RegistryResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GigStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl GigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GigStatus::Draft => "draft",
            GigStatus::Published => "published",
            GigStatus::Archived => "archived",
        }
    }
}

impl TryFrom<String> for GigStatus {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "draft" => Ok(GigStatus::Draft),
            "published" => Ok(GigStatus::Published),
            "archived" => Ok(GigStatus::Archived),
            other => Err(RegistryError::invalid(format!("unknown gig status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Gig {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_cents: i64,
    pub currency: String,

    #[sqlx(json)]
    pub media: Vec<String>,

    #[sqlx(try_from = "String")]
    pub status: GigStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGig {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub price_cents: i64,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default)]
    pub media: Vec<String>,

    #[serde(default)]
    pub status: GigStatus,
}

impl CreateGig {
    /// Checks the price and uppercases the currency code
    pub fn normalize(mut self) -> RegistryResult<Self> {
        if self.price_cents < 0 {
            return Err(RegistryError::invalid("price must not be negative"));
        }

        let currency = self.currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RegistryError::invalid(format!(
                "currency '{}' is not a three-letter code",
                self.currency
            )));
        }
        self.currency = currency;

        Ok(self)
    }
}

const GIG_COLUMNS: &str =
    "id, owner_id, title, description, price_cents, currency, media, status, created_at, updated_at";

impl Gig {
    pub async fn create(pool: &PgPool, data: CreateGig) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Gig>(&format!(
            r#"
            INSERT INTO gigs (owner_id, title, description, price_cents, currency, media, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {GIG_COLUMNS}
            "#
        ))
        .bind(data.owner_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.price_cents)
        .bind(data.currency)
        .bind(Json(data.media))
        .bind(data.status.as_str())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Gig>(&format!("SELECT {GIG_COLUMNS} FROM gigs WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Gigs offered by an identity, newest first
    pub async fn list_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Gig>(&format!(
            "SELECT {GIG_COLUMNS} FROM gigs WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gig(price_cents: i64, currency: &str) -> CreateGig {
        CreateGig {
            owner_id: Uuid::new_v4(),
            title: "Logo design".to_string(),
            description: "Three concepts, two revisions".to_string(),
            price_cents,
            currency: currency.to_string(),
            media: vec![],
            status: GigStatus::default(),
        }
    }

    #[test]
    fn test_normalize_uppercases_currency() {
        let normalized = gig(5000, " eur ").normalize().unwrap();
        assert_eq!(normalized.currency, "EUR");
        assert_eq!(normalized.status, GigStatus::Draft);
    }

    #[test]
    fn test_normalize_rejects_bad_input() {
        assert!(gig(-1, "USD").normalize().is_err());
        assert!(gig(100, "US").normalize().is_err());
        assert!(gig(100, "U5D").normalize().is_err());
    }

    #[test]
    fn test_create_gig_defaults() {
        let data: CreateGig = serde_json::from_value(serde_json::json!({
            "owner_id": Uuid::nil(),
            "title": "Tutoring",
            "description": "Calculus",
            "price_cents": 2500
        }))
        .unwrap();

        assert_eq!(data.currency, "USD");
        assert!(data.media.is_empty());
        assert_eq!(data.status, GigStatus::Draft);
    }
}

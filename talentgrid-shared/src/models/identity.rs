/// Identity model and database operations
///
/// An identity is an individual user account. Identities hold a set of
/// platform-level role tags ("student", "recruiter", ...) and join
/// organizations through memberships.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE identities (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255),
///     full_name VARCHAR(255),
///     roles TEXT[] NOT NULL DEFAULT '{}',
///     is_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT identities_email_key UNIQUE (email)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use talentgrid_shared::models::identity::{CreateIdentity, Identity, RoleSet};
/// use talentgrid_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let identity = Identity::create(&pool, CreateIdentity {
///     email: "ada@example.com".to_string(),
///     password_hash: None,
///     full_name: Some("Ada Lovelace".to_string()),
///     roles: RoleSet::from_iter(["student"]),
/// }).await?;
///
/// let found = Identity::find_by_email(&pool, "ADA@example.com").await?;
/// assert_eq!(found.map(|i| i.id), Some(identity.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Set of platform-level role tags held by an identity
///
/// Tags are trimmed and lowercased; empty tags are dropped. Membership checks
/// are order-independent and a tag can appear at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tag, returning false if it was already present or blank
    pub fn insert(&mut self, tag: &str) -> bool {
        match normalize_tag(tag) {
            Some(tag) => self.0.insert(tag),
            None => false,
        }
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        match normalize_tag(tag) {
            Some(tag) => self.0.remove(&tag),
            None => false,
        }
    }

    pub fn contains(&self, tag: &str) -> bool {
        normalize_tag(tag).is_some_and(|tag| self.0.contains(&tag))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Sorted, de-duplicated tags for storage in a `TEXT[]` column
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

fn normalize_tag(tag: &str) -> Option<String> {
    let tag = tag.trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag.to_lowercase())
    }
}

impl<S: AsRef<str>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = RoleSet::new();
        for tag in iter {
            set.insert(tag.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for RoleSet {
    fn from(tags: Vec<String>) -> Self {
        tags.into_iter().collect()
    }
}

impl From<RoleSet> for Vec<String> {
    fn from(set: RoleSet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Normalizes an email address for storage and lookup
///
/// Emails are unique case-insensitively, so they are stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Identity model representing a user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Identity {
    /// Unique identity ID, never changes after creation
    pub id: Uuid,

    /// Lowercased email address, unique across identities
    pub email: String,

    /// Argon2id hash of the password credential, if one was set
    #[serde(skip)]
    pub password_hash: Option<String>,

    /// Optional display name
    pub full_name: Option<String>,

    /// Platform-level role tags
    #[sqlx(try_from = "Vec<String>")]
    pub roles: RoleSet,

    /// Whether the identity has been verified
    pub is_verified: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Builds a fresh identity outside the database (used by the in-memory store)
    pub fn new(data: CreateIdentity) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: normalize_email(&data.email),
            password_hash: data.password_hash,
            full_name: data.full_name,
            roles: data.roles,
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an update in place (used by the in-memory store)
    pub fn apply(&mut self, data: UpdateIdentity) {
        if let Some(email) = data.email {
            self.email = normalize_email(&email);
        }
        if let Some(password_hash) = data.password_hash {
            self.password_hash = password_hash;
        }
        if let Some(full_name) = data.full_name {
            self.full_name = full_name;
        }
        if let Some(roles) = data.roles {
            self.roles = roles;
        }
        if let Some(verified) = data.is_verified {
            self.is_verified = verified;
        }
        self.updated_at = Utc::now();
    }
}

/// Input for creating a new identity
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateIdentity {
    /// Email address (normalized before storage)
    pub email: String,

    /// Argon2id hash, NOT a plaintext password
    pub password_hash: Option<String>,

    pub full_name: Option<String>,

    #[serde(default)]
    pub roles: RoleSet,
}

/// Input for updating an identity
///
/// The id is immutable and therefore absent. Only `Some` fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateIdentity {
    pub email: Option<String>,

    /// New password hash (use Some(None) to remove the credential)
    pub password_hash: Option<Option<String>>,

    /// New display name (use Some(None) to clear)
    pub full_name: Option<Option<String>>,

    /// Replacement role set
    pub roles: Option<RoleSet>,

    pub is_verified: Option<bool>,
}

const IDENTITY_COLUMNS: &str =
    "id, email, password_hash, full_name, roles, is_verified, created_at, updated_at";

impl Identity {
    /// Inserts a new identity
    ///
    /// # Errors
    ///
    /// Returns a database error carrying the `identities_email_key`
    /// constraint when the email is already registered.
    pub async fn create(pool: &PgPool, data: CreateIdentity) -> Result<Self, sqlx::Error> {
        let identity = sqlx::query_as::<_, Identity>(&format!(
            r#"
            INSERT INTO identities (email, password_hash, full_name, roles)
            VALUES ($1, $2, $3, $4)
            RETURNING {IDENTITY_COLUMNS}
            "#
        ))
        .bind(normalize_email(&data.email))
        .bind(data.password_hash)
        .bind(data.full_name)
        .bind(data.roles.to_vec())
        .fetch_one(pool)
        .await?;

        Ok(identity)
    }

    /// Finds an identity by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let identity = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(identity)
    }

    /// Finds an identity by email (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let identity = sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

        Ok(identity)
    }

    /// Checks whether an identity exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM identities WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Updates an identity
    ///
    /// Only `Some` fields in `data` are written and `updated_at` is refreshed.
    /// Returns `None` if the identity doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateIdentity,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE identities SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.password_hash.is_some() {
            bind_count += 1;
            query.push_str(&format!(", password_hash = ${}", bind_count));
        }
        if data.full_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", full_name = ${}", bind_count));
        }
        if data.roles.is_some() {
            bind_count += 1;
            query.push_str(&format!(", roles = ${}", bind_count));
        }
        if data.is_verified.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_verified = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {IDENTITY_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Identity>(&query).bind(id);

        if let Some(email) = data.email {
            q = q.bind(normalize_email(&email));
        }
        if let Some(password_hash) = data.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(full_name) = data.full_name {
            q = q.bind(full_name);
        }
        if let Some(roles) = data.roles {
            q = q.bind(roles.to_vec());
        }
        if let Some(verified) = data.is_verified {
            q = q.bind(verified);
        }

        let identity = q.fetch_optional(pool).await?;

        Ok(identity)
    }

    /// Deletes an identity
    ///
    /// Memberships, profiles, gigs, applications and messages owned by the
    /// identity are removed by `ON DELETE CASCADE`. `participant_ids` arrays
    /// carry no foreign key, so the id is stripped from conversations in the
    /// same transaction.
    ///
    /// Returns true if the identity existed.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE conversations
            SET participant_ids = array_remove(participant_ids, $1)
            WHERE $1 = ANY(participant_ids)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }
}

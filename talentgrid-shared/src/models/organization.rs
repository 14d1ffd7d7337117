/// Organization model and database operations
///
/// An organization is either a company or an institute. The kind is fixed at
/// creation: `UpdateOrganization` has no kind field, and only companies
/// originate job postings.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE organization_kind AS ENUM ('company', 'institute');
///
/// CREATE TABLE organizations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     kind organization_kind NOT NULL,
///     is_verified BOOLEAN NOT NULL DEFAULT FALSE,
///     description TEXT,
///     website VARCHAR(512),
///     location VARCHAR(255),
///     metadata JSONB NOT NULL DEFAULT '{}',
///     logo_url VARCHAR(1024),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Organization kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "organization_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrganizationKind {
    Company,
    Institute,
}

impl OrganizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizationKind::Company => "company",
            OrganizationKind::Institute => "institute",
        }
    }

    /// Whether organizations of this kind can publish job postings
    pub fn originates_job_postings(&self) -> bool {
        matches!(self, OrganizationKind::Company)
    }
}

/// Organization model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,

    /// Company or institute, fixed at creation
    pub kind: OrganizationKind,

    pub is_verified: bool,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,

    /// Free-form descriptive metadata (JSONB object)
    ///
    /// Example: {"industry": "fintech", "size": "51-200"}
    pub metadata: JsonValue,

    /// Permanent URL of the uploaded logo
    pub logo_url: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub kind: OrganizationKind,
    pub description: Option<String>,
    pub website: Option<String>,
    pub location: Option<String>,

    #[serde(default = "empty_metadata")]
    pub metadata: JsonValue,

    pub logo_url: Option<String>,

    /// Identity that creates the organization
    ///
    /// When set, the creator is granted an active `admin` membership in the
    /// same operation.
    pub created_by: Option<Uuid>,
}

fn empty_metadata() -> JsonValue {
    JsonValue::Object(Default::default())
}

/// Input for updating an organization
///
/// `kind` is deliberately absent: it cannot change after creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub is_verified: Option<bool>,
    pub description: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub location: Option<Option<String>>,

    /// Merged into existing metadata (top-level keys overwrite)
    pub metadata: Option<JsonValue>,

    pub logo_url: Option<Option<String>>,
}

impl Organization {
    /// Builds a fresh organization outside the database (used by the in-memory store)
    pub fn new(data: CreateOrganization) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: data.name,
            kind: data.kind,
            is_verified: false,
            description: data.description,
            website: data.website,
            location: data.location,
            metadata: data.metadata,
            logo_url: data.logo_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an update in place, mirroring the SQL update semantics
    pub fn apply(&mut self, data: UpdateOrganization) {
        if let Some(name) = data.name {
            self.name = name;
        }
        if let Some(verified) = data.is_verified {
            self.is_verified = verified;
        }
        if let Some(description) = data.description {
            self.description = description;
        }
        if let Some(website) = data.website {
            self.website = website;
        }
        if let Some(location) = data.location {
            self.location = location;
        }
        if let Some(metadata) = data.metadata {
            merge_metadata(&mut self.metadata, metadata);
        }
        if let Some(logo_url) = data.logo_url {
            self.logo_url = logo_url;
        }
        self.updated_at = Utc::now();
    }
}

/// Shallow-merges `patch` into `target` the way JSONB `||` does
fn merge_metadata(target: &mut JsonValue, patch: JsonValue) {
    match (target, patch) {
        (JsonValue::Object(existing), JsonValue::Object(patch)) => {
            existing.extend(patch);
        }
        (target, patch) => *target = patch,
    }
}

const ORGANIZATION_COLUMNS: &str = "id, name, kind, is_verified, description, website, location, \
     metadata, logo_url, created_at, updated_at";

impl Organization {
    /// Inserts an organization
    ///
    /// Accepts any executor so that it can run inside the transaction that
    /// also grants the creator's admin membership.
    pub async fn create<'e, E>(executor: E, data: &CreateOrganization) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let organization = sqlx::query_as::<_, Organization>(&format!(
            r#"
            INSERT INTO organizations (name, kind, description, website, location, metadata, logo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORGANIZATION_COLUMNS}
            "#
        ))
        .bind(&data.name)
        .bind(data.kind)
        .bind(&data.description)
        .bind(&data.website)
        .bind(&data.location)
        .bind(&data.metadata)
        .bind(&data.logo_url)
        .fetch_one(executor)
        .await?;

        Ok(organization)
    }

    /// Finds an organization by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let organization = sqlx::query_as::<_, Organization>(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(organization)
    }

    /// Checks whether an organization exists
    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM organizations WHERE id = $1)")
                .bind(id)
                .fetch_one(pool)
                .await?;

        Ok(exists)
    }

    /// Updates an organization
    ///
    /// Returns `None` if the organization doesn't exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateOrganization,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE organizations SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.is_verified.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_verified = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.website.is_some() {
            bind_count += 1;
            query.push_str(&format!(", website = ${}", bind_count));
        }
        if data.location.is_some() {
            bind_count += 1;
            query.push_str(&format!(", location = ${}", bind_count));
        }
        if data.metadata.is_some() {
            bind_count += 1;
            query.push_str(&format!(", metadata = metadata || ${}", bind_count));
        }
        if data.logo_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", logo_url = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {ORGANIZATION_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Organization>(&query).bind(id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(verified) = data.is_verified {
            q = q.bind(verified);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(website) = data.website {
            q = q.bind(website);
        }
        if let Some(location) = data.location {
            q = q.bind(location);
        }
        if let Some(metadata) = data.metadata {
            q = q.bind(metadata);
        }
        if let Some(logo_url) = data.logo_url {
            q = q.bind(logo_url);
        }

        q.fetch_optional(pool).await
    }

    /// Deletes an organization; memberships and job postings cascade
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_data(kind: OrganizationKind) -> CreateOrganization {
        CreateOrganization {
            name: "Acme".to_string(),
            kind,
            description: None,
            website: None,
            location: None,
            metadata: json!({"industry": "robotics"}),
            logo_url: None,
            created_by: None,
        }
    }

    #[test]
    fn test_only_companies_post_jobs() {
        assert!(OrganizationKind::Company.originates_job_postings());
        assert!(!OrganizationKind::Institute.originates_job_postings());
    }

    #[test]
    fn test_kind_serde() {
        assert_eq!(
            serde_json::to_value(OrganizationKind::Institute).unwrap(),
            json!("institute")
        );
        let kind: OrganizationKind = serde_json::from_value(json!("company")).unwrap();
        assert_eq!(kind, OrganizationKind::Company);
        assert_eq!(kind.as_str(), "company");
    }

    #[test]
    fn test_create_defaults_metadata() {
        let data: CreateOrganization =
            serde_json::from_value(json!({"name": "MIT", "kind": "institute"})).unwrap();
        assert_eq!(data.metadata, json!({}));
        assert!(data.created_by.is_none());
    }

    #[test]
    fn test_apply_merges_metadata_and_keeps_kind() {
        let mut org = Organization::new(create_data(OrganizationKind::Institute));

        org.apply(UpdateOrganization {
            name: Some("Acme Institute".to_string()),
            metadata: Some(json!({"size": "large"})),
            logo_url: Some(Some("https://cdn.example.com/logo.png".to_string())),
            ..Default::default()
        });

        assert_eq!(org.name, "Acme Institute");
        assert_eq!(org.kind, OrganizationKind::Institute);
        assert_eq!(org.metadata, json!({"industry": "robotics", "size": "large"}));
        assert!(org.logo_url.is_some());
    }
}

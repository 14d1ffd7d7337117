/// Job posting model and database operations
///
/// Postings belong to a company organization. Institutes can host
/// memberships but never originate postings; callers check this with
/// [`ensure_can_post`] before inserting.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE job_postings (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     posted_by UUID REFERENCES identities(id) ON DELETE SET NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     location VARCHAR(255),
///     employment_type VARCHAR(20) NOT NULL,
///     skills TEXT[] NOT NULL DEFAULT '{}',
///     attachments JSONB NOT NULL DEFAULT '[]',
///     status VARCHAR(10) NOT NULL DEFAULT 'open',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use talentgrid_shared::models::job_posting::{ensure_can_post, CreateJobPosting, EmploymentType, JobPosting};
/// use talentgrid_shared::models::organization::Organization;
/// # use sqlx::PgPool;
/// # use uuid::Uuid;
///
/// # async fn example(pool: PgPool, org_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let organization = Organization::find_by_id(&pool, org_id).await?.ok_or("missing")?;
/// ensure_can_post(&organization)?;
///
/// let posting = JobPosting::create(&pool, CreateJobPosting {
///     organization_id: organization.id,
///     posted_by: None,
///     title: "Backend Engineer".to_string(),
///     description: "Build APIs in Rust".to_string(),
///     location: Some("Remote".to_string()),
///     employment_type: EmploymentType::FullTime,
///     skills: vec!["rust".to_string()],
///     attachments: vec![],
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{RegistryError, RegistryResult};
use crate::models::organization::Organization;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Internship,
    Contract,
}

impl EmploymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentType::FullTime => "full_time",
            EmploymentType::PartTime => "part_time",
            EmploymentType::Internship => "internship",
            EmploymentType::Contract => "contract",
        }
    }
}

impl TryFrom<String> for EmploymentType {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "full_time" => Ok(EmploymentType::FullTime),
            "part_time" => Ok(EmploymentType::PartTime),
            "internship" => Ok(EmploymentType::Internship),
            "contract" => Ok(EmploymentType::Contract),
            other => Err(RegistryError::invalid(format!(
                "unknown employment type '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Open,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::Closed => "closed",
        }
    }
}

impl TryFrom<String> for JobStatus {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "open" => Ok(JobStatus::Open),
            "closed" => Ok(JobStatus::Closed),
            other => Err(RegistryError::invalid(format!("unknown job status '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobPosting {
    pub id: Uuid,
    pub organization_id: Uuid,

    /// Identity that published the posting (null once that identity is deleted)
    pub posted_by: Option<Uuid>,

    pub title: String,
    pub description: String,
    pub location: Option<String>,

    #[sqlx(try_from = "String")]
    pub employment_type: EmploymentType,

    pub skills: Vec<String>,

    /// Permanent URLs of attached documents
    #[sqlx(json)]
    pub attachments: Vec<String>,

    #[sqlx(try_from = "String")]
    pub status: JobStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn is_open(&self) -> bool {
        self.status == JobStatus::Open
    }

    /// Text sent to the enrichment service for embedding
    pub fn document_text(&self) -> String {
        let mut text = format!("{}\n{}", self.title, self.description);
        if !self.skills.is_empty() {
            text.push_str("\nSkills: ");
            text.push_str(&self.skills.join(", "));
        }
        text
    }
}

/// Fails with `NotACompany` unless the organization may publish postings
pub fn ensure_can_post(organization: &Organization) -> RegistryResult<()> {
    if organization.kind.originates_job_postings() {
        Ok(())
    } else {
        Err(RegistryError::NotACompany(organization.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobPosting {
    pub organization_id: Uuid,
    pub posted_by: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub employment_type: EmploymentType,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub attachments: Vec<String>,
}

const JOB_POSTING_COLUMNS: &str = "id, organization_id, posted_by, title, description, location, \
     employment_type, skills, attachments, status, created_at, updated_at";

impl JobPosting {
    pub async fn create(pool: &PgPool, data: CreateJobPosting) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            INSERT INTO job_postings
                (organization_id, posted_by, title, description, location, employment_type, skills, attachments)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {JOB_POSTING_COLUMNS}
            "#
        ))
        .bind(data.organization_id)
        .bind(data.posted_by)
        .bind(data.title)
        .bind(data.description)
        .bind(data.location)
        .bind(data.employment_type.as_str())
        .bind(data.skills)
        .bind(Json(data.attachments))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {JOB_POSTING_COLUMNS} FROM job_postings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Postings of an organization, newest first
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {JOB_POSTING_COLUMNS} FROM job_postings \
             WHERE organization_id = $1 ORDER BY created_at DESC"
        ))
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// Marks a posting closed; returns `None` if it does not exist
    pub async fn close(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            UPDATE job_postings
            SET status = 'closed', updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_POSTING_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}

/// Job application model and database operations
///
/// A candidate applies to a posting at most once. Insertion uses
/// `ON CONFLICT DO NOTHING` on the `(job_id, candidate_id)` constraint, so a
/// repeat application comes back as `None` rather than an error.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE applications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     job_id UUID NOT NULL REFERENCES job_postings(id) ON DELETE CASCADE,
///     candidate_id UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
///     cover_letter TEXT,
///     resume_url VARCHAR(1024),
///     status VARCHAR(10) NOT NULL DEFAULT 'submitted',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT applications_job_candidate_key UNIQUE (job_id, candidate_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::RegistryError;

/// Review state of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Submitted,
    Reviewing,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Accepted and rejected applications are decided
    pub fn is_decided(&self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "submitted" => Ok(ApplicationStatus::Submitted),
            "reviewing" => Ok(ApplicationStatus::Reviewing),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(RegistryError::invalid(format!(
                "unknown application status '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,

    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplication {
    pub job_id: Uuid,
    pub candidate_id: Uuid,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

impl CreateApplication {
    /// Error reported when the candidate already applied to this job
    pub fn already_applied(&self) -> RegistryError {
        RegistryError::AlreadyApplied {
            job_id: self.job_id,
            candidate_id: self.candidate_id,
        }
    }
}

const APPLICATION_COLUMNS: &str =
    "id, job_id, candidate_id, cover_letter, resume_url, status, created_at, updated_at";

impl Application {
    /// Inserts the application; `None` if the candidate already applied
    pub async fn create(
        pool: &PgPool,
        data: &CreateApplication,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (job_id, candidate_id, cover_letter, resume_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT ON CONSTRAINT applications_job_candidate_key DO NOTHING
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(data.job_id)
        .bind(data.candidate_id)
        .bind(&data.cover_letter)
        .bind(&data.resume_url)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Applications to a posting, oldest first
    pub async fn list_by_job(pool: &PgPool, job_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_id = $1 ORDER BY created_at"
        ))
        .bind(job_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: ApplicationStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await
    }
}

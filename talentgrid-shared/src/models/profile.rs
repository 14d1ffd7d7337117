/// Profile model and database operations
///
/// One profile per identity. Experience and education are JSONB arrays in the
/// same shape the enrichment service extracts from resumes, so a parsed
/// resume can be applied to a profile directly.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE profiles (
///     identity_id UUID PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
///     headline VARCHAR(255),
///     bio TEXT,
///     location VARCHAR(255),
///     skills TEXT[] NOT NULL DEFAULT '{}',
///     experience JSONB NOT NULL DEFAULT '[]',
///     education JSONB NOT NULL DEFAULT '[]',
///     resume_url VARCHAR(1024),
///     media JSONB NOT NULL DEFAULT '[]',
///     point_id UUID NOT NULL UNIQUE, -- enrichment point id of identity_id
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::enrichment::point_id_for;

/// A position held
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkExperience {
    pub title: String,
    pub company: String,

    /// Free text, e.g. "2020-2023"
    pub duration: String,
}

/// A qualification obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
}

/// Structured resume content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeDetails {
    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub work_experience: Vec<WorkExperience>,

    #[serde(default)]
    pub education: Vec<Education>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub identity_id: Uuid,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub skills: Vec<String>,

    #[sqlx(json)]
    pub experience: Vec<WorkExperience>,

    #[sqlx(json)]
    pub education: Vec<Education>,

    /// Permanent URL of the uploaded resume
    pub resume_url: Option<String>,

    /// Permanent URLs of the media gallery
    #[sqlx(json)]
    pub media: Vec<String>,

    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Text sent to the enrichment service for embedding
    pub fn document_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(headline) = &self.headline {
            parts.push(headline.clone());
        }
        if let Some(bio) = &self.bio {
            parts.push(bio.clone());
        }
        if !self.skills.is_empty() {
            parts.push(format!("Skills: {}", self.skills.join(", ")));
        }
        for job in &self.experience {
            parts.push(format!("{} at {} ({})", job.title, job.company, job.duration));
        }
        for school in &self.education {
            parts.push(format!("{}, {}", school.degree, school.institution));
        }

        parts.join("\n")
    }
}

/// Full replacement of a profile's editable fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpsertProfile {
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    #[serde(default)]
    pub experience: Vec<WorkExperience>,

    #[serde(default)]
    pub education: Vec<Education>,

    pub resume_url: Option<String>,

    #[serde(default)]
    pub media: Vec<String>,
}

const PROFILE_COLUMNS: &str =
    "identity_id, headline, bio, location, skills, experience, education, resume_url, media, updated_at";

impl Profile {
    /// Creates or replaces the profile of an identity
    pub async fn upsert(
        pool: &PgPool,
        identity_id: Uuid,
        data: UpsertProfile,
    ) -> Result<Self, sqlx::Error> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles
                (identity_id, headline, bio, location, skills, experience, education, resume_url, media, point_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (identity_id) DO UPDATE SET
                headline = EXCLUDED.headline,
                bio = EXCLUDED.bio,
                location = EXCLUDED.location,
                skills = EXCLUDED.skills,
                experience = EXCLUDED.experience,
                education = EXCLUDED.education,
                resume_url = EXCLUDED.resume_url,
                media = EXCLUDED.media,
                updated_at = NOW()
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(identity_id)
        .bind(data.headline)
        .bind(data.bio)
        .bind(data.location)
        .bind(data.skills)
        .bind(Json(data.experience))
        .bind(Json(data.education))
        .bind(data.resume_url)
        .bind(Json(data.media))
        .bind(point_id_for(&identity_id.to_string()))
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    pub async fn find(pool: &PgPool, identity_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE identity_id = $1"
        ))
        .bind(identity_id)
        .fetch_optional(pool)
        .await
    }

    /// Overwrites skills, experience and education with parsed resume content
    ///
    /// Returns `None` if the identity has no profile.
    pub async fn apply_resume_details(
        pool: &PgPool,
        identity_id: Uuid,
        details: &ResumeDetails,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles
            SET skills = $2, experience = $3, education = $4, updated_at = NOW()
            WHERE identity_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(identity_id)
        .bind(&details.skills)
        .bind(Json(&details.work_experience))
        .bind(Json(&details.education))
        .fetch_optional(pool)
        .await
    }

    /// Identities whose profile is stored under one of `point_ids`
    pub async fn identity_ids_for_points(
        pool: &PgPool,
        point_ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar("SELECT identity_id FROM profiles WHERE point_id = ANY($1)")
            .bind(point_ids)
            .fetch_all(pool)
            .await
    }
}

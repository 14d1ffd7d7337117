/// Error types for registry and model operations
///
/// `RegistryError` is the single error surfaced by the membership registry and
/// the satellite workflows built on top of it. Uniqueness and existence
/// failures are local, recoverable conditions; `Database` wraps anything the
/// store itself could not complete.
///
/// # Example
///
/// ```
/// use talentgrid_shared::error::RegistryError;
/// use uuid::Uuid;
///
/// let err = RegistryError::not_found("identity", Uuid::nil());
/// assert!(err.is_not_found());
/// ```

use std::fmt;
use uuid::Uuid;

/// Result alias used throughout the shared crate
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Postgres SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Registry error type
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The (identity, organization, role) triple already exists
    #[error("identity {identity_id} already holds role '{role}' in organization {organization_id}")]
    DuplicateRole {
        identity_id: Uuid,
        organization_id: Uuid,
        role: String,
    },

    /// A referenced record does not exist
    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    /// Another identity already uses this email
    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    /// The candidate already applied to this job posting
    #[error("identity {candidate_id} already applied to job posting {job_id}")]
    AlreadyApplied { job_id: Uuid, candidate_id: Uuid },

    /// Only company organizations may originate job postings
    #[error("organization {0} is not a company")]
    NotACompany(Uuid),

    /// Input rejected before reaching the store
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl RegistryError {
    /// Builds a `NotFound` error for any displayable key
    pub fn not_found(entity: &'static str, key: impl fmt::Display) -> Self {
        RegistryError::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Builds an `InvalidInput` error
    pub fn invalid(message: impl Into<String>) -> Self {
        RegistryError::InvalidInput(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    pub fn is_duplicate_role(&self) -> bool {
        matches!(self, RegistryError::DuplicateRole { .. })
    }
}

/// Constraint violation reported by Postgres
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Violation<'a> {
    Unique(&'a str),
    ForeignKey(&'a str),
}

/// Extracts the violated constraint name from a sqlx error, if any
pub(crate) fn violation(err: &sqlx::Error) -> Option<Violation<'_>> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };

    let constraint = db_err.constraint()?;
    match db_err.code().as_deref() {
        Some(UNIQUE_VIOLATION) => Some(Violation::Unique(constraint)),
        Some(FOREIGN_KEY_VIOLATION) => Some(Violation::ForeignKey(constraint)),
        _ => None,
    }
}

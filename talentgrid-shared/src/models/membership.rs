/// Membership model and database operations
///
/// A membership links one identity to one organization with a role-in-org
/// label and a lifecycle status. An identity may hold several distinct roles
/// in the same organization, but never the same role twice.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE membership_status AS ENUM ('pending', 'active', 'inactive');
///
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     identity_id UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
///     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
///     role VARCHAR(50) NOT NULL,
///     status membership_status NOT NULL DEFAULT 'pending',
///     start_date DATE,
///     end_date DATE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT memberships_identity_org_role_key UNIQUE (identity_id, organization_id, role)
/// );
/// ```
///
/// # Lifecycle
///
/// - Created `pending` unless another status is supplied (self-created admin
///   memberships start `active`)
/// - Any status may follow any other
/// - Entering `active` stamps a missing `start_date`; reactivating an
///   `inactive` membership clears its `end_date`
/// - Entering `inactive` stamps a missing `end_date`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::fmt;
use uuid::Uuid;

use crate::error::RegistryError;

/// Maximum length of a role-in-org label
pub const MAX_ROLE_LEN: usize = 50;

/// Common role-in-org labels
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const EMPLOYEE: &str = "employee";
    pub const STUDENT: &str = "student";
    pub const RECRUITER: &str = "recruiter";
    pub const ALUMNI: &str = "alumni";
}

/// Role-in-org label
///
/// Free-form, but normalized (trimmed and lowercased) so that uniqueness of
/// (identity, organization, role) does not depend on spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrgRole(String);

impl OrgRole {
    /// Parses and normalizes a role label
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for blank labels or labels longer than 50 characters.
    pub fn parse(raw: &str) -> Result<Self, RegistryError> {
        let role = raw.trim().to_lowercase();
        if role.is_empty() {
            return Err(RegistryError::invalid("role must not be empty"));
        }
        if role.chars().count() > MAX_ROLE_LEN {
            return Err(RegistryError::invalid(format!(
                "role must be at most {MAX_ROLE_LEN} characters"
            )));
        }
        Ok(Self(role))
    }

    pub fn admin() -> Self {
        Self(roles::ADMIN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for OrgRole {
    type Error = RegistryError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        OrgRole::parse(&raw)
    }
}

impl From<OrgRole> for String {
    fn from(role: OrgRole) -> Self {
        role.0
    }
}

impl fmt::Display for OrgRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Membership lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "membership_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Awaiting confirmation by the organization
    #[default]
    Pending,

    /// Confirmed and current
    Active,

    /// Ended or suspended
    Inactive,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Active => "active",
            MembershipStatus::Inactive => "inactive",
        }
    }
}

/// Start/end dates of a membership
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tenure {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl Tenure {
    /// Applies the date-stamping rules for entering `next`
    ///
    /// `previous` is `None` when the membership is being created.
    pub fn stamp(
        self,
        previous: Option<MembershipStatus>,
        next: MembershipStatus,
        today: NaiveDate,
    ) -> Self {
        match next {
            MembershipStatus::Active => Tenure {
                start_date: self.start_date.or(Some(today)),
                end_date: if previous == Some(MembershipStatus::Inactive) {
                    None
                } else {
                    self.end_date
                },
            },
            MembershipStatus::Inactive => Tenure {
                start_date: self.start_date,
                end_date: self.end_date.or(Some(today)),
            },
            MembershipStatus::Pending => self,
        }
    }
}

/// Identifies a membership by its unique triple
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MembershipKey {
    pub identity_id: Uuid,
    pub organization_id: Uuid,
    pub role: OrgRole,
}

impl MembershipKey {
    pub fn new(identity_id: Uuid, organization_id: Uuid, role: OrgRole) -> Self {
        Self {
            identity_id,
            organization_id,
            role,
        }
    }
}

impl fmt::Display for MembershipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.identity_id, self.organization_id, self.role)
    }
}

/// Membership model representing an identity's role in an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Membership {
    pub id: Uuid,
    pub identity_id: Uuid,
    pub organization_id: Uuid,

    /// Role-in-org label ("student", "employee", "admin", ...)
    #[sqlx(try_from = "String")]
    pub role: OrgRole,

    pub status: MembershipStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn key(&self) -> MembershipKey {
        MembershipKey::new(self.identity_id, self.organization_id, self.role.clone())
    }

    pub fn tenure(&self) -> Tenure {
        Tenure {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Builds a fresh membership outside the database (used by the in-memory store)
    pub fn new(data: GrantMembership, today: NaiveDate) -> Self {
        let now = Utc::now();
        let tenure = data.tenure().stamp(None, data.status, today);
        Self {
            id: Uuid::new_v4(),
            identity_id: data.identity_id,
            organization_id: data.organization_id,
            role: data.role,
            status: data.status,
            start_date: tenure.start_date,
            end_date: tenure.end_date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Moves the membership to `status` in place, stamping dates
    pub fn transition(&mut self, status: MembershipStatus, today: NaiveDate) {
        let tenure = self.tenure().stamp(Some(self.status), status, today);
        self.status = status;
        self.start_date = tenure.start_date;
        self.end_date = tenure.end_date;
        self.updated_at = Utc::now();
    }
}

/// Input for granting a membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantMembership {
    pub identity_id: Uuid,
    pub organization_id: Uuid,
    pub role: OrgRole,

    /// Initial status (defaults to pending)
    #[serde(default)]
    pub status: MembershipStatus,

    #[serde(default)]
    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl GrantMembership {
    /// Grant with default (pending) status and no dates
    pub fn new(identity_id: Uuid, organization_id: Uuid, role: OrgRole) -> Self {
        Self {
            identity_id,
            organization_id,
            role,
            status: MembershipStatus::default(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_status(mut self, status: MembershipStatus) -> Self {
        self.status = status;
        self
    }

    pub fn key(&self) -> MembershipKey {
        MembershipKey::new(self.identity_id, self.organization_id, self.role.clone())
    }

    fn tenure(&self) -> Tenure {
        Tenure {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Checks the supplied dates are ordered
    pub fn validate(&self) -> Result<(), RegistryError> {
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(RegistryError::invalid("end_date must not precede start_date"));
            }
        }
        Ok(())
    }
}

const MEMBERSHIP_COLUMNS: &str = "id, identity_id, organization_id, role, status, start_date, \
     end_date, created_at, updated_at";

impl Membership {
    /// Inserts a membership unless the (identity, organization, role) triple exists
    ///
    /// # Returns
    ///
    /// The new membership, or `None` if the triple is already taken
    ///
    /// # Errors
    ///
    /// Returns a foreign key violation if the identity or organization doesn't
    /// exist (`memberships_identity_fkey` / `memberships_organization_fkey`).
    pub async fn create<'e, E>(
        executor: E,
        data: &GrantMembership,
        today: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let tenure = data.tenure().stamp(None, data.status, today);

        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            INSERT INTO memberships (identity_id, organization_id, role, status, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT ON CONSTRAINT memberships_identity_org_role_key DO NOTHING
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(data.identity_id)
        .bind(data.organization_id)
        .bind(data.role.as_str())
        .bind(data.status)
        .bind(tenure.start_date)
        .bind(tenure.end_date)
        .fetch_optional(executor)
        .await?;

        Ok(membership)
    }

    /// Finds a membership by its triple
    pub async fn find(pool: &PgPool, key: &MembershipKey) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM memberships
            WHERE identity_id = $1 AND organization_id = $2 AND role = $3
            "#
        ))
        .bind(key.identity_id)
        .bind(key.organization_id)
        .bind(key.role.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Updates the status of a membership, applying the date-stamping rules
    ///
    /// In the SET list `status` still refers to the previous value, which is
    /// how reactivation is detected.
    ///
    /// Returns `None` if the membership doesn't exist.
    pub async fn update_status(
        pool: &PgPool,
        key: &MembershipKey,
        status: MembershipStatus,
        today: NaiveDate,
    ) -> Result<Option<Self>, sqlx::Error> {
        let membership = sqlx::query_as::<_, Membership>(&format!(
            r#"
            UPDATE memberships
            SET status = $4,
                start_date = CASE WHEN $4 = 'active'::membership_status
                                  THEN COALESCE(start_date, $5)
                                  ELSE start_date END,
                end_date = CASE WHEN $4 = 'active'::membership_status
                                     AND status = 'inactive'::membership_status THEN NULL
                                WHEN $4 = 'inactive'::membership_status
                                     THEN COALESCE(end_date, $5)
                                ELSE end_date END,
                updated_at = NOW()
            WHERE identity_id = $1 AND organization_id = $2 AND role = $3
            RETURNING {MEMBERSHIP_COLUMNS}
            "#
        ))
        .bind(key.identity_id)
        .bind(key.organization_id)
        .bind(key.role.as_str())
        .bind(status)
        .bind(today)
        .fetch_optional(pool)
        .await?;

        Ok(membership)
    }

    /// Deletes a membership
    ///
    /// Returns true if the membership existed.
    pub async fn delete(pool: &PgPool, key: &MembershipKey) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM memberships WHERE identity_id = $1 AND organization_id = $2 AND role = $3",
        )
        .bind(key.identity_id)
        .bind(key.organization_id)
        .bind(key.role.as_str())
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists all memberships held by an identity
    pub async fn list_by_identity(
        pool: &PgPool,
        identity_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM memberships
            WHERE identity_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(identity_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }

    /// Lists all memberships within an organization
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let memberships = sqlx::query_as::<_, Membership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM memberships
            WHERE organization_id = $1
            ORDER BY created_at ASC
            "#
        ))
        .bind(organization_id)
        .fetch_all(pool)
        .await?;

        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_org_role_normalization() {
        let a = OrgRole::parse("  Admin ").unwrap();
        let b = OrgRole::parse("admin").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, OrgRole::admin());
        assert_eq!(a.to_string(), "admin");
    }

    #[test]
    fn test_org_role_rejects_blank_and_long() {
        assert!(OrgRole::parse("   ").is_err());
        assert!(OrgRole::parse(&"x".repeat(MAX_ROLE_LEN + 1)).is_err());
        assert!(OrgRole::parse(&"x".repeat(MAX_ROLE_LEN)).is_ok());
    }

    #[test]
    fn test_org_role_serde_validates() {
        let role: OrgRole = serde_json::from_str("\"Teaching Assistant\"").unwrap();
        assert_eq!(role.as_str(), "teaching assistant");
        assert!(serde_json::from_str::<OrgRole>("\"\"").is_err());
    }

    #[test]
    fn test_status_default_is_pending() {
        assert_eq!(MembershipStatus::default(), MembershipStatus::Pending);
        assert_eq!(MembershipStatus::Inactive.as_str(), "inactive");
    }

    #[test]
    fn test_grant_deserializes_with_defaults() {
        let grant: GrantMembership = serde_json::from_value(serde_json::json!({
            "identity_id": Uuid::nil(),
            "organization_id": Uuid::nil(),
            "role": "Student"
        }))
        .unwrap();

        assert_eq!(grant.status, MembershipStatus::Pending);
        assert_eq!(grant.role.as_str(), "student");
        assert!(grant.start_date.is_none());
    }

    #[test]
    fn test_grant_validate_date_order() {
        let mut grant = GrantMembership::new(Uuid::nil(), Uuid::nil(), OrgRole::admin());
        grant.start_date = Some(day(10));
        grant.end_date = Some(day(9));
        assert!(grant.validate().is_err());

        grant.end_date = Some(day(10));
        assert!(grant.validate().is_ok());
    }

    #[test]
    fn test_stamp_on_create() {
        let pending = Tenure::default().stamp(None, MembershipStatus::Pending, day(1));
        assert_eq!(pending, Tenure::default());

        let active = Tenure::default().stamp(None, MembershipStatus::Active, day(1));
        assert_eq!(active.start_date, Some(day(1)));
        assert_eq!(active.end_date, None);
    }

    #[test]
    fn test_stamp_keeps_supplied_dates() {
        let supplied = Tenure {
            start_date: Some(day(2)),
            end_date: Some(day(20)),
        };
        let active = supplied.stamp(None, MembershipStatus::Active, day(5));
        assert_eq!(active, supplied);
    }

    #[test]
    fn test_stamp_deactivate_then_reactivate() {
        let mut membership = Membership::new(
            GrantMembership::new(Uuid::nil(), Uuid::nil(), OrgRole::admin())
                .with_status(MembershipStatus::Active),
            day(1),
        );
        assert_eq!(membership.start_date, Some(day(1)));

        membership.transition(MembershipStatus::Inactive, day(5));
        assert_eq!(membership.end_date, Some(day(5)));
        assert_eq!(membership.start_date, Some(day(1)));

        membership.transition(MembershipStatus::Active, day(9));
        assert_eq!(membership.status, MembershipStatus::Active);
        assert_eq!(membership.start_date, Some(day(1)));
        assert_eq!(membership.end_date, None);
    }

    #[test]
    fn test_any_status_may_follow_any_other() {
        let all = [
            MembershipStatus::Pending,
            MembershipStatus::Active,
            MembershipStatus::Inactive,
        ];
        for from in all {
            for to in all {
                let mut membership = Membership::new(
                    GrantMembership::new(Uuid::nil(), Uuid::nil(), OrgRole::admin())
                        .with_status(from),
                    day(1),
                );
                membership.transition(to, day(2));
                assert_eq!(membership.status, to);
            }
        }
    }

    #[test]
    fn test_key_display() {
        let key = MembershipKey::new(Uuid::nil(), Uuid::nil(), OrgRole::admin());
        assert_eq!(
            key.to_string(),
            "00000000-0000-0000-0000-000000000000/00000000-0000-0000-0000-000000000000/admin"
        );
    }
}

/// Membership/role registry
///
/// The registry owns identities, organizations and the memberships linking
/// them, and enforces their invariants:
///
/// - an (identity, organization, role) triple is granted at most once
/// - memberships reference existing identities and organizations
/// - deleting an identity or organization removes its memberships
/// - email addresses are unique (case-insensitive)
///
/// Two stores implement [`MembershipRegistry`]:
///
/// - [`PgRegistry`]: PostgreSQL via sqlx, constraints enforced by the schema
/// - [`InMemoryRegistry`]: hash maps behind a tokio `RwLock`, for tests and
///   local runs
///
/// Every operation is atomic on its own; no ordering is guaranteed across
/// operations.
///
/// # Example
///
/// ```
/// use talentgrid_shared::registry::{InMemoryRegistry, MembershipRegistry};
/// use talentgrid_shared::models::identity::CreateIdentity;
/// use talentgrid_shared::models::organization::{CreateOrganization, OrganizationKind};
/// use talentgrid_shared::models::membership::{GrantMembership, MembershipStatus, OrgRole};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = InMemoryRegistry::new();
///
/// let user = registry.create_identity(CreateIdentity {
///     email: "student@example.com".to_string(),
///     ..Default::default()
/// }).await?;
///
/// let org = registry.create_organization(CreateOrganization {
///     name: "State University".to_string(),
///     kind: OrganizationKind::Institute,
///     description: None,
///     website: None,
///     location: None,
///     metadata: serde_json::json!({}),
///     logo_url: None,
///     created_by: None,
/// }).await?;
///
/// registry.grant(
///     GrantMembership::new(user.id, org.id, OrgRole::parse("student")?)
///         .with_status(MembershipStatus::Active),
/// ).await?;
///
/// assert_eq!(registry.list_by_identity(user.id).await?.len(), 1);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRegistry;
pub use postgres::PgRegistry;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::RegistryResult;
use crate::models::identity::{CreateIdentity, Identity, UpdateIdentity};
use crate::models::membership::{GrantMembership, Membership, MembershipKey, MembershipStatus};
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};

/// Store-agnostic registry operations
#[async_trait]
pub trait MembershipRegistry: Send + Sync {
    /// Creates an identity
    ///
    /// Fails with `DuplicateEmail` if the email is taken.
    async fn create_identity(&self, data: CreateIdentity) -> RegistryResult<Identity>;

    async fn find_identity(&self, id: Uuid) -> RegistryResult<Identity>;

    async fn find_identity_by_email(&self, email: &str) -> RegistryResult<Identity>;

    /// Updates an identity; the id never changes
    async fn update_identity(&self, id: Uuid, data: UpdateIdentity) -> RegistryResult<Identity>;

    /// Deletes an identity and every membership referencing it
    async fn delete_identity(&self, id: Uuid) -> RegistryResult<()>;

    /// Creates an organization
    ///
    /// When `data.created_by` is set, the creator is granted an `active`
    /// `admin` membership in the same atomic operation.
    async fn create_organization(&self, data: CreateOrganization) -> RegistryResult<Organization>;

    async fn find_organization(&self, id: Uuid) -> RegistryResult<Organization>;

    /// Updates an organization; the kind never changes
    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> RegistryResult<Organization>;

    /// Deletes an organization and every membership referencing it
    async fn delete_organization(&self, id: Uuid) -> RegistryResult<()>;

    /// Grants a role in an organization
    ///
    /// Fails with `NotFound` if the identity or organization is missing and
    /// with `DuplicateRole` if the triple already exists.
    async fn grant(&self, data: GrantMembership) -> RegistryResult<Membership>;

    /// Moves a membership to a new status
    ///
    /// Any status may follow any other. Fails with `NotFound` if the
    /// membership doesn't exist.
    async fn transition(
        &self,
        key: &MembershipKey,
        status: MembershipStatus,
    ) -> RegistryResult<Membership>;

    /// Removes a membership; fails with `NotFound` if it doesn't exist
    async fn revoke(&self, key: &MembershipKey) -> RegistryResult<()>;

    async fn find_membership(&self, key: &MembershipKey) -> RegistryResult<Membership>;

    /// Current memberships of an identity, in no particular order
    async fn list_by_identity(&self, identity_id: Uuid) -> RegistryResult<Vec<Membership>>;

    /// Current memberships within an organization, in no particular order
    async fn list_by_organization(&self, organization_id: Uuid)
        -> RegistryResult<Vec<Membership>>;
}

/// Today's date in UTC, used for membership date stamping
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}

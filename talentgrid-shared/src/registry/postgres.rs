/// PostgreSQL-backed registry
///
/// Uniqueness and referential integrity are enforced by the schema; this
/// module translates constraint violations into registry errors.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{today, MembershipRegistry};
use crate::error::{violation, RegistryError, RegistryResult, Violation};
use crate::models::identity::{normalize_email, CreateIdentity, Identity, UpdateIdentity};
use crate::models::membership::{
    GrantMembership, Membership, MembershipKey, MembershipStatus, OrgRole,
};
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};

const EMAIL_KEY: &str = "identities_email_key";
const MEMBERSHIP_IDENTITY_FKEY: &str = "memberships_identity_fkey";
const MEMBERSHIP_ORGANIZATION_FKEY: &str = "memberships_organization_fkey";

/// Registry stored in PostgreSQL
#[derive(Debug, Clone)]
pub struct PgRegistry {
    pool: PgPool,
}

impl PgRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn ensure_identity(&self, id: Uuid) -> RegistryResult<()> {
        if Identity::exists(&self.pool, id).await? {
            Ok(())
        } else {
            Err(RegistryError::not_found("identity", id))
        }
    }

    async fn ensure_organization(&self, id: Uuid) -> RegistryResult<()> {
        if Organization::exists(&self.pool, id).await? {
            Ok(())
        } else {
            Err(RegistryError::not_found("organization", id))
        }
    }
}

/// Maps an email uniqueness violation to `DuplicateEmail`
fn identity_error(err: sqlx::Error, email: &str) -> RegistryError {
    match violation(&err) {
        Some(Violation::Unique(EMAIL_KEY)) => RegistryError::DuplicateEmail(normalize_email(email)),
        _ => RegistryError::Database(err),
    }
}

/// Maps membership foreign key violations to `NotFound`
fn grant_error(err: sqlx::Error, data: &GrantMembership) -> RegistryError {
    match violation(&err) {
        Some(Violation::ForeignKey(MEMBERSHIP_IDENTITY_FKEY)) => {
            RegistryError::not_found("identity", data.identity_id)
        }
        Some(Violation::ForeignKey(MEMBERSHIP_ORGANIZATION_FKEY)) => {
            RegistryError::not_found("organization", data.organization_id)
        }
        _ => RegistryError::Database(err),
    }
}

fn duplicate_role(data: &GrantMembership) -> RegistryError {
    RegistryError::DuplicateRole {
        identity_id: data.identity_id,
        organization_id: data.organization_id,
        role: data.role.to_string(),
    }
}

#[async_trait]
impl MembershipRegistry for PgRegistry {
    async fn create_identity(&self, data: CreateIdentity) -> RegistryResult<Identity> {
        let email = data.email.clone();
        let identity = Identity::create(&self.pool, data)
            .await
            .map_err(|e| identity_error(e, &email))?;

        info!(identity_id = %identity.id, "Identity created");
        Ok(identity)
    }

    async fn find_identity(&self, id: Uuid) -> RegistryResult<Identity> {
        Identity::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| RegistryError::not_found("identity", id))
    }

    async fn find_identity_by_email(&self, email: &str) -> RegistryResult<Identity> {
        Identity::find_by_email(&self.pool, email)
            .await?
            .ok_or_else(|| RegistryError::not_found("identity", normalize_email(email)))
    }

    async fn update_identity(&self, id: Uuid, data: UpdateIdentity) -> RegistryResult<Identity> {
        let email = data.email.clone().unwrap_or_default();
        Identity::update(&self.pool, id, data)
            .await
            .map_err(|e| identity_error(e, &email))?
            .ok_or_else(|| RegistryError::not_found("identity", id))
    }

    async fn delete_identity(&self, id: Uuid) -> RegistryResult<()> {
        if !Identity::delete(&self.pool, id).await? {
            return Err(RegistryError::not_found("identity", id));
        }

        info!(identity_id = %id, "Identity deleted with its memberships");
        Ok(())
    }

    async fn create_organization(&self, data: CreateOrganization) -> RegistryResult<Organization> {
        let mut tx = self.pool.begin().await?;

        let organization = Organization::create(&mut *tx, &data).await?;

        if let Some(creator) = data.created_by {
            let grant = GrantMembership::new(creator, organization.id, OrgRole::admin())
                .with_status(MembershipStatus::Active);

            // A brand-new organization cannot already hold this triple
            Membership::create(&mut *tx, &grant, today())
                .await
                .map_err(|e| grant_error(e, &grant))?
                .ok_or_else(|| duplicate_role(&grant))?;
        }

        tx.commit().await?;

        info!(
            organization_id = %organization.id,
            kind = organization.kind.as_str(),
            created_by = ?data.created_by,
            "Organization created"
        );
        Ok(organization)
    }

    async fn find_organization(&self, id: Uuid) -> RegistryResult<Organization> {
        Organization::find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| RegistryError::not_found("organization", id))
    }

    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> RegistryResult<Organization> {
        Organization::update(&self.pool, id, data)
            .await?
            .ok_or_else(|| RegistryError::not_found("organization", id))
    }

    async fn delete_organization(&self, id: Uuid) -> RegistryResult<()> {
        if !Organization::delete(&self.pool, id).await? {
            return Err(RegistryError::not_found("organization", id));
        }

        info!(organization_id = %id, "Organization deleted with its memberships");
        Ok(())
    }

    async fn grant(&self, data: GrantMembership) -> RegistryResult<Membership> {
        data.validate()?;

        let membership = Membership::create(&self.pool, &data, today())
            .await
            .map_err(|e| grant_error(e, &data))?
            .ok_or_else(|| duplicate_role(&data))?;

        info!(
            identity_id = %membership.identity_id,
            organization_id = %membership.organization_id,
            role = %membership.role,
            status = membership.status.as_str(),
            "Membership granted"
        );
        Ok(membership)
    }

    async fn transition(
        &self,
        key: &MembershipKey,
        status: MembershipStatus,
    ) -> RegistryResult<Membership> {
        let membership = Membership::update_status(&self.pool, key, status, today())
            .await?
            .ok_or_else(|| RegistryError::not_found("membership", key))?;

        info!(membership = %key, status = status.as_str(), "Membership transitioned");
        Ok(membership)
    }

    async fn revoke(&self, key: &MembershipKey) -> RegistryResult<()> {
        if !Membership::delete(&self.pool, key).await? {
            return Err(RegistryError::not_found("membership", key));
        }

        info!(membership = %key, "Membership revoked");
        Ok(())
    }

    async fn find_membership(&self, key: &MembershipKey) -> RegistryResult<Membership> {
        Membership::find(&self.pool, key)
            .await?
            .ok_or_else(|| RegistryError::not_found("membership", key))
    }

    async fn list_by_identity(&self, identity_id: Uuid) -> RegistryResult<Vec<Membership>> {
        self.ensure_identity(identity_id).await?;
        let memberships = Membership::list_by_identity(&self.pool, identity_id).await?;

        debug!(identity_id = %identity_id, count = memberships.len(), "Listed memberships");
        Ok(memberships)
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> RegistryResult<Vec<Membership>> {
        self.ensure_organization(organization_id).await?;
        let memberships = Membership::list_by_organization(&self.pool, organization_id).await?;

        debug!(organization_id = %organization_id, count = memberships.len(), "Listed memberships");
        Ok(memberships)
    }
}

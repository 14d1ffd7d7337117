/// In-memory registry
///
/// Mirrors the PostgreSQL store's semantics (uniqueness, existence checks,
/// cascades, date stamping) with plain hash maps. Each mutating operation
/// holds the write lock for its whole duration, which makes it atomic.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::{today, MembershipRegistry};
use crate::error::{RegistryError, RegistryResult};
use crate::models::identity::{normalize_email, CreateIdentity, Identity, UpdateIdentity};
use crate::models::membership::{
    GrantMembership, Membership, MembershipKey, MembershipStatus, OrgRole,
};
use crate::models::organization::{CreateOrganization, Organization, UpdateOrganization};

#[derive(Debug, Default)]
struct State {
    identities: HashMap<Uuid, Identity>,
    organizations: HashMap<Uuid, Organization>,
    memberships: HashMap<MembershipKey, Membership>,
}

impl State {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.identities
            .values()
            .any(|identity| identity.email == email && Some(identity.id) != except)
    }

    fn insert_membership(&mut self, data: GrantMembership) -> RegistryResult<Membership> {
        if !self.identities.contains_key(&data.identity_id) {
            return Err(RegistryError::not_found("identity", data.identity_id));
        }
        if !self.organizations.contains_key(&data.organization_id) {
            return Err(RegistryError::not_found("organization", data.organization_id));
        }

        let key = data.key();
        if self.memberships.contains_key(&key) {
            return Err(RegistryError::DuplicateRole {
                identity_id: key.identity_id,
                organization_id: key.organization_id,
                role: key.role.to_string(),
            });
        }

        let membership = Membership::new(data, today());
        self.memberships.insert(key, membership.clone());
        Ok(membership)
    }
}

/// Registry kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    state: RwLock<State>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of memberships across all organizations
    pub async fn membership_count(&self) -> usize {
        self.state.read().await.memberships.len()
    }
}

#[async_trait]
impl MembershipRegistry for InMemoryRegistry {
    async fn create_identity(&self, data: CreateIdentity) -> RegistryResult<Identity> {
        let mut state = self.state.write().await;

        let identity = Identity::new(data);
        if state.email_taken(&identity.email, None) {
            return Err(RegistryError::DuplicateEmail(identity.email));
        }

        state.identities.insert(identity.id, identity.clone());

        info!(identity_id = %identity.id, "Identity created");
        Ok(identity)
    }

    async fn find_identity(&self, id: Uuid) -> RegistryResult<Identity> {
        self.state
            .read()
            .await
            .identities
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found("identity", id))
    }

    async fn find_identity_by_email(&self, email: &str) -> RegistryResult<Identity> {
        let email = normalize_email(email);
        self.state
            .read()
            .await
            .identities
            .values()
            .find(|identity| identity.email == email)
            .cloned()
            .ok_or_else(|| RegistryError::not_found("identity", email))
    }

    async fn update_identity(&self, id: Uuid, data: UpdateIdentity) -> RegistryResult<Identity> {
        let mut state = self.state.write().await;

        if let Some(email) = data.email.as_deref().map(normalize_email) {
            if state.email_taken(&email, Some(id)) {
                return Err(RegistryError::DuplicateEmail(email));
            }
        }

        let identity = state
            .identities
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_found("identity", id))?;
        identity.apply(data);

        Ok(identity.clone())
    }

    async fn delete_identity(&self, id: Uuid) -> RegistryResult<()> {
        let mut state = self.state.write().await;

        if state.identities.remove(&id).is_none() {
            return Err(RegistryError::not_found("identity", id));
        }

        let before = state.memberships.len();
        state.memberships.retain(|key, _| key.identity_id != id);

        info!(
            identity_id = %id,
            memberships_removed = before - state.memberships.len(),
            "Identity deleted with its memberships"
        );
        Ok(())
    }

    async fn create_organization(&self, data: CreateOrganization) -> RegistryResult<Organization> {
        let mut state = self.state.write().await;

        let created_by = data.created_by;
        if let Some(creator) = created_by {
            if !state.identities.contains_key(&creator) {
                return Err(RegistryError::not_found("identity", creator));
            }
        }

        let organization = Organization::new(data);
        state
            .organizations
            .insert(organization.id, organization.clone());

        if let Some(creator) = created_by {
            state.insert_membership(
                GrantMembership::new(creator, organization.id, OrgRole::admin())
                    .with_status(MembershipStatus::Active),
            )?;
        }

        info!(
            organization_id = %organization.id,
            kind = organization.kind.as_str(),
            created_by = ?created_by,
            "Organization created"
        );
        Ok(organization)
    }

    async fn find_organization(&self, id: Uuid) -> RegistryResult<Organization> {
        self.state
            .read()
            .await
            .organizations
            .get(&id)
            .cloned()
            .ok_or_else(|| RegistryError::not_found("organization", id))
    }

    async fn update_organization(
        &self,
        id: Uuid,
        data: UpdateOrganization,
    ) -> RegistryResult<Organization> {
        let mut state = self.state.write().await;

        let organization = state
            .organizations
            .get_mut(&id)
            .ok_or_else(|| RegistryError::not_found("organization", id))?;
        organization.apply(data);

        Ok(organization.clone())
    }

    async fn delete_organization(&self, id: Uuid) -> RegistryResult<()> {
        let mut state = self.state.write().await;

        if state.organizations.remove(&id).is_none() {
            return Err(RegistryError::not_found("organization", id));
        }

        let before = state.memberships.len();
        state.memberships.retain(|key, _| key.organization_id != id);

        info!(
            organization_id = %id,
            memberships_removed = before - state.memberships.len(),
            "Organization deleted with its memberships"
        );
        Ok(())
    }

    async fn grant(&self, data: GrantMembership) -> RegistryResult<Membership> {
        data.validate()?;

        let membership = self.state.write().await.insert_membership(data)?;

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
        let mut state = self.state.write().await;

        let membership = state
            .memberships
            .get_mut(key)
            .ok_or_else(|| RegistryError::not_found("membership", key))?;
        membership.transition(status, today());

        info!(membership = %key, status = status.as_str(), "Membership transitioned");
        Ok(membership.clone())
    }

    async fn revoke(&self, key: &MembershipKey) -> RegistryResult<()> {
        if self.state.write().await.memberships.remove(key).is_none() {
            return Err(RegistryError::not_found("membership", key));
        }

        info!(membership = %key, "Membership revoked");
        Ok(())
    }

    async fn find_membership(&self, key: &MembershipKey) -> RegistryResult<Membership> {
        self.state
            .read()
            .await
            .memberships
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::not_found("membership", key))
    }

    async fn list_by_identity(&self, identity_id: Uuid) -> RegistryResult<Vec<Membership>> {
        let state = self.state.read().await;

        if !state.identities.contains_key(&identity_id) {
            return Err(RegistryError::not_found("identity", identity_id));
        }

        let memberships: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.identity_id == identity_id)
            .cloned()
            .collect();

        debug!(identity_id = %identity_id, count = memberships.len(), "Listed memberships");
        Ok(memberships)
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
    ) -> RegistryResult<Vec<Membership>> {
        let state = self.state.read().await;

        if !state.organizations.contains_key(&organization_id) {
            return Err(RegistryError::not_found("organization", organization_id));
        }

        let memberships: Vec<Membership> = state
            .memberships
            .values()
            .filter(|m| m.organization_id == organization_id)
            .cloned()
            .collect();

        debug!(organization_id = %organization_id, count = memberships.len(), "Listed memberships");
        Ok(memberships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::organization::OrganizationKind;

    fn org(kind: OrganizationKind, created_by: Option<Uuid>) -> CreateOrganization {
        CreateOrganization {
            name: "Org".to_string(),
            kind,
            description: None,
            website: None,
            location: None,
            metadata: serde_json::json!({}),
            logo_url: None,
            created_by,
        }
    }

    #[tokio::test]
    async fn test_create_organization_with_missing_creator_leaves_no_trace() {
        let registry = InMemoryRegistry::new();

        let err = registry
            .create_organization(org(OrganizationKind::Company, Some(Uuid::new_v4())))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(registry.state.read().await.organizations.is_empty());
        assert_eq!(registry.membership_count().await, 0);
    }

    #[tokio::test]
    async fn test_update_identity_email_conflict() {
        let registry = InMemoryRegistry::new();
        let a = registry
            .create_identity(CreateIdentity {
                email: "a@example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        registry
            .create_identity(CreateIdentity {
                email: "b@example.com".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let err = registry
            .update_identity(
                a.id,
                UpdateIdentity {
                    email: Some("B@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateEmail(ref e) if e == "b@example.com"));

        // Re-saving its own email is not a conflict
        let same = registry
            .update_identity(
                a.id,
                UpdateIdentity {
                    email: Some("A@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.email, "a@example.com");
    }
}

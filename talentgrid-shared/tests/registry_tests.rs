/// Behavioural tests for the membership registry
///
/// Run against the in-memory store; `pg_registry_tests` repeats the core
/// cases against PostgreSQL.

use talentgrid_shared::error::RegistryError;
use talentgrid_shared::models::identity::{CreateIdentity, Identity};
use talentgrid_shared::models::membership::{
    roles, GrantMembership, MembershipKey, MembershipStatus, OrgRole,
};
use talentgrid_shared::models::organization::{CreateOrganization, Organization, OrganizationKind};
use talentgrid_shared::registry::{InMemoryRegistry, MembershipRegistry};
use uuid::Uuid;

async fn identity(registry: &InMemoryRegistry, email: &str) -> Identity {
    registry
        .create_identity(CreateIdentity {
            email: email.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to create identity")
}

async fn organization(
    registry: &InMemoryRegistry,
    name: &str,
    kind: OrganizationKind,
    created_by: Option<Uuid>,
) -> Organization {
    registry
        .create_organization(CreateOrganization {
            name: name.to_string(),
            kind,
            description: None,
            website: None,
            location: None,
            metadata: serde_json::json!({}),
            logo_url: None,
            created_by,
        })
        .await
        .expect("Failed to create organization")
}

fn role(label: &str) -> OrgRole {
    OrgRole::parse(label).unwrap()
}

fn grant(identity: &Identity, org: &Organization, label: &str) -> GrantMembership {
    GrantMembership::new(identity.id, org.id, role(label))
}

#[tokio::test]
async fn test_grant_twice_is_duplicate_role() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    registry
        .grant(grant(&u1, &org, roles::ADMIN).with_status(MembershipStatus::Active))
        .await
        .unwrap();

    let err = registry
        .grant(grant(&u1, &org, roles::ADMIN).with_status(MembershipStatus::Pending))
        .await
        .unwrap_err();

    assert!(err.is_duplicate_role());
    assert_eq!(registry.list_by_identity(u1.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_role_spelling_does_not_bypass_uniqueness() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    registry.grant(grant(&u1, &org, "Recruiter")).await.unwrap();
    let err = registry.grant(grant(&u1, &org, " recruiter ")).await.unwrap_err();

    assert!(err.is_duplicate_role());
}

#[tokio::test]
async fn test_distinct_roles_and_organizations() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let company = organization(&registry, "Acme", OrganizationKind::Company, None).await;
    let institute = organization(&registry, "State U", OrganizationKind::Institute, None).await;

    registry.grant(grant(&u1, &company, roles::EMPLOYEE)).await.unwrap();
    registry.grant(grant(&u1, &institute, roles::STUDENT)).await.unwrap();
    registry.grant(grant(&u1, &institute, roles::ALUMNI)).await.unwrap();

    let memberships = registry.list_by_identity(u1.id).await.unwrap();
    assert_eq!(memberships.len(), 3);

    let at_institute = registry.list_by_organization(institute.id).await.unwrap();
    let mut labels: Vec<&str> = at_institute.iter().map(|m| m.role.as_str()).collect();
    labels.sort();
    assert_eq!(labels, vec![roles::ALUMNI, roles::STUDENT]);
}

#[tokio::test]
async fn test_list_by_identity_single_membership() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org2 = organization(&registry, "Org2", OrganizationKind::Institute, None).await;

    registry
        .grant(grant(&u1, &org2, roles::STUDENT).with_status(MembershipStatus::Active))
        .await
        .unwrap();

    let memberships = registry.list_by_identity(u1.id).await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].organization_id, org2.id);
    assert_eq!(memberships[0].role.as_str(), roles::STUDENT);
    assert_eq!(memberships[0].status, MembershipStatus::Active);
    assert!(memberships[0].start_date.is_some());
}

#[tokio::test]
async fn test_grant_requires_existing_parties() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    let err = registry
        .grant(GrantMembership::new(Uuid::new_v4(), org.id, role(roles::EMPLOYEE)))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { entity: "identity", .. }));

    let err = registry
        .grant(GrantMembership::new(u1.id, Uuid::new_v4(), role(roles::EMPLOYEE)))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::NotFound { entity: "organization", .. }));

    assert_eq!(registry.membership_count().await, 0);
}

#[tokio::test]
async fn test_transition_stamps_dates() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    let pending = registry.grant(grant(&u1, &org, roles::EMPLOYEE)).await.unwrap();
    assert_eq!(pending.status, MembershipStatus::Pending);
    assert!(pending.start_date.is_none());
    assert!(pending.end_date.is_none());

    let key = pending.key();

    let active = registry
        .transition(&key, MembershipStatus::Active)
        .await
        .unwrap();
    assert_eq!(active.id, pending.id);
    assert!(active.start_date.is_some());
    assert!(active.end_date.is_none());

    let inactive = registry
        .transition(&key, MembershipStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(inactive.start_date, active.start_date);
    assert!(inactive.end_date.is_some());

    let reactivated = registry
        .transition(&key, MembershipStatus::Active)
        .await
        .unwrap();
    assert_eq!(reactivated.start_date, active.start_date);
    assert!(reactivated.end_date.is_none());
}

#[tokio::test]
async fn test_transition_missing_membership() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    let key = MembershipKey::new(u1.id, org.id, role(roles::EMPLOYEE));
    let err = registry
        .transition(&key, MembershipStatus::Active)
        .await
        .unwrap_err();

    assert!(matches!(err, RegistryError::NotFound { entity: "membership", .. }));
}

#[tokio::test]
async fn test_revoke() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    let membership = registry.grant(grant(&u1, &org, roles::EMPLOYEE)).await.unwrap();
    registry.revoke(&membership.key()).await.unwrap();

    assert!(registry.list_by_identity(u1.id).await.unwrap().is_empty());

    // Revoking again, or revoking something never granted, is NotFound
    assert!(registry.revoke(&membership.key()).await.unwrap_err().is_not_found());
    let never = MembershipKey::new(u1.id, org.id, role(roles::ADMIN));
    assert!(registry.revoke(&never).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_find_membership_by_key() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    let granted = registry.grant(grant(&u1, &org, roles::RECRUITER)).await.unwrap();

    let found = registry
        .find_membership(&MembershipKey::new(u1.id, org.id, role(" Recruiter ")))
        .await
        .unwrap();
    assert_eq!(found, granted);

    let other_role = MembershipKey::new(u1.id, org.id, role(roles::EMPLOYEE));
    assert!(registry.find_membership(&other_role).await.unwrap_err().is_not_found());

    registry.revoke(&granted.key()).await.unwrap();
    assert!(registry.find_membership(&granted.key()).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_revoked_role_can_be_granted_again() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    let first = registry.grant(grant(&u1, &org, roles::EMPLOYEE)).await.unwrap();
    registry.revoke(&first.key()).await.unwrap();

    let second = registry.grant(grant(&u1, &org, roles::EMPLOYEE)).await.unwrap();
    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_delete_identity_cascades() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let u2 = identity(&registry, "u2@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    registry.grant(grant(&u1, &org, roles::EMPLOYEE)).await.unwrap();
    registry.grant(grant(&u2, &org, roles::EMPLOYEE)).await.unwrap();

    registry.delete_identity(u1.id).await.unwrap();

    let remaining = registry.list_by_organization(org.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].identity_id, u2.id);
    assert!(registry.list_by_identity(u1.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_organization_cascades() {
    let registry = InMemoryRegistry::new();
    let u1 = identity(&registry, "u1@example.com").await;
    let acme = organization(&registry, "Acme", OrganizationKind::Company, None).await;
    let other = organization(&registry, "Other", OrganizationKind::Company, None).await;

    registry.grant(grant(&u1, &acme, roles::EMPLOYEE)).await.unwrap();
    registry.grant(grant(&u1, &other, roles::EMPLOYEE)).await.unwrap();

    registry.delete_organization(acme.id).await.unwrap();

    let memberships = registry.list_by_identity(u1.id).await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].organization_id, other.id);
    assert!(registry
        .list_by_organization(acme.id)
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_creator_becomes_active_admin() {
    let registry = InMemoryRegistry::new();
    let founder = identity(&registry, "founder@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, Some(founder.id)).await;

    let memberships = registry.list_by_organization(org.id).await.unwrap();
    assert_eq!(memberships.len(), 1);
    assert_eq!(memberships[0].identity_id, founder.id);
    assert_eq!(memberships[0].role, OrgRole::admin());
    assert_eq!(memberships[0].status, MembershipStatus::Active);
}

#[tokio::test]
async fn test_email_uniqueness_is_case_insensitive() {
    let registry = InMemoryRegistry::new();
    identity(&registry, "Ada@Example.com").await;

    let err = registry
        .create_identity(CreateIdentity {
            email: "ada@example.COM".to_string(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateEmail(ref e) if e == "ada@example.com"));

    let found = registry.find_identity_by_email("ADA@EXAMPLE.COM").await.unwrap();
    assert_eq!(found.email, "ada@example.com");
}

#[tokio::test]
async fn test_list_for_unknown_parties_is_not_found() {
    let registry = InMemoryRegistry::new();

    assert!(registry
        .list_by_identity(Uuid::new_v4())
        .await
        .unwrap_err()
        .is_not_found());
    assert!(registry
        .list_by_organization(Uuid::new_v4())
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_concurrent_grants_of_same_triple() {
    let registry = std::sync::Arc::new(InMemoryRegistry::new());
    let u1 = identity(&registry, "u1@example.com").await;
    let org = organization(&registry, "Acme", OrganizationKind::Company, None).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let registry = registry.clone();
        let data = grant(&u1, &org, roles::EMPLOYEE);
        handles.push(tokio::spawn(async move { registry.grant(data).await }));
    }

    let mut granted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => granted += 1,
            Err(err) => assert!(err.is_duplicate_role()),
        }
    }

    assert_eq!(granted, 1);
    assert_eq!(registry.membership_count().await, 1);
}

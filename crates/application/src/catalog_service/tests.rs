use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use turnstile_core::AppError;
use turnstile_domain::{AuditAction, CatalogQuery, RoleGrant};

use crate::test_support::{FakeCatalog, RecordingAuditRepository, actor};
use crate::{
    CreateGroupInput, CreatePermissionInput, CreateRoleInput, ReadRetryPolicy, UpdateGroupInput,
    UpdateRoleInput,
};

use super::CatalogService;

fn build_service() -> (CatalogService, Arc<FakeCatalog>, Arc<RecordingAuditRepository>) {
    let catalog = FakeCatalog::shared();
    let audit = RecordingAuditRepository::shared();
    let service = CatalogService::new(
        catalog.clone(),
        catalog.clone(),
        catalog.clone(),
        audit.clone(),
    )
    .with_read_retry(ReadRetryPolicy::new(3, Duration::from_millis(1)));
    (service, catalog, audit)
}

#[tokio::test]
async fn create_permission_trims_code_and_emits_audit_event() {
    let (service, _catalog, audit) = build_service();
    let actor = actor();

    let permission = service
        .create_permission(
            &actor,
            CreatePermissionInput {
                code: "  USER_READ ".to_owned(),
                description: "Read users".to_owned(),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    assert_eq!(permission.code(), "USER_READ");
    let events = audit.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::PermissionCreated);
    assert_eq!(events[0].subject, "alice");
    assert_eq!(events[0].resource_id, permission.id().to_string());
}

#[tokio::test]
async fn duplicate_permission_code_conflicts_without_audit() {
    let (service, catalog, audit) = build_service();
    catalog.seed_permission("USER_READ").await;

    let result = service
        .create_permission(
            &actor(),
            CreatePermissionInput {
                code: "USER_READ".to_owned(),
                description: String::new(),
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(audit.events().await.is_empty());
}

#[tokio::test]
async fn list_permissions_searches_and_paginates() {
    let (service, catalog, _audit) = build_service();
    for code in ["USER_READ", "USER_WRITE", "LEAVE_APPROVE", "USER_DELETE"] {
        catalog.seed_permission(code).await;
    }

    let page = service
        .list_permissions(
            &actor(),
            &CatalogQuery::new(Some("user".to_owned()), Some(2), Some(2)),
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.page, 2);
    assert_eq!(
        page.items
            .iter()
            .map(|permission| permission.code())
            .collect::<Vec<_>>(),
        vec!["USER_WRITE"]
    );
}

#[tokio::test]
async fn transient_listing_failures_are_retried() {
    let (service, catalog, _audit) = build_service();
    catalog.seed_permission("USER_READ").await;
    catalog.fail_reads(2).await;

    let page = service
        .list_permissions(&actor(), &CatalogQuery::default())
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    assert_eq!(page.total_items, 1);
}

#[tokio::test]
async fn invalid_group_name_never_reaches_the_store() {
    let (service, catalog, audit) = build_service();

    for name in ["Eng1neering", "R&D", "   "] {
        let result = service
            .create_group(
                &actor(),
                CreateGroupInput {
                    name: name.to_owned(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))), "{name}");
    }

    assert_eq!(catalog.write_count().await, 0);
    assert!(audit.events().await.is_empty());
}

#[tokio::test]
async fn group_can_be_created_renamed_and_deactivated() {
    let (service, _catalog, audit) = build_service();
    let actor = actor();

    let group = service
        .create_group(
            &actor,
            CreateGroupInput {
                name: "Engineering - R and D".to_owned(),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert!(group.is_active());
    assert!(group.members().is_empty());

    let updated = service
        .update_group(
            &actor,
            group.id(),
            UpdateGroupInput {
                name: Some("Research".to_owned()),
                is_active: Some(false),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    assert_eq!(updated.name().as_str(), "Research");
    assert!(!updated.is_active());
    assert_eq!(audit.events().await.len(), 2);
}

#[tokio::test]
async fn empty_group_update_is_rejected() {
    let (service, catalog, _audit) = build_service();
    let group = catalog.seed_group("Finance", &[]).await;

    let result = service
        .update_group(&actor(), group.id(), UpdateGroupInput::default())
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn role_update_replaces_grants_and_keeps_name() {
    let (service, catalog, _audit) = build_service();
    let actor = actor();
    let read = catalog.seed_permission("USER_READ").await;
    let finance = catalog.seed_group("Finance", &[]).await;

    let role = service
        .create_role(
            &actor,
            CreateRoleInput {
                name: "Auditor".to_owned(),
                grants: BTreeSet::from([RoleGrant::Permission(read.id())]),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    let updated = service
        .update_role(
            &actor,
            role.id(),
            UpdateRoleInput {
                name: None,
                grants: Some(BTreeSet::from([RoleGrant::Group(finance.id())])),
            },
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    assert_eq!(updated.name(), "Auditor");
    assert_eq!(
        updated.grants(),
        &BTreeSet::from([RoleGrant::Group(finance.id())])
    );
}

#[tokio::test]
async fn missing_role_is_reported_as_not_found() {
    let (service, _catalog, _audit) = build_service();

    let result = service
        .update_role(
            &actor(),
            turnstile_domain::RoleId::new(),
            UpdateRoleInput {
                name: Some("Viewer".to_owned()),
                grants: None,
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

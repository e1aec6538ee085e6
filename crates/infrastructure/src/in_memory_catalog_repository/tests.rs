use std::collections::BTreeSet;
use std::sync::Arc;

use turnstile_application::{
    AccessPointRepository, AccessPointService, AssignmentService, MembershipWriteMode,
    PermissionGroupRepository, PermissionRepository, RoleRepository,
};
use turnstile_core::{AppError, TenantId, UserIdentity};
use turnstile_domain::{
    AccessPoint, AccessPointId, CatalogQuery, GroupName, HttpMethod, Permission, PermissionGroup,
    PermissionGroupId, PermissionId, Role, RoleGrant, RoleId,
};

use super::InMemoryCatalogRepository;
use crate::InMemoryAuditRepository;

fn permission(code: &str) -> Permission {
    Permission::new(PermissionId::new(), code, format!("{code} access"))
        .unwrap_or_else(|error| panic!("{error}"))
}

fn group(name: &str) -> PermissionGroup {
    let name = GroupName::new(name).unwrap_or_else(|error| panic!("{error}"));
    PermissionGroup::new(PermissionGroupId::new(), name)
}

fn access_point(path: &str, method: HttpMethod, module: &str) -> AccessPoint {
    AccessPoint::new(AccessPointId::new(), path, method, module, false)
        .unwrap_or_else(|error| panic!("{error}"))
}

async fn seed_permissions(
    repository: &InMemoryCatalogRepository,
    tenant_id: TenantId,
    codes: &[&str],
) -> Vec<PermissionId> {
    let mut ids = Vec::new();
    for code in codes {
        let created = repository
            .create_permission(tenant_id, permission(code))
            .await
            .unwrap_or_else(|error| panic!("{error}"));
        ids.push(created.id());
    }
    ids
}

async fn seed_group(
    repository: &InMemoryCatalogRepository,
    tenant_id: TenantId,
    name: &str,
    members: &[PermissionId],
) -> PermissionGroupId {
    let created = repository
        .create_group(tenant_id, group(name))
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    if !members.is_empty() {
        repository
            .add_group_permissions(tenant_id, created.id(), &members.iter().copied().collect())
            .await
            .unwrap_or_else(|error| panic!("{error}"));
    }
    created.id()
}

#[tokio::test]
async fn finance_scenario_through_assignment_service() {
    let repository = Arc::new(InMemoryCatalogRepository::new());
    let audit = Arc::new(InMemoryAuditRepository::new());
    let service = AssignmentService::new(repository.clone(), repository.clone(), audit.clone());
    let actor = UserIdentity::new("alice", "Alice", TenantId::new());
    let tenant_id = actor.tenant_id();

    let ids = seed_permissions(&repository, tenant_id, &["P1", "P2", "P3"]).await;
    let finance = seed_group(&repository, tenant_id, "Finance", &ids[..2]).await;

    let mut session = service
        .open_group_session(&actor, finance)
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert!(session.select_for_add(ids[2]).is_ok());
    service
        .apply_add(&actor, &mut session)
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(
        repository.list_group_permissions(tenant_id, finance).await,
        Ok(BTreeSet::from([ids[0], ids[1], ids[2]]))
    );

    assert!(session.select_for_remove(ids[0]).is_ok());
    service
        .apply_remove(&actor, &mut session)
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(
        repository.list_group_permissions(tenant_id, finance).await,
        Ok(BTreeSet::from([ids[1], ids[2]]))
    );
    assert_eq!(audit.events(tenant_id).await.len(), 2);
}

#[tokio::test]
async fn users_endpoint_scenario_through_access_point_service() {
    let repository = Arc::new(InMemoryCatalogRepository::new());
    let service =
        AccessPointService::new(repository.clone(), Arc::new(InMemoryAuditRepository::new()));
    let actor = UserIdentity::new("alice", "Alice", TenantId::new());
    let tenant_id = actor.tenant_id();

    let ids = seed_permissions(&repository, tenant_id, &["USER_READ", "USER_WRITE"]).await;
    let users = repository
        .create_access_point(tenant_id, access_point("/api/users", HttpMethod::Get, "users"))
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    service
        .assign(&actor, users.id(), ids[0])
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    let unmapped = service
        .unmapped_access_points(&actor)
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert!(unmapped.iter().all(|candidate| candidate.id() != users.id()));

    let remapped = service
        .assign(&actor, users.id(), ids[1])
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(remapped.permission(), Some(ids[1]));
    let unmapped = service
        .list_unmapped(&actor, &CatalogQuery::default())
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(unmapped.total_items, 0);
}

#[tokio::test]
async fn strict_mode_rejects_present_ids_and_lenient_skips_them() {
    let tenant_id = TenantId::new();
    for mode in [MembershipWriteMode::Lenient, MembershipWriteMode::Strict] {
        let repository = InMemoryCatalogRepository::new().with_membership_write_mode(mode);
        let ids = seed_permissions(&repository, tenant_id, &["P1", "P2"]).await;
        let group_id = seed_group(&repository, tenant_id, "Finance", &ids[..1]).await;

        let result = repository
            .add_group_permissions(tenant_id, group_id, &ids.iter().copied().collect())
            .await;

        match mode {
            MembershipWriteMode::Lenient => {
                let change = result.unwrap_or_else(|error| panic!("{error}"));
                assert_eq!(change.applied, BTreeSet::from([ids[1]]));
                assert_eq!(change.skipped, BTreeSet::from([ids[0]]));
            }
            MembershipWriteMode::Strict => {
                assert!(matches!(result, Err(AppError::Conflict(_))));
                assert_eq!(
                    repository.list_group_permissions(tenant_id, group_id).await,
                    Ok(BTreeSet::from([ids[0]]))
                );
            }
        }
    }
}

#[tokio::test]
async fn unknown_permission_rejects_whole_add_batch() {
    let repository = InMemoryCatalogRepository::new();
    let tenant_id = TenantId::new();
    let ids = seed_permissions(&repository, tenant_id, &["P1"]).await;
    let group_id = seed_group(&repository, tenant_id, "Finance", &[]).await;

    let result = repository
        .add_group_permissions(
            tenant_id,
            group_id,
            &BTreeSet::from([ids[0], PermissionId::new()]),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(
        repository.list_group_permissions(tenant_id, group_id).await,
        Ok(BTreeSet::new())
    );
}

#[tokio::test]
async fn deleting_permission_cascades_to_groups_roles_and_mappings() {
    let repository = InMemoryCatalogRepository::new();
    let tenant_id = TenantId::new();
    let ids = seed_permissions(&repository, tenant_id, &["USER_READ", "USER_WRITE"]).await;
    let group_id = seed_group(&repository, tenant_id, "Users", &ids).await;
    let users = repository
        .create_access_point(
            tenant_id,
            access_point("/api/users", HttpMethod::Get, "users").with_permission(Some(ids[0])),
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    let role = Role::new(
        RoleId::new(),
        "Viewer",
        [RoleGrant::Permission(ids[0]), RoleGrant::Group(group_id)],
    )
    .unwrap_or_else(|error| panic!("{error}"));
    let role = repository
        .create_role(tenant_id, role)
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    repository
        .delete_permission(tenant_id, ids[0])
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    assert_eq!(
        repository.list_group_permissions(tenant_id, group_id).await,
        Ok(BTreeSet::from([ids[1]]))
    );
    let unmapped = repository
        .list_unmapped_access_points(tenant_id)
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(
        unmapped.iter().map(AccessPoint::id).collect::<Vec<_>>(),
        vec![users.id()]
    );
    let role = repository
        .find_role(tenant_id, role.id())
        .await
        .unwrap_or_else(|error| panic!("{error}"))
        .unwrap_or_else(|| panic!("role should still exist"));
    assert_eq!(role.grants(), &BTreeSet::from([RoleGrant::Group(group_id)]));
}

#[tokio::test]
async fn duplicate_endpoint_and_method_conflicts() {
    let repository = InMemoryCatalogRepository::new();
    let tenant_id = TenantId::new();
    repository
        .create_access_point(tenant_id, access_point("/api/users", HttpMethod::Get, "users"))
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    let duplicate = repository
        .create_access_point(tenant_id, access_point("/api/users", HttpMethod::Get, "admin"))
        .await;
    let other_method = repository
        .create_access_point(tenant_id, access_point("/api/users", HttpMethod::Post, "users"))
        .await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    assert!(other_method.is_ok());
}

#[tokio::test]
async fn listings_use_natural_order_and_stay_tenant_scoped() {
    let repository = InMemoryCatalogRepository::new();
    let tenant_id = TenantId::new();
    seed_permissions(&repository, tenant_id, &["USER_WRITE", "LEAVE_APPROVE", "USER_READ"]).await;
    seed_permissions(&repository, TenantId::new(), &["OTHER_TENANT"]).await;
    for (path, module) in [("/api/users", "users"), ("/api/leave", "leave"), ("/api/audit", "users")]
    {
        repository
            .create_access_point(tenant_id, access_point(path, HttpMethod::Get, module))
            .await
            .unwrap_or_else(|error| panic!("{error}"));
    }

    let codes: Vec<String> = repository
        .list_permissions(tenant_id)
        .await
        .unwrap_or_else(|error| panic!("{error}"))
        .iter()
        .map(|permission| permission.code().to_owned())
        .collect();
    let paths: Vec<String> = repository
        .list_access_points(tenant_id)
        .await
        .unwrap_or_else(|error| panic!("{error}"))
        .iter()
        .map(|access_point| access_point.endpoint_path().to_owned())
        .collect();

    assert_eq!(codes, vec!["LEAVE_APPROVE", "USER_READ", "USER_WRITE"]);
    assert_eq!(paths, vec!["/api/leave", "/api/audit", "/api/users"]);
}

#[tokio::test]
async fn removing_non_member_removes_nothing() {
    let repository = InMemoryCatalogRepository::new();
    let tenant_id = TenantId::new();
    let ids = seed_permissions(&repository, tenant_id, &["P1", "P2"]).await;
    let group_id = seed_group(&repository, tenant_id, "Finance", &ids[..1]).await;

    let result = repository
        .remove_group_permissions(tenant_id, group_id, &ids.iter().copied().collect())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(
        repository.list_group_permissions(tenant_id, group_id).await,
        Ok(BTreeSet::from([ids[0]]))
    );
}

#[tokio::test]
async fn deleting_role_drops_it_from_user_assignments() {
    let repository = InMemoryCatalogRepository::new();
    let tenant_id = TenantId::new();
    let admin = repository
        .create_role(
            tenant_id,
            Role::new(RoleId::new(), "Admin", []).unwrap_or_else(|error| panic!("{error}")),
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    let viewer = repository
        .create_role(
            tenant_id,
            Role::new(RoleId::new(), "Viewer", []).unwrap_or_else(|error| panic!("{error}")),
        )
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    repository
        .replace_user_roles(tenant_id, "bob", &BTreeSet::from([admin.id(), viewer.id()]))
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    repository
        .delete_role(tenant_id, admin.id())
        .await
        .unwrap_or_else(|error| panic!("{error}"));

    let assignment = repository
        .user_roles(tenant_id, "bob")
        .await
        .unwrap_or_else(|error| panic!("{error}"));
    assert_eq!(assignment.role_ids, BTreeSet::from([viewer.id()]));
    assert!(assignment.updated_at.is_some());

    let unknown = repository
        .replace_user_roles(tenant_id, "bob", &BTreeSet::from([admin.id()]))
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn renaming_group_to_existing_name_conflicts() {
    let repository = InMemoryCatalogRepository::new();
    let tenant_id = TenantId::new();
    seed_group(&repository, tenant_id, "Finance", &[]).await;
    let payroll = seed_group(&repository, tenant_id, "Payroll", &[]).await;

    let result = repository
        .update_group(
            tenant_id,
            payroll,
            Some(GroupName::new("Finance").unwrap_or_else(|error| panic!("{error}"))),
            None,
        )
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn mixed_case_listings_use_byte_order() {
    let repository = InMemoryCatalogRepository::new();
    let tenant_id = TenantId::new();
    seed_permissions(&repository, tenant_id, &["audit.view", "ZONE_EDIT", "Users.read"]).await;
    for name in ["alpha", "Zeta", "Beta"] {
        seed_group(&repository, tenant_id, name, &[]).await;
    }

    let codes: Vec<String> = repository
        .list_permissions(tenant_id)
        .await
        .unwrap_or_else(|error| panic!("{error}"))
        .iter()
        .map(|permission| permission.code().to_owned())
        .collect();
    let names: Vec<String> = repository
        .list_groups(tenant_id)
        .await
        .unwrap_or_else(|error| panic!("{error}"))
        .iter()
        .map(|group| group.name().as_str().to_owned())
        .collect();

    assert_eq!(codes, vec!["Users.read", "ZONE_EDIT", "audit.view"]);
    assert_eq!(names, vec!["Beta", "Zeta", "alpha"]);
}

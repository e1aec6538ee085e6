use async_trait::async_trait;
use tracing::debug;

use turnstile_application::{MembershipChange, PermissionGroupRepository};

use super::*;

async fn lock_group(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    group_id: PermissionGroupId,
) -> AppResult<GroupRow> {
    sqlx::query_as::<_, GroupRow>(
        r#"
        SELECT id, name, is_active
        FROM catalog_permission_groups
        WHERE tenant_id = $1 AND id = $2
        FOR UPDATE
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(group_id.as_uuid())
    .fetch_optional(&mut **transaction)
    .await
    .map_err(|error| map_sqlx_error(error, "lock permission group"))?
    .ok_or_else(|| missing("permission group", group_id, tenant_id))
}

async fn members_in(
    transaction: &mut Transaction<'_, Postgres>,
    group_id: PermissionGroupId,
) -> AppResult<BTreeSet<PermissionId>> {
    let rows = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT permission_id
        FROM catalog_permission_group_members
        WHERE group_id = $1
        "#,
    )
    .bind(group_id.as_uuid())
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| map_sqlx_error(error, "list group permissions"))?;

    Ok(rows.into_iter().map(PermissionId::from_uuid).collect())
}

async fn ensure_permissions_exist(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    permissions: &BTreeSet<PermissionId>,
) -> AppResult<()> {
    let known: BTreeSet<PermissionId> = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT id
        FROM catalog_permissions
        WHERE tenant_id = $1 AND id = ANY($2)
        "#,
    )
    .bind(tenant_id.as_uuid())
    .bind(uuids(permissions))
    .fetch_all(&mut **transaction)
    .await
    .map_err(|error| map_sqlx_error(error, "resolve permissions"))?
    .into_iter()
    .map(PermissionId::from_uuid)
    .collect();

    let unknown: Vec<&PermissionId> = permissions.difference(&known).collect();
    if !unknown.is_empty() {
        return Err(AppError::NotFound(format!(
            "unknown permissions for tenant '{tenant_id}': {}",
            join_ids(unknown)
        )));
    }
    Ok(())
}

async fn insert_members(
    transaction: &mut Transaction<'_, Postgres>,
    group_id: PermissionGroupId,
    permissions: &BTreeSet<PermissionId>,
) -> AppResult<()> {
    if permissions.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        INSERT INTO catalog_permission_group_members (group_id, permission_id)
        SELECT $1, permission_id
        FROM UNNEST($2::uuid[]) AS permission_id
        "#,
    )
    .bind(group_id.as_uuid())
    .bind(uuids(permissions))
    .execute(&mut **transaction)
    .await
    .map_err(|error| map_sqlx_error(error, "add group permissions"))?;

    Ok(())
}

fn uuids(permissions: &BTreeSet<PermissionId>) -> Vec<Uuid> {
    permissions.iter().map(PermissionId::as_uuid).collect()
}

#[async_trait]
impl PermissionGroupRepository for PostgresCatalogRepository {
    async fn list_groups(&self, tenant_id: TenantId) -> AppResult<Vec<PermissionGroup>> {
        let rows = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT id, name, is_active
            FROM catalog_permission_groups
            WHERE tenant_id = $1
            ORDER BY name COLLATE "C"
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list permission groups"))?;

        let member_rows = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT members.group_id, members.permission_id
            FROM catalog_permission_group_members AS members
            INNER JOIN catalog_permission_groups AS groups
                ON groups.id = members.group_id
            WHERE groups.tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list group permissions"))?;

        let mut members = group_members(member_rows);
        rows.into_iter()
            .map(|row| {
                let group_members = members.remove(&row.id).unwrap_or_default();
                build_group(row, group_members)
            })
            .collect()
    }

    async fn find_group(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<Option<PermissionGroup>> {
        let Some(row) = sqlx::query_as::<_, GroupRow>(
            r#"
            SELECT id, name, is_active
            FROM catalog_permission_groups
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(group_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "find permission group"))?
        else {
            return Ok(None);
        };

        let members = self.list_group_permissions(tenant_id, group_id).await?;
        build_group(row, members).map(Some)
    }

    async fn create_group(
        &self,
        tenant_id: TenantId,
        group: PermissionGroup,
    ) -> AppResult<PermissionGroup> {
        let mut transaction = self.begin().await?;
        ensure_permissions_exist(&mut transaction, tenant_id, group.members()).await?;

        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            INSERT INTO catalog_permission_groups (id, tenant_id, name, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, is_active
            "#,
        )
        .bind(group.id().as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(group.name().as_str())
        .bind(group.is_active())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "create permission group"))?;

        insert_members(&mut transaction, group.id(), group.members()).await?;
        commit(transaction).await?;

        build_group(row, group.members().clone())
    }

    async fn update_group(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        name: Option<GroupName>,
        is_active: Option<bool>,
    ) -> AppResult<PermissionGroup> {
        let mut transaction = self.begin().await?;
        let row = sqlx::query_as::<_, GroupRow>(
            r#"
            UPDATE catalog_permission_groups
            SET name = COALESCE($3, name), is_active = COALESCE($4, is_active)
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, name, is_active
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(group_id.as_uuid())
        .bind(name.as_ref().map(GroupName::as_str))
        .bind(is_active)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "update permission group"))?
        .ok_or_else(|| missing("permission group", group_id, tenant_id))?;

        let members = members_in(&mut transaction, group_id).await?;
        commit(transaction).await?;

        build_group(row, members)
    }

    async fn delete_group(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM catalog_permission_groups
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(group_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "delete permission group"))?;

        if result.rows_affected() == 0 {
            return Err(missing("permission group", group_id, tenant_id));
        }
        Ok(())
    }

    async fn list_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
    ) -> AppResult<BTreeSet<PermissionId>> {
        let rows = sqlx::query_as::<_, (Uuid, Option<Uuid>)>(
            r#"
            SELECT groups.id, members.permission_id
            FROM catalog_permission_groups AS groups
            LEFT JOIN catalog_permission_group_members AS members
                ON members.group_id = groups.id
            WHERE groups.tenant_id = $1 AND groups.id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(group_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list group permissions"))?;

        if rows.is_empty() {
            return Err(missing("permission group", group_id, tenant_id));
        }
        Ok(rows
            .into_iter()
            .filter_map(|(_, permission_id)| permission_id.map(PermissionId::from_uuid))
            .collect())
    }

    async fn add_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        let mut transaction = self.begin().await?;
        let group = lock_group(&mut transaction, tenant_id, group_id).await?;
        ensure_permissions_exist(&mut transaction, tenant_id, permissions).await?;

        let mut membership = members_in(&mut transaction, group_id).await?;
        let present: BTreeSet<PermissionId> =
            permissions.intersection(&membership).copied().collect();
        if self.membership_write_mode == MembershipWriteMode::Strict && !present.is_empty() {
            return Err(AppError::Conflict(format!(
                "permissions already in group '{}': {}",
                group.name,
                join_ids(present)
            )));
        }

        let applied: BTreeSet<PermissionId> =
            permissions.difference(&membership).copied().collect();
        insert_members(&mut transaction, group_id, &applied).await?;
        commit(transaction).await?;
        debug!(
            %tenant_id,
            %group_id,
            applied = applied.len(),
            skipped = present.len(),
            "committed group permission additions"
        );

        membership.extend(applied.iter().copied());
        Ok(MembershipChange {
            applied,
            skipped: present,
            membership,
        })
    }

    async fn remove_group_permissions(
        &self,
        tenant_id: TenantId,
        group_id: PermissionGroupId,
        permissions: &BTreeSet<PermissionId>,
    ) -> AppResult<MembershipChange> {
        let mut transaction = self.begin().await?;
        let group = lock_group(&mut transaction, tenant_id, group_id).await?;

        let mut membership = members_in(&mut transaction, group_id).await?;
        let absent: Vec<&PermissionId> = permissions.difference(&membership).collect();
        if !absent.is_empty() {
            return Err(AppError::NotFound(format!(
                "permissions not in group '{}': {}",
                group.name,
                join_ids(absent)
            )));
        }

        sqlx::query(
            r#"
            DELETE FROM catalog_permission_group_members
            WHERE group_id = $1 AND permission_id = ANY($2)
            "#,
        )
        .bind(group_id.as_uuid())
        .bind(uuids(permissions))
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "remove group permissions"))?;
        commit(transaction).await?;
        debug!(
            %tenant_id,
            %group_id,
            removed = permissions.len(),
            "committed group permission removals"
        );

        membership.retain(|permission_id| !permissions.contains(permission_id));
        Ok(MembershipChange {
            applied: permissions.clone(),
            skipped: BTreeSet::new(),
            membership,
        })
    }
}

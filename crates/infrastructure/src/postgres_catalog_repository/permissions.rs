use async_trait::async_trait;

use turnstile_application::PermissionRepository;

use super::*;

#[async_trait]
impl PermissionRepository for PostgresCatalogRepository {
    async fn list_permissions(&self, tenant_id: TenantId) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, code, description
            FROM catalog_permissions
            WHERE tenant_id = $1
            ORDER BY code COLLATE "C"
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list permissions"))?;

        rows.into_iter().map(Permission::try_from).collect()
    }

    async fn find_permission(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<Option<Permission>> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, code, description
            FROM catalog_permissions
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(permission_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "find permission"))?
        .map(Permission::try_from)
        .transpose()
    }

    async fn create_permission(
        &self,
        tenant_id: TenantId,
        permission: Permission,
    ) -> AppResult<Permission> {
        let row = sqlx::query_as::<_, PermissionRow>(
            r#"
            INSERT INTO catalog_permissions (id, tenant_id, code, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, code, description
            "#,
        )
        .bind(permission.id().as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(permission.code())
        .bind(permission.description())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "create permission"))?;

        Permission::try_from(row)
    }

    async fn update_permission_description(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
        description: &str,
    ) -> AppResult<Permission> {
        sqlx::query_as::<_, PermissionRow>(
            r#"
            UPDATE catalog_permissions
            SET description = $3
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, code, description
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(permission_id.as_uuid())
        .bind(description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "update permission"))?
        .ok_or_else(|| missing("permission", permission_id, tenant_id))
        .and_then(Permission::try_from)
    }

    async fn delete_permission(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        // Group members, role grants and access point mappings follow through
        // foreign key actions.
        let result = sqlx::query(
            r#"
            DELETE FROM catalog_permissions
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(permission_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "delete permission"))?;

        if result.rows_affected() == 0 {
            return Err(missing("permission", permission_id, tenant_id));
        }
        Ok(())
    }
}

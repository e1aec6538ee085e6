use async_trait::async_trait;

use turnstile_application::AccessPointRepository;

use super::*;

impl PostgresCatalogRepository {
    async fn ensure_permission_exists(
        &self,
        tenant_id: TenantId,
        permission_id: PermissionId,
    ) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM catalog_permissions
                WHERE tenant_id = $1 AND id = $2
            )
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(permission_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "resolve permission"))?;

        if !exists {
            return Err(missing("permission", permission_id, tenant_id));
        }
        Ok(())
    }

    async fn set_mapping(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
        permission_id: Option<PermissionId>,
    ) -> AppResult<AccessPoint> {
        sqlx::query_as::<_, AccessPointRow>(
            r#"
            UPDATE catalog_access_points
            SET permission_id = $3
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, endpoint_path, http_method, module, is_public, permission_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(access_point_id.as_uuid())
        .bind(permission_id.map(|id| id.as_uuid()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "update access point mapping"))?
        .ok_or_else(|| missing("access point", access_point_id, tenant_id))
        .and_then(AccessPoint::try_from)
    }
}

#[async_trait]
impl AccessPointRepository for PostgresCatalogRepository {
    async fn list_access_points(&self, tenant_id: TenantId) -> AppResult<Vec<AccessPoint>> {
        let rows = sqlx::query_as::<_, AccessPointRow>(
            r#"
            SELECT id, endpoint_path, http_method, module, is_public, permission_id
            FROM catalog_access_points
            WHERE tenant_id = $1
            ORDER BY module COLLATE "C", endpoint_path COLLATE "C", http_method COLLATE "C"
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list access points"))?;

        rows.into_iter().map(AccessPoint::try_from).collect()
    }

    async fn list_unmapped_access_points(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<AccessPoint>> {
        let rows = sqlx::query_as::<_, AccessPointRow>(
            r#"
            SELECT id, endpoint_path, http_method, module, is_public, permission_id
            FROM catalog_access_points
            WHERE tenant_id = $1 AND permission_id IS NULL
            ORDER BY module COLLATE "C", endpoint_path COLLATE "C", http_method COLLATE "C"
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list unmapped access points"))?;

        rows.into_iter().map(AccessPoint::try_from).collect()
    }

    async fn find_access_point(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<Option<AccessPoint>> {
        sqlx::query_as::<_, AccessPointRow>(
            r#"
            SELECT id, endpoint_path, http_method, module, is_public, permission_id
            FROM catalog_access_points
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(access_point_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "find access point"))?
        .map(AccessPoint::try_from)
        .transpose()
    }

    async fn create_access_point(
        &self,
        tenant_id: TenantId,
        access_point: AccessPoint,
    ) -> AppResult<AccessPoint> {
        if let Some(permission_id) = access_point.permission() {
            self.ensure_permission_exists(tenant_id, permission_id)
                .await?;
        }

        let row = sqlx::query_as::<_, AccessPointRow>(
            r#"
            INSERT INTO catalog_access_points (
                id,
                tenant_id,
                endpoint_path,
                http_method,
                module,
                is_public,
                permission_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, endpoint_path, http_method, module, is_public, permission_id
            "#,
        )
        .bind(access_point.id().as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(access_point.endpoint_path())
        .bind(access_point.http_method().as_str())
        .bind(access_point.module())
        .bind(access_point.is_public())
        .bind(access_point.permission().map(|id| id.as_uuid()))
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "create access point"))?;

        AccessPoint::try_from(row)
    }

    async fn update_access_point(
        &self,
        tenant_id: TenantId,
        access_point: AccessPoint,
    ) -> AppResult<AccessPoint> {
        sqlx::query_as::<_, AccessPointRow>(
            r#"
            UPDATE catalog_access_points
            SET endpoint_path = $3, http_method = $4, module = $5, is_public = $6
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, endpoint_path, http_method, module, is_public, permission_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(access_point.id().as_uuid())
        .bind(access_point.endpoint_path())
        .bind(access_point.http_method().as_str())
        .bind(access_point.module())
        .bind(access_point.is_public())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "update access point"))?
        .ok_or_else(|| missing("access point", access_point.id(), tenant_id))
        .and_then(AccessPoint::try_from)
    }

    async fn assign_permission(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
        permission_id: PermissionId,
    ) -> AppResult<AccessPoint> {
        self.ensure_permission_exists(tenant_id, permission_id)
            .await?;
        self.set_mapping(tenant_id, access_point_id, Some(permission_id))
            .await
    }

    async fn clear_permission(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<AccessPoint> {
        self.set_mapping(tenant_id, access_point_id, None).await
    }

    async fn delete_access_point(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM catalog_access_points
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(access_point_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "delete access point"))?;

        if result.rows_affected() == 0 {
            return Err(missing("access point", access_point_id, tenant_id));
        }
        Ok(())
    }
}

use async_trait::async_trait;

use turnstile_application::AccessPointRepository;

use super::*;

fn natural_order(access_points: &mut [AccessPoint]) {
    access_points.sort_by(|left, right| {
        (left.module(), left.endpoint_path(), left.http_method().as_str()).cmp(&(
            right.module(),
            right.endpoint_path(),
            right.http_method().as_str(),
        ))
    });
}

fn ensure_endpoint_free(catalog: &TenantCatalog, access_point: &AccessPoint) -> AppResult<()> {
    let taken = catalog.access_points.values().any(|existing| {
        existing.id() != access_point.id() && existing.endpoint_key() == access_point.endpoint_key()
    });

    if taken {
        return Err(AppError::Conflict(format!(
            "access point '{} {}' already exists",
            access_point.http_method(),
            access_point.endpoint_path()
        )));
    }
    Ok(())
}

#[async_trait]
impl AccessPointRepository for InMemoryCatalogRepository {
    async fn list_access_points(&self, tenant_id: TenantId) -> AppResult<Vec<AccessPoint>> {
        Ok(self
            .read(tenant_id, |catalog| {
                let mut access_points: Vec<AccessPoint> =
                    catalog.access_points.values().cloned().collect();
                natural_order(&mut access_points);
                access_points
            })
            .await)
    }

    async fn list_unmapped_access_points(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<Vec<AccessPoint>> {
        Ok(self
            .read(tenant_id, |catalog| {
                let mut unmapped: Vec<AccessPoint> = catalog
                    .access_points
                    .values()
                    .filter(|access_point| access_point.is_unmapped())
                    .cloned()
                    .collect();
                natural_order(&mut unmapped);
                unmapped
            })
            .await)
    }

    async fn find_access_point(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<Option<AccessPoint>> {
        Ok(self
            .read(tenant_id, |catalog| {
                catalog.access_points.get(&access_point_id).cloned()
            })
            .await)
    }

    async fn create_access_point(
        &self,
        tenant_id: TenantId,
        access_point: AccessPoint,
    ) -> AppResult<AccessPoint> {
        self.write(tenant_id, |catalog| {
            ensure_endpoint_free(catalog, &access_point)?;
            if let Some(permission_id) = access_point.permission() {
                catalog.permission(permission_id)?;
            }

            catalog
                .access_points
                .insert(access_point.id(), access_point.clone());
            Ok(access_point)
        })
        .await
    }

    async fn update_access_point(
        &self,
        tenant_id: TenantId,
        access_point: AccessPoint,
    ) -> AppResult<AccessPoint> {
        self.write(tenant_id, |catalog| {
            ensure_endpoint_free(catalog, &access_point)?;
            let stored = catalog.access_point_mut(access_point.id())?;
            *stored = access_point.with_permission(stored.permission());
            Ok(stored.clone())
        })
        .await
    }

    async fn assign_permission(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
        permission_id: PermissionId,
    ) -> AppResult<AccessPoint> {
        self.write(tenant_id, |catalog| {
            catalog.permission(permission_id)?;
            let access_point = catalog.access_point_mut(access_point_id)?;
            access_point.assign_permission(permission_id);
            Ok(access_point.clone())
        })
        .await
    }

    async fn clear_permission(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<AccessPoint> {
        self.write(tenant_id, |catalog| {
            let access_point = catalog.access_point_mut(access_point_id)?;
            access_point.clear_permission();
            Ok(access_point.clone())
        })
        .await
    }

    async fn delete_access_point(
        &self,
        tenant_id: TenantId,
        access_point_id: AccessPointId,
    ) -> AppResult<()> {
        self.write(tenant_id, |catalog| {
            catalog
                .access_points
                .remove(&access_point_id)
                .map(|_| ())
                .ok_or_else(|| missing("access point", access_point_id))
        })
        .await
    }
}

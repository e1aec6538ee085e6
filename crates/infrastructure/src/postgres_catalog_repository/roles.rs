use async_trait::async_trait;
use chrono::{DateTime, Utc};

use turnstile_application::{RoleRepository, UserRoleAssignment};

use super::*;

async fn ensure_grants_exist(
    transaction: &mut Transaction<'_, Postgres>,
    tenant_id: TenantId,
    grants: &BTreeSet<RoleGrant>,
) -> AppResult<()> {
    for grant in grants {
        let (kind, id, sql) = match grant {
            RoleGrant::Permission(permission_id) => (
                "permission",
                permission_id.as_uuid(),
                "SELECT EXISTS (SELECT 1 FROM catalog_permissions WHERE tenant_id = $1 AND id = $2)",
            ),
            RoleGrant::Group(group_id) => (
                "permission group",
                group_id.as_uuid(),
                "SELECT EXISTS (SELECT 1 FROM catalog_permission_groups WHERE tenant_id = $1 AND id = $2)",
            ),
        };

        let exists = sqlx::query_scalar::<_, bool>(sql)
            .bind(tenant_id.as_uuid())
            .bind(id)
            .fetch_one(&mut **transaction)
            .await
            .map_err(|error| map_sqlx_error(error, "resolve role grant"))?;

        if !exists {
            return Err(missing(kind, id, tenant_id));
        }
    }
    Ok(())
}

async fn write_grants(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: RoleId,
    grants: &BTreeSet<RoleGrant>,
) -> AppResult<()> {
    sqlx::query("DELETE FROM catalog_role_grants WHERE role_id = $1")
        .bind(role_id.as_uuid())
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "clear role grants"))?;

    for grant in grants {
        let (permission_id, group_id) = match grant {
            RoleGrant::Permission(permission_id) => (Some(permission_id.as_uuid()), None),
            RoleGrant::Group(group_id) => (None, Some(group_id.as_uuid())),
        };

        sqlx::query(
            r#"
            INSERT INTO catalog_role_grants (role_id, permission_id, group_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(role_id.as_uuid())
        .bind(permission_id)
        .bind(group_id)
        .execute(&mut **transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "grant role"))?;
    }
    Ok(())
}

impl PostgresCatalogRepository {
    async fn grants_for(
        &self,
        tenant_id: TenantId,
    ) -> AppResult<HashMap<Uuid, BTreeSet<RoleGrant>>> {
        let rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT grants.role_id, grants.permission_id, grants.group_id
            FROM catalog_role_grants AS grants
            INNER JOIN catalog_roles AS roles
                ON roles.id = grants.role_id
            WHERE roles.tenant_id = $1
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list role grants"))?;

        Ok(role_grants(rows))
    }
}

#[async_trait]
impl RoleRepository for PostgresCatalogRepository {
    async fn list_roles(&self, tenant_id: TenantId) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM catalog_roles
            WHERE tenant_id = $1
            ORDER BY name COLLATE "C"
            "#,
        )
        .bind(tenant_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list roles"))?;

        let mut grants = self.grants_for(tenant_id).await?;
        rows.into_iter()
            .map(|row| {
                let role_grants = grants.remove(&row.id).unwrap_or_default();
                build_role(row, role_grants)
            })
            .collect()
    }

    async fn find_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<Option<Role>> {
        let Some(row) = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM catalog_roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "find role"))?
        else {
            return Ok(None);
        };

        let grant_rows = sqlx::query_as::<_, RoleGrantRow>(
            r#"
            SELECT role_id, permission_id, group_id
            FROM catalog_role_grants
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list role grants"))?;

        let grants = role_grants(grant_rows).remove(&row.id).unwrap_or_default();
        build_role(row, grants).map(Some)
    }

    async fn create_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role> {
        let mut transaction = self.begin().await?;
        ensure_grants_exist(&mut transaction, tenant_id, role.grants()).await?;

        sqlx::query(
            r#"
            INSERT INTO catalog_roles (id, tenant_id, name)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(role.id().as_uuid())
        .bind(tenant_id.as_uuid())
        .bind(role.name())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "create role"))?;

        write_grants(&mut transaction, role.id(), role.grants()).await?;
        commit(transaction).await?;

        Ok(role)
    }

    async fn update_role(&self, tenant_id: TenantId, role: Role) -> AppResult<Role> {
        let mut transaction = self.begin().await?;
        ensure_grants_exist(&mut transaction, tenant_id, role.grants()).await?;

        let result = sqlx::query(
            r#"
            UPDATE catalog_roles
            SET name = $3
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role.id().as_uuid())
        .bind(role.name())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "update role"))?;

        if result.rows_affected() == 0 {
            return Err(missing("role", role.id(), tenant_id));
        }

        write_grants(&mut transaction, role.id(), role.grants()).await?;
        commit(transaction).await?;

        Ok(role)
    }

    async fn delete_role(&self, tenant_id: TenantId, role_id: RoleId) -> AppResult<()> {
        // User assignments are removed by the foreign key cascade.
        let result = sqlx::query(
            r#"
            DELETE FROM catalog_roles
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(role_id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "delete role"))?;

        if result.rows_affected() == 0 {
            return Err(missing("role", role_id, tenant_id));
        }
        Ok(())
    }

    async fn user_roles(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<UserRoleAssignment> {
        let role_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT role_id
            FROM catalog_user_roles
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "list user roles"))?;

        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            SELECT updated_at
            FROM catalog_user_role_sets
            WHERE tenant_id = $1 AND user_id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| map_sqlx_error(error, "resolve user role set"))?;

        Ok(UserRoleAssignment {
            user_id: user_id.to_owned(),
            role_ids: role_ids.into_iter().map(RoleId::from_uuid).collect(),
            updated_at,
        })
    }

    async fn replace_user_roles(
        &self,
        tenant_id: TenantId,
        user_id: &str,
        role_ids: &BTreeSet<RoleId>,
    ) -> AppResult<UserRoleAssignment> {
        let requested: Vec<Uuid> = role_ids.iter().map(RoleId::as_uuid).collect();
        let mut transaction = self.begin().await?;

        let known: BTreeSet<RoleId> = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM catalog_roles
            WHERE tenant_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(&requested)
        .fetch_all(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "resolve roles"))?
        .into_iter()
        .map(RoleId::from_uuid)
        .collect();

        let unknown: Vec<&RoleId> = role_ids.difference(&known).collect();
        if !unknown.is_empty() {
            return Err(AppError::NotFound(format!(
                "unknown roles for tenant '{tenant_id}': {}",
                join_ids(unknown)
            )));
        }

        // The set row is written first so concurrent replacements for the
        // same user serialize on it.
        let updated_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO catalog_user_role_sets (tenant_id, user_id, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (tenant_id, user_id)
            DO UPDATE SET updated_at = EXCLUDED.updated_at
            RETURNING updated_at
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "replace user roles"))?;

        sqlx::query(
            r#"
            DELETE FROM catalog_user_roles
            WHERE tenant_id = $1 AND user_id = $2 AND NOT (role_id = ANY($3))
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id)
        .bind(&requested)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "revoke user roles"))?;

        sqlx::query(
            r#"
            INSERT INTO catalog_user_roles (tenant_id, user_id, role_id)
            SELECT $1, $2, role_id
            FROM UNNEST($3::uuid[]) AS role_id
            ON CONFLICT (tenant_id, user_id, role_id) DO NOTHING
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(user_id)
        .bind(&requested)
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_sqlx_error(error, "assign user roles"))?;

        commit(transaction).await?;

        Ok(UserRoleAssignment {
            user_id: user_id.to_owned(),
            role_ids: role_ids.clone(),
            updated_at: Some(updated_at),
        })
    }
}

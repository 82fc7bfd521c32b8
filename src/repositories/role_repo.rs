//! Roles, user-role assignments and role permissions.

use std::collections::BTreeSet;

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewRole, Role, RolePermission, UserRole};

#[derive(Clone)]
pub struct RoleRepository {
    pool: AsyncDbPool,
}

impl RoleRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    /// Every role with the number of users holding it, ordered by name.
    pub async fn list_with_user_counts(&self) -> AppResult<Vec<(Role, i64)>> {
        use crate::schema::{roles, user_roles};
        let mut conn = self.pool.get().await?;

        let all_roles = roles::table
            .order(roles::name.asc())
            .select(Role::as_select())
            .load(&mut conn)
            .await?;

        let counts: Vec<(Uuid, i64)> = user_roles::table
            .group_by(user_roles::role_id)
            .select((user_roles::role_id, diesel::dsl::count_star()))
            .load(&mut conn)
            .await?;

        Ok(all_roles
            .into_iter()
            .map(|role| {
                let count = counts
                    .iter()
                    .find(|(role_id, _)| *role_id == role.id)
                    .map_or(0, |(_, count)| *count);
                (role, count)
            })
            .collect())
    }

    pub async fn list(&self) -> AppResult<Vec<Role>> {
        use crate::schema::roles::dsl::*;
        let mut conn = self.pool.get().await?;

        roles
            .order(name.asc())
            .select(Role::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_by_id(&self, role_id: Uuid) -> AppResult<Option<Role>> {
        use crate::schema::roles::dsl::*;
        let mut conn = self.pool.get().await?;

        roles
            .filter(id.eq(role_id))
            .select(Role::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn find_by_name(&self, role_name: &str) -> AppResult<Option<Role>> {
        use crate::schema::roles::dsl::*;
        let mut conn = self.pool.get().await?;

        roles
            .filter(normalized_name.eq(role_name.trim().to_uppercase()))
            .select(Role::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn create(&self, new_role: NewRole) -> AppResult<Role> {
        use crate::schema::roles::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(roles)
            .values(&new_role)
            .returning(Role::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn delete(&self, role_id: Uuid) -> AppResult<usize> {
        use crate::schema::roles::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(roles.filter(id.eq(role_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn roles_for_user(&self, owner: Uuid) -> AppResult<Vec<Role>> {
        use crate::schema::{roles, user_roles};
        let mut conn = self.pool.get().await?;

        user_roles::table
            .inner_join(roles::table)
            .filter(user_roles::user_id.eq(owner))
            .order(roles::name.asc())
            .select(Role::as_select())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Role names for a batch of users, as `(user_id, role_name)` pairs.
    pub async fn role_names_for_users(&self, owners: &[Uuid]) -> AppResult<Vec<(Uuid, String)>> {
        use crate::schema::{roles, user_roles};
        let mut conn = self.pool.get().await?;

        user_roles::table
            .inner_join(roles::table)
            .filter(user_roles::user_id.eq_any(owners))
            .order(roles::name.asc())
            .select((user_roles::user_id, roles::name))
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Replaces the user's role set in one transaction.
    pub async fn set_user_roles(&self, owner: Uuid, role_ids: Vec<Uuid>) -> AppResult<()> {
        use crate::schema::user_roles::dsl::*;
        let mut conn = self.pool.get().await?;

        let rows: Vec<UserRole> = role_ids
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|role| UserRole {
                user_id: owner,
                role_id: role,
            })
            .collect();

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                diesel::delete(user_roles.filter(user_id.eq(owner)))
                    .execute(conn)
                    .await?;
                if !rows.is_empty() {
                    diesel::insert_into(user_roles)
                        .values(&rows)
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn permissions_for_role(&self, role: Uuid) -> AppResult<Vec<String>> {
        use crate::schema::role_permissions::dsl::*;
        let mut conn = self.pool.get().await?;

        role_permissions
            .filter(role_id.eq(role))
            .order(permission.asc())
            .select(permission)
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Union of the permissions granted by all of the user's roles.
    pub async fn permissions_for_user(&self, owner: Uuid) -> AppResult<Vec<String>> {
        use crate::schema::{role_permissions, user_roles};
        let mut conn = self.pool.get().await?;

        role_permissions::table
            .inner_join(
                user_roles::table.on(user_roles::role_id.eq(role_permissions::role_id)),
            )
            .filter(user_roles::user_id.eq(owner))
            .select(role_permissions::permission)
            .distinct()
            .order(role_permissions::permission.asc())
            .load(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Drops every permission of the role and writes the given set.
    pub async fn replace_permissions(&self, role: Uuid, permissions: Vec<String>) -> AppResult<()> {
        use crate::schema::role_permissions::dsl::*;
        let mut conn = self.pool.get().await?;

        let rows: Vec<RolePermission> = permissions
            .into_iter()
            .map(|p| RolePermission {
                role_id: role,
                permission: p,
            })
            .collect();

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                diesel::delete(role_permissions.filter(role_id.eq(role)))
                    .execute(conn)
                    .await?;
                if !rows.is_empty() {
                    diesel::insert_into(role_permissions)
                        .values(&rows)
                        .on_conflict_do_nothing()
                        .execute(conn)
                        .await?;
                }
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    /// Grants permissions without touching existing ones.
    pub async fn add_permissions(&self, role: Uuid, permissions: &[String]) -> AppResult<()> {
        use crate::schema::role_permissions::dsl::*;
        let mut conn = self.pool.get().await?;

        let rows: Vec<RolePermission> = permissions
            .iter()
            .map(|p| RolePermission {
                role_id: role,
                permission: p.clone(),
            })
            .collect();

        diesel::insert_into(role_permissions)
            .values(&rows)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}

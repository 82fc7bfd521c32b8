//! Role administration and the permission matrix.

use std::collections::BTreeSet;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{BuiltInRole, NewRole, Permission, Role, User};
use crate::repositories::{RoleRepository, UserRepository};

/// A user with every role and whether they hold it.
#[derive(Debug, Clone)]
pub struct UserRoleAssignments {
    pub user: User,
    pub roles: Vec<(Role, bool)>,
}

#[derive(Clone)]
pub struct RoleService {
    roles: RoleRepository,
    users: UserRepository,
}

impl RoleService {
    pub fn new(roles: RoleRepository, users: UserRepository) -> Self {
        Self { roles, users }
    }

    pub async fn list_roles(&self) -> AppResult<Vec<(Role, i64)>> {
        self.roles.list_with_user_counts().await
    }

    pub async fn get_role(&self, role_id: Uuid) -> AppResult<Role> {
        self.roles
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::not_found("Role", "ID", role_id))
    }

    pub async fn create_role(&self, name: &str) -> AppResult<Role> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                reason: "Role name is required".to_string(),
            });
        }
        if self.roles.find_by_name(name).await?.is_some() {
            return Err(AppError::Duplicate {
                entity: "Role".to_string(),
                field: "name".to_string(),
                value: name.to_string(),
            });
        }

        let role = self.roles.create(NewRole::new(name)).await?;
        tracing::info!(role_id = %role.id, role = %role.name, "Role created");
        Ok(role)
    }

    pub async fn delete_role(&self, role_id: Uuid) -> AppResult<()> {
        let role = self.get_role(role_id).await?;
        if BuiltInRole::from_name(&role.name).is_some() {
            return Err(AppError::bad_request(format!(
                "Built-in role '{}' cannot be deleted",
                role.name
            )));
        }
        self.roles.delete(role.id).await?;
        tracing::info!(role_id = %role.id, role = %role.name, "Role deleted");
        Ok(())
    }

    pub async fn user_roles(&self, user_id: Uuid) -> AppResult<UserRoleAssignments> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", "ID", user_id))?;

        let held: BTreeSet<Uuid> = self
            .roles
            .roles_for_user(user.id)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();
        let roles = self
            .roles
            .list()
            .await?
            .into_iter()
            .map(|role| {
                let selected = held.contains(&role.id);
                (role, selected)
            })
            .collect();

        Ok(UserRoleAssignments { user, roles })
    }

    /// Replaces the user's roles with `selected`.
    pub async fn update_user_roles(&self, user_id: Uuid, selected: Vec<Uuid>) -> AppResult<()> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", "ID", user_id))?;

        let known: BTreeSet<Uuid> = self.roles.list().await?.into_iter().map(|r| r.id).collect();
        if let Some(unknown) = selected.iter().find(|id| !known.contains(id)) {
            return Err(AppError::not_found("Role", "ID", unknown));
        }

        self.roles.set_user_roles(user.id, selected).await?;
        tracing::info!(user_id = %user.id, "User roles updated");
        Ok(())
    }

    /// Every known permission and whether the role grants it.
    pub async fn role_permissions(&self, role_id: Uuid) -> AppResult<(Role, Vec<(Permission, bool)>)> {
        let role = self.get_role(role_id).await?;
        let granted = parse_permissions(&self.roles.permissions_for_role(role.id).await?);

        let matrix = Permission::all()
            .into_iter()
            .map(|permission| {
                let selected = granted.contains(&permission);
                (permission, selected)
            })
            .collect();
        Ok((role, matrix))
    }

    /// Removes all of the role's permissions, then grants `selected`.
    pub async fn update_role_permissions(&self, role_id: Uuid, selected: &[String]) -> AppResult<()> {
        let role = self.get_role(role_id).await?;
        let permissions = normalize_permissions(selected)?;

        self.roles
            .replace_permissions(role.id, permissions.iter().map(Permission::name).collect())
            .await?;
        tracing::info!(role_id = %role.id, count = permissions.len(), "Role permissions updated");
        Ok(())
    }
}

/// Parses and deduplicates permission names, ignoring case.
pub(crate) fn normalize_permissions(names: &[String]) -> AppResult<BTreeSet<Permission>> {
    names
        .iter()
        .map(|name| {
            name.parse::<Permission>()
                .map_err(|reason| AppError::Validation {
                    field: "permissions".to_string(),
                    reason,
                })
        })
        .collect()
}

/// Stored permission names; rows that no longer parse are skipped.
fn parse_permissions(names: &[String]) -> BTreeSet<Permission> {
    names.iter().filter_map(|n| n.parse().ok()).collect()
}

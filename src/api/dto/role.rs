//! Role and permission administration DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Permission, Role};
use crate::services::UserRoleAssignments;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleDto {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_count: Option<i64>,
}

impl RoleDto {
    pub fn with_count(role: Role, user_count: i64) -> Self {
        Self {
            user_count: Some(user_count),
            ..Self::from(role)
        }
    }
}

impl From<Role> for RoleDto {
    fn from(role: Role) -> Self {
        Self {
            id: role.id,
            name: role.name,
            user_count: None,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 64, message = "Role name must be 1-64 characters"))]
    #[schema(example = "Support")]
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleSelection {
    pub role_id: Uuid,
    #[serde(default)]
    pub role_name: String,
    pub is_selected: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserRolesDto {
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub roles: Vec<UserRoleSelection>,
}

impl From<UserRoleAssignments> for UserRolesDto {
    fn from(assignments: UserRoleAssignments) -> Self {
        Self {
            user_id: assignments.user.id,
            user_name: assignments.user.user_name,
            email: assignments.user.email,
            roles: assignments
                .roles
                .into_iter()
                .map(|(role, is_selected)| UserRoleSelection {
                    role_id: role.id,
                    role_name: role.name,
                    is_selected,
                })
                .collect(),
        }
    }
}

/// Replaces a user's roles with the selected entries.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRolesRequest {
    pub user_id: Uuid,
    pub roles: Vec<UserRoleSelection>,
}

impl UpdateUserRolesRequest {
    pub fn selected_role_ids(&self) -> Vec<Uuid> {
        self.roles
            .iter()
            .filter(|r| r.is_selected)
            .map(|r| r.role_id)
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSelection {
    #[schema(example = "Permissions.Products.View")]
    pub permission_name: String,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub action: String,
    pub is_selected: bool,
}

impl PermissionSelection {
    pub fn new(permission: Permission, is_selected: bool) -> Self {
        Self {
            permission_name: permission.name(),
            module: permission.module.as_str().to_string(),
            action: permission.action.as_str().to_string(),
            is_selected,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RolePermissionsDto {
    pub role_id: Uuid,
    pub role_name: String,
    pub permissions: Vec<PermissionSelection>,
}

impl RolePermissionsDto {
    pub fn new(role: Role, permissions: Vec<(Permission, bool)>) -> Self {
        Self {
            role_id: role.id,
            role_name: role.name,
            permissions: permissions
                .into_iter()
                .map(|(p, selected)| PermissionSelection::new(p, selected))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePermissionsRequest {
    pub permissions: Vec<PermissionSelection>,
}

impl UpdatePermissionsRequest {
    pub fn selected_names(&self) -> Vec<String> {
        self.permissions
            .iter()
            .filter(|p| p.is_selected)
            .map(|p| p.permission_name.clone())
            .collect()
    }
}

use std::fmt;
use std::str::FromStr;

use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub normalized_name: String,
    pub created_at: jiff_diesel::Timestamp,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::roles)]
pub struct NewRole {
    pub name: String,
    pub normalized_name: String,
}

impl NewRole {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            normalized_name: name.trim().to_uppercase(),
        }
    }
}

#[derive(Debug, Queryable, Selectable, Insertable, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::user_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRole {
    pub user_id: Uuid,
    pub role_id: Uuid,
}

#[derive(Debug, Queryable, Selectable, Insertable, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::role_permissions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RolePermission {
    pub role_id: Uuid,
    pub permission: String,
}

/// Roles created by the seeder. They cannot be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInRole {
    SuperAdmin,
    Admin,
    Customer,
}

impl BuiltInRole {
    pub const ALL: [BuiltInRole; 3] = [Self::SuperAdmin, Self::Admin, Self::Customer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "SuperAdmin",
            Self::Admin => "Admin",
            Self::Customer => "Customer",
        }
    }

    /// Case-insensitive lookup by role name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(name.trim()))
    }

    /// Permissions granted when the role is first seeded.
    pub fn default_permissions(&self) -> Vec<Permission> {
        match self {
            Self::SuperAdmin => Permission::all(),
            Self::Admin => Permission::all()
                .into_iter()
                .filter(|p| p.module != PermissionModule::Roles)
                .collect(),
            Self::Customer => vec![
                Permission::new(PermissionModule::Products, PermissionAction::View),
                Permission::new(PermissionModule::Brands, PermissionAction::View),
                Permission::new(PermissionModule::Types, PermissionAction::View),
            ],
        }
    }
}

impl fmt::Display for BuiltInRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PermissionModule {
    Products,
    Brands,
    Types,
    Orders,
    Users,
    Roles,
}

impl PermissionModule {
    pub const ALL: [PermissionModule; 6] = [
        Self::Products,
        Self::Brands,
        Self::Types,
        Self::Orders,
        Self::Users,
        Self::Roles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Products => "Products",
            Self::Brands => "Brands",
            Self::Types => "Types",
            Self::Orders => "Orders",
            Self::Users => "Users",
            Self::Roles => "Roles",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PermissionAction {
    View,
    Create,
    Update,
    Delete,
}

impl PermissionAction {
    pub const ALL: [PermissionAction; 4] = [Self::View, Self::Create, Self::Update, Self::Delete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "View",
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// A `Permissions.{Module}.{Action}` grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    pub module: PermissionModule,
    pub action: PermissionAction,
}

impl Permission {
    pub const PREFIX: &'static str = "Permissions";

    pub const fn new(module: PermissionModule, action: PermissionAction) -> Self {
        Self { module, action }
    }

    /// Every module/action combination, module-major.
    pub fn all() -> Vec<Permission> {
        PermissionModule::ALL
            .into_iter()
            .flat_map(|module| {
                PermissionAction::ALL
                    .into_iter()
                    .map(move |action| Permission::new(module, action))
            })
            .collect()
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            Self::PREFIX,
            self.module.as_str(),
            self.action.as_str()
        )
    }
}

impl FromStr for Permission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let (Some(prefix), Some(module), Some(action), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("Invalid permission: {s}"));
        };
        if !prefix.eq_ignore_ascii_case(Self::PREFIX) {
            return Err(format!("Invalid permission: {s}"));
        }

        let module = PermissionModule::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(module))
            .ok_or_else(|| format!("Unknown permission module: {module}"))?;
        let action = PermissionAction::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(action))
            .ok_or_else(|| format!("Unknown permission action: {action}"))?;

        Ok(Permission::new(module, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_all_permissions() {
        let all = Permission::all();
        assert_eq!(all.len(), 24);
        assert_eq!(all[0].to_string(), "Permissions.Products.View");
        assert_eq!(all[23].to_string(), "Permissions.Roles.Delete");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let permission: Permission = "permissions.orders.UPDATE".parse().unwrap();
        assert_eq!(
            permission,
            Permission::new(PermissionModule::Orders, PermissionAction::Update)
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("Permissions.Products".parse::<Permission>().is_err());
        assert!("Permissions.Products.View.Extra".parse::<Permission>().is_err());
        assert!("Claims.Products.View".parse::<Permission>().is_err());
        assert!("Permissions.Widgets.View".parse::<Permission>().is_err());
        assert!("Permissions.Products.Approve".parse::<Permission>().is_err());
    }

    #[test]
    fn test_built_in_role_lookup() {
        assert_eq!(BuiltInRole::from_name("superadmin"), Some(BuiltInRole::SuperAdmin));
        assert_eq!(BuiltInRole::from_name(" Customer "), Some(BuiltInRole::Customer));
        assert_eq!(BuiltInRole::from_name("Manager"), None);
    }

    #[test]
    fn test_default_permissions() {
        assert_eq!(BuiltInRole::SuperAdmin.default_permissions().len(), 24);
        let admin = BuiltInRole::Admin.default_permissions();
        assert_eq!(admin.len(), 20);
        assert!(admin.iter().all(|p| p.module != PermissionModule::Roles));
        let customer = BuiltInRole::Customer.default_permissions();
        assert!(customer.iter().all(|p| p.action == PermissionAction::View));
    }

    #[test]
    fn test_new_role_normalizes() {
        let role = NewRole::new("  Support ");
        assert_eq!(role.name, "Support");
        assert_eq!(role.normalized_name, "SUPPORT");
    }

    proptest! {
        #[test]
        fn test_display_parse_round_trip(index in 0usize..24) {
            let permission = Permission::all()[index];
            let parsed: Permission = permission.to_string().to_lowercase().parse().unwrap();
            prop_assert_eq!(parsed, permission);
        }
    }
}

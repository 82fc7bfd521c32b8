//! Reference data every deployment needs: built-in roles with their default
//! permissions, catalog lookups, delivery methods, and optionally a super
//! admin account. Each step only fills what is missing, so reruns are safe.

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::config::SeedConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    BuiltInRole, NewDeliveryMethod, NewProductBrand, NewProductType, NewRole, NewUser, Permission,
};
use crate::repositories::Repositories;
use crate::utils::password::hash_password;

const BRANDS: [&str; 4] = ["Apple", "Samsung", "Nike", "Adidas"];
const PRODUCT_TYPES: [&str; 4] = ["Electronics", "Clothing", "Books", "Home & Garden"];

/// (short name, delivery time, description, price)
const DELIVERY_METHODS: [(&str, &str, &str, &str); 4] = [
    ("UPS1", "1-2 Days", "Fastest delivery time", "10"),
    ("UPS2", "2-5 Days", "Get it within 5 days", "5"),
    ("UPS3", "5-10 Days", "Slower but cheap", "2"),
    ("Standard", "3-5 days", crate::services::order_service::FALLBACK_DELIVERY_DESCRIPTION, "0"),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub roles: usize,
    pub permissions: usize,
    pub brands: usize,
    pub product_types: usize,
    pub delivery_methods: usize,
    pub admin_created: bool,
}

pub async fn seed_reference_data(repos: &Repositories, config: &SeedConfig) -> AppResult<SeedReport> {
    let mut report = SeedReport::default();

    for built_in in BuiltInRole::ALL {
        let role = match repos.roles.find_by_name(built_in.as_str()).await? {
            Some(role) => role,
            None => {
                report.roles += 1;
                repos.roles.create(NewRole::new(built_in.as_str())).await?
            }
        };

        let granted = repos.roles.permissions_for_role(role.id).await?;
        if granted.is_empty() {
            let defaults: Vec<String> = built_in
                .default_permissions()
                .iter()
                .map(Permission::name)
                .collect();
            report.permissions += defaults.len();
            repos.roles.add_permissions(role.id, &defaults).await?;
        }
    }

    if repos.brands.list().await?.is_empty() {
        for name in BRANDS {
            repos
                .brands
                .create(NewProductBrand {
                    name: name.to_string(),
                })
                .await?;
            report.brands += 1;
        }
    }

    if repos.product_types.list().await?.is_empty() {
        for name in PRODUCT_TYPES {
            repos
                .product_types
                .create(NewProductType {
                    name: name.to_string(),
                })
                .await?;
            report.product_types += 1;
        }
    }

    if repos.orders.delivery_methods().await?.is_empty() {
        for (short_name, delivery_time, description, price) in DELIVERY_METHODS {
            let price = BigDecimal::from_str(price).map_err(|e| AppError::Internal {
                source: anyhow::Error::from(e),
            })?;
            repos
                .orders
                .create_delivery_method(NewDeliveryMethod {
                    short_name: short_name.to_string(),
                    delivery_time: delivery_time.to_string(),
                    description: description.to_string(),
                    price,
                })
                .await?;
            report.delivery_methods += 1;
        }
    }

    report.admin_created = seed_super_admin(repos, config).await?;

    tracing::info!(
        roles = report.roles,
        permissions = report.permissions,
        brands = report.brands,
        product_types = report.product_types,
        delivery_methods = report.delivery_methods,
        admin_created = report.admin_created,
        "Reference data seeded"
    );
    Ok(report)
}

async fn seed_super_admin(repos: &Repositories, config: &SeedConfig) -> AppResult<bool> {
    let (Some(email), Some(user_name), Some(password)) = (
        config.admin_email.as_deref(),
        config.admin_username.as_deref(),
        config.admin_password.as_deref(),
    ) else {
        return Ok(false);
    };

    let email = email.trim().to_lowercase();
    if repos.users.email_exists(&email).await? {
        return Ok(false);
    }

    let role = repos
        .roles
        .find_by_name(BuiltInRole::SuperAdmin.as_str())
        .await?
        .ok_or_else(|| AppError::internal("SuperAdmin role is missing"))?;

    let user = repos
        .users
        .create_with_role(
            NewUser {
                email,
                user_name: user_name.trim().to_string(),
                normalized_user_name: user_name.trim().to_uppercase(),
                password_hash: Some(hash_password(password)?),
                first_name: None,
                last_name: None,
                phone_number: None,
                gender: None,
            },
            role.id,
        )
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Super admin created");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_prices_parse() {
        for (_, _, _, price) in DELIVERY_METHODS {
            assert!(BigDecimal::from_str(price).is_ok());
        }
    }

    #[test]
    fn test_fallback_method_is_seeded() {
        assert!(DELIVERY_METHODS.iter().any(|(name, time, _, price)| {
            *name == "Standard" && *time == "3-5 days" && *price == "0"
        }));
    }
}

//! Bearer token authentication.
//!
//! `auth_middleware` runs on every request. A valid access token puts an
//! [`AuthUser`] into the request extensions; handlers that need a caller take
//! `AuthUser` as an extractor and get a 401 when it is absent.

use std::collections::BTreeSet;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};
use crate::models::{BuiltInRole, Permission};
use crate::services::Caller;
use crate::state::AppState;
use crate::utils::jwt::{Claims, validate_access_token};

/// Authenticated caller, built from access token claims.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub username: String,
    pub roles: Vec<String>,
    pub permissions: BTreeSet<Permission>,
}

impl TryFrom<Claims> for AuthUser {
    type Error = AppError;

    fn try_from(claims: Claims) -> AppResult<Self> {
        let user_id = claims.user_id()?;
        Ok(Self {
            user_id,
            email: claims.email,
            username: claims.username,
            roles: claims.roles,
            permissions: claims
                .permissions
                .iter()
                .filter_map(|p| p.parse().ok())
                .collect(),
        })
    }
}

impl AuthUser {
    pub fn is_super_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(BuiltInRole::SuperAdmin.as_str()))
    }

    /// SuperAdmin implicitly holds every permission.
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.is_super_admin() || self.permissions.contains(&permission)
    }

    pub fn require(&self, permission: Permission) -> AppResult<()> {
        if self.has_permission(permission) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, %permission, "Permission denied");
            Err(AppError::forbidden(format!(
                "You do not have permission to perform this action ({permission})"
            )))
        }
    }

    pub fn caller(&self) -> Caller {
        Caller {
            user_id: self.user_id,
            email: self.email.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Why a request carries no [`AuthUser`]; reported when a handler needs one.
#[derive(Debug, Clone)]
struct AuthRejection(String);

/// Reads the bearer token, if any. A malformed header or a bad token is an
/// error; no header at all is `Ok(None)`.
pub fn authenticate(headers: &HeaderMap, config: &JwtConfig) -> AppResult<Option<AuthUser>> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let token = value
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::unauthorized("Invalid authorization header format. Expected: Bearer <token>")
        })?;

    let claims = validate_access_token(token, config)?;
    AuthUser::try_from(claims).map(Some)
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    match authenticate(request.headers(), &state.jwt_config) {
        Ok(Some(user)) => {
            request.extensions_mut().insert(user);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::debug!(error = %e, "Rejected access token");
            request.extensions_mut().insert(AuthRejection(e.to_string()));
        }
    }

    next.run(request).await
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> AppResult<Self> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }
        let message = parts
            .extensions
            .get::<AuthRejection>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "Missing authorization header".to_string());
        Err(AppError::unauthorized(message))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> AppResult<Option<Self>> {
        Ok(parts.extensions.get::<AuthUser>().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PermissionAction, PermissionModule};
    use crate::utils::jwt::generate_access_token;
    use axum::http::{HeaderValue, Request as HttpRequest};

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_at_least_32_characters_long".to_string(),
            ..JwtConfig::default()
        }
    }

    fn user(roles: &[&str], permissions: &[Permission]) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "ann@test.com".into(),
            username: "ann".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            permissions: permissions.iter().copied().collect(),
        }
    }

    const VIEW_ORDERS: Permission = Permission::new(PermissionModule::Orders, PermissionAction::View);
    const DELETE_ROLES: Permission = Permission::new(PermissionModule::Roles, PermissionAction::Delete);

    #[test]
    fn test_authenticate_without_header() {
        assert!(authenticate(&HeaderMap::new(), &config()).unwrap().is_none());
    }

    #[test]
    fn test_authenticate_reads_claims() {
        let config = config();
        let id = Uuid::new_v4();
        let claims = Claims::new(
            id,
            "ann@test.com",
            "ann",
            vec!["Admin".into()],
            vec!["Permissions.Orders.View".into(), "garbage".into()],
            &config,
        );
        let token = generate_access_token(&claims, &config).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );

        let user = authenticate(&headers, &config).unwrap().unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.roles, vec!["Admin"]);
        assert_eq!(user.permissions.len(), 1);
        assert!(user.has_permission(VIEW_ORDERS));
    }

    #[test]
    fn test_authenticate_rejects_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(matches!(
            authenticate(&headers, &config()),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_require_permission() {
        let customer = user(&["Customer"], &[VIEW_ORDERS]);
        assert!(customer.require(VIEW_ORDERS).is_ok());
        assert!(matches!(
            customer.require(DELETE_ROLES),
            Err(AppError::Forbidden { .. })
        ));
    }

    #[test]
    fn test_super_admin_holds_every_permission() {
        let root = user(&["superadmin"], &[]);
        assert!(root.require(DELETE_ROLES).is_ok());
        assert!(root.caller().is_super_admin());
    }

    #[tokio::test]
    async fn test_extractor_reports_token_problem() {
        let request = HttpRequest::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        parts
            .extensions
            .insert(AuthRejection("Token has expired".into()));

        match <AuthUser as FromRequestParts<()>>::from_request_parts(&mut parts, &()).await {
            Err(AppError::Unauthorized { message }) => assert_eq!(message, "Token has expired"),
            other => panic!("Expected Unauthorized, got {other:?}"),
        }
        let optional =
            <AuthUser as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &()).await;
        assert!(optional.unwrap().is_none());
    }
}

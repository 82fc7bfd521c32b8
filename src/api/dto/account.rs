//! Account DTOs: registration, login, tokens and password reset.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::services::{AuthSession, Registration};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(length(min = 1, max = 256, message = "Username is required"))]
    #[schema(example = "jane")]
    pub user_name: String,
    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub password: String,
    #[validate(length(max = 100))]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 32))]
    pub phone_number: Option<String>,
    #[validate(length(max = 16))]
    pub gender: Option<String>,
    /// SuperAdmin, Admin or Customer (default)
    pub role_name: Option<String>,
}

impl From<RegisterRequest> for Registration {
    fn from(request: RegisterRequest) -> Self {
        Registration {
            email: request.email,
            user_name: request.user_name,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            phone_number: request.phone_number,
            gender: request.gender,
            role_name: request.role_name,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Body fallback for clients that cannot send the refresh cookie.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
    #[validate(length(min = 3, message = "Password must be at least 3 characters"))]
    pub new_password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    /// Access token; absent when no session was issued
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub refresh_token_expiration: Option<Timestamp>,
}

impl UserDto {
    pub fn from_user(user: crate::models::User, roles: Vec<String>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            user_name: user.user_name,
            first_name: user.first_name,
            last_name: user.last_name,
            roles,
            token: None,
            refresh_token_expiration: None,
        }
    }
}

impl From<AuthSession> for UserDto {
    fn from(session: AuthSession) -> Self {
        let expires = session.refresh_token.expires_at.to_jiff();
        Self {
            token: Some(session.access_token),
            refresh_token_expiration: Some(expires),
            ..Self::from_user(session.user, session.roles)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_camel_case() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"email":"jane@example.com","userName":"jane","password":"abc","roleName":"Admin"}"#,
        )
        .unwrap();
        assert!(request.validate().is_ok());
        let registration = Registration::from(request);
        assert_eq!(registration.user_name, "jane");
        assert_eq!(registration.role_name.as_deref(), Some("Admin"));
    }

    #[test]
    fn test_short_password_is_rejected() {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"email":"jane@example.com","userName":"jane","password":"ab"}"#,
        )
        .unwrap();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_user_dto_without_session_omits_token() {
        let dto = UserDto {
            id: Uuid::nil(),
            email: "jane@example.com".into(),
            user_name: "jane".into(),
            first_name: None,
            last_name: None,
            roles: vec!["Customer".into()],
            token: None,
            refresh_token_expiration: None,
        };
        let body = serde_json::to_value(dto).unwrap();
        assert!(body.get("token").is_none());
        assert_eq!(body["userName"], "jane");
        assert_eq!(body["roles"][0], "Customer");
    }
}

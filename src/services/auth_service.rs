//! Registration, login, refresh-token rotation and password resets.

use std::sync::Arc;

use jiff::{SignedDuration, Timestamp};
use jiff_diesel::ToDiesel;
use uuid::Uuid;

use crate::config::{JwtConfig, SecurityConfig};
use crate::error::{AppError, AppResult};
use crate::models::{
    BuiltInRole, FailedLogin, NewPasswordResetToken, NewRefreshToken, NewUser, Permission,
    RefreshToken, User,
};
use crate::repositories::{RoleRepository, TokenRepository, UserRepository};
use crate::services::email::{EmailMessage, EmailSender, templates};
use crate::utils::jwt::{Claims, generate_access_token};
use crate::utils::password::{hash_password, verify_password};
use crate::utils::token::generate_opaque_token;

/// Lockouts ending further out than this were set by an administrator.
const ADMIN_LOCK_THRESHOLD_MINUTES: i64 = 5;

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(crate) fn normalize_user_name(user_name: &str) -> String {
    user_name.trim().to_uppercase()
}

/// Identity of an authenticated caller, as far as services care.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
}

impl Caller {
    pub fn is_super_admin(&self) -> bool {
        self.roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(BuiltInRole::SuperAdmin.as_str()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub email: String,
    pub user_name: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub role_name: Option<String>,
}

/// Result of a successful sign-in: the user, a fresh access token and the
/// refresh token to put in the cookie.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub roles: Vec<String>,
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

#[derive(Clone)]
pub struct AuthService {
    users: UserRepository,
    roles: RoleRepository,
    tokens: TokenRepository,
    jwt: JwtConfig,
    security: SecurityConfig,
    ui_url: String,
    email: Arc<dyn EmailSender>,
}

impl AuthService {
    pub fn new(
        users: UserRepository,
        roles: RoleRepository,
        tokens: TokenRepository,
        jwt: JwtConfig,
        security: SecurityConfig,
        ui_url: String,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            users,
            roles,
            tokens,
            jwt,
            security,
            ui_url: ui_url.trim_end_matches('/').to_string(),
            email,
        }
    }

    /// Creates an account. Roles other than Customer may only be assigned
    /// by a SuperAdmin caller.
    pub async fn register(
        &self,
        registration: Registration,
        caller: Option<&Caller>,
    ) -> AppResult<AuthSession> {
        let email = normalize_email(&registration.email);
        if self.users.email_exists(&email).await? {
            return Err(AppError::bad_request("Email already in use"));
        }

        let normalized_name = normalize_user_name(&registration.user_name);
        if self.users.user_name_exists(&normalized_name).await? {
            return Err(AppError::Duplicate {
                entity: "User".to_string(),
                field: "userName".to_string(),
                value: registration.user_name.trim().to_string(),
            });
        }

        let role = resolve_requested_role(registration.role_name.as_deref(), caller)?;
        let role_row = self
            .roles
            .find_by_name(role.as_str())
            .await?
            .ok_or_else(|| AppError::internal(format!("Role {role} has not been seeded")))?;

        let user = self
            .users
            .create_with_role(
                NewUser {
                    email,
                    user_name: registration.user_name.trim().to_string(),
                    normalized_user_name: normalized_name,
                    password_hash: Some(hash_password(&registration.password)?),
                    first_name: registration.first_name,
                    last_name: registration.last_name,
                    phone_number: registration.phone_number,
                    gender: registration.gender,
                },
                role_row.id,
            )
            .await?;

        tracing::info!(user_id = %user.id, role = %role, "User registered");
        self.issue_session(user).await
    }

    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthSession> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

        let now = Timestamp::now();
        if let Some(remaining) = user.lockout_remaining(now) {
            return Err(AppError::unauthorized(lockout_message(remaining)));
        }

        let password_ok = match user.password_hash.as_deref() {
            Some(hash) => verify_password(password, hash)?,
            None => false,
        };

        if !password_ok {
            let outcome = self
                .users
                .record_failed_login(
                    user.id,
                    self.security.max_failed_access_attempts,
                    SignedDuration::from_mins(self.security.lockout_minutes),
                )
                .await?;
            if outcome == FailedLogin::LockedOut {
                tracing::warn!(user_id = %user.id, "Account locked after failed logins");
            }
            return Err(failed_login_error(outcome));
        }

        if user.access_failed_count > 0 || user.lockout_end.is_some() {
            self.users.reset_access_state(user.id).await?;
        }
        self.tokens.prune_inactive_for_user(user.id).await?;

        tracing::info!(user_id = %user.id, "User logged in");
        self.issue_session(user).await
    }

    /// Exchanges a refresh token for a new session, revoking the old token.
    pub async fn refresh(&self, token: &str) -> AppResult<AuthSession> {
        let current = self
            .tokens
            .find_refresh_token(token)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        if !current.is_active(Timestamp::now()) {
            return Err(AppError::unauthorized("Refresh token expired"));
        }

        let user = self
            .users
            .find_by_id(current.user_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;

        let roles = self.role_names(user.id).await?;
        let access_token = self.access_token(&user, &roles).await?;
        let refresh_token = self
            .tokens
            .rotate_refresh_token(current.id, self.new_refresh_token(user.id))
            .await?;

        tracing::debug!(user_id = %user.id, "Refresh token rotated");
        Ok(AuthSession {
            user,
            roles,
            access_token,
            refresh_token,
        })
    }

    pub async fn logout(&self, token: Option<&str>) -> AppResult<()> {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.tokens.revoke_refresh_token(token).await?;
        }
        Ok(())
    }

    /// Deletes dead refresh and reset tokens; returns `(refresh, reset)`
    /// counts.
    pub async fn purge_stale_tokens(&self, now: Timestamp) -> AppResult<(usize, usize)> {
        self.tokens.purge_stale(now).await
    }

    /// The user and their role names, without issuing tokens.
    pub async fn current_user(&self, user_id: Uuid) -> AppResult<(User, Vec<String>)> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", "ID", user_id))?;
        let roles = self.role_names(user.id).await?;
        Ok((user, roles))
    }

    pub async fn email_exists(&self, email: &str) -> AppResult<bool> {
        self.users.email_exists(&normalize_email(email)).await
    }

    pub async fn user_name_exists(&self, user_name: &str) -> AppResult<bool> {
        self.users
            .user_name_exists(&normalize_user_name(user_name))
            .await
    }

    /// Issues a reset token and emails the reset link.
    pub async fn send_password_reset(&self, email: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User", "email", &email))?;

        let expires_at = Timestamp::now() + SignedDuration::from_mins(self.security.reset_token_minutes);
        let reset = self
            .tokens
            .create_reset_token(NewPasswordResetToken {
                user_id: user.id,
                token: generate_opaque_token(),
                expires_at: expires_at.to_diesel(),
            })
            .await?;

        let link = reset_link(&self.ui_url, &user.email, &reset.token);
        let message = EmailMessage::new(
            user.email.clone(),
            templates::PASSWORD_RESET_SUBJECT,
            templates::password_reset(&user.user_name, &link),
        );
        self.email.send(&message).await.map_err(|e| AppError::Internal {
            source: anyhow::anyhow!("Failed to send password reset email: {e}"),
        })?;

        tracing::info!(user_id = %user.id, "Password reset email sent");
        Ok(())
    }

    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let email = normalize_email(email);
        let user = self
            .users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AppError::not_found("User", "email", &email))?;

        let reset = self
            .tokens
            .find_reset_token(user.id, token.trim())
            .await?
            .filter(|t| t.is_usable(Timestamp::now()))
            .ok_or_else(|| AppError::bad_request("Invalid or expired password reset token"))?;

        self.tokens
            .complete_password_reset(reset.id, user.id, hash_password(new_password)?)
            .await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    async fn issue_session(&self, user: User) -> AppResult<AuthSession> {
        let roles = self.role_names(user.id).await?;
        let access_token = self.access_token(&user, &roles).await?;
        let refresh_token = self
            .tokens
            .create_refresh_token(self.new_refresh_token(user.id))
            .await?;

        Ok(AuthSession {
            user,
            roles,
            access_token,
            refresh_token,
        })
    }

    async fn role_names(&self, user_id: Uuid) -> AppResult<Vec<String>> {
        Ok(self
            .roles
            .roles_for_user(user_id)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect())
    }

    async fn access_token(&self, user: &User, roles: &[String]) -> AppResult<String> {
        let is_super_admin = roles
            .iter()
            .any(|r| r.eq_ignore_ascii_case(BuiltInRole::SuperAdmin.as_str()));
        let permissions = if is_super_admin {
            Permission::all().iter().map(Permission::name).collect()
        } else {
            self.roles.permissions_for_user(user.id).await?
        };

        let claims = Claims::new(
            user.id,
            user.email.clone(),
            user.user_name.clone(),
            roles.to_vec(),
            permissions,
            &self.jwt,
        );
        generate_access_token(&claims, &self.jwt)
    }

    fn new_refresh_token(&self, user_id: Uuid) -> NewRefreshToken {
        let expires_at =
            Timestamp::now() + SignedDuration::from_hours(self.jwt.refresh_token_expiration);
        NewRefreshToken {
            user_id,
            token: generate_opaque_token(),
            expires_at: expires_at.to_diesel(),
        }
    }
}

/// Role for a new account, checking that the caller may grant it.
pub(crate) fn resolve_requested_role(
    role_name: Option<&str>,
    caller: Option<&Caller>,
) -> AppResult<BuiltInRole> {
    let role = match role_name.map(str::trim).filter(|n| !n.is_empty()) {
        None => BuiltInRole::Customer,
        Some(name) => BuiltInRole::from_name(name)
            .ok_or_else(|| AppError::bad_request("Invalid role specified."))?,
    };

    if role != BuiltInRole::Customer {
        match caller {
            None => {
                return Err(AppError::unauthorized(
                    "You must be signed in to assign this role.",
                ));
            }
            Some(caller) if !caller.is_super_admin() => {
                return Err(AppError::forbidden("Only a SuperAdmin can assign this role."));
            }
            Some(_) => {}
        }
    }
    Ok(role)
}

pub(crate) fn lockout_message(remaining: SignedDuration) -> String {
    if remaining <= SignedDuration::from_mins(ADMIN_LOCK_THRESHOLD_MINUTES) {
        let minutes = (remaining.as_secs() + 59) / 60;
        format!(
            "Your account is locked due to multiple failed attempts. Try again after {} minutes.",
            minutes.max(1)
        )
    } else {
        "Your account has been locked by an admin. Please contact support.".to_string()
    }
}

/// The error a wrong password produces once the failure has been recorded.
pub(crate) fn failed_login_error(outcome: FailedLogin) -> AppError {
    match outcome {
        FailedLogin::Counted(_) => AppError::bad_request("Email or password is wrong. Try again!"),
        FailedLogin::LockedOut | FailedLogin::AlreadyLocked => AppError::unauthorized(
            "Your account has been locked due to multiple failed attempts. Try again later.",
        ),
    }
}

pub(crate) fn reset_link(ui_url: &str, email: &str, token: &str) -> String {
    format!(
        "{}/resetpassword?email={}&token={}",
        ui_url,
        urlencoding::encode(email),
        urlencoding::encode(token)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(roles: &[&str]) -> Caller {
        Caller {
            user_id: Uuid::nil(),
            email: "admin@test.com".into(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_role_is_customer() {
        assert_eq!(resolve_requested_role(None, None).unwrap(), BuiltInRole::Customer);
        assert_eq!(
            resolve_requested_role(Some(" "), None).unwrap(),
            BuiltInRole::Customer
        );
        assert_eq!(
            resolve_requested_role(Some("customer"), None).unwrap(),
            BuiltInRole::Customer
        );
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        match resolve_requested_role(Some("Manager"), None) {
            Err(AppError::BadRequest { message }) => assert_eq!(message, "Invalid role specified."),
            other => panic!("Expected BadRequest, got {other:?}"),
        }
    }

    #[test]
    fn test_elevated_role_requires_super_admin() {
        assert!(matches!(
            resolve_requested_role(Some("admin"), None),
            Err(AppError::Unauthorized { .. })
        ));
        assert!(matches!(
            resolve_requested_role(Some("admin"), Some(&caller(&["Admin"]))),
            Err(AppError::Forbidden { .. })
        ));
        assert_eq!(
            resolve_requested_role(Some("ADMIN"), Some(&caller(&["SuperAdmin"]))).unwrap(),
            BuiltInRole::Admin
        );
    }

    #[test]
    fn test_lockout_message_rounds_minutes_up() {
        let message = lockout_message(SignedDuration::from_secs(61));
        assert!(message.ends_with("Try again after 2 minutes."));

        let message = lockout_message(SignedDuration::from_secs(5 * 60));
        assert!(message.ends_with("Try again after 5 minutes."));
    }

    #[test]
    fn test_long_lockout_is_admin_lock() {
        let message = lockout_message(SignedDuration::from_hours(24 * 365));
        assert_eq!(
            message,
            "Your account has been locked by an admin. Please contact support."
        );
    }

    #[test]
    fn test_wrong_password_walks_to_lockout() {
        let max_attempts = 3;
        let errors: Vec<AppError> = (1..=max_attempts)
            .map(|count| failed_login_error(FailedLogin::after_increment(count, max_attempts)))
            .collect();

        assert!(matches!(
            &errors[0],
            AppError::BadRequest { message } if message == "Email or password is wrong. Try again!"
        ));
        assert!(matches!(&errors[1], AppError::BadRequest { .. }));
        assert!(matches!(
            &errors[2],
            AppError::Unauthorized { message } if message.contains("has been locked")
        ));
    }

    #[test]
    fn test_failure_racing_a_lockout_reports_locked() {
        assert!(matches!(
            failed_login_error(FailedLogin::AlreadyLocked),
            AppError::Unauthorized { .. }
        ));
    }

    #[test]
    fn test_reset_link_is_encoded() {
        let link = reset_link("http://localhost:4200", "bob+shop@test.com", "abc123");
        assert_eq!(
            link,
            "http://localhost:4200/resetpassword?email=bob%2Bshop%40test.com&token=abc123"
        );
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_email(" Bob@Test.COM "), "bob@test.com");
        assert_eq!(normalize_user_name(" bob "), "BOB");
    }
}

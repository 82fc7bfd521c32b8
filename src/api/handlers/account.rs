//! Registration, login, refresh-token rotation and password reset.
//!
//! The refresh token travels in an HttpOnly `refreshToken` cookie; the
//! access token is returned in the body.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{AppendHeaders, IntoResponse},
};
use jiff::Timestamp;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::api::doc::ACCOUNT_TAG;
use crate::api::dto::{
    ErrorResponse, ForgotPasswordRequest, LoginRequest, MessageResponse, RefreshTokenRequest,
    RegisterRequest, ResetPasswordRequest, UserDto,
};
use crate::api::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::services::AuthSession;
use crate::state::AppState;
use crate::utils::validate::{ValidatedJson, ValidatedJsonOrForm};

pub const REFRESH_COOKIE: &str = "refreshToken";

pub fn account_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(register))
        .routes(routes!(login))
        .routes(routes!(refresh_token, refresh_token_post))
        .routes(routes!(logout))
        .routes(routes!(email_exists))
        .routes(routes!(user_name_exists))
        .routes(routes!(forget_password))
        .routes(routes!(resend_reset_password))
        .routes(routes!(reset_password))
        .routes(routes!(me))
}

/// Only a SuperAdmin caller may register someone with a role other than
/// Customer.
#[utoipa::path(
    post,
    path = "/register",
    tag = ACCOUNT_TAG,
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Registered and signed in", body = UserDto),
        (status = 400, description = "Email in use, invalid role or invalid data", body = ErrorResponse),
        (status = 401, description = "Privileged role requested anonymously", body = ErrorResponse),
        (status = 403, description = "Privileged role requested by a non-SuperAdmin", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse)
    )
)]
async fn register(
    State(state): State<AppState>,
    caller: Option<AuthUser>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let caller = caller.map(|c| c.caller());
    let session = state
        .services
        .auth
        .register(payload.into(), caller.as_ref())
        .await?;
    session_response(session)
}

#[utoipa::path(
    post,
    path = "/login",
    tag = ACCOUNT_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = UserDto),
        (status = 400, description = "Wrong password", body = ErrorResponse),
        (status = 401, description = "Unknown email or locked account", body = ErrorResponse)
    )
)]
async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let session = state
        .services
        .auth
        .login(&payload.email, &payload.password)
        .await?;
    session_response(session)
}

/// Rotates the refresh token from the cookie.
#[utoipa::path(
    get,
    path = "/refresh-token",
    tag = ACCOUNT_TAG,
    responses(
        (status = 200, description = "New session issued", body = UserDto),
        (status = 400, description = "Refresh token missing", body = ErrorResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    )
)]
async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let token = cookie_value(&headers, REFRESH_COOKIE)
        .ok_or_else(|| AppError::bad_request("Refresh token missing"))?;
    let session = state.services.auth.refresh(&token).await?;
    session_response(session)
}

/// Same as the GET form, also accepting the token in the JSON body.
#[utoipa::path(
    post,
    path = "/refresh-token",
    tag = ACCOUNT_TAG,
    request_body(content = RefreshTokenRequest, description = "Used when no cookie is sent"),
    responses(
        (status = 200, description = "New session issued", body = UserDto),
        (status = 400, description = "Refresh token missing", body = ErrorResponse),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorResponse)
    )
)]
async fn refresh_token_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RefreshTokenRequest>>,
) -> AppResult<impl IntoResponse> {
    let token = cookie_value(&headers, REFRESH_COOKIE)
        .or_else(|| body.and_then(|Json(b)| b.refresh_token))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::bad_request("Refresh token missing"))?;
    let session = state.services.auth.refresh(&token).await?;
    session_response(session)
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = ACCOUNT_TAG,
    responses((status = 204, description = "Refresh token revoked and cookie cleared"))
)]
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<impl IntoResponse> {
    let token = cookie_value(&headers, REFRESH_COOKIE);
    state.services.auth.logout(token.as_deref()).await?;
    Ok((
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, clear_refresh_cookie())]),
    ))
}

#[utoipa::path(
    get,
    path = "/emailexists/{email}",
    tag = ACCOUNT_TAG,
    params(("email" = String, Path, description = "Email address to check")),
    responses((status = 200, description = "Whether the email is registered", body = bool))
)]
async fn email_exists(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> AppResult<Json<bool>> {
    Ok(Json(state.services.auth.email_exists(&email).await?))
}

#[utoipa::path(
    get,
    path = "/usernameexists/{username}",
    tag = ACCOUNT_TAG,
    params(("username" = String, Path, description = "Username to check")),
    responses((status = 200, description = "Whether the username is taken", body = bool))
)]
async fn user_name_exists(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<bool>> {
    Ok(Json(state.services.auth.user_name_exists(&username).await?))
}

/// Emails a single-use password reset link.
#[utoipa::path(
    post,
    path = "/forgetpassword",
    tag = ACCOUNT_TAG,
    request_body(content = ForgotPasswordRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse),
        (status = 500, description = "Email delivery failed", body = ErrorResponse)
    )
)]
async fn forget_password(
    State(state): State<AppState>,
    ValidatedJsonOrForm(payload): ValidatedJsonOrForm<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    send_reset(&state, &payload.email).await
}

#[utoipa::path(
    post,
    path = "/resend-resetpassword",
    tag = ACCOUNT_TAG,
    request_body(content = ForgotPasswordRequest, content_type = "application/json"),
    responses(
        (status = 200, description = "Reset email sent again", body = MessageResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse)
    )
)]
async fn resend_reset_password(
    State(state): State<AppState>,
    ValidatedJsonOrForm(payload): ValidatedJsonOrForm<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    send_reset(&state, &payload.email).await
}

#[utoipa::path(
    post,
    path = "/resetpassword",
    tag = ACCOUNT_TAG,
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Invalid, expired or used token", body = ErrorResponse),
        (status = 404, description = "Unknown email", body = ErrorResponse)
    )
)]
async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .services
        .auth
        .reset_password(&payload.email, &payload.token, &payload.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Reset password done successfully!")))
}

#[utoipa::path(
    get,
    path = "/me",
    tag = ACCOUNT_TAG,
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserDto),
        (status = 401, description = "Not signed in", body = ErrorResponse)
    )
)]
async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<UserDto>> {
    let (user, roles) = state.services.auth.current_user(auth.user_id).await?;
    Ok(Json(UserDto::from_user(user, roles)))
}

async fn send_reset(state: &AppState, email: &str) -> AppResult<Json<MessageResponse>> {
    state.services.auth.send_password_reset(email).await?;
    Ok(Json(MessageResponse::new(
        "Password reset link has been sent to your email",
    )))
}

fn session_response(
    session: AuthSession,
) -> AppResult<(AppendHeaders<[(header::HeaderName, HeaderValue); 1]>, Json<UserDto>)> {
    let cookie = refresh_cookie(
        &session.refresh_token.token,
        session.refresh_token.expires_at.to_jiff(),
    )?;
    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(UserDto::from(session)),
    ))
}

fn refresh_cookie(token: &str, expires: Timestamp) -> AppResult<HeaderValue> {
    let value = format!(
        "{REFRESH_COOKIE}={token}; Expires={}; Path=/; HttpOnly; Secure; SameSite=None",
        http_date(expires)
    );
    HeaderValue::from_str(&value).map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Invalid refresh cookie: {e}"),
    })
}

fn clear_refresh_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "refreshToken=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Max-Age=0; Path=/; HttpOnly; Secure; SameSite=None",
    )
}

/// IMF-fixdate, as cookies expect.
fn http_date(timestamp: Timestamp) -> String {
    timestamp.strftime("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// First cookie with the given name across all `Cookie` headers.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_static("session=1; refreshToken=abc123; other=x"),
        );
        assert_eq!(cookie_value(&headers, REFRESH_COOKIE).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cookie_value_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert!(cookie_value(&headers, REFRESH_COOKIE).is_none());
        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert!(cookie_value(&headers, REFRESH_COOKIE).is_none());
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let expires: Timestamp = "2030-01-02T03:04:05Z".parse().unwrap();
        let cookie = refresh_cookie("tok", expires).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("refreshToken=tok;"));
        assert!(cookie.contains("Expires=Wed, 02 Jan 2030 03:04:05 GMT"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=None"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_refresh_cookie();
        assert!(cookie.to_str().unwrap().contains("Max-Age=0"));
    }
}

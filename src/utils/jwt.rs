use jiff::{SignedDuration, Timestamp};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::{AppError, AppResult};

/// Claims carried by an access token.
///
/// Roles and the effective permission set are embedded at issue time, so a
/// change to either takes effect when the client next refreshes.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub iss: String,
    pub aud: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiration time (seconds since epoch)
    pub exp: i64,
}

impl Claims {
    pub fn new(
        user_id: Uuid,
        email: impl Into<String>,
        username: impl Into<String>,
        roles: Vec<String>,
        permissions: Vec<String>,
        config: &JwtConfig,
    ) -> Self {
        let now = Timestamp::now();
        let exp = now.saturating_add(SignedDuration::from_hours(config.access_token_expiration));

        Self {
            sub: user_id.to_string(),
            email: email.into(),
            username: username.into(),
            roles,
            permissions,
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now.as_second(),
            exp: exp.unwrap_or(now).as_second(),
        }
    }

    pub fn user_id(&self) -> AppResult<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::unauthorized("Invalid token subject"))
    }
}

/// Signs an access token (HS256) for the given claims.
pub fn generate_access_token(claims: &Claims, config: &JwtConfig) -> AppResult<String> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal {
        source: anyhow::anyhow!("Failed to generate JWT token: {}", e),
    })
}

/// Validates signature, expiry (with leeway), issuer and audience.
///
/// # Example
/// ```ignore
/// let claims = validate_access_token(&token, &settings.jwt)?;
/// let user_id = claims.user_id()?;
/// ```
pub fn validate_access_token(token: &str, config: &JwtConfig) -> AppResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = config.leeway;
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_audience(&[config.audience.as_str()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::unauthorized("Token has expired")
        }
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            AppError::unauthorized("Invalid token signature")
        }
        jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience => {
            AppError::unauthorized("Token was not issued for this API")
        }
        _ => AppError::unauthorized("Invalid token"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test_secret_key_for_jwt_testing_0123456789".to_string(),
            ..JwtConfig::default()
        }
    }

    fn sample_claims(config: &JwtConfig) -> Claims {
        Claims::new(
            Uuid::nil(),
            "bob@test.com",
            "bob",
            vec!["Admin".to_string()],
            vec!["Permissions.Products.View".to_string()],
            config,
        )
    }

    #[test]
    fn test_round_trip_keeps_roles_and_permissions() {
        let config = test_config();
        let token = generate_access_token(&sample_claims(&config), &config).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = validate_access_token(&token, &config).unwrap();
        assert_eq!(claims.user_id().unwrap(), Uuid::nil());
        assert_eq!(claims.email, "bob@test.com");
        assert_eq!(claims.roles, vec!["Admin"]);
        assert_eq!(claims.permissions, vec!["Permissions.Products.View"]);
        assert_eq!(claims.iss, "ecommerce-api");
    }

    #[test]
    fn test_expiry_follows_configured_hours() {
        let config = test_config();
        let claims = sample_claims(&config);
        assert_eq!(claims.exp - claims.iat, config.access_token_expiration * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let config = test_config();
        let token = generate_access_token(&sample_claims(&config), &config).unwrap();

        let other = JwtConfig {
            secret: "another_secret_key_for_jwt_testing_987654".to_string(),
            ..test_config()
        };
        match validate_access_token(&token, &other) {
            Err(AppError::Unauthorized { message }) => assert!(message.contains("signature")),
            other => panic!("Expected Unauthorized, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_audience_is_rejected() {
        let config = test_config();
        let token = generate_access_token(&sample_claims(&config), &config).unwrap();

        let other = JwtConfig {
            audience: "someone-else".to_string(),
            ..test_config()
        };
        assert!(matches!(
            validate_access_token(&token, &other),
            Err(AppError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_expired_token_outside_leeway() {
        let config = test_config();
        let mut claims = sample_claims(&config);
        claims.iat -= 7200;
        claims.exp = claims.iat + 60;
        let token = generate_access_token(&claims, &config).unwrap();

        match validate_access_token(&token, &config) {
            Err(AppError::Unauthorized { message }) => assert_eq!(message, "Token has expired"),
            other => panic!("Expected expiry error, got {other:?}"),
        }
    }

    #[test]
    fn test_recently_expired_token_within_leeway() {
        let config = test_config();
        let mut claims = sample_claims(&config);
        claims.exp = Timestamp::now().as_second() - 10;
        let token = generate_access_token(&claims, &config).unwrap();

        assert!(validate_access_token(&token, &config).is_ok());
    }

    #[test]
    fn test_garbage_token() {
        let config = test_config();
        assert!(matches!(
            validate_access_token("not.a.jwt", &config),
            Err(AppError::Unauthorized { .. })
        ));
    }
}

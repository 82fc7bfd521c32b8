use diesel::prelude::*;
use jiff::Timestamp;
use uuid::Uuid;

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::refresh_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RefreshToken {
    pub id: i32,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: jiff_diesel::Timestamp,
    pub created_at: jiff_diesel::Timestamp,
    pub revoked_at: Option<jiff_diesel::Timestamp>,
}

impl RefreshToken {
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.to_jiff() <= now
    }

    /// Neither revoked nor expired.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.revoked_at.is_none() && !self.is_expired(now)
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::refresh_tokens)]
pub struct NewRefreshToken {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: jiff_diesel::Timestamp,
}

#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::password_reset_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PasswordResetToken {
    pub id: i32,
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: jiff_diesel::Timestamp,
    pub used_at: Option<jiff_diesel::Timestamp>,
    pub created_at: jiff_diesel::Timestamp,
}

impl PasswordResetToken {
    /// Single use and time bound.
    pub fn is_usable(&self, now: Timestamp) -> bool {
        self.used_at.is_none() && self.expires_at.to_jiff() > now
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::password_reset_tokens)]
pub struct NewPasswordResetToken {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: jiff_diesel::Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::SignedDuration;
    use jiff_diesel::ToDiesel;

    fn refresh_token(expires_at: Timestamp, revoked: bool) -> RefreshToken {
        let now = Timestamp::now();
        RefreshToken {
            id: 1,
            user_id: Uuid::nil(),
            token: "abc".into(),
            expires_at: expires_at.to_diesel(),
            created_at: now.to_diesel(),
            revoked_at: revoked.then(|| now.to_diesel()),
        }
    }

    #[test]
    fn test_refresh_token_activity() {
        let now = Timestamp::now();
        let later = now + SignedDuration::from_hours(1);
        let earlier = now - SignedDuration::from_hours(1);

        assert!(refresh_token(later, false).is_active(now));
        assert!(!refresh_token(later, true).is_active(now));
        assert!(!refresh_token(earlier, false).is_active(now));
        assert!(refresh_token(earlier, false).is_expired(now));
    }

    #[test]
    fn test_reset_token_is_single_use() {
        let now = Timestamp::now();
        let mut token = PasswordResetToken {
            id: 1,
            user_id: Uuid::nil(),
            token: "abc".into(),
            expires_at: (now + SignedDuration::from_hours(1)).to_diesel(),
            used_at: None,
            created_at: now.to_diesel(),
        };
        assert!(token.is_usable(now));

        token.used_at = Some(now.to_diesel());
        assert!(!token.is_usable(now));
    }
}

use diesel::prelude::*;
use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

#[derive(Debug, Queryable, Selectable, Identifiable, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub user_name: String,
    pub normalized_user_name: String,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
    pub profile_picture_url: Option<String>,
    pub access_failed_count: i32,
    pub lockout_end: Option<jiff_diesel::Timestamp>,
    pub created_at: jiff_diesel::Timestamp,
    pub updated_at: jiff_diesel::Timestamp,
}

impl User {
    pub fn lockout_end(&self) -> Option<Timestamp> {
        self.lockout_end.map(|t| t.to_jiff())
    }

    /// Time left on an active lockout, `None` when the account is usable.
    pub fn lockout_remaining(&self, now: Timestamp) -> Option<SignedDuration> {
        self.lockout_end()
            .filter(|end| *end > now)
            .map(|end| end.duration_since(now))
    }

    pub fn is_locked_out(&self, now: Timestamp) -> bool {
        self.lockout_remaining(now).is_some()
    }
}

/// Where a wrong password leaves the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedLogin {
    /// The failure was counted; holds the new counter value.
    Counted(i32),
    /// This failure reached the limit: the account is locked and the counter
    /// starts over.
    LockedOut,
    /// A concurrent failure locked the account before this one was counted.
    AlreadyLocked,
}

impl FailedLogin {
    /// Classifies the counter value read back after an atomic increment.
    pub fn after_increment(failed_count: i32, max_attempts: i32) -> Self {
        if failed_count >= max_attempts {
            FailedLogin::LockedOut
        } else {
            FailedLogin::Counted(failed_count)
        }
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub email: String,
    pub user_name: String,
    pub normalized_user_name: String,
    pub password_hash: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::users)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub gender: Option<String>,
}

impl UpdateUser {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.phone_number.is_none()
            && self.gender.is_none()
    }
}

/// One shipping address per user; used both for reads and upserts.
#[derive(Debug, Queryable, Selectable, Insertable, AsChangeset, Clone, PartialEq)]
#[diesel(table_name = crate::schema::addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct Address {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff_diesel::ToDiesel;

    fn user_locked_until(end: Option<Timestamp>) -> User {
        let now = Timestamp::now().to_diesel();
        User {
            id: Uuid::nil(),
            email: "bob@test.com".into(),
            user_name: "bob".into(),
            normalized_user_name: "BOB".into(),
            password_hash: None,
            first_name: None,
            last_name: None,
            phone_number: None,
            gender: None,
            profile_picture_url: None,
            access_failed_count: 0,
            lockout_end: end.map(|t| t.to_diesel()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_no_lockout() {
        let user = user_locked_until(None);
        assert!(!user.is_locked_out(Timestamp::now()));
    }

    #[test]
    fn test_expired_lockout_is_ignored() {
        let now = Timestamp::now();
        let user = user_locked_until(Some(now - SignedDuration::from_mins(1)));
        assert!(!user.is_locked_out(now));
    }

    #[test]
    fn test_active_lockout_remaining() {
        let now = Timestamp::now();
        let user = user_locked_until(Some(now + SignedDuration::from_mins(3)));
        assert_eq!(user.lockout_remaining(now), Some(SignedDuration::from_mins(3)));
    }

    #[test]
    fn test_empty_update() {
        assert!(UpdateUser::default().is_empty());
        let update = UpdateUser {
            gender: Some("Female".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_failed_login_counts_until_limit() {
        assert_eq!(FailedLogin::after_increment(1, 5), FailedLogin::Counted(1));
        assert_eq!(FailedLogin::after_increment(4, 5), FailedLogin::Counted(4));
        assert_eq!(FailedLogin::after_increment(5, 5), FailedLogin::LockedOut);
        assert_eq!(FailedLogin::after_increment(1, 1), FailedLogin::LockedOut);
    }

    #[test]
    fn test_failed_login_past_limit_still_locks() {
        assert_eq!(FailedLogin::after_increment(9, 5), FailedLogin::LockedOut);
    }
}

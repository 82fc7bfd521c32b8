//! Self-service profile management and the admin user list.

use std::collections::HashMap;

use jiff::{SignedDuration, Timestamp};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Address, UpdateUser, User};
use crate::repositories::{RoleRepository, TokenRepository, UserQuery, UserRepository};
use crate::services::file_storage::FileStorageService;
use crate::utils::password::{hash_password, verify_password};

const PROFILE_IMAGES_FOLDER: &str = "profiles";

/// Admin locks last long enough to read as "until unlocked".
const ADMIN_LOCK_DAYS: i64 = 365 * 100;

/// Row of the admin user list.
#[derive(Debug, Clone)]
pub struct UserSummary {
    pub user: User,
    pub roles: Vec<String>,
    pub is_locked: bool,
}

#[derive(Clone)]
pub struct ProfileService {
    users: UserRepository,
    roles: RoleRepository,
    tokens: TokenRepository,
    files: FileStorageService,
}

impl ProfileService {
    pub fn new(
        users: UserRepository,
        roles: RoleRepository,
        tokens: TokenRepository,
        files: FileStorageService,
    ) -> Self {
        Self {
            users,
            roles,
            tokens,
            files,
        }
    }

    pub fn files(&self) -> &FileStorageService {
        &self.files
    }

    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User", "ID", user_id))
    }

    pub async fn update_profile(&self, user_id: Uuid, changes: UpdateUser) -> AppResult<User> {
        let user = self.get_profile(user_id).await?;
        if changes.is_empty() {
            return Ok(user);
        }
        let user = self.users.update_profile(user.id, changes).await?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Stores a new profile image and removes the previous file.
    pub async fn set_profile_image(
        &self,
        user_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> AppResult<User> {
        let user = self.get_profile(user_id).await?;
        let stored = self
            .files
            .save(PROFILE_IMAGES_FOLDER, file_name, bytes)
            .await?;
        if let Err(e) = self.users.set_profile_picture(user.id, Some(&stored)).await {
            self.remove_file(&stored).await;
            return Err(e);
        }

        if let Some(previous) = user.profile_picture_url.as_deref() {
            self.remove_file(previous).await;
        }
        self.get_profile(user_id).await
    }

    pub async fn remove_profile_image(&self, user_id: Uuid) -> AppResult<()> {
        let user = self.get_profile(user_id).await?;
        if let Some(previous) = user.profile_picture_url.as_deref() {
            self.users.set_profile_picture(user.id, None).await?;
            self.remove_file(previous).await;
        }
        Ok(())
    }

    pub async fn get_address(&self, user_id: Uuid) -> AppResult<Address> {
        self.users
            .find_address(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Address", "user ID", user_id))
    }

    pub async fn save_address(&self, mut address: Address) -> AppResult<Address> {
        let user = self.get_profile(address.user_id).await?;
        address.user_id = user.id;
        self.users.upsert_address(address).await
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.get_profile(user_id).await?;
        if !password_matches(&user, old_password)? {
            return Err(AppError::bad_request("Old password is incorrect"));
        }
        self.users
            .set_password_hash(user.id, &hash_password(new_password)?)
            .await?;
        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    /// Sets a password on an account that has none.
    pub async fn set_password(&self, user_id: Uuid, password: &str) -> AppResult<()> {
        let user = self.get_profile(user_id).await?;
        if user.password_hash.is_some() {
            return Err(AppError::bad_request("User already has a password"));
        }
        self.users
            .set_password_hash(user.id, &hash_password(password)?)
            .await?;
        tracing::info!(user_id = %user.id, "Password set");
        Ok(())
    }

    /// Deletes the account after confirming its password.
    pub async fn delete_profile(&self, user_id: Uuid, password: &str) -> AppResult<()> {
        let user = self.get_profile(user_id).await?;
        if !password_matches(&user, password)? {
            return Err(AppError::bad_request("Password is incorrect"));
        }

        self.tokens.revoke_all_for_user(user.id).await?;
        self.users.delete(user.id).await?;
        if let Some(picture) = user.profile_picture_url.as_deref() {
            self.remove_file(picture).await;
        }
        tracing::info!(user_id = %user.id, "Profile deleted");
        Ok(())
    }

    pub async fn list_users(&self, query: &UserQuery) -> AppResult<(Vec<UserSummary>, i64)> {
        let (users, total) = self.users.list(query).await?;
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

        let role_pairs = self.roles.role_names_for_users(&ids).await?;
        let summaries = summarize_users(users, role_pairs, Timestamp::now());
        Ok((summaries, total))
    }

    pub async fn lock_user(&self, user_id: Uuid) -> AppResult<()> {
        let user = self.get_profile(user_id).await?;
        self.users
            .set_lockout_end(user.id, Some(admin_lock_until(Timestamp::now())))
            .await?;
        self.tokens.revoke_all_for_user(user.id).await?;
        tracing::info!(user_id = %user.id, "User locked by admin");
        Ok(())
    }

    pub async fn unlock_user(&self, user_id: Uuid) -> AppResult<()> {
        let user = self.get_profile(user_id).await?;
        self.users.reset_access_state(user.id).await?;
        tracing::info!(user_id = %user.id, "User unlocked by admin");
        Ok(())
    }

    async fn remove_file(&self, relative: &str) {
        if let Err(e) = self.files.delete(relative).await {
            tracing::warn!(path = relative, error = %e, "Failed to delete profile image");
        }
    }
}

fn password_matches(user: &User, password: &str) -> AppResult<bool> {
    match user.password_hash.as_deref() {
        Some(hash) => verify_password(password, hash),
        None => Ok(false),
    }
}

fn admin_lock_until(now: Timestamp) -> Timestamp {
    now.saturating_add(SignedDuration::from_hours(24 * ADMIN_LOCK_DAYS))
        .unwrap_or(Timestamp::MAX)
}

/// Attaches each user's role names, as `(user, role)` pairs, and the lock
/// flag as of `now`.
fn summarize_users(
    users: Vec<User>,
    role_pairs: Vec<(Uuid, String)>,
    now: Timestamp,
) -> Vec<UserSummary> {
    let mut roles_by_user: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (owner, role) in role_pairs {
        roles_by_user.entry(owner).or_default().push(role);
    }

    users
        .into_iter()
        .map(|user| UserSummary {
            roles: roles_by_user.remove(&user.id).unwrap_or_default(),
            is_locked: user.is_locked_out(now),
            user,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::auth_service::lockout_message;
    use jiff_diesel::ToDiesel;

    fn user(name: &str, password_hash: Option<String>, lockout: Option<Timestamp>) -> User {
        let now = Timestamp::now().to_diesel();
        User {
            id: Uuid::new_v4(),
            email: format!("{name}@test.com"),
            user_name: name.to_string(),
            normalized_user_name: name.to_uppercase(),
            password_hash,
            first_name: None,
            last_name: None,
            phone_number: None,
            gender: None,
            profile_picture_url: None,
            access_failed_count: 0,
            lockout_end: lockout.map(|t| t.to_diesel()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_password_matches() {
        let hashed = user("bob", Some(hash_password("Pa$$w0rd").unwrap()), None);
        assert!(password_matches(&hashed, "Pa$$w0rd").unwrap());
        assert!(!password_matches(&hashed, "wrong").unwrap());
    }

    #[test]
    fn test_account_without_password_never_matches() {
        assert!(!password_matches(&user("ext", None, None), "").unwrap());
    }

    #[test]
    fn test_admin_lock_reads_as_admin_lock() {
        let now = Timestamp::now();
        let until = admin_lock_until(now);
        assert!(user("bob", None, Some(until)).is_locked_out(now));
        assert_eq!(
            lockout_message(until.duration_since(now)),
            "Your account has been locked by an admin. Please contact support."
        );
    }

    #[test]
    fn test_summaries_group_roles_per_user() {
        let now = Timestamp::now();
        let alice = user("alice", None, None);
        let bob = user("bob", None, Some(now + SignedDuration::from_mins(10)));
        let carol = user("carol", None, Some(now - SignedDuration::from_mins(10)));
        let pairs = vec![
            (alice.id, "Admin".to_string()),
            (bob.id, "Customer".to_string()),
            (alice.id, "Customer".to_string()),
        ];

        let summaries = summarize_users(vec![alice, bob, carol], pairs, now);

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].roles, vec!["Admin", "Customer"]);
        assert!(!summaries[0].is_locked);
        assert_eq!(summaries[1].roles, vec!["Customer"]);
        assert!(summaries[1].is_locked);
        assert!(summaries[2].roles.is_empty());
        assert!(!summaries[2].is_locked);
    }
}

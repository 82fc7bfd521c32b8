//! Users and their shipping addresses.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff::{SignedDuration, Timestamp};
use jiff_diesel::ToDiesel;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Address, FailedLogin, NewUser, UpdateUser, User, UserRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSort {
    #[default]
    NameAsc,
    NameDesc,
    EmailAsc,
    EmailDesc,
}

/// Admin user listing filter. `offset`/`limit` are already resolved.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role: Option<String>,
    pub sort: UserSort,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Clone)]
pub struct UserRepository {
    pool: AsyncDbPool,
}

impl UserRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, user_id: Uuid) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        users
            .filter(id.eq(user_id))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Emails are stored lowercased, so callers pass a normalized address.
    pub async fn find_by_email(&self, user_email: &str) -> AppResult<Option<User>> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        users
            .filter(email.eq(user_email))
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn email_exists(&self, user_email: &str) -> AppResult<bool> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::select(diesel::dsl::exists(users.filter(email.eq(user_email))))
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn user_name_exists(&self, normalized: &str) -> AppResult<bool> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::select(diesel::dsl::exists(
            users.filter(normalized_user_name.eq(normalized)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn update_profile(&self, user_id: Uuid, changes: UpdateUser) -> AppResult<User> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set((&changes, updated_at.eq(Timestamp::now().to_diesel())))
            .returning(User::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn set_password_hash(&self, user_id: Uuid, hash: &str) -> AppResult<()> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set((
                password_hash.eq(Some(hash)),
                updated_at.eq(Timestamp::now().to_diesel()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    pub async fn set_profile_picture(
        &self,
        user_id: Uuid,
        picture: Option<&str>,
    ) -> AppResult<()> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set((
                profile_picture_url.eq(picture),
                updated_at.eq(Timestamp::now().to_diesel()),
            ))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Sets or clears the lockout end without touching the failure counter.
    pub async fn set_lockout_end(
        &self,
        user_id: Uuid,
        lockout: Option<Timestamp>,
    ) -> AppResult<()> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set(lockout_end.eq(lockout.map(|t| t.to_diesel())))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Zeroes the failure counter and lifts any lockout.
    pub async fn reset_access_state(&self, user_id: Uuid) -> AppResult<()> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(users.filter(id.eq(user_id)))
            .set((access_failed_count.eq(0), lockout_end.eq(None::<jiff_diesel::Timestamp>)))
            .execute(&mut conn)
            .await?;
        Ok(())
    }

    /// Counts a wrong password with an in-database increment, locking the
    /// account for `lock_for` once the counter reaches `max_attempts`.
    /// Failures that arrive while the account is locked are not counted.
    pub async fn record_failed_login(
        &self,
        user_id: Uuid,
        max_attempts: i32,
        lock_for: SignedDuration,
    ) -> AppResult<FailedLogin> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;
        let now = Timestamp::now();
        let lock_until = now.saturating_add(lock_for).unwrap_or(now).to_diesel();
        let now = now.to_diesel();

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let counted: Option<i32> = diesel::update(
                    users
                        .filter(id.eq(user_id))
                        .filter(lockout_end.is_null().or(lockout_end.le(Some(now)))),
                )
                .set(access_failed_count.eq(access_failed_count + 1))
                .returning(access_failed_count)
                .get_result(conn)
                .await
                .optional()?;

                let Some(counted) = counted else {
                    return Ok(FailedLogin::AlreadyLocked);
                };
                let outcome = FailedLogin::after_increment(counted, max_attempts);
                if outcome == FailedLogin::LockedOut {
                    diesel::update(users.filter(id.eq(user_id)))
                        .set((access_failed_count.eq(0), lockout_end.eq(Some(lock_until))))
                        .execute(conn)
                        .await?;
                }
                Ok(outcome)
            }
            .scope_boxed()
        })
        .await
    }

    /// Creates the user and grants `role` in one transaction.
    pub async fn create_with_role(&self, new_user: NewUser, role: Uuid) -> AppResult<User> {
        use crate::schema::{user_roles, users};
        let mut conn = self.pool.get().await?;

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let user = diesel::insert_into(users::table)
                    .values(&new_user)
                    .returning(User::as_returning())
                    .get_result(conn)
                    .await?;
                diesel::insert_into(user_roles::table)
                    .values(&UserRole {
                        user_id: user.id,
                        role_id: role,
                    })
                    .execute(conn)
                    .await?;
                Ok(user)
            }
            .scope_boxed()
        })
        .await
    }

    /// Deletes the user. Addresses, roles and tokens go with it via cascade.
    pub async fn delete(&self, user_id: Uuid) -> AppResult<usize> {
        use crate::schema::users::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::delete(users.filter(id.eq(user_id)))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn list(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        use crate::schema::{roles, user_roles, users};
        let mut conn = self.pool.get().await?;

        let filtered = || {
            let mut q = users::table.into_boxed();
            if let Some(term) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
                let pattern = format!("%{}%", escape_like(term.trim()));
                q = q.filter(
                    users::user_name
                        .ilike(pattern.clone())
                        .or(users::email.ilike(pattern)),
                );
            }
            if let Some(role) = query.role.as_deref().filter(|s| !s.trim().is_empty()) {
                let role_users = user_roles::table
                    .inner_join(roles::table)
                    .filter(roles::normalized_name.eq(role.trim().to_uppercase()))
                    .select(user_roles::user_id);
                q = q.filter(users::id.eq_any(role_users));
            }
            q
        };

        let total = filtered()
            .count()
            .get_result::<i64>(&mut conn)
            .await?;

        let ordered = match query.sort {
            UserSort::NameAsc => filtered().order(users::user_name.asc()),
            UserSort::NameDesc => filtered().order(users::user_name.desc()),
            UserSort::EmailAsc => filtered().order(users::email.asc()),
            UserSort::EmailDesc => filtered().order(users::email.desc()),
        };

        let rows = ordered
            .offset(query.offset)
            .limit(query.limit)
            .select(User::as_select())
            .load(&mut conn)
            .await?;

        Ok((rows, total))
    }

    pub async fn find_address(&self, owner: Uuid) -> AppResult<Option<Address>> {
        use crate::schema::addresses::dsl::*;
        let mut conn = self.pool.get().await?;

        addresses
            .filter(user_id.eq(owner))
            .select(Address::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    pub async fn upsert_address(&self, address: Address) -> AppResult<Address> {
        use crate::schema::addresses::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(addresses)
            .values(&address)
            .on_conflict(user_id)
            .do_update()
            .set(&address)
            .returning(Address::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside LIKE.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("bob"), "bob");
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}

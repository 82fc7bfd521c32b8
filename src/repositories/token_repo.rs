//! Server-side state for refresh sessions and password resets.

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use jiff::Timestamp;
use jiff_diesel::ToDiesel;
use uuid::Uuid;

use crate::db::AsyncDbPool;
use crate::error::{AppError, AppResult};
use crate::models::{NewPasswordResetToken, NewRefreshToken, PasswordResetToken, RefreshToken};

#[derive(Clone)]
pub struct TokenRepository {
    pool: AsyncDbPool,
}

impl TokenRepository {
    pub fn new(pool: AsyncDbPool) -> Self {
        Self { pool }
    }

    pub async fn create_refresh_token(&self, new_token: NewRefreshToken) -> AppResult<RefreshToken> {
        use crate::schema::refresh_tokens::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(refresh_tokens)
            .values(&new_token)
            .returning(RefreshToken::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_refresh_token(&self, value: &str) -> AppResult<Option<RefreshToken>> {
        use crate::schema::refresh_tokens::dsl::*;
        let mut conn = self.pool.get().await?;

        refresh_tokens
            .filter(token.eq(value))
            .select(RefreshToken::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Revokes `old_id` and stores its replacement atomically. Only a token
    /// that is still unrevoked and unexpired at update time can be rotated,
    /// so concurrent rotations of one token yield a single winner.
    pub async fn rotate_refresh_token(
        &self,
        old_id: i32,
        replacement: NewRefreshToken,
    ) -> AppResult<RefreshToken> {
        use crate::schema::refresh_tokens::dsl::*;
        let mut conn = self.pool.get().await?;
        let now = Timestamp::now().to_diesel();

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let revoked = diesel::update(
                    refresh_tokens
                        .filter(id.eq(old_id))
                        .filter(revoked_at.is_null())
                        .filter(expires_at.gt(now)),
                )
                .set(revoked_at.eq(Some(now)))
                .execute(conn)
                .await?;
                single_use(revoked, || AppError::unauthorized("Refresh token expired"))?;

                diesel::insert_into(refresh_tokens)
                    .values(&replacement)
                    .returning(RefreshToken::as_returning())
                    .get_result(conn)
                    .await
                    .map_err(AppError::from)
            }
            .scope_boxed()
        })
        .await
    }

    pub async fn revoke_refresh_token(&self, value: &str) -> AppResult<usize> {
        use crate::schema::refresh_tokens::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(refresh_tokens.filter(token.eq(value)).filter(revoked_at.is_null()))
            .set(revoked_at.eq(Some(Timestamp::now().to_diesel())))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn revoke_all_for_user(&self, owner: Uuid) -> AppResult<usize> {
        use crate::schema::refresh_tokens::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::update(refresh_tokens.filter(user_id.eq(owner)).filter(revoked_at.is_null()))
            .set(revoked_at.eq(Some(Timestamp::now().to_diesel())))
            .execute(&mut conn)
            .await
            .map_err(AppError::from)
    }

    /// Deletes the user's revoked and expired refresh tokens.
    pub async fn prune_inactive_for_user(&self, owner: Uuid) -> AppResult<usize> {
        use crate::schema::refresh_tokens::dsl::*;
        let mut conn = self.pool.get().await?;
        let now = Timestamp::now().to_diesel();

        diesel::delete(
            refresh_tokens
                .filter(user_id.eq(owner))
                .filter(revoked_at.is_not_null().or(expires_at.le(now))),
        )
        .execute(&mut conn)
        .await
        .map_err(AppError::from)
    }

    pub async fn create_reset_token(
        &self,
        new_token: NewPasswordResetToken,
    ) -> AppResult<PasswordResetToken> {
        use crate::schema::password_reset_tokens::dsl::*;
        let mut conn = self.pool.get().await?;

        diesel::insert_into(password_reset_tokens)
            .values(&new_token)
            .returning(PasswordResetToken::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(AppError::from)
    }

    pub async fn find_reset_token(
        &self,
        owner: Uuid,
        value: &str,
    ) -> AppResult<Option<PasswordResetToken>> {
        use crate::schema::password_reset_tokens::dsl::*;
        let mut conn = self.pool.get().await?;

        password_reset_tokens
            .filter(user_id.eq(owner))
            .filter(token.eq(value))
            .select(PasswordResetToken::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(AppError::from)
    }

    /// Marks the reset token used, stores the new password hash and revokes
    /// every refresh token of the user. Nothing changes unless the token is
    /// still unused and unexpired when it is claimed.
    pub async fn complete_password_reset(
        &self,
        reset_id: i32,
        owner: Uuid,
        new_hash: String,
    ) -> AppResult<()> {
        use crate::schema::{password_reset_tokens, refresh_tokens, users};
        let mut conn = self.pool.get().await?;
        let now = Timestamp::now().to_diesel();

        conn.transaction::<_, AppError, _>(|conn| {
            async move {
                let claimed = diesel::update(
                    password_reset_tokens::table
                        .filter(password_reset_tokens::id.eq(reset_id))
                        .filter(password_reset_tokens::user_id.eq(owner))
                        .filter(password_reset_tokens::used_at.is_null())
                        .filter(password_reset_tokens::expires_at.gt(now)),
                )
                .set(password_reset_tokens::used_at.eq(Some(now)))
                .execute(conn)
                .await?;
                single_use(claimed, || {
                    AppError::bad_request("Invalid or expired password reset token")
                })?;

                diesel::update(users::table.filter(users::id.eq(owner)))
                    .set((
                        users::password_hash.eq(Some(new_hash)),
                        users::access_failed_count.eq(0),
                        users::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;

                diesel::update(
                    refresh_tokens::table
                        .filter(refresh_tokens::user_id.eq(owner))
                        .filter(refresh_tokens::revoked_at.is_null()),
                )
                .set(refresh_tokens::revoked_at.eq(Some(now)))
                .execute(conn)
                .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
    }

    /// Removes expired or revoked refresh tokens and used or expired reset
    /// tokens. Returns `(refresh, reset)` deletion counts.
    pub async fn purge_stale(&self, now: Timestamp) -> AppResult<(usize, usize)> {
        use crate::schema::{password_reset_tokens, refresh_tokens};
        let mut conn = self.pool.get().await?;
        let now = now.to_diesel();

        let refresh = diesel::delete(
            refresh_tokens::table.filter(
                refresh_tokens::revoked_at
                    .is_not_null()
                    .or(refresh_tokens::expires_at.le(now)),
            ),
        )
        .execute(&mut conn)
        .await?;

        let reset = diesel::delete(
            password_reset_tokens::table.filter(
                password_reset_tokens::used_at
                    .is_not_null()
                    .or(password_reset_tokens::expires_at.le(now)),
            ),
        )
        .execute(&mut conn)
        .await?;

        Ok((refresh, reset))
    }
}

/// Turns the row count of a conditional claim into the error raised when
/// another request got there first.
fn single_use(affected: usize, rejected: impl FnOnce() -> AppError) -> AppResult<()> {
    if affected == 0 {
        Err(rejected())
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_a_claimed_row_passes() {
        assert!(single_use(1, || AppError::unauthorized("Refresh token expired")).is_ok());
        assert!(matches!(
            single_use(0, || AppError::unauthorized("Refresh token expired")),
            Err(AppError::Unauthorized { .. })
        ));
        assert!(matches!(
            single_use(0, || AppError::bad_request("Invalid or expired password reset token")),
            Err(AppError::BadRequest { .. })
        ));
    }
}

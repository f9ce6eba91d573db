//! Email verification codes (`shop.email_otp`).
//!
//! Only the SHA-256 hex digest of a code is stored.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use tidewear_core::UserId;

use super::RepositoryError;

/// A stored, not yet consumed code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OtpRecord {
    pub id: i32,
    pub code_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

pub struct OtpRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OtpRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a freshly issued code, valid for `ttl_minutes` from now.
    ///
    /// Timestamps come from the database clock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        user_id: UserId,
        code_hash: &str,
        ttl_minutes: i32,
    ) -> Result<(), RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        insert_code(&mut conn, user_id, code_hash, ttl_minutes).await
    }

    /// Store a new code unless one was issued in the last `cooldown_secs`.
    ///
    /// The user row is locked for the duration, so concurrent requests for
    /// the same account are serialized and at most one of them inserts.
    /// Returns the seconds left in the cooldown when nothing was stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn insert_unless_recent(
        &self,
        user_id: UserId,
        code_hash: &str,
        ttl_minutes: i32,
        cooldown_secs: i64,
    ) -> Result<Option<i64>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT id FROM shop.user WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let seconds_left: Option<i64> = sqlx::query_scalar(
            r"
            SELECT CEIL(EXTRACT(EPOCH FROM
                MAX(created_at) + make_interval(secs => $2::float8) - NOW()
            ))::bigint
            FROM shop.email_otp
            WHERE user_id = $1
            ",
        )
        .bind(user_id)
        .bind(cooldown_secs)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(wait) = cooldown_wait(seconds_left) {
            tx.rollback().await?;
            return Ok(Some(wait));
        }

        insert_code(&mut tx, user_id, code_hash, ttl_minutes).await?;
        tx.commit().await?;
        Ok(None)
    }

    /// The newest unconsumed code that has not expired yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_active(
        &self,
        user_id: UserId,
    ) -> Result<Option<OtpRecord>, RepositoryError> {
        Ok(sqlx::query_as::<_, OtpRecord>(
            r"
            SELECT id, code_hash, expires_at, created_at
            FROM shop.email_otp
            WHERE user_id = $1 AND consumed_at IS NULL AND expires_at > NOW()
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?)
    }

    /// Mark a code used. Returns `false` if it was already consumed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn consume(&self, id: i32) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.email_otp SET consumed_at = NOW() WHERE id = $1 AND consumed_at IS NULL",
        )
        .bind(id)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

async fn insert_code(
    conn: &mut PgConnection,
    user_id: UserId,
    code_hash: &str,
    ttl_minutes: i32,
) -> Result<(), RepositoryError> {
    sqlx::query(
        r"
        INSERT INTO shop.email_otp (user_id, code_hash, expires_at)
        VALUES ($1, $2, NOW() + make_interval(mins => $3))
        ",
    )
    .bind(user_id)
    .bind(code_hash)
    .bind(ttl_minutes)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Positive seconds still to wait, given the signed remainder of the window.
fn cooldown_wait(seconds_left: Option<i64>) -> Option<i64> {
    seconds_left.filter(|secs| *secs > 0)
}

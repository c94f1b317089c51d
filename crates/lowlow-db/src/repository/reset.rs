//! # Password Reset Repository
//!
//! One live code per email.
//!
//! ```text
//! issue(email) ──► code (6 digits, expires_at = now + ttl)
//!                     │
//! consume(email, code, new password)
//!   ├── expired / already used / burned ──► InvalidResetCode
//!   ├── wrong code ──► failed_attempts + 1, InvalidResetCode
//!   │                  (MAX_RESET_ATTEMPTS wrong guesses burn the code)
//!   └── ok ──► users.password_hash replaced, code marked consumed
//! ```

use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::credentials::{generate_reset_code, hash_password};
use crate::error::DbResult;
use lowlow_core::validation::validate_password;
use lowlow_core::{timestamp, CoreError, ResetTicket, ValidationError, MAX_RESET_ATTEMPTS};

#[derive(Debug, sqlx::FromRow)]
struct ResetRow {
    code: String,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
    failed_attempts: i64,
}

/// Repository for password reset codes.
#[derive(Debug, Clone)]
pub struct ResetRepository {
    pool: SqlitePool,
}

impl ResetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ResetRepository { pool }
    }

    /// Issues a fresh code for an existing account, replacing any earlier one.
    pub async fn issue(&self, email: &str, ttl: Duration) -> DbResult<ResetTicket> {
        let email = email.trim();

        let known: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        if known == 0 {
            return Err(CoreError::UserNotFound(email.to_string()).into());
        }

        let ticket = ResetTicket {
            email: email.to_string(),
            code: generate_reset_code(),
            expires_at: timestamp() + ttl,
        };

        sqlx::query(
            "INSERT OR REPLACE INTO password_resets \
             (email, code, expires_at, consumed_at, failed_attempts) VALUES (?1, ?2, ?3, NULL, 0)",
        )
        .bind(&ticket.email)
        .bind(&ticket.code)
        .bind(ticket.expires_at)
        .execute(&self.pool)
        .await?;

        info!(email = %ticket.email, expires_at = %ticket.expires_at, "Password reset code issued");
        Ok(ticket)
    }

    /// Verifies and consumes a code, then replaces the password.
    pub async fn consume(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> DbResult<()> {
        validate_password(new_password)?;
        if new_password != confirm_password {
            return Err(ValidationError::Mismatch {
                field: "password".to_string(),
            }
            .into());
        }

        let email = email.trim();
        let now = timestamp();
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ResetRow>(
            "SELECT code, expires_at, consumed_at, failed_attempts \
             FROM password_resets WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&mut *tx)
        .await?;

        let live = row.filter(|r| {
            r.consumed_at.is_none() && now <= r.expires_at && r.failed_attempts < MAX_RESET_ATTEMPTS
        });
        let Some(ticket) = live else {
            warn!(email = %email, "Rejected password reset code");
            return Err(CoreError::InvalidResetCode.into());
        };

        if ticket.code != code.trim() {
            let attempts = ticket.failed_attempts + 1;
            let burned = attempts >= MAX_RESET_ATTEMPTS;
            sqlx::query(
                "UPDATE password_resets SET failed_attempts = ?2, \
                 consumed_at = CASE WHEN ?3 THEN ?4 ELSE consumed_at END WHERE email = ?1",
            )
            .bind(email)
            .bind(attempts)
            .bind(burned)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            warn!(email = %email, attempts, burned, "Wrong password reset code");
            return Err(CoreError::InvalidResetCode.into());
        }

        let updated =
            sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE email = ?1")
                .bind(email)
                .bind(hash_password(new_password)?)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        if updated.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(email.to_string()).into());
        }

        sqlx::query("UPDATE password_resets SET consumed_at = ?2 WHERE email = ?1")
            .bind(email)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(email = %email, "Password reset completed");
        Ok(())
    }
}

//! # Schema Migrations
//!
//! The store's SQL schema lives in `migrations/sqlite` and is compiled into
//! the binary, so a fresh database file and an old one both end up on the
//! same layout at start-up.
//!
//! ```text
//!   001_initial_schema.sql        users, cards, products, orders,
//!                                 order_items, partnership_requests
//!   002_session_inbox_resets.sql  session, password_resets
//!   003_reset_attempts.sql        failed reset-code guesses
//!
//!   open ──► _sqlx_migrations ──► apply what is missing ──► bootstrap
//! ```
//!
//! Applied files are checksummed by sqlx. Schema changes go into a new
//! numbered file.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static SCHEMA: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the schema up to date. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    let known = SCHEMA.migrations.len();
    debug!(known, "Applying schema migrations");

    SCHEMA.run(pool).await?;

    info!(known, "Schema up to date");
    Ok(())
}

/// `(embedded, applied)` migration counts.
///
/// A database that was never migrated reports zero applied.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1")
            .fetch_one(pool)
            .await
            .ok();

    Ok((SCHEMA.migrations.len(), applied.unwrap_or(0) as usize))
}

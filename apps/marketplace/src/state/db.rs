//! # Database State
//!
//! Wraps the `Database` handle the commands share.
//!
//! The `Database` from `lowlow-db` holds a `SqlitePool`, which is
//! thread-safe; commands run queries without extra locking.

use lowlow_db::Database;

#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    ///
    /// ```rust,ignore
    /// let restaurants = db_state.inner().users().list_by_role(Role::Business).await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }
}

//! # State Module
//!
//! What a [`MarketContext`](crate::context::MarketContext) is built from.
//!
//! | Type           | Holds                                   | Sharing              |
//! |----------------|-----------------------------------------|----------------------|
//! | `DbState`      | the `Database` handle                   | pool is `Clone`      |
//! | `SessionState` | `Arc<Mutex<Option<User>>>`              | short lock, no await |
//! | `ConfigState`  | balances, avatar limit, reset lifetime  | read-only            |
//!
//! The persisted copy of the session lives in the `session` table; the
//! mirror here is what commands read.

mod config;
mod db;
mod session;

pub use config::ConfigState;
pub use db::DbState;
pub use session::SessionState;

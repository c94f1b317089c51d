//! # lowlow-db
//!
//! SQLite persistence for the LowLow marketplace: accounts, payment
//! cards, restaurant menus, orders, the partnership inbox, the saved
//! session and password resets.
//!
//! ```text
//!   marketplace command
//!          │
//!          ▼
//!   Database ── users() cards() products() orders() ...   repository/
//!      │                                                   legacy.rs
//!      │  SqlitePool (WAL, foreign keys on)                bootstrap.rs
//!      ▼
//!   lowlow.db   (":memory:" in tests)
//! ```
//!
//! Money-moving writes (checkout, balance changes) run inside a single
//! transaction and re-check the rule with a guarded `UPDATE`, so a lost
//! race surfaces as [`DbError::Domain`] instead of a negative balance.
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`credentials`] - Password hashing and reset codes
//! - [`repository`] - Repository implementations
//! - [`legacy`] - Browser local-storage snapshot import/export
//! - [`bootstrap`] - Default admins and the demo restaurant
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lowlow_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("lowlow.db")).await?;
//! lowlow_db::bootstrap::ensure_defaults(&db, &Default::default()).await?;
//!
//! let user = db.users().authenticate("admin@lowlow.com", "admin123").await?;
//! ```

pub mod bootstrap;
pub mod credentials;
pub mod error;
pub mod legacy;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::card::CardRepository;
pub use repository::order::OrderRepository;
pub use repository::partnership::PartnershipRepository;
pub use repository::product::ProductRepository;
pub use repository::reset::ResetRepository;
pub use repository::session::SessionRepository;
pub use repository::user::UserRepository;

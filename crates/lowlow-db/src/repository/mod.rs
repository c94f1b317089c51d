//! # Repository Module
//!
//! One repository per table group. Every repository holds a pool clone and
//! is created on demand by [`crate::Database`].
//!
//! ## Transactions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Multi-row operations run on ONE transaction connection:               │
//! │                                                                         │
//! │  let mut tx = pool.begin().await?;                                     │
//! │  helper(&mut *tx, ..).await?;   ← executor-generic helpers             │
//! │  helper(&mut *tx, ..).await?;                                          │
//! │  tx.commit().await?;            ← dropped tx = rollback                 │
//! │                                                                         │
//! │  Never call a pool-based repository method while a tx is open:         │
//! │  the in-memory pool has a single connection.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`UserRepository`](user::UserRepository) - Accounts, credentials, balances
//! - [`CardRepository`](card::CardRepository) - Payment cards and the default flag
//! - [`ProductRepository`](product::ProductRepository) - Catalogs and storefront
//! - [`OrderRepository`](order::OrderRepository) - Checkout and order lifecycle
//! - [`PartnershipRepository`](partnership::PartnershipRepository) - Partner inbox
//! - [`SessionRepository`](session::SessionRepository) - Persisted login
//! - [`ResetRepository`](reset::ResetRepository) - Password reset codes

pub mod card;
pub mod order;
pub mod partnership;
pub mod product;
pub mod reset;
pub mod session;
pub mod user;

//! # lowlow-core: Pure Domain Logic for the LowLow Marketplace
//!
//! This crate holds every business rule of the marketplace store as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      LowLow Store Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Browser front end (out of scope)                │   │
//! │  │   Login ──► Restaurants ──► Cart ──► Account / Business / Admin │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ commands                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              MarketContext (apps/marketplace)                   │   │
//! │  │    login, register, create_order, set_default_card, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lowlow-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌────────┐ ┌──────────┐ ┌────────┐ ┌────────────┐ │   │
//! │  │  │  types  │ │ money  │ │ checkout │ │ cards  │ │ validation │ │   │
//! │  │  │  User   │ │ Money  │ │  Plan    │ │default │ │   rules    │ │   │
//! │  │  │  Order  │ │ (tiyn) │ │  Stock   │ │  flag  │ │   checks   │ │   │
//! │  │  └─────────┘ └────────┘ └──────────┘ └────────┘ └────────────┘ │   │
//! │  │  ┌─────────┐ ┌──────────┐                                      │   │
//! │  │  │ access  │ │ keyspace │   NO I/O • NO DATABASE • PURE        │   │
//! │  │  └─────────┘ └──────────┘                                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  lowlow-db (Storage Layer)                      │   │
//! │  │           SQLite queries, migrations, repositories              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (User, Order, Card, Product, ...)
//! - [`money`] - Money type with integer arithmetic in tiyn
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation rules
//! - [`cards`] - Default-card bookkeeping
//! - [`checkout`] - Order planning (totals, funds, stock decrements)
//! - [`access`] - Route access gate by role
//! - [`keyspace`] - Key namespace of the legacy browser storage
//!
//! ## Example Usage
//!
//! ```rust
//! use lowlow_core::money::Money;
//!
//! // 1 250 tenge and 50 tiyn
//! let price = Money::from_major_minor(1250, 50);
//! assert_eq!(price.tiyn(), 125_050);
//! assert_eq!((price * 2_i32).tiyn(), 250_100);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod cards;
pub mod checkout;
pub mod error;
pub mod keyspace;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

use chrono::{DateTime, SubsecRound, Utc};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines in a single order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// The storefront caps the cart stepper at the product stock, but a typo
/// (1000 instead of 10) should never reach checkout.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest price a single dish may carry, in tenge.
///
/// Together with the two limits above this keeps every order total far
/// inside `i64` tiyn.
pub const MAX_PRICE_TENGE: i64 = 10_000_000;

/// Minimum password length for new accounts.
///
/// Seeded demo accounts predate this rule and are not re-validated.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Wrong guesses a password-reset code survives before it is burned.
pub const MAX_RESET_ATTEMPTS: i64 = 5;

/// Default upper bound for an inline (data URL) avatar, in bytes.
///
/// Browser storage quota was the original limit; anything larger was dropped
/// instead of failing the save. The store keeps that degradation.
pub const DEFAULT_AVATAR_MAX_BYTES: usize = 512 * 1024;

/// Starting balance of a new customer account, in tenge.
pub const DEFAULT_ACCOUNT_BALANCE_TENGE: i64 = 50_000;

/// Simulated balance loaded onto a newly added card, in tenge.
pub const DEFAULT_CARD_BALANCE_TENGE: i64 = 100_000;

/// Version of the exported legacy snapshot shape.
pub const LEGACY_SCHEMA_VERSION: u32 = 1;

/// Current time truncated to milliseconds.
///
/// Every timestamp the store writes goes through here so that a record read
/// back from SQLite compares equal to the one that was written.
pub fn timestamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Generates a new entity ID (UUID v4).
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

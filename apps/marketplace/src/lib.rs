//! # LowLow Marketplace Library
//!
//! Session and command layer of the LowLow food marketplace. A UI (or the
//! `lowlow` binary) opens a [`MarketContext`] and calls the functions in
//! [`commands`] with it.
//!
//! ## Module Organization
//! ```text
//! lowlow_marketplace/
//! ├── lib.rs            ◄─── You are here (exports, logging setup)
//! ├── context.rs        ◄─── MarketContext: store + session + config
//! ├── state/
//! │   ├── mod.rs        ◄─── State type exports
//! │   ├── db.rs         ◄─── Database state wrapper
//! │   ├── session.rs    ◄─── Logged-in user mirror
//! │   └── config.rs     ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs        ◄─── Command exports, company resolution
//! │   ├── auth.rs       ◄─── Login, registration, password reset
//! │   ├── users.rs      ◄─── Profiles, balances, restaurants
//! │   ├── orders.rs     ◄─── Checkout and order status
//! │   ├── cards.rs      ◄─── Payment cards
//! │   ├── products.rs   ◄─── Catalogs and storefront
//! │   ├── partnership.rs◄─── Partnership inbox
//! │   ├── navigation.rs ◄─── Route gate
//! │   └── legacy.rs     ◄─── Browser storage import/export
//! └── error.rs          ◄─── API error type for commands
//! ```
//!
//! ## Example
//! ```rust,ignore
//! use lowlow_marketplace::{commands, ConfigState, MarketContext};
//!
//! let ctx = MarketContext::open(ConfigState::from_env()).await?;
//! ctx.initialize().await?;
//!
//! commands::auth::login(&ctx, "admin@lowlow.com".into(), "admin123".into()).await?;
//! let users = commands::users::list_users(&ctx).await?;
//! ```

pub mod commands;
pub mod context;
pub mod error;
pub mod state;

pub use context::MarketContext;
pub use error::{ApiError, ErrorCode};
pub use state::ConfigState;

use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=lowlow_db=trace` - Trace the storage layer only
/// - Default: `info`, `debug` for the lowlow crates, `warn` for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lowlow=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

//! # Commands Module
//!
//! Everything a UI can ask the store to do.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports, shared helpers)
//! ├── auth.rs         ◄─── Login, registration, logout, password reset
//! ├── users.rs        ◄─── Profiles, balances, admin user management
//! ├── orders.rs       ◄─── Checkout, order status, company statistics
//! ├── cards.rs        ◄─── Payment cards of the session user
//! ├── products.rs     ◄─── Business catalogs and the public storefront
//! ├── partnership.rs  ◄─── Partnership inbox
//! ├── navigation.rs   ◄─── Route access gate
//! └── legacy.rs       ◄─── Browser storage import/export
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  let ctx = MarketContext::open(ConfigState::from_env()).await?;         │
//! │  ctx.initialize().await?;                                               │
//! │                                                                         │
//! │  commands::orders::create_order(&ctx, cart).await                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  1. ctx.require_role(Role::User, ..)   ◄── session mirror              │
//! │  2. ctx.db().orders().place(..)        ◄── one transaction             │
//! │  3. ctx.reload_session_user(..)        ◄── balances changed            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Result<Order, ApiError>  (JSON-serialisable either way)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands take owned arguments so a front end can deserialize straight
//! into them.

pub mod auth;
pub mod cards;
pub mod legacy;
pub mod navigation;
pub mod orders;
pub mod partnership;
pub mod products;
pub mod users;

use tracing::warn;

use crate::error::ApiError;
use lowlow_core::{CoreError, Role, User, ValidationError};

/// Resolves whose catalog or order book `actor` is working on.
///
/// A business always works on its own; an admin names the company; any
/// other role is refused.
pub(crate) fn target_company(actor: &User, company_id: Option<String>) -> Result<String, ApiError> {
    match actor.role {
        Role::Business => match company_id {
            Some(id) if id != actor.id => {
                warn!(user_id = %actor.id, company_id = %id, "Business reached for another catalog");
                Err(CoreError::forbidden("manage another company", actor.role).into())
            }
            _ => Ok(actor.id.clone()),
        },
        Role::Admin => company_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ValidationError::Required {
                    field: "companyId".to_string(),
                }
                .into()
            }),
        Role::User => Err(CoreError::forbidden("manage a company", actor.role).into()),
    }
}

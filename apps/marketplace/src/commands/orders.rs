//! # Order Commands
//!
//! Checkout and the order book.
//!
//! ## Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_order(cart)                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session user has role `user`? ── no ──► PERMISSION_DENIED              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  orders().place()  ── ONE transaction ─────────────────────────────┐    │
//! │     debit default card ─► debit account ─► insert order + items    │    │
//! │     ─► clamp stock at zero                                         │    │
//! │       │                         any failure: nothing written ◄─────┘    │
//! │       ▼                                                                 │
//! │  session mirror reloaded (new balance)                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::warn;

use super::target_company;
use crate::context::MarketContext;
use crate::error::ApiError;
use lowlow_core::{CoreError, NewOrder, Order, OrderStats, OrderStatus, Role};

/// Places the session customer's order and pays with their default card.
pub async fn create_order(ctx: &MarketContext, order: NewOrder) -> Result<Order, ApiError> {
    let buyer = ctx.require_role(Role::User, "place orders")?;

    let placed = ctx.db().orders().place(&buyer.id, &order).await?;
    ctx.reload_session_user(&buyer.id).await?;
    Ok(placed)
}

/// Completes or cancels a pending order.
///
/// Allowed for the company that received it and for admins.
pub async fn update_order_status(
    ctx: &MarketContext,
    id: String,
    status: OrderStatus,
) -> Result<Order, ApiError> {
    let actor = ctx.require_user()?;
    let order = ctx.db().orders().get(&id).await?;

    let owns = actor.role == Role::Business && actor.id == order.company_id;
    if !(owns || actor.is_admin()) {
        warn!(user_id = %actor.id, order_id = %id, "Order status change refused");
        return Err(CoreError::forbidden("change order status", actor.role).into());
    }

    Ok(ctx.db().orders().update_status(&id, status).await?)
}

/// The session user's purchases, newest first.
pub async fn user_orders(ctx: &MarketContext) -> Result<Vec<Order>, ApiError> {
    let user = ctx.require_user()?;
    Ok(ctx.db().orders().list_for_user(&user.id).await?)
}

/// Orders received by a company, newest first.
pub async fn company_orders(
    ctx: &MarketContext,
    company_id: Option<String>,
) -> Result<Vec<Order>, ApiError> {
    let actor = ctx.require_user()?;
    let company_id = target_company(&actor, company_id)?;
    Ok(ctx.db().orders().list_for_company(&company_id).await?)
}

pub async fn company_stats(
    ctx: &MarketContext,
    company_id: Option<String>,
) -> Result<OrderStats, ApiError> {
    let actor = ctx.require_user()?;
    let company_id = target_company(&actor, company_id)?;
    Ok(ctx.db().orders().company_stats(&company_id).await?)
}

/// Every order in the store, newest first.
pub async fn list_orders(ctx: &MarketContext) -> Result<Vec<Order>, ApiError> {
    ctx.require_role(Role::Admin, "list orders")?;
    Ok(ctx.db().orders().list_all().await?)
}

//! # Card Commands
//!
//! Payment cards of the logged-in user. Every command works on the session
//! user's own cards only.
//!
//! Whatever the sequence of calls, a user with cards has exactly one
//! default; `lowlow-db` moves the flag inside a transaction.

use chrono::Utc;

use crate::context::MarketContext;
use crate::error::ApiError;
use lowlow_core::{Card, CardUpdate, NewCard};

/// Default first, then oldest first.
pub async fn list_cards(ctx: &MarketContext) -> Result<Vec<Card>, ApiError> {
    let user = ctx.require_user()?;
    Ok(ctx.db().cards().list_for_user(&user.id).await?)
}

/// Adds a card loaded with the configured simulated balance.
pub async fn add_card(ctx: &MarketContext, form: NewCard) -> Result<Card, ApiError> {
    let user = ctx.require_user()?;
    let today = Utc::now().date_naive();
    Ok(ctx
        .db()
        .cards()
        .add(&user.id, &form, today, ctx.config().card_balance)
        .await?)
}

pub async fn update_card(ctx: &MarketContext, id: String, form: CardUpdate) -> Result<Card, ApiError> {
    let user = ctx.require_user()?;
    let today = Utc::now().date_naive();
    Ok(ctx.db().cards().update(&user.id, &id, &form, today).await?)
}

pub async fn set_default_card(ctx: &MarketContext, id: String) -> Result<Vec<Card>, ApiError> {
    let user = ctx.require_user()?;
    Ok(ctx.db().cards().set_default(&user.id, &id).await?)
}

/// Removes a card and returns the ones left.
pub async fn delete_card(ctx: &MarketContext, id: String) -> Result<Vec<Card>, ApiError> {
    let user = ctx.require_user()?;
    Ok(ctx.db().cards().delete(&user.id, &id).await?)
}

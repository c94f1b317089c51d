//! # Product Commands
//!
//! Catalog management for businesses (and admins acting for them), plus the
//! public storefront.
//!
//! ## Catalog Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  business ──► its own catalog  (company_id ignored or must match)       │
//! │  admin    ──► any catalog      (company_id required)                    │
//! │  user     ──► PERMISSION_DENIED                                         │
//! │                                                                         │
//! │  storefront / categories ──► anyone, active products only              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use super::target_company;
use crate::context::MarketContext;
use crate::error::ApiError;
use lowlow_core::{NewProduct, Product, ProductPatch};

/// Whole catalog, inactive products included, oldest first.
pub async fn list_my_products(
    ctx: &MarketContext,
    company_id: Option<String>,
) -> Result<Vec<Product>, ApiError> {
    let actor = ctx.require_user()?;
    let company_id = target_company(&actor, company_id)?;
    Ok(ctx.db().products().list_for_company(&company_id).await?)
}

pub async fn add_product(
    ctx: &MarketContext,
    company_id: Option<String>,
    form: NewProduct,
) -> Result<Product, ApiError> {
    let actor = ctx.require_user()?;
    let company_id = target_company(&actor, company_id)?;
    Ok(ctx.db().products().add(&company_id, form).await?)
}

pub async fn update_product(
    ctx: &MarketContext,
    company_id: Option<String>,
    id: String,
    patch: ProductPatch,
) -> Result<Product, ApiError> {
    let actor = ctx.require_user()?;
    let company_id = target_company(&actor, company_id)?;
    Ok(ctx.db().products().update(&company_id, &id, &patch).await?)
}

pub async fn delete_product(
    ctx: &MarketContext,
    company_id: Option<String>,
    id: String,
) -> Result<(), ApiError> {
    let actor = ctx.require_user()?;
    let company_id = target_company(&actor, company_id)?;
    Ok(ctx.db().products().delete(&company_id, &id).await?)
}

/// Flips a product between active and inactive.
pub async fn toggle_product_status(
    ctx: &MarketContext,
    company_id: Option<String>,
    id: String,
) -> Result<Product, ApiError> {
    let actor = ctx.require_user()?;
    let company_id = target_company(&actor, company_id)?;
    Ok(ctx.db().products().toggle_status(&company_id, &id).await?)
}

/// Active products of a restaurant.
///
/// `category` must match exactly; `query` is a case-insensitive substring
/// of name, ingredients or category.
pub async fn storefront(
    ctx: &MarketContext,
    company_id: String,
    category: Option<String>,
    query: Option<String>,
) -> Result<Vec<Product>, ApiError> {
    debug!(company_id = %company_id, ?category, ?query, "Storefront");
    Ok(ctx
        .db()
        .products()
        .storefront(&company_id, category.as_deref(), query.as_deref())
        .await?)
}

/// Categories that have at least one active product, sorted.
pub async fn categories(ctx: &MarketContext, company_id: String) -> Result<Vec<String>, ApiError> {
    Ok(ctx.db().products().categories(&company_id).await?)
}

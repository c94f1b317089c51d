//! # Product Repository
//!
//! One catalog per business account plus the public storefront view.
//!
//! ## Key Operations
//! - Catalog CRUD scoped by `company_id`
//! - Active/inactive toggle
//! - Storefront filtering by category and free-text query
//!
//! ## Storefront Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SQL: active products of the company                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  category == selected (exact)     ← skipped when None                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Product::matches_query(q)        ← Unicode lowercase, in Rust         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! SQLite `LOWER()` only folds ASCII, so Cyrillic names are matched in Rust.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use lowlow_core::{
    new_id, timestamp, CoreError, Money, NewProduct, Product, ProductPatch, ProductStatus,
};

const PRODUCT_COLUMNS: &str = r#"
    id, company_id, name, description, ingredients, price, category,
    quantity, status, image, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    company_id: String,
    name: String,
    description: Option<String>,
    ingredients: Option<String>,
    price: i64,
    category: String,
    quantity: i64,
    status: ProductStatus,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            company_id: row.company_id,
            name: row.name,
            description: row.description,
            ingredients: row.ingredients,
            price: Money::from_tiyn(row.price),
            category: row.category,
            quantity: row.quantity,
            status: row.status,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// =============================================================================
// Executor-generic helpers
// =============================================================================

pub(crate) async fn fetch_catalog<'e, E>(executor: E, company_id: &str) -> DbResult<Vec<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM products WHERE company_id = ?1 ORDER BY created_at, rowid",
        PRODUCT_COLUMNS
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql)
        .bind(company_id)
        .fetch_all(executor)
        .await?;
    Ok(rows.into_iter().map(Product::from).collect())
}

pub(crate) async fn insert_product<'e, E>(executor: E, product: &Product) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO products (
            id, company_id, name, description, ingredients, price, category,
            quantity, status, image, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&product.id)
    .bind(&product.company_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.ingredients)
    .bind(product.price.tiyn())
    .bind(&product.category)
    .bind(product.quantity)
    .bind(product.status)
    .bind(&product.image)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Sets the stock level of one product.
pub(crate) async fn set_stock<'e, E>(executor: E, product_id: &str, quantity: i64) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE products SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(quantity.max(0))
        .bind(timestamp())
        .execute(executor)
        .await?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog products.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Every product of a company, active or not, oldest first.
    pub async fn list_for_company(&self, company_id: &str) -> DbResult<Vec<Product>> {
        debug!(company_id = %company_id, "Listing catalog");
        fetch_catalog(&self.pool, company_id).await
    }

    /// Gets a product within a company's catalog.
    pub async fn get(&self, company_id: &str, id: &str) -> DbResult<Product> {
        let sql = format!(
            "SELECT {} FROM products WHERE id = ?1 AND company_id = ?2",
            PRODUCT_COLUMNS
        );
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Product::from)
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()).into())
    }

    /// Adds a product to a company's catalog.
    pub async fn add(&self, company_id: &str, form: NewProduct) -> DbResult<Product> {
        form.validate()?;

        let product = form.into_product(new_id(), company_id.to_string(), timestamp());
        insert_product(&self.pool, &product).await?;

        info!(company_id = %company_id, product_id = %product.id, name = %product.name, "Product added");
        Ok(product)
    }

    /// Applies a partial update.
    pub async fn update(&self, company_id: &str, id: &str, patch: &ProductPatch) -> DbResult<Product> {
        patch.validate()?;

        let mut product = self.get(company_id, id).await?;
        patch.apply(&mut product);
        product.updated_at = timestamp();

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?3, description = ?4, ingredients = ?5, price = ?6, category = ?7,
                quantity = ?8, status = ?9, image = ?10, updated_at = ?11
            WHERE id = ?1 AND company_id = ?2
            "#,
        )
        .bind(&product.id)
        .bind(&product.company_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.ingredients)
        .bind(product.price.tiyn())
        .bind(&product.category)
        .bind(product.quantity)
        .bind(product.status)
        .bind(&product.image)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(product_id = %id, "Product updated");
        Ok(product)
    }

    pub async fn delete(&self, company_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND company_id = ?2")
            .bind(id)
            .bind(company_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }
        info!(company_id = %company_id, product_id = %id, "Product deleted");
        Ok(())
    }

    /// Flips active ↔ inactive.
    pub async fn toggle_status(&self, company_id: &str, id: &str) -> DbResult<Product> {
        let product = self.get(company_id, id).await?;
        let patch = ProductPatch {
            status: Some(product.status.toggled()),
            ..Default::default()
        };
        self.update(company_id, id, &patch).await
    }

    /// Active products of a company, optionally narrowed by exact category
    /// and a case-insensitive query over name, ingredients and category.
    pub async fn storefront(
        &self,
        company_id: &str,
        category: Option<&str>,
        query: Option<&str>,
    ) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE company_id = ?1 AND status = ?2 ORDER BY created_at, rowid",
            PRODUCT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(company_id)
            .bind(ProductStatus::Active)
            .fetch_all(&self.pool)
            .await?;

        let category = category.map(str::trim).filter(|c| !c.is_empty());
        let query = query.unwrap_or("");

        Ok(rows
            .into_iter()
            .map(Product::from)
            .filter(|p| category.map_or(true, |c| p.category == c))
            .filter(|p| p.matches_query(query))
            .collect())
    }

    /// Distinct categories of a company's active products, sorted.
    pub async fn categories(&self, company_id: &str) -> DbResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM products WHERE company_id = ?1 AND status = ?2 ORDER BY category",
        )
        .bind(company_id)
        .bind(ProductStatus::Active)
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

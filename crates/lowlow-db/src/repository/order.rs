//! # Order Repository
//!
//! Checkout and the order lifecycle.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        place(buyer_id, cart)                            │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   ├── take the write lock (no-op UPDATE on the buyer)                  │
//! │   ├── load buyer, default card, company, company catalog               │
//! │   ├── CheckoutPlan::prepare()  ── rule fails ──► ROLLBACK, Err         │
//! │   ├── UPDATE cards  SET balance = balance - total  (guarded)           │
//! │   ├── UPDATE users  SET balance = balance - total  (guarded)           │
//! │   ├── INSERT orders + order_items                                      │
//! │   └── UPDATE products SET quantity = clamp(stock - qty, 0)             │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The guarded updates (`WHERE balance >= total`) re-check funds at write
//! time; a zero row count aborts the whole checkout.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::card::fetch_default_card;
use crate::repository::product::{fetch_catalog, set_stock};
use crate::repository::user::fetch_user;
use lowlow_core::checkout::CheckoutPlan;
use lowlow_core::error::FundsSource;
use lowlow_core::{
    new_id, timestamp, CoreError, Money, NewOrder, Order, OrderItem, OrderStats, OrderStatus,
};

const ORDER_COLUMNS: &str = r#"
    id, user_id, company_id, company_name, customer_name, customer_phone,
    total, status, card_last4, payment_method, created_at, updated_at
"#;

const NEWEST_FIRST: &str = "ORDER BY created_at DESC, rowid DESC";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    user_id: String,
    company_id: String,
    company_name: String,
    customer_name: String,
    customer_phone: Option<String>,
    total: i64,
    status: OrderStatus,
    card_last4: Option<String>,
    payment_method: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            company_id: self.company_id,
            company_name: self.company_name,
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            items,
            total: Money::from_tiyn(self.total),
            status: self.status,
            card_last4: self.card_last4,
            payment_method: self.payment_method,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    order_id: String,
    product_id: String,
    name: String,
    quantity: i64,
    price: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price: Money::from_tiyn(row.price),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total: i64,
    pending: i64,
    completed: i64,
    cancelled: i64,
    revenue: i64,
}

// =============================================================================
// Executor-generic helpers
// =============================================================================

/// Inserts an order and its lines. Must run inside a transaction.
pub(crate) async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, user_id, company_id, company_name, customer_name, customer_phone,
            total, status, card_last4, payment_method, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&order.id)
    .bind(&order.user_id)
    .bind(&order.company_id)
    .bind(&order.company_name)
    .bind(&order.customer_name)
    .bind(&order.customer_phone)
    .bind(order.total.tiyn())
    .bind(order.status)
    .bind(&order.card_last4)
    .bind(&order.payment_method)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *conn)
    .await?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (order_id, position, product_id, name, quantity, price)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&order.id)
        .bind(position as i64)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price.tiyn())
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_items<'e, E>(executor: E, filter: &str, value: &str) -> DbResult<HashMap<String, Vec<OrderItem>>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        SELECT order_id, product_id, name, quantity, price
        FROM order_items
        WHERE order_id IN (SELECT id FROM orders {})
        ORDER BY order_id, position
        "#,
        filter
    );
    let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
        .bind(value)
        .fetch_all(executor)
        .await?;

    let mut items: HashMap<String, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        items.entry(row.order_id.clone()).or_default().push(row.into());
    }
    Ok(items)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Places an order for `buyer_id`. See the module docs for the
    /// transaction layout.
    ///
    /// ## Errors
    /// - `UserNotFound` - buyer or company missing
    /// - `PermissionDenied` - buyer is not a customer
    /// - `EmptyOrder`, `OrderTooLarge`, `QuantityTooLarge`, `TotalMismatch`
    /// - `NoDefaultCard`, `InsufficientFunds`
    ///
    /// On any error nothing is written.
    pub async fn place(&self, buyer_id: &str, order: &NewOrder) -> DbResult<Order> {
        debug!(buyer_id = %buyer_id, company_id = %order.company_id, lines = order.items.len(), "Placing order");

        let mut tx = self.pool.begin().await?;

        // Write lock before the first read: a deferred read-then-write
        // upgrade in WAL fails with SQLITE_BUSY instead of waiting.
        sqlx::query("UPDATE users SET balance = balance WHERE id = ?1")
            .bind(buyer_id)
            .execute(&mut *tx)
            .await?;

        let buyer = fetch_user(&mut *tx, buyer_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(buyer_id.to_string()))?;
        let company = fetch_user(&mut *tx, &order.company_id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(order.company_id.clone()))?;
        let card = fetch_default_card(&mut *tx, buyer_id).await?;
        let catalog = fetch_catalog(&mut *tx, &order.company_id).await?;

        let plan = CheckoutPlan::prepare(&buyer, card.as_ref(), &company, &catalog, order)?;
        let total = plan.total.tiyn();

        let debited = sqlx::query(
            "UPDATE cards SET balance = balance - ?2 WHERE id = ?1 AND balance >= ?2",
        )
        .bind(&plan.card_id)
        .bind(total)
        .execute(&mut *tx)
        .await?;
        if debited.rows_affected() == 0 {
            warn!(card_id = %plan.card_id, "Card balance changed during checkout");
            return Err(CoreError::InsufficientFunds {
                funds: FundsSource::Card,
                available: plan.card_balance_after.tiyn() + total,
                required: total,
            }
            .into());
        }

        let now = timestamp();
        let debited = sqlx::query(
            "UPDATE users SET balance = balance - ?2, updated_at = ?3 WHERE id = ?1 AND balance >= ?2",
        )
        .bind(buyer_id)
        .bind(total)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if debited.rows_affected() == 0 {
            warn!(buyer_id = %buyer_id, "Account balance changed during checkout");
            return Err(CoreError::InsufficientFunds {
                funds: FundsSource::Account,
                available: plan.user_balance_after.tiyn() + total,
                required: total,
            }
            .into());
        }

        let placed = plan.to_order(new_id(), now);
        insert_order(&mut tx, &placed).await?;

        for update in &plan.stock {
            set_stock(&mut *tx, &update.product_id, update.quantity).await?;
        }

        tx.commit().await?;

        info!(
            order_id = %placed.id,
            buyer_id = %buyer_id,
            company_id = %placed.company_id,
            total = %placed.total,
            "Order placed"
        );
        Ok(placed)
    }

    pub async fn get(&self, id: &str) -> DbResult<Order> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::from(CoreError::OrderNotFound(id.to_string())))?;

        let mut items = fetch_items(&self.pool, "WHERE id = ?1", id).await?;
        let lines = items.remove(id).unwrap_or_default();
        Ok(row.into_order(lines))
    }

    /// Orders of a buyer, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        self.list_where("WHERE user_id = ?1", user_id).await
    }

    /// Orders received by a company, newest first.
    pub async fn list_for_company(&self, company_id: &str) -> DbResult<Vec<Order>> {
        self.list_where("WHERE company_id = ?1", company_id).await
    }

    /// Every order, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        // `?1 IS ?1` keeps the single bind of list_where
        self.list_where("WHERE ?1 IS ?1", "").await
    }

    async fn list_where(&self, filter: &str, value: &str) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {} FROM orders {} {}", ORDER_COLUMNS, filter, NEWEST_FIRST);
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(value)
            .fetch_all(&self.pool)
            .await?;

        let mut items = fetch_items(&self.pool, filter, value).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect())
    }

    /// Moves an order along its lifecycle.
    ///
    /// The UPDATE is guarded on the current status so two concurrent
    /// transitions cannot both succeed.
    pub async fn update_status(&self, id: &str, next: OrderStatus) -> DbResult<Order> {
        let order = self.get(id).await?;
        order.status.transition(id, next)?;

        let result = sqlx::query(
            "UPDATE orders SET status = ?2, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(next)
        .bind(timestamp())
        .bind(order.status)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get(id).await?;
            return Err(CoreError::InvalidStatusTransition {
                order_id: id.to_string(),
                from: current.status.to_string(),
                to: next.to_string(),
            }
            .into());
        }

        info!(order_id = %id, from = %order.status, to = %next, "Order status changed");
        self.get(id).await
    }

    /// Counters by status plus revenue of completed orders.
    pub async fn company_stats(&self, company_id: &str) -> DbResult<OrderStats> {
        let row = sqlx::query_as::<_, StatsRow>(
            r#"
            SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed,
                COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled,
                COALESCE(SUM(CASE WHEN status = 'completed' THEN total ELSE 0 END), 0) AS revenue
            FROM orders
            WHERE company_id = ?1
            "#,
        )
        .bind(company_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(OrderStats {
            total: row.total,
            pending: row.pending,
            completed: row.completed,
            cancelled: row.cancelled,
            revenue: Money::from_tiyn(row.revenue),
        })
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use chrono::NaiveDate;
    use lowlow_core::*;

    struct Fixture {
        db: Database,
        buyer: User,
        company: User,
        roll: Product,
        soup: Product,
    }

    async fn fixture(account: i64, card: i64) -> Fixture {
        fixture_on(Database::new(DbConfig::in_memory()).await.unwrap(), account, card).await
    }

    async fn fixture_on(db: Database, account: i64, card: i64) -> Fixture {
        let buyer = db
            .users()
            .register(
                &RegistrationForm {
                    nickname: "Айгерим".to_string(),
                    email: "buyer@lowlow.kz".to_string(),
                    password: "secret1".to_string(),
                    confirm_password: "secret1".to_string(),
                    agree_terms: true,
                },
                Money::from_tenge(account),
            )
            .await
            .unwrap();
        db.cards()
            .add(
                &buyer.id,
                &NewCard {
                    number: "4111111111114242".to_string(),
                    card_holder: "AIGERIM".to_string(),
                    expiry: "12/29".to_string(),
                    cvv: "123".to_string(),
                    make_default: false,
                },
                NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
                Money::from_tenge(card),
            )
            .await
            .unwrap();

        let company = db
            .users()
            .create_business(NewBusiness {
                company_name: "Okadzaki Sushi".to_string(),
                email: "shop@lowlow.kz".to_string(),
                password: "okadzaki123".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let add = |name: &str, price: i64, quantity: i64| NewProduct {
            name: name.to_string(),
            price: Money::from_tenge(price),
            category: "Роллы".to_string(),
            quantity,
            ..Default::default()
        };
        let roll = db.products().add(&company.id, add("Филадельфия", 2_000, 5)).await.unwrap();
        let soup = db.products().add(&company.id, add("Мисо", 1_000, 1)).await.unwrap();

        Fixture { db, buyer, company, roll, soup }
    }

    fn cart(f: &Fixture, lines: &[(&Product, i64)]) -> NewOrder {
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|(p, q)| OrderItem {
                product_id: p.id.clone(),
                name: p.name.clone(),
                quantity: *q,
                price: p.price,
            })
            .collect();
        NewOrder {
            company_id: f.company.id.clone(),
            total: items.iter().map(OrderItem::line_total).sum(),
            items,
        }
    }

    #[tokio::test]
    async fn test_checkout_debits_and_clamps_stock() {
        let f = fixture(10_000, 50_000).await;
        let order = cart(&f, &[(&f.roll, 2), (&f.soup, 3)]);

        let placed = f.db.orders().place(&f.buyer.id, &order).await.unwrap();
        assert_eq!(placed.total, Money::from_tenge(7_000));
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.card_last4.as_deref(), Some("4242"));

        let buyer = f.db.users().require(&f.buyer.id).await.unwrap();
        assert_eq!(buyer.balance, Money::from_tenge(3_000));

        let card = f.db.cards().default_for_user(&f.buyer.id).await.unwrap().unwrap();
        assert_eq!(card.balance, Money::from_tenge(43_000));

        let roll = f.db.products().get(&f.company.id, &f.roll.id).await.unwrap();
        let soup = f.db.products().get(&f.company.id, &f.soup.id).await.unwrap();
        assert_eq!(roll.quantity, 3);
        assert_eq!(soup.quantity, 0);

        assert_eq!(f.db.orders().get(&placed.id).await.unwrap(), placed);
    }

    #[tokio::test]
    async fn test_insufficient_card_funds_changes_nothing() {
        let f = fixture(10_000, 1_999).await;
        let order = cart(&f, &[(&f.roll, 1)]);

        let err = f.db.orders().place(&f.buyer.id, &order).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientFunds { .. })
        ));

        assert_eq!(f.db.orders().count().await.unwrap(), 0);
        let buyer = f.db.users().require(&f.buyer.id).await.unwrap();
        assert_eq!(buyer.balance, Money::from_tenge(10_000));
        let card = f.db.cards().default_for_user(&f.buyer.id).await.unwrap().unwrap();
        assert_eq!(card.balance, Money::from_tenge(1_999));
        let roll = f.db.products().get(&f.company.id, &f.roll.id).await.unwrap();
        assert_eq!(roll.quantity, 5);
    }

    #[tokio::test]
    async fn test_insufficient_account_funds_changes_nothing() {
        let f = fixture(500, 50_000).await;
        let order = cart(&f, &[(&f.roll, 1)]);

        let err = f.db.orders().place(&f.buyer.id, &order).await.unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientFunds { .. })
        ));
        let card = f.db.cards().default_for_user(&f.buyer.id).await.unwrap().unwrap();
        assert_eq!(card.balance, Money::from_tenge(50_000));
    }

    #[tokio::test]
    async fn test_no_default_card() {
        let f = fixture(10_000, 50_000).await;
        let card = f.db.cards().default_for_user(&f.buyer.id).await.unwrap().unwrap();
        f.db.cards().delete(&f.buyer.id, &card.id).await.unwrap();

        let err = f.db.orders().place(&f.buyer.id, &cart(&f, &[(&f.roll, 1)])).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::NoDefaultCard { .. })));
    }

    #[tokio::test]
    async fn test_status_lifecycle_and_stats() {
        let f = fixture(100_000, 100_000).await;
        let orders = f.db.orders();

        let first = orders.place(&f.buyer.id, &cart(&f, &[(&f.roll, 1)])).await.unwrap();
        let second = orders.place(&f.buyer.id, &cart(&f, &[(&f.roll, 2)])).await.unwrap();
        orders.place(&f.buyer.id, &cart(&f, &[(&f.soup, 1)])).await.unwrap();

        let done = orders.update_status(&first.id, OrderStatus::Completed).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        orders.update_status(&second.id, OrderStatus::Cancelled).await.unwrap();

        let err = orders
            .update_status(&first.id, OrderStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InvalidStatusTransition { .. })
        ));

        let stats = orders.company_stats(&f.company.id).await.unwrap();
        assert_eq!(
            stats,
            OrderStats {
                total: 3,
                pending: 1,
                completed: 1,
                cancelled: 1,
                revenue: Money::from_tenge(2_000),
            }
        );

        let mine = orders.list_for_user(&f.buyer.id).await.unwrap();
        assert_eq!(mine.len(), 3);
        assert_eq!(mine[2].id, first.id);
        assert!(mine.iter().all(|o| !o.items.is_empty()));

        assert_eq!(orders.list_for_company(&f.company.id).await.unwrap().len(), 3);
        assert_eq!(orders.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_on_a_file_store() {
        let path = std::env::temp_dir().join(format!("lowlow-orders-{}.db", new_id()));
        let config = DbConfig::new(path.clone()).max_connections(4);
        let f = fixture_on(Database::new(config).await.unwrap(), 100_000, 100_000).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let orders = f.db.orders();
            let buyer_id = f.buyer.id.clone();
            let order = cart(&f, &[(&f.soup, 1)]);
            handles.push(tokio::spawn(async move { orders.place(&buyer_id, &order).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(f.db.orders().count().await.unwrap(), 8);
        let buyer = f.db.users().require(&f.buyer.id).await.unwrap();
        assert_eq!(buyer.balance, Money::from_tenge(100_000 - 8 * 1_000));
        let soup = f.db.products().get(&f.company.id, &f.soup.id).await.unwrap();
        assert_eq!(soup.quantity, 0);

        f.db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_orders_survive_user_deletion() {
        let f = fixture(10_000, 50_000).await;
        let placed = f.db.orders().place(&f.buyer.id, &cart(&f, &[(&f.roll, 1)])).await.unwrap();

        f.db.users().delete(&f.buyer.id).await.unwrap();
        f.db.users().delete(&f.company.id).await.unwrap();

        assert_eq!(f.db.orders().get(&placed.id).await.unwrap().id, placed.id);
    }
}

//! # Legacy Snapshot Import/Export
//!
//! Reads and writes a dump of the browser local storage the marketplace
//! front end used before the store existed.
//!
//! ## Snapshot Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  key                     value (JSON text)                             │
//! │  ─────────────────────   ────────────────────────────────────────────  │
//! │  users                   [User]          numeric or string ids         │
//! │  orders                  [Order]         items[].id = product id       │
//! │  companyOrders_<id>      [Order]         copies, deduplicated by id    │
//! │  products_<companyId>    [Product]       price as tenge number         │
//! │  userCards_<userId>      [Card]          `type` = brand, no balance    │
//! │  partnershipRequests     [Request]                                     │
//! │  currentUser             User                                          │
//! │  schemaVersion           1               (export only)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Import is lenient: a record missing its id (or a user missing an email)
//! is skipped with a warning, every other missing field gets a default.
//! Amounts are tenge in the snapshot and tiyn in the store. The whole import
//! runs in one transaction.
//!
//! Plaintext passwords are hashed on the way in. Export never writes a
//! password or a CVV, so accounts restored from an exported snapshot must
//! reset their password before logging in.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};
use serde::Serialize;
use serde_json::{json, Map, Value};
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use crate::credentials::hash_password;
use crate::error::DbResult;
use crate::repository::card::{fetch_cards, insert_card};
use crate::repository::order::insert_order;
use crate::repository::partnership::insert_request;
use crate::repository::product::insert_product;
use crate::repository::user::insert_user;
use crate::Database;
use lowlow_core::cards::{detect_brand, last4, normalize_defaults};
use lowlow_core::checkout::order_total;
use lowlow_core::keyspace::StorageKey;
use lowlow_core::validation::avatar_fits;
use lowlow_core::{
    new_id, timestamp, Card, CardBrand, Money, Order, OrderItem, OrderStatus, PartnershipRequest,
    Product, ProductStatus, RequestStatus, Role, User, DEFAULT_ACCOUNT_BALANCE_TENGE,
    DEFAULT_AVATAR_MAX_BYTES, DEFAULT_CARD_BALANCE_TENGE, LEGACY_SCHEMA_VERSION,
};

/// Key → JSON text, as read from browser local storage.
pub type Snapshot = BTreeMap<String, String>;

/// Stored for accounts imported without a password; verifies nothing.
const UNUSABLE_HASH: &str = "!";

const FALLBACK_CATEGORY: &str = "Без категории";

// =============================================================================
// Options & Report
// =============================================================================

/// Defaults applied to fields the snapshot does not carry.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Balance of a customer account without one.
    pub default_balance: Money,
    /// Balance of a card without one.
    pub card_balance: Money,
    /// Larger avatars are dropped.
    pub avatar_max_bytes: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            default_balance: Money::from_tenge(DEFAULT_ACCOUNT_BALANCE_TENGE),
            card_balance: Money::from_tenge(DEFAULT_CARD_BALANCE_TENGE),
            avatar_max_bytes: DEFAULT_AVATAR_MAX_BYTES,
        }
    }
}

/// What an import wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub users: usize,
    pub products: usize,
    pub cards: usize,
    pub orders: usize,
    pub requests: usize,
    /// Records or keys that could not be imported.
    pub skipped: usize,
    pub session_restored: bool,
}

/// Parses a dump file: a JSON object of key → value.
///
/// Values may be JSON text (what local storage holds) or inline JSON;
/// both end up as text.
pub fn parse_dump(text: &str) -> DbResult<Snapshot> {
    let root: Map<String, Value> = serde_json::from_str(text)?;
    Ok(root
        .into_iter()
        .map(|(key, value)| {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            (key, text)
        })
        .collect())
}

/// Serialises a snapshot back into a dump file.
pub fn render_dump(snapshot: &Snapshot) -> DbResult<String> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

// =============================================================================
// Lenient field readers
// =============================================================================

fn text(obj: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn number(obj: &Value, key: &str) -> Option<f64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

/// Tenge amount; negatives clamp to zero.
fn money(obj: &Value, key: &str) -> Option<Money> {
    number(obj, key).map(|tenge| Money::from_decimal(tenge.max(0.0)))
}

fn integer(obj: &Value, key: &str) -> Option<i64> {
    number(obj, key).map(|n| n.trunc() as i64)
}

fn flag(obj: &Value, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        Value::String(s) => s.trim().parse::<bool>().ok(),
        _ => None,
    }
}

/// RFC 3339 text or epoch milliseconds.
fn instant(obj: &Value, key: &str) -> Option<DateTime<Utc>> {
    let parsed = match obj.get(key)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    parsed.map(|t| t.trunc_subsecs(3))
}

fn records(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or_default()
}

fn iso(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Legacy → domain
// =============================================================================

fn user_from_legacy(
    v: &Value,
    options: &ImportOptions,
    now: DateTime<Utc>,
) -> DbResult<Option<User>> {
    let (Some(id), Some(email)) = (text(v, &["id"]), text(v, &["email"])) else {
        return Ok(None);
    };

    let role = text(v, &["role"])
        .and_then(|r| r.parse::<Role>().ok())
        .unwrap_or_default();

    let stored_hash = text(v, &["passwordHash"]).filter(|h| h.starts_with("$argon2"));
    let password_hash = match (stored_hash, v.get("password").and_then(Value::as_str)) {
        (Some(hash), _) => hash,
        (None, Some(plain)) if !plain.is_empty() => hash_password(plain)?,
        _ => UNUSABLE_HASH.to_string(),
    };

    let balance = money(v, "balance").unwrap_or(match role {
        Role::User => options.default_balance,
        _ => Money::zero(),
    });

    let avatar = text(v, &["avatar"]).filter(|avatar| {
        let fits = avatar_fits(avatar, options.avatar_max_bytes);
        if !fits {
            warn!(user_id = %id, bytes = avatar.len(), "Dropping oversized avatar on import");
        }
        fits
    });

    let created_at = instant(v, "createdAt").unwrap_or(now);
    Ok(Some(User {
        id,
        role,
        email,
        password_hash,
        nickname: text(v, &["nickname"]),
        company_name: text(v, &["companyName"]),
        is_active: flag(v, "isActive").unwrap_or(true),
        balance,
        avatar,
        first_name: text(v, &["firstName"]),
        phone: text(v, &["phone"]),
        city: text(v, &["city"]),
        address: text(v, &["address"]),
        bin: text(v, &["bin"]),
        director_first_name: text(v, &["directorFirstName"]),
        director_last_name: text(v, &["directorLastName"]),
        opening_time: text(v, &["openingTime"]),
        closing_time: text(v, &["closingTime"]),
        created_at,
        updated_at: instant(v, "updatedAt").unwrap_or(created_at),
    }))
}

fn product_from_legacy(v: &Value, company_id: &str, now: DateTime<Utc>) -> Option<Product> {
    let id = text(v, &["id"])?;
    let name = text(v, &["name"])?;
    let created_at = instant(v, "createdAt").unwrap_or(now);

    Some(Product {
        id,
        company_id: company_id.to_string(),
        name,
        description: text(v, &["description"]),
        ingredients: text(v, &["ingredients"]),
        price: money(v, "price").unwrap_or_default(),
        category: text(v, &["category"]).unwrap_or_else(|| FALLBACK_CATEGORY.to_string()),
        quantity: integer(v, "quantity").unwrap_or(0).max(0),
        status: text(v, &["status"])
            .and_then(|s| s.parse::<ProductStatus>().ok())
            .unwrap_or_default(),
        image: text(v, &["image"]),
        created_at,
        updated_at: instant(v, "updatedAt").unwrap_or(created_at),
    })
}

/// `fallback_created` keeps the snapshot's list order for cards without
/// a creation time.
fn card_from_legacy(
    v: &Value,
    user_id: &str,
    options: &ImportOptions,
    fallback_created: DateTime<Utc>,
) -> Option<Card> {
    let number: String = text(v, &["number"])?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    let brand = text(v, &["brand", "type"])
        .map(|b| b.parse::<CardBrand>().unwrap_or(CardBrand::Unknown))
        .filter(|b| *b != CardBrand::Unknown)
        .unwrap_or_else(|| detect_brand(&number));

    Some(Card {
        id: text(v, &["id"]).unwrap_or_else(new_id),
        user_id: user_id.to_string(),
        last4: text(v, &["last4"]).unwrap_or_else(|| last4(&number)),
        number,
        card_holder: text(v, &["cardHolder"]).unwrap_or_default(),
        expiry: text(v, &["expiry"]).unwrap_or_default(),
        cvv: text(v, &["cvv"]).unwrap_or_default(),
        brand,
        is_default: flag(v, "isDefault").unwrap_or(false),
        balance: money(v, "balance").unwrap_or(options.card_balance),
        created_at: instant(v, "createdAt").unwrap_or(fallback_created),
    })
}

fn order_from_legacy(v: &Value, now: DateTime<Utc>) -> Option<Order> {
    let id = text(v, &["id"])?;
    let user_id = text(v, &["userId"])?;
    let company_id = text(v, &["companyId"])?;

    let items: Vec<OrderItem> = v
        .get("items")
        .map(records)
        .unwrap_or_default()
        .iter()
        .filter_map(|item| {
            let quantity = integer(item, "quantity").filter(|q| *q > 0)?;
            Some(OrderItem {
                product_id: text(item, &["productId", "id"]).unwrap_or_default(),
                name: text(item, &["name"]).unwrap_or_default(),
                quantity,
                price: money(item, "price").unwrap_or_default(),
            })
        })
        .collect();

    let total = match money(v, "total") {
        Some(total) => total,
        None => {
            let Some(total) = order_total(&items) else {
                warn!(order_id = %id, "Order total overflows, skipping order");
                return None;
            };
            total
        }
    };
    let created_at = instant(v, "createdAt").unwrap_or(now);

    Some(Order {
        id,
        user_id,
        company_id,
        company_name: text(v, &["companyName"]).unwrap_or_default(),
        customer_name: text(v, &["customerName"]).unwrap_or_default(),
        customer_phone: text(v, &["customerPhone"]),
        items,
        total,
        status: text(v, &["status"])
            .and_then(|s| s.parse::<OrderStatus>().ok())
            .unwrap_or_default(),
        card_last4: text(v, &["cardLast4"]),
        payment_method: text(v, &["paymentMethod"]).unwrap_or_else(|| "card".to_string()),
        created_at,
        updated_at: instant(v, "updatedAt").unwrap_or(created_at),
    })
}

fn request_from_legacy(v: &Value, now: DateTime<Utc>) -> Option<PartnershipRequest> {
    let email = text(v, &["email"])?;
    let status = match text(v, &["status"]).as_deref() {
        Some("reviewed") => RequestStatus::Reviewed,
        _ => RequestStatus::New,
    };

    Some(PartnershipRequest {
        id: text(v, &["id"]).unwrap_or_else(new_id),
        email,
        message: text(v, &["message"]).unwrap_or_default(),
        status,
        created_at: instant(v, "createdAt").unwrap_or(now),
    })
}

// =============================================================================
// Import
// =============================================================================

async fn existing_ids(conn: &mut SqliteConnection, table: &str) -> DbResult<HashSet<String>> {
    let sql = format!("SELECT id FROM {}", table);
    let ids: Vec<String> = sqlx::query_scalar(&sql).fetch_all(&mut *conn).await?;
    Ok(ids.into_iter().collect())
}

/// Imports a snapshot into `db` in one transaction.
///
/// Records whose id already exists are skipped, so importing the same
/// snapshot twice changes nothing the second time.
pub async fn import_snapshot(
    db: &Database,
    snapshot: &Snapshot,
    options: &ImportOptions,
) -> DbResult<ImportReport> {
    let mut report = ImportReport::default();
    let now = timestamp();

    let mut users = Vec::new();
    let mut catalogs = Vec::new();
    let mut wallets = Vec::new();
    let mut order_lists = Vec::new();
    let mut requests = Vec::new();
    let mut current_user = None;

    for (raw, body) in snapshot {
        let Some(key) = StorageKey::parse(raw) else {
            debug!(key = %raw, "Ignoring key outside the snapshot namespace");
            continue;
        };
        let value: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %raw, error = %e, "Skipping unreadable snapshot key");
                report.skipped += 1;
                continue;
            }
        };

        match key {
            StorageKey::Users => users = records(&value).to_vec(),
            StorageKey::Orders | StorageKey::CompanyOrders(_) => order_lists.push(value),
            StorageKey::CurrentUser => current_user = Some(value),
            StorageKey::PartnershipRequests => requests = records(&value).to_vec(),
            StorageKey::Products(company_id) => catalogs.push((company_id, value)),
            StorageKey::UserCards(user_id) => wallets.push((user_id, value)),
            StorageKey::SchemaVersion => debug!(version = %body, "Snapshot schema version"),
        }
    }

    let mut tx = db.pool().begin().await?;

    // Users
    let mut user_ids = existing_ids(&mut tx, "users").await?;
    let emails: Vec<String> = sqlx::query_scalar("SELECT email FROM users")
        .fetch_all(&mut *tx)
        .await?;
    let mut emails: HashSet<String> = emails.into_iter().collect();

    for record in &users {
        let Some(user) = user_from_legacy(record, options, now)? else {
            warn!("Skipping user without id or email");
            report.skipped += 1;
            continue;
        };
        if user_ids.contains(&user.id) || emails.contains(&user.email) {
            warn!(user_id = %user.id, "Skipping user already in the store");
            report.skipped += 1;
            continue;
        }
        insert_user(&mut *tx, &user).await?;
        user_ids.insert(user.id);
        emails.insert(user.email);
        report.users += 1;
    }

    // Catalogs
    let mut product_ids = existing_ids(&mut tx, "products").await?;
    for (company_id, value) in &catalogs {
        if !user_ids.contains(company_id) {
            warn!(company_id = %company_id, "Skipping catalog of unknown company");
            report.skipped += records(value).len();
            continue;
        }
        for record in records(value) {
            match product_from_legacy(record, company_id, now) {
                Some(product) if !product_ids.contains(&product.id) => {
                    insert_product(&mut *tx, &product).await?;
                    product_ids.insert(product.id);
                    report.products += 1;
                }
                _ => report.skipped += 1,
            }
        }
    }

    // Cards
    let mut card_ids = existing_ids(&mut tx, "cards").await?;
    for (user_id, value) in &wallets {
        if !user_ids.contains(user_id) {
            warn!(user_id = %user_id, "Skipping cards of unknown user");
            report.skipped += records(value).len();
            continue;
        }

        let mut cards = Vec::new();
        for (index, record) in records(value).iter().enumerate() {
            let fallback_created = now + Duration::milliseconds(index as i64);
            match card_from_legacy(record, user_id, options, fallback_created) {
                Some(card) if !card_ids.contains(&card.id) => {
                    card_ids.insert(card.id.clone());
                    cards.push(card);
                }
                _ => report.skipped += 1,
            }
        }

        let has_default = fetch_cards(&mut *tx, user_id)
            .await?
            .iter()
            .any(|c| c.is_default);
        if has_default {
            cards.iter_mut().for_each(|c| c.is_default = false);
        } else if normalize_defaults(&mut cards) {
            debug!(user_id = %user_id, "Repaired default card flags");
        }

        for card in &cards {
            insert_card(&mut *tx, card).await?;
        }
        report.cards += cards.len();
    }

    // Orders (global list plus per-company copies)
    let mut order_ids = existing_ids(&mut tx, "orders").await?;
    for value in &order_lists {
        for record in records(value) {
            let Some(order) = order_from_legacy(record, now) else {
                report.skipped += 1;
                continue;
            };
            if order_ids.contains(&order.id) {
                continue;
            }
            insert_order(&mut tx, &order).await?;
            order_ids.insert(order.id);
            report.orders += 1;
        }
    }

    // Partnership inbox
    let mut request_ids = existing_ids(&mut tx, "partnership_requests").await?;
    for record in &requests {
        match request_from_legacy(record, now) {
            Some(request) if !request_ids.contains(&request.id) => {
                insert_request(&mut *tx, &request).await?;
                request_ids.insert(request.id);
                report.requests += 1;
            }
            _ => report.skipped += 1,
        }
    }

    // Session
    if let Some(current) = &current_user {
        if let (Some(id), Some(email)) = (text(current, &["id"]), text(current, &["email"])) {
            let known: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?1 AND email = ?2")
                    .bind(&id)
                    .bind(&email)
                    .fetch_one(&mut *tx)
                    .await?;
            if known > 0 {
                sqlx::query(
                    "INSERT OR REPLACE INTO session (slot, user_id, email, started_at) VALUES (1, ?1, ?2, ?3)",
                )
                .bind(&id)
                .bind(&email)
                .bind(now)
                .execute(&mut *tx)
                .await?;
                report.session_restored = true;
            } else {
                warn!(user_id = %id, "Snapshot session points at an unknown user");
            }
        }
    }

    tx.commit().await?;

    info!(
        users = report.users,
        products = report.products,
        cards = report.cards,
        orders = report.orders,
        requests = report.requests,
        skipped = report.skipped,
        "Legacy snapshot imported"
    );
    Ok(report)
}

// =============================================================================
// Export
// =============================================================================

fn user_to_legacy(user: &User) -> Value {
    json!({
        "id": user.id,
        "role": user.role.as_str(),
        "email": user.email,
        "nickname": user.nickname,
        "companyName": user.company_name,
        "isActive": user.is_active,
        "balance": user.balance.as_decimal(),
        "avatar": user.avatar,
        "firstName": user.first_name,
        "phone": user.phone,
        "city": user.city,
        "address": user.address,
        "bin": user.bin,
        "directorFirstName": user.director_first_name,
        "directorLastName": user.director_last_name,
        "openingTime": user.opening_time,
        "closingTime": user.closing_time,
        "createdAt": iso(&user.created_at),
        "updatedAt": iso(&user.updated_at),
    })
}

fn card_to_legacy(card: &Card) -> Value {
    json!({
        "id": card.id,
        "number": card.number,
        "last4": card.last4,
        "cardHolder": card.card_holder,
        "expiry": card.expiry,
        "type": card.brand.as_str(),
        "isDefault": card.is_default,
        "balance": card.balance.as_decimal(),
        "createdAt": iso(&card.created_at),
    })
}

fn product_to_legacy(product: &Product) -> Value {
    json!({
        "id": product.id,
        "name": product.name,
        "description": product.description,
        "ingredients": product.ingredients,
        "price": product.price.as_decimal(),
        "category": product.category,
        "quantity": product.quantity,
        "status": product.status.as_str(),
        "image": product.image,
        "createdAt": iso(&product.created_at),
        "updatedAt": iso(&product.updated_at),
    })
}

fn order_to_legacy(order: &Order) -> Value {
    let items: Vec<Value> = order
        .items
        .iter()
        .map(|item| {
            json!({
                "id": item.product_id,
                "name": item.name,
                "quantity": item.quantity,
                "price": item.price.as_decimal(),
            })
        })
        .collect();

    json!({
        "id": order.id,
        "userId": order.user_id,
        "companyId": order.company_id,
        "companyName": order.company_name,
        "customerName": order.customer_name,
        "customerPhone": order.customer_phone,
        "items": items,
        "total": order.total.as_decimal(),
        "status": order.status.as_str(),
        "cardLast4": order.card_last4,
        "paymentMethod": order.payment_method,
        "createdAt": iso(&order.created_at),
        "updatedAt": iso(&order.updated_at),
    })
}

fn request_to_legacy(request: &PartnershipRequest) -> Value {
    json!({
        "id": request.id,
        "email": request.email,
        "message": request.message,
        "status": match request.status {
            RequestStatus::New => "new",
            RequestStatus::Reviewed => "reviewed",
        },
        "createdAt": iso(&request.created_at),
    })
}

/// Exports the store in the snapshot namespace plus `schemaVersion`.
///
/// Lists come out oldest first, the order the front end appended them.
pub async fn export_snapshot(db: &Database) -> DbResult<Snapshot> {
    let mut snapshot = Snapshot::new();
    let put = |snapshot: &mut Snapshot, key: StorageKey, value: Value| {
        snapshot.insert(key.to_string(), value.to_string());
    };

    let users = db.users().list().await?;
    let mut orders = db.orders().list_all().await?;
    orders.reverse();

    put(
        &mut snapshot,
        StorageKey::Users,
        Value::Array(users.iter().map(user_to_legacy).collect()),
    );

    for user in &users {
        if user.role == Role::Business {
            let products = db.products().list_for_company(&user.id).await?;
            if !products.is_empty() {
                put(
                    &mut snapshot,
                    StorageKey::Products(user.id.clone()),
                    Value::Array(products.iter().map(product_to_legacy).collect()),
                );
            }

            let received: Vec<Value> = orders
                .iter()
                .filter(|o| o.company_id == user.id)
                .map(order_to_legacy)
                .collect();
            if !received.is_empty() {
                put(
                    &mut snapshot,
                    StorageKey::CompanyOrders(user.id.clone()),
                    Value::Array(received),
                );
            }
        }

        let cards = db.cards().list_for_user(&user.id).await?;
        if !cards.is_empty() {
            put(
                &mut snapshot,
                StorageKey::UserCards(user.id.clone()),
                Value::Array(cards.iter().map(card_to_legacy).collect()),
            );
        }
    }

    put(
        &mut snapshot,
        StorageKey::Orders,
        Value::Array(orders.iter().map(order_to_legacy).collect()),
    );

    let mut requests = db.partnerships().list().await?;
    requests.reverse();
    put(
        &mut snapshot,
        StorageKey::PartnershipRequests,
        Value::Array(requests.iter().map(request_to_legacy).collect()),
    );

    if let Some(session) = db.sessions().load().await? {
        if let Some(user) = users.iter().find(|u| u.id == session.user_id) {
            put(&mut snapshot, StorageKey::CurrentUser, user_to_legacy(user));
        }
    }

    put(
        &mut snapshot,
        StorageKey::SchemaVersion,
        json!(LEGACY_SCHEMA_VERSION),
    );

    info!(keys = snapshot.len(), "Legacy snapshot exported");
    Ok(snapshot)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;

    /// Shapes as the front end wrote them: numeric ids, plaintext
    /// passwords, integer prices, cards without balances.
    fn front_end_dump() -> Snapshot {
        let mut dump = Snapshot::new();
        dump.insert(
            "users".to_string(),
            json!([
                {"id": 999, "nickname": "Главный Админ", "email": "admin@lowlow.com",
                 "password": "admin123", "role": "admin", "isActive": true,
                 "createdAt": "2025-05-01T10:00:00.000Z"},
                {"id": 1, "email": "okadzaki@example.com", "password": "okadzaki123",
                 "role": "business", "companyName": "Okadzaki Sushi", "bin": "123456789012",
                 "openingTime": "09:00", "closingTime": "23:00", "avatar": null, "isActive": true},
                {"id": 1717000000000_i64, "nickname": "Айгерим", "email": "aigerim@example.com",
                 "password": "secret1", "role": "user", "isActive": true, "phone": "", "city": ""},
                {"nickname": "no email or id"}
            ])
            .to_string(),
        );
        dump.insert(
            "products_1".to_string(),
            json!([
                {"id": 1717000000100_i64, "name": "Филадельфия", "price": 2490,
                 "category": "Роллы", "ingredients": "лосось", "quantity": "12", "status": "active"},
                {"id": 1717000000200_i64, "name": "Мисо", "price": "990.5", "quantity": 0,
                 "status": "inactive"}
            ])
            .to_string(),
        );
        dump.insert(
            "userCards_1717000000000".to_string(),
            json!([
                {"id": 1, "number": "4111 1111 1111 4242", "last4": "4242",
                 "cardHolder": "AIGERIM", "expiry": "12/29", "cvv": "123", "type": "visa",
                 "isDefault": true},
                {"id": 2, "number": "5500000000000004", "cardHolder": "AIGERIM",
                 "expiry": "11/28", "cvv": "321", "isDefault": true}
            ])
            .to_string(),
        );
        let order = json!({
            "id": 1717000000300_i64, "userId": 1717000000000_i64, "companyId": 1,
            "companyName": "Okadzaki Sushi", "customerName": "Айгерим",
            "customerPhone": "Не указан",
            "items": [{"id": 1717000000100_i64, "name": "Филадельфия", "quantity": 2, "price": 2490}],
            "total": 4980, "status": "pending", "paymentMethod": "card",
            "createdAt": "2025-05-02T12:30:00.000Z"
        });
        dump.insert("orders".to_string(), json!([order]).to_string());
        dump.insert("companyOrders_1".to_string(), json!([order]).to_string());
        dump.insert(
            "partnershipRequests".to_string(),
            json!([{"id": 1717000000400_i64, "email": "cafe@example.kz",
                    "message": "Хотим к вам", "createdAt": "2025-05-03T09:00:00.000Z",
                    "status": "new"}])
            .to_string(),
        );
        dump.insert(
            "currentUser".to_string(),
            json!({"id": 1717000000000_i64, "email": "aigerim@example.com"}).to_string(),
        );
        dump.insert("theme".to_string(), "dark".to_string());
        dump.insert("products_999".to_string(), "{".to_string());
        dump
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_import_front_end_shapes() {
        let db = db().await;
        let report = import_snapshot(&db, &front_end_dump(), &ImportOptions::default())
            .await
            .unwrap();

        assert_eq!(report.users, 3);
        assert_eq!(report.products, 2);
        assert_eq!(report.cards, 2);
        assert_eq!(report.orders, 1);
        assert_eq!(report.requests, 1);
        assert!(report.session_restored);
        // the nameless user and the unreadable catalog
        assert_eq!(report.skipped, 2);

        let buyer = db.users().authenticate("aigerim@example.com", "secret1").await.unwrap();
        assert_eq!(buyer.id, "1717000000000");
        assert_eq!(buyer.balance, Money::from_tenge(DEFAULT_ACCOUNT_BALANCE_TENGE));
        assert_eq!(buyer.phone, None);

        let shop = db.users().require("1").await.unwrap();
        assert_eq!(shop.role, Role::Business);
        assert_eq!(shop.balance, Money::zero());

        let products = db.products().list_for_company("1").await.unwrap();
        assert_eq!(products[0].price, Money::from_tenge(2490));
        assert_eq!(products[0].quantity, 12);
        assert_eq!(products[1].price, Money::from_major_minor(990, 50));
        assert_eq!(products[1].category, FALLBACK_CATEGORY);

        let cards = db.cards().list_for_user(&buyer.id).await.unwrap();
        assert_eq!(cards.iter().filter(|c| c.is_default).count(), 1);
        assert_eq!(cards[1].brand, CardBrand::Mastercard);
        assert!(cards
            .iter()
            .all(|c| c.balance == Money::from_tenge(DEFAULT_CARD_BALANCE_TENGE)));

        let order = db.orders().get("1717000000300").await.unwrap();
        assert_eq!(order.items[0].product_id, "1717000000100");
        assert_eq!(order.total, Money::from_tenge(4980));
        assert_eq!(order.customer_phone.as_deref(), Some("Не указан"));

        let session = db.sessions().load().await.unwrap().unwrap();
        assert_eq!(session.user_id, buyer.id);
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let db = db().await;
        let dump = front_end_dump();
        import_snapshot(&db, &dump, &ImportOptions::default()).await.unwrap();

        let again = import_snapshot(&db, &dump, &ImportOptions::default()).await.unwrap();
        assert_eq!(again.users, 0);
        assert_eq!(again.products, 0);
        assert_eq!(again.orders, 0);
        assert_eq!(db.users().count().await.unwrap(), 3);
        assert_eq!(db.orders().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_order_without_total_that_overflows_is_skipped() {
        let db = db().await;
        let mut dump = Snapshot::new();
        dump.insert(
            "users".to_string(),
            json!([{"id": "buyer", "email": "buyer@lowlow.kz"}]).to_string(),
        );
        dump.insert(
            "orders".to_string(),
            json!([
                {"id": "huge", "userId": "buyer", "companyId": "1",
                 "items": [{"id": "x", "name": "x", "quantity": 999, "price": 9.0e16}]},
                {"id": "plain", "userId": "buyer", "companyId": "1",
                 "items": [{"id": "y", "name": "y", "quantity": 2, "price": 990}]}
            ])
            .to_string(),
        );

        let report = import_snapshot(&db, &dump, &ImportOptions::default()).await.unwrap();
        assert_eq!(report.orders, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(
            db.orders().get("plain").await.unwrap().total,
            Money::from_tenge(1_980)
        );
    }

    #[tokio::test]
    async fn test_oversized_avatar_dropped() {
        let db = db().await;
        let mut dump = Snapshot::new();
        dump.insert(
            "users".to_string(),
            json!([
                {"id": "big", "email": "big@lowlow.kz", "avatar": "x".repeat(64)},
                {"id": "small", "email": "small@lowlow.kz", "avatar": "data:image/png;base64,AA"}
            ])
            .to_string(),
        );
        let options = ImportOptions {
            avatar_max_bytes: 32,
            ..Default::default()
        };
        import_snapshot(&db, &dump, &options).await.unwrap();

        assert_eq!(db.users().require("big").await.unwrap().avatar, None);
        assert!(db.users().require("small").await.unwrap().avatar.is_some());
    }

    #[tokio::test]
    async fn test_export_omits_secrets_and_round_trips() {
        let source = db().await;
        import_snapshot(&source, &front_end_dump(), &ImportOptions::default())
            .await
            .unwrap();

        let exported = export_snapshot(&source).await.unwrap();
        assert_eq!(exported["schemaVersion"], "1");
        assert!(exported.contains_key("products_1"));
        assert!(exported.contains_key("companyOrders_1"));
        assert!(exported.contains_key("userCards_1717000000000"));
        assert!(exported.contains_key("currentUser"));
        for text in exported.values() {
            assert!(!text.contains("password"));
            assert!(!text.contains("cvv"));
        }

        let dump = render_dump(&exported).unwrap();
        let target = db().await;
        import_snapshot(&target, &parse_dump(&dump).unwrap(), &ImportOptions::default())
            .await
            .unwrap();

        let strip = |mut users: Vec<User>| {
            users.iter_mut().for_each(|u| u.password_hash.clear());
            users
        };
        assert_eq!(
            strip(target.users().list().await.unwrap()),
            strip(source.users().list().await.unwrap())
        );
        assert_eq!(
            target.products().list_for_company("1").await.unwrap(),
            source.products().list_for_company("1").await.unwrap()
        );
        assert_eq!(
            target.orders().list_all().await.unwrap(),
            source.orders().list_all().await.unwrap()
        );

        let buyer_cards = |db: Database| async move {
            let mut cards = db.cards().list_for_user("1717000000000").await.unwrap();
            cards.iter_mut().for_each(|c| c.cvv.clear());
            cards
        };
        assert_eq!(buyer_cards(target).await, buyer_cards(source).await);
    }

    #[test]
    fn test_parse_dump_accepts_inline_json() {
        let dump = parse_dump(r#"{"users": "[]", "orders": [], "schemaVersion": 1}"#).unwrap();
        assert_eq!(dump["users"], "[]");
        assert_eq!(dump["orders"], "[]");
        assert_eq!(dump["schemaVersion"], "1");
    }
}

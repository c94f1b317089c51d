//! # Card Repository
//!
//! Payment cards and the one-default-per-user flag.
//!
//! Every operation that moves the flag runs in a transaction that first
//! clears the user's current default, then sets the new one. The partial
//! unique index `idx_cards_single_default` rejects any interleaving that
//! would leave two defaults.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use lowlow_core::cards::{detect_brand, last4, new_card_is_default, successor_default};
use lowlow_core::{new_id, timestamp, Card, CardBrand, CardUpdate, CoreError, Money, NewCard};

const CARD_COLUMNS: &str = r#"
    id, user_id, number, last4, card_holder, expiry, cvv, brand, is_default, balance, created_at
"#;

/// Default first, then oldest first. `rowid` breaks timestamp ties in
/// insertion order.
const DISPLAY_ORDER: &str = "ORDER BY is_default DESC, created_at ASC, rowid ASC";

#[derive(Debug, sqlx::FromRow)]
struct CardRow {
    id: String,
    user_id: String,
    number: String,
    last4: String,
    card_holder: String,
    expiry: String,
    cvv: String,
    brand: CardBrand,
    is_default: bool,
    balance: i64,
    created_at: DateTime<Utc>,
}

impl From<CardRow> for Card {
    fn from(row: CardRow) -> Self {
        Card {
            id: row.id,
            user_id: row.user_id,
            number: row.number,
            last4: row.last4,
            card_holder: row.card_holder,
            expiry: row.expiry,
            cvv: row.cvv,
            brand: row.brand,
            is_default: row.is_default,
            balance: Money::from_tiyn(row.balance),
            created_at: row.created_at,
        }
    }
}

// =============================================================================
// Executor-generic helpers
// =============================================================================

pub(crate) async fn fetch_cards<'e, E>(executor: E, user_id: &str) -> DbResult<Vec<Card>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM cards WHERE user_id = ?1 {}",
        CARD_COLUMNS, DISPLAY_ORDER
    );
    let rows = sqlx::query_as::<_, CardRow>(&sql)
        .bind(user_id)
        .fetch_all(executor)
        .await?;
    Ok(rows.into_iter().map(Card::from).collect())
}

pub(crate) async fn fetch_default_card<'e, E>(executor: E, user_id: &str) -> DbResult<Option<Card>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM cards WHERE user_id = ?1 AND is_default = 1",
        CARD_COLUMNS
    );
    let row = sqlx::query_as::<_, CardRow>(&sql)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(Card::from))
}

async fn fetch_owned_card<'e, E>(executor: E, user_id: &str, card_id: &str) -> DbResult<Card>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM cards WHERE id = ?1 AND user_id = ?2",
        CARD_COLUMNS
    );
    sqlx::query_as::<_, CardRow>(&sql)
        .bind(card_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?
        .map(Card::from)
        .ok_or_else(|| CoreError::CardNotFound(card_id.to_string()).into())
}

pub(crate) async fn insert_card<'e, E>(executor: E, card: &Card) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO cards (
            id, user_id, number, last4, card_holder, expiry, cvv, brand,
            is_default, balance, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&card.id)
    .bind(&card.user_id)
    .bind(&card.number)
    .bind(&card.last4)
    .bind(&card.card_holder)
    .bind(&card.expiry)
    .bind(&card.cvv)
    .bind(card.brand)
    .bind(card.is_default)
    .bind(card.balance.tiyn())
    .bind(card.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Clears the default flag on every card of `user_id`, then sets it on
/// `card_id`. Must run inside a transaction.
async fn move_default(conn: &mut SqliteConnection, user_id: &str, card_id: &str) -> DbResult<()> {
    sqlx::query("UPDATE cards SET is_default = 0 WHERE user_id = ?1 AND is_default = 1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query("UPDATE cards SET is_default = 1 WHERE id = ?1 AND user_id = ?2")
        .bind(card_id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for payment cards.
#[derive(Debug, Clone)]
pub struct CardRepository {
    pool: SqlitePool,
}

impl CardRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CardRepository { pool }
    }

    /// A user's cards, default first, then oldest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Card>> {
        debug!(user_id = %user_id, "Listing cards");
        fetch_cards(&self.pool, user_id).await
    }

    pub async fn get(&self, user_id: &str, card_id: &str) -> DbResult<Card> {
        fetch_owned_card(&self.pool, user_id, card_id).await
    }

    pub async fn default_for_user(&self, user_id: &str) -> DbResult<Option<Card>> {
        fetch_default_card(&self.pool, user_id).await
    }

    /// Adds a card seeded with `balance`.
    ///
    /// The first card of a user becomes the default regardless of
    /// `make_default`.
    pub async fn add(
        &self,
        user_id: &str,
        form: &NewCard,
        today: NaiveDate,
        balance: Money,
    ) -> DbResult<Card> {
        let number = form.validate(today)?;

        let mut tx = self.pool.begin().await?;

        let owner: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?1")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if owner == 0 {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }

        let existing = fetch_cards(&mut *tx, user_id).await?;
        let is_default = new_card_is_default(&existing, form.make_default);

        let card = Card {
            id: new_id(),
            user_id: user_id.to_string(),
            last4: last4(&number),
            brand: detect_brand(&number),
            number,
            card_holder: form.card_holder.trim().to_string(),
            expiry: form.expiry.trim().to_string(),
            cvv: form.cvv.trim().to_string(),
            is_default: false,
            balance,
            created_at: timestamp(),
        };
        insert_card(&mut *tx, &card).await?;
        if is_default {
            move_default(&mut tx, user_id, &card.id).await?;
        }

        tx.commit().await?;

        info!(user_id = %user_id, last4 = %card.last4, brand = card.brand.as_str(), is_default, "Card added");
        Ok(Card { is_default, ..card })
    }

    /// Edits a card. A blank CVV keeps the stored one.
    pub async fn update(
        &self,
        user_id: &str,
        card_id: &str,
        form: &CardUpdate,
        today: NaiveDate,
    ) -> DbResult<Card> {
        let (number, cvv) = form.validate(today)?;

        let mut tx = self.pool.begin().await?;
        let current = fetch_owned_card(&mut *tx, user_id, card_id).await?;

        sqlx::query(
            r#"
            UPDATE cards SET
                number = ?2, last4 = ?3, card_holder = ?4, expiry = ?5,
                cvv = COALESCE(?6, cvv), brand = ?7
            WHERE id = ?1
            "#,
        )
        .bind(card_id)
        .bind(&number)
        .bind(last4(&number))
        .bind(form.card_holder.trim())
        .bind(form.expiry.trim())
        .bind(cvv)
        .bind(detect_brand(&number))
        .execute(&mut *tx)
        .await?;

        if form.make_default && !current.is_default {
            move_default(&mut tx, user_id, card_id).await?;
        }

        let updated = fetch_owned_card(&mut *tx, user_id, card_id).await?;
        tx.commit().await?;

        debug!(card_id = %card_id, "Card updated");
        Ok(updated)
    }

    /// Moves the default flag to `card_id`; returns the cards in display
    /// order.
    pub async fn set_default(&self, user_id: &str, card_id: &str) -> DbResult<Vec<Card>> {
        let mut tx = self.pool.begin().await?;
        fetch_owned_card(&mut *tx, user_id, card_id).await?;
        move_default(&mut tx, user_id, card_id).await?;
        tx.commit().await?;

        info!(user_id = %user_id, card_id = %card_id, "Default card changed");
        self.list_for_user(user_id).await
    }

    /// Deletes a card; if it was the default, the first remaining card in
    /// display order inherits the flag. Returns the remaining cards.
    pub async fn delete(&self, user_id: &str, card_id: &str) -> DbResult<Vec<Card>> {
        let mut tx = self.pool.begin().await?;
        let removed = fetch_owned_card(&mut *tx, user_id, card_id).await?;

        sqlx::query("DELETE FROM cards WHERE id = ?1")
            .bind(card_id)
            .execute(&mut *tx)
            .await?;

        let remaining = fetch_cards(&mut *tx, user_id).await?;
        if let Some(successor) = successor_default(&removed, &remaining) {
            debug!(card_id = %successor.id, "Promoting card to default");
            move_default(&mut tx, user_id, &successor.id).await?;
        }

        tx.commit().await?;

        info!(user_id = %user_id, card_id = %card_id, "Card deleted");
        self.list_for_user(user_id).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

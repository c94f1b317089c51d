//! # User Repository
//!
//! Accounts of every role.
//!
//! ## Key Operations
//! - Registration (customer) and onboarding (business) with unique email
//! - Credential check against active accounts only
//! - Guarded balance adjustments (never below zero)
//! - Deletion cascading to cards and products, never to orders

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::credentials::{hash_password, verify_password};
use crate::error::{DbError, DbResult};
use lowlow_core::{
    new_id, timestamp, BalanceDirection, CoreError, Money, NewBusiness, RegistrationForm, Role,
    User,
};

pub(crate) const USER_COLUMNS: &str = r#"
    id, role, email, password_hash, nickname, company_name, is_active, balance,
    avatar, first_name, phone, city, address, bin,
    director_first_name, director_last_name, opening_time, closing_time,
    created_at, updated_at
"#;

/// Row shape of the `users` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: String,
    role: Role,
    email: String,
    password_hash: String,
    nickname: Option<String>,
    company_name: Option<String>,
    is_active: bool,
    balance: i64,
    avatar: Option<String>,
    first_name: Option<String>,
    phone: Option<String>,
    city: Option<String>,
    address: Option<String>,
    bin: Option<String>,
    director_first_name: Option<String>,
    director_last_name: Option<String>,
    opening_time: Option<String>,
    closing_time: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            role: row.role,
            email: row.email,
            password_hash: row.password_hash,
            nickname: row.nickname,
            company_name: row.company_name,
            is_active: row.is_active,
            balance: Money::from_tiyn(row.balance),
            avatar: row.avatar,
            first_name: row.first_name,
            phone: row.phone,
            city: row.city,
            address: row.address,
            bin: row.bin,
            director_first_name: row.director_first_name,
            director_last_name: row.director_last_name,
            opening_time: row.opening_time,
            closing_time: row.closing_time,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Maps a UNIQUE failure on `users.email` to the domain error.
fn email_conflict(err: sqlx::Error, email: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } if field.contains("email") => {
            CoreError::DuplicateEmail(email.to_string()).into()
        }
        other => other,
    }
}

// =============================================================================
// Executor-generic helpers (usable on the pool or inside a transaction)
// =============================================================================

pub(crate) async fn fetch_user<'e, E>(executor: E, id: &str) -> DbResult<Option<User>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row.map(User::from))
}

pub(crate) async fn insert_user<'e, E>(executor: E, user: &User) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %user.id, role = %user.role, "Inserting user");

    sqlx::query(
        r#"
        INSERT INTO users (
            id, role, email, password_hash, nickname, company_name, is_active, balance,
            avatar, first_name, phone, city, address, bin,
            director_first_name, director_last_name, opening_time, closing_time,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8,
            ?9, ?10, ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18,
            ?19, ?20
        )
        "#,
    )
    .bind(&user.id)
    .bind(user.role)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.nickname)
    .bind(&user.company_name)
    .bind(user.is_active)
    .bind(user.balance.tiyn())
    .bind(&user.avatar)
    .bind(&user.first_name)
    .bind(&user.phone)
    .bind(&user.city)
    .bind(&user.address)
    .bind(&user.bin)
    .bind(&user.director_first_name)
    .bind(&user.director_last_name)
    .bind(&user.opening_time)
    .bind(&user.closing_time)
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(executor)
    .await
    .map_err(|e| email_conflict(e, &user.email))?;

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        fetch_user(&self.pool, id).await
    }

    /// Gets a user by ID or fails with `UserNotFound`.
    pub async fn require(&self, id: &str) -> DbResult<User> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::UserNotFound(id.to_string()).into())
    }

    /// Gets a user by exact email.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    /// All accounts, oldest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY created_at, rowid",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Accounts of one role, oldest first.
    pub async fn list_by_role(&self, role: Role) -> DbResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE role = ?1 ORDER BY created_at, rowid",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Checks whether `email` belongs to an account other than `except_id`.
    pub async fn email_taken(&self, email: &str, except_id: Option<&str>) -> DbResult<bool> {
        let taken: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users WHERE email = ?1 AND id != COALESCE(?2, '')",
        )
        .bind(email.trim())
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken > 0)
    }

    /// Inserts a fully-built user (password already hashed).
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        insert_user(&self.pool, user).await
    }

    /// Registers a customer account.
    ///
    /// ## Flow
    /// ```text
    /// form.validate() ──► email free? ──► hash password ──► INSERT
    ///                        │
    ///                        └── taken ──► DuplicateEmail (nothing written)
    /// ```
    pub async fn register(&self, form: &RegistrationForm, balance: Money) -> DbResult<User> {
        form.validate()?;

        let email = form.email.trim();
        if self.email_taken(email, None).await? {
            return Err(CoreError::DuplicateEmail(email.to_string()).into());
        }

        let now = timestamp();
        let user = User {
            id: new_id(),
            role: Role::User,
            email: email.to_string(),
            password_hash: hash_password(&form.password)?,
            nickname: Some(form.nickname.trim().to_string()),
            company_name: None,
            is_active: true,
            balance,
            avatar: None,
            first_name: None,
            phone: None,
            city: None,
            address: None,
            bin: None,
            director_first_name: None,
            director_last_name: None,
            opening_time: None,
            closing_time: None,
            created_at: now,
            updated_at: now,
        };
        self.insert(&user).await?;

        info!(id = %user.id, "Customer registered");
        Ok(user)
    }

    /// Creates a business account.
    pub async fn create_business(&self, form: NewBusiness) -> DbResult<User> {
        form.validate()?;

        if self.email_taken(&form.email, None).await? {
            return Err(CoreError::DuplicateEmail(form.email.trim().to_string()).into());
        }

        let hash = hash_password(&form.password)?;
        let user = form.into_user(new_id(), hash, timestamp());
        self.insert(&user).await?;

        info!(id = %user.id, company = %user.display_name(), "Business account created");
        Ok(user)
    }

    /// Checks credentials against active accounts.
    ///
    /// Unknown email, wrong password and deactivated account are the same
    /// `InvalidCredentials` error.
    pub async fn authenticate(&self, email: &str, password: &str) -> DbResult<User> {
        let user = match self.get_by_email(email).await? {
            Some(user) if user.is_active => user,
            _ => return Err(CoreError::InvalidCredentials.into()),
        };

        if !verify_password(password, &user.password_hash) {
            return Err(CoreError::InvalidCredentials.into());
        }
        Ok(user)
    }

    /// Persists every editable field of `user` and bumps `updated_at`.
    ///
    /// Does not touch balance or password; those have dedicated paths.
    pub async fn update(&self, user: &User) -> DbResult<User> {
        debug!(id = %user.id, "Updating user");

        let now = timestamp();
        let result = sqlx::query(
            r#"
            UPDATE users SET
                role = ?2, email = ?3, nickname = ?4, company_name = ?5, is_active = ?6,
                avatar = ?7, first_name = ?8, phone = ?9, city = ?10, address = ?11,
                bin = ?12, director_first_name = ?13, director_last_name = ?14,
                opening_time = ?15, closing_time = ?16, updated_at = ?17
            WHERE id = ?1
            "#,
        )
        .bind(&user.id)
        .bind(user.role)
        .bind(user.email.trim())
        .bind(&user.nickname)
        .bind(&user.company_name)
        .bind(user.is_active)
        .bind(&user.avatar)
        .bind(&user.first_name)
        .bind(&user.phone)
        .bind(&user.city)
        .bind(&user.address)
        .bind(&user.bin)
        .bind(&user.director_first_name)
        .bind(&user.director_last_name)
        .bind(&user.opening_time)
        .bind(&user.closing_time)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| email_conflict(e, &user.email))?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(user.id.clone()).into());
        }
        self.require(&user.id).await
    }

    /// Activates or deactivates an account.
    pub async fn set_active(&self, id: &str, is_active: bool) -> DbResult<User> {
        let result = sqlx::query("UPDATE users SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(is_active)
            .bind(timestamp())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(id.to_string()).into());
        }
        info!(id = %id, is_active, "User status changed");
        self.require(id).await
    }

    /// Credits or debits the account balance.
    ///
    /// A debit larger than the balance fails with `InsufficientFunds` and
    /// changes nothing.
    pub async fn adjust_balance(
        &self,
        id: &str,
        amount: Money,
        direction: BalanceDirection,
    ) -> DbResult<User> {
        if amount.is_negative() {
            return Err(lowlow_core::ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }

        let result = match direction {
            BalanceDirection::Credit => {
                sqlx::query("UPDATE users SET balance = balance + ?2, updated_at = ?3 WHERE id = ?1")
                    .bind(id)
                    .bind(amount.tiyn())
                    .bind(timestamp())
                    .execute(&self.pool)
                    .await?
            }
            BalanceDirection::Debit => sqlx::query(
                "UPDATE users SET balance = balance - ?2, updated_at = ?3 \
                 WHERE id = ?1 AND balance >= ?2",
            )
            .bind(id)
            .bind(amount.tiyn())
            .bind(timestamp())
            .execute(&self.pool)
            .await?,
        };

        if result.rows_affected() == 0 {
            let user = self.require(id).await?;
            return Err(CoreError::InsufficientFunds {
                funds: lowlow_core::error::FundsSource::Account,
                available: user.balance.tiyn(),
                required: amount.tiyn(),
            }
            .into());
        }

        debug!(id = %id, amount = %amount, ?direction, "Balance adjusted");
        self.require(id).await
    }

    /// Replaces the password hash.
    pub async fn set_password(&self, id: &str, password: &str) -> DbResult<()> {
        lowlow_core::validation::validate_password(password)?;
        let hash = hash_password(password)?;

        let result =
            sqlx::query("UPDATE users SET password_hash = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(hash)
                .bind(timestamp())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(id.to_string()).into());
        }
        Ok(())
    }

    /// Deletes a user. Cards and products go with it (cascade); orders stay.
    ///
    /// A persisted session pointing at the user is cleared in the same
    /// transaction.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::UserNotFound(id.to_string()).into());
        }

        sqlx::query("DELETE FROM session WHERE user_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, "User deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use lowlow_core::*;

    fn form(email: &str) -> RegistrationForm {
        RegistrationForm {
            nickname: "Айгерим".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            agree_terms: true,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let db = db().await;
        let users = db.users();

        let user = users
            .register(&form("a@lowlow.kz"), Money::from_tenge(50_000))
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret1");

        let logged = users.authenticate("a@lowlow.kz", "secret1").await.unwrap();
        assert_eq!(logged, user);

        let err = users.authenticate("a@lowlow.kz", "wrong1").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_duplicate_email_leaves_list_unchanged() {
        let db = db().await;
        let users = db.users();

        users.register(&form("dup@lowlow.kz"), Money::zero()).await.unwrap();
        let before = users.count().await.unwrap();

        let err = users
            .register(&form("dup@lowlow.kz"), Money::zero())
            .await
            .unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::DuplicateEmail(_))));
        assert_eq!(users.count().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_unique_index_backs_the_check() {
        let db = db().await;
        let users = db.users();

        let first = users.register(&form("x@lowlow.kz"), Money::zero()).await.unwrap();
        let mut clone = first.clone();
        clone.id = new_id();

        let err = users.insert(&clone).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_log_in() {
        let db = db().await;
        let users = db.users();

        let user = users.register(&form("off@lowlow.kz"), Money::zero()).await.unwrap();
        users.set_active(&user.id, false).await.unwrap();

        let err = users.authenticate("off@lowlow.kz", "secret1").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_balance_debit_guard() {
        let db = db().await;
        let users = db.users();

        let user = users
            .register(&form("b@lowlow.kz"), Money::from_tenge(100))
            .await
            .unwrap();

        let after = users
            .adjust_balance(&user.id, Money::from_tenge(40), BalanceDirection::Debit)
            .await
            .unwrap();
        assert_eq!(after.balance, Money::from_tenge(60));

        let err = users
            .adjust_balance(&user.id, Money::from_tenge(61), BalanceDirection::Debit)
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientFunds { .. })
        ));
        assert_eq!(
            users.require(&user.id).await.unwrap().balance,
            Money::from_tenge(60)
        );

        let after = users
            .adjust_balance(&user.id, Money::from_tenge(5), BalanceDirection::Credit)
            .await
            .unwrap();
        assert_eq!(after.balance, Money::from_tenge(65));
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let db = db().await;
        let users = db.users();

        users.register(&form("one@lowlow.kz"), Money::zero()).await.unwrap();
        let mut two = users.register(&form("two@lowlow.kz"), Money::zero()).await.unwrap();

        two.email = "one@lowlow.kz".to_string();
        let err = users.update(&two).await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::DuplicateEmail(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_user() {
        let db = db().await;
        let err = db.users().delete("nobody").await.unwrap_err();
        assert!(matches!(err.as_domain(), Some(CoreError::UserNotFound(_))));
    }
}

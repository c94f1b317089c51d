//! # Default Accounts
//!
//! Every store starts with two administrators and one demo restaurant.
//!
//! ```text
//! ensure_defaults
//!   ├── no users at all ──► admins + demo company
//!   └── users exist     ──► re-add any default admin whose email is gone
//! ```
//!
//! Default accounts keep fixed ids (`999`, `998`, `1`) so that catalogs and
//! orders imported from an old browser dump still point at them.

use serde::Serialize;
use tracing::{debug, info};

use crate::credentials::hash_password;
use crate::error::DbResult;
use crate::repository::user::insert_user;
use crate::Database;
use lowlow_core::{timestamp, Money, Role, User};

struct DefaultAccount {
    id: &'static str,
    email: &'static str,
    password: &'static str,
    nickname: &'static str,
}

const DEFAULT_ADMINS: &[DefaultAccount] = &[
    DefaultAccount {
        id: "999",
        email: "admin@lowlow.com",
        password: "admin123",
        nickname: "Главный Админ",
    },
    DefaultAccount {
        id: "998",
        email: "admin",
        password: "admin",
        nickname: "Администратор",
    },
];

/// Id of the demo restaurant.
pub const DEMO_COMPANY_ID: &str = "1";

#[derive(Debug, Clone)]
pub struct BootstrapOptions {
    /// Also create the demo restaurant on an empty store.
    pub demo_company: bool,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        BootstrapOptions { demo_company: true }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapReport {
    pub admins_added: usize,
    pub demo_company_added: bool,
}

fn blank_account(id: &str, role: Role, email: &str, password_hash: String) -> User {
    let now = timestamp();
    User {
        id: id.to_string(),
        role,
        email: email.to_string(),
        password_hash,
        nickname: None,
        company_name: None,
        is_active: true,
        balance: Money::zero(),
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
    }
}

fn demo_company() -> DbResult<User> {
    let mut company = blank_account(
        DEMO_COMPANY_ID,
        Role::Business,
        "okadzaki@example.com",
        hash_password("okadzaki123")?,
    );
    company.company_name = Some("Okadzaki Sushi".to_string());
    company.bin = Some("123456789012".to_string());
    company.director_first_name = Some("Айгерім".to_string());
    company.director_last_name = Some("Қасенова".to_string());
    company.phone = Some("+7 (777) 123-45-67".to_string());
    company.city = Some("Алматы".to_string());
    company.opening_time = Some("09:00".to_string());
    company.closing_time = Some("23:00".to_string());
    Ok(company)
}

/// Seeds or repairs the default accounts. Safe to call on every start.
pub async fn ensure_defaults(db: &Database, options: &BootstrapOptions) -> DbResult<BootstrapReport> {
    let mut report = BootstrapReport::default();
    let empty = db.users().count().await? == 0;

    let mut tx = db.pool().begin().await?;

    for admin in DEFAULT_ADMINS {
        let taken: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1 OR id = ?2")
                .bind(admin.email)
                .bind(admin.id)
                .fetch_one(&mut *tx)
                .await?;
        if taken > 0 {
            debug!(email = admin.email, "Default admin present");
            continue;
        }

        let mut user = blank_account(
            admin.id,
            Role::Admin,
            admin.email,
            hash_password(admin.password)?,
        );
        user.nickname = Some(admin.nickname.to_string());
        insert_user(&mut *tx, &user).await?;
        report.admins_added += 1;
    }

    if empty && options.demo_company {
        insert_user(&mut *tx, &demo_company()?).await?;
        report.demo_company_added = true;
    }

    tx.commit().await?;

    if report.admins_added > 0 || report.demo_company_added {
        info!(
            admins = report.admins_added,
            demo_company = report.demo_company_added,
            "Default accounts seeded"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;

    #[tokio::test]
    async fn test_empty_store_gets_everything() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let report = ensure_defaults(&db, &BootstrapOptions::default()).await.unwrap();
        assert_eq!(report.admins_added, 2);
        assert!(report.demo_company_added);

        let admin = db.users().authenticate("admin@lowlow.com", "admin123").await.unwrap();
        assert_eq!(admin.role, Role::Admin);
        db.users().authenticate("admin", "admin").await.unwrap();

        let company = db.users().authenticate("okadzaki@example.com", "okadzaki123").await.unwrap();
        assert_eq!(company.id, DEMO_COMPANY_ID);
        assert_eq!(company.company_name.as_deref(), Some("Okadzaki Sushi"));

        let again = ensure_defaults(&db, &BootstrapOptions::default()).await.unwrap();
        assert_eq!(again, BootstrapReport::default());
        assert_eq!(db.users().count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_missing_admin_readded_without_demo() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        ensure_defaults(&db, &BootstrapOptions::default()).await.unwrap();
        db.users().delete("998").await.unwrap();
        db.users().delete(DEMO_COMPANY_ID).await.unwrap();

        let report = ensure_defaults(&db, &BootstrapOptions::default()).await.unwrap();
        assert_eq!(report.admins_added, 1);
        assert!(!report.demo_company_added);
        assert!(db.users().get_by_email("admin").await.unwrap().is_some());
        assert!(db.users().get_by_id(DEMO_COMPANY_ID).await.unwrap().is_none());
    }
}

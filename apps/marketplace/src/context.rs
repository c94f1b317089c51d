//! # Market Context
//!
//! The one object every command receives. It owns the database handle,
//! the session mirror and the configuration; nothing is global.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         MarketContext                                   │
//! │                                                                         │
//! │  open(config) ──► Database::new (migrations) ──► MarketContext          │
//! │                                                      │                  │
//! │  initialize() ───────────────────────────────────────┤                  │
//! │     1. bootstrap::ensure_defaults (admins, demo)     │                  │
//! │     2. restore_session (id AND email must match)     │                  │
//! │                                                      ▼                  │
//! │  commands::*(&ctx, ...) ──► role check ──► lowlow-db ──► ApiError/T    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::state::{ConfigState, DbState, SessionState};
use lowlow_core::{timestamp, CoreError, Role, Session, User};
use lowlow_db::bootstrap::{ensure_defaults, BootstrapOptions, BootstrapReport};
use lowlow_db::legacy::{self, ImportReport, Snapshot};
use lowlow_db::{Database, DbConfig};

#[derive(Debug, Clone)]
pub struct MarketContext {
    db: DbState,
    session: SessionState,
    config: ConfigState,
}

impl MarketContext {
    pub fn new(db: Database, config: ConfigState) -> Self {
        MarketContext {
            db: DbState::new(db),
            session: SessionState::new(),
            config,
        }
    }

    /// Opens the database file named by `config` (or the platform default).
    pub async fn open(config: ConfigState) -> Result<Self, ApiError> {
        let path = config.resolve_database_path().map_err(|e| {
            ApiError::internal(format!("Не удалось определить путь к базе данных: {}", e))
        })?;
        info!(db_path = %path.display(), "Opening store");

        let db = Database::new(DbConfig::new(path)).await?;
        Ok(MarketContext::new(db, config))
    }

    /// A throwaway store, for tests and previews.
    pub async fn in_memory(config: ConfigState) -> Result<Self, ApiError> {
        let db = Database::new(DbConfig::in_memory()).await?;
        Ok(MarketContext::new(db, config))
    }

    /// Seeds default accounts and restores the persisted login.
    pub async fn initialize(&self) -> Result<BootstrapReport, ApiError> {
        let report = ensure_defaults(self.db(), &BootstrapOptions::default()).await?;
        self.restore_session().await?;
        Ok(report)
    }

    pub fn db(&self) -> &Database {
        self.db.inner()
    }

    pub fn config(&self) -> &ConfigState {
        &self.config
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn current_user(&self) -> Option<User> {
        self.session.current()
    }

    /// The logged-in user, or `NOT_AUTHENTICATED`.
    pub fn require_user(&self) -> Result<User, ApiError> {
        self.current_user()
            .ok_or_else(|| CoreError::NotAuthenticated.into())
    }

    /// The logged-in user if it has `role`.
    pub fn require_role(&self, role: Role, action: &str) -> Result<User, ApiError> {
        let user = self.require_user()?;
        if user.role != role {
            warn!(user_id = %user.id, role = %user.role, action, "Permission denied");
            return Err(CoreError::forbidden(action, user.role).into());
        }
        Ok(user)
    }

    /// Reloads the persisted session.
    ///
    /// The saved slot is honoured only while an account with the same id
    /// and email exists; otherwise it is cleared.
    pub async fn restore_session(&self) -> Result<Option<User>, ApiError> {
        let Some(saved) = self.db().sessions().load().await? else {
            self.session.set(None);
            return Ok(None);
        };

        match self.db().users().get_by_id(&saved.user_id).await? {
            Some(user) if user.email == saved.email => {
                info!(user_id = %user.id, "Session restored");
                self.session.set(Some(user.clone()));
                Ok(Some(user))
            }
            _ => {
                warn!(user_id = %saved.user_id, "Discarding session of a missing account");
                self.db().sessions().clear().await?;
                self.session.set(None);
                Ok(None)
            }
        }
    }

    pub(crate) async fn start_session(&self, user: User) -> Result<User, ApiError> {
        self.db()
            .sessions()
            .save(&Session {
                user_id: user.id.clone(),
                email: user.email.clone(),
                started_at: timestamp(),
            })
            .await?;
        self.session.set(Some(user.clone()));
        Ok(user)
    }

    pub(crate) async fn end_session(&self) -> Result<(), ApiError> {
        self.db().sessions().clear().await?;
        self.session.set(None);
        Ok(())
    }

    /// Pushes a freshly saved `user` into the mirror if it is the session
    /// user. An email change is written through to the persisted slot.
    pub(crate) async fn sync_session(&self, user: &User) -> Result<(), ApiError> {
        if !self.session.refresh(user) {
            return Ok(());
        }
        debug!(user_id = %user.id, "Session user refreshed");

        if let Some(mut saved) = self.db().sessions().load().await? {
            if saved.email != user.email {
                saved.email = user.email.clone();
                self.db().sessions().save(&saved).await?;
            }
        }
        Ok(())
    }

    /// Re-reads the session user from the store (after balance changes).
    pub(crate) async fn reload_session_user(&self, id: &str) -> Result<(), ApiError> {
        if self.session.is(id) {
            let user = self.db().users().require(id).await?;
            self.sync_session(&user).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Legacy snapshot (trusted callers: the binary, admin commands)
    // =========================================================================

    /// Imports a browser storage dump, then picks up its `currentUser`.
    pub async fn import_snapshot(&self, snapshot: &Snapshot) -> Result<ImportReport, ApiError> {
        let report =
            legacy::import_snapshot(self.db(), snapshot, &self.config.import_options()).await?;
        if report.session_restored {
            self.restore_session().await?;
        }
        Ok(report)
    }

    pub async fn export_snapshot(&self) -> Result<Snapshot, ApiError> {
        Ok(legacy::export_snapshot(self.db()).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{auth, users};
    use lowlow_core::{RegistrationForm, UserPatch};
    use std::path::{Path, PathBuf};

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("lowlow-test-{}.db", uuid::Uuid::new_v4()))
    }

    fn remove_db_files(path: &Path) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_user_survives_reopen_without_oversized_avatar() {
        let path = temp_db_path();
        let config = ConfigState {
            database_path: Some(path.clone()),
            avatar_max_bytes: 64,
            ..Default::default()
        };

        let written = {
            let ctx = MarketContext::open(config.clone()).await.unwrap();
            ctx.initialize().await.unwrap();
            let user = auth::register(
                &ctx,
                RegistrationForm {
                    nickname: "Дана".to_string(),
                    email: "dana@lowlow.kz".to_string(),
                    password: "secret1".to_string(),
                    confirm_password: "secret1".to_string(),
                    agree_terms: true,
                },
            )
            .await
            .unwrap();

            let written = users::update_user(
                &ctx,
                user.id.clone(),
                UserPatch {
                    city: Some("Алматы".to_string()),
                    phone: Some("+7 701 000 00 00".to_string()),
                    avatar: Some(Some(format!("data:image/png;base64,{}", "A".repeat(128)))),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            assert_eq!(written.avatar, None);
            ctx.db().close().await;
            written
        };

        let ctx = MarketContext::open(config).await.unwrap();
        ctx.initialize().await.unwrap();
        let restored = ctx.current_user().unwrap();
        let reread = ctx.db().users().require(&written.id).await.unwrap();
        ctx.db().close().await;
        remove_db_files(&path);

        assert_eq!(restored, reread);
        assert_eq!(reread, written);
        assert_eq!(reread.city.as_deref(), Some("Алматы"));
    }

    #[tokio::test]
    async fn test_stale_session_is_cleared() {
        let ctx = MarketContext::in_memory(ConfigState::default()).await.unwrap();
        ctx.initialize().await.unwrap();
        ctx.db()
            .sessions()
            .save(&Session {
                user_id: "999".to_string(),
                email: "someone-else@lowlow.kz".to_string(),
                started_at: timestamp(),
            })
            .await
            .unwrap();

        assert!(ctx.restore_session().await.unwrap().is_none());
        assert!(ctx.db().sessions().load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_require_role() {
        let ctx = MarketContext::in_memory(ConfigState::default()).await.unwrap();
        ctx.initialize().await.unwrap();
        assert_eq!(
            ctx.require_user().unwrap_err().code,
            crate::error::ErrorCode::NotAuthenticated
        );

        auth::login(&ctx, "admin".to_string(), "admin".to_string()).await.unwrap();
        assert!(ctx.require_role(Role::Admin, "manage users").is_ok());
        assert_eq!(
            ctx.require_role(Role::Business, "edit menu").unwrap_err().code,
            crate::error::ErrorCode::PermissionDenied
        );
    }
}

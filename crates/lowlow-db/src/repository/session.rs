//! Persisted login: the single `session` row.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use lowlow_core::Session;

#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    pub async fn load(&self) -> DbResult<Option<Session>> {
        let row: Option<(String, String, chrono::DateTime<chrono::Utc>)> =
            sqlx::query_as("SELECT user_id, email, started_at FROM session WHERE slot = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(user_id, email, started_at)| Session {
            user_id,
            email,
            started_at,
        }))
    }

    /// Replaces whatever session was stored.
    pub async fn save(&self, session: &Session) -> DbResult<()> {
        debug!(user_id = %session.user_id, "Persisting session");
        sqlx::query(
            "INSERT OR REPLACE INTO session (slot, user_id, email, started_at) VALUES (1, ?1, ?2, ?3)",
        )
        .bind(&session.user_id)
        .bind(&session.email)
        .bind(session.started_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn clear(&self) -> DbResult<()> {
        debug!("Clearing persisted session");
        sqlx::query("DELETE FROM session")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use lowlow_core::{timestamp, Session};

    #[tokio::test]
    async fn test_single_slot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let sessions = db.sessions();
        assert!(sessions.load().await.unwrap().is_none());

        let a = Session {
            user_id: "a".to_string(),
            email: "a@lowlow.kz".to_string(),
            started_at: timestamp(),
        };
        let b = Session {
            user_id: "b".to_string(),
            email: "b@lowlow.kz".to_string(),
            started_at: timestamp(),
        };
        sessions.save(&a).await.unwrap();
        sessions.save(&b).await.unwrap();
        assert_eq!(sessions.load().await.unwrap(), Some(b));

        sessions.clear().await.unwrap();
        assert!(sessions.load().await.unwrap().is_none());
    }
}

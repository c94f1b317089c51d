//! Partnership requests submitted from the landing page.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use lowlow_core::validation::{validate_email, validate_message};
use lowlow_core::{new_id, timestamp, CoreError, PartnershipRequest, RequestStatus};

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: String,
    email: String,
    message: String,
    status: RequestStatus,
    created_at: DateTime<Utc>,
}

impl From<RequestRow> for PartnershipRequest {
    fn from(row: RequestRow) -> Self {
        PartnershipRequest {
            id: row.id,
            email: row.email,
            message: row.message,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

pub(crate) async fn insert_request<'e, E>(executor: E, request: &PartnershipRequest) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO partnership_requests (id, email, message, status, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(&request.id)
    .bind(&request.email)
    .bind(&request.message)
    .bind(request.status)
    .bind(request.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Repository for the partnership inbox.
#[derive(Debug, Clone)]
pub struct PartnershipRepository {
    pool: SqlitePool,
}

impl PartnershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PartnershipRepository { pool }
    }

    /// Stores a new request with status `new`.
    pub async fn submit(&self, email: &str, message: &str) -> DbResult<PartnershipRequest> {
        validate_email(email)?;
        validate_message(message)?;

        let request = PartnershipRequest {
            id: new_id(),
            email: email.trim().to_string(),
            message: message.trim().to_string(),
            status: RequestStatus::New,
            created_at: timestamp(),
        };
        insert_request(&self.pool, &request).await?;

        info!(request_id = %request.id, email = %request.email, "Partnership request received");
        Ok(request)
    }

    /// All requests, newest first.
    pub async fn list(&self) -> DbResult<Vec<PartnershipRequest>> {
        debug!("Listing partnership requests");
        let rows = sqlx::query_as::<_, RequestRow>(
            "SELECT id, email, message, status, created_at FROM partnership_requests \
             ORDER BY created_at DESC, rowid DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(PartnershipRequest::from).collect())
    }

    pub async fn mark_reviewed(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE partnership_requests SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(RequestStatus::Reviewed)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::RequestNotFound(id.to_string()).into());
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM partnership_requests WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::RequestNotFound(id.to_string()).into());
        }
        info!(request_id = %id, "Partnership request deleted");
        Ok(())
    }

    /// Number of requests not yet reviewed.
    pub async fn count_new(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM partnership_requests WHERE status = ?1")
                .bind(RequestStatus::New)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}

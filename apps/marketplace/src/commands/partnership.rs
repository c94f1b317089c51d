//! # Partnership Commands
//!
//! "Become a partner" messages. Anyone may submit; only admins read the
//! inbox.

use crate::context::MarketContext;
use crate::error::ApiError;
use lowlow_core::{PartnershipRequest, Role};

pub async fn submit_partnership_request(
    ctx: &MarketContext,
    email: String,
    message: String,
) -> Result<PartnershipRequest, ApiError> {
    Ok(ctx.db().partnerships().submit(&email, &message).await?)
}

/// Newest first.
pub async fn list_partnership_requests(
    ctx: &MarketContext,
) -> Result<Vec<PartnershipRequest>, ApiError> {
    ctx.require_role(Role::Admin, "read partnership requests")?;
    Ok(ctx.db().partnerships().list().await?)
}

pub async fn mark_request_reviewed(ctx: &MarketContext, id: String) -> Result<(), ApiError> {
    ctx.require_role(Role::Admin, "review partnership requests")?;
    Ok(ctx.db().partnerships().mark_reviewed(&id).await?)
}

pub async fn delete_partnership_request(ctx: &MarketContext, id: String) -> Result<(), ApiError> {
    ctx.require_role(Role::Admin, "delete partnership requests")?;
    Ok(ctx.db().partnerships().delete(&id).await?)
}

/// Badge counter of the admin panel.
pub async fn count_new_requests(ctx: &MarketContext) -> Result<i64, ApiError> {
    ctx.require_role(Role::Admin, "read partnership requests")?;
    Ok(ctx.db().partnerships().count_new().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use crate::error::ErrorCode;
    use lowlow_core::RequestStatus;

    #[tokio::test]
    async fn test_inbox_flow() {
        let ctx = fixtures::market().await;

        let first = submit_partnership_request(
            &ctx,
            "chef@plov.kz".into(),
            "Хотим подключить наш ресторан".into(),
        )
        .await
        .unwrap();
        let second = submit_partnership_request(&ctx, "bar@lowlow.kz".into(), "Сотрудничество".into())
            .await
            .unwrap();
        assert_eq!(first.status, RequestStatus::New);

        let err = list_partnership_requests(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotAuthenticated);

        fixtures::login_admin(&ctx).await;
        let inbox = list_partnership_requests(&ctx).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert_eq!(inbox[0].id, second.id);
        assert_eq!(count_new_requests(&ctx).await.unwrap(), 2);

        mark_request_reviewed(&ctx, first.id.clone()).await.unwrap();
        assert_eq!(count_new_requests(&ctx).await.unwrap(), 1);

        delete_partnership_request(&ctx, second.id.clone()).await.unwrap();
        let err = delete_partnership_request(&ctx, second.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(list_partnership_requests(&ctx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_submission_is_validated_and_inbox_admin_only() {
        let ctx = fixtures::market().await;
        let err = submit_partnership_request(&ctx, "not-an-email".into(), "Привет".into())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        fixtures::login_company(&ctx).await;
        let err = count_new_requests(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }
}

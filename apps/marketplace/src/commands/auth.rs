//! # Auth Commands
//!
//! Login, registration, logout and the password reset flow.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login(email, password)                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  users().authenticate ── unknown / wrong / inactive ──► INVALID_CREDS   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  session table (slot 1) ◄── start_session ──► SessionState mirror      │
//! │                                                                         │
//! │  request_password_reset(email) ──► 6-digit code, TTL from config       │
//! │  reset_password(email, code, ..) ──► code consumed, hash replaced      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::{debug, info};

use crate::context::MarketContext;
use crate::error::ApiError;
use lowlow_core::{RegistrationForm, ResetTicket, User};

/// Logs in by exact email and password.
pub async fn login(ctx: &MarketContext, email: String, password: String) -> Result<User, ApiError> {
    debug!(email = %email.trim(), "Login attempt");

    let user = ctx.db().users().authenticate(email.trim(), &password).await?;
    let user = ctx.start_session(user).await?;

    info!(user_id = %user.id, role = %user.role, "Logged in");
    Ok(user)
}

/// Creates a customer account and logs it in.
pub async fn register(ctx: &MarketContext, form: RegistrationForm) -> Result<User, ApiError> {
    let user = ctx
        .db()
        .users()
        .register(&form, ctx.config().default_balance)
        .await?;
    let user = ctx.start_session(user).await?;

    info!(user_id = %user.id, "Registered and logged in");
    Ok(user)
}

pub async fn logout(ctx: &MarketContext) -> Result<(), ApiError> {
    if let Some(user) = ctx.current_user() {
        info!(user_id = %user.id, "Logged out");
    }
    ctx.end_session().await
}

pub async fn current_user(ctx: &MarketContext) -> Result<Option<User>, ApiError> {
    Ok(ctx.current_user())
}

/// Issues a reset code. There is no mail transport, so the ticket (code
/// included) goes back to the caller.
pub async fn request_password_reset(
    ctx: &MarketContext,
    email: String,
) -> Result<ResetTicket, ApiError> {
    let ticket = ctx
        .db()
        .resets()
        .issue(&email, ctx.config().reset_ttl())
        .await?;
    Ok(ticket)
}

pub async fn reset_password(
    ctx: &MarketContext,
    email: String,
    code: String,
    new_password: String,
    confirm_password: String,
) -> Result<(), ApiError> {
    ctx.db()
        .resets()
        .consume(&email, &code, &new_password, &confirm_password)
        .await?;
    info!(email = %email.trim(), "Password reset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use crate::commands::users;
    use crate::error::ErrorCode;
    use lowlow_core::Money;

    fn form(email: &str) -> RegistrationForm {
        RegistrationForm {
            nickname: "Айгерим".to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
            agree_terms: true,
        }
    }

    #[tokio::test]
    async fn test_register_logs_in_with_default_balance() {
        let ctx = fixtures::market().await;

        let user = register(&ctx, form("aigerim@lowlow.kz")).await.unwrap();
        assert_eq!(user.balance, Money::from_tenge(50_000));
        assert_eq!(ctx.current_user().unwrap().id, user.id);
        assert_eq!(ctx.db().sessions().load().await.unwrap().unwrap().user_id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_leaves_users_unchanged() {
        let ctx = fixtures::market().await;
        register(&ctx, form("aigerim@lowlow.kz")).await.unwrap();
        let before = ctx.db().users().count().await.unwrap();

        let err = register(&ctx, form("aigerim@lowlow.kz")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateEmail);
        assert_eq!(ctx.db().users().count().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_register_rejects_mismatched_confirmation() {
        let ctx = fixtures::market().await;
        let mut bad = form("aigerim@lowlow.kz");
        bad.confirm_password = "secret2".to_string();

        let err = register(&ctx, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(ctx.current_user().is_none());
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let ctx = fixtures::market().await;
        let user = fixtures::customer(&ctx, "Bota").await;

        let wrong_password = login(&ctx, user.email.clone(), "nope123".into()).await.unwrap_err();
        let unknown = login(&ctx, "ghost@lowlow.kz".into(), "secret1".into()).await.unwrap_err();
        assert_eq!(wrong_password.code, ErrorCode::InvalidCredentials);
        assert_eq!(unknown.code, ErrorCode::InvalidCredentials);
        assert_eq!(wrong_password.message, unknown.message);

        fixtures::login_admin(&ctx).await;
        users::update_user_status(&ctx, user.id.clone(), false).await.unwrap();
        let inactive = login(&ctx, user.email.clone(), "secret1".into()).await.unwrap_err();
        assert_eq!(inactive.code, ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_logout_clears_both_copies() {
        let ctx = fixtures::market().await;
        fixtures::login_admin(&ctx).await;

        logout(&ctx).await.unwrap();
        assert!(current_user(&ctx).await.unwrap().is_none());
        assert!(ctx.db().sessions().load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let ctx = fixtures::market().await;
        let user = fixtures::customer(&ctx, "Bota").await;
        logout(&ctx).await.unwrap();

        let unknown = request_password_reset(&ctx, "ghost@lowlow.kz".into()).await.unwrap_err();
        assert_eq!(unknown.code, ErrorCode::NotFound);

        let ticket = request_password_reset(&ctx, user.email.clone()).await.unwrap();
        assert_eq!(ticket.code.len(), 6);

        let wrong_code = if ticket.code == "000000" { "111111" } else { "000000" };
        let err = reset_password(
            &ctx,
            user.email.clone(),
            wrong_code.to_string(),
            "fresh123".into(),
            "fresh123".into(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResetCode);

        reset_password(
            &ctx,
            user.email.clone(),
            ticket.code.clone(),
            "fresh123".into(),
            "fresh123".into(),
        )
        .await
        .unwrap();
        login(&ctx, user.email.clone(), "fresh123".into()).await.unwrap();

        let reused = reset_password(
            &ctx,
            user.email.clone(),
            ticket.code,
            "again123".into(),
            "again123".into(),
        )
        .await
        .unwrap_err();
        assert_eq!(reused.code, ErrorCode::InvalidResetCode);
    }
}

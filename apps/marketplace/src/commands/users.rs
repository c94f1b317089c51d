//! # User Commands
//!
//! Profile edits, balances, admin account management and the public
//! restaurant directory.
//!
//! ## Who May Do What
//! ```text
//! ┌──────────────────────────┬────────────────────────────────────────────┐
//! │ Command                  │ Allowed                                    │
//! ├──────────────────────────┼────────────────────────────────────────────┤
//! │ update_user              │ self, admin (role change: admin only)      │
//! │ update_user_balance      │ self, admin                                │
//! │ delete_user              │ self, admin                                │
//! │ update_user_status       │ admin                                      │
//! │ create_business_user     │ admin                                      │
//! │ list_users               │ admin                                      │
//! │ list_restaurants         │ anyone                                     │
//! │ get_restaurant           │ anyone                                     │
//! └──────────────────────────┴────────────────────────────────────────────┘
//! ```

use tracing::{info, warn};

use crate::context::MarketContext;
use crate::error::ApiError;
use lowlow_core::validation::avatar_fits;
use lowlow_core::{
    BalanceDirection, CoreError, Money, NewBusiness, Restaurant, Role, User, UserPatch,
};

/// The session user if they may manage `target_id`.
fn require_manager(ctx: &MarketContext, target_id: &str, action: &str) -> Result<User, ApiError> {
    let actor = ctx.require_user()?;
    if !actor.can_manage(target_id) {
        warn!(user_id = %actor.id, target_id = %target_id, action, "Permission denied");
        return Err(CoreError::forbidden(action, actor.role).into());
    }
    Ok(actor)
}

/// Applies a partial profile update.
///
/// An inline avatar over the configured limit is dropped (the rest of the
/// patch still saves).
pub async fn update_user(
    ctx: &MarketContext,
    id: String,
    mut patch: UserPatch,
) -> Result<User, ApiError> {
    let actor = require_manager(ctx, &id, "edit user")?;
    if patch.role.is_some() && !actor.is_admin() {
        warn!(user_id = %actor.id, "Non-admin tried to change a role");
        return Err(CoreError::forbidden("change role", actor.role).into());
    }
    patch.validate()?;

    let max_bytes = ctx.config().avatar_max_bytes;
    let oversized = match &patch.avatar {
        Some(Some(avatar)) if !avatar_fits(avatar, max_bytes) => Some(avatar.len()),
        _ => None,
    };
    if let Some(bytes) = oversized {
        warn!(user_id = %id, bytes, max_bytes, "Avatar too large, dropping it");
        patch.avatar = Some(None);
    }

    let users = ctx.db().users();
    if let Some(email) = &patch.email {
        if users.email_taken(email, Some(&id)).await? {
            return Err(CoreError::DuplicateEmail(email.trim().to_string()).into());
        }
    }

    let mut user = users.require(&id).await?;
    patch.apply(&mut user);
    let saved = users.update(&user).await?;
    ctx.sync_session(&saved).await?;

    info!(user_id = %saved.id, by = %actor.id, "Profile updated");
    Ok(saved)
}

/// Activates or deactivates an account.
pub async fn update_user_status(
    ctx: &MarketContext,
    id: String,
    is_active: bool,
) -> Result<User, ApiError> {
    ctx.require_role(Role::Admin, "change user status")?;

    let user = ctx.db().users().set_active(&id, is_active).await?;
    ctx.sync_session(&user).await?;
    Ok(user)
}

pub async fn create_business_user(ctx: &MarketContext, form: NewBusiness) -> Result<User, ApiError> {
    ctx.require_role(Role::Admin, "create business")?;
    Ok(ctx.db().users().create_business(form).await?)
}

/// Deletes an account with its cards and products. Orders stay.
///
/// Deleting the logged-in account logs out.
pub async fn delete_user(ctx: &MarketContext, id: String) -> Result<(), ApiError> {
    let actor = require_manager(ctx, &id, "delete user")?;

    ctx.db().users().delete(&id).await?;
    if ctx.session().is(&id) {
        ctx.end_session().await?;
    }

    info!(user_id = %id, by = %actor.id, "User deleted");
    Ok(())
}

/// Credits or debits an account balance.
pub async fn update_user_balance(
    ctx: &MarketContext,
    id: String,
    amount: Money,
    direction: BalanceDirection,
) -> Result<User, ApiError> {
    require_manager(ctx, &id, "change balance")?;

    let user = ctx.db().users().adjust_balance(&id, amount, direction).await?;
    ctx.sync_session(&user).await?;
    Ok(user)
}

/// Every account, oldest first.
pub async fn list_users(ctx: &MarketContext) -> Result<Vec<User>, ApiError> {
    ctx.require_role(Role::Admin, "list users")?;
    Ok(ctx.db().users().list().await?)
}

/// Active businesses as shown on the restaurants page.
pub async fn list_restaurants(ctx: &MarketContext) -> Result<Vec<Restaurant>, ApiError> {
    let businesses = ctx.db().users().list_by_role(Role::Business).await?;
    Ok(businesses
        .iter()
        .filter(|b| b.is_active)
        .map(Restaurant::from)
        .collect())
}

pub async fn get_restaurant(ctx: &MarketContext, id: String) -> Result<Restaurant, ApiError> {
    match ctx.db().users().get_by_id(&id).await? {
        Some(user) if user.role == Role::Business && user.is_active => Ok(Restaurant::from(&user)),
        _ => Err(CoreError::UserNotFound(id).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{auth, fixtures};
    use crate::error::ErrorCode;
    use lowlow_db::bootstrap::DEMO_COMPANY_ID;

    #[tokio::test]
    async fn test_deleting_session_user_logs_out() {
        let ctx = fixtures::market().await;
        let user = fixtures::customer_with_card(&ctx, "Dana").await;

        delete_user(&ctx, user.id.clone()).await.unwrap();

        assert!(ctx.current_user().is_none());
        assert!(ctx.db().sessions().load().await.unwrap().is_none());
        assert!(ctx.db().users().get_by_id(&user.id).await.unwrap().is_none());
        assert_eq!(ctx.db().cards().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_admin_deleting_someone_else_stays_logged_in() {
        let ctx = fixtures::market().await;
        let user = fixtures::customer(&ctx, "Dana").await;
        let admin = fixtures::login_admin(&ctx).await;

        delete_user(&ctx, user.id).await.unwrap();
        assert_eq!(ctx.current_user().unwrap().id, admin.id);
    }

    #[tokio::test]
    async fn test_users_cannot_touch_each_other() {
        let ctx = fixtures::market().await;
        let dana = fixtures::customer(&ctx, "Dana").await;
        fixtures::customer(&ctx, "Bota").await;

        let patch = UserPatch {
            city: Some("Астана".to_string()),
            ..Default::default()
        };
        let err = update_user(&ctx, dana.id.clone(), patch).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = delete_user(&ctx, dana.id.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err = list_users(&ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_role_change_is_admin_only() {
        let ctx = fixtures::market().await;
        let dana = fixtures::customer(&ctx, "Dana").await;

        let promote = UserPatch {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let err = update_user(&ctx, dana.id.clone(), promote.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        fixtures::login_admin(&ctx).await;
        let promoted = update_user(&ctx, dana.id, promote).await.unwrap();
        assert_eq!(promoted.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_email_change_checks_uniqueness_and_follows_session() {
        let ctx = fixtures::market().await;
        fixtures::customer(&ctx, "Bota").await;
        let dana = fixtures::customer(&ctx, "Dana").await;

        let taken = UserPatch {
            email: Some("bota@lowlow.kz".to_string()),
            ..Default::default()
        };
        let err = update_user(&ctx, dana.id.clone(), taken).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateEmail);

        let fresh = UserPatch {
            email: Some("dana.a@lowlow.kz".to_string()),
            nickname: Some("Дана".to_string()),
            ..Default::default()
        };
        update_user(&ctx, dana.id.clone(), fresh).await.unwrap();

        assert_eq!(ctx.current_user().unwrap().nickname.as_deref(), Some("Дана"));
        let saved = ctx.db().sessions().load().await.unwrap().unwrap();
        assert_eq!(saved.email, "dana.a@lowlow.kz");
        assert_eq!(ctx.restore_session().await.unwrap().unwrap().id, dana.id);
    }

    #[tokio::test]
    async fn test_balance_debit_beyond_balance_changes_nothing() {
        let ctx = fixtures::market().await;
        let dana = fixtures::customer(&ctx, "Dana").await;

        let err = update_user_balance(
            &ctx,
            dana.id.clone(),
            Money::from_tenge(50_001),
            BalanceDirection::Debit,
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientFunds);
        assert_eq!(ctx.current_user().unwrap().balance, Money::from_tenge(50_000));

        let topped = update_user_balance(
            &ctx,
            dana.id.clone(),
            Money::from_tenge(1_000),
            BalanceDirection::Credit,
        )
        .await
        .unwrap();
        assert_eq!(topped.balance, Money::from_tenge(51_000));
        assert_eq!(ctx.current_user().unwrap().balance, Money::from_tenge(51_000));
    }

    #[tokio::test]
    async fn test_restaurant_directory() {
        let ctx = fixtures::market().await;
        fixtures::login_admin(&ctx).await;
        let cafe = create_business_user(
            &ctx,
            NewBusiness {
                company_name: "Дастархан".to_string(),
                email: "dastarkhan@lowlow.kz".to_string(),
                password: "dastarkhan1".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(cafe.role, Role::Business);

        update_user_status(&ctx, DEMO_COMPANY_ID.to_string(), false).await.unwrap();
        auth::logout(&ctx).await.unwrap();

        let restaurants = list_restaurants(&ctx).await.unwrap();
        assert_eq!(restaurants.len(), 1);
        assert_eq!(restaurants[0].name, "Дастархан");

        assert_eq!(get_restaurant(&ctx, cafe.id).await.unwrap().name, "Дастархан");
        let hidden = get_restaurant(&ctx, DEMO_COMPANY_ID.to_string()).await.unwrap_err();
        assert_eq!(hidden.code, ErrorCode::NotFound);
        let admin = get_restaurant(&ctx, "999".to_string()).await.unwrap_err();
        assert_eq!(admin.code, ErrorCode::NotFound);
    }
}

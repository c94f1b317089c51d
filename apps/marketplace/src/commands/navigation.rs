//! # Navigation Commands
//!
//! Runs the route gate for the logged-in user.

use tracing::debug;

use crate::context::MarketContext;
use crate::error::ApiError;
use lowlow_core::access::{check_path, Access};

/// Decides whether the session may open `path`.
///
/// ```rust,ignore
/// // anonymous visitor
/// check_route(&ctx, "/account".into()).await?  // Redirect(Login)
/// ```
pub async fn check_route(ctx: &MarketContext, path: String) -> Result<Access, ApiError> {
    let role = ctx.current_user().map(|u| u.role);
    let access = check_path(&path, role);
    debug!(path = %path, ?role, ?access, "Route checked");
    Ok(access)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixtures;
    use lowlow_core::access::Route;

    async fn check(ctx: &MarketContext, path: &str) -> Access {
        check_route(ctx, path.to_string()).await.unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_visitor() {
        let ctx = fixtures::market().await;
        assert_eq!(check(&ctx, "/").await, Access::Allow);
        assert_eq!(check(&ctx, "/restaurant/1").await, Access::Allow);
        assert_eq!(check(&ctx, "/account").await, Access::Redirect(Route::Login));
        assert_eq!(check(&ctx, "/admin").await, Access::Redirect(Route::Login));
        assert_eq!(check(&ctx, "/nowhere").await, Access::NotFound);
    }

    #[tokio::test]
    async fn test_wrong_role_goes_home() {
        let ctx = fixtures::market().await;

        fixtures::customer(&ctx, "Dana").await;
        assert_eq!(check(&ctx, "/account").await, Access::Allow);
        assert_eq!(check(&ctx, "/admin").await, Access::Redirect(Route::Account));

        fixtures::login_company(&ctx).await;
        assert_eq!(check(&ctx, "/business-account").await, Access::Allow);
        assert_eq!(check(&ctx, "/account").await, Access::Redirect(Route::BusinessAccount));

        fixtures::login_admin(&ctx).await;
        assert_eq!(check(&ctx, "/admin").await, Access::Allow);
        assert_eq!(check(&ctx, "/business-account").await, Access::Redirect(Route::Admin));
    }
}

//! # Access Gate
//!
//! Decides whether the current session may open a page.
//!
//! ```text
//! ┌──────────────────────┬───────────────┬─────────────────────────────────┐
//! │ Route                │ Required role │ Otherwise                       │
//! ├──────────────────────┼───────────────┼─────────────────────────────────┤
//! │ /  /restaurants      │ -             │ -                               │
//! │ /restaurant/:id      │ -             │ -                               │
//! │ /all-news            │ -             │ -                               │
//! │ /login /register     │ -             │ -                               │
//! │ /forgot-password     │ -             │ -                               │
//! │ /account             │ user          │ anonymous → /login              │
//! │ /business-account    │ business      │ wrong role → that role's home   │
//! │ /admin               │ admin         │                                 │
//! └──────────────────────┴───────────────┴─────────────────────────────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Role;

/// A page of the marketplace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "page", content = "id", rename_all = "camelCase")]
pub enum Route {
    Home,
    Restaurants,
    Restaurant(String),
    AllNews,
    Login,
    Register,
    ForgotPassword,
    Account,
    BusinessAccount,
    Admin,
}

impl Route {
    /// Parses a URL path. Query string, fragment and a trailing slash are
    /// ignored. Returns `None` for unknown paths.
    ///
    /// ```rust
    /// use lowlow_core::access::Route;
    ///
    /// assert_eq!(Route::parse("/admin/"), Some(Route::Admin));
    /// assert_eq!(Route::parse("/restaurant/1?tab=menu"), Some(Route::Restaurant("1".into())));
    /// assert_eq!(Route::parse("/restaurant/"), None);
    /// assert_eq!(Route::parse("/nope"), None);
    /// ```
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');

        let route = match trimmed {
            "" => Route::Home,
            "/restaurants" => Route::Restaurants,
            "/all-news" => Route::AllNews,
            "/login" => Route::Login,
            "/register" => Route::Register,
            "/forgot-password" => Route::ForgotPassword,
            "/account" => Route::Account,
            "/business-account" => Route::BusinessAccount,
            "/admin" => Route::Admin,
            other => {
                let id = other.strip_prefix("/restaurant/")?;
                if id.is_empty() || id.contains('/') {
                    return None;
                }
                Route::Restaurant(id.to_string())
            }
        };
        Some(route)
    }

    /// The path this route is served at.
    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Restaurants => "/restaurants".to_string(),
            Route::Restaurant(id) => format!("/restaurant/{}", id),
            Route::AllNews => "/all-news".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::ForgotPassword => "/forgot-password".to_string(),
            Route::Account => "/account".to_string(),
            Route::BusinessAccount => "/business-account".to_string(),
            Route::Admin => "/admin".to_string(),
        }
    }

    /// Role needed to open this route, if any.
    pub fn required_role(&self) -> Option<Role> {
        match self {
            Route::Account => Some(Role::User),
            Route::BusinessAccount => Some(Role::Business),
            Route::Admin => Some(Role::Admin),
            _ => None,
        }
    }

    /// Personal page of a role.
    pub fn home_for(role: Role) -> Route {
        match role {
            Role::User => Route::Account,
            Role::Business => Route::BusinessAccount,
            Role::Admin => Route::Admin,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Outcome of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "to", rename_all = "camelCase")]
pub enum Access {
    Allow,
    Redirect(Route),
    NotFound,
}

/// Decides access to `route` for a session with `role` (`None` = anonymous).
pub fn gate(route: &Route, role: Option<Role>) -> Access {
    match (route.required_role(), role) {
        (None, _) => Access::Allow,
        (Some(_), None) => Access::Redirect(Route::Login),
        (Some(required), Some(actual)) if required == actual => Access::Allow,
        (Some(_), Some(actual)) => Access::Redirect(Route::home_for(actual)),
    }
}

/// Parses `path` and runs the gate. Unknown paths are `NotFound`.
pub fn check_path(path: &str, role: Option<Role>) -> Access {
    match Route::parse(path) {
        Some(route) => gate(&route, role),
        None => Access::NotFound,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

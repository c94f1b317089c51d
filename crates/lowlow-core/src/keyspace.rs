//! Key namespace of the legacy browser storage dump.
//!
//! Import and export speak these keys; everything else in the store is
//! relational.

use std::fmt;

/// One key of a legacy local-storage snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    /// `users` - array of every account.
    Users,
    /// `orders` - array of every order.
    Orders,
    /// `currentUser` - the logged-in account object.
    CurrentUser,
    /// `partnershipRequests` - the admin inbox.
    PartnershipRequests,
    /// `products_<companyId>` - one business catalog.
    Products(String),
    /// `userCards_<userId>` - cards of one customer.
    UserCards(String),
    /// `companyOrders_<companyId>` - a business's copy of its orders.
    CompanyOrders(String),
    /// `schemaVersion` - written on export only.
    SchemaVersion,
}

impl StorageKey {
    /// Parses a raw key. Returns `None` for keys outside the namespace.
    ///
    /// ```rust
    /// use lowlow_core::keyspace::StorageKey;
    ///
    /// assert_eq!(StorageKey::parse("products_1"), Some(StorageKey::Products("1".into())));
    /// assert_eq!(StorageKey::parse("userCards_"), None);
    /// assert_eq!(StorageKey::parse("theme"), None);
    /// ```
    pub fn parse(key: &str) -> Option<StorageKey> {
        let scoped = |prefix: &str| {
            key.strip_prefix(prefix)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
        };

        match key {
            "users" => Some(StorageKey::Users),
            "orders" => Some(StorageKey::Orders),
            "currentUser" => Some(StorageKey::CurrentUser),
            "partnershipRequests" => Some(StorageKey::PartnershipRequests),
            "schemaVersion" => Some(StorageKey::SchemaVersion),
            _ => scoped("products_")
                .map(StorageKey::Products)
                .or_else(|| scoped("userCards_").map(StorageKey::UserCards))
                .or_else(|| scoped("companyOrders_").map(StorageKey::CompanyOrders)),
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKey::Users => f.write_str("users"),
            StorageKey::Orders => f.write_str("orders"),
            StorageKey::CurrentUser => f.write_str("currentUser"),
            StorageKey::PartnershipRequests => f.write_str("partnershipRequests"),
            StorageKey::SchemaVersion => f.write_str("schemaVersion"),
            StorageKey::Products(id) => write!(f, "products_{}", id),
            StorageKey::UserCards(id) => write!(f, "userCards_{}", id),
            StorageKey::CompanyOrders(id) => write!(f, "companyOrders_{}", id),
        }
    }
}

//! # Domain Types
//!
//! Core domain types used throughout the LowLow store.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │      Order      │   │      Card       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  role           │◄──│  user_id        │   │  user_id ──────►│ User  │
//! │  │  email (unique) │◄──│  company_id     │   │  is_default     │       │
//! │  │  balance        │   │  items[]        │   │  balance        │       │
//! │  └─────────────────┘   │  total, status  │   └─────────────────┘       │
//! │          ▲             └─────────────────┘                              │
//! │          │                                                              │
//! │  ┌───────┴─────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │    Product      │   │ PartnershipRequest  │   │    Session      │   │
//! │  │  company_id     │   │  email, message     │   │  user_id, email │   │
//! │  │  price, qty     │   │  status: new/rev.   │   │  started_at     │   │
//! │  └─────────────────┘   └─────────────────────┘   └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders reference users by id only. Deleting a buyer or a company leaves
//! its orders in place.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation;

/// Trims a form value and maps blank input to `None`.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Role
// =============================================================================

/// Account role. Fixed at creation; only an admin edit changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Customer. The only role that may place orders.
    User,
    /// Restaurant or shop with its own catalog.
    Business,
    /// Platform administrator.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Business => "business",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "business" => Ok(Role::Business),
            "admin" => Ok(Role::Admin),
            other => Err(ValidationError::InvalidFormat {
                field: "role".to_string(),
                reason: format!("unknown role '{}'", other),
            }),
        }
    }
}

// =============================================================================
// User
// =============================================================================

/// A registered account of any role.
///
/// The password hash never leaves the store: it is skipped on
/// serialisation and absent from the TypeScript bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub role: Role,
    pub email: String,

    /// Argon2 PHC string.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    /// Display name for customers and admins.
    pub nickname: Option<String>,

    /// Display name for businesses.
    pub company_name: Option<String>,

    pub is_active: bool,
    pub balance: Money,

    /// Inline image (data URL).
    pub avatar: Option<String>,

    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,

    /// 12-digit business identification number.
    pub bin: Option<String>,
    pub director_first_name: Option<String>,
    pub director_last_name: Option<String>,

    /// `HH:MM`
    pub opening_time: Option<String>,
    /// `HH:MM`
    pub closing_time: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Name shown in lists and on orders.
    ///
    /// Businesses go by company name; everyone else by nickname, then email.
    pub fn display_name(&self) -> &str {
        let preferred = match self.role {
            Role::Business => self.company_name.as_deref().or(self.nickname.as_deref()),
            _ => self.nickname.as_deref().or(self.company_name.as_deref()),
        };
        preferred
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }

    #[inline]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Checks whether this user may edit or delete `target_id`.
    pub fn can_manage(&self, target_id: &str) -> bool {
        self.is_admin() || self.id == target_id
    }
}

/// Partial update of a user.
///
/// `None` leaves a field unchanged. For text fields an empty string clears
/// the value. `avatar` is doubly optional: `Some(None)` removes the image.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub company_name: Option<String>,
    /// Admin only.
    pub role: Option<Role>,
    #[ts(type = "string | null | undefined")]
    pub avatar: Option<Option<String>>,
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub bin: Option<String>,
    pub director_first_name: Option<String>,
    pub director_last_name: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
}

impl UserPatch {
    /// Validates the fields that carry a format.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(email) = &self.email {
            validation::validate_email(email)?;
        }
        if let Some(nickname) = self.nickname.as_deref().filter(|n| !n.trim().is_empty()) {
            validation::validate_nickname(nickname)?;
        }
        if let Some(bin) = self.bin.as_deref().filter(|b| !b.trim().is_empty()) {
            validation::validate_bin(bin)?;
        }
        for (field, value) in [
            ("openingTime", &self.opening_time),
            ("closingTime", &self.closing_time),
        ] {
            if let Some(time) = value.as_deref().filter(|t| !t.trim().is_empty()) {
                validation::validate_time_of_day(field, time)?;
            }
        }
        Ok(())
    }

    /// Applies the patch in place. Does not touch `updated_at`.
    pub fn apply(&self, user: &mut User) {
        if let Some(email) = &self.email {
            user.email = email.trim().to_string();
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(avatar) = &self.avatar {
            user.avatar = avatar.clone();
        }

        let text_fields: [(&Option<String>, &mut Option<String>); 11] = [
            (&self.nickname, &mut user.nickname),
            (&self.company_name, &mut user.company_name),
            (&self.first_name, &mut user.first_name),
            (&self.phone, &mut user.phone),
            (&self.city, &mut user.city),
            (&self.address, &mut user.address),
            (&self.bin, &mut user.bin),
            (&self.director_first_name, &mut user.director_first_name),
            (&self.director_last_name, &mut user.director_last_name),
            (&self.opening_time, &mut user.opening_time),
            (&self.closing_time, &mut user.closing_time),
        ];
        for (patch, target) in text_fields {
            if let Some(value) = patch {
                *target = non_blank(Some(value));
            }
        }
    }
}

/// Customer sign-up form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationForm {
    pub nickname: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub agree_terms: bool,
}

impl RegistrationForm {
    /// Runs every field check of the sign-up form, first failure wins.
    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_nickname(&self.nickname)?;
        validation::validate_email(&self.email)?;
        validation::validate_password(&self.password)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::Mismatch {
                field: "password".to_string(),
            }
            .into());
        }
        if !self.agree_terms {
            return Err(ValidationError::NotAccepted {
                field: "terms".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Admin form for onboarding a restaurant.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct NewBusiness {
    pub company_name: String,
    pub email: String,
    pub password: String,
    pub bin: Option<String>,
    pub director_first_name: Option<String>,
    pub director_last_name: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
}

impl NewBusiness {
    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_company_name(&self.company_name)?;
        validation::validate_email(&self.email)?;
        validation::validate_password(&self.password)?;
        if let Some(bin) = non_blank(self.bin.as_deref()) {
            validation::validate_bin(&bin)?;
        }
        if let Some(time) = non_blank(self.opening_time.as_deref()) {
            validation::validate_time_of_day("openingTime", &time)?;
        }
        if let Some(time) = non_blank(self.closing_time.as_deref()) {
            validation::validate_time_of_day("closingTime", &time)?;
        }
        Ok(())
    }

    /// Builds the user record. The caller supplies the password hash.
    pub fn into_user(self, id: String, password_hash: String, now: DateTime<Utc>) -> User {
        User {
            id,
            role: Role::Business,
            email: self.email.trim().to_string(),
            password_hash,
            nickname: None,
            company_name: non_blank(Some(&self.company_name)),
            is_active: true,
            balance: Money::zero(),
            avatar: None,
            first_name: None,
            phone: non_blank(self.phone.as_deref()),
            city: non_blank(self.city.as_deref()),
            address: non_blank(self.address.as_deref()),
            bin: non_blank(self.bin.as_deref()),
            director_first_name: non_blank(self.director_first_name.as_deref()),
            director_last_name: non_blank(self.director_last_name.as_deref()),
            opening_time: non_blank(self.opening_time.as_deref()),
            closing_time: non_blank(self.closing_time.as_deref()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public view of a business account for the restaurant listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
}

impl From<&User> for Restaurant {
    fn from(user: &User) -> Self {
        Restaurant {
            id: user.id.clone(),
            name: user.display_name().to_string(),
            avatar: user.avatar.clone(),
            phone: user.phone.clone(),
            city: user.city.clone(),
            address: user.address.clone(),
            opening_time: user.opening_time.clone(),
            closing_time: user.closing_time.clone(),
        }
    }
}

/// Direction of a manual balance adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BalanceDirection {
    Credit,
    Debit,
}

// =============================================================================
// Order
// =============================================================================

/// Lifecycle of an order.
///
/// ```text
///            ┌──► Completed
///  Pending ──┤
///            └──► Cancelled
/// ```
/// Completed and Cancelled are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Checks whether the lifecycle allows `self → next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Completed)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }

    /// Validates a transition for `order_id`.
    pub fn transition(&self, order_id: &str, next: OrderStatus) -> CoreResult<OrderStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                order_id: order_id.to_string(),
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown order status '{}'", other),
            }),
        }
    }
}

/// One line of an order, priced at checkout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub price: Money,
}

impl OrderItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// A placed order. Never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub company_id: String,
    pub company_name: String,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub card_last4: Option<String>,
    pub payment_method: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Checkout request: the cart of one restaurant.
///
/// The buyer is the session user; `total` is what the cart displayed and
/// must equal the sum of the lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub company_id: String,
    pub items: Vec<OrderItem>,
    pub total: Money,
}

/// Order counters for a business dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: i64,
    pub pending: i64,
    pub completed: i64,
    pub cancelled: i64,
    /// Sum of completed orders.
    pub revenue: Money,
}

// =============================================================================
// Card
// =============================================================================

/// Card network, detected from the number prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Mir,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "visa",
            CardBrand::Mastercard => "mastercard",
            CardBrand::Mir => "mir",
            CardBrand::Amex => "amex",
            CardBrand::Discover => "discover",
            CardBrand::Unknown => "unknown",
        }
    }
}

impl FromStr for CardBrand {
    type Err = std::convert::Infallible;

    /// Unrecognised names map to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "visa" => CardBrand::Visa,
            "mastercard" => CardBrand::Mastercard,
            "mir" => CardBrand::Mir,
            "amex" => CardBrand::Amex,
            "discover" => CardBrand::Discover,
            _ => CardBrand::Unknown,
        })
    }
}

/// A stored payment card with its simulated balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub user_id: String,
    /// 16 digits, no spaces.
    pub number: String,
    pub last4: String,
    pub card_holder: String,
    /// `MM/YY`
    pub expiry: String,
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub cvv: String,
    pub brand: CardBrand,
    pub is_default: bool,
    pub balance: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Card {
    /// `**** **** **** 1234`
    pub fn masked_number(&self) -> String {
        format!("**** **** **** {}", self.last4)
    }
}

/// Form for adding a card.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCard {
    /// Spaces allowed; they are stripped.
    pub number: String,
    pub card_holder: String,
    pub expiry: String,
    pub cvv: String,
    pub make_default: bool,
}

impl NewCard {
    /// Validates against `today` and returns the normalised number.
    pub fn validate(&self, today: NaiveDate) -> CoreResult<String> {
        let number = validation::validate_card_number(&self.number)?;
        validation::validate_card_holder(&self.card_holder)?;
        validation::validate_card_expiry(&self.expiry, today)?;
        validation::validate_cvv(&self.cvv)?;
        Ok(number)
    }
}

/// Form for editing a card. An empty or missing CVV keeps the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct CardUpdate {
    pub number: String,
    pub card_holder: String,
    pub expiry: String,
    pub cvv: Option<String>,
    pub make_default: bool,
}

impl CardUpdate {
    /// Validates against `today`; returns the normalised number and the CVV
    /// to store, if a new one was given.
    pub fn validate(&self, today: NaiveDate) -> CoreResult<(String, Option<String>)> {
        let number = validation::validate_card_number(&self.number)?;
        validation::validate_card_holder(&self.card_holder)?;
        validation::validate_card_expiry(&self.expiry, today)?;
        let cvv = non_blank(self.cvv.as_deref());
        if let Some(cvv) = &cvv {
            validation::validate_cvv(cvv)?;
        }
        Ok((number, cvv))
    }
}

// =============================================================================
// Product
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Listed on the storefront.
    Active,
    /// Hidden from the storefront, kept in the catalog.
    Inactive,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
        }
    }

    pub fn toggled(&self) -> ProductStatus {
        match self {
            ProductStatus::Active => ProductStatus::Inactive,
            ProductStatus::Inactive => ProductStatus::Active,
        }
    }
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Active
    }
}

impl FromStr for ProductStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!("unknown product status '{}'", other),
            }),
        }
    }
}

/// A catalog entry of one business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub company_id: String,
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub price: Money,
    pub category: String,
    /// Units in stock, never negative.
    pub quantity: i64,
    pub status: ProductStatus,
    pub image: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Storefront search: case-insensitive substring of name, ingredients
    /// or category. A blank query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self
                .ingredients
                .as_deref()
                .is_some_and(|i| i.to_lowercase().contains(&query))
            || self.category.to_lowercase().contains(&query)
    }

    /// Can be put into a cart.
    pub fn is_available(&self) -> bool {
        self.status == ProductStatus::Active && self.quantity > 0
    }
}

/// Form for adding a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub price: Money,
    pub category: String,
    pub quantity: i64,
    pub status: ProductStatus,
    pub image: Option<String>,
}

impl NewProduct {
    pub fn validate(&self) -> CoreResult<()> {
        validation::validate_product_name(&self.name)?;
        validation::validate_price(self.price)?;
        validation::validate_category(&self.category)?;
        validation::validate_stock(self.quantity)?;
        Ok(())
    }

    pub fn into_product(self, id: String, company_id: String, now: DateTime<Utc>) -> Product {
        Product {
            id,
            company_id,
            name: self.name.trim().to_string(),
            description: non_blank(self.description.as_deref()),
            ingredients: non_blank(self.ingredients.as_deref()),
            price: self.price,
            category: self.category.trim().to_string(),
            quantity: self.quantity,
            status: self.status,
            image: self.image,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a product.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub quantity: Option<i64>,
    pub status: Option<ProductStatus>,
    #[ts(type = "string | null | undefined")]
    pub image: Option<Option<String>>,
}

impl ProductPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validation::validate_product_name(name)?;
        }
        if let Some(price) = self.price {
            validation::validate_price(price)?;
        }
        if let Some(category) = &self.category {
            validation::validate_category(category)?;
        }
        if let Some(quantity) = self.quantity {
            validation::validate_stock(quantity)?;
        }
        Ok(())
    }

    pub fn apply(&self, product: &mut Product) {
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            product.description = non_blank(Some(description));
        }
        if let Some(ingredients) = &self.ingredients {
            product.ingredients = non_blank(Some(ingredients));
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = &self.category {
            product.category = category.trim().to_string();
        }
        if let Some(quantity) = self.quantity {
            product.quantity = quantity;
        }
        if let Some(status) = self.status {
            product.status = status;
        }
        if let Some(image) = &self.image {
            product.image = image.clone();
        }
    }
}

// =============================================================================
// Partnership Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    New,
    Reviewed,
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::New
    }
}

/// A "become a partner" message from the landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PartnershipRequest {
    pub id: String,
    pub email: String,
    pub message: String,
    pub status: RequestStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Session & Password Reset
// =============================================================================

/// The persisted "who is logged in" slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub email: String,
    #[ts(as = "String")]
    pub started_at: DateTime<Utc>,
}

/// An issued password-reset code.
///
/// There is no mail transport, so the code is handed back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ResetTicket {
    pub email: String,
    pub code: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

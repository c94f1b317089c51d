//! # Checkout Planning
//!
//! Turns a cart into a fully-decided checkout before anything is written.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewOrder (cart) + buyer + default card + company + catalog            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  CheckoutPlan::prepare()   ← THIS MODULE (pure, no I/O)                │
//! │   1. buyer is a customer                                               │
//! │   2. 1..=MAX_ORDER_ITEMS lines, each quantity 1..=MAX_ITEM_QUANTITY     │
//! │   3. catalog lines carry the catalog price; declared total ==          │
//! │      Σ price × quantity (overflow rejected)                            │
//! │   4. a default card exists                                             │
//! │   5. card balance ≥ total, account balance ≥ total                     │
//! │   6. stock after = max(0, stock − quantity) per matching product       │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  lowlow-db applies the plan in ONE transaction                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any rule failure happens here, before the transaction opens, so a
//! rejected checkout leaves every table untouched.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, FundsSource, ValidationError};
use crate::money::Money;
use crate::types::{Card, NewOrder, Order, OrderItem, OrderStatus, Product, Role, User};
use crate::validation::{validate_price, validate_quantity};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS};

/// Payment method recorded on every order.
pub const PAYMENT_METHOD_CARD: &str = "card";

/// New stock level for one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockUpdate {
    pub product_id: String,
    pub quantity: i64,
}

/// Everything the storage layer needs to commit a checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutPlan {
    pub total: Money,
    pub card_id: String,
    pub card_last4: String,
    pub card_balance_after: Money,
    pub user_balance_after: Money,
    /// One entry per distinct catalog product in the cart.
    pub stock: Vec<StockUpdate>,
    pub items: Vec<OrderItem>,
    buyer_id: String,
    customer_name: String,
    customer_phone: Option<String>,
    company_id: String,
    company_name: String,
}

impl CheckoutPlan {
    /// Checks every checkout rule and computes the resulting balances and
    /// stock levels.
    ///
    /// `products` is the company's catalog; cart lines whose product is not
    /// in it are charged but move no stock.
    pub fn prepare(
        buyer: &User,
        card: Option<&Card>,
        company: &User,
        products: &[Product],
        order: &NewOrder,
    ) -> CoreResult<Self> {
        if buyer.role != Role::User {
            return Err(CoreError::forbidden("place orders", buyer.role));
        }
        if company.role != Role::Business || company.id != order.company_id {
            return Err(CoreError::UserNotFound(order.company_id.clone()));
        }

        if order.items.is_empty() {
            return Err(CoreError::EmptyOrder);
        }
        if order.items.len() > MAX_ORDER_ITEMS {
            return Err(CoreError::OrderTooLarge {
                max: MAX_ORDER_ITEMS,
            });
        }
        for item in &order.items {
            if item.quantity > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: item.quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            validate_quantity(item.quantity)?;
            validate_price(item.price)?;
            if let Some(product) = catalog_entry(products, &order.company_id, &item.product_id) {
                if product.price != item.price {
                    return Err(CoreError::PriceMismatch {
                        product_id: item.product_id.clone(),
                        declared: item.price.tiyn(),
                        catalog: product.price.tiyn(),
                    });
                }
            }
        }

        let computed = order_total(&order.items).ok_or_else(|| ValidationError::OutOfRange {
            field: "total".to_string(),
            min: 0,
            max: i64::MAX,
        })?;
        if computed != order.total {
            return Err(CoreError::TotalMismatch {
                declared: order.total.tiyn(),
                computed: computed.tiyn(),
            });
        }
        let total = computed;

        let card = card.ok_or_else(|| CoreError::NoDefaultCard {
            user_id: buyer.id.clone(),
        })?;
        let card_balance_after =
            card.balance
                .checked_debit(total)
                .ok_or(CoreError::InsufficientFunds {
                    funds: FundsSource::Card,
                    available: card.balance.tiyn(),
                    required: total.tiyn(),
                })?;
        let user_balance_after =
            buyer
                .balance
                .checked_debit(total)
                .ok_or(CoreError::InsufficientFunds {
                    funds: FundsSource::Account,
                    available: buyer.balance.tiyn(),
                    required: total.tiyn(),
                })?;

        Ok(CheckoutPlan {
            total,
            card_id: card.id.clone(),
            card_last4: card.last4.clone(),
            card_balance_after,
            user_balance_after,
            stock: plan_stock(products, &order.company_id, &order.items),
            items: order.items.clone(),
            buyer_id: buyer.id.clone(),
            customer_name: buyer.display_name().to_string(),
            customer_phone: buyer.phone.clone(),
            company_id: company.id.clone(),
            company_name: company.display_name().to_string(),
        })
    }

    /// Builds the order record this plan commits.
    pub fn to_order(&self, id: String, now: DateTime<Utc>) -> Order {
        Order {
            id,
            user_id: self.buyer_id.clone(),
            company_id: self.company_id.clone(),
            company_name: self.company_name.clone(),
            customer_name: self.customer_name.clone(),
            customer_phone: self.customer_phone.clone(),
            items: self.items.clone(),
            total: self.total,
            status: OrderStatus::Pending,
            card_last4: Some(self.card_last4.clone()),
            payment_method: PAYMENT_METHOD_CARD.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Sum of `price × quantity` over the lines, `None` on overflow.
pub fn order_total(items: &[OrderItem]) -> Option<Money> {
    items.iter().try_fold(Money::zero(), |acc, item| {
        acc.checked_add(item.price.checked_mul(item.quantity)?)
    })
}

fn catalog_entry<'a>(
    products: &'a [Product],
    company_id: &str,
    product_id: &str,
) -> Option<&'a Product> {
    products
        .iter()
        .find(|p| p.id == product_id && p.company_id == company_id)
}

/// Decrements stock per product, clamped at zero.
///
/// Repeated lines for the same product accumulate.
fn plan_stock(products: &[Product], company_id: &str, items: &[OrderItem]) -> Vec<StockUpdate> {
    let mut levels: HashMap<&str, i64> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();

    for item in items {
        let Some(product) = catalog_entry(products, company_id, &item.product_id) else {
            continue;
        };

        let level = levels.entry(product.id.as_str()).or_insert_with(|| {
            order.push(product.id.as_str());
            product.quantity
        });
        *level = (*level - item.quantity).max(0);
    }

    order
        .into_iter()
        .map(|id| StockUpdate {
            product_id: id.to_string(),
            quantity: levels[id],
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CardBrand, ProductStatus};

    fn user(id: &str, role: Role, balance: i64) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            role,
            email: format!("{}@example.com", id),
            password_hash: String::new(),
            nickname: Some(id.to_string()),
            company_name: (role == Role::Business).then(|| "Okadzaki Sushi".to_string()),
            is_active: true,
            balance: Money::from_tenge(balance),
            avatar: None,
            first_name: None,
            phone: Some("+7 (701) 000-00-00".to_string()),
            city: None,
            address: None,
            bin: None,
            director_first_name: None,
            director_last_name: None,
            opening_time: None,
            closing_time: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn card(balance: i64) -> Card {
        Card {
            id: "c1".to_string(),
            user_id: "buyer".to_string(),
            number: "4111111111114242".to_string(),
            last4: "4242".to_string(),
            card_holder: "BUYER".to_string(),
            expiry: "12/30".to_string(),
            cvv: "123".to_string(),
            brand: CardBrand::Visa,
            is_default: true,
            balance: Money::from_tenge(balance),
            created_at: Utc::now(),
        }
    }

    fn product(id: &str, price: i64, quantity: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            company_id: "shop".to_string(),
            name: id.to_string(),
            description: None,
            ingredients: None,
            price: Money::from_tenge(price),
            category: "Роллы".to_string(),
            quantity,
            status: ProductStatus::Active,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(product_id: &str, price: i64, quantity: i64) -> OrderItem {
        OrderItem {
            product_id: product_id.to_string(),
            name: product_id.to_string(),
            quantity,
            price: Money::from_tenge(price),
        }
    }

    fn new_order(items: Vec<OrderItem>) -> NewOrder {
        let total = items.iter().map(OrderItem::line_total).sum();
        NewOrder {
            company_id: "shop".to_string(),
            items,
            total,
        }
    }

    #[test]
    fn test_plan_debits_and_clamps_stock() {
        let buyer = user("buyer", Role::User, 10_000);
        let shop = user("shop", Role::Business, 0);
        let catalog = vec![product("roll", 2_000, 5), product("soup", 1_000, 1)];
        let order = new_order(vec![line("roll", 2_000, 2), line("soup", 1_000, 3)]);

        let plan = CheckoutPlan::prepare(&buyer, Some(&card(50_000)), &shop, &catalog, &order)
            .unwrap();

        assert_eq!(plan.total, Money::from_tenge(7_000));
        assert_eq!(plan.card_balance_after, Money::from_tenge(43_000));
        assert_eq!(plan.user_balance_after, Money::from_tenge(3_000));
        assert_eq!(
            plan.stock,
            vec![
                StockUpdate {
                    product_id: "roll".to_string(),
                    quantity: 3
                },
                StockUpdate {
                    product_id: "soup".to_string(),
                    quantity: 0
                },
            ]
        );

        let placed = plan.to_order("o1".to_string(), Utc::now());
        assert_eq!(placed.status, OrderStatus::Pending);
        assert_eq!(placed.card_last4.as_deref(), Some("4242"));
        assert_eq!(placed.company_name, "Okadzaki Sushi");
        assert_eq!(placed.customer_name, "buyer");
    }

    #[test]
    fn test_repeated_lines_accumulate_and_unknown_products_skip_stock() {
        let buyer = user("buyer", Role::User, 10_000);
        let shop = user("shop", Role::Business, 0);
        let catalog = vec![product("roll", 100, 4)];
        let order = new_order(vec![
            line("roll", 100, 1),
            line("ghost", 100, 1),
            line("roll", 100, 2),
        ]);

        let plan = CheckoutPlan::prepare(&buyer, Some(&card(10_000)), &shop, &catalog, &order)
            .unwrap();
        assert_eq!(plan.stock.len(), 1);
        assert_eq!(plan.stock[0].quantity, 1);
        assert_eq!(plan.total, Money::from_tenge(400));
    }

    #[test]
    fn test_catalog_price_wins_over_cart_price() {
        let buyer = user("buyer", Role::User, 10_000);
        let shop = user("shop", Role::Business, 0);
        let catalog = vec![product("roll", 2_000, 5)];

        let mut cheap = line("roll", 2_000, 3);
        cheap.price = Money::from_tiyn(1);
        let order = new_order(vec![cheap]);

        let err = CheckoutPlan::prepare(&buyer, Some(&card(10_000)), &shop, &catalog, &order)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::PriceMismatch {
                declared: 1,
                catalog: 200_000,
                ..
            }
        ));
    }

    #[test]
    fn test_oversized_prices_cannot_wrap_the_total() {
        let buyer = user("buyer", Role::User, 10_000);
        let shop = user("shop", Role::Business, 0);
        let line = OrderItem {
            product_id: "ghost".to_string(),
            name: "ghost".to_string(),
            quantity: 4,
            price: Money::from_tiyn(1 << 62),
        };
        assert_eq!(order_total(std::slice::from_ref(&line)), None);

        let order = NewOrder {
            company_id: "shop".to_string(),
            items: vec![line],
            total: Money::zero(),
        };
        let err = CheckoutPlan::prepare(&buyer, Some(&card(10_000)), &shop, &[], &order)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_insufficient_card_funds() {
        let buyer = user("buyer", Role::User, 10_000);
        let shop = user("shop", Role::Business, 0);
        let order = new_order(vec![line("roll", 2_000, 1)]);

        let err = CheckoutPlan::prepare(&buyer, Some(&card(1_999)), &shop, &[], &order)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientFunds {
                funds: FundsSource::Card,
                ..
            }
        ));
    }

    #[test]
    fn test_insufficient_account_funds() {
        let buyer = user("buyer", Role::User, 500);
        let shop = user("shop", Role::Business, 0);
        let order = new_order(vec![line("roll", 2_000, 1)]);

        let err = CheckoutPlan::prepare(&buyer, Some(&card(50_000)), &shop, &[], &order)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientFunds {
                funds: FundsSource::Account,
                ..
            }
        ));
    }

    #[test]
    fn test_rejections() {
        let buyer = user("buyer", Role::User, 10_000);
        let shop = user("shop", Role::Business, 0);
        let good = new_order(vec![line("roll", 100, 1)]);

        let err = CheckoutPlan::prepare(&buyer, None, &shop, &[], &good).unwrap_err();
        assert!(matches!(err, CoreError::NoDefaultCard { .. }));

        let owner = user("owner", Role::Business, 10_000);
        let err = CheckoutPlan::prepare(&owner, Some(&card(1_000)), &shop, &[], &good)
            .unwrap_err();
        assert!(matches!(err, CoreError::PermissionDenied { .. }));

        let empty = new_order(vec![]);
        let err = CheckoutPlan::prepare(&buyer, Some(&card(1_000)), &shop, &[], &empty)
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptyOrder));

        let mut lying = new_order(vec![line("roll", 100, 2)]);
        lying.total = Money::from_tenge(100);
        let err = CheckoutPlan::prepare(&buyer, Some(&card(1_000)), &shop, &[], &lying)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::TotalMismatch {
                declared: 10_000,
                computed: 20_000
            }
        ));

        let huge = new_order(vec![line("roll", 1, MAX_ITEM_QUANTITY + 1)]);
        let err = CheckoutPlan::prepare(&buyer, Some(&card(1_000)), &shop, &[], &huge)
            .unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
    }
}

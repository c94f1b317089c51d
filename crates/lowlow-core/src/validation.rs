//! # Validation Module
//!
//! Input validation rules for the LowLow store.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Forms (browser)                                              │
//! │  └── Immediate feedback, not trusted                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Commands (Rust)                                              │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field rules                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (email), partial UNIQUE (default card)                     │
//! │  └── CHECK (balance >= 0, quantity >= 0)                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use lowlow_core::validation::{validate_email, validate_card_number};
//!
//! validate_email("aigerim@example.com").unwrap();
//! assert_eq!(
//!     validate_card_number("4111 1111 1111 1111").unwrap(),
//!     "4111111111111111"
//! );
//! ```

use chrono::{Datelike, NaiveDate};

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_ITEM_QUANTITY, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

fn max_chars(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

// =============================================================================
// Account Fields
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - At most 254 characters
/// - Contains `@` with text on both sides
///
/// The seeded admin logs in as plain `admin`; seeded accounts bypass this
/// check because they are never created through a form.
///
/// ```rust
/// use lowlow_core::validation::validate_email;
///
/// assert!(validate_email("okadzaki@example.com").is_ok());
/// assert!(validate_email("okadzaki").is_err());
/// assert!(validate_email("@example.com").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    required("email", email)?;
    max_chars("email", email, 254)?;

    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        }),
    }
}

/// Validates a new password: at least [`MIN_PASSWORD_LEN`] characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    required("password", password)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    max_chars("password", password, 128)
}

/// Validates a customer nickname (2 to 50 characters).
pub fn validate_nickname(nickname: &str) -> ValidationResult<()> {
    let nickname = nickname.trim();
    required("nickname", nickname)?;
    if nickname.chars().count() < 2 {
        return Err(ValidationError::TooShort {
            field: "nickname".to_string(),
            min: 2,
        });
    }
    max_chars("nickname", nickname, 50)
}

/// Validates a company name (required, at most 100 characters).
pub fn validate_company_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    required("companyName", name)?;
    max_chars("companyName", name, 100)
}

/// Validates a business identification number: exactly 12 digits.
pub fn validate_bin(bin: &str) -> ValidationResult<()> {
    let bin = bin.trim();
    if bin.len() != 12 || !bin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "bin".to_string(),
            reason: "must be 12 digits".to_string(),
        });
    }
    Ok(())
}

/// Validates an opening/closing time in `HH:MM` (24h).
pub fn validate_time_of_day(field: &str, time: &str) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be HH:MM".to_string(),
    };

    let (hours, minutes) = time.trim().split_once(':').ok_or_else(invalid)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(invalid());
    }
    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    Ok(())
}

/// Checks whether an inline avatar fits the configured byte limit.
///
/// Oversized avatars are not an error: the caller drops them and saves the
/// rest of the record.
#[inline]
pub fn avatar_fits(avatar: &str, max_bytes: usize) -> bool {
    avatar.len() <= max_bytes
}

// =============================================================================
// Card Fields
// =============================================================================

/// Validates a card number and returns it without spaces.
///
/// ## Rules
/// - Spaces are ignored
/// - Exactly 16 ASCII digits remain
///
/// No Luhn check: demo numbers like `1234 5678 9012 3456` are accepted.
pub fn validate_card_number(number: &str) -> ValidationResult<String> {
    let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
    required("cardNumber", &digits)?;
    if digits.len() != 16 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "cardNumber".to_string(),
            reason: "must be 16 digits".to_string(),
        });
    }
    Ok(digits)
}

/// Validates the holder name printed on the card.
pub fn validate_card_holder(holder: &str) -> ValidationResult<()> {
    let holder = holder.trim();
    required("cardHolder", holder)?;
    max_chars("cardHolder", holder, 100)
}

/// Validates an `MM/YY` expiry against `today`.
///
/// A card is valid through the last day of its expiry month.
///
/// ```rust
/// use chrono::NaiveDate;
/// use lowlow_core::validation::validate_card_expiry;
///
/// let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// assert!(validate_card_expiry("10/26", today).is_ok());
/// assert!(validate_card_expiry("09/26", today).is_err());
/// assert!(validate_card_expiry("13/27", today).is_err());
/// ```
pub fn validate_card_expiry(expiry: &str, today: NaiveDate) -> ValidationResult<()> {
    let invalid = || ValidationError::InvalidFormat {
        field: "expiry".to_string(),
        reason: "must be MM/YY".to_string(),
    };

    let expiry = expiry.trim();
    required("expiry", expiry)?;
    let (month, year) = expiry.split_once('/').ok_or_else(invalid)?;
    if month.len() != 2 || year.len() != 2 {
        return Err(invalid());
    }
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }

    let year = 2000 + year;
    if (year, month) < (today.year(), today.month()) {
        return Err(ValidationError::Expired {
            field: "expiry".to_string(),
        });
    }
    Ok(())
}

/// Validates a CVV: exactly 3 digits.
pub fn validate_cvv(cvv: &str) -> ValidationResult<()> {
    let cvv = cvv.trim();
    if cvv.len() != 3 || !cvv.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidFormat {
            field: "cvv".to_string(),
            reason: "must be 3 digits".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Catalog & Order Fields
// =============================================================================

/// Validates a product name (required, at most 200 characters).
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();
    required("name", name)?;
    max_chars("name", name, 200)
}

/// Validates a product category (required, at most 50 characters).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    let category = category.trim();
    required("category", category)?;
    max_chars("category", category, 50)
}

/// Validates a product price: strictly positive, at most
/// [`MAX_PRICE_TENGE`](crate::MAX_PRICE_TENGE).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    let max = Money::from_tenge(crate::MAX_PRICE_TENGE);
    if price > max {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 1,
            max: max.tiyn(),
        });
    }
    Ok(())
}

/// Validates a stock level: zero or more.
pub fn validate_stock(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates the quantity of an order line: 1 to [`MAX_ITEM_QUANTITY`].
///
/// ```rust
/// use lowlow_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a partnership message (required, at most 2000 characters).
pub fn validate_message(message: &str) -> ValidationResult<()> {
    let message = message.trim();
    required("message", message)?;
    max_chars("message", message, 2000)
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Card Rules
//!
//! Pure bookkeeping for a user's payment cards.
//!
//! ## The Default-Card Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  cards.len() == 0  ⇒  no default                                       │
//! │  cards.len() >= 1  ⇒  exactly one card has is_default = true           │
//! │                                                                         │
//! │  add (first card)      → new card is default                           │
//! │  add (make_default)    → flag moves to the new card                    │
//! │  set_default(id)       → flag moves to id                              │
//! │  delete(default card)  → flag moves to the first remaining card        │
//! │                          in display order                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The storage layer enforces the "at most one" half with a partial unique
//! index. The functions here decide which card gets the flag.

use std::cmp::Ordering;

use crate::types::{Card, CardBrand};

/// Detects the card network from the leading digits.
///
/// ```rust
/// use lowlow_core::cards::detect_brand;
/// use lowlow_core::CardBrand;
///
/// assert_eq!(detect_brand("4111111111111111"), CardBrand::Visa);
/// assert_eq!(detect_brand("5212345678901234"), CardBrand::Mastercard);
/// assert_eq!(detect_brand("2200123456789012"), CardBrand::Mir);
/// assert_eq!(detect_brand("9999999999999999"), CardBrand::Unknown);
/// ```
pub fn detect_brand(number: &str) -> CardBrand {
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();
    let prefix2 = digits.get(..2).and_then(|p| p.parse::<u32>().ok());

    if digits.starts_with('4') {
        CardBrand::Visa
    } else if matches!(prefix2, Some(51..=55)) {
        CardBrand::Mastercard
    } else if digits.starts_with('2') {
        CardBrand::Mir
    } else if matches!(prefix2, Some(34) | Some(37)) {
        CardBrand::Amex
    } else if digits.starts_with("6011") || digits.starts_with("65") {
        CardBrand::Discover
    } else {
        CardBrand::Unknown
    }
}

/// Last four digits of a card number.
pub fn last4(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(4);
    digits[start..].iter().collect()
}

/// Display order: the default card first, then oldest first.
pub fn display_order(a: &Card, b: &Card) -> Ordering {
    b.is_default
        .cmp(&a.is_default)
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sorts cards into display order in place.
pub fn sort_for_display(cards: &mut [Card]) {
    cards.sort_by(display_order);
}

/// Whether a card being added should carry the default flag.
///
/// The first card of a user is always the default.
#[inline]
pub fn new_card_is_default(existing: &[Card], make_default: bool) -> bool {
    existing.is_empty() || make_default
}

/// Picks the card that inherits the default flag after `removed` is deleted.
///
/// Returns `None` when the removed card was not the default or when no
/// cards remain.
pub fn successor_default<'a>(removed: &Card, remaining: &'a [Card]) -> Option<&'a Card> {
    if !removed.is_default {
        return None;
    }
    remaining
        .iter()
        .filter(|c| c.id != removed.id)
        .min_by(|a, b| display_order(a, b))
}

/// Repairs a card list so exactly one card is the default.
///
/// Keeps the first default in display order; if there is none, the oldest
/// card becomes default. Used when importing data that predates the
/// invariant. Returns `true` if any flag changed.
pub fn normalize_defaults(cards: &mut [Card]) -> bool {
    if cards.is_empty() {
        return false;
    }

    let keep = cards
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| display_order(a, b))
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut changed = false;
    for (i, card) in cards.iter_mut().enumerate() {
        let should_be_default = i == keep;
        if card.is_default != should_be_default {
            card.is_default = should_be_default;
            changed = true;
        }
    }
    changed
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use chrono::{Duration, TimeZone, Utc};

    fn card(id: &str, is_default: bool, age_days: i64) -> Card {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        Card {
            id: id.to_string(),
            user_id: "u1".to_string(),
            number: "4111111111111111".to_string(),
            last4: "1111".to_string(),
            card_holder: "AIGERIM K".to_string(),
            expiry: "12/28".to_string(),
            cvv: "123".to_string(),
            brand: CardBrand::Visa,
            is_default,
            balance: Money::from_tenge(100_000),
            created_at: base - Duration::days(age_days),
        }
    }

    fn defaults(cards: &[Card]) -> usize {
        cards.iter().filter(|c| c.is_default).count()
    }

    #[test]
    fn test_detect_brand_prefixes() {
        assert_eq!(detect_brand("4000 0000 0000 0002"), CardBrand::Visa);
        assert_eq!(detect_brand("5100000000000000"), CardBrand::Mastercard);
        assert_eq!(detect_brand("5500000000000000"), CardBrand::Mastercard);
        assert_eq!(detect_brand("5600000000000000"), CardBrand::Unknown);
        assert_eq!(detect_brand("2202000000000000"), CardBrand::Mir);
        assert_eq!(detect_brand("3400000000000000"), CardBrand::Amex);
        assert_eq!(detect_brand("3700000000000000"), CardBrand::Amex);
        assert_eq!(detect_brand("6011000000000000"), CardBrand::Discover);
        assert_eq!(detect_brand("6500000000000000"), CardBrand::Discover);
        assert_eq!(detect_brand(""), CardBrand::Unknown);
    }

    #[test]
    fn test_last4() {
        assert_eq!(last4("4111 1111 1111 4242"), "4242");
        assert_eq!(last4("12"), "12");
    }

    #[test]
    fn test_display_order_default_first_then_oldest() {
        let mut cards = vec![card("new", false, 1), card("def", true, 2), card("old", false, 10)];
        sort_for_display(&mut cards);
        let ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["def", "old", "new"]);
    }

    #[test]
    fn test_first_card_is_default() {
        assert!(new_card_is_default(&[], false));
        assert!(!new_card_is_default(&[card("a", true, 1)], false));
        assert!(new_card_is_default(&[card("a", true, 1)], true));
    }

    #[test]
    fn test_successor_after_deleting_default() {
        let removed = card("def", true, 5);
        let remaining = vec![card("young", false, 1), card("old", false, 9)];
        assert_eq!(successor_default(&removed, &remaining).unwrap().id, "old");

        let not_default = card("x", false, 5);
        assert!(successor_default(&not_default, &remaining).is_none());
        assert!(successor_default(&removed, &[]).is_none());
    }

    #[test]
    fn test_normalize_defaults() {
        let mut none = vec![card("a", false, 1), card("b", false, 3)];
        assert!(normalize_defaults(&mut none));
        assert_eq!(defaults(&none), 1);
        assert!(none[1].is_default);

        let mut many = vec![card("a", true, 1), card("b", true, 3)];
        assert!(normalize_defaults(&mut many));
        assert_eq!(defaults(&many), 1);
        assert!(many[1].is_default);

        let mut ok = vec![card("a", true, 1), card("b", false, 3)];
        assert!(!normalize_defaults(&mut ok));
    }
}

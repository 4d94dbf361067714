//! # Validation Module
//!
//! Input validation for till operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Front end                                                    │
//! │  ├── Basic format checks (empty, numeric keyboard)                     │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Amount parsing (no floats)                                        │
//! │  └── Sign / emptiness rules, before any write                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK constraints on amounts                                      │
//! │  └── Partial UNIQUE index: one open shift per location                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nano_core::validation::{parse_amount, validate_declared_cash};
//!
//! let declared = parse_amount("declared cash", "5900").unwrap();
//! validate_declared_cash(declared).unwrap();
//!
//! assert!(parse_amount("declared cash", "").is_err());
//! ```

use crate::error::ValidationError;
use crate::money::{AmountParseError, Money};
use crate::{MAX_AMOUNT, MAX_DESCRIPTION_LEN, MAX_ITEM_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Amount Parsing
// =============================================================================

/// Parses operator-typed text into Money for the named field.
///
/// Empty input is `Required`; anything unreadable is `InvalidAmount`.
pub fn parse_amount(field: &str, raw: &str) -> ValidationResult<Money> {
    Money::parse_decimal(raw).map_err(|e| match e {
        AmountParseError::Empty => ValidationError::Required {
            field: field.to_string(),
        },
        other => ValidationError::InvalidAmount {
            field: field.to_string(),
            reason: other.to_string(),
        },
    })
}

// =============================================================================
// Amount Validators
// =============================================================================

fn non_negative(field: &str, amount: Money) -> ValidationResult<Money> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    at_most_max(field, amount, 0)
}

fn positive(field: &str, amount: Money) -> ValidationResult<Money> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    at_most_max(field, amount, 1)
}

fn at_most_max(field: &str, amount: Money, min: i64) -> ValidationResult<Money> {
    if amount > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT.cents(),
        });
    }
    Ok(amount)
}

/// Validates the cash placed in the drawer at a fresh open.
///
/// ## Rules
/// - Must be supplied (a relay never asks for it, a fresh open always does)
/// - Zero is allowed (a drawer can start empty)
/// - Negative is rejected
/// - At most [`MAX_AMOUNT`]
///
/// ## Example
/// ```rust
/// use nano_core::money::Money;
/// use nano_core::validation::validate_opening_balance;
///
/// assert!(validate_opening_balance(Some(Money::from_major(5000))).is_ok());
/// assert!(validate_opening_balance(Some(Money::zero())).is_ok());
/// assert!(validate_opening_balance(Some(Money::from_major(-1))).is_err());
/// assert!(validate_opening_balance(None).is_err());
/// ```
pub fn validate_opening_balance(amount: Option<Money>) -> ValidationResult<Money> {
    let amount = amount.ok_or_else(|| ValidationError::Required {
        field: "opening balance".to_string(),
    })?;
    non_negative("opening balance", amount)
}

/// Validates a sale total posted to the till. Must be > 0.
pub fn validate_sale_total(amount: Money) -> ValidationResult<Money> {
    positive("sale total", amount)
}

/// Validates the physically counted cash at close. Zero is allowed.
pub fn validate_declared_cash(amount: Money) -> ValidationResult<Money> {
    non_negative("declared cash", amount)
}

/// Validates an expense withdrawal.
///
/// ## Rules
/// - Amount > 0
/// - Description non-empty after trimming, at most 200 characters
///
/// ## Returns
/// The amount and the trimmed description.
pub fn validate_expense(amount: Money, description: &str) -> ValidationResult<(Money, String)> {
    let amount = positive("expense amount", amount)?;

    let description = description.trim();
    if description.is_empty() {
        return Err(ValidationError::Required {
            field: "description".to_string(),
        });
    }
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LEN,
        });
    }

    Ok((amount, description.to_string()))
}

/// Validates a cart quantity (1..=999).
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

/// Validates a unit price (zero allowed for giveaways, never negative).
pub fn validate_price(price: Money) -> ValidationResult<()> {
    non_negative("price", price).map(|_| ())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("x", "5900"), Ok(Money::from_major(5900)));
        assert_eq!(
            parse_amount("declared cash", ""),
            Err(ValidationError::Required {
                field: "declared cash".to_string()
            })
        );
        assert!(matches!(
            parse_amount("declared cash", "mucho"),
            Err(ValidationError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_validate_opening_balance() {
        assert!(validate_opening_balance(Some(Money::from_major(5000))).is_ok());
        assert!(validate_opening_balance(Some(Money::zero())).is_ok());
        assert!(matches!(
            validate_opening_balance(Some(Money::from_cents(-1))),
            Err(ValidationError::MustNotBeNegative { .. })
        ));
        assert!(matches!(
            validate_opening_balance(None),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_sale_total() {
        assert!(validate_sale_total(Money::from_cents(1)).is_ok());
        assert!(validate_sale_total(Money::zero()).is_err());
        assert!(validate_sale_total(Money::from_cents(-100)).is_err());
    }

    #[test]
    fn test_validate_declared_cash() {
        assert!(validate_declared_cash(Money::zero()).is_ok());
        assert!(validate_declared_cash(Money::from_major(5900)).is_ok());
        assert!(validate_declared_cash(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_expense() {
        let (amount, description) =
            validate_expense(Money::from_major(300), "  supplier payment ").unwrap();
        assert_eq!(amount, Money::from_major(300));
        assert_eq!(description, "supplier payment");

        assert!(validate_expense(Money::zero(), "x").is_err());
        assert!(validate_expense(Money::from_major(1), "   ").is_err());
        assert!(validate_expense(Money::from_major(1), &"a".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_amounts_above_ceiling_rejected() {
        let over = Money::from_cents(MAX_AMOUNT.cents() + 1);
        let out_of_range = |r: ValidationResult<Money>| {
            matches!(r, Err(ValidationError::OutOfRange { max, .. }) if max == MAX_AMOUNT.cents())
        };

        assert!(out_of_range(validate_opening_balance(Some(over))));
        assert!(out_of_range(validate_sale_total(over)));
        assert!(out_of_range(validate_declared_cash(over)));
        assert!(out_of_range(validate_expense(over, "rent").map(|(m, _)| m)));
        assert!(validate_price(over).is_err());

        // The ceiling itself is accepted
        assert_eq!(validate_declared_cash(MAX_AMOUNT), Ok(MAX_AMOUNT));
        assert_eq!(validate_sale_total(MAX_AMOUNT), Ok(MAX_AMOUNT));

        // Largest parseable amount parses, then fails the ceiling
        let parsed = parse_amount("declared cash", "92233720368547758.07").unwrap();
        assert!(out_of_range(validate_declared_cash(parsed)));
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_cents(-5)).is_err());
    }
}

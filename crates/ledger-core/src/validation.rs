//! # Validation Module
//!
//! Input checks that run before the engine touches stock.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer                                                │
//! │  └── Deserialization into NewHeader / NewLineItem                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── required ids present                                              │
//! │  ├── quantity ≥ 1 and within MAX_LINE_QUANTITY                         │
//! │  └── dates parse as YYYY-MM-DD                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── CHECK (stock >= 0)                                                │
//! │  └── UNIQUE / FOREIGN KEY constraints                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_CONVERSION_VALUE, MAX_LINE_AMOUNT, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// The one calendar format accepted for transaction and expiry dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validates that a required identifier is present.
///
/// ## Example
/// ```rust
/// use ledger_core::validation::validate_required;
///
/// assert!(validate_required("product_id", "PRD-1").is_ok());
/// assert!(validate_required("product_id", "  ").is_err());
/// ```
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a line quantity (≥ 1, ≤ [`MAX_LINE_QUANTITY`]).
///
/// ## Example
/// ```rust
/// use ledger_core::validation::validate_quantity;
///
/// assert!(validate_quantity(1).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(-3).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a monetary input (prices, discounts): zero up to
/// [`MAX_LINE_AMOUNT`].
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() || amount.minor() > MAX_LINE_AMOUNT {
        return Err(amount_out_of_range(field));
    }
    Ok(())
}

/// Validates a unit conversion multiplier (1 to [`MAX_CONVERSION_VALUE`]).
pub fn validate_multiplier(value: i64) -> ValidationResult<()> {
    if value < 1 {
        return Err(ValidationError::MustBePositive {
            field: "value_conv".to_string(),
        });
    }

    if value > MAX_CONVERSION_VALUE {
        return Err(ValidationError::OutOfRange {
            field: "value_conv".to_string(),
            min: 1,
            max: MAX_CONVERSION_VALUE,
        });
    }

    Ok(())
}

/// `price × qty` for a line, or `OutOfRange` when the product leaves
/// `0..=MAX_LINE_AMOUNT`.
///
/// ## Example
/// ```rust
/// use ledger_core::money::Money;
/// use ledger_core::validation::line_amount;
///
/// assert_eq!(line_amount("sub_total", Money::from_minor(1500), 3).unwrap().minor(), 4500);
/// assert!(line_amount("sub_total", Money::from_minor(i64::MAX / 2), 3).is_err());
/// ```
pub fn line_amount(field: &str, price: Money, qty: i64) -> ValidationResult<Money> {
    price
        .checked_multiply_quantity(qty)
        .filter(|amount| amount.minor().unsigned_abs() <= MAX_LINE_AMOUNT as u64)
        .ok_or_else(|| amount_out_of_range(field))
}

fn amount_out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: MAX_LINE_AMOUNT,
    }
}

/// Parses a `YYYY-MM-DD` date.
///
/// ## Example
/// ```rust
/// use ledger_core::validation::parse_calendar_date;
///
/// let date = parse_calendar_date("expired_date", "2026-03-31").unwrap();
/// assert_eq!(date.to_string(), "2026-03-31");
/// assert!(parse_calendar_date("expired_date", "31/03/2026").is_err());
/// ```
pub fn parse_calendar_date(field: &str, value: &str) -> ValidationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("expected YYYY-MM-DD ({})", e),
        }
    })
}

/// Parses an optional date; absent or blank means `None`.
pub fn parse_optional_date(field: &str, value: Option<&str>) -> ValidationResult<Option<NaiveDate>> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_calendar_date(field, raw).map(Some),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

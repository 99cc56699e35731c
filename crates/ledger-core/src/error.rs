//! # Error Types
//!
//! Domain-specific error types for ledger-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  ledger-core errors (this file)                                        │
//! │  ├── CoreError        - Ledger rule violations                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  ledger-db errors (separate crate)                                     │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - What callers see (Core | Storage) + ErrorKind  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant carries the ids and quantities needed to explain itself;
//! the messages are what the operator sees.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Ledger rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Malformed date, missing field, non-positive quantity.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    /// Referenced product, unit, header or origin transaction does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A decrease would drive on-hand stock below zero.
    ///
    /// ## When This Occurs
    /// ```text
    /// Sale item (qty: 6)
    ///      │
    ///      ▼
    /// decrease(P, 6) with stock = 5
    ///      │
    ///      ▼
    /// InsufficientStock { product_id: "P", available: 5, requested: 6 }
    ///      │
    ///      ▼
    /// whole transaction rolls back
    /// ```
    #[error("Insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// Cumulative returns against one origin line would exceed what was
    /// originally transacted.
    #[error(
        "Return quantity for {product_id} exceeds original: original {original}, \
         already returned {already_returned}, requested {requested}"
    )]
    ReturnExceedsOriginal {
        product_id: String,
        original: i64,
        already_returned: i64,
        requested: i64,
    },

    /// Usage-metered branch has no quota left.
    #[error("Quota exceeded for branch {branch_id}")]
    QuotaExceeded { branch_id: String },

    /// Duplicate definition (e.g. a second conversion for the same
    /// product, source unit, target unit and branch).
    #[error("Conflict: {message}")]
    Conflict { message: String },
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        CoreError::Conflict {
            message: message.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any stock is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g. a date that is not YYYY-MM-DD).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

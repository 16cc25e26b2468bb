//! # Error Types
//!
//! Domain-specific error types for rxpos-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  rxpos-core errors (this file)                                         │
//! │  ├── CoreError        - Client-fixable domain failures                 │
//! │  └── ValidationError  - Field-level input validation failures          │
//! │                                                                         │
//! │  rxpos-db errors (separate crate)                                      │
//! │  ├── DbError          - Storage failures                               │
//! │  └── SaleError        - CoreError | DbError for the sale transaction   │
//! │                                                                         │
//! │  rxpos-server errors                                                   │
//! │  └── ApiError         - What the front end sees (status + envelope)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → SaleError → ApiError → Frontend   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Domain errors. Every variant is something the caller can fix.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced product id does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// A requested sale id does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Requested quantity exceeds the stock on hand.
    ///
    /// ## When This Occurs
    /// - Precondition check: cart line asks for more than `stock`
    /// - Commit time: a concurrent sale consumed the stock first and the
    ///   guarded decrement refused to go negative
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout (Paracetamol × 5)
    ///      │
    ///      ▼
    /// Check stock: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Paracetamol 500mg", available: 2, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 Paracetamol 500mg in stock"
    /// ```
    #[error("Insufficient stock for {name} ({product_id}): available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The request is well-formed JSON but violates a sale rule
    /// (e.g. negative final total, amount overflow).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates an InvalidRequest error.
    pub fn invalid(reason: impl Into<String>) -> Self {
        CoreError::InvalidRequest(reason.into())
    }

    /// True for the variants that translate to "not found" at the boundary.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_))
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur before any business logic runs, while a loosely-typed request
/// is being turned into a validated one.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., malformed phone number, bad date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Two fields are individually valid but inconsistent with each other.
    #[error("{field} {reason}")]
    Inconsistent { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            name: "Paracetamol 500mg".to_string(),
            available: 2,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Paracetamol 500mg (p-1): available 2, requested 5"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::Negative {
            field: "stock".to_string(),
        };
        assert_eq!(err.to_string(), "stock cannot be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
        assert!(CoreError::SaleNotFound("s".into()).is_not_found());
    }
}

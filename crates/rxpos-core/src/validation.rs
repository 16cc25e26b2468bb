//! # Validation Module
//!
//! Input validation utilities for RxPOS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Frontend (TypeScript)                                        │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: rxpos-core (THIS MODULE)                                     │
//! │  ├── Field rules (lengths, signs, formats)                             │
//! │  └── Cross-field rules (sell price >= buy price)                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (stock >= 0, quantity > 0, ...)                 │
//! │  ├── UNIQUE constraints (barcode, customer phone)                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rxpos_core::validation::{validate_price_pair, validate_quantity};
//!
//! validate_quantity(5).unwrap();
//! assert!(validate_price_pair(100, 80).is_err()); // sell below buy
//! ```

use crate::error::ValidationError;
use crate::types::PaymentMethod;
use crate::MAX_CART_LINES;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name (1..=200 characters after trimming).
///
/// ```rust
/// use rxpos_core::validation::validate_product_name;
///
/// assert!(validate_product_name("Ibuprofen 400mg").is_ok());
/// assert!(validate_product_name("   ").is_err());
/// ```
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, 200)
}

/// Validates a product category (1..=100 characters).
pub fn validate_category(category: &str) -> ValidationResult<()> {
    validate_required_text("category", category, 100)
}

/// Validates a barcode.
///
/// ## Rules
/// - 1..=64 characters
/// - Letters, digits and hyphens only (covers EAN/UPC and in-house codes)
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    validate_required_text("barcode", barcode, 64)?;

    if !barcode
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters, digits and hyphens".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer phone number.
///
/// ## Rules
/// - 6..=20 characters
/// - Digits plus `+`, `-`, spaces and parentheses
/// - At least 6 digits
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    validate_required_text("phone", phone, 20)?;

    let phone = phone.trim();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();

    if !allowed || digits < 6 {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a phone number with at least 6 digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a customer name (1..=120 characters).
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_required_text("customer_name", name, 120)
}

/// Validates a search query and returns it trimmed.
///
/// ## Rules
/// - Must not be empty (the catalog listing covers "no filter")
/// - Maximum 100 characters
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    validate_required_text("q", query, 100)?;
    Ok(query.trim().to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale line quantity.
///
/// ## Rules
/// - Must be a positive integer (> 0)
///
/// There is no upper bound here: available stock is the only limit, and
/// that is checked against durable state inside the sale transaction.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates that a monetary amount in cents is not negative.
///
/// ```rust
/// use rxpos_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("sell_price", 0).is_ok());
/// assert!(validate_price_cents("sell_price", -1).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a buy/sell price pair: both non-negative, sell >= buy.
pub fn validate_price_pair(buy_price_cents: i64, sell_price_cents: i64) -> ValidationResult<()> {
    validate_price_cents("buy_price", buy_price_cents)?;
    validate_price_cents("sell_price", sell_price_cents)?;

    if sell_price_cents < buy_price_cents {
        return Err(ValidationError::Inconsistent {
            field: "sell_price".to_string(),
            reason: "must be greater than or equal to buy_price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level (>= 0).
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a sale request.
///
/// ## Rules
/// - At least one line
/// - At most MAX_CART_LINES (100)
pub fn validate_cart_size(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if lines > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Enum Validators
// =============================================================================

/// Parses a payment method from a request body.
pub fn parse_payment_method(raw: &str) -> ValidationResult<PaymentMethod> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }

    raw.parse()
}

// =============================================================================
// Unit Tests
// =============================================================================

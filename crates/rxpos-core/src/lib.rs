//! # rxpos-core: Pure Business Logic for RxPOS
//!
//! This crate holds the domain model and every rule of the sale path that can
//! be expressed without touching storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          RxPOS Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Frontend (React)                             │   │
//! │  │    Inventory ──► Point of Sale cart ──► Sales history          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ HTTP / JSON                            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    rxpos-server (axum)                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ rxpos-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │SaleRequest│  │   rules   │  │   │
//! │  │   │   Sale    │  │           │  │ price_sale│  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    rxpos-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, sale transaction             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, Customer, ...)
//! - [`catalog`] - Validated product and customer inputs
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`sale`] - Validated sale requests and sale pricing
//! - [`period`] - Local calendar days to UTC intervals
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level rules
//!
//! ## Example Usage
//!
//! ```rust
//! use rxpos_core::money::Money;
//!
//! let unit_price = Money::from_cents(1_250);
//! let line_total = unit_price.checked_multiply_quantity(3).unwrap();
//! assert_eq!(line_total.cents(), 3_750);
//! ```

pub mod catalog;
pub mod error;
pub mod money;
pub mod period;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{NewCustomer, NewProduct, ProductUpdate};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use period::DateRange;
pub use sale::{price_sale, NewSaleInput, NewSaleLine, PricedLine, PricedSale, SaleLine, SaleRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted in a single sale request.
///
/// ## Business Reason
/// Keeps a single checkout transaction bounded; a counter sale with more
/// than a hundred distinct lines is almost certainly a client bug.
pub const MAX_CART_LINES: usize = 100;

/// Default threshold used by the low-stock listing.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 10;

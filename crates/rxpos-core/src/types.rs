//! # Domain Types
//!
//! Core domain types used throughout RxPOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │ 1 │  id (UUID)      │ 1 │  id (UUID)      │       │
//! │  │  buy/sell price │◄──┼──────────── N   │──►│  sale_id (FK)   │       │
//! │  │  stock          │   │  final_total    │ N │  product_id(FK) │       │
//! │  │  barcode (uniq) │   │  payment_method │   │  unit_price     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  sale_items.sale_id     → ON DELETE CASCADE (owned by the sale)        │
//! │  sale_items.product_id  → ON DELETE RESTRICT (referential only)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `SaleItem` freezes the unit price and product name at the moment of sale,
//! so later catalog edits never rewrite history.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// Invariants (enforced at write time, mirrored by CHECK constraints):
/// `buy_price_cents >= 0`, `sell_price_cents >= buy_price_cents`, `stock >= 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the cashier.
    pub name: String,

    /// Purchase price in cents.
    pub buy_price_cents: i64,

    /// Selling price in cents. This is what a sale charges.
    pub sell_price_cents: i64,

    /// Units on hand.
    pub stock: i64,

    /// Free-form category (e.g. "Analgesics").
    pub category: String,

    pub description: Option<String>,

    /// Barcode (EAN-13, UPC-A, ...). Unique when present.
    pub barcode: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn sell_price(&self) -> Money {
        Money::from_cents(self.sell_price_cents)
    }

    #[inline]
    pub fn buy_price(&self) -> Money {
        Money::from_cents(self.buy_price_cents)
    }

    /// Gross margin per unit (sell − buy).
    pub fn margin(&self) -> Money {
        self.sell_price() - self.buy_price()
    }

    /// Checks whether `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity > 0 && self.stock >= quantity
    }
}

/// The two product fields the sale transaction reads.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockAndPrice {
    pub id: String,
    pub name: String,
    pub stock: i64,
    pub sell_price_cents: i64,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid. Stored and serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

impl PaymentMethod {
    /// Every accepted method, in display order.
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    /// Parses a payment method, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "transfer" => Ok(PaymentMethod::Transfer),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// An immutable ledger entry: one completed sale and its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Sum of line totals.
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    /// `subtotal - discount + tax`, never negative.
    pub final_total_cents: i64,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    /// Server-assigned, immutable.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Lines in the order they were supplied at checkout.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<SaleItem>,
}

impl Sale {
    #[inline]
    pub fn final_total(&self) -> Money {
        Money::from_cents(self.final_total_cents)
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line of a sale. Price and name are frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale.
    pub product_name: String,
    pub quantity: i64,
    /// Catalog sell price at time of sale.
    pub unit_price_cents: i64,
    /// `quantity × unit_price_cents`.
    pub total_price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A known customer, looked up by phone at the counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Unique.
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sales Summary
// =============================================================================

/// Aggregate over a set of sales (today, a date range, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    /// Number of sales.
    pub sale_count: i64,
    /// Units sold across all lines.
    pub item_count: i64,
    /// Sum of `final_total_cents`.
    pub revenue_cents: i64,
}

impl SalesSummary {
    /// Builds a summary from fully loaded sales.
    pub fn from_sales(sales: &[Sale]) -> Self {
        sales.iter().fold(SalesSummary::default(), |acc, s| SalesSummary {
            sale_count: acc.sale_count + 1,
            item_count: acc.item_count + s.item_count(),
            revenue_cents: acc.revenue_cents + s.final_total_cents,
        })
    }
}

/// Sales for a period together with their summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    pub sales: Vec<Sale>,
    pub summary: SalesSummary,
}

impl SalesReport {
    pub fn new(sales: Vec<Sale>) -> Self {
        let summary = SalesSummary::from_sales(&sales);
        SalesReport { sales, summary }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

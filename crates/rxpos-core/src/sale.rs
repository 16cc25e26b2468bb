//! # Sale Requests and Pricing
//!
//! The pure half of recording a sale. The database layer owns the transaction;
//! this module owns everything that can be decided without it.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  NewSaleInput (loose JSON body)                                         │
//! │       │  SaleRequest::try_from ← rejects wholesale, before any I/O      │
//! │       ▼                                                                 │
//! │  SaleRequest { lines, payment_method, tax, discount, customer }         │
//! │       │                                                                 │
//! │       │  (rxpos-db reads live stock + sell price per line)              │
//! │       ▼                                                                 │
//! │  PricedLine::new(product, qty, live unit price)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price_sale(lines, tax, discount) → PricedSale                          │
//! │       │    subtotal    = Σ line totals                                  │
//! │       │    final_total = subtotal − discount + tax   (must be ≥ 0)      │
//! │       ▼                                                                 │
//! │  PricedSale::into_sale(ids, timestamp) → Sale                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, Sale, SaleItem};
use crate::validation::{
    parse_payment_method, validate_cart_size, validate_customer_name, validate_phone,
    validate_price_cents, validate_quantity,
};

// =============================================================================
// Loose input (as received)
// =============================================================================

/// Sale request body exactly as the client sent it.
///
/// Fields are deliberately permissive (`payment_method` is any string,
/// `quantity` any JSON value) so that every problem is reported as a field
/// error by [`SaleRequest::try_from`] rather than as an opaque parse failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewSaleInput {
    #[serde(default)]
    pub items: Vec<NewSaleLine>,
    #[serde(default)]
    pub payment_method: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    /// Pre-computed tax in cents. Defaults to zero.
    pub tax_cents: Option<i64>,
    /// Pre-computed discount in cents. Defaults to zero.
    pub discount_cents: Option<i64>,
}

/// One cart line as received.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSaleLine {
    #[serde(default)]
    pub product_id: String,
    #[serde(default)]
    pub quantity: Value,
}

// =============================================================================
// Validated request
// =============================================================================

/// A validated cart line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// A validated sale request. Constructing one is the only way into the
/// sale recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    pub lines: Vec<SaleLine>,
    pub payment_method: PaymentMethod,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub tax: Money,
    pub discount: Money,
}

impl SaleRequest {
    /// Convenience constructor for a cart with no tax, discount or customer.
    pub fn new(lines: Vec<SaleLine>, payment_method: PaymentMethod) -> CoreResult<Self> {
        validate_cart_size(lines.len())?;
        for line in &lines {
            validate_line(&line.product_id, line.quantity)?;
        }

        Ok(SaleRequest {
            lines,
            payment_method,
            customer_name: None,
            customer_phone: None,
            tax: Money::zero(),
            discount: Money::zero(),
        })
    }

    /// Sets pre-computed tax and discount (both must be >= 0).
    pub fn with_adjustments(mut self, tax: Money, discount: Money) -> CoreResult<Self> {
        validate_price_cents("tax", tax.cents())?;
        validate_price_cents("discount", discount.cents())?;
        self.tax = tax;
        self.discount = discount;
        Ok(self)
    }

    /// Attaches optional customer identification.
    pub fn with_customer(
        mut self,
        name: Option<String>,
        phone: Option<String>,
    ) -> CoreResult<Self> {
        self.customer_name = normalize_optional(name);
        self.customer_phone = normalize_optional(phone);
        if let Some(name) = &self.customer_name {
            validate_customer_name(name)?;
        }
        if let Some(phone) = &self.customer_phone {
            validate_phone(phone)?;
        }
        Ok(self)
    }
}

impl TryFrom<NewSaleInput> for SaleRequest {
    type Error = CoreError;

    fn try_from(input: NewSaleInput) -> CoreResult<Self> {
        validate_cart_size(input.items.len())?;
        let payment_method = parse_payment_method(&input.payment_method)?;

        let lines = input
            .items
            .into_iter()
            .map(|line| -> CoreResult<SaleLine> {
                let quantity = quantity_from_json(&line.quantity)?;
                validate_line(&line.product_id, quantity)?;
                Ok(SaleLine {
                    product_id: line.product_id.trim().to_string(),
                    quantity,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        SaleRequest {
            lines,
            payment_method,
            customer_name: None,
            customer_phone: None,
            tax: Money::zero(),
            discount: Money::zero(),
        }
        .with_adjustments(
            Money::from_cents(input.tax_cents.unwrap_or(0)),
            Money::from_cents(input.discount_cents.unwrap_or(0)),
        )?
        .with_customer(input.customer_name, input.customer_phone)
    }
}

fn validate_line(product_id: &str, quantity: i64) -> Result<(), ValidationError> {
    if product_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }
    validate_quantity(quantity)
}

/// Accepts JSON integers (and integral floats such as `3.0`, which some
/// clients emit). Anything else is an invalid quantity.
fn quantity_from_json(value: &Value) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidFormat {
        field: "quantity".to_string(),
        reason: "must be a positive integer".to_string(),
    };

    match value {
        Value::Null => Err(ValidationError::Required {
            field: "quantity".to_string(),
        }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(invalid()),
            }
        }
        _ => Err(invalid()),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Pricing
// =============================================================================

/// A cart line with its live unit price captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

impl PricedLine {
    /// Prices a line. `unit_price` must be the catalog sell price read at
    /// record time, never a client-supplied price.
    pub fn new(
        product_id: impl Into<String>,
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> CoreResult<Self> {
        validate_quantity(quantity)?;
        let total_price = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| CoreError::invalid("line total exceeds the supported amount"))?;

        Ok(PricedLine {
            product_id: product_id.into(),
            product_name: product_name.into(),
            quantity,
            unit_price,
            total_price,
        })
    }
}

/// Totals for a fully priced cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedSale {
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub final_total: Money,
}

/// Computes sale totals.
///
/// `final_total = subtotal − discount + tax`; a negative result (discount
/// larger than the cart) is an `InvalidRequest`.
///
/// ```rust
/// use rxpos_core::{price_sale, Money, PricedLine};
///
/// let line = PricedLine::new("p-1", "Paracetamol", 3, Money::from_cents(100)).unwrap();
/// let sale = price_sale(vec![line], Money::zero(), Money::zero()).unwrap();
/// assert_eq!(sale.final_total.cents(), 300);
/// ```
pub fn price_sale(lines: Vec<PricedLine>, tax: Money, discount: Money) -> CoreResult<PricedSale> {
    validate_cart_size(lines.len())?;
    validate_price_cents("tax", tax.cents())?;
    validate_price_cents("discount", discount.cents())?;

    let overflow = || CoreError::invalid("sale total exceeds the supported amount");

    let subtotal = lines
        .iter()
        .try_fold(Money::zero(), |acc, line| acc.checked_add(line.total_price))
        .ok_or_else(overflow)?;

    let final_total = subtotal
        .checked_sub(discount)
        .and_then(|m| m.checked_add(tax))
        .ok_or_else(overflow)?;

    if final_total.is_negative() {
        return Err(CoreError::invalid(format!(
            "final total cannot be negative (subtotal {}, discount {}, tax {})",
            subtotal, discount, tax
        )));
    }

    Ok(PricedSale {
        lines,
        subtotal,
        tax,
        discount,
        final_total,
    })
}

impl PricedSale {
    /// Materializes the ledger entry. Ids and the timestamp are injected so
    /// this stays deterministic.
    pub fn into_sale(
        self,
        sale_id: String,
        created_at: DateTime<Utc>,
        payment_method: PaymentMethod,
        customer_name: Option<String>,
        customer_phone: Option<String>,
        mut next_item_id: impl FnMut() -> String,
    ) -> Sale {
        let items = self
            .lines
            .into_iter()
            .map(|line| SaleItem {
                id: next_item_id(),
                sale_id: sale_id.clone(),
                product_id: line.product_id,
                product_name: line.product_name,
                quantity: line.quantity,
                unit_price_cents: line.unit_price.cents(),
                total_price_cents: line.total_price.cents(),
                created_at,
            })
            .collect();

        Sale {
            id: sale_id,
            subtotal_cents: self.subtotal.cents(),
            tax_cents: self.tax.cents(),
            discount_cents: self.discount.cents(),
            final_total_cents: self.final_total.cents(),
            payment_method,
            customer_name,
            customer_phone,
            created_at,
            items,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

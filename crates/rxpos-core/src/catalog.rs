//! # Catalog Inputs
//!
//! Write-side input types for products and customers. Each one validates
//! into a normalized value before it reaches the database layer.
//!
//! ```text
//! POST /api/products  ──► NewProduct::validate()      ──► ProductRepository::insert
//! PUT  /api/products  ──► ProductUpdate::apply_to(p)  ──► ProductRepository::update
//! POST /api/customers ──► NewCustomer::validate()     ──► CustomerRepository::insert
//! ```

use serde::Deserialize;

use crate::types::Product;
use crate::validation::{
    validate_barcode, validate_category, validate_customer_name, validate_phone,
    validate_price_pair, validate_product_name, validate_stock, ValidationResult,
};

/// Trims an optional text field; blank becomes `None`.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// New Product
// =============================================================================

/// A product to be created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub buy_price_cents: i64,
    pub sell_price_cents: i64,
    #[serde(default)]
    pub stock: i64,
    pub category: String,
    pub description: Option<String>,
    pub barcode: Option<String>,
}

impl NewProduct {
    /// Validates and normalizes (trimmed text, blank optionals dropped).
    ///
    /// ```rust
    /// use rxpos_core::catalog::NewProduct;
    ///
    /// let product = NewProduct {
    ///     name: " Ibuprofen 400mg ".into(),
    ///     buy_price_cents: 120,
    ///     sell_price_cents: 200,
    ///     stock: 30,
    ///     category: "Analgesics".into(),
    ///     description: None,
    ///     barcode: Some("".into()),
    /// }
    /// .validate()
    /// .unwrap();
    ///
    /// assert_eq!(product.name, "Ibuprofen 400mg");
    /// assert_eq!(product.barcode, None);
    /// ```
    pub fn validate(self) -> ValidationResult<Self> {
        validate_product_name(&self.name)?;
        validate_category(&self.category)?;
        validate_price_pair(self.buy_price_cents, self.sell_price_cents)?;
        validate_stock(self.stock)?;

        let barcode = clean(self.barcode);
        if let Some(code) = &barcode {
            validate_barcode(code)?;
        }

        Ok(NewProduct {
            name: self.name.trim().to_string(),
            category: self.category.trim().to_string(),
            description: clean(self.description),
            barcode,
            ..self
        })
    }
}

// =============================================================================
// Product Update
// =============================================================================

/// A partial product update. Absent fields keep their current value;
/// an empty `description` or `barcode` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub buy_price_cents: Option<i64>,
    pub sell_price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub barcode: Option<String>,
}

impl ProductUpdate {
    /// True when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == ProductUpdate::default()
    }

    /// Merges the update onto `current` and validates the result as a whole
    /// (so e.g. lowering only `sell_price_cents` below the existing buy
    /// price is rejected).
    pub fn apply_to(self, current: &Product) -> ValidationResult<Product> {
        let mut next = current.clone();

        if let Some(name) = self.name {
            validate_product_name(&name)?;
            next.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            validate_category(&category)?;
            next.category = category.trim().to_string();
        }
        if let Some(buy) = self.buy_price_cents {
            next.buy_price_cents = buy;
        }
        if let Some(sell) = self.sell_price_cents {
            next.sell_price_cents = sell;
        }
        if let Some(stock) = self.stock {
            validate_stock(stock)?;
            next.stock = stock;
        }
        if self.description.is_some() {
            next.description = clean(self.description);
        }
        if self.barcode.is_some() {
            next.barcode = clean(self.barcode);
            if let Some(code) = &next.barcode {
                validate_barcode(code)?;
            }
        }

        validate_price_pair(next.buy_price_cents, next.sell_price_cents)?;
        Ok(next)
    }
}

// =============================================================================
// New Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl NewCustomer {
    pub fn validate(self) -> ValidationResult<Self> {
        validate_customer_name(&self.name)?;
        validate_phone(&self.phone)?;

        Ok(NewCustomer {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: clean(self.email),
            address: clean(self.address),
        })
    }
}

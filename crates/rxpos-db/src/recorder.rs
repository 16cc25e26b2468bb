//! # Sale Recorder
//!
//! The only write path for sales. Turns a validated [`SaleRequest`] into one
//! committed [`Sale`] or nothing at all.
//!
//! ## Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN IMMEDIATE            ← takes the write lock up front; a second  │
//! │       │                       checkout waits (busy_timeout) instead of │
//! │       │                       reading stock it cannot safely update    │
//! │       ▼                                                                 │
//! │  for each line, in supplied order:                                     │
//! │     current_stock_and_price ── missing?  ──► ProductNotFound           │
//! │     Σ requested for product > stock?     ──► InsufficientStock         │
//! │     price from live sell_price                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  price_sale: subtotal − discount + tax ≥ 0 ──► else InvalidRequest     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT sales                                                          │
//! │  INSERT sale_items (one per line)                                      │
//! │  UPDATE products SET stock = stock - n WHERE stock >= n                │
//! │       │        0 rows ──► InsufficientStock                            │
//! │       ▼                                                                 │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any early return drops the transaction ──► ROLLBACK                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The precondition check fails fast with a clear error. The guarded
//! decrement is the authoritative check and is what keeps stock
//! non-negative if two writers ever interleave.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, SaleError, SaleResult};
use crate::repository::product::ProductRepository;
use rxpos_core::{price_sale, CoreError, Money, PricedLine, Sale, SaleRequest};

/// Records sales atomically.
#[derive(Debug, Clone)]
pub struct SaleRecorder {
    pool: SqlitePool,
}

impl SaleRecorder {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRecorder { pool }
    }

    /// Records a sale.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - committed sale with its items and captured prices
    /// * `Err(SaleError::Domain(..))` - `ProductNotFound`, `InsufficientStock`
    ///   or `InvalidRequest`; nothing was written
    /// * `Err(SaleError::Storage(..))` - storage failure; nothing was written
    pub async fn record_sale(&self, request: SaleRequest) -> SaleResult<Sale> {
        let lines = request.lines.len();
        let result = self.record(request).await;

        match &result {
            Ok(sale) => info!(
                sale_id = %sale.id,
                lines,
                final_total = %sale.final_total(),
                payment_method = %sale.payment_method,
                "Sale recorded"
            ),
            Err(SaleError::Domain(e)) => warn!(error = %e, lines, "Sale rejected"),
            Err(SaleError::Storage(e)) => error!(error = %e, lines, "Sale failed in storage"),
        }

        result
    }

    async fn record(&self, request: SaleRequest) -> SaleResult<Sale> {
        let mut tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        // ---------------------------------------------------------------------
        // 1. Preconditions + live pricing (no writes yet)
        // ---------------------------------------------------------------------
        let mut requested: HashMap<&str, i64> = HashMap::new();
        let mut priced = Vec::with_capacity(request.lines.len());

        for line in &request.lines {
            let product = ProductRepository::current_stock_and_price(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let wanted = requested.entry(line.product_id.as_str()).or_insert(0);
            *wanted = wanted
                .checked_add(line.quantity)
                .ok_or_else(|| CoreError::invalid("requested quantity exceeds the supported amount"))?;

            if *wanted > product.stock {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    available: product.stock,
                    requested: *wanted,
                }
                .into());
            }

            priced.push(PricedLine::new(
                product.id,
                product.name,
                line.quantity,
                Money::from_cents(product.sell_price_cents),
            )?);
        }

        let priced = price_sale(priced, request.tax, request.discount)?;

        let sale = priced.into_sale(
            Uuid::new_v4().to_string(),
            Utc::now(),
            request.payment_method,
            request.customer_name,
            request.customer_phone,
            || Uuid::new_v4().to_string(),
        );

        // ---------------------------------------------------------------------
        // 2. Writes
        // ---------------------------------------------------------------------
        insert_sale(&mut tx, &sale).await?;

        // Under BEGIN IMMEDIATE no other writer runs between the reads above
        // and these updates, so the guard only fires if that lock is lost.
        for item in &sale.items {
            decrement_or_reject(&mut tx, &item.product_id, &item.product_name, item.quantity)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(sale)
    }
}

/// Guarded stock decrement. A rejected update becomes `InsufficientStock`
/// carrying the stock the transaction sees now.
async fn decrement_or_reject(
    conn: &mut SqliteConnection,
    product_id: &str,
    product_name: &str,
    quantity: i64,
) -> Result<(), SaleError> {
    match ProductRepository::decrement_stock(conn, product_id, quantity).await {
        Ok(()) => Ok(()),
        Err(DbError::InsufficientStock {
            product_id,
            requested,
        }) => {
            let available = ProductRepository::current_stock_and_price(conn, &product_id)
                .await?
                .map(|p| p.stock)
                .unwrap_or(0);
            Err(CoreError::InsufficientStock {
                product_id,
                name: product_name.to_string(),
                available,
                requested,
            }
            .into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Inserts the sale header and its items on the transaction's connection.
async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> Result<(), SaleError> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, subtotal_cents, tax_cents, discount_cents, final_total_cents,
            payment_method, customer_name, customer_phone, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&sale.id)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.discount_cents)
    .bind(sale.final_total_cents)
    .bind(sale.payment_method)
    .bind(&sale.customer_name)
    .bind(&sale.customer_phone)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    for item in &sale.items {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                id, sale_id, product_id, product_name, quantity,
                unit_price_cents, total_price_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_price_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use rxpos_core::{NewProduct, PaymentMethod, Product, SaleLine};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, name: &str, stock: i64, sell_price_cents: i64) -> Product {
        db.products()
            .insert(&NewProduct {
                name: name.to_string(),
                buy_price_cents: 0,
                sell_price_cents,
                stock,
                category: "Analgesics".to_string(),
                description: None,
                barcode: None,
            })
            .await
            .unwrap()
    }

    fn line(product_id: &str, quantity: i64) -> SaleLine {
        SaleLine {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    fn request(lines: Vec<SaleLine>) -> SaleRequest {
        SaleRequest::new(lines, PaymentMethod::Cash).unwrap()
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_records_sale_and_decrements_stock() {
        let db = db().await;
        let p = product(&db, "Paracetamol 500mg", 5, 100).await;

        let sale = db.recorder().record_sale(request(vec![line(&p.id, 3)])).await.unwrap();

        assert_eq!(sale.final_total_cents, 300);
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].unit_price_cents, 100);
        assert_eq!(sale.items[0].product_name, "Paracetamol 500mg");
        assert_eq!(stock_of(&db, &p.id).await, 2);

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored, sale);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_everything_unchanged() {
        let db = db().await;
        let p = product(&db, "Paracetamol 500mg", 2, 100).await;

        let err = db
            .recorder()
            .record_sale(request(vec![line(&p.id, 5)]))
            .await
            .unwrap_err();

        match err {
            SaleError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                name,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
                assert_eq!(name, "Paracetamol 500mg");
            }
            other => panic!("expected insufficient stock, got {other:?}"),
        }
        assert_eq!(stock_of(&db, &p.id).await, 2);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exact_stock_boundary() {
        let db = db().await;
        let p = product(&db, "Ors", 4, 50).await;

        let err = db
            .recorder()
            .record_sale(request(vec![line(&p.id, 5)]))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(stock_of(&db, &p.id).await, 4);

        db.recorder().record_sale(request(vec![line(&p.id, 4)])).await.unwrap();
        assert_eq!(stock_of(&db, &p.id).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_product_aborts_whole_cart() {
        let db = db().await;
        let p = product(&db, "Vitamin C", 10, 250).await;

        let err = db
            .recorder()
            .record_sale(request(vec![line(&p.id, 1), line("zzz", 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::Domain(CoreError::ProductNotFound(ref id)) if id == "zzz"));
        assert_eq!(stock_of(&db, &p.id).await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failure_on_later_line_rolls_back_earlier_lines() {
        let db = db().await;
        let a = product(&db, "A", 10, 100).await;
        let b = product(&db, "B", 1, 100).await;
        let c = product(&db, "C", 10, 100).await;

        let err = db
            .recorder()
            .record_sale(request(vec![line(&a.id, 2), line(&b.id, 3), line(&c.id, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, SaleError::Domain(CoreError::InsufficientStock { ref product_id, .. }) if *product_id == b.id));
        assert_eq!(stock_of(&db, &a.id).await, 10);
        assert_eq!(stock_of(&db, &b.id).await, 1);
        assert_eq!(stock_of(&db, &c.id).await, 10);
        assert_eq!(db.sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_repeated_product_lines_are_checked_cumulatively() {
        let db = db().await;
        let p = product(&db, "Cetirizine", 5, 100).await;

        let err = db
            .recorder()
            .record_sale(request(vec![line(&p.id, 3), line(&p.id, 3)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SaleError::Domain(CoreError::InsufficientStock { requested: 6, available: 5, .. })
        ));

        let sale = db
            .recorder()
            .record_sale(request(vec![line(&p.id, 3), line(&p.id, 2)]))
            .await
            .unwrap();
        assert_eq!(sale.items.len(), 2);
        assert_eq!(stock_of(&db, &p.id).await, 0);
    }

    #[tokio::test]
    async fn test_totals_use_live_price_and_adjustments() {
        let db = db().await;
        let a = product(&db, "A", 10, 100).await;
        let b = product(&db, "B", 10, 250).await;

        let req = request(vec![line(&a.id, 3), line(&b.id, 2)])
            .with_adjustments(Money::from_cents(40), Money::from_cents(100))
            .unwrap();
        let sale = db.recorder().record_sale(req).await.unwrap();

        let lines: i64 = sale
            .items
            .iter()
            .map(|i| i.quantity * i.unit_price_cents)
            .sum();
        assert_eq!(sale.subtotal_cents, lines);
        assert_eq!(sale.final_total_cents, lines - 100 + 40);
        assert_eq!(sale.items[0].product_id, a.id);
        assert_eq!(sale.items[1].product_id, b.id);
    }

    #[tokio::test]
    async fn test_negative_final_total_is_invalid_request() {
        let db = db().await;
        let p = product(&db, "A", 10, 100).await;

        let req = request(vec![line(&p.id, 1)])
            .with_adjustments(Money::zero(), Money::from_cents(500))
            .unwrap();
        let err = db.recorder().record_sale(req).await.unwrap_err();

        assert!(matches!(err, SaleError::Domain(CoreError::InvalidRequest(_))));
        assert_eq!(stock_of(&db, &p.id).await, 10);
    }

    #[tokio::test]
    async fn test_closed_pool_is_storage_error() {
        let db = db().await;
        let p = product(&db, "A", 10, 100).await;
        db.close().await;

        let err = db
            .recorder()
            .record_sale(request(vec![line(&p.id, 1)]))
            .await
            .unwrap_err();
        assert!(matches!(err, SaleError::Storage(_)));
    }

    #[tokio::test]
    async fn test_rejected_decrement_reports_current_stock() {
        let db = db().await;
        let product = db
            .products()
            .insert(&NewProduct {
                name: "Salbutamol Inhaler".to_string(),
                buy_price_cents: 400,
                sell_price_cents: 650,
                stock: 5,
                category: "Respiratory".to_string(),
                description: None,
                barcode: None,
            })
            .await
            .unwrap();

        let mut tx = db.pool().begin().await.unwrap();
        // Another writer takes stock after the precondition was read.
        ProductRepository::decrement_stock(&mut tx, &product.id, 4)
            .await
            .unwrap();

        let err = decrement_or_reject(&mut tx, &product.id, &product.name, 3)
            .await
            .unwrap_err();
        match err {
            SaleError::Domain(CoreError::InsufficientStock {
                name,
                available,
                requested,
                ..
            }) => {
                assert_eq!(name, "Salbutamol Inhaler");
                assert_eq!(available, 1);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        tx.rollback().await.unwrap();
        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
    }
}

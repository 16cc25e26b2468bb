//! # Sale Repository
//!
//! Read-only queries over the sales ledger. Sales are written exclusively by
//! [`SaleRecorder`](crate::recorder::SaleRecorder) and never modified.
//!
//! ## Queries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sales History                                     │
//! │                                                                         │
//! │  get_by_id(id)              → Option<Sale>  (with items)               │
//! │  list_page(page, limit)     → SalesPage     newest first + total       │
//! │  today()                    → SalesReport   local calendar day         │
//! │  by_date_range(range)       → SalesReport   inclusive local days       │
//! │                                                                         │
//! │  Every returned Sale carries its items in the order they were          │
//! │  supplied at checkout.                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use rxpos_core::{DateRange, Sale, SaleItem, SalesReport};

const SALE_COLUMNS: &str = "id, subtotal_cents, tax_cents, discount_cents, final_total_cents, \
                            payment_method, customer_name, customer_phone, created_at";

const ITEM_COLUMNS: &str = "id, sale_id, product_id, product_name, quantity, \
                            unit_price_cents, total_price_cents, created_at";

/// Bound parameters per `IN (...)` chunk when loading items.
const ITEM_BATCH: usize = 500;

/// One page of sales plus the total number of sales.
#[derive(Debug, Clone)]
pub struct SalesPage {
    pub sales: Vec<Sale>,
    pub total: i64,
}

/// Repository for sale queries.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID, with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match sale {
            Some(sale) => Ok(self.attach_items(vec![sale]).await?.pop()),
            None => Ok(None),
        }
    }

    /// Gets all items for a sale, in checkout order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists sales newest first.
    ///
    /// `page` is 1-based. Sales recorded within the same instant are ordered
    /// by insertion, newest first.
    pub async fn list_page(&self, page: i64, limit: i64) -> DbResult<SalesPage> {
        let offset = (page.max(1) - 1).saturating_mul(limit);
        debug!(page, limit, offset, "Listing sales");

        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             ORDER BY created_at DESC, rowid DESC \
             LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = self.count().await?;
        let sales = self.attach_items(sales).await?;

        Ok(SalesPage { sales, total })
    }

    /// Counts all sales.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Sales of the current local calendar day.
    pub async fn today(&self) -> DbResult<SalesReport> {
        self.by_date_range(&DateRange::today()).await
    }

    /// Sales whose local calendar day falls within `range` (inclusive).
    pub async fn by_date_range(&self, range: &DateRange) -> DbResult<SalesReport> {
        let (from, until) = range.local_utc_bounds();
        debug!(start = %range.start(), end = %range.end(), %from, %until, "Sales by date range");

        self.between(from, until).await
    }

    /// Sales with `from <= created_at < until`, newest first.
    pub async fn between(
        &self,
        from: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> DbResult<SalesReport> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE created_at >= ?1 AND created_at < ?2 \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(from)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        let sales = self.attach_items(sales).await?;
        Ok(SalesReport::new(sales))
    }

    /// Loads the items of every sale in `sales` (batched `IN` queries).
    async fn attach_items(&self, mut sales: Vec<Sale>) -> DbResult<Vec<Sale>> {
        if sales.is_empty() {
            return Ok(sales);
        }

        let mut by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();

        for chunk in sales.chunks(ITEM_BATCH) {
            let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
                "SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id IN ("
            ));
            let mut ids = query.separated(", ");
            for sale in chunk {
                ids.push_bind(sale.id.clone());
            }
            ids.push_unseparated(") ORDER BY rowid");

            let items: Vec<SaleItem> = query.build_query_as().fetch_all(&self.pool).await?;
            for item in items {
                by_sale.entry(item.sale_id.clone()).or_default().push(item);
            }
        }

        for sale in &mut sales {
            sale.items = by_sale.remove(&sale.id).unwrap_or_default();
        }

        Ok(sales)
    }
}

//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Catalog CRUD (create, partial update, delete guarded by sale history)
//! - Search across name, category and barcode
//! - Stock reads and guarded decrements used inside the sale transaction
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Product Search Works                             │
//! │                                                                         │
//! │  Cashier types: "para"                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LIKE '%para%' across: name, category, barcode                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ Paracetamol 500mg  | Analgesics | 899… │ ← name match (rank 0)     │
//! │  │ Panadol Extra      | Paracetamol| 899… │ ← category match (rank 1) │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ORDER BY rank, name                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Inside a Sale
//! ```text
//! current_stock_and_price(&mut tx, id)   SELECT stock, sell_price_cents …
//! decrement_stock(&mut tx, id, n)        UPDATE … SET stock = stock - n
//!                                        WHERE id = ? AND stock >= n
//!                                        0 rows ⇒ DbError::InsufficientStock
//! ```
//! Stock is never clamped: a decrement either takes the full amount or fails.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use rxpos_core::{NewProduct, Product, StockAndPrice};

const PRODUCT_COLUMNS: &str = "id, name, buy_price_cents, sell_price_cents, stock, category, \
                               description, barcode, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let results = repo.search("para", 20).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists products ordered by name.
    pub async fn list(&self, limit: i64, offset: i64) -> DbResult<Vec<Product>> {
        debug!(limit, offset, "Listing products");

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             ORDER BY name COLLATE NOCASE, id \
             LIMIT ?1 OFFSET ?2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts all products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode (scanner lookup).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Searches products by substring of name, category or barcode.
    ///
    /// Name matches are ranked before category/barcode matches. `%` and `_`
    /// in the term are matched literally.
    pub async fn search(&self, term: &str, limit: i64) -> DbResult<Vec<Product>> {
        let term = term.trim();
        debug!(term = %term, limit, "Searching products");

        let pattern = format!("%{}%", escape_like(term));

        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE name LIKE ?1 ESCAPE '\\' \
                OR category LIKE ?1 ESCAPE '\\' \
                OR barcode LIKE ?1 ESCAPE '\\' \
             ORDER BY CASE WHEN name LIKE ?1 ESCAPE '\\' THEN 0 ELSE 1 END, \
                      name COLLATE NOCASE \
             LIMIT ?2"
        ))
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Products with `stock <= threshold`, lowest stock first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE stock <= ?1 \
             ORDER BY stock, name COLLATE NOCASE"
        ))
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products in one category, ordered by name.
    pub async fn by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE category = ?1 \
             ORDER BY name COLLATE NOCASE"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Distinct categories, alphabetically.
    pub async fn categories(&self) -> DbResult<Vec<String>> {
        let categories: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT category FROM products ORDER BY category COLLATE NOCASE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a new product. The input must already be validated.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with generated id and timestamps
    /// * `Err(DbError::UniqueViolation)` - barcode already exists
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: input.name.clone(),
            buy_price_cents: input.buy_price_cents,
            sell_price_cents: input.sell_price_cents,
            stock: input.stock,
            category: input.category.clone(),
            description: input.description.clone(),
            barcode: input.barcode.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, buy_price_cents, sell_price_cents, stock,
                category, description, barcode, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.buy_price_cents)
        .bind(product.sell_price_cents)
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.barcode)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e.into(), product.barcode.as_deref()))?;

        Ok(product)
    }

    /// Writes every mutable field of `product` (the caller merged a partial
    /// update onto the current row) and refreshes `updated_at`.
    ///
    /// ## Returns
    /// * `Ok(Product)` - the stored row
    /// * `Err(DbError::NotFound)` - product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                buy_price_cents = ?3,
                sell_price_cents = ?4,
                stock = ?5,
                category = ?6,
                description = ?7,
                barcode = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.buy_price_cents)
        .bind(product.sell_price_cents)
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.barcode)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e.into(), product.barcode.as_deref()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(Product {
            updated_at: now,
            ..product.clone()
        })
    }

    /// Sets the absolute stock level (restock / stock take). Must be >= 0.
    pub async fn set_stock(&self, id: &str, stock: i64) -> DbResult<()> {
        debug!(id = %id, stock, "Setting stock");

        let result = sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(stock)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Sale lines reference products with ON DELETE RESTRICT, so a product
    /// that has ever been sold cannot be deleted:
    /// `Err(DbError::ForeignKeyViolation)`.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    // =========================================================================
    // Sale transaction operations
    // =========================================================================

    /// Reads the current stock and sell price of a product on the
    /// transaction's connection.
    pub async fn current_stock_and_price(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<StockAndPrice>> {
        let row = sqlx::query_as::<_, StockAndPrice>(
            "SELECT id, name, stock, sell_price_cents FROM products WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(row)
    }

    /// Takes `amount` units from stock, only if at least `amount` remain.
    ///
    /// ## Returns
    /// * `Ok(())` - stock decremented by exactly `amount`
    /// * `Err(DbError::InsufficientStock)` - guard refused; nothing changed
    pub async fn decrement_stock(
        conn: &mut SqliteConnection,
        id: &str,
        amount: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(id)
        .bind(amount)
        .bind(Utc::now())
        .execute(conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::InsufficientStock {
                product_id: id.to_string(),
                requested: amount,
            });
        }

        Ok(())
    }
}

/// Fills in the offending barcode on a unique violation.
fn with_barcode(err: DbError, barcode: Option<&str>) -> DbError {
    match err {
        DbError::UniqueViolation { field, .. } if field == "barcode" => {
            DbError::duplicate(field, barcode.unwrap_or_default())
        }
        other => other,
    }
}

/// Escapes LIKE wildcards so user input matches literally (ESCAPE '\').
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn new_product(name: &str, category: &str, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            buy_price_cents: 60,
            sell_price_cents: 100,
            stock,
            category: category.to_string(),
            description: None,
            barcode: None,
        }
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = db().await;
        let repo = db.products();

        let created = repo
            .insert(&NewProduct {
                barcode: Some("8991234567890".to_string()),
                ..new_product("Paracetamol 500mg", "Analgesics", 20)
            })
            .await
            .unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Paracetamol 500mg");
        assert_eq!(fetched.stock, 20);

        let by_code = repo.get_by_barcode("8991234567890").await.unwrap().unwrap();
        assert_eq!(by_code.id, created.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_barcode_is_unique_violation() {
        let db = db().await;
        let repo = db.products();
        let with_code = |name: &str| NewProduct {
            barcode: Some("RX-1".to_string()),
            ..new_product(name, "Vitamins", 5)
        };

        repo.insert(&with_code("Vitamin C")).await.unwrap();
        let err = repo.insert(&with_code("Vitamin D")).await.unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "barcode");
                assert_eq!(value, "RX-1");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_check_constraint_rejects_sell_below_buy() {
        let db = db().await;
        let err = db
            .products()
            .insert(&NewProduct {
                buy_price_cents: 200,
                sell_price_cents: 100,
                ..new_product("Bad Price", "Misc", 1)
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::CheckViolation(_)));
    }

    #[tokio::test]
    async fn test_search_ranks_name_matches_first() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&new_product("Panadol Extra", "Paracetamol", 5))
            .await
            .unwrap();
        repo.insert(&new_product("Paracetamol 500mg", "Analgesics", 5))
            .await
            .unwrap();
        repo.insert(&new_product("Vitamin C", "Vitamins", 5))
            .await
            .unwrap();

        let results = repo.search("paracetamol", 10).await.unwrap();
        let names: Vec<_> = results.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Paracetamol 500mg", "Panadol Extra"]);

        assert!(repo.search("100%", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_low_stock_and_categories() {
        let db = db().await;
        let repo = db.products();

        repo.insert(&new_product("A", "Vitamins", 2)).await.unwrap();
        repo.insert(&new_product("B", "Analgesics", 10)).await.unwrap();
        repo.insert(&new_product("C", "Analgesics", 11)).await.unwrap();

        let low = repo.low_stock(10).await.unwrap();
        assert_eq!(low.len(), 2);
        assert_eq!(low[0].name, "A");

        assert_eq!(
            repo.categories().await.unwrap(),
            vec!["Analgesics".to_string(), "Vitamins".to_string()]
        );
        assert_eq!(repo.by_category("Analgesics").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_pages_by_name() {
        let db = db().await;
        let repo = db.products();
        for name in ["Charlie", "alpha", "Bravo"] {
            repo.insert(&new_product(name, "Misc", 1)).await.unwrap();
        }

        let first = repo.list(2, 0).await.unwrap();
        assert_eq!(first[0].name, "alpha");
        assert_eq!(first[1].name, "Bravo");
        assert_eq!(repo.list(2, 2).await.unwrap()[0].name, "Charlie");
    }

    #[tokio::test]
    async fn test_update_set_stock_and_delete() {
        let db = db().await;
        let repo = db.products();
        let mut product = repo.insert(&new_product("Amoxicillin", "Antibiotics", 3)).await.unwrap();

        product.sell_price_cents = 150;
        let updated = repo.update(&product).await.unwrap();
        assert_eq!(updated.sell_price_cents, 150);

        repo.set_stock(&product.id, 40).await.unwrap();
        assert_eq!(repo.get_by_id(&product.id).await.unwrap().unwrap().stock, 40);

        repo.delete(&product.id).await.unwrap();
        assert!(matches!(
            repo.delete(&product.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
        assert!(matches!(
            repo.set_stock("missing", 1).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_guarded_decrement_never_goes_negative() {
        let db = db().await;
        let product = db.products().insert(&new_product("Ors", "Rehydration", 3)).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        ProductRepository::decrement_stock(&mut conn, &product.id, 3)
            .await
            .unwrap();
        let err = ProductRepository::decrement_stock(&mut conn, &product.id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { requested: 1, .. }));

        let row = ProductRepository::current_stock_and_price(&mut conn, &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.stock, 0);
        assert_eq!(row.sell_price_cents, 100);
    }
}

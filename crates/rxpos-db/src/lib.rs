//! # rxpos-db: Database Layer for RxPOS
//!
//! This crate provides database access for RxPOS.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RxPOS Data Flow                                  │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     rxpos-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ ProductRepo   │    │  (embedded)  │  │   │
//! │  │   │               │    │ SaleRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ CustomerRepo  │    │ 001_init.sql │  │   │
//! │  │   │               │    ├───────────────┤    │              │  │   │
//! │  │   │               │◄───│ SaleRecorder  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (product, sale, customer)
//! - [`recorder`] - The atomic sale transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rxpos_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./rxpos.db")).await?;
//!
//! let request = SaleRequest::try_from(input)?;
//! let sale = db.recorder().record_sale(request).await?;
//!
//! let today = db.sales().today().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod recorder;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, SaleError, SaleResult};
pub use pool::{Database, DbConfig};
pub use recorder::SaleRecorder;

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleRepository, SalesPage};

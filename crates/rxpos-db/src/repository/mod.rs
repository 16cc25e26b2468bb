//! # Repository Module
//!
//! Database repository implementations for RxPOS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  state.db.products().search("para", 20)                        │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── search(&self, term, limit)                                        │
//! │  ├── get_by_id(&self, id)                                              │
//! │  ├── insert(&self, product)                                            │
//! │  └── update(&self, product)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, search, stock
//! - [`SaleRepository`](sale::SaleRepository) - Sales history queries
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer lookup
//!
//! Sales are written only by [`SaleRecorder`](crate::recorder::SaleRecorder).

pub mod customer;
pub mod product;
pub mod sale;

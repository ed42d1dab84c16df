//! # Repository Module
//!
//! Owner-scoped database access for the ZatoBox inventory core.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                     │
//! │                                                                     │
//! │  Caller                                                             │
//! │       │                                                             │
//! │       │  db.products().list(owner, &filter)                         │
//! │       ▼                                                             │
//! │  ProductRepository                                                  │
//! │  ├── list(&self, owner_id, filter)                                  │
//! │  ├── get_by_id(&self, owner_id, id)                                 │
//! │  ├── insert(&self, product)                                         │
//! │  └── ...                                                            │
//! │       │                                                             │
//! │       │  SQL Query (always filtered by owner_id)                    │
//! │       ▼                                                             │
//! │  SQLite Database                                                    │
//! │                                                                     │
//! │  Owner scoping is the tenancy boundary: repositories never expose   │
//! │  a read or write that is not constrained to one owner's rows.       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories cover reads and single-row CRUD. Stock mutations and sale
//! settlement never go through repositories directly - they live in
//! [`crate::service`], which owns the multi-statement transactions.
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD, listing, summaries
//! - [`movement::MovementRepository`] - Movement ledger reads
//! - [`sale::SaleRepository`] - Sale and sale item reads, summaries

pub mod movement;
pub mod product;
pub mod sale;

use serde::{Deserialize, Serialize};

/// Default page size for paginated listings.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Maximum page size for paginated listings.
pub const MAX_PAGE_LIMIT: u32 = 100;

/// A page of results plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: u32,
}

impl<T> Paginated<T> {
    pub(crate) fn new(items: Vec<T>, page: u32, limit: u32, total: i64) -> Self {
        let pages = if limit == 0 {
            0
        } else {
            ((total as u64).div_ceil(limit as u64)) as u32
        };
        Paginated {
            items,
            page,
            limit,
            total,
            pages,
        }
    }
}

/// Clamps a requested page/limit pair to sane bounds.
///
/// Page numbers are 1-based; limit is capped at [`MAX_PAGE_LIMIT`].
pub(crate) fn clamp_page(page: u32, limit: u32) -> (u32, u32) {
    let page = page.max(1);
    let limit = limit.clamp(1, MAX_PAGE_LIMIT);
    (page, limit)
}

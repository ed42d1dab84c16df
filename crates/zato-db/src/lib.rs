//! # zato-db: Database Layer for the ZatoBox Inventory Core
//!
//! This crate provides database access for the ZatoBox inventory and
//! sale-settlement system. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      ZatoBox Data Flow                              │
//! │                                                                     │
//! │  Caller (HTTP layer, CLI, tests) - supplies owner_id                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                     zato-db (THIS CRATE)                      │ │
//! │  │                                                               │ │
//! │  │  ┌──────────────┐   ┌───────────────┐   ┌─────────────────┐  │ │
//! │  │  │  Services    │   │ Repositories  │   │   Migrations    │  │ │
//! │  │  │ (mutations)  │   │   (reads)     │   │   (embedded)    │  │ │
//! │  │  │              │   │               │   │                 │  │ │
//! │  │  │ StockService │   │ ProductRepo   │   │ 001_initial_    │  │ │
//! │  │  │ SaleService  │   │ MovementRepo  │   │   schema.sql    │  │ │
//! │  │  │              │   │ SaleRepo      │   │                 │  │ │
//! │  │  └──────┬───────┘   └───────┬───────┘   └─────────────────┘  │ │
//! │  │         │    one write     │                                 │ │
//! │  │         │  transaction per │                                 │ │
//! │  │         │     mutation     │                                 │ │
//! │  └─────────┼──────────────────┼─────────────────────────────────┘ │
//! │            ▼                  ▼                                    │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                     SQLite Database                           │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and service error types
//! - [`repository`] - Owner-scoped read/CRUD access (product, movement, sale)
//! - [`service`] - The transactional mutation services: every stock change
//!   and its ledger entry commit together, or not at all
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zato_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/db.sqlite")).await?;
//!
//! // Read through repositories
//! let products = db.products().list("owner-1", &Default::default()).await?;
//!
//! // Mutate through services
//! let receipt = db.sale_service().create_sale("owner-1", new_sale).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, ServiceError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::movement::{MovementFilter, MovementRepository};
pub use repository::product::{InventorySummary, ProductFilter, ProductRepository};
pub use repository::sale::{SaleDetails, SaleFilter, SaleRepository, SalesSummary};
pub use repository::Paginated;

// Service re-exports
pub use service::sale::{NewSale, SaleLine, SaleService};
pub use service::stock::{
    BulkUpdateOutcome, BulkUpdateResult, MovementContext, StockService, StockUpdate,
};

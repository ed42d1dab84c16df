//! # zato-core: Pure Business Logic for the ZatoBox Inventory Core
//!
//! This crate is the **heart** of the ZatoBox inventory and sale-settlement
//! system. It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    ZatoBox Architecture                             │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │              Caller (HTTP layer, CLI, tests)                  │ │
//! │  │   supplies a resolved owner_id with every operation           │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │                ★ zato-core (THIS CRATE) ★                     │ │
//! │  │                                                               │ │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────────────┐      │ │
//! │  │  │  types   │ │  money   │ │  stock   │ │ validation │      │ │
//! │  │  │ Product  │ │  Money   │ │ next_    │ │   rules    │      │ │
//! │  │  │  Sale    │ │ TaxCalc  │ │  stock   │ │   checks   │      │ │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └────────────┘      │ │
//! │  │                                                               │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS          │ │
//! │  └─────────────────────────────┬─────────────────────────────────┘ │
//! │                                │                                    │
//! │  ┌─────────────────────────────▼─────────────────────────────────┐ │
//! │  │                 zato-db (Database Layer)                      │ │
//! │  │      SQLite queries, migrations, transactional services       │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, InventoryMovement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`stock`] - Stock-transition math for the movement service
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use zato_core::money::Money;
//! use zato_core::types::{SaleTotals, TaxRate};
//!
//! // Create money from cents (never from floats!)
//! let price = Money::from_cents(500); // $5.00
//!
//! // Totals for 3 units at the fixed 15% sale tax
//! let totals = SaleTotals::compute(
//!     [(price, 3)],
//!     TaxRate::from_bps(zato_core::SALE_TAX_BPS),
//! );
//! assert_eq!(totals.subtotal_cents, 1500);
//! assert_eq!(totals.tax_cents, 225);
//! assert_eq!(totals.total_cents, 1725);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod stock;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use zato_core::Money` instead of
// `use zato_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use stock::{next_stock, StockOp};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sale tax rate in basis points (1500 = 15%).
///
/// The settlement logic applies a single flat rate to every sale subtotal.
/// Making this per-owner configuration is a future concern; today it is
/// one business-wide constant.
pub const SALE_TAX_BPS: u32 = 1500;

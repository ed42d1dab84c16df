//! # Domain Types
//!
//! Core domain types for the ZatoBox inventory and sale-settlement system.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌────────────────┐  ┌────────────────┐  ┌─────────────────────┐   │
//! │  │    Product     │  │      Sale      │  │ InventoryMovement   │   │
//! │  │  ────────────  │  │  ────────────  │  │  ─────────────────  │   │
//! │  │  id (UUID)     │  │  id (UUID)     │  │  id (UUID)          │   │
//! │  │  sku           │  │  status        │  │  kind (in/out/adj)  │   │
//! │  │  stock ≥ 0     │  │  total_cents   │  │  previous/new stock │   │
//! │  │  price_cents   │  │  items (table) │  │  reason, reference  │   │
//! │  └────────────────┘  └────────────────┘  └─────────────────────┘   │
//! │                                                                     │
//! │  Every entity carries an owner_id: the tenancy boundary.            │
//! │  Every query in zato-db is scoped by it.                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1500 bps = 15% (the fixed ZatoBox sale tax)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product
// =============================================================================

/// Soft lifecycle state of a product.
///
/// `Inactive` hides the product from sale listings and summaries but does
/// not block direct stock operations; it also doubles as the soft-delete
/// state (deleting a product never removes the row, so historical
/// movements and sales keep a valid reference).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl Default for ProductStatus {
    fn default() -> Self {
        ProductStatus::Active
    }
}

/// A sellable, stockable item on the product ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Account this product belongs to. The tenancy boundary.
    pub owner_id: String,

    /// Stock Keeping Unit - business identifier, unique per owner.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Category label used for listing filters.
    pub category: String,

    /// Unit price in cents (smallest currency unit). Never negative.
    pub price_cents: i64,

    /// Current stock level. Invariant: `stock >= 0`, enforced both by the
    /// mutation service and a database CHECK constraint.
    pub stock: i64,

    /// Threshold at or below which the product counts as low-stock.
    pub low_stock_alert: i64,

    /// Soft lifecycle state.
    pub status: ProductStatus,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether the product is at or below its low-stock threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_alert
    }

    /// Checks whether the product is active.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }
}

/// Input for creating a product.
///
/// Everything the caller supplies; id and timestamps are generated by
/// [`Product::create`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub owner_id: String,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub price_cents: i64,
    pub stock: i64,
    pub low_stock_alert: i64,
}

impl Product {
    /// Builds a validated product from caller input.
    ///
    /// Generates the UUID and timestamps; rejects malformed SKUs, names,
    /// negative prices and negative initial stock before anything touches
    /// storage.
    pub fn create(new: NewProduct) -> crate::error::CoreResult<Product> {
        crate::validation::validate_sku(&new.sku)?;
        crate::validation::validate_product_name(&new.name)?;
        crate::validation::validate_price(new.price_cents)?;
        crate::validation::validate_stock_target(new.stock)?;

        if new.low_stock_alert < 0 {
            return Err(crate::error::ValidationError::Negative {
                field: "low_stock_alert".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        Ok(Product {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: new.owner_id,
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            category: new.category,
            price_cents: new.price_cents,
            stock: new.stock,
            low_stock_alert: new.low_stock_alert,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

// =============================================================================
// Inventory Movement
// =============================================================================

/// The direction of a recorded stock change.
///
/// `Adjustment` is only ever written by the set-stock operation, which
/// logs the absolute value of the applied delta; callers never submit an
/// adjustment directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock increase (restock, sale cancellation).
    In,
    /// Stock decrease (sale, manual subtraction).
    Out,
    /// Absolute correction written by set-stock.
    Adjustment,
}

impl MovementKind {
    /// Lowercase wire/database form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            MovementKind::In => "in",
            MovementKind::Out => "out",
            MovementKind::Adjustment => "adjustment",
        }
    }
}

/// One immutable entry in the inventory movement ledger.
///
/// ## Invariant
/// `new_stock - previous_stock` equals `+quantity` for `in`,
/// `-quantity` for `out`, and `±quantity` for `adjustment` - and always
/// matches what was written to `Product.stock` in the same transaction.
///
/// Rows are created exactly once per stock mutation and never updated or
/// deleted (append-only ledger).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryMovement {
    pub id: String,
    pub product_id: String,
    pub owner_id: String,
    pub kind: MovementKind,
    /// Magnitude of the change. Always positive.
    pub quantity: i64,
    /// Stock level before the mutation.
    pub previous_stock: i64,
    /// Stock level after the mutation.
    pub new_stock: i64,
    /// Why the stock changed. Required, free text.
    pub reason: String,
    /// Optional free-text notes.
    pub notes: Option<String>,
    /// Optional link to the originating record (e.g., "Sale #<id>").
    pub reference: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// The settlement status of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Completed,
    /// Cancelling a completed sale restores its stock decrements.
    Cancelled,
    /// Refunding does not restore stock; a returned item re-enters the
    /// ledger through an explicit `in` movement.
    Refunded,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

/// A settlement record for a set of purchased items.
///
/// Line items live in their own table (see [`SaleItem`]); this struct
/// mirrors the `sales` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub owner_id: String,
    /// Sum of line totals, in cents.
    pub subtotal_cents: i64,
    /// Fixed 15% of the subtotal, rounded to the cent.
    pub tax_cents: i64,
    /// `subtotal + tax`.
    pub total_cents: i64,
    /// Free-form payment method label ("cash", "card", ...). Non-empty.
    pub payment_method: String,
    pub status: SaleStatus,
    /// Optional customer details, stored as serialized [`CustomerInfo`].
    pub customer_info: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Parses the stored customer info, if any.
    pub fn customer(&self) -> Option<CustomerInfo> {
        self.customer_info
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// A line item in a sale.
///
/// Uses the snapshot pattern: name and unit price are copied from the
/// product at sale time, so later price changes never retroactively alter
/// historical sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Quantity sold. Always positive.
    pub quantity: i64,
    /// `unit_price × quantity`.
    pub line_total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// Optional customer details attached to a sale.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Computed monetary totals for a sale.
///
/// ## Invariant
/// `subtotal == Σ(quantity × price)`, `tax == rate × subtotal` rounded to
/// the cent, `total == subtotal + tax`. Recomputed from line items, never
/// edited directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl SaleTotals {
    /// Computes totals from `(unit_price, quantity)` pairs.
    ///
    /// ## Example
    /// ```rust
    /// use zato_core::money::Money;
    /// use zato_core::types::{SaleTotals, TaxRate};
    ///
    /// let totals = SaleTotals::compute(
    ///     [(Money::from_cents(500), 3)],
    ///     TaxRate::from_bps(1500),
    /// );
    /// assert_eq!(totals.subtotal_cents, 1500);
    /// assert_eq!(totals.tax_cents, 225);
    /// assert_eq!(totals.total_cents, 1725);
    /// ```
    pub fn compute<I>(lines: I, rate: TaxRate) -> Self
    where
        I: IntoIterator<Item = (Money, i64)>,
    {
        let mut subtotal = Money::zero();
        for (unit_price, quantity) in lines {
            subtotal += unit_price.multiply_quantity(quantity);
        }
        let tax = subtotal.calculate_tax(rate);
        let total = subtotal + tax;

        SaleTotals {
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: total.cents(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, alert: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            owner_id: "u1".to_string(),
            sku: "SKU-1".to_string(),
            name: "Widget".to_string(),
            description: None,
            category: "general".to_string(),
            price_cents: 500,
            stock,
            low_stock_alert: alert,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(product(5, 5).is_low_stock());
        assert!(product(2, 5).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }

    #[test]
    fn test_sale_totals_happy_path() {
        // Scenario: 3 × $5.00 at 15% tax
        let totals = SaleTotals::compute([(Money::from_cents(500), 3)], TaxRate::from_bps(1500));
        assert_eq!(totals.subtotal_cents, 1500);
        assert_eq!(totals.tax_cents, 225);
        assert_eq!(totals.total_cents, 1725);
    }

    #[test]
    fn test_sale_totals_multiple_lines() {
        let totals = SaleTotals::compute(
            [
                (Money::from_cents(250), 2), // $5.00
                (Money::from_cents(1099), 1), // $10.99
            ],
            TaxRate::from_bps(1500),
        );
        assert_eq!(totals.subtotal_cents, 1599);
        // 15% of $15.99 = $2.3985 → $2.40
        assert_eq!(totals.tax_cents, 240);
        assert_eq!(totals.total_cents, 1839);
    }

    #[test]
    fn test_sale_totals_empty_is_zero() {
        let totals = SaleTotals::compute([], TaxRate::from_bps(1500));
        assert_eq!(totals.subtotal_cents, 0);
        assert_eq!(totals.tax_cents, 0);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_customer_info_roundtrip() {
        let info = CustomerInfo {
            name: Some("Ada".to_string()),
            email: Some("ada@example.com".to_string()),
            phone: None,
        };
        let mut sale = Sale {
            id: "s1".to_string(),
            owner_id: "u1".to_string(),
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            payment_method: "cash".to_string(),
            status: SaleStatus::Completed,
            customer_info: Some(serde_json::to_string(&info).unwrap()),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let parsed = sale.customer().unwrap();
        assert_eq!(parsed.name.as_deref(), Some("Ada"));

        sale.customer_info = None;
        assert!(sale.customer().is_none());
    }

    #[test]
    fn test_movement_kind_as_str() {
        assert_eq!(MovementKind::In.as_str(), "in");
        assert_eq!(MovementKind::Out.as_str(), "out");
        assert_eq!(MovementKind::Adjustment.as_str(), "adjustment");
    }

    #[test]
    fn test_product_create_validates() {
        let new = NewProduct {
            owner_id: "u1".to_string(),
            sku: "WID-1".to_string(),
            name: "  Widget  ".to_string(),
            description: None,
            category: "general".to_string(),
            price_cents: 500,
            stock: 10,
            low_stock_alert: 5,
        };
        let p = Product::create(new.clone()).unwrap();
        assert_eq!(p.name, "Widget");
        assert_eq!(p.status, ProductStatus::Active);
        assert!(!p.id.is_empty());

        let bad = NewProduct {
            stock: -1,
            ..new.clone()
        };
        assert!(Product::create(bad).is_err());

        let bad = NewProduct {
            sku: "".to_string(),
            ..new
        };
        assert!(Product::create(bad).is_err());
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SaleStatus::default(), SaleStatus::Pending);
        assert_eq!(ProductStatus::default(), ProductStatus::Active);
    }
}

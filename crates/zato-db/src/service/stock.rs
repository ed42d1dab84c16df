//! # Stock Service
//!
//! Transactional stock mutations with an append-only movement ledger.
//!
//! ## Operations
//! - [`StockService::apply_movement`] - one in/out delta
//! - [`StockService::set_stock`] - absolute stock target, logged as an
//!   adjustment of the applied delta
//! - [`StockService::bulk_update`] - a batch of deltas/targets, each in
//!   its own transaction, partial failures collected per entry
//!
//! ## Invariants
//! - Stock never goes negative; a subtract past zero is rejected with
//!   [`CoreError::InsufficientStock`], never clamped
//! - Every stock change and its ledger entry commit in one transaction
//! - `movement.new_stock` always equals the product's stock at commit

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, ServiceResult};
use crate::service::{insert_movement, lock_product};
use zato_core::stock::{movement_quantity, next_stock};
use zato_core::validation::{validate_quantity, validate_reason, validate_stock_target};
use zato_core::{
    CoreError, InventoryMovement, MovementKind, Product, StockOp, ValidationError,
};

/// Context recorded with every ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementContext {
    /// Required free text explaining the change ("Restock", "Damage", ...).
    pub reason: String,
    pub notes: Option<String>,
    /// Link to a related record, e.g. "Sale #<id>".
    pub reference: Option<String>,
}

impl MovementContext {
    pub fn new(reason: impl Into<String>) -> Self {
        MovementContext {
            reason: reason.into(),
            notes: None,
            reference: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// One entry of a bulk stock update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockUpdate {
    pub product_id: String,
    /// Delta for add/subtract, absolute target for set.
    pub quantity: i64,
    pub op: StockOp,
}

/// One successfully applied bulk entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateResult {
    pub product_id: String,
    pub name: String,
    pub previous_stock: i64,
    pub new_stock: i64,
}

/// Outcome of a bulk update: applied entries plus per-entry failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkUpdateOutcome {
    pub results: Vec<BulkUpdateResult>,
    pub errors: Vec<String>,
}

/// Transactional service for stock mutations.
///
/// ## Usage
/// ```rust,ignore
/// let stock = db.stock();
///
/// let (product, movement) = stock
///     .apply_movement("owner-1", &id, MovementKind::In, 10,
///         MovementContext::new("Restock"))
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockService {
    pool: SqlitePool,
}

impl StockService {
    /// Creates a new StockService.
    pub fn new(pool: SqlitePool) -> Self {
        StockService { pool }
    }

    /// Applies one in/out stock delta and records it in the ledger.
    ///
    /// Adjustments are not accepted here; an absolute target goes through
    /// [`StockService::set_stock`] so the ledger quantity is derived from
    /// the actual delta.
    ///
    /// ## Returns
    /// The product after the mutation and the committed ledger entry.
    pub async fn apply_movement(
        &self,
        owner_id: &str,
        product_id: &str,
        kind: MovementKind,
        quantity: i64,
        ctx: MovementContext,
    ) -> ServiceResult<(Product, InventoryMovement)> {
        let op = match kind {
            MovementKind::In => StockOp::Add,
            MovementKind::Out => StockOp::Subtract,
            MovementKind::Adjustment => {
                return Err(ValidationError::NotAllowed {
                    field: "kind".to_string(),
                    allowed: vec!["in".to_string(), "out".to_string()],
                }
                .into());
            }
        };

        validate_quantity(quantity)?;
        validate_reason(&ctx.reason)?;

        debug!(owner = %owner_id, product = %product_id, ?kind, quantity, "Applying movement");

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let product = lock_product(&mut tx, owner_id, product_id, now).await?;

        let new_stock = next_stock(op, product.stock, quantity).ok_or_else(|| {
            CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: quantity,
            }
        })?;

        let updated =
            apply_stock_change(&mut tx, &product, op, quantity, new_stock, &ctx, now).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            product = %product_id, kind = kind.as_str(),
            previous = product.stock, new = new_stock,
            "Stock movement committed"
        );

        Ok(updated)
    }

    /// Sets a product's stock to an absolute target.
    ///
    /// The ledger records an adjustment whose quantity is the absolute
    /// applied delta. Setting stock to its current value changes nothing
    /// and records no movement.
    pub async fn set_stock(
        &self,
        owner_id: &str,
        product_id: &str,
        target: i64,
        ctx: MovementContext,
    ) -> ServiceResult<(Product, Option<InventoryMovement>)> {
        validate_stock_target(target)?;
        validate_reason(&ctx.reason)?;

        debug!(owner = %owner_id, product = %product_id, target, "Setting stock");

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let product = lock_product(&mut tx, owner_id, product_id, now).await?;

        if product.stock == target {
            // Nothing to write: undo the touch so not even updated_at moves
            tx.rollback()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            debug!(product = %product_id, "Stock already at target, no movement recorded");

            // The locked read carries the touched timestamp; hand back the
            // stored row instead
            let product = sqlx::query_as::<_, Product>(&format!(
                "SELECT {} FROM products WHERE id = ?1 AND owner_id = ?2",
                crate::service::PRODUCT_COLUMNS
            ))
            .bind(product_id)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await?;

            return Ok((product, None));
        }

        let (updated, movement) =
            apply_stock_change(&mut tx, &product, StockOp::Set, target, target, &ctx, now)
                .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            product = %product_id,
            previous = product.stock, new = target,
            "Stock adjustment committed"
        );

        Ok((updated, Some(movement)))
    }

    /// Applies a batch of stock updates, one transaction per entry.
    ///
    /// The whole batch is validated up front; a malformed entry (or an
    /// empty batch) aborts before anything is written. Execution is then
    /// best-effort: an entry that fails (missing product, insufficient
    /// stock) is reported in `errors` while the rest still apply.
    pub async fn bulk_update(
        &self,
        owner_id: &str,
        updates: &[StockUpdate],
        reason: &str,
        notes: Option<&str>,
    ) -> ServiceResult<BulkUpdateOutcome> {
        if updates.is_empty() {
            return Err(ValidationError::Required {
                field: "updates".to_string(),
            }
            .into());
        }

        validate_reason(reason)?;
        for update in updates {
            match update.op {
                StockOp::Add | StockOp::Subtract => validate_quantity(update.quantity)?,
                StockOp::Set => validate_stock_target(update.quantity)?,
            }
        }

        info!(owner = %owner_id, entries = updates.len(), "Starting bulk stock update");

        let mut outcome = BulkUpdateOutcome {
            results: Vec::with_capacity(updates.len()),
            errors: Vec::new(),
        };

        for update in updates {
            let ctx = match notes {
                Some(notes) => MovementContext::new(reason).with_notes(notes),
                None => MovementContext::new(reason),
            };

            let applied = match update.op {
                StockOp::Add => self
                    .apply_movement(owner_id, &update.product_id, MovementKind::In, update.quantity, ctx)
                    .await
                    .map(|(product, movement)| (product, Some(movement))),
                StockOp::Subtract => self
                    .apply_movement(owner_id, &update.product_id, MovementKind::Out, update.quantity, ctx)
                    .await
                    .map(|(product, movement)| (product, Some(movement))),
                StockOp::Set => {
                    self.set_stock(owner_id, &update.product_id, update.quantity, ctx)
                        .await
                }
            };

            match applied {
                Ok((product, movement)) => {
                    let previous_stock = movement
                        .as_ref()
                        .map(|m| m.previous_stock)
                        .unwrap_or(product.stock);
                    outcome.results.push(BulkUpdateResult {
                        product_id: product.id,
                        name: product.name,
                        previous_stock,
                        new_stock: product.stock,
                    });
                }
                Err(err) => {
                    warn!(product = %update.product_id, error = %err, "Bulk entry failed");
                    outcome
                        .errors
                        .push(format!("{}: {}", update.product_id, err));
                }
            }
        }

        info!(
            applied = outcome.results.len(),
            failed = outcome.errors.len(),
            "Bulk stock update finished"
        );

        Ok(outcome)
    }
}

/// Writes the new stock level and its ledger entry inside the caller's
/// transaction. `quantity` is the submitted value (delta, or target for
/// a set); the logged quantity is derived from the transition.
async fn apply_stock_change(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    product: &Product,
    op: StockOp,
    quantity: i64,
    new_stock: i64,
    ctx: &MovementContext,
    now: chrono::DateTime<Utc>,
) -> ServiceResult<(Product, InventoryMovement)> {
    sqlx::query("UPDATE products SET stock = ?3 WHERE id = ?1 AND owner_id = ?2")
        .bind(&product.id)
        .bind(&product.owner_id)
        .bind(new_stock)
        .execute(&mut **tx)
        .await?;

    let movement = InventoryMovement {
        id: Uuid::new_v4().to_string(),
        product_id: product.id.clone(),
        owner_id: product.owner_id.clone(),
        kind: op.movement_kind(),
        quantity: movement_quantity(op, quantity, product.stock, new_stock),
        previous_stock: product.stock,
        new_stock,
        reason: ctx.reason.trim().to_string(),
        notes: ctx.notes.clone(),
        reference: ctx.reference.clone(),
        created_at: now,
    };

    insert_movement(tx, &movement).await?;

    let mut updated = product.clone();
    updated.stock = new_stock;
    updated.updated_at = now;

    Ok((updated, movement))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::pool::{Database, DbConfig};
    use zato_core::NewProduct;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seeded_product(db: &Database, sku: &str, stock: i64) -> Product {
        let product = Product::create(NewProduct {
            owner_id: "owner-1".to_string(),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            category: "general".to_string(),
            price_cents: 500,
            stock,
            low_stock_alert: 5,
        })
        .unwrap();
        db.products().insert(&product).await.unwrap();
        product
    }

    #[tokio::test]
    async fn test_in_and_out_movements() {
        let db = test_db().await;
        let product = seeded_product(&db, "WID-1", 10).await;
        let stock = db.stock();

        let (updated, movement) = stock
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::In,
                5,
                MovementContext::new("Restock"),
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 15);
        assert_eq!(movement.previous_stock, 10);
        assert_eq!(movement.new_stock, 15);
        assert_eq!(movement.quantity, 5);
        assert_eq!(movement.kind, MovementKind::In);

        let (updated, movement) = stock
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::Out,
                15,
                MovementContext::new("Damage"),
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(movement.kind, MovementKind::Out);

        // Persisted stock matches the returned value
        let stored = db
            .products()
            .get_by_id("owner-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.stock, 0);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejected_without_write() {
        let db = test_db().await;
        let product = seeded_product(&db, "WID-1", 2).await;

        let err = db
            .stock()
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::Out,
                5,
                MovementContext::new("Sale"),
            )
            .await
            .unwrap_err();
        assert!(err.is_insufficient_stock());

        // Nothing committed: stock unchanged, ledger empty
        let stored = db
            .products()
            .get_by_id("owner-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.stock, 2);
        assert_eq!(db.movements().count("owner-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_product_and_wrong_owner() {
        let db = test_db().await;
        let product = seeded_product(&db, "WID-1", 10).await;
        let stock = db.stock();

        let err = stock
            .apply_movement(
                "owner-1",
                "no-such-id",
                MovementKind::In,
                1,
                MovementContext::new("Restock"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::ProductNotFound(_))
        ));

        // Another owner's product is reported the same way
        let err = stock
            .apply_movement(
                "owner-2",
                &product.id,
                MovementKind::In,
                1,
                MovementContext::new("Restock"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::ProductNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_adjustment_kind_rejected() {
        let db = test_db().await;
        let product = seeded_product(&db, "WID-1", 10).await;

        let err = db
            .stock()
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::Adjustment,
                3,
                MovementContext::new("Recount"),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Core(CoreError::Validation(ValidationError::NotAllowed { .. }))
        ));
    }

    #[tokio::test]
    async fn test_set_stock_logs_abs_delta() {
        let db = test_db().await;
        let product = seeded_product(&db, "WID-1", 8).await;

        let (updated, movement) = db
            .stock()
            .set_stock("owner-1", &product.id, 3, MovementContext::new("Recount"))
            .await
            .unwrap();
        let movement = movement.unwrap();
        assert_eq!(updated.stock, 3);
        assert_eq!(movement.kind, MovementKind::Adjustment);
        assert_eq!(movement.quantity, 5);
        assert_eq!(movement.previous_stock, 8);
        assert_eq!(movement.new_stock, 3);
    }

    #[tokio::test]
    async fn test_set_stock_noop_records_nothing() {
        let db = test_db().await;
        let product = seeded_product(&db, "WID-1", 8).await;
        let before = db
            .products()
            .get_by_id("owner-1", &product.id)
            .await
            .unwrap()
            .unwrap();

        let (updated, movement) = db
            .stock()
            .set_stock("owner-1", &product.id, 8, MovementContext::new("Recount"))
            .await
            .unwrap();
        assert_eq!(updated.stock, 8);
        assert!(movement.is_none());
        assert_eq!(db.movements().count("owner-1").await.unwrap(), 0);

        // Not even the timestamp moves on a no-op
        let after = db
            .products()
            .get_by_id("owner-1", &product.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.updated_at, before.updated_at);
        assert_eq!(updated.updated_at, before.updated_at);
    }

    #[tokio::test]
    async fn test_bulk_update_partial_failure() {
        let db = test_db().await;
        let p1 = seeded_product(&db, "WID-1", 10).await;
        let p2 = seeded_product(&db, "WID-2", 10).await;

        // An oversized subtract is a per-entry stock error, never a
        // batch abort: the other entries still apply
        let outcome = db
            .stock()
            .bulk_update(
                "owner-1",
                &[
                    StockUpdate {
                        product_id: p1.id.clone(),
                        quantity: 5,
                        op: StockOp::Add,
                    },
                    StockUpdate {
                        product_id: p2.id.clone(),
                        quantity: 1000,
                        op: StockOp::Subtract,
                    },
                ],
                "Cycle count",
                None,
            )
            .await
            .unwrap();

        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].product_id, p1.id);
        assert_eq!(outcome.results[0].previous_stock, 10);
        assert_eq!(outcome.results[0].new_stock, 15);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].contains(&p2.id));
        assert!(outcome.errors[0].contains("Insufficient stock"));

        // Failed entry left its product untouched
        let stored = db.products().get_by_id("owner-1", &p2.id).await.unwrap();
        assert_eq!(stored.unwrap().stock, 10);
    }

    #[tokio::test]
    async fn test_quantity_has_no_upper_bound() {
        let db = test_db().await;
        let product = seeded_product(&db, "WID-1", 0).await;
        let stock = db.stock();

        let (updated, _) = stock
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::In,
                100_000,
                MovementContext::new("Restock"),
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 100_000);

        // Any quantity covered by stock is satisfiable
        let (updated, movement) = stock
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::Out,
                100_000,
                MovementContext::new("Transfer"),
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(movement.quantity, 100_000);
    }

    #[tokio::test]
    async fn test_bulk_update_rejects_malformed_batch() {
        let db = test_db().await;
        let p1 = seeded_product(&db, "WID-1", 10).await;

        // Zero quantity fails upfront validation, nothing is applied
        let err = db
            .stock()
            .bulk_update(
                "owner-1",
                &[
                    StockUpdate {
                        product_id: p1.id.clone(),
                        quantity: 5,
                        op: StockOp::Add,
                    },
                    StockUpdate {
                        product_id: p1.id.clone(),
                        quantity: 0,
                        op: StockOp::Add,
                    },
                ],
                "Cycle count",
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));

        let stored = db.products().get_by_id("owner-1", &p1.id).await.unwrap();
        assert_eq!(stored.unwrap().stock, 10);

        let err = db
            .stock()
            .bulk_update("owner-1", &[], "Cycle count", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_ledger_chains_stock_levels() {
        let db = test_db().await;
        let product = seeded_product(&db, "WID-1", 0).await;
        let stock = db.stock();

        stock
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::In,
                10,
                MovementContext::new("Restock"),
            )
            .await
            .unwrap();
        stock
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::Out,
                4,
                MovementContext::new("Sale"),
            )
            .await
            .unwrap();
        stock
            .set_stock("owner-1", &product.id, 20, MovementContext::new("Recount"))
            .await
            .unwrap();

        // Oldest first: each entry's new_stock is the next entry's previous_stock
        let mut history = db
            .movements()
            .list_for_product("owner-1", &product.id)
            .await
            .unwrap();
        history.reverse();
        assert_eq!(history.len(), 3);
        for pair in history.windows(2) {
            assert_eq!(pair[0].new_stock, pair[1].previous_stock);
        }
        assert_eq!(history[2].new_stock, 20);
    }
}

//! # Service Layer
//!
//! Transactional operations that span multiple tables.
//!
//! Repositories handle single-table reads and writes; everything that
//! must mutate stock and the movement ledger together goes through a
//! service here, inside one SQLite write transaction.
//!
//! ## Locking
//!
//! SQLite transactions start deferred. Under concurrency a transaction
//! that reads stock and later writes it can lose the race for the write
//! lock and fail with `SQLITE_BUSY_SNAPSHOT`. Every service transaction
//! therefore starts with an UPDATE on the product row (a touch of
//! `updated_at`) so the write lock is held before any stock is read.
//! The `CHECK (stock >= 0)` constraint is the last line of defense.

pub mod sale;
pub mod stock;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

use crate::error::ServiceResult;
use zato_core::{CoreError, InventoryMovement, Product};

pub(crate) const PRODUCT_COLUMNS: &str = "id, owner_id, sku, name, description, category, \
     price_cents, stock, low_stock_alert, status, created_at, updated_at";

/// Takes the write lock on a product row and returns its current state.
///
/// The touch UPDATE is the first write of the enclosing transaction, so
/// the stock value read afterwards cannot be changed by another writer
/// until this transaction ends.
pub(crate) async fn lock_product(
    conn: &mut SqliteConnection,
    owner_id: &str,
    product_id: &str,
    now: DateTime<Utc>,
) -> ServiceResult<Product> {
    let touched = sqlx::query("UPDATE products SET updated_at = ?3 WHERE id = ?1 AND owner_id = ?2")
        .bind(product_id)
        .bind(owner_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    if touched.rows_affected() == 0 {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }

    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND owner_id = ?2"
    ))
    .bind(product_id)
    .bind(owner_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(product)
}

/// Appends one movement to the ledger inside the caller's transaction.
pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &InventoryMovement,
) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO inventory_movements (
            id, product_id, owner_id, kind, quantity,
            previous_stock, new_stock, reason, notes, reference, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
    )
    .bind(&movement.id)
    .bind(&movement.product_id)
    .bind(&movement.owner_id)
    .bind(movement.kind)
    .bind(movement.quantity)
    .bind(movement.previous_stock)
    .bind(movement.new_stock)
    .bind(&movement.reason)
    .bind(&movement.notes)
    .bind(&movement.reference)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

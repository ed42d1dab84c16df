//! # Sale Service
//!
//! Transactional sale settlement.
//!
//! Creating a sale writes the sale header, its line items, one `out`
//! movement per line and the new stock levels in a single transaction.
//! Either the whole settlement commits or none of it does.
//!
//! ## Snapshots
//! Line items freeze the product name and unit price at settlement time.
//! Later edits to the product never rewrite a past sale.
//!
//! ## Status Transitions
//! Cancelling a completed sale restores its stock through `in`
//! movements. A refund keeps the status change only: refunded goods are
//! not assumed to come back sellable, so stock is restored separately
//! via an explicit `in` movement when it does.

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, ServiceError, ServiceResult};
use crate::repository::sale::SaleDetails;
use crate::service::{insert_movement, lock_product};
use zato_core::validation::{validate_payment_method, validate_quantity};
use zato_core::{
    CoreError, CustomerInfo, InventoryMovement, MovementKind, Sale, SaleItem, SaleStatus,
    SaleTotals, TaxRate, ValidationError, SALE_TAX_BPS,
};

/// One line of a sale request: which product, how many.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// A sale request as submitted by a caller.
///
/// Prices are never part of the request; they are read from the product
/// ledger inside the settlement transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSale {
    pub items: Vec<SaleLine>,
    pub payment_method: String,
    pub customer: Option<CustomerInfo>,
    pub notes: Option<String>,
}

/// Transactional service for sale settlement.
///
/// ## Usage
/// ```rust,ignore
/// let details = db.sale_service()
///     .create_sale("owner-1", NewSale {
///         items: vec![SaleLine { product_id, quantity: 3 }],
///         payment_method: "cash".to_string(),
///         customer: None,
///         notes: None,
///     })
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleService {
    pool: SqlitePool,
}

impl SaleService {
    /// Creates a new SaleService.
    pub fn new(pool: SqlitePool) -> Self {
        SaleService { pool }
    }

    /// Settles a sale: decrements stock, freezes item snapshots, logs one
    /// `out` movement per line and commits the sale as completed.
    ///
    /// ## Errors
    /// * `CoreError::ProductsNotFound` - Any cart product missing for this
    ///   owner; every unresolvable id is reported
    /// * `CoreError::InsufficientStock` - A line (or the combined lines
    ///   for one product) exceeds available stock; nothing is written
    pub async fn create_sale(&self, owner_id: &str, new_sale: NewSale) -> ServiceResult<SaleDetails> {
        if new_sale.items.is_empty() {
            return Err(ValidationError::Required {
                field: "items".to_string(),
            }
            .into());
        }
        validate_payment_method(&new_sale.payment_method)?;
        for line in &new_sale.items {
            validate_quantity(line.quantity)?;
        }

        let mut distinct_ids: Vec<&str> = Vec::new();
        for line in &new_sale.items {
            if !distinct_ids.contains(&line.product_id.as_str()) {
                distinct_ids.push(&line.product_id);
            }
        }

        debug!(owner = %owner_id, lines = new_sale.items.len(), "Settling sale");

        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Touch every cart product in one statement: takes the write lock
        // before stock is read, and counts how many rows actually exist.
        let mut touch: QueryBuilder<Sqlite> =
            QueryBuilder::new("UPDATE products SET updated_at = ");
        touch.push_bind(now);
        touch.push(" WHERE owner_id = ");
        touch.push_bind(owner_id.to_string());
        touch.push(" AND id IN (");
        {
            let mut ids = touch.separated(", ");
            for id in &distinct_ids {
                ids.push_bind(id.to_string());
            }
        }
        touch.push(")");
        let touched = touch.build().execute(&mut *tx).await?;

        if touched.rows_affected() as usize != distinct_ids.len() {
            let missing = Self::find_missing(&mut tx, owner_id, &distinct_ids).await?;
            return Err(CoreError::ProductsNotFound { ids: missing }.into());
        }

        let products = Self::load_products(&mut tx, owner_id, &distinct_ids).await?;

        // Per-product running usage so duplicate lines for one product are
        // checked against the combined demand.
        let mut used: HashMap<&str, i64> = HashMap::new();
        for line in &new_sale.items {
            let product = &products[line.product_id.as_str()];
            let already = used.get(line.product_id.as_str()).copied().unwrap_or(0);
            if already + line.quantity > product.stock {
                return Err(CoreError::InsufficientStock {
                    name: product.name.clone(),
                    available: product.stock - already,
                    requested: line.quantity,
                }
                .into());
            }
            used.insert(&line.product_id, already + line.quantity);
        }

        let totals = SaleTotals::compute(
            new_sale
                .items
                .iter()
                .map(|line| (products[line.product_id.as_str()].price(), line.quantity)),
            TaxRate::from_bps(SALE_TAX_BPS),
        );

        let customer_info = match &new_sale.customer {
            Some(customer) => Some(
                serde_json::to_string(customer)
                    .map_err(|e| DbError::Internal(e.to_string()))?,
            ),
            None => None,
        };

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            subtotal_cents: totals.subtotal_cents,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            payment_method: new_sale.payment_method.trim().to_string(),
            status: SaleStatus::Completed,
            customer_info,
            notes: new_sale.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO sales (
                id, owner_id, subtotal_cents, tax_cents, total_cents,
                payment_method, status, customer_info, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(&sale.id)
        .bind(&sale.owner_id)
        .bind(sale.subtotal_cents)
        .bind(sale.tax_cents)
        .bind(sale.total_cents)
        .bind(&sale.payment_method)
        .bind(sale.status)
        .bind(&sale.customer_info)
        .bind(&sale.notes)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        let reference = format!("Sale #{}", sale.id);
        let mut items = Vec::with_capacity(new_sale.items.len());
        // Tracks the running stock level so chained ledger entries stay
        // consistent when one product appears on several lines.
        let mut running: HashMap<&str, i64> = HashMap::new();

        for line in &new_sale.items {
            let product = &products[line.product_id.as_str()];

            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: product.id.clone(),
                name_snapshot: product.name.clone(),
                unit_price_cents: product.price_cents,
                quantity: line.quantity,
                line_total_cents: product.price_cents * line.quantity,
                created_at: now,
            };

            sqlx::query(
                "INSERT INTO sale_items (
                    id, sale_id, product_id, name_snapshot,
                    unit_price_cents, quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;

            let previous = running
                .get(line.product_id.as_str())
                .copied()
                .unwrap_or(product.stock);
            let new_stock = previous - line.quantity;
            running.insert(&line.product_id, new_stock);

            let movement = InventoryMovement {
                id: Uuid::new_v4().to_string(),
                product_id: product.id.clone(),
                owner_id: owner_id.to_string(),
                kind: MovementKind::Out,
                quantity: line.quantity,
                previous_stock: previous,
                new_stock,
                reason: "Sale".to_string(),
                notes: None,
                reference: Some(reference.clone()),
                created_at: now,
            };
            insert_movement(&mut tx, &movement).await?;

            items.push(item);
        }

        for (product_id, new_stock) in running.iter() {
            sqlx::query("UPDATE products SET stock = ?3 WHERE id = ?1 AND owner_id = ?2")
                .bind(*product_id)
                .bind(owner_id)
                .bind(*new_stock)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale = %sale.id, total_cents = sale.total_cents,
            lines = items.len(), "Sale settled"
        );

        Ok(SaleDetails { sale, items })
    }

    /// Changes a sale's status.
    ///
    /// Cancelling a completed sale restores stock with `in` movements
    /// referencing the sale. No other transition touches stock; in
    /// particular a refund does not restore it.
    pub async fn update_status(
        &self,
        owner_id: &str,
        sale_id: &str,
        new_status: SaleStatus,
    ) -> ServiceResult<Sale> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Touch-first, same as product locking: the sale row is written
        // before anything is read inside the transaction.
        let touched = sqlx::query(
            "UPDATE sales SET updated_at = ?3 WHERE id = ?1 AND owner_id = ?2",
        )
        .bind(sale_id)
        .bind(owner_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        if touched.rows_affected() == 0 {
            return Err(CoreError::SaleNotFound(sale_id.to_string()).into());
        }

        let mut sale = sqlx::query_as::<_, Sale>(
            "SELECT id, owner_id, subtotal_cents, tax_cents, total_cents,
                    payment_method, status, customer_info, notes, created_at, updated_at
             FROM sales WHERE id = ?1 AND owner_id = ?2",
        )
        .bind(sale_id)
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;

        let restore_stock =
            sale.status == SaleStatus::Completed && new_status == SaleStatus::Cancelled;

        if restore_stock {
            let items = sqlx::query_as::<_, SaleItem>(
                "SELECT id, sale_id, product_id, name_snapshot, unit_price_cents,
                        quantity, line_total_cents, created_at
                 FROM sale_items WHERE sale_id = ?1 ORDER BY rowid",
            )
            .bind(sale_id)
            .fetch_all(&mut *tx)
            .await?;

            let reference = format!("Sale #{}", sale.id);

            for item in &items {
                let product =
                    match lock_product(&mut tx, owner_id, &item.product_id, now).await {
                        Ok(product) => product,
                        Err(ServiceError::Core(CoreError::ProductNotFound(_))) => {
                            // Product row gone from the ledger; nothing to
                            // restore for this line.
                            debug!(product = %item.product_id, "Skipping restore, product missing");
                            continue;
                        }
                        Err(err) => return Err(err),
                    };

                let new_stock = product.stock + item.quantity;
                sqlx::query("UPDATE products SET stock = ?3 WHERE id = ?1 AND owner_id = ?2")
                    .bind(&product.id)
                    .bind(owner_id)
                    .bind(new_stock)
                    .execute(&mut *tx)
                    .await?;

                let movement = InventoryMovement {
                    id: Uuid::new_v4().to_string(),
                    product_id: product.id.clone(),
                    owner_id: owner_id.to_string(),
                    kind: MovementKind::In,
                    quantity: item.quantity,
                    previous_stock: product.stock,
                    new_stock,
                    reason: "Sale cancellation".to_string(),
                    notes: None,
                    reference: Some(reference.clone()),
                    created_at: now,
                };
                insert_movement(&mut tx, &movement).await?;
            }
        }

        sqlx::query("UPDATE sales SET status = ?3, updated_at = ?4 WHERE id = ?1 AND owner_id = ?2")
            .bind(sale_id)
            .bind(owner_id)
            .bind(new_status)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale = %sale_id, from = ?sale.status, to = ?new_status,
            stock_restored = restore_stock, "Sale status updated"
        );

        sale.status = new_status;
        sale.updated_at = now;
        Ok(sale)
    }

    /// Ids from `requested` with no product row for this owner.
    async fn find_missing(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        owner_id: &str,
        requested: &[&str],
    ) -> ServiceResult<Vec<String>> {
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id FROM products WHERE owner_id = ");
        qb.push_bind(owner_id.to_string());
        qb.push(" AND id IN (");
        {
            let mut ids = qb.separated(", ");
            for id in requested {
                ids.push_bind(id.to_string());
            }
        }
        qb.push(")");

        let found: Vec<String> = qb.build_query_scalar().fetch_all(&mut **tx).await?;

        Ok(requested
            .iter()
            .filter(|id| !found.iter().any(|f| f.as_str() == **id))
            .map(|id| id.to_string())
            .collect())
    }

    /// Loads the locked cart products into a map keyed by id.
    async fn load_products(
        tx: &mut sqlx::Transaction<'_, Sqlite>,
        owner_id: &str,
        ids: &[&str],
    ) -> ServiceResult<HashMap<String, zato_core::Product>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT id, owner_id, sku, name, description, category, price_cents,
                    stock, low_stock_alert, status, created_at, updated_at
             FROM products WHERE owner_id = ",
        );
        qb.push_bind(owner_id.to_string());
        qb.push(" AND id IN (");
        {
            let mut sep = qb.separated(", ");
            for id in ids {
                sep.push_bind(id.to_string());
            }
        }
        qb.push(")");

        let products: Vec<zato_core::Product> =
            qb.build_query_as().fetch_all(&mut **tx).await?;

        Ok(products.into_iter().map(|p| (p.id.clone(), p)).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

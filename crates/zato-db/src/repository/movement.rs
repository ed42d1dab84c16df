//! # Movement Repository
//!
//! Read access to the append-only inventory movement ledger.
//!
//! Movements are only ever written inside a stock or sale transaction
//! (see the service layer); this repository exposes listings and counts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{clamp_page, Paginated, DEFAULT_PAGE_LIMIT};
use zato_core::{InventoryMovement, MovementKind};

const MOVEMENT_COLUMNS: &str = "id, product_id, owner_id, kind, quantity, \
     previous_stock, new_stock, reason, notes, reference, created_at";

/// Filter options for listing movements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementFilter {
    pub product_id: Option<String>,
    pub kind: Option<MovementKind>,
    /// Inclusive lower bound on `created_at`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

impl Default for MovementFilter {
    fn default() -> Self {
        MovementFilter {
            product_id: None,
            kind: None,
            start: None,
            end: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Repository for inventory movement queries.
#[derive(Debug, Clone)]
pub struct MovementRepository {
    pool: SqlitePool,
}

impl MovementRepository {
    /// Creates a new MovementRepository.
    pub fn new(pool: SqlitePool) -> Self {
        MovementRepository { pool }
    }

    /// Lists movements with filters and pagination, newest first.
    pub async fn list(
        &self,
        owner_id: &str,
        filter: &MovementFilter,
    ) -> DbResult<Paginated<InventoryMovement>> {
        let (page, limit) = clamp_page(filter.page, filter.limit);
        let offset = (page - 1) as i64 * limit as i64;

        debug!(owner = %owner_id, ?filter, "Listing movements");

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM inventory_movements");
        Self::push_filter(&mut count_qb, owner_id, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {MOVEMENT_COLUMNS} FROM inventory_movements"));
        Self::push_filter(&mut qb, owner_id, filter);
        // rowid breaks timestamp ties in insertion order (entries written
        // in one transaction share a created_at)
        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let movements: Vec<InventoryMovement> =
            qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paginated::new(movements, page, limit, total))
    }

    fn push_filter(qb: &mut QueryBuilder<Sqlite>, owner_id: &str, filter: &MovementFilter) {
        qb.push(" WHERE owner_id = ");
        qb.push_bind(owner_id.to_string());

        if let Some(product_id) = &filter.product_id {
            qb.push(" AND product_id = ");
            qb.push_bind(product_id.to_string());
        }

        if let Some(kind) = filter.kind {
            qb.push(" AND kind = ");
            qb.push_bind(kind);
        }

        if let Some(start) = filter.start {
            qb.push(" AND created_at >= ");
            qb.push_bind(start);
        }

        if let Some(end) = filter.end {
            qb.push(" AND created_at <= ");
            qb.push_bind(end);
        }
    }

    /// Full movement history for one product, newest first.
    pub async fn list_for_product(
        &self,
        owner_id: &str,
        product_id: &str,
    ) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM inventory_movements
             WHERE owner_id = ?1 AND product_id = ?2
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(owner_id)
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Counts all movements for an owner.
    pub async fn count(&self, owner_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_movements WHERE owner_id = ?1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::service::stock::MovementContext;
    use zato_core::{NewProduct, Product};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seeded_product(db: &Database, owner: &str, stock: i64) -> Product {
        let product = Product::create(NewProduct {
            owner_id: owner.to_string(),
            sku: "WID-1".to_string(),
            name: "Widget".to_string(),
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
    async fn test_list_filters_and_order() {
        let db = test_db().await;
        let product = seeded_product(&db, "owner-1", 10).await;
        let stock = db.stock();

        stock
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::In,
                5,
                MovementContext::new("Restock"),
            )
            .await
            .unwrap();
        stock
            .apply_movement(
                "owner-1",
                &product.id,
                MovementKind::Out,
                3,
                MovementContext::new("Damage"),
            )
            .await
            .unwrap();

        let all = db
            .movements()
            .list("owner-1", &MovementFilter::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        // Newest first
        assert_eq!(all.items[0].kind, MovementKind::Out);

        let outs = db
            .movements()
            .list(
                "owner-1",
                &MovementFilter {
                    kind: Some(MovementKind::Out),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(outs.total, 1);
        assert_eq!(outs.items[0].reason, "Damage");

        let history = db
            .movements()
            .list_for_product("owner-1", &product.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);

        // Other owners see nothing
        assert_eq!(db.movements().count("owner-2").await.unwrap(), 0);
    }
}

//! # Sale Repository
//!
//! Read access to settled sales and their line items.
//!
//! Sales are only ever written through
//! [`crate::service::sale::SaleService`] so settlement stays atomic;
//! this repository exposes lookups, listings and revenue summaries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::{clamp_page, Paginated, DEFAULT_PAGE_LIMIT};
use zato_core::{Sale, SaleItem, SaleStatus};

const SALE_COLUMNS: &str = "id, owner_id, subtotal_cents, tax_cents, total_cents, \
     payment_method, status, customer_info, notes, created_at, updated_at";

const SALE_ITEM_COLUMNS: &str = "id, sale_id, product_id, name_snapshot, \
     unit_price_cents, quantity, line_total_cents, created_at";

/// A sale together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDetails {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Filter options for listing sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleFilter {
    pub status: Option<SaleStatus>,
    /// Inclusive lower bound on `created_at`.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub end: Option<DateTime<Utc>>,
    pub page: u32,
    pub limit: u32,
}

impl Default for SaleFilter {
    fn default() -> Self {
        SaleFilter {
            status: None,
            start: None,
            end: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Revenue statistics over completed sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    /// Zero when there are no completed sales.
    pub average_order_value_cents: i64,
}

/// Repository for sale queries.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by its ID, scoped to the owner.
    pub async fn get_by_id(&self, owner_id: &str, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Line items of a sale, in insertion order.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(&format!(
            "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid"
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale together with its line items.
    pub async fn get_details(&self, owner_id: &str, id: &str) -> DbResult<Option<SaleDetails>> {
        let Some(sale) = self.get_by_id(owner_id, id).await? else {
            return Ok(None);
        };
        let items = self.get_items(&sale.id).await?;
        Ok(Some(SaleDetails { sale, items }))
    }

    /// Lists sales with filters and pagination, newest first.
    pub async fn list(&self, owner_id: &str, filter: &SaleFilter) -> DbResult<Paginated<Sale>> {
        let (page, limit) = clamp_page(filter.page, filter.limit);
        let offset = (page - 1) as i64 * limit as i64;

        debug!(owner = %owner_id, ?filter, "Listing sales");

        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM sales");
        Self::push_filter(&mut count_qb, owner_id, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {SALE_COLUMNS} FROM sales"));
        Self::push_filter(&mut qb, owner_id, filter);
        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let sales: Vec<Sale> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paginated::new(sales, page, limit, total))
    }

    fn push_filter(qb: &mut QueryBuilder<Sqlite>, owner_id: &str, filter: &SaleFilter) {
        qb.push(" WHERE owner_id = ");
        qb.push_bind(owner_id.to_string());

        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
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

    /// Revenue summary over completed sales, optionally bounded by date.
    ///
    /// Cancelled and refunded sales never count towards revenue.
    pub async fn sales_summary(
        &self,
        owner_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<SalesSummary> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM sales
             WHERE status = 'completed' AND owner_id = ",
        );
        qb.push_bind(owner_id.to_string());

        if let Some(start) = start {
            qb.push(" AND created_at >= ");
            qb.push_bind(start);
        }
        if let Some(end) = end {
            qb.push(" AND created_at <= ");
            qb.push_bind(end);
        }

        let (total_sales, total_revenue_cents): (i64, i64) =
            qb.build_query_as().fetch_one(&self.pool).await?;

        let average_order_value_cents = if total_sales > 0 {
            total_revenue_cents / total_sales
        } else {
            0
        };

        Ok(SalesSummary {
            total_sales,
            total_revenue_cents,
            average_order_value_cents,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::service::sale::{NewSale, SaleLine};
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

    fn cash_sale(product_id: &str, quantity: i64) -> NewSale {
        NewSale {
            items: vec![SaleLine {
                product_id: product_id.to_string(),
                quantity,
            }],
            payment_method: "cash".to_string(),
            customer: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_listing_and_summary() {
        let db = test_db().await;
        let product = seeded_product(&db, "owner-1", 100).await;
        let service = db.sale_service();

        // 2 * 500 = 1000, tax 150, total 1150
        service
            .create_sale("owner-1", cash_sale(&product.id, 2))
            .await
            .unwrap();
        // 4 * 500 = 2000, tax 300, total 2300
        let second = service
            .create_sale("owner-1", cash_sale(&product.id, 4))
            .await
            .unwrap();

        let repo = db.sales();

        let page = repo.list("owner-1", &SaleFilter::default()).await.unwrap();
        assert_eq!(page.total, 2);

        let details = repo
            .get_details("owner-1", &second.sale.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].quantity, 4);
        assert_eq!(details.items[0].name_snapshot, "Widget");

        let summary = repo.sales_summary("owner-1", None, None).await.unwrap();
        assert_eq!(summary.total_sales, 2);
        assert_eq!(summary.total_revenue_cents, 1150 + 2300);
        assert_eq!(summary.average_order_value_cents, (1150 + 2300) / 2);

        // Cancelled sales drop out of the summary
        service
            .update_status("owner-1", &second.sale.id, SaleStatus::Cancelled)
            .await
            .unwrap();
        let summary = repo.sales_summary("owner-1", None, None).await.unwrap();
        assert_eq!(summary.total_sales, 1);
        assert_eq!(summary.total_revenue_cents, 1150);
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let db = test_db().await;
        let product = seeded_product(&db, "owner-1", 10).await;
        let created = db
            .sale_service()
            .create_sale("owner-1", cash_sale(&product.id, 1))
            .await
            .unwrap();

        assert!(db
            .sales()
            .get_by_id("owner-2", &created.sale.id)
            .await
            .unwrap()
            .is_none());
    }
}

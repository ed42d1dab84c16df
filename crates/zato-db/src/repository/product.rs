//! # Product Repository
//!
//! Database operations for the product ledger.
//!
//! ## Key Operations
//! - CRUD, always owner-scoped
//! - Filtered, paginated listings (search, category, status, low stock)
//! - Inventory summary statistics
//!
//! Stock is deliberately absent from `update()`: every stock change goes
//! through [`crate::service::stock::StockService`] so the movement ledger
//! stays consistent with the product row.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{clamp_page, Paginated, DEFAULT_PAGE_LIMIT};
use zato_core::{Product, ProductStatus};

/// Column list shared by every product SELECT.
const PRODUCT_COLUMNS: &str = "id, owner_id, sku, name, description, category, \
     price_cents, stock, low_stock_alert, status, created_at, updated_at";

/// Filter options for listing products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match on the name.
    pub search: Option<String>,
    pub category: Option<String>,
    pub status: Option<ProductStatus>,
    /// Only products at or below their low-stock threshold.
    pub low_stock_only: bool,
    pub page: u32,
    pub limit: u32,
}

impl Default for ProductFilter {
    fn default() -> Self {
        ProductFilter {
            search: None,
            category: None,
            status: None,
            low_stock_only: false,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Aggregate statistics over one owner's product ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_products: i64,
    pub active_products: i64,
    pub inactive_products: i64,
    /// Active products at or below their low-stock threshold.
    pub low_stock_products: i64,
    /// Active products with zero stock.
    pub out_of_stock_products: i64,
    /// Σ(stock × price) over active products, in cents.
    pub total_stock_value_cents: i64,
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let page = repo.list("owner-1", &ProductFilter::default()).await?;
/// let product = repo.get_by_id("owner-1", "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists for this owner
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, owner = %product.owner_id, "Inserting product");

        sqlx::query(
            "INSERT INTO products (
                id, owner_id, sku, name, description, category,
                price_cents, stock, low_stock_alert, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&product.id)
        .bind(&product.owner_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.low_stock_alert)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Gets a product by its ID, scoped to the owner.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found and owned by `owner_id`
    /// * `Ok(None)` - No such product for this owner
    pub async fn get_by_id(&self, owner_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU, scoped to the owner.
    pub async fn get_by_sku(&self, owner_id: &str, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1 AND owner_id = ?2"
        ))
        .bind(sku)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products with filters and pagination, sorted by name.
    pub async fn list(&self, owner_id: &str, filter: &ProductFilter) -> DbResult<Paginated<Product>> {
        let (page, limit) = clamp_page(filter.page, filter.limit);
        let offset = (page - 1) as i64 * limit as i64;

        debug!(owner = %owner_id, ?filter, "Listing products");

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM products");
        Self::push_filter(&mut count_qb, owner_id, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {PRODUCT_COLUMNS} FROM products"));
        Self::push_filter(&mut qb, owner_id, filter);
        qb.push(" ORDER BY name LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let products: Vec<Product> = qb.build_query_as().fetch_all(&self.pool).await?;

        Ok(Paginated::new(products, page, limit, total))
    }

    /// Appends the shared WHERE clause for `list`/count queries.
    fn push_filter(qb: &mut QueryBuilder<Sqlite>, owner_id: &str, filter: &ProductFilter) {
        qb.push(" WHERE owner_id = ");
        qb.push_bind(owner_id.to_string());

        if let Some(search) = &filter.search {
            qb.push(" AND name LIKE ");
            qb.push_bind(format!("%{}%", search));
        }

        if let Some(category) = &filter.category {
            qb.push(" AND category = ");
            qb.push_bind(category.to_string());
        }

        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }

        if filter.low_stock_only {
            qb.push(" AND stock <= low_stock_alert");
        }
    }

    /// Lists active products at or below their low-stock threshold,
    /// most depleted first.
    pub async fn list_low_stock(&self, owner_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products
             WHERE owner_id = ?1 AND status = 'active' AND stock <= low_stock_alert
             ORDER BY stock ASC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Updates a product's descriptive fields.
    ///
    /// Stock is not touched here; see the module docs.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - Product doesn't exist for this owner
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET
                sku = ?3,
                name = ?4,
                description = ?5,
                category = ?6,
                price_cents = ?7,
                low_stock_alert = ?8,
                status = ?9,
                updated_at = ?10
             WHERE id = ?1 AND owner_id = ?2",
        )
        .bind(&product.id)
        .bind(&product.owner_id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.low_stock_alert)
        .bind(product.status)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting status = inactive.
    ///
    /// ## Why Soft Delete?
    /// - Historical sales and movements still reference this product
    /// - Can be restored if deleted by mistake
    pub async fn soft_delete(&self, owner_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET status = 'inactive', updated_at = ?3
             WHERE id = ?1 AND owner_id = ?2",
        )
        .bind(id)
        .bind(owner_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products for an owner.
    pub async fn count(&self, owner_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE owner_id = ?1 AND status = 'active'",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Aggregate statistics over one owner's ledger.
    pub async fn inventory_summary(&self, owner_id: &str) -> DbResult<InventorySummary> {
        let total_products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE owner_id = ?1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;

        let active_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE owner_id = ?1 AND status = 'active'",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let low_stock_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products
             WHERE owner_id = ?1 AND status = 'active' AND stock <= low_stock_alert",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let out_of_stock_products: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products
             WHERE owner_id = ?1 AND status = 'active' AND stock = 0",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        let total_stock_value_cents: Option<i64> = sqlx::query_scalar(
            "SELECT SUM(stock * price_cents) FROM products
             WHERE owner_id = ?1 AND status = 'active'",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(InventorySummary {
            total_products,
            active_products,
            inactive_products: total_products - active_products,
            low_stock_products,
            out_of_stock_products,
            total_stock_value_cents: total_stock_value_cents.unwrap_or(0),
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
    use zato_core::NewProduct;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn new_product(owner: &str, sku: &str, stock: i64) -> Product {
        Product::create(NewProduct {
            owner_id: owner.to_string(),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            category: "general".to_string(),
            price_cents: 500,
            stock,
            low_stock_alert: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let product = new_product("owner-1", "WID-1", 10);
        repo.insert(&product).await.unwrap();

        let found = repo.get_by_id("owner-1", &product.id).await.unwrap();
        assert_eq!(found.unwrap().sku, "WID-1");

        let by_sku = repo.get_by_sku("owner-1", "WID-1").await.unwrap();
        assert_eq!(by_sku.unwrap().id, product.id);
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let db = test_db().await;
        let repo = db.products();

        let product = new_product("owner-1", "WID-1", 10);
        repo.insert(&product).await.unwrap();

        // Another owner cannot see or mutate the row
        assert!(repo
            .get_by_id("owner-2", &product.id)
            .await
            .unwrap()
            .is_none());
        assert!(repo.soft_delete("owner-2", &product.id).await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected_per_owner() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&new_product("owner-1", "WID-1", 10))
            .await
            .unwrap();
        let dup = repo.insert(&new_product("owner-1", "WID-1", 3)).await;
        assert!(matches!(dup, Err(DbError::UniqueViolation { .. })));

        // Same SKU under a different owner is fine
        repo.insert(&new_product("owner-2", "WID-1", 3))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&new_product("owner-1", "WID-1", 10))
            .await
            .unwrap();
        repo.insert(&new_product("owner-1", "WID-2", 2))
            .await
            .unwrap();

        let all = repo
            .list("owner-1", &ProductFilter::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.pages, 1);

        let low = repo
            .list(
                "owner-1",
                &ProductFilter {
                    low_stock_only: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(low.total, 1);
        assert_eq!(low.items[0].sku, "WID-2");

        let searched = repo
            .list(
                "owner-1",
                &ProductFilter {
                    search: Some("WID-1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(searched.total, 1);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_active() {
        let db = test_db().await;
        let repo = db.products();

        let product = new_product("owner-1", "WID-1", 10);
        repo.insert(&product).await.unwrap();
        assert_eq!(repo.count("owner-1").await.unwrap(), 1);

        repo.soft_delete("owner-1", &product.id).await.unwrap();
        assert_eq!(repo.count("owner-1").await.unwrap(), 0);

        // Row still exists: history keeps a valid reference
        let found = repo.get_by_id("owner-1", &product.id).await.unwrap();
        assert_eq!(found.unwrap().status, ProductStatus::Inactive);
    }

    #[tokio::test]
    async fn test_inventory_summary() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&new_product("owner-1", "WID-1", 10))
            .await
            .unwrap(); // value 5000
        repo.insert(&new_product("owner-1", "WID-2", 0))
            .await
            .unwrap(); // out of stock, low stock
        let gone = new_product("owner-1", "WID-3", 7);
        repo.insert(&gone).await.unwrap();
        repo.soft_delete("owner-1", &gone.id).await.unwrap();

        let summary = repo.inventory_summary("owner-1").await.unwrap();
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.active_products, 2);
        assert_eq!(summary.inactive_products, 1);
        assert_eq!(summary.low_stock_products, 1);
        assert_eq!(summary.out_of_stock_products, 1);
        assert_eq!(summary.total_stock_value_cents, 10 * 500);
    }
}

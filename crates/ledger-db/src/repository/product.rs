//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Who Writes What
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  column           written by                                            │
//! │  ───────────────  ───────────────────────────────────────────────────── │
//! │  name, unit_id,   master-data CRUD (ProductRepository::insert)          │
//! │  sales_price                                                            │
//! │  stock            ledger::stock primitives only                         │
//! │  purchase_price   master data, then the purchase price ratchet          │
//! │  expired_date     earliest-expiry rule on purchase / first stock        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use ledger_core::{Money, Product};

const PRODUCT_COLUMNS: &str = "id, branch_id, name, unit_id, stock, purchase_price, sales_price, \
                               expired_date, created_at, updated_at";

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {} FROM products WHERE id = ?1",
        PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(product)
}

/// Overwrites on-hand stock.
pub(crate) async fn write_stock(
    conn: &mut SqliteConnection,
    id: &str,
    stock: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE products SET stock = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(id)
        .bind(stock)
        .bind(now)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Writes the purchase price and expiry chosen by the receiving rules.
pub(crate) async fn write_cost_and_expiry(
    conn: &mut SqliteConnection,
    id: &str,
    purchase_price: Money,
    expired_date: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET purchase_price = ?2, expired_date = ?3, updated_at = ?4 WHERE id = ?1",
    )
    .bind(id)
    .bind(purchase_price)
    .bind(expired_date)
    .bind(now)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Σ stock × purchase price over a branch's products.
pub(crate) async fn branch_asset_value(conn: &mut SqliteConnection, branch_id: &str) -> DbResult<Money> {
    let value: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(stock * purchase_price), 0) FROM products WHERE branch_id = ?1",
    )
    .bind(branch_id)
    .fetch_one(conn)
    .await?;

    Ok(Money::from_minor(value))
}

/// Repository for product master data.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// repo.insert(&product).await?;
/// let stock = repo.get_by_id("PRD-1").await?.map(|p| p.stock);
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    pub async fn list_for_branch(&self, branch_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {} FROM products WHERE branch_id = ?1 ORDER BY name",
            PRODUCT_COLUMNS
        ))
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a product as given, including its opening stock.
    ///
    /// Opening stock normally arrives through a first-stock transaction;
    /// a non-zero value here is for imports and fixtures.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, branch_id, name, unit_id, stock, purchase_price, sales_price,
                expired_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.branch_id)
        .bind(&product.name)
        .bind(&product.unit_id)
        .bind(product.stock)
        .bind(product.purchase_price)
        .bind(product.sales_price)
        .bind(product.expired_date)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates the selling price. Existing sale lines keep the price they
    /// were entered at.
    pub async fn set_sales_price(&self, id: &str, price: Money) -> DbResult<()> {
        let result = sqlx::query("UPDATE products SET sales_price = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(price)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

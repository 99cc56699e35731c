//! # Unit Conversion Repository
//!
//! Rows read "1 `init_id` = `value_conv` × `final_id`", scoped per product
//! and branch. The UNIQUE (product, init, final, branch) index backs the
//! duplicate check.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DbError, DbResult};
use ledger_core::UnitConversion;

const CONVERSION_COLUMNS: &str = "id, product_id, init_id, final_id, value_conv, branch_id";

/// Stored multiplier for `init_id → final_id`, if one is defined.
pub(crate) async fn find_value(
    conn: &mut SqliteConnection,
    product_id: &str,
    init_id: &str,
    final_id: &str,
    branch_id: &str,
) -> DbResult<Option<i64>> {
    let value = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT value_conv FROM unit_conversions
        WHERE product_id = ?1 AND init_id = ?2 AND final_id = ?3 AND branch_id = ?4
        "#,
    )
    .bind(product_id)
    .bind(init_id)
    .bind(final_id)
    .bind(branch_id)
    .fetch_optional(conn)
    .await?;

    Ok(value)
}

pub(crate) async fn fetch_conversion(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<UnitConversion>> {
    let conversion = sqlx::query_as::<_, UnitConversion>(&format!(
        "SELECT {} FROM unit_conversions WHERE id = ?1",
        CONVERSION_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(conversion)
}

pub(crate) async fn list_for_product(
    conn: &mut SqliteConnection,
    product_id: &str,
    branch_id: &str,
) -> DbResult<Vec<UnitConversion>> {
    let conversions = sqlx::query_as::<_, UnitConversion>(&format!(
        "SELECT {} FROM unit_conversions WHERE product_id = ?1 AND branch_id = ?2 ORDER BY value_conv",
        CONVERSION_COLUMNS
    ))
    .bind(product_id)
    .bind(branch_id)
    .fetch_all(conn)
    .await?;

    Ok(conversions)
}

pub(crate) async fn insert_conversion(
    conn: &mut SqliteConnection,
    conversion: &UnitConversion,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO unit_conversions (id, product_id, init_id, final_id, value_conv, branch_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&conversion.id)
    .bind(&conversion.product_id)
    .bind(&conversion.init_id)
    .bind(&conversion.final_id)
    .bind(conversion.value_conv)
    .bind(&conversion.branch_id)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn update_value(conn: &mut SqliteConnection, id: &str, value: i64) -> DbResult<()> {
    let result = sqlx::query("UPDATE unit_conversions SET value_conv = ?2 WHERE id = ?1")
        .bind(id)
        .bind(value)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("UnitConversion", id));
    }

    Ok(())
}

pub(crate) async fn delete_conversion(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM unit_conversions WHERE id = ?1")
        .bind(id)
        .execute(conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("UnitConversion", id));
    }

    Ok(())
}

/// Read access to conversions outside a ledger transaction.
#[derive(Debug, Clone)]
pub struct ConversionRepository {
    pool: SqlitePool,
}

impl ConversionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ConversionRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<UnitConversion>> {
        let mut conn = self.pool.acquire().await?;
        fetch_conversion(&mut conn, id).await
    }

    pub async fn list_for_product(
        &self,
        product_id: &str,
        branch_id: &str,
    ) -> DbResult<Vec<UnitConversion>> {
        let mut conn = self.pool.acquire().await?;
        list_for_product(&mut conn, product_id, branch_id).await
    }
}

//! # Unit Repository

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::DbResult;
use ledger_core::Unit;

pub(crate) async fn fetch_unit(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Unit>> {
    let unit = sqlx::query_as::<_, Unit>("SELECT id, branch_id, name FROM units WHERE id = ?1")
        .bind(id)
        .fetch_optional(conn)
        .await?;

    Ok(unit)
}

#[derive(Debug, Clone)]
pub struct UnitRepository {
    pool: SqlitePool,
}

impl UnitRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UnitRepository { pool }
    }

    pub async fn insert(&self, unit: &Unit) -> DbResult<()> {
        sqlx::query("INSERT INTO units (id, branch_id, name) VALUES (?1, ?2, ?3)")
            .bind(&unit.id)
            .bind(&unit.branch_id)
            .bind(&unit.name)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Unit>> {
        let mut conn = self.pool.acquire().await?;
        fetch_unit(&mut conn, id).await
    }

    pub async fn list_for_branch(&self, branch_id: &str) -> DbResult<Vec<Unit>> {
        let units = sqlx::query_as::<_, Unit>(
            "SELECT id, branch_id, name FROM units WHERE branch_id = ?1 ORDER BY name",
        )
        .bind(branch_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(units)
    }
}

//! # Branch Repository
//!
//! Branch rows are master data; the ledger reads the billing mode and
//! decrements the quota counter.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use ledger_core::{Branch, SubscriptionType};

pub(crate) async fn fetch_branch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Branch>> {
    let branch = sqlx::query_as::<_, Branch>(
        "SELECT id, name, subscription_type, quota, default_member_id FROM branches WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;

    Ok(branch)
}

/// Takes one unit off the branch quota, never below zero.
///
/// ## Returns
/// `true` when a unit was taken, `false` when the quota was already empty.
pub(crate) async fn take_quota(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE branches SET quota = quota - 1 WHERE id = ?1 AND quota > 0")
        .bind(id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Repository for branch master data.
#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    pub async fn insert(&self, branch: &Branch) -> DbResult<()> {
        debug!(id = %branch.id, name = %branch.name, "Inserting branch");

        sqlx::query(
            r#"
            INSERT INTO branches (id, name, subscription_type, quota, default_member_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&branch.id)
        .bind(&branch.name)
        .bind(branch.subscription_type)
        .bind(branch.quota)
        .bind(&branch.default_member_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Branch>> {
        let mut conn = self.pool.acquire().await?;
        fetch_branch(&mut conn, id).await
    }

    /// Switches billing mode and resets the remaining quota.
    pub async fn set_subscription(
        &self,
        id: &str,
        subscription_type: SubscriptionType,
        quota: i64,
    ) -> DbResult<()> {
        sqlx::query("UPDATE branches SET subscription_type = ?2, quota = ?3 WHERE id = ?1")
            .bind(id)
            .bind(subscription_type)
            .bind(quota)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

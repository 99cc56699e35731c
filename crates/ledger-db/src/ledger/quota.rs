//! # Quota Gate
//!
//! Usage-metered branches pay one quota unit per new header. The charge
//! runs on the creating transaction's connection, so a failed create
//! never consumes quota and an empty quota fails the whole create.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::repository::branch;
use ledger_core::{CoreError, SubscriptionType};

/// Charges one unit to `branch_id` if it is on a quota plan.
///
/// ## Returns
/// * `Err(NotFound)` - unknown branch
/// * `Err(QuotaExceeded)` - quota plan with nothing left
pub async fn charge(conn: &mut SqliteConnection, branch_id: &str) -> LedgerResult<()> {
    let branch = branch::fetch_branch(conn, branch_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Branch", branch_id))?;

    if branch.subscription_type != SubscriptionType::Quota {
        return Ok(());
    }

    if !branch::take_quota(conn, branch_id).await? {
        return Err(CoreError::QuotaExceeded {
            branch_id: branch_id.to_string(),
        }
        .into());
    }

    debug!(branch_id = %branch_id, remaining = branch.quota - 1, "Quota charged");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::fixtures::Fixture;

    #[tokio::test]
    async fn test_monthly_branch_is_not_charged() {
        let fx = Fixture::new().await;
        let mut conn = fx.db.pool().acquire().await.unwrap();
        charge(&mut conn, &fx.branch_id).await.unwrap();

        let branch = branch::fetch_branch(&mut conn, &fx.branch_id).await.unwrap().unwrap();
        assert_eq!(branch.quota, 0);
    }

    #[tokio::test]
    async fn test_quota_counts_down_to_zero() {
        let fx = Fixture::new().await;
        fx.db
            .branches()
            .set_subscription(&fx.branch_id, SubscriptionType::Quota, 2)
            .await
            .unwrap();

        let mut conn = fx.db.pool().acquire().await.unwrap();
        charge(&mut conn, &fx.branch_id).await.unwrap();
        charge(&mut conn, &fx.branch_id).await.unwrap();
        let err = charge(&mut conn, &fx.branch_id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::QuotaExceeded);

        let err = charge(&mut conn, "BR-missing").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}

//! Shared test fixture: one in-memory branch with two products.
//!
//! ```text
//! BR-1 (monthly, walk-in member MBR-WALKIN)
//!   units     PCS, BOX, PACK
//!   PRD-1     base PCS, buy 1000, sell 1500, stock 0, BOX → PCS = 12
//!   PRD-2     base PCS, buy 2000, sell 3000, stock 0
//! clock       2026-03-10 03:00 UTC, local offset +7
//! ```

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use super::{stock, Ledger, LedgerContext};
use crate::pool::{Database, DbConfig};
use ledger_core::{
    Branch, Clock, Header, HeaderWithItems, ManualClock, Money, NewHeader, NewLineItem,
    NewTransaction, NewUnitConversion, Product, SequentialIds, SubscriptionType,
    TransactionKind, Unit, DEFAULT_UTC_OFFSET_HOURS,
};

pub const BASE_UNIT: &str = "PCS";
pub const BOX_UNIT: &str = "BOX";
/// Known unit with no conversion defined for either product.
pub const PACK_UNIT: &str = "PACK";
/// Branch default member for sales that name none.
pub const WALK_IN_MEMBER: &str = "MBR-WALKIN";

pub struct Fixture {
    pub db: Database,
    pub clock: Arc<ManualClock>,
    pub ids: Arc<SequentialIds>,
    pub branch_id: String,
    pub user_id: String,
    pub product_id: String,
    pub second_product_id: String,
    pub box_conversion_id: String,
}

impl Fixture {
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let start = Utc.with_ymd_and_hms(2026, 3, 10, 3, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start, DEFAULT_UTC_OFFSET_HOURS));
        let ids = Arc::new(SequentialIds::default());

        let branch_id = "BR-1".to_string();
        db.branches()
            .insert(&Branch {
                id: branch_id.clone(),
                name: "Main Street".to_string(),
                subscription_type: SubscriptionType::Monthly,
                quota: 0,
                default_member_id: Some(WALK_IN_MEMBER.to_string()),
            })
            .await
            .unwrap();

        for (id, name) in [(BASE_UNIT, "Piece"), (BOX_UNIT, "Box"), (PACK_UNIT, "Pack")] {
            db.units()
                .insert(&Unit {
                    id: id.to_string(),
                    branch_id: branch_id.clone(),
                    name: name.to_string(),
                })
                .await
                .unwrap();
        }

        let products = [
            ("PRD-1", "Mineral Water 600ml", 1000, 1500),
            ("PRD-2", "Instant Noodles", 2000, 3000),
        ];
        for (id, name, buy, sell) in products {
            db.products()
                .insert(&Product {
                    id: id.to_string(),
                    branch_id: branch_id.clone(),
                    name: name.to_string(),
                    unit_id: BASE_UNIT.to_string(),
                    stock: 0,
                    purchase_price: Money::from_minor(buy),
                    sales_price: Money::from_minor(sell),
                    expired_date: None,
                    created_at: start,
                    updated_at: start,
                })
                .await
                .unwrap();
        }

        let box_conversion_id = {
            let ctx = LedgerContext::new(clock.as_ref(), ids.as_ref());
            let mut conn = db.pool().acquire().await.unwrap();
            super::conversion::create_conversion(
                &mut conn,
                &ctx,
                &NewUnitConversion {
                    product_id: "PRD-1".to_string(),
                    init_id: BOX_UNIT.to_string(),
                    final_id: BASE_UNIT.to_string(),
                    value_conv: 12,
                    branch_id: branch_id.clone(),
                },
            )
            .await
            .unwrap()
            .id
        };

        Fixture {
            db,
            clock,
            ids,
            branch_id,
            user_id: "USR-1".to_string(),
            product_id: "PRD-1".to_string(),
            second_product_id: "PRD-2".to_string(),
            box_conversion_id,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn context(&self) -> LedgerContext<'_> {
        LedgerContext::new(self.clock.as_ref(), self.ids.as_ref())
    }

    /// Ledger sharing the fixture's clock and id sequence.
    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.db.pool().clone())
            .with_clock(self.clock.clone())
            .with_ids(self.ids.clone())
    }

    pub async fn product(&self, id: &str) -> Product {
        self.db.products().get_by_id(id).await.unwrap().unwrap()
    }

    pub async fn stock(&self, id: &str) -> i64 {
        self.product(id).await.stock
    }

    pub async fn header(&self, id: &str) -> Header {
        self.db.headers().get_by_id(id).await.unwrap().unwrap()
    }

    /// Adds stock directly, without a ledger document.
    pub async fn restock(&self, product_id: &str, qty: i64) {
        let mut conn = self.db.pool().acquire().await.unwrap();
        stock::increase(&mut conn, product_id, qty, self.now()).await.unwrap();
    }

    pub async fn purchase(&self, items: &[NewLineItem]) -> HeaderWithItems {
        self.transaction(TransactionKind::Purchase, items).await
    }

    pub async fn sale(&self, items: &[NewLineItem]) -> HeaderWithItems {
        self.transaction(TransactionKind::Sale, items).await
    }

    async fn transaction(&self, kind: TransactionKind, items: &[NewLineItem]) -> HeaderWithItems {
        self.ledger()
            .create_transaction(&NewTransaction {
                header: NewHeader::new(kind, &self.branch_id, &self.user_id),
                items: items.to_vec(),
            })
            .await
            .unwrap()
    }
}

//! # Seed Data Generator
//!
//! Populates a database with one demo branch and runs a few ledger
//! documents through it for development.
//!
//! ## Usage
//! ```bash
//! # Seed using the default config location
//! cargo run -p ledger-db --bin seed
//!
//! # Specify database path
//! cargo run -p ledger-db --bin seed -- --db ./data/ledger.db
//!
//! # Use an explicit config file
//! cargo run -p ledger-db --bin seed -- --config ./ledger.toml
//! ```
//!
//! ## Generated Data
//! - Branch `BR-DEMO` on a monthly plan
//! - Units: piece, box, carton
//! - A small grocery catalog, priced per piece
//! - Box conversions for the products sold by the box
//! - Opening stock, one purchase in boxes and one sale

use std::env;
use std::path::PathBuf;

use chrono::Utc;
use ledger_core::{
    Branch, IdGenerator, Money, NewHeader, NewLineItem, NewTransaction, NewUnitConversion,
    PrefixedIds, Product, SubscriptionType, TransactionKind, Unit,
};
use ledger_db::{Database, Ledger, LedgerConfig};
use tracing_subscriber::EnvFilter;

const BRANCH_ID: &str = "BR-DEMO";
const USER_ID: &str = "USR-SEED";

const UNITS: &[(&str, &str)] = &[("PCS", "Piece"), ("BOX", "Box"), ("CTN", "Carton")];

/// (name, purchase price, sales price, pieces per box or 0)
const CATALOG: &[(&str, i64, i64, i64)] = &[
    ("Mineral Water 600ml", 2_500, 3_500, 24),
    ("Instant Noodles Chicken", 2_800, 3_500, 40),
    ("Sweet Soy Sauce 275ml", 9_000, 11_500, 12),
    ("Palm Sugar 250g", 7_500, 9_000, 0),
    ("Jasmine Rice 5kg", 68_000, 75_000, 0),
    ("Cooking Oil 1L", 17_000, 19_500, 12),
    ("Granulated Sugar 1kg", 15_000, 17_000, 0),
    ("Coffee Sachet", 1_200, 1_500, 50),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Branch Ledger Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -c, --config <PATH>  Config file (default: platform config dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = LedgerConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database.path = path;
    }

    println!("Branch Ledger Seed Data Generator");
    println!("=================================");
    println!("Database: {}", config.database.path.display());
    println!();

    let db = Database::new(config.db_config()).await?;
    let ledger = Ledger::from_config(&db, &config);
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if db.branches().get_by_id(BRANCH_ID).await?.is_some() {
        println!("⚠ Branch {} already exists", BRANCH_ID);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Master data
    db.branches()
        .insert(&Branch {
            id: BRANCH_ID.to_string(),
            name: "Demo Branch".to_string(),
            subscription_type: SubscriptionType::Monthly,
            quota: 0,
            default_member_id: Some("MBR-WALKIN".to_string()),
        })
        .await?;

    for (id, name) in UNITS {
        db.units()
            .insert(&Unit {
                id: id.to_string(),
                branch_id: BRANCH_ID.to_string(),
                name: name.to_string(),
            })
            .await?;
    }

    let ids = PrefixedIds;
    let now = Utc::now();
    let mut seeded = Vec::with_capacity(CATALOG.len());

    for (name, buy, sell, per_box) in CATALOG {
        let product = Product {
            id: ids.next("PRD"),
            branch_id: BRANCH_ID.to_string(),
            name: name.to_string(),
            unit_id: "PCS".to_string(),
            stock: 0,
            purchase_price: Money::from_minor(*buy),
            sales_price: Money::from_minor(*sell),
            expired_date: None,
            created_at: now,
            updated_at: now,
        };
        db.products().insert(&product).await?;

        if *per_box > 0 {
            ledger
                .create_conversion(&NewUnitConversion {
                    product_id: product.id.clone(),
                    init_id: "BOX".to_string(),
                    final_id: "PCS".to_string(),
                    value_conv: *per_box,
                    branch_id: BRANCH_ID.to_string(),
                })
                .await?;
        }

        seeded.push((product, *per_box));
    }
    println!("✓ Seeded {} products", seeded.len());

    // Opening stock: 20 pieces of everything
    let opening = ledger
        .create_transaction(&NewTransaction {
            header: NewHeader::new(TransactionKind::FirstStock, BRANCH_ID, USER_ID),
            items: seeded
                .iter()
                .map(|(p, _)| NewLineItem::new(&p.id, 20))
                .collect(),
        })
        .await?;
    println!("✓ Opening stock {} ({})", opening.header.id, opening.header.total);

    // Restock the boxed products by the box
    let purchase = ledger
        .create_transaction(&NewTransaction {
            header: NewHeader::new(TransactionKind::Purchase, BRANCH_ID, USER_ID)
                .with_supplier("SUP-DEMO"),
            items: seeded
                .iter()
                .filter(|(_, per_box)| *per_box > 0)
                .map(|(p, _)| NewLineItem::new(&p.id, 2).in_unit("BOX"))
                .collect(),
        })
        .await?;
    println!("✓ Purchase {} ({})", purchase.header.id, purchase.header.total);

    // A counter sale
    let sale = ledger
        .create_transaction(&NewTransaction {
            header: NewHeader::new(TransactionKind::Sale, BRANCH_ID, USER_ID),
            items: seeded
                .iter()
                .take(3)
                .map(|(p, _)| NewLineItem::new(&p.id, 5))
                .collect(),
        })
        .await?;
    println!(
        "✓ Sale {} ({}, profit {})",
        sale.header.id, sale.header.total, sale.header.profit
    );

    println!();
    println!("Stock on hand:");
    for product in db.products().list_for_branch(BRANCH_ID).await? {
        println!("  {:<28} {:>6} pcs", product.name, product.stock);
    }

    let value = ledger.asset_value(BRANCH_ID).await?;
    println!();
    println!("Asset value: {}", value);

    if let Some(day) = db
        .reports()
        .daily_profit(sale.header.txn_date, BRANCH_ID, USER_ID)
        .await?
    {
        println!(
            "Daily profit {}: sales {}, profit {}",
            day.report_date, day.total_sales, day.profit_estimate
        );
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

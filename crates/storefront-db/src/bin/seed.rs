//! # Seed Data Generator
//!
//! Populates the local store with sample promotions for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named by $STOREFRONT_DB_PATH (default ./storefront.db)
//! cargo run -p storefront-db --bin seed
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//!
//! # Load promotions from a JSON file (array of Promotion, camelCase, UUID ids)
//! cargo run -p storefront-db --bin seed -- --file promotions.json
//! ```
//!
//! ## Built-in Promotions
//! - Percentage discounts with and without minimum order / cap
//! - Fixed-amount discounts
//! - Shipping discounts, one of them inactive

use std::env;
use std::fs;

use storefront_core::{Money, Promotion, PromotionFilter, PromotionKind, PromotionSlot};
use storefront_db::migrations::migration_status;
use storefront_db::{Database, DbConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (code, name, kind, value, min order, cap, active)
const SAMPLE_PROMOTIONS: &[(&str, &str, PromotionKind, i64, Option<i64>, Option<i64>, bool)] = &[
    ("WELCOME10", "Welcome 10% off", PromotionKind::Percentage, 10, None, Some(200_000), true),
    ("TEN", "10% off orders over 10,000,000", PromotionKind::Percentage, 10, Some(10_000_000), None, true),
    ("BIGSPENDER", "15% off orders over 30,000,000", PromotionKind::Percentage, 15, Some(30_000_000), Some(5_000_000), true),
    ("HALFOFF", "Half price, capped at 50,000", PromotionKind::Percentage, 50, None, Some(50_000), true),
    ("FLAT50K", "50,000 off", PromotionKind::FixedAmount, 50_000, Some(500_000), None, true),
    ("FLAT500K", "500,000 off", PromotionKind::FixedAmount, 500_000, Some(5_000_000), None, true),
    ("FREESHIP", "Free shipping", PromotionKind::ShippingDiscount, 40_000, None, None, true),
    ("SHIP20K", "20,000 off shipping", PromotionKind::ShippingDiscount, 20_000, None, None, true),
    ("TET2025", "Lunar new year shipping deal", PromotionKind::ShippingDiscount, 30_000, None, None, false),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args: Vec<String> = env::args().collect();

    let mut config = DbConfig::from_env()?;
    let mut file: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(path) = args.get(i + 1) {
                    config.database_path = path.into();
                    i += 1;
                }
            }
            "--file" | "-f" => {
                if let Some(path) = args.get(i + 1) {
                    file = Some(path.clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: $STOREFRONT_DB_PATH or ./storefront.db)");
                println!("  -f, --file <PATH>   JSON array of promotions to load instead of the samples");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
        i += 1;
    }

    println!("🌱 Storefront Seed Data Generator");
    println!("=================================");
    println!("Database: {}", config.database_path.display());
    println!();

    let db = Database::new(config).await?;
    let (total, applied) = migration_status(db.pool()).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied ({applied}/{total})");

    let existing = db.promotions().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {existing} promotions");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let promotions = match &file {
        Some(path) => {
            info!(path = %path, "Loading promotions from file");
            let raw = fs::read_to_string(path)?;
            serde_json::from_str::<Vec<Promotion>>(&raw)?
        }
        None => sample_promotions(),
    };

    println!();
    println!("Inserting {} promotions...", promotions.len());

    let mut inserted = 0;
    for promotion in &promotions {
        match db.promotions().insert(promotion).await {
            Ok(stored) => {
                inserted += 1;
                println!("  {:<12} {:<18} {}", stored.code, stored.kind.as_str(), stored.name);
            }
            Err(e) => eprintln!("Failed to insert {}: {}", promotion.code, e),
        }
    }

    println!();
    println!("✓ Inserted {inserted} promotions");

    // Sanity check the slot filters.
    for slot in [PromotionSlot::Product, PromotionSlot::Shipping] {
        let filter = PromotionFilter {
            slot: Some(slot),
            active_only: true,
            ..Default::default()
        };
        let page = db
            .promotions()
            .search("", &filter, Default::default())
            .await?;
        println!("  Active {slot} promotions: {}", page.total);
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,storefront_db=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn sample_promotions() -> Vec<Promotion> {
    SAMPLE_PROMOTIONS
        .iter()
        .map(|&(code, name, kind, value, min, cap, active)| {
            let mut promotion = Promotion::new(code, kind, value)
                .with_name(name)
                .with_active(active);
            if let Some(min) = min {
                promotion = promotion.with_min_order_value(Money::from_minor(min));
            }
            if let Some(cap) = cap {
                promotion = promotion.with_max_discount(Money::from_minor(cap));
            }
            promotion
        })
        .collect()
}

//! # Seed Data Generator
//!
//! Populates a development database with a small coffee-shop catalog and
//! its first supplier deliveries.
//!
//! ## Usage
//! ```bash
//! # 40 products (default) into ./storefront_dev.db
//! cargo run -p storefront-db --bin seed
//!
//! # Custom amount
//! cargo run -p storefront-db --bin seed -- --count 120
//!
//! # Specify database path
//! cargo run -p storefront-db --bin seed -- --db ./data/storefront.db
//! ```
//!
//! ## Generated Data
//! - Products across beans, ground, drip bags, tea and equipment
//! - Every product starts at zero stock and receives two inbound batches,
//!   so the weighted-average cost is exercised from day one
//! - Every seventh product is left inactive

use std::env;
use std::path::PathBuf;

use storefront_core::{Money, NewProduct, UnitCost};
use storefront_db::{init_tracing, StockInboundRequest, Storefront, StorefrontConfig};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "beans",
        &[
            "Arabica Cau Dat",
            "Robusta Buon Ma Thuot",
            "Culi Robusta",
            "Moka Cau Dat",
            "Catimor Son La",
            "Typica Lam Dong",
        ],
    ),
    (
        "ground",
        &[
            "House Blend Phin",
            "Espresso Blend",
            "Cold Brew Coarse",
            "Decaf Arabica",
        ],
    ),
    (
        "drip",
        &["Drip Bag Arabica", "Drip Bag Robusta", "Drip Bag Mixed"],
    ),
    (
        "tea",
        &["Shan Tuyet Green", "Oolong Bao Loc", "Lotus Tea", "Artichoke Tea"],
    ),
    (
        "equipment",
        &["Aluminium Phin", "Steel Phin", "Hand Grinder", "Pour-over Kettle"],
    ),
];

/// Pack sizes with a price multiplier in percent
const SIZES: &[(&str, i64)] = &[("250g", 100), ("500g", 190), ("1kg", 360)];

const SUPPLIERS: &[&str] = &["Dalat Farms", "Highland Co-op", "Son La Growers"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = PathBuf::from("./storefront_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 40)");
                println!("  -d, --db <PATH>    Database file path (default: ./storefront_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Storefront Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path.display());
    println!("Products: {}", count);
    println!();

    let config = StorefrontConfig {
        database_path: db_path,
        ..StorefrontConfig::from_env()?
    };
    let store = Storefront::open(&config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = store.database().products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} active products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut generated = 0;
    let mut batches = 0;

    'outer: for (category, names) in CATEGORIES {
        for name in names.iter() {
            for (size, multiplier) in SIZES {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(category, name, size, *multiplier, generated);
                let created = match store.create_product(&product).await {
                    Ok(created) => created,
                    Err(e) => {
                        eprintln!("Failed to insert {}: {}", product.name, e);
                        continue;
                    }
                };

                for (n, batch) in opening_batches(&created.id, product.price, generated)
                    .iter()
                    .enumerate()
                {
                    if let Err(e) = store.record_stock_inbound(batch).await {
                        eprintln!("Failed to receive batch {} for {}: {}", n + 1, created.name, e);
                        continue;
                    }
                    batches += 1;
                }

                if generated % 7 == 6 {
                    store.set_product_active(&created.id, false).await?;
                }

                generated += 1;
                if generated % 20 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    store.audit().flush().await;

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} products and {} inbound batches in {:?}",
        generated, batches, elapsed
    );

    let history = store.stock_inbound_history(None, u32::MAX).await?;
    println!(
        "  Inventory received: {} units worth {}",
        history.stats.total_quantity, history.stats.total_value
    );
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single catalog entry with zero opening stock.
fn generate_product(category: &str, name: &str, size: &str, multiplier: i64, seed: usize) -> NewProduct {
    // 60,000 - 139,000 base price, scaled by pack size
    let base = 60_000 + ((seed as i64 * 7_000) % 80_000);
    let price = base * multiplier / 100;

    NewProduct {
        name: format!("{} {}", name, size),
        description: Some(format!("{} ({})", name, category)),
        category: category.to_string(),
        price: Money::from_units(price),
        cost_price: UnitCost::ZERO,
        stock_quantity: 0,
        is_active: true,
    }
}

/// Two deliveries at slightly different costs (55-75% of price).
fn opening_batches(product_id: &str, price: Money, seed: usize) -> [StockInboundRequest; 2] {
    let first_pct = 55 + (seed % 10) as i64;
    let second_pct = first_pct + 5 + (seed % 7) as i64;

    let batch = |qty: i64, pct: i64, supplier: &str| StockInboundRequest {
        product_id: product_id.to_string(),
        quantity_added: qty,
        cost_price_at_time: Money::from_units(price.units() * pct / 100),
        supplier: Some(supplier.to_string()),
        notes: None,
    };

    [
        batch(10 + (seed % 15) as i64, first_pct, SUPPLIERS[seed % SUPPLIERS.len()]),
        batch(5 + (seed % 8) as i64, second_pct, SUPPLIERS[(seed + 1) % SUPPLIERS.len()]),
    ]
}

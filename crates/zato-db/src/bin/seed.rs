//! # Seed Data Generator
//!
//! Populates the database with test products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p zato-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p zato-db --bin seed -- --count 2000
//!
//! # Specify database path and owner
//! cargo run -p zato-db --bin seed -- --db ./data/zatobox.db --owner demo-owner
//! ```
//!
//! Each product has a unique SKU (`{CATEGORY}-{INDEX}`), a realistic name,
//! a price between $0.99 and $19.99 and a stock level between 0 and 100.
//! A handful of opening-stock movements are recorded so the movement
//! ledger is not empty.

use std::env;

use zato_core::{MovementKind, NewProduct, Product};
use zato_db::{Database, DbConfig, MovementContext};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "BEV",
        "beverages",
        &[
            "Coca-Cola 330ml",
            "Pepsi 330ml",
            "Sprite 500ml",
            "Red Bull 250ml",
            "Orange Juice 1L",
            "Still Water 500ml",
            "Iced Tea 500ml",
            "Cold Brew Coffee",
            "Lemonade 1L",
            "Sparkling Water 1L",
        ],
    ),
    (
        "SNK",
        "snacks",
        &[
            "Lays Classic",
            "Doritos Nacho",
            "Pringles Original",
            "Snickers Bar",
            "KitKat",
            "Gummy Bears",
            "Oreos",
            "Salted Pretzels",
            "Trail Mix",
            "Granola Bar",
        ],
    ),
    (
        "GRO",
        "grocery",
        &[
            "White Bread",
            "Spaghetti 500g",
            "White Rice 1kg",
            "Canned Beans",
            "Canned Tomatoes",
            "Peanut Butter",
            "Honey 250g",
            "Flour 1kg",
            "Sugar 1kg",
            "Olive Oil 500ml",
        ],
    ),
    (
        "HSH",
        "household",
        &[
            "Paper Towels",
            "Dish Soap",
            "Laundry Detergent",
            "Trash Bags",
            "Sponges 3-Pack",
            "Aluminum Foil",
            "Light Bulb",
            "AA Batteries",
            "Glass Cleaner",
            "Hand Soap",
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug shows per-query repository logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./zatobox_dev.db");
    let mut owner = String::from("demo-owner");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--owner" | "-o" => {
                if i + 1 < args.len() {
                    owner = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("ZatoBox Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./zatobox_dev.db)");
                println!("  -o, --owner <ID>   Owner id to seed under (default: demo-owner)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("ZatoBox Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Owner:    {}", owner);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count(&owner).await?;
    if existing > 0 {
        println!("⚠ Owner already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for round in 0usize.. {
        for (category_idx, (code, category, names)) in CATEGORIES.iter().enumerate() {
            for (name_idx, name) in names.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let seed = round * 1000 + category_idx * 100 + name_idx;
                let product = match Product::create(generate_product(
                    &owner, code, category, name, round, seed,
                )) {
                    Ok(product) => product,
                    Err(e) => {
                        eprintln!("Failed to build product: {}", e);
                        continue;
                    }
                };

                let product = match db.products().insert(&product).await {
                    Ok(product) => product,
                    Err(e) => {
                        eprintln!("Failed to insert {}: {}", product.sku, e);
                        continue;
                    }
                };

                // Opening-stock entry for every tenth product so the
                // ledger has some history to browse.
                if product.stock > 0 && seed % 10 == 0 {
                    db.stock()
                        .apply_movement(
                            &owner,
                            &product.id,
                            MovementKind::In,
                            product.stock.min(20),
                            MovementContext::new("Opening stock"),
                        )
                        .await?;
                }

                generated += 1;
                if generated % 100 == 0 {
                    println!("  Generated {} products...", generated);
                }
            }
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let summary = db.products().inventory_summary(&owner).await?;
    println!();
    println!("Inventory summary:");
    println!("  Active products:  {}", summary.active_products);
    println!("  Low stock:        {}", summary.low_stock_products);
    println!("  Out of stock:     {}", summary.out_of_stock_products);
    println!(
        "  Stock value:      ${}.{:02}",
        summary.total_stock_value_cents / 100,
        summary.total_stock_value_cents % 100
    );

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product(
    owner: &str,
    code: &str,
    category: &str,
    name: &str,
    round: usize,
    seed: usize,
) -> NewProduct {
    // $0.99 - $19.99
    let price_cents = 99 + ((seed * 37) % 1901) as i64;

    let name = if round == 0 {
        name.to_string()
    } else {
        format!("{} (Batch {})", name, round + 1)
    };

    NewProduct {
        owner_id: owner.to_string(),
        sku: format!("{}-{:05}", code, seed),
        name,
        description: None,
        category: category.to_string(),
        price_cents,
        stock: (seed % 101) as i64,
        low_stock_alert: 5 + (seed % 10) as i64,
    }
}

//! # Seed Data Generator
//!
//! Populates the database with test products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p tillpoint-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p tillpoint-db --bin seed -- --count 1000
//!
//! # Specify database path
//! cargo run -p tillpoint-db --bin seed -- --db ./data/till.db
//! ```
//!
//! ## Generated Products
//! Creates realistic product data across categories:
//! - Beverages (sodas, water, juice)
//! - Snacks (chips, candy, cookies)
//! - Dairy (milk, cheese, yogurt)
//! - Grocery (canned goods, pasta, rice)
//!
//! Each product has:
//! - Unique SKU: `{CATEGORY}-{NAME}-{INDEX}`
//! - Deterministic pseudo-random price and stock derived from the index

use std::env;

use chrono::Utc;
use tillpoint_core::Product;
use tillpoint_db::repository::product::generate_product_id;
use tillpoint_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "beverages",
        &[
            "Coca-Cola",
            "Pepsi",
            "Sprite",
            "Fanta",
            "Red Bull",
            "Gatorade",
            "Dasani Water",
            "Orange Juice",
            "Apple Juice",
            "Lemonade",
            "Iced Tea",
            "Hot Chocolate",
        ],
    ),
    (
        "snacks",
        &[
            "Lays Classic",
            "Doritos Nacho",
            "Cheetos",
            "Pringles",
            "Snickers",
            "M&Ms",
            "Kit Kat",
            "Twix",
            "Skittles",
            "Oreos",
            "Goldfish",
            "Pretzels",
        ],
    ),
    (
        "dairy",
        &[
            "Whole Milk",
            "Skim Milk",
            "Almond Milk",
            "Cheddar Cheese",
            "Mozzarella",
            "Butter",
            "Greek Yogurt",
            "Sour Cream",
            "Heavy Cream",
            "Eggs Dozen",
            "Cottage Cheese",
            "Parmesan",
        ],
    ),
    (
        "grocery",
        &[
            "White Bread",
            "Wheat Bread",
            "Pasta Spaghetti",
            "Rice White",
            "Canned Beans",
            "Canned Soup",
            "Cereal Cheerios",
            "Oatmeal",
            "Peanut Butter",
            "Honey",
            "Flour",
            "Sugar",
        ],
    ),
];

/// Size variants for products
const SIZES: &[(&str, i64)] = &[
    ("Small", 0),
    ("Medium", 100),
    ("Large", 200),
    ("12oz", 0),
    ("20oz", 100),
    ("2L", 150),
    ("6-Pack", 300),
    ("12-Pack", 500),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./tillpoint_dev.db");

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
            "--help" | "-h" => {
                println!("Tillpoint Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./tillpoint_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tillpoint Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate products
    println!();
    println!("Generating products...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    'outer: for (category_idx, (category, products)) in CATEGORIES.iter().enumerate() {
        for (product_idx, product_name) in products.iter().enumerate() {
            for (size_idx, (size_name, price_addon)) in SIZES.iter().enumerate() {
                if generated >= count {
                    break 'outer;
                }

                let product = generate_product(
                    category,
                    product_name,
                    size_name,
                    *price_addon,
                    category_idx * 1000 + product_idx * 20 + size_idx,
                );

                if let Err(e) = db.products().insert(&product).await {
                    eprintln!("Failed to insert {}: {}", product.sku, e);
                    continue;
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

    // Spot-check a lookup
    let sample = db.products().list(1).await?;
    if let Some(first) = sample.first() {
        println!("  Sample product: {} ({})", first.name, first.sku);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - Default: INFO level, sqlx chatter suppressed
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tillpoint=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Generates a single product with realistic data.
fn generate_product(
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> Product {
    let now = Utc::now();

    // Unique SKU from category, compressed name and index
    let prefix: String = name
        .chars()
        .filter(|c| c.is_alphanumeric())
        .take(4)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:04}", &category[..3].to_uppercase(), prefix, seed);

    // Price: base $1.99-$9.99 + size addon (deterministic from the index)
    let base_price = 199 + ((seed * 17) % 800) as i64;
    let price_cents = base_price + price_addon;

    // Stock 0-100
    let quantity = (seed % 101) as i64;

    let full_name = format!("{} {}", name, size);

    Product {
        id: generate_product_id(),
        name: full_name,
        sku: sku.clone(),
        quantity,
        price_cents,
        category: category.to_string(),
        cover_image: format!("images/products/{}.jpg", sku.to_lowercase()),
        created_at: now,
        updated_at: now,
    }
}

//! # Seed Data Generator
//!
//! Populates the database with a pharmacy catalog (and optionally some
//! sales) for development.
//!
//! ## Usage
//! ```bash
//! # Seed the catalog into ./rxpos_dev.db
//! cargo run -p rxpos-db --bin seed
//!
//! # Also record 50 demo sales through the sale recorder
//! cargo run -p rxpos-db --bin seed -- --sales 50
//!
//! # Specify database path
//! cargo run -p rxpos-db --bin seed -- --db ./data/rxpos.db
//! ```
//!
//! ## Generated Products
//! Every catalog entry is expanded into its pack sizes:
//! - Unique barcode: `899{CATEGORY}{INDEX}{SIZE}` (13 digits)
//! - Sell price: base price + pack addon, buy price 60-80% of sell
//! - Stock: 0 - 120 (some deliberately low for the low-stock view)

use anyhow::{bail, Context};
use std::env;

use rxpos_core::{NewProduct, PaymentMethod, SaleLine, SaleRequest};
use rxpos_db::{Database, DbConfig, SaleError};

/// Categories with (product name, base sell price in cents).
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Analgesics",
        &[
            ("Paracetamol 500mg", 250),
            ("Ibuprofen 400mg", 400),
            ("Aspirin 100mg", 300),
            ("Mefenamic Acid 500mg", 450),
            ("Naproxen 250mg", 550),
        ],
    ),
    (
        "Antibiotics",
        &[
            ("Amoxicillin 500mg", 900),
            ("Cefadroxil 500mg", 1_400),
            ("Azithromycin 500mg", 2_500),
            ("Ciprofloxacin 500mg", 1_200),
        ],
    ),
    (
        "Antihistamines",
        &[
            ("Cetirizine 10mg", 350),
            ("Loratadine 10mg", 400),
            ("Chlorphenamine 4mg", 150),
        ],
    ),
    (
        "Vitamins",
        &[
            ("Vitamin C 500mg", 500),
            ("Vitamin D3 1000IU", 900),
            ("Vitamin B Complex", 600),
            ("Zinc 20mg", 450),
            ("Multivitamin", 1_100),
        ],
    ),
    (
        "Digestive",
        &[
            ("Omeprazole 20mg", 700),
            ("Antacid Suspension", 850),
            ("Oral Rehydration Salts", 200),
            ("Loperamide 2mg", 300),
        ],
    ),
    (
        "First Aid",
        &[
            ("Adhesive Bandages", 350),
            ("Antiseptic Solution", 1_500),
            ("Sterile Gauze", 600),
            ("Medical Tape", 400),
        ],
    ),
];

/// Pack variants with a price addon in cents.
const PACKS: &[(&str, i64)] = &[("Strip of 10", 0), ("Box of 30", 450), ("Box of 100", 1_800)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./rxpos_dev.db");
    let mut sales: usize = 0;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1]
                        .parse()
                        .with_context(|| format!("invalid --sales value: {}", args[i + 1]))?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("RxPOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./rxpos_dev.db)");
                println!("  -s, --sales <N>    Demo sales to record after seeding (default: 0)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => bail!("unknown argument: {other} (try --help)"),
        }
        i += 1;
    }

    println!("🌱 RxPOS Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        db.close().await;
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let mut product_ids = Vec::new();

    for (category_idx, (category, products)) in CATALOG.iter().enumerate() {
        for (product_idx, (name, base_price)) in products.iter().enumerate() {
            for (pack_idx, (pack, addon)) in PACKS.iter().enumerate() {
                let seed = category_idx * 100 + product_idx * 10 + pack_idx;
                let product = generate_product(category, name, pack, base_price + addon, seed)
                    .validate()
                    .with_context(|| format!("invalid seed product {name} {pack}"))?;

                let created = db.products().insert(&product).await?;
                product_ids.push(created.id);
            }
        }
    }

    println!(
        "✓ Generated {} products in {:?}",
        product_ids.len(),
        start.elapsed()
    );

    if sales > 0 {
        println!();
        println!("Recording {} demo sales...", sales);

        let mut recorded = 0;
        let mut skipped = 0;
        for n in 0..sales {
            let lines = (0..1 + n % 3)
                .map(|k| SaleLine {
                    product_id: product_ids[(n * 7 + k * 13) % product_ids.len()].clone(),
                    quantity: 1 + ((n + k) % 3) as i64,
                })
                .collect();
            let method = PaymentMethod::ALL[n % PaymentMethod::ALL.len()];

            match db.recorder().record_sale(SaleRequest::new(lines, method)?).await {
                Ok(_) => recorded += 1,
                // Low-stock products run out; that's expected in demo data.
                Err(SaleError::Domain(_)) => skipped += 1,
                Err(e) => return Err(e.into()),
            }
        }

        println!("✓ Recorded {} sales ({} skipped)", recorded, skipped);
    }

    println!();
    println!("Verifying search...");
    let results = db.products().search("mg", 10).await?;
    println!("  Search 'mg': {} results", results.len());
    let low = db.products().low_stock(rxpos_core::DEFAULT_LOW_STOCK_THRESHOLD).await?;
    println!("  Low stock: {} products", low.len());

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with realistic data.
fn generate_product(
    category: &str,
    name: &str,
    pack: &str,
    sell_price_cents: i64,
    seed: usize,
) -> NewProduct {
    // Buy price: 60-80% of sell price
    let cost_pct = 60 + (seed % 21) as i64;
    let buy_price_cents = sell_price_cents * cost_pct / 100;

    // Every seventh product starts low on stock
    let stock = if seed % 7 == 0 {
        (seed % 5) as i64
    } else {
        20 + (seed % 101) as i64
    };

    NewProduct {
        name: format!("{} ({})", name, pack),
        buy_price_cents,
        sell_price_cents,
        stock,
        category: category.to_string(),
        description: Some(format!("{} - {}", category, pack)),
        barcode: Some(format!("899{:010}", seed)),
    }
}

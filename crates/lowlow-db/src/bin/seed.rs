//! # Seed Data Generator
//!
//! Fills a store with the default accounts and a demo menu for the demo
//! restaurant.
//!
//! ## Usage
//! ```bash
//! # Default accounts + 40 dishes
//! cargo run -p lowlow-db --bin seed
//!
//! # Custom amount
//! cargo run -p lowlow-db --bin seed -- --products 120
//!
//! # Specify database path
//! cargo run -p lowlow-db --bin seed -- --db ./data/lowlow.db
//! ```
//!
//! Dishes cycle through the storefront categories. Every fifth one is
//! created hidden and every seventh one sold out, so both storefront
//! filters have something to hide.

use std::env;

use lowlow_core::{Money, NewProduct, ProductStatus};
use lowlow_db::bootstrap::{ensure_defaults, BootstrapOptions, DEMO_COMPANY_ID};
use lowlow_db::{Database, DbConfig};

/// Storefront categories with a few dishes each: (name, ingredients, base price ₸).
const MENU: &[(&str, &[(&str, &str, i64)])] = &[
    (
        "Пицца",
        &[
            ("Маргарита", "томаты, моцарелла, базилик", 2890),
            ("Пепперони", "пепперони, моцарелла, томатный соус", 3290),
            ("Четыре сыра", "моцарелла, дорблю, пармезан, чеддер", 3590),
        ],
    ),
    (
        "Бургеры",
        &[
            ("Классический", "говядина, салат, томат, соус", 2190),
            ("Чизбургер", "говядина, чеддер, маринованный огурец", 2390),
        ],
    ),
    (
        "Салаты",
        &[
            ("Цезарь", "курица, романо, пармезан, гренки", 2490),
            ("Греческий", "томаты, огурцы, фета, маслины", 1990),
        ],
    ),
    (
        "Напитки",
        &[
            ("Морс клюквенный", "клюква, сахар", 690),
            ("Лимонад", "лимон, мята, содовая", 790),
        ],
    ),
    (
        "Десерты",
        &[
            ("Чизкейк", "сливочный сыр, печенье", 1490),
            ("Тирамису", "маскарпоне, савоярди, кофе", 1690),
        ],
    ),
    (
        "Супы",
        &[
            ("Том ям", "креветки, кокосовое молоко, лемонграсс", 2990),
            ("Мисо", "тофу, вакаме, зелёный лук", 990),
        ],
    ),
    ("Завтраки", &[("Сырники", "творог, сметана, ягоды", 1590)]),
    ("Гарниры", &[("Картофель фри", "картофель, соль", 890)]),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./lowlow_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
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
                println!("LowLow Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Dishes for the demo restaurant (default: 40)");
                println!("  -d, --db <PATH>     Database file path (default: ./lowlow_dev.db)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 LowLow Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let report = ensure_defaults(&db, &BootstrapOptions::default()).await?;
    println!(
        "✓ Default accounts: {} admin(s) added, demo restaurant {}",
        report.admins_added,
        if report.demo_company_added { "added" } else { "already present" }
    );

    if db.users().get_by_id(DEMO_COMPANY_ID).await?.is_none() {
        println!("⚠ Demo restaurant was deleted from this store; no menu to seed.");
        return Ok(());
    }

    let existing = db.products().list_for_company(DEMO_COMPANY_ID).await?.len();
    if existing > 0 {
        println!("⚠ Demo restaurant already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    println!();
    println!("Generating menu...");

    let start = std::time::Instant::now();
    let dishes: Vec<(&str, &str, &str, i64)> = MENU
        .iter()
        .flat_map(|(category, dishes)| {
            dishes
                .iter()
                .map(move |(name, ingredients, price)| (*category, *name, *ingredients, *price))
        })
        .collect();

    let mut generated = 0;
    for (seed, (category, name, ingredients, price)) in dishes.iter().cycle().take(count).enumerate() {
        let form = generate_product(seed, dishes.len(), category, name, ingredients, *price);
        if let Err(e) = db.products().add(DEMO_COMPANY_ID, form).await {
            eprintln!("Failed to insert {}: {}", name, e);
            continue;
        }
        generated += 1;
    }

    println!("✓ Generated {} products in {:?}", generated, start.elapsed());

    let categories = db.products().categories(DEMO_COMPANY_ID).await?;
    println!("  Storefront categories: {}", categories.join(", "));

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// One dish. Repeats of the same dish get a round number suffix and a
/// slightly higher price.
fn generate_product(
    seed: usize,
    menu_len: usize,
    category: &str,
    name: &str,
    ingredients: &str,
    price: i64,
) -> NewProduct {
    let round = seed / menu_len;
    let name = if round == 0 {
        name.to_string()
    } else {
        format!("{} №{}", name, round + 1)
    };

    let status = if seed % 5 == 4 {
        ProductStatus::Inactive
    } else {
        ProductStatus::Active
    };
    let quantity = if seed % 7 == 6 { 0 } else { 5 + (seed * 13 % 45) as i64 };

    NewProduct {
        name,
        description: None,
        ingredients: Some(ingredients.to_string()),
        price: Money::from_tenge(price + (round as i64) * 100),
        category: category.to_string(),
        quantity,
        status,
        image: None,
    }
}

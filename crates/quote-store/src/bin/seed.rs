//! # Seed Data Generator
//!
//! Fills a store with demo quotes for development.
//!
//! ## Usage
//! ```bash
//! # 40 quotes into ./data/orders.json (default)
//! cargo run -p quote-store --bin seed
//!
//! # Custom amount into a SQLite file
//! cargo run -p quote-store --bin seed -- --count 200 --db ./quotes.db
//!
//! # Custom JSON data directory
//! cargo run -p quote-store --bin seed -- --dir ./demo-data
//! ```
//!
//! Each quote gets one to three lines drawn from a print-shop catalogue,
//! dated over the last ninety days, and is recalculated before saving.

use chrono::{Duration, Utc};
use quote_core::pricing::recalculate;
use quote_core::types::{LineItem, Order};
use quote_store::{DbConfig, JsonFileStore, OrderStore, QuoteStore, SqliteStore};
use std::env;

/// (name, unit, sell price, cost price). Names with "giấy" are area-priced.
const CATALOGUE: &[(&str, &str, f64, f64)] = &[
    ("Giấy in PP", "Cuộn", 55_000.0, 32_000.0),
    ("Giấy decal sữa", "Cuộn", 65_000.0, 40_000.0),
    ("Giấy ảnh", "Cuộn", 80_000.0, 45_000.0),
    ("Dịch vụ ép", "tờ", 3_000.0, 1_200.0),
    ("Cắt chữ", "cái", 25_000.0, 9_000.0),
    ("Bế demi", "tờ", 2_000.0, 800.0),
    ("Standee", "bộ", 350_000.0, 210_000.0),
];

const CUSTOMERS: &[&str] = &[
    "Anh Minh", "Cô Lan", "Shop Hoa Mai", "Quán Cà Phê Gió", "", "Trường THCS Lê Lợi",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut data_dir = String::from("./data");
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--dir" => {
                if i + 1 < args.len() {
                    data_dir = args[i + 1].clone();
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Print Quote Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of quotes to generate (default: 40)");
                println!("      --dir <PATH>   JSON data directory (default: ./data)");
                println!("  -d, --db <PATH>    Write to a SQLite file instead");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let store: Box<dyn QuoteStore> = match &db_path {
        Some(path) => {
            println!("Database: {}", path);
            Box::new(SqliteStore::connect(DbConfig::new(path)).await?)
        }
        None => {
            println!("Data dir: {}", data_dir);
            Box::new(JsonFileStore::new(&data_dir))
        }
    };

    let existing = store.try_load_all().await?;
    if !existing.is_empty() {
        println!("⚠ Store already has {} quotes", existing.len());
        println!("  Skipping seed to avoid mixing demo data with real quotes.");
        return Ok(());
    }

    let history: Vec<Order> = (0..count).map(generate_order).collect();
    store.save_all(&history).await?;

    let revenue: f64 = history.iter().map(|o| o.totals.customer_total).sum();
    println!("✓ Generated {} quotes", history.len());
    println!("  Total quoted: {}", quote_core::Vnd(revenue));
    Ok(())
}

/// A deterministic demo quote.
fn generate_order(seed: usize) -> Order {
    let mut order = Order::new();
    order.customer = CUSTOMERS[seed % CUSTOMERS.len()].to_string();
    order.order_no = format!("DH-{:04}", 1000 + seed);
    order.date = (Utc::now() - Duration::days((seed * 7 % 90) as i64)).date_naive();
    order.status = if seed % 3 == 0 { "Đã giao" } else { "Nháp" }.to_string();
    order.shipping_fee = if seed % 4 == 0 { 30_000.0 } else { 0.0 };
    order.discount = (seed % 3) as f64 * 5.0;

    let lines = 1 + seed % 3;
    order.items = (0..lines)
        .map(|n| {
            let (name, unit, sell, cost) = CATALOGUE[(seed + n * 3) % CATALOGUE.len()];
            let mut item = LineItem::blank();
            item.set_name(name);
            item.unit = unit.to_string();
            item.qty = (1 + (seed + n) % 5) as f64;
            item.sell_price = sell;
            item.cost_price = cost;
            if item.is_area_priced() {
                item.width = 1.2;
                item.length = 0.5 + ((seed + n) % 6) as f64 * 0.5;
            }
            item
        })
        .collect();

    recalculate(&mut order);
    order
}

//! # Seed Data Generator
//!
//! Populates a development database with demo profiles: one owner and one
//! seller per gallery location.
//!
//! ## Usage
//! ```bash
//! cargo run -p nano-db --bin seed
//! cargo run -p nano-db --bin seed -- --db ./data/nano.db
//! ```

use std::env;

use nano_db::{Database, DbConfig};

/// (id, display name, provider role, assigned location)
const PROFILES: &[(&str, &str, &str, Option<i64>)] = &[
    ("owner-1", "Dueña de la galería", "dueño", None),
    ("seller-1", "Vendedor Zapatería", "seller", Some(1)),
    ("seller-2", "Vendedor Ropa", "seller", Some(2)),
    ("seller-3", "Vendedor Librería", "seller", Some(3)),
    ("seller-4", "Vendedor Regalería", "seller", Some(4)),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = "./nano_dev.db".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Nano POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./nano_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Nano POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    for (id, name, role, location) in PROFILES {
        db.profiles().upsert(id, name, role, *location).await?;
        match location {
            Some(location) => println!("  {} ({}) → location {}", name, role, location),
            None => println!("  {} ({}) → all locations", name, role),
        }
    }

    println!();
    println!("✓ {} profiles in database", db.profiles().count().await?);

    db.close().await;
    Ok(())
}

//! # Seed Data Generator
//!
//! Populates the database with demo users, products, and a sample cart for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p mercado-db --bin seed
//!
//! # Specify database path
//! cargo run -p mercado-db --bin seed -- --db ./data/mercado.db
//! ```

use std::env;

use mercado_db::{Database, DbConfig, DbError};
use tracing::info;

/// Demo catalog: (name, price in cents, stock).
const PRODUCTS: &[(&str, i64, i64)] = &[
    ("Teclado mecánico", 8999, 25),
    ("Mouse inalámbrico", 3499, 40),
    ("Monitor 24\"", 18999, 12),
    ("Auriculares", 5999, 30),
    ("Webcam HD", 4599, 18),
    ("Alfombrilla XL", 1299, 60),
];

/// Demo users: (name, role).
const USERS: &[(&str, &str)] = &[
    ("Ana Torres", "customer"),
    ("Luis Rojas", "customer"),
    ("Marta Díaz", "admin"),
];

#[tokio::main]
async fn main() -> Result<(), DbError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./mercado.db".to_string());

    info!(path = %db_path, "Seeding database");
    let db = Database::new(DbConfig::new(&db_path)).await?;

    let mut user_ids = Vec::new();
    for (name, role) in USERS {
        let id: i64 =
            sqlx::query_scalar("INSERT INTO usuarios (nombre, rol) VALUES (?1, ?2) RETURNING id")
                .bind(name)
                .bind(role)
                .fetch_one(db.pool())
                .await?;
        user_ids.push(id);
    }
    info!(count = user_ids.len(), "Users seeded");

    let mut product_ids = Vec::new();
    for (name, price, stock) in PRODUCTS {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO productos (nombre, precio, stock) VALUES (?1, ?2, ?3) RETURNING id",
        )
        .bind(name)
        .bind(price)
        .bind(stock)
        .fetch_one(db.pool())
        .await?;
        product_ids.push(id);
    }
    info!(count = product_ids.len(), "Products seeded");

    // Give the first user a cart worth checking out
    let carts = db.carts();
    carts.add_item(user_ids[0], product_ids[0], 1).await?;
    carts.add_item(user_ids[0], product_ids[1], 2).await?;
    let cart = carts.get_cart(user_ids[0]).await?;
    info!(user_id = user_ids[0], total = %cart.total, "Sample cart ready");

    db.close().await;
    Ok(())
}

fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1).cloned())
}

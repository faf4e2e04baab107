//! # mercado-db: Database Layer for the Mercado Order Engine
//!
//! This crate provides database access for the order-placement and
//! cart-consistency engine. It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Mercado Data Flow                          │
//! │                                                                 │
//! │  Request layer (external: routing, auth, JWT)                   │
//! │       │  authenticated user id                                  │
//! │       ▼                                                         │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                 mercado-db (THIS CRATE)                   │  │
//! │  │                                                           │  │
//! │  │  ┌────────────┐   ┌──────────────┐   ┌────────────────┐  │  │
//! │  │  │  Database  │   │ Repositories │   │   Migrations   │  │  │
//! │  │  │ (pool.rs)  │◄──│  cart.rs     │   │   (embedded)   │  │  │
//! │  │  │            │   │  order.rs    │   │ 001_initial…   │  │  │
//! │  │  └────────────┘   └──────────────┘   └────────────────┘  │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  SQLite database (carrito, pedidos, detalles_pedido, …)         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (cart, order)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mercado_db::{Database, DbConfig};
//! use mercado_core::Money;
//!
//! let db = Database::new(DbConfig::new("path/to/mercado.db")).await?;
//!
//! db.carts().add_item(user_id, product_id, 2).await?;
//! let order = db.orders().place_order(user_id, Money::from_cents(9000), "card").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::order::OrderRepository;

//! # Repository Module
//!
//! Database repository implementations for the Mercado order engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                Repository Pattern Explained                     │
//! │                                                                 │
//! │  Request layer                                                  │
//! │       │                                                         │
//! │       │  db.orders().place_order(user_id, total, "card")        │
//! │       ▼                                                         │
//! │  OrderRepository                                                │
//! │  ├── place_order(user_id, total, method)   ← one transaction    │
//! │  ├── list_for_user(user_id)                                     │
//! │  ├── list_all()                                                 │
//! │  ├── update_status(order_id, status)                            │
//! │  └── delete_order(order_id)                                     │
//! │       │                                                         │
//! │       │  SQL                                                    │
//! │       ▼                                                         │
//! │  SQLite Database                                                │
//! │                                                                 │
//! │  Benefits:                                                      │
//! │  • SQL is isolated in one place per aggregate                   │
//! │  • Cart rows are only ever mutated here                         │
//! │  • Easy to test against an in-memory database                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`cart::CartRepository`] - Cart store (upsert, remove, clear, read)
//! - [`order::OrderRepository`] - Order transaction coordinator + queries

pub mod cart;
pub mod order;

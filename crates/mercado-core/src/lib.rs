//! # mercado-core: Pure Business Logic for the Mercado Order Engine
//!
//! This crate is the **heart** of the order engine. It contains all business
//! logic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Mercado Architecture                         │
//! │                                                                 │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │              Request Layer (external)                     │  │
//! │  │   authenticated user id ──► operation call ──► response   │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │            ★ mercado-core (THIS CRATE) ★                  │  │
//! │  │                                                           │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────────┐      │  │
//! │  │  │  types  │ │  money  │ │ pricing │ │ validation │      │  │
//! │  │  │  Order  │ │  Money  │ │  even   │ │   rules    │      │  │
//! │  │  │  Cart   │ │  cents  │ │  split  │ │   checks   │      │  │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └────────────┘      │  │
//! │  │                                                           │  │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS       │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │              mercado-db (Database Layer)                  │  │
//! │  │     SQLite queries, migrations, cart/order repositories   │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Order, CartLine, OrderStatus, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - The even-split pricing resolver
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64)
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use mercado_core::Money` instead of
// `use mercado_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;

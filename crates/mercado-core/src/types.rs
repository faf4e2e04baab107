//! # Domain Types
//!
//! Core domain types used throughout the Mercado order engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Domain Types                             │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌────────────────────┐  │
//! │  │   CartLine   │   │    Order     │   │     OrderLine      │  │
//! │  │ ──────────── │   │ ──────────── │   │ ────────────────── │  │
//! │  │ user_id      │──►│ user_id      │──►│ order_id (FK)      │  │
//! │  │ product_id   │   │ total        │   │ product_id         │  │
//! │  │ quantity     │   │ status       │   │ quantity           │  │
//! │  └──────────────┘   └──────┬───────┘   │ unit_price         │  │
//! │     mutable                │           └────────────────────┘  │
//! │     (upsert/remove)        ▼              immutable snapshot   │
//! │                  ┌────────────────────┐                        │
//! │                  │ StatusHistoryEntry │  append-only audit     │
//! │                  └────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A cart line is live state; an order line is an immutable fact. The two
//! never coexist for the same items: checkout snapshots the cart and removes
//! it in one transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Role
// =============================================================================

/// Role of the acting principal.
///
/// Supplied by the upstream identity provider together with the user id;
/// this crate never sees raw credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular shopper: owns a cart, places orders, sees own history.
    Customer,
    /// Back-office user: may list orders across all customers.
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::Customer
    }
}

// =============================================================================
// User
// =============================================================================

/// The slice of a user this engine consumes.
///
/// Registration, credentials, and profile editing are owned externally;
/// only identity, role, and active flag matter here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    /// Display name, used by the admin order listing.
    pub name: String,
    pub role: Role,
    /// Inactive users keep their rows but are hidden from reads.
    pub is_active: bool,
}

// =============================================================================
// Cart
// =============================================================================
//
// The product catalog itself is owned externally and never materializes as
// a standalone entity here; its name/price/image columns are joined into
// `CartLineView` for display.

/// One product/quantity pairing in a user's pre-checkout cart.
///
/// Unique per `(user_id, product_id)`; repeated adds accumulate the
/// quantity rather than creating a second row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    /// Always >= 1; enforced by validation and a CHECK constraint.
    pub quantity: i64,
}

/// A cart line joined with catalog data for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLineView {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    /// Current catalog price; a live estimate, not the frozen order price.
    pub unit_price: Money,
    pub image: Option<String>,
    pub quantity: i64,
}

impl CartLineView {
    /// Line subtotal at current catalog prices.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// The full cart for one user with its computed total.
///
/// The `total` is a live estimate over current catalog prices; it is
/// distinct from the frozen `Order.total` fixed at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: Money,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// The lifecycle status of an order.
///
/// Stored as lowercase text. Every order starts as `Pending`; any status is
/// reachable from any status (the store enforces no transition table —
/// legality is the caller's responsibility).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Confirmed,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// The stored text form, matching the `estado` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

// =============================================================================
// Order
// =============================================================================

/// The order header: an immutable fact created exactly once per checkout.
///
/// Only `status` ever changes after creation, and only through the order
/// query service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// Frozen at checkout; caller-supplied, not recomputed from catalog.
    pub total: Money,
    /// Opaque tag persisted verbatim ("card", "transfer", ...).
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// An immutable snapshot of one cart line at checkout time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Derived by the even-split pricing rule, never a catalog lookup.
    pub unit_price: Money,
}

impl OrderLine {
    /// Snapshot subtotal; sums of these reconcile to `Order.total` within
    /// the even-split rounding tolerance.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// One entry in the append-only status audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StatusHistoryEntry {
    pub id: i64,
    pub order_id: i64,
    pub status: OrderStatus,
    pub changed_at: DateTime<Utc>,
}

/// An order with its lines and full status history, as returned by the
/// per-user listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub history: Vec<StatusHistoryEntry>,
}

/// An order with customer display name, as returned by the admin listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOrderDetails {
    pub order: Order,
    pub customer_name: String,
    pub lines: Vec<OrderLine>,
    pub history: Vec<StatusHistoryEntry>,
}

// =============================================================================
// Unit Tests
// =============================================================================

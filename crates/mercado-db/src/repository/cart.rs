//! # Cart Repository
//!
//! The cart store: per-user mutable cart line items.
//!
//! ## Cart Consistency Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Invariants                        │
//! │                                                                 │
//! │  add_item(u, p, 3)                                              │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  ┌────────────────────────────────────────────────────────┐     │
//! │  │ carrito: (u, p) → 3                                    │     │
//! │  └────────────────────────────────────────────────────────┘     │
//! │  add_item(u, p, 2)   ← repeated add ACCUMULATES, never          │
//! │       │                overwrites and never duplicates          │
//! │       ▼                                                         │
//! │  ┌────────────────────────────────────────────────────────┐     │
//! │  │ carrito: (u, p) → 5      (still exactly one row)       │     │
//! │  └────────────────────────────────────────────────────────┘     │
//! │                                                                 │
//! │  • quantity is always >= 1                                      │
//! │  • rows are mutated ONLY through this repository; the order     │
//! │    coordinator reads them inside its transaction and deletes    │
//! │    them on successful checkout                                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use mercado_core::validation::validate_quantity;
use mercado_core::{CartLine, CartLineView, CartView, Money};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Adds a product to a user's cart, accumulating quantity on repeat.
    ///
    /// ## Behavior
    /// - No line for `(user_id, product_id)`: inserts one with `quantity`
    /// - Existing line: adds `quantity` to it (upsert, never a second row)
    ///
    /// ## Errors
    /// - `Validation` if `quantity <= 0` or above the per-line maximum
    /// - `ForeignKeyViolation` if the user or product does not exist
    ///
    /// ## Returns
    /// The resulting cart line with its accumulated quantity.
    pub async fn add_item(
        &self,
        user_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> DbResult<CartLine> {
        validate_quantity(quantity)?;

        debug!(user_id, product_id, quantity, "Adding cart line");

        let line: CartLine = sqlx::query_as(
            r#"
            INSERT INTO carrito (usuario_id, producto_id, cantidad)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (usuario_id, producto_id)
                DO UPDATE SET cantidad = cantidad + excluded.cantidad
            RETURNING
                id,
                usuario_id AS user_id,
                producto_id AS product_id,
                cantidad AS quantity
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await?;

        Ok(line)
    }

    /// Removes one product line from a user's cart.
    ///
    /// ## Returns
    /// The removed line (with the quantity it held), so the request layer
    /// can echo what was taken out.
    ///
    /// ## Errors
    /// `NotFound` if the user has no line for that product; the cart is
    /// left unchanged.
    pub async fn remove_item(&self, user_id: i64, product_id: i64) -> DbResult<CartLine> {
        debug!(user_id, product_id, "Removing cart line");

        let removed: Option<CartLine> = sqlx::query_as(
            r#"
            DELETE FROM carrito
            WHERE usuario_id = ?1 AND producto_id = ?2
            RETURNING
                id,
                usuario_id AS user_id,
                producto_id AS product_id,
                cantidad AS quantity
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        removed.ok_or_else(|| {
            DbError::not_found(
                "Cart line",
                format!("user {user_id}, product {product_id}"),
            )
        })
    }

    /// Deletes all cart lines for a user.
    ///
    /// Idempotent: succeeds (returning 0) when the cart is already empty.
    ///
    /// ## Note
    /// Successful checkout does NOT call this — the order coordinator
    /// deletes the cart rows inside its own transaction. This operation
    /// exists for the explicit "empty my cart" action.
    pub async fn clear_cart(&self, user_id: i64) -> DbResult<u64> {
        debug!(user_id, "Clearing cart");

        let result = sqlx::query("DELETE FROM carrito WHERE usuario_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Returns a user's cart joined with catalog data, plus a computed total.
    ///
    /// The total is `sum(precio * cantidad)` over CURRENT catalog prices —
    /// a live estimate for display, distinct from the frozen `Order.total`
    /// fixed at checkout time.
    pub async fn get_cart(&self, user_id: i64) -> DbResult<CartView> {
        let lines: Vec<CartLineView> = sqlx::query_as(
            r#"
            SELECT
                c.id,
                c.producto_id AS product_id,
                p.nombre AS name,
                p.precio AS unit_price,
                p.imagen AS image,
                c.cantidad AS quantity
            FROM carrito c
            JOIN productos p ON p.id = c.producto_id
            WHERE c.usuario_id = ?1
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let total: Money = lines.iter().map(CartLineView::line_total).sum();

        Ok(CartView { lines, total })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

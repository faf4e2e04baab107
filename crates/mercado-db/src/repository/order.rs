//! # Order Repository
//!
//! The order transaction coordinator and the order query service.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │              place_order(user, total, method)                   │
//! │                                                                 │
//! │  BEGIN                                                          │
//! │   ├── 1. verify user exists            (NotFound otherwise)     │
//! │   ├── 2. INSERT pedidos header         (estado = 'pending')     │
//! │   ├── 3. SELECT carrito rows for user                           │
//! │   │       └── none? ROLLBACK everything → EmptyCart             │
//! │   ├── 4. INSERT detalles_pedido per line                        │
//! │   │       precio = even_split(total, line_count)                │
//! │   ├── 5. INSERT historial_pedidos      ('pending')              │
//! │   ├── 6. DELETE carrito rows for user                           │
//! │  COMMIT                                                         │
//! │                                                                 │
//! │  Any failure in 1-6 rolls the WHOLE unit back: no order is      │
//! │  ever visible without its lines, history, and an emptied cart.  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart delete runs inside the same transaction as the inserts, so a
//! committed order can never coexist with the cart rows it consumed.
//!
//! ## Concurrency
//! No in-process locks are held; the database transaction is the only
//! coordination point. SQLite serializes writers, so two concurrent
//! checkouts for the same user cannot both consume the same cart snapshot:
//! the loser observes an empty cart and fails with `EmptyCart`.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use mercado_core::pricing::even_split;
use mercado_core::validation::{validate_order_total, validate_payment_method};
use mercado_core::{
    AdminOrderDetails, CartLine, Money, Order, OrderDetails, OrderLine, OrderStatus,
    StatusHistoryEntry, User,
};

/// Column alias list mapping `pedidos` to the `Order` entity.
const ORDER_COLUMNS: &str = "id, usuario_id AS user_id, total, \
     metodo_pago AS payment_method, estado AS status, fecha AS created_at";

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Transaction Coordinator
    // =========================================================================

    /// Converts the user's current cart into an immutable, priced order,
    /// atomically.
    ///
    /// The caller supplies `total` (client-trusted pricing) and an opaque
    /// `payment_method` tag; the line items are NOT caller-supplied — they
    /// are read from the stored cart inside the transaction, making the
    /// cart the single source of truth for *which* products while trusting
    /// the caller for *how much*.
    ///
    /// ## Errors
    /// - `Validation` — `total <= 0` or empty payment method (no writes)
    /// - `NotFound` — `user_id` does not resolve to a user
    /// - `EmptyCart` — the user's cart has no lines (full rollback,
    ///   header included)
    /// - Any persistence failure rolls the whole transaction back
    ///
    /// ## Postcondition
    /// On success: exactly one new order with >= 1 lines and exactly one
    /// `pending` history row is durably committed, and the user's cart
    /// rows are gone — all in one unit.
    pub async fn place_order(
        &self,
        user_id: i64,
        total: Money,
        payment_method: &str,
    ) -> DbResult<Order> {
        validate_order_total(total)?;
        let payment_method = validate_payment_method(payment_method)?;

        debug!(user_id, total = %total, payment_method = %payment_method, "Placing order");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Preconditions: the acting principal must resolve to a stored user.
        let user: Option<User> = sqlx::query_as(
            "SELECT id, nombre AS name, rol AS role, estado = 'activo' AS is_active \
             FROM usuarios WHERE id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        let user = user.ok_or_else(|| DbError::not_found("User", user_id))?;
        debug!(user_id, name = %user.name, "Checkout for user");

        // Order header first; it only survives if the whole unit commits.
        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO pedidos (usuario_id, total, metodo_pago, estado, fecha)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(total)
        .bind(&payment_method)
        .bind(OrderStatus::Pending)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        // Snapshot the cart as it stands inside this transaction.
        let cart_lines: Vec<CartLine> = sqlx::query_as(
            r#"
            SELECT id, usuario_id AS user_id, producto_id AS product_id, cantidad AS quantity
            FROM carrito
            WHERE usuario_id = ?1
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        // even_split fails on zero lines; roll back the header explicitly
        // so the EmptyCart failure leaves no trace.
        let unit_price = match even_split(total, cart_lines.len(), user_id) {
            Ok(price) => price,
            Err(err) => {
                tx.rollback().await?;
                return Err(err.into());
            }
        };

        for line in &cart_lines {
            sqlx::query(
                r#"
                INSERT INTO detalles_pedido (pedido_id, producto_id, cantidad, precio)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(unit_price)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO historial_pedidos (pedido_id, estado, fecha_cambio) VALUES (?1, ?2, ?3)",
        )
        .bind(order_id)
        .bind(OrderStatus::Pending)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Consume the cart in the SAME unit: order and cart are never
        // simultaneously non-empty for the same items.
        sqlx::query("DELETE FROM carrito WHERE usuario_id = ?1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_id,
            user_id,
            total = %total,
            lines = cart_lines.len(),
            "Order placed"
        );

        Ok(Order {
            id: order_id,
            user_id,
            total,
            payment_method,
            status: OrderStatus::Pending,
            created_at: now,
        })
    }

    // =========================================================================
    // Query Service
    // =========================================================================

    /// Gets an order header by ID.
    pub async fn get_by_id(&self, order_id: i64) -> DbResult<Option<Order>> {
        let order: Option<Order> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM pedidos WHERE id = ?1"))
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(order)
    }

    /// Returns all orders for a user, newest first, each with its line
    /// items and full status history.
    ///
    /// ## Errors
    /// `NotFound` when the user has zero orders (deliberate policy: an
    /// empty history reads as "nothing to show" at the request layer).
    pub async fn list_for_user(&self, user_id: i64) -> DbResult<Vec<OrderDetails>> {
        let orders: Vec<Order> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM pedidos \
             WHERE usuario_id = ?1 ORDER BY fecha DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if orders.is_empty() {
            return Err(DbError::not_found("Orders for user", user_id));
        }

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let lines = self.lines_for(order.id).await?;
            let history = self.history_for(order.id).await?;
            details.push(OrderDetails {
                order,
                lines,
                history,
            });
        }

        Ok(details)
    }

    /// Returns all orders across all users, newest first, joined with the
    /// customer display name. Admin-facing; role enforcement belongs to
    /// the request layer.
    pub async fn list_all(&self) -> DbResult<Vec<AdminOrderDetails>> {
        #[derive(sqlx::FromRow)]
        struct AdminOrderRow {
            id: i64,
            user_id: i64,
            total: Money,
            payment_method: String,
            status: OrderStatus,
            created_at: chrono::DateTime<Utc>,
            customer_name: String,
        }

        let rows: Vec<AdminOrderRow> = sqlx::query_as(
            r#"
            SELECT
                o.id,
                o.usuario_id AS user_id,
                o.total,
                o.metodo_pago AS payment_method,
                o.estado AS status,
                o.fecha AS created_at,
                u.nombre AS customer_name
            FROM pedidos o
            JOIN usuarios u ON u.id = o.usuario_id
            ORDER BY o.fecha DESC, o.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(rows.len());
        for row in rows {
            let lines = self.lines_for(row.id).await?;
            let history = self.history_for(row.id).await?;
            details.push(AdminOrderDetails {
                order: Order {
                    id: row.id,
                    user_id: row.user_id,
                    total: row.total,
                    payment_method: row.payment_method,
                    status: row.status,
                    created_at: row.created_at,
                },
                customer_name: row.customer_name,
                lines,
                history,
            });
        }

        Ok(details)
    }

    /// Overwrites an order's status and appends a history row, in one
    /// transaction.
    ///
    /// Any status is reachable from any status; no transition table is
    /// enforced (legality is the caller's responsibility).
    ///
    /// ## Errors
    /// `NotFound` if the order does not exist.
    pub async fn update_status(&self, order_id: i64, status: OrderStatus) -> DbResult<Order> {
        debug!(order_id, status = status.as_str(), "Updating order status");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE pedidos SET estado = ?1 WHERE id = ?2")
            .bind(status)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        // Keep the audit trail in lockstep with the header.
        sqlx::query(
            "INSERT INTO historial_pedidos (pedido_id, estado, fecha_cambio) VALUES (?1, ?2, ?3)",
        )
        .bind(order_id)
        .bind(status)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let order: Order =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM pedidos WHERE id = ?1"))
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;

        tx.commit().await?;

        info!(order_id, status = status.as_str(), "Order status updated");

        Ok(order)
    }

    /// Hard-deletes an order.
    ///
    /// Line items and history rows go with it via `ON DELETE CASCADE`;
    /// there is no explicit cascade check here.
    ///
    /// ## Errors
    /// `NotFound` if the order does not exist.
    pub async fn delete_order(&self, order_id: i64) -> DbResult<()> {
        debug!(order_id, "Deleting order");

        let result = sqlx::query("DELETE FROM pedidos WHERE id = ?1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    async fn lines_for(&self, order_id: i64) -> DbResult<Vec<OrderLine>> {
        let lines: Vec<OrderLine> = sqlx::query_as(
            r#"
            SELECT id, pedido_id AS order_id, producto_id AS product_id,
                   cantidad AS quantity, precio AS unit_price
            FROM detalles_pedido
            WHERE pedido_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    async fn history_for(&self, order_id: i64) -> DbResult<Vec<StatusHistoryEntry>> {
        let history: Vec<StatusHistoryEntry> = sqlx::query_as(
            r#"
            SELECT id, pedido_id AS order_id, estado AS status, fecha_cambio AS changed_at
            FROM historial_pedidos
            WHERE pedido_id = ?1
            ORDER BY id
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(history)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_user(db: &Database, name: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO usuarios (nombre, rol) VALUES (?1, 'customer') RETURNING id")
            .bind(name)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    async fn seed_product(db: &Database, name: &str, price_cents: i64) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO productos (nombre, precio, stock, imagen) \
             VALUES (?1, ?2, 10, NULL) RETURNING id",
        )
        .bind(name)
        .bind(price_cents)
        .fetch_one(db.pool())
        .await
        .unwrap()
    }

    async fn table_count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    /// Spec scenario: cart [(p7, qty 2), (p9, qty 1)], total $90, "card"
    /// → order total $90, two lines at $45 each, one pending history row.
    #[tokio::test]
    async fn test_place_order_snapshots_cart_and_clears_it() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;
        let p1 = seed_product(&db, "Teclado", 2500).await;
        let p2 = seed_product(&db, "Mouse", 1200).await;

        db.carts().add_item(user, p1, 2).await.unwrap();
        db.carts().add_item(user, p2, 1).await.unwrap();

        let order = db
            .orders()
            .place_order(user, Money::from_cents(9000), "card")
            .await
            .unwrap();

        assert_eq!(order.user_id, user);
        assert_eq!(order.total.cents(), 9000);
        assert_eq!(order.payment_method, "card");
        assert_eq!(order.status, OrderStatus::Pending);

        // Two lines, each priced at total / distinct-line-count = $45.00
        let details = db.orders().list_for_user(user).await.unwrap();
        assert_eq!(details.len(), 1);
        let placed = &details[0];
        assert_eq!(placed.lines.len(), 2);
        for line in &placed.lines {
            assert_eq!(line.unit_price.cents(), 4500);
        }
        assert_eq!(placed.lines[0].product_id, p1);
        assert_eq!(placed.lines[0].quantity, 2);
        assert_eq!(placed.lines[1].product_id, p2);
        assert_eq!(placed.lines[1].quantity, 1);

        // Exactly one history row, status pending
        assert_eq!(placed.history.len(), 1);
        assert_eq!(placed.history[0].status, OrderStatus::Pending);
        assert_eq!(placed.history[0].order_id, order.id);

        // The cart was consumed in the same unit
        let cart = db.carts().get_cart(user).await.unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_empty_cart_fails_and_leaves_no_rows() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;

        let err = db
            .orders()
            .place_order(user, Money::from_cents(5000), "card")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::EmptyCart { user_id } if user_id == user));

        // Full rollback: the header inserted before the cart read is gone too
        assert_eq!(table_count(&db, "pedidos").await, 0);
        assert_eq!(table_count(&db, "detalles_pedido").await, 0);
        assert_eq!(table_count(&db, "historial_pedidos").await, 0);
    }

    #[tokio::test]
    async fn test_place_order_unknown_user_is_not_found() {
        let db = test_db().await;

        let err = db
            .orders()
            .place_order(404, Money::from_cents(5000), "card")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(table_count(&db, "pedidos").await, 0);
    }

    #[tokio::test]
    async fn test_place_order_rejects_bad_inputs_before_any_write() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;
        let product = seed_product(&db, "Teclado", 2500).await;
        db.carts().add_item(user, product, 1).await.unwrap();

        let err = db
            .orders()
            .place_order(user, Money::zero(), "card")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = db
            .orders()
            .place_order(user, Money::from_cents(2500), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        // Nothing was written and the cart is untouched
        assert_eq!(table_count(&db, "pedidos").await, 0);
        assert_eq!(db.carts().get_cart(user).await.unwrap().lines.len(), 1);
    }

    #[tokio::test]
    async fn test_place_order_uneven_total_reconciles_within_tolerance() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;
        for i in 0..3 {
            let p = seed_product(&db, &format!("Producto {i}"), 1000).await;
            db.carts().add_item(user, p, 1).await.unwrap();
        }

        // $100.00 over 3 lines → 3333 cents per line
        let total = Money::from_cents(10000);
        db.orders().place_order(user, total, "card").await.unwrap();

        let details = db.orders().list_for_user(user).await.unwrap();
        let lines = &details[0].lines;
        assert_eq!(lines.len(), 3);
        for line in lines {
            assert_eq!(line.unit_price.cents(), 3333);
        }

        let reconstructed: Money = lines.iter().map(OrderLine::line_total).sum();
        assert!((total - reconstructed).abs().cents() < lines.len() as i64);
    }

    #[tokio::test]
    async fn test_list_for_user_is_newest_first() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;
        let product = seed_product(&db, "Teclado", 2500).await;

        db.carts().add_item(user, product, 1).await.unwrap();
        let first = db
            .orders()
            .place_order(user, Money::from_cents(2500), "card")
            .await
            .unwrap();

        db.carts().add_item(user, product, 2).await.unwrap();
        let second = db
            .orders()
            .place_order(user, Money::from_cents(5000), "transfer")
            .await
            .unwrap();

        let details = db.orders().list_for_user(user).await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].order.id, second.id);
        assert_eq!(details[1].order.id, first.id);
    }

    #[tokio::test]
    async fn test_list_for_user_with_no_orders_is_not_found() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;

        let err = db.orders().list_for_user(user).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_all_joins_customer_name() {
        let db = test_db().await;
        let ana = seed_user(&db, "Ana").await;
        let luis = seed_user(&db, "Luis").await;
        let product = seed_product(&db, "Teclado", 2500).await;

        db.carts().add_item(ana, product, 1).await.unwrap();
        db.orders()
            .place_order(ana, Money::from_cents(2500), "card")
            .await
            .unwrap();

        db.carts().add_item(luis, product, 1).await.unwrap();
        db.orders()
            .place_order(luis, Money::from_cents(2500), "card")
            .await
            .unwrap();

        let all = db.orders().list_all().await.unwrap();
        assert_eq!(all.len(), 2);
        // Newest first: Luis ordered last
        assert_eq!(all[0].customer_name, "Luis");
        assert_eq!(all[1].customer_name, "Ana");
        assert_eq!(all[0].lines.len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_overwrites_and_appends_history() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;
        let product = seed_product(&db, "Teclado", 2500).await;
        db.carts().add_item(user, product, 1).await.unwrap();
        let order = db
            .orders()
            .place_order(user, Money::from_cents(2500), "card")
            .await
            .unwrap();

        let updated = db
            .orders()
            .update_status(order.id, OrderStatus::Processing)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);

        // History is append-only: the original pending row is untouched
        let details = db.orders().list_for_user(user).await.unwrap();
        let history = &details[0].history;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, OrderStatus::Pending);
        assert_eq!(history[1].status, OrderStatus::Processing);
    }

    #[tokio::test]
    async fn test_update_status_allows_any_transition() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;
        let product = seed_product(&db, "Teclado", 2500).await;
        db.carts().add_item(user, product, 1).await.unwrap();
        let order = db
            .orders()
            .place_order(user, Money::from_cents(2500), "card")
            .await
            .unwrap();

        // No transition table: cancelled → completed is accepted
        db.orders()
            .update_status(order.id, OrderStatus::Cancelled)
            .await
            .unwrap();
        let updated = db
            .orders()
            .update_status(order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_update_status_missing_order_is_not_found() {
        let db = test_db().await;

        let err = db
            .orders()
            .update_status(404, OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(table_count(&db, "historial_pedidos").await, 0);
    }

    #[tokio::test]
    async fn test_delete_order_cascades_lines_and_history() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;
        let product = seed_product(&db, "Teclado", 2500).await;
        db.carts().add_item(user, product, 1).await.unwrap();
        let order = db
            .orders()
            .place_order(user, Money::from_cents(2500), "card")
            .await
            .unwrap();

        db.orders().delete_order(order.id).await.unwrap();

        assert_eq!(table_count(&db, "pedidos").await, 0);
        assert_eq!(table_count(&db, "detalles_pedido").await, 0);
        assert_eq!(table_count(&db, "historial_pedidos").await, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_order_is_not_found() {
        let db = test_db().await;

        let err = db.orders().delete_order(404).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let db = test_db().await;
        let user = seed_user(&db, "Ana").await;
        let product = seed_product(&db, "Teclado", 2500).await;
        db.carts().add_item(user, product, 1).await.unwrap();
        let order = db
            .orders()
            .place_order(user, Money::from_cents(2500), "card")
            .await
            .unwrap();

        let fetched = db.orders().get_by_id(order.id).await.unwrap().unwrap();
        assert_eq!(fetched.total.cents(), 2500);
        assert_eq!(fetched.payment_method, "card");

        assert!(db.orders().get_by_id(9999).await.unwrap().is_none());
    }
}

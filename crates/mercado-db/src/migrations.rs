//! # Database Migrations
//!
//! The storefront schema, embedded and applied at startup.
//!
//! The migration set currently holds a single file: `001_initial_schema.sql`
//! creates the six production tables (`usuarios`, `productos`, `carrito`,
//! `pedidos`, `detalles_pedido`, `historial_pedidos`) plus their indexes.
//! Schema changes land as new `NNN_description.sql` files under
//! `migrations/sqlite/`; an already-applied file must never be edited, since
//! sqlx checksums each one against its `_sqlx_migrations` bookkeeping row.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// The schema files, compiled into the binary so deployments never depend
/// on a migrations directory existing next to the executable.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Brings the database up to the current schema version.
///
/// Idempotent: already-applied files are skipped, and each pending one runs
/// inside its own transaction, in filename order. `Database::new` calls this
/// unless migrations are disabled in the config.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

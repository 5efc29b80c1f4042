//! Database initialization and migration runner.
//!
//! SYSTEM CONTEXT
//! ==============
//! Startup calls this only when `DATABASE_URL` is configured. The pool backs
//! `data::postgres::PgBackend`; the schema is migrated before the listener
//! binds.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Initialize the `PostgreSQL` connection pool and run migrations.
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;
    tracing::info!(max_connections, "database migrated");

    Ok(pool)
}

use anyhow::{Context, Result};
use r2d2_sqlite::SqliteConnectionManager;

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

pub fn create_pool(database_path: &str) -> Result<DbPool> {
    let manager = with_pragmas(SqliteConnectionManager::file(database_path));

    r2d2::Pool::builder()
        .build(manager)
        .with_context(|| format!("Failed to create connection pool for {}", database_path))
}

/// Every in-memory connection is its own database, so the pool keeps
/// exactly one connection alive for its whole life.
pub fn create_memory_pool() -> Result<DbPool> {
    let manager = with_pragmas(SqliteConnectionManager::memory());

    r2d2::Pool::builder()
        .max_size(1)
        .max_lifetime(None)
        .idle_timeout(None)
        .build(manager)
        .context("Failed to create in-memory connection pool")
}

fn with_pragmas(manager: SqliteConnectionManager) -> SqliteConnectionManager {
    manager.with_init(|conn| conn.execute_batch(CONNECTION_PRAGMAS))
}

pub fn get_connection(pool: &DbPool) -> Result<DbConn> {
    pool.get()
        .context("Failed to get database connection from pool")
}

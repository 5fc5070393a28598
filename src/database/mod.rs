pub mod connection;
pub mod counters;
pub mod matches;
pub mod players;
pub mod setup;
pub mod sqlite_store;

pub use connection::{create_memory_pool, create_pool, get_connection, DbConn, DbPool};
pub use sqlite_store::SqliteStore;

mod config;
mod memory;
mod postgres;
mod sqlite;
mod traits;

pub use config::{DataStoreType, connect_user_store};
pub use memory::InMemoryUserStore;
pub use postgres::PostgresUserStore;
pub use sqlite::SqliteUserStore;
pub use traits::UserStore;

mod errors;
mod storage;
mod types;

pub use errors::UserError;
pub use storage::{
    DataStoreType, InMemoryUserStore, PostgresUserStore, SqliteUserStore, UserStore,
    connect_user_store,
};
pub use types::{Role, SessionState, UserRecord, UserSearchField};

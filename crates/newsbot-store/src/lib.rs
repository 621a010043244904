//! SQLite implementation of the newsbot persistence ports.

mod audit;
mod preferences;
mod schema;
mod users;

pub use schema::SqliteStore;

use newsbot_core::Error;

/// Map a sqlx error into the core error, keeping unique-key violations distinguishable.
pub(crate) fn map_err(context: &str, e: sqlx::Error) -> Error {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            Error::Conflict(format!("{context}: {db}"))
        }
        _ => Error::Store(format!("{context}: {e}")),
    }
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

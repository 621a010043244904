/// Core error type for the news bot.
///
/// Adapter crates (store, news provider, Telegram) map their specific errors into this type
/// so command handlers and the digest publisher can treat failures uniformly: validation
/// problems become usage replies, everything else becomes "try again later".
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("news provider error: {0}")]
    Provider(String),

    #[error("messaging error: {0}")]
    Messaging(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Transient failures are I/O-ish errors a user can retry later.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Store(_) | Error::Provider(_) | Error::Messaging(_) | Error::Io(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Cross-messenger abstractions (Telegram today, other chat transports later).

pub mod port;
pub mod throttled;
pub mod types;

//! Core domain + application logic for the news digest bot.
//!
//! This crate is intentionally framework-agnostic. Telegram, the document store and the
//! news provider live behind ports (traits) implemented in adapter crates.

pub mod aggregator;
pub mod audit;
pub mod commands;
pub mod config;
pub mod digest;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod news;
pub mod preferences;
pub mod scheduler;
pub mod store;
pub mod subscription;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};

use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";
pub const DEFAULT_PAGE_SIZE: u32 = 5;
pub const DEFAULT_GROUP_SIZE: usize = 3;

/// Typed configuration for the bot process.
///
/// Four credentials are required; everything else has a default.
#[derive(Clone, Debug)]
pub struct Config {
    // Required
    pub port: u16,
    pub database_url: String,
    pub news_api_token: String,
    pub telegram_token: String,

    // News provider
    pub news_api_base_url: String,
    pub news_language: String,
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    pub default_page_size: u32,

    // Digest delivery
    pub digest_interval: Duration,
    pub digest_on_startup: bool,
    pub digest_group_size: usize,

    // Telegram limits
    pub telegram_safe_limit: usize,
    pub throttle_global: Duration,
    pub throttle_per_chat: Duration,
}

impl Config {
    /// Load from the process environment, reading `.env` first if it exists.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production, a map in tests).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let port_raw = required(&get, "PORT")?;
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|_| {
                Error::Config(format!("PORT must be a valid port number, got {port_raw}"))
            })?;
        let database_url = required(&get, "DATABASE_URL")?;
        let news_api_token = required(&get, "NEWS_API_TOKEN")?;
        let telegram_token = required(&get, "TELEGRAM_TOKEN")?;

        let news_api_base_url = get("NEWS_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_NEWS_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let news_language = get("NEWS_LANGUAGE").unwrap_or_else(|| "en".to_string());
        let fetch_timeout =
            Duration::from_millis(parse_u64(get("FETCH_TIMEOUT_MS")).unwrap_or(10_000));
        let fetch_concurrency = parse_usize(get("FETCH_CONCURRENCY")).unwrap_or(4).max(1);
        let default_page_size = parse_u64(get("DEFAULT_PAGE_SIZE"))
            .map(|v| v.clamp(1, 100) as u32)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        let digest_interval =
            Duration::from_secs(parse_u64(get("DIGEST_INTERVAL_SECS")).unwrap_or(3600).max(1));
        let digest_on_startup = parse_bool(get("DIGEST_ON_STARTUP")).unwrap_or(false);
        let digest_group_size = parse_usize(get("DIGEST_GROUP_SIZE"))
            .unwrap_or(DEFAULT_GROUP_SIZE)
            .max(1);

        let telegram_safe_limit = parse_usize(get("TELEGRAM_SAFE_LIMIT")).unwrap_or(4000).max(200);
        let throttle_global =
            Duration::from_millis(parse_u64(get("THROTTLE_GLOBAL_MS")).unwrap_or(40));
        let throttle_per_chat =
            Duration::from_millis(parse_u64(get("THROTTLE_PER_CHAT_MS")).unwrap_or(1050));

        Ok(Self {
            port,
            database_url,
            news_api_token,
            telegram_token,
            news_api_base_url,
            news_language,
            fetch_timeout,
            fetch_concurrency,
            default_page_size,
            digest_interval,
            digest_on_startup,
            digest_group_size,
            telegram_safe_limit,
            throttle_global,
            throttle_per_chat,
        })
    }
}

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).ok_or_else(|| Error::Config(format!("{key} environment variable is required")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_usize(v: Option<String>) -> Option<usize> {
    v.and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

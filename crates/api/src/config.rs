//! Listener and HTTP settings for the API binary.
//!
//! Provider and reporting credentials live in `zoneguard-provider`; this
//! module only covers the HTTP surface.

use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// From comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// Covers a whole sync or verify run, including its provider fan-out.
    pub request_timeout_secs: u64,
    /// Grace period for in-flight requests once shutdown starts.
    pub shutdown_timeout_secs: u64,
    /// `LOG_FORMAT=json`.
    pub log_json: bool,
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `CORS_ORIGINS`, `REQUEST_TIMEOUT_SECS`,
    /// `SHUTDOWN_TIMEOUT_SECS` and `LOG_FORMAT`.
    ///
    /// Panics on a malformed number; this only runs at startup.
    pub fn from_env() -> Self {
        let cors_origins = std::env::var("CORS_ORIGINS")
            .map(|raw| split_origins(&raw))
            .unwrap_or_else(|_| vec!["http://localhost:5173".to_string()]);

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env_parsed("PORT", 3000),
            cors_origins,
            request_timeout_secs: env_parsed("REQUEST_TIMEOUT_SECS", 60),
            shutdown_timeout_secs: env_parsed("SHUTDOWN_TIMEOUT_SECS", 10),
            log_json: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        }
    }
}

fn env_parsed<T>(name: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{name} is not valid ({raw:?}): {e}")),
        Err(_) => default,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origins_are_trimmed_and_blanks_dropped() {
        assert_eq!(
            split_origins(" http://a.test , ,http://b.test,"),
            vec!["http://a.test", "http://b.test"]
        );
        assert!(split_origins("").is_empty());
    }
}

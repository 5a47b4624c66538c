//! Configuration Module
//!
//! Handles loading server and cache configuration from environment variables.

use std::env;

use crate::cache::{Dataset, TtlPolicy};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Freshness windows for each dataset
    pub ttl: TtlPolicy,
}

/// Environment variables that override a dataset's TTL.
const TTL_OVERRIDES: [(&str, Dataset); 5] = [
    ("TTL_STUDENTS_MS", Dataset::Students),
    ("TTL_TRANSACTIONS_MS", Dataset::Transactions),
    ("TTL_RECITALS_MS", Dataset::Recitals),
    ("TTL_SHEET_MUSIC_MS", Dataset::SheetMusic),
    ("TTL_TEMPLATES_MS", Dataset::Templates),
];

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `TTL_STUDENTS_MS`, `TTL_TRANSACTIONS_MS`, `TTL_RECITALS_MS`,
    ///   `TTL_SHEET_MUSIC_MS`, `TTL_TEMPLATES_MS` - per-dataset TTL overrides
    ///   in milliseconds (default: the dataset's conventional TTL)
    pub fn from_env() -> Self {
        let ttl = TTL_OVERRIDES
            .iter()
            .fold(TtlPolicy::new(), |policy, (var, dataset)| {
                match parse_var(var) {
                    Some(ttl_ms) => policy.with_override(*dataset, ttl_ms),
                    None => policy,
                }
            });

        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(3000),
            ttl,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            ttl: TtlPolicy::default(),
        }
    }
}

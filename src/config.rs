//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;

use crate::cache::{CacheOptions, DEFAULT_SWEEP_INTERVAL_MS};

/// Default byte capacity: 128 MiB.
pub const DEFAULT_CAPACITY_BYTES: u64 = 128 * 1024 * 1024;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,
    /// Line-protocol server port
    pub resp_port: u16,
    /// Cache byte capacity
    pub capacity_bytes: u64,
    /// Background sweep interval in milliseconds
    pub sweep_interval_ms: u64,
    /// Whether TinyLFU admission is enabled
    pub enable_tiny_lfu: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PORT` - HTTP server port (default: 8080)
    /// - `RESP_PORT` - line-protocol server port (default: 6380)
    /// - `CAPACITY_BYTES` - cache byte capacity (default: 134217728)
    /// - `SWEEP_INTERVAL_MS` - expiry sweep period (default: 100)
    /// - `ENABLE_TINYLFU` - admission control on/off (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            http_port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_port),
            resp_port: env::var("RESP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.resp_port),
            capacity_bytes: env::var("CAPACITY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.capacity_bytes),
            sweep_interval_ms: env::var("SWEEP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval_ms),
            enable_tiny_lfu: env::var("ENABLE_TINYLFU")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.enable_tiny_lfu),
        }
    }

    /// Engine options derived from this configuration.
    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions::new(self.capacity_bytes)
            .with_sweep_interval_ms(self.sweep_interval_ms)
            .with_tiny_lfu(self.enable_tiny_lfu)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 8080,
            resp_port: 6380,
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            enable_tiny_lfu: true,
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

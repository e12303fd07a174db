//! Configuration for delivery and for the bundled server.
//!
//! `DeliveryConfig` controls compression levels and the read size of the streaming
//! pipeline. Defaults mirror zlib's and brotli's own defaults, so output matches what
//! standard tooling produces. `ServerConfig` is read from the process environment.
//!
//! # Example
//! ```rust
//! use zipsend::config::DeliveryBuilder;
//!
//! let delivery = DeliveryBuilder::new()
//!     .gzip_level(9)
//!     .brotli_level(5)
//!     .chunk_size(16 * 1024)
//!     .build();
//! ```

use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::delivery::Delivery;

/// Default read size of the file stream, in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Configuration for both delivery strategies.
#[derive(Clone, Debug)]
pub struct DeliveryConfig {
    /// Compression level for Gzip (0-9).
    pub gzip_level: u32,
    /// Compression level for Deflate (0-9).
    pub deflate_level: u32,
    /// Brotli quality (0-11).
    pub brotli_level: u32,
    /// Brotli window size as a power of two (10-24).
    pub brotli_window: u32,
    /// How many bytes the streaming strategy reads from the file at a time.
    pub chunk_size: usize,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            gzip_level: 6,
            deflate_level: 6,
            brotli_level: 11,
            brotli_window: 22,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Builder for configuring and creating a [`Delivery`].
pub struct DeliveryBuilder(DeliveryConfig);

impl DeliveryBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        Self(DeliveryConfig::default())
    }

    /// Sets the compression level for Gzip.
    pub fn gzip_level(mut self, lvl: u32) -> Self {
        self.0.gzip_level = lvl.min(9);
        self
    }

    /// Sets the compression level for Deflate.
    pub fn deflate_level(mut self, lvl: u32) -> Self {
        self.0.deflate_level = lvl.min(9);
        self
    }

    /// Sets the Brotli quality.
    pub fn brotli_level(mut self, lvl: u32) -> Self {
        self.0.brotli_level = lvl.min(11);
        self
    }

    /// Sets the Brotli window size.
    pub fn brotli_window(mut self, lgwin: u32) -> Self {
        self.0.brotli_window = lgwin.clamp(10, 24);
        self
    }

    /// Sets the read size of the streaming file reader. Zero is bumped to one byte.
    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.0.chunk_size = bytes.max(1);
        self
    }

    /// Returns the configuration without wrapping it.
    pub fn config(self) -> DeliveryConfig {
        self.0
    }

    pub fn build(self) -> Delivery {
        Delivery::new(self.0)
    }
}

impl Default for DeliveryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings of the bundled HTTP server, read from `PORT`, `HOST`, `ROOT` and `LOG_LEVEL`.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    /// Directory requested file names are resolved against.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_port() -> u16 {
    5700
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ServerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        envy::from_env::<ServerConfig>().context("invalid server configuration in environment")
    }

    /// Reads the configuration from an explicit set of variables.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, ServerConfig>(vars).context("invalid server configuration")
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }

    /// Parsed log level; unknown values fall back to `INFO`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(&self.log_level).unwrap_or(LevelFilter::INFO)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            root: default_root(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn builder_clamps_levels() {
        let cfg = DeliveryBuilder::new()
            .gzip_level(42)
            .deflate_level(10)
            .brotli_level(99)
            .brotli_window(3)
            .chunk_size(0)
            .config();
        assert_eq!(cfg.gzip_level, 9);
        assert_eq!(cfg.deflate_level, 9);
        assert_eq!(cfg.brotli_level, 11);
        assert_eq!(cfg.brotli_window, 10);
        assert_eq!(cfg.chunk_size, 1);
    }

    #[test]
    fn server_config_defaults_to_port_5700() {
        let cfg = ServerConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(cfg.port, 5700);
        assert_eq!(cfg.addr().unwrap().to_string(), "127.0.0.1:5700");
        assert_eq!(cfg.level_filter(), LevelFilter::INFO);
    }

    #[test]
    fn server_config_reads_variables() {
        let cfg = ServerConfig::from_vars(vars(&[
            ("PORT", "8081"),
            ("HOST", "0.0.0.0"),
            ("ROOT", "/srv/files"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.root, PathBuf::from("/srv/files"));
        assert_eq!(cfg.level_filter(), LevelFilter::DEBUG);
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(ServerConfig::from_vars(vars(&[("PORT", "not-a-port")])).is_err());
    }
}

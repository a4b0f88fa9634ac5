//! Server configuration loaded from the environment
//!
//! Environment variables:
//! - `PORT` - HTTP server port (default: 8080)
//! - `ABILITY_FIXTURES` - JSON fixtures file (default: built-in seed)
//! - `RUST_LOG` - Log level (default: info), read by the subscriber

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 8080;

/// Demo server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP server port
    pub port: u16,

    /// Fixtures file with users and resources
    pub fixtures: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            fixtures: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; invalid values fall back to
    /// defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("Invalid PORT `{}`, using {}", raw, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let fixtures = lookup("ABILITY_FIXTURES")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Self { port, fixtures }
    }

    /// Address to listen on
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

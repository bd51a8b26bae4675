use crate::provider::DEFAULT_API_URL;
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub host: String,
    pub port: u16,

    // Translation provider
    pub translate_api_url: String,
    pub translate_timeout: Duration,

    // Static page served at "/"
    pub index_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: match std::env::var("PORT") {
                Ok(port) => port
                    .parse()
                    .with_context(|| format!("PORT must be a port number, got '{}'", port))?,
                Err(_) => 8000,
            },

            translate_api_url: std::env::var("TRANSLATE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            translate_timeout: Duration::from_secs(
                std::env::var("TRANSLATE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),

            index_path: std::env::var("INDEX_PATH").unwrap_or_else(|_| "index.html".to_string()),
        })
    }

    pub fn bind_address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, port: u16) -> Config {
        Config {
            host: host.to_string(),
            port,
            translate_api_url: DEFAULT_API_URL.to_string(),
            translate_timeout: Duration::from_secs(10),
            index_path: "index.html".to_string(),
        }
    }

    #[test]
    fn test_bind_address() {
        let addr = config("127.0.0.1", 8000).bind_address().unwrap();
        assert_eq!(addr.port(), 8000);
        assert!(addr.ip().is_loopback());
    }

    #[test]
    fn test_bind_address_invalid_host() {
        let err = config("not a host", 8000).bind_address().unwrap_err();
        assert!(err.to_string().contains("Invalid bind address"));
    }
}

//! Server configuration module
//!
//! Handles loading configuration from environment variables with sensible
//! defaults. The relying-party identity and the challenge TTL are supplied
//! here, never re-derived by the ceremony engine.

use std::net::SocketAddr;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port (default: 3030)
    pub port: u16,
    /// Server host (default: 127.0.0.1)
    pub host: [u8; 4],
    /// Relying party display name
    pub rp_name: String,
    /// Relying party id (a domain name)
    pub rp_id: String,
    /// Relying party origin (full origin URL the browser reports)
    pub rp_origin: String,
    /// Challenge validity window in seconds (default: 300)
    pub challenge_ttl_secs: u64,
    /// Accept authenticators that always report a zero counter
    pub accept_counterless: bool,
    /// Allowed CORS origins; None = allow all (dev mode)
    pub allowed_origins: Option<Vec<String>>,
    /// Request body limit in KB (default: 256 - ceremony payloads are small)
    pub body_limit_kb: usize,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Enable rate limiting (default: false for tests, true when loaded from env)
    pub rate_limit_enabled: bool,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u64,
    /// Rate limit: burst size (default: 20)
    pub rate_limit_burst: u32,
    /// PostgreSQL URL; unset = in-memory credential storage
    pub database_url: Option<String>,
    /// HMAC secret for the bridge token carrying the customer id
    pub bridge_token_secret: String,
    /// Storefront login-token configuration
    pub storefront: StorefrontConfig,
}

/// Commerce-platform settings needed to mint the customer login token.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the storefront the login redirect points at
    pub store_url: String,
    /// Platform store hash
    pub store_hash: String,
    /// API client id (login token issuer)
    pub client_id: String,
    /// API client secret (login token signing key)
    pub client_secret: String,
    /// Sales channel id (default: 1)
    pub channel_id: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3030,
            host: [127, 0, 0, 1],
            rp_name: "Keybridge Demo Store".to_string(),
            rp_id: "localhost".to_string(),
            rp_origin: "http://localhost:3000".to_string(),
            challenge_ttl_secs: 300,
            accept_counterless: true,
            allowed_origins: None, // None = allow all (dev mode)
            body_limit_kb: 256,
            timeout_secs: 30,
            rate_limit_enabled: false, // Disabled by default (for tests)
            rate_limit_per_sec: 10,
            rate_limit_burst: 20,
            database_url: None,
            bridge_token_secret: "dev-secret-change-me".to_string(),
            storefront: StorefrontConfig {
                store_url: "https://store.example.com".to_string(),
                store_hash: "hash000".to_string(),
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                channel_id: 1,
            },
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_parse("PORT", defaults.port);
        let host = std::env::var("HOST")
            .ok()
            .map(|h| if h == "0.0.0.0" { [0, 0, 0, 0] } else { [127, 0, 0, 1] })
            .unwrap_or(defaults.host);

        let rp_name = env_or("RP_NAME", &defaults.rp_name);
        let rp_id = env_or("RP_ID", &defaults.rp_id);
        let rp_origin = env_or("RP_ORIGIN", &defaults.rp_origin);

        // Default CORS to the storefront origin; ALLOWED_ORIGINS widens it.
        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .or_else(|| Some(vec![rp_origin.clone()]));

        let rate_limit_enabled = std::env::var("RATE_LIMIT_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);

        Self {
            port,
            host,
            rp_name,
            rp_id,
            rp_origin,
            challenge_ttl_secs: env_parse("CHALLENGE_TTL_SECS", defaults.challenge_ttl_secs),
            accept_counterless: std::env::var("ACCEPT_COUNTERLESS")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(defaults.accept_counterless),
            allowed_origins,
            body_limit_kb: env_parse("BODY_LIMIT_KB", defaults.body_limit_kb),
            timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", defaults.timeout_secs),
            rate_limit_enabled,
            rate_limit_per_sec: env_parse("RATE_LIMIT_PER_SEC", defaults.rate_limit_per_sec),
            rate_limit_burst: env_parse("RATE_LIMIT_BURST", defaults.rate_limit_burst),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            bridge_token_secret: env_or("BRIDGE_TOKEN_SECRET", &defaults.bridge_token_secret),
            storefront: StorefrontConfig {
                store_url: env_or("STORE_URL", &defaults.storefront.store_url),
                store_hash: env_or("STORE_HASH", &defaults.storefront.store_hash),
                client_id: env_or("STORE_CLIENT_ID", &defaults.storefront.client_id),
                client_secret: env_or("STORE_CLIENT_SECRET", &defaults.storefront.client_secret),
                channel_id: env_parse("STORE_CHANNEL_ID", defaults.storefront.channel_id),
            },
        }
    }

    /// Get socket address from config
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_test_friendly() {
        let config = Config::default();
        assert_eq!(config.port, 3030);
        assert!(!config.rate_limit_enabled);
        assert!(config.database_url.is_none());
        assert_eq!(config.challenge_ttl_secs, 300);
        assert!(config.accept_counterless);
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = Config::default();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3030");
    }
}

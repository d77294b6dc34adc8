//! Configuration for the proxy pool and the relay server.

use crate::error::{RelayError, Result};

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Target fetched through each proxy during a health sweep.
pub const DEFAULT_PROBE_URL: &str = "https://www.google.com";
/// Endpoint that search queries are relayed to.
pub const DEFAULT_SEARCH_URL: &str = "https://www.google.com/search";

/// Configuration for the proxy pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// URL fetched through each proxy to decide liveness.
    pub probe_url: String,
    /// Upper bound for a single probe.
    pub probe_timeout: Duration,
    /// Period between health sweeps.
    pub sweep_interval: Duration,
    /// Base URL that search queries are appended to as `?q=`.
    pub search_url: String,
    /// Upper bound for a single relayed search.
    pub search_timeout: Duration,
}

impl PoolConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PoolConfigBuilder {
        PoolConfigBuilder::new()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfigBuilder::new().build()
    }
}

/// Builder for `PoolConfig`.
pub struct PoolConfigBuilder {
    probe_url: Option<String>,
    probe_timeout: Option<Duration>,
    sweep_interval: Option<Duration>,
    search_url: Option<String>,
    search_timeout: Option<Duration>,
}

impl PoolConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            probe_url: None,
            probe_timeout: None,
            sweep_interval: None,
            search_url: None,
            search_timeout: None,
        }
    }

    /// Set the URL used for health probes.
    pub fn probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = Some(url.into());
        self
    }

    /// Set the timeout for a single health probe.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Set the interval between health sweeps.
    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Set the search endpoint queries are relayed to.
    pub fn search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = Some(url.into());
        self
    }

    /// Set the timeout for a single relayed search.
    pub fn search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = Some(timeout);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PoolConfig {
        PoolConfig {
            probe_url: self.probe_url.unwrap_or_else(|| DEFAULT_PROBE_URL.to_string()),
            probe_timeout: self.probe_timeout.unwrap_or(Duration::from_millis(5000)),
            sweep_interval: self.sweep_interval.unwrap_or(Duration::from_secs(300)),
            search_url: self.search_url.unwrap_or_else(|| DEFAULT_SEARCH_URL.to_string()),
            search_timeout: self.search_timeout.unwrap_or(Duration::from_millis(7000)),
        }
    }
}

impl Default for PoolConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Settings owned by the HTTP front door, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (`HOST`, default `0.0.0.0`).
    pub host: String,
    /// Port to listen on (`PORT`, default 3000).
    pub port: u16,
    /// Credential for the admin view (`ADMIN_PASSWORD`). Admin is closed when unset.
    pub admin_password: Option<String>,
    /// Newline-delimited proxy list (`PROXY_LIST`, default `proxies.txt`).
    pub proxy_list: PathBuf,
    /// Directory served for unmatched paths (`STATIC_DIR`, default `public`).
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to let a `.env` file fill in variables
    /// the process environment does not set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from the variables of a `.env`-format file only.
    pub fn from_dotenv_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let vars = dotenvy::from_path_iter(path)
            .and_then(|iter| iter.collect::<std::result::Result<HashMap<_, _>, _>>())
            .map_err(|e| RelayError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        Ok(ServerConfig {
            host: get_or("HOST", "0.0.0.0"),
            port: get_or("PORT", "3000").parse().map_err(|_| {
                RelayError::Config("PORT must be a valid port number".into())
            })?,
            admin_password: lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty()),
            proxy_list: PathBuf::from(get_or("PROXY_LIST", "proxies.txt")),
            static_dir: PathBuf::from(get_or("STATIC_DIR", "public")),
        })
    }

    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = PoolConfig::builder().build();
        assert_eq!(config.probe_url, DEFAULT_PROBE_URL);
        assert_eq!(config.probe_timeout, Duration::from_millis(5000));
        assert_eq!(config.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
        assert_eq!(config.search_timeout, Duration::from_millis(7000));
    }

    #[test]
    fn test_builder_overrides() {
        let config = PoolConfig::builder()
            .probe_url("http://probe.test")
            .probe_timeout(Duration::from_secs(1))
            .sweep_interval(Duration::from_secs(10))
            .search_timeout(Duration::from_secs(2))
            .build();
        assert_eq!(config.probe_url, "http://probe.test");
        assert_eq!(config.probe_timeout, Duration::from_secs(1));
        assert_eq!(config.sweep_interval, Duration::from_secs(10));
        assert_eq!(config.search_timeout, Duration::from_secs(2));
        assert_eq!(config.search_url, DEFAULT_SEARCH_URL);
    }

    #[test]
    fn test_dotenv_file_feeds_server_config() {
        let path = env::temp_dir().join(format!("search-relay-{}.env", std::process::id()));
        std::fs::write(&path, "PORT=8181\nADMIN_PASSWORD=s3cret\n# comment\nPROXY_LIST=list.txt\n")
            .unwrap();

        let config = ServerConfig::from_dotenv_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.port, 8181);
        assert_eq!(config.admin_password.as_deref(), Some("s3cret"));
        assert_eq!(config.proxy_list, PathBuf::from("list.txt"));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.static_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_dotenv_file_bad_port() {
        let path = env::temp_dir().join(format!("search-relay-bad-{}.env", std::process::id()));
        std::fs::write(&path, "PORT=not-a-port\n").unwrap();

        let result = ServerConfig::from_dotenv_file(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(result, Err(RelayError::Config(_))));
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            admin_password: None,
            proxy_list: PathBuf::from("proxies.txt"),
            static_dir: PathBuf::from("public"),
        };
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }
}

//! Configuration Module
//!
//! Handles loading cache and admin-server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::namespace::Namespace;
use crate::tasks::DEFAULT_CLEANUP_INTERVAL;

/// Per-namespace store settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamespaceConfig {
    /// Maximum number of entries before eviction kicks in
    pub capacity: usize,
    /// TTL applied when callers omit one
    pub default_ttl_minutes: u64,
    /// Whether entries are mirrored to the durable medium
    pub persistent: bool,
}

impl NamespaceConfig {
    pub const fn new(capacity: usize, default_ttl_minutes: u64, persistent: bool) -> Self {
        Self {
            capacity,
            default_ttl_minutes,
            persistent,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_minutes.saturating_mul(60))
    }

    /// Defaults chosen by how quickly each kind of data goes stale.
    pub fn default_for(namespace: Namespace) -> Self {
        match namespace {
            Namespace::Sales => Self::new(500, 5, true),
            Namespace::Finances => Self::new(200, 15, true),
            Namespace::Rolls => Self::new(100, 10, false),
            Namespace::UserProfile => Self::new(50, 60, true),
            Namespace::Dashboard => Self::new(50, 2, false),
        }
    }

    /// Reads `CACHE_{NS}_CAPACITY`, `CACHE_{NS}_TTL_MINUTES` and
    /// `CACHE_{NS}_PERSISTENT`, falling back to the defaults.
    fn from_env(namespace: Namespace) -> Self {
        let defaults = Self::default_for(namespace);
        let var = |field: &str| format!("CACHE_{}_{}", namespace.env_key(), field);

        let capacity = env_or(&var("CAPACITY"), defaults.capacity);
        Self {
            capacity: if capacity == 0 { defaults.capacity } else { capacity },
            default_ttl_minutes: env_or(&var("TTL_MINUTES"), defaults.default_ttl_minutes),
            persistent: env_or(&var("PERSISTENT"), defaults.persistent),
        }
    }
}

/// Process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Admin HTTP server port
    pub server_port: u16,
    /// Seconds between expired-entry sweeps
    pub cleanup_interval: u64,
    /// Directory backing persistent namespaces
    pub cache_dir: PathBuf,
    pub sales: NamespaceConfig,
    pub finances: NamespaceConfig,
    pub rolls: NamespaceConfig,
    pub user_profile: NamespaceConfig,
    pub dashboard: NamespaceConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - Admin HTTP port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Sweep frequency in seconds (default: 300)
    /// - `CACHE_DIR` - Persistence directory (default: `.lotto-cache`)
    /// - `CACHE_{NS}_CAPACITY`, `CACHE_{NS}_TTL_MINUTES`, `CACHE_{NS}_PERSISTENT` -
    ///   per-namespace overrides, `{NS}` one of `SALES`, `FINANCES`, `ROLLS`,
    ///   `USER_PROFILE`, `DASHBOARD`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            cache_dir: env::var("CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            sales: NamespaceConfig::from_env(Namespace::Sales),
            finances: NamespaceConfig::from_env(Namespace::Finances),
            rolls: NamespaceConfig::from_env(Namespace::Rolls),
            user_profile: NamespaceConfig::from_env(Namespace::UserProfile),
            dashboard: NamespaceConfig::from_env(Namespace::Dashboard),
        }
    }

    pub fn namespace(&self, namespace: Namespace) -> NamespaceConfig {
        match namespace {
            Namespace::Sales => self.sales,
            Namespace::Finances => self.finances,
            Namespace::Rolls => self.rolls,
            Namespace::UserProfile => self.user_profile,
            Namespace::Dashboard => self.dashboard,
        }
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL.as_secs(),
            cache_dir: PathBuf::from(".lotto-cache"),
            sales: NamespaceConfig::default_for(Namespace::Sales),
            finances: NamespaceConfig::default_for(Namespace::Finances),
            rolls: NamespaceConfig::default_for(Namespace::Rolls),
            user_profile: NamespaceConfig::default_for(Namespace::UserProfile),
            dashboard: NamespaceConfig::default_for(Namespace::Dashboard),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

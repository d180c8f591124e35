use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for membank
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Storage locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Search behavior
    #[serde(default)]
    pub search: SearchConfig,
    /// Expiry and staleness behavior
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base directory for memory files and the index document
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".membank"))
        .unwrap_or_else(|| PathBuf::from(".membank"))
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Default number of results returned by a search
    #[serde(default = "default_limit")]
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    10
}

/// Lifecycle configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LifecycleConfig {
    /// Days without an update after which a memory with no TTL counts as stale
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: i64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            stale_after_days: default_stale_after_days(),
        }
    }
}

fn default_stale_after_days() -> i64 {
    90
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.lifecycle.stale_after_days, 90);
        assert!(config.storage.data_dir.ends_with(".membank"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
[storage]
data_dir = "/tmp/membank"

[search]
default_limit = 25

[lifecycle]
stale_after_days = 30
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse TOML");

        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/membank"));
        assert_eq!(config.search.default_limit, 25);
        assert_eq!(config.lifecycle.stale_after_days, 30);
    }

    #[test]
    fn test_toml_partial_deserialization() {
        // Missing sections fall back to their defaults
        let toml_str = r#"
[search]
default_limit = 5
"#;

        let config: Config = toml::from_str(toml_str).expect("Failed to parse partial TOML");

        assert_eq!(config.search.default_limit, 5);
        assert_eq!(config.lifecycle.stale_after_days, 90);
        assert!(config.storage.data_dir.ends_with(".membank"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").expect("Failed to parse empty TOML");
        assert_eq!(config.search.default_limit, 10);
        assert_eq!(config.lifecycle.stale_after_days, 90);
    }
}

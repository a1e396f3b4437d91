// Configuration module

mod credentials;
mod models;

pub use credentials::StoreCredentials;
pub use models::*;

use crate::error::{GatewayError, Result};
use config::{Config, Environment, File};
use std::path::{Path, PathBuf};

impl AppConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest), prefix `OAG_`, nested keys joined by `__`
    /// 2. Config file (`explicit` if given, otherwise `~/.oag/config.toml` when present)
    /// 3. Defaults (lowest)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => File::from(path).required(true),
            None => File::with_name(&Self::default_config_path()).required(false),
        };

        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                Environment::with_prefix("OAG")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings under which the gateway cannot behave sensibly.
    pub fn validate(&self) -> Result<()> {
        if self.promotion.forest_point_threshold == 0 || self.promotion.html_threshold == 0 {
            return Err(GatewayError::Config(
                "promotion thresholds must be at least 1".to_string(),
            ));
        }

        if self.upstream.timeout_seconds == 0 || self.store.connect_timeout_seconds == 0 {
            return Err(GatewayError::Config("timeouts must be non-zero".to_string()));
        }

        let mut names: Vec<&str> = self
            .upstream
            .html_sources
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        names.sort_unstable();
        if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(GatewayError::Config(format!(
                "duplicate html source name: {}",
                dup[0]
            )));
        }

        Ok(())
    }

    fn default_config_path() -> String {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".oag")
            .join("config.toml")
            .to_string_lossy()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.promotion.forest_point_threshold, 5);
        assert_eq!(config.promotion.html_threshold, 30);
        assert_eq!(config.upstream.html_sources.len(), 2);
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let mut config = AppConfig::default();
        config.promotion.html_threshold = 0;
        assert!(matches!(config.validate(), Err(GatewayError::Config(_))));
    }

    #[test]
    fn test_duplicate_sources_rejected() {
        let mut config = AppConfig::default();
        let first = config.upstream.html_sources[0].clone();
        config.upstream.html_sources.push(first);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 6001\n\n[promotion]\nforest_point_threshold = 2\n"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 6001);
        assert_eq!(config.promotion.forest_point_threshold, 2);
        // untouched sections keep their defaults
        assert_eq!(config.promotion.html_threshold, 30);
        assert_eq!(config.store.collection, "data");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/oag.toml")));
        assert!(result.is_err());
    }
}

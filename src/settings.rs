use std::time::Duration;

use config::{Config, Environment};
use serde::Deserialize;

/// Runtime knobs for the binary, read from `CARRIER_*` environment
/// variables (e.g. `CARRIER_TIMEOUT_SECS=10`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Scrape carriers concurrently.
    #[serde(default)]
    pub parallel: bool,
}

fn default_user_agent() -> String {
    format!("carrier_scraper/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            parallel: false,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_config(
            Config::builder()
                .add_source(Environment::with_prefix("CARRIER").try_parsing(true))
                .build()?,
        )
    }

    pub fn from_config(config: Config) -> Result<Self, config::ConfigError> {
        config.try_deserialize()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_keys() {
        let settings = Settings::from_config(Config::builder().build().unwrap()).unwrap();
        assert_eq!(settings.timeout_secs, 30);
        assert!(!settings.parallel);
        assert!(settings.user_agent.starts_with("carrier_scraper/"));
    }

    #[test]
    fn overrides_apply() {
        let config = Config::builder()
            .set_override("timeout_secs", 5)
            .unwrap()
            .set_override("parallel", true)
            .unwrap()
            .build()
            .unwrap();
        let settings = Settings::from_config(config).unwrap();
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert!(settings.parallel);
    }
}

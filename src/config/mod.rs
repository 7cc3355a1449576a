mod schema;

pub use schema::*;

use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Longest retention accepted, in days
pub const MAX_RETENTION_DAYS: u32 = 36_500;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Reject registries the monitor cannot key unambiguously
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.monitor.check_interval_ms == 0 {
        return Err(ConfigError::Invalid("check_interval_ms must be positive".into()));
    }
    if config.monitor.retention_days > MAX_RETENTION_DAYS {
        return Err(ConfigError::Invalid(format!(
            "retention_days must be at most {}",
            MAX_RETENTION_DAYS
        )));
    }

    let mut seen = HashSet::new();
    for component in &config.components {
        if !seen.insert(component.name.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate component name: {}",
                component.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_names_rejected() {
        let mut config = Config::default();
        config.components.push(config.components[0].clone());
        assert!(matches!(validate(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = Config::default();
        config.monitor.check_interval_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_retention_bounded() {
        let mut config = Config::default();
        config.monitor.retention_days = MAX_RETENTION_DAYS;
        assert!(validate(&config).is_ok());
        config.monitor.retention_days = 200_000_000;
        assert!(matches!(validate(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clusterwatch.toml");
        std::fs::write(
            &path,
            "[monitor]\nretention_days = 7\n\n[store]\npath = \"x.db\"\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.monitor.retention_days, 7);
        assert_eq!(config.store.path, "x.db");
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/clusterwatch.toml"),
            Err(ConfigError::IoError(_))
        ));
    }
}

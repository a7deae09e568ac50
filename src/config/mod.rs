pub mod loader;

pub use loader::ConfigLoader;

use crate::errors::ConfigError;
use crate::logging::{LogFormat, LoggingConfig};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::Level;

// Environment variable names
pub const ENV_MAX_DEPTH: &str = "KEYED_DI_MAX_DEPTH";
pub const ENV_LOG_LEVEL: &str = "KEYED_DI_LOG_LEVEL";

pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 64;

/// Container configuration
///
/// Only tunes how the container behaves; registrations are always made in code.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerConfig {
    /// Longest chain of nested transient constructions before resolution fails
    pub max_resolution_depth: usize,
    pub logging: LoggingSettings,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
            logging: LoggingSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: Level,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingSettings {
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.level,
            format: self.format,
            ..LoggingConfig::default()
        }
    }
}

/// Partial configuration as read from a TOML file
#[derive(Deserialize, Debug, Default)]
pub struct PartialContainerConfig {
    max_resolution_depth: Option<usize>,
    logging: Option<PartialLoggingSettings>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialLoggingSettings {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl ContainerConfig {
    /// Merge file values and environment overrides on top of the defaults
    pub fn from_partial_and_env(
        partial: PartialContainerConfig,
        env_map: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut config = ContainerConfig::default();

        if let Some(depth) = partial.max_resolution_depth {
            config.max_resolution_depth = depth;
        }
        if let Some(logging) = partial.logging {
            if let Some(level) = logging.level {
                config.logging.level = parse_level("logging.level", &level)?;
            }
            if let Some(format) = logging.format {
                config.logging.format = format;
            }
        }

        if let Some(depth) = env_map.get(ENV_MAX_DEPTH) {
            config.max_resolution_depth =
                depth.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    field: ENV_MAX_DEPTH.to_string(),
                    reason: format!("'{depth}' is not a positive integer"),
                })?;
        }
        if let Some(level) = env_map.get(ENV_LOG_LEVEL) {
            config.logging.level = parse_level(ENV_LOG_LEVEL, level)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_resolution_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_level(field: &str, value: &str) -> Result<Level, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        reason: format!("unknown log level '{value}'"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_overrides() {
        let config =
            ContainerConfig::from_partial_and_env(PartialContainerConfig::default(), HashMap::new())
                .unwrap();
        assert_eq!(config, ContainerConfig::default());
        assert_eq!(config.max_resolution_depth, DEFAULT_MAX_RESOLUTION_DEPTH);
    }

    #[test]
    fn test_env_overrides_file() {
        let partial: PartialContainerConfig = toml::from_str(
            r#"
            max_resolution_depth = 8

            [logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();
        let env_map = HashMap::from([
            (ENV_MAX_DEPTH.to_string(), "16".to_string()),
            (ENV_LOG_LEVEL.to_string(), "warn".to_string()),
        ]);

        let config = ContainerConfig::from_partial_and_env(partial, env_map).unwrap();
        assert_eq!(config.max_resolution_depth, 16);
        assert_eq!(config.logging.level, Level::WARN);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let env_map = HashMap::from([(ENV_MAX_DEPTH.to_string(), "lots".to_string())]);
        let result =
            ContainerConfig::from_partial_and_env(PartialContainerConfig::default(), env_map);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let partial: PartialContainerConfig = toml::from_str("max_resolution_depth = 0").unwrap();
        let result = ContainerConfig::from_partial_and_env(partial, HashMap::new());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));

        let partial: PartialContainerConfig =
            toml::from_str("[logging]\nlevel = \"loud\"").unwrap();
        let result = ContainerConfig::from_partial_and_env(partial, HashMap::new());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }
}

use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use super::{ContainerConfig, PartialContainerConfig, ENV_LOG_LEVEL, ENV_MAX_DEPTH};
use crate::errors::ConfigError;

/// Configuration loader responsible for loading config from a file and the environment
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_override: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Loader without a config file; defaults plus environment variables
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_override: None,
        }
    }

    /// Loader reading the given TOML file (a missing file means defaults)
    pub fn with_config_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(config_path.into()),
            env_override: None,
        }
    }

    /// Use the given variables instead of the process environment (for testing)
    pub fn with_env(mut self, env_map: HashMap<String, String>) -> Self {
        self.env_override = Some(env_map);
        self
    }

    /// Load complete container configuration
    pub fn load_config(&self) -> Result<ContainerConfig, ConfigError> {
        let partial_config = match &self.config_path {
            Some(path) => self.load_partial_config(path)?.unwrap_or_default(),
            None => PartialContainerConfig::default(),
        };

        let env_map = self.collect_env_vars();
        let config = ContainerConfig::from_partial_and_env(partial_config, env_map)?;

        tracing::debug!(
            path = ?self.config_path,
            max_resolution_depth = config.max_resolution_depth,
            "Container configuration loaded"
        );
        Ok(config)
    }

    /// Load partial config from file
    fn load_partial_config(&self, config_path: &Path) -> Result<Option<PartialContainerConfig>, ConfigError> {
        if !config_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::FileRead(config_path.to_string_lossy().to_string(), e)
        })?;

        let partial_config: PartialContainerConfig = toml::from_str(&content).map_err(|e| {
            ConfigError::TomlParse(config_path.to_string_lossy().to_string(), e)
        })?;

        Ok(Some(partial_config))
    }

    /// Collect relevant environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        if let Some(env_map) = &self.env_override {
            return env_map.clone();
        }

        let mut env_map = HashMap::new();
        for key in [ENV_MAX_DEPTH, ENV_LOG_LEVEL] {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

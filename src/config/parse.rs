use super::types::Config;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    let config: Config = serde_yaml::from_str(&yaml)?;
    validate_config(&config)?;
    Ok(config)
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.service.name.is_empty() {
        return Err(ConfigError::Validation(
            "service.name must not be empty".to_string(),
        ));
    }

    let threshold = config.extraction.confidence_threshold;
    if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::Validation(format!(
            "extraction.confidence_threshold must be in [0, 1], got {}",
            threshold
        )));
    }

    if config.logs.log_group.is_empty() {
        return Err(ConfigError::Validation(
            "logs.log_group must not be empty".to_string(),
        ));
    }
    if config.logs.log_stream.is_empty() {
        return Err(ConfigError::Validation(
            "logs.log_stream must not be empty".to_string(),
        ));
    }
    if config.logs.max_attempts == 0 {
        return Err(ConfigError::Validation(
            "logs.max_attempts must be at least 1".to_string(),
        ));
    }

    Ok(())
}

//! Analysis configuration types.

use std::time::Duration;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Configuration for a layer analysis run.
#[derive(Debug, Clone, PartialEq, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct AnalyzeConfig {
    /// Walk layers and build their records concurrently.
    #[builder(default = "true")]
    pub parallel_layers: bool,

    /// Threads used inside a single layer walk (0 or 1 = serial).
    #[builder(default = "0")]
    pub walk_threads: usize,

    /// Include hidden entries (names starting with `.`).
    #[builder(default = "true")]
    pub include_hidden: bool,

    /// Glob patterns matched against entry names; matches are not inventoried.
    #[builder(default)]
    pub exclude_patterns: Vec<String>,

    /// Deadline for the whole run; walks past it stop with partial results.
    #[builder(default)]
    #[serde(with = "timeout_secs")]
    pub timeout: Option<Duration>,
}

impl AnalyzeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(timeout)) = self.timeout {
            if timeout.is_zero() {
                return Err("Timeout must be greater than zero".to_string());
            }
        }
        Ok(())
    }
}

impl AnalyzeConfig {
    /// Create a new config builder.
    pub fn builder() -> AnalyzeConfigBuilder {
        AnalyzeConfigBuilder::default()
    }

    /// Re-check a config that was deserialized or mutated in place.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.timeout.is_some_and(|t| t.is_zero()) {
            return Err(AnalysisError::InvalidConfig {
                message: "Timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            parallel_layers: true,
            walk_threads: 0,
            include_hidden: true,
            exclude_patterns: Vec::new(),
            timeout: None,
        }
    }
}

/// Timeouts are written as fractional seconds in config files.
mod timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let secs = Option::<f64>::deserialize(deserializer)?;
        match secs {
            Some(s) if !s.is_finite() || s < 0.0 => Err(serde::de::Error::custom(format!(
                "invalid timeout: {s}"
            ))),
            Some(s) => Duration::try_from_secs_f64(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = AnalyzeConfig::builder()
            .walk_threads(4usize)
            .parallel_layers(false)
            .exclude_patterns(vec![".wh.*".to_string()])
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();

        assert_eq!(config.walk_threads, 4);
        assert!(!config.parallel_layers);
        assert_eq!(config.exclude_patterns.len(), 1);
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_config_builder_rejects_zero_timeout() {
        let result = AnalyzeConfig::builder().timeout(Duration::ZERO).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_default() {
        let config = AnalyzeConfig::default();
        assert!(config.parallel_layers);
        assert!(config.include_hidden);
        assert!(config.timeout.is_none());
        assert!(config.validate().is_ok());
        assert_eq!(AnalyzeConfig::builder().build().unwrap(), config);
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = AnalyzeConfig {
            timeout: Some(Duration::ZERO),
            ..AnalyzeConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }
}

use serde::{Deserialize, Serialize};

use crate::cash_flow::ModelAssumptions;
use crate::monte_carlo::MonteCarloConfig;
use crate::EngineResult;

/// Engine-wide settings. Every field has a default, so a partial document
/// only overrides what it names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub model: ModelAssumptions,
    pub monte_carlo: MonteCarloConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.model.validate()?;
        self.monte_carlo.validate()
    }

    /// Same settings with a fixed Monte Carlo seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.monte_carlo.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;

    #[test]
    fn test_empty_document_is_default() {
        let config = EngineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json_str(
            r#"{"model": {"monthly_growth_rate": 0.01}, "monte_carlo": {"seed": 7}}"#,
        )
        .unwrap();
        assert_eq!(config.model.monthly_growth_rate, 0.01);
        assert_eq!(config.model.margin_cap, 95.0);
        assert_eq!(config.monte_carlo.seed, Some(7));
        assert_eq!(config.monte_carlo.iterations, 2_000);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = EngineConfig::from_json_str(r#"{"model": {"margin_cap": 150}}"#).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let err = EngineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, EngineError::SerializationError(_)));
    }

    #[test]
    fn test_with_seed() {
        assert_eq!(EngineConfig::default().with_seed(3).monte_carlo.seed, Some(3));
    }
}

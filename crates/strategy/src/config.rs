use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use common::{Error, Result};

/// Top-level strategy config file (TOML).
///
/// Example `config/strategies.toml`:
/// ```toml
/// [[strategy]]
/// type = "trend"
/// name = "BTC SMA 240/480"
/// initial_cash = 1000.0
///
/// [strategy.params]
/// fast = 240
/// slow = 480
/// average = "sma"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyFileConfig {
    #[serde(rename = "strategy")]
    pub strategies: Vec<StrategyConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StrategyConfig {
    /// Strategy type identifier: "trend" or "crossing".
    #[serde(rename = "type")]
    pub strategy_type: String,
    /// Human-readable name shown in logs.
    pub name: String,
    /// Starting cash of this strategy's portfolio. Falls back to the
    /// process-wide `INITIAL_CASH` when absent.
    #[serde(default)]
    pub initial_cash: Option<f64>,
    /// Indicator-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

impl StrategyFileConfig {
    pub const DEFAULT_FAST: usize = 240;
    pub const DEFAULT_SLOW: usize = 480;

    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!("failed to read strategy config at '{path}': {e}"))
        })?;
        Self::parse(&content)
            .map_err(|e| Error::InvalidConfig(format!("strategy config at '{path}': {e}")))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cfg: Self =
            toml::from_str(content).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if cfg.strategies.is_empty() {
            return Err(Error::InvalidConfig(
                "no [[strategy]] entries configured".to_string(),
            ));
        }
        Ok(cfg)
    }

    /// The single SMA 240/480 trend strategy used when no file is given.
    pub fn single_trend() -> Self {
        let params = HashMap::from([
            ("fast".to_string(), toml::Value::Integer(Self::DEFAULT_FAST as i64)),
            ("slow".to_string(), toml::Value::Integer(Self::DEFAULT_SLOW as i64)),
        ]);
        Self {
            strategies: vec![StrategyConfig {
                strategy_type: "trend".to_string(),
                name: format!("SMA {}/{}", Self::DEFAULT_FAST, Self::DEFAULT_SLOW),
                initial_cash: None,
                params,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_strategies() {
        let cfg = StrategyFileConfig::parse(
            r#"
            [[strategy]]
            type = "trend"
            name = "slow trend"
            initial_cash = 500.0

            [strategy.params]
            fast = 20
            slow = 50

            [[strategy]]
            type = "crossing"
            name = "ema cross"

            [strategy.params]
            fast = 9
            slow = 21
            average = "ema"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.strategies.len(), 2);
        assert_eq!(cfg.strategies[0].initial_cash, Some(500.0));
        assert_eq!(cfg.strategies[1].strategy_type, "crossing");
        assert_eq!(
            cfg.strategies[1].params.get("average").and_then(|v| v.as_str()),
            Some("ema")
        );
    }

    #[test]
    fn empty_file_is_invalid() {
        assert!(matches!(
            StrategyFileConfig::parse(""),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn missing_file_is_invalid_config() {
        assert!(matches!(
            StrategyFileConfig::load("/no/such/strategies.toml"),
            Err(Error::InvalidConfig(_))
        ));
    }
}

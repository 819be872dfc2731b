use std::collections::HashMap;

use tracing::info;

use common::{Bar, Error, Result, Signal};
use paper::SimplePortfolio;

use crate::config::{StrategyConfig, StrategyFileConfig};
use crate::indicators::AverageKind;
use crate::{CrossingStrategy, Strategy, TrendStrategy};

/// Holds all active strategy instances and feeds every bar to each of them.
/// Each strategy trades its own portfolio.
pub struct StrategySet {
    strategies: Vec<Box<dyn Strategy>>,
    last_close: Option<f64>,
}

impl StrategySet {
    /// Build the set from config. Strategies without their own
    /// `initial_cash` start with `default_cash`.
    pub fn from_config(file_cfg: &StrategyFileConfig, default_cash: f64) -> Result<Self> {
        let mut strategies = Vec::with_capacity(file_cfg.strategies.len());
        for cfg in &file_cfg.strategies {
            let strategy = build_strategy(cfg, default_cash)?;
            info!(name = %strategy.name(), kind = %cfg.strategy_type, "Registered strategy");
            strategies.push(strategy);
        }
        Ok(Self::new(strategies))
    }

    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self {
            strategies,
            last_close: None,
        }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Process one bar. Returns the signals issued, tagged by strategy name.
    pub fn on_bar(&mut self, bar: &Bar) -> Vec<(String, Signal)> {
        if bar.close != 0.0 {
            self.last_close = Some(bar.close);
        }
        self.strategies
            .iter_mut()
            .filter_map(|s| s.on_bar(bar).map(|signal| (s.name().to_string(), signal)))
            .collect()
    }

    /// Portfolio value of every strategy, marked at the last non-zero close.
    pub fn valuations(&self) -> Vec<(String, f64)> {
        let price = self.last_close.unwrap_or(0.0);
        self.strategies
            .iter()
            .map(|s| (s.name().to_string(), s.portfolio().valuation(price)))
            .collect()
    }

    /// Log the final state of every portfolio.
    pub fn report(&self) {
        for (name, value) in self.valuations() {
            info!(strategy = %name, value = format_args!("{value:.4}"), "Portfolio value");
        }
    }
}

// ─── Strategy builders ────────────────────────────────────────────────────────

fn build_strategy(cfg: &StrategyConfig, default_cash: f64) -> Result<Box<dyn Strategy>> {
    let fast = param_usize(&cfg.params, "fast", StrategyFileConfig::DEFAULT_FAST)?;
    let slow = param_usize(&cfg.params, "slow", StrategyFileConfig::DEFAULT_SLOW)?;
    let average = match cfg.params.get("average").and_then(|v| v.as_str()) {
        Some(raw) => raw.parse::<AverageKind>().map_err(Error::InvalidConfig)?,
        None => AverageKind::default(),
    };
    let portfolio = SimplePortfolio::new(cfg.initial_cash.unwrap_or(default_cash))?;

    match cfg.strategy_type.as_str() {
        "trend" => Ok(Box::new(TrendStrategy::with_averages(
            cfg.name.clone(),
            average,
            fast,
            slow,
            portfolio,
        )?)),
        "crossing" => Ok(Box::new(CrossingStrategy::with_averages(
            cfg.name.clone(),
            average,
            fast,
            slow,
            portfolio,
        )?)),
        other => Err(Error::InvalidConfig(format!(
            "unknown strategy type '{other}' for '{}'",
            cfg.name
        ))),
    }
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> Result<usize> {
    match params.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_integer()
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .ok_or_else(|| {
                Error::InvalidConfig(format!(
                    "parameter '{key}' must be a positive integer, got {value}"
                ))
            }),
    }
}

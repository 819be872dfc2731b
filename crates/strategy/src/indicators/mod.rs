//! Streaming indicators.
//!
//! Every indicator absorbs one observation per `update` and exposes its
//! current value through `level`, which stays `None` until enough data has
//! been seen. The moving averages share the `Indicator` trait; `Rsi` reads a
//! bar's open and close and `Macd` reports a pair of lines, so both keep
//! their own `update`.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::Ema;
pub use macd::Macd;
pub use rsi::Rsi;
pub use sma::Sma;

use serde::{Deserialize, Serialize};

use common::Result;

pub trait Indicator: Send {
    /// Absorb one new observation.
    fn update(&mut self, value: f64);

    /// Current value, or `None` while the indicator is still warming up.
    fn level(&self) -> Option<f64>;

    /// Number of observations the indicator needs before it is defined.
    fn periods(&self) -> usize;

    fn name(&self) -> &'static str;
}

/// Moving average flavour selectable from strategy config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageKind {
    #[default]
    Sma,
    Ema,
}

impl AverageKind {
    pub fn build(self, periods: usize) -> Result<Box<dyn Indicator>> {
        Ok(match self {
            AverageKind::Sma => Box::new(Sma::new(periods)?),
            AverageKind::Ema => Box::new(Ema::new(periods, Ema::DEFAULT_SMOOTHING)?),
        })
    }
}

impl std::str::FromStr for AverageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sma" => Ok(AverageKind::Sma),
            "ema" => Ok(AverageKind::Ema),
            other => Err(format!("unknown average '{other}'")),
        }
    }
}

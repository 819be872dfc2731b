use common::{Bar, Result};

use super::{Indicator, Sma};

/// Streaming RSI (Relative Strength Index) over per-bar moves.
///
/// Each update takes one bar's open and close. The move `close - open` is
/// split into a gain and a loss, each averaged with an `Sma` of `periods`.
/// Undefined until `periods` bars have been absorbed.
#[derive(Debug, Clone)]
pub struct Rsi {
    gains: Sma,
    losses: Sma,
}

impl Rsi {
    pub const DEFAULT_PERIODS: usize = 14;

    pub fn new(periods: usize) -> Result<Self> {
        Ok(Self {
            gains: Sma::new(periods)?,
            losses: Sma::new(periods)?,
        })
    }

    /// Absorb one bar's move and return the new level.
    pub fn update(&mut self, open: f64, close: f64) -> Option<f64> {
        let diff = close - open;
        self.gains.update(diff.max(0.0));
        self.losses.update((-diff).max(0.0));
        self.level()
    }

    pub fn update_bar(&mut self, bar: &Bar) -> Option<f64> {
        self.update(bar.open, bar.close)
    }

    /// Current RSI in `[0, 100]`. A window without losses reads 100.
    pub fn level(&self) -> Option<f64> {
        let gain = self.gains.level()?;
        let loss = self.losses.level()?;
        if loss == 0.0 {
            return Some(100.0);
        }
        Some(100.0 - 100.0 / (1.0 + gain / loss))
    }

    pub fn periods(&self) -> usize {
        self.gains.periods()
    }
}

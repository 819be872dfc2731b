use common::{Error, Result};

use super::{Ema, Indicator};

/// Streaming MACD (Moving Average Convergence/Divergence).
///
/// MACD line = EMA(short) − EMA(long); the signal line is an EMA of the
/// MACD line, fed from the first bar on which the long EMA is defined.
/// `level` is `None` until both lines are defined.
#[derive(Debug, Clone)]
pub struct Macd {
    short: Ema,
    long: Ema,
    signal: Ema,
}

impl Macd {
    pub fn new(short: usize, long: usize, signal: usize, smoothing: f64) -> Result<Self> {
        if short >= long {
            return Err(Error::InvalidConfig(format!(
                "MACD short period {short} must be less than long period {long}"
            )));
        }
        Ok(Self {
            short: Ema::new(short, smoothing)?,
            long: Ema::new(long, smoothing)?,
            signal: Ema::new(signal, smoothing)?,
        })
    }

    /// Absorb one value and return `(macd, signal)` once both are defined.
    pub fn update(&mut self, value: f64) -> Option<(f64, f64)> {
        self.short.update(value);
        self.long.update(value);
        if let Some(line) = self.line() {
            self.signal.update(line);
        }
        self.level()
    }

    pub fn level(&self) -> Option<(f64, f64)> {
        Some((self.line()?, self.signal.level()?))
    }

    fn line(&self) -> Option<f64> {
        Some(self.short.level()? - self.long.level()?)
    }
}

use common::{Error, Result};

use super::Indicator;

/// Exponential Moving Average.
///
/// Seeded with the simple average of the first `periods` values, then
/// smoothed with factor `smoothing / (1 + periods)` (the usual choice is
/// `smoothing = 2`). Undefined until `periods` values have been absorbed.
#[derive(Debug, Clone)]
pub struct Ema {
    periods: usize,
    factor: f64,
    len: usize,
    value: f64,
}

impl Ema {
    pub const DEFAULT_SMOOTHING: f64 = 2.0;

    pub fn new(periods: usize, smoothing: f64) -> Result<Self> {
        if periods == 0 {
            return Err(Error::InvalidConfig(
                "EMA periods must be greater than 0".to_string(),
            ));
        }
        let factor = smoothing / (1.0 + periods as f64);
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "EMA smoothing {smoothing} gives factor {factor} outside (0, 1]"
            )));
        }
        Ok(Self {
            periods,
            factor,
            len: 0,
            value: 0.0,
        })
    }
}

impl Indicator for Ema {
    fn update(&mut self, value: f64) {
        if self.len < self.periods {
            self.len += 1;
            self.value += value;
            if self.len == self.periods {
                self.value /= self.periods as f64;
            }
        } else {
            self.value = value * self.factor + self.value * (1.0 - self.factor);
        }
    }

    fn level(&self) -> Option<f64> {
        (self.len >= self.periods).then_some(self.value)
    }

    fn periods(&self) -> usize {
        self.periods
    }

    fn name(&self) -> &'static str {
        "EMA"
    }
}

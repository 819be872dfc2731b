use common::{Error, Result};

use super::Indicator;

/// Simple Moving Average over the last `periods` values.
///
/// Keeps a running sum and subtracts the value leaving the window on each
/// update, so an update costs O(1) regardless of the window length.
/// The window slots hold exactly the values still to be evicted, oldest at
/// `pos` once the window is full.
#[derive(Debug, Clone)]
pub struct Sma {
    periods: usize,
    sum: f64,
    count: usize,
    window: Vec<f64>,
    pos: usize,
}

impl Sma {
    pub fn new(periods: usize) -> Result<Self> {
        if periods == 0 {
            return Err(Error::InvalidConfig(
                "SMA periods must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            periods,
            sum: 0.0,
            count: 0,
            window: vec![0.0; periods],
            pos: 0,
        })
    }

    /// Number of values absorbed so far, saturating at `periods`.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl Indicator for Sma {
    fn update(&mut self, value: f64) {
        if self.count == self.periods {
            self.sum -= self.window[self.pos];
        } else {
            self.count += 1;
        }
        self.sum += value;
        self.window[self.pos] = value;
        self.pos = (self.pos + 1) % self.periods;
    }

    fn level(&self) -> Option<f64> {
        if self.count < self.periods {
            return None;
        }
        Some(self.sum / self.periods as f64)
    }

    fn periods(&self) -> usize {
        self.periods
    }

    fn name(&self) -> &'static str {
        "SMA"
    }
}

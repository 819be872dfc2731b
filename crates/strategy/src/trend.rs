use common::{Bar, Portfolio, Result, Signal};

use crate::indicators::{AverageKind, Indicator};
use crate::{log_levels, Strategy};

/// Dual moving-average trend follower.
///
/// Reacts to the current levels on every bar rather than to crossings:
/// - buy when `fast > slow` and `close > fast`;
/// - otherwise sell when `close < fast` or `fast < slow`.
///
/// The same signal is re-issued bar after bar while its condition holds; the
/// portfolio's all-in/all-out policy turns the repeats into no-ops.
pub struct TrendStrategy<P> {
    name: String,
    fast: Box<dyn Indicator>,
    slow: Box<dyn Indicator>,
    portfolio: P,
}

impl<P: Portfolio> TrendStrategy<P> {
    pub fn new(
        name: impl Into<String>,
        fast: Box<dyn Indicator>,
        slow: Box<dyn Indicator>,
        portfolio: P,
    ) -> Self {
        Self {
            name: name.into(),
            fast,
            slow,
            portfolio,
        }
    }

    /// Build with two moving averages of the given kind.
    pub fn with_averages(
        name: impl Into<String>,
        kind: AverageKind,
        fast_periods: usize,
        slow_periods: usize,
        portfolio: P,
    ) -> Result<Self> {
        Ok(Self::new(
            name,
            kind.build(fast_periods)?,
            kind.build(slow_periods)?,
            portfolio,
        ))
    }

    pub fn into_portfolio(self) -> P {
        self.portfolio
    }
}

impl<P: Portfolio> Strategy for TrendStrategy<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_bar(&mut self, bar: &Bar) -> Option<Signal> {
        let close = bar.close;
        // Zero closes come from padding rows in the source data.
        if close == 0.0 {
            return None;
        }
        self.fast.update(close);
        self.slow.update(close);

        let (fast, slow) = match (self.fast.level(), self.slow.level()) {
            (Some(fast), Some(slow)) => (fast, slow),
            _ => return None,
        };
        log_levels(&self.name, bar, fast, slow);

        if fast > slow && close > fast {
            self.portfolio.buy(close);
            Some(Signal::Buy { price: close })
        } else if close < fast || fast < slow {
            self.portfolio.sell(close);
            Some(Signal::Sell { price: close })
        } else {
            None
        }
    }

    fn portfolio(&self) -> &dyn Portfolio {
        &self.portfolio
    }
}

use common::{Bar, Portfolio, Result, Signal};

use crate::indicators::{AverageKind, Indicator};
use crate::{log_levels, Strategy};

/// Moving-average crossover.
///
/// Unlike `TrendStrategy` this only acts on the bar where the fast average
/// crosses the slow one: upwards is a buy, downwards is a sell. Needs two
/// consecutive bars with defined levels before it can detect a cross.
pub struct CrossingStrategy<P> {
    name: String,
    fast: Box<dyn Indicator>,
    slow: Box<dyn Indicator>,
    /// Levels seen on the previous evaluated bar.
    previous: Option<(f64, f64)>,
    portfolio: P,
}

impl<P: Portfolio> CrossingStrategy<P> {
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
            previous: None,
            portfolio,
        }
    }

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

impl<P: Portfolio> Strategy for CrossingStrategy<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_bar(&mut self, bar: &Bar) -> Option<Signal> {
        let close = bar.close;
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

        let previous = self.previous.replace((fast, slow));
        let (prev_fast, prev_slow) = previous?;

        if prev_fast <= prev_slow && fast > slow {
            self.portfolio.buy(close);
            Some(Signal::Buy { price: close })
        } else if prev_fast >= prev_slow && fast < slow {
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

#[cfg(test)]
mod tests {
    use common::OrderSide;

    use super::*;
    use crate::testing::{bar, RecordingPortfolio};

    fn sma_1_2() -> CrossingStrategy<RecordingPortfolio> {
        CrossingStrategy::with_averages(
            "cross",
            AverageKind::Sma,
            1,
            2,
            RecordingPortfolio::default(),
        )
        .unwrap()
    }

    #[test]
    fn signals_only_on_the_crossing_bar() {
        let mut s = sma_1_2();
        // Warm-up: slow undefined, then first defined bar only primes `previous`.
        assert_eq!(s.on_bar(&bar(10.0)), None);
        assert_eq!(s.on_bar(&bar(9.0)), None); // fast 9, slow 9.5
        assert_eq!(s.on_bar(&bar(12.0)), Some(Signal::Buy { price: 12.0 })); // 12 > 10.5
        assert_eq!(s.on_bar(&bar(13.0)), None); // still above, no new cross
        assert_eq!(s.on_bar(&bar(8.0)), Some(Signal::Sell { price: 8.0 })); // 8 < 10.5

        let sides: Vec<OrderSide> = s.into_portfolio().calls.into_iter().map(|c| c.0).collect();
        assert_eq!(sides, vec![OrderSide::Buy, OrderSide::Sell]);
    }

    #[test]
    fn zero_close_does_not_touch_state() {
        let mut s = sma_1_2();
        s.on_bar(&bar(10.0));
        s.on_bar(&bar(9.0));
        assert_eq!(s.on_bar(&bar(0.0)), None);
        assert_eq!(s.previous, Some((9.0, 9.5)));
    }

    #[test]
    fn first_defined_bar_never_signals() {
        let mut s = sma_1_2();
        s.on_bar(&bar(1.0));
        // fast 100 > slow 50.5, but there is no previous level to cross from.
        assert_eq!(s.on_bar(&bar(100.0)), None);
        assert!(s.portfolio.calls.is_empty());
    }
}

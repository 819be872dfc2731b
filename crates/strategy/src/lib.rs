pub mod config;
pub mod crossing;
pub mod indicators;
pub mod registry;
pub mod trend;

pub use config::{StrategyConfig, StrategyFileConfig};
pub use crossing::CrossingStrategy;
pub use registry::StrategySet;
pub use trend::TrendStrategy;

use tracing::debug;

use common::{Bar, Portfolio, Signal};

/// All strategy implementations must satisfy this trait.
///
/// A strategy owns its indicators and the portfolio it trades, and is fed
/// one bar at a time from a single receive loop.
pub trait Strategy: Send {
    /// Human-readable name of this strategy instance.
    fn name(&self) -> &str;

    /// Evaluate one bar, executing against the portfolio when a condition
    /// holds. Returns the signal issued for this bar, if any; the portfolio
    /// may still treat it as a no-op.
    fn on_bar(&mut self, bar: &Bar) -> Option<Signal>;

    /// The portfolio this strategy trades.
    fn portfolio(&self) -> &dyn Portfolio;
}

fn log_levels(strategy: &str, bar: &Bar, fast: f64, slow: f64) {
    let at = bar
        .timestamp()
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| bar.time.to_string());
    debug!(
        strategy,
        %at,
        fast = format_args!("{fast:.4}"),
        slow = format_args!("{slow:.4}"),
        "Indicator levels"
    );
}

#[cfg(test)]
pub(crate) mod testing {
    use common::{Bar, Execution, OrderSide, Portfolio};

    /// Portfolio double that records every call and always "executes".
    #[derive(Debug, Default)]
    pub struct RecordingPortfolio {
        pub calls: Vec<(OrderSide, f64)>,
    }

    impl Portfolio for RecordingPortfolio {
        fn buy(&mut self, price: f64) -> Option<Execution> {
            self.calls.push((OrderSide::Buy, price));
            Some(Execution { side: OrderSide::Buy, price, quantity: 1.0, value: price })
        }

        fn sell(&mut self, price: f64) -> Option<Execution> {
            self.calls.push((OrderSide::Sell, price));
            Some(Execution { side: OrderSide::Sell, price, quantity: 1.0, value: price })
        }

        fn cash(&self) -> f64 {
            0.0
        }

        fn quantity(&self) -> f64 {
            0.0
        }
    }

    pub fn bar(close: f64) -> Bar {
        Bar {
            time: 1_700_000_000.0,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
        }
    }
}

use tracing::{info, warn};

use common::{Error, Execution, OrderSide, Portfolio, Result};

/// Simulated single-asset portfolio with an all-in/all-out policy.
///
/// A buy converts all cash into the asset; a sell converts the whole
/// position back into cash. The portfolio is therefore always either fully
/// in cash or fully invested, and repeating a buy (or sell) is a no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct SimplePortfolio {
    cash: f64,
    quantity: f64,
}

impl SimplePortfolio {
    pub fn new(initial_cash: f64) -> Result<Self> {
        if !initial_cash.is_finite() || initial_cash < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "initial cash must be a non-negative number, got {initial_cash}"
            )));
        }
        info!(cash = initial_cash, "SimplePortfolio initialized");
        Ok(Self {
            cash: initial_cash,
            quantity: 0.0,
        })
    }

    /// True while the whole portfolio is held in the asset.
    pub fn is_invested(&self) -> bool {
        self.quantity > 0.0
    }
}

fn valid_price(side: OrderSide, price: f64) -> bool {
    if price.is_finite() && price > 0.0 {
        return true;
    }
    warn!(%side, price, "Ignoring order at non-positive price");
    false
}

impl Portfolio for SimplePortfolio {
    fn buy(&mut self, price: f64) -> Option<Execution> {
        if self.cash <= 0.0 || !valid_price(OrderSide::Buy, price) {
            return None;
        }
        self.quantity = self.cash / price;
        self.cash = 0.0;

        let execution = Execution {
            side: OrderSide::Buy,
            price,
            quantity: self.quantity,
            value: self.quantity * price,
        };
        info!(
            qty = format_args!("{:.4}", execution.quantity),
            price = format_args!("{:.4}", price),
            value = format_args!("{:.4}", execution.value),
            "Bought asset"
        );
        Some(execution)
    }

    fn sell(&mut self, price: f64) -> Option<Execution> {
        if self.quantity <= 0.0 || !valid_price(OrderSide::Sell, price) {
            return None;
        }
        let sold = self.quantity;
        self.cash = sold * price;
        self.quantity = 0.0;

        let execution = Execution {
            side: OrderSide::Sell,
            price,
            quantity: sold,
            value: self.cash,
        };
        info!(
            qty = format_args!("{:.4}", sold),
            price = format_args!("{:.4}", price),
            value = format_args!("{:.4}", execution.value),
            "Sold asset"
        );
        Some(execution)
    }

    fn cash(&self) -> f64 {
        self.cash
    }

    fn quantity(&self) -> f64 {
        self.quantity
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One time-sliced OHLCV price observation.
///
/// This is also the wire format: every bar travels from the publisher to its
/// subscribers as a JSON object with exactly these six numeric fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Epoch seconds.
    pub time: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Encode as a single wire message.
    pub fn to_message(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a wire message. Anything that is not a complete bar record is
    /// reported as `MalformedMessage`.
    pub fn from_message(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::MalformedMessage(e.to_string()))
    }

    /// Bar time as a UTC timestamp, if it is representable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        if !self.time.is_finite() {
            return None;
        }
        let secs = self.time.trunc() as i64;
        let nanos = (self.time.fract() * 1e9).round().clamp(0.0, 999_999_999.0) as u32;
        DateTime::from_timestamp(secs, nanos)
    }
}

/// Side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderSide::Buy => write!(f, "BUY"),
            OrderSide::Sell => write!(f, "SELL"),
        }
    }
}

/// Decision issued by a strategy for a single bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    Buy { price: f64 },
    Sell { price: f64 },
}

impl Signal {
    pub fn side(&self) -> OrderSide {
        match self {
            Signal::Buy { .. } => OrderSide::Buy,
            Signal::Sell { .. } => OrderSide::Sell,
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            Signal::Buy { price } | Signal::Sell { price } => *price,
        }
    }
}

/// A state-changing portfolio operation. No-op calls produce none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub side: OrderSide,
    pub price: f64,
    /// Asset units bought or sold.
    pub quantity: f64,
    /// Portfolio value at `price` right after the operation.
    pub value: f64,
}

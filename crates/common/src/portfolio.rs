use crate::Execution;

/// Abstraction over the position a strategy trades into.
///
/// `SimplePortfolio` in `crates/paper` implements this for simulation.
/// Strategies are generic over it so tests can observe every call.
///
/// Implementations are only ever driven from one receive loop and need no
/// internal locking.
pub trait Portfolio: Send {
    /// Move into the asset at `price`. Returns `None` when nothing changed.
    fn buy(&mut self, price: f64) -> Option<Execution>;

    /// Move back into cash at `price`. Returns `None` when nothing changed.
    fn sell(&mut self, price: f64) -> Option<Execution>;

    /// Cash currently held.
    fn cash(&self) -> f64;

    /// Asset units currently held.
    fn quantity(&self) -> f64;

    /// Total value if the held quantity were marked at `price`.
    fn valuation(&self, price: f64) -> f64 {
        self.cash() + self.quantity() * price
    }
}

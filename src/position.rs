//! Tracks a single instrument's signed position from trade fills and
//! authoritative position snapshots from the exchange.

use crate::order::Side;

/// Current signed position, maintained incrementally.
///
/// Plain field, no atomics: the core is single-threaded (see the
/// concurrency section of the specification), so there is exactly one
/// owner and no concurrent readers to protect against.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PositionTracker {
    current_position: f64,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_position(&self) -> f64 {
        self.current_position
    }

    /// Applies a fill: `side == Buy` increases the position, `Sell` decreases it.
    pub fn on_fill(&mut self, side: Side, quantity: f64) {
        match side {
            Side::Buy => self.current_position += quantity,
            Side::Sell => self.current_position -= quantity,
        }
    }

    /// Overwrites the position from an authoritative exchange snapshot
    /// (e.g. a reconciliation `PositionUpdate`).
    pub fn set_position(&mut self, position: f64) {
        self.current_position = position;
    }

    pub fn reset(&mut self) {
        self.current_position = 0.0;
    }

    /// `(realized, unrealized)` PnL given the current mark price and a
    /// notional multiplier; realized PnL is not tracked by this simplified
    /// core (no cost-basis history), so it is always `0.0`.
    pub fn compute_pnl(&self, current_price: f64, multiplier: f64) -> (f64, f64) {
        (0.0, self.current_position * current_price * multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buy_increases_sell_decreases() {
        let mut tracker = PositionTracker::new();
        tracker.on_fill(Side::Buy, 2.0);
        assert_eq!(tracker.current_position(), 2.0);
        tracker.on_fill(Side::Sell, 0.5);
        assert_eq!(tracker.current_position(), 1.5);
    }

    #[test]
    fn position_update_overwrites() {
        let mut tracker = PositionTracker::new();
        tracker.on_fill(Side::Buy, 2.0);
        tracker.set_position(10.0);
        assert_eq!(tracker.current_position(), 10.0);
    }

    #[test]
    fn reset_zeroes() {
        let mut tracker = PositionTracker::new();
        tracker.on_fill(Side::Buy, 2.0);
        tracker.reset();
        assert_eq!(tracker.current_position(), 0.0);
    }
}

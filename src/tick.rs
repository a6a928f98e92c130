//! Tick-size snapping and the debug-only receive-clock monotonicity check.

use crate::message::MessageInfo;

/// Number of decimals an exchange reports for prices/quantities.
///
/// Used only to size the epsilon in [`TickPricer::price_to_ticks`]; it is not
/// itself a price representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Unknown,
    Decimals(u8),
}

impl Precision {
    fn epsilon(self) -> f64 {
        match self {
            Precision::Unknown => 1e-8,
            Precision::Decimals(d) => 0.5 * 10f64.powi(-(d as i32)),
        }
    }
}

/// Snaps floating-point prices onto integer tick units.
///
/// `internal` representation throughout the matcher is ticks (`i64`);
/// `external` representation is the real floating-point price. Keeping both
/// lets the matcher compare prices exactly while still reporting the real
/// price to consumers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickPricer {
    tick_size: f64,
    precision: Precision,
}

impl TickPricer {
    pub fn new() -> Self {
        Self {
            tick_size: f64::NAN,
            precision: Precision::Unknown,
        }
    }

    pub fn set_tick_size(&mut self, tick_size: f64) {
        self.tick_size = tick_size;
    }

    pub fn set_precision(&mut self, precision: Precision) {
        self.precision = precision;
    }

    pub fn tick_size(&self) -> f64 {
        self.tick_size
    }

    /// True once both tick size and precision are known.
    pub fn has_tick_size(&self) -> bool {
        !self.tick_size.is_nan() && self.tick_size > 0.0 && self.precision != Precision::Unknown
    }

    /// Snaps `price` to the nearest tick, reporting whether the snap was
    /// exact (within an epsilon derived from [`Precision`]).
    ///
    /// Returns ticks = 0 and exact = false if tick size is not yet known.
    pub fn price_to_ticks(&self, price: f64) -> (i64, bool) {
        if !self.has_tick_size() || price.is_nan() {
            return (0, false);
        }
        let raw = price / self.tick_size;
        let ticks = raw.round();
        let exact = (raw - ticks).abs() * self.tick_size <= self.precision.epsilon();
        (ticks as i64, exact)
    }

    pub fn ticks_to_price(&self, ticks: i64) -> f64 {
        if !self.has_tick_size() {
            return f64::NAN;
        }
        ticks as f64 * self.tick_size
    }
}

/// True iff `x` is not the "unknown" NaN sentinel.
#[inline]
pub fn is_known(x: f64) -> bool {
    !x.is_nan()
}

/// Sentinel tick value meaning "no bid".
pub const NO_BID: i64 = i64::MIN;
/// Sentinel tick value meaning "no ask".
pub const NO_ASK: i64 = i64::MAX;

/// Debug-only assertion that the receive clock is monotonic per component.
///
/// Elided in release builds, matching the source's `#ifndef NDEBUG` guard.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeChecker {
    last_receive_time: u64,
    last_receive_time_utc: u64,
}

impl TimeChecker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, message_info: &MessageInfo) {
        debug_assert!(
            message_info.receive_time >= self.last_receive_time,
            "receive_time went backwards: {} < {}",
            message_info.receive_time,
            self.last_receive_time
        );
        debug_assert!(
            message_info.receive_time_utc >= self.last_receive_time_utc,
            "receive_time_utc went backwards: {} < {}",
            message_info.receive_time_utc,
            self.last_receive_time_utc
        );
        self.last_receive_time = message_info.receive_time;
        self.last_receive_time_utc = message_info.receive_time_utc;
    }
}

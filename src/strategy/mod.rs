//! Per-leg instrument state and per-source bookkeeping shared by strategies
//! built on top of the matcher core.

pub mod arbitrage;

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};

use crate::market_data::{MarketData, MarketDataSource};
use crate::position::PositionTracker;

/// How a fill on this leg affects an existing position. Pass-through to the
/// order router; the core never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionEffect {
    Open,
    Close,
}

/// Collateral mode for the account/leg. Pass-through to the order router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarginMode {
    Cross,
    Isolated,
}

/// Order time-in-force requested for this leg. Pass-through to the order
/// router; the simulated matcher always treats resting orders as GTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeInForce {
    Gtc,
    Ioc,
    Fok,
}

/// One instrument leg's static configuration, as read from the legs file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub source: u8,
    pub account: String,
    pub exchange: String,
    pub symbol: String,
    pub position_effect: PositionEffect,
    pub margin_mode: MarginMode,
    pub time_in_force: TimeInForce,
}

/// The legs file shape: a strategy id plus the ordered list of legs. Leg 0
/// is always the reference leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegsFile {
    pub strategy_id: String,
    pub legs: Vec<Leg>,
}

/// In-flight order-slot state for a leg. Only one order_id may be associated
/// with a leg at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderState {
    Idle,
    Create,
    Working,
    Cancel,
}

/// Per-leg container: static config, owned market data and position view,
/// and the single order slot this leg may have open at a time.
pub struct Instrument {
    pub leg: Leg,
    pub market_data: MarketData,
    pub position: PositionTracker,
    pub order_state: OrderState,
    pub order_id: Option<u64>,
}

impl Instrument {
    pub fn new(leg: Leg, market_data_source: MarketDataSource) -> Self {
        Self {
            leg,
            market_data: MarketData::new(market_data_source),
            position: PositionTracker::new(),
            order_state: OrderState::Idle,
            order_id: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.order_state == OrderState::Idle
    }

    /// Clears the order slot and position view, as happens on a
    /// `Disconnected` lifecycle event awaiting re-download.
    pub fn reset(&mut self) {
        self.order_state = OrderState::Idle;
        self.order_id = None;
        self.position.reset();
    }
}

/// Bound on the number of retained per-source latency samples.
const LATENCY_SAMPLE_CAPACITY: usize = 256;

/// Per-upstream-source bookkeeping: readiness flags, the (exchange, symbol)
/// to instrument-vector index, and the strategy's own live order table.
#[derive(Debug, Default)]
pub struct Source {
    pub connected: bool,
    pub download_end: bool,
    pub ready: bool,
    pub instrument_index: HashMap<(String, String), usize>,
    pub live_orders: HashMap<u64, usize>,
    latency_samples: VecDeque<u64>,
}

impl Source {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.connected && self.download_end && self.ready
    }

    pub fn record_latency_sample(&mut self, receive_time: u64) {
        if self.latency_samples.len() >= LATENCY_SAMPLE_CAPACITY {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(receive_time);
    }

    pub fn latency_samples(&self) -> &VecDeque<u64> {
        &self.latency_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_leg() -> Leg {
        Leg {
            source: 0,
            account: "acct".into(),
            exchange: "EX".into(),
            symbol: "SYM".into(),
            position_effect: PositionEffect::Open,
            margin_mode: MarginMode::Cross,
            time_in_force: TimeInForce::Ioc,
        }
    }

    #[test]
    fn instrument_starts_idle() {
        let instrument = Instrument::new(sample_leg(), MarketDataSource::TopOfBook);
        assert!(instrument.is_idle());
        assert!(instrument.order_id.is_none());
    }

    #[test]
    fn source_is_ready_requires_all_three_flags() {
        let mut source = Source::new();
        assert!(!source.is_ready());
        source.connected = true;
        source.download_end = true;
        assert!(!source.is_ready());
        source.ready = true;
        assert!(source.is_ready());
    }

    #[test]
    fn latency_samples_bounded() {
        let mut source = Source::new();
        for i in 0..(LATENCY_SAMPLE_CAPACITY + 10) {
            source.record_latency_sample(i as u64);
        }
        assert_eq!(source.latency_samples().len(), LATENCY_SAMPLE_CAPACITY);
        assert_eq!(*source.latency_samples().front().unwrap(), 10);
    }
}

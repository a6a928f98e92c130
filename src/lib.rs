//! Simulated matching and arbitrage strategy core for algorithmic trading
//! research and live execution.
//!
//! This crate implements the deterministic pieces shared by backtesting and
//! live trading: a per-(exchange, symbol) simulated limit order book (two
//! variants, see [`matcher`]) and a multi-leg spread-trading strategy (see
//! [`strategy::arbitrage`]). Everything here is single-threaded and
//! performs no I/O; the event source, CLI, and reporting live outside this
//! crate.

pub mod config;
pub mod dispatch;
pub mod market_data;
pub mod matcher;
pub mod message;
pub mod order;
pub mod position;
pub mod strategy;
pub mod testing;
pub mod tick;

pub mod prelude {
    pub use crate::dispatch::{
        CancelAllOrdersAck, CancelAllOrdersRequest, CancelOrderRequest, CreateOrderRequest,
        MatcherDispatcher, ModifyOrderRequest, OrderAck, OrderRouter, OrderUpdate, RequestStatus,
        TradeUpdate,
    };
    pub use crate::market_data::{Layer, MarketData, MarketDataSource};
    pub use crate::matcher::{create_matcher, AnyMatcher, MatcherConfig, MatcherVariant};
    pub use crate::message::MessageInfo;
    pub use crate::order::{ErrorKind, Order, OrderCache, OrderStatus, Side};
    pub use crate::position::PositionTracker;
    pub use crate::strategy::arbitrage::{ArbitrageParameters, ArbitrageStrategy, LegDispatcher};
    pub use crate::strategy::{Instrument, Leg, LegsFile, OrderState, Source};
    pub use crate::tick::{is_known, Precision, TickPricer};
}

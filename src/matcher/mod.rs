//! Simulated per-(source, exchange, symbol) limit order books.
//!
//! Two variants are provided: [`simple::SimpleMatcher`] (pure price/time
//! priority) and [`queue_position::QueuePositionMatcher`] (adds a
//! queue-ahead estimate derived from public trade prints). [`AnyMatcher`]
//! is the factory-selected handle a caller holds when the variant is chosen
//! at runtime from configuration.

pub mod queue_position;
pub mod simple;

use serde::{Deserialize, Serialize};

use crate::dispatch::{
    CancelAllOrdersRequest, CancelOrderRequest, CreateOrderRequest, MatcherDispatcher,
    ModifyOrderRequest,
};
use crate::market_data::{
    MarketByOrderUpdate, MarketByPriceUpdate, MarketDataSource, MarketStatus, ReferenceData,
    StatisticsUpdate, TopOfBookUpdate, TradeSummary,
};
use crate::message::MessageInfo;
use crate::order::{Order, OrderCache, OrderStatus, Side};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    pub source: u8,
    pub exchange: String,
    pub symbol: String,
    pub market_data_source: MarketDataSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatcherVariant {
    Simple,
    QueuePositionSimple,
}

/// A runtime-selected matcher, dispatching to whichever variant the
/// configuration named.
pub enum AnyMatcher {
    Simple(simple::SimpleMatcher),
    QueuePositionSimple(queue_position::QueuePositionMatcher),
}

/// Selects and constructs the configured matcher variant.
pub fn create_matcher(variant: MatcherVariant, config: MatcherConfig) -> AnyMatcher {
    match variant {
        MatcherVariant::Simple => AnyMatcher::Simple(simple::SimpleMatcher::new(config)),
        MatcherVariant::QueuePositionSimple => {
            AnyMatcher::QueuePositionSimple(queue_position::QueuePositionMatcher::new(config))
        }
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            AnyMatcher::Simple(m) => m.$method($($arg),*),
            AnyMatcher::QueuePositionSimple(m) => m.$method($($arg),*),
        }
    };
}

impl AnyMatcher {
    pub fn on_reference_data(&mut self, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, event: ReferenceData) {
        delegate!(self, on_reference_data(dispatcher, info, event))
    }

    pub fn on_market_status(&mut self, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, event: MarketStatus) {
        delegate!(self, on_market_status(dispatcher, info, event))
    }

    pub fn on_top_of_book(&mut self, cache: &mut dyn OrderCache, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, event: TopOfBookUpdate) {
        delegate!(self, on_top_of_book(cache, dispatcher, info, event))
    }

    pub fn on_market_by_price(&mut self, cache: &mut dyn OrderCache, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, event: MarketByPriceUpdate) {
        delegate!(self, on_market_by_price(cache, dispatcher, info, event))
    }

    pub fn on_market_by_order(&mut self, cache: &mut dyn OrderCache, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, event: MarketByOrderUpdate) {
        delegate!(self, on_market_by_order(cache, dispatcher, info, event))
    }

    pub fn on_trade_summary(&mut self, cache: &mut dyn OrderCache, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, event: TradeSummary) {
        delegate!(self, on_trade_summary(cache, dispatcher, info, event))
    }

    pub fn on_statistics_update(&mut self, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, event: StatisticsUpdate) {
        delegate!(self, on_statistics_update(dispatcher, info, event))
    }

    pub fn create_order(&mut self, cache: &mut dyn OrderCache, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, request: CreateOrderRequest) {
        delegate!(self, create_order(cache, dispatcher, info, request))
    }

    pub fn modify_order(&mut self, cache: &mut dyn OrderCache, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, request: ModifyOrderRequest) {
        delegate!(self, modify_order(cache, dispatcher, info, request))
    }

    pub fn cancel_order(&mut self, cache: &mut dyn OrderCache, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, request: CancelOrderRequest) {
        delegate!(self, cancel_order(cache, dispatcher, info, request))
    }

    pub fn cancel_all_orders(&mut self, cache: &mut dyn OrderCache, dispatcher: &mut dyn MatcherDispatcher, info: MessageInfo, request: CancelAllOrdersRequest) {
        delegate!(self, cancel_all_orders(cache, dispatcher, info, request))
    }
}

/// A cheap, owned copy of the fields matcher logic needs to read after a
/// short-lived mutable borrow of the cache has ended.
#[derive(Debug, Clone)]
pub(super) struct OrderSnapshot {
    pub account: String,
    pub side: Side,
    pub price: f64,
    pub price_ticks: i64,
    pub remaining_quantity: f64,
    pub traded_quantity: f64,
    pub total_cost: f64,
    pub status: OrderStatus,
}

pub(super) fn snapshot(cache: &mut dyn OrderCache, order_id: u64) -> Option<OrderSnapshot> {
    let mut result = None;
    cache.get_order(order_id, &mut |order: &mut Order| {
        result = Some(OrderSnapshot {
            account: order.account.clone(),
            side: order.side,
            price: order.price,
            price_ticks: order.price_ticks,
            remaining_quantity: order.remaining_quantity,
            traded_quantity: order.traded_quantity,
            total_cost: order.total_cost,
            status: order.status,
        });
    });
    result
}

/// `true` if `quantity` is a (near-)integer multiple of `lot`. An unknown or
/// non-positive lot size is treated as "no lot constraint".
pub(super) fn is_lot_multiple(quantity: f64, lot: f64) -> bool {
    if lot.is_nan() || lot <= 0.0 {
        return true;
    }
    let ratio = quantity / lot;
    (ratio - ratio.round()).abs() < 1e-6
}

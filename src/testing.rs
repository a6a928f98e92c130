//! Test doubles shared across this crate's test suites.
//!
//! Not `cfg(test)`-gated: like this codebase's other `testing` modules,
//! it ships in the library so downstream integration tests and other
//! crates in a larger workspace can reuse it without duplicating fixtures.

use std::collections::HashMap;

use crate::dispatch::{
    CancelAllOrdersAck, MatcherDispatcher, OrderAck, OrderUpdate, TradeUpdate,
};
use crate::market_data::{
    MarketByOrderUpdate, MarketByPriceUpdate, MarketStatus, ReferenceData, StatisticsUpdate,
    TopOfBookUpdate, TradeSummary,
};
use crate::message::MessageInfo;
use crate::order::{Order, OrderCache};

/// A `Vec`-backed reference [`OrderCache`]: the simplest thing that
/// satisfies the contract, used by every matcher/strategy test in this
/// crate and suitable for small backtests.
#[derive(Debug, Default)]
pub struct VecOrderCache {
    orders: HashMap<u64, Order>,
    next_trade_id: u64,
}

impl VecOrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order(&self, order_id: u64) -> Option<&Order> {
        self.orders.get(&order_id)
    }
}

impl OrderCache for VecOrderCache {
    fn get_order(&mut self, order_id: u64, visitor: &mut dyn FnMut(&mut Order)) -> bool {
        match self.orders.get_mut(&order_id) {
            Some(order) => {
                visitor(order);
                true
            }
            None => false,
        }
    }

    fn insert_order(&mut self, order: Order) {
        self.orders.insert(order.order_id, order);
    }

    fn next_trade_id(&mut self) -> u64 {
        self.next_trade_id += 1;
        self.next_trade_id
    }
}

/// Every event a [`MatcherDispatcher`] received, in arrival order — used to
/// assert the S1–S6 seed scenarios and the ordering invariants of the
/// specification (OrderAck precedes OrderUpdate, trade ids strictly
/// increase, and so on).
#[derive(Debug, Clone)]
pub enum RecordedEvent {
    ReferenceData,
    MarketStatus,
    TopOfBook,
    MarketByPrice,
    MarketByOrder,
    TradeSummary,
    StatisticsUpdate,
    OrderAck(OrderAck),
    OrderUpdate(OrderUpdate),
    TradeUpdate(TradeUpdate),
    CancelAllOrdersAck(CancelAllOrdersAck),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingDispatcher {
    pub events: Vec<RecordedEvent>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn order_acks(&self) -> Vec<OrderAck> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::OrderAck(ack) => Some(*ack),
                _ => None,
            })
            .collect()
    }

    pub fn order_updates(&self) -> Vec<OrderUpdate> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::OrderUpdate(update) => Some(*update),
                _ => None,
            })
            .collect()
    }

    pub fn trade_updates(&self) -> Vec<TradeUpdate> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::TradeUpdate(trade) => Some(*trade),
                _ => None,
            })
            .collect()
    }
}

impl MatcherDispatcher for RecordingDispatcher {
    fn on_reference_data(&mut self, _info: &MessageInfo, _event: &ReferenceData) {
        self.events.push(RecordedEvent::ReferenceData);
    }

    fn on_market_status(&mut self, _info: &MessageInfo, _event: &MarketStatus) {
        self.events.push(RecordedEvent::MarketStatus);
    }

    fn on_top_of_book(&mut self, _info: &MessageInfo, _event: &TopOfBookUpdate) {
        self.events.push(RecordedEvent::TopOfBook);
    }

    fn on_market_by_price(&mut self, _info: &MessageInfo, _event: &MarketByPriceUpdate) {
        self.events.push(RecordedEvent::MarketByPrice);
    }

    fn on_market_by_order(&mut self, _info: &MessageInfo, _event: &MarketByOrderUpdate) {
        self.events.push(RecordedEvent::MarketByOrder);
    }

    fn on_trade_summary(&mut self, _info: &MessageInfo, _event: &TradeSummary) {
        self.events.push(RecordedEvent::TradeSummary);
    }

    fn on_statistics_update(&mut self, _info: &MessageInfo, _event: &StatisticsUpdate) {
        self.events.push(RecordedEvent::StatisticsUpdate);
    }

    fn on_order_ack(&mut self, _info: &MessageInfo, event: &OrderAck) {
        self.events.push(RecordedEvent::OrderAck(*event));
    }

    fn on_order_update(&mut self, _info: &MessageInfo, event: &OrderUpdate) {
        self.events.push(RecordedEvent::OrderUpdate(*event));
    }

    fn on_trade_update(&mut self, _info: &MessageInfo, event: &TradeUpdate) {
        self.events.push(RecordedEvent::TradeUpdate(*event));
    }

    fn on_cancel_all_orders_ack(&mut self, _info: &MessageInfo, event: &CancelAllOrdersAck) {
        self.events.push(RecordedEvent::CancelAllOrdersAck(*event));
    }
}

/// Convenience builder for a simple `{tick_size, precision}` reference-data
/// event, the shape used by nearly every matcher test.
pub fn reference_data(tick_size: f64, decimals: u8) -> ReferenceData {
    ReferenceData {
        tick_size,
        precision: crate::tick::Precision::Decimals(decimals),
        multiplier: 1.0,
        min_trade_vol: 1.0,
    }
}

pub fn message_info(receive_time: u64) -> MessageInfo {
    MessageInfo::new(receive_time, receive_time, 0, 0)
}

pub fn top_of_book(bid_price: f64, bid_quantity: f64, ask_price: f64, ask_quantity: f64) -> TopOfBookUpdate {
    TopOfBookUpdate {
        layer: crate::market_data::Layer {
            bid_price,
            bid_quantity,
            ask_price,
            ask_quantity,
        },
    }
}

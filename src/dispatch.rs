//! Narrow ports connecting matcher, strategy, and the outer event source.
//!
//! The source dispatches events through an inheritance-heavy virtual base
//! with one overload per event type. The idiomatic analogue used here is a
//! handler trait with a default no-op body per method: a consumer overrides
//! only the events it cares about, and nothing resembling a deep class
//! hierarchy is needed.

use crate::market_data::{
    MarketByOrderUpdate, MarketByPriceUpdate, MarketStatus, ReferenceData, StatisticsUpdate,
    TopOfBookUpdate, TradeSummary,
};
use crate::message::MessageInfo;
use crate::order::{ErrorKind, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Accepted,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub order_id: u64,
    pub account: String,
    pub exchange: String,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct ModifyOrderRequest {
    pub order_id: u64,
    pub price: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CancelOrderRequest {
    pub order_id: u64,
}

/// Cancels every resting order matching `account` (and, if set, `order_id`).
#[derive(Debug, Clone, Default)]
pub struct CancelAllOrdersRequest {
    pub account: Option<String>,
    pub order_id: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderAck {
    pub order_id: u64,
    pub status: RequestStatus,
    pub error: Option<ErrorKind>,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderUpdate {
    pub order_id: u64,
    pub status: crate::order::OrderStatus,
    pub remaining_quantity: f64,
    pub traded_quantity: f64,
    pub total_cost: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct TradeUpdate {
    pub order_id: u64,
    pub trade_id: u64,
    pub side: Side,
    pub quantity: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CancelAllOrdersAck {
    pub count: u32,
}

/// Matcher -> consumer port. All market-data events are forwarded verbatim;
/// order-lifecycle events are synthesized by the matcher.
#[allow(unused_variables)]
pub trait MatcherDispatcher {
    fn on_reference_data(&mut self, info: &MessageInfo, event: &ReferenceData) {}
    fn on_market_status(&mut self, info: &MessageInfo, event: &MarketStatus) {}
    fn on_top_of_book(&mut self, info: &MessageInfo, event: &TopOfBookUpdate) {}
    fn on_market_by_price(&mut self, info: &MessageInfo, event: &MarketByPriceUpdate) {}
    fn on_market_by_order(&mut self, info: &MessageInfo, event: &MarketByOrderUpdate) {}
    fn on_trade_summary(&mut self, info: &MessageInfo, event: &TradeSummary) {}
    fn on_statistics_update(&mut self, info: &MessageInfo, event: &StatisticsUpdate) {}

    fn on_order_ack(&mut self, info: &MessageInfo, event: &OrderAck) {}
    fn on_order_update(&mut self, info: &MessageInfo, event: &OrderUpdate) {}
    fn on_trade_update(&mut self, info: &MessageInfo, event: &TradeUpdate) {}
    fn on_cancel_all_orders_ack(&mut self, info: &MessageInfo, event: &CancelAllOrdersAck) {}
}

/// Strategy -> router port. `is_last` hints batch boundaries to the
/// transport; the core treats it as advisory only.
pub trait OrderRouter {
    fn send_create_order(&mut self, request: CreateOrderRequest, source: u8, is_last: bool);
    fn send_modify_order(&mut self, request: ModifyOrderRequest, source: u8, is_last: bool);
    fn send_cancel_order(&mut self, request: CancelOrderRequest, source: u8, is_last: bool);
    fn send_cancel_all_orders(&mut self, request: CancelAllOrdersRequest, source: u8);
}

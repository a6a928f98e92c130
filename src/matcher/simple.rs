//! Pure price/time-priority simulated limit order book.

use std::collections::BTreeMap;

use super::{is_lot_multiple, snapshot, MatcherConfig};
use crate::dispatch::{
    CancelAllOrdersAck, CancelAllOrdersRequest, CancelOrderRequest, CreateOrderRequest,
    MatcherDispatcher, ModifyOrderRequest, OrderAck, OrderUpdate, RequestStatus, TradeUpdate,
};
use crate::market_data::{
    MarketByOrderUpdate, MarketByPriceUpdate, MarketData, MarketStatus, ReferenceData,
    StatisticsUpdate, TopOfBookUpdate, TradeSummary,
};
use crate::message::MessageInfo;
use crate::order::{ErrorKind, Order, OrderCache, OrderStatus, Side};
use crate::tick::{is_known, TimeChecker, NO_ASK, NO_BID};

/// Simulated limit order book for a single (source, exchange, symbol).
///
/// Resting orders are kept in two `BTreeMap`s keyed `(tick_price, seq)` —
/// buys ordered by descending price via a negated key, sells by ascending
/// price — so the head of each map is always the best-priority order. `seq`
/// is a monotonic counter distinct from `order_id`, reissued on every
/// insertion (including re-insertion after a modify), which is what gives
/// a modified order the tail of its new price level rather than keeping its
/// original place.
pub struct SimpleMatcher {
    config: MatcherConfig,
    market_data: MarketData,
    time_checker: TimeChecker,
    buy_orders: BTreeMap<(i64, u64), u64>,
    sell_orders: BTreeMap<(i64, u64), u64>,
    resting: std::collections::HashMap<u64, (Side, i64, u64)>,
    next_seq: u64,
}

impl SimpleMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        let market_data = MarketData::new(config.market_data_source);
        Self {
            config,
            market_data,
            time_checker: TimeChecker::new(),
            buy_orders: BTreeMap::new(),
            sell_orders: BTreeMap::new(),
            resting: std::collections::HashMap::new(),
            next_seq: 0,
        }
    }

    fn best_ticks(&self) -> (i64, i64) {
        let layer = self.market_data.top_of_book();
        let bid = if is_known(layer.bid_price) {
            self.market_data.price_to_ticks(layer.bid_price).0
        } else {
            NO_BID
        };
        let ask = if is_known(layer.ask_price) {
            self.market_data.price_to_ticks(layer.ask_price).0
        } else {
            NO_ASK
        };
        (bid, ask)
    }

    fn is_aggressive(&self, side: Side, price_ticks: i64) -> bool {
        let (bid, ask) = self.best_ticks();
        match side {
            Side::Buy => ask != NO_ASK && price_ticks >= ask,
            Side::Sell => bid != NO_BID && price_ticks <= bid,
        }
    }

    fn opposite_best_price(&self, side: Side) -> f64 {
        let layer = self.market_data.top_of_book();
        match side {
            Side::Buy => layer.ask_price,
            Side::Sell => layer.bid_price,
        }
    }

    fn add_resting(&mut self, order_id: u64, side: Side, price_ticks: i64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        match side {
            Side::Buy => {
                self.buy_orders.insert((-price_ticks, seq), order_id);
            }
            Side::Sell => {
                self.sell_orders.insert((price_ticks, seq), order_id);
            }
        }
        self.resting.insert(order_id, (side, price_ticks, seq));
    }

    fn remove_resting(&mut self, order_id: u64) -> bool {
        if let Some((side, price_ticks, seq)) = self.resting.remove(&order_id) {
            match side {
                Side::Buy => {
                    self.buy_orders.remove(&(-price_ticks, seq));
                }
                Side::Sell => {
                    self.sell_orders.remove(&(price_ticks, seq));
                }
            }
            true
        } else {
            false
        }
    }

    /// Validates a request's price/quantity, returning the snapped tick price.
    fn validate(&self, price: f64, quantity: f64) -> Result<i64, ErrorKind> {
        let (ticks, exact) = self.market_data.price_to_ticks(price);
        if !exact {
            return Err(ErrorKind::InvalidPrice);
        }
        if quantity <= 0.0 {
            return Err(ErrorKind::InvalidQuantity);
        }
        if !is_lot_multiple(quantity, self.market_data.min_trade_vol()) {
            return Err(ErrorKind::InvalidQuantity);
        }
        Ok(ticks)
    }

    fn dispatch_order_update(
        &self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: &MessageInfo,
        order_id: u64,
    ) {
        if let Some(snap) = snapshot(cache, order_id) {
            dispatcher.on_order_update(
                info,
                &OrderUpdate {
                    order_id,
                    status: snap.status,
                    remaining_quantity: snap.remaining_quantity,
                    traded_quantity: snap.traded_quantity,
                    total_cost: snap.total_cost,
                },
            );
        }
    }

    fn fill_and_dispatch(
        &self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: &MessageInfo,
        order_id: u64,
        side: Side,
        quantity: f64,
        fill_price: f64,
    ) {
        let trade_id = cache.next_trade_id();
        cache.get_order(order_id, &mut |o: &mut Order| o.apply_fill(quantity, fill_price));
        tracing::debug!(order_id, trade_id, quantity, fill_price, "fill");
        dispatcher.on_trade_update(
            info,
            &TradeUpdate {
                order_id,
                trade_id,
                side,
                quantity,
                price: fill_price,
            },
        );
        self.dispatch_order_update(cache, dispatcher, info, order_id);
    }

    /// Re-scans both resting sequences after a best-layer change, filling
    /// every head order that has become aggressive, until neither head is.
    fn match_resting_orders(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: &MessageInfo,
    ) {
        loop {
            let (bid, ask) = self.best_ticks();
            let buy_head = self
                .buy_orders
                .iter()
                .next()
                .map(|(&(neg_price, _seq), &order_id)| (order_id, -neg_price));
            if let Some((order_id, price_ticks)) = buy_head {
                if ask != NO_ASK && price_ticks >= ask {
                    self.remove_resting(order_id);
                    if let Some(snap) = snapshot(cache, order_id) {
                        self.fill_and_dispatch(
                            cache,
                            dispatcher,
                            info,
                            order_id,
                            Side::Buy,
                            snap.remaining_quantity,
                            snap.price,
                        );
                    }
                    continue;
                }
            }
            let sell_head = self
                .sell_orders
                .iter()
                .next()
                .map(|(&(price, _seq), &order_id)| (order_id, price));
            if let Some((order_id, price_ticks)) = sell_head {
                if bid != NO_BID && price_ticks <= bid {
                    self.remove_resting(order_id);
                    if let Some(snap) = snapshot(cache, order_id) {
                        self.fill_and_dispatch(
                            cache,
                            dispatcher,
                            info,
                            order_id,
                            Side::Sell,
                            snap.remaining_quantity,
                            snap.price,
                        );
                    }
                    continue;
                }
            }
            break;
        }
    }

    pub fn on_reference_data(
        &mut self,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        event: ReferenceData,
    ) {
        self.time_checker.check(&info);
        self.market_data.on_reference_data(&info, &event);
        dispatcher.on_reference_data(&info, &event);
    }

    pub fn on_market_status(
        &mut self,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        event: MarketStatus,
    ) {
        self.time_checker.check(&info);
        self.market_data.on_market_status(&info, &event);
        dispatcher.on_market_status(&info, &event);
    }

    pub fn on_top_of_book(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        event: TopOfBookUpdate,
    ) {
        self.time_checker.check(&info);
        let changed = self.market_data.on_top_of_book(&info, &event);
        dispatcher.on_top_of_book(&info, &event);
        if changed {
            self.match_resting_orders(cache, dispatcher, &info);
        }
    }

    pub fn on_market_by_price(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        event: MarketByPriceUpdate,
    ) {
        self.time_checker.check(&info);
        let changed = self.market_data.on_market_by_price(&info, &event);
        dispatcher.on_market_by_price(&info, &event);
        if changed {
            self.match_resting_orders(cache, dispatcher, &info);
        }
    }

    pub fn on_market_by_order(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        event: MarketByOrderUpdate,
    ) {
        self.time_checker.check(&info);
        let changed = self.market_data.on_market_by_order(&info, &event);
        dispatcher.on_market_by_order(&info, &event);
        if changed {
            self.match_resting_orders(cache, dispatcher, &info);
        }
    }

    pub fn on_trade_summary(
        &mut self,
        _cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        event: TradeSummary,
    ) {
        self.time_checker.check(&info);
        self.market_data.on_trade_summary(&info, &event);
        dispatcher.on_trade_summary(&info, &event);
    }

    pub fn on_statistics_update(
        &mut self,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        event: StatisticsUpdate,
    ) {
        self.time_checker.check(&info);
        self.market_data.on_statistics_update(&info, &event);
        dispatcher.on_statistics_update(&info, &event);
    }

    pub fn create_order(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        request: CreateOrderRequest,
    ) {
        self.time_checker.check(&info);
        let order_id = request.order_id;
        match self.validate(request.price, request.quantity) {
            Err(kind) => {
                tracing::debug!(order_id, error = %kind, "create order rejected");
                dispatcher.on_order_ack(
                    &info,
                    &OrderAck {
                        order_id,
                        status: RequestStatus::Rejected,
                        error: Some(kind),
                    },
                );
            }
            Ok(price_ticks) => {
                let order = Order::new(
                    order_id,
                    request.account,
                    self.config.exchange.clone(),
                    self.config.symbol.clone(),
                    request.side,
                    request.quantity,
                    request.price,
                    price_ticks,
                );
                cache.insert_order(order);
                dispatcher.on_order_ack(
                    &info,
                    &OrderAck {
                        order_id,
                        status: RequestStatus::Accepted,
                        error: None,
                    },
                );
                if self.is_aggressive(request.side, price_ticks) {
                    let fill_price = self.opposite_best_price(request.side);
                    self.fill_and_dispatch(
                        cache,
                        dispatcher,
                        &info,
                        order_id,
                        request.side,
                        request.quantity,
                        fill_price,
                    );
                } else {
                    self.add_resting(order_id, request.side, price_ticks);
                    cache.get_order(order_id, &mut |o: &mut Order| o.status = OrderStatus::Working);
                    self.dispatch_order_update(cache, dispatcher, &info, order_id);
                }
            }
        }
    }

    pub fn modify_order(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        request: ModifyOrderRequest,
    ) {
        self.time_checker.check(&info);
        let order_id = request.order_id;
        let Some(snap) = snapshot(cache, order_id) else {
            dispatcher.on_order_ack(
                &info,
                &OrderAck {
                    order_id,
                    status: RequestStatus::Rejected,
                    error: Some(ErrorKind::NotFound),
                },
            );
            return;
        };
        if snap.status.is_terminal() {
            tracing::warn!(order_id, "modify rejected: order already terminal");
            dispatcher.on_order_ack(
                &info,
                &OrderAck {
                    order_id,
                    status: RequestStatus::Rejected,
                    error: Some(ErrorKind::NotFound),
                },
            );
            return;
        }
        if request.quantity <= snap.traded_quantity {
            dispatcher.on_order_ack(
                &info,
                &OrderAck {
                    order_id,
                    status: RequestStatus::Rejected,
                    error: Some(ErrorKind::InvalidQuantity),
                },
            );
            return;
        }
        match self.validate(request.price, request.quantity) {
            Err(kind) => {
                dispatcher.on_order_ack(
                    &info,
                    &OrderAck {
                        order_id,
                        status: RequestStatus::Rejected,
                        error: Some(kind),
                    },
                );
            }
            Ok(price_ticks) => {
                self.remove_resting(order_id);
                cache.get_order(order_id, &mut |o: &mut Order| {
                    o.price = request.price;
                    o.price_ticks = price_ticks;
                    o.quantity = request.quantity;
                    o.remaining_quantity = request.quantity - o.traded_quantity;
                    o.max_request_version += 1;
                });
                dispatcher.on_order_ack(
                    &info,
                    &OrderAck {
                        order_id,
                        status: RequestStatus::Accepted,
                        error: None,
                    },
                );
                if self.is_aggressive(snap.side, price_ticks) {
                    let remaining = request.quantity - snap.traded_quantity;
                    let fill_price = self.opposite_best_price(snap.side);
                    self.fill_and_dispatch(
                        cache,
                        dispatcher,
                        &info,
                        order_id,
                        snap.side,
                        remaining,
                        fill_price,
                    );
                } else {
                    self.add_resting(order_id, snap.side, price_ticks);
                    self.dispatch_order_update(cache, dispatcher, &info, order_id);
                }
            }
        }
    }

    pub fn cancel_order(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        request: CancelOrderRequest,
    ) {
        self.time_checker.check(&info);
        let order_id = request.order_id;
        let Some(snap) = snapshot(cache, order_id) else {
            dispatcher.on_order_ack(
                &info,
                &OrderAck {
                    order_id,
                    status: RequestStatus::Rejected,
                    error: Some(ErrorKind::NotFound),
                },
            );
            return;
        };
        if snap.status.is_terminal() {
            dispatcher.on_order_ack(
                &info,
                &OrderAck {
                    order_id,
                    status: RequestStatus::Rejected,
                    error: Some(ErrorKind::NotFound),
                },
            );
            return;
        }
        self.remove_resting(order_id);
        cache.get_order(order_id, &mut |o: &mut Order| o.status = OrderStatus::Canceled);
        dispatcher.on_order_ack(
            &info,
            &OrderAck {
                order_id,
                status: RequestStatus::Accepted,
                error: None,
            },
        );
        self.dispatch_order_update(cache, dispatcher, &info, order_id);
    }

    pub fn cancel_all_orders(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        request: CancelAllOrdersRequest,
    ) {
        self.time_checker.check(&info);
        let order_ids: Vec<u64> = self.resting.keys().copied().collect();
        let mut count = 0u32;
        for order_id in order_ids {
            if let Some(filter_id) = request.order_id {
                if filter_id != order_id {
                    continue;
                }
            }
            let Some(snap) = snapshot(cache, order_id) else {
                continue;
            };
            if let Some(account) = &request.account {
                if account != &snap.account {
                    continue;
                }
            }
            self.remove_resting(order_id);
            cache.get_order(order_id, &mut |o: &mut Order| o.status = OrderStatus::Canceled);
            self.dispatch_order_update(cache, dispatcher, &info, order_id);
            count += 1;
        }
        if count == 0 {
            tracing::warn!("cancel-all matched zero orders");
        }
        dispatcher.on_cancel_all_orders_ack(&info, &CancelAllOrdersAck { count });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::MarketDataSource;
    use crate::testing::{message_info, reference_data, top_of_book, RecordingDispatcher, VecOrderCache};

    fn matcher() -> SimpleMatcher {
        SimpleMatcher::new(MatcherConfig {
            source: 0,
            exchange: "EX".into(),
            symbol: "SYM".into(),
            market_data_source: MarketDataSource::TopOfBook,
        })
    }

    fn seed(matcher: &mut SimpleMatcher, dispatcher: &mut RecordingDispatcher) {
        matcher.on_reference_data(dispatcher, message_info(1), reference_data(0.5, 1));
    }

    #[test]
    fn s1_immediate_aggressive_fill() {
        let mut matcher = matcher();
        let mut cache = VecOrderCache::new();
        let mut dispatcher = RecordingDispatcher::new();
        seed(&mut matcher, &mut dispatcher);
        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(2), top_of_book(100.0, 1.0, 100.5, 1.0));

        matcher.create_order(
            &mut cache,
            &mut dispatcher,
            message_info(3),
            CreateOrderRequest {
                order_id: 1,
                account: "acct".into(),
                exchange: "EX".into(),
                symbol: "SYM".into(),
                side: Side::Buy,
                quantity: 2.0,
                price: 100.5,
            },
        );

        let acks = dispatcher.order_acks();
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].status, RequestStatus::Accepted);
        let trades = dispatcher.trade_updates();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 2.0);
        assert_eq!(trades[0].price, 100.5);
        let updates = dispatcher.order_updates();
        assert_eq!(updates.last().unwrap().status, OrderStatus::Completed);
        assert_eq!(updates.last().unwrap().remaining_quantity, 0.0);
    }

    #[test]
    fn s2_rest_then_passive_fill() {
        let mut matcher = matcher();
        let mut cache = VecOrderCache::new();
        let mut dispatcher = RecordingDispatcher::new();
        seed(&mut matcher, &mut dispatcher);
        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(2), top_of_book(100.0, 1.0, 100.5, 1.0));

        matcher.create_order(
            &mut cache,
            &mut dispatcher,
            message_info(3),
            CreateOrderRequest {
                order_id: 1,
                account: "acct".into(),
                exchange: "EX".into(),
                symbol: "SYM".into(),
                side: Side::Buy,
                quantity: 1.0,
                price: 100.0,
            },
        );
        assert_eq!(dispatcher.order_acks()[0].status, RequestStatus::Accepted);
        assert_eq!(dispatcher.order_updates()[0].status, OrderStatus::Working);

        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(4), top_of_book(99.5, 1.0, 100.0, 1.0));
        let trades = dispatcher.trade_updates();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 100.0);
        assert_eq!(dispatcher.order_updates().last().unwrap().status, OrderStatus::Completed);
    }

    #[test]
    fn s3_fifo_within_level() {
        let mut matcher = matcher();
        let mut cache = VecOrderCache::new();
        let mut dispatcher = RecordingDispatcher::new();
        seed(&mut matcher, &mut dispatcher);
        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(2), top_of_book(100.0, 1.0, 100.5, 1.0));

        for order_id in [1u64, 2u64] {
            matcher.create_order(
                &mut cache,
                &mut dispatcher,
                message_info(3),
                CreateOrderRequest {
                    order_id,
                    account: "acct".into(),
                    exchange: "EX".into(),
                    symbol: "SYM".into(),
                    side: Side::Buy,
                    quantity: 1.0,
                    price: 100.0,
                },
            );
        }

        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(4), top_of_book(99.5, 1.0, 100.0, 1.0));
        let trades = dispatcher.trade_updates();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].order_id, 1);
        assert_eq!(trades[1].order_id, 2);
    }

    #[test]
    fn s4_modify_loses_priority() {
        let mut matcher = matcher();
        let mut cache = VecOrderCache::new();
        let mut dispatcher = RecordingDispatcher::new();
        seed(&mut matcher, &mut dispatcher);
        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(2), top_of_book(100.0, 1.0, 100.5, 1.0));

        for order_id in [1u64, 2u64] {
            matcher.create_order(
                &mut cache,
                &mut dispatcher,
                message_info(3),
                CreateOrderRequest {
                    order_id,
                    account: "acct".into(),
                    exchange: "EX".into(),
                    symbol: "SYM".into(),
                    side: Side::Buy,
                    quantity: 1.0,
                    price: 100.0,
                },
            );
        }

        matcher.modify_order(
            &mut cache,
            &mut dispatcher,
            message_info(4),
            ModifyOrderRequest { order_id: 1, price: 100.0, quantity: 2.0 },
        );

        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(5), top_of_book(99.5, 1.0, 100.0, 1.0));
        let trades = dispatcher.trade_updates();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].order_id, 2);
        assert_eq!(trades[1].order_id, 1);
    }

    #[test]
    fn s5_tick_snap_reject() {
        let mut matcher = matcher();
        let mut cache = VecOrderCache::new();
        let mut dispatcher = RecordingDispatcher::new();
        seed(&mut matcher, &mut dispatcher);

        matcher.create_order(
            &mut cache,
            &mut dispatcher,
            message_info(3),
            CreateOrderRequest {
                order_id: 1,
                account: "acct".into(),
                exchange: "EX".into(),
                symbol: "SYM".into(),
                side: Side::Buy,
                quantity: 1.0,
                price: 100.25,
            },
        );

        let acks = dispatcher.order_acks();
        assert_eq!(acks.len(), 1);
        assert_eq!(acks[0].status, RequestStatus::Rejected);
        assert_eq!(acks[0].error, Some(ErrorKind::InvalidPrice));
        assert!(dispatcher.order_updates().is_empty());
    }

    #[test]
    fn invariant_6_create_then_cancel_round_trip() {
        let mut matcher = matcher();
        let mut cache = VecOrderCache::new();
        let mut dispatcher = RecordingDispatcher::new();
        seed(&mut matcher, &mut dispatcher);
        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(2), top_of_book(100.0, 1.0, 100.5, 1.0));

        matcher.create_order(
            &mut cache,
            &mut dispatcher,
            message_info(3),
            CreateOrderRequest {
                order_id: 1,
                account: "acct".into(),
                exchange: "EX".into(),
                symbol: "SYM".into(),
                side: Side::Buy,
                quantity: 1.0,
                price: 100.0,
            },
        );
        matcher.cancel_order(&mut cache, &mut dispatcher, message_info(4), CancelOrderRequest { order_id: 1 });

        let updates = dispatcher.order_updates();
        assert_eq!(updates[0].status, OrderStatus::Working);
        assert_eq!(updates[1].status, OrderStatus::Canceled);
        assert!(dispatcher.trade_updates().is_empty());
    }

    #[test]
    fn cancel_all_filters_by_account() {
        let mut matcher = matcher();
        let mut cache = VecOrderCache::new();
        let mut dispatcher = RecordingDispatcher::new();
        seed(&mut matcher, &mut dispatcher);
        matcher.on_top_of_book(&mut cache, &mut dispatcher, message_info(2), top_of_book(100.0, 1.0, 100.5, 1.0));

        matcher.create_order(
            &mut cache,
            &mut dispatcher,
            message_info(3),
            CreateOrderRequest {
                order_id: 1,
                account: "a".into(),
                exchange: "EX".into(),
                symbol: "SYM".into(),
                side: Side::Buy,
                quantity: 1.0,
                price: 100.0,
            },
        );
        matcher.create_order(
            &mut cache,
            &mut dispatcher,
            message_info(3),
            CreateOrderRequest {
                order_id: 2,
                account: "b".into(),
                exchange: "EX".into(),
                symbol: "SYM".into(),
                side: Side::Buy,
                quantity: 1.0,
                price: 100.0,
            },
        );

        matcher.cancel_all_orders(
            &mut cache,
            &mut dispatcher,
            message_info(4),
            CancelAllOrdersRequest { account: Some("a".into()), order_id: None },
        );

        assert_eq!(cache.order(1).unwrap().status, OrderStatus::Canceled);
        assert_eq!(cache.order(2).unwrap().status, OrderStatus::Working);
    }
}

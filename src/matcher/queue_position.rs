//! Simple matcher plus a per-order queue-ahead estimate derived from public
//! trade prints, for more realistic passive-fill timing in backtests.

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

#[derive(Debug, Clone, Copy)]
struct RestingOrder {
    side: Side,
    price_ticks: i64,
    seq: u64,
    /// Estimated volume ahead of us in the queue at `price_ticks`.
    /// Invariant: `0 <= ahead <= displayed_level_volume`.
    ahead: f64,
}

pub struct QueuePositionMatcher {
    config: MatcherConfig,
    market_data: MarketData,
    time_checker: TimeChecker,
    buy_orders: BTreeMap<(i64, u64), u64>,
    sell_orders: BTreeMap<(i64, u64), u64>,
    resting: std::collections::HashMap<u64, RestingOrder>,
    next_seq: u64,
}

impl QueuePositionMatcher {
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
        let ahead = self.market_data.displayed_quantity(side, price_ticks);
        match side {
            Side::Buy => {
                self.buy_orders.insert((-price_ticks, seq), order_id);
            }
            Side::Sell => {
                self.sell_orders.insert((price_ticks, seq), order_id);
            }
        }
        self.resting.insert(
            order_id,
            RestingOrder {
                side,
                price_ticks,
                seq,
                ahead,
            },
        );
    }

    fn remove_resting(&mut self, order_id: u64) -> bool {
        if let Some(entry) = self.resting.remove(&order_id) {
            match entry.side {
                Side::Buy => {
                    self.buy_orders.remove(&(-entry.price_ticks, entry.seq));
                }
                Side::Sell => {
                    self.sell_orders.remove(&(entry.price_ticks, entry.seq));
                }
            }
            true
        } else {
            false
        }
    }

    fn level_order_ids(&self, side: Side, price_ticks: i64) -> Vec<u64> {
        match side {
            Side::Buy => self
                .buy_orders
                .range((-price_ticks, 0)..=(-price_ticks, u64::MAX))
                .map(|(_, &order_id)| order_id)
                .collect(),
            Side::Sell => self
                .sell_orders
                .range((price_ticks, 0)..=(price_ticks, u64::MAX))
                .map(|(_, &order_id)| order_id)
                .collect(),
        }
    }

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

    /// Clamps `ahead` down to the newly displayed level volume wherever a
    /// refresh has revealed less is standing in front of us than we thought.
    /// Never raises `ahead`: a refresh that shows *more* volume does not mean
    /// more volume queued ahead of an order already resting there.
    fn clamp_ahead_from_book(&mut self) {
        let order_ids: Vec<u64> = self.resting.keys().copied().collect();
        for order_id in order_ids {
            let (side, price_ticks, ahead) = {
                let entry = &self.resting[&order_id];
                (entry.side, entry.price_ticks, entry.ahead)
            };
            let displayed = self.market_data.displayed_quantity(side, price_ticks);
            if displayed < ahead {
                self.resting.get_mut(&order_id).unwrap().ahead = displayed;
            }
        }
    }

    /// Applies one trade print's quantity against the queue at
    /// `(side, price_ticks)`, in priority order: consumes `ahead` first,
    /// then fills whatever resting order reaches the front while residual
    /// volume remains, then carries the remainder to the next order.
    fn apply_trade_print(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: &MessageInfo,
        side: Side,
        price_ticks: i64,
        mut residual: f64,
    ) {
        for order_id in self.level_order_ids(side, price_ticks) {
            if residual <= 0.0 {
                break;
            }
            let ahead = match self.resting.get(&order_id) {
                Some(entry) => entry.ahead,
                None => continue,
            };
            let consumed = ahead.min(residual);
            let new_ahead = (ahead - consumed).max(0.0);
            if let Some(entry) = self.resting.get_mut(&order_id) {
                entry.ahead = new_ahead;
            }
            residual -= consumed;
            if new_ahead <= 0.0 && residual > 0.0 {
                if let Some(snap) = snapshot(cache, order_id) {
                    let fill_qty = snap.remaining_quantity.min(residual);
                    if fill_qty > 0.0 {
                        let completes = snap.remaining_quantity <= residual;
                        if completes {
                            self.remove_resting(order_id);
                        }
                        self.fill_and_dispatch(cache, dispatcher, info, order_id, side, fill_qty, snap.price);
                        residual -= fill_qty;
                    }
                }
            }
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
        self.clamp_ahead_from_book();
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
        self.clamp_ahead_from_book();
        if changed {
            self.match_resting_orders(cache, dispatcher, &info);
        }
    }

    pub fn on_trade_summary(
        &mut self,
        cache: &mut dyn OrderCache,
        dispatcher: &mut dyn MatcherDispatcher,
        info: MessageInfo,
        event: TradeSummary,
    ) {
        self.time_checker.check(&info);
        self.market_data.on_trade_summary(&info, &event);
        dispatcher.on_trade_summary(&info, &event);
        for trade in &event.trades {
            let (ticks, exact) = self.market_data.price_to_ticks(trade.price);
            if !exact {
                continue;
            }
            if !self.buy_orders.is_empty() {
                self.apply_trade_print(cache, dispatcher, &info, Side::Buy, ticks, trade.quantity);
            }
            if !self.sell_orders.is_empty() {
                self.apply_trade_print(cache, dispatcher, &info, Side::Sell, ticks, trade.quantity);
            }
        }
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

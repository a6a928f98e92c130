//! Multi-leg spread-trading strategy: watches the spread between a
//! reference leg and every other configured leg, and drives marketable
//! limit orders through an [`OrderRouter`] when the spread clears a
//! threshold and the reference leg's position limits allow it.

use std::collections::HashMap;
use std::time::Duration;

use crate::dispatch::{
    CancelOrderRequest, CreateOrderRequest, MatcherDispatcher, OrderAck, OrderUpdate,
    RequestStatus, TradeUpdate,
};
use crate::market_data::{
    MarketByOrderUpdate, MarketByPriceUpdate, MarketDataSource, ReferenceData, TopOfBookUpdate,
};
use crate::message::MessageInfo;
use crate::order::Side;
use crate::strategy::{Instrument, Leg, LegsFile, OrderState, Source};

/// Runtime parameters, as produced by [`crate::config::parse_params`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbitrageParameters {
    pub market_data_source: MarketDataSource,
    pub max_age: Duration,
    /// Absolute spread must exceed this before trading.
    pub threshold: f64,
    /// Trade size on leg 0; other legs trade the same size in this
    /// simplified strategy (the implementer may scale by relative
    /// multiplier for a production variant).
    pub quantity_0: f64,
    pub min_position_0: f64,
    pub max_position_0: f64,
    pub publish_source: u8,
}

pub struct ArbitrageStrategy {
    strategy_id: String,
    parameters: ArbitrageParameters,
    instruments: Vec<Instrument>,
    sources: HashMap<u8, Source>,
    pairs: Vec<(usize, usize)>,
    next_order_id: u64,
    /// The two instrument indices of the currently in-flight attempt, if any.
    pending_attempt: Option<Vec<usize>>,
}

impl ArbitrageStrategy {
    pub fn new(config: LegsFile, parameters: ArbitrageParameters) -> Self {
        assert!(config.legs.len() >= 2, "arbitrage strategy requires at least 2 legs");
        let mut instruments = Vec::with_capacity(config.legs.len());
        let mut sources: HashMap<u8, Source> = HashMap::new();
        for (idx, leg) in config.legs.into_iter().enumerate() {
            sources
                .entry(leg.source)
                .or_insert_with(Source::new)
                .instrument_index
                .insert((leg.exchange.clone(), leg.symbol.clone()), idx);
            instruments.push(Instrument::new(leg, parameters.market_data_source));
        }
        let pairs = (1..instruments.len()).map(|i| (0usize, i)).collect();
        Self {
            strategy_id: config.strategy_id,
            parameters,
            instruments,
            sources,
            pairs,
            next_order_id: 0,
            pending_attempt: None,
        }
    }

    pub fn strategy_id(&self) -> &str {
        &self.strategy_id
    }

    pub fn instrument(&self, idx: usize) -> &Instrument {
        &self.instruments[idx]
    }

    fn allocate_order_id(&mut self) -> u64 {
        self.next_order_id += 1;
        self.next_order_id
    }

    // ---- lifecycle events -------------------------------------------------

    pub fn on_connected(&mut self, source: u8) {
        self.sources.entry(source).or_insert_with(Source::new).connected = true;
    }

    pub fn on_disconnected(&mut self, source: u8) {
        if let Some(entry) = self.sources.get_mut(&source) {
            entry.connected = false;
            entry.ready = false;
            entry.download_end = false;
            entry.live_orders.clear();
        }
        for instrument in self.instruments.iter_mut().filter(|i| i.leg.source == source) {
            instrument.reset();
        }
        tracing::info!(source, "source disconnected, legs reset");
    }

    pub fn on_download_end(&mut self, source: u8) {
        self.sources.entry(source).or_insert_with(Source::new).download_end = true;
    }

    pub fn on_ready(&mut self, source: u8) {
        self.sources.entry(source).or_insert_with(Source::new).ready = true;
        tracing::info!(source, "source ready");
    }

    pub fn on_position_update(&mut self, source: u8, exchange: &str, symbol: &str, position: f64) {
        let idx = self
            .sources
            .get(&source)
            .and_then(|s| s.instrument_index.get(&(exchange.to_string(), symbol.to_string())))
            .copied();
        match idx {
            Some(idx) => self.instruments[idx].position.set_position(position),
            None => tracing::debug!(source, exchange, symbol, "position update for unknown instrument ignored"),
        }
    }

    // ---- per-leg market data -----------------------------------------------

    fn on_leg_reference_data(&mut self, leg_index: usize, info: &MessageInfo, event: &ReferenceData) {
        self.instruments[leg_index].market_data.on_reference_data(info, event);
    }

    fn on_leg_top_of_book(
        &mut self,
        leg_index: usize,
        info: &MessageInfo,
        event: &TopOfBookUpdate,
        router: &mut dyn crate::dispatch::OrderRouter,
    ) {
        let changed = self.instruments[leg_index].market_data.on_top_of_book(info, event);
        if changed {
            self.evaluate_pairs_touching(leg_index, info, router);
        }
    }

    fn on_leg_market_by_price(
        &mut self,
        leg_index: usize,
        info: &MessageInfo,
        event: &MarketByPriceUpdate,
        router: &mut dyn crate::dispatch::OrderRouter,
    ) {
        let changed = self.instruments[leg_index].market_data.on_market_by_price(info, event);
        if changed {
            self.evaluate_pairs_touching(leg_index, info, router);
        }
    }

    fn on_leg_market_by_order(
        &mut self,
        leg_index: usize,
        info: &MessageInfo,
        event: &MarketByOrderUpdate,
        router: &mut dyn crate::dispatch::OrderRouter,
    ) {
        let changed = self.instruments[leg_index].market_data.on_market_by_order(info, event);
        if changed {
            self.evaluate_pairs_touching(leg_index, info, router);
        }
    }

    // ---- per-leg order lifecycle --------------------------------------------

    fn on_leg_order_ack(
        &mut self,
        leg_index: usize,
        info: &MessageInfo,
        event: &OrderAck,
        router: &mut dyn crate::dispatch::OrderRouter,
    ) {
        if self.instruments[leg_index].order_id != Some(event.order_id) {
            return;
        }
        match event.status {
            RequestStatus::Accepted => {
                self.instruments[leg_index].order_state = OrderState::Working;
                tracing::info!(leg_index, order_id = event.order_id, "leg order accepted");
            }
            RequestStatus::Rejected => {
                tracing::info!(leg_index, order_id = event.order_id, error = ?event.error, "leg order rejected, aborting attempt");
                let _ = info;
                self.abort_attempt(leg_index, router);
            }
        }
    }

    fn on_leg_order_update(&mut self, leg_index: usize, _info: &MessageInfo, event: &OrderUpdate) {
        if self.instruments[leg_index].order_id != Some(event.order_id) {
            return;
        }
        if event.status.is_terminal() {
            tracing::info!(leg_index, order_id = event.order_id, status = ?event.status, "leg order terminal");
            self.reset_leg(leg_index);
            self.clear_attempt_if_drained();
        } else {
            self.instruments[leg_index].order_state = OrderState::Working;
        }
    }

    fn on_leg_trade_update(&mut self, leg_index: usize, _info: &MessageInfo, event: &TradeUpdate) {
        self.instruments[leg_index].position.on_fill(event.side, event.quantity);
    }

    fn reset_leg(&mut self, idx: usize) {
        self.instruments[idx].order_state = OrderState::Idle;
        self.instruments[idx].order_id = None;
    }

    fn clear_attempt_if_drained(&mut self) {
        if let Some(attempt) = &self.pending_attempt {
            if attempt.iter().all(|&idx| self.instruments[idx].order_id.is_none()) {
                self.pending_attempt = None;
            }
        }
    }

    /// A reject on any leg of an attempt aborts the whole attempt: the
    /// rejected leg goes straight to idle, and any sibling that had already
    /// been accepted is cancelled and returned to idle as soon as its
    /// cancel is acknowledged.
    fn abort_attempt(&mut self, failed_leg_index: usize, router: &mut dyn crate::dispatch::OrderRouter) {
        let attempt = match self.pending_attempt.take() {
            Some(attempt) => attempt,
            None => {
                self.reset_leg(failed_leg_index);
                return;
            }
        };
        for idx in attempt {
            if idx == failed_leg_index {
                self.reset_leg(idx);
                continue;
            }
            if self.instruments[idx].order_state == OrderState::Working {
                if let Some(order_id) = self.instruments[idx].order_id {
                    let source = self.instruments[idx].leg.source;
                    router.send_cancel_order(CancelOrderRequest { order_id }, source, true);
                }
            }
            self.reset_leg(idx);
        }
    }

    // ---- spread signal -----------------------------------------------------

    fn is_instrument_ready(&self, idx: usize, info: &MessageInfo) -> bool {
        let instrument = &self.instruments[idx];
        let source_ready = self
            .sources
            .get(&instrument.leg.source)
            .map(Source::is_ready)
            .unwrap_or(false);
        source_ready
            && instrument.market_data.has_tick_size()
            && instrument.market_data.is_market_active(info, self.parameters.max_age)
            && instrument.is_idle()
    }

    fn evaluate_pairs_touching(
        &mut self,
        leg_index: usize,
        info: &MessageInfo,
        router: &mut dyn crate::dispatch::OrderRouter,
    ) {
        let pairs: Vec<(usize, usize)> = self
            .pairs
            .iter()
            .copied()
            .filter(|&(lhs, rhs)| lhs == leg_index || rhs == leg_index)
            .collect();
        for (lhs, rhs) in pairs {
            self.evaluate_pair(lhs, rhs, info, router);
        }
    }

    fn evaluate_pair(
        &mut self,
        lhs_idx: usize,
        rhs_idx: usize,
        info: &MessageInfo,
        router: &mut dyn crate::dispatch::OrderRouter,
    ) {
        if !self.is_instrument_ready(lhs_idx, info) || !self.is_instrument_ready(rhs_idx, info) {
            return;
        }
        let lhs_layer = *self.instruments[lhs_idx].market_data.top_of_book();
        let rhs_layer = *self.instruments[rhs_idx].market_data.top_of_book();
        if !lhs_layer.has_bid() || !lhs_layer.has_ask() || !rhs_layer.has_bid() || !rhs_layer.has_ask() {
            return;
        }

        let spread_buy_lhs = rhs_layer.bid_price - lhs_layer.ask_price;
        let spread_sell_lhs = lhs_layer.bid_price - rhs_layer.ask_price;
        let position_0 = self.instruments[0].position.current_position();
        let quantity_0 = self.parameters.quantity_0;

        let can_buy = spread_buy_lhs > self.parameters.threshold
            && position_0 + quantity_0 <= self.parameters.max_position_0;
        let can_sell = spread_sell_lhs > self.parameters.threshold
            && position_0 - quantity_0 >= self.parameters.min_position_0;

        let arm_buy_lhs = match (can_buy, can_sell) {
            (true, true) => spread_buy_lhs.abs() >= spread_sell_lhs.abs(),
            (true, false) => true,
            (false, true) => false,
            (false, false) => return,
        };

        if arm_buy_lhs {
            self.arm_pair(lhs_idx, rhs_idx, Side::Buy, lhs_layer.ask_price, rhs_layer.bid_price, router);
        } else {
            self.arm_pair(lhs_idx, rhs_idx, Side::Sell, lhs_layer.bid_price, rhs_layer.ask_price, router);
        }
    }

    fn arm_pair(
        &mut self,
        lhs_idx: usize,
        rhs_idx: usize,
        lhs_side: Side,
        lhs_price: f64,
        rhs_price: f64,
        router: &mut dyn crate::dispatch::OrderRouter,
    ) {
        let rhs_side = lhs_side.opposite();
        let quantity = self.parameters.quantity_0;
        let lhs_leg = self.instruments[lhs_idx].leg.clone_for_order();
        let rhs_leg = self.instruments[rhs_idx].leg.clone_for_order();

        let lhs_order_id = self.allocate_order_id();
        let rhs_order_id = self.allocate_order_id();

        self.instruments[lhs_idx].order_state = OrderState::Create;
        self.instruments[lhs_idx].order_id = Some(lhs_order_id);
        self.instruments[rhs_idx].order_state = OrderState::Create;
        self.instruments[rhs_idx].order_id = Some(rhs_order_id);
        self.pending_attempt = Some(vec![lhs_idx, rhs_idx]);

        self.sources.entry(lhs_leg.source).or_insert_with(Source::new).live_orders.insert(lhs_order_id, lhs_idx);
        self.sources.entry(rhs_leg.source).or_insert_with(Source::new).live_orders.insert(rhs_order_id, rhs_idx);

        tracing::info!(lhs_order_id, rhs_order_id, ?lhs_side, "arbitrage pair armed");

        router.send_create_order(
            CreateOrderRequest {
                order_id: lhs_order_id,
                account: lhs_leg.account,
                exchange: lhs_leg.exchange,
                symbol: lhs_leg.symbol,
                side: lhs_side,
                quantity,
                price: lhs_price,
            },
            lhs_leg.source,
            false,
        );
        router.send_create_order(
            CreateOrderRequest {
                order_id: rhs_order_id,
                account: rhs_leg.account,
                exchange: rhs_leg.exchange,
                symbol: rhs_leg.symbol,
                side: rhs_side,
                quantity,
                price: rhs_price,
            },
            rhs_leg.source,
            true,
        );
    }
}

/// Thin per-leg adapter: routes matcher dispatch events for one leg's
/// matcher into the strategy, since each `SimpleMatcher`/`QueuePositionMatcher`
/// instance is itself scoped to a single (source, exchange, symbol) and has
/// no notion of which leg index it corresponds to.
pub struct LegDispatcher<'a> {
    strategy: &'a mut ArbitrageStrategy,
    router: &'a mut dyn crate::dispatch::OrderRouter,
    leg_index: usize,
}

impl<'a> LegDispatcher<'a> {
    pub fn wrap(
        strategy: &'a mut ArbitrageStrategy,
        router: &'a mut dyn crate::dispatch::OrderRouter,
        leg_index: usize,
    ) -> Self {
        Self { strategy, router, leg_index }
    }
}

impl<'a> MatcherDispatcher for LegDispatcher<'a> {
    fn on_reference_data(&mut self, info: &MessageInfo, event: &ReferenceData) {
        self.strategy.on_leg_reference_data(self.leg_index, info, event);
    }

    fn on_top_of_book(&mut self, info: &MessageInfo, event: &TopOfBookUpdate) {
        self.strategy.on_leg_top_of_book(self.leg_index, info, event, &mut *self.router);
    }

    fn on_market_by_price(&mut self, info: &MessageInfo, event: &MarketByPriceUpdate) {
        self.strategy.on_leg_market_by_price(self.leg_index, info, event, &mut *self.router);
    }

    fn on_market_by_order(&mut self, info: &MessageInfo, event: &MarketByOrderUpdate) {
        self.strategy.on_leg_market_by_order(self.leg_index, info, event, &mut *self.router);
    }

    fn on_order_ack(&mut self, info: &MessageInfo, event: &OrderAck) {
        self.strategy.on_leg_order_ack(self.leg_index, info, event, &mut *self.router);
    }

    fn on_order_update(&mut self, info: &MessageInfo, event: &OrderUpdate) {
        self.strategy.on_leg_order_update(self.leg_index, info, event);
    }

    fn on_trade_update(&mut self, info: &MessageInfo, event: &TradeUpdate) {
        self.strategy.on_leg_trade_update(self.leg_index, info, event);
    }
}

impl Leg {
    /// Cheap owned copy of the fields an order request needs, without
    /// cloning the whole `Leg` (which also carries enums pass-through
    /// fields not needed on the hot path).
    fn clone_for_order(&self) -> LegOrderFields {
        LegOrderFields {
            source: self.source,
            account: self.account.clone(),
            exchange: self.exchange.clone(),
            symbol: self.symbol.clone(),
        }
    }
}

struct LegOrderFields {
    source: u8,
    account: String,
    exchange: String,
    symbol: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::MarketDataSource;
    use crate::order::OrderStatus;
    use crate::strategy::{MarginMode, PositionEffect, TimeInForce};
    use crate::testing::{message_info, reference_data, top_of_book, RecordingDispatcher};

    fn leg(source: u8, exchange: &str, symbol: &str) -> Leg {
        Leg {
            source,
            account: "acct".into(),
            exchange: exchange.into(),
            symbol: symbol.into(),
            position_effect: PositionEffect::Open,
            margin_mode: MarginMode::Cross,
            time_in_force: TimeInForce::Ioc,
        }
    }

    fn params() -> ArbitrageParameters {
        ArbitrageParameters {
            market_data_source: MarketDataSource::TopOfBook,
            max_age: Duration::from_secs(10),
            threshold: 0.5,
            quantity_0: 1.0,
            min_position_0: -10.0,
            max_position_0: 10.0,
            publish_source: 0,
        }
    }

    #[derive(Default)]
    struct RecordingRouter {
        creates: Vec<CreateOrderRequest>,
        cancels: Vec<CancelOrderRequest>,
    }

    impl crate::dispatch::OrderRouter for RecordingRouter {
        fn send_create_order(&mut self, request: CreateOrderRequest, _source: u8, _is_last: bool) {
            self.creates.push(request);
        }
        fn send_modify_order(&mut self, _request: crate::dispatch::ModifyOrderRequest, _source: u8, _is_last: bool) {}
        fn send_cancel_order(&mut self, request: CancelOrderRequest, _source: u8, _is_last: bool) {
            self.cancels.push(request);
        }
        fn send_cancel_all_orders(&mut self, _request: crate::dispatch::CancelAllOrdersRequest, _source: u8) {}
    }

    fn ready_strategy() -> ArbitrageStrategy {
        let config = LegsFile {
            strategy_id: "arb-1".into(),
            legs: vec![leg(0, "EX0", "SYM0"), leg(0, "EX1", "SYM1")],
        };
        let mut strategy = ArbitrageStrategy::new(config, params());
        strategy.on_connected(0);
        strategy.on_download_end(0);
        strategy.on_ready(0);
        strategy
    }

    #[test]
    fn s6_arbitrage_entry() {
        let mut strategy = ready_strategy();
        let mut router = RecordingRouter::default();
        let info = message_info(1);

        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 0);
            dispatcher.on_reference_data(&info, &reference_data(0.01, 2));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 1);
            dispatcher.on_reference_data(&info, &reference_data(0.01, 2));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 0);
            dispatcher.on_top_of_book(&info, &top_of_book(10.0, 1.0, 10.1, 1.0));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 1);
            dispatcher.on_top_of_book(&info, &top_of_book(11.0, 1.0, 11.1, 1.0));
        }

        assert_eq!(router.creates.len(), 2);
        assert_eq!(router.creates[0].side, Side::Buy);
        assert_eq!(router.creates[0].price, 10.1);
        assert_eq!(router.creates[1].side, Side::Sell);
        assert_eq!(router.creates[1].price, 11.0);
        assert_eq!(strategy.instrument(0).order_state, OrderState::Create);
        assert_eq!(strategy.instrument(1).order_state, OrderState::Create);

        let lhs_order_id = router.creates[0].order_id;
        let rhs_order_id = router.creates[1].order_id;
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 0);
            dispatcher.on_order_ack(&info, &OrderAck { order_id: lhs_order_id, status: RequestStatus::Accepted, error: None });
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 1);
            dispatcher.on_order_ack(&info, &OrderAck { order_id: rhs_order_id, status: RequestStatus::Accepted, error: None });
        }

        assert_eq!(strategy.instrument(0).order_state, OrderState::Working);
        assert_eq!(strategy.instrument(1).order_state, OrderState::Working);
    }

    #[test]
    fn reject_on_one_leg_cancels_accepted_sibling() {
        let mut strategy = ready_strategy();
        let mut router = RecordingRouter::default();
        let info = message_info(1);

        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 0);
            dispatcher.on_reference_data(&info, &reference_data(0.01, 2));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 1);
            dispatcher.on_reference_data(&info, &reference_data(0.01, 2));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 0);
            dispatcher.on_top_of_book(&info, &top_of_book(10.0, 1.0, 10.1, 1.0));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 1);
            dispatcher.on_top_of_book(&info, &top_of_book(11.0, 1.0, 11.1, 1.0));
        }

        let lhs_order_id = router.creates[0].order_id;
        let rhs_order_id = router.creates[1].order_id;

        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 0);
            dispatcher.on_order_ack(&info, &OrderAck { order_id: lhs_order_id, status: RequestStatus::Accepted, error: None });
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 1);
            dispatcher.on_order_ack(
                &info,
                &OrderAck { order_id: rhs_order_id, status: RequestStatus::Rejected, error: Some(crate::order::ErrorKind::InvalidPrice) },
            );
        }

        assert_eq!(strategy.instrument(1).order_state, OrderState::Idle);
        assert_eq!(strategy.instrument(0).order_state, OrderState::Idle);
        assert_eq!(router.cancels.len(), 1);
        assert_eq!(router.cancels[0].order_id, lhs_order_id);
    }

    #[test]
    fn readiness_gating_blocks_entry_before_download_end() {
        let config = LegsFile {
            strategy_id: "arb-1".into(),
            legs: vec![leg(0, "EX0", "SYM0"), leg(0, "EX1", "SYM1")],
        };
        let mut strategy = ArbitrageStrategy::new(config, params());
        strategy.on_connected(0);
        // no on_download_end / on_ready yet
        let mut router = RecordingRouter::default();
        let info = message_info(1);

        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 0);
            dispatcher.on_reference_data(&info, &reference_data(0.01, 2));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 1);
            dispatcher.on_reference_data(&info, &reference_data(0.01, 2));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 0);
            dispatcher.on_top_of_book(&info, &top_of_book(10.0, 1.0, 10.1, 1.0));
        }
        {
            let mut dispatcher = LegDispatcher::wrap(&mut strategy, &mut router, 1);
            dispatcher.on_top_of_book(&info, &top_of_book(11.0, 1.0, 11.1, 1.0));
        }

        assert!(router.creates.is_empty());
    }
}

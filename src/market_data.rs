//! Absorbs reference data, trading status, and book updates into a single
//! derived best bid/ask layer.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::message::MessageInfo;
use crate::tick::{Precision, TickPricer};

/// Which market-data feed a [`MarketData`] aggregator (and therefore a
/// matcher or arbitrage leg) is configured to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketDataSource {
    TopOfBook,
    MarketByPrice,
    MarketByOrder,
}

/// `(bid_price, bid_quantity, ask_price, ask_quantity)`; NaN means "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Layer {
    pub bid_price: f64,
    pub bid_quantity: f64,
    pub ask_price: f64,
    pub ask_quantity: f64,
}

impl Layer {
    pub fn unknown() -> Self {
        Self {
            bid_price: f64::NAN,
            bid_quantity: f64::NAN,
            ask_price: f64::NAN,
            ask_quantity: f64::NAN,
        }
    }

    pub fn has_bid(&self) -> bool {
        crate::tick::is_known(self.bid_price)
    }

    pub fn has_ask(&self) -> bool {
        crate::tick::is_known(self.ask_price)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradingStatus {
    #[default]
    Unknown,
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct ReferenceData {
    pub tick_size: f64,
    pub precision: Precision,
    pub multiplier: f64,
    pub min_trade_vol: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct MarketStatus {
    pub trading_status: TradingStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct TopOfBookUpdate {
    pub layer: Layer,
}

/// A single depth level. `quantity == 0.0` removes the level.
#[derive(Debug, Clone, Copy)]
pub struct PriceLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Market-by-price update: a batch of level replacements on each side.
#[derive(Debug, Clone, Default)]
pub struct MarketByPriceUpdate {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

/// Market-by-order update.
///
/// The core never reconstructs order-level book state for matching purposes
/// (see the explicit non-goal in the specification); it folds order add/
/// modify/cancel events into the same aggregate price-level map the
/// market-by-price path uses, since only the derived best bid/ask matters
/// here.
#[derive(Debug, Clone, Default)]
pub struct MarketByOrderUpdate {
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

#[derive(Debug, Clone, Copy)]
pub struct Trade {
    pub price: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TradeSummary {
    pub trades: Vec<Trade>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticsUpdate {
    pub kind: u8,
    pub value: f64,
}

/// Per-(exchange, symbol) market-data aggregator.
///
/// Owns a `TickPricer`, the trading-status/reference-data snapshot, and (for
/// `MarketByPrice`/`MarketByOrder` sources) a full depth map that is
/// collapsed to the best layer after every update.
#[derive(Debug, Clone)]
pub struct MarketData {
    source: MarketDataSource,
    tick_pricer: TickPricer,
    multiplier: f64,
    min_trade_vol: f64,
    trading_status: TradingStatus,
    last_exchange_time_utc: u64,
    best: Layer,
    bids: BTreeMap<i64, f64>,
    asks: BTreeMap<i64, f64>,
}

impl MarketData {
    pub fn new(source: MarketDataSource) -> Self {
        Self {
            source,
            tick_pricer: TickPricer::new(),
            multiplier: f64::NAN,
            min_trade_vol: f64::NAN,
            trading_status: TradingStatus::Unknown,
            last_exchange_time_utc: 0,
            best: Layer::unknown(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    pub fn has_tick_size(&self) -> bool {
        self.tick_pricer.has_tick_size()
    }

    pub fn price_to_ticks(&self, price: f64) -> (i64, bool) {
        self.tick_pricer.price_to_ticks(price)
    }

    pub fn ticks_to_price(&self, ticks: i64) -> f64 {
        self.tick_pricer.ticks_to_price(ticks)
    }

    pub fn min_trade_vol(&self) -> f64 {
        self.min_trade_vol
    }

    pub fn top_of_book(&self) -> &Layer {
        &self.best
    }

    pub fn is_market_active(&self, info: &MessageInfo, max_age: Duration) -> bool {
        match self.trading_status {
            TradingStatus::Open => true,
            TradingStatus::Closed => false,
            TradingStatus::Unknown => {
                let max_age_ns = max_age.as_nanos() as u64;
                if max_age_ns == 0 {
                    return false;
                }
                info.receive_time_utc
                    .saturating_sub(self.last_exchange_time_utc)
                    <= max_age_ns
            }
        }
    }

    /// Displayed quantity at `ticks` on `side`, used by the queue-position
    /// matcher to initialize `ahead`. `0.0` if the level isn't in the book
    /// (or the aggregator isn't in a depth-tracking mode).
    pub fn displayed_quantity(&self, side: crate::order::Side, ticks: i64) -> f64 {
        let book = match side {
            crate::order::Side::Buy => &self.bids,
            crate::order::Side::Sell => &self.asks,
        };
        book.get(&ticks).copied().unwrap_or(0.0)
    }

    pub fn on_reference_data(&mut self, info: &MessageInfo, event: &ReferenceData) -> bool {
        self.tick_pricer.set_tick_size(event.tick_size);
        self.tick_pricer.set_precision(event.precision);
        self.multiplier = event.multiplier;
        self.min_trade_vol = event.min_trade_vol;
        self.last_exchange_time_utc = info.receive_time_utc;
        false
    }

    pub fn on_market_status(&mut self, info: &MessageInfo, event: &MarketStatus) -> bool {
        self.trading_status = event.trading_status;
        self.last_exchange_time_utc = info.receive_time_utc;
        false
    }

    pub fn on_top_of_book(&mut self, info: &MessageInfo, event: &TopOfBookUpdate) -> bool {
        if self.source != MarketDataSource::TopOfBook || !self.has_tick_size() {
            return false;
        }
        self.last_exchange_time_utc = info.receive_time_utc;
        if self.best == event.layer {
            return false;
        }
        self.best = event.layer;
        true
    }

    pub fn on_market_by_price(&mut self, info: &MessageInfo, event: &MarketByPriceUpdate) -> bool {
        if self.source != MarketDataSource::MarketByPrice || !self.has_tick_size() {
            return false;
        }
        self.apply_levels(event.bids.iter(), true);
        self.apply_levels(event.asks.iter(), false);
        self.last_exchange_time_utc = info.receive_time_utc;
        self.recompute_best()
    }

    pub fn on_market_by_order(&mut self, info: &MessageInfo, event: &MarketByOrderUpdate) -> bool {
        if self.source != MarketDataSource::MarketByOrder || !self.has_tick_size() {
            return false;
        }
        self.apply_levels(event.bids.iter(), true);
        self.apply_levels(event.asks.iter(), false);
        self.last_exchange_time_utc = info.receive_time_utc;
        self.recompute_best()
    }

    pub fn on_trade_summary(&mut self, info: &MessageInfo, _event: &TradeSummary) {
        self.last_exchange_time_utc = info.receive_time_utc;
    }

    pub fn on_statistics_update(&mut self, info: &MessageInfo, _event: &StatisticsUpdate) {
        self.last_exchange_time_utc = info.receive_time_utc;
    }

    fn apply_levels<'a>(&mut self, levels: impl Iterator<Item = &'a PriceLevel>, is_bid: bool) {
        let book = if is_bid {
            &mut self.bids
        } else {
            &mut self.asks
        };
        for level in levels {
            let (ticks, _) = self.tick_pricer.price_to_ticks(level.price);
            if level.quantity == 0.0 {
                book.remove(&ticks);
            } else {
                book.insert(ticks, level.quantity);
            }
        }
    }

    fn recompute_best(&mut self) -> bool {
        let bid = self.bids.iter().next_back();
        let ask = self.asks.iter().next();
        let new_best = Layer {
            bid_price: bid.map(|(p, _)| self.tick_pricer.ticks_to_price(*p)).unwrap_or(f64::NAN),
            bid_quantity: bid.map(|(_, q)| *q).unwrap_or(f64::NAN),
            ask_price: ask.map(|(p, _)| self.tick_pricer.ticks_to_price(*p)).unwrap_or(f64::NAN),
            ask_quantity: ask.map(|(_, q)| *q).unwrap_or(f64::NAN),
        };
        let changed = self.best != new_best
            && !(self.best.bid_price.is_nan() && new_best.bid_price.is_nan()
                && self.best.ask_price.is_nan() && new_best.ask_price.is_nan());
        self.best = new_best;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Side;

    fn reference_data() -> ReferenceData {
        ReferenceData {
            tick_size: 0.5,
            precision: Precision::Decimals(1),
            multiplier: 1.0,
            min_trade_vol: 1.0,
        }
    }

    #[test]
    fn top_of_book_copies_directly() {
        let mut market = MarketData::new(MarketDataSource::TopOfBook);
        let info = MessageInfo::new(1, 1, 0, 0);
        market.on_reference_data(&info, &reference_data());
        let changed = market.on_top_of_book(
            &info,
            &TopOfBookUpdate {
                layer: Layer {
                    bid_price: 100.0,
                    bid_quantity: 1.0,
                    ask_price: 100.5,
                    ask_quantity: 1.0,
                },
            },
        );
        assert!(changed);
        assert_eq!(market.top_of_book().bid_price, 100.0);
    }

    #[test]
    fn best_layer_hidden_until_tick_size_known() {
        let mut market = MarketData::new(MarketDataSource::TopOfBook);
        let info = MessageInfo::new(1, 1, 0, 0);
        let changed = market.on_top_of_book(
            &info,
            &TopOfBookUpdate {
                layer: Layer {
                    bid_price: 100.0,
                    bid_quantity: 1.0,
                    ask_price: 100.5,
                    ask_quantity: 1.0,
                },
            },
        );
        assert!(!changed);
        assert!(market.top_of_book().bid_price.is_nan());
    }

    #[test]
    fn market_by_price_derives_best_from_book() {
        let mut market = MarketData::new(MarketDataSource::MarketByPrice);
        let info = MessageInfo::new(1, 1, 0, 0);
        market.on_reference_data(&info, &reference_data());
        market.on_market_by_price(
            &info,
            &MarketByPriceUpdate {
                bids: vec![
                    PriceLevel { price: 99.5, quantity: 2.0 },
                    PriceLevel { price: 100.0, quantity: 1.0 },
                ],
                asks: vec![PriceLevel { price: 100.5, quantity: 3.0 }],
            },
        );
        assert_eq!(market.top_of_book().bid_price, 100.0);
        assert_eq!(market.top_of_book().ask_price, 100.5);

        // removing the best bid should reveal the next level
        market.on_market_by_price(
            &info,
            &MarketByPriceUpdate {
                bids: vec![PriceLevel { price: 100.0, quantity: 0.0 }],
                asks: vec![],
            },
        );
        assert_eq!(market.top_of_book().bid_price, 99.5);
    }

    #[test]
    fn displayed_quantity_tracks_book() {
        let mut market = MarketData::new(MarketDataSource::MarketByPrice);
        let info = MessageInfo::new(1, 1, 0, 0);
        market.on_reference_data(&info, &reference_data());
        market.on_market_by_price(
            &info,
            &MarketByPriceUpdate {
                bids: vec![PriceLevel { price: 100.0, quantity: 5.0 }],
                asks: vec![],
            },
        );
        let (ticks, _) = market.price_to_ticks(100.0);
        assert_eq!(market.displayed_quantity(Side::Buy, ticks), 5.0);
        assert_eq!(market.displayed_quantity(Side::Sell, ticks), 0.0);
    }

    #[test]
    fn is_market_active_when_open() {
        let mut market = MarketData::new(MarketDataSource::TopOfBook);
        let info = MessageInfo::new(1, 1, 0, 0);
        market.on_market_status(&info, &MarketStatus { trading_status: TradingStatus::Open });
        assert!(market.is_market_active(&info, Duration::from_secs(0)));
    }

    #[test]
    fn is_market_active_falls_back_to_max_age() {
        let mut market = MarketData::new(MarketDataSource::TopOfBook);
        let info = MessageInfo::new(1, 1_000, 0, 0);
        market.on_reference_data(&info, &reference_data());
        let later = MessageInfo::new(2, 1_000 + 500, 0, 0);
        assert!(market.is_market_active(&later, Duration::from_nanos(1_000)));
        let much_later = MessageInfo::new(3, 1_000 + 5_000, 0, 0);
        assert!(!market.is_market_active(&much_later, Duration::from_nanos(1_000)));
    }
}

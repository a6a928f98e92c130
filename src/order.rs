//! Matcher-side order representation and the external order-cache contract.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Order lifecycle state. `Completed`, `Canceled`, and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Sent,
    Working,
    Completed,
    Canceled,
    Rejected,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Canceled | OrderStatus::Rejected
        )
    }
}

/// Error kinds surfaced to consumers on `OrderAck`. `Copy`, no heap
/// allocation — these ride the hot request-validation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    UnknownSymbol,
    InvalidPrice,
    InvalidQuantity,
    NotFound,
    NotSupported,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ErrorKind::InvalidRequest => "invalid request",
            ErrorKind::UnknownSymbol => "unknown symbol",
            ErrorKind::InvalidPrice => "invalid price",
            ErrorKind::InvalidQuantity => "invalid quantity",
            ErrorKind::NotFound => "not found",
            ErrorKind::NotSupported => "not supported",
        };
        write!(f, "{text}")
    }
}

impl std::error::Error for ErrorKind {}

/// A live simulated order, owned by the [`OrderCache`] and borrowed mutably
/// by the matcher for the duration of a single request.
#[derive(Debug, Clone)]
pub struct Order {
    pub order_id: u64,
    pub account: String,
    pub exchange: String,
    pub symbol: String,
    pub side: Side,
    /// Original requested quantity.
    pub quantity: f64,
    pub remaining_quantity: f64,
    pub traded_quantity: f64,
    /// Sum of price * fill-quantity across all fills; monotone non-decreasing.
    pub total_cost: f64,
    pub status: OrderStatus,
    pub max_request_version: u32,
    /// Current working limit price, real units.
    pub price: f64,
    /// Current working limit price, tick units (matches `price`).
    pub price_ticks: i64,
}

impl Order {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: u64,
        account: impl Into<String>,
        exchange: impl Into<String>,
        symbol: impl Into<String>,
        side: Side,
        quantity: f64,
        price: f64,
        price_ticks: i64,
    ) -> Self {
        Self {
            order_id,
            account: account.into(),
            exchange: exchange.into(),
            symbol: symbol.into(),
            side,
            quantity,
            remaining_quantity: quantity,
            traded_quantity: 0.0,
            total_cost: 0.0,
            status: OrderStatus::Sent,
            max_request_version: 0,
            price,
            price_ticks,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Applies a fill for `quantity` at `price`, updating the lifecycle
    /// invariant `traded_quantity + remaining_quantity == quantity`.
    pub fn apply_fill(&mut self, quantity: f64, price: f64) {
        debug_assert!(quantity > 0.0 && quantity <= self.remaining_quantity + f64::EPSILON);
        self.remaining_quantity = (self.remaining_quantity - quantity).max(0.0);
        self.traded_quantity += quantity;
        self.total_cost += price * quantity;
        if self.remaining_quantity <= f64::EPSILON {
            self.status = OrderStatus::Completed;
        }
    }
}

/// External, borrowed store of all live orders, keyed by `order_id`.
///
/// Ownership of orders lives in the cache; the matcher and strategy borrow
/// mutably only for the duration of handling a single event.
pub trait OrderCache {
    /// Invokes `visitor` with a mutable reference to the order if it exists,
    /// returning whether it existed.
    fn get_order(&mut self, order_id: u64, visitor: &mut dyn FnMut(&mut Order)) -> bool;

    /// Inserts a newly created order into the cache.
    fn insert_order(&mut self, order: Order);

    /// Monotonically increasing trade id, used once per fill.
    fn next_trade_id(&mut self) -> u64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_marks_completed_when_remaining_hits_zero() {
        let mut order = Order::new(1, "acct", "EX", "SYM", Side::Buy, 2.0, 100.0, 200);
        order.status = OrderStatus::Working;
        order.apply_fill(2.0, 100.0);
        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(order.remaining_quantity, 0.0);
        assert_eq!(order.traded_quantity, 2.0);
        assert_eq!(order.total_cost, 200.0);
    }

    #[test]
    fn partial_fill_stays_working() {
        let mut order = Order::new(1, "acct", "EX", "SYM", Side::Buy, 2.0, 100.0, 200);
        order.status = OrderStatus::Working;
        order.apply_fill(1.0, 100.0);
        assert_eq!(order.status, OrderStatus::Working);
        assert_eq!(order.remaining_quantity, 1.0);
    }

    #[test]
    fn terminal_states_are_terminal() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Canceled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Sent.is_terminal());
        assert!(!OrderStatus::Working.is_terminal());
    }
}

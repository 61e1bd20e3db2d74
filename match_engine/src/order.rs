//! Orders and trades produced by the matching engine.
use std::time::SystemTime;

use rust_decimal::Decimal;

use crate::types::{OrderId, Price, Quantity, Side, TradeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Active,
    PartiallyFilled,
    Filled,
    /// Reserved. No engine operation produces it since orders cannot be cancelled.
    Cancelled,
}

/// A single limit order.
///
/// Identity, side, price and original quantity never change after creation.
/// `remaining_quantity` only decreases, and `status` is always derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub side: Side,
    pub price: Price,
    pub original_quantity: Quantity,
    remaining_quantity: Quantity,
    /// Admission sequence number, strictly increasing per engine
    pub timestamp: u64,
    status: OrderStatus,
}

impl Order {
    /// Create a new order with the given parameters.
    ///
    /// Inputs are expected to be validated already; see `MatchingEngine::submit`.
    pub fn new(id: OrderId, side: Side, price: Price, quantity: Quantity, timestamp: u64) -> Self {
        Self {
            id,
            side,
            price,
            original_quantity: quantity,
            remaining_quantity: quantity,
            timestamp,
            status: OrderStatus::Active,
        }
    }

    pub fn remaining_quantity(&self) -> Quantity {
        self.remaining_quantity
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.original_quantity - self.remaining_quantity
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity.is_zero()
    }

    /// Whether this order can trade against a resting order at `resting_price`.
    pub fn crosses(&self, resting_price: Price) -> bool {
        self.side.crosses(self.price, resting_price)
    }

    /// Executes `quantity` against this order and refreshes its status.
    ///
    /// The quantity is clamped to what remains so the remainder never goes negative.
    pub(crate) fn fill(&mut self, quantity: Quantity) {
        let executed = quantity.min(self.remaining_quantity);
        self.remaining_quantity -= executed;
        self.status = if self.remaining_quantity.is_zero() {
            OrderStatus::Filled
        } else if self.remaining_quantity < self.original_quantity {
            OrderStatus::PartiallyFilled
        } else {
            OrderStatus::Active
        };
    }
}

/// One execution between a buy order and a sell order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    /// Always the resting order's price
    pub price: Price,
    pub quantity: Quantity,
    /// Side of the order that took liquidity
    pub aggressor: Side,
    pub timestamp: SystemTime,
}

impl Trade {
    /// Price times quantity, `None` if it does not fit in a `Decimal`.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

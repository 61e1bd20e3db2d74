use rust_decimal::{Decimal, RoundingStrategy};

use crate::order::Order;

pub type Price = Decimal;
pub type Quantity = Decimal;
pub type OrderId = u64;
pub type TradeId = u64;

/// Number of fractional digits prices are stored with unless configured otherwise.
pub const DEFAULT_PRICE_DECIMALS: u32 = 2;

pub const DEFAULT_MAX_ORDER_QUANTITY: u64 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

    /// Whether an order on this side at `price` can trade against a resting
    /// order of the opposite side at `resting_price`.
    pub fn crosses(self, price: Price, resting_price: Price) -> bool {
        match self {
            Side::Buy => price >= resting_price,
            Side::Sell => price <= resting_price,
        }
    }
}

/// Rounds a raw price to the engine's fixed precision.
pub fn normalize_price(price: Price, decimals: u32) -> Price {
    price.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Configuration for engine behaviour
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fractional digits kept on every order price
    pub price_decimals: u32,
    /// Largest quantity a single order may carry
    pub max_order_quantity: Quantity,
    /// Buffered market events per subscriber before slow receivers lag
    pub market_data_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_decimals: DEFAULT_PRICE_DECIMALS,
            max_order_quantity: Decimal::from(DEFAULT_MAX_ORDER_QUANTITY),
            market_data_capacity: 1000,
        }
    }
}

/// Best bid, best ask and the distance between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spread {
    pub bid: Price,
    pub ask: Price,
    pub spread: Price,
}

/// Aggregated view of one price level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceLevelView {
    pub price: Price,
    pub quantity: Quantity,
    pub order_count: usize,
}

/// Aggregated levels of both sides, each best first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookDepth {
    pub bids: Vec<PriceLevelView>,
    pub asks: Vec<PriceLevelView>,
}

/// Owned copy of both sides of the book, each in priority order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookSnapshot {
    pub bids: Vec<Order>,
    pub asks: Vec<Order>,
}

/// Summary statistics of the current book
#[derive(Debug, Clone, PartialEq)]
pub struct BookStats {
    pub total_orders: usize,
    pub bid_levels: usize,
    pub ask_levels: usize,
    pub bid_volume: Quantity,
    pub ask_volume: Quantity,
    pub best_bid: Option<Price>,
    pub best_ask: Option<Price>,
    pub spread: Option<Price>,
}

//! Price-time priority limit order matching engine.
//!
//! `MatchingEngine` is the synchronous core: it crosses each submitted order
//! against the opposite side of the book, rests any remainder, and reports
//! the trades. `TradingPair` runs one engine on its own task and serializes
//! concurrent callers through a command channel.
mod book;
mod engine;
mod errors;
mod order;
mod pair;
pub mod telemetry;
mod types;

// Core engine and matching functionality
pub use book::BookSide;
pub use engine::{EngineCommand, MatchingEngine, Sequence, SubmitOutcome};
pub use order::{Order, OrderStatus, Trade};

// Async service wrapper
pub use pair::{MarketEvent, TradingPair};

// Error handling
pub use errors::{EngineError, EngineResult, IntoAnyhow, RejectReason};

// Shared types and configuration
pub use types::{
    normalize_price, BookDepth, BookSnapshot, BookStats, EngineConfig, OrderId, Price,
    PriceLevelView, Quantity, Side, Spread, TradeId, DEFAULT_MAX_ORDER_QUANTITY,
    DEFAULT_PRICE_DECIMALS,
};

//! Core matching engine implementation for order book trading.
//!
//! This module provides the main `MatchingEngine` struct, the command loop
//! used to drive it from another task, and the notification hooks it fires.
use std::time::SystemTime;

use crossbeam_channel::Receiver;
use rust_decimal::Decimal;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::book::BookSide;
use crate::errors::{EngineError, EngineResult, RejectReason};
use crate::order::{Order, Trade};
use crate::types::{
    normalize_price, BookSnapshot, BookStats, EngineConfig, Price, PriceLevelView, Quantity, Side,
    Spread,
};

type TradeHook = Box<dyn FnMut(&Trade, &Order, &Order) + Send>;
type OrderHook = Box<dyn FnMut(&Order) + Send>;
type BookHook = Box<dyn FnMut(&BookSide, &BookSide) + Send>;

#[derive(Default)]
struct Hooks {
    trade_executed: Option<TradeHook>,
    order_added: Option<OrderHook>,
    book_updated: Option<BookHook>,
}

/// Monotonic id source owned by a single engine instance. Starts at 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    next: u64,
}

impl Sequence {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

impl Default for Sequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful `submit`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// The submitted order in its final state
    pub order: Order,
    /// Trades generated by this submission, in execution order
    pub trades: Vec<Trade>,
}

/// Requests processed by `MatchingEngine::run`, one at a time and in arrival order.
#[derive(Debug)]
pub enum EngineCommand {
    Submit {
        side: Side,
        quantity: Quantity,
        price: Price,
        reply: oneshot::Sender<EngineResult<SubmitOutcome>>,
    },
    Spread {
        reply: oneshot::Sender<Option<Spread>>,
    },
    TotalVolume {
        reply: oneshot::Sender<Quantity>,
    },
    LastTradePrice {
        reply: oneshot::Sender<Option<Price>>,
    },
    Stats {
        reply: oneshot::Sender<BookStats>,
    },
    Depth {
        side: Side,
        reply: oneshot::Sender<Vec<PriceLevelView>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
}

pub struct MatchingEngine {
    config: EngineConfig,
    /// Buy orders sorted by price (highest first) then time priority
    bids: BookSide,
    /// Sell orders sorted by price (lowest first) then time priority
    asks: BookSide,
    /// Every executed trade in execution order
    trades: Vec<Trade>,
    total_volume: Quantity,
    order_ids: Sequence,
    trade_ids: Sequence,
    clock: Sequence,
    hooks: Hooks,
}

impl MatchingEngine {
    /// Create a new matching engine with empty order books.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            bids: BookSide::new(Side::Buy),
            asks: BookSide::new(Side::Sell),
            trades: Vec::new(),
            total_volume: Decimal::ZERO,
            order_ids: Sequence::new(),
            trade_ids: Sequence::new(),
            clock: Sequence::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Called once per individual match step with the trade and both
    /// participants as they stand right after the fill.
    pub fn on_trade_executed<F>(&mut self, hook: F)
    where
        F: FnMut(&Trade, &Order, &Order) + Send + 'static,
    {
        self.hooks.trade_executed = Some(Box::new(hook));
    }

    /// Called when a submitted order comes to rest in the book.
    pub fn on_order_added<F>(&mut self, hook: F)
    where
        F: FnMut(&Order) + Send + 'static,
    {
        self.hooks.order_added = Some(Box::new(hook));
    }

    /// Called once per `submit` or `reset` with read-only views of the bid
    /// and ask sides.
    pub fn on_order_book_updated<F>(&mut self, hook: F)
    where
        F: FnMut(&BookSide, &BookSide) + Send + 'static,
    {
        self.hooks.book_updated = Some(Box::new(hook));
    }

    /// Submits a limit order.
    ///
    /// The price is rounded to the configured precision first. Orders that
    /// fail `validate` are rejected before any state is touched. Otherwise the
    /// order is crossed against the opposite side and any remainder rests on
    /// its own side.
    pub fn submit(
        &mut self,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> EngineResult<SubmitOutcome> {
        let normalized = normalize_price(price, self.config.price_decimals);
        if let Err(reason) = self.validate(side, quantity, normalized) {
            warn!(?side, %quantity, %price, %reason, "rejecting invalid order");
            return Err(EngineError::InvalidOrder {
                quantity,
                price,
                reason,
            });
        }

        let mut order = Order::new(
            self.order_ids.next_id(),
            side,
            normalized,
            quantity,
            self.clock.next_id(),
        );
        debug!(order_id = order.id, ?side, %quantity, price = %normalized, "order admitted");

        let trades = self.match_order(&mut order);

        if !order.is_filled() {
            match side {
                Side::Buy => self.bids.insert(order.clone()),
                Side::Sell => self.asks.insert(order.clone()),
            }
            debug!(order_id = order.id, remaining = %order.remaining_quantity(), "order resting");
            if let Some(hook) = self.hooks.order_added.as_mut() {
                hook(&order);
            }
        }
        self.notify_book_updated();

        Ok(SubmitOutcome { order, trades })
    }

    /// Checks every bound `submit` relies on to run without overflow.
    ///
    /// Traded volume grows by at most `quantity` and the order's own side by
    /// at most its remainder, so both are checked against the full quantity.
    fn validate(&self, side: Side, quantity: Quantity, price: Price) -> Result<(), RejectReason> {
        if quantity <= Decimal::ZERO {
            return Err(RejectReason::NonPositiveQuantity);
        }
        if price <= Decimal::ZERO {
            return Err(RejectReason::NonPositivePrice);
        }
        if quantity > self.config.max_order_quantity {
            return Err(RejectReason::QuantityAboveLimit);
        }
        let traded = self.total_volume.checked_add(quantity);
        let resting = self.book(side).volume().checked_add(quantity);
        if traded.is_none() || resting.is_none() {
            return Err(RejectReason::VolumeOverflow);
        }
        Ok(())
    }

    /// Crosses the aggressor against the opposite side until it is filled or
    /// the best resting price no longer crosses.
    fn match_order(&mut self, aggressor: &mut Order) -> Vec<Trade> {
        let opposite = match aggressor.side {
            Side::Buy => &mut self.asks,
            Side::Sell => &mut self.bids,
        };
        let mut trades = Vec::new();

        while !aggressor.is_filled() {
            let Some(best) = opposite.front() else {
                break;
            };
            if !aggressor.crosses(best.price) {
                break;
            }
            let quantity = aggressor.remaining_quantity().min(best.remaining_quantity());
            let price = best.price;

            let Some(resting) = opposite.fill_front(quantity) else {
                break;
            };
            aggressor.fill(quantity);

            let (buy, sell) = match aggressor.side {
                Side::Buy => (&*aggressor, &resting),
                Side::Sell => (&resting, &*aggressor),
            };
            let trade = Trade {
                id: self.trade_ids.next_id(),
                buy_order_id: buy.id,
                sell_order_id: sell.id,
                price,
                quantity,
                aggressor: aggressor.side,
                timestamp: SystemTime::now(),
            };
            self.total_volume += quantity;
            self.trades.push(trade.clone());
            debug!(
                trade_id = trade.id,
                buy_order_id = trade.buy_order_id,
                sell_order_id = trade.sell_order_id,
                %price,
                %quantity,
                "trade executed"
            );

            if let Some(hook) = self.hooks.trade_executed.as_mut() {
                hook(&trade, buy, sell);
            }
            trades.push(trade);
        }

        trades
    }

    fn notify_book_updated(&mut self) {
        if let Some(hook) = self.hooks.book_updated.as_mut() {
            hook(&self.bids, &self.asks);
        }
    }

    /// Discards both sides and the trade log and restarts every id sequence.
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.trades.clear();
        self.total_volume = Decimal::ZERO;
        self.order_ids.reset();
        self.trade_ids.reset();
        self.clock.reset();
        info!("matching engine reset");
        self.notify_book_updated();
    }

    pub fn best_bid(&self) -> Option<Price> {
        self.bids.best_price()
    }

    pub fn best_ask(&self) -> Option<Price> {
        self.asks.best_price()
    }

    /// `None` unless both sides have at least one resting order.
    pub fn spread(&self) -> Option<Spread> {
        let bid = self.best_bid()?;
        let ask = self.best_ask()?;
        Some(Spread {
            bid,
            ask,
            spread: ask - bid,
        })
    }

    /// Sum of the quantity of every trade since creation or the last reset.
    pub fn total_volume(&self) -> Quantity {
        self.total_volume
    }

    pub fn last_trade_price(&self) -> Option<Price> {
        self.trades.last().map(|trade| trade.price)
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Resting buy orders, best first.
    pub fn bids(&self) -> impl Iterator<Item = &Order> + '_ {
        self.bids.iter()
    }

    /// Resting sell orders, best first.
    pub fn asks(&self) -> impl Iterator<Item = &Order> + '_ {
        self.asks.iter()
    }

    pub fn book(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.bids,
            Side::Sell => &self.asks,
        }
    }

    pub fn depth(&self, side: Side) -> Vec<PriceLevelView> {
        self.book(side).levels()
    }

    pub fn snapshot(&self) -> BookSnapshot {
        BookSnapshot {
            bids: self.bids.to_vec(),
            asks: self.asks.to_vec(),
        }
    }

    pub fn stats(&self) -> BookStats {
        BookStats {
            total_orders: self.bids.len() + self.asks.len(),
            bid_levels: self.bids.level_count(),
            ask_levels: self.asks.level_count(),
            bid_volume: self.bids.volume(),
            ask_volume: self.asks.volume(),
            best_bid: self.best_bid(),
            best_ask: self.best_ask(),
            spread: self.spread().map(|spread| spread.spread),
        }
    }

    /// Drains `commands` until every sender is dropped.
    ///
    /// Each command runs to completion before the next is read, so the
    /// channel order is the admission order.
    pub fn run(&mut self, commands: Receiver<EngineCommand>) {
        info!("matching engine loop started");
        while let Ok(command) = commands.recv() {
            self.handle(command);
        }
        info!("command channel closed, matching engine loop stopped");
    }

    fn handle(&mut self, command: EngineCommand) {
        let delivered = match command {
            EngineCommand::Submit {
                side,
                quantity,
                price,
                reply,
            } => reply.send(self.submit(side, quantity, price)).is_ok(),
            EngineCommand::Spread { reply } => reply.send(self.spread()).is_ok(),
            EngineCommand::TotalVolume { reply } => reply.send(self.total_volume()).is_ok(),
            EngineCommand::LastTradePrice { reply } => reply.send(self.last_trade_price()).is_ok(),
            EngineCommand::Stats { reply } => reply.send(self.stats()).is_ok(),
            EngineCommand::Depth { side, reply } => reply.send(self.depth(side)).is_ok(),
            EngineCommand::Reset { reply } => {
                self.reset();
                reply.send(()).is_ok()
            }
        };
        if !delivered {
            // The caller stopped waiting; the command has still been applied.
            debug!("reply receiver dropped");
        }
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

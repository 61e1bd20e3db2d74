use std::panic::{self, AssertUnwindSafe};

use crossbeam_channel::Sender;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;

use crate::engine::{EngineCommand, MatchingEngine, SubmitOutcome};
use crate::errors::{EngineError, EngineResult};
use crate::order::{Order, Trade};
use crate::types::{
    BookDepth, BookStats, EngineConfig, Price, PriceLevelView, Quantity, Side, Spread,
};

/// Notifications published by a running trading pair.
#[derive(Debug, Clone, PartialEq)]
pub enum MarketEvent {
    TradeExecuted {
        trade: Trade,
        buy_order: Order,
        sell_order: Order,
    },
    OrderAdded(Order),
    /// Aggregated levels after a submit or reset
    BookUpdated(BookDepth),
}

/// Trading Pair Implementation
///
/// Owns one `MatchingEngine` on a dedicated blocking task. Every call is sent
/// to that task as an `EngineCommand` and processed strictly one after the
/// other, so concurrent callers are serialized into a single admission order.
/// Engine notifications are broadcast as `MarketEvent`s.
///
/// ## Usage Example
///
/// ```rust
/// use match_engine::{MarketEvent, Side, TradingPair};
/// use rust_decimal::Decimal;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let pair = TradingPair::new("BTC/USD".to_string());
///     let mut market_data = pair.subscribe_to_market_data();
///
///     pair.submit(Side::Sell, Decimal::from(5), Decimal::from(100)).await?;
///     let outcome = pair.submit(Side::Buy, Decimal::from(5), Decimal::from(101)).await?;
///     assert_eq!(outcome.trades.len(), 1);
///
///     while let Ok(event) = market_data.try_recv() {
///         if let MarketEvent::TradeExecuted { trade, .. } = event {
///             println!("trade {} @ {}", trade.quantity, trade.price);
///         }
///     }
///
///     pair.shutdown().await?;
///     Ok(())
/// }
/// ```
pub struct TradingPair {
    pub symbol: String,
    command_sender: Sender<EngineCommand>,
    market_data_sender: broadcast::Sender<MarketEvent>,
    engine_task: JoinHandle<()>,
}

impl TradingPair {
    /// Creates a trading pair with the default configuration.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(symbol: String) -> Self {
        Self::with_config(symbol, EngineConfig::default())
    }

    pub fn with_config(symbol: String, config: EngineConfig) -> Self {
        let (command_sender, command_receiver) = crossbeam_channel::unbounded::<EngineCommand>();
        let (market_data_sender, _) =
            broadcast::channel::<MarketEvent>(config.market_data_capacity.max(1));

        let engine_task = Self::start_engine(
            symbol.clone(),
            config,
            command_receiver,
            market_data_sender.clone(),
        );

        TradingPair {
            symbol,
            command_sender,
            market_data_sender,
            engine_task,
        }
    }

    fn start_engine(
        symbol: String,
        config: EngineConfig,
        command_receiver: crossbeam_channel::Receiver<EngineCommand>,
        market_data_sender: broadcast::Sender<MarketEvent>,
    ) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || {
            let mut engine = MatchingEngine::with_config(config);
            Self::publish_market_data(&mut engine, market_data_sender);
            tracing::info!("Starting matching engine for symbol: {}", symbol);

            // A panicked engine is not restarted: a fresh one would silently
            // drop every resting order. Callers see `EngineStopped` instead.
            let result = panic::catch_unwind(AssertUnwindSafe(|| engine.run(command_receiver)));
            match result {
                Ok(()) => tracing::info!("Engine exited normally for symbol: {}", symbol),
                Err(panic_info) => tracing::error!(
                    "Engine panicked for symbol: {}, no longer accepting orders. Panic: {:?}",
                    symbol,
                    panic_info
                ),
            }
        })
    }

    /// Wires the engine hooks to the broadcast channel.
    fn publish_market_data(engine: &mut MatchingEngine, sender: broadcast::Sender<MarketEvent>) {
        // Send errors only mean there are no subscribers, which is fine.
        let trades = sender.clone();
        engine.on_trade_executed(move |trade, buy, sell| {
            let _ = trades.send(MarketEvent::TradeExecuted {
                trade: trade.clone(),
                buy_order: buy.clone(),
                sell_order: sell.clone(),
            });
        });
        let added = sender.clone();
        engine.on_order_added(move |order| {
            let _ = added.send(MarketEvent::OrderAdded(order.clone()));
        });
        engine.on_order_book_updated(move |bids, asks| {
            let _ = sender.send(MarketEvent::BookUpdated(BookDepth {
                bids: bids.levels(),
                asks: asks.levels(),
            }));
        });
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> EngineCommand,
    ) -> EngineResult<T> {
        let (reply, response) = oneshot::channel();
        self.command_sender.send(command(reply)).map_err(|_| {
            tracing::error!("Failed to send command to engine - channel closed");
            EngineError::EngineStopped
        })?;
        response.await.map_err(|_| EngineError::EngineStopped)
    }

    /// Submits a limit order and waits for the matching result.
    pub async fn submit(
        &self,
        side: Side,
        quantity: Quantity,
        price: Price,
    ) -> EngineResult<SubmitOutcome> {
        self.request(|reply| EngineCommand::Submit {
            side,
            quantity,
            price,
            reply,
        })
        .await?
    }

    pub async fn spread(&self) -> EngineResult<Option<Spread>> {
        self.request(|reply| EngineCommand::Spread { reply }).await
    }

    pub async fn total_volume(&self) -> EngineResult<Quantity> {
        self.request(|reply| EngineCommand::TotalVolume { reply }).await
    }

    pub async fn last_trade_price(&self) -> EngineResult<Option<Price>> {
        self.request(|reply| EngineCommand::LastTradePrice { reply }).await
    }

    pub async fn stats(&self) -> EngineResult<BookStats> {
        self.request(|reply| EngineCommand::Stats { reply }).await
    }

    pub async fn depth(&self, side: Side) -> EngineResult<Vec<PriceLevelView>> {
        self.request(|reply| EngineCommand::Depth { side, reply }).await
    }

    pub async fn reset(&self) -> EngineResult<()> {
        self.request(|reply| EngineCommand::Reset { reply }).await
    }

    /// Subscribe to market data events.
    ///
    /// Only events published after subscribing are received.
    pub fn subscribe_to_market_data(&self) -> broadcast::Receiver<MarketEvent> {
        self.market_data_sender.subscribe()
    }

    pub fn is_running(&self) -> bool {
        !self.engine_task.is_finished()
    }

    /// Closes the command channel and waits for the engine task to finish.
    pub async fn shutdown(self) -> EngineResult<()> {
        let TradingPair {
            symbol,
            command_sender,
            engine_task,
            ..
        } = self;
        drop(command_sender);
        engine_task.await.map_err(|join_error| {
            tracing::error!("Engine task failed for symbol: {}. Error: {:?}", symbol, join_error);
            EngineError::EngineStopped
        })
    }
}

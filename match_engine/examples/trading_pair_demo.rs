//! Trading Pair Demo
//!
//! This example demonstrates how to use the TradingPair struct to:
//! - Run a matching engine on its own task
//! - Subscribe to market data events
//! - Submit orders from several concurrent tasks
//! - Query book state and shut the pair down

use std::sync::Arc;

use match_engine::{IntoAnyhow, MarketEvent, Side, TradingPair};
use rust_decimal::Decimal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match_engine::telemetry::init_tracing(false)?;

    println!("Starting Trading Pair Demo for BTC/USD");
    let pair = Arc::new(TradingPair::new("BTC/USD".to_string()));

    let mut market_data_rx = pair.subscribe_to_market_data();
    let market_data_task = tokio::spawn(async move {
        while let Ok(event) = market_data_rx.recv().await {
            match event {
                MarketEvent::TradeExecuted { trade, .. } => {
                    println!(
                        "Trade executed: ID={}, Price={}, Quantity={}, Notional={:?}",
                        trade.id,
                        trade.price,
                        trade.quantity,
                        trade.notional()
                    );
                }
                MarketEvent::OrderAdded(order) => {
                    println!(
                        "Order resting: ID={}, {:?} {} @ {}",
                        order.id,
                        order.side,
                        order.remaining_quantity(),
                        order.price
                    );
                }
                MarketEvent::BookUpdated(depth) => {
                    println!(
                        "Book updated: {} bid levels, {} ask levels",
                        depth.bids.len(),
                        depth.asks.len()
                    );
                }
            }
        }
    });

    // Makers quote both sides from separate tasks
    let mut makers = Vec::new();
    for step in 1..=3i64 {
        let pair = Arc::clone(&pair);
        makers.push(tokio::spawn(async move {
            pair.submit(Side::Buy, Decimal::from(10), Decimal::from(100 - step))
                .await?;
            pair.submit(Side::Sell, Decimal::from(10), Decimal::from(100 + step))
                .await
        }));
    }
    for maker in makers {
        maker.await?.into_anyhow()?;
    }

    if let Some(spread) = pair.spread().await? {
        println!("Spread: bid {} / ask {} ({})", spread.bid, spread.ask, spread.spread);
    }

    // A large buy sweeps two ask levels
    let outcome = pair
        .submit(Side::Buy, Decimal::from(25), Decimal::from(102))
        .await?;
    println!(
        "Sweep generated {} trades, order status {:?}",
        outcome.trades.len(),
        outcome.order.status()
    );

    println!("Traded volume: {}", pair.total_volume().await?);
    println!("Last trade price: {:?}", pair.last_trade_price().await?);
    println!("Stats: {:?}", pair.stats().await?);

    let pair = Arc::try_unwrap(pair)
        .map_err(|_| anyhow::anyhow!("trading pair still shared"))?;
    pair.shutdown().await?;
    market_data_task.await?;

    println!("Demo finished");
    Ok(())
}

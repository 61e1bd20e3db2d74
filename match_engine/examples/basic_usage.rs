//! Basic usage example for the match_engine library
//!
//! This example demonstrates the core functionality of the matching engine:
//! - Submitting limit orders on both sides
//! - Crossing orders and reading the resulting trades
//! - Inspecting order book state
//! - Resetting the engine

use match_engine::{MatchingEngine, Side, SubmitOutcome};
use rust_decimal::Decimal;

fn main() -> anyhow::Result<()> {
    match_engine::telemetry::init_tracing(false)?;

    println!("=== Match Engine Library Example ===\n");

    let mut engine = MatchingEngine::new();
    let config = engine.config();
    println!(
        "Prices kept to {} decimals, orders capped at {}\n",
        config.price_decimals, config.max_order_quantity
    );
    engine.on_trade_executed(|trade, buy, sell| {
        println!(
            "  hook: trade #{} {} @ {} = {} (buy #{} left {}, sell #{} left {})",
            trade.id,
            trade.quantity,
            trade.price,
            trade.notional().unwrap_or_default(),
            buy.id,
            buy.remaining_quantity(),
            sell.id,
            sell.remaining_quantity()
        );
    });

    println!("--- Adding Buy Orders ---");
    report(engine.submit(Side::Buy, Decimal::from(50), Decimal::from(100))?);
    report(engine.submit(Side::Buy, Decimal::from(30), Decimal::new(9950, 2))?);
    report(engine.submit(Side::Buy, Decimal::from(20), Decimal::from(101))?);

    println!("\n--- Adding Sell Orders ---");
    report(engine.submit(Side::Sell, Decimal::from(25), Decimal::from(105))?);
    report(engine.submit(Side::Sell, Decimal::from(40), Decimal::new(103_499, 3))?);

    println!("\n--- Order Book State ---");
    display_order_book_state(&engine);

    println!("\n--- Adding Matching Sell Order ---");
    report(engine.submit(Side::Sell, Decimal::from(30), Decimal::from(100))?);

    println!("\n--- Adding Matching Buy Order ---");
    report(engine.submit(Side::Buy, Decimal::from(15), Decimal::from(105))?);

    println!("\n--- Rejected Order ---");
    if let Err(err) = engine.submit(Side::Buy, Decimal::ZERO, Decimal::from(100)) {
        println!("  {err}");
    }
    if let Err(err) = engine.submit(Side::Buy, Decimal::MAX, Decimal::from(100)) {
        println!("  {err}");
    }

    println!("\n--- Updated Order Book State ---");
    display_order_book_state(&engine);

    println!("\nBid levels:");
    for level in engine.depth(Side::Buy) {
        println!(
            "  Price: {}, Total: {}, Orders: {}",
            level.price, level.quantity, level.order_count
        );
    }
    println!("\nAsk levels:");
    for level in engine.depth(Side::Sell) {
        println!(
            "  Price: {}, Total: {}, Orders: {}",
            level.price, level.quantity, level.order_count
        );
    }

    println!("\n--- Reset ---");
    engine.reset();
    display_order_book_state(&engine);

    println!("\n=== Example Complete ===");
    Ok(())
}

fn report(outcome: SubmitOutcome) {
    let order = &outcome.order;
    println!(
        "Order #{} {:?} {} @ {}: {:?}, remaining {}, trades {}",
        order.id,
        order.side,
        order.original_quantity,
        order.price,
        order.status(),
        order.remaining_quantity(),
        outcome.trades.len()
    );
}

fn display_order_book_state(engine: &MatchingEngine) {
    let stats = engine.stats();

    println!("Order Book Statistics:");
    println!("  Total Orders: {}", stats.total_orders);
    println!("  Bid Levels: {}", stats.bid_levels);
    println!("  Ask Levels: {}", stats.ask_levels);
    println!("  Bid Volume: {}", stats.bid_volume);
    println!("  Ask Volume: {}", stats.ask_volume);

    match engine.spread() {
        Some(spread) => println!(
            "  Best Bid: {}, Best Ask: {}, Spread: {}",
            spread.bid, spread.ask, spread.spread
        ),
        None => println!("  Spread: N/A (one side empty)"),
    }
    println!("  Traded Volume: {}", engine.total_volume());
    match engine.last_trade_price() {
        Some(price) => println!("  Last Trade: {price}"),
        None => println!("  Last Trade: None"),
    }
}

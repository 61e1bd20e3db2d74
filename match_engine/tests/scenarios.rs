use match_engine::{EngineConfig, EngineError, MatchingEngine, OrderStatus, RejectReason, Side};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

#[test]
fn buy_into_empty_book_rests_at_top_of_bids() {
    let mut engine = MatchingEngine::new();

    let outcome = engine.submit(Side::Buy, dec(10), dec(100)).unwrap();

    assert!(outcome.trades.is_empty());
    assert_eq!(outcome.order.status(), OrderStatus::Active);
    let bids: Vec<_> = engine.bids().collect();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].id, outcome.order.id);
    assert_eq!(engine.asks().count(), 0);
}

#[test]
fn partial_cross_rests_the_remainder() {
    let mut engine = MatchingEngine::new();
    let sell = engine.submit(Side::Sell, dec(5), dec(100)).unwrap().order;

    let outcome = engine.submit(Side::Buy, dec(10), dec(101)).unwrap();

    assert_eq!(outcome.trades.len(), 1);
    let trade = &outcome.trades[0];
    assert_eq!(trade.quantity, dec(5));
    assert_eq!(trade.price, dec(100));
    assert_eq!(trade.buy_order_id, outcome.order.id);
    assert_eq!(trade.sell_order_id, sell.id);
    assert_eq!(trade.aggressor, Side::Buy);

    assert_eq!(outcome.order.remaining_quantity(), dec(5));
    assert_eq!(outcome.order.status(), OrderStatus::PartiallyFilled);
    let bids: Vec<_> = engine.bids().collect();
    assert_eq!(bids.len(), 1);
    assert_eq!(bids[0].remaining_quantity(), dec(5));
    assert_eq!(engine.asks().count(), 0);
}

#[test]
fn aggressor_walks_levels_at_resting_prices() {
    let mut engine = MatchingEngine::new();
    engine.submit(Side::Sell, dec(5), dec(100)).unwrap();
    engine.submit(Side::Sell, dec(5), dec(101)).unwrap();

    let outcome = engine.submit(Side::Buy, dec(10), dec(101)).unwrap();

    let fills: Vec<_> = outcome
        .trades
        .iter()
        .map(|trade| (trade.quantity, trade.price))
        .collect();
    assert_eq!(fills, vec![(dec(5), dec(100)), (dec(5), dec(101))]);
    assert_eq!(outcome.order.status(), OrderStatus::Filled);
    assert_eq!(engine.asks().count(), 0);
    assert_eq!(engine.bids().count(), 0);
}

#[test]
fn zero_quantity_is_rejected_without_side_effects() {
    let mut engine = MatchingEngine::new();
    engine.submit(Side::Sell, dec(5), dec(100)).unwrap();
    let before = engine.snapshot();

    let calls = Arc::new(AtomicUsize::new(0));
    let (trade_calls, added_calls, book_calls) = (calls.clone(), calls.clone(), calls.clone());
    engine.on_trade_executed(move |_, _, _| {
        trade_calls.fetch_add(1, Ordering::SeqCst);
    });
    engine.on_order_added(move |_| {
        added_calls.fetch_add(1, Ordering::SeqCst);
    });
    engine.on_order_book_updated(move |_, _| {
        book_calls.fetch_add(1, Ordering::SeqCst);
    });

    let err = engine.submit(Side::Buy, dec(0), dec(100)).unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidOrder {
            quantity: dec(0),
            price: dec(100),
            reason: RejectReason::NonPositiveQuantity,
        }
    );
    assert_eq!(engine.snapshot(), before);
    assert!(engine.trades().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn zero_price_is_rejected() {
    let mut engine = MatchingEngine::new();
    let err = engine.submit(Side::Sell, dec(5), dec(0)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidOrder { .. }));
    assert_eq!(engine.asks().count(), 0);
}

#[test]
fn equal_price_matches_earliest_admission_first() {
    let mut engine = MatchingEngine::new();
    let first = engine.submit(Side::Buy, dec(5), dec(100)).unwrap().order;
    let second = engine.submit(Side::Buy, dec(5), dec(100)).unwrap().order;
    assert!(first.timestamp < second.timestamp);

    let outcome = engine.submit(Side::Sell, dec(5), dec(100)).unwrap();

    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.trades[0].buy_order_id, first.id);
    let bids: Vec<_> = engine.bids().map(|order| order.id).collect();
    assert_eq!(bids, vec![second.id]);
}

#[test]
fn better_price_beats_earlier_admission() {
    let mut engine = MatchingEngine::new();
    engine.submit(Side::Sell, dec(5), dec(102)).unwrap();
    let better = engine.submit(Side::Sell, dec(5), dec(101)).unwrap().order;

    let outcome = engine.submit(Side::Buy, dec(5), dec(105)).unwrap();

    assert_eq!(outcome.trades[0].sell_order_id, better.id);
    assert_eq!(outcome.trades[0].price, dec(101));
}

#[test]
fn sell_aggressor_executes_at_resting_bid_price() {
    let mut engine = MatchingEngine::new();
    engine.submit(Side::Buy, dec(3), dec(105)).unwrap();

    let outcome = engine.submit(Side::Sell, dec(3), dec(99)).unwrap();

    assert_eq!(outcome.trades[0].price, dec(105));
    assert_eq!(outcome.trades[0].aggressor, Side::Sell);
    assert_eq!(engine.last_trade_price(), Some(dec(105)));
}

#[test]
fn non_crossing_orders_both_rest() {
    let mut engine = MatchingEngine::new();
    engine.submit(Side::Buy, dec(3), dec(99)).unwrap();
    let outcome = engine.submit(Side::Sell, dec(3), dec(100)).unwrap();

    assert!(outcome.trades.is_empty());
    let spread = engine.spread().unwrap();
    assert_eq!(spread.bid, dec(99));
    assert_eq!(spread.ask, dec(100));
    assert_eq!(spread.spread, dec(1));
}

#[test]
fn spread_is_absent_with_a_one_sided_book() {
    let mut engine = MatchingEngine::new();
    assert!(engine.spread().is_none());
    engine.submit(Side::Buy, dec(3), dec(99)).unwrap();
    assert!(engine.spread().is_none());
}

#[test]
fn volume_and_last_price_track_the_trade_log() {
    let mut engine = MatchingEngine::new();
    assert_eq!(engine.total_volume(), Decimal::ZERO);
    assert_eq!(engine.last_trade_price(), None);

    engine.submit(Side::Sell, dec(4), dec(100)).unwrap();
    engine.submit(Side::Sell, dec(4), dec(102)).unwrap();
    engine.submit(Side::Buy, dec(6), dec(102)).unwrap();

    assert_eq!(engine.total_volume(), dec(6));
    assert_eq!(engine.last_trade_price(), Some(dec(102)));
    let ids: Vec<_> = engine.trades().iter().map(|trade| trade.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn resting_order_filled_by_later_aggressors_leaves_the_book() {
    let mut engine = MatchingEngine::new();
    engine.submit(Side::Sell, dec(10), dec(100)).unwrap();
    engine.submit(Side::Buy, dec(4), dec(100)).unwrap();

    let resting = engine.asks().next().unwrap();
    assert_eq!(resting.remaining_quantity(), dec(6));
    assert_eq!(resting.status(), OrderStatus::PartiallyFilled);

    engine.submit(Side::Buy, dec(6), dec(100)).unwrap();
    assert_eq!(engine.asks().count(), 0);
}

#[test]
fn reset_twice_yields_the_same_empty_state() {
    let mut engine = MatchingEngine::new();
    engine.submit(Side::Sell, dec(5), dec(100)).unwrap();
    engine.submit(Side::Buy, dec(8), dec(100)).unwrap();

    engine.reset();
    let first = (engine.snapshot(), engine.trades().len(), engine.total_volume());
    engine.reset();
    let second = (engine.snapshot(), engine.trades().len(), engine.total_volume());

    assert_eq!(first, second);
    assert!(second.0.bids.is_empty() && second.0.asks.is_empty());
    assert_eq!(second.1, 0);
    assert_eq!(engine.last_trade_price(), None);

    let sell = engine.submit(Side::Sell, dec(1), dec(100)).unwrap();
    assert_eq!(sell.order.id, 1);
    let buy = engine.submit(Side::Buy, dec(1), dec(100)).unwrap();
    assert_eq!(buy.order.id, 2);
    assert_eq!(buy.trades[0].id, 1);
}

#[test]
fn separate_engines_keep_separate_id_sequences() {
    let mut a = MatchingEngine::new();
    let mut b = MatchingEngine::new();
    a.submit(Side::Buy, dec(1), dec(10)).unwrap();
    a.submit(Side::Buy, dec(1), dec(10)).unwrap();

    assert_eq!(b.submit(Side::Buy, dec(1), dec(10)).unwrap().order.id, 1);
}

fn unbounded_engine() -> MatchingEngine {
    MatchingEngine::with_config(EngineConfig {
        max_order_quantity: Decimal::MAX,
        ..EngineConfig::default()
    })
}

#[test]
fn resting_volume_overflow_is_rejected_without_side_effects() {
    let mut engine = unbounded_engine();
    engine.submit(Side::Buy, Decimal::MAX, dec(100)).unwrap();
    let before = engine.snapshot();

    let err = engine.submit(Side::Buy, Decimal::MAX, dec(100)).unwrap_err();

    assert_eq!(
        err,
        EngineError::InvalidOrder {
            quantity: Decimal::MAX,
            price: dec(100),
            reason: RejectReason::VolumeOverflow,
        }
    );
    assert_eq!(engine.snapshot(), before);
    assert_eq!(engine.book(Side::Buy).volume(), Decimal::MAX);

    // the other side is still open for business
    let outcome = engine.submit(Side::Sell, dec(1), dec(200)).unwrap();
    assert_eq!(outcome.order.id, 2);
}

#[test]
fn traded_volume_overflow_is_rejected_before_matching() {
    let mut engine = unbounded_engine();
    engine.submit(Side::Sell, Decimal::MAX, dec(100)).unwrap();
    engine.submit(Side::Buy, Decimal::MAX, dec(100)).unwrap();
    assert_eq!(engine.total_volume(), Decimal::MAX);
    engine.submit(Side::Sell, dec(1), dec(100)).unwrap_err();

    let err = engine.submit(Side::Buy, dec(1), dec(100)).unwrap_err();

    assert!(matches!(
        err,
        EngineError::InvalidOrder {
            reason: RejectReason::VolumeOverflow,
            ..
        }
    ));
    assert_eq!(engine.trades().len(), 1);
    assert_eq!(engine.total_volume(), Decimal::MAX);
}

#[test]
fn default_limit_rejects_oversized_orders() {
    let mut engine = MatchingEngine::new();

    let err = engine.submit(Side::Sell, Decimal::MAX, dec(100)).unwrap_err();

    assert!(matches!(
        err,
        EngineError::InvalidOrder {
            reason: RejectReason::QuantityAboveLimit,
            ..
        }
    ));
    assert_eq!(engine.asks().count(), 0);
}

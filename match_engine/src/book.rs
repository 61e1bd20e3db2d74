//! One side of the order book.
//!
//! Resting orders are grouped into price levels kept in a `BTreeMap`. Each
//! level holds its orders in a FIFO queue ordered by admission timestamp, so
//! walking the levels from the best price outward and each queue from the
//! front yields strict price-time priority.
use std::collections::{btree_map, BTreeMap, VecDeque};
use std::iter::Rev;

use rust_decimal::Decimal;

use crate::order::Order;
use crate::types::{Price, PriceLevelView, Quantity, Side};

/// Represents a price level in the order book with aggregated information
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub quantity: Quantity,
    pub orders: VecDeque<Order>,
}

impl PriceLevel {
    /// Create a new price level
    pub fn new() -> Self {
        Self {
            quantity: Decimal::ZERO,
            orders: VecDeque::new(),
        }
    }

    /// Places the order behind every order admitted before it.
    fn push(&mut self, order: Order) {
        let at = self
            .orders
            .iter()
            .rposition(|resting| resting.timestamp < order.timestamp)
            .map_or(0, |i| i + 1);
        self.quantity += order.remaining_quantity();
        self.orders.insert(at, order);
    }

    fn view(&self, price: Price) -> PriceLevelView {
        PriceLevelView {
            price,
            quantity: self.quantity,
            order_count: self.orders.len(),
        }
    }
}

impl Default for PriceLevel {
    fn default() -> Self {
        Self::new()
    }
}

/// Walks price levels best-first: descending for bids, ascending for asks.
enum LevelIter<'a> {
    Fwd(btree_map::Iter<'a, Price, PriceLevel>),
    Rev(Rev<btree_map::Iter<'a, Price, PriceLevel>>),
}

impl<'a> Iterator for LevelIter<'a> {
    type Item = (&'a Price, &'a PriceLevel);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            LevelIter::Fwd(iter) => iter.next(),
            LevelIter::Rev(iter) => iter.next(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BookSide {
    side: Side,
    levels: BTreeMap<Price, PriceLevel>,
    order_count: usize,
    volume: Quantity,
}

impl BookSide {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
            order_count: 0,
            volume: Decimal::ZERO,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Number of resting orders
    pub fn len(&self) -> usize {
        self.order_count
    }

    pub fn is_empty(&self) -> bool {
        self.order_count == 0
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Total remaining quantity resting on this side.
    ///
    /// Every level quantity is bounded by this total, so an insert that keeps
    /// it representable cannot overflow a level either.
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    pub fn best_price(&self) -> Option<Price> {
        let best = match self.side {
            Side::Buy => self.levels.last_key_value(),
            Side::Sell => self.levels.first_key_value(),
        };
        best.map(|(price, _)| *price)
    }

    /// The order every incoming aggressor meets first.
    pub fn front(&self) -> Option<&Order> {
        self.level_iter()
            .next()
            .and_then(|(_, level)| level.orders.front())
    }

    /// Resting orders in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Order> + '_ {
        self.level_iter().flat_map(|(_, level)| level.orders.iter())
    }

    /// Aggregated levels in priority order.
    pub fn levels(&self) -> Vec<PriceLevelView> {
        self.level_iter()
            .map(|(price, level)| level.view(*price))
            .collect()
    }

    pub fn to_vec(&self) -> Vec<Order> {
        self.iter().cloned().collect()
    }

    fn level_iter(&self) -> LevelIter<'_> {
        match self.side {
            Side::Buy => LevelIter::Rev(self.levels.iter().rev()),
            Side::Sell => LevelIter::Fwd(self.levels.iter()),
        }
    }

    /// Rests an order with a nonzero remainder on this side.
    ///
    /// Callers check `volume().checked_add(..)` first.
    pub(crate) fn insert(&mut self, order: Order) {
        debug_assert_eq!(order.side, self.side);
        debug_assert!(!order.is_filled());
        self.volume += order.remaining_quantity();
        self.levels
            .entry(order.price)
            .or_insert_with(PriceLevel::new)
            .push(order);
        self.order_count += 1;
    }

    /// Executes up to `quantity` against the head order.
    ///
    /// Returns the head's state after the fill. A head that reaches zero is
    /// removed, together with its level when that level empties.
    pub(crate) fn fill_front(&mut self, quantity: Quantity) -> Option<Order> {
        let mut entry = match self.side {
            Side::Buy => self.levels.last_entry()?,
            Side::Sell => self.levels.first_entry()?,
        };

        let (head, executed, level_empty) = {
            let level = entry.get_mut();
            let front = level.orders.front_mut()?;
            let executed = quantity.min(front.remaining_quantity());
            front.fill(executed);
            let head = front.clone();
            level.quantity -= executed;
            if head.is_filled() {
                level.orders.pop_front();
            }
            (head, executed, level.orders.is_empty())
        };
        self.volume -= executed;

        if head.is_filled() {
            self.order_count -= 1;
        }
        if level_empty {
            entry.remove();
        }
        Some(head)
    }

    pub(crate) fn clear(&mut self) {
        self.levels.clear();
        self.order_count = 0;
        self.volume = Decimal::ZERO;
    }
}

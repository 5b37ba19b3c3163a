//! Per-symbol order book and tape state.
//!
//! Holds the latest top-of-book and a bounded ring of recent trade
//! prints. Every trade carries both the exchange event timestamp and the
//! local receipt timestamp; receipt time is authoritative for staleness
//! and warmup decisions because event time can lag under upstream
//! batching or replay.

use crate::{Price, Size};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Sentinel for "no tape print has ever been received".
pub const TAPE_NEVER_RECEIVED_MS: i64 = 0;

/// Default capacity of the recent-trade ring.
const DEFAULT_TRADE_RING_CAPACITY: usize = 256;

/// A single executed-trade print from the tape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: Price,
    pub size: Size,
    /// Exchange-stamped event time (Unix ms).
    pub event_ts_ms: i64,
    /// Local arrival time (Unix ms). `receipt_ts_ms >= event_ts_ms` is
    /// expected but not enforced; consumers must tolerate violations.
    pub receipt_ts_ms: i64,
}

/// One side of the top of book.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: Price,
    pub size: Size,
}

impl PriceLevel {
    pub fn new(price: Price, size: Size) -> Self {
        Self { price, size }
    }
}

/// Result of the book's own validity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidity {
    /// Book is usable for decisions.
    Valid,
    /// Book is unusable, with a diagnostic reason.
    Invalid(String),
}

impl BookValidity {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid(reason) => Some(reason),
        }
    }
}

/// Latest known book and tape state for a single symbol.
///
/// Owned by the market data ingestion side; gate evaluations only read a
/// snapshot of it. Trades are kept in arrival order, oldest evicted first.
#[derive(Debug, Clone)]
pub struct OrderBookState {
    symbol: String,
    best_bid: Option<PriceLevel>,
    best_ask: Option<PriceLevel>,
    recent_trades: VecDeque<Trade>,
    capacity: usize,
    last_tape_receipt_ms: i64,
}

impl OrderBookState {
    /// Create an empty book for a symbol with the default ring capacity.
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_capacity(symbol, DEFAULT_TRADE_RING_CAPACITY)
    }

    /// Create an empty book with an explicit ring capacity (min 1).
    pub fn with_capacity(symbol: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            symbol: symbol.into(),
            best_bid: None,
            best_ask: None,
            recent_trades: VecDeque::with_capacity(capacity),
            capacity,
            last_tape_receipt_ms: TAPE_NEVER_RECEIVED_MS,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.best_bid
    }

    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.best_ask
    }

    /// Unix ms of the most recent tape receipt; `TAPE_NEVER_RECEIVED_MS`
    /// when no print has arrived yet.
    pub fn last_tape_receipt_ms(&self) -> i64 {
        self.last_tape_receipt_ms
    }

    pub fn recent_trades(&self) -> impl Iterator<Item = &Trade> {
        self.recent_trades.iter()
    }

    pub fn trade_count(&self) -> usize {
        self.recent_trades.len()
    }

    /// Replace the top of book.
    pub fn update_top(&mut self, best_bid: Option<PriceLevel>, best_ask: Option<PriceLevel>) {
        self.best_bid = best_bid;
        self.best_ask = best_ask;
    }

    /// Record a tape print, evicting the oldest when the ring is full.
    pub fn record_trade(&mut self, trade: Trade) {
        if self.recent_trades.len() == self.capacity {
            self.recent_trades.pop_front();
        }
        self.last_tape_receipt_ms = trade.receipt_ts_ms;
        self.recent_trades.push_back(trade);
    }

    /// Count trades whose receipt timestamp falls in the closed window
    /// `[now_ms - window_ms, now_ms]`.
    ///
    /// A zero window counts only trades received at exactly `now_ms`.
    pub fn trades_in_receipt_window(&self, now_ms: i64, window_ms: i64) -> usize {
        let window_start = now_ms.saturating_sub(window_ms.max(0));
        self.recent_trades
            .iter()
            .filter(|t| t.receipt_ts_ms >= window_start && t.receipt_ts_ms <= now_ms)
            .count()
    }

    /// The book's own validity check.
    ///
    /// A book is usable when both sides are present with positive prices
    /// and sizes and the bid is strictly below the ask.
    pub fn validity(&self) -> BookValidity {
        let bid = match self.best_bid {
            Some(level) => level,
            None => return BookValidity::Invalid("no best bid".to_string()),
        };
        let ask = match self.best_ask {
            Some(level) => level,
            None => return BookValidity::Invalid("no best ask".to_string()),
        };

        if !bid.price.is_positive() || !ask.price.is_positive() {
            return BookValidity::Invalid(format!(
                "non-positive price (bid={}, ask={})",
                bid.price, ask.price
            ));
        }
        if !bid.size.is_positive() || !ask.size.is_positive() {
            return BookValidity::Invalid(format!(
                "non-positive size (bid={}, ask={})",
                bid.size, ask.size
            ));
        }
        if bid.price >= ask.price {
            return BookValidity::Invalid(format!(
                "crossed book (bid={} >= ask={})",
                bid.price, ask.price
            ));
        }

        BookValidity::Valid
    }
}

//! Tape freshness gate.
//!
//! Classifies a symbol's tape state into a readiness status from a book
//! snapshot, an explicit clock, and a subscription flag. Staleness and
//! warmup are judged on receipt time only; event time can lag under
//! upstream batching or replay and must never make delayed data look
//! fresh.

use serde::{Deserialize, Serialize};
use tapeguard_core::{OrderBookState, TAPE_NEVER_RECEIVED_MS};

/// Freshness gate configuration.
///
/// Immutable once built; rebuilt on configuration reload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapeGateConfig {
    /// Minimum trades inside the warmup window before the tape is trusted.
    #[serde(default = "default_warmup_min_trades")]
    pub warmup_min_trades: usize,
    /// Warmup lookback window in milliseconds.
    #[serde(default = "default_warmup_window_ms")]
    pub warmup_window_ms: i64,
    /// Maximum tape age in milliseconds before the tape counts as stale.
    #[serde(default = "default_stale_window_ms")]
    pub stale_window_ms: i64,
}

fn default_warmup_min_trades() -> usize {
    1
}

fn default_warmup_window_ms() -> i64 {
    15_000
}

fn default_stale_window_ms() -> i64 {
    30_000
}

impl Default for TapeGateConfig {
    fn default() -> Self {
        Self {
            warmup_min_trades: default_warmup_min_trades(),
            warmup_window_ms: default_warmup_window_ms(),
            stale_window_ms: default_stale_window_ms(),
        }
    }
}

impl TapeGateConfig {
    /// Build a config, clamping negative windows to zero.
    pub fn new(warmup_min_trades: usize, warmup_window_ms: i64, stale_window_ms: i64) -> Self {
        Self {
            warmup_min_trades,
            warmup_window_ms,
            stale_window_ms,
        }
        .sanitized()
    }

    /// Clamp negative windows to zero. Invalid thresholds are never fatal.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.warmup_window_ms = self.warmup_window_ms.max(0);
        self.stale_window_ms = self.stale_window_ms.max(0);
        self
    }
}

/// Tape readiness classification for one evaluation.
///
/// Built fresh on every call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapeStatus {
    /// No live tape subscription exists for the symbol.
    MissingSubscription,
    /// Not enough recent trades to trust the tape yet.
    NotWarmedUp {
        /// Age of the last tape print; `None` when nothing was ever received.
        age_ms: Option<i64>,
        trades_in_window: usize,
        warmup_min_trades: usize,
        warmup_window_ms: i64,
    },
    /// The last tape print is older than the stale window.
    Stale { age_ms: i64 },
    /// Tape is fresh and warmed up.
    Ready {
        age_ms: i64,
        trades_in_window: usize,
    },
}

impl TapeStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// Age of the last tape print, when known.
    pub fn age_ms(&self) -> Option<i64> {
        match self {
            Self::MissingSubscription => None,
            Self::NotWarmedUp { age_ms, .. } => *age_ms,
            Self::Stale { age_ms } => Some(*age_ms),
            Self::Ready { age_ms, .. } => Some(*age_ms),
        }
    }
}

/// Tape freshness gate.
///
/// Pure function of the book snapshot, the caller's clock, and the
/// subscription flag; holds only immutable configuration.
#[derive(Debug, Clone)]
pub struct TapeFreshnessGate {
    config: TapeGateConfig,
}

impl TapeFreshnessGate {
    pub fn new(config: TapeGateConfig) -> Self {
        Self {
            config: config.sanitized(),
        }
    }

    pub fn config(&self) -> &TapeGateConfig {
        &self.config
    }

    /// Classify the tape state. First matching rule wins:
    ///
    /// 1. no subscription -> `MissingSubscription`
    /// 2. no print ever received -> `NotWarmedUp` (no age)
    /// 3. age strictly above the stale window -> `Stale`
    /// 4. too few trades in the warmup window -> `NotWarmedUp`
    /// 5. otherwise -> `Ready`
    ///
    /// All threshold comparisons are strict: equality at a boundary still
    /// counts as fresh / sufficient.
    pub fn evaluate(
        &self,
        book: &OrderBookState,
        now_ms: i64,
        is_subscribed: bool,
    ) -> TapeStatus {
        if !is_subscribed {
            return TapeStatus::MissingSubscription;
        }

        if book.trade_count() == 0 || book.last_tape_receipt_ms() == TAPE_NEVER_RECEIVED_MS {
            return TapeStatus::NotWarmedUp {
                age_ms: None,
                trades_in_window: 0,
                warmup_min_trades: self.config.warmup_min_trades,
                warmup_window_ms: self.config.warmup_window_ms,
            };
        }

        let age_ms = now_ms - book.last_tape_receipt_ms();
        if age_ms > self.config.stale_window_ms {
            return TapeStatus::Stale { age_ms };
        }

        let trades_in_window =
            book.trades_in_receipt_window(now_ms, self.config.warmup_window_ms);
        if trades_in_window < self.config.warmup_min_trades {
            return TapeStatus::NotWarmedUp {
                age_ms: Some(age_ms),
                trades_in_window,
                warmup_min_trades: self.config.warmup_min_trades,
                warmup_window_ms: self.config.warmup_window_ms,
            };
        }

        TapeStatus::Ready {
            age_ms,
            trades_in_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tapeguard_core::{Price, Size, Trade};

    fn trade_at(receipt_ts_ms: i64) -> Trade {
        Trade {
            price: Price::new(dec!(50000)),
            size: Size::new(dec!(0.1)),
            event_ts_ms: receipt_ts_ms,
            receipt_ts_ms,
        }
    }

    fn book_with_trades(receipts: &[i64]) -> OrderBookState {
        let mut book = OrderBookState::new("BTC");
        for &ts in receipts {
            book.record_trade(trade_at(ts));
        }
        book
    }

    #[test]
    fn test_missing_subscription_wins_over_everything() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::default());
        // Even a fully warmed-up book reports MissingSubscription.
        let book = book_with_trades(&[9_000, 9_500, 10_000]);
        let status = gate.evaluate(&book, 10_000, false);
        assert_eq!(status, TapeStatus::MissingSubscription);
        assert!(!status.is_ready());
        assert_eq!(status.age_ms(), None);
    }

    #[test]
    fn test_no_trades_ever_is_not_warmed_up_without_age() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::default());
        let book = OrderBookState::new("BTC");
        let status = gate.evaluate(&book, 10_000, true);
        assert_eq!(
            status,
            TapeStatus::NotWarmedUp {
                age_ms: None,
                trades_in_window: 0,
                warmup_min_trades: 1,
                warmup_window_ms: 15_000,
            }
        );
    }

    #[test]
    fn test_stale_boundary_is_strict() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::new(1, 60_000, 30_000));
        let book = book_with_trades(&[10_000]);

        // age == stale_window_ms exactly: still fresh.
        let status = gate.evaluate(&book, 40_000, true);
        assert!(status.is_ready(), "boundary equality must stay fresh");

        // One millisecond beyond: stale, on receipt time.
        let status = gate.evaluate(&book, 40_001, true);
        assert_eq!(status, TapeStatus::Stale { age_ms: 30_001 });
    }

    #[test]
    fn test_staleness_uses_receipt_not_event_time() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::default());
        let mut book = OrderBookState::new("BTC");
        // Replayed print: ancient event time, fresh receipt.
        book.record_trade(Trade {
            price: Price::new(dec!(50000)),
            size: Size::new(dec!(0.1)),
            event_ts_ms: 1_000,
            receipt_ts_ms: 99_000,
        });
        let status = gate.evaluate(&book, 100_000, true);
        assert_eq!(
            status,
            TapeStatus::Ready {
                age_ms: 1_000,
                trades_in_window: 1,
            }
        );
    }

    #[test]
    fn test_warmup_insufficient_trades() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::new(2, 10_000, 20_000));
        let book = book_with_trades(&[5_000]);
        let status = gate.evaluate(&book, 10_000, true);
        assert_eq!(
            status,
            TapeStatus::NotWarmedUp {
                age_ms: Some(5_000),
                trades_in_window: 1,
                warmup_min_trades: 2,
                warmup_window_ms: 10_000,
            }
        );
    }

    #[test]
    fn test_warmup_boundary_count_is_sufficient() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::new(2, 10_000, 20_000));
        // Trade exactly at the window start still counts (closed interval).
        let book = book_with_trades(&[0, 10_000]);
        let status = gate.evaluate(&book, 10_000, true);
        assert_eq!(
            status,
            TapeStatus::Ready {
                age_ms: 0,
                trades_in_window: 2,
            }
        );
    }

    #[test]
    fn test_zero_warmup_window_counts_only_now() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::new(1, 0, 30_000));
        let book = book_with_trades(&[9_999]);
        let status = gate.evaluate(&book, 10_000, true);
        // One trade exists, but none received at exactly now.
        assert_eq!(
            status,
            TapeStatus::NotWarmedUp {
                age_ms: Some(1),
                trades_in_window: 0,
                warmup_min_trades: 1,
                warmup_window_ms: 0,
            }
        );

        let book = book_with_trades(&[10_000]);
        assert!(gate.evaluate(&book, 10_000, true).is_ready());
    }

    #[test]
    fn test_zero_stale_window_accepts_only_current_instant() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::new(1, 1_000, 0));
        let book = book_with_trades(&[10_000]);
        assert!(gate.evaluate(&book, 10_000, true).is_ready());
        assert_eq!(
            gate.evaluate(&book, 10_001, true),
            TapeStatus::Stale { age_ms: 1 }
        );
    }

    #[test]
    fn test_negative_config_clamped_at_construction() {
        let config = TapeGateConfig::new(1, -500, -1);
        assert_eq!(config.warmup_window_ms, 0);
        assert_eq!(config.stale_window_ms, 0);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let gate = TapeFreshnessGate::new(TapeGateConfig::default());
        let book = book_with_trades(&[8_000, 9_000]);
        let first = gate.evaluate(&book, 10_000, true);
        let second = gate.evaluate(&book, 10_000, true);
        assert_eq!(first, second);
    }
}

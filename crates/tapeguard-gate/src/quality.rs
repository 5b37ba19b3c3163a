//! Data quality flag engine.
//!
//! Combines book validity, tape readiness, and depth completeness into a
//! list of named flags, and maps each flag to a severity and recommended
//! action. Downstream throttling treats any Critical flag as a reason to
//! suppress a signal; the flag list itself is attached to the journaled
//! decision.
//!
//! Flags are plain strings. A flag's base name (the portion before its
//! first `:` or `=`) decides severity; parameterized suffixes such as
//! `ageMs=...` never change it.

use crate::freshness::TapeStatus;
use serde::{Deserialize, Serialize};
use tapeguard_core::{BookValidity, DepthSnapshot, OrderBookState};

/// Fixed depth-update age threshold for `StaleDepth`.
pub const STALE_DEPTH_THRESHOLD_MS: i64 = 2_000;

/// Severity classification of a data quality flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagSeverity {
    Info,
    Warning,
    Critical,
}

/// Interpreted meaning of a single flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagInterpretation {
    pub flag: String,
    pub severity: FlagSeverity,
    pub description: String,
    pub recommended_action: Option<String>,
}

/// Build the data quality flags for one evaluation.
///
/// Rules are independent and additive; emission order is stable for
/// human-readable journals but carries no meaning for severity logic, and
/// consumers must not assume the flag count is bounded.
pub fn build_flags(
    book: &OrderBookState,
    depth: &DepthSnapshot,
    tape_status: &TapeStatus,
) -> Vec<String> {
    let mut flags = Vec::new();

    if let BookValidity::Invalid(reason) = book.validity() {
        flags.push(format!("BookInvalid:{reason}"));
    }

    match tape_status {
        TapeStatus::MissingSubscription => {
            flags.push("TapeMissingSubscription".to_string());
        }
        TapeStatus::NotWarmedUp {
            age_ms,
            trades_in_window,
            warmup_min_trades,
            warmup_window_ms,
        } => {
            flags.push("TapeNotWarmedUp".to_string());
            flags.push(format!("TapeNotWarmedUp:tradesInWindow={trades_in_window}"));
            flags.push(format!("TapeNotWarmedUp:warmupMinTrades={warmup_min_trades}"));
            flags.push(format!("TapeNotWarmedUp:warmupWindowMs={warmup_window_ms}"));
            if let Some(age) = age_ms {
                flags.push(format!("TapeLastAgeMs={age}"));
            }
        }
        TapeStatus::Stale { age_ms } => {
            flags.push("TapeStale".to_string());
            // Legacy alias consumed by older audit tooling.
            flags.push("StaleTick".to_string());
            flags.push(format!("TapeStale:ageMs={age_ms}"));
        }
        TapeStatus::Ready { .. } => {}
    }

    if depth.is_partial() {
        flags.push("PartialBook".to_string());
        flags.push(format!("PartialBook:bidLevels={}", depth.bid_levels()));
        flags.push(format!("PartialBook:askLevels={}", depth.ask_levels()));
        flags.push(format!(
            "PartialBook:expected={}",
            depth.expected_depth_levels
        ));
    }

    if let Some(age) = depth.last_depth_update_age_ms {
        if age > STALE_DEPTH_THRESHOLD_MS {
            flags.push("StaleDepth".to_string());
            flags.push(format!("StaleDepth:ageMs={age}"));
        }
    }

    flags
}

/// Interpret a single flag string.
///
/// Total over arbitrary input: unknown or empty flags degrade to an
/// Info-severity "unclassified" result instead of failing.
pub fn interpret_flag(flag: &str) -> FlagInterpretation {
    let base = flag
        .split([':', '='])
        .next()
        .unwrap_or_default();

    let (severity, description, recommended_action) = match base {
        "PartialBook" => (
            FlagSeverity::Critical,
            "order book depth is missing expected levels",
            Some("trigger a depth re-subscription or retry"),
        ),
        "StaleTick" | "TapeStale" => (
            FlagSeverity::Critical,
            "tape has not printed within the stale window",
            Some("reject or wait for fresh tape"),
        ),
        "StaleDepth" => (
            FlagSeverity::Warning,
            "depth snapshot has not updated recently",
            Some("monitor; consider rejecting"),
        ),
        "TapeNotWarmedUp" => (
            FlagSeverity::Warning,
            "not enough recent trades to trust the tape",
            Some("add to the periodic re-check list"),
        ),
        "TapeMissingSubscription" => (
            FlagSeverity::Critical,
            "no live tape subscription for the symbol",
            Some("ensure the subscription exists"),
        ),
        "BookInvalid" => (
            FlagSeverity::Critical,
            "order book failed its own validity check",
            Some("wait for a valid book or reject"),
        ),
        "TapeLastAgeMs" => (
            FlagSeverity::Info,
            "age of the most recent tape print",
            None,
        ),
        "HeartbeatNoDecision" => (
            FlagSeverity::Info,
            "heartbeat entry; no decision was made",
            None,
        ),
        "MissingBookContext" => (
            FlagSeverity::Warning,
            "no book snapshot was available for the decision",
            Some("ensure depth capture is working"),
        ),
        _ => (
            FlagSeverity::Info,
            "unclassified data quality flag",
            None,
        ),
    };

    FlagInterpretation {
        flag: flag.to_string(),
        severity,
        description: description.to_string(),
        recommended_action: recommended_action.map(str::to_string),
    }
}

/// True iff at least one flag interprets as Critical.
pub fn has_critical_issues(flags: &[String]) -> bool {
    flags
        .iter()
        .any(|f| interpret_flag(f).severity == FlagSeverity::Critical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::freshness::{TapeFreshnessGate, TapeGateConfig};
    use rust_decimal_macros::dec;
    use tapeguard_core::{Price, PriceLevel, Size, Trade};

    fn valid_book() -> OrderBookState {
        let mut book = OrderBookState::new("BTC");
        book.update_top(
            Some(PriceLevel::new(
                Price::new(dec!(50000)),
                Size::new(dec!(1)),
            )),
            Some(PriceLevel::new(
                Price::new(dec!(50010)),
                Size::new(dec!(1)),
            )),
        );
        book.record_trade(Trade {
            price: Price::new(dec!(50005)),
            size: Size::new(dec!(0.1)),
            event_ts_ms: 9_990,
            receipt_ts_ms: 10_000,
        });
        book
    }

    fn full_depth() -> DepthSnapshot {
        DepthSnapshot {
            bids_top_n: vec![
                PriceLevel::new(Price::new(dec!(50000)), Size::new(dec!(1)));
                5
            ],
            asks_top_n: vec![
                PriceLevel::new(Price::new(dec!(50010)), Size::new(dec!(1)));
                5
            ],
            expected_depth_levels: 5,
            last_depth_update_age_ms: Some(100),
        }
    }

    fn ready_status() -> TapeStatus {
        TapeStatus::Ready {
            age_ms: 500,
            trades_in_window: 3,
        }
    }

    #[test]
    fn test_clean_state_emits_no_flags() {
        let flags = build_flags(&valid_book(), &full_depth(), &ready_status());
        assert!(flags.is_empty(), "unexpected flags: {flags:?}");
    }

    #[test]
    fn test_book_invalid_carries_reason() {
        let book = OrderBookState::new("BTC"); // no top of book at all
        let flags = build_flags(&book, &full_depth(), &ready_status());
        assert!(flags.contains(&"BookInvalid:no best bid".to_string()));
    }

    #[test]
    fn test_missing_subscription_flag() {
        let flags = build_flags(
            &valid_book(),
            &full_depth(),
            &TapeStatus::MissingSubscription,
        );
        assert_eq!(flags, vec!["TapeMissingSubscription".to_string()]);
    }

    #[test]
    fn test_not_warmed_up_diagnostics() {
        let status = TapeStatus::NotWarmedUp {
            age_ms: Some(5_000),
            trades_in_window: 1,
            warmup_min_trades: 2,
            warmup_window_ms: 10_000,
        };
        let flags = build_flags(&valid_book(), &full_depth(), &status);
        assert_eq!(
            flags,
            vec![
                "TapeNotWarmedUp".to_string(),
                "TapeNotWarmedUp:tradesInWindow=1".to_string(),
                "TapeNotWarmedUp:warmupMinTrades=2".to_string(),
                "TapeNotWarmedUp:warmupWindowMs=10000".to_string(),
                "TapeLastAgeMs=5000".to_string(),
            ]
        );
    }

    #[test]
    fn test_not_warmed_up_without_age_omits_age_flag() {
        let status = TapeStatus::NotWarmedUp {
            age_ms: None,
            trades_in_window: 0,
            warmup_min_trades: 1,
            warmup_window_ms: 15_000,
        };
        let flags = build_flags(&valid_book(), &full_depth(), &status);
        assert!(!flags.iter().any(|f| f.starts_with("TapeLastAgeMs")));
    }

    #[test]
    fn test_stale_emits_legacy_alias() {
        let flags = build_flags(
            &valid_book(),
            &full_depth(),
            &TapeStatus::Stale { age_ms: 31_000 },
        );
        assert_eq!(
            flags,
            vec![
                "TapeStale".to_string(),
                "StaleTick".to_string(),
                "TapeStale:ageMs=31000".to_string(),
            ]
        );
    }

    #[test]
    fn test_partial_book_diagnostics() {
        let mut depth = full_depth();
        depth.bids_top_n.truncate(3);
        let flags = build_flags(&valid_book(), &depth, &ready_status());
        assert!(flags.contains(&"PartialBook".to_string()));
        assert!(flags.contains(&"PartialBook:bidLevels=3".to_string()));
        assert!(flags.contains(&"PartialBook:askLevels=5".to_string()));
        assert!(flags.contains(&"PartialBook:expected=5".to_string()));
    }

    #[test]
    fn test_stale_depth_threshold_is_strict() {
        let mut depth = full_depth();
        depth.last_depth_update_age_ms = Some(STALE_DEPTH_THRESHOLD_MS);
        let flags = build_flags(&valid_book(), &depth, &ready_status());
        assert!(flags.is_empty(), "exactly at threshold is not stale");

        depth.last_depth_update_age_ms = Some(STALE_DEPTH_THRESHOLD_MS + 1);
        let flags = build_flags(&valid_book(), &depth, &ready_status());
        assert!(flags.contains(&"StaleDepth".to_string()));
        assert!(flags.contains(&"StaleDepth:ageMs=2001".to_string()));
    }

    #[test]
    fn test_unknown_depth_age_emits_nothing() {
        let mut depth = full_depth();
        depth.last_depth_update_age_ms = None;
        let flags = build_flags(&valid_book(), &depth, &ready_status());
        assert!(flags.is_empty());
    }

    #[test]
    fn test_flags_compose_additively() {
        let book = OrderBookState::new("BTC");
        let mut depth = full_depth();
        depth.asks_top_n.truncate(2);
        depth.last_depth_update_age_ms = Some(5_000);
        let flags = build_flags(&book, &depth, &TapeStatus::Stale { age_ms: 40_000 });

        assert!(flags.iter().any(|f| f.starts_with("BookInvalid:")));
        assert!(flags.contains(&"TapeStale".to_string()));
        assert!(flags.contains(&"PartialBook".to_string()));
        assert!(flags.contains(&"StaleDepth".to_string()));
    }

    #[test]
    fn test_gate_to_flags_pipeline() {
        // Wire the real gate output through the flag engine.
        let gate = TapeFreshnessGate::new(TapeGateConfig::default());
        let book = valid_book();
        let status = gate.evaluate(&book, 50_000, true); // 40s old -> stale
        let flags = build_flags(&book, &full_depth(), &status);
        assert!(has_critical_issues(&flags));
    }

    #[test]
    fn test_severity_table() {
        let cases = [
            ("PartialBook", FlagSeverity::Critical),
            ("StaleTick", FlagSeverity::Critical),
            ("TapeStale", FlagSeverity::Critical),
            ("StaleDepth", FlagSeverity::Warning),
            ("TapeNotWarmedUp", FlagSeverity::Warning),
            ("TapeMissingSubscription", FlagSeverity::Critical),
            ("BookInvalid", FlagSeverity::Critical),
            ("TapeLastAgeMs", FlagSeverity::Info),
            ("HeartbeatNoDecision", FlagSeverity::Info),
            ("MissingBookContext", FlagSeverity::Warning),
        ];
        for (flag, expected) in cases {
            assert_eq!(
                interpret_flag(flag).severity,
                expected,
                "severity mismatch for {flag}"
            );
        }
    }

    #[test]
    fn test_parameterized_suffix_keeps_base_severity() {
        assert_eq!(
            interpret_flag("TapeStale:ageMs=31000").severity,
            FlagSeverity::Critical
        );
        assert_eq!(
            interpret_flag("PartialBook:bidLevels=3").severity,
            FlagSeverity::Critical
        );
        assert_eq!(
            interpret_flag("TapeLastAgeMs=5000").severity,
            FlagSeverity::Info
        );
        assert_eq!(
            interpret_flag("BookInvalid:crossed book (bid=2 >= ask=1)").severity,
            FlagSeverity::Critical
        );
    }

    #[test]
    fn test_interpret_never_fails_on_malformed_input() {
        for weird in ["", ":", "=", ":::", "Bogus:with=both", "????"] {
            let interp = interpret_flag(weird);
            assert_eq!(interp.severity, FlagSeverity::Info, "input: {weird:?}");
            assert!(interp.recommended_action.is_none());
        }
    }

    #[test]
    fn test_has_critical_issues() {
        assert!(!has_critical_issues(&[]));
        assert!(!has_critical_issues(&["StaleDepth".to_string()]));
        assert!(has_critical_issues(&["PartialBook".to_string()]));
        assert!(has_critical_issues(&[
            "TapeLastAgeMs=100".to_string(),
            "StaleTick".to_string(),
        ]));
    }
}

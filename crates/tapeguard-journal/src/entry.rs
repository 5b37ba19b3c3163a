//! Shadow trade journal entries.
//!
//! Wire names are camelCase to stay parseable by the existing audit and
//! replay tooling. Entries are immutable once written; the log is
//! append-only and never edited or reordered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current journal entry schema version, stamped on entries that carry
/// none. Bump when the wire format changes.
pub const SCHEMA_VERSION: i32 = 2;

/// Kind of journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryType {
    /// A trading decision evaluated in shadow mode.
    ShadowDecision,
    /// Periodic liveness marker; no decision was made.
    Heartbeat,
}

/// Outcome of a journaled decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecisionOutcome {
    /// The signal would have been acted on.
    Taken,
    /// The signal was suppressed by data quality gating.
    Suppressed,
}

/// Inputs the decision was made from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionInputs {
    /// Signal score at decision time.
    pub score: f64,
    /// Data quality flags attached to the decision.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_quality_flags: Vec<String>,
}

/// One append-only journal record.
///
/// Timestamp invariant enforced at write time:
/// `journalWriteTimestampUtc >= decisionTimestampUtc >= marketTimestampUtc`
/// for every field that is present. Non-monotonic inputs are corrected
/// forward, never backward (`repair_timestamps`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowTradeJournalEntry {
    /// Run session id; stamped by the writer when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Schema version; defaulted to `SCHEMA_VERSION` at write time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<i32>,
    pub entry_type: EntryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_outcome: Option<DecisionOutcome>,
    pub symbol: String,
    pub decision_inputs: DecisionInputs,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Time of the market data the decision was based on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_timestamp_utc: Option<DateTime<Utc>>,
    /// Time the decision itself was made.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_timestamp_utc: Option<DateTime<Utc>>,
    /// Time the entry was written to the journal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journal_write_timestamp_utc: Option<DateTime<Utc>>,
}

impl ShadowTradeJournalEntry {
    /// Build a decision entry.
    pub fn decision(
        symbol: impl Into<String>,
        outcome: DecisionOutcome,
        inputs: DecisionInputs,
        rejection_reason: Option<String>,
        market_timestamp_utc: Option<DateTime<Utc>>,
        decision_timestamp_utc: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            session_id: None,
            schema_version: None,
            entry_type: EntryType::ShadowDecision,
            decision_outcome: Some(outcome),
            symbol: symbol.into(),
            decision_inputs: inputs,
            rejection_reason,
            market_timestamp_utc,
            decision_timestamp_utc,
            journal_write_timestamp_utc: None,
        }
    }

    /// Build a heartbeat entry.
    pub fn heartbeat(decision_timestamp_utc: Option<DateTime<Utc>>) -> Self {
        Self {
            session_id: None,
            schema_version: None,
            entry_type: EntryType::Heartbeat,
            decision_outcome: None,
            symbol: String::new(),
            decision_inputs: DecisionInputs {
                score: 0.0,
                data_quality_flags: vec!["HeartbeatNoDecision".to_string()],
            },
            rejection_reason: None,
            market_timestamp_utc: None,
            decision_timestamp_utc,
            journal_write_timestamp_utc: None,
        }
    }

    /// Repair timestamp monotonicity by clamping later fields forward.
    ///
    /// Earlier timestamps are never rewritten to be later:
    /// - `decision := max(decision, market)` when both are present
    /// - `write := max(write, decision or market)` when present
    pub fn repair_timestamps(&mut self) {
        if let (Some(market), Some(decision)) =
            (self.market_timestamp_utc, self.decision_timestamp_utc)
        {
            if decision < market {
                self.decision_timestamp_utc = Some(market);
            }
        }

        let floor = self.decision_timestamp_utc.or(self.market_timestamp_utc);
        if let (Some(floor), Some(write)) = (floor, self.journal_write_timestamp_utc) {
            if write < floor {
                self.journal_write_timestamp_utc = Some(floor);
            }
        }
    }
}

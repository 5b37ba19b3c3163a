//! Application wiring: gate evaluation, quality flags, journaling.

use crate::config::AppConfig;
use crate::error::AppResult;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;
use tapeguard_core::{DepthSnapshot, OrderBookState, TAPE_NEVER_RECEIVED_MS};
use tapeguard_gate::{
    build_flags, has_critical_issues, interpret_flag, FlagSeverity, TapeFreshnessGate,
};
use tapeguard_journal::{
    spawn_journal_writer, DecisionInputs, DecisionOutcome, JournalWriterHandle,
    ShadowTradeJournalEntry,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What happened to a signal after data quality gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalDisposition {
    /// The signal passed gating and would be acted on.
    Taken,
    /// The signal was suppressed, with the flag that caused it.
    Suppressed { reason: String },
}

/// The running application.
pub struct Application {
    config: AppConfig,
    gate: TapeFreshnessGate,
    journal: JournalWriterHandle,
    journal_join: Option<JoinHandle<()>>,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let gate = TapeFreshnessGate::new(config.gate.clone());
        let (journal, journal_join) =
            spawn_journal_writer(&config.journal, config.mode.journaling_enabled())?;
        info!(mode = ?config.mode, "Application created");
        Ok(Self {
            config,
            gate,
            journal,
            journal_join: Some(journal_join),
        })
    }

    pub fn journal(&self) -> &JournalWriterHandle {
        &self.journal
    }

    /// Evaluate a signal against current market data quality and journal
    /// the outcome (taken or suppressed) either way.
    ///
    /// `now_ms` is the caller's clock; no hidden wall-clock reads feed
    /// the gating itself.
    pub fn process_signal(
        &self,
        symbol: &str,
        score: f64,
        book: Option<&OrderBookState>,
        depth: &DepthSnapshot,
        is_subscribed: bool,
        now_ms: i64,
    ) -> SignalDisposition {
        let decision_ts = ms_to_utc(now_ms);

        let Some(book) = book else {
            // Without a book snapshot the quality of the data cannot be
            // assessed at all; suppress conservatively.
            let reason = "MissingBookContext".to_string();
            self.journal_decision(
                symbol,
                score,
                vec![reason.clone()],
                Some(reason.clone()),
                None,
                decision_ts,
            );
            return SignalDisposition::Suppressed { reason };
        };

        let status = self.gate.evaluate(book, now_ms, is_subscribed);
        let flags = build_flags(book, depth, &status);

        let disposition = if has_critical_issues(&flags) {
            let reason = flags
                .iter()
                .find(|f| interpret_flag(f).severity == FlagSeverity::Critical)
                .cloned()
                .unwrap_or_default();
            SignalDisposition::Suppressed { reason }
        } else {
            SignalDisposition::Taken
        };

        let market_ts = match book.last_tape_receipt_ms() {
            TAPE_NEVER_RECEIVED_MS => None,
            ms => ms_to_utc(ms),
        };
        let rejection_reason = match &disposition {
            SignalDisposition::Taken => None,
            SignalDisposition::Suppressed { reason } => Some(reason.clone()),
        };
        self.journal_decision(symbol, score, flags, rejection_reason, market_ts, decision_ts);

        disposition
    }

    fn journal_decision(
        &self,
        symbol: &str,
        score: f64,
        flags: Vec<String>,
        rejection_reason: Option<String>,
        market_ts: Option<DateTime<Utc>>,
        decision_ts: Option<DateTime<Utc>>,
    ) {
        let outcome = if rejection_reason.is_some() {
            DecisionOutcome::Suppressed
        } else {
            DecisionOutcome::Taken
        };
        let entry = ShadowTradeJournalEntry::decision(
            symbol,
            outcome,
            DecisionInputs {
                score,
                data_quality_flags: flags,
            },
            rejection_reason,
            market_ts,
            decision_ts,
        );
        if !self.journal.enqueue(entry) {
            debug!(symbol, "Journal not active, decision not recorded");
        }
    }

    /// Journal a liveness heartbeat so replay can tell "no decision was
    /// made" from "journal dead".
    pub fn heartbeat(&self) {
        let entry = ShadowTradeJournalEntry::heartbeat(Some(Utc::now()));
        if !self.journal.enqueue(entry) {
            debug!("Journal not active, heartbeat not recorded");
        }
    }

    /// Run until ctrl-c, journaling heartbeats, then drain and stop.
    pub async fn run(&mut self) -> AppResult<()> {
        let mut ticker =
            tokio::time::interval(Duration::from_millis(self.config.heartbeat_interval_ms));
        // The first tick fires immediately; skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.heartbeat(),
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown requested");
                    break;
                }
            }
        }

        self.shutdown().await
    }

    /// Stop the journal, draining everything already enqueued.
    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.journal.shutdown();
        if let Some(join) = self.journal_join.take() {
            if let Err(e) = join.await {
                warn!(error = %e, "Journal writer task panicked");
            }
        }
        info!("Application stopped");
        Ok(())
    }
}

fn ms_to_utc(ms: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(ms).single()
}

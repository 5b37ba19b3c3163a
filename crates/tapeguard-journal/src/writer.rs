//! Single-consumer journal writer.
//!
//! Producers on the decision path enqueue entries without ever blocking;
//! one background task owns the file handle, stamps session/schema/write
//! fields, repairs timestamp monotonicity, and appends each entry as a
//! JSON line with an immediate flush.
//!
//! The channel is unbounded by design: decision volume is bounded by the
//! trading signal rate, not the market data tick rate, and keeping the
//! producer side non-blocking is the primary guarantee.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::entry::{ShadowTradeJournalEntry, SCHEMA_VERSION};
use crate::error::{JournalError, JournalResult};

/// Minimum interval between logged write failures, to avoid log storms
/// when the disk is unhappy.
const ERROR_LOG_WINDOW: Duration = Duration::from_secs(60);

/// Journal writer configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalConfig {
    /// Path of the journal file.
    #[serde(default = "default_file_path")]
    pub file_path: PathBuf,
}

fn default_file_path() -> PathBuf {
    PathBuf::from("logs/shadow_trades.jsonl")
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            file_path: default_file_path(),
        }
    }
}

/// Writer lifecycle state.
///
/// `Stopped -> Starting -> Active -> Draining -> Stopped`. A writer
/// spawned outside shadow mode stays `Stopped` for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WriterState {
    Stopped = 0,
    Starting = 1,
    Active = 2,
    Draining = 3,
}

impl WriterState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Starting,
            2 => Self::Active,
            3 => Self::Draining,
            _ => Self::Stopped,
        }
    }

    fn accepts_entries(self) -> bool {
        matches!(self, Self::Starting | Self::Active)
    }
}

enum JournalMsg {
    Entry(Box<ShadowTradeJournalEntry>),
    /// Close and re-open the journal path, after an external rotation
    /// moved the current file aside.
    Reopen,
    Shutdown,
}

/// Producer-side handle to the journal writer.
///
/// Cheap to clone; all methods are non-blocking and safe from any
/// concurrent context.
#[derive(Clone)]
pub struct JournalWriterHandle {
    tx: mpsc::UnboundedSender<JournalMsg>,
    state: Arc<AtomicU8>,
    session_id: Uuid,
}

impl JournalWriterHandle {
    /// Enqueue an entry for writing.
    ///
    /// Returns `false` immediately when the writer is not accepting
    /// entries (disabled mode, or shutdown already signalled). Entries
    /// without a session id are stamped with the current run's id.
    pub fn enqueue(&self, mut entry: ShadowTradeJournalEntry) -> bool {
        if !self.state().accepts_entries() {
            return false;
        }
        if entry.session_id.is_none() {
            entry.session_id = Some(self.session_id);
        }
        self.tx.send(JournalMsg::Entry(Box::new(entry))).is_ok()
    }

    /// Ask the writer to re-open its file path.
    ///
    /// Called after an external rotation service moved the current file
    /// to a date-suffixed name; the writer continues on a fresh file at
    /// the configured path.
    pub fn reopen(&self) -> bool {
        if !self.state().accepts_entries() {
            return false;
        }
        self.tx.send(JournalMsg::Reopen).is_ok()
    }

    /// Signal shutdown.
    ///
    /// New enqueues are rejected from this point on; everything already
    /// queued is drained, flushed, and the file handle released. Await
    /// the `JoinHandle` returned by `spawn_journal_writer` to observe
    /// drain completion.
    pub fn shutdown(&self) {
        if self.state().accepts_entries() {
            self.state
                .store(WriterState::Draining as u8, Ordering::SeqCst);
            let _ = self.tx.send(JournalMsg::Shutdown);
        }
    }

    pub fn state(&self) -> WriterState {
        WriterState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Session id stamped onto entries that carry none.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Journal writer actor: sole owner of the file handle and sole mutator
/// of per-entry versioning and timestamp fields.
struct JournalWriterTask {
    rx: mpsc::UnboundedReceiver<JournalMsg>,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    state: Arc<AtomicU8>,
    entries_written: u64,
    last_error_log: Option<Instant>,
}

impl JournalWriterTask {
    async fn run(mut self) {
        debug!(path = %self.path.display(), "JournalWriterTask started");

        if let Err(e) = self.ensure_open() {
            // Not fatal here: the next write retries the open.
            warn!(error = %e, "Failed to open journal file at startup");
        }
        self.state.store(WriterState::Active as u8, Ordering::SeqCst);

        while let Some(msg) = self.rx.recv().await {
            match msg {
                JournalMsg::Entry(entry) => self.write_entry(*entry),
                JournalMsg::Reopen => self.reopen(),
                JournalMsg::Shutdown => {
                    // Producers that passed the state check just before
                    // Draining was published may still have sends in
                    // flight behind this marker; drain them too.
                    while let Ok(msg) = self.rx.try_recv() {
                        if let JournalMsg::Entry(entry) = msg {
                            self.write_entry(*entry);
                        }
                    }
                    break;
                }
            }
        }

        self.close();
        self.state.store(WriterState::Stopped as u8, Ordering::SeqCst);
        debug!(
            entries = self.entries_written,
            "JournalWriterTask terminated"
        );
    }

    /// Stamp, repair, serialize, append, flush. A failure skips this
    /// entry only; the loop continues with the next one.
    fn write_entry(&mut self, mut entry: ShadowTradeJournalEntry) {
        if entry.schema_version.is_none() {
            entry.schema_version = Some(SCHEMA_VERSION);
        }
        entry.journal_write_timestamp_utc = Some(Utc::now());
        entry.repair_timestamps();

        match self.append_line(&entry) {
            Ok(()) => self.entries_written += 1,
            Err(e) => self.on_write_error(e),
        }
    }

    fn append_line(&mut self, entry: &ShadowTradeJournalEntry) -> JournalResult<()> {
        let line = serde_json::to_string(entry)?;
        self.ensure_open()?;
        if let Some(writer) = self.writer.as_mut() {
            writeln!(writer, "{line}")?;
            writer.flush()?;
        }
        Ok(())
    }

    fn ensure_open(&mut self) -> JournalResult<()> {
        if self.writer.is_none() {
            self.writer = Some(Self::open(&self.path)?);
            info!(path = %self.path.display(), "Opened journal file (append mode)");
        }
        Ok(())
    }

    fn open(path: &Path) -> JournalResult<BufWriter<File>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(BufWriter::new(file))
    }

    fn reopen(&mut self) {
        self.close();
        if let Err(e) = self.ensure_open() {
            warn!(error = %e, "Failed to re-open journal file after rotation");
        }
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!(error = %e, "Failed to flush journal on close");
            }
        }
    }

    fn on_write_error(&mut self, err: JournalError) {
        // Drop the handle so the next entry re-opens the file.
        self.writer = None;

        let should_log = self
            .last_error_log
            .map(|t| t.elapsed() >= ERROR_LOG_WINDOW)
            .unwrap_or(true);
        if should_log {
            warn!(error = %err, "Journal write failed; entry skipped");
            self.last_error_log = Some(Instant::now());
        }
    }
}

/// Spawn the journal writer.
///
/// Outside shadow mode the returned handle is permanently inert: state
/// stays `Stopped`, every `enqueue` returns `false`, and no file is
/// touched. In shadow mode the only fatal error is failing to create the
/// journal's containing directory, surfaced here at startup rather than
/// from the write path.
pub fn spawn_journal_writer(
    config: &JournalConfig,
    shadow_mode: bool,
) -> JournalResult<(JournalWriterHandle, JoinHandle<()>)> {
    let (tx, rx) = mpsc::unbounded_channel();
    let state = Arc::new(AtomicU8::new(WriterState::Stopped as u8));
    let handle = JournalWriterHandle {
        tx,
        state: state.clone(),
        session_id: Uuid::new_v4(),
    };

    if !shadow_mode {
        info!("Journaling inactive outside shadow mode");
        drop(rx);
        return Ok((handle, tokio::spawn(async {})));
    }

    if let Some(dir) = config.file_path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }

    state.store(WriterState::Starting as u8, Ordering::SeqCst);
    info!(
        path = %config.file_path.display(),
        session_id = %handle.session_id,
        "Journal writer starting"
    );

    let task = JournalWriterTask {
        rx,
        path: config.file_path.clone(),
        writer: None,
        state,
        entries_written: 0,
        last_error_log: None,
    };
    let join = tokio::spawn(task.run());

    Ok((handle, join))
}

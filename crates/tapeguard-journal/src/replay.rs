//! Sequential journal replay for backtesting and audit.
//!
//! Reads the JSON Lines journal back as a lazy, finite, forward-only
//! sequence. A parse failure on one line skips that line only; the rest
//! of the file stays readable.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::entry::ShadowTradeJournalEntry;
use crate::error::JournalResult;

/// Forward-only iterator over journal entries in a time range.
///
/// The range is half-open `[from, to)` on the journal write timestamp
/// (decision timestamp when the write timestamp is absent); either bound
/// may be omitted. Entries with no usable timestamp pass a fully open
/// range and are skipped otherwise.
pub struct JournalReplay {
    lines: Lines<BufReader<File>>,
    from_utc: Option<DateTime<Utc>>,
    to_utc: Option<DateTime<Utc>>,
    skipped_lines: u64,
}

impl JournalReplay {
    /// Open a journal file for replay.
    pub fn open(
        path: impl AsRef<Path>,
        from_utc: Option<DateTime<Utc>>,
        to_utc: Option<DateTime<Utc>>,
    ) -> JournalResult<Self> {
        let file = File::open(path)?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
            from_utc,
            to_utc,
            skipped_lines: 0,
        })
    }

    /// Lines skipped so far because they were unreadable or unparseable.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped_lines
    }

    fn entry_time(entry: &ShadowTradeJournalEntry) -> Option<DateTime<Utc>> {
        entry
            .journal_write_timestamp_utc
            .or(entry.decision_timestamp_utc)
    }

    fn in_range(&self, entry: &ShadowTradeJournalEntry) -> bool {
        let Some(t) = Self::entry_time(entry) else {
            return self.from_utc.is_none() && self.to_utc.is_none();
        };
        if let Some(from) = self.from_utc {
            if t < from {
                return false;
            }
        }
        if let Some(to) = self.to_utc {
            if t >= to {
                return false;
            }
        }
        true
    }
}

impl Iterator for JournalReplay {
    type Item = ShadowTradeJournalEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.skipped_lines += 1;
                    debug!(error = %e, "Unreadable journal line skipped");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let entry: ShadowTradeJournalEntry = match serde_json::from_str(&line) {
                Ok(entry) => entry,
                Err(e) => {
                    self.skipped_lines += 1;
                    debug!(error = %e, "Malformed journal line skipped");
                    continue;
                }
            };

            if self.in_range(&entry) {
                return Some(entry);
            }
        }
    }
}

//! Durable decision journal for tapeguard.
//!
//! Records every trading decision (taken or suppressed) as one JSON line
//! in an append-only file:
//! - each line is a complete, self-describing record
//! - partial file corruption only affects individual lines
//! - the file can be read even if a write was interrupted
//!
//! Producers enqueue entries without blocking; a single background task
//! serializes, repairs timestamps, and flushes. `replay` reads the same
//! file back chronologically for backtesting and audit.

pub mod entry;
pub mod error;
pub mod replay;
pub mod writer;

pub use entry::{
    DecisionInputs, DecisionOutcome, EntryType, ShadowTradeJournalEntry, SCHEMA_VERSION,
};
pub use error::{JournalError, JournalResult};
pub use replay::JournalReplay;
pub use writer::{spawn_journal_writer, JournalConfig, JournalWriterHandle, WriterState};

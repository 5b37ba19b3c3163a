//! Shadow-mode decision gating and journaling application.
//!
//! Wires the pure readiness checks to the durable journal: every signal
//! is evaluated against current market data quality, suppressed when a
//! critical flag is present, and journaled either way for later replay.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;

pub use app::{Application, SignalDisposition};
pub use config::{AppConfig, OperatingMode};
pub use error::{AppError, AppResult};
pub use logging::init_logging;

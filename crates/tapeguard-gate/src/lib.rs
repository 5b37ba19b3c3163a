//! Market data readiness checks for tapeguard.
//!
//! Two pure, stateless subsystems:
//! - the tape freshness gate, which classifies the live tape state into a
//!   readiness status per symbol
//! - the data quality flag engine, which turns book/tape/depth state into
//!   severity-tagged flags consumed by throttling and journaling
//!
//! Both are side-effect-free functions of a state snapshot plus an
//! explicit clock, safe to call from any concurrent context.

pub mod freshness;
pub mod quality;

pub use freshness::{TapeFreshnessGate, TapeGateConfig, TapeStatus};
pub use quality::{
    build_flags, has_critical_issues, interpret_flag, FlagInterpretation, FlagSeverity,
    STALE_DEPTH_THRESHOLD_MS,
};

//! Core market data types for the tapeguard decision gate.
//!
//! This crate provides the domain types shared across the system:
//! - `Price`, `Size`: precision-safe numeric types
//! - `Trade`, `OrderBookState`: top-of-book plus recent tape state
//! - `DepthSnapshot`: per-evaluation view of captured depth levels

pub mod book;
pub mod decimal;
pub mod depth;

pub use book::{BookValidity, OrderBookState, PriceLevel, Trade, TAPE_NEVER_RECEIVED_MS};
pub use decimal::{Price, Size};
pub use depth::DepthSnapshot;

//! Depth snapshot captured for a single evaluation.

use crate::PriceLevel;

/// Transient view of the captured depth levels, built per evaluation.
#[derive(Debug, Clone, Default)]
pub struct DepthSnapshot {
    /// Best-first bid levels as captured.
    pub bids_top_n: Vec<PriceLevel>,
    /// Best-first ask levels as captured.
    pub asks_top_n: Vec<PriceLevel>,
    /// Levels per side the depth subscription is expected to deliver.
    pub expected_depth_levels: usize,
    /// Age of the most recent depth update, when known.
    pub last_depth_update_age_ms: Option<i64>,
}

impl DepthSnapshot {
    pub fn bid_levels(&self) -> usize {
        self.bids_top_n.len()
    }

    pub fn ask_levels(&self) -> usize {
        self.asks_top_n.len()
    }

    /// True when either side is short of the expected level count.
    pub fn is_partial(&self) -> bool {
        self.bid_levels() < self.expected_depth_levels
            || self.ask_levels() < self.expected_depth_levels
    }
}

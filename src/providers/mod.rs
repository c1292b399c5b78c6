//! Price history providers. Each adapter maps its wire format to the single
//! [`crate::core::PriceHistory`] shape; nothing provider-specific leaves
//! this module.

pub mod stooq;
pub mod yahoo;

use crate::core::price::PriceHistory;

/// Keeps the trailing `lookback_days` trading days of a sorted history.
pub(crate) fn truncate_lookback(mut history: PriceHistory, lookback_days: u32) -> PriceHistory {
    let keep = lookback_days as usize;
    if history.len() > keep {
        history.drain(..history.len() - keep);
    }
    history
}

//! Edge classification: model probability vs market-implied probability.

use serde::{Deserialize, Serialize};

use crate::domain::Tier;

/// Edge percentage and its tier for one proposition
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EdgeSignal {
    /// Signed percentage; negative when the market prices the proposition
    /// richer than the model does
    pub edge_pct: f64,
    pub tier: Tier,
}

/// Percentage difference between model and market probability.
///
/// `(true_p - implied_p) / implied_p * 100`. The implied probability comes
/// from `odds::odds_to_probability` and is always positive.
pub fn edge_percentage(true_probability: f64, implied_probability: f64) -> f64 {
    (true_probability - implied_probability) / implied_probability * 100.0
}

/// Compute the edge and bucket it into a tier
pub fn classify(true_probability: f64, implied_probability: f64) -> EdgeSignal {
    let edge_pct = edge_percentage(true_probability, implied_probability);
    EdgeSignal {
        edge_pct,
        tier: Tier::classify(edge_pct),
    }
}

//! Probability models for proposition outcomes.
//!
//! Two variants: `simple` (v1) blends QB and defense rates linearly;
//! `advanced` (v2) normalizes against league averages and maps a composite
//! score through a sigmoid, with contextual multipliers and a confidence
//! score. Both are pure functions of `(MatchupContext, LeagueAverages)`,
//! so a batch of matchups can be evaluated in parallel with no shared
//! state.

pub mod advanced;
pub mod simple;

use serde::{Deserialize, Serialize};

use crate::domain::{Confidence, LeagueAverages, MatchupContext, ModelVersion};
use crate::error::Result;

/// Lower bound for any calibrated probability estimate
pub const PROB_FLOOR: f64 = 0.05;
/// Upper bound for any calibrated probability estimate
pub const PROB_CEIL: f64 = 0.95;

/// Output of a probability model run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEstimate {
    /// Calibrated probability, always within [0.05, 0.95]
    pub probability: f64,
    /// Numeric confidence score in [0, 1]; v1 produces none
    pub confidence: Option<f64>,
    /// Label derived from the score
    pub confidence_label: Option<Confidence>,
}

/// Clamp an estimate into the calibrated probability bounds
pub(crate) fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROB_FLOOR, PROB_CEIL)
}

/// Run the selected model variant over one matchup
pub fn estimate(
    version: ModelVersion,
    context: &MatchupContext,
    league: &LeagueAverages,
) -> Result<ModelEstimate> {
    match version {
        ModelVersion::V1 => simple::estimate(context),
        ModelVersion::V2 => advanced::estimate(context, league),
    }
}

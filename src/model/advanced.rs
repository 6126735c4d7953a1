//! v2 probability model: league-normalized composite through a sigmoid.
//!
//! The sigmoid compresses extreme composite scores toward the probability
//! bounds instead of relying on a hard clamp, which keeps the output
//! smoother near the edges. The explicit clamp stays as a safety bound:
//! the contextual multipliers can still push a saturated estimate past
//! 0.95.

use super::{clamp_probability, ModelEstimate};
use crate::domain::{Confidence, LeagueAverages, MatchupContext};
use crate::error::{GridEdgeError, Result};

const QB_WEIGHT: f64 = 0.6;
const DEFENSE_WEIGHT: f64 = 0.4;

/// Sigmoid is centered where the composite matches league average
const SIGMOID_CENTER: f64 = 1.0;
const SIGMOID_SLOPE: f64 = 2.0;

const HOME_MULTIPLIER: f64 = 1.10;
const DIVISION_MULTIPLIER: f64 = 0.95;
const PRIMETIME_MULTIPLIER: f64 = 1.05;

/// Estimate the proposition probability against league baselines.
pub fn estimate(context: &MatchupContext, league: &LeagueAverages) -> Result<ModelEstimate> {
    let qb_rate = context.qb_td_rate()?;

    if league.td_rate <= 0.0 {
        return Err(GridEdgeError::InsufficientData(format!(
            "league average TD rate must be positive, got {}",
            league.td_rate
        )));
    }

    let qb_vs_league = qb_rate / league.td_rate;
    let def_vs_league = context.defense_tds_allowed_per_game / league.td_rate;
    let composite = qb_vs_league * QB_WEIGHT + def_vs_league * DEFENSE_WEIGHT;

    let mut probability = sigmoid(SIGMOID_SLOPE * (composite - SIGMOID_CENTER));

    if context.is_home {
        probability *= HOME_MULTIPLIER;
    }
    if context.is_division_game {
        probability *= DIVISION_MULTIPLIER;
    }
    if context.is_primetime {
        probability *= PRIMETIME_MULTIPLIER;
    }

    let confidence = estimate_confidence(context, qb_rate);

    Ok(ModelEstimate {
        probability: clamp_probability(probability),
        confidence: Some(confidence),
        confidence_label: Some(Confidence::from_score(confidence)),
    })
}

/// Sigmoid function: 1 / (1 + exp(-x))
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Confidence score from sample size and rate variance.
///
/// Uncertainty accumulates when:
/// - the QB has few games played (small sample)
/// - the per-game rate has a wide sampling error (volatile rate)
///
/// Advanced splits, when supplied, shave a little uncertainty since the
/// estimate rests on more of the QB's profile. Capped at 0.5 — beyond
/// that the model is a coin flip.
fn estimate_confidence(context: &MatchupContext, qb_rate: f64) -> f64 {
    let mut uncertainty: f64 = 0.0;

    // 1. Sample-size uncertainty
    let games = context.qb_games_played;
    uncertainty += if games < 4 {
        0.35
    } else if games < 8 {
        0.20
    } else if games < 12 {
        0.10
    } else {
        0.05
    };

    // 2. Sampling error of the per-game rate (Poisson counts)
    let rate_se = (qb_rate / f64::from(games.max(1))).sqrt();
    uncertainty += if rate_se > 0.45 {
        0.25
    } else if rate_se > 0.30 {
        0.15
    } else if rate_se > 0.15 {
        0.05
    } else {
        0.0
    };

    // 3. Extra splits tighten the estimate
    if context.red_zone_accuracy.is_some() {
        uncertainty -= 0.05;
    }
    if context.first_half_td_rate.is_some() {
        uncertainty -= 0.05;
    }

    1.0 - uncertainty.clamp(0.0, 0.5)
}

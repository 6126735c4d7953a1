//! Batch orchestration: model → odds → classifier → sizer per matchup.
//!
//! Matchups are independent pure computations; one bad matchup never
//! blocks the rest. Failures are collected next to the successes so the
//! caller can report them.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{LeagueAverages, MatchupContext, ModelVersion, Prediction};
use crate::error::GridEdgeError;
use crate::{edge, model, odds, sizing};

/// One matchup to evaluate: context plus the book's current odds
#[derive(Debug, Clone)]
pub struct MatchupInput {
    /// Proposition key, e.g. "mahomes-passing-td"
    pub subject: String,
    pub context: MatchupContext,
    /// American odds
    pub odds: i32,
}

/// Batch parameters, passed by value per call
#[derive(Debug, Clone)]
pub struct WeekParams {
    pub season: i32,
    pub week: i32,
    pub model_version: ModelVersion,
    /// League baselines, sourced once per batch
    pub league: LeagueAverages,
    pub bankroll: Decimal,
}

/// A matchup the engine had to skip, with the reason
#[derive(Debug)]
pub struct SkippedMatchup {
    pub subject: String,
    pub error: GridEdgeError,
}

/// Result of evaluating a week's slate
#[derive(Debug)]
pub struct WeekEvaluation {
    /// Successful predictions, sorted descending by edge percentage
    pub predictions: Vec<Prediction>,
    /// Matchups skipped with their per-matchup errors
    pub skipped: Vec<SkippedMatchup>,
}

pub struct EdgeEngine;

impl EdgeEngine {
    /// Evaluate a week's slate of matchups.
    ///
    /// Per-matchup failures (`InsufficientData`, `InvalidOdds`) are
    /// reported in `skipped` without aborting the batch.
    pub fn evaluate_week(inputs: &[MatchupInput], params: &WeekParams) -> WeekEvaluation {
        let mut predictions = Vec::with_capacity(inputs.len());
        let mut skipped = Vec::new();

        for input in inputs {
            match Self::evaluate_matchup(input, params) {
                Ok(prediction) => predictions.push(prediction),
                Err(error) => {
                    warn!(
                        subject = %input.subject,
                        week = params.week,
                        %error,
                        "skipping matchup"
                    );
                    skipped.push(SkippedMatchup {
                        subject: input.subject.clone(),
                        error,
                    });
                }
            }
        }

        // Barrier after the independent per-matchup computations
        predictions.sort_by(|a, b| {
            b.edge_pct
                .partial_cmp(&a.edge_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            week = params.week,
            season = params.season,
            evaluated = predictions.len(),
            skipped = skipped.len(),
            "week slate evaluated"
        );

        WeekEvaluation {
            predictions,
            skipped,
        }
    }

    fn evaluate_matchup(
        input: &MatchupInput,
        params: &WeekParams,
    ) -> crate::error::Result<Prediction> {
        let estimate = model::estimate(params.model_version, &input.context, &params.league)?;
        let implied_probability = odds::odds_to_probability(input.odds)?;
        let signal = edge::classify(estimate.probability, implied_probability);
        let sized = sizing::size_stake(
            estimate.probability,
            implied_probability,
            signal.tier,
            params.bankroll,
        );

        Ok(Prediction {
            id: Uuid::new_v4(),
            season: params.season,
            week: params.week,
            subject: input.subject.clone(),
            predicted_probability: estimate.probability,
            odds: input.odds,
            implied_probability,
            edge_pct: signal.edge_pct,
            tier: signal.tier,
            kelly_fraction: sized.stake_fraction,
            recommended_stake: sized.stake,
            model_version: params.model_version,
            confidence: estimate.confidence,
            created_at: Utc::now(),
        })
    }
}

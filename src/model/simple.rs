//! v1 probability model: linear blend of QB and defense scoring rates.

use super::{clamp_probability, ModelEstimate};
use crate::domain::MatchupContext;
use crate::error::Result;

/// Weight on the QB's own touchdown rate
const QB_WEIGHT: f64 = 0.6;
/// Weight on the opposing defense's TDs allowed per game
const DEFENSE_WEIGHT: f64 = 0.4;
/// Home-field boost on the blended rate
const HOME_MULTIPLIER: f64 = 1.10;
/// Fixed conversion from expected-TD rate to proposition probability
const RATE_TO_PROBABILITY: f64 = 0.6;

/// Estimate the proposition probability from raw rates.
///
/// `base = 0.6 * qb_rate + 0.4 * defense_rate`, home field multiplies the
/// base by 1.10, and the result converts to a probability through the
/// fixed 0.6 factor before clamping to [0.05, 0.95].
pub fn estimate(context: &MatchupContext) -> Result<ModelEstimate> {
    let qb_rate = context.qb_td_rate()?;
    let defense_rate = context.defense_tds_allowed_per_game;

    let base = qb_rate * QB_WEIGHT + defense_rate * DEFENSE_WEIGHT;
    let home_multiplier = if context.is_home { HOME_MULTIPLIER } else { 1.0 };
    let adjusted = base * home_multiplier;

    Ok(ModelEstimate {
        probability: clamp_probability(adjusted * RATE_TO_PROBABILITY),
        confidence: None,
        confidence_label: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> MatchupContext {
        MatchupContext {
            qb_total_tds: 18,
            qb_games_played: 10,
            defense_tds_allowed_per_game: 2.1,
            is_home: true,
            is_division_game: false,
            is_primetime: false,
            red_zone_accuracy: None,
            first_half_td_rate: None,
        }
    }

    #[test]
    fn test_strong_matchup_clamps_at_ceiling() {
        // rate 1.8, base = 1.8*0.6 + 2.1*0.4 = 1.92, home -> 2.112,
        // 2.112*0.6 = 1.2672 clamps to 0.95
        let est = estimate(&context()).unwrap();
        assert!((est.probability - 0.95).abs() < 1e-12, "p={}", est.probability);
    }

    #[test]
    fn test_away_game_drops_home_boost() {
        let home = estimate(&context()).unwrap().probability;
        let away = estimate(&MatchupContext {
            is_home: false,
            qb_total_tds: 7,
            qb_games_played: 10,
            defense_tds_allowed_per_game: 1.0,
            ..context()
        })
        .unwrap()
        .probability;
        // 0.7*0.6 + 1.0*0.4 = 0.82, *0.6 = 0.492 (unclamped)
        assert!((away - 0.492).abs() < 1e-12, "p={}", away);
        assert!(home > away);
    }

    #[test]
    fn test_weak_matchup_clamps_at_floor() {
        let est = estimate(&MatchupContext {
            qb_total_tds: 0,
            qb_games_played: 10,
            defense_tds_allowed_per_game: 0.1,
            is_home: false,
            ..context()
        })
        .unwrap();
        // base = 0.04, *0.6 = 0.024 clamps to 0.05
        assert!((est.probability - 0.05).abs() < 1e-12, "p={}", est.probability);
    }

    #[test]
    fn test_zero_games_fails() {
        let result = estimate(&MatchupContext {
            qb_games_played: 0,
            ..context()
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_no_confidence_score() {
        assert!(estimate(&context()).unwrap().confidence.is_none());
    }
}

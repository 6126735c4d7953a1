use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::matchup::ModelVersion;
use crate::error::GridEdgeError;

/// Edge tier derived from the edge percentage.
///
/// Boundaries are half-open, lower bound inclusive: exactly 5.0% is
/// `Small`, not `Pass`. Negative edge is always `Pass`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Pass,
    Small,
    Good,
    Strong,
}

/// Edge percentage below which a proposition is a pass
pub const SMALL_EDGE_MIN_PCT: f64 = 5.0;
pub const GOOD_EDGE_MIN_PCT: f64 = 10.0;
pub const STRONG_EDGE_MIN_PCT: f64 = 20.0;

impl Tier {
    /// Bucket an edge percentage into a tier
    pub fn classify(edge_pct: f64) -> Self {
        if edge_pct < SMALL_EDGE_MIN_PCT {
            Tier::Pass
        } else if edge_pct < GOOD_EDGE_MIN_PCT {
            Tier::Small
        } else if edge_pct < STRONG_EDGE_MIN_PCT {
            Tier::Good
        } else {
            Tier::Strong
        }
    }

    /// Fraction of full Kelly this tier bets
    pub fn kelly_multiplier(&self) -> f64 {
        match self {
            Tier::Pass => 0.0,
            Tier::Small => 0.15,
            Tier::Good | Tier::Strong => 0.25,
        }
    }

    /// A pass never produces a stake
    pub fn is_actionable(&self) -> bool {
        !matches!(self, Tier::Pass)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Pass => "pass",
            Tier::Small => "small",
            Tier::Good => "good",
            Tier::Strong => "strong",
        }
    }
}

impl TryFrom<&str> for Tier {
    type Error = GridEdgeError;

    fn try_from(s: &str) -> Result<Self, GridEdgeError> {
        match s {
            "pass" => Ok(Tier::Pass),
            "small" => Ok(Tier::Small),
            "good" => Ok(Tier::Good),
            "strong" => Ok(Tier::Strong),
            other => Err(GridEdgeError::Domain(format!("unknown tier: {other}"))),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted prediction for one proposition in one week.
///
/// Core fields are write-once; only an `Outcome` is ever attached later.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub id: Uuid,
    pub season: i32,
    pub week: i32,
    /// Proposition key, e.g. "mahomes-passing-td"
    pub subject: String,
    /// Model probability, clamped to [0.05, 0.95]
    pub predicted_probability: f64,
    /// American odds as quoted by the book
    pub odds: i32,
    pub implied_probability: f64,
    /// Signed percentage; negative when the market is ahead of the model
    pub edge_pct: f64,
    pub tier: Tier,
    /// Applied stake fraction of bankroll, post-discount and cap
    pub kelly_fraction: f64,
    pub recommended_stake: Decimal,
    pub model_version: ModelVersion,
    /// v2 confidence score in [0, 1]; v1 predictions carry none
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Realized result for a prediction, attached at most once
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub prediction_id: Uuid,
    pub actual_result: bool,
    pub recorded_at: DateTime<Utc>,
}

/// A prediction joined with its realized outcome
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedPrediction {
    pub prediction: Prediction,
    pub actual_result: bool,
    pub recorded_at: DateTime<Utc>,
}

impl ResolvedPrediction {
    /// Days between prediction creation and outcome resolution
    pub fn hold_days(&self) -> i64 {
        (self.recorded_at - self.prediction.created_at)
            .num_days()
            .max(0)
    }
}

/// Inclusive week range within one season
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub season: i32,
    pub start_week: i32,
    pub end_week: i32,
}

impl WeekWindow {
    /// Trailing window ending at `end_week`, spanning `weeks_back` weeks
    /// and never extending before week 1.
    pub fn trailing(season: i32, end_week: i32, weeks_back: i32) -> Self {
        Self {
            season,
            start_week: (end_week - weeks_back + 1).max(1),
            end_week,
        }
    }

    pub fn contains(&self, season: i32, week: i32) -> bool {
        season == self.season && week >= self.start_week && week <= self.end_week
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_lower_inclusive() {
        assert_eq!(Tier::classify(4.999), Tier::Pass);
        assert_eq!(Tier::classify(5.0), Tier::Small);
        assert_eq!(Tier::classify(9.999), Tier::Small);
        assert_eq!(Tier::classify(10.0), Tier::Good);
        assert_eq!(Tier::classify(19.999), Tier::Good);
        assert_eq!(Tier::classify(20.0), Tier::Strong);
        assert_eq!(Tier::classify(47.3), Tier::Strong);
    }

    #[test]
    fn test_negative_edge_is_pass() {
        assert_eq!(Tier::classify(-12.5), Tier::Pass);
        assert!(!Tier::classify(-0.01).is_actionable());
    }

    #[test]
    fn test_kelly_multipliers() {
        assert_eq!(Tier::Pass.kelly_multiplier(), 0.0);
        assert_eq!(Tier::Small.kelly_multiplier(), 0.15);
        assert_eq!(Tier::Good.kelly_multiplier(), 0.25);
        assert_eq!(Tier::Strong.kelly_multiplier(), 0.25);
    }

    #[test]
    fn test_tier_string_roundtrip() {
        for tier in [Tier::Pass, Tier::Small, Tier::Good, Tier::Strong] {
            assert_eq!(Tier::try_from(tier.as_str()).unwrap(), tier);
        }
        assert!(Tier::try_from("huge").is_err());
    }

    #[test]
    fn test_trailing_window_clamps_at_week_one() {
        let w = WeekWindow::trailing(2025, 3, 6);
        assert_eq!(w.start_week, 1);
        assert_eq!(w.end_week, 3);
        assert!(w.contains(2025, 2));
        assert!(!w.contains(2025, 4));
        assert!(!w.contains(2024, 2));
    }
}

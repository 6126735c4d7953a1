use serde::{Deserialize, Serialize};

use crate::error::{GridEdgeError, Result};

/// Which probability model variant produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVersion {
    V1,
    V2,
}

impl ModelVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVersion::V1 => "v1",
            ModelVersion::V2 => "v2",
        }
    }
}

impl TryFrom<&str> for ModelVersion {
    type Error = GridEdgeError;

    fn try_from(s: &str) -> Result<Self> {
        match s {
            "v1" => Ok(ModelVersion::V1),
            "v2" => Ok(ModelVersion::V2),
            other => Err(GridEdgeError::Domain(format!(
                "unknown model version: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for ModelVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence label derived from the v2 model's numeric score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Bucket a numeric confidence score into a label
    pub fn from_score(score: f64) -> Self {
        if score >= 0.75 {
            Confidence::High
        } else if score >= 0.6 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// League-wide baseline rates, sourced once per batch by the orchestrator
/// and passed explicitly into every model call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LeagueAverages {
    /// League-average passing touchdowns per game
    pub td_rate: f64,
}

impl Default for LeagueAverages {
    fn default() -> Self {
        Self { td_rate: 1.5 }
    }
}

/// Per-matchup statistics for one proposition, constructed per computation.
///
/// Not persisted; only the resulting `Prediction` is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchupContext {
    /// QB total passing touchdowns this season
    pub qb_total_tds: u32,
    /// Games the QB has played this season
    pub qb_games_played: u32,
    /// Opposing defense: passing TDs allowed per game
    pub defense_tds_allowed_per_game: f64,
    pub is_home: bool,
    pub is_division_game: bool,
    pub is_primetime: bool,
    /// Red-zone completion accuracy, when the scraper has the split
    #[serde(default)]
    pub red_zone_accuracy: Option<f64>,
    /// Share of the QB's TDs thrown in the first half
    #[serde(default)]
    pub first_half_td_rate: Option<f64>,
}

impl MatchupContext {
    /// Per-game touchdown rate for the QB.
    ///
    /// Zero games played means there is no rate to compute.
    pub fn qb_td_rate(&self) -> Result<f64> {
        if self.qb_games_played == 0 {
            return Err(GridEdgeError::InsufficientData(
                "QB has zero games played".to_string(),
            ));
        }
        Ok(f64::from(self.qb_total_tds) / f64::from(self.qb_games_played))
    }
}

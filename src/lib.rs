//! Edge detection and calibration engine for NFL player props.
//!
//! The pure path turns matchup statistics plus sportsbook odds into
//! tiered, Kelly-sized predictions (`model` → `odds` → `edge` → `sizing`,
//! orchestrated by `engine`). The feedback loop persists predictions and
//! realized outcomes (`tracker`, `store`) and recalibrates the decision
//! thresholds that gate alerts (`calibration`).
//!
//! Scraping, rendering, scheduling, and notification delivery are
//! external collaborators; this crate only consumes structured matchup
//! records and exposes ranked predictions and calibration reports.

pub mod calibration;
pub mod config;
pub mod domain;
pub mod edge;
pub mod engine;
pub mod error;
pub mod logging;
pub mod model;
pub mod odds;
pub mod sizing;
pub mod store;
pub mod tracker;

pub use calibration::{
    BacktestComparison, BetaPosterior, CalibrationReport, Calibrator, Ci90,
    RecommendedThresholds, ThresholdChange, ThresholdEstimate, ThresholdPerformance,
};
pub use config::{AppConfig, CalibrationConfig, EngineConfig, Thresholds};
pub use domain::{
    Confidence, LeagueAverages, MatchupContext, ModelVersion, Outcome, Prediction,
    ResolvedPrediction, Tier, WeekWindow,
};
pub use edge::EdgeSignal;
pub use engine::{EdgeEngine, MatchupInput, SkippedMatchup, WeekEvaluation, WeekParams};
pub use error::{GridEdgeError, Result};
pub use model::ModelEstimate;
pub use sizing::SizedStake;
pub use store::{CalibrationAuditEntry, MemoryStore, PostgresStore, PredictionStore};
pub use tracker::{AccuracyMetrics, OutcomeTracker};

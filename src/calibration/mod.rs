//! Feedback-loop calibration: accuracy metrics, Bayesian precision
//! intervals, and threshold recommendation.

pub mod beta;
pub mod calibrator;
pub mod metrics;

pub use beta::BetaPosterior;
pub use calibrator::{
    BacktestComparison, CalibrationReport, Calibrator, Ci90, RecommendedThresholds,
    ThresholdChange, ThresholdEstimate,
};
pub use metrics::{
    brier_score, calibration_error, is_actionable, threshold_performance, ThresholdPerformance,
};

//! Pure accuracy metrics over resolved predictions.

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::domain::{Prediction, ResolvedPrediction};

/// Number of probability buckets for calibration error
const CALIBRATION_BUCKETS: usize = 10;

/// Brier score: mean squared error between predicted probabilities and
/// realized binary outcomes. 0.0 = perfect, 0.25 = coin flips at 50/50.
pub fn brier_score(samples: &[(f64, bool)]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples
        .iter()
        .map(|(predicted, actual)| {
            let outcome = if *actual { 1.0 } else { 0.0 };
            (predicted - outcome).powi(2)
        })
        .sum();
    sum / samples.len() as f64
}

/// Calibration error: predictions bucketed into probability deciles, the
/// per-bucket |mean predicted − observed frequency| averaged with bucket
/// size as the weight.
pub fn calibration_error(samples: &[(f64, bool)]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    let mut bucket_pred_sum = [0.0f64; CALIBRATION_BUCKETS];
    let mut bucket_hits = [0usize; CALIBRATION_BUCKETS];
    let mut bucket_count = [0usize; CALIBRATION_BUCKETS];

    for (predicted, actual) in samples {
        let idx = ((predicted * CALIBRATION_BUCKETS as f64) as usize)
            .min(CALIBRATION_BUCKETS - 1);
        bucket_pred_sum[idx] += predicted;
        bucket_count[idx] += 1;
        if *actual {
            bucket_hits[idx] += 1;
        }
    }

    let total = samples.len() as f64;
    (0..CALIBRATION_BUCKETS)
        .filter(|&i| bucket_count[i] > 0)
        .map(|i| {
            let n = bucket_count[i] as f64;
            let mean_pred = bucket_pred_sum[i] / n;
            let actual_rate = bucket_hits[i] as f64 / n;
            (mean_pred - actual_rate).abs() * n / total
        })
        .sum()
}

/// Precision/recall of a threshold set over resolved predictions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdPerformance {
    /// Predictions the thresholds classify as actionable
    pub actionable: usize,
    /// Actionable predictions whose proposition hit
    pub hits: usize,
    pub precision: f64,
    pub recall: f64,
}

/// Whether a prediction clears the configured gates.
///
/// The edge gate applies to everything; the confidence gate only to
/// predictions that carry a confidence score (v2). v1 predictions pass it.
pub fn is_actionable(prediction: &Prediction, thresholds: &Thresholds) -> bool {
    if prediction.edge_pct < thresholds.edge_threshold {
        return false;
    }
    match prediction.confidence {
        Some(score) => score >= thresholds.confidence_threshold,
        None => true,
    }
}

/// Classify resolved predictions with the given thresholds and score the
/// classification against what actually happened.
pub fn threshold_performance(
    resolved: &[ResolvedPrediction],
    thresholds: &Thresholds,
) -> ThresholdPerformance {
    let mut actionable = 0usize;
    let mut hits = 0usize;
    let mut total_hits = 0usize;

    for r in resolved {
        if r.actual_result {
            total_hits += 1;
        }
        if is_actionable(&r.prediction, thresholds) {
            actionable += 1;
            if r.actual_result {
                hits += 1;
            }
        }
    }

    let precision = if actionable > 0 {
        hits as f64 / actionable as f64
    } else {
        0.0
    };
    let recall = if total_hits > 0 {
        hits as f64 / total_hits as f64
    } else {
        0.0
    };

    ThresholdPerformance {
        actionable,
        hits,
        precision,
        recall,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ModelVersion, Tier};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn resolved(edge_pct: f64, confidence: Option<f64>, hit: bool) -> ResolvedPrediction {
        ResolvedPrediction {
            prediction: Prediction {
                id: Uuid::new_v4(),
                season: 2025,
                week: 1,
                subject: format!("qb-{edge_pct}"),
                predicted_probability: 0.6,
                odds: -120,
                implied_probability: 0.545,
                edge_pct,
                tier: Tier::classify(edge_pct),
                kelly_fraction: 0.02,
                recommended_stake: Decimal::ZERO,
                model_version: ModelVersion::V1,
                confidence,
                created_at: Utc::now(),
            },
            actual_result: hit,
            recorded_at: Utc::now(),
        }
    }

    #[test]
    fn test_brier_perfect_and_worst() {
        assert_eq!(brier_score(&[]), 0.0);
        let perfect = brier_score(&[(1.0, true), (0.0, false)]);
        assert!(perfect.abs() < 1e-12);
        let worst = brier_score(&[(1.0, false), (0.0, true)]);
        assert!((worst - 1.0).abs() < 1e-12);
        let coin = brier_score(&[(0.5, true), (0.5, false)]);
        assert!((coin - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_calibration_error_well_calibrated() {
        // 70% bucket hitting 70% of the time
        let samples: Vec<(f64, bool)> = (0..10).map(|i| (0.72, i < 7)).collect();
        let err = calibration_error(&samples);
        assert!(err < 0.03, "err={}", err);
    }

    #[test]
    fn test_calibration_error_overconfident() {
        // 90% bucket hitting half the time
        let samples: Vec<(f64, bool)> = (0..10).map(|i| (0.92, i < 5)).collect();
        let err = calibration_error(&samples);
        assert!((err - 0.42).abs() < 1e-9, "err={}", err);
    }

    #[test]
    fn test_calibration_error_weights_by_bucket_size() {
        // A large well-calibrated bucket dilutes a small bad one
        let mut samples: Vec<(f64, bool)> = (0..90).map(|i| (0.55, i < 50)).collect();
        samples.extend((0..10).map(|i| (0.95, i < 5)));
        let err = calibration_error(&samples);
        assert!(err < 0.1, "err={}", err);
    }

    #[test]
    fn test_threshold_performance() {
        let resolved = vec![
            resolved(12.0, None, true),
            resolved(9.0, None, true),
            resolved(11.0, None, false),
            resolved(2.0, None, true),
        ];
        let thresholds = Thresholds {
            edge_threshold: 10.0,
            confidence_threshold: 0.5,
            min_hold_days: 0,
        };
        let perf = threshold_performance(&resolved, &thresholds);
        assert_eq!(perf.actionable, 2);
        assert_eq!(perf.hits, 1);
        assert!((perf.precision - 0.5).abs() < 1e-12);
        // 1 of 3 total hits captured
        assert!((perf.recall - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_gate_only_applies_when_scored() {
        let thresholds = Thresholds {
            edge_threshold: 5.0,
            confidence_threshold: 0.7,
            min_hold_days: 0,
        };
        let unscored = resolved(8.0, None, true);
        let low = resolved(8.0, Some(0.55), true);
        let high = resolved(8.0, Some(0.8), true);
        assert!(is_actionable(&unscored.prediction, &thresholds));
        assert!(!is_actionable(&low.prediction, &thresholds));
        assert!(is_actionable(&high.prediction, &thresholds));
    }

    #[test]
    fn test_empty_denominators() {
        let perf = threshold_performance(
            &[],
            &Thresholds::default(),
        );
        assert_eq!(perf.precision, 0.0);
        assert_eq!(perf.recall, 0.0);
    }
}

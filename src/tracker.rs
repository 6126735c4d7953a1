//! Outcome tracking: persist predictions, attach realized results, and
//! report rolling accuracy against the currently configured thresholds.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::calibration::metrics::{brier_score, calibration_error, threshold_performance};
use crate::config::Thresholds;
use crate::domain::{Outcome, Prediction, WeekWindow};
use crate::error::Result;
use crate::store::PredictionStore;

/// Rolling accuracy over a week window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub window: WeekWindow,
    /// Resolved predictions the metrics are computed over
    pub sample_count: usize,
    pub brier_score: f64,
    pub calibration_error: f64,
    /// Precision of the supplied thresholds over the window
    pub precision: f64,
    pub recall: f64,
}

pub struct OutcomeTracker<S: PredictionStore> {
    store: Arc<S>,
}

impl<S: PredictionStore> OutcomeTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist a new prediction, returning its id.
    ///
    /// Re-running edge detection for an already-computed week surfaces
    /// `DuplicatePrediction` instead of overwriting history.
    pub async fn record_prediction(&self, prediction: &Prediction) -> Result<Uuid> {
        let id = self.store.insert_prediction(prediction).await?;
        debug!(
            %id,
            subject = %prediction.subject,
            week = prediction.week,
            tier = %prediction.tier,
            "prediction recorded"
        );
        Ok(id)
    }

    /// Attach the realized result to a prediction, exactly once.
    pub async fn record_outcome(&self, prediction_id: Uuid, actual_result: bool) -> Result<()> {
        self.store
            .insert_outcome(&Outcome {
                prediction_id,
                actual_result,
                recorded_at: Utc::now(),
            })
            .await?;
        info!(%prediction_id, actual_result, "outcome recorded");
        Ok(())
    }

    /// Accuracy metrics over resolved predictions in the window, scored
    /// against the supplied (currently configured) thresholds.
    pub async fn compute_metrics(
        &self,
        window: &WeekWindow,
        thresholds: &Thresholds,
    ) -> Result<AccuracyMetrics> {
        let resolved = self.store.resolved_in_window(window).await?;

        let samples: Vec<(f64, bool)> = resolved
            .iter()
            .map(|r| (r.prediction.predicted_probability, r.actual_result))
            .collect();
        let performance = threshold_performance(&resolved, thresholds);

        Ok(AccuracyMetrics {
            window: *window,
            sample_count: resolved.len(),
            brier_score: brier_score(&samples),
            calibration_error: calibration_error(&samples),
            precision: performance.precision,
            recall: performance.recall,
        })
    }
}

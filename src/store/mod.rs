//! Storage boundary for predictions, outcomes, and decision thresholds.
//!
//! The engine's pure computation path never touches this layer; only the
//! tracker and calibrator do. Uniqueness (one prediction per subject-week,
//! at most one outcome per prediction) is enforced here, and
//! `apply_thresholds` is the single atomic write path for threshold
//! changes — thresholds and their audit entry commit together or not at
//! all.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Thresholds;
use crate::domain::{Outcome, Prediction, ResolvedPrediction, WeekWindow};
use crate::error::Result;

/// Audit record for one applied threshold change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationAuditEntry {
    pub id: i64,
    pub previous: Thresholds,
    pub next: Thresholds,
    /// Full calibration report at apply time, for later review
    pub report: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Durable storage for the feedback loop
#[async_trait]
pub trait PredictionStore: Send + Sync {
    /// Persist a new prediction.
    ///
    /// Fails with `DuplicatePrediction` when a prediction for the same
    /// (season, week, subject, model_version) already exists.
    async fn insert_prediction(&self, prediction: &Prediction) -> Result<Uuid>;

    async fn get_prediction(&self, id: Uuid) -> Result<Option<Prediction>>;

    /// Attach a realized outcome.
    ///
    /// Fails with `NotFound` when the prediction does not exist and
    /// `DuplicateOutcome` when one is already attached.
    async fn insert_outcome(&self, outcome: &Outcome) -> Result<()>;

    /// Predictions with resolved outcomes inside the window
    async fn resolved_in_window(&self, window: &WeekWindow) -> Result<Vec<ResolvedPrediction>>;

    /// The currently applied decision thresholds
    async fn current_thresholds(&self) -> Result<Thresholds>;

    /// Atomically replace the thresholds and append an audit entry.
    ///
    /// Returns the audit entry id. Concurrent appliers are serialized.
    async fn apply_thresholds(
        &self,
        next: &Thresholds,
        report: &serde_json::Value,
    ) -> Result<i64>;
}

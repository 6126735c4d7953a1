//! In-memory store for tests and DB-less callers.
//!
//! Mirrors the Postgres store's semantics, including the uniqueness
//! guarantees and the atomic threshold swap (a single write lock spans
//! both the threshold update and the audit append).

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CalibrationAuditEntry, PredictionStore};
use crate::config::Thresholds;
use crate::domain::{ModelVersion, Outcome, Prediction, ResolvedPrediction, WeekWindow};
use crate::error::{GridEdgeError, Result};

struct MemoryState {
    predictions: HashMap<Uuid, Prediction>,
    outcomes: HashMap<Uuid, Outcome>,
    thresholds: Thresholds,
    audit: Vec<CalibrationAuditEntry>,
}

pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_thresholds(Thresholds::default())
    }

    pub fn with_thresholds(thresholds: Thresholds) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                predictions: HashMap::new(),
                outcomes: HashMap::new(),
                thresholds,
                audit: Vec::new(),
            }),
        }
    }

    /// Applied threshold changes, oldest first
    pub async fn audit_entries(&self) -> Vec<CalibrationAuditEntry> {
        self.state.read().await.audit.clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn same_key(p: &Prediction, season: i32, week: i32, subject: &str, version: ModelVersion) -> bool {
    p.season == season && p.week == week && p.subject == subject && p.model_version == version
}

#[async_trait]
impl PredictionStore for MemoryStore {
    async fn insert_prediction(&self, prediction: &Prediction) -> Result<Uuid> {
        let mut state = self.state.write().await;

        let duplicate = state.predictions.values().any(|existing| {
            same_key(
                existing,
                prediction.season,
                prediction.week,
                &prediction.subject,
                prediction.model_version,
            )
        });
        if duplicate {
            return Err(GridEdgeError::DuplicatePrediction {
                subject: prediction.subject.clone(),
                week: prediction.week,
                season: prediction.season,
                model_version: prediction.model_version.to_string(),
            });
        }

        state.predictions.insert(prediction.id, prediction.clone());
        Ok(prediction.id)
    }

    async fn get_prediction(&self, id: Uuid) -> Result<Option<Prediction>> {
        Ok(self.state.read().await.predictions.get(&id).cloned())
    }

    async fn insert_outcome(&self, outcome: &Outcome) -> Result<()> {
        let mut state = self.state.write().await;

        if !state.predictions.contains_key(&outcome.prediction_id) {
            return Err(GridEdgeError::NotFound(outcome.prediction_id));
        }
        if state.outcomes.contains_key(&outcome.prediction_id) {
            return Err(GridEdgeError::DuplicateOutcome(outcome.prediction_id));
        }

        state.outcomes.insert(outcome.prediction_id, outcome.clone());
        Ok(())
    }

    async fn resolved_in_window(&self, window: &WeekWindow) -> Result<Vec<ResolvedPrediction>> {
        let state = self.state.read().await;
        let mut resolved: Vec<ResolvedPrediction> = state
            .outcomes
            .values()
            .filter_map(|outcome| {
                let prediction = state.predictions.get(&outcome.prediction_id)?;
                if !window.contains(prediction.season, prediction.week) {
                    return None;
                }
                Some(ResolvedPrediction {
                    prediction: prediction.clone(),
                    actual_result: outcome.actual_result,
                    recorded_at: outcome.recorded_at,
                })
            })
            .collect();
        resolved.sort_by_key(|r| (r.prediction.week, r.prediction.subject.clone()));
        Ok(resolved)
    }

    async fn current_thresholds(&self) -> Result<Thresholds> {
        Ok(self.state.read().await.thresholds.clone())
    }

    async fn apply_thresholds(
        &self,
        next: &Thresholds,
        report: &serde_json::Value,
    ) -> Result<i64> {
        // One write lock spans the swap and the audit append
        let mut state = self.state.write().await;
        let id = state.audit.len() as i64 + 1;
        let entry = CalibrationAuditEntry {
            id,
            previous: state.thresholds.clone(),
            next: next.clone(),
            report: report.clone(),
            created_at: Utc::now(),
        };
        state.thresholds = next.clone();
        state.audit.push(entry);
        Ok(id)
    }
}

//! PostgreSQL storage adapter.
//!
//! Uniqueness is enforced by database constraints and mapped back onto the
//! engine's error taxonomy; the threshold swap runs in a transaction with
//! a row lock so concurrent calibration commits serialize and a crash
//! mid-write never leaves thresholds inconsistent with the audit trail.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::{debug, info};
use uuid::Uuid;

use super::PredictionStore;
use crate::config::Thresholds;
use crate::domain::{
    ModelVersion, Outcome, Prediction, ResolvedPrediction, Tier, WeekWindow,
};
use crate::error::{GridEdgeError, Result};

/// PostgreSQL storage adapter
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create a store from an existing connection pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Database migrations completed");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn prediction_from_row(row: &sqlx::postgres::PgRow) -> Result<Prediction> {
    let tier: String = row.get("tier");
    let model_version: String = row.get("model_version");
    Ok(Prediction {
        id: row.get("id"),
        season: row.get("season"),
        week: row.get("week"),
        subject: row.get("subject"),
        predicted_probability: row.get("predicted_probability"),
        odds: row.get("odds"),
        implied_probability: row.get("implied_probability"),
        edge_pct: row.get("edge_pct"),
        tier: Tier::try_from(tier.as_str())?,
        kelly_fraction: row.get("kelly_fraction"),
        recommended_stake: row.get("recommended_stake"),
        model_version: ModelVersion::try_from(model_version.as_str())?,
        confidence: row.get("confidence"),
        created_at: row.get("created_at"),
    })
}

#[async_trait]
impl PredictionStore for PostgresStore {
    async fn insert_prediction(&self, prediction: &Prediction) -> Result<Uuid> {
        let result = sqlx::query(
            r#"
            INSERT INTO predictions (
                id, season, week, subject, predicted_probability, odds,
                implied_probability, edge_pct, tier, kelly_fraction,
                recommended_stake, model_version, confidence, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(prediction.id)
        .bind(prediction.season)
        .bind(prediction.week)
        .bind(&prediction.subject)
        .bind(prediction.predicted_probability)
        .bind(prediction.odds)
        .bind(prediction.implied_probability)
        .bind(prediction.edge_pct)
        .bind(prediction.tier.as_str())
        .bind(prediction.kelly_fraction)
        .bind(prediction.recommended_stake)
        .bind(prediction.model_version.as_str())
        .bind(prediction.confidence)
        .bind(prediction.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.get("id")),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(GridEdgeError::DuplicatePrediction {
                    subject: prediction.subject.clone(),
                    week: prediction.week,
                    season: prediction.season,
                    model_version: prediction.model_version.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_prediction(&self, id: Uuid) -> Result<Option<Prediction>> {
        let row = sqlx::query(
            r#"
            SELECT id, season, week, subject, predicted_probability, odds,
                   implied_probability, edge_pct, tier, kelly_fraction,
                   recommended_stake, model_version, confidence, created_at
            FROM predictions WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(prediction_from_row).transpose()
    }

    async fn insert_outcome(&self, outcome: &Outcome) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO outcomes (prediction_id, actual_result, recorded_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(outcome.prediction_id)
        .bind(outcome.actual_result)
        .bind(outcome.recorded_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!(prediction_id = %outcome.prediction_id, "outcome recorded");
                Ok(())
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(GridEdgeError::DuplicateOutcome(outcome.prediction_id))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                Err(GridEdgeError::NotFound(outcome.prediction_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn resolved_in_window(&self, window: &WeekWindow) -> Result<Vec<ResolvedPrediction>> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.season, p.week, p.subject, p.predicted_probability,
                   p.odds, p.implied_probability, p.edge_pct, p.tier,
                   p.kelly_fraction, p.recommended_stake, p.model_version,
                   p.confidence, p.created_at,
                   o.actual_result, o.recorded_at
            FROM predictions p
            JOIN outcomes o ON o.prediction_id = p.id
            WHERE p.season = $1 AND p.week BETWEEN $2 AND $3
            ORDER BY p.week ASC, p.subject ASC
            "#,
        )
        .bind(window.season)
        .bind(window.start_week)
        .bind(window.end_week)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ResolvedPrediction {
                    prediction: prediction_from_row(row)?,
                    actual_result: row.get("actual_result"),
                    recorded_at: row.get("recorded_at"),
                })
            })
            .collect()
    }

    async fn current_thresholds(&self) -> Result<Thresholds> {
        let row = sqlx::query(
            r#"
            SELECT edge_threshold, confidence_threshold, min_hold_days
            FROM thresholds WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| {
            GridEdgeError::Persistence("thresholds row missing; run migrations".to_string())
        })?;

        Ok(Thresholds {
            edge_threshold: row.get("edge_threshold"),
            confidence_threshold: row.get("confidence_threshold"),
            min_hold_days: row.get("min_hold_days"),
        })
    }

    async fn apply_thresholds(
        &self,
        next: &Thresholds,
        report: &serde_json::Value,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent appliers
        let previous = sqlx::query(
            r#"
            SELECT edge_threshold, confidence_threshold, min_hold_days
            FROM thresholds WHERE id = 1
            FOR UPDATE
            "#,
        )
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            GridEdgeError::Persistence("thresholds row missing; run migrations".to_string())
        })?;

        let previous = Thresholds {
            edge_threshold: previous.get("edge_threshold"),
            confidence_threshold: previous.get("confidence_threshold"),
            min_hold_days: previous.get("min_hold_days"),
        };

        sqlx::query(
            r#"
            UPDATE thresholds
            SET edge_threshold = $1, confidence_threshold = $2,
                min_hold_days = $3, updated_at = NOW()
            WHERE id = 1
            "#,
        )
        .bind(next.edge_threshold)
        .bind(next.confidence_threshold)
        .bind(next.min_hold_days)
        .execute(&mut *tx)
        .await?;

        let audit_row = sqlx::query(
            r#"
            INSERT INTO calibration_audit (previous, next, report)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(serde_json::to_value(&previous)?)
        .bind(serde_json::to_value(next)?)
        .bind(report)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let audit_id: i64 = audit_row.get("id");
        info!(audit_id, "thresholds applied");
        Ok(audit_id)
    }
}

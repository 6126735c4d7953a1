use thiserror::Error;
use uuid::Uuid;

/// Main error type for the edge engine
#[derive(Error, Debug)]
pub enum GridEdgeError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Matchup data errors (skippable per matchup, never abort a batch)
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid odds: {0} (American odds of zero are undefined)")]
    InvalidOdds(i32),

    #[error("Domain error: {0}")]
    Domain(String),

    // Idempotency violations at the storage boundary
    #[error("Duplicate prediction for {subject} week {week} season {season} ({model_version})")]
    DuplicatePrediction {
        subject: String,
        week: i32,
        season: i32,
        model_version: String,
    },

    #[error("Outcome already recorded for prediction {0}")]
    DuplicateOutcome(Uuid),

    #[error("Prediction not found: {0}")]
    NotFound(Uuid),

    // Calibration errors
    #[error("Insufficient sample for calibration: {resolved} resolved outcomes, need at least {required}")]
    InsufficientSample { resolved: usize, required: usize },

    // Storage write failures outside sqlx
    #[error("Persistence error: {0}")]
    Persistence(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for GridEdgeError
pub type Result<T> = std::result::Result<T, GridEdgeError>;

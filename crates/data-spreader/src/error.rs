//! Error types for the replication and reporting library.

use thiserror::Error;

/// Main error type for spread operations.
#[derive(Error, Debug)]
pub enum SpreadError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A tier name did not resolve to a configured tier
    #[error("Unknown tier '{name}'. Configured tiers: {known}")]
    TierResolve { name: String, known: String },

    /// Staging store error (open, SQL, pragma)
    #[error("Store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// Field mapping does not line up with the real schemas
    #[error("Field mapping error for dataset {dataset}: {message}")]
    Mapping { dataset: String, message: String },

    /// Replication step failed for a specific dataset
    #[error("Replication failed for dataset {dataset}: {message}")]
    Replicate { dataset: String, message: String },

    /// Row count validation failed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Report build or export failed
    #[error("Report error: {0}")]
    Report(String),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Portal HTTP transport error
    #[error("Portal request error: {0}")]
    Portal(#[from] reqwest::Error),

    /// Portal REST API returned an error envelope
    #[error("Portal API error (code {code}): {message}")]
    PortalApi { code: i64, message: String },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpreadError {
    /// Create a Mapping error
    pub fn mapping(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        SpreadError::Mapping {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    /// Create a Replicate error
    pub fn replicate(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        SpreadError::Replicate {
            dataset: dataset.into(),
            message: message.into(),
        }
    }

    /// Create a PortalApi error
    pub fn portal_api(code: i64, message: impl Into<String>) -> Self {
        SpreadError::PortalApi {
            code,
            message: message.into(),
        }
    }

    /// Stable process exit code for this error class.
    ///
    /// Scheduled runs are watched by exit code, so each failure class keeps
    /// its own number: config 1, mapping 2, replication/validation 3,
    /// report 4, portal 5, store 6, everything IO-ish 7.
    pub fn exit_code(&self) -> u8 {
        match self {
            SpreadError::Config(_) | SpreadError::TierResolve { .. } | SpreadError::Yaml(_) => 1,
            SpreadError::Mapping { .. } => 2,
            SpreadError::Replicate { .. } | SpreadError::Validation(_) => 3,
            SpreadError::Report(_) | SpreadError::Csv(_) => 4,
            SpreadError::Portal(_) | SpreadError::PortalApi { .. } => 5,
            SpreadError::Store(_) => 6,
            SpreadError::Io(_) | SpreadError::Json(_) => 7,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        // Add error chain for wrapped errors
        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for spread operations.
pub type Result<T> = std::result::Result<T, SpreadError>;

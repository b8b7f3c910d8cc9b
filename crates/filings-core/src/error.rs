//! Error types for filing retrieval and reconciliation.
//!
//! This module defines [`FilingError`] which covers every failure that can occur
//! while retrieving filings, extracting records from documents, reconciling
//! periods, or writing results.
//!
//! Errors fall into three classes:
//!
//! - retrieval failures ([`FilingError::is_retrieval_failure`]) degrade a single
//!   retrieval round to an empty result
//! - extraction failures ([`FilingError::is_extraction_failure`]) skip a single
//!   document
//! - everything else (invalid parameters, configuration, export) ends the run

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during filing operations.
#[derive(Error, Debug)]
pub enum FilingError {
    /// Network-related errors (connection failures, HTTP status errors).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a repository.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The repository that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The requested entity is unknown to the repository.
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// The repository has no filings of the requested kind for the entity.
    #[error("No {kind} filings available for {entity}")]
    DataNotAvailable {
        /// The entity that was requested.
        entity: String,
        /// Form type that was requested (e.g. "10-Q").
        kind: String,
    },

    /// A retrieval did not complete within its deadline.
    #[error("Retrieval timed out after {0:?}")]
    Timeout(Duration),

    /// A single document could not be turned into a record.
    #[error("Could not extract {source_file}: {reason}")]
    Extraction {
        /// Identifier of the document that failed.
        source_file: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// A repository response could not be decoded.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An invalid parameter was provided (non-positive lookback, unrepresentable date).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Required configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The result set could not be written.
    #[error("Export error: {0}")]
    Export(String),

    /// Filesystem error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl FilingError {
    /// Returns true if the repository could not obtain documents.
    ///
    /// Retrieval failures are recovered by the reconciliation driver: the round
    /// contributes no records and the failure is reported.
    #[must_use]
    pub const fn is_retrieval_failure(&self) -> bool {
        matches!(
            self,
            Self::Network(_)
                | Self::RateLimited { .. }
                | Self::EntityNotFound(_)
                | Self::DataNotAvailable { .. }
                | Self::Timeout(_)
                | Self::Parse(_)
        )
    }

    /// Returns true if a single document could not be parsed into a record.
    #[must_use]
    pub const fn is_extraction_failure(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }

    /// Returns true if the error must abort the run.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_retrieval_failure() && !self.is_extraction_failure()
    }
}

/// Result type alias using [`FilingError`].
pub type Result<T> = std::result::Result<T, FilingError>;

//! Error types shared across the analysis pipeline.
//!
//! Failures are recovered at the smallest scope that can absorb them: a
//! single upstream call, a single file, a single folder. Only the top-level
//! command layer turns them into process exit codes.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A failure reported by the external text-generation capability.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("upstream error ({}): {message}", .status.map_or_else(|| "transport".to_string(), |s| s.to_string()))]
pub struct UpstreamError {
    /// HTTP status, when the request reached the service.
    pub status: Option<u16>,
    /// Service or transport message.
    pub message: String,
}

impl UpstreamError {
    /// A failure that never produced an HTTP status (DNS, TLS, timeouts, decoding).
    pub fn transport(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    /// A non-2xx response.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }
}

/// Errors raised by the completion gateway.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The credential pool is empty.
    #[error("no API credentials configured (set HORIZON_API_KEYS)")]
    NoCredentials,

    /// Every attempt in the retry budget failed.
    #[error("all {attempts} completion attempts failed; last error: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: usize,
        /// The final upstream failure.
        last: UpstreamError,
    },
}

/// Why a single file could not be analyzed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// The gateway gave up on this file.
    #[error("analysis of {} failed: {source}", .path.display())]
    Gateway {
        /// File identity.
        path: PathBuf,
        /// Underlying gateway failure.
        #[source]
        source: GatewayError,
    },

    /// The response could not be parsed as a structured analysis.
    #[error("malformed response for {}: failed to parse analysis JSON: {reason}", .path.display())]
    MalformedResponse {
        /// File identity.
        path: PathBuf,
        /// Parser diagnostic.
        reason: String,
    },

    /// The file could not be read.
    #[error("failed to read {}: {message}", .path.display())]
    Io {
        /// File identity.
        path: PathBuf,
        /// I/O diagnostic.
        message: String,
    },
}

/// Errors that abort a folder summary or a full run.
///
/// Starvation is not an error: it is reported through
/// [`ModuleSummary::empty`](crate::pipeline::ModuleSummary::empty).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregateError {
    /// The reduce request exhausted its retry budget.
    #[error("aggregation request failed: {0}")]
    Gateway(#[from] GatewayError),

    /// The run was cancelled before completion.
    #[error("analysis cancelled after {completed} of {total} files")]
    Cancelled {
        /// Files processed before cancellation was observed.
        completed: usize,
        /// Files enumerated.
        total: usize,
    },
}

/// Invalid configuration values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric environment variable did not parse.
    #[error("invalid value for {key}: {value:?}")]
    Invalid {
        /// Environment variable name.
        key: String,
        /// Raw value.
        value: String,
    },
}

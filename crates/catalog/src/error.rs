//! Errors surfaced by the Catalog Data Source client.
//!
//! Only fetch and decoding problems are errors. An empty listing is a valid
//! result and never maps to an error variant.

use deal_core::DealError;
use thiserror::Error;

/// Errors that can occur when talking to the Catalog Data Source.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connection, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured base URL cannot carry path segments.
    #[error("Invalid catalog base URL: {0}")]
    InvalidBaseUrl(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the catalog service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The service answered with a failure envelope.
    #[error("Catalog error ({status}): {}", format_deal_errors(.message, .errors))]
    Server {
        status: u16,
        message: String,
        errors: Vec<DealError>,
    },

    /// A single-record endpoint answered successfully but without a payload.
    #[error("Empty payload from {0}")]
    MissingPayload(String),
}

impl CatalogError {
    /// HTTP status associated with the failure, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            Self::NotFound(_) => Some(404),
            Self::RateLimited(_) => Some(429),
            Self::Server { status, .. } => Some(*status),
            Self::Parse(_) | Self::InvalidBaseUrl(_) | Self::MissingPayload(_) => None,
        }
    }

    /// Whether a user-triggered retry can reasonably succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(_) | Self::RateLimited(_) => true,
            Self::Server { status, .. } => *status >= 500,
            Self::Parse(_)
            | Self::InvalidBaseUrl(_)
            | Self::NotFound(_)
            | Self::MissingPayload(_) => false,
        }
    }
}

fn format_deal_errors(message: &str, errors: &[DealError]) -> String {
    if errors.is_empty() {
        return if message.is_empty() {
            "(no error details provided)".to_string()
        } else {
            message.to_string()
        };
    }

    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A failed fetch as a listing page keeps it: cloneable, renderable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// One-line summary for a banner.
    pub message: String,
    /// Individual messages from the failure envelope, if any.
    pub details: Vec<String>,
    pub status: Option<u16>,
    /// Whether to offer a retry affordance.
    pub retryable: bool,
}

impl From<&CatalogError> for FetchFailure {
    fn from(err: &CatalogError) -> Self {
        let details = match err {
            CatalogError::Server { errors, .. } => {
                errors.iter().map(|e| e.message.clone()).collect()
            }
            _ => Vec::new(),
        };
        Self {
            message: err.to_string(),
            details,
            status: err.status(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<CatalogError> for FetchFailure {
    fn from(err: CatalogError) -> Self {
        Self::from(&err)
    }
}

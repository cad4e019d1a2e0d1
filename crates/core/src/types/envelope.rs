//! The response envelope wrapped around every Catalog Data Source payload.
//!
//! ```json
//! { "status": 200, "message": "OK", "errors": null, "payload": [ ... ] }
//! ```
//!
//! Failures use the same shape with `payload` absent and `errors` filled in.

use serde::{Deserialize, Serialize};

/// A single error message reported by the Catalog Data Source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealError {
    pub message: String,
}

/// Pagination metadata attached to paged list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDetails {
    pub page: u32,
    pub size: u32,
    #[serde(default)]
    pub total_elements: u64,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_previous: bool,
    #[serde(default)]
    pub next_page_url: Option<String>,
    #[serde(default)]
    pub previous_page_url: Option<String>,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealResponse<T> {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Option<Vec<DealError>>,
    #[serde(default = "Option::default")]
    pub payload: Option<T>,
    #[serde(default)]
    pub pagination: Option<PaginationDetails>,
}

impl<T> DealResponse<T> {
    /// A successful envelope around `payload`.
    #[must_use]
    pub fn ok(payload: T) -> Self {
        Self {
            status: 200,
            message: "OK".to_string(),
            errors: None,
            payload: Some(payload),
            pagination: None,
        }
    }

    /// A failure envelope carrying the given error messages.
    #[must_use]
    pub fn failure(status: u16, messages: &[&str]) -> Self {
        Self {
            status,
            message: "Error".to_string(),
            errors: Some(
                messages
                    .iter()
                    .map(|m| DealError {
                        message: (*m).to_string(),
                    })
                    .collect(),
            ),
            payload: None,
            pagination: None,
        }
    }

    /// Error messages, empty when none were reported.
    #[must_use]
    pub fn error_messages(&self) -> Vec<&str> {
        self.errors
            .iter()
            .flatten()
            .map(|e| e.message.as_str())
            .collect()
    }
}

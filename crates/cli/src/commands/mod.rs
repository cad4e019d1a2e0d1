//! Subcommand implementations.

pub mod categories;
pub mod products;
pub mod users;

use deal_catalog::{CatalogError, FetchFailure};
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The catalog request failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A listing fetch failed; details were logged.
    #[error("{}", .0.message)]
    Fetch(FetchFailure),

    /// A record could not be rendered as JSON.
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Log a failed listing fetch with its envelope details.
fn report(failure: &FetchFailure) {
    tracing::warn!(
        status = ?failure.status,
        retryable = failure.retryable,
        details = ?failure.details,
        "{}",
        failure.message
    );
}

/// How records are written to stdout.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    pub const fn is_json(self) -> bool {
        self.json
    }

    /// Print a list, one row per record, or a JSON array.
    #[allow(clippy::print_stdout)]
    pub fn list<T, F>(self, records: &[&T], row: F) -> Result<(), CommandError>
    where
        T: Serialize,
        F: Fn(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(records)?);
            return Ok(());
        }

        if records.is_empty() {
            println!("(no results)");
        }
        for record in records {
            println!("{}", row(record));
        }
        Ok(())
    }

    /// Print one record as pretty JSON or through `render`.
    #[allow(clippy::print_stdout)]
    pub fn one<T, F>(self, record: &T, render: F) -> Result<(), CommandError>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(record)?);
        } else {
            println!("{}", render(record));
        }
        Ok(())
    }
}

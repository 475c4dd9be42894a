//! Error types for the registry crate.
//!
//! [`RegistryError`] covers every failure a single request, a snapshot load
//! or a query compilation can produce. Batch operations never return it
//! directly for per-needle or per-chunk failures: those are collected into
//! [`BatchError`] alongside the records that did resolve.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::outcome::UnitFailure;

/// Errors that can occur while resolving package queries.
#[derive(Error, Diagnostic, Debug)]
pub enum RegistryError {
    #[error("AUR is unavailable at this moment")]
    #[diagnostic(
        code(aurq_registry::service_unavailable),
        help("The service reported an upstream outage, try again later")
    )]
    ServiceUnavailable,

    #[error("status {status}: {message}")]
    #[diagnostic(
        code(aurq_registry::payload),
        help("The service rejected the request; retrying with the same parameters will not help")
    )]
    Payload { status: u16, message: String },

    #[error(transparent)]
    #[diagnostic(
        code(aurq_registry::transport),
        help("Check your network connection and the configured RPC URL")
    )]
    Transport(#[from] Box<ureq::Error>),

    #[error("response decoding failed: {0}")]
    #[diagnostic(
        code(aurq_registry::decode),
        help("The response did not match the expected format")
    )]
    Decode(#[from] serde_json::Error),

    #[error("Invalid search selector: {0}")]
    #[diagnostic(
        code(aurq_registry::invalid_selector),
        help("Valid selectors: name, name-desc, maintainer, submitter, depends, makedepends, optdepends, checkdepends, provides, conflicts, replaces, keywords, groups, comaintainers")
    )]
    InvalidSelector(String),

    #[error("Invalid pattern `{pattern}`: {source}")]
    #[diagnostic(
        code(aurq_registry::invalid_pattern),
        help("Substring searches are regular expressions; escape special characters")
    )]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid URL: {0}")]
    #[diagnostic(
        code(aurq_registry::invalid_url),
        help("Ensure the URL is valid and properly formatted")
    )]
    InvalidUrl(String),

    #[error("Failed to fetch from remote source: {0}")]
    #[diagnostic(
        code(aurq_registry::fetch_remote),
        help("Verify the snapshot URL is correct and accessible")
    )]
    FailedToFetchRemote(String),

    #[error("Error while {action}: {source}")]
    #[diagnostic(code(aurq_registry::io))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Operation cancelled")]
    #[diagnostic(code(aurq_registry::cancelled))]
    Cancelled,

    #[error(transparent)]
    #[diagnostic(
        code(aurq_registry::batch),
        help("Records from the units that succeeded were still returned")
    )]
    Batch(#[from] BatchError),
}

impl From<ureq::Error> for RegistryError {
    fn from(err: ureq::Error) -> Self {
        Self::Transport(Box::new(err))
    }
}

impl RegistryError {
    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::ServiceUnavailable | Self::Transport(_))
    }
}

/// Aggregated per-unit failures of a batch operation.
///
/// Always non-empty when produced by [`crate::QueryOutcome::into_result`].
#[derive(Debug)]
pub struct BatchError {
    pub failures: Vec<UnitFailure>,
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.failures.len();
        write!(
            f,
            "{count} request{} failed:",
            if count == 1 { "" } else { "s" }
        )?;
        for failure in &self.failures {
            write!(f, "\n  * {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for BatchError {}

/// A specialized Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Extension trait for adding context to I/O errors.
pub trait ErrorContext<T> {
    /// Adds context describing what action was being performed.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            RegistryError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}

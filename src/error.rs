//! Error types for the pdftools-client library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ValidationError`] is **local**: the user's selection cannot be
//!   submitted (too few files, bad page range, missing file). Raised before
//!   any network call and never retried.
//!
//! * [`ClientError`] is **fatal to one submission**: the configuration is
//!   invalid, the transport failed, or the result could not be written.
//!
//! Server-side failures (HTTP status ≥ 400) are neither: they are a normal
//! [`crate::classify::ResponseOutcome::Failure`] carrying the message the
//! backend sent.

use std::path::PathBuf;
use thiserror::Error;

/// A selection rejected before any request was sent.
///
/// The `Display` text is the message shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer files than the operation needs.
    #[error("{operation} needs at least {required} {noun}, got {got}")]
    TooFewFiles {
        operation: &'static str,
        noun: &'static str,
        required: usize,
        got: usize,
    },

    /// More files than a single-file operation accepts.
    #[error("{operation} takes exactly one file, got {got}")]
    TooManyFiles { operation: &'static str, got: usize },

    /// A split bound was left empty.
    #[error("Missing '{bound}' page number")]
    MissingBound { bound: &'static str },

    /// A split bound is zero or negative.
    #[error("Invalid page number for '{bound}': {value} (pages start at 1)")]
    NonPositiveBound { bound: &'static str, value: i64 },

    /// `from` is after `to`.
    #[error("Invalid page range: from ({from}) is greater than to ({to})")]
    InvertedRange { from: i64, to: i64 },

    /// A selected path does not exist or is not a regular file.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },
}

/// Errors that abort a single submission outside the server's control.
#[derive(Debug, Error)]
pub enum ClientError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Transport errors ──────────────────────────────────────────────────
    /// Could not read a selected input file.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request could not be sent or the response body not received.
    #[error("Request to '{url}' failed: {reason}")]
    Transport { url: String, reason: String },

    /// The request exceeded the configured transport timeout.
    #[error("Request to '{url}' timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_files_display() {
        let e = ValidationError::TooFewFiles {
            operation: "Merge",
            noun: "PDF files",
            required: 2,
            got: 1,
        };
        assert_eq!(e.to_string(), "Merge needs at least 2 PDF files, got 1");
    }

    #[test]
    fn inverted_range_display() {
        let e = ValidationError::InvertedRange { from: 3, to: 1 };
        let msg = e.to_string();
        assert!(msg.contains("from (3)"), "got: {msg}");
        assert!(msg.contains("to (1)"), "got: {msg}");
    }

    #[test]
    fn timeout_display() {
        let e = ClientError::Timeout {
            url: "http://localhost:5000/api/merge".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("/merge"));
    }

    #[test]
    fn output_write_failed_keeps_source() {
        use std::error::Error as _;
        let e = ClientError::OutputWriteFailed {
            path: PathBuf::from("/nope/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/nope/out.pdf"));
    }
}

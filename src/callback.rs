//! Callback trait for submission events.
//!
//! Inject an [`Arc<dyn SubmissionCallback>`] via
//! [`crate::submit::Submitter::with_callback`] to drive a front-end: show a
//! spinner while busy, pop an alert on failure, announce the saved file.
//!
//! # Example
//!
//! ```rust
//! use pdftools_client::{Operation, SubmissionCallback};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Alerts(Mutex<Vec<String>>);
//!
//! impl SubmissionCallback for Alerts {
//!     fn on_failure(&self, _op: Operation, message: &str) {
//!         self.0.lock().unwrap().push(message.to_string());
//!     }
//! }
//!
//! let alerts: Arc<dyn SubmissionCallback> = Arc::new(Alerts::default());
//! alerts.on_failure(Operation::Merge, "Merge failed");
//! ```

use crate::operation::Operation;
use std::path::Path;
use std::sync::Arc;

/// Called by the submitter as a submission moves through its states.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. For one accepted submission the order is
/// `on_busy`, then at most one of `on_saved` / `on_failure`, then `on_idle`.
/// A selection rejected by validation only gets `on_failure`; a submit
/// refused because the panel is busy gets no events at all.
pub trait SubmissionCallback: Send + Sync {
    /// The panel entered Busy; submission controls should be disabled.
    fn on_busy(&self, op: Operation) {
        let _ = op;
    }

    /// The result was written to `path`.
    fn on_saved(&self, op: Operation, path: &Path, bytes: usize) {
        let _ = (op, path, bytes);
    }

    /// The one user-facing alert for a failed submission.
    fn on_failure(&self, op: Operation, message: &str) {
        let _ = (op, message);
    }

    /// The panel is back to Idle; controls may be re-enabled.
    fn on_idle(&self, op: Operation) {
        let _ = op;
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopCallback;

impl SubmissionCallback for NoopCallback {}

/// Convenience alias for the type stored by [`crate::submit::Submitter`].
pub type Callback = Arc<dyn SubmissionCallback>;

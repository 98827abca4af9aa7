//! The single submission path shared by all five operations.
//!
//! ## Flow
//!
//! ```text
//! try_begin ──▶ validate ──▶ prepare ──▶ send ──▶ classify ──▶ save
//!  (Busy?)      (Rejected)   (read files) (fault?)  (Failure?)   (Saved)
//! ```
//!
//! [`Submitter::submit`] never returns an error and never lets a panic from
//! a transport or saver escape: every path ends in a [`SubmissionReport`],
//! and the panel's busy flag is released by guard drop on all of them.

use crate::callback::{Callback, NoopCallback};
use crate::classify::{classify, ResponseOutcome};
use crate::config::ClientConfig;
use crate::download::{FileSaver, Saver};
use crate::error::ClientError;
use crate::operation::Operation;
use crate::request::{prepare, HttpTransport, PreparedRequest, Transport};
use crate::state::SubmitFlag;
use crate::validate::{validate, InputSet, PageBounds, PageRange};
use futures::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// How one submission ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionReport {
    /// The selection failed validation; nothing was sent.
    Rejected { operation: Operation, message: String },
    /// The panel already had a request in flight; nothing was sent.
    Busy { operation: Operation },
    /// The result was saved.
    Saved {
        operation: Operation,
        path: PathBuf,
        bytes: usize,
        duration_ms: u64,
    },
    /// The server refused the request or a fault occurred.
    Failed {
        operation: Operation,
        message: String,
        /// HTTP status when the server answered, `None` for local faults.
        http_status: Option<u16>,
    },
    /// Dry run: the request that would have been sent.
    Planned { request: PreparedRequest },
}

impl SubmissionReport {
    /// True for `Saved` and `Planned`.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            SubmissionReport::Saved { .. } | SubmissionReport::Planned { .. }
        )
    }

    /// The user-facing message for unsuccessful reports.
    pub fn message(&self) -> Option<&str> {
        match self {
            SubmissionReport::Rejected { message, .. }
            | SubmissionReport::Failed { message, .. } => Some(message),
            SubmissionReport::Busy { .. } => Some("A request is already in progress"),
            _ => None,
        }
    }
}

/// Why an accepted submission did not produce a file.
struct Failure {
    message: String,
    http_status: Option<u16>,
}

impl Failure {
    fn fault(op: Operation, err: &ClientError) -> Self {
        Self {
            message: fault_message(op, &err.to_string()),
            http_status: None,
        }
    }
}

/// The error text, or the operation's generic fallback when it is blank.
fn fault_message(op: Operation, text: &str) -> String {
    if text.trim().is_empty() {
        op.spec().failure_fallback.to_string()
    } else {
        text.to_string()
    }
}

/// Submits operations to the backend and saves their results.
pub struct Submitter {
    base_url: String,
    transport: Arc<dyn Transport>,
    saver: Arc<dyn Saver>,
    callback: Callback,
}

impl Submitter {
    /// A submitter using HTTP and the configured output directory.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self::with_parts(
            config.base_url.clone(),
            Arc::new(HttpTransport::new(config)?),
            Arc::new(FileSaver::new(&config.output_dir, config.overwrite)),
        ))
    }

    /// A submitter over caller-supplied transport and saver.
    pub fn with_parts(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        saver: Arc<dyn Saver>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
            saver,
            callback: Arc::new(NoopCallback),
        }
    }

    pub fn with_callback(mut self, callback: Callback) -> Self {
        self.callback = callback;
        self
    }

    /// Validate and build the request for `op` without sending it.
    pub async fn plan(
        &self,
        op: Operation,
        inputs: InputSet,
        bounds: Option<PageBounds>,
    ) -> SubmissionReport {
        let range = match validate(op, &inputs, bounds.as_ref()) {
            Ok(range) => range,
            Err(e) => return self.reject(op, e.to_string()),
        };
        match prepare(&self.base_url, op, &inputs, range).await {
            Ok(request) => SubmissionReport::Planned { request },
            Err(e) => {
                let failure = Failure::fault(op, &e);
                self.callback.on_failure(op, &failure.message);
                SubmissionReport::Failed {
                    operation: op,
                    message: failure.message,
                    http_status: None,
                }
            }
        }
    }

    /// Run one submission of `op` on the panel guarded by `flag`.
    ///
    /// `inputs` and `bounds` are consumed: a selection is submitted once.
    pub async fn submit(
        &self,
        flag: &SubmitFlag,
        op: Operation,
        inputs: InputSet,
        bounds: Option<PageBounds>,
    ) -> SubmissionReport {
        let Some(guard) = flag.try_begin() else {
            info!("{op}: request already in flight, ignoring submit");
            return SubmissionReport::Busy { operation: op };
        };

        let range = match validate(op, &inputs, bounds.as_ref()) {
            Ok(range) => range,
            Err(e) => {
                drop(guard);
                return self.reject(op, e.to_string());
            }
        };

        self.callback.on_busy(op);
        let start = Instant::now();
        info!("{op}: submitting {} file(s)", inputs.len());

        let attempt = AssertUnwindSafe(self.run(op, &inputs, range))
            .catch_unwind()
            .await;
        let result = match attempt {
            Ok(result) => result,
            Err(_) => Err(Failure {
                message: op.spec().failure_fallback.to_string(),
                http_status: None,
            }),
        };

        let report = match result {
            Ok((path, bytes)) => {
                self.callback.on_saved(op, &path, bytes);
                SubmissionReport::Saved {
                    operation: op,
                    path,
                    bytes,
                    duration_ms: start.elapsed().as_millis() as u64,
                }
            }
            Err(failure) => {
                debug!("{op}: failed: {}", failure.message);
                self.callback.on_failure(op, &failure.message);
                SubmissionReport::Failed {
                    operation: op,
                    message: failure.message,
                    http_status: failure.http_status,
                }
            }
        };

        drop(guard);
        self.callback.on_idle(op);
        report
    }

    async fn run(
        &self,
        op: Operation,
        inputs: &InputSet,
        range: Option<PageRange>,
    ) -> Result<(PathBuf, usize), Failure> {
        let fallback_name = op.fallback_filename(range);

        let request = prepare(&self.base_url, op, inputs, range)
            .await
            .map_err(|e| Failure::fault(op, &e))?;

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Failure::fault(op, &e))?;

        match classify(response, &fallback_name) {
            ResponseOutcome::Success { payload, filename } => {
                let bytes = payload.len();
                let path = self
                    .saver
                    .save(payload, &filename)
                    .await
                    .map_err(|e| Failure::fault(op, &e))?;
                Ok((path, bytes))
            }
            ResponseOutcome::Failure { status, message } => Err(Failure {
                message,
                http_status: Some(status),
            }),
        }
    }

    fn reject(&self, op: Operation, message: String) -> SubmissionReport {
        debug!("{op}: rejected: {message}");
        self.callback.on_failure(op, &message);
        SubmissionReport::Rejected {
            operation: op,
            message,
        }
    }
}

//! # pdftools-client
//!
//! Send PDFs and images to a remote PDF-processing service and save what
//! comes back.
//!
//! The backend does all the work (merge, split, text extraction, Word
//! conversion, OCR). This crate is the client-side orchestration around it:
//! validating a selection, building the multipart upload, telling a file
//! apart from an error body, naming the result, and saving it without ever
//! leaving a half-written file behind.
//!
//! ## Submission Flow
//!
//! ```text
//! selection
//!  │
//!  ├─ 1. Validate  file counts, split page range, files exist   (no network)
//!  ├─ 2. Prepare   multipart `file` / `files` + `?from=&to=`
//!  ├─ 3. Send      POST {base}/{endpoint}, any status accepted
//!  ├─ 4. Classify  status < 400 → file, else JSON / text error message
//!  ├─ 5. Name      content-disposition → sanitized filename, or fallback
//!  └─ 6. Save      temp file + rename into the output directory
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdftools_client::{ClientConfig, InputSet, Operation, Session, Submitter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder("http://localhost:5000/api").build()?;
//!     let submitter = Submitter::new(&config)?;
//!     let session = Session::new();
//!
//!     let report = submitter
//!         .submit(
//!             session.flag(Operation::Merge),
//!             Operation::Merge,
//!             InputSet::new(["a.pdf", "b.pdf"]),
//!             None,
//!         )
//!         .await;
//!     println!("{}", serde_json::to_string_pretty(&report)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdftools` binary (clap + anyhow + indicatif + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod callback;
pub mod classify;
pub mod config;
pub mod download;
pub mod error;
pub mod filename;
pub mod operation;
pub mod request;
pub mod state;
pub mod submit;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use callback::{Callback, NoopCallback, SubmissionCallback};
pub use classify::{classify, RawResponse, ResponseOutcome};
pub use config::{ClientConfig, ClientConfigBuilder, API_BASE_ENV};
pub use download::{FileSaver, Saver};
pub use error::{ClientError, ValidationError};
pub use filename::{resolve_filename, sanitize_filename};
pub use operation::{Operation, OperationSpec};
pub use request::{prepare, FilePart, HttpTransport, PreparedRequest, Transport};
pub use state::{BusyGuard, Navigator, Panel, RequestState, Session, SubmitFlag};
pub use submit::{SubmissionReport, Submitter};
pub use validate::{validate, InputSet, PageBounds, PageRange};

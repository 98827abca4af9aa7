//! Request building and transport.
//!
//! Building and sending are split so the same [`PreparedRequest`] can be
//! printed for `--dry-run`, inspected in tests, or handed to any
//! [`Transport`]. The transport's only job is to move bytes: it must not
//! decode the body as text and must not treat a 4xx/5xx status as an error,
//! because the classifier still needs to read the error body.

use crate::classify::RawResponse;
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::operation::Operation;
use crate::validate::{InputSet, PageRange};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// One file attached to the multipart body.
#[derive(Debug, Clone, Serialize)]
pub struct FilePart {
    /// `files` for multi-file operations, `file` otherwise.
    pub field: &'static str,
    pub file_name: String,
    pub mime: &'static str,
    #[serde(rename = "size_bytes", serialize_with = "serialize_len")]
    pub data: Bytes,
}

fn serialize_len<S: serde::Serializer>(data: &Bytes, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(data.len() as u64)
}

/// A fully assembled POST, ready for a [`Transport`].
#[derive(Debug, Clone, Serialize)]
pub struct PreparedRequest {
    pub operation: Operation,
    /// Endpoint URL without query string.
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub parts: Vec<FilePart>,
}

impl PreparedRequest {
    /// The URL with its query string, for logs and dry runs.
    pub fn display_url(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }
        let qs: Vec<String> = self
            .query
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.url, qs.join("&"))
    }
}

/// Join `base_url` and `path` with exactly one slash between them.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Read the selected files and assemble the request for `op`.
///
/// `inputs` and `range` must already have passed
/// [`crate::validate::validate`].
pub async fn prepare(
    base_url: &str,
    op: Operation,
    inputs: &InputSet,
    range: Option<PageRange>,
) -> Result<PreparedRequest, ClientError> {
    let spec = op.spec();

    let mut parts = Vec::with_capacity(inputs.len());
    for path in inputs.files() {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ClientError::InputReadFailed {
                path: path.clone(),
                source: e,
            })?;
        parts.push(FilePart {
            field: spec.field,
            file_name: part_file_name(path),
            mime: guess_mime(path),
            data: Bytes::from(data),
        });
    }

    let query = match range {
        Some(r) => vec![("from", r.from.to_string()), ("to", r.to.to_string())],
        None => Vec::new(),
    };

    Ok(PreparedRequest {
        operation: op,
        url: endpoint_url(base_url, spec.path),
        query,
        parts,
    })
}

fn part_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

/// MIME type for an upload, from its extension.
pub fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Sends a prepared request and returns the response untouched.
///
/// Implementations must return `Ok` for every HTTP status; `Err` is
/// reserved for faults where no response was obtained.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, ClientError>;
}

/// [`Transport`] over `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_secs: Option<u64>,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ClientError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs: config.request_timeout_secs,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: PreparedRequest) -> Result<RawResponse, ClientError> {
        let url = request.display_url();
        info!(
            "POST {} ({} file{})",
            url,
            request.parts.len(),
            if request.parts.len() == 1 { "" } else { "s" }
        );

        let mut form = Form::new();
        for part in request.parts {
            debug!(
                "  {}: {} ({}, {} bytes)",
                part.field,
                part.file_name,
                part.mime,
                part.data.len()
            );
            let body = Part::bytes(part.data.to_vec())
                .file_name(part.file_name)
                .mime_str(part.mime)
                .map_err(|e| ClientError::Transport {
                    url: url.clone(),
                    reason: e.to_string(),
                })?;
            form = form.part(part.field, body);
        }

        let fault = |e: reqwest::Error| match self.timeout_secs {
            Some(secs) if e.is_timeout() => ClientError::Timeout {
                url: url.clone(),
                secs,
            },
            _ => ClientError::Transport {
                url: url.clone(),
                reason: e.to_string(),
            },
        };

        let response = self
            .client
            .post(&request.url)
            .query(&request.query)
            .header(ACCEPT, "*/*")
            .multipart(form)
            .send()
            .await
            .map_err(&fault)?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(&fault)?;
        debug!("HTTP {} with {} byte body", status, body.len());

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn endpoint_url_joins_cleanly() {
        assert_eq!(
            endpoint_url("http://localhost:5000/api/", "/merge"),
            "http://localhost:5000/api/merge"
        );
        assert_eq!(
            endpoint_url("https://pdf.example.com", "/ocr"),
            "https://pdf.example.com/ocr"
        );
    }

    #[test]
    fn guess_mime_by_extension() {
        assert_eq!(guess_mime(Path::new("a.PDF")), "application/pdf");
        assert_eq!(guess_mime(Path::new("scan.jpeg")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn prepare_merge_uses_repeated_files_field() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.pdf");
        let b = dir.path().join("b.pdf");
        std::fs::write(&a, b"AAA").unwrap();
        std::fs::write(&b, b"BBBB").unwrap();

        let req = prepare(
            "http://localhost:5000/api",
            Operation::Merge,
            &InputSet::new([&a, &b]),
            None,
        )
        .await
        .unwrap();

        assert_eq!(req.url, "http://localhost:5000/api/merge");
        assert!(req.query.is_empty());
        let fields: Vec<_> = req.parts.iter().map(|p| p.field).collect();
        assert_eq!(fields, vec!["files", "files"]);
        assert_eq!(req.parts[0].file_name, "a.pdf");
        assert_eq!(&req.parts[1].data[..], b"BBBB");
    }

    #[tokio::test]
    async fn prepare_split_adds_range_query() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("doc.pdf");
        std::fs::write(&doc, b"%PDF").unwrap();

        let req = prepare(
            "http://h/api",
            Operation::Split,
            &InputSet::new([&doc]),
            Some(PageRange { from: 2, to: 5 }),
        )
        .await
        .unwrap();

        assert_eq!(req.parts.len(), 1);
        assert_eq!(req.parts[0].field, "file");
        assert_eq!(req.display_url(), "http://h/api/split?from=2&to=5");
    }

    #[tokio::test]
    async fn prepare_reports_unreadable_file() {
        let dir = TempDir::new().unwrap();
        let gone = dir.path().join("gone.pdf");
        let err = prepare("http://h", Operation::ToText, &InputSet::new([&gone]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InputReadFailed { .. }));
    }

    #[test]
    fn prepared_request_serializes_sizes_not_bytes() {
        let req = PreparedRequest {
            operation: Operation::ToDocx,
            url: "http://h/pdf-to-docx".into(),
            query: vec![],
            parts: vec![FilePart {
                field: "file",
                file_name: "x.pdf".into(),
                mime: "application/pdf",
                data: Bytes::from_static(b"12345"),
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["operation"], "to-docx");
        assert_eq!(json["parts"][0]["size_bytes"], 5);
    }
}

//! Client configuration.
//!
//! All client behaviour is controlled through [`ClientConfig`], built via
//! [`ClientConfigBuilder`]. The base URL of the processing backend is the
//! one setting without a default: it always comes from the caller (the CLI
//! reads it from `--api-base` or `PDFTOOLS_API_BASE`).

use crate::error::ClientError;
use std::path::PathBuf;

/// Environment variable the CLI reads the backend origin from.
pub const API_BASE_ENV: &str = "PDFTOOLS_API_BASE";

/// Configuration for talking to the processing backend.
///
/// # Example
/// ```rust
/// use pdftools_client::ClientConfig;
///
/// let config = ClientConfig::builder("http://localhost:5000/api")
///     .output_dir("downloads")
///     .request_timeout_secs(300)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url, "http://localhost:5000/api");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Origin + prefix every operation path is appended to, without a
    /// trailing slash.
    pub base_url: String,

    /// Directory results are saved into. Default: the current directory.
    pub output_dir: PathBuf,

    /// Replace an existing file instead of picking `name (1).ext`. Default: false.
    pub overwrite: bool,

    /// Whole-request timeout applied by the transport. Default: none.
    ///
    /// OCR of a large batch can legitimately take minutes, so the client
    /// does not impose a limit unless asked to.
    pub request_timeout_secs: Option<u64>,

    /// `User-Agent` sent with every request.
    pub user_agent: String,
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder(base_url: impl Into<String>) -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig {
                base_url: base_url.into(),
                output_dir: PathBuf::from("."),
                overwrite: false,
                request_timeout_secs: None,
                user_agent: concat!("pdftools-client/", env!("CARGO_PKG_VERSION")).to_string(),
            },
        }
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ClientConfig, ClientError> {
        let base = self.config.base_url.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err(ClientError::InvalidConfig(format!(
                "backend URL is empty; pass --api-base or set {API_BASE_ENV}"
            )));
        }

        let parsed = reqwest::Url::parse(&base).map_err(|e| {
            ClientError::InvalidConfig(format!("backend URL '{base}' is not a valid URL: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "backend URL must be http:// or https://, got '{base}'"
            )));
        }
        if parsed.query().is_some() {
            return Err(ClientError::InvalidConfig(format!(
                "backend URL must not carry a query string: '{base}'"
            )));
        }
        if self.config.request_timeout_secs == Some(0) {
            return Err(ClientError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }

        self.config.base_url = base;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::builder("http://localhost:5000/api").build().unwrap();
        assert_eq!(c.output_dir, PathBuf::from("."));
        assert!(!c.overwrite);
        assert_eq!(c.request_timeout_secs, None);
        assert!(c.user_agent.starts_with("pdftools-client/"));
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let c = ClientConfig::builder(" https://pdf.example.com/api/ ").build().unwrap();
        assert_eq!(c.base_url, "https://pdf.example.com/api");
    }

    #[test]
    fn rejects_empty_and_non_http() {
        assert!(matches!(
            ClientConfig::builder("").build(),
            Err(ClientError::InvalidConfig(_))
        ));
        assert!(ClientConfig::builder("ftp://files.example.com").build().is_err());
        assert!(ClientConfig::builder("localhost:5000").build().is_err());
    }

    #[test]
    fn rejects_query_and_zero_timeout() {
        assert!(ClientConfig::builder("http://h/api?x=1").build().is_err());
        assert!(ClientConfig::builder("http://h/api")
            .request_timeout_secs(0)
            .build()
            .is_err());
    }
}

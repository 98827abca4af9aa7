//! Saving a result to disk.
//!
//! The payload is staged in a temporary file next to the target and then
//! renamed into place, so a reader never sees a half-written result. The
//! staging file is owned by a [`tempfile::NamedTempFile`] guard: it is
//! removed when the guard drops unless the rename consumed it, which covers
//! write errors, rename errors and panics alike.

use crate::error::ClientError;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persists a successful payload under a suggested name.
#[async_trait]
pub trait Saver: Send + Sync {
    /// Save `payload` and return the path it was written to.
    async fn save(&self, payload: Bytes, filename: &str) -> Result<PathBuf, ClientError>;
}

/// [`Saver`] writing into a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSaver {
    dir: PathBuf,
    overwrite: bool,
}

impl FileSaver {
    pub fn new(dir: impl Into<PathBuf>, overwrite: bool) -> Self {
        Self {
            dir: dir.into(),
            overwrite,
        }
    }
}

#[async_trait]
impl Saver for FileSaver {
    async fn save(&self, payload: Bytes, filename: &str) -> Result<PathBuf, ClientError> {
        let dir = self.dir.clone();
        let filename = filename.to_string();
        let overwrite = self.overwrite;

        tokio::task::spawn_blocking(move || save_blocking(&dir, &filename, &payload, overwrite))
            .await
            .map_err(|e| ClientError::OutputWriteFailed {
                path: self.dir.join("<pending>"),
                source: std::io::Error::other(e.to_string()),
            })?
    }
}

fn save_blocking(
    dir: &Path,
    filename: &str,
    payload: &[u8],
    overwrite: bool,
) -> Result<PathBuf, ClientError> {
    let write_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| ClientError::OutputWriteFailed { path, source }
    };

    std::fs::create_dir_all(dir).map_err(write_err(dir))?;

    let mut staged = tempfile::Builder::new()
        .prefix(".pdftools-")
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(write_err(dir))?;
    debug!("Staging {} bytes in {}", payload.len(), staged.path().display());

    staged.write_all(payload).map_err(write_err(staged.path()))?;
    staged.flush().map_err(write_err(staged.path()))?;

    let target = if overwrite {
        let target = dir.join(filename);
        // On failure the returned guard is dropped here and the staged file removed.
        staged
            .persist(&target)
            .map_err(|e| write_err(&target)(e.error))?;
        target
    } else {
        persist_unique(staged, dir, filename)?
    };

    info!("Saved {} bytes to {}", payload.len(), target.display());
    Ok(target)
}

/// Rename into the first free name of `name`, `name (1)`, `name (2)`, …
fn persist_unique(
    mut staged: tempfile::NamedTempFile,
    dir: &Path,
    filename: &str,
) -> Result<PathBuf, ClientError> {
    let (stem, ext) = split_extension(filename);
    let mut n = 0u32;
    loop {
        let candidate = if n == 0 {
            dir.join(filename)
        } else {
            dir.join(format!("{stem} ({n}){ext}"))
        };
        match staged.persist_noclobber(&candidate) {
            Ok(_) => return Ok(candidate),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists && n < 9999 => {
                staged = e.file;
                n += 1;
            }
            Err(e) => {
                return Err(ClientError::OutputWriteFailed {
                    path: candidate,
                    source: e.error,
                })
            }
        }
    }
}

/// `"report.pdf"` → `("report", ".pdf")`; dotfiles and bare names keep no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftovers(dir: &Path) -> Vec<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".part"))
            .collect()
    }

    #[test]
    fn split_extension_cases() {
        assert_eq!(split_extension("merged.pdf"), ("merged", ".pdf"));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_extension("README"), ("README", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
    }

    #[tokio::test]
    async fn saves_payload_verbatim() {
        let dir = TempDir::new().unwrap();
        let saver = FileSaver::new(dir.path(), false);
        let path = saver
            .save(Bytes::from_static(b"\x00\x01binary"), "out.zip")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("out.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\x00\x01binary");
        assert!(leftovers(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn existing_file_gets_numbered_suffix() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("merged.pdf"), b"old").unwrap();
        let saver = FileSaver::new(dir.path(), false);

        let first = saver.save(Bytes::from_static(b"new1"), "merged.pdf").await.unwrap();
        let second = saver.save(Bytes::from_static(b"new2"), "merged.pdf").await.unwrap();

        assert_eq!(first, dir.path().join("merged (1).pdf"));
        assert_eq!(second, dir.path().join("merged (2).pdf"));
        assert_eq!(std::fs::read(dir.path().join("merged.pdf")).unwrap(), b"old");
    }

    #[tokio::test]
    async fn overwrite_replaces_existing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("output.txt"), b"old").unwrap();
        let saver = FileSaver::new(dir.path(), true);
        let path = saver.save(Bytes::from_static(b"new"), "output.txt").await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"new");
    }

    #[tokio::test]
    async fn creates_missing_output_dir() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b");
        let saver = FileSaver::new(&nested, false);
        let path = saver.save(Bytes::from_static(b"x"), "r.txt").await.unwrap();
        assert!(path.starts_with(&nested));
    }

    #[tokio::test]
    async fn dot_named_suggestion_saves_under_fallback() {
        use crate::filename::resolve_filename;
        use reqwest::header::{HeaderMap, HeaderValue, CONTENT_DISPOSITION};

        for (suggested, overwrite) in [(".", false), ("..", false), ("..", true)] {
            let dir = TempDir::new().unwrap();
            let mut headers = HeaderMap::new();
            headers.insert(
                CONTENT_DISPOSITION,
                HeaderValue::from_str(&format!("attachment; filename=\"{suggested}\"")).unwrap(),
            );
            let name = resolve_filename(&headers, "merged.pdf");
            let saver = FileSaver::new(dir.path(), overwrite);

            let path = saver.save(Bytes::from_static(b"%PDF"), &name).await.unwrap();

            assert_eq!(path, dir.path().join("merged.pdf"));
            assert_eq!(std::fs::read(&path).unwrap(), b"%PDF");
        }
    }

    #[tokio::test]
    async fn staged_file_is_removed_when_rename_fails() {
        let dir = TempDir::new().unwrap();
        // A directory squatting on the target name makes the rename fail.
        std::fs::create_dir(dir.path().join("output.docx")).unwrap();
        std::fs::write(dir.path().join("output.docx/keep"), b"x").unwrap();
        let saver = FileSaver::new(dir.path(), true);

        let err = saver
            .save(Bytes::from_static(b"docx"), "output.docx")
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::OutputWriteFailed { .. }));
        assert!(leftovers(dir.path()).is_empty());
    }
}

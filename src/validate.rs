//! Input validation: decide whether a selection may be submitted.
//!
//! Validation is the only gate in front of the network. Everything here is
//! decided locally; a rejection means no request is built and nothing is
//! sent. The only outside world consulted is the local filesystem, to make
//! sure each selected path is a readable regular file.

use crate::error::ValidationError;
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// The files selected for one submission, in the order given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    files: Vec<PathBuf>,
}

impl InputSet {
    pub fn new<I, P>(files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            files: files.into_iter().map(Into::into).collect(),
        }
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Split bounds exactly as the user entered them.
///
/// `None` means the field was left empty or did not hold a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageBounds {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl PageBounds {
    pub fn new(from: Option<i64>, to: Option<i64>) -> Self {
        Self { from, to }
    }

    /// Read bounds from free-form text fields.
    pub fn parse(from: &str, to: &str) -> Self {
        Self {
            from: from.trim().parse().ok(),
            to: to.trim().parse().ok(),
        }
    }
}

/// A validated, 1-based, inclusive page range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    pub from: u64,
    pub to: u64,
}

/// Check a selection against the rules of `op`.
///
/// Returns the validated page range for split (and `None` for every other
/// operation), or the reason the selection was rejected.
pub fn validate(
    op: Operation,
    inputs: &InputSet,
    bounds: Option<&PageBounds>,
) -> Result<Option<PageRange>, ValidationError> {
    let spec = op.spec();

    if inputs.len() < spec.min_files {
        return Err(ValidationError::TooFewFiles {
            operation: spec.label,
            noun: spec.noun,
            required: spec.min_files,
            got: inputs.len(),
        });
    }
    if let Some(max) = spec.max_files {
        if inputs.len() > max {
            return Err(ValidationError::TooManyFiles {
                operation: spec.label,
                got: inputs.len(),
            });
        }
    }

    let range = match op {
        Operation::Split => Some(validate_range(bounds.copied().unwrap_or_default())?),
        _ => None,
    };

    for path in inputs.files() {
        check_file(op, path)?;
    }

    Ok(range)
}

fn validate_range(bounds: PageBounds) -> Result<PageRange, ValidationError> {
    let from = bounds
        .from
        .ok_or(ValidationError::MissingBound { bound: "from" })?;
    let to = bounds.to.ok_or(ValidationError::MissingBound { bound: "to" })?;

    if from < 1 {
        return Err(ValidationError::NonPositiveBound {
            bound: "from",
            value: from,
        });
    }
    if to < 1 {
        return Err(ValidationError::NonPositiveBound {
            bound: "to",
            value: to,
        });
    }
    if from > to {
        return Err(ValidationError::InvertedRange { from, to });
    }

    // Both bounds are ≥ 1 here, so the casts cannot wrap.
    Ok(PageRange {
        from: from as u64,
        to: to as u64,
    })
}

fn check_file(op: Operation, path: &Path) -> Result<(), ValidationError> {
    if !path.is_file() {
        return Err(ValidationError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    if !op.accepts_extension(ext) {
        warn!(
            "{}: '{}' does not look like a {} (sending anyway)",
            op.spec().label,
            path.display(),
            op.spec().noun
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, b"%PDF-1.7\n").unwrap();
        p
    }

    fn bounds(from: i64, to: i64) -> PageBounds {
        PageBounds::new(Some(from), Some(to))
    }

    #[test]
    fn merge_needs_two_files() {
        let dir = TempDir::new().unwrap();
        let one = InputSet::new([touch(&dir, "a.pdf")]);
        let err = validate(Operation::Merge, &one, None).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooFewFiles { required: 2, got: 1, .. }
        ));

        let two = InputSet::new([touch(&dir, "a.pdf"), touch(&dir, "b.pdf")]);
        assert_eq!(validate(Operation::Merge, &two, None), Ok(None));
    }

    #[test]
    fn ocr_needs_one_image() {
        let err = validate(Operation::Ocr, &InputSet::default(), None).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooFewFiles { required: 1, got: 0, .. }
        ));
    }

    #[test]
    fn single_file_operations_reject_empty_and_extra() {
        let dir = TempDir::new().unwrap();
        let two = InputSet::new([touch(&dir, "a.pdf"), touch(&dir, "b.pdf")]);
        for op in [Operation::ToText, Operation::ToDocx] {
            assert!(validate(op, &InputSet::default(), None).is_err());
            assert_eq!(
                validate(op, &two, None),
                Err(ValidationError::TooManyFiles {
                    operation: op.spec().label,
                    got: 2
                })
            );
        }
    }

    #[test]
    fn split_rejects_bad_ranges() {
        let dir = TempDir::new().unwrap();
        let one = InputSet::new([touch(&dir, "doc.pdf")]);

        let cases = [
            (bounds(3, 1), ValidationError::InvertedRange { from: 3, to: 1 }),
            (
                bounds(0, 2),
                ValidationError::NonPositiveBound { bound: "from", value: 0 },
            ),
            (
                bounds(1, -4),
                ValidationError::NonPositiveBound { bound: "to", value: -4 },
            ),
            (
                PageBounds::parse("", "3"),
                ValidationError::MissingBound { bound: "from" },
            ),
            (
                PageBounds::parse("2", "abc"),
                ValidationError::MissingBound { bound: "to" },
            ),
        ];
        for (b, expected) in cases {
            assert_eq!(validate(Operation::Split, &one, Some(&b)), Err(expected));
        }
        assert_eq!(
            validate(Operation::Split, &one, None),
            Err(ValidationError::MissingBound { bound: "from" })
        );
    }

    #[test]
    fn split_accepts_equal_bounds() {
        let dir = TempDir::new().unwrap();
        let one = InputSet::new([touch(&dir, "doc.pdf")]);
        let range = validate(Operation::Split, &one, Some(&bounds(4, 4))).unwrap();
        assert_eq!(range, Some(PageRange { from: 4, to: 4 }));
    }

    #[test]
    fn split_without_file_is_rejected_before_range() {
        let err = validate(Operation::Split, &InputSet::default(), Some(&bounds(3, 1)))
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooFewFiles { .. }));
    }

    #[test]
    fn missing_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let ghost = dir.path().join("ghost.pdf");
        let err = validate(Operation::ToText, &InputSet::new([&ghost]), None).unwrap_err();
        assert_eq!(err, ValidationError::FileNotFound { path: ghost });
    }

    #[test]
    fn unexpected_extension_is_only_a_warning() {
        let dir = TempDir::new().unwrap();
        let scan = touch(&dir, "scan.pdf");
        assert_eq!(validate(Operation::Ocr, &InputSet::new([scan]), None), Ok(None));
    }
}

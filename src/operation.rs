//! The five remote operations and their request table.
//!
//! Every operation goes through the same submission path; what differs is
//! captured once in [`OperationSpec`]: endpoint, multipart field name, file
//! count bounds, the file types the panel offers, and the name to save under
//! when the server does not suggest one.

use crate::validate::PageRange;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A document operation offered by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Merge,
    Split,
    ToText,
    ToDocx,
    Ocr,
}

const PDF_TYPES: &[&str] = &["pdf"];
const IMAGE_TYPES: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

/// Static description of how one [`Operation`] is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    /// Path appended to the configured base URL, e.g. `/merge`.
    pub path: &'static str,
    /// Multipart field name: `files` when repeated, `file` otherwise.
    pub field: &'static str,
    pub min_files: usize,
    /// `None` means unbounded.
    pub max_files: Option<usize>,
    /// Lower-case file extensions the panel offers.
    pub accepts: &'static [&'static str],
    /// Human label used in messages ("Merge", "Split", …).
    pub label: &'static str,
    /// What the inputs are called in messages.
    pub noun: &'static str,
    /// Message used when a fault carries no text of its own.
    pub failure_fallback: &'static str,
    /// Save name when the response has no usable `content-disposition`.
    /// `{from}` and `{to}` are replaced with the split bounds.
    pub fallback_name: &'static str,
}

static MERGE: OperationSpec = OperationSpec {
    path: "/merge",
    field: "files",
    min_files: 2,
    max_files: None,
    accepts: PDF_TYPES,
    label: "Merge",
    noun: "PDF files",
    failure_fallback: "Merge failed",
    fallback_name: "merged.pdf",
};

static SPLIT: OperationSpec = OperationSpec {
    path: "/split",
    field: "file",
    min_files: 1,
    max_files: Some(1),
    accepts: PDF_TYPES,
    label: "Split",
    noun: "PDF file",
    failure_fallback: "Split failed",
    fallback_name: "split-{from}-{to}.zip",
};

static TO_TEXT: OperationSpec = OperationSpec {
    path: "/pdf-to-txt",
    field: "file",
    min_files: 1,
    max_files: Some(1),
    accepts: PDF_TYPES,
    label: "PDF to text",
    noun: "PDF file",
    failure_fallback: "Text conversion failed",
    fallback_name: "output.txt",
};

static TO_DOCX: OperationSpec = OperationSpec {
    path: "/pdf-to-docx",
    field: "file",
    min_files: 1,
    max_files: Some(1),
    accepts: PDF_TYPES,
    label: "PDF to Word",
    noun: "PDF file",
    failure_fallback: "Word conversion failed",
    fallback_name: "output.docx",
};

static OCR: OperationSpec = OperationSpec {
    path: "/ocr",
    field: "files",
    min_files: 1,
    max_files: None,
    accepts: IMAGE_TYPES,
    label: "OCR",
    noun: "image",
    failure_fallback: "OCR failed",
    fallback_name: "ocr-results.zip",
};

impl Operation {
    /// All operations, in panel order.
    pub const ALL: [Operation; 5] = [
        Operation::Merge,
        Operation::Split,
        Operation::ToText,
        Operation::ToDocx,
        Operation::Ocr,
    ];

    pub fn spec(self) -> &'static OperationSpec {
        match self {
            Operation::Merge => &MERGE,
            Operation::Split => &SPLIT,
            Operation::ToText => &TO_TEXT,
            Operation::ToDocx => &TO_DOCX,
            Operation::Ocr => &OCR,
        }
    }

    /// Canonical kebab-case name, as used on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Operation::Merge => "merge",
            Operation::Split => "split",
            Operation::ToText => "to-text",
            Operation::ToDocx => "to-docx",
            Operation::Ocr => "ocr",
        }
    }

    /// Save name used when the server does not suggest one.
    pub fn fallback_filename(self, range: Option<PageRange>) -> String {
        let template = self.spec().fallback_name;
        match range {
            Some(r) => template
                .replace("{from}", &r.from.to_string())
                .replace("{to}", &r.to.to_string()),
            None => template.to_string(),
        }
    }

    /// Whether `ext` (without the dot, any case) is offered by this panel.
    pub fn accepts_extension(self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.spec().accepts.iter().any(|a| *a == ext)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Operation::Merge),
            "split" => Ok(Operation::Split),
            "to-text" | "txt" | "pdf-to-txt" => Ok(Operation::ToText),
            "to-docx" | "docx" | "pdf-to-docx" => Ok(Operation::ToDocx),
            "ocr" => Ok(Operation::Ocr),
            other => Err(format!(
                "unknown tool '{other}' (expected one of: merge, split, to-text, to-docx, ocr)"
            )),
        }
    }
}

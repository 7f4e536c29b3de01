//! Error types for the booklet2json library.
//!
//! Three error types cover three failure scopes:
//!
//! * [`SelectionError`] — the book or page selection string is malformed.
//!   Reported before any extraction starts; the whole invocation aborts.
//!
//! * [`ExtractError`] — **fatal for one book**: the source is missing or
//!   unparsable, a requested page does not exist, or the output cannot be
//!   written. The batch runner records it and moves on to the next book.
//!
//! * [`PageWarning`] — **non-fatal**: one page's text or one image failed.
//!   Stored in the book outcome; the book still completes.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed book or page selection string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    /// A token is neither an integer nor a well-formed `a-b` range.
    #[error("Invalid selection token '{token}': {reason}")]
    InvalidToken { token: String, reason: String },

    /// The selection contained no tokens at all.
    #[error("Selection '{input}' names no books")]
    Empty { input: String },
}

/// Fatal errors for a single book.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Source errors ─────────────────────────────────────────────────────
    /// Source PDF was not found (or could not be opened for reading).
    #[error("Source PDF not found: '{path}' ({reason})")]
    SourceNotFound { path: PathBuf, reason: String },

    /// The source exists but cannot be parsed as a PDF.
    #[error("Cannot parse '{path}': {detail}")]
    DocumentParse { path: PathBuf, detail: String },

    /// A requested page is outside `1..=total`.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: u32, total: u32 },

    // ── Stored output errors ──────────────────────────────────────────────
    /// An existing `data/{book}.json` could not be read back. Left untouched.
    #[error("Existing output '{path}' is unreadable, refusing to overwrite: {detail}")]
    PriorOutputInvalid { path: PathBuf, detail: String },

    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not write the JSON line to the stdout sink.
    #[error("Failed to emit JSON for book {book}: {source}")]
    EmitFailed {
        book: u32,
        #[source]
        source: std::io::Error,
    },

    /// `data/index.json` exists but is not a valid catalogue.
    #[error("Cannot read catalogue '{path}': {detail}")]
    CatalogueInvalid { path: PathBuf, detail: String },

    // ── Configuration / backend errors ────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Place libpdfium next to the binary, install it system-wide,\n\
or set PDFIUM_LIB_PATH to the directory containing it."
    )]
    PdfiumBindingFailed(String),
}

/// A recovered, per-page problem.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageWarning {
    /// Text extraction failed; the page was recorded with empty text.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextExtraction { page: u32, detail: String },

    /// Rendering or saving an image failed; the image was omitted.
    #[error("Page {page}: rendering '{image}' failed: {detail}")]
    Render {
        page: u32,
        image: String,
        detail: String,
    },
}

impl PageWarning {
    /// The page the warning refers to.
    pub fn page(&self) -> u32 {
        match self {
            PageWarning::TextExtraction { page, .. } | PageWarning::Render { page, .. } => *page,
        }
    }
}

//! # booklet2json
//!
//! Extract text and page images from PDF booklets into editable JSON.
//!
//! Each book `N` is read from `downloads/N.pdf` and written to
//! `data/N.json` as `{pages, elements}`: one record per page with its text
//! and rendered image, plus a list of inclusive page ranges ("elements")
//! that group pages into pieces. After the first run the JSON belongs to a
//! human editor. Re-running refreshes page text and images but keeps the
//! edited element ranges, authors and page notes.
//!
//! ## Pipeline Overview
//!
//! ```text
//! downloads/N.pdf
//!  │
//!  ├─ 1. Input    check the file exists and starts with %PDF
//!  ├─ 2. Source   open through pdfium, count pages, check the subset
//!  ├─ 3. Text     per-page text, cleaned (line endings, folios, invisibles)
//!  ├─ 4. Render   page_{n}.png, title.png, title_small.png
//!  ├─ 5. Elements default partition on a first run
//!  ├─ 6. Merge    carry stored elements and notes forward
//!  └─ 7. Store    atomic write of data/N.json (or one JSON line to stdout)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use booklet2json::{plan_jobs, run_batch, DataLayout, ExtractOptions, PdfiumBackend};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = PdfiumBackend::bind()?;
//!     let jobs = plan_jobs("1,3-5", None)?;
//!     let options = ExtractOptions::default();
//!     let report = run_batch(&backend, &jobs, &options, &DataLayout::default(), &mut std::io::stdout());
//!     eprintln!("{} ok, {} failed", report.succeeded(), report.failed());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `booklet2json` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! booklet2json = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod catalogue;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod selection;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use catalogue::{Catalogue, IndexEntry};
pub use config::{
    DataLayout, ElementStrategy, ExtractOptions, ExtractOptionsBuilder, MergePolicy, OutputMode,
};
pub use error::{ExtractError, PageWarning, SelectionError};
pub use extract::{extract_book, process_book, run_batch};
pub use output::{
    BatchReport, BookExtraction, BookJson, BookOutcome, Element, ElementType, PageRecord,
};
pub use pipeline::source::{DocumentBackend, LayoutLine, PageLayout, PageSource, PdfiumBackend};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use selection::{
    format_selection, parse_books, parse_pages, plan_jobs, BookJob, PageSubset, MAX_RANGE_SPAN,
};

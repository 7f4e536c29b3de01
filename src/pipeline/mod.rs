//! Pipeline stages for booklet extraction.
//!
//! Each submodule implements one step; [`crate::extract`] strings them
//! together per book.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ source ──▶ text ──▶ render ──▶ elements ──▶ merge ──▶ store
//! (path)    (pdfium)   (clean)  (PNG)      (ranges)     (prior)   (atomic)
//! ```
//!
//! 1. [`input`]    — check the source path exists and looks like a PDF
//! 2. [`source`]   — the document capability traits and the pdfium backend
//! 3. [`text`]     — deterministic cleanup of extracted page text
//! 4. [`render`]   — rasterise a page at a scale and save it as PNG
//! 5. [`classify`] — page-type and continuation heuristics
//! 6. [`elements`] — default element partitions for a first run
//! 7. [`merge`]    — combine fresh pages with stored output
//! 8. [`store`]    — load stored output, write JSON atomically

pub mod classify;
pub mod elements;
pub mod input;
pub mod merge;
pub mod render;
pub mod source;
pub mod store;
pub mod text;

//! Progress-callback trait for per-book and per-page extraction events.
//!
//! Inject an [`Arc<dyn ExtractionProgressCallback>`] via
//! [`crate::config::ExtractOptionsBuilder::progress_callback`] to follow a
//! batch as it runs. The CLI uses this to drive its progress bar; library
//! callers can forward events wherever they like.
//!
//! # Example
//!
//! ```rust
//! use booklet2json::{ExtractionProgressCallback, ExtractOptions};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter(AtomicUsize);
//!
//! impl ExtractionProgressCallback for PageCounter {
//!     fn on_page_complete(&self, _book: u32, _page: u32, _done: usize, _total: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let options = ExtractOptions::builder()
//!     .progress_callback(Arc::new(PageCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PageWarning;
use std::sync::Arc;

/// Called by the batch runner as it processes books and pages.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive in processing order: books in
/// selection order, pages ascending within a book.
pub trait ExtractionProgressCallback: Send + Sync {
    /// Called once before the first book.
    fn on_batch_start(&self, total_books: usize) {
        let _ = total_books;
    }

    /// Called once the book's document is open and its page set is known.
    ///
    /// # Arguments
    /// * `book`        — book id
    /// * `total_pages` — pages that will be extracted (the working set)
    fn on_book_start(&self, book: u32, total_pages: usize) {
        let _ = (book, total_pages);
    }

    /// Called after a page's text (and image, if requested) is done.
    ///
    /// # Arguments
    /// * `page`  — 1-based page number
    /// * `done`  — pages finished so far in this book
    /// * `total` — size of the working set
    fn on_page_complete(&self, book: u32, page: u32, done: usize, total: usize) {
        let _ = (book, page, done, total);
    }

    /// Called for every recovered per-page problem.
    fn on_page_warning(&self, book: u32, warning: &PageWarning) {
        let _ = (book, warning);
    }

    /// Called after the book's JSON has been written or emitted.
    fn on_book_complete(&self, book: u32, pages: usize) {
        let _ = (book, pages);
    }

    /// Called when a book fails fatally.
    fn on_book_failed(&self, book: u32, error: &str) {
        let _ = (book, error);
    }

    /// Called once after every book has been attempted.
    fn on_batch_complete(&self, succeeded: usize, failed: usize) {
        let _ = (succeeded, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ExtractionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ExtractOptions`].
pub type ProgressCallback = Arc<dyn ExtractionProgressCallback>;

//! Extraction entry points: one book in memory, one book on disk, a batch.
//!
//! ## Layers
//!
//! * [`extract_book`] is the engine. It takes an opened document and the
//!   stored output as explicit inputs and returns the merged [`BookJson`].
//!   It renders images but never touches `data/{book}.json`.
//! * [`process_book`] wraps it with the filesystem: resolve the source,
//!   load stored output, open the document, then write or emit the result.
//! * [`run_batch`] runs books sequentially in selection order. A fatal
//!   error in one book is recorded and the next book still runs.

use crate::config::{DataLayout, ElementStrategy, ExtractOptions, OutputMode};
use crate::error::{ExtractError, PageWarning};
use crate::output::{BatchReport, BookExtraction, BookJson, BookOutcome, PageRecord};
use crate::pipeline::elements::{self, PageHints, PageLayouts};
use crate::pipeline::render::{self, TITLE_IMAGE, TITLE_SMALL_IMAGE};
use crate::pipeline::source::{DocumentBackend, PageSource};
use crate::pipeline::{input, merge, store, text};
use crate::selection::BookJob;
use std::io::Write;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract one book from an opened document.
///
/// # Arguments
/// * `doc`    — the opened source document
/// * `job`    — book id and optional page subset
/// * `prior`  — the book's stored output, if any; its `elements` are kept
///   unless `options.reset_elements` is set
/// * `layout` — where page and title images go
///
/// # Errors
/// [`ExtractError::PageOutOfRange`] when the subset names a page outside
/// `1..=page_count`. This is checked before anything is rendered.
/// Per-page failures are not errors; they are returned in
/// [`BookExtraction::warnings`].
pub fn extract_book(
    doc: &dyn PageSource,
    job: &BookJob,
    options: &ExtractOptions,
    prior: Option<BookJson>,
    layout: &DataLayout,
) -> Result<BookExtraction, ExtractError> {
    let book = job.book;
    let total = doc.page_count();

    // ── Step 1: Page set ─────────────────────────────────────────────────
    let page_set: Vec<u32> = match &job.pages {
        Some(subset) => {
            if let Some(bad) = subset.iter().find(|&p| p < 1 || p > total) {
                return Err(ExtractError::PageOutOfRange { page: bad, total });
            }
            subset.iter().collect()
        }
        None => (1..=total).collect(),
    };
    info!(
        "Book {}: extracting {} of {} pages",
        book,
        page_set.len(),
        total
    );

    let cb = options.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_book_start(book, page_set.len());
    }

    // ── Step 2: Pages ────────────────────────────────────────────────────
    let mut warnings: Vec<PageWarning> = Vec::new();
    let mut record_warning = |w: PageWarning| {
        warn!("Book {}: {}", book, w);
        if let Some(cb) = cb {
            cb.on_page_warning(book, &w);
        }
        warnings.push(w);
    };

    let heuristic = options.element_strategy == ElementStrategy::Heuristic;
    let mut fresh: Vec<PageRecord> = Vec::with_capacity(page_set.len());
    let mut layouts = PageLayouts::new();
    for (i, &page) in page_set.iter().enumerate() {
        let raw = doc.page_text(page).unwrap_or_else(|w| {
            record_warning(w);
            String::new()
        });
        let cleaned = text::clean_page_text(&raw, options.strip_page_numbers);
        let mut record = PageRecord::new(page, cleaned);

        if heuristic {
            if let Some(page_layout) = doc.page_layout(page) {
                layouts.insert(page, page_layout);
            }
        }

        if options.render_images {
            let name = render::page_image_name(page);
            let path = layout.image_path(book, &name);
            match render::render_png(doc, page, options.scale, &path, &name) {
                Ok(()) => record.image = Some(layout.image_rel(book, &name)),
                Err(w) => record_warning(w),
            }
        }

        debug!(
            "Book {}: page {} done ({} chars)",
            book,
            page,
            record.text.len()
        );
        fresh.push(record);
        if let Some(cb) = cb {
            cb.on_page_complete(book, page, i + 1, page_set.len());
        }
    }

    // ── Step 3: Title images ─────────────────────────────────────────────
    if options.render_images && total >= 1 {
        for (name, scale) in [
            (TITLE_IMAGE, options.title_scale),
            (TITLE_SMALL_IMAGE, options.title_small_scale),
        ] {
            let path = layout.image_path(book, name);
            if let Err(w) = render::render_png(doc, 1, scale, &path, name) {
                record_warning(w);
            }
        }
    }

    // ── Step 4: Elements and merge ───────────────────────────────────────
    let hints = if heuristic {
        elements::gather_hints(&mut fresh, &layouts)
    } else {
        PageHints::default()
    };

    let (json, elements_preserved) = match prior {
        None => {
            let elements =
                elements::default_elements(&fresh, &hints, options.element_strategy);
            (
                BookJson {
                    pages: fresh,
                    elements,
                },
                false,
            )
        }
        Some(prior) => {
            let mut merged = merge::merge_with_prior(
                fresh,
                prior,
                options.merge_policy,
                job.pages.is_some(),
            );
            if options.reset_elements {
                info!("Book {}: regenerating elements", book);
                merged.elements = elements::default_elements(
                    &merged.pages,
                    &hints,
                    options.element_strategy,
                );
                (merged, false)
            } else {
                (merged, true)
            }
        }
    };

    Ok(BookExtraction {
        book,
        json,
        warnings,
        elements_preserved,
    })
}

/// Extract one book from `layout` and write or emit its JSON.
///
/// Stored output is loaded before the document is opened; if it exists but
/// cannot be parsed the book fails and the file is left as it was.
/// In [`OutputMode::Stdout`] the JSON goes to `sink` as one compact line.
pub fn process_book(
    backend: &dyn DocumentBackend,
    job: &BookJob,
    options: &ExtractOptions,
    layout: &DataLayout,
    sink: &mut dyn Write,
) -> Result<BookExtraction, ExtractError> {
    let source = layout.source_path(job.book);
    input::resolve_source(&source)?;

    let json_path = layout.json_path(job.book);
    let prior = store::load_prior(&json_path)?;
    if prior.is_some() {
        debug!("Book {}: found stored output", job.book);
    }

    let doc = backend.open(&source)?;
    let extraction = extract_book(doc.as_ref(), job, options, prior, layout)?;

    match options.output_mode {
        OutputMode::File => store::write_book_json(&json_path, &extraction.json)?,
        OutputMode::Stdout => {
            let emit_err = |source: std::io::Error| ExtractError::EmitFailed {
                book: job.book,
                source,
            };
            let line = serde_json::to_string(&extraction.json)
                .map_err(|e| emit_err(std::io::Error::from(e)))?;
            writeln!(sink, "{line}").map_err(emit_err)?;
            sink.flush().map_err(emit_err)?;
        }
    }

    Ok(extraction)
}

/// Process `jobs` in order, isolating failures per book.
///
/// Never fails as a whole: inspect [`BatchReport::has_failures`].
pub fn run_batch(
    backend: &dyn DocumentBackend,
    jobs: &[BookJob],
    options: &ExtractOptions,
    layout: &DataLayout,
    sink: &mut dyn Write,
) -> BatchReport {
    let start = Instant::now();
    let cb = options.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_batch_start(jobs.len());
    }

    let mut outcomes = Vec::with_capacity(jobs.len());
    for job in jobs {
        let book = job.book;
        match process_book(backend, job, options, layout, sink) {
            Ok(extraction) => {
                let output = match options.output_mode {
                    OutputMode::File => Some(layout.json_path(book)),
                    OutputMode::Stdout => None,
                };
                let pages = extraction.json.pages.len();
                info!(
                    "Book {}: {} pages, {} elements{}, {} warnings",
                    book,
                    pages,
                    extraction.json.elements.len(),
                    if extraction.elements_preserved {
                        " (preserved)"
                    } else {
                        ""
                    },
                    extraction.warnings.len()
                );
                if let Some(cb) = cb {
                    cb.on_book_complete(book, pages);
                }
                outcomes.push(BookOutcome::Succeeded {
                    book,
                    pages,
                    elements: extraction.json.elements.len(),
                    elements_preserved: extraction.elements_preserved,
                    output,
                    warnings: extraction.warnings,
                });
            }
            Err(e) => {
                warn!("Book {} failed: {}", book, e);
                let error = e.to_string();
                if let Some(cb) = cb {
                    cb.on_book_failed(book, &error);
                }
                outcomes.push(BookOutcome::Failed { book, error });
            }
        }
    }

    let report = BatchReport {
        outcomes,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {} succeeded, {} failed, {}ms",
        report.succeeded(),
        report.failed(),
        report.total_duration_ms
    );
    if let Some(cb) = cb {
        cb.on_batch_complete(report.succeeded(), report.failed());
    }
    report
}

//! Document capabilities consumed by the engine, and their pdfium backend.
//!
//! The engine only ever sees [`PageSource`]: a page count, per-page text,
//! per-page rendering and, optionally, positioned lines. Tests drive it with
//! in-memory documents; production uses [`PdfiumBackend`].
//!
//! ## Binding order
//!
//! pdfium is loaded at runtime. [`PdfiumBackend::bind`] tries, in order:
//! the directory named by `PDFIUM_LIB_PATH`, the working directory, then the
//! system library search path.

use crate::error::{ExtractError, PageWarning};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Tolerance, in points, for two text segments to share a baseline.
const BASELINE_TOLERANCE: f32 = 2.0;

/// One visual line of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    pub text: String,
    /// Mean glyph size in points; `0.0` when unknown.
    pub font_size: f32,
    /// Left edge in points from the page's left side.
    pub left: f32,
}

impl LayoutLine {
    pub fn new(text: impl Into<String>, font_size: f32, left: f32) -> Self {
        Self {
            text: text.into(),
            font_size,
            left,
        }
    }
}

/// A page's non-blank lines, top to bottom.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<LayoutLine>,
}

/// An opened document, addressed by 1-based page numbers.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Raw text of page `page`.
    fn page_text(&self, page: u32) -> Result<String, PageWarning>;

    /// Rasterise page `page` at `scale` (1.0 = 72 DPI).
    ///
    /// The `image` field of a returned [`PageWarning::Render`] is filled in
    /// by the caller, which knows the target file name.
    fn render_page(&self, page: u32, scale: f32) -> Result<DynamicImage, PageWarning>;

    /// Positioned lines of page `page`, if the backend can provide them.
    ///
    /// Feeds the font-size and indentation hints of the heuristic element
    /// strategy. Without a layout those heuristics fall back to text alone.
    fn page_layout(&self, _page: u32) -> Option<PageLayout> {
        None
    }
}

/// Opens documents from paths.
pub trait DocumentBackend {
    /// Open the PDF at `path`.
    ///
    /// # Errors
    /// [`ExtractError::DocumentParse`] when the document cannot be loaded.
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, ExtractError>;
}

/// Environment variable naming a directory that contains libpdfium.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// [`DocumentBackend`] backed by a bound pdfium library.
pub struct PdfiumBackend {
    pdfium: Pdfium,
}

impl PdfiumBackend {
    /// Bind to libpdfium (see the module docs for the search order).
    pub fn bind() -> Result<Self, ExtractError> {
        let from_env = std::env::var(PDFIUM_LIB_PATH_ENV)
            .ok()
            .filter(|p| !p.is_empty());

        let bindings = match from_env {
            Some(dir) => {
                info!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, dir);
                Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
                    dir.as_str(),
                ))
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ExtractError::PdfiumBindingFailed(format!("{e:?}")))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }
}

impl DocumentBackend for PdfiumBackend {
    fn open<'a>(&'a self, path: &Path) -> Result<Box<dyn PageSource + 'a>, ExtractError> {
        let document =
            self.pdfium
                .load_pdf_from_file(path, None)
                .map_err(|e| ExtractError::DocumentParse {
                    path: path.to_path_buf(),
                    detail: format!("{e:?}"),
                })?;
        debug!(
            "Opened {} ({} pages)",
            path.display(),
            document.pages().len()
        );
        Ok(Box::new(PdfiumDocument { document }))
    }
}

/// A document loaded through pdfium.
pub struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn with_page<T>(
        &self,
        page: u32,
        f: impl FnOnce(&PdfPage) -> Result<T, String>,
    ) -> Result<T, String> {
        let index = page
            .checked_sub(1)
            .and_then(|i| u16::try_from(i).ok())
            .ok_or_else(|| format!("page {page} is not addressable"))?;
        let pdf_page = self
            .document
            .pages()
            .get(index)
            .map_err(|e| format!("{e:?}"))?;
        f(&pdf_page)
    }
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> u32 {
        self.document.pages().len() as u32
    }

    fn page_text(&self, page: u32) -> Result<String, PageWarning> {
        self.with_page(page, |p| {
            p.text()
                .map(|text| text.all())
                .map_err(|e| format!("{e:?}"))
        })
        .map_err(|detail| PageWarning::TextExtraction { page, detail })
    }

    fn render_page(&self, page: u32, scale: f32) -> Result<DynamicImage, PageWarning> {
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        self.with_page(page, |p| {
            let bitmap = p
                .render_with_config(&render_config)
                .map_err(|e| format!("{e:?}"))?;
            Ok(bitmap.as_image())
        })
        .map_err(|detail| PageWarning::Render {
            page,
            image: String::new(),
            detail,
        })
    }

    fn page_layout(&self, page: u32) -> Option<PageLayout> {
        let layout = self.with_page(page, |p| {
            let text = p.text().map_err(|e| format!("{e:?}"))?;
            Ok(collect_lines(&text))
        });
        match layout {
            Ok(layout) => Some(layout),
            Err(detail) => {
                debug!("Page {}: no layout ({})", page, detail);
                None
            }
        }
    }
}

/// A baseline's worth of segments while lines are being assembled.
struct Row {
    bottom: f32,
    parts: Vec<(f32, String)>,
    sizes: Vec<f32>,
}

/// Group text segments sharing a baseline into lines, top to bottom.
fn collect_lines(text: &PdfPageText) -> PageLayout {
    let mut rows: Vec<Row> = Vec::new();
    let segments = text.segments();

    for segment in segments.iter() {
        let content = segment.text();
        if content.trim().is_empty() {
            continue;
        }
        let bounds = segment.bounds();
        let bottom = bounds.bottom().value;
        let left = bounds.left().value;
        let sizes: Vec<f32> = segment
            .chars()
            .map(|chars| {
                chars
                    .iter()
                    .map(|c| c.scaled_font_size().value)
                    .filter(|s| *s > 0.0)
                    .collect()
            })
            .unwrap_or_default();

        match rows
            .iter_mut()
            .find(|r| (r.bottom - bottom).abs() <= BASELINE_TOLERANCE)
        {
            Some(row) => {
                row.parts.push((left, content));
                row.sizes.extend(sizes);
            }
            None => rows.push(Row {
                bottom,
                parts: vec![(left, content)],
                sizes,
            }),
        }
    }

    rows.sort_by(|a, b| b.bottom.total_cmp(&a.bottom));
    let lines = rows
        .into_iter()
        .map(|mut row| {
            row.parts.sort_by(|a, b| a.0.total_cmp(&b.0));
            let left = row.parts.first().map_or(0.0, |p| p.0);
            let text: String = row.parts.into_iter().map(|(_, t)| t).collect();
            let font_size = if row.sizes.is_empty() {
                0.0
            } else {
                row.sizes.iter().sum::<f32>() / row.sizes.len() as f32
            };
            LayoutLine::new(text.trim(), font_size, left)
        })
        .collect();
    PageLayout { lines }
}

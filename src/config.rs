//! Configuration types for booklet extraction.
//!
//! All extraction behaviour is controlled through [`ExtractOptions`], built
//! via its [`ExtractOptionsBuilder`]. The value is immutable once built and
//! handed to the engine explicitly; nothing is read from ambient state.
//!
//! [`DataLayout`] is the other half: where sources live and where output goes,
//! all derived from the book id.

use crate::error::ExtractError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Upper bound for every render scale; a 10× render of an A4 page is already
/// about 6000 × 8400 px.
pub const MAX_SCALE: f32 = 10.0;

/// Options for extracting one or more books.
///
/// # Example
/// ```rust
/// use booklet2json::{ExtractOptions, OutputMode};
///
/// let options = ExtractOptions::builder()
///     .scale(1.5)
///     .render_images(false)
///     .output_mode(OutputMode::Stdout)
///     .build()
///     .unwrap();
/// assert_eq!(options.title_scale, 4.0);
/// ```
#[derive(Clone)]
pub struct ExtractOptions {
    /// Render scale for page images. Default: 2.0.
    pub scale: f32,

    /// Render scale for `title.png` (page 1). Default: 4.0.
    pub title_scale: f32,

    /// Render scale for `title_small.png` (page 1). Default: 1.5.
    pub title_small_scale: f32,

    /// Render page and title images. Default: true.
    pub render_images: bool,

    /// Persist `data/{book}.json` or emit to the output sink. Default: file.
    pub output_mode: OutputMode,

    /// How fresh pages combine with stored output. Default: replace-all.
    pub merge_policy: MergePolicy,

    /// How the first-run element list is generated. Default: contiguous.
    pub element_strategy: ElementStrategy,

    /// Drop a trailing page-number line from extracted text. Default: true.
    pub strip_page_numbers: bool,

    /// Regenerate `elements` even when stored output has them. Default: false.
    ///
    /// This discards manual range edits; it exists for books whose first
    /// run produced a grouping not worth correcting by hand.
    pub reset_elements: bool,

    /// Optional per-book / per-page event sink.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            title_scale: 4.0,
            title_small_scale: 1.5,
            render_images: true,
            output_mode: OutputMode::default(),
            merge_policy: MergePolicy::default(),
            element_strategy: ElementStrategy::default(),
            strip_page_numbers: true,
            reset_elements: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExtractOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractOptions")
            .field("scale", &self.scale)
            .field("title_scale", &self.title_scale)
            .field("title_small_scale", &self.title_small_scale)
            .field("render_images", &self.render_images)
            .field("output_mode", &self.output_mode)
            .field("merge_policy", &self.merge_policy)
            .field("element_strategy", &self.element_strategy)
            .field("strip_page_numbers", &self.strip_page_numbers)
            .field("reset_elements", &self.reset_elements)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExtractionProgressCallback>"),
            )
            .finish()
    }
}

impl ExtractOptions {
    /// Create a new builder for `ExtractOptions`.
    pub fn builder() -> ExtractOptionsBuilder {
        ExtractOptionsBuilder {
            options: Self::default(),
        }
    }
}

/// Builder for [`ExtractOptions`].
#[derive(Debug)]
pub struct ExtractOptionsBuilder {
    options: ExtractOptions,
}

impl ExtractOptionsBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.options.scale = scale;
        self
    }

    pub fn title_scale(mut self, scale: f32) -> Self {
        self.options.title_scale = scale;
        self
    }

    pub fn title_small_scale(mut self, scale: f32) -> Self {
        self.options.title_small_scale = scale;
        self
    }

    pub fn render_images(mut self, v: bool) -> Self {
        self.options.render_images = v;
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.options.output_mode = mode;
        self
    }

    pub fn merge_policy(mut self, policy: MergePolicy) -> Self {
        self.options.merge_policy = policy;
        self
    }

    pub fn element_strategy(mut self, strategy: ElementStrategy) -> Self {
        self.options.element_strategy = strategy;
        self
    }

    pub fn strip_page_numbers(mut self, v: bool) -> Self {
        self.options.strip_page_numbers = v;
        self
    }

    pub fn reset_elements(mut self, v: bool) -> Self {
        self.options.reset_elements = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.options.progress_callback = Some(cb);
        self
    }

    /// Build the options, validating every scale.
    pub fn build(self) -> Result<ExtractOptions, ExtractError> {
        let o = &self.options;
        for (name, value) in [
            ("scale", o.scale),
            ("title-scale", o.title_scale),
            ("title-small-scale", o.title_small_scale),
        ] {
            if !value.is_finite() || value <= 0.0 || value > MAX_SCALE {
                return Err(ExtractError::InvalidConfig(format!(
                    "{name} must be in (0, {MAX_SCALE}], got {value}"
                )));
            }
        }
        Ok(self.options)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where a finished book's JSON goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Atomically write `data/{book}.json`. (default)
    #[default]
    File,
    /// Write one compact JSON line per book to the output sink; persist nothing.
    Stdout,
}

/// How freshly extracted pages combine with an existing `data/{book}.json`.
///
/// `elements` are preserved under both policies; only `pages` differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// `pages` becomes exactly the freshly extracted set. (default)
    #[default]
    ReplaceAll,
    /// Fresh pages replace same-numbered stored pages; other stored pages stay.
    /// Only differs from `ReplaceAll` when a page subset was requested.
    SpliceSubset,
}

/// How the default element list is generated on a first run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElementStrategy {
    /// One `text` element per maximal run of consecutive pages. (default)
    #[default]
    Contiguous,
    /// Classify pages and split runs where a new piece appears to start.
    Heuristic,
}

// ── Paths ────────────────────────────────────────────────────────────────

/// File layout rooted at a project directory.
///
/// ```text
/// {root}/downloads/{book}.pdf
/// {root}/data/{book}.json
/// {root}/data/images/{book}/page_{n}.png
/// {root}/data/index.json
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::new(".")
    }
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_path(&self, book: u32) -> PathBuf {
        self.root.join("downloads").join(format!("{book}.pdf"))
    }

    pub fn json_path(&self, book: u32) -> PathBuf {
        self.root.join("data").join(format!("{book}.json"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.root.join("data").join("index.json")
    }

    pub fn image_path(&self, book: u32, file_name: &str) -> PathBuf {
        self.root.join(self.image_rel(book, file_name))
    }

    /// Root-relative image path as stored in a page record.
    pub fn image_rel(&self, book: u32, file_name: &str) -> String {
        format!("data/images/{book}/{file_name}")
    }
}

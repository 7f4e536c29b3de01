//! The per-book JSON artifact and batch outcome types.
//!
//! Field order in these structs is the serialization order and is part of
//! the on-disk format: `pages` before `elements`; `page, text, image, note`
//! inside a page record; `start, end, author, type` inside an element.
//! Keys a human editor adds to a record are kept in `extra` and written back
//! after the known keys.

use crate::error::PageWarning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The persisted unit: `data/{book}.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookJson {
    pub pages: Vec<PageRecord>,
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// One extracted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// 1-based page number in the source document.
    pub page: u32,
    /// Extracted text; empty when the page has none or extraction failed.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    /// Relative path of the rendered page image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Editorial annotation, only ever written by a human.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PageRecord {
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
            image: None,
            note: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Copy the human-maintained fields of `prior` onto this record.
    pub fn carry_annotations(&mut self, prior: &PageRecord) {
        if self.note.is_none() {
            self.note = prior.note.clone();
        }
        for (k, v) in &prior.extra {
            self.extra.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }
}

/// An inclusive page range sharing one semantic grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(rename = "type")]
    pub kind: ElementType,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Element {
    pub fn new(start: u32, end: u32, kind: ElementType) -> Self {
        Self {
            start,
            end,
            author: None,
            kind,
            extra: serde_json::Map::new(),
        }
    }

    pub fn contains(&self, page: u32) -> bool {
        (self.start..=self.end).contains(&page)
    }
}

/// Element type. Unrecognised strings in stored JSON survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Text,
    Image,
    /// Imprint / colophon page (ISBN, publisher, print run).
    Tech,
    Intro,
    Title,
    Other(String),
}

impl ElementType {
    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Text => "text",
            ElementType::Image => "image",
            ElementType::Tech => "tech",
            ElementType::Intro => "intro",
            ElementType::Title => "title",
            ElementType::Other(s) => s,
        }
    }
}

impl From<String> for ElementType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "text" => ElementType::Text,
            "image" => ElementType::Image,
            "tech" => ElementType::Tech,
            "intro" => ElementType::Intro,
            "title" => ElementType::Title,
            _ => ElementType::Other(s),
        }
    }
}

impl From<ElementType> for String {
    fn from(t: ElementType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_empty<'de, D>(d: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

// ── Batch outcomes ───────────────────────────────────────────────────────

/// Result of one successfully extracted book.
#[derive(Debug, Clone, Serialize)]
pub struct BookExtraction {
    pub book: u32,
    pub json: BookJson,
    /// Recovered per-page problems, in page order.
    pub warnings: Vec<PageWarning>,
    /// Whether `elements` came from stored output rather than being generated.
    pub elements_preserved: bool,
}

/// What happened to one book in a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BookOutcome {
    Succeeded {
        book: u32,
        pages: usize,
        elements: usize,
        elements_preserved: bool,
        /// Written file, `None` in stdout mode.
        output: Option<PathBuf>,
        warnings: Vec<PageWarning>,
    },
    Failed {
        book: u32,
        error: String,
    },
}

impl BookOutcome {
    pub fn book(&self) -> u32 {
        match self {
            BookOutcome::Succeeded { book, .. } | BookOutcome::Failed { book, .. } => *book,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BookOutcome::Failed { .. })
    }
}

/// Per-book outcomes in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<BookOutcome>,
    pub total_duration_ms: u64,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_failure()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn warning_count(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o {
                BookOutcome::Succeeded { warnings, .. } => warnings.len(),
                BookOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

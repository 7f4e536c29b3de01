//! Book and page selection parsing.
//!
//! Both selections share one grammar: comma-separated tokens, each either an
//! integer (`7`) or an inclusive range (`3-6`). `1,3-6,9` selects
//! `[1, 3, 4, 5, 6, 9]`.
//!
//! Books keep their first-occurrence order (that is the processing order),
//! pages collapse into an ordered set because page output is always
//! ascending regardless of how the pages were requested.
//!
//! A single range may cover at most [`MAX_RANGE_SPAN`] ids; wider ranges are
//! rejected before anything is expanded.

use crate::error::SelectionError;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Most ids one `lo-hi` token may expand to.
pub const MAX_RANGE_SPAN: u32 = 100_000;

/// One unit of work for the extraction engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookJob {
    /// Positive book id.
    pub book: u32,
    /// Restrict extraction to these pages. `None` means every page.
    pub pages: Option<PageSubset>,
}

/// A set of 1-based page numbers, iterated in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSubset(BTreeSet<u32>);

impl PageSubset {
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().copied()
    }

    pub fn contains(&self, page: u32) -> bool {
        self.0.contains(&page)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<u32> for PageSubset {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PageSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pages: Vec<u32> = self.iter().collect();
        f.write_str(&format_selection(&pages))
    }
}

/// Parse a book selection into de-duplicated ids in first-occurrence order.
///
/// # Errors
/// [`SelectionError::InvalidToken`] for a non-integer token, a reversed or
/// oversized range, or a zero id; [`SelectionError::Empty`] when no token is present.
pub fn parse_books(input: &str) -> Result<Vec<u32>, SelectionError> {
    let mut seen = HashSet::new();
    let mut books = Vec::new();

    for (token, lo, hi) in tokens(input)? {
        if lo == 0 {
            return Err(SelectionError::InvalidToken {
                token: token.to_string(),
                reason: "book numbers must be >= 1".into(),
            });
        }
        books.extend((lo..=hi).filter(|b| seen.insert(*b)));
    }

    if books.is_empty() {
        return Err(SelectionError::Empty {
            input: input.to_string(),
        });
    }
    Ok(books)
}

/// Parse an optional page selection into a [`PageSubset`].
///
/// A missing or blank selection means "all pages" and returns `Ok(None)`.
/// Bounds against the document are checked later by the engine.
pub fn parse_pages(input: Option<&str>) -> Result<Option<PageSubset>, SelectionError> {
    let Some(input) = input.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    let subset: PageSubset = tokens(input)?
        .into_iter()
        .flat_map(|(_, lo, hi)| lo..=hi)
        .collect();

    Ok((!subset.is_empty()).then_some(subset))
}

/// Combine a book and page selection into the job list.
///
/// The page subset is applied to every selected book.
pub fn plan_jobs(books: &str, pages: Option<&str>) -> Result<Vec<BookJob>, SelectionError> {
    let books = parse_books(books)?;
    let pages = parse_pages(pages)?;
    Ok(books
        .into_iter()
        .map(|book| BookJob {
            book,
            pages: pages.clone(),
        })
        .collect())
}

/// Render ids back into selection syntax, compressing ascending runs.
///
/// Order is preserved, so `parse_books(&format_selection(ids))` yields `ids`
/// again for any duplicate-free sequence of positive ids.
pub fn format_selection(ids: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut i = 0;
    while i < ids.len() {
        let start = ids[i];
        let mut end = start;
        while i + 1 < ids.len() && end.checked_add(1) == Some(ids[i + 1]) {
            end = ids[i + 1];
            i += 1;
        }
        if end > start {
            parts.push(format!("{start}-{end}"));
        } else {
            parts.push(start.to_string());
        }
        i += 1;
    }
    parts.join(",")
}

/// Split a selection into `(token, lo, hi)` triples, skipping empty tokens.
fn tokens(input: &str) -> Result<Vec<(&str, u32, u32)>, SelectionError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|token| {
            let (lo, hi) = match token.split_once('-') {
                Some((lo, hi)) => (parse_bound(token, lo)?, parse_bound(token, hi)?),
                None => {
                    let n = parse_bound(token, token)?;
                    (n, n)
                }
            };
            if lo > hi {
                return Err(SelectionError::InvalidToken {
                    token: token.to_string(),
                    reason: format!("range start {lo} exceeds end {hi}"),
                });
            }
            if hi - lo >= MAX_RANGE_SPAN {
                return Err(SelectionError::InvalidToken {
                    token: token.to_string(),
                    reason: format!("range too large (more than {MAX_RANGE_SPAN} ids)"),
                });
            }
            Ok((token, lo, hi))
        })
        .collect()
}

fn parse_bound(token: &str, bound: &str) -> Result<u32, SelectionError> {
    bound
        .trim()
        .parse::<u32>()
        .map_err(|e| SelectionError::InvalidToken {
            token: token.to_string(),
            reason: format!("'{}' is not a number ({e})", bound.trim()),
        })
}

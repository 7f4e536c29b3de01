//! Combine freshly extracted pages with a book's stored output.
//!
//! Once `data/{book}.json` exists it is the authoritative record of human
//! edits: element ranges, authors and page notes. A re-run refreshes page
//! text and images but must carry those edits forward untouched.

use crate::config::MergePolicy;
use crate::output::{BookJson, PageRecord};
use std::collections::BTreeMap;

/// Merge `fresh` pages (ascending) into `prior` according to `policy`.
///
/// * `elements` are always taken verbatim from `prior`.
/// * `note` and unknown keys on a stored page are copied onto the fresh
///   record with the same page number.
/// * Under [`MergePolicy::SpliceSubset`] with `subset_requested`, stored
///   pages outside the fresh set are kept; otherwise `pages` is exactly the
///   fresh set.
pub fn merge_with_prior(
    mut fresh: Vec<PageRecord>,
    prior: BookJson,
    policy: MergePolicy,
    subset_requested: bool,
) -> BookJson {
    let mut prior_pages: BTreeMap<u32, PageRecord> =
        prior.pages.into_iter().map(|p| (p.page, p)).collect();

    for record in &mut fresh {
        if let Some(old) = prior_pages.remove(&record.page) {
            record.carry_annotations(&old);
        }
    }

    let pages = if policy == MergePolicy::SpliceSubset && subset_requested {
        let mut by_page: BTreeMap<u32, PageRecord> = prior_pages;
        by_page.extend(fresh.into_iter().map(|p| (p.page, p)));
        by_page.into_values().collect()
    } else {
        fresh
    };

    BookJson {
        pages,
        elements: prior.elements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{Element, ElementType};

    fn prior() -> BookJson {
        let mut p2 = PageRecord::new(2, "old two\n");
        p2.note = Some("check spelling".into());
        let mut el = Element::new(1, 2, ElementType::Text);
        el.author = Some("Иван Иванов".into());
        BookJson {
            pages: vec![
                PageRecord::new(1, "old one\n"),
                p2,
                PageRecord::new(3, "old three\n"),
            ],
            elements: vec![el, Element::new(3, 3, ElementType::Image)],
        }
    }

    #[test]
    fn replace_all_refreshes_pages_keeps_elements() {
        let fresh = vec![
            PageRecord::new(1, "new one\n"),
            PageRecord::new(2, "new two\n"),
            PageRecord::new(3, "new three\n"),
        ];
        let expected_elements = prior().elements;
        let merged = merge_with_prior(fresh, prior(), MergePolicy::ReplaceAll, false);

        assert_eq!(merged.elements, expected_elements);
        assert_eq!(merged.pages[1].text, "new two\n");
        assert_eq!(merged.pages[1].note.as_deref(), Some("check spelling"));
    }

    #[test]
    fn replace_all_with_subset_drops_other_pages() {
        let fresh = vec![PageRecord::new(2, "new two\n")];
        let merged = merge_with_prior(fresh, prior(), MergePolicy::ReplaceAll, true);
        assert_eq!(merged.pages.len(), 1);
        assert_eq!(merged.pages[0].note.as_deref(), Some("check spelling"));
    }

    #[test]
    fn splice_subset_keeps_other_pages_in_order() {
        let fresh = vec![PageRecord::new(2, "new two\n"), PageRecord::new(4, "four\n")];
        let merged = merge_with_prior(fresh, prior(), MergePolicy::SpliceSubset, true);

        let numbers: Vec<u32> = merged.pages.iter().map(|p| p.page).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
        assert_eq!(merged.pages[0].text, "old one\n");
        assert_eq!(merged.pages[1].text, "new two\n");
        assert_eq!(merged.pages[1].note.as_deref(), Some("check spelling"));
    }

    #[test]
    fn splice_without_subset_behaves_like_replace() {
        let fresh = vec![PageRecord::new(1, "only\n")];
        let merged = merge_with_prior(fresh, prior(), MergePolicy::SpliceSubset, false);
        assert_eq!(merged.pages.len(), 1);
    }
}

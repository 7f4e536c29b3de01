//! Default element partitions for a book's first run.
//!
//! Both strategies produce a contiguous, non-overlapping partition of the
//! working page set: every page lands in exactly one element, ranges are
//! ascending, and no range spans a page gap left by a subset request.

use crate::config::ElementStrategy;
use crate::output::{Element, ElementType, PageRecord};
use crate::pipeline::classify;
use crate::pipeline::source::PageLayout;
use std::collections::{BTreeMap, BTreeSet};

/// Positioned lines of the pages the backend could lay out, by page number.
pub type PageLayouts = BTreeMap<u32, PageLayout>;

/// Per-page signals for the heuristic strategy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageHints {
    /// Signatures moved out of page text.
    pub authors: BTreeMap<u32, String>,
    /// Pages whose first line is set larger than the body.
    pub titles: BTreeSet<u32>,
}

/// Move author signatures out of page text and note title-sized first lines.
///
/// Run once on freshly extracted pages when the heuristic strategy is in
/// use, whether or not elements end up being generated, so page text does
/// not depend on the presence of stored output.
pub fn gather_hints(pages: &mut [PageRecord], layouts: &PageLayouts) -> PageHints {
    let mut hints = PageHints::default();
    for record in pages.iter_mut() {
        let layout = layouts.get(&record.page);
        let (body, author) = classify::take_author(&record.text, layout);
        if let Some(author) = author {
            record.text = body;
            hints.authors.insert(record.page, author);
        }
        if layout.is_some_and(classify::title_hint) {
            hints.titles.insert(record.page);
        }
    }
    hints
}

/// Build the first-run element list for `pages` (ascending by page number).
///
/// `hints` comes from [`gather_hints`] and is ignored by the contiguous
/// strategy.
pub fn default_elements(
    pages: &[PageRecord],
    hints: &PageHints,
    strategy: ElementStrategy,
) -> Vec<Element> {
    match strategy {
        ElementStrategy::Contiguous => {
            let numbers: Vec<u32> = pages.iter().map(|p| p.page).collect();
            contiguous_runs(&numbers)
        }
        ElementStrategy::Heuristic => heuristic_partition(pages, hints),
    }
}

/// One `text` element per maximal run of consecutive page numbers.
pub fn contiguous_runs(pages: &[u32]) -> Vec<Element> {
    let mut elements: Vec<Element> = Vec::new();
    for &page in pages {
        match elements.last_mut() {
            Some(el) if el.end.checked_add(1) == Some(page) => el.end = page,
            _ => elements.push(Element::new(page, page, ElementType::Text)),
        }
    }
    elements
}

/// Classify each page and group continuing text pages.
///
/// Non-text pages (image, tech, intro, title) stand alone with no author. A
/// text page joins the open text element when it directly follows it and
/// reads as a continuation; otherwise it opens a new one.
fn heuristic_partition(pages: &[PageRecord], hints: &PageHints) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut current: Option<Element> = None;
    let mut prev: Option<&PageRecord> = None;

    for record in pages {
        let kind = classify::detect_type(&record.text);

        if kind != ElementType::Text {
            elements.extend(current.take());
            elements.push(Element::new(record.page, record.page, kind));
        } else {
            let author = hints.authors.get(&record.page).cloned();
            let title_hint = hints.titles.contains(&record.page);
            let continues = match (&current, prev) {
                (Some(open), Some(prev)) => {
                    open.end == prev.page
                        && prev.page.checked_add(1) == Some(record.page)
                        && classify::continues_previous(&prev.text, &record.text, title_hint)
                }
                _ => false,
            };

            if let Some(open) = current.as_mut().filter(|_| continues) {
                open.end = record.page;
                if open.author.is_none() {
                    open.author = author;
                }
            } else {
                elements.extend(current.take());
                let mut el = Element::new(record.page, record.page, ElementType::Text);
                el.author = author;
                current = Some(el);
            }
        }

        prev = Some(record);
    }

    elements.extend(current);
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::source::LayoutLine;

    fn ranges(elements: &[Element]) -> Vec<(u32, u32)> {
        elements.iter().map(|e| (e.start, e.end)).collect()
    }

    #[test]
    fn full_book_is_one_run() {
        let els = contiguous_runs(&[1, 2, 3, 4, 5]);
        assert_eq!(ranges(&els), vec![(1, 5)]);
        assert_eq!(els[0].kind, ElementType::Text);
        assert_eq!(els[0].author, None);
    }

    #[test]
    fn gaps_split_runs() {
        let els = contiguous_runs(&[2, 3, 5, 7, 8, 9]);
        assert_eq!(ranges(&els), vec![(2, 3), (5, 5), (7, 9)]);
    }

    #[test]
    fn empty_page_set_has_no_elements() {
        assert!(contiguous_runs(&[]).is_empty());
    }

    #[test]
    fn heuristic_splits_on_type_and_new_pieces() {
        let mut pages = vec![
            PageRecord::new(1, "Весенние стихи\n"),
            PageRecord::new(2, ""),
            PageRecord::new(
                3,
                "Утро\nсолнце встаёт над рекой и над лесом\nтихо шумит камыш\nптицы поют\nАнна Петрова\n",
            ),
            PageRecord::new(
                4,
                "и продолжается песня,\nи не кончается день,\nи не смолкает река\nи лес\n",
            ),
            PageRecord::new(5, "ISBN 978-5-00000-000-0\n"),
        ];
        let hints = gather_hints(&mut pages, &PageLayouts::new());
        let els = default_elements(&pages, &hints, ElementStrategy::Heuristic);

        assert_eq!(ranges(&els), vec![(1, 1), (2, 2), (3, 4), (5, 5)]);
        assert_eq!(els[0].kind, ElementType::Title);
        assert_eq!(els[1].kind, ElementType::Image);
        assert_eq!(els[2].kind, ElementType::Text);
        assert_eq!(els[2].author.as_deref(), Some("Анна Петрова"));
        assert_eq!(els[3].kind, ElementType::Tech);
        assert!(!pages[2].text.contains("Анна Петрова"));
        assert_eq!(hints.authors.len(), 1);
        assert!(hints.titles.is_empty());
    }

    #[test]
    fn contiguous_ignores_authors() {
        let pages = vec![PageRecord::new(1, "a\n"), PageRecord::new(2, "b\n")];
        let mut hints = PageHints::default();
        hints.authors.insert(1, "Анна Петрова".into());
        let els = default_elements(&pages, &hints, ElementStrategy::Contiguous);
        assert_eq!(ranges(&els), vec![(1, 2)]);
        assert_eq!(els[0].author, None);
    }

    #[test]
    fn heuristic_never_bridges_a_gap() {
        let mut pages = vec![
            PageRecord::new(2, "Title line\nand then a long body line follows here\nmore\nmore\n"),
            PageRecord::new(4, "continuation in lowercase\nstill going\nand going\nand done\n"),
        ];
        let hints = gather_hints(&mut pages, &PageLayouts::new());
        let els = default_elements(&pages, &hints, ElementStrategy::Heuristic);
        assert_eq!(ranges(&els), vec![(2, 2), (4, 4)]);
    }

    #[test]
    fn heuristic_is_a_partition() {
        let pages: Vec<PageRecord> = (1..=6)
            .map(|n| PageRecord::new(n, if n % 2 == 0 { "" } else { "lower case text\nline\nline\nline\n" }))
            .collect();
        let els = default_elements(&pages, &PageHints::default(), ElementStrategy::Heuristic);
        let covered: Vec<u32> = els.iter().flat_map(|e| e.start..=e.end).collect();
        assert_eq!(covered, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn non_text_elements_carry_no_author() {
        let mut pages = vec![
            PageRecord::new(1, "ISBN 978-5-00000-000-0\nАнна Петрова\n"),
            PageRecord::new(2, "Предисловие\nЭта книга собрана из писем\nМария Иванова\n"),
        ];
        let hints = gather_hints(&mut pages, &PageLayouts::new());
        assert_eq!(hints.authors.len(), 2);

        let els = default_elements(&pages, &hints, ElementStrategy::Heuristic);
        assert_eq!(els[0].kind, ElementType::Tech);
        assert_eq!(els[1].kind, ElementType::Intro);
        assert!(els.iter().all(|e| e.author.is_none()));
        assert!(!pages[0].text.contains("Анна Петрова"));
    }

    #[test]
    fn title_sized_first_line_opens_a_new_piece() {
        let verse = "тишина\nи снег идёт над городом\nи фонари горят\nи ночь длинна\n";
        let mut pages = vec![
            PageRecord::new(1, "Первая строка\nвторая строка\nтретья строка\nи так далее\n"),
            PageRecord::new(2, verse),
        ];
        let text_only = gather_hints(&mut pages.clone(), &PageLayouts::new());
        let els = default_elements(&pages, &text_only, ElementStrategy::Heuristic);
        assert_eq!(ranges(&els), vec![(1, 2)]);

        let mut layouts = PageLayouts::new();
        layouts.insert(
            2,
            PageLayout {
                lines: verse
                    .lines()
                    .enumerate()
                    .map(|(i, l)| LayoutLine::new(l, if i == 0 { 18.0 } else { 11.0 }, 72.0))
                    .collect(),
            },
        );
        let hints = gather_hints(&mut pages, &layouts);
        assert!(hints.titles.contains(&2));
        let els = default_elements(&pages, &hints, ElementStrategy::Heuristic);
        assert_eq!(ranges(&els), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn layout_signature_becomes_the_author() {
        let mut pages = vec![PageRecord::new(
            3,
            "Утро\nсолнце встаёт над рекой и над лесом\nтихо шумит камыш\nптицы поют\nА. Петрова\n",
        )];
        let mut layouts = PageLayouts::new();
        layouts.insert(
            3,
            PageLayout {
                lines: vec![
                    LayoutLine::new("Утро", 11.0, 72.0),
                    LayoutLine::new("солнце встаёт над рекой и над лесом", 11.0, 72.0),
                    LayoutLine::new("тихо шумит камыш", 11.0, 72.0),
                    LayoutLine::new("птицы поют", 11.0, 72.0),
                    LayoutLine::new("А. Петрова", 10.0, 310.0),
                    LayoutLine::new("3", 9.0, 290.0),
                ],
            },
        );
        let hints = gather_hints(&mut pages, &layouts);
        assert_eq!(hints.authors.get(&3).map(String::as_str), Some("А. Петрова"));
        assert!(!pages[0].text.contains("Петрова"));

        let els = default_elements(&pages, &hints, ElementStrategy::Heuristic);
        assert_eq!(els[0].kind, ElementType::Text);
        assert_eq!(els[0].author.as_deref(), Some("А. Петрова"));
    }
}

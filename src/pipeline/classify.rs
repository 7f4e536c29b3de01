//! Page heuristics for the `heuristic` element strategy.
//!
//! Booklets in the catalogue are mostly short poems and essays, one or more
//! per page, with an occasional illustration page and an imprint page at the
//! back. These rules guess where one piece ends and the next begins so the
//! first-run grouping needs fewer manual corrections.
//!
//! Most rules read the cleaned text only. When the backend supplies a
//! [`PageLayout`], two more signals apply: a first line set noticeably larger
//! than the body opens a new piece, and a right-indented line directly above
//! the folio is taken as the signature. The same document always yields the
//! same classification.

use crate::output::ElementType;
use crate::pipeline::source::PageLayout;
use crate::pipeline::text::is_page_number;
use once_cell::sync::Lazy;
use regex::Regex;

/// Keywords that mark an imprint / colophon page.
const TECH_KEYWORDS: &[&str] = &[
    "isbn",
    "©",
    "copyleft",
    "copyright",
    "издательство",
    "тираж",
    "верстк",
    "редактор",
    "корректор",
    "дизайн",
    "иллюстрац",
    "печать",
    "типография",
    "г.",
];

const INTRO_KEYWORDS: &[&str] = &["введение", "предисловие", "introduction"];

/// First-line size over median line size at which a page opens with a title.
const TITLE_SIZE_RATIO: f32 = 1.25;

/// How far right of the body's median left edge a signature sits, in points.
const SIGNATURE_INDENT: f32 = 20.0;

static RE_LEADING_JUNK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^0-9A-Za-zА-Яа-яЁё]+").unwrap());

static RE_RULE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[—-]+$").unwrap());

static RE_DATE_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b[0-3]?\d\s+(января|февраля|марта|апреля|мая|июня|июля|августа|сентября|октября|ноября|декабря)\s+20\d{2}\b",
    )
    .unwrap()
});

static RE_DATE_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[0-3]?\d[./-][01]?\d[./-]20\d{2}\b").unwrap());

static RE_PERSON_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[А-ЯЁA-Z][а-яёa-z]+(?:\s+[А-ЯЁA-Z][а-яёa-z]+){1,2}$").unwrap()
});

/// Guess the element type of a single page from its cleaned text.
pub fn detect_type(text: &str) -> ElementType {
    if text.trim().is_empty() {
        return ElementType::Image;
    }

    let lower = text.to_lowercase();
    if TECH_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return ElementType::Tech;
    }

    let trimmed = lower.trim();
    if INTRO_KEYWORDS
        .iter()
        .any(|kw| trimmed.starts_with(kw) || lower.contains(&format!("\n{kw}")))
    {
        return ElementType::Intro;
    }

    let lines = non_empty_lines(text);
    let total_chars: usize = lines.iter().map(|l| l.chars().count()).sum();
    let letters = count_alpha(text);
    if !lines.is_empty() && lines.len() <= 3 && total_chars <= 120 && letters >= 3 {
        let starts_lower = strip_leading_junk(lines[0])
            .chars()
            .next()
            .is_some_and(char::is_lowercase);
        return if starts_lower {
            ElementType::Text
        } else {
            ElementType::Title
        };
    }

    ElementType::Text
}

/// A line made only of three or more asterisks (`***`, `* * *`).
pub fn has_separator(text: &str) -> bool {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).any(|l| {
        let stars = l.chars().filter(|c| *c == '*').count();
        stars >= 3 && l.chars().all(|c| c == '*' || c == ' ')
    })
}

/// Whether the page's first line is set noticeably larger than its body.
pub fn title_hint(layout: &PageLayout) -> bool {
    let Some(first) = layout.lines.first() else {
        return false;
    };
    let sizes: Vec<f32> = layout
        .lines
        .iter()
        .map(|l| l.font_size)
        .filter(|s| *s > 0.0)
        .collect();
    let Some(median_size) = median(sizes) else {
        return false;
    };
    first.font_size >= median_size * TITLE_SIZE_RATIO && first.text.chars().count() <= 120
}

/// A right-indented line directly above a trailing folio.
pub fn signature_above_folio(layout: &PageLayout) -> Option<&str> {
    let [.., candidate, last] = layout.lines.as_slice() else {
        return None;
    };
    if !is_page_number(&last.text) {
        return None;
    }
    let body_left = median(
        layout
            .lines
            .iter()
            .filter(|l| count_alpha(&l.text) >= 3)
            .map(|l| l.left)
            .collect(),
    )
    .unwrap_or(0.0);
    let letters = count_alpha(&candidate.text);
    ((3..=40).contains(&letters) && candidate.left >= body_left + SIGNATURE_INDENT)
        .then_some(candidate.text.as_str())
}

/// Whether the page looks like the start of a new piece rather than the
/// continuation of the previous page.
///
/// `title_hint` comes from [`title_hint`] and wins over the text rules.
pub fn starts_new_piece(text: &str, title_hint: bool) -> bool {
    if title_hint {
        return true;
    }
    let lines = non_empty_lines(text);
    let Some(first) = lines.first() else {
        return false;
    };
    if RE_RULE_LINE.is_match(first) {
        return false;
    }

    let first_clean = strip_leading_junk(first);
    if RE_DATE_WORDS.is_match(first_clean) || RE_DATE_NUMERIC.is_match(first_clean) {
        return true;
    }

    let letters = count_alpha(first_clean);
    if letters < 3 {
        return false;
    }

    let first_len = first_clean.chars().count();
    let starts_lower = first_clean.chars().next().is_some_and(char::is_lowercase);

    // Short page: a title or a short piece on its own.
    if first_len <= 120 && lines.len() <= 3 {
        return !starts_lower;
    }

    if first_len <= 40 && lines.len() >= 2 {
        let second = lines[1];
        let letters2 = count_alpha(second);
        // Short heading followed by body text.
        if !starts_lower && letters2 >= 10 {
            return true;
        }
        // Heading followed by a shouting line.
        if letters2 >= 5 {
            let upper2 = second.chars().filter(|c| c.is_uppercase()).count();
            if upper2 >= letters2 * 7 / 10 {
                return true;
            }
        }
    }

    let upper = first_clean.chars().filter(|c| c.is_uppercase()).count();
    upper >= 5usize.max(letters * 6 / 10)
}

/// Whether `text` should join the element opened by `prev_text`.
pub fn continues_previous(prev_text: &str, text: &str, title_hint: bool) -> bool {
    if prev_text.trim().is_empty() || has_separator(text) {
        return false;
    }
    if !starts_new_piece(text, title_hint) {
        return true;
    }
    // A long page followed by a short one is usually a piece spilling over.
    non_empty_lines(prev_text).len() > 6 && non_empty_lines(text).len() <= 6
}

/// Find a trailing author signature and remove it from the text.
///
/// Looks at the last eight non-empty lines, newest first, for a line shaped
/// like "Firstname Lastname" (two or three capitalised words, 3–40 chars),
/// skipping parenthesised remarks and bare numbers.
pub fn extract_author(text: &str) -> (String, Option<String>) {
    let tail = non_empty_lines(text);
    let candidate = tail.iter().rev().take(8).copied().find(|cand| {
        let is_remark = cand.starts_with('(') && cand.ends_with(')');
        let is_number = cand.chars().all(|c| c.is_ascii_digit());
        let len = cand.chars().count();
        !is_remark && !is_number && (3..=40).contains(&len) && RE_PERSON_NAME.is_match(cand)
    });

    match candidate {
        Some(author) => (remove_last_line(text, author), Some(author.to_string())),
        None => (text.to_string(), None),
    }
}

/// Take the page's signature out of its text.
///
/// A signature found through the layout wins; otherwise falls back to
/// [`extract_author`].
pub fn take_author(text: &str, layout: Option<&PageLayout>) -> (String, Option<String>) {
    match layout.and_then(signature_above_folio) {
        Some(author) => (remove_last_line(text, author), Some(author.to_string())),
        None => extract_author(text),
    }
}

/// Drop the last line equal to `line` (ignoring surrounding whitespace).
fn remove_last_line(text: &str, line: &str) -> String {
    let line = line.trim();
    let mut lines: Vec<&str> = text.trim_end().lines().collect();
    if let Some(pos) = lines.iter().rposition(|l| l.trim() == line) {
        lines.remove(pos);
    }
    let body = lines.join("\n");
    let body = body.trim_end();
    if body.trim().is_empty() {
        String::new()
    } else {
        format!("{body}\n")
    }
}

fn median(mut values: Vec<f32>) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 1 {
        values[mid]
    } else {
        (values[mid - 1] + values[mid]) / 2.0
    })
}

fn non_empty_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).collect()
}

fn strip_leading_junk(line: &str) -> &str {
    match RE_LEADING_JUNK.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}

fn count_alpha(s: &str) -> usize {
    s.chars().filter(|c| c.is_alphabetic()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::source::LayoutLine;

    #[test]
    fn empty_page_is_image() {
        assert_eq!(detect_type(""), ElementType::Image);
        assert_eq!(detect_type("  \n"), ElementType::Image);
    }

    #[test]
    fn imprint_is_tech() {
        assert_eq!(detect_type("ISBN 978-5-00000-000-0\nТираж 100 экз."), ElementType::Tech);
    }

    #[test]
    fn intro_detected() {
        assert_eq!(
            detect_type("Предисловие\nЭта книга собрана из писем и дневников, которые..."),
            ElementType::Intro
        );
    }

    #[test]
    fn short_capitalised_page_is_title() {
        assert_eq!(detect_type("Весенние стихи\n"), ElementType::Title);
        assert_eq!(detect_type("и снова дождь\n"), ElementType::Text);
    }

    #[test]
    fn separator_lines() {
        assert!(has_separator("verse\n* * *\nverse"));
        assert!(has_separator("***"));
        assert!(!has_separator("**"));
        assert!(!has_separator("a * b * c"));
    }

    #[test]
    fn lowercase_start_continues() {
        let prev = "Первая строка\nвторая строка\n";
        let next = "и продолжение стихотворения,\nкоторое не кончилось\nна прошлой странице\nещё строка\n";
        assert!(!starts_new_piece(next, false));
        assert!(continues_previous(prev, next, false));
    }

    #[test]
    fn date_heading_starts_new_piece() {
        assert!(starts_new_piece("31 марта 2025\nсегодня шёл снег и было тихо\n", false));
        assert!(starts_new_piece("31.03.2025\nзаметка\n", false));
    }

    #[test]
    fn separator_breaks_continuation() {
        assert!(!continues_previous("old text\n", "* * *\nnew verse\n", false));
    }

    #[test]
    fn nothing_continues_an_empty_page() {
        assert!(!continues_previous("", "lowercase continuation\n", false));
    }

    #[test]
    fn long_page_spills_onto_short_one() {
        let prev = "one\ntwo\nthree\nfour\nfive\nsix\nseven\n";
        let next = "Final Stanza Heading\n";
        assert!(starts_new_piece(next, false));
        assert!(continues_previous(prev, next, false));
    }

    #[test]
    fn author_signature_extracted() {
        let (body, author) = extract_author("Строка стиха\nещё строка\nАнна Петрова\n");
        assert_eq!(author.as_deref(), Some("Анна Петрова"));
        assert_eq!(body, "Строка стиха\nещё строка\n");
    }

    #[test]
    fn no_author_leaves_text_alone() {
        let text = "just some lowercase lines\n(remark)\n";
        let (body, author) = extract_author(text);
        assert_eq!(author, None);
        assert_eq!(body, text);
    }

    fn verse_layout(title_size: f32) -> PageLayout {
        PageLayout {
            lines: vec![
                LayoutLine::new("тишина", title_size, 72.0),
                LayoutLine::new("и снег идёт над городом", 11.0, 72.0),
                LayoutLine::new("и фонари горят", 11.0, 72.0),
                LayoutLine::new("и ночь длинна", 11.0, 72.0),
            ],
        }
    }

    #[test]
    fn large_first_line_is_a_title_hint() {
        assert!(title_hint(&verse_layout(16.0)));
        assert!(!title_hint(&verse_layout(12.0)));
        assert!(!title_hint(&PageLayout::default()));
    }

    #[test]
    fn unknown_sizes_give_no_hint() {
        assert!(!title_hint(&verse_layout(0.0)));
        let unsized_page = PageLayout {
            lines: vec![LayoutLine::new("Заголовок", 0.0, 72.0)],
        };
        assert!(!title_hint(&unsized_page));
    }

    #[test]
    fn title_hint_breaks_lowercase_continuation() {
        let prev = "Первая строка\nвторая строка\n";
        let next = "тишина\nи снег идёт над городом\nи фонари горят\nи ночь длинна\n";
        assert!(continues_previous(prev, next, false));
        assert!(!continues_previous(prev, next, true));
    }

    fn signed_layout(signature_left: f32, folio: &str) -> PageLayout {
        PageLayout {
            lines: vec![
                LayoutLine::new("строка стиха", 11.0, 72.0),
                LayoutLine::new("ещё одна строка", 11.0, 72.0),
                LayoutLine::new("и последняя", 11.0, 72.0),
                LayoutLine::new("А. Петрова", 10.0, signature_left),
                LayoutLine::new(folio, 9.0, 280.0),
            ],
        }
    }

    #[test]
    fn right_indented_line_above_folio_is_signature() {
        assert_eq!(signature_above_folio(&signed_layout(300.0, "7")), Some("А. Петрова"));
        assert_eq!(signature_above_folio(&signed_layout(80.0, "7")), None);
        assert_eq!(signature_above_folio(&signed_layout(300.0, "конец")), None);
    }

    #[test]
    fn layout_signature_wins_over_text_rules() {
        let text = "строка стиха\nещё одна строка\nи последняя\nА. Петрова\n";
        let (body, author) = take_author(text, Some(&signed_layout(300.0, "7")));
        assert_eq!(author.as_deref(), Some("А. Петрова"));
        assert_eq!(body, "строка стиха\nещё одна строка\nи последняя\n");

        // "А. Петрова" is not name-shaped, so text alone finds nothing.
        assert_eq!(take_author(text, None), (text.to_string(), None));
    }
}

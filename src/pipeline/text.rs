//! Deterministic cleanup of extracted page text.
//!
//! pdfium joins lines with `\r\n`, keeps zero-width and soft-hyphen
//! characters from the font's text layer, and includes the printed page
//! number as the last line of most booklet pages. None of that belongs in
//! the stored text.
//!
//! Rules (applied in order):
//! 1. Normalise line endings (CRLF / CR → LF)
//! 2. Strip invisible Unicode
//! 3. Trim trailing whitespace per line
//! 4. Drop a trailing page-number line (optional)
//! 5. End non-empty text with exactly one newline; blank text becomes `""`
//!
//! Rules 1–3 and 5 are idempotent. Rule 4 removes one folio per pass, so
//! cleaning already-cleaned text can drop a number that was the second-last
//! line. The engine only ever cleans raw text straight from the document.

/// Apply every cleanup rule to raw page text.
pub fn clean_page_text(raw: &str, strip_page_numbers: bool) -> String {
    let s = normalise_line_endings(raw);
    let s = remove_invisible_chars(&s);
    let s = trim_trailing_whitespace(&s);
    let s = if strip_page_numbers {
        strip_trailing_page_number(&s)
    } else {
        s
    };
    ensure_final_newline(&s)
}

// ── Rule 1 ───────────────────────────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2 ───────────────────────────────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}', '\u{0002}',
        ],
        "",
    )
}

// ── Rule 3 ───────────────────────────────────────────────────────────────

fn trim_trailing_whitespace(input: &str) -> String {
    input
        .lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Rule 4 ───────────────────────────────────────────────────────────────

/// A folio: 1–4 ASCII digits alone on a line.
pub fn is_page_number(line: &str) -> bool {
    let t = line.trim();
    !t.is_empty() && t.len() <= 4 && t.bytes().all(|b| b.is_ascii_digit())
}

fn strip_trailing_page_number(input: &str) -> String {
    let mut lines: Vec<&str> = input.lines().collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.last().is_some_and(|l| is_page_number(l)) {
        lines.pop();
    }
    lines.join("\n")
}

// ── Rule 5 ───────────────────────────────────────────────────────────────

fn ensure_final_newline(input: &str) -> String {
    let trimmed = input.trim_end();
    if trimmed.trim().is_empty() {
        String::new()
    } else {
        format!("{trimmed}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_and_trailing_spaces() {
        assert_eq!(clean_page_text("one  \r\ntwo\rthree\t", false), "one\ntwo\nthree\n");
    }

    #[test]
    fn strips_trailing_folio() {
        assert_eq!(clean_page_text("Poem line\nanother\n\n 12 \n\n", true), "Poem line\nanother\n");
    }

    #[test]
    fn keeps_folio_when_disabled() {
        assert_eq!(clean_page_text("text\n12", false), "text\n12\n");
    }

    #[test]
    fn long_number_is_not_a_folio() {
        assert_eq!(clean_page_text("Year\n20250", true), "Year\n20250\n");
    }

    #[test]
    fn only_the_last_line_is_checked() {
        assert_eq!(clean_page_text("3\nfirst\nlast", true), "3\nfirst\nlast\n");
    }

    #[test]
    fn blank_becomes_empty() {
        assert_eq!(clean_page_text("  \r\n\n", true), "");
        assert_eq!(clean_page_text("7", true), "");
        assert_eq!(clean_page_text("", false), "");
    }

    #[test]
    fn invisible_chars_removed() {
        assert_eq!(clean_page_text("soft\u{00AD}hy\u{200B}phen", false), "softhyphen\n");
    }

    #[test]
    fn single_folio_cleanup_is_stable() {
        let once = clean_page_text("a \r\nb\n\n5\n", true);
        assert_eq!(clean_page_text(&once, true), once);
    }

    #[test]
    fn idempotent_without_folio_stripping() {
        let once = clean_page_text("a\n12\n5 \r\n\u{200B}", false);
        assert_eq!(clean_page_text(&once, false), once);
    }

    #[test]
    fn folio_stripping_takes_one_line_per_pass() {
        let once = clean_page_text("a\n12\n5", true);
        assert_eq!(once, "a\n12\n");
        assert_eq!(clean_page_text(&once, true), "a\n");
    }
}

//! Markup cleanup: strip lightweight Markdown from model responses.
//!
//! Chat models answer in Markdown even when nobody asked for it. Neither the
//! terminal display nor the PDF report interprets Markdown, so the raw
//! markers are removed before a response is shown or typeset. Display and
//! report both go through [`clean_markup`], which keeps the two presentations
//! identical.
//!
//! ## Rule Order
//!
//! Line endings are normalised first so the blank-line rule sees plain `\n`.
//! Marker removal runs before blank-line collapsing because deleting a marker
//! line can leave a new run of empty lines behind. Deleting markers can also
//! expose new ones (`_**_` becomes `__`), so the rule set is re-applied until
//! the text stops changing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw model response.
///
/// Rules (applied in order, repeated to a fixed point):
/// 1. Normalise line endings (CRLF / CR → LF)
/// 2. Remove bold/emphasis markers (`**`, `__`)
/// 3. Remove heading markers (every `#` run and the whitespace after it)
/// 4. Remove inline-code markers (backticks)
/// 5. Collapse 3+ consecutive line breaks down to 2
/// 6. Trim leading/trailing whitespace
///
/// The function is idempotent: `clean_markup(&clean_markup(s)) == clean_markup(s)`.
pub fn clean_markup(input: &str) -> String {
    let mut current = apply_rules(input);
    loop {
        let next = apply_rules(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn apply_rules(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_emphasis(&s);
    let s = remove_heading_markers(&s);
    let s = remove_code_markers(&s);
    let s = collapse_line_breaks(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Remove emphasis markers ─────────────────────────────────────────

static RE_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*|__").unwrap());

fn remove_emphasis(input: &str) -> String {
    RE_EMPHASIS.replace_all(input, "").into_owned()
}

// ── Rule 3: Remove heading markers ──────────────────────────────────────────

// `#` runs are removed wherever they occur, together with any whitespace
// (line breaks included) that follows them.
static RE_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"#+\s*").unwrap());

fn remove_heading_markers(input: &str) -> String {
    RE_HEADING.replace_all(input, "").into_owned()
}

// ── Rule 4: Remove inline-code markers ──────────────────────────────────────

fn remove_code_markers(input: &str) -> String {
    input.replace('`', "")
}

// ── Rule 5: Collapse excessive line breaks ──────────────────────────────────

static RE_LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_line_breaks(input: &str) -> String {
    RE_LINE_BREAKS.replace_all(input, "\n\n").into_owned()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const TRICKY: &[&str] = &[
        "",
        "   ",
        "plain text",
        "**Bold** and __underlined__",
        "_**_",
        "*`*",
        "# # Title",
        "## Heading\nbody",
        "a\n\n\n\n\nb",
        "a\r\n\r\n\r\n\r\nb",
        "a\n\n#\n\n\nb",
        "a\n\n`\n\n`\n\nb",
        "`code` and ```fenced```",
        "  \n\n  **\n\n\n\n##  \n\n text \n\n\n",
        "Rank #1 at the box office",
        "\r\r\r\rx",
    ];

    #[test]
    fn test_remove_emphasis() {
        assert_eq!(remove_emphasis("**Bold** __under__"), "Bold under");
    }

    #[test]
    fn test_heading_markers_removed_everywhere() {
        assert_eq!(
            remove_heading_markers("### Synopsis\nRank #1 opener"),
            "Synopsis\nRank 1 opener"
        );
        assert_eq!(remove_heading_markers("Act ##\n\nTwo"), "Act Two");
    }

    #[test]
    fn test_clean_markup_drops_inline_hashes() {
        assert_eq!(
            clean_markup("Tagline: #1 thriller of the year\n\n## Verdict"),
            "Tagline: 1 thriller of the year\n\nVerdict"
        );
    }

    #[test]
    fn test_remove_code_markers() {
        assert_eq!(remove_code_markers("`x` ```y```"), "x y");
    }

    #[test]
    fn test_collapse_line_breaks() {
        assert_eq!(collapse_line_breaks("a\n\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(collapse_line_breaks("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn test_normalise_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_clean_markup_typical_response() {
        let input = "## Logline\n\n**When** a `retired` stuntwoman...\n\n\n\nShe must __fight__ back.  ";
        assert_eq!(
            clean_markup(input),
            "Logline\n\nWhen a retired stuntwoman...\n\nShe must fight back."
        );
    }

    #[test]
    fn test_markers_exposed_by_removal_are_removed() {
        assert_eq!(clean_markup("_**_x"), "x");
        assert_eq!(clean_markup("*`*y"), "y");
        assert_eq!(clean_markup("# # Title"), "Title");
    }

    #[test]
    fn test_clean_markup_is_idempotent() {
        for input in TRICKY {
            let once = clean_markup(input);
            let twice = clean_markup(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_never_leaves_runs_of_line_breaks() {
        for input in TRICKY {
            let out = clean_markup(input);
            assert!(!out.contains("\n\n\n"), "line-break run in {out:?} from {input:?}");
            assert!(!out.contains('\r'), "carriage return left in {out:?}");
        }
    }

    #[test]
    fn test_output_is_trimmed() {
        for input in TRICKY {
            let out = clean_markup(input);
            assert_eq!(out, out.trim());
        }
    }
}

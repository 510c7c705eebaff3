//! Response sanitizer: turns raw assistant markdown-ish output into the small
//! subset of markup the chat fragments display.
//!
//! The pipeline is an ordered list of pure rewrite passes. Order matters:
//! citation markers are stripped before paragraphs are re-split so a removed
//! marker never leaves an empty paragraph behind, and ordinals are stripped
//! before bullets are normalized so `1. - item` ends up as a single bullet.

use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical bullet glyph every list marker is rewritten to.
pub const BULLET: &str = "• ";

/// Literal marker some upstream agents leak into the answer text.
const LEAKED_MARKER: &str = "[DONE]";

/// One named rewrite step.
#[derive(Clone, Copy)]
pub struct Pass {
    pub name: &'static str,
    pub apply: fn(&str) -> String,
}

impl std::fmt::Debug for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pass").field("name", &self.name).finish()
    }
}

pub const PASSES: [Pass; 13] = [
    Pass { name: "collapse_blank_lines", apply: collapse_blank_lines },
    Pass { name: "collapse_horizontal_whitespace", apply: collapse_horizontal_whitespace },
    Pass { name: "bold_to_strong", apply: bold_to_strong },
    Pass { name: "italic_to_em", apply: italic_to_em },
    Pass { name: "strip_citations", apply: strip_citations },
    Pass { name: "normalize_bullets", apply: normalize_bullets },
    Pass { name: "headings_to_strong", apply: headings_to_strong },
    Pass { name: "strip_code_and_links", apply: strip_code_and_links },
    Pass { name: "strip_decorative_emoji", apply: strip_decorative_emoji },
    Pass { name: "strip_backticks", apply: strip_backticks },
    Pass { name: "strip_markers", apply: strip_markers },
    Pass { name: "normalize_paragraphs", apply: normalize_paragraphs },
    Pass { name: "final_trim", apply: final_trim },
];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("sanitizer pattern is a valid regex")
}

/// Emoji that models sprinkle in front of list items and headings.
macro_rules! decorative_emoji {
    () => {
        concat!(
            r"(?:\x{2705}|\x{2714}|\x{1F539}|\x{1F538}|\x{1F537}|\x{1F536}|\x{25AA}|\x{25AB}",
            r"|\x{27A1}|\x{1F449}|\x{1F4CC}|\x{2728}|\x{2B50}|\x{1F31F}|\x{1F4A1}|\x{1F680})",
            r"\x{FE0F}?"
        )
    };
}

/// Start of a line plus any decorative emoji or stray backticks that later
/// passes would remove, so line markers behind them are still recognized.
macro_rules! line_lead {
    () => {
        concat!(r"(?m)^[ \t]*(?:", decorative_emoji!(), r"[ \t]*|`[ \t]*)*")
    };
}

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| re(r"\n(?:[ \t]*\n)+"));
static HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| re(r"[ \t]+"));
static BOLD_STARS: Lazy<Regex> = Lazy::new(|| re(r"\*\*(.+?)\*\*"));
static BOLD_UNDERSCORES: Lazy<Regex> = Lazy::new(|| re(r"__(.+?)__"));
static ITALIC_STAR: Lazy<Regex> = Lazy::new(|| re(r"\*([^\s*](?:[^*\n]*[^\s*])?)\*"));
static ITALIC_UNDERSCORE: Lazy<Regex> =
    Lazy::new(|| re(r"\b_([^\s_](?:[^_\n]*[^\s_])?)_\b"));
static CITATION: Lazy<Regex> = Lazy::new(|| re(r"\[ID:\d+\]"));
static ORDINAL: Lazy<Regex> = Lazy::new(|| re(concat!(line_lead!(), r"(?:\d+[.)][ \t]+)+")));
static CIRCLED: Lazy<Regex> =
    Lazy::new(|| re(concat!(line_lead!(), r"[\x{2460}-\x{2473}\x{2776}-\x{2793}][ \t]*")));
static BULLET_MARKER: Lazy<Regex> = Lazy::new(|| re(concat!(line_lead!(), r"[-*\x{2022}][ \t]+")));
static HEADING: Lazy<Regex> = Lazy::new(|| re(concat!(line_lead!(), r"#{1,6}[ \t]+(.+?)[ \t#]*$")));
static CODE_FENCE: Lazy<Regex> = Lazy::new(|| re(r"(?m)^[ \t]*```[^\n]*(?:\n|$)"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| re(r"`([^`\n]+)`"));
static LINK: Lazy<Regex> = Lazy::new(|| re(r"!?\[([^\]\n]+)\]\([^)\s]*\)"));
static DECORATIVE_EMOJI: Lazy<Regex> = Lazy::new(|| re(concat!(decorative_emoji!(), r"[ \t]*")));
static UCC_CITATION: Lazy<Regex> = Lazy::new(|| re(r"(?i)[ \t]*\bper UCC \d+-\d+"));
static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| re(r"\n\s*\n"));
static LINE_EDGE_WS: Lazy<Regex> = Lazy::new(|| re(r"[ \t]*\n[ \t]*"));

/// Runs every pass in order. Empty input comes back empty.
pub fn sanitize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }
    PASSES
        .iter()
        .fold(raw.to_string(), |text, pass| (pass.apply)(&text))
}

/// Escapes text so that only markup added by [`sanitize`] reaches the page.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn collapse_blank_lines(text: &str) -> String {
    let unix = text.replace("\r\n", "\n");
    BLANK_LINES.replace_all(&unix, "\n\n").into_owned()
}

pub fn collapse_horizontal_whitespace(text: &str) -> String {
    HORIZONTAL_WS.replace_all(text, " ").into_owned()
}

pub fn bold_to_strong(text: &str) -> String {
    let stars = BOLD_STARS.replace_all(text, "<strong>${1}</strong>");
    BOLD_UNDERSCORES
        .replace_all(&stars, "<strong>${1}</strong>")
        .into_owned()
}

pub fn italic_to_em(text: &str) -> String {
    let stars = ITALIC_STAR.replace_all(text, "<em>${1}</em>");
    ITALIC_UNDERSCORE
        .replace_all(&stars, "<em>${1}</em>")
        .into_owned()
}

/// Repeats until no marker is left; removing `[ID:1]` from `[ID:[ID:1]2]`
/// leaves a fresh `[ID:2]`.
pub fn strip_citations(text: &str) -> String {
    let mut out = CITATION.replace_all(text, "").into_owned();
    while CITATION.is_match(&out) {
        out = CITATION.replace_all(&out, "").into_owned();
    }
    out
}

pub fn normalize_bullets(text: &str) -> String {
    let no_ordinals = ORDINAL.replace_all(text, "");
    let circled = CIRCLED.replace_all(&no_ordinals, BULLET);
    BULLET_MARKER.replace_all(&circled, BULLET).into_owned()
}

pub fn headings_to_strong(text: &str) -> String {
    HEADING
        .replace_all(text, "<strong>${1}</strong>")
        .into_owned()
}

pub fn strip_code_and_links(text: &str) -> String {
    let no_fences = CODE_FENCE.replace_all(text, "");
    let no_code = INLINE_CODE.replace_all(&no_fences, "${1}");
    LINK.replace_all(&no_code, "${1}").into_owned()
}

pub fn strip_decorative_emoji(text: &str) -> String {
    DECORATIVE_EMOJI.replace_all(text, "").into_owned()
}

pub fn strip_backticks(text: &str) -> String {
    text.replace('`', "")
}

/// Also sweeps citations that only became whole once code, emoji or
/// backticks inside them were removed.
pub fn strip_markers(text: &str) -> String {
    let no_marker = text.replace(LEAKED_MARKER, "");
    let no_ucc = UCC_CITATION.replace_all(&no_marker, "");
    strip_citations(&no_ucc)
}

pub fn normalize_paragraphs(text: &str) -> String {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn final_trim(text: &str) -> String {
    let single = HORIZONTAL_WS.replace_all(text, " ");
    LINE_EDGE_WS.replace_all(&single, "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "Hello [ID:42] world",
        "## Herbal Remedies\n\n1. **Chamomile** calms the *nerves* [ID:3]\n2. `Peppermint` helps digestion per UCC 2-207\n\n\n\n- ✅ See [the guide](https://example.org/guide)",
        "a\n\n[ID:1]\n\nb",
        "   \n\n\n  leading and trailing   \n\n\n",
        "① first\n② second\n❸ third",
        "```python\nprint('hi')\n```\nDone [DONE]",
        "* one\n* two\n  - nested\n\n\n3) three",
        "Plain text with no markup at all.",
        "__Bold__ and _soft_ and snake_case_name",
        "💡 Tip: drink water\n👉 Rest well\n🚀 Launch",
        "See [ID:[ID:1]2] here",
        "Cited [ID:`7`] twice",
        "👉 1. Rest well\n👉 2. Drink water",
        "✅ - Chamomile",
        "💡 # Tip",
        "`- item`",
        "✨ ① first\n✔️ ### Done ##",
    ];

    #[test]
    fn empty_input_short_circuits() {
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn citations_are_removed() {
        assert_eq!(sanitize("Hello [ID:42] world"), "Hello world");
        let citation = Regex::new(r"\[ID:\d+\]").unwrap();
        for sample in SAMPLES {
            assert!(!citation.is_match(&sanitize(sample)), "citation left in {sample:?}");
        }
    }

    #[test]
    fn nested_and_split_citations_are_removed() {
        assert_eq!(sanitize("See [ID:[ID:1]2] here"), "See here");
        assert_eq!(strip_citations("[ID:[ID:[ID:1]2]3]"), "");
        assert_eq!(sanitize("Cited [ID:`7`] twice"), "Cited twice");
    }

    #[test]
    fn markers_behind_emoji_or_backticks_are_normalized_on_first_run() {
        assert_eq!(sanitize("👉 1. Rest well\n👉 2. Drink water"), "Rest well\nDrink water");
        assert_eq!(sanitize("✅ - Chamomile"), "• Chamomile");
        assert_eq!(sanitize("💡 # Tip"), "<strong>Tip</strong>");
        assert_eq!(sanitize("`- item`"), "• item");
        assert_eq!(sanitize("✨ ① first\n✔️ ### Done ##"), "• first\n<strong>Done</strong>");
    }

    #[test]
    fn removed_marker_does_not_leave_blank_paragraph() {
        assert_eq!(sanitize("a\n\n[ID:1]\n\nb"), "a\n\nb");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for sample in SAMPLES {
            let once = sanitize(sample);
            assert_eq!(sanitize(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn no_consecutive_blank_lines() {
        let blank_run = Regex::new(r"\n[ \t]*\n[ \t]*\n").unwrap();
        for sample in SAMPLES {
            let out = sanitize(sample);
            assert!(!blank_run.is_match(&out), "blank run in {out:?}");
        }
    }

    #[test]
    fn full_pipeline_on_markdown_answer() {
        let out = sanitize(SAMPLES[1]);
        assert_eq!(
            out,
            "<strong>Herbal Remedies</strong>\n\n\
             <strong>Chamomile</strong> calms the <em>nerves</em>\n\
             Peppermint helps digestion\n\n\
             • See the guide"
        );
    }

    #[test]
    fn collapses_blank_lines_and_crlf() {
        assert_eq!(collapse_blank_lines("a\r\n\r\n\r\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\n \n\t\nb"), "a\n\nb");
        assert_eq!(collapse_blank_lines("a\nb"), "a\nb");
    }

    #[test]
    fn emphasis_passes() {
        assert_eq!(bold_to_strong("a **b** c"), "a <strong>b</strong> c");
        assert_eq!(bold_to_strong("__b__"), "<strong>b</strong>");
        assert_eq!(italic_to_em("an *idea* here"), "an <em>idea</em> here");
        assert_eq!(italic_to_em("5 * 3 * 2"), "5 * 3 * 2");
        assert_eq!(italic_to_em("keep snake_case_names"), "keep snake_case_names");
        assert_eq!(italic_to_em("_soft_ voice"), "<em>soft</em> voice");
    }

    #[test]
    fn bullets_and_ordinals() {
        assert_eq!(normalize_bullets("- a\n* b\n• c"), "• a\n• b\n• c");
        assert_eq!(normalize_bullets("1. first\n12) twelfth"), "first\ntwelfth");
        assert_eq!(normalize_bullets("1. - mixed"), "• mixed");
        assert_eq!(normalize_bullets("① one\n❿ ten\n➀ alt"), "• one\n• ten\n• alt");
        assert_eq!(normalize_bullets("-1 degrees"), "-1 degrees");
    }

    #[test]
    fn headings_become_strong() {
        assert_eq!(headings_to_strong("# Title"), "<strong>Title</strong>");
        assert_eq!(headings_to_strong("### Sub ###"), "<strong>Sub</strong>");
        assert_eq!(headings_to_strong("#hashtag"), "#hashtag");
    }

    #[test]
    fn code_and_links() {
        assert_eq!(
            strip_code_and_links("use `cargo` and [docs](https://docs.rs)"),
            "use cargo and docs"
        );
        assert_eq!(strip_code_and_links("```rust\nlet x = 1;\n```\n"), "let x = 1;\n");
        assert_eq!(strip_backticks("stray ` tick"), "stray  tick");
    }

    #[test]
    fn decorative_emoji_and_markers() {
        assert_eq!(strip_decorative_emoji("✅ done\n➡️ next"), "done\nnext");
        assert_eq!(strip_markers("Valid per UCC 2-207. [DONE]"), "Valid. ");
    }

    #[test]
    fn paragraphs_are_trimmed_and_non_empty() {
        assert_eq!(normalize_paragraphs("  a \n\n \n\n b  "), "a\n\nb");
        assert_eq!(final_trim("  a   b \n  c  "), "a b\nc");
    }

    #[test]
    fn escape_html_escapes_markup() {
        assert_eq!(escape_html("<b>&\"</b>"), "&lt;b&gt;&amp;&quot;&lt;/b&gt;");
    }

    #[test]
    fn passes_are_named_in_order() {
        let names: Vec<_> = PASSES.iter().map(|p| p.name).collect();
        assert_eq!(names.first(), Some(&"collapse_blank_lines"));
        assert_eq!(names.last(), Some(&"final_trim"));
        assert_eq!(names.len(), 13);
    }
}

//! Macro substitution engine.
//!
//! Replaces spoken keyword phrases with their configured replacement text,
//! e.g. "mein zoom link" → "https://zoom.us/j/123456789". Matching is
//! case-insensitive and tolerant of the usual transcription variance:
//! hyphens and spaces are interchangeable between words, each word may carry
//! an inflection suffix ("mein" also matches "meinen"), and an optional
//! hyphen is allowed between any two letters ("email" also matches
//! "e-mail").
//!
//! Substitution is a single pass: a replacement that itself contains another
//! macro's keyword is not re-expanded. This is intentional, to prevent
//! runaway expansion.

use crate::settings::Macro;
use regex::{NoExpand, RegexBuilder};

/// Apply all enabled macros to `text`, returning the rewritten text.
///
/// Macros are processed longest-keyword-first so a short keyword can never
/// shadow a longer one that contains it ("mail" vs. "e-mail"). Later macros
/// match against the already-rewritten text.
pub fn apply_macros(text: &str, macros: &[Macro]) -> String {
    let mut active: Vec<&Macro> = macros
        .iter()
        .filter(|m| m.enabled && !m.keyword.trim().is_empty())
        .collect();
    active.sort_by(|a, b| b.keyword.len().cmp(&a.keyword.len()));

    let mut result = text.to_string();

    for macro_def in active {
        let pattern = keyword_pattern(&macro_def.keyword);
        // A keyword of nothing but separators produces an empty pattern,
        // which would match at every position.
        if pattern.is_empty() {
            log::warn!(
                "Macros: Skipping macro '{}' with no matchable words",
                macro_def.id
            );
            continue;
        }
        let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
            Ok(r) => r,
            Err(e) => {
                log::warn!(
                    "Macros: Skipping macro '{}' with unmatchable keyword: {}",
                    macro_def.id,
                    e
                );
                continue;
            }
        };

        if regex.is_match(&result) {
            log::debug!(
                "Macros: Applying '{}' ({} chars replacement)",
                macro_def.keyword,
                macro_def.replacement.len()
            );
            result = regex
                .replace_all(&result, NoExpand(&macro_def.replacement))
                .into_owned();
        }
    }

    result
}

/// Build the fuzzy matcher for one keyword.
///
/// Per word: an optional hyphen between any two characters plus a `\w*`
/// suffix for inflected forms. Between words: one or more spaces/hyphens.
fn keyword_pattern(keyword: &str) -> String {
    let words: Vec<String> = keyword
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty())
        .map(word_pattern)
        .collect();

    words.join(r"[\s-]+")
}

fn word_pattern(word: &str) -> String {
    let mut pattern = String::new();
    for (i, ch) in word.chars().enumerate() {
        if i > 0 {
            pattern.push_str("-?");
        }
        pattern.push_str(&regex::escape(&ch.to_string()));
    }
    pattern.push_str(r"\w*");
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk(keyword: &str, replacement: &str) -> Macro {
        Macro::new(keyword, replacement)
    }

    #[test]
    fn test_basic_replacement() {
        let macros = vec![mk("mein zoom link", "https://zoom.us/j/123")];
        let out = apply_macros("Hier ist mein zoom link für morgen", &macros);
        assert_eq!(out, "Hier ist https://zoom.us/j/123 für morgen");
    }

    #[test]
    fn test_case_insensitive_and_hyphen_equivalent() {
        let macros = vec![mk("mein zoom link", "X")];
        assert_eq!(apply_macros("Mein Zoom-Link", &macros), "X");
        assert_eq!(apply_macros("MEIN ZOOM LINK", &macros), "X");
    }

    #[test]
    fn test_inflected_suffix_matches() {
        // "mein" should also match "meinen" via the \w* suffix.
        let macros = vec![mk("mein link", "X")];
        assert_eq!(apply_macros("schick meinen link bitte", &macros), "schick X bitte");
    }

    #[test]
    fn test_optional_intra_word_hyphen() {
        let macros = vec![mk("email", "X")];
        assert_eq!(apply_macros("schick die e-mail ab", &macros), "schick die X ab");
    }

    #[test]
    fn test_longest_keyword_first() {
        let macros = vec![mk("mail", "A"), mk("e-mail", "B")];
        let out = apply_macros("schick die e-mail", &macros);
        assert!(out.contains('B'), "expected longest keyword to win, got: {}", out);
        assert!(!out.contains('A'));
    }

    #[test]
    fn test_disabled_and_blank_keywords_skipped() {
        let mut disabled = mk("zoom", "X");
        disabled.enabled = false;
        let blank = mk("   ", "Y");
        let out = apply_macros("zoom call", &[disabled, blank]);
        assert_eq!(out, "zoom call");
    }

    #[test]
    fn test_separator_only_keyword_never_matches() {
        // "-" survives the blank-keyword filter but has no words left after
        // splitting; it must not degenerate into a match-everywhere pattern.
        let macros = vec![mk("-", "X"), mk(" - ", "Y")];
        assert_eq!(apply_macros("abc", &macros), "abc");
    }

    #[test]
    fn test_replaces_all_occurrences() {
        let macros = vec![mk("kürzel", "LONG")];
        let out = apply_macros("kürzel und nochmal kürzel", &macros);
        assert_eq!(out, "LONG und nochmal LONG");
    }

    #[test]
    fn test_replacement_with_dollar_sign_is_literal() {
        let macros = vec![mk("betrag", "$100")];
        assert_eq!(apply_macros("der betrag bitte", &macros), "der $100 bitte");
    }

    #[test]
    fn test_single_pass_no_rescan() {
        // The replacement contains another macro's keyword; it must not be
        // expanded again within the same pass ordering.
        let macros = vec![mk("lange phrase hier", "kurz"), mk("kurz", "EXPANDED")];
        let out = apply_macros("lange phrase hier", &macros);
        // "lange phrase hier" (longest) is applied first, then "kurz" matches
        // the rewritten text - that is the documented overlap behavior.
        assert_eq!(out, "EXPANDED");

        // But once no keywords remain, a second application is a no-op.
        let macros2 = vec![mk("foo", "bar")];
        let once = apply_macros("foo fighters", &macros2);
        let twice = apply_macros(&once, &macros2);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_idempotent_when_no_keywords_present() {
        let macros = vec![mk("zoom link", "X")];
        let text = "nothing to see here";
        assert_eq!(apply_macros(text, &macros), text);
    }
}

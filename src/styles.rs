//! Style trigger engine.
//!
//! Detects spoken style commands like "mach daraus einen LinkedIn Post" at
//! the end of a dictated text and removes the command before the text is
//! handed to the style-transform service.
//!
//! Detection and stripping share the same hyphen/space equivalence: a
//! trigger configured as "linkedin post" also matches "LinkedIn-Post".
//! The lead-in vocabulary ("als …", "mach daraus …", "für …") is ordered
//! configuration data supplied by the host, not hard-coded branches.

use crate::settings::{LeadInTemplate, StyleShortcut};
use regex::RegexBuilder;

/// Detect whether `text` ends in (or contains) a style command.
///
/// The text and every trigger phrase are normalized (lowercase,
/// hyphens/whitespace collapsed to single spaces, trailing punctuation
/// stripped) before comparison. A shortcut matches if the normalized text
/// ends with one of its triggers, or contains a lead-in prefix followed by
/// the trigger. Shortcuts and their phrases are checked in configured
/// order; the first match wins.
pub fn detect_style_command<'a>(
    text: &str,
    shortcuts: &'a [StyleShortcut],
    lead_ins: &[LeadInTemplate],
) -> Option<&'a StyleShortcut> {
    let normalized = normalize(text);

    for shortcut in shortcuts.iter().filter(|s| s.enabled) {
        for trigger in &shortcut.trigger_phrases {
            let trigger = normalize(trigger);
            if trigger.is_empty() {
                continue;
            }

            if normalized.ends_with(&trigger) {
                log::info!(
                    "Styles: Detected '{}' (trigger at end: '{}')",
                    shortcut.name,
                    trigger
                );
                return Some(shortcut);
            }

            for lead_in in lead_ins {
                let pattern = format!("{} {}", normalize(&lead_in.detect_prefix), trigger);
                if normalized.contains(&pattern) {
                    log::info!(
                        "Styles: Detected '{}' (lead-in: '{}')",
                        shortcut.name,
                        lead_in.detect_prefix
                    );
                    return Some(shortcut);
                }
            }
        }
    }

    None
}

/// Remove the style command for `shortcut` from the end of `text`.
///
/// Lead-in + trigger patterns are tried before the bare trigger so that
/// "bitte als summary" strips the whole command rather than leaving the
/// lead-in dangling. Each removal is anchored at the end of the text and
/// may consume a leading comma and a trailing period. If no pattern
/// anchors (detection can be fuzzier than stripping), the text is returned
/// unchanged; callers must tolerate the no-op.
pub fn remove_style_command(
    text: &str,
    shortcut: &StyleShortcut,
    lead_ins: &[LeadInTemplate],
) -> String {
    let mut clean = text.trim().to_string();

    for trigger in &shortcut.trigger_phrases {
        let flexible = flexible_pattern(trigger);
        if flexible.is_empty() {
            continue;
        }

        // Most-specific first: every lead-in template, then the bare trigger.
        let mut tails: Vec<String> = lead_ins
            .iter()
            .map(|lead_in| {
                let prefix = flexible_pattern(&lead_in.detect_prefix);
                format!(
                    r"{}\s+{}{}",
                    prefix,
                    article_pattern(&lead_in.optional_articles),
                    flexible
                )
            })
            .collect();
        tails.push(flexible.clone());

        for tail in tails {
            let pattern = format!(r"\s*,?\s*{}\s*\.?\s*$", tail);
            let regex = match RegexBuilder::new(&pattern).case_insensitive(true).build() {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("Styles: Unusable strip pattern for '{}': {}", shortcut.id, e);
                    continue;
                }
            };
            if regex.is_match(&clean) {
                clean = regex.replace(&clean, "").into_owned();
            }
        }
    }

    let mut clean = clean.trim().to_string();
    if let Some(stripped) = clean.strip_suffix(',') {
        clean = stripped.trim_end().to_string();
    }

    clean
}

/// Lowercase, collapse hyphens and whitespace runs to single spaces, and
/// drop trailing sentence punctuation.
fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut last_was_space = false;

    for ch in lowered.trim().chars() {
        if ch.is_whitespace() || ch == '-' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(ch);
            last_was_space = false;
        }
    }

    while out.ends_with(['.', '!', '?', ',', ';', ':']) {
        out.pop();
    }

    out.trim_end().to_string()
}

/// Build the optional-article fragment between a lead-in prefix and the
/// trigger. Articles are configuration-supplied literal words and are
/// escaped here, never interpolated as raw patterns.
fn article_pattern(articles: &[String]) -> String {
    let alternatives: Vec<String> = articles
        .iter()
        .filter(|a| !a.trim().is_empty())
        .map(|a| format!(r"{}\s+", regex::escape(a.trim())))
        .collect();

    if alternatives.is_empty() {
        String::new()
    } else {
        format!("(?:{})?", alternatives.join("|"))
    }
}

/// Escape a phrase into a regex where spaces and hyphens are interchangeable.
fn flexible_pattern(phrase: &str) -> String {
    let words: Vec<String> = phrase
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(w))
        .collect();

    words.join(r"[\s-]+")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::default_lead_ins;

    fn shortcut(id: &str, triggers: &[&str]) -> StyleShortcut {
        StyleShortcut {
            id: id.to_string(),
            name: id.to_string(),
            trigger_phrases: triggers.iter().map(|t| t.to_string()).collect(),
            system_prompt: String::new(),
            enabled: true,
        }
    }

    #[test]
    fn test_detects_trigger_at_end() {
        let shortcuts = vec![shortcut("summary", &["as a summary"])];
        let found = detect_style_command(
            "Please shorten this as a summary",
            &shortcuts,
            &default_lead_ins(),
        );
        assert_eq!(found.map(|s| s.id.as_str()), Some("summary"));
    }

    #[test]
    fn test_detects_despite_trailing_punctuation_and_case() {
        let shortcuts = vec![shortcut("summary", &["summary"])];
        let found =
            detect_style_command("Mach das kürzer, Summary!", &shortcuts, &default_lead_ins());
        assert!(found.is_some());
    }

    #[test]
    fn test_detects_hyphen_variant() {
        let shortcuts = vec![shortcut("linkedin", &["linkedin post"])];
        let found = detect_style_command(
            "Das hier als LinkedIn-Post",
            &shortcuts,
            &default_lead_ins(),
        );
        assert!(found.is_some());
    }

    #[test]
    fn test_detects_via_lead_in_mid_sentence() {
        let shortcuts = vec![shortcut("list", &["liste"])];
        let found = detect_style_command(
            "strukturiere als liste was ich gesagt habe",
            &shortcuts,
            &default_lead_ins(),
        );
        assert!(found.is_some());
    }

    #[test]
    fn test_first_match_wins_across_shortcuts() {
        let shortcuts = vec![
            shortcut("first", &["summary"]),
            shortcut("second", &["summary"]),
        ];
        let found =
            detect_style_command("bitte als summary", &shortcuts, &default_lead_ins()).unwrap();
        assert_eq!(found.id, "first");
    }

    #[test]
    fn test_disabled_shortcut_is_skipped() {
        let mut disabled = shortcut("off", &["summary"]);
        disabled.enabled = false;
        let enabled = shortcut("on", &["summary"]);
        let shortcuts = [disabled, enabled];
        let found =
            detect_style_command("bitte als summary", &shortcuts, &default_lead_ins()).unwrap();
        assert_eq!(found.id, "on");
    }

    #[test]
    fn test_no_match_returns_none() {
        let shortcuts = vec![shortcut("summary", &["summary"])];
        assert!(detect_style_command("ganz normaler text", &shortcuts, &default_lead_ins())
            .is_none());
    }

    #[test]
    fn test_strip_bare_trigger_at_end() {
        let s = shortcut("summary", &["as a summary"]);
        let out = remove_style_command(
            "Please shorten this as a summary",
            &s,
            &default_lead_ins(),
        );
        assert_eq!(out, "Please shorten this");
    }

    #[test]
    fn test_strip_with_lead_in_and_article() {
        let s = shortcut("linkedin", &["linkedin post"]);
        let out = remove_style_command(
            "Heute war ein guter Tag, mach daraus einen LinkedIn Post.",
            &s,
            &default_lead_ins(),
        );
        assert_eq!(out, "Heute war ein guter Tag");
    }

    #[test]
    fn test_strip_removes_lead_in_not_just_trigger() {
        // Lead-in + trigger must be removed together, not leave "als" behind.
        let s = shortcut("summary", &["summary"]);
        let out = remove_style_command("Das Wichtigste bitte als summary", &s, &default_lead_ins());
        assert_eq!(out, "Das Wichtigste bitte");
    }

    #[test]
    fn test_strip_hyphen_space_equivalence() {
        let s = shortcut("linkedin", &["linkedin post"]);
        let out = remove_style_command("Mein Text als LinkedIn-Post", &s, &default_lead_ins());
        assert_eq!(out, "Mein Text");
    }

    #[test]
    fn test_articles_with_metacharacters_are_matched_literally() {
        let s = shortcut("summary", &["summary"]);
        let lead_ins = vec![LeadInTemplate::with_articles("turn this into", &["a(n)"])];

        // The article is a literal word, not a pattern fragment.
        let stripped =
            remove_style_command("My notes, turn this into a(n) summary", &s, &lead_ins);
        assert_eq!(stripped, "My notes");

        let untouched = remove_style_command("My notes turn this into an summary", &s, &lead_ins);
        // "an" does not equal the literal article, but the bare trigger
        // still anchors at the end.
        assert_eq!(untouched, "My notes turn this into an");
    }

    #[test]
    fn test_strip_drops_trailing_comma() {
        let s = shortcut("summary", &["summary"]);
        let out = remove_style_command("Kurz und knapp, summary", &s, &default_lead_ins());
        assert_eq!(out, "Kurz und knapp");
    }

    #[test]
    fn test_strip_is_noop_when_nothing_anchors() {
        // Detection may have matched mid-sentence; stripping must not corrupt
        // text when the trigger is not at the end.
        let s = shortcut("summary", &["summary"]);
        let text = "summary first, then the actual content";
        assert_eq!(remove_style_command(text, &s, &default_lead_ins()), text);
    }

    #[test]
    fn test_strip_preserves_case_of_retained_text() {
        let s = shortcut("summary", &["summary"]);
        let out = remove_style_command("Bitte KURZ fassen als Summary", &s, &default_lead_ins());
        assert_eq!(out, "Bitte KURZ fassen");
    }
}

use regex::Regex;
use std::sync::LazyLock;

/// Default cap on the number of names returned
pub const DEFAULT_MAX_CHARACTERS: usize = 8;

/// Titlecase word, optionally followed by a second Titlecase word
static NAME_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z][a-z]{1,20}(?:\s+[A-Z][a-z]{1,20})?)\b")
        .expect("name candidate regex is valid")
});

/// Guesses character names from Titlecase words.
///
/// Matches are taken left to right, deduplicated case-insensitively, and
/// names of two characters or fewer are dropped. Sentence-initial words
/// ("Then", "The") are not filtered, so results are guesses, not a roster.
pub fn extract_characters(text: &str, max_characters: usize) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    if text.is_empty() || max_characters == 0 {
        return names;
    }

    for candidate in NAME_CANDIDATE.find_iter(text).map(|m| m.as_str()) {
        if names.iter().any(|n| n.eq_ignore_ascii_case(candidate)) {
            continue;
        }
        if candidate.chars().count() <= 2 {
            continue;
        }

        names.push(candidate.to_string());
        if names.len() >= max_characters {
            break;
        }
    }

    names
}

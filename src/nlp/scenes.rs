use regex::Regex;
use std::sync::LazyLock;

/// A blank line (possibly holding whitespace) separates paragraphs
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("paragraph break regex is valid"));

/// Splits a story into scenes, one scene per paragraph.
///
/// Paragraphs holding a single word (or none) are glued onto the previous
/// scene so stray lines like "Later." or a lone name do not become panels.
///
/// # Example
/// ```
/// use storycomic::nlp::split_into_scenes;
/// let scenes = split_into_scenes("The door opened.\n\nSilence.\n\nA cat walked in.");
/// assert_eq!(scenes, vec!["The door opened. Silence.", "A cat walked in."]);
/// ```
pub fn split_into_scenes(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");

    let mut scenes: Vec<String> = Vec::new();
    for paragraph in PARAGRAPH_BREAK
        .split(&normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let word_count = paragraph.split_whitespace().count();
        match scenes.last_mut() {
            Some(previous) if word_count <= 1 => {
                previous.push(' ');
                previous.push_str(paragraph);
            }
            _ => scenes.push(paragraph.to_string()),
        }
    }

    scenes
}

//! Story text heuristics: scene splitting, dialogue detection and
//! character-name extraction.

pub mod characters;
pub mod dialogue;
pub mod scenes;

pub use characters::{extract_characters, DEFAULT_MAX_CHARACTERS};
pub use dialogue::detect_dialogue_lines;
pub use scenes::split_into_scenes;

use crate::models::{Panel, ParsedStory};

/// Language reported for every parsed story
pub const STORY_LANGUAGE: &str = "en";

/// Splits a story into panels and collects character names
pub fn parse_story(text: &str) -> ParsedStory {
    let characters = extract_characters(text, DEFAULT_MAX_CHARACTERS);
    let panels = split_into_scenes(text)
        .into_iter()
        .enumerate()
        .map(|(id, scene)| {
            let dialogues = detect_dialogue_lines(&scene);
            Panel::new(id, scene, dialogues)
        })
        .collect();

    ParsedStory {
        language: STORY_LANGUAGE.to_string(),
        characters,
        panels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DialogueLine;

    #[test]
    fn test_parse_story_panels_and_dialogue() {
        let story = "Mira stood at the gate.\nMira: Open up!\n\n\"Who goes there?\" a voice asked.";
        let parsed = parse_story(story);

        assert_eq!(parsed.language, "en");
        assert_eq!(parsed.panels.len(), 2);
        assert_eq!(parsed.panels[0].id, 0);
        assert_eq!(parsed.panels[1].id, 1);
        assert_eq!(
            parsed.panels[0].dialogues,
            vec![DialogueLine::new("Mira", "Open up!")]
        );
        assert_eq!(
            parsed.panels[1].dialogues,
            vec![DialogueLine::unattributed("Who goes there?")]
        );
        assert!(parsed.characters.contains(&"Mira".to_string()));
    }

    #[test]
    fn test_parse_empty_story() {
        let parsed = parse_story("");
        assert!(parsed.panels.is_empty());
        assert!(parsed.characters.is_empty());
        assert_eq!(parsed.language, "en");
    }
}

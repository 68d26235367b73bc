use crate::models::DialogueLine;

/// Longest prefix (in words) still accepted as a speaker name in `Name: speech`
const MAX_SPEAKER_WORDS: usize = 3;

/// Detects dialogue in a scene, line by line.
///
/// Two forms are recognised:
/// - `Name: speech` where the name has at most three words
/// - `"speech"` at the start of a line, attributed to nobody
///
/// Anything else is narration and is skipped.
pub fn detect_dialogue_lines(scene: &str) -> Vec<DialogueLine> {
    scene
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_line)
        .collect()
}

fn parse_line(line: &str) -> Option<DialogueLine> {
    if let Some((speaker, speech)) = line.split_once(':') {
        if speaker.split_whitespace().count() <= MAX_SPEAKER_WORDS {
            return Some(DialogueLine::new(
                speaker.trim(),
                speech.trim().trim_matches('"'),
            ));
        }
    }

    let rest = line.strip_prefix('"')?;
    let end = rest.find('"')?;
    Some(DialogueLine::unattributed(rest[..end].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_form() {
        let lines = detect_dialogue_lines("Alice: Where are we?\nBob: \"No idea.\"");
        assert_eq!(
            lines,
            vec![
                DialogueLine::new("Alice", "Where are we?"),
                DialogueLine::new("Bob", "No idea."),
            ]
        );
    }

    #[test]
    fn test_quoted_form() {
        let lines = detect_dialogue_lines("\" Run! \" she shouted.");
        assert_eq!(lines, vec![DialogueLine::unattributed("Run!")]);
        assert!(!lines[0].has_speaker());
    }

    #[test]
    fn test_narration_skipped() {
        let lines = detect_dialogue_lines("The wind howled.\nNobody moved.");
        assert!(lines.is_empty());
    }

    #[test]
    fn test_long_prefix_is_not_a_speaker() {
        // Four words before the colon: narration, not a speaker tag
        let lines = detect_dialogue_lines("At the end of the day: silence.");
        assert!(lines.is_empty());
    }

    #[test]
    fn test_three_word_speaker_accepted() {
        let lines = detect_dialogue_lines("Captain Jack Sparrow: Ahoy");
        assert_eq!(lines, vec![DialogueLine::new("Captain Jack Sparrow", "Ahoy")]);
    }

    #[test]
    fn test_speaker_form_wins_over_quotes() {
        let lines = detect_dialogue_lines("\"Look: a bird\"");
        assert_eq!(lines, vec![DialogueLine::new("\"Look", "a bird")]);
    }

    #[test]
    fn test_unterminated_quote_skipped() {
        assert!(detect_dialogue_lines("\"I never finished").is_empty());
    }

    #[test]
    fn test_empty_scene() {
        assert!(detect_dialogue_lines("").is_empty());
        assert!(detect_dialogue_lines("   \n  \n").is_empty());
    }

    #[test]
    fn test_lines_are_trimmed_before_matching() {
        let lines = detect_dialogue_lines("    \"Hello there\"   ");
        assert_eq!(lines, vec![DialogueLine::unattributed("Hello there")]);
    }
}

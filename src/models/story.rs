use serde::{Deserialize, Serialize, Serializer};

/// A single detected utterance inside a scene.
///
/// On the wire this is a `[speaker, line]` pair. The object form
/// `{"speaker": ..., "line": ...}` is accepted as input too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DialogueLine {
    /// Speaker name, empty when the line was only quoted
    #[serde(default)]
    pub speaker: String,

    /// Spoken text without surrounding quotes
    pub line: String,
}

impl DialogueLine {
    pub fn new(speaker: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            line: line.into(),
        }
    }

    /// Quoted line without a known speaker
    pub fn unattributed(line: impl Into<String>) -> Self {
        Self::new(String::new(), line)
    }

    pub fn has_speaker(&self) -> bool {
        !self.speaker.is_empty()
    }
}

impl Serialize for DialogueLine {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.speaker, &self.line).serialize(serializer)
    }
}

/// One comic panel: a scene plus the dialogue found in it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    /// Zero-based scene index
    #[serde(default)]
    pub id: usize,

    /// Scene text
    #[serde(default)]
    pub scene: String,

    /// Detected dialogue lines, in order of appearance
    #[serde(default)]
    pub dialogues: Vec<DialogueLine>,
}

impl Panel {
    pub fn new(id: usize, scene: impl Into<String>, dialogues: Vec<DialogueLine>) -> Self {
        Self {
            id,
            scene: scene.into(),
            dialogues,
        }
    }

    /// First dialogue line, used to focus the panel composition
    pub fn focus_line(&self) -> Option<&str> {
        self.dialogues.first().map(|d| d.line.as_str())
    }
}

/// Result of parsing a whole story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedStory {
    /// Story language; the heuristics only understand English
    pub language: String,

    /// Character name guesses for the whole story
    pub characters: Vec<String>,

    /// One panel per scene
    pub panels: Vec<Panel>,
}

impl ParsedStory {
    pub fn dialogues(&self) -> Vec<Vec<DialogueLine>> {
        self.panels.iter().map(|p| p.dialogues.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_line_uses_first_dialogue() {
        let panel = Panel::new(
            0,
            "A quiet room",
            vec![
                DialogueLine::unattributed("Hello"),
                DialogueLine::new("Bob", "Hi"),
            ],
        );
        assert_eq!(panel.focus_line(), Some("Hello"));
    }

    #[test]
    fn test_focus_line_empty() {
        let panel = Panel::new(0, "Nothing said", vec![]);
        assert_eq!(panel.focus_line(), None);
    }

    #[test]
    fn test_dialogue_line_wire_shape() {
        let line = DialogueLine::new("Bob", "Hi");
        assert_eq!(serde_json::to_string(&line).unwrap(), r#"["Bob","Hi"]"#);
        assert_eq!(
            serde_json::to_string(&DialogueLine::unattributed("Run!")).unwrap(),
            r#"["","Run!"]"#
        );

        let from_pair: DialogueLine = serde_json::from_str(r#"["Bob","Hi"]"#).unwrap();
        let from_object: DialogueLine =
            serde_json::from_str(r#"{"speaker":"Bob","line":"Hi"}"#).unwrap();
        assert_eq!(from_pair, line);
        assert_eq!(from_object, line);
    }

    #[test]
    fn test_panel_deserializes_with_missing_fields() {
        let panel: Panel = serde_json::from_str(r#"{"scene": "Rain"}"#).unwrap();
        assert_eq!(panel.id, 0);
        assert_eq!(panel.scene, "Rain");
        assert!(panel.dialogues.is_empty());
    }
}

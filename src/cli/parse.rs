use crate::nlp::parse_story;
use crate::Result;
use colored::Colorize;
use std::path::Path;

pub fn run(file: &Path, json: bool) -> Result<()> {
    let story = super::read_story(file)?;
    let parsed = parse_story(&story);

    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        return Ok(());
    }

    println!("{}", "📖 Parsed story".cyan());
    println!("   Language: {}", parsed.language);
    if parsed.characters.is_empty() {
        println!("   Characters: {}", "none found".yellow());
    } else {
        println!("   Characters: {}", parsed.characters.join(", "));
    }

    for panel in &parsed.panels {
        println!("\n{}", format!("Panel {}", panel.id).green().bold());
        println!("   {}", panel.scene.replace('\n', "\n   "));
        for dialogue in &panel.dialogues {
            if dialogue.has_speaker() {
                println!("   💬 {}: {}", dialogue.speaker.bold(), dialogue.line);
            } else {
                println!("   💬 {}", dialogue.line);
            }
        }
    }

    Ok(())
}

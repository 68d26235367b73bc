use crate::generation::build_prompts_for_panels;
use crate::models::Style;
use crate::nlp::parse_story;
use crate::Result;
use std::path::Path;

/// Print the prompts for every panel as JSON
pub fn run(file: &Path, style: &str) -> Result<()> {
    let story = super::read_story(file)?;
    let parsed = parse_story(&story);
    let prompts = build_prompts_for_panels(&parsed.panels, Style::from_name(style));

    println!("{}", serde_json::to_string_pretty(&prompts)?);
    Ok(())
}

use crate::generation::load_font;
use crate::models::ComicConfig;
use crate::server::{start_server, AppState};
use crate::Result;
use colored::Colorize;

pub async fn run(mut config: ComicConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    println!(
        "{}",
        format!(
            "🎨 Starting comic server ({} backend, images in {})",
            config.generation.backend,
            config.generation.output_dir.display()
        )
        .cyan()
    );

    let font = load_font(config.render.font_path.as_deref());
    let state = AppState::new(config, font)?;
    start_server(state).await
}

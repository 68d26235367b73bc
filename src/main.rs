use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use storycomic::cli::comic::ComicArgs;
use storycomic::models::ComicConfig;
use storycomic::Result;

#[derive(Parser)]
#[command(name = "storycomic")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Turn short stories into comic panels", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default storycomic.toml into the current directory
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Run the HTTP API and web front end
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Split a story into panels and show dialogue and characters
    Parse {
        /// Story file, or "-" for stdin
        file: PathBuf,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Print the image prompts built for each panel
    Prompts {
        /// Story file, or "-" for stdin
        file: PathBuf,

        /// Art style (manga, american, webtoon)
        #[arg(short, long, default_value = "manga")]
        style: String,
    },

    /// Generate panels for a story and assemble the page and PDF
    Comic {
        /// Story file, or "-" for stdin
        file: PathBuf,

        /// Art style (manga, american, webtoon)
        #[arg(short, long, default_value = "manga")]
        style: String,

        /// Skip drawing speech bubbles
        #[arg(long)]
        no_bubbles: bool,

        /// Panels per row on the page (default from config)
        #[arg(short, long)]
        columns: Option<u32>,

        /// Write images, page and PDF under this directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Assemble existing panel images into a page
    Assemble {
        /// Panel images, in reading order
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Panels per row
        #[arg(short, long, default_value = "2")]
        columns: u32,

        /// Page image path
        #[arg(short, long, default_value = "output/comic_page.png")]
        output: PathBuf,

        /// Also export the page as a PDF at this path
        #[arg(long)]
        pdf: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    storycomic::logging::init_tracing("info");
    let config = ComicConfig::load(&std::env::current_dir()?)?;

    match cli.command {
        Commands::Init { force } => {
            storycomic::cli::init::run(&std::env::current_dir()?, force)?;
        }

        Commands::Serve { host, port } => {
            storycomic::cli::serve::run(config, host, port).await?;
        }

        Commands::Parse { file, json } => {
            storycomic::cli::parse::run(&file, json)?;
        }

        Commands::Prompts { file, style } => {
            storycomic::cli::prompts::run(&file, &style)?;
        }

        Commands::Comic {
            file,
            style,
            no_bubbles,
            columns,
            output_dir,
        } => {
            let args = ComicArgs {
                file,
                style,
                no_bubbles,
                columns,
                output_dir,
            };
            storycomic::cli::comic::run(config, args).await?;
        }

        Commands::Assemble {
            images,
            columns,
            output,
            pdf,
        } => {
            storycomic::cli::assemble::run(&images, columns, &output, pdf.as_deref())?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "storycomic", &mut io::stdout());
        }
    }

    Ok(())
}

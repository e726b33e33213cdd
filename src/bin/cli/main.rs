mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "deckpress",
    about = "Convert zipped CSV flashcards into Anki packages",
    version
)]
struct Cli {
    /// Configuration file (TOML); built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Convert a ZIP of CSV and images into a package
    Convert {
        /// ZIP archive to convert
        archive: PathBuf,
        /// Output name; the package extension is added when missing
        #[arg(long, short)]
        output: Option<String>,
        /// Directory the package is written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Report what an archive would convert into
    Preview {
        /// ZIP archive to inspect
        archive: PathBuf,
    },

    /// Show the decks, notes and media inside a package
    Show {
        /// Package file
        package: PathBuf,
        /// Maximum notes to list
        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Run the upload/download web form
    Serve {
        /// Address to listen on (overrides the configuration)
        #[arg(long)]
        bind: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config.as_deref())?;

    match cli.command {
        Command::Convert {
            archive,
            output,
            out_dir,
        } => {
            commands::convert::run(
                &app,
                &archive,
                output.as_deref(),
                &out_dir,
                &cli.format,
                use_color,
            )?;
        }
        Command::Preview { archive } => {
            commands::preview::run(&app, &archive, &cli.format, use_color)?;
        }
        Command::Show { package, limit } => {
            commands::show::run(&package, limit, &cli.format, use_color)?;
        }
        Command::Serve { bind } => {
            commands::serve::run(app, bind)?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}

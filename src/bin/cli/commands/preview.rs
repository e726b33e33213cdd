use std::path::Path;

use anyhow::{Context, Result};
use tempfile::TempDir;

use deckpress_lib::convert::preview_archive;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(app: &App, archive: &Path, format: &OutputFormat, use_color: bool) -> Result<()> {
    let bytes = app.read_archive(archive)?;
    let scratch = TempDir::new().context("Failed to create scratch directory")?;

    let preview = preview_archive(&bytes, scratch.path(), &app.config)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint(&preview.data_file, Color::BOLD, use_color));
            println!("  Columns: {}", preview.columns.join(", "));
            if !preview.missing_columns.is_empty() {
                println!(
                    "  {}",
                    paint(
                        &format!("Missing columns: {}", preview.missing_columns.join(", ")),
                        Color::YELLOW,
                        use_color
                    )
                );
            }
            println!("  Rows:    {}", preview.row_count);
            match &preview.asset_folder {
                Some(folder) => println!("  Images:  {} ({} files)", folder, preview.media_count),
                None => println!("  Images:  (none)"),
            }
            println!("  Package: {}", preview.suggested_file_name);

            for reference in &preview.dangling_references {
                println!(
                    "  {}",
                    paint(
                        &format!("No image named {}", reference),
                        Color::YELLOW,
                        use_color
                    )
                );
            }
            for media in &preview.unused_media {
                println!(
                    "  {}",
                    paint(&format!("Unused image {}", media), Color::DIM, use_color)
                );
            }
        }
    }

    Ok(())
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use deckpress_lib::convert::convert_archive;
use deckpress_lib::convert::naming::disk_file_name;

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

pub fn run(
    app: &App,
    archive: &Path,
    output: Option<&str>,
    out_dir: &Path,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let bytes = app.read_archive(archive)?;
    let output_name = output.unwrap_or(&app.config.output.default_name);

    let package = convert_archive(Some(bytes.as_slice()), output_name, &app.config)?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = out_dir.join(disk_file_name(&package.file_name, &app.config));
    fs::write(&path, &package.bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "package": package,
                "path": path.to_string_lossy(),
                "bytes": package.bytes.len(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", paint(&package.summary(), Color::GREEN, use_color));
            println!("  Deck:   {}", package.deck_name);
            println!("  Source: {}", package.data_file);
            println!("  Notes:  {}", package.note_count);
            println!("  Media:  {}", package.media_files.len());
            println!(
                "  {}",
                paint(&format!("Written to {}", path.display()), Color::DIM, use_color)
            );
        }
    }

    Ok(())
}

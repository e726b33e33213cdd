use std::path::Path;

use anyhow::{Context, Result};

use deckpress_lib::apkg::read_package;

use crate::render::terminal::{one_line, paint, Color};
use crate::OutputFormat;

pub fn run(package: &Path, limit: usize, format: &OutputFormat, use_color: bool) -> Result<()> {
    let summary = read_package(package)
        .with_context(|| format!("Failed to read package {}", package.display()))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Plain => {
            for deck in &summary.deck_names {
                println!("{}", paint(deck, Color::BOLD, use_color));
            }
            println!("  Note types: {}", summary.model_names.join(", "));
            println!("  Notes: {}", summary.notes.len());
            println!("  Cards: {}", summary.card_count);
            println!("  Media: {}", summary.media.len());

            if !summary.notes.is_empty() {
                println!();
            }
            for note in summary.notes.iter().take(limit) {
                let fields: Vec<String> = note.fields.iter().map(|f| one_line(f, 40)).collect();
                println!("  {}", fields.join(" | "));
            }
            if summary.notes.len() > limit {
                println!(
                    "  {}",
                    paint(
                        &format!("... {} more", summary.notes.len() - limit),
                        Color::DIM,
                        use_color
                    )
                );
            }
        }
    }

    Ok(())
}

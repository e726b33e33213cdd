//! Output and deck naming rules

use std::path::Path;

use crate::config::ConverterConfig;

/// Case-insensitive `ends_with` that is safe on any UTF-8 input
fn ends_with_ignore_case(name: &str, suffix: &str) -> bool {
    if name.len() < suffix.len() {
        return false;
    }
    let split = name.len() - suffix.len();
    name.is_char_boundary(split) && name[split..].eq_ignore_ascii_case(suffix)
}

/// Base name of the data file without its extension
pub fn data_file_stem(data_file: &Path) -> String {
    data_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// The name to build the package under.
///
/// Leaving the requested name at the placeholder (or blank) means the
/// package is named after the data file.
pub fn resolve_output_name(requested: &str, data_file: &Path, config: &ConverterConfig) -> String {
    let requested = requested.trim();
    if requested.is_empty() || requested == config.output.default_name {
        data_file_stem(data_file)
    } else {
        requested.to_string()
    }
}

/// Deck name: the output name without a trailing package extension
pub fn deck_name(output_name: &str, config: &ConverterConfig) -> String {
    let suffix = config.package_suffix();
    if ends_with_ignore_case(output_name, &suffix) {
        output_name[..output_name.len() - suffix.len()].to_string()
    } else {
        output_name.to_string()
    }
}

/// File name of the delivered package: the extension is appended once
pub fn package_file_name(output_name: &str, config: &ConverterConfig) -> String {
    let suffix = config.package_suffix();
    if ends_with_ignore_case(output_name, &suffix) {
        output_name.to_string()
    } else {
        format!("{}{}", output_name, suffix)
    }
}

/// File name safe to create inside the scratch directory
pub fn disk_file_name(file_name: &str, config: &ConverterConfig) -> String {
    let sanitized = sanitize_filename::sanitize(file_name);
    if sanitized.is_empty() || sanitized == config.package_suffix() {
        format!("deck{}", config.package_suffix())
    } else {
        sanitized
    }
}

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
}

/// Wrap `text` in `color` when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// Flatten a field for one-line display: tags removed, whitespace collapsed
pub fn one_line(field: &str, max_chars: usize) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    for c in field.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > max_chars {
        let truncated: String = collapsed.chars().take(max_chars).collect();
        format!("{}…", truncated)
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line() {
        assert_eq!(one_line("<img src=\"cat.png\">  a\n cat", 40), "a cat");
        assert_eq!(one_line("abcdef", 3), "abc…");
    }

    #[test]
    fn test_paint_without_color() {
        assert_eq!(paint("x", Color::BOLD, false), "x");
        assert_eq!(paint("x", Color::BOLD, true), "\x1b[1mx\x1b[0m");
    }
}

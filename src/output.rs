//! Terminal styling from the active theme palette

use app_core::{AdviceRecord, ValidationErrors};
use app_ui::{parse_hex_color, ThemeColors};
use colored::{ColoredString, Colorize};

/// Width of list previews, in characters
const PREVIEW_CHARS: usize = 72;

pub struct Palette {
    colors: ThemeColors,
}

impl Palette {
    pub fn new(colors: ThemeColors) -> Self {
        Self { colors }
    }

    fn paint(&self, text: &str, hex: &str) -> ColoredString {
        match parse_hex_color(hex) {
            Some((r, g, b)) => text.truecolor(r, g, b),
            None => text.normal(),
        }
    }

    pub fn title(&self, text: &str) -> ColoredString {
        self.paint(text, self.colors.primary).bold()
    }

    pub fn accent(&self, text: &str) -> ColoredString {
        self.paint(text, self.colors.secondary)
    }

    pub fn muted(&self, text: &str) -> ColoredString {
        self.paint(text, self.colors.subtext)
    }

    pub fn success(&self, text: &str) -> ColoredString {
        self.paint(text, self.colors.success)
    }

    pub fn error(&self, text: &str) -> ColoredString {
        self.paint(text, self.colors.error)
    }

    /// Two-cell block filled with `hex`
    pub fn swatch(&self, hex: &str) -> ColoredString {
        match parse_hex_color(hex) {
            Some((r, g, b)) => "  ".on_truecolor(r, g, b),
            None => "  ".normal(),
        }
    }

    pub fn print_errors(&self, errors: &ValidationErrors) {
        for (field, message) in errors.iter() {
            eprintln!("{} {}", self.error(&format!("{field}:")), message);
        }
    }

    pub fn print_record_summary(&self, record: &AdviceRecord) {
        println!(
            "{}  {}",
            self.accent(short_id(&record.id)),
            self.muted(&record.date_label())
        );
        println!("  {}", preview(&record.situation));
        println!("  {}", self.muted(&preview(&record.advice)));
    }

    pub fn print_advice(&self, situation: &str, advice: &str) {
        println!("{}", self.title("Your Approach Strategy"));
        println!("{}", self.muted(situation));
        println!();
        println!("{advice}");
        println!();
    }
}

/// Leading segment of a record id, enough to address it from the command line
pub fn short_id(id: &str) -> &str {
    id.split('-').next().unwrap_or(id)
}

/// First line of `text`, cut to the preview width
pub fn preview(text: &str) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > PREVIEW_CHARS {
        let cut: String = line.chars().take(PREVIEW_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use app_ui::LIGHT_COLORS;

    #[test]
    fn test_preview_cuts_long_lines() {
        assert_eq!(preview("short\nsecond line"), "short");
        let long = "x".repeat(100);
        let cut = preview(&long);
        assert_eq!(cut.chars().count(), PREVIEW_CHARS);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("3f2b9c1a-aaaa-bbbb"), "3f2b9c1a");
        assert_eq!(short_id("plain"), "plain");
    }

    #[test]
    fn test_palette_keeps_text() {
        colored::control::set_override(false);
        let palette = Palette::new(LIGHT_COLORS);
        assert_eq!(palette.title("Plans").to_string(), "Plans");
        assert_eq!(palette.error("oops").to_string(), "oops");
    }
}

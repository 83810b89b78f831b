//! Visual theme and styling.

use console::Style;

/// berth's visual theme.
#[derive(Debug, Clone)]
pub struct BerthTheme {
    /// Style for success messages (green).
    pub success: Style,
    /// Style for warning messages (orange).
    pub warning: Style,
    /// Style for error messages (red bold).
    pub error: Style,
    /// Style for dim/secondary text.
    pub dim: Style,
    /// Style for highlighted/important text (bold).
    pub highlight: Style,
    /// Style for headers (cyan bold).
    pub header: Style,
    /// Style for key labels in key-value displays (bold).
    pub key: Style,
}

impl Default for BerthTheme {
    fn default() -> Self {
        Self::new()
    }
}

impl BerthTheme {
    /// Create the default theme.
    pub fn new() -> Self {
        Self {
            success: Style::new().green(),
            warning: Style::new().color256(208),
            error: Style::new().red().bold(),
            dim: Style::new().dim(),
            highlight: Style::new().bold(),
            header: Style::new().bold().cyan(),
            key: Style::new().bold(),
        }
    }

    /// Create a theme without colors (for non-TTY or --no-color).
    pub fn plain() -> Self {
        Self {
            success: Style::new(),
            warning: Style::new(),
            error: Style::new(),
            dim: Style::new(),
            highlight: Style::new(),
            header: Style::new(),
            key: Style::new(),
        }
    }

    /// Format a success message (icon + text in green).
    pub fn format_success(&self, msg: &str) -> String {
        format!("{}", self.success.apply_to(format!("✓ {}", msg)))
    }

    /// Format a warning message (icon + text in orange).
    pub fn format_warning(&self, msg: &str) -> String {
        format!("{}", self.warning.apply_to(format!("⚠ {}", msg)))
    }

    /// Format an error message (icon + text in red bold).
    pub fn format_error(&self, msg: &str) -> String {
        format!("{}", self.error.apply_to(format!("✗ {}", msg)))
    }

    /// Format a header banner.
    pub fn format_header(&self, title: &str) -> String {
        format!(
            "{} {}",
            self.header.apply_to("⚓"),
            self.highlight.apply_to(title)
        )
    }

    /// Format a `key: value` line, aligning keys to `width`.
    pub fn format_field(&self, key: &str, value: &str, width: usize) -> String {
        format!(
            "  {} {}",
            self.key.apply_to(format!("{:<width$}", format!("{}:", key))),
            value
        )
    }
}

/// Check if colors should be enabled.
pub fn should_use_colors() -> bool {
    // https://no-color.org/
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    console::Term::stdout().is_term()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_theme_formats_success() {
        let theme = BerthTheme::plain();
        assert_eq!(theme.format_success("ready"), "✓ ready");
    }

    #[test]
    fn plain_theme_formats_warning_and_error() {
        let theme = BerthTheme::plain();
        assert_eq!(theme.format_warning("careful"), "⚠ careful");
        assert_eq!(theme.format_error("broken"), "✗ broken");
    }

    #[test]
    fn plain_theme_formats_header() {
        let theme = BerthTheme::plain();
        assert_eq!(theme.format_header("shop"), "⚓ shop");
    }

    #[test]
    fn format_field_aligns_keys() {
        let theme = BerthTheme::plain();
        assert_eq!(theme.format_field("host", "localhost", 10), "  host:      localhost");
    }

    #[test]
    fn colored_theme_contains_text() {
        let theme = BerthTheme::new();
        assert!(theme.format_success("done").contains("done"));
    }
}

//! Terminal styling helpers

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream, Style};

/// Check mark for completed steps
pub const CHECK: &str = "✓";

/// Cross for failed steps
pub const CROSS: &str = "✗";

/// Styled text that respects whether stdout supports color
pub trait Stylize: std::fmt::Display {
    /// Apply a style when the terminal supports color
    fn styled(&self, style: Style) -> String {
        format!(
            "{}",
            self.if_supports_color(Stream::Stdout, |text| text.style(style))
        )
    }

    /// De-emphasized text
    fn muted(&self) -> String {
        self.styled(Style::new().dimmed())
    }

    /// Bold text
    fn emphasis(&self) -> String {
        self.styled(Style::new().bold())
    }

    /// Highlighted values (branch and repository names)
    fn accent(&self) -> String {
        self.styled(Style::new().cyan())
    }

    /// Success text
    fn success(&self) -> String {
        self.styled(Style::new().green())
    }

    /// Warning text
    fn warn(&self) -> String {
        self.styled(Style::new().yellow())
    }

    /// Error text
    fn error(&self) -> String {
        self.styled(Style::new().red())
    }
}

impl<T: std::fmt::Display + ?Sized> Stylize for T {}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Red cross
pub fn cross() -> String {
    CROSS.error()
}

/// Spinner style for long-running listings
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}

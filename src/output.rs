//! # Output Configuration
//!
//! Controls whether report lines are coloured. Colour is on unless turned off
//! by a flag or by the environment:
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals

use std::env;
use std::fmt::Display;

use console::Style;

/// Output configuration for controlling colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// Builds the configuration from a `--no-color` style flag and the
    /// environment. The flag always wins.
    pub fn from_env_and_flag(no_color: bool) -> Self {
        let use_color = !no_color && Self::detect_color_support();
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        // The presence of the variable (even if empty) disables colors
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }

        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }

        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }

        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }

        console::Term::stdout().features().colors_supported()
    }

    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    pub fn without_color() -> Self {
        Self { use_color: false }
    }

    /// Renders `text` in `style` when colour is enabled, plain otherwise.
    pub fn paint(&self, style: Style, text: impl Display) -> String {
        if self.use_color {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag(false)
    }
}

/// Bold green, for good states and completed updates.
pub fn good() -> Style {
    Style::new().green().bold()
}

/// Bold red, for everything that needs attention.
pub fn bad() -> Style {
    Style::new().red().bold()
}

/// Bold blue, for references.
pub fn reference() -> Style {
    Style::new().blue().bold()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_flag_disables_color() {
        assert!(!OutputConfig::from_env_and_flag(true).use_color);
    }

    #[test]
    #[serial]
    fn test_no_color_env_disables_color() {
        let saved = env::var_os("NO_COLOR");
        env::set_var("NO_COLOR", "");
        let config = OutputConfig::from_env_and_flag(false);
        match saved {
            Some(value) => env::set_var("NO_COLOR", value),
            None => env::remove_var("NO_COLOR"),
        }
        assert!(!config.use_color);
    }

    #[test]
    fn test_paint_plain() {
        let config = OutputConfig::without_color();
        assert_eq!(config.paint(bad(), "X"), "X");
    }

    #[test]
    fn test_paint_colored() {
        let config = OutputConfig::with_color();
        let painted = config.paint(good(), "ok");
        assert!(painted.contains("ok"));
        assert!(painted.contains("\u{1b}["));
    }
}

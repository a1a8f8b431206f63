use std::io::{self, Write};

/// Terminal control and ANSI color handling
#[derive(Debug, Clone, Copy)]
pub struct Terminal {
    pub supports_color: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Self::with_colors(console::colors_enabled())
    }

    pub fn with_colors(supports_color: bool) -> Self {
        Self { supports_color }
    }

    /// Whether stdout is an interactive terminal
    pub fn is_interactive(&self) -> bool {
        console::user_attended()
    }

    /// Clear the entire screen
    pub fn clear_screen(&self) -> io::Result<()> {
        print!("\x1B[2J\x1B[1;1H");
        io::stdout().flush()
    }

    /// Hide cursor while waiting between passes
    pub fn hide_cursor(&self) -> io::Result<()> {
        print!("\x1B[?25l");
        io::stdout().flush()
    }

    /// Show cursor
    pub fn show_cursor(&self) -> io::Result<()> {
        print!("\x1B[?25h");
        io::stdout().flush()
    }

    /// Style of a PASS/FAIL marker
    pub fn status_style(&self, passed: bool) -> console::Style {
        let style = console::Style::new();
        if !self.supports_color {
            return style;
        }

        if passed {
            style.green().bold()
        } else {
            style.red().bold()
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

use super::terminal::Terminal;

/// Tally bar of passed vs failed checks
pub struct ProgressBar {
    width: usize,
    terminal: Terminal,
}

impl ProgressBar {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            terminal: Terminal::new(),
        }
    }

    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = terminal;
        self
    }

    /// `[####xx] 4/6`: `#` cells for passed checks, `x` cells for failed ones
    pub fn render(&self, passed: usize, total: usize) -> String {
        let passed = passed.min(total);
        let filled = if total == 0 {
            0
        } else {
            ((passed as f64 / total as f64) * self.width as f64).round() as usize
        };
        let failed_cells = if total == 0 { 0 } else { self.width - filled };
        let idle_cells = self.width - filled - failed_cells;

        let passed_part = "#".repeat(filled);
        let failed_part = "x".repeat(failed_cells);
        let (passed_part, failed_part) = if self.terminal.supports_color {
            (
                self.terminal.status_style(true).apply_to(passed_part).to_string(),
                self.terminal.status_style(false).apply_to(failed_part).to_string(),
            )
        } else {
            (passed_part, failed_part)
        };

        format!(
            "[{}{}{}] {}/{}",
            passed_part,
            failed_part,
            ".".repeat(idle_cells),
            passed,
            total
        )
    }
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new(20)
    }
}

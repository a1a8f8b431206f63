//! Display module for terminal output and formatting

pub mod formatter;
pub mod progress;
pub mod terminal;

// Re-export commonly used items
pub use formatter::{format_bytes, format_elapsed};
pub use progress::ProgressBar;
pub use terminal::Terminal;

//! System interface abstractions for testing and development

pub mod filesystem;

// Re-export commonly used traits
pub use filesystem::FilesystemReader;

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Reasons a bundle check can fail
#[derive(Debug, Error, PartialEq)]
pub enum VerifyError {
    /// The artifact root is missing or not a directory
    #[error("artifact directory {} does not exist or is not a directory", .path.display())]
    ArtifactDirMissing { path: PathBuf },

    /// File system operation failed
    #[error("filesystem {operation} failed for path {}: {message}", .path.display())]
    Filesystem {
        path: PathBuf,
        operation: String,
        message: String,
    },

    /// The nodes directory holds no node folder
    #[error("no node folders found under {}", .path.display())]
    NoNodes { path: PathBuf },

    #[error("expected {expected} folders in the {subdirectory} subdirectory, found {found}")]
    NodeCountMismatch {
        subdirectory: String,
        expected: usize,
        found: usize,
    },

    /// An expected collected file is absent for a node
    #[error("node {node} is missing {}", .path.display())]
    MissingFile { node: String, path: PathBuf },

    /// Parsing failed for a specific data source
    #[error("failed to parse {data_source}: {reason}")]
    Parse { data_source: String, reason: String },

    #[error("bean {name} not found in the metrics dump of node {node}")]
    BeanNotFound { node: String, name: String },

    /// File content does not satisfy the expectation
    #[error("unexpected content in {file} of node {node}: expected {expected}, found {found}")]
    ContentMismatch {
        node: String,
        file: String,
        expected: String,
        found: String,
    },

    #[error("no content check is known for file {0}")]
    UnknownContentCheck(String),

    /// Wait mode gave up before the bundle verified
    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },
}

impl VerifyError {
    pub fn artifact_dir_missing(path: &Path) -> Self {
        VerifyError::ArtifactDirMissing {
            path: path.to_path_buf(),
        }
    }

    /// Create a filesystem error
    pub fn filesystem_error(path: &Path, operation: &str, message: &str) -> Self {
        VerifyError::Filesystem {
            path: path.to_path_buf(),
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    pub fn no_nodes(path: &Path) -> Self {
        VerifyError::NoNodes {
            path: path.to_path_buf(),
        }
    }

    pub fn node_count_mismatch(subdirectory: &str, expected: usize, found: usize) -> Self {
        VerifyError::NodeCountMismatch {
            subdirectory: subdirectory.to_string(),
            expected,
            found,
        }
    }

    pub fn missing_file(node: &str, path: &Path) -> Self {
        VerifyError::MissingFile {
            node: node.to_string(),
            path: path.to_path_buf(),
        }
    }

    /// Create a parse error
    pub fn parse_error(data_source: &str, reason: &str) -> Self {
        VerifyError::Parse {
            data_source: data_source.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn bean_not_found(node: &str, name: &str) -> Self {
        VerifyError::BeanNotFound {
            node: node.to_string(),
            name: name.to_string(),
        }
    }

    /// Create a content mismatch error
    pub fn content_mismatch(node: &str, file: &str, expected: &str, found: &str) -> Self {
        VerifyError::ContentMismatch {
            node: node.to_string(),
            file: file.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    pub fn timeout_error(operation: &str, timeout: Duration) -> Self {
        VerifyError::Timeout {
            operation: operation.to_string(),
            timeout,
        }
    }
}

/// Result type alias for bundle checks
pub type VerifyResult<T> = Result<T, VerifyError>;

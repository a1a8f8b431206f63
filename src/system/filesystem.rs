use std::collections::BTreeMap;
use std::error::Error;
use std::path::{Path, PathBuf};

/// Abstraction for filesystem access to enable testing without real bundles
pub trait FilesystemReader {
    fn read_to_string(&self, path: &Path) -> Result<String, Box<dyn Error>>;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    /// Names of the direct children of `path`, files and directories alike
    fn list_dir(&self, path: &Path) -> Result<Vec<String>, Box<dyn Error>>;
    fn file_size(&self, path: &Path) -> Option<u64>;
}

/// Real filesystem reader using std::fs
pub struct RealFilesystemReader;

impl FilesystemReader for RealFilesystemReader {
    fn read_to_string(&self, path: &Path) -> Result<String, Box<dyn Error>> {
        Ok(std::fs::read_to_string(path)?)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        Ok(names)
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().map(|meta| meta.len())
    }
}

/// In-memory reader serving a fixed set of files.
///
/// Directories are implied by the paths of the files they contain.
#[derive(Debug, Default, Clone)]
pub struct DemoFilesystemReader {
    files: BTreeMap<PathBuf, String>,
}

impl DemoFilesystemReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, replacing any previous content at the same path
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.files.insert(path.into(), content.into());
        self
    }

    #[cfg(test)]
    pub fn remove_file(&mut self, path: &Path) -> Option<String> {
        self.files.remove(path)
    }
}

impl FilesystemReader for DemoFilesystemReader {
    fn read_to_string(&self, path: &Path) -> Result<String, Box<dyn Error>> {
        if let Some(content) = self.files.get(path) {
            Ok(content.clone())
        } else {
            Err(format!("Demo: File not mocked: {}", path.display()).into())
        }
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<String>, Box<dyn Error>> {
        if !self.is_dir(path) {
            return Err(format!("Demo: Directory not mocked: {}", path.display()).into());
        }

        let mut names: Vec<String> = self
            .files
            .keys()
            .filter_map(|file| file.strip_prefix(path).ok())
            .filter_map(|rest| rest.components().next())
            .map(|first| first.as_os_str().to_string_lossy().into_owned())
            .collect();
        names.dedup();
        Ok(names)
    }

    fn file_size(&self, path: &Path) -> Option<u64> {
        self.files.get(path).map(|content| content.len() as u64)
    }
}

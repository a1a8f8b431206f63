use super::error::{VerifyError, VerifyResult};
use crate::system::FilesystemReader;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_NODES_DIR: &str = "nodes";

/// Where collected artifacts live on disk
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactLayout {
    root: PathBuf,
    nodes_dir: String,
}

impl ArtifactLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_nodes_dir(root, DEFAULT_NODES_DIR)
    }

    pub fn with_nodes_dir(root: impl Into<PathBuf>, nodes_dir: &str) -> Self {
        Self {
            root: root.into(),
            nodes_dir: nodes_dir.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn nodes_dir(&self) -> &str {
        &self.nodes_dir
    }

    /// `<root>/<subdirectory>`
    pub fn subdirectory_path(&self, subdirectory: &str) -> PathBuf {
        self.root.join(subdirectory)
    }

    pub fn nodes_path(&self) -> PathBuf {
        self.subdirectory_path(&self.nodes_dir)
    }

    pub fn node_path(&self, node: &str) -> PathBuf {
        self.nodes_path().join(node)
    }

    /// Path of `relative` inside a node; an empty `relative` is the node itself
    pub fn node_file(&self, node: &str, relative: &str) -> PathBuf {
        let node_path = self.node_path(node);
        if relative.is_empty() {
            node_path
        } else {
            node_path.join(relative)
        }
    }

    /// Non-hidden folders directly under `<root>/<subdirectory>`, sorted by name
    pub fn list_folders<F: FilesystemReader>(
        &self,
        reader: &F,
        subdirectory: &str,
    ) -> VerifyResult<Vec<String>> {
        let path = self.subdirectory_path(subdirectory);
        let names = reader
            .list_dir(&path)
            .map_err(|e| VerifyError::filesystem_error(&path, "list", &e.to_string()))?;

        let mut folders: Vec<String> = names
            .into_iter()
            .filter(|name| !name.starts_with('.'))
            .filter(|name| reader.is_dir(&path.join(name)))
            .collect();
        folders.sort();
        Ok(folders)
    }

    /// Node folders of the bundle, never empty
    pub fn list_nodes<F: FilesystemReader>(&self, reader: &F) -> VerifyResult<Vec<String>> {
        let nodes = self.list_folders(reader, &self.nodes_dir)?;
        if nodes.is_empty() {
            return Err(VerifyError::no_nodes(&self.nodes_path()));
        }
        Ok(nodes)
    }

    pub fn first_node<F: FilesystemReader>(&self, reader: &F) -> VerifyResult<String> {
        let nodes = self.list_nodes(reader)?;
        nodes
            .into_iter()
            .next()
            .ok_or_else(|| VerifyError::no_nodes(&self.nodes_path()))
    }
}

/// Which nodes a content check inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum NodeSelection {
    First,
    Random {
        #[serde(default)]
        seed: Option<u64>,
    },
    All,
}

impl NodeSelection {
    /// Pick nodes out of a sorted, non-empty listing
    pub fn select(&self, nodes: &[String]) -> Vec<String> {
        match self {
            NodeSelection::First => nodes.first().cloned().into_iter().collect(),
            NodeSelection::Random { seed: Some(seed) } => {
                pick_random(nodes, &mut StdRng::seed_from_u64(*seed))
            }
            NodeSelection::Random { seed: None } => pick_random(nodes, &mut rand::rng()),
            NodeSelection::All => nodes.to_vec(),
        }
    }
}

impl Default for NodeSelection {
    fn default() -> Self {
        NodeSelection::Random { seed: None }
    }
}

fn pick_random<R: Rng + ?Sized>(nodes: &[String], rng: &mut R) -> Vec<String> {
    nodes.choose(rng).cloned().into_iter().collect()
}

impl std::fmt::Display for NodeSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            NodeSelection::First => write!(f, "first"),
            NodeSelection::Random { seed: Some(seed) } => write!(f, "random (seed {})", seed),
            NodeSelection::Random { seed: None } => write!(f, "random"),
            NodeSelection::All => write!(f, "all"),
        }
    }
}

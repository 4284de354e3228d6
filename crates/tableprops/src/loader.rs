//! Desired configuration loading.

use std::path::{Path, PathBuf};

use tableprops_core::ConfigTree;
use tracing::info;

use crate::error::Result;
use crate::format::load_tree;

/// Loads an operator-authored YAML or JSON definition.
#[derive(Debug, Clone)]
pub struct DesiredConfigLoader {
    path: PathBuf,
}

impl DesiredConfigLoader {
    /// Creates a loader for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the definition file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses the definition. A blank file yields an empty tree, which
    /// produces no statements.
    pub fn load(&self) -> Result<ConfigTree> {
        let tree = load_tree(&self.path)?;
        info!(path = %self.path.display(), keys = tree.len(), "loaded desired config");
        Ok(tree)
    }
}

//! YAML and JSON configuration files.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use clap::ValueEnum;
use tableprops_core::ConfigTree;
use tracing::{debug, info};

use crate::error::{Result, ToolError};

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FileFormat {
    /// YAML (`.yaml`, `.yml`)
    #[default]
    Yaml,
    /// JSON (`.json`)
    Json,
}

impl FileFormat {
    /// Detects the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("yaml" | "yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(ToolError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// Preferred file extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }

    /// Parses a configuration tree. Blank input is an empty tree.
    pub fn parse(self, text: &str, path: &Path) -> Result<ConfigTree> {
        if text.trim().is_empty() {
            return Ok(ConfigTree::new());
        }
        match self {
            Self::Yaml => serde_yaml::from_str(text).map_err(|source| ToolError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
            Self::Json => serde_json::from_str(text).map_err(|source| ToolError::Json {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Renders a configuration tree, ending with a newline.
    pub fn render(self, tree: &ConfigTree, path: &Path) -> Result<String> {
        match self {
            Self::Yaml => serde_yaml::to_string(tree).map_err(|source| ToolError::Yaml {
                path: path.to_path_buf(),
                source,
            }),
            Self::Json => serde_json::to_string_pretty(tree)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|source| ToolError::Json {
                    path: path.to_path_buf(),
                    source,
                }),
        }
    }
}

/// Reads a file into a string.
pub fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads a YAML or JSON configuration tree, picking the format from the
/// file extension.
pub fn load_tree(path: &Path) -> Result<ConfigTree> {
    let format = FileFormat::from_path(path)?;
    let text = read_file(path)?;
    debug!(path = %path.display(), ?format, "loading configuration");
    format.parse(&text, path)
}

/// Writes a configuration tree.
///
/// An existing file is only replaced when `force` is set.
pub fn write_tree(path: &Path, tree: &ConfigTree, format: FileFormat, force: bool) -> Result<()> {
    let text = format.render(tree, path)?;

    let result = if force {
        fs::write(path, text)
    } else {
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .and_then(|mut file| std::io::Write::write_all(&mut file, text.as_bytes()))
    };

    match result {
        Ok(()) => {
            info!(path = %path.display(), "configuration written");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            Err(ToolError::FileExists(path.to_path_buf()))
        }
        Err(source) => Err(ToolError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Builds `<prefix>_<YYYYmmdd-HHMMSS>.<ext>`.
///
/// An empty prefix yields just the timestamp; `ext` may be given with or
/// without its leading dot.
#[must_use]
pub fn timestamped_filename(prefix: &str, ext: &str, at: DateTime<Local>) -> PathBuf {
    let stamp = at.format("%Y%m%d-%H%M%S");
    let ext = ext.trim_start_matches('.');
    let name = if prefix.is_empty() {
        format!("{}.{}", stamp, ext)
    } else {
        format!("{}_{}.{}", prefix, stamp, ext)
    };
    PathBuf::from(name)
}

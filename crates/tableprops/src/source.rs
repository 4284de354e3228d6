//! Sources of the current cluster configuration.
//!
//! The tool never talks to a cluster itself. The current state comes either
//! from a snapshot written earlier (`dump`, or any YAML/JSON file in the
//! canonical shape) or from a JSON export of the schema tables, which is run
//! through the [`Normalizer`].
//!
//! A row export is a JSON object with one array of row objects per table:
//!
//! ```json
//! {
//!   "keyspaces": [{"keyspace_name": "excalibur", "durable_writes": true, "replication": {...}}],
//!   "tables": [{"keyspace_name": "excalibur", "table_name": "widgets", ...}],
//!   "roles": [{"role": "alice", "can_login": true, "is_superuser": false, "member_of": null}],
//!   "role_permissions": [{"role": "alice", "resource": "data/excalibur", "permissions": ["SELECT"]}]
//! }
//! ```
//!
//! Only `keyspaces` is required. Role data is included when a `roles` array
//! is present.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tableprops_core::normalize::{Normalizer, RawRow, RawValue, ID_COLUMN};
use tableprops_core::value::KEYSPACES_KEY;
use tableprops_core::{ConfigTree, ConfigValue};
use tracing::{debug, info};

use crate::error::{Result, ToolError};
use crate::format::{load_tree, read_file};

/// Something that can produce the current configuration tree.
pub trait ConfigSource {
    /// Returns the current `{"keyspaces": [...], "roles": {...}}` tree.
    ///
    /// Fails with [`ToolError::NoKeyspaces`] when no user keyspace is left.
    fn current_config(&self) -> Result<ConfigTree>;

    /// Short description for log messages.
    fn describe(&self) -> String;
}

/// A canonical snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotSource {
    path: PathBuf,
}

impl SnapshotSource {
    /// Creates a source reading the given YAML or JSON file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigSource for SnapshotSource {
    fn current_config(&self) -> Result<ConfigTree> {
        let tree = load_tree(&self.path)?;
        require_keyspaces(&tree, self)?;
        info!(source = %self.describe(), "loaded current config");
        Ok(tree)
    }

    fn describe(&self) -> String {
        format!("snapshot {}", self.path.display())
    }
}

/// A JSON export of schema and auth table rows.
#[derive(Debug, Clone)]
pub struct RowExportSource {
    path: PathBuf,
    normalizer: Normalizer,
}

impl RowExportSource {
    /// Creates a source reading the given export file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            normalizer: Normalizer::new(),
        }
    }

    /// Uses the given normalizer settings.
    #[must_use]
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    fn rows(&self, export: &Map<String, Value>, section: &str) -> Result<Vec<RawRow>> {
        match export.get(section) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(rows)) => rows
                .iter()
                .enumerate()
                .map(|(i, row)| match row {
                    Value::Object(columns) => Ok(raw_row(columns)),
                    _ => Err(self.invalid(format!("{}[{}] is not an object", section, i))),
                })
                .collect(),
            Some(_) => Err(self.invalid(format!("'{}' is not an array", section))),
        }
    }

    fn invalid(&self, message: String) -> ToolError {
        ToolError::InvalidExport {
            path: self.path.clone(),
            message,
        }
    }
}

impl ConfigSource for RowExportSource {
    fn current_config(&self) -> Result<ConfigTree> {
        let text = read_file(&self.path)?;
        let export: Value = serde_json::from_str(&text).map_err(|source| ToolError::Json {
            path: self.path.clone(),
            source,
        })?;
        let Value::Object(export) = export else {
            return Err(self.invalid("top level is not an object".to_string()));
        };
        if !export.contains_key("keyspaces") {
            return Err(self.invalid("missing 'keyspaces' rows".to_string()));
        }

        let keyspace_rows = self.rows(&export, "keyspaces")?;
        let table_rows = self.rows(&export, "tables")?;
        debug!(
            keyspaces = keyspace_rows.len(),
            tables = table_rows.len(),
            "normalizing schema rows"
        );
        let mut tree = self.normalizer.keyspaces(&keyspace_rows, &table_rows)?;

        if export.contains_key("roles") {
            let role_rows = self.rows(&export, "roles")?;
            let permission_rows = self.rows(&export, "role_permissions")?;
            tree.extend(self.normalizer.roles(&role_rows, &permission_rows)?);
        }
        require_keyspaces(&tree, self)?;

        info!(source = %self.describe(), "loaded current config");
        Ok(tree)
    }

    fn describe(&self) -> String {
        format!("row export {}", self.path.display())
    }
}

/// Picks the source for `path`: a row export when `rows` is set, a
/// snapshot otherwise.
pub fn open_source(path: &Path, rows: bool, normalizer: Normalizer) -> Box<dyn ConfigSource> {
    if rows {
        Box::new(RowExportSource::new(path).with_normalizer(normalizer))
    } else {
        Box::new(SnapshotSource::new(path))
    }
}

/// A blank file, a missing `keyspaces` key and an export holding only
/// system keyspaces all end up here.
fn require_keyspaces(tree: &ConfigTree, source: &dyn ConfigSource) -> Result<()> {
    let found = match tree.get(KEYSPACES_KEY) {
        Some(ConfigValue::List(keyspaces)) => !keyspaces.is_empty(),
        None | Some(ConfigValue::Null) => false,
        Some(_) => true,
    };
    if found {
        Ok(())
    } else {
        Err(ToolError::NoKeyspaces(source.describe()))
    }
}

fn raw_row(columns: &Map<String, Value>) -> RawRow {
    columns
        .iter()
        .map(|(column, value)| {
            let value = match value {
                Value::String(id) if column == ID_COLUMN => RawValue::Uuid(id.clone()),
                other => raw_value(other),
            };
            (column.clone(), value)
        })
        .collect()
}

/// JSON arrays of strings stand for set columns, other arrays for lists.
fn raw_value(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::Null,
        Value::Bool(b) => RawValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => RawValue::Int(i),
            None => RawValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => RawValue::Text(s.clone()),
        Value::Array(items) => {
            let strings: Option<Vec<String>> = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect();
            match strings {
                Some(strings) => RawValue::SortedSet(strings),
                None => RawValue::List(items.iter().map(raw_value).collect()),
            }
        }
        Value::Object(entries) => RawValue::OrderedMap(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), raw_value(value)))
                .collect(),
        ),
    }
}

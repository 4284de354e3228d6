//! Config normalizer.
//!
//! Database drivers hand back schema rows with their own value types:
//! ordered maps for `replication` or `compaction`, sorted sets for `flags`,
//! UUIDs for table ids, and numbers stored as text inside option maps.
//! [`Normalizer`] turns such rows into the canonical [`ConfigTree`] shape
//! the diff engine works on.
//!
//! The rows are described by [`RawValue`], so this module stays independent
//! of any particular driver.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{ConfigError, Result};
use crate::value::{ConfigTree, ConfigValue, CLASS_KEY, KEYSPACES_KEY, NAME_KEY};

/// Column holding the keyspace name in keyspace and table rows.
pub const KEYSPACE_NAME_COLUMN: &str = "keyspace_name";

/// Column holding the table name in table rows.
pub const TABLE_NAME_COLUMN: &str = "table_name";

/// Column holding the table identifier.
pub const ID_COLUMN: &str = "id";

/// Key of the per-data-center list in the expanded replication form.
pub const DATA_CENTERS_KEY: &str = "data_centers";

/// A value as read from a driver row.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// SQL null.
    Null,
    /// Boolean column.
    Bool(bool),
    /// Integer column.
    Int(i64),
    /// Floating point column.
    Float(f64),
    /// Text column.
    Text(String),
    /// UUID column, already rendered as text.
    Uuid(String),
    /// Map column, entries in storage order.
    OrderedMap(Vec<(String, RawValue)>),
    /// Set column.
    SortedSet(Vec<String>),
    /// List column.
    List(Vec<RawValue>),
}

/// One row: column names and values in select order.
pub type RawRow = Vec<(String, RawValue)>;

/// Converts driver rows into configuration trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    drop_ids: bool,
}

impl Normalizer {
    /// Creates a normalizer that keeps table ids.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the `id` column from table trees.
    #[must_use]
    pub fn drop_ids(mut self, drop_ids: bool) -> Self {
        self.drop_ids = drop_ids;
        self
    }

    /// Normalizes one `system_schema.keyspaces` row.
    ///
    /// Returns `None` for system keyspaces.
    pub fn keyspace(&self, row: &RawRow) -> Result<Option<ConfigTree>> {
        let name = row_text(row, KEYSPACE_NAME_COLUMN).ok_or(ConfigError::MissingKeyspaceName)?;
        if is_system_keyspace(name) {
            debug!(keyspace = name, "skipping system keyspace");
            return Ok(None);
        }

        let tree = row
            .iter()
            .map(|(column, value)| (renamed(column), column_value(value)))
            .collect();
        Ok(Some(tree))
    }

    /// Normalizes one `system_schema.tables` row.
    ///
    /// The owning keyspace column is removed, and the `id` column too when
    /// ids are dropped.
    #[must_use]
    pub fn table(&self, row: &RawRow) -> ConfigTree {
        row.iter()
            .filter(|(column, _)| column != KEYSPACE_NAME_COLUMN)
            .filter(|(column, _)| !(self.drop_ids && column == ID_COLUMN))
            .map(|(column, value)| (renamed(column), column_value(value)))
            .collect()
    }

    /// Builds `{"keyspaces": [...]}` from keyspace and table rows.
    ///
    /// Each keyspace receives a `tables` list holding its tables in row
    /// order. Tables of skipped or unknown keyspaces are discarded.
    pub fn keyspaces(&self, keyspace_rows: &[RawRow], table_rows: &[RawRow]) -> Result<ConfigTree> {
        let mut keyspaces: IndexMap<String, ConfigTree> = IndexMap::new();
        for row in keyspace_rows {
            if let Some(tree) = self.keyspace(row)? {
                let name = tree
                    .get(NAME_KEY)
                    .and_then(ConfigValue::as_str)
                    .unwrap_or_default()
                    .to_string();
                keyspaces.insert(name, tree);
            }
        }

        let mut tables: IndexMap<String, Vec<ConfigValue>> = IndexMap::new();
        for row in table_rows {
            let Some(keyspace) = row_text(row, KEYSPACE_NAME_COLUMN) else {
                warn!("table row without keyspace name, skipping");
                continue;
            };
            if !keyspaces.contains_key(keyspace) {
                debug!(keyspace, "skipping table of unlisted keyspace");
                continue;
            }
            tables
                .entry(keyspace.to_string())
                .or_default()
                .push(ConfigValue::Map(self.table(row)));
        }

        let keyspaces: Vec<ConfigValue> = keyspaces
            .into_iter()
            .map(|(name, mut tree)| {
                let list = tables.shift_remove(&name).unwrap_or_default();
                tree.insert("tables".to_string(), ConfigValue::List(list));
                ConfigValue::Map(tree)
            })
            .collect();

        let mut root = ConfigTree::new();
        root.insert(KEYSPACES_KEY.to_string(), ConfigValue::List(keyspaces));
        Ok(root)
    }

    /// Builds `{"roles": {...}}` from role and permission rows.
    ///
    /// Role rows carry `role`, `can_login`, `is_superuser` and `member_of`;
    /// permission rows carry `role`, `resource` and `permissions`. Password
    /// hashes are never copied.
    pub fn roles(&self, role_rows: &[RawRow], permission_rows: &[RawRow]) -> Result<ConfigTree> {
        let mut roles: IndexMap<String, ConfigTree> = IndexMap::new();

        for row in role_rows {
            let name = row_text(row, "role").ok_or_else(|| ConfigError::InvalidRole {
                role: String::new(),
                reason: "role row without 'role' column".to_string(),
            })?;

            let mut role = ConfigTree::new();
            role.insert("login".to_string(), row_bool(row, "can_login").into());
            role.insert("superuser".to_string(), row_bool(row, "is_superuser").into());
            let member_of: Vec<ConfigValue> = match row_value(row, "member_of") {
                Some(RawValue::SortedSet(parents)) => {
                    parents.iter().map(|p| ConfigValue::from(p.as_str())).collect()
                }
                _ => Vec::new(),
            };
            role.insert("member_of".to_string(), ConfigValue::List(member_of));
            role.insert("permissions".to_string(), ConfigValue::Map(ConfigTree::new()));
            roles.insert(name.to_string(), role);
        }

        for row in permission_rows {
            let (Some(name), Some(resource)) = (row_text(row, "role"), row_text(row, "resource"))
            else {
                warn!("permission row without role or resource, skipping");
                continue;
            };
            let Some(role) = roles.get_mut(name) else {
                debug!(role = name, "skipping permissions of unknown role");
                continue;
            };
            let permissions: Vec<ConfigValue> = match row_value(row, "permissions") {
                Some(RawValue::SortedSet(names)) => {
                    names.iter().map(|p| ConfigValue::from(p.as_str())).collect()
                }
                _ => Vec::new(),
            };
            if let Some(ConfigValue::Map(granted)) = role.get_mut("permissions") {
                granted.insert(resource.to_string(), ConfigValue::List(permissions));
            }
        }

        let roles: ConfigTree = roles
            .into_iter()
            .map(|(name, role)| (name, ConfigValue::Map(role)))
            .collect();

        let mut root = ConfigTree::new();
        root.insert("roles".to_string(), ConfigValue::Map(roles));
        Ok(root)
    }
}

/// Returns true for keyspaces owned by the database itself.
#[must_use]
pub fn is_system_keyspace(name: &str) -> bool {
    name.to_lowercase().starts_with("system")
}

/// Parses numeric text: integer first, then float, else unchanged.
#[must_use]
pub fn convert_text(text: &str) -> ConfigValue {
    if let Ok(i) = text.parse::<i64>() {
        return ConfigValue::Int(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => ConfigValue::Float(f),
        _ => ConfigValue::Text(text.to_string()),
    }
}

/// Applies [`convert_text`] to text values; every other value is returned
/// unchanged, so converting twice is the same as converting once.
#[must_use]
pub fn convert_value(value: ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::Text(text) => convert_text(&text),
        other => other,
    }
}

/// Flattens a map column into a tree of converted scalars.
///
/// A `class` entry is reduced to its simple name.
#[must_use]
pub fn convert_mapped_props(entries: &[(String, RawValue)]) -> ConfigTree {
    entries
        .iter()
        .map(|(key, value)| {
            let value = if key == CLASS_KEY {
                match value {
                    RawValue::Text(class) => ConfigValue::from(simple_class_name(class)),
                    other => column_value(other),
                }
            } else {
                convert_value(column_value(value))
            };
            (key.clone(), value)
        })
        .collect()
}

/// Last `.`-separated segment of a class name.
#[must_use]
pub fn simple_class_name(class: &str) -> &str {
    class.rsplit('.').next().unwrap_or(class)
}

/// Rewrites `{class, data_centers: [{name, replication_factor}, ...]}` into
/// the flat `{class, <dc>: <factor>, ...}` form the database reports.
///
/// Any other value is returned as is.
#[must_use]
pub fn flatten_data_centers(replication: &ConfigValue) -> ConfigValue {
    let Some(map) = replication.as_map() else {
        return replication.clone();
    };
    let Some(data_centers) = map.get(DATA_CENTERS_KEY).and_then(ConfigValue::as_list) else {
        return replication.clone();
    };

    let mut flat: ConfigTree = map
        .iter()
        .filter(|(key, _)| key.as_str() != DATA_CENTERS_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for dc in data_centers {
        let Some(dc) = dc.as_map() else {
            warn!(found = dc.type_name(), "ignoring malformed data center entry");
            continue;
        };
        match (dc.get(NAME_KEY).and_then(ConfigValue::as_str), dc.get("replication_factor")) {
            (Some(name), Some(factor)) => {
                flat.insert(name.to_string(), factor.clone());
            }
            _ => warn!("ignoring data center entry without name or replication_factor"),
        }
    }

    ConfigValue::Map(flat)
}

fn renamed(column: &str) -> String {
    match column {
        KEYSPACE_NAME_COLUMN | TABLE_NAME_COLUMN => NAME_KEY.to_string(),
        other => other.to_string(),
    }
}

fn column_value(value: &RawValue) -> ConfigValue {
    match value {
        RawValue::Null => ConfigValue::Null,
        RawValue::Bool(b) => ConfigValue::Bool(*b),
        RawValue::Int(i) => ConfigValue::Int(*i),
        RawValue::Float(f) => ConfigValue::Float(*f),
        RawValue::Text(s) | RawValue::Uuid(s) => ConfigValue::Text(s.clone()),
        RawValue::OrderedMap(entries) => ConfigValue::Map(convert_mapped_props(entries)),
        RawValue::SortedSet(items) => {
            ConfigValue::List(items.iter().map(|s| ConfigValue::from(s.as_str())).collect())
        }
        RawValue::List(items) => ConfigValue::List(items.iter().map(column_value).collect()),
    }
}

fn row_value<'a>(row: &'a RawRow, column: &str) -> Option<&'a RawValue> {
    row.iter().find(|(c, _)| c == column).map(|(_, v)| v)
}

fn row_text<'a>(row: &'a RawRow, column: &str) -> Option<&'a str> {
    match row_value(row, column) {
        Some(RawValue::Text(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

fn row_bool(row: &RawRow, column: &str) -> bool {
    matches!(row_value(row, column), Some(RawValue::Bool(true)))
}

//! Statement generator.
//!
//! Walks the desired tree keyspace by keyspace, diffs every level against
//! the current tree and collects the resulting [`Operation`]s:
//!
//! 1. one `ALTER KEYSPACE` per changed keyspace, directly followed by
//! 2. one `ALTER TABLE` per changed table of that keyspace, in desired order,
//! 3. then the role and permission changes, when the desired tree has a
//!    `roles` key.
//!
//! Nothing is ever created: keyspaces missing from the current tree are
//! skipped with a warning, and so are missing tables unless
//! [`MissingTablePolicy::AlterAll`] is selected.
//!
//! # Example
//!
//! ```
//! use tableprops_core::{generate_alter_statements, ConfigTree};
//!
//! let current: ConfigTree = serde_json::from_str(
//!     r#"{"keyspaces": [{"name": "ks", "tables": [{"name": "widgets", "comment": "old comment"}]}]}"#,
//! ).unwrap();
//! let desired: ConfigTree = serde_json::from_str(
//!     r#"{"keyspaces": [{"name": "ks", "tables": [{"name": "widgets", "comment": "new comment"}]}]}"#,
//! ).unwrap();
//!
//! let statements = generate_alter_statements(&current, &desired).unwrap();
//! assert_eq!(statements, vec!["ALTER TABLE \"ks\".\"widgets\"\nWITH comment = 'new comment';"]);
//! ```

use tracing::{debug, info, warn};

use crate::cql::CqlDialect;
use crate::diff::{compare_trees, ChangeRecord};
use crate::error::{ConfigError, Result};
use crate::normalize::{flatten_data_centers, ID_COLUMN};
use crate::operation::{Assignment, Operation};
use crate::role::{diff_roles, RoleSet};
use crate::value::{ConfigTree, ConfigValue, CLASS_KEY, KEYSPACES_KEY, NAME_KEY};

const TABLES_KEY: &str = "tables";
const ROLES_KEY: &str = "roles";
const REPLICATION_KEY: &str = "replication";

/// What to do with a desired table that does not exist yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingTablePolicy {
    /// Log a warning and emit nothing for the table.
    #[default]
    Skip,
    /// Log a warning and alter every non-empty desired property.
    AlterAll,
}

/// Generator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Policy for tables missing from the current tree.
    pub missing_tables: MissingTablePolicy,
    /// Whether role and permission changes are generated.
    pub roles: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            missing_tables: MissingTablePolicy::Skip,
            roles: true,
        }
    }
}

impl GeneratorOptions {
    /// Creates the default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the missing-table policy.
    #[must_use]
    pub fn missing_tables(mut self, policy: MissingTablePolicy) -> Self {
        self.missing_tables = policy;
        self
    }

    /// Enables or disables role diffing.
    #[must_use]
    pub fn roles(mut self, roles: bool) -> Self {
        self.roles = roles;
        self
    }
}

/// Produces the operations that converge a current tree to a desired one.
#[derive(Debug, Clone, Default)]
pub struct StatementGenerator {
    options: GeneratorOptions,
    dialect: CqlDialect,
}

impl StatementGenerator {
    /// Creates a generator with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator with the given options.
    #[must_use]
    pub fn with_options(options: GeneratorOptions) -> Self {
        Self {
            options,
            dialect: CqlDialect::new(),
        }
    }

    /// Returns the active options.
    #[must_use]
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Diffs `current` against `desired`.
    ///
    /// Either every operation is returned or, on a configuration error,
    /// none is.
    pub fn generate(&self, current: &ConfigTree, desired: &ConfigTree) -> Result<Vec<Operation>> {
        let desired_keyspaces = validate(desired)?;
        let current_keyspaces = list_at(current, KEYSPACES_KEY, KEYSPACES_KEY)?;

        let mut ops = Vec::new();
        for desired_ks in desired_keyspaces {
            let desired_ks = desired_ks.as_map().ok_or(ConfigError::MissingKeyspaceName)?;
            let name = name_of(desired_ks).ok_or(ConfigError::MissingKeyspaceName)?;
            let Some(current_ks) = find_by_name(current_keyspaces, name) else {
                warn!(
                    keyspace = name,
                    "Skipped keyspace, not found in current config. Add it via DDL first"
                );
                continue;
            };

            if let Some(op) = self.keyspace_operation(name, current_ks, desired_ks)? {
                ops.push(op);
            }
            ops.extend(self.table_operations(name, current_ks, desired_ks)?);
        }

        if self.options.roles {
            if let Some(desired_roles) = desired.get(ROLES_KEY) {
                let desired_roles = RoleSet::from_value(desired_roles)?;
                let current_roles = match current.get(ROLES_KEY) {
                    Some(value) => RoleSet::from_value(value)?,
                    None => RoleSet::new(),
                };
                ops.extend(diff_roles(&current_roles, &desired_roles));
            }
        }

        for op in &ops {
            debug!(operation = %op.description(), "pending");
        }
        info!(count = ops.len(), "generated operations");
        Ok(ops)
    }

    /// Diffs and renders each operation as one CQL statement.
    pub fn generate_statements(
        &self,
        current: &ConfigTree,
        desired: &ConfigTree,
    ) -> Result<Vec<String>> {
        let ops = self.generate(current, desired)?;
        Ok(self.dialect.generate_all(&ops))
    }

    fn keyspace_operation(
        &self,
        name: &str,
        current: &ConfigTree,
        desired: &ConfigTree,
    ) -> Result<Option<Operation>> {
        let current = keyspace_properties(current);
        let desired = keyspace_properties(desired);

        let assignments: Vec<Assignment> = compare_trees(&current, &desired)
            .into_iter()
            .filter(|change| !change.desired.is_null())
            .inspect(|change| {
                debug!(keyspace = name, property = %change.property, "keyspace property changed");
            })
            .map(into_assignment)
            .collect();

        if assignments.is_empty() {
            return Ok(None);
        }

        if assignments.iter().any(|a| a.property == REPLICATION_KEY)
            && !has_class(desired.get(REPLICATION_KEY))
        {
            return Err(ConfigError::MissingReplicationClass {
                keyspace: name.to_string(),
            });
        }

        Ok(Some(Operation::alter_keyspace(name, assignments)))
    }

    fn table_operations(
        &self,
        keyspace: &str,
        current_ks: &ConfigTree,
        desired_ks: &ConfigTree,
    ) -> Result<Vec<Operation>> {
        let current_tables = list_at(current_ks, TABLES_KEY, keyspace)?;
        let desired_tables = list_at(desired_ks, TABLES_KEY, keyspace)?;
        let empty = ConfigTree::new();

        let mut ops = Vec::new();
        for desired_table in desired_tables {
            let desired_table = desired_table.as_map().ok_or_else(|| missing_table(keyspace))?;
            let table = name_of(desired_table).ok_or_else(|| missing_table(keyspace))?;

            let current_table = match find_by_name(current_tables, table) {
                Some(found) => found,
                None => {
                    warn!(keyspace, table, "Table does not exist in current config");
                    match self.options.missing_tables {
                        MissingTablePolicy::Skip => continue,
                        MissingTablePolicy::AlterAll => &empty,
                    }
                }
            };

            let assignments: Vec<Assignment> = compare_trees(current_table, desired_table)
                .into_iter()
                .filter(|change| change.property != ID_COLUMN && change.desired.is_truthy())
                .map(into_assignment)
                .collect();

            if assignments.is_empty() {
                continue;
            }
            debug!(keyspace, table, changed = assignments.len(), "table changed");
            ops.push(Operation::alter_table(keyspace, table, assignments));
        }
        Ok(ops)
    }
}

/// Renders the statements for `current` against `desired` with default
/// options.
pub fn generate_alter_statements(current: &ConfigTree, desired: &ConfigTree) -> Result<Vec<String>> {
    StatementGenerator::new().generate_statements(current, desired)
}

/// Checks every desired keyspace and table for a name before anything is
/// generated. Returns the desired keyspace list.
fn validate(desired: &ConfigTree) -> Result<&[ConfigValue]> {
    let keyspaces = list_at(desired, KEYSPACES_KEY, KEYSPACES_KEY)?;
    for keyspace in keyspaces {
        let keyspace = keyspace.as_map().ok_or(ConfigError::MissingKeyspaceName)?;
        let name = name_of(keyspace).ok_or(ConfigError::MissingKeyspaceName)?;

        for table in list_at(keyspace, TABLES_KEY, name)? {
            table
                .as_map()
                .and_then(name_of)
                .ok_or_else(|| missing_table(name))?;
        }
    }
    Ok(keyspaces)
}

/// Keyspace-level properties with data centers flattened.
fn keyspace_properties(keyspace: &ConfigTree) -> ConfigTree {
    keyspace
        .iter()
        .filter(|(key, _)| key.as_str() != TABLES_KEY)
        .map(|(key, value)| {
            if key == REPLICATION_KEY {
                (key.clone(), flatten_data_centers(value))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

fn into_assignment(change: ChangeRecord) -> Assignment {
    Assignment::new(change.property, change.desired)
}

fn has_class(replication: Option<&ConfigValue>) -> bool {
    replication
        .and_then(ConfigValue::as_map)
        .and_then(|map| map.get(CLASS_KEY))
        .is_some_and(ConfigValue::is_truthy)
}

/// Returns the list stored under `key`, treating absent and null as empty.
fn list_at<'a>(tree: &'a ConfigTree, key: &str, context: &str) -> Result<&'a [ConfigValue]> {
    match tree.get(key) {
        None | Some(ConfigValue::Null) => Ok(&[]),
        Some(ConfigValue::List(items)) => Ok(items),
        Some(other) => Err(ConfigError::InvalidShape {
            path: if context == key {
                key.to_string()
            } else {
                format!("{}.{}", context, key)
            },
            expected: "list",
            found: other.type_name(),
        }),
    }
}

fn name_of(tree: &ConfigTree) -> Option<&str> {
    tree.get(NAME_KEY)
        .and_then(ConfigValue::as_str)
        .filter(|name| !name.is_empty())
}

fn find_by_name<'a>(items: &'a [ConfigValue], name: &str) -> Option<&'a ConfigTree> {
    items
        .iter()
        .filter_map(ConfigValue::as_map)
        .find(|tree| name_of(tree) == Some(name))
}

fn missing_table(keyspace: &str) -> ConfigError {
    ConfigError::MissingTableName {
        keyspace: keyspace.to_string(),
    }
}

//! CQL rendering for reconciliation operations.
//!
//! [`CqlDialect`] turns an [`Operation`] into statement text. Every rendered
//! statement ends with exactly one `;`, so a sequence of statements can be
//! printed line by line or concatenated without ambiguity.

use crate::operation::{Assignment, Operation};
use crate::value::ConfigValue;

/// Joins the assignments of one ALTER statement.
const ASSIGNMENT_SEPARATOR: &str = "\nAND ";

/// CQL statement renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct CqlDialect;

impl CqlDialect {
    /// Creates a new CQL dialect.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Renders an operation as a single CQL statement.
    #[must_use]
    pub fn generate_cql(&self, operation: &Operation) -> String {
        match operation {
            Operation::AlterKeyspace {
                keyspace,
                assignments,
            } => self.alter_keyspace(keyspace, assignments),
            Operation::AlterTable {
                keyspace,
                table,
                assignments,
            } => self.alter_table(keyspace, table, assignments),
            Operation::CreateRole {
                name,
                superuser,
                login,
            } => format!(
                "CREATE ROLE {} WITH SUPERUSER={} AND LOGIN={};",
                role_identifier(name),
                superuser,
                login
            ),
            Operation::AlterRole {
                name,
                option,
                value,
            } => format!(
                "ALTER ROLE {} WITH {}={};",
                role_identifier(name),
                option.keyword(),
                value
            ),
            Operation::DropRole { name } => {
                format!("DROP ROLE IF EXISTS {};", role_identifier(name))
            }
            Operation::Grant {
                permissions,
                resource,
                role,
            } => format!(
                "GRANT {} ON {} TO {};",
                permissions.iter().cloned().collect::<Vec<_>>().join(", "),
                resource,
                role_identifier(role)
            ),
            Operation::Revoke {
                permissions,
                resource,
                role,
            } => format!(
                "REVOKE {} ON {} FROM {};",
                permissions.iter().cloned().collect::<Vec<_>>().join(", "),
                resource,
                role_identifier(role)
            ),
            Operation::RevokeAll { resource, role } => {
                format!("REVOKE ALL ON {} FROM {};", resource, role_identifier(role))
            }
            Operation::GrantRole { role, member } => format!(
                "GRANT {} TO {};",
                role_identifier(role),
                role_identifier(member)
            ),
            Operation::RevokeRole { role, member } => format!(
                "REVOKE {} FROM {};",
                role_identifier(role),
                role_identifier(member)
            ),
        }
    }

    /// Renders a list of operations, preserving order.
    #[must_use]
    pub fn generate_all(&self, operations: &[Operation]) -> Vec<String> {
        operations.iter().map(|op| self.generate_cql(op)).collect()
    }

    fn alter_keyspace(&self, keyspace: &str, assignments: &[Assignment]) -> String {
        let assignments: Vec<String> = assignments
            .iter()
            .map(|a| format!("{} = {}", a.property, keyspace_value(&a.value)))
            .collect();
        format!(
            "ALTER KEYSPACE {} WITH {};",
            quote_identifier(keyspace),
            assignments.join(ASSIGNMENT_SEPARATOR)
        )
    }

    fn alter_table(&self, keyspace: &str, table: &str, assignments: &[Assignment]) -> String {
        let assignments: Vec<String> = assignments
            .iter()
            .map(|a| format!("{} = {}", a.property, table_value(&a.value)))
            .collect();
        format!(
            "ALTER TABLE {}.{}\nWITH {};",
            quote_identifier(keyspace),
            quote_identifier(table),
            assignments.join(ASSIGNMENT_SEPARATOR)
        )
    }
}

/// Double-quotes an identifier, escaping embedded quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Single-quotes a string constant, escaping embedded quotes.
#[must_use]
pub fn quote_string(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Role names are emitted bare when they are plain lower-case identifiers,
/// quoted otherwise so that case and punctuation survive.
#[must_use]
pub fn role_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        name.to_string()
    } else {
        quote_identifier(name)
    }
}

/// Renders a value as a CQL literal.
///
/// Maps become `{'key': value, ...}`, lists `['a', 'b']`, text is
/// single-quoted and numbers, booleans and null are emitted bare.
#[must_use]
pub fn literal(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Null => "null".to_string(),
        ConfigValue::Bool(b) => b.to_string(),
        ConfigValue::Int(i) => i.to_string(),
        ConfigValue::Float(f) => format!("{f:?}"),
        ConfigValue::Text(s) => quote_string(s),
        ConfigValue::List(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        ConfigValue::Map(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", quote_string(k), literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Right-hand side of a keyspace assignment: collections and numbers are
/// emitted as literals, every other scalar is quoted.
fn keyspace_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Map(_) | ConfigValue::List(_) | ConfigValue::Int(_) | ConfigValue::Float(_) => {
            literal(value)
        }
        other => quote_string(&other.to_string()),
    }
}

/// Right-hand side of a table assignment. Text made of digits only is
/// treated as a number.
fn table_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Text(s) if is_numeric_text(s) => s.clone(),
        other => keyspace_value(other),
    }
}

fn is_numeric_text(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

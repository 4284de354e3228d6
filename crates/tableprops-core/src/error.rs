//! Error types for statement generation.

/// Fatal configuration errors.
///
/// Any of these aborts generation for the whole (current, desired) pair; no
/// partial statement list is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A desired keyspace has no `name`.
    #[error("Invalid keyspace config: missing 'name' key")]
    MissingKeyspaceName,

    /// A desired table has no `name`.
    #[error("Missing table name in config of keyspace '{keyspace}'")]
    MissingTableName {
        /// Keyspace the table belongs to.
        keyspace: String,
    },

    /// Replication settings changed but the desired side names no strategy.
    #[error("Replication of keyspace '{keyspace}' changed but no replication 'class' is given")]
    MissingReplicationClass {
        /// Keyspace whose replication changed.
        keyspace: String,
    },

    /// A permission resource could not be parsed.
    #[error("Invalid resource '{resource}': {reason}")]
    InvalidResource {
        /// The offending resource string.
        resource: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A role definition is malformed.
    #[error("Invalid role '{role}': {reason}")]
    InvalidRole {
        /// Role name.
        role: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A subtree does not have the expected shape.
    #[error("Expected {expected} at '{path}', found {found}")]
    InvalidShape {
        /// Location in the tree.
        path: String,
        /// Expected kind of value.
        expected: &'static str,
        /// Kind of value found.
        found: &'static str,
    },
}

/// Result type for statement generation.
pub type Result<T> = std::result::Result<T, ConfigError>;

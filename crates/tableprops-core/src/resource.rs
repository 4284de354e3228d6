//! Access-control resources.
//!
//! Permissions are declared against resource paths of the form
//! `type/selector[/subselector]`, the same shape the access-control tables
//! store them in. [`Resource`] parses such a path and renders the target
//! clause used by `GRANT` and `REVOKE`.

use std::fmt;
use std::str::FromStr;

use crate::cql::quote_identifier;
use crate::error::{ConfigError, Result};

/// A permission target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Resource {
    /// `data`
    AllKeyspaces,
    /// `data/<keyspace>`
    Keyspace(String),
    /// `data/<keyspace>/<table>`
    Table {
        /// Owning keyspace.
        keyspace: String,
        /// Table name.
        table: String,
    },
    /// `functions`
    AllFunctions,
    /// `functions/<name>` or `functions/<keyspace>/<name>`
    Function {
        /// Keyspace, when the function is keyspace-scoped.
        keyspace: Option<String>,
        /// Function name.
        name: String,
    },
    /// `roles`
    AllRoles,
    /// `roles/<name>`
    Role(String),
    /// `mbeans`
    AllMBeans,
    /// `mbean/<name>`
    MBean(String),
}

impl Resource {
    /// Parses a `type/selector[/subselector]` path.
    pub fn parse(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid(path, "empty path segment"));
        }

        match segments.as_slice() {
            ["data"] => Ok(Self::AllKeyspaces),
            ["data", keyspace] => Ok(Self::Keyspace((*keyspace).to_string())),
            ["data", keyspace, table] => Ok(Self::Table {
                keyspace: (*keyspace).to_string(),
                table: (*table).to_string(),
            }),
            ["functions"] => Ok(Self::AllFunctions),
            ["functions", name] => Ok(Self::Function {
                keyspace: None,
                name: (*name).to_string(),
            }),
            ["functions", keyspace, name] => Ok(Self::Function {
                keyspace: Some((*keyspace).to_string()),
                name: (*name).to_string(),
            }),
            ["roles"] => Ok(Self::AllRoles),
            ["roles", name] => Ok(Self::Role((*name).to_string())),
            ["mbeans"] => Ok(Self::AllMBeans),
            ["mbean", name] => Ok(Self::MBean((*name).to_string())),
            ["data" | "functions" | "roles" | "mbeans" | "mbean", ..] => {
                Err(invalid(path, "unexpected number of segments"))
            }
            [kind, ..] => Err(invalid(path, &format!("unknown resource type '{}'", kind))),
            [] => Err(invalid(path, "empty resource")),
        }
    }

    /// Returns the path form this resource was parsed from.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::AllKeyspaces => "data".to_string(),
            Self::Keyspace(ks) => format!("data/{}", ks),
            Self::Table { keyspace, table } => format!("data/{}/{}", keyspace, table),
            Self::AllFunctions => "functions".to_string(),
            Self::Function {
                keyspace: Some(ks),
                name,
            } => format!("functions/{}/{}", ks, name),
            Self::Function {
                keyspace: None,
                name,
            } => format!("functions/{}", name),
            Self::AllRoles => "roles".to_string(),
            Self::Role(name) => format!("roles/{}", name),
            Self::AllMBeans => "mbeans".to_string(),
            Self::MBean(name) => format!("mbean/{}", name),
        }
    }
}

fn invalid(path: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidResource {
        resource: path.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for Resource {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Renders the `ON <target>` clause of a permission statement.
impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllKeyspaces => f.write_str("ALL KEYSPACES"),
            Self::Keyspace(ks) => write!(f, "TABLE {}", quote_identifier(ks)),
            Self::Table { keyspace, table } => write!(
                f,
                "TABLE {}.{}",
                quote_identifier(keyspace),
                quote_identifier(table)
            ),
            Self::AllFunctions => f.write_str("ALL FUNCTIONS"),
            Self::Function {
                keyspace: Some(ks),
                name,
            } => write!(
                f,
                "FUNCTION {}.{}",
                quote_identifier(ks),
                quote_identifier(name)
            ),
            Self::Function {
                keyspace: None,
                name,
            } => write!(f, "FUNCTION {}", quote_identifier(name)),
            Self::AllRoles => f.write_str("ALL ROLES"),
            Self::Role(name) => write!(f, "ROLE {}", quote_identifier(name)),
            Self::AllMBeans => f.write_str("ALL MBEANS"),
            Self::MBean(name) => write!(f, "MBEAN {}", quote_identifier(name)),
        }
    }
}

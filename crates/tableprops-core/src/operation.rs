//! Reconciliation operations.
//!
//! The generator produces a list of [`Operation`]s; the [`CqlDialect`]
//! renders them as statement text. Keeping the two apart lets callers
//! inspect, filter or log what will change before anything is printed.
//!
//! [`CqlDialect`]: crate::cql::CqlDialect

use std::collections::BTreeSet;

use crate::resource::Resource;
use crate::value::ConfigValue;

/// One `property = value` pair of an ALTER statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Property name.
    pub property: String,
    /// Desired value.
    pub value: ConfigValue,
}

impl Assignment {
    /// Creates a new assignment.
    #[must_use]
    pub fn new(property: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }
}

/// Role flag that can be altered in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleOption {
    /// `LOGIN`
    Login,
    /// `SUPERUSER`
    Superuser,
}

impl RoleOption {
    /// Keyword used in `ALTER ROLE ... WITH <keyword>=<bool>`.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::Superuser => "SUPERUSER",
        }
    }
}

/// A single statement-level change.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Alter keyspace-level properties.
    AlterKeyspace {
        /// Keyspace name.
        keyspace: String,
        /// Changed properties, in desired order.
        assignments: Vec<Assignment>,
    },

    /// Alter table-level properties.
    AlterTable {
        /// Owning keyspace.
        keyspace: String,
        /// Table name.
        table: String,
        /// Changed properties, in desired order.
        assignments: Vec<Assignment>,
    },

    /// Create a role.
    CreateRole {
        /// Role name.
        name: String,
        /// Superuser flag.
        superuser: bool,
        /// Login flag.
        login: bool,
    },

    /// Change one flag of an existing role.
    AlterRole {
        /// Role name.
        name: String,
        /// Flag to change.
        option: RoleOption,
        /// New value.
        value: bool,
    },

    /// Drop a role.
    DropRole {
        /// Role name.
        name: String,
    },

    /// Grant permissions on a resource.
    Grant {
        /// Permission names.
        permissions: BTreeSet<String>,
        /// Target resource.
        resource: Resource,
        /// Grantee.
        role: String,
    },

    /// Revoke permissions on a resource.
    Revoke {
        /// Permission names.
        permissions: BTreeSet<String>,
        /// Target resource.
        resource: Resource,
        /// Role losing the permissions.
        role: String,
    },

    /// Revoke every permission on a resource.
    RevokeAll {
        /// Target resource.
        resource: Resource,
        /// Role losing the permissions.
        role: String,
    },

    /// Make `member` a member of `role`.
    GrantRole {
        /// Parent role.
        role: String,
        /// Member role.
        member: String,
    },

    /// Remove `member` from `role`.
    RevokeRole {
        /// Parent role.
        role: String,
        /// Member role.
        member: String,
    },
}

impl Operation {
    /// Creates an AlterKeyspace operation.
    #[must_use]
    pub fn alter_keyspace(keyspace: impl Into<String>, assignments: Vec<Assignment>) -> Self {
        Self::AlterKeyspace {
            keyspace: keyspace.into(),
            assignments,
        }
    }

    /// Creates an AlterTable operation.
    #[must_use]
    pub fn alter_table(
        keyspace: impl Into<String>,
        table: impl Into<String>,
        assignments: Vec<Assignment>,
    ) -> Self {
        Self::AlterTable {
            keyspace: keyspace.into(),
            table: table.into(),
            assignments,
        }
    }

    /// Returns true for operations on the access-control subsystem.
    #[must_use]
    pub fn is_role_operation(&self) -> bool {
        !matches!(self, Self::AlterKeyspace { .. } | Self::AlterTable { .. })
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::AlterKeyspace {
                keyspace,
                assignments,
            } => format!(
                "Alter keyspace '{}' ({})",
                keyspace,
                property_names(assignments)
            ),
            Self::AlterTable {
                keyspace,
                table,
                assignments,
            } => format!(
                "Alter table '{}.{}' ({})",
                keyspace,
                table,
                property_names(assignments)
            ),
            Self::CreateRole { name, .. } => format!("Create role '{}'", name),
            Self::AlterRole {
                name,
                option,
                value,
            } => format!("Set {:?} of role '{}' to {}", option, name, value),
            Self::DropRole { name } => format!("Drop role '{}'", name),
            Self::Grant { resource, role, .. } => {
                format!("Grant permissions on {} to '{}'", resource, role)
            }
            Self::Revoke { resource, role, .. } => {
                format!("Revoke permissions on {} from '{}'", resource, role)
            }
            Self::RevokeAll { resource, role } => {
                format!("Revoke all permissions on {} from '{}'", resource, role)
            }
            Self::GrantRole { role, member } => {
                format!("Grant role '{}' to '{}'", role, member)
            }
            Self::RevokeRole { role, member } => {
                format!("Revoke role '{}' from '{}'", role, member)
            }
        }
    }
}

fn property_names(assignments: &[Assignment]) -> String {
    assignments
        .iter()
        .map(|a| a.property.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_option_keyword() {
        assert_eq!(RoleOption::Login.keyword(), "LOGIN");
        assert_eq!(RoleOption::Superuser.keyword(), "SUPERUSER");
    }

    #[test]
    fn test_description() {
        let op = Operation::alter_table(
            "ks",
            "widgets",
            vec![
                Assignment::new("comment", "x"),
                Assignment::new("gc_grace_seconds", 10),
            ],
        );
        assert_eq!(
            op.description(),
            "Alter table 'ks.widgets' (comment, gc_grace_seconds)"
        );
        assert!(!op.is_role_operation());
        assert!(Operation::DropRole { name: "bob".into() }.is_role_operation());
    }
}

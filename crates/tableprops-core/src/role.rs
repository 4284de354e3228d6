//! Roles and permission diffing.
//!
//! The `roles` subtree of a configuration maps each role name to its flags,
//! parent roles and per-resource permissions:
//!
//! ```yaml
//! roles:
//!   alice:
//!     login: true
//!     superuser: false
//!     member_of: [readers]
//!     permissions:
//!       data/ks/widgets: [select, modify]
//! ```
//!
//! [`diff_roles`] compares two [`RoleSet`]s and produces the operations that
//! turn one into the other.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::operation::{Operation, RoleOption};
use crate::resource::Resource;
use crate::value::{ConfigTree, ConfigValue};

/// Permission names granted on one resource, upper-cased.
pub type PermissionSet = BTreeSet<String>;

/// A single role.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Role {
    /// Whether the role may log in.
    pub login: bool,
    /// Whether the role is a superuser.
    pub superuser: bool,
    /// Names of the roles this role is a member of.
    pub member_of: BTreeSet<String>,
    /// Granted permissions per resource, in declaration order.
    pub permissions: IndexMap<Resource, PermissionSet>,
}

impl Role {
    /// Creates a role with both flags off and no permissions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the login flag.
    #[must_use]
    pub fn login(mut self, login: bool) -> Self {
        self.login = login;
        self
    }

    /// Sets the superuser flag.
    #[must_use]
    pub fn superuser(mut self, superuser: bool) -> Self {
        self.superuser = superuser;
        self
    }

    /// Adds a parent role.
    #[must_use]
    pub fn member_of(mut self, parent: impl Into<String>) -> Self {
        self.member_of.insert(parent.into());
        self
    }

    /// Grants permissions on a resource.
    #[must_use]
    pub fn grant<I, S>(mut self, resource: Resource, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.permissions.entry(resource).or_default();
        entry.extend(permissions.into_iter().map(|p| p.as_ref().to_uppercase()));
        self
    }

    fn from_tree(name: &str, tree: &ConfigTree) -> Result<Self> {
        let mut role = Self::new()
            .login(flag(name, tree, "login")?)
            .superuser(flag(name, tree, "superuser")?);

        match tree.get("member_of") {
            None | Some(ConfigValue::Null) => {}
            Some(ConfigValue::List(parents)) => {
                for parent in parents {
                    let parent = parent.as_str().ok_or_else(|| {
                        invalid(name, "'member_of' must list role names")
                    })?;
                    role.member_of.insert(parent.to_string());
                }
            }
            Some(ConfigValue::Text(parent)) => {
                role.member_of.insert(parent.clone());
            }
            Some(other) => {
                return Err(shape(
                    format!("roles.{}.member_of", name),
                    "list",
                    other,
                ))
            }
        }

        match tree.get("permissions") {
            None | Some(ConfigValue::Null) => {}
            Some(ConfigValue::Map(resources)) => {
                for (path, permissions) in resources {
                    let resource = Resource::parse(path)?;
                    let permissions = permission_names(name, path, permissions)?;
                    if !permissions.is_empty() {
                        role.permissions
                            .entry(resource)
                            .or_default()
                            .extend(permissions);
                    }
                }
            }
            Some(other) => {
                return Err(shape(
                    format!("roles.{}.permissions", name),
                    "mapping",
                    other,
                ))
            }
        }

        Ok(role)
    }
}

/// Roles keyed by name, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoleSet {
    roles: IndexMap<String, Role>,
}

impl RoleSet {
    /// Creates an empty role set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the value of a `roles` key.
    ///
    /// A null value is an empty set.
    pub fn from_value(value: &ConfigValue) -> Result<Self> {
        let entries = match value {
            ConfigValue::Null => return Ok(Self::new()),
            ConfigValue::Map(entries) => entries,
            other => return Err(shape("roles".to_string(), "mapping", other)),
        };

        let mut set = Self::new();
        for (name, entry) in entries {
            if name.is_empty() {
                return Err(invalid(name, "role name must not be empty"));
            }
            let role = match entry {
                ConfigValue::Map(tree) => Role::from_tree(name, tree)?,
                other => {
                    return Err(shape(format!("roles.{}", name), "mapping", other));
                }
            };
            set.roles.insert(name.clone(), role);
        }
        Ok(set)
    }

    /// Adds or replaces a role.
    #[must_use]
    pub fn with_role(mut self, name: impl Into<String>, role: Role) -> Self {
        self.roles.insert(name.into(), role);
        self
    }

    /// Looks up a role by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    /// Iterates over roles in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Role)> {
        self.roles.iter()
    }

    /// Number of roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns true if there are no roles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Computes the operations that turn `current` into `desired`.
///
/// Removed roles are dropped first, then common roles are altered, then new
/// roles are created. Within a role, revokes always precede grants.
#[must_use]
pub fn diff_roles(current: &RoleSet, desired: &RoleSet) -> Vec<Operation> {
    let mut ops = Vec::new();

    for (name, _) in current.iter() {
        if desired.get(name).is_none() {
            debug!(role = %name, "role removed");
            ops.push(Operation::DropRole { name: name.clone() });
        }
    }

    for (name, wanted) in desired.iter() {
        if let Some(existing) = current.get(name) {
            alter_role(name, existing, wanted, &mut ops);
        }
    }

    for (name, wanted) in desired.iter() {
        if current.get(name).is_none() {
            debug!(role = %name, "role added");
            create_role(name, wanted, &mut ops);
        }
    }

    ops
}

fn alter_role(name: &str, current: &Role, desired: &Role, ops: &mut Vec<Operation>) {
    if current.login != desired.login {
        ops.push(Operation::AlterRole {
            name: name.to_string(),
            option: RoleOption::Login,
            value: desired.login,
        });
    }
    if current.superuser != desired.superuser {
        ops.push(Operation::AlterRole {
            name: name.to_string(),
            option: RoleOption::Superuser,
            value: desired.superuser,
        });
    }

    for parent in current.member_of.difference(&desired.member_of) {
        ops.push(Operation::RevokeRole {
            role: parent.clone(),
            member: name.to_string(),
        });
    }
    for parent in desired.member_of.difference(&current.member_of) {
        ops.push(Operation::GrantRole {
            role: parent.clone(),
            member: name.to_string(),
        });
    }

    for resource in current.permissions.keys() {
        if !desired.permissions.contains_key(resource) {
            ops.push(Operation::RevokeAll {
                resource: resource.clone(),
                role: name.to_string(),
            });
        }
    }

    let none = PermissionSet::new();
    for (resource, wanted) in &desired.permissions {
        let granted = current.permissions.get(resource).unwrap_or(&none);

        let removed: PermissionSet = granted.difference(wanted).cloned().collect();
        if !removed.is_empty() {
            ops.push(Operation::Revoke {
                permissions: removed,
                resource: resource.clone(),
                role: name.to_string(),
            });
        }

        let added: PermissionSet = wanted.difference(granted).cloned().collect();
        if !added.is_empty() {
            ops.push(Operation::Grant {
                permissions: added,
                resource: resource.clone(),
                role: name.to_string(),
            });
        }
    }
}

fn create_role(name: &str, role: &Role, ops: &mut Vec<Operation>) {
    ops.push(Operation::CreateRole {
        name: name.to_string(),
        superuser: role.superuser,
        login: role.login,
    });
    for parent in &role.member_of {
        ops.push(Operation::GrantRole {
            role: parent.clone(),
            member: name.to_string(),
        });
    }
    for (resource, permissions) in &role.permissions {
        ops.push(Operation::Grant {
            permissions: permissions.clone(),
            resource: resource.clone(),
            role: name.to_string(),
        });
    }
}

fn flag(role: &str, tree: &ConfigTree, key: &str) -> Result<bool> {
    match tree.get(key) {
        None | Some(ConfigValue::Null) => Ok(false),
        Some(ConfigValue::Bool(b)) => Ok(*b),
        Some(other) => Err(shape(format!("roles.{}.{}", role, key), "boolean", other)),
    }
}

fn permission_names(role: &str, resource: &str, value: &ConfigValue) -> Result<PermissionSet> {
    match value {
        ConfigValue::Null => Ok(PermissionSet::new()),
        ConfigValue::Text(p) => Ok(std::iter::once(p.to_uppercase()).collect()),
        ConfigValue::List(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_uppercase).ok_or_else(|| {
                    shape(
                        format!("roles.{}.permissions.{}", role, resource),
                        "permission name",
                        item,
                    )
                })
            })
            .collect(),
        other => Err(shape(
            format!("roles.{}.permissions.{}", role, resource),
            "list",
            other,
        )),
    }
}

fn invalid(role: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidRole {
        role: role.to_string(),
        reason: reason.to_string(),
    }
}

fn shape(path: String, expected: &'static str, found: &ConfigValue) -> ConfigError {
    ConfigError::InvalidShape {
        path,
        expected,
        found: found.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cql::CqlDialect;

    fn render(ops: &[Operation]) -> Vec<String> {
        CqlDialect::new().generate_all(ops)
    }

    fn table(ks: &str, t: &str) -> Resource {
        Resource::Table {
            keyspace: ks.to_string(),
            table: t.to_string(),
        }
    }

    #[test]
    fn test_parse_roles() {
        let value: ConfigValue = serde_yaml::from_str(
            r"
alice:
  login: true
  member_of: [readers]
  permissions:
    data/ks/widgets: [select, Modify]
    roles/bob: authorize
readers: {}
",
        )
        .unwrap();

        let set = RoleSet::from_value(&value).unwrap();
        assert_eq!(set.len(), 2);

        let alice = set.get("alice").unwrap();
        assert!(alice.login);
        assert!(!alice.superuser);
        assert!(alice.member_of.contains("readers"));
        assert_eq!(
            alice.permissions[&table("ks", "widgets")],
            PermissionSet::from(["MODIFY".to_string(), "SELECT".to_string()])
        );
        assert_eq!(
            alice.permissions[&Resource::Role("bob".into())],
            PermissionSet::from(["AUTHORIZE".to_string()])
        );
        assert_eq!(set.get("readers").unwrap(), &Role::new());
    }

    #[test]
    fn test_parse_errors() {
        let not_map = ConfigValue::List(vec![]);
        assert!(matches!(
            RoleSet::from_value(&not_map),
            Err(ConfigError::InvalidShape { .. })
        ));

        let bad_flag: ConfigValue = serde_yaml::from_str("alice: {login: 'yes'}").unwrap();
        assert!(RoleSet::from_value(&bad_flag).is_err());

        let bad_resource: ConfigValue =
            serde_yaml::from_str("alice: {permissions: {tables/x: [select]}}").unwrap();
        assert!(matches!(
            RoleSet::from_value(&bad_resource),
            Err(ConfigError::InvalidResource { .. })
        ));

        let scalar_role: ConfigValue = serde_yaml::from_str("alice: true").unwrap();
        assert!(RoleSet::from_value(&scalar_role).is_err());
    }

    #[test]
    fn test_identical_sets_produce_nothing() {
        let set = RoleSet::new().with_role(
            "alice",
            Role::new()
                .login(true)
                .grant(table("ks", "widgets"), ["select"]),
        );
        assert!(diff_roles(&set, &set.clone()).is_empty());
    }

    #[test]
    fn test_new_role_is_created_then_granted() {
        let current = RoleSet::new();
        let desired = RoleSet::new().with_role(
            "alice",
            Role::new()
                .login(true)
                .member_of("readers")
                .grant(table("ks", "widgets"), ["select", "modify"])
                .grant(Resource::AllFunctions, ["execute"]),
        );

        assert_eq!(
            render(&diff_roles(&current, &desired)),
            vec![
                "CREATE ROLE alice WITH SUPERUSER=false AND LOGIN=true;",
                "GRANT readers TO alice;",
                "GRANT MODIFY, SELECT ON TABLE \"ks\".\"widgets\" TO alice;",
                "GRANT EXECUTE ON ALL FUNCTIONS TO alice;",
            ]
        );
    }

    #[test]
    fn test_removed_role_is_dropped_first() {
        let current = RoleSet::new()
            .with_role("bob", Role::new())
            .with_role("alice", Role::new());
        let desired = RoleSet::new()
            .with_role("alice", Role::new())
            .with_role("carol", Role::new());

        assert_eq!(
            render(&diff_roles(&current, &desired)),
            vec![
                "DROP ROLE IF EXISTS bob;",
                "CREATE ROLE carol WITH SUPERUSER=false AND LOGIN=false;",
            ]
        );
    }

    #[test]
    fn test_common_role_changes() {
        let current = RoleSet::new().with_role(
            "alice",
            Role::new()
                .login(true)
                .member_of("writers")
                .grant(table("ks", "widgets"), ["select", "modify"])
                .grant(Resource::Keyspace("old".into()), ["select"]),
        );
        let desired = RoleSet::new().with_role(
            "alice",
            Role::new()
                .superuser(true)
                .member_of("readers")
                .grant(table("ks", "widgets"), ["select", "alter"]),
        );

        assert_eq!(
            render(&diff_roles(&current, &desired)),
            vec![
                "ALTER ROLE alice WITH LOGIN=false;",
                "ALTER ROLE alice WITH SUPERUSER=true;",
                "REVOKE writers FROM alice;",
                "GRANT readers TO alice;",
                "REVOKE ALL ON TABLE \"old\" FROM alice;",
                "REVOKE MODIFY ON TABLE \"ks\".\"widgets\" FROM alice;",
                "GRANT ALTER ON TABLE \"ks\".\"widgets\" TO alice;",
            ]
        );
    }
}

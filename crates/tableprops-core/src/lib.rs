//! Configuration drift detection for keyspace, table and role properties.
//!
//! `tableprops-core` compares the live schema configuration of a cluster with
//! a declarative desired state and produces the CQL statements that bring
//! the cluster in line:
//!
//! - `ALTER KEYSPACE` / `ALTER TABLE` for changed properties
//! - `CREATE ROLE` / `ALTER ROLE` / `DROP ROLE` for role changes
//! - `GRANT` / `REVOKE` for permissions and role memberships
//!
//! The crate performs no I/O. Callers supply both trees and decide what to
//! do with the statements.
//!
//! # Architecture
//!
//! - **Value** - [`ConfigTree`], the ordered property tree both sides share
//! - **Normalizer** - turns driver rows into a [`ConfigTree`]
//! - **Diff** - property-level comparison with class-name equivalence
//! - **Generator** - walks keyspaces, tables and roles into [`Operation`]s
//! - **CQL** - renders operations as statement text
//!
//! # Example
//!
//! ```rust
//! use tableprops_core::prelude::*;
//!
//! let current: ConfigTree = serde_yaml::from_str(
//!     "keyspaces: [{name: excalibur, replication: {class: SimpleStrategy, replication_factor: 1}}]",
//! ).unwrap();
//! let desired: ConfigTree = serde_yaml::from_str(
//!     "keyspaces: [{name: excalibur, replication: {class: SimpleStrategy, replication_factor: 3}}]",
//! ).unwrap();
//!
//! let statements = StatementGenerator::new()
//!     .generate_statements(&current, &desired)
//!     .unwrap();
//! assert_eq!(
//!     statements,
//!     vec!["ALTER KEYSPACE \"excalibur\" WITH replication = {'class': 'SimpleStrategy', 'replication_factor': 3};"]
//! );
//! ```

pub mod cql;
pub mod diff;
pub mod error;
pub mod generator;
pub mod normalize;
pub mod operation;
pub mod resource;
pub mod role;
pub mod value;

pub use error::{ConfigError, Result};
pub use generator::{
    generate_alter_statements, GeneratorOptions, MissingTablePolicy, StatementGenerator,
};
pub use value::{ConfigTree, ConfigValue};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cql::CqlDialect;
    pub use crate::diff::{class_names_match, compare_trees, compare_values, ChangeRecord};
    pub use crate::error::{ConfigError, Result};
    pub use crate::generator::{
        generate_alter_statements, GeneratorOptions, MissingTablePolicy, StatementGenerator,
    };
    pub use crate::normalize::{Normalizer, RawRow, RawValue};
    pub use crate::operation::{Assignment, Operation, RoleOption};
    pub use crate::resource::Resource;
    pub use crate::role::{diff_roles, Role, RoleSet};
    pub use crate::value::{ConfigTree, ConfigValue};
}

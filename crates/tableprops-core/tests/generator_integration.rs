//! End-to-end tests for statement generation.
//!
//! Each test starts from the same current cluster tree and checks the
//! statements produced for a desired tree.

mod common;

use common::{statements, tree, CLUSTER};
use tableprops_core::prelude::*;

#[test]
fn identical_trees_produce_no_statements() {
    let current = tree(CLUSTER);
    let desired = current.clone();

    let result = generate_alter_statements(&current, &desired).unwrap();
    assert!(result.is_empty(), "Unexpected statements: {result:?}");

    // Inputs stay usable and unchanged.
    assert_eq!(current, tree(CLUSTER));
    assert!(generate_alter_statements(&current, &desired)
        .unwrap()
        .is_empty());
}

#[test]
fn replication_factor_change() {
    let result = statements(
        CLUSTER,
        r"
keyspaces:
  - name: excalibur
    durable_writes: true
    replication:
      class: SimpleStrategy
      replication_factor: 3
",
    );
    assert!(result.contains(
        &"ALTER KEYSPACE \"excalibur\" WITH replication = {'class': 'SimpleStrategy', 'replication_factor': 3};"
            .to_string()
    ));
}

#[test]
fn fully_qualified_class_is_not_a_change() {
    let result = statements(
        CLUSTER,
        r"
keyspaces:
  - name: excalibur
    replication:
      class: org.apache.cassandra.locator.SimpleStrategy
      replication_factor: 1
    tables:
      - name: widgets
        compaction:
          class: org.apache.cassandra.db.compaction.SizeTieredCompactionStrategy
          max_threshold: 32
          min_threshold: 4
",
    );
    assert!(result.is_empty(), "Unexpected statements: {result:?}");
}

#[test]
fn table_comment_change() {
    let result = statements(
        CLUSTER,
        r"
keyspaces:
  - name: excalibur
    tables:
      - name: widgets
        comment: new comment
",
    );
    assert_eq!(
        result,
        vec!["ALTER TABLE \"excalibur\".\"widgets\"\nWITH comment = 'new comment';"]
    );
}

#[test]
fn table_sub_config_changes() {
    let result = statements(
        CLUSTER,
        r"
keyspaces:
  - name: excalibur
    tables:
      - name: widgets
        compaction:
          class: LeveledCompactionStrategy
          sstable_size_in_mb: 160
        caching:
          keys: ALL
          rows_per_partition: NONE
        gc_grace_seconds: 3600
",
    );
    assert_eq!(
        result,
        vec![
            "ALTER TABLE \"excalibur\".\"widgets\"\nWITH compaction = {'class': 'LeveledCompactionStrategy', 'sstable_size_in_mb': 160}\nAND gc_grace_seconds = 3600;"
        ]
    );
}

#[test]
fn statements_follow_desired_order() {
    let result = statements(
        CLUSTER,
        r"
keyspaces:
  - name: camelot
    durable_writes: false
  - name: excalibur
    durable_writes: false
    tables:
      - name: gadgets
        comment: second
      - name: widgets
        comment: third
",
    );
    assert_eq!(
        result,
        vec![
            "ALTER KEYSPACE \"camelot\" WITH durable_writes = 'false';",
            "ALTER KEYSPACE \"excalibur\" WITH durable_writes = 'false';",
            "ALTER TABLE \"excalibur\".\"gadgets\"\nWITH comment = 'second';",
            "ALTER TABLE \"excalibur\".\"widgets\"\nWITH comment = 'third';",
        ]
    );
}

#[test]
fn falsy_values_never_become_assignments() {
    let result = statements(
        CLUSTER,
        r"
keyspaces:
  - name: excalibur
    tables:
      - name: widgets
        comment: ''
        gc_grace_seconds: 0
        flags: []
        caching: {}
        speculative_retry: ~
",
    );
    assert!(result.is_empty(), "Unexpected statements: {result:?}");
}

#[test]
fn every_statement_ends_with_one_semicolon() {
    let result = statements(
        CLUSTER,
        r"
keyspaces:
  - name: excalibur
    durable_writes: false
    tables:
      - name: widgets
        comment: it's new;
roles:
  alice:
    login: true
    permissions:
      data/excalibur/widgets: [SELECT, MODIFY]
  carol:
    login: true
",
    );
    assert!(!result.is_empty());
    for statement in &result {
        assert!(statement.ends_with(';'), "{statement}");
        assert!(!statement.ends_with(";;"), "{statement}");
    }
}

#[test]
fn new_role_is_created_with_grants() {
    let result = statements(
        CLUSTER,
        r"
roles:
  alice:
    login: true
    permissions:
      data/excalibur/widgets: [SELECT]
  bob:
    login: true
  dave:
    login: true
    permissions:
      data/excalibur/widgets: [select, modify]
      data/camelot: [select]
",
    );
    assert_eq!(
        result,
        vec![
            "CREATE ROLE dave WITH SUPERUSER=false AND LOGIN=true;",
            "GRANT MODIFY, SELECT ON TABLE \"excalibur\".\"widgets\" TO dave;",
            "GRANT SELECT ON TABLE \"camelot\" TO dave;",
        ]
    );
}

#[test]
fn role_changes_revoke_before_grant() {
    let result = statements(
        CLUSTER,
        r"
roles:
  alice:
    login: false
    superuser: true
    permissions:
      data/excalibur/gadgets: [SELECT]
",
    );
    assert_eq!(
        result,
        vec![
            "DROP ROLE IF EXISTS bob;",
            "ALTER ROLE alice WITH LOGIN=false;",
            "ALTER ROLE alice WITH SUPERUSER=true;",
            "REVOKE ALL ON TABLE \"excalibur\".\"widgets\" FROM alice;",
            "GRANT SELECT ON TABLE \"excalibur\".\"gadgets\" TO alice;",
        ]
    );
}

#[test]
fn fatal_errors_return_no_statements() {
    let current = tree(CLUSTER);
    let desired = tree(
        r"
keyspaces:
  - name: excalibur
    durable_writes: false
  - name: camelot
    tables:
      - comment: nameless
",
    );

    let err = generate_alter_statements(&current, &desired).unwrap_err();
    assert_eq!(
        err,
        ConfigError::MissingTableName {
            keyspace: "camelot".into()
        }
    );
    assert_eq!(
        err.to_string(),
        "Missing table name in config of keyspace 'camelot'"
    );
}

#[test]
fn operations_can_be_inspected_before_rendering() {
    let generator = StatementGenerator::with_options(GeneratorOptions::new().roles(false));
    let ops = generator
        .generate(
            &tree(CLUSTER),
            &tree(
                r"
keyspaces:
  - name: excalibur
    tables:
      - name: widgets
        gc_grace_seconds: 10
roles: {}
",
            ),
        )
        .unwrap();

    assert_eq!(ops.len(), 1);
    assert!(matches!(
        &ops[0],
        Operation::AlterTable { keyspace, table, assignments }
            if keyspace == "excalibur" && table == "widgets" && assignments.len() == 1
    ));
    assert!(!ops[0].is_role_operation());
}

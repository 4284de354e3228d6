#![allow(dead_code)]

use tableprops_core::{ConfigTree, StatementGenerator};

pub fn tree(yaml: &str) -> ConfigTree {
    serde_yaml::from_str(yaml).unwrap_or_else(|e| panic!("Invalid YAML fixture: {e}\n{yaml}"))
}

pub fn statements(current: &str, desired: &str) -> Vec<String> {
    StatementGenerator::new()
        .generate_statements(&tree(current), &tree(desired))
        .unwrap_or_else(|e| panic!("Generation failed: {e}"))
}

pub const CLUSTER: &str = r"
keyspaces:
  - name: excalibur
    durable_writes: true
    replication:
      class: SimpleStrategy
      replication_factor: 1
    tables:
      - name: widgets
        id: 5a1c395e-b41f-11e5-9f22-ba0be0483c18
        bloom_filter_fp_chance: 0.01
        caching:
          keys: ALL
          rows_per_partition: NONE
        comment: old comment
        compaction:
          class: SizeTieredCompactionStrategy
          max_threshold: 32
          min_threshold: 4
        compression:
          chunk_length_in_kb: 64
          class: LZ4Compressor
        default_time_to_live: 0
        flags: [compound]
        gc_grace_seconds: 864000
        speculative_retry: 99p
      - name: gadgets
        comment: ''
        gc_grace_seconds: 864000
  - name: camelot
    durable_writes: true
    replication:
      class: NetworkTopologyStrategy
      dc1: 3
    tables: []
roles:
  alice:
    login: true
    superuser: false
    member_of: []
    permissions:
      data/excalibur/widgets: [SELECT]
  bob:
    login: true
    superuser: false
    member_of: []
    permissions: {}
";

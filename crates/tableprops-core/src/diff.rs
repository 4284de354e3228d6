//! Property diff engine.
//!
//! Compares a current and a desired [`ConfigTree`] at the same nesting level
//! (two keyspaces, two tables) and reports every desired property whose
//! value differs. Polymorphic sub-configs (replication, compaction,
//! compression) are compared with their `class` held aside: the remaining
//! fields must be equal *and* the class names must be equivalent under
//! [`class_names_match`].
//!
//! The engine only borrows its inputs. Each [`ChangeRecord`] owns a fresh
//! copy of the desired value, with the resolved class name put back in
//! front so that the rendered statement still names the strategy.

use tracing::debug;

use crate::value::{CLASS_KEY, ConfigTree, ConfigValue, NAME_KEY};

/// One property whose desired value differs from the current one.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    /// Property name.
    pub property: String,
    /// Current value, `None` when the property is absent.
    pub current: Option<ConfigValue>,
    /// Desired value.
    pub desired: ConfigValue,
}

/// Class-name equivalence.
///
/// - Both given: split on `.`. With equal segment counts the sorted segments
///   must be equal; otherwise only the last segments are compared, so a
///   simple name matches any qualified name ending in it.
/// - Only one given: never a match.
/// - Neither given: a match.
///
/// Empty strings count as "not given".
#[must_use]
pub fn class_names_match(src: Option<&str>, dst: Option<&str>) -> bool {
    let src = src.filter(|s| !s.is_empty());
    let dst = dst.filter(|s| !s.is_empty());

    match (src, dst) {
        (Some(src), Some(dst)) => {
            let mut src_parts: Vec<&str> = src.split('.').collect();
            let mut dst_parts: Vec<&str> = dst.split('.').collect();
            if src_parts.len() == dst_parts.len() {
                src_parts.sort_unstable();
                dst_parts.sort_unstable();
                src_parts == dst_parts
            } else {
                src_parts.last() == dst_parts.last()
            }
        }
        (None, None) => true,
        _ => false,
    }
}

/// Compares two values that are expected to be mappings.
///
/// Returns an empty list when either side is not a mapping, which covers a
/// missing current-side counterpart.
#[must_use]
pub fn compare_values(current: &ConfigValue, desired: &ConfigValue) -> Vec<ChangeRecord> {
    match (current.as_map(), desired.as_map()) {
        (Some(current), Some(desired)) => compare_trees(current, desired),
        _ => Vec::new(),
    }
}

/// Compares two trees and returns the changed properties in desired order.
///
/// The `name` key is never reported. Properties absent from `current` are
/// treated as null.
#[must_use]
pub fn compare_trees(current: &ConfigTree, desired: &ConfigTree) -> Vec<ChangeRecord> {
    desired
        .iter()
        .filter(|(key, _)| key.as_str() != NAME_KEY)
        .filter_map(|(key, dst)| diff_property(key, current.get(key), dst))
        .collect()
}

fn diff_property(key: &str, src: Option<&ConfigValue>, dst: &ConfigValue) -> Option<ChangeRecord> {
    if let (Some(ConfigValue::Map(src_map)), ConfigValue::Map(dst_map)) = (src, dst) {
        if !src_map.is_empty() {
            return diff_sub_config(key, src_map, dst_map);
        }
    }

    let unchanged = match src {
        Some(src) => src == dst,
        None => dst.is_null(),
    };
    if unchanged {
        return None;
    }

    Some(ChangeRecord {
        property: key.to_string(),
        current: src.cloned(),
        desired: dst.clone(),
    })
}

fn diff_sub_config(key: &str, src: &ConfigTree, dst: &ConfigTree) -> Option<ChangeRecord> {
    let src_class = src.get(CLASS_KEY).filter(|c| !c.is_null());
    let dst_class = dst.get(CLASS_KEY).filter(|c| !c.is_null());

    let same_class = class_names_match(
        src_class.map(class_text).as_deref(),
        dst_class.map(class_text).as_deref(),
    );
    let desired = without_class(dst);
    let same_fields = without_class(src) == desired;

    debug!(
        property = key,
        same_class, same_fields, "compared mapped property"
    );

    if same_class && same_fields {
        return None;
    }

    let mut desired = desired;
    if let Some(class) = dst_class.or(src_class) {
        desired.shift_insert(0, CLASS_KEY.to_string(), class.clone());
    }

    Some(ChangeRecord {
        property: key.to_string(),
        current: Some(ConfigValue::Map(src.clone())),
        desired: ConfigValue::Map(desired),
    })
}

fn class_text(class: &ConfigValue) -> String {
    class.to_string()
}

fn without_class(tree: &ConfigTree) -> ConfigTree {
    tree.iter()
        .filter(|(key, _)| key.as_str() != CLASS_KEY)
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(entries: &[(&str, ConfigValue)]) -> ConfigTree {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    fn replication(class: &str, factor: i64) -> ConfigValue {
        ConfigValue::Map(tree(&[
            ("class", class.into()),
            ("replication_factor", factor.into()),
        ]))
    }

    #[test]
    fn test_class_name_comparison() {
        assert!(class_names_match(Some("SimpleStrategy"), Some("SimpleStrategy")));
        assert!(class_names_match(
            Some("org.apache.cassandra.locator.SimpleStrategy"),
            Some("SimpleStrategy")
        ));
        assert!(class_names_match(
            Some("org.apache.cassandra.locator.SimpleStrategy"),
            Some("org.apache.cassandra.locator.SimpleStrategy")
        ));
        assert!(!class_names_match(
            Some("org.apache.cassandra.locator.SimpleStrategy"),
            Some("org.apache.cassandra.locator1.SimpleStrategy")
        ));
        assert!(!class_names_match(
            Some("org.apache.cassandra.locator.SimpleStrategy"),
            Some("org.apache.cassandra.locator.NetworkTopologyStrategy")
        ));
        assert!(class_names_match(Some(""), Some("")));
        assert!(class_names_match(None, None));
        assert!(!class_names_match(Some("X"), None));
        assert!(!class_names_match(None, Some("X")));
    }

    #[test]
    fn test_class_segments_order_insensitive() {
        assert!(class_names_match(Some("a.b.C"), Some("b.a.C")));
        assert!(!class_names_match(Some("a.b.C"), Some("a.c.C")));
    }

    #[test]
    fn test_name_is_never_reported() {
        let current = tree(&[("name", "a".into()), ("comment", "x".into())]);
        let desired = tree(&[("name", "b".into()), ("comment", "x".into())]);
        assert!(compare_trees(&current, &desired).is_empty());
    }

    #[test]
    fn test_non_mapping_input_is_empty() {
        let desired = ConfigValue::Map(tree(&[("comment", "x".into())]));
        assert!(compare_values(&ConfigValue::Null, &desired).is_empty());
        assert!(compare_values(&desired, &ConfigValue::from("x")).is_empty());
    }

    #[test]
    fn test_changed_scalar() {
        let current = tree(&[("comment", "old comment".into()), ("gc_grace_seconds", 10.into())]);
        let desired = tree(&[("comment", "new comment".into()), ("gc_grace_seconds", 10.into())]);

        let changes = compare_trees(&current, &desired);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].property, "comment");
        assert_eq!(changes[0].current, Some("old comment".into()));
        assert_eq!(changes[0].desired, "new comment".into());
    }

    #[test]
    fn test_missing_current_property_is_a_change() {
        let current = ConfigTree::new();
        let desired = tree(&[("comment", "x".into()), ("extensions", ConfigValue::Null)]);

        let changes = compare_trees(&current, &desired);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].property, "comment");
        assert_eq!(changes[0].current, None);
    }

    #[test]
    fn test_replication_factor_change_keeps_class_first() {
        let current = tree(&[("replication", replication("SimpleStrategy", 1))]);
        let desired = tree(&[("replication", replication("SimpleStrategy", 3))]);

        let changes = compare_trees(&current, &desired);
        assert_eq!(changes.len(), 1);
        let desired = changes[0].desired.as_map().unwrap();
        assert_eq!(desired.get_index(0).unwrap().0, "class");
        assert_eq!(desired["replication_factor"], ConfigValue::Int(3));
    }

    #[test]
    fn test_equivalent_class_names_are_unchanged() {
        let current = tree(&[(
            "replication",
            replication("org.apache.cassandra.locator.SimpleStrategy", 3),
        )]);
        let desired = tree(&[("replication", replication("SimpleStrategy", 3))]);
        assert!(compare_trees(&current, &desired).is_empty());
    }

    #[test]
    fn test_class_change_alone_is_a_change() {
        let current = tree(&[("replication", replication("SimpleStrategy", 3))]);
        let desired = tree(&[("replication", replication("NetworkTopologyStrategy", 3))]);

        let changes = compare_trees(&current, &desired);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].desired.as_map().unwrap()["class"],
            ConfigValue::from("NetworkTopologyStrategy")
        );
    }

    #[test]
    fn test_missing_desired_class_borrows_current_class() {
        let current = tree(&[(
            "compaction",
            ConfigValue::Map(tree(&[
                ("class", "SizeTieredCompactionStrategy".into()),
                ("max_threshold", 32.into()),
            ])),
        )]);
        let desired = tree(&[(
            "compaction",
            ConfigValue::Map(tree(&[("max_threshold", 32.into())])),
        )]);

        let changes = compare_trees(&current, &desired);
        assert_eq!(changes.len(), 1);
        let desired = changes[0].desired.as_map().unwrap();
        assert_eq!(desired["class"], ConfigValue::from("SizeTieredCompactionStrategy"));
    }

    #[test]
    fn test_inputs_are_not_mutated() {
        let current = tree(&[("replication", replication("SimpleStrategy", 1))]);
        let desired = tree(&[("replication", replication("SimpleStrategy", 3))]);
        let before = (current.clone(), desired.clone());

        let _ = compare_trees(&current, &desired);
        let _ = compare_trees(&current, &desired);

        assert_eq!((current, desired), before);
    }
}

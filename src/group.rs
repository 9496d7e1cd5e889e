//! Resolved value storage: destination keys to ordered value lists, with
//! nested named sub-groups.

use std::collections::BTreeMap;

use crate::value::Value;

/// A resolved store mapping destination names to ordered value lists.
///
/// Scalar destinations keep exactly one entry; append destinations keep as
/// many as were contributed. Child groups are owned, uniquely named and
/// acyclic. Iteration order is deterministic.
///
/// Reading a destination or group that was never populated through the
/// panicking accessors is a programming fault; `get`, `repeated`,
/// `has_value` and `has_group` are the non-panicking surface.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueGroup {
    name: String,
    values: BTreeMap<String, Vec<Value>>,
    groups: BTreeMap<String, ValueGroup>,
}

impl ValueGroup {
    pub fn new(name: impl Into<String>) -> ValueGroup {
        ValueGroup {
            name: name.into(),
            values: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The first value stored under `name`, or `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name).and_then(|values| values.first())
    }

    /// The first value stored under `name`.
    ///
    /// # Panics
    ///
    /// Panics when the destination is absent or empty.
    pub fn value(&self, name: &str) -> &Value {
        match self.get(name) {
            Some(value) => value,
            None => panic!("no value named '{}'", name),
        }
    }

    /// All values stored under `name`, empty when the destination is absent.
    pub fn repeated(&self, name: &str) -> &[Value] {
        self.values
            .get(name)
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    /// True when at least one value is stored under `name`. A destination
    /// that was explicitly cleared counts as unset.
    pub fn has_value(&self, name: &str) -> bool {
        self.values
            .get(name)
            .map(|values| !values.is_empty())
            .unwrap_or(false)
    }

    pub fn values(&self) -> &BTreeMap<String, Vec<Value>> {
        &self.values
    }

    /// Replace whatever is stored under `name` with a single value.
    pub fn set_value(&mut self, name: &str, value: Value) {
        let entry = self.values.entry(name.to_string()).or_default();
        entry.clear();
        entry.push(value);
    }

    /// Push a value onto the list stored under `name`.
    pub fn add_repeated(&mut self, name: &str, value: Value) {
        self.values.entry(name.to_string()).or_default().push(value);
    }

    /// Record `name` as an explicitly empty list.
    pub fn clear_value(&mut self, name: &str) {
        self.values.entry(name.to_string()).or_default().clear();
    }

    pub fn group(&self, name: &str) -> Option<&ValueGroup> {
        self.groups.get(name)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    pub fn groups(&self) -> &BTreeMap<String, ValueGroup> {
        &self.groups
    }

    /// Attach a child group.
    ///
    /// # Panics
    ///
    /// Panics on an unnamed child or a name collision.
    pub fn add_group(&mut self, group: ValueGroup) {
        assert!(!group.name().is_empty(), "child groups must be named");
        assert!(
            !self.groups.contains_key(group.name()),
            "a group named '{}' already exists",
            group.name()
        );
        self.groups.insert(group.name().to_string(), group);
    }

    /// The child group named `name`, created empty on first use.
    pub fn ensure_group(&mut self, name: &str) -> &mut ValueGroup {
        assert!(!name.is_empty(), "child groups must be named");
        self.groups
            .entry(name.to_string())
            .or_insert_with(|| ValueGroup::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_value_overwrites() {
        let mut group = ValueGroup::new("");
        group.set_value("foo", Value::from("one"));
        group.set_value("foo", Value::from("two"));
        assert_eq!(*group.value("foo"), Value::from("two"));
        assert_eq!(group.repeated("foo").len(), 1);
    }

    #[test]
    fn test_add_repeated_accumulates() {
        let mut group = ValueGroup::new("");
        group.add_repeated("qux", Value::from("one"));
        group.add_repeated("qux", Value::from("two"));
        assert_eq!(group.repeated("qux"), [Value::from("one"), Value::from("two")]);
        assert_eq!(*group.value("qux"), Value::from("one"));
    }

    #[test]
    fn test_missing_destination() {
        let group = ValueGroup::new("");
        assert!(!group.has_value("foo"));
        assert!(group.get("foo").is_none());
        assert!(group.repeated("foo").is_empty());
    }

    #[test]
    fn test_cleared_destination_is_unset_but_present() {
        let mut group = ValueGroup::new("");
        group.set_value("qux", Value::from("one"));
        group.clear_value("qux");
        assert!(!group.has_value("qux"));
        assert!(group.repeated("qux").is_empty());
    }

    #[test]
    #[should_panic(expected = "no value named")]
    fn test_value_panics_when_absent() {
        ValueGroup::new("").value("missing");
    }

    #[test]
    fn test_nested_groups() {
        let mut root = ValueGroup::new("");
        let mut child = ValueGroup::new("server");
        child.set_value("port", Value::Int(8080));
        root.add_group(child);

        assert!(root.has_group("server"));
        assert!(!root.has_group("client"));
        assert_eq!(
            *root.group("server").unwrap().value("port"),
            Value::Int(8080)
        );
    }

    #[test]
    fn test_ensure_group_reuses_existing() {
        let mut root = ValueGroup::new("");
        root.ensure_group("server").set_value("port", Value::Int(1));
        root.ensure_group("server").set_value("host", Value::from("a"));
        assert_eq!(root.groups().len(), 1);
        assert!(root.group("server").unwrap().has_value("port"));
        assert!(root.group("server").unwrap().has_value("host"));
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_duplicate_group_name_panics() {
        let mut root = ValueGroup::new("");
        root.add_group(ValueGroup::new("server"));
        root.add_group(ValueGroup::new("server"));
    }
}

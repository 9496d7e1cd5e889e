//! Switch declarations and their ordered, grouped collection.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::value::{Value, ValueKind};

/// What a switch does when it appears, which also fixes its argument arity:
/// `Store` and `Append` require one argument, `StoreTrue`, `StoreFalse` and
/// `Count` accept an optional one, `StoreConstant` accepts none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Store,
    StoreTrue,
    StoreFalse,
    StoreConstant,
    Append,
    Count,
}

impl Action {
    /// True when the switch cannot be applied without an argument.
    pub fn requires_argument(self) -> bool {
        matches!(self, Action::Store | Action::Append)
    }

    /// True when the switch tolerates an inline `--name=value` argument.
    pub fn accepts_argument(self) -> bool {
        !matches!(self, Action::StoreConstant)
    }

    /// True when the switch may appear more than once on one command line.
    pub fn repeatable(self) -> bool {
        matches!(self, Action::Append | Action::Count)
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Action::Store | Action::Append | Action::StoreConstant => ValueKind::Auto,
            Action::StoreTrue | Action::StoreFalse => ValueKind::Bool,
            Action::Count => ValueKind::Int,
        }
    }

    fn default_value(self) -> Value {
        match self {
            Action::StoreTrue => Value::Bool(false),
            Action::StoreFalse => Value::Bool(true),
            Action::Count => Value::Int(0),
            _ => Value::null(),
        }
    }
}

type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Declaration of one configurable option.
///
/// The first name is canonical and derives the destination key and the
/// uppercase environment-variable name unless those are overridden. The
/// builder records overrides without side effects, so setter order does not
/// matter: the effective default is computed on read as the recorded
/// override, falling back to the action-appropriate default.
#[derive(Clone)]
pub struct Switch {
    names: Vec<String>,
    short_flag: Option<char>,
    action: Action,
    dest: Option<String>,
    constant: Value,
    default: Option<Value>,
    choices: Vec<String>,
    help: String,
    env_var: Option<String>,
    validator: Option<Validator>,
}

impl Switch {
    /// A switch named `name` with the default action, `StoreTrue`.
    pub fn new(name: impl Into<String>) -> Switch {
        Switch {
            names: vec![name.into()],
            short_flag: None,
            action: Action::StoreTrue,
            dest: None,
            constant: Value::null(),
            default: None,
            choices: Vec::new(),
            help: String::new(),
            env_var: None,
            validator: None,
        }
    }

    /// Add an alternative long name.
    pub fn alias(mut self, name: impl Into<String>) -> Switch {
        self.names.push(name.into());
        self
    }

    pub fn short(mut self, flag: char) -> Switch {
        self.short_flag = Some(flag);
        self
    }

    pub fn store(mut self) -> Switch {
        self.action = Action::Store;
        self
    }

    pub fn store_true(mut self) -> Switch {
        self.action = Action::StoreTrue;
        self
    }

    pub fn store_false(mut self) -> Switch {
        self.action = Action::StoreFalse;
        self
    }

    pub fn store_const(mut self, constant: impl Into<Value>) -> Switch {
        self.action = Action::StoreConstant;
        self.constant = constant.into();
        self
    }

    pub fn append(mut self) -> Switch {
        self.action = Action::Append;
        self
    }

    pub fn count(mut self) -> Switch {
        self.action = Action::Count;
        self
    }

    /// Override the destination key derived from the canonical name.
    pub fn dest(mut self, dest: impl Into<String>) -> Switch {
        self.dest = Some(dest.into());
        self
    }

    /// Override the action-appropriate default.
    pub fn default_value(mut self, default: impl Into<Value>) -> Switch {
        self.default = Some(default.into());
        self
    }

    /// Restrict accepted argument text to the listed values, in order.
    pub fn choice(mut self, choice: impl Into<String>) -> Switch {
        self.choices.push(choice.into());
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Switch {
        self.help = help.into();
        self
    }

    /// Override the environment-variable name derived from the canonical
    /// name.
    pub fn env_var(mut self, name: impl Into<String>) -> Switch {
        self.env_var = Some(name.into());
        self
    }

    /// Exclude this switch from the environment stage.
    pub fn no_env_var(mut self) -> Switch {
        self.env_var = Some(String::new());
        self
    }

    /// Predicate run against each candidate value before acceptance.
    pub fn validator(
        mut self,
        validator: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Switch {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn canonical_name(&self) -> &str {
        &self.names[0]
    }

    pub fn short_flag(&self) -> Option<char> {
        self.short_flag
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// The key this switch resolves under in a [`crate::ValueGroup`].
    pub fn destination(&self) -> &str {
        self.dest.as_deref().unwrap_or_else(|| self.canonical_name())
    }

    pub fn constant(&self) -> &Value {
        &self.constant
    }

    /// The default applied when no source provides a value: the recorded
    /// override if any, otherwise false/true/0/null per action.
    pub fn effective_default(&self) -> Value {
        self.default
            .clone()
            .unwrap_or_else(|| self.action.default_value())
    }

    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    pub fn help_text(&self) -> &str {
        &self.help
    }

    /// The variable consulted during the environment stage, or `None` when
    /// the stage is disabled for this switch.
    pub fn environment_variable(&self) -> Option<String> {
        match &self.env_var {
            Some(name) if name.is_empty() => None,
            Some(name) => Some(name.clone()),
            None => Some(self.canonical_name().to_ascii_uppercase()),
        }
    }

    pub fn validator_fn(&self) -> Option<&(dyn Fn(&Value) -> bool + Send + Sync)> {
        self.validator.as_deref()
    }
}

impl fmt::Debug for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Switch")
            .field("names", &self.names)
            .field("short_flag", &self.short_flag)
            .field("action", &self.action)
            .field("dest", &self.destination())
            .finish_non_exhaustive()
    }
}

/// An ordered collection of switches, grouped by name.
///
/// The unnamed group (`""`) feeds command-line, environment and registry
/// resolution; named groups serve sectioned INI-style configuration.
#[derive(Debug, Clone, Default)]
pub struct SwitchSet {
    groups: Vec<(String, Vec<Switch>)>,
}

impl SwitchSet {
    pub fn new() -> SwitchSet {
        SwitchSet::default()
    }

    /// Add a switch to the unnamed group.
    ///
    /// # Panics
    ///
    /// Panics when a switch with the same canonical name already exists in
    /// the group; that is a configuration fault, not a runtime condition.
    pub fn insert(&mut self, switch: Switch) {
        self.insert_grouped("", switch);
    }

    /// Add a switch to the named group, creating the group on first use.
    ///
    /// # Panics
    ///
    /// Panics on a duplicate canonical name within the group.
    pub fn insert_grouped(&mut self, group: &str, switch: Switch) {
        assert!(
            !self.has_switch(group, switch.canonical_name()),
            "switch '{}' already exists in group '{}'",
            switch.canonical_name(),
            group
        );
        for (name, switches) in &mut self.groups {
            if name == group {
                switches.push(switch);
                return;
            }
        }
        self.groups.push((group.to_string(), vec![switch]));
    }

    /// All groups in insertion order.
    pub fn groups(&self) -> &[(String, Vec<Switch>)] {
        &self.groups
    }

    /// The switches of one group, empty when the group is undefined.
    pub fn switches(&self, group: &str) -> &[Switch] {
        self.groups
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, switches)| switches.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_switch(&self, group: &str, name: &str) -> bool {
        self.switches(group)
            .iter()
            .any(|switch| switch.canonical_name() == name)
    }

    /// Look a switch up by any of its long names within one group.
    pub fn find(&self, group: &str, name: &str) -> Option<&Switch> {
        self.switches(group)
            .iter()
            .find(|switch| switch.names().iter().any(|n| n == name))
    }

    /// Look a switch up by its short flag within one group.
    pub fn find_short(&self, group: &str, flag: char) -> Option<&Switch> {
        self.switches(group)
            .iter()
            .find(|switch| switch.short_flag() == Some(flag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_action_is_store_true() {
        let switch = Switch::new("verbose");
        assert_eq!(switch.action(), Action::StoreTrue);
        assert_eq!(switch.effective_default(), Value::Bool(false));
    }

    #[test]
    fn test_derived_dest_and_env_var() {
        let switch = Switch::new("output").store();
        assert_eq!(switch.destination(), "output");
        assert_eq!(switch.environment_variable(), Some("OUTPUT".to_string()));
    }

    #[test]
    fn test_overrides() {
        let switch = Switch::new("output")
            .store()
            .dest("outfile")
            .env_var("OUT_FILE");
        assert_eq!(switch.destination(), "outfile");
        assert_eq!(switch.environment_variable(), Some("OUT_FILE".to_string()));
    }

    #[test]
    fn test_env_var_can_be_disabled() {
        let switch = Switch::new("secret").store().no_env_var();
        assert_eq!(switch.environment_variable(), None);
    }

    #[test]
    fn test_default_survives_action_setter_order() {
        // The override sticks no matter where it appears in the chain.
        let before = Switch::new("level").default_value(5).count();
        let after = Switch::new("level").count().default_value(5);
        assert_eq!(before.effective_default(), Value::Int(5));
        assert_eq!(after.effective_default(), Value::Int(5));
    }

    #[test]
    fn test_action_defaults() {
        assert_eq!(
            Switch::new("x").store_false().effective_default(),
            Value::Bool(true)
        );
        assert_eq!(Switch::new("x").count().effective_default(), Value::Int(0));
        assert!(Switch::new("x").store().effective_default().is_null());
        assert!(Switch::new("x").append().effective_default().is_null());
    }

    #[test]
    fn test_arity_table() {
        assert!(Action::Store.requires_argument());
        assert!(Action::Append.requires_argument());
        assert!(!Action::Count.requires_argument());
        assert!(Action::Count.accepts_argument());
        assert!(!Action::StoreConstant.accepts_argument());
        assert!(Action::Append.repeatable());
        assert!(Action::Count.repeatable());
        assert!(!Action::Store.repeatable());
    }

    #[test]
    fn test_find_by_alias_and_short_flag() {
        let mut set = SwitchSet::new();
        set.insert(Switch::new("foo").alias("foobar").short('f').store());
        set.insert(Switch::new("bar"));

        assert_eq!(set.find("", "foo").unwrap().canonical_name(), "foo");
        assert_eq!(set.find("", "foobar").unwrap().canonical_name(), "foo");
        assert_eq!(set.find_short("", 'f').unwrap().canonical_name(), "foo");
        assert!(set.find("", "baz").is_none());
        assert!(set.find_short("", 'z').is_none());
    }

    #[test]
    fn test_named_groups_are_independent() {
        let mut set = SwitchSet::new();
        set.insert_grouped("server", Switch::new("port").store());
        set.insert_grouped("client", Switch::new("port").store());

        assert!(set.has_switch("server", "port"));
        assert!(set.find("", "port").is_none());
        assert_eq!(set.switches("server").len(), 1);
        assert!(set.switches("missing").is_empty());
    }

    #[test]
    #[should_panic(expected = "already exists")]
    fn test_duplicate_canonical_name_panics() {
        let mut set = SwitchSet::new();
        set.insert(Switch::new("foo"));
        set.insert(Switch::new("foo").store());
    }

    #[test]
    fn test_action_deserializes_snake_case() {
        assert_eq!(
            serde_json::from_str::<Action>(r#""store_true""#).unwrap(),
            Action::StoreTrue
        );
        assert_eq!(
            serde_json::from_str::<Action>(r#""append""#).unwrap(),
            Action::Append
        );
    }
}

//! Overlay value sources consulted after the command line.

use crate::env::EnvSource;
use crate::switch::{Action, Switch};

/// One raw entry contributed by a provider. Text goes through the same
/// coercion and validation as a command-line argument; integers arrive
/// pre-typed (registry DWORD values).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceValue {
    Text(String),
    Int(i64),
}

/// A key-value source participating in the precedence chain.
///
/// Providers are consulted in fixed order for each destination the command
/// line left unset; the first provider that answers for a destination
/// supplies all of its entries and later providers are skipped. `None`
/// means this provider has nothing for the switch.
pub trait Provider {
    fn lookup(&self, switch: &Switch) -> Option<Vec<SourceValue>>;
}

/// Environment variable stage. An append switch treats the variable as a
/// comma-separated list, each piece trimmed and applied independently.
pub struct EnvProvider<'a> {
    env: &'a dyn EnvSource,
}

impl<'a> EnvProvider<'a> {
    pub fn new(env: &'a dyn EnvSource) -> EnvProvider<'a> {
        EnvProvider { env }
    }
}

impl Provider for EnvProvider<'_> {
    fn lookup(&self, switch: &Switch) -> Option<Vec<SourceValue>> {
        let name = switch.environment_variable()?;
        let raw = self.env.get(&name)?;
        if switch.action() == Action::Append {
            Some(
                raw.split(',')
                    .map(|piece| SourceValue::Text(piece.trim().to_string()))
                    .collect(),
            )
        } else {
            Some(vec![SourceValue::Text(raw)])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnvironment;

    #[test]
    fn test_env_provider_scalar() {
        let mut env = MapEnvironment::new();
        env.set("FOO", "bar");
        let provider = EnvProvider::new(&env);

        let switch = Switch::new("foo").store();
        assert_eq!(
            provider.lookup(&switch),
            Some(vec![SourceValue::Text("bar".to_string())])
        );
        assert_eq!(provider.lookup(&Switch::new("other").store()), None);
    }

    #[test]
    fn test_env_provider_splits_append_on_commas() {
        let mut env = MapEnvironment::new();
        env.set("QUX", "one, two");
        let provider = EnvProvider::new(&env);

        assert_eq!(
            provider.lookup(&Switch::new("qux").append()),
            Some(vec![
                SourceValue::Text("one".to_string()),
                SourceValue::Text("two".to_string()),
            ])
        );
    }

    #[test]
    fn test_env_provider_respects_disabled_variable() {
        let mut env = MapEnvironment::new();
        env.set("SECRET", "x");
        let provider = EnvProvider::new(&env);

        assert_eq!(provider.lookup(&Switch::new("secret").store().no_env_var()), None);
    }
}

//! Environment variable collaborator.

use std::collections::HashMap;
use std::env;

/// Read access to named environment variables. Absence is a normal outcome,
/// not an error.
pub trait EnvSource {
    fn get(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl ProcessEnvironment {
    pub fn new() -> ProcessEnvironment {
        ProcessEnvironment
    }

    pub fn set(&mut self, name: &str, value: &str) {
        env::set_var(name, value);
    }

    pub fn unset(&mut self, name: &str) {
        env::remove_var(name);
    }
}

impl EnvSource for ProcessEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

/// An in-memory environment. Parsing against one of these is deterministic
/// regardless of the process environment, which is what tests want.
#[derive(Debug, Clone, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    pub fn new() -> MapEnvironment {
        MapEnvironment::default()
    }

    pub fn set(&mut self, name: &str, value: &str) -> &mut MapEnvironment {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }

    pub fn unset(&mut self, name: &str) -> &mut MapEnvironment {
        self.vars.remove(name);
        self
    }
}

impl EnvSource for MapEnvironment {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_environment_get_set_unset() {
        let mut env = MapEnvironment::new();
        assert_eq!(env.get("FOO"), None);
        env.set("FOO", "bar");
        assert_eq!(env.get("FOO"), Some("bar".to_string()));
        env.unset("FOO");
        assert_eq!(env.get("FOO"), None);
    }

    #[test]
    fn test_process_environment_roundtrip() {
        let mut env = ProcessEnvironment::new();
        env.set("SWITCHYARD_ENV_TEST", "1");
        assert_eq!(env.get("SWITCHYARD_ENV_TEST"), Some("1".to_string()));
        env.unset("SWITCHYARD_ENV_TEST");
        assert_eq!(env.get("SWITCHYARD_ENV_TEST"), None);
    }
}

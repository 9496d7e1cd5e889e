//! Declarative JSON switch-set definitions.
//!
//! A [`Definition`] describes a whole parser — program metadata plus a list
//! of switch declarations — and builds into an [`ArgumentParser`]. The JSON
//! shape mirrors the builder API: every field except `name` is optional and
//! falls back to the same defaults the builder uses.

use serde::Deserialize;
use thiserror::Error;

use crate::parser::ArgumentParser;
use crate::switch::{Action, Switch};
use crate::value::Value;

/// Errors that can occur during definition parsing and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse JSON definition: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("duplicate switch name: {0}")]
    DuplicateName(String),

    #[error("invalid short flag '{0}': must be a single ASCII letter")]
    InvalidShortFlag(char),

    #[error("'choices' on switch '{0}' is empty: must have at least one valid value")]
    EmptyChoices(String),

    #[error("'choices' on switch '{0}' has duplicate value: {1}")]
    DuplicateChoice(String, String),

    #[error("'choices' on switch '{0}' requires an argument-taking action")]
    ChoicesWithoutArgument(String),

    #[error("switch '{0}' with action store_constant requires a 'constant'")]
    MissingConstant(String),

    #[error("'constant' on switch '{0}' requires action store_constant")]
    ConstantWithoutStoreConstant(String),
}

/// Environment variable fallback setting for one switch.
///
/// - Not specified (None): derived from the canonical name, uppercased
/// - `false`: disabled, never reads from the environment
/// - `"VAR_NAME"`: custom variable name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvSetting {
    /// Explicitly disabled with `env: false`
    Disabled,
    /// Custom variable name with `env: "VAR_NAME"`
    Custom(String),
}

impl<'de> Deserialize<'de> for EnvSetting {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct EnvSettingVisitor;

        impl<'de> Visitor<'de> for EnvSettingVisitor {
            type Value = EnvSetting;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("false or a string")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                if value {
                    // `env: true` means the derived name, which omitting the
                    // field already gives.
                    Err(de::Error::custom(
                        "use `env: false` to disable or omit the field for the derived name",
                    ))
                } else {
                    Ok(EnvSetting::Disabled)
                }
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(EnvSetting::Custom(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(EnvSetting::Custom(value))
            }
        }

        deserializer.deserialize_any(EnvSettingVisitor)
    }
}

/// Declaration of a single switch.
#[derive(Debug, Clone, Deserialize)]
pub struct SwitchDef {
    /// The canonical long name.
    pub name: String,
    /// Alternative long names.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Short flag character (e.g. 'v' for -v).
    pub short: Option<char>,
    /// What the switch does; defaults to `store_true`.
    pub action: Option<Action>,
    /// Destination key override.
    pub dest: Option<String>,
    /// Default value override.
    pub default: Option<Value>,
    /// The value stored by `store_constant`.
    pub constant: Option<Value>,
    /// Allowed argument texts, in order.
    pub choices: Option<Vec<String>>,
    /// Environment variable fallback setting.
    pub env: Option<EnvSetting>,
    /// Switch group for sectioned configuration; unnamed when absent.
    pub group: Option<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Top-level parser definition.
#[derive(Debug, Clone, Deserialize)]
pub struct Definition {
    /// Program name; argv[0] fills it in when absent.
    pub program: Option<String>,
    /// Usage line for help output.
    pub usage: Option<String>,
    /// Version string.
    pub version: Option<String>,
    /// Registry subkey path gating the registry stage.
    pub registry_prefix: Option<String>,
    /// List of switch declarations.
    #[serde(default)]
    pub switches: Vec<SwitchDef>,
}

impl Definition {
    /// Parse a JSON string into a Definition.
    pub fn from_json(json: &str) -> Result<Definition, ConfigError> {
        let definition: Definition = serde_json::from_str(json)?;
        Ok(definition)
    }

    /// Validate the definition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        use std::collections::HashSet;

        let mut names = HashSet::new();
        for def in &self.switches {
            let group = def.group.as_deref().unwrap_or("");
            if !names.insert((group, def.name.as_str())) {
                return Err(ConfigError::DuplicateName(def.name.clone()));
            }
            Self::validate_switch(def)?;
        }
        Ok(())
    }

    fn validate_switch(def: &SwitchDef) -> Result<(), ConfigError> {
        use std::collections::HashSet;

        if let Some(short) = def.short {
            if !short.is_ascii_alphabetic() {
                return Err(ConfigError::InvalidShortFlag(short));
            }
        }

        let action = def.action.unwrap_or(Action::StoreTrue);
        if action == Action::StoreConstant && def.constant.is_none() {
            return Err(ConfigError::MissingConstant(def.name.clone()));
        }
        if action != Action::StoreConstant && def.constant.is_some() {
            return Err(ConfigError::ConstantWithoutStoreConstant(def.name.clone()));
        }

        if let Some(ref choices) = def.choices {
            if !action.accepts_argument() {
                return Err(ConfigError::ChoicesWithoutArgument(def.name.clone()));
            }
            if choices.is_empty() {
                return Err(ConfigError::EmptyChoices(def.name.clone()));
            }
            let mut seen = HashSet::new();
            for choice in choices {
                if !seen.insert(choice) {
                    return Err(ConfigError::DuplicateChoice(
                        def.name.clone(),
                        choice.clone(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Validate and build the described parser.
    pub fn build(&self) -> Result<ArgumentParser, ConfigError> {
        self.validate()?;

        let mut parser = ArgumentParser::new();
        if let Some(ref program) = self.program {
            parser.program(program);
        }
        if let Some(ref usage) = self.usage {
            parser.usage(usage);
        }
        if let Some(ref version) = self.version {
            parser.version(version);
        }
        if let Some(ref prefix) = self.registry_prefix {
            parser.registry_prefix(prefix);
        }

        let mut set = crate::switch::SwitchSet::new();
        for def in &self.switches {
            let group = def.group.as_deref().unwrap_or("");
            set.insert_grouped(group, build_switch(def));
        }
        parser.switch_set(set);
        Ok(parser)
    }
}

fn build_switch(def: &SwitchDef) -> Switch {
    let mut switch = Switch::new(&def.name);
    for alias in &def.aliases {
        switch = switch.alias(alias);
    }
    if let Some(short) = def.short {
        switch = switch.short(short);
    }
    switch = match def.action.unwrap_or(Action::StoreTrue) {
        Action::Store => switch.store(),
        Action::StoreTrue => switch.store_true(),
        Action::StoreFalse => switch.store_false(),
        // validate() guarantees the constant is present
        Action::StoreConstant => switch.store_const(def.constant.clone().unwrap_or(Value::null())),
        Action::Append => switch.append(),
        Action::Count => switch.count(),
    };
    if let Some(ref dest) = def.dest {
        switch = switch.dest(dest);
    }
    if let Some(ref default) = def.default {
        switch = switch.default_value(default.clone());
    }
    for choice in def.choices.iter().flatten() {
        switch = switch.choice(choice);
    }
    match &def.env {
        Some(EnvSetting::Disabled) => switch = switch.no_env_var(),
        Some(EnvSetting::Custom(name)) => switch = switch.env_var(name),
        None => {}
    }
    if let Some(ref help) = def.help {
        switch = switch.help(help);
    }
    switch
}

//! Argument parsing and multi-source value resolution.
//!
//! [`ArgumentParser`] parses argv against a [`SwitchSet`], overlays values
//! from the registry (on Windows) and the environment, and falls back to
//! per-action defaults. Precedence is strict: command line, then registry
//! (machine hive before user hive), then environment, then defaults. A
//! destination populated by a higher stage is skipped entirely in later
//! stages; append destinations accumulate within a single stage only.
//!
//! The first error aborts the whole parse. Partially resolved state is
//! never observable: `parse` hands back a [`ParsedArguments`] on success
//! and nothing otherwise.

use std::collections::HashSet;

use thiserror::Error;

use crate::env::{EnvSource, ProcessEnvironment};
use crate::group::ValueGroup;
use crate::provider::{EnvProvider, Provider, SourceValue};
use crate::registry;
use crate::switch::{Action, Switch, SwitchSet};
use crate::value::{self, Value, ValueKind};

/// User-input errors. Each carries the offending token or destination; none
/// leaves a trustworthy result behind.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid switch '{0}'")]
    UnknownSwitch(String),

    #[error("duplicate switch '{0}'")]
    DuplicateSwitch(String),

    #[error("switch {0} requires an argument")]
    MissingArgument(String),

    #[error("unexpected argument for switch '{0}'")]
    UnexpectedArgument(String),

    #[error("cannot convert '{text}' to {expected}")]
    TypeCoercion {
        text: String,
        expected: &'static str,
    },

    #[error("invalid value for {dest}: '{value}'")]
    Validation { dest: String, value: String },
}

/// The outcome of a successful parse: the program name, the positional
/// arguments in order, and the resolved values.
#[derive(Debug, PartialEq)]
pub struct ParsedArguments {
    program: String,
    arguments: Vec<String>,
    values: ValueGroup,
}

impl ParsedArguments {
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Positional arguments, in command-line order.
    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn values(&self) -> &ValueGroup {
        &self.values
    }

    /// The resolved value for a destination. Panics when the destination
    /// does not exist; every declared switch resolves to something.
    pub fn value(&self, name: &str) -> &Value {
        self.values.value(name)
    }

    pub fn repeated_value(&self, name: &str) -> &[Value] {
        self.values.repeated(name)
    }

    pub fn into_values(self) -> ValueGroup {
        self.values
    }
}

/// Multi-source command-line argument parser.
///
/// Configure once with the fluent setters, then call [`parse`](Self::parse).
/// A parser holds no per-parse state; callers needing concurrent parses use
/// independent instances.
pub struct ArgumentParser {
    program: String,
    usage: String,
    version: String,
    switch_set: SwitchSet,
    registry_prefix: String,
    parse_environment: bool,
    env: Box<dyn EnvSource>,
}

impl ArgumentParser {
    pub fn new() -> ArgumentParser {
        ArgumentParser {
            program: String::new(),
            usage: String::new(),
            version: String::new(),
            switch_set: SwitchSet::new(),
            registry_prefix: String::new(),
            parse_environment: true,
            env: Box::new(ProcessEnvironment::new()),
        }
    }

    /// Set the program name. When unset, argv[0] fills it in at parse time.
    pub fn program(&mut self, program: impl Into<String>) -> &mut ArgumentParser {
        self.program = program.into();
        self
    }

    pub fn usage(&mut self, usage: impl Into<String>) -> &mut ArgumentParser {
        self.usage = usage.into();
        self
    }

    pub fn version(&mut self, version: impl Into<String>) -> &mut ArgumentParser {
        self.version = version.into();
        self
    }

    pub fn switch_set(&mut self, switch_set: SwitchSet) -> &mut ArgumentParser {
        self.switch_set = switch_set;
        self
    }

    /// Add a switch to the unnamed group.
    pub fn add_switch(&mut self, switch: Switch) -> &mut ArgumentParser {
        self.switch_set.insert(switch);
        self
    }

    /// Gate the registry stage on a subkey path. Empty (the default)
    /// disables it; the stage only ever runs on Windows.
    pub fn registry_prefix(&mut self, prefix: impl Into<String>) -> &mut ArgumentParser {
        self.registry_prefix = prefix.into();
        self
    }

    /// Enable or disable the environment stage. Enabled by default.
    pub fn enable_parse_environment(&mut self, enable: bool) -> &mut ArgumentParser {
        self.parse_environment = enable;
        self
    }

    /// Replace the environment source. The default reads the process
    /// environment; tests substitute a [`crate::MapEnvironment`].
    pub fn environment(&mut self, env: impl EnvSource + 'static) -> &mut ArgumentParser {
        self.env = Box::new(env);
        self
    }

    pub fn program_name(&self) -> &str {
        &self.program
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn version_text(&self) -> &str {
        &self.version
    }

    pub fn switches(&self) -> &SwitchSet {
        &self.switch_set
    }

    /// Parse argv and resolve every declared switch.
    ///
    /// argv[0] is consumed as the program name (only used when none was
    /// configured); parsing proper starts at index 1. On error all partial
    /// state is discarded.
    pub fn parse<S: AsRef<str>>(&self, argv: &[S]) -> Result<ParsedArguments, ParseError> {
        let argv: Vec<&str> = argv.iter().map(AsRef::as_ref).collect();
        let mut run = ParseRun {
            parser: self,
            program: self.program.clone(),
            arguments: Vec::new(),
            values: ValueGroup::new(""),
            seen: HashSet::new(),
        };
        run.parse_command_line(&argv)?;
        run.apply_overlays()?;
        run.apply_defaults();
        Ok(ParsedArguments {
            program: run.program,
            arguments: run.arguments,
            values: run.values,
        })
    }
}

impl Default for ArgumentParser {
    fn default() -> ArgumentParser {
        ArgumentParser::new()
    }
}

// Per-parse state, created fresh for every `parse` call.
struct ParseRun<'a> {
    parser: &'a ArgumentParser,
    program: String,
    arguments: Vec<String>,
    values: ValueGroup,
    // Canonical names seen on the command line, for duplicate detection.
    // Two alias forms of one switch count as the same switch.
    seen: HashSet<String>,
}

impl<'a> ParseRun<'a> {
    fn lookup_long(&self, name: &str) -> Option<&'a Switch> {
        self.parser.switch_set.find("", name)
    }

    fn lookup_short(&self, flag: char) -> Option<&'a Switch> {
        self.parser.switch_set.find_short("", flag)
    }

    fn parse_command_line(&mut self, argv: &[&str]) -> Result<(), ParseError> {
        let mut index = 0;
        if let Some(first) = argv.first() {
            if self.program.is_empty() {
                self.program = first.to_string();
            }
            index = 1;
        }

        while index < argv.len() {
            let arg = argv[index];

            // Everything that does not start with '-' is a free argument,
            // as is the special case of '-' alone.
            if !is_switch(arg) {
                self.arguments.push(arg.to_string());
                index += 1;
                continue;
            }

            // '--' makes all remaining tokens free arguments, verbatim.
            if arg == "--" {
                for rest in &argv[index + 1..] {
                    self.arguments.push(rest.to_string());
                }
                break;
            }

            index = if !arg.starts_with("--") {
                self.parse_short_cluster(argv, index)?
            } else {
                self.parse_long_switch(argv, index)?
            };
        }
        Ok(())
    }

    // A single-dash cluster like `-xvzf`: each character is a short flag,
    // applied left to right. A flag that needs an argument takes the rest
    // of the cluster if any remains, otherwise the next token. Returns the
    // index of the next unconsumed token.
    fn parse_short_cluster(&mut self, argv: &[&str], index: usize) -> Result<usize, ParseError> {
        let cluster: Vec<char> = argv[index].chars().skip(1).collect();
        for (offset, flag) in cluster.iter().enumerate() {
            let flag = *flag;
            let switch = self
                .lookup_short(flag)
                .ok_or_else(|| ParseError::UnknownSwitch(format!("-{}", flag)))?;
            self.check_duplicate(switch, &format!("-{}", flag))?;

            if !switch.action().requires_argument() {
                self.apply_without_argument(switch)?;
                continue;
            }

            if offset + 1 < cluster.len() {
                let text: String = cluster[offset + 1..].iter().collect();
                apply_with_argument(switch, &text, &mut self.values)?;
                return Ok(index + 1);
            }
            return match argv.get(index + 1) {
                Some(token) if !is_switch(token) => {
                    apply_with_argument(switch, token, &mut self.values)?;
                    Ok(index + 2)
                }
                _ => Err(ParseError::MissingArgument(format!("-{}", flag))),
            };
        }
        Ok(index + 1)
    }

    // A double-dash token, split at the first '=' into name and inline
    // value. An unmatched `--no-X` without an inline value retries as X
    // with the synthetic value "no". Returns the index of the next
    // unconsumed token.
    fn parse_long_switch(&mut self, argv: &[&str], index: usize) -> Result<usize, ParseError> {
        let body = &argv[index][2..];
        let (mut name, mut inline) = match body.find('=') {
            Some(pos) => (&body[..pos], body[pos + 1..].to_string()),
            None => (body, String::new()),
        };

        let mut switch = self.lookup_long(name);
        if switch.is_none() && inline.is_empty() {
            if let Some(stripped) = name.strip_prefix("no-") {
                name = stripped;
                inline = "no".to_string();
                switch = self.lookup_long(name);
            }
        }
        let switch = switch.ok_or_else(|| ParseError::UnknownSwitch(format!("--{}", name)))?;
        self.check_duplicate(switch, &format!("--{}", name))?;

        if !inline.is_empty() {
            if !switch.action().accepts_argument() {
                return Err(ParseError::UnexpectedArgument(format!("--{}", name)));
            }
            apply_with_argument(switch, &inline, &mut self.values)?;
            Ok(index + 1)
        } else if switch.action().requires_argument() {
            match argv.get(index + 1) {
                Some(token) if !is_switch(token) => {
                    apply_with_argument(switch, token, &mut self.values)?;
                    Ok(index + 2)
                }
                _ => Err(ParseError::MissingArgument(format!("--{}", name))),
            }
        } else {
            self.apply_without_argument(switch)?;
            Ok(index + 1)
        }
    }

    fn check_duplicate(&mut self, switch: &Switch, token: &str) -> Result<(), ParseError> {
        if !self.seen.insert(switch.canonical_name().to_string())
            && !switch.action().repeatable()
        {
            return Err(ParseError::DuplicateSwitch(token.to_string()));
        }
        Ok(())
    }

    fn apply_without_argument(&mut self, switch: &Switch) -> Result<(), ParseError> {
        let value = match switch.action() {
            Action::StoreTrue => Value::Bool(true),
            Action::StoreFalse => Value::Bool(false),
            Action::StoreConstant => switch.constant().clone(),
            Action::Count => {
                let previous = self
                    .values
                    .get(switch.destination())
                    .map(|value| value.as_int().unwrap_or(0))
                    .unwrap_or(0);
                Value::Int(previous + 1)
            }
            Action::Store | Action::Append => unreachable!("switch requires an argument"),
        };
        if let Some(validate) = switch.validator_fn() {
            if !validate(&value) {
                return Err(ParseError::Validation {
                    dest: switch.destination().to_string(),
                    value: value.to_string(),
                });
            }
        }
        self.values.set_value(switch.destination(), value);
        Ok(())
    }

    // Registry (machine hive, then user hive) and environment, in that
    // order, for every destination the command line left unset. The first
    // provider that answers a destination supplies all of its entries.
    fn apply_overlays(&mut self) -> Result<(), ParseError> {
        let parser = self.parser;
        let mut providers: Vec<Box<dyn Provider + '_>> = Vec::new();
        if !parser.registry_prefix.is_empty() {
            for provider in registry::providers(&parser.registry_prefix) {
                providers.push(provider);
            }
        }
        if parser.parse_environment {
            providers.push(Box::new(EnvProvider::new(parser.env.as_ref())));
        }

        for provider in &providers {
            for switch in parser.switch_set.switches("") {
                if self.values.has_value(switch.destination()) {
                    continue;
                }
                let Some(entries) = provider.lookup(switch) else {
                    continue;
                };
                for entry in entries {
                    match entry {
                        SourceValue::Text(text) => {
                            apply_with_argument(switch, &text, &mut self.values)?
                        }
                        SourceValue::Int(int) => {
                            apply_typed(switch, Value::Int(int), &mut self.values)?
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_defaults(&mut self) {
        for switch in self.parser.switch_set.switches("") {
            if self.values.has_value(switch.destination()) {
                continue;
            }
            let default = switch.effective_default();
            // An append switch with a null default resolves to an
            // explicitly empty list, not a single null entry.
            if switch.action() == Action::Append && default.is_null() {
                self.values.clear_value(switch.destination());
                continue;
            }
            self.values.set_value(switch.destination(), default);
        }
    }
}

// A token is switch-shaped when it starts with '-', except for '-' alone.
fn is_switch(arg: &str) -> bool {
    arg != "-" && arg.starts_with('-')
}

// Coerce `text` per the switch's value kind, run choices and the validator,
// and store it. Shared by the command line, the overlay providers and the
// INI parser.
pub(crate) fn apply_with_argument(
    switch: &Switch,
    text: &str,
    values: &mut ValueGroup,
) -> Result<(), ParseError> {
    let value = match switch.action().value_kind() {
        ValueKind::Auto => Value::Auto(text.to_string()),
        ValueKind::Int => {
            let parsed: i64 = text.parse().map_err(|_| ParseError::TypeCoercion {
                text: text.to_string(),
                expected: "an integer",
            })?;
            Value::Int(parsed)
        }
        ValueKind::Bool => {
            let parsed = value::parse_bool(text).ok_or_else(|| ParseError::TypeCoercion {
                text: text.to_string(),
                expected: "a boolean",
            })?;
            Value::Bool(if switch.action() == Action::StoreFalse {
                !parsed
            } else {
                parsed
            })
        }
    };

    if !switch.choices().is_empty() && !switch.choices().iter().any(|choice| choice == text) {
        return Err(ParseError::Validation {
            dest: switch.destination().to_string(),
            value: text.to_string(),
        });
    }
    if let Some(validate) = switch.validator_fn() {
        if !validate(&value) {
            return Err(ParseError::Validation {
                dest: switch.destination().to_string(),
                value: text.to_string(),
            });
        }
    }

    if switch.action() == Action::Append {
        values.add_repeated(switch.destination(), value);
    } else {
        values.set_value(switch.destination(), value);
    }
    Ok(())
}

// A pre-typed value from the registry skips text coercion but not the
// validator.
fn apply_typed(switch: &Switch, value: Value, values: &mut ValueGroup) -> Result<(), ParseError> {
    if let Some(validate) = switch.validator_fn() {
        if !validate(&value) {
            return Err(ParseError::Validation {
                dest: switch.destination().to_string(),
                value: value.to_string(),
            });
        }
    }
    if switch.action() == Action::Append {
        values.add_repeated(switch.destination(), value);
    } else {
        values.set_value(switch.destination(), value);
    }
    Ok(())
}

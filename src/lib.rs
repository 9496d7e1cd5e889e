//! switchyard - command-line argument parsing with layered value sources.
//!
//! A parser is configured with a set of [`Switch`] declarations and resolves
//! every one of them from the highest-precedence source that provides a
//! value: the command line first, then the Windows registry (when a prefix
//! is configured), then environment variables, then per-action defaults.
//!
//! ```
//! use switchyard::{ArgumentParser, MapEnvironment, Switch, Value};
//!
//! let mut parser = ArgumentParser::new();
//! parser
//!     .program("greet")
//!     .environment(MapEnvironment::new())
//!     .add_switch(Switch::new("name").short('n').store().default_value("world"))
//!     .add_switch(Switch::new("loud").help("Shout the greeting"));
//!
//! let parsed = parser.parse(&["greet", "--name", "Rust", "--loud", "extra"])?;
//! assert_eq!(*parsed.value("name"), Value::from("Rust"));
//! assert_eq!(*parsed.value("loud"), Value::from(true));
//! assert_eq!(parsed.arguments(), ["extra"]);
//! # Ok::<(), switchyard::ParseError>(())
//! ```
//!
//! Switch sets can also be declared in JSON ([`Definition`]) and values can
//! be read from INI-style configuration files ([`IniConfigParser`]).

pub mod config;
pub mod env;
pub mod group;
pub mod help;
pub mod ini;
pub mod parser;
pub mod provider;
pub mod registry;
pub mod switch;
pub mod value;

pub use config::{ConfigError, Definition, EnvSetting, SwitchDef};
pub use env::{EnvSource, MapEnvironment, ProcessEnvironment};
pub use group::ValueGroup;
pub use help::{generate_help, generate_usage, generate_version};
pub use ini::{IniConfigParser, IniError};
pub use parser::{ArgumentParser, ParseError, ParsedArguments};
pub use provider::{Provider, SourceValue};
pub use switch::{Action, Switch, SwitchSet};
pub use value::{Value, ValueError, ValueKind};

//! INI-style sectioned configuration sharing the switch and value model.
//!
//! Supports `#` and `;` comments (full-line and trailing), `[section]`
//! headers and `key=value` assignments. Keys resolve against the
//! [`SwitchSet`] group named by the current section — the unnamed group
//! before any header — and values go through the same coercion and
//! validation as command-line arguments. Resolved values land in a child
//! [`ValueGroup`] per section under one root group.

use std::fs;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::group::ValueGroup;
use crate::parser::{self, ParseError};
use crate::switch::SwitchSet;

#[derive(Debug, Error)]
pub enum IniError {
    #[error("cannot read configuration file: {0}")]
    Io(#[from] io::Error),

    #[error("invalid section header on line {0}")]
    InvalidSectionHeader(usize),

    #[error("syntax error on line {0}")]
    Syntax(usize),

    #[error("unknown key '{key}' in section '{section}' on line {line}")]
    UnknownKey {
        section: String,
        key: String,
        line: usize,
    },

    #[error("{source} on line {line}")]
    Value {
        #[source]
        source: ParseError,
        line: usize,
    },
}

/// Parser for INI-style configuration against a configured switch set.
pub struct IniConfigParser {
    switch_set: SwitchSet,
    reject_unknown: bool,
}

impl IniConfigParser {
    /// Keys not declared in the switch set are skipped unless
    /// [`reject_unknown`](Self::reject_unknown) is turned on.
    pub fn new(switch_set: SwitchSet) -> IniConfigParser {
        IniConfigParser {
            switch_set,
            reject_unknown: false,
        }
    }

    /// Treat undeclared keys as errors instead of skipping them.
    pub fn reject_unknown(mut self, reject: bool) -> IniConfigParser {
        self.reject_unknown = reject;
        self
    }

    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ValueGroup, IniError> {
        let text = fs::read_to_string(path)?;
        self.parse_str(&text)
    }

    pub fn parse_str(&self, text: &str) -> Result<ValueGroup, IniError> {
        let mut root = ValueGroup::new("");
        let mut section = String::new();
        for (number, raw) in text.lines().enumerate() {
            self.parse_line(raw, number + 1, &mut section, &mut root)?;
        }
        Ok(root)
    }

    fn parse_line(
        &self,
        raw: &str,
        line: usize,
        section: &mut String,
        root: &mut ValueGroup,
    ) -> Result<(), IniError> {
        let mut text = raw;
        if let Some(comment) = text.find(['#', ';']) {
            text = &text[..comment];
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }

        if let Some(header) = text.strip_prefix('[') {
            let name = header
                .strip_suffix(']')
                .ok_or(IniError::InvalidSectionHeader(line))?;
            *section = name.trim().to_string();
            return Ok(());
        }

        let (key, value) = text.split_once('=').ok_or(IniError::Syntax(line))?;
        let key = key.trim();
        let value = value.trim();

        let Some(switch) = self.switch_set.find(section, key) else {
            if self.reject_unknown {
                return Err(IniError::UnknownKey {
                    section: section.clone(),
                    key: key.to_string(),
                    line,
                });
            }
            return Ok(());
        };

        let target = if section.is_empty() {
            &mut *root
        } else {
            root.ensure_group(section)
        };
        parser::apply_with_argument(switch, value, target)
            .map_err(|source| IniError::Value { source, line })
    }
}

//! Windows registry providers.
//!
//! The registry stage reads the configured subkey under HKEY_LOCAL_MACHINE
//! and then HKEY_CURRENT_USER. On other platforms [`providers`] returns an
//! empty list, so the resolution engine itself carries no platform
//! branching.

#[cfg(not(windows))]
use crate::provider::Provider;

#[cfg(windows)]
mod imp {
    use winreg::enums::{RegType, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE};
    use winreg::{RegKey, HKEY};

    use crate::provider::{Provider, SourceValue};
    use crate::switch::{Action, Switch};

    /// One registry hive opened at the configured prefix. A hive that cannot
    /// be opened answers nothing.
    pub struct RegistryProvider {
        key: Option<RegKey>,
    }

    impl RegistryProvider {
        pub fn open(hive: HKEY, prefix: &str) -> RegistryProvider {
            RegistryProvider {
                key: RegKey::predef(hive).open_subkey(prefix).ok(),
            }
        }
    }

    impl Provider for RegistryProvider {
        fn lookup(&self, switch: &Switch) -> Option<Vec<SourceValue>> {
            let key = self.key.as_ref()?;
            for name in switch.names() {
                let Ok(raw) = key.get_raw_value(name) else {
                    continue;
                };
                match raw.vtype {
                    RegType::REG_SZ => {
                        let text: String = key.get_value(name).ok()?;
                        return Some(vec![SourceValue::Text(text)]);
                    }
                    RegType::REG_MULTI_SZ if switch.action() == Action::Append => {
                        return Some(
                            decode_multi(&raw.bytes)
                                .into_iter()
                                .map(SourceValue::Text)
                                .collect(),
                        );
                    }
                    RegType::REG_DWORD => {
                        let value: u32 = key.get_value(name).ok()?;
                        return Some(vec![SourceValue::Int(i64::from(value))]);
                    }
                    _ => continue,
                }
            }
            None
        }
    }

    // REG_MULTI_SZ: UTF-16LE words, NUL-separated, double-NUL terminated.
    fn decode_multi(bytes: &[u8]) -> Vec<String> {
        let mut words: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        while words.last() == Some(&0) {
            words.pop();
        }
        if words.is_empty() {
            return Vec::new();
        }
        words
            .split(|word| *word == 0)
            .map(String::from_utf16_lossy)
            .collect()
    }

    pub fn providers(prefix: &str) -> Vec<Box<dyn Provider>> {
        vec![
            Box::new(RegistryProvider::open(HKEY_LOCAL_MACHINE, prefix)),
            Box::new(RegistryProvider::open(HKEY_CURRENT_USER, prefix)),
        ]
    }
}

#[cfg(windows)]
pub use imp::{providers, RegistryProvider};

#[cfg(not(windows))]
pub fn providers(_prefix: &str) -> Vec<Box<dyn Provider>> {
    Vec::new()
}

//! Supported locale table.

use std::collections::HashMap;

use crate::config::LocaleConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocaleFlags {
    pub enabled: bool,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocaleError {
    #[error("no enabled locale configured")]
    NoEnabledLocale,
}

/// `code → {enabled, is_default}`, plus the enabled codes with the default first.
#[derive(Debug, Clone)]
pub struct LocaleTable {
    entries: HashMap<String, LocaleFlags>,
    enabled: Vec<String>,
}

impl LocaleTable {
    pub fn from_config(locales: &[LocaleConfig]) -> Result<Self, LocaleError> {
        let mut entries = HashMap::with_capacity(locales.len());
        let mut enabled = Vec::new();

        for locale in locales {
            let code = locale.code.to_ascii_lowercase();
            let flags = LocaleFlags {
                enabled: locale.enabled,
                is_default: locale.default,
            };
            if flags.enabled {
                if flags.is_default {
                    enabled.insert(0, code.clone());
                } else {
                    enabled.push(code.clone());
                }
            }
            entries.insert(code, flags);
        }

        if enabled.is_empty() {
            return Err(LocaleError::NoEnabledLocale);
        }

        Ok(Self { entries, enabled })
    }

    /// Case-insensitive check against the enabled codes.
    pub fn is_enabled(&self, code: &str) -> bool {
        self.entries
            .get(&code.to_ascii_lowercase())
            .is_some_and(|flags| flags.enabled)
    }

    pub fn flags(&self, code: &str) -> Option<LocaleFlags> {
        self.entries.get(&code.to_ascii_lowercase()).copied()
    }

    /// The fallback locale.
    pub fn default_code(&self) -> &str {
        &self.enabled[0]
    }

    /// Enabled codes, default first, lower-case.
    pub fn enabled_codes(&self) -> &[String] {
        &self.enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn test_default_table() {
        let table = LocaleTable::from_config(&AppConfig::default().locales).unwrap();
        assert_eq!(table.default_code(), "en");
        assert_eq!(table.enabled_codes(), ["en", "jp", "de", "es"]);
        assert!(table.is_enabled("JP"));
        assert!(!table.is_enabled("zh"));
        assert!(!table.is_enabled("xx"));
        assert_eq!(
            table.flags("zh"),
            Some(LocaleFlags { enabled: false, is_default: false })
        );
    }

    #[test]
    fn test_default_moves_to_front() {
        let locales = vec![
            LocaleConfig { code: "de".into(), enabled: true, default: false },
            LocaleConfig { code: "FR".into(), enabled: true, default: true },
        ];
        let table = LocaleTable::from_config(&locales).unwrap();
        assert_eq!(table.default_code(), "fr");
    }

    #[test]
    fn test_no_enabled_locale() {
        let locales = vec![LocaleConfig { code: "de".into(), enabled: false, default: false }];
        assert_eq!(
            LocaleTable::from_config(&locales).unwrap_err(),
            LocaleError::NoEnabledLocale
        );
    }
}

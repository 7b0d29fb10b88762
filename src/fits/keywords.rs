//! Header keyword rules
//!
//! Which keywords get stripped from a cutout is configuration, not code: the
//! defaults ship in `fits_keywords.toml` and a user file with the same
//! layout can replace them.

use std::fs;

use lazy_static::lazy_static;

use crate::fits::errors::{FitsError, FitsResult};

lazy_static! {
    static ref DEFAULT_RULES: KeywordRules = {
        let content = include_str!("../../fits_keywords.toml");
        KeywordRules::from_str(content).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to parse keyword rules: {}", e);
            KeywordRules::empty()
        })
    };
}

/// Keyword lists applied when sanitising and writing cutout headers
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordRules {
    /// Removed from every cutout header before it is written
    pub sanitize_remove: Vec<String>,
    /// Dropped by the writer because they describe the source data unit
    pub write_drop: Vec<String>,
}

impl Default for KeywordRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

impl KeywordRules {
    /// Rules that remove nothing
    pub fn empty() -> Self {
        KeywordRules {
            sanitize_remove: Vec::new(),
            write_drop: Vec::new(),
        }
    }

    /// Parse rules from a TOML string
    ///
    /// Missing tables leave the corresponding list empty.
    pub fn from_str(content: &str) -> FitsResult<Self> {
        let toml_value: toml::Value = match content.parse() {
            Ok(value) => value,
            Err(e) => return Err(FitsError::GenericError(format!("Failed to parse TOML: {}", e))),
        };

        Ok(KeywordRules {
            sanitize_remove: Self::parse_key_list(&toml_value, "sanitize", "remove")?,
            write_drop: Self::parse_key_list(&toml_value, "write", "drop")?,
        })
    }

    /// Load rules from a TOML file
    pub fn from_file(path: &str) -> FitsResult<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => return Err(FitsError::IoError(e)),
        };

        Self::from_str(&contents)
    }

    /// Helper to read `[table] key = ["A", "B"]` as upper-case keywords
    fn parse_key_list(toml_value: &toml::Value, table: &str, key: &str) -> FitsResult<Vec<String>> {
        let Some(entry) = toml_value.get(table).and_then(|t| t.get(key)) else {
            return Ok(Vec::new());
        };

        let array = entry.as_array().ok_or_else(|| {
            FitsError::GenericError(format!("{}.{} must be an array of keywords", table, key))
        })?;

        array
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.trim().to_ascii_uppercase())
                    .ok_or_else(|| FitsError::GenericError(format!("{}.{} holds a non-string entry", table, key)))
            })
            .collect()
    }

    /// Whether the writer should drop this keyword
    pub fn drops_on_write(&self, key: &str) -> bool {
        self.write_drop.iter().any(|k| k == key)
    }
}

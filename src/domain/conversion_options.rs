use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Option keys forwarded to the conversion worker must start with one of
/// these prefixes or match [`ALLOWED_OPTION_KEYS`] exactly. Anything else
/// is stripped before submission.
pub const ALLOWED_OPTION_PREFIXES: &[&str] =
    &["parse_", "chunk_", "ocr_", "table_", "formula_", "lang_"];

/// Keys allowed verbatim. `lang` is exact on purpose: a bare prefix match
/// would admit unrelated keys like `language_model`.
pub const ALLOWED_OPTION_KEYS: &[&str] = &["lang"];

fn key_is_allowed(key: &str) -> bool {
    ALLOWED_OPTION_KEYS.contains(&key)
        || ALLOWED_OPTION_PREFIXES.iter().any(|p| key.starts_with(p))
}

/// Open bag of conversion options supplied at submission time.
///
/// Immutable once recorded on a task; merging and whitelist filtering happen
/// before the task is created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversionOptions(BTreeMap<String, Value>);

impl ConversionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Lays the caller-supplied options over the owner's stored defaults.
    /// Explicit keys win over defaults.
    pub fn merged_over(&self, defaults: &ConversionOptions) -> ConversionOptions {
        let mut merged = defaults.0.clone();
        for (key, value) in &self.0 {
            merged.insert(key.clone(), value.clone());
        }
        ConversionOptions(merged)
    }

    /// Splits the options into the whitelisted set and the stripped keys.
    /// Stripped keys must never reach the worker payload.
    pub fn sanitized(&self) -> (ConversionOptions, Vec<String>) {
        let mut allowed = BTreeMap::new();
        let mut stripped = Vec::new();
        for (key, value) in &self.0 {
            if key_is_allowed(key) {
                allowed.insert(key.clone(), value.clone());
            } else {
                stripped.push(key.clone());
            }
        }
        (ConversionOptions(allowed), stripped)
    }
}

impl FromIterator<(String, Value)> for ConversionOptions {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//! Configuration fragments: named, ordered layers of key/value pairs

use super::value::ConfigValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named layer of configuration
///
/// Fragments are immutable once built; use [`FragmentBuilder`] or one of the
/// loaders in [`super::loader`] to construct them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFragment {
    name: String,
    values: BTreeMap<String, ConfigValue>,
}

impl ConfigFragment {
    /// Create a fragment from an already-parsed mapping
    pub fn new(name: impl Into<String>, values: BTreeMap<String, ConfigValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Start building a fragment
    pub fn builder(name: impl Into<String>) -> FragmentBuilder {
        FragmentBuilder {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Fragment name (used for provenance and diagnostics)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Iterate over keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Iterate over key/value pairs in sorted key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the fragment defines no keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builder for [`ConfigFragment`]
#[derive(Debug, Clone)]
pub struct FragmentBuilder {
    name: String,
    values: BTreeMap<String, ConfigValue>,
}

impl FragmentBuilder {
    /// Set a key; a later call for the same key replaces the earlier one
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Finish the fragment
    #[must_use]
    pub fn build(self) -> ConfigFragment {
        ConfigFragment {
            name: self.name,
            values: self.values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_values() {
        let fragment = ConfigFragment::builder("base")
            .set("minSdk", 21)
            .set("flavor", "free")
            .set("isMinifyEnabled", true)
            .build();

        assert_eq!(fragment.name(), "base");
        assert_eq!(fragment.len(), 3);
        assert_eq!(fragment.get("minSdk"), Some(&ConfigValue::Integer(21)));
        assert_eq!(fragment.keys().collect::<Vec<_>>(), ["flavor", "isMinifyEnabled", "minSdk"]);
    }

    #[test]
    fn test_builder_last_set_wins() {
        let fragment = ConfigFragment::builder("base")
            .set("minSdk", 21)
            .set("minSdk", 23)
            .build();
        assert_eq!(fragment.get("minSdk"), Some(&ConfigValue::Integer(23)));
    }

    #[test]
    fn test_empty_fragment() {
        let fragment = ConfigFragment::builder("empty").build();
        assert!(fragment.is_empty());
        assert!(fragment.get("anything").is_none());
    }
}

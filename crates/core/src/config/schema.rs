//! Schema definitions for configuration keys
//!
//! A [`Schema`] maps keys to an expected [`ValueKind`] and an optional
//! [`Constraint`]. Schemas are built in code or loaded from TOML:
//!
//! ```toml
//! [keys."defaultConfig.minSdk"]
//! type = "integer"
//! constraint = { range = { min = 21, max = 35 } }
//!
//! [keys."kotlinOptions.jvmTarget"]
//! type = "string"
//! constraint = { one_of = ["11", "17"] }
//! ```

use super::value::{ConfigValue, ValueKind};
use crate::error::{Error, Result, ResultExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Allowed-value restriction layered on top of the expected type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Constraint {
    /// Inclusive integer range; either bound may be open
    Range {
        /// Smallest accepted value
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        /// Largest accepted value
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    /// Explicit set of allowed values
    OneOf(Vec<ConfigValue>),
    /// Regular expression a string value must match
    Pattern(#[serde(with = "regex_serde")] Regex),
}

impl Constraint {
    /// Check a value that already has the right type
    ///
    /// A constraint that cannot apply to the value's kind rejects it, so an
    /// unvalidated schema never lets a value through unchecked.
    fn check(&self, value: &ConfigValue) -> std::result::Result<(), String> {
        match (self, value) {
            (Constraint::Range { min, max }, ConfigValue::Integer(n)) => {
                let below = min.is_some_and(|min| *n < min);
                let above = max.is_some_and(|max| *n > max);
                if below || above {
                    Err(format!("{} is outside {}", n, self.describe()))
                } else {
                    Ok(())
                }
            }
            (Constraint::OneOf(allowed), value) => {
                if allowed.contains(value) {
                    Ok(())
                } else {
                    Err(format!("{} is not {}", value, self.describe()))
                }
            }
            (Constraint::Pattern(re), ConfigValue::String(s)) => {
                if re.is_match(s) {
                    Ok(())
                } else {
                    Err(format!("{:?} does not match {}", s, self.describe()))
                }
            }
            (constraint, value) => Err(format!(
                "{} cannot apply to {} value {}",
                constraint.describe(),
                value.kind(),
                value
            )),
        }
    }

    /// Human-readable description of what the constraint accepts
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Constraint::Range { min, max } => match (min, max) {
                (Some(min), Some(max)) => format!("range {min}..={max}"),
                (Some(min), None) => format!("range >= {min}"),
                (None, Some(max)) => format!("range <= {max}"),
                (None, None) => "any integer".to_string(),
            },
            Constraint::OneOf(allowed) => {
                let items: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                format!("one of [{}]", items.join(", "))
            }
            Constraint::Pattern(re) => format!("pattern /{}/", re.as_str()),
        }
    }
}

/// Why a value was rejected by its schema entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// Runtime type disagrees with the declared type
    TypeMismatch {
        /// Kind declared by the schema
        expected: ValueKind,
        /// Kind of the rejected value
        actual: ValueKind,
    },
    /// Right type, but outside the allowed values
    Constraint(String),
}

/// Schema entry for a single key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaEntry {
    /// Expected value type
    #[serde(rename = "type")]
    pub kind: ValueKind,

    /// Optional allowed-value restriction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,

    /// What the key controls
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl SchemaEntry {
    /// Entry accepting any value of `kind`
    #[must_use]
    pub fn of(kind: ValueKind) -> Self {
        Self {
            kind,
            constraint: None,
            description: String::new(),
        }
    }

    /// Entry accepting any integer
    #[must_use]
    pub fn integer() -> Self {
        Self::of(ValueKind::Integer)
    }

    /// Entry accepting any boolean
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(ValueKind::Boolean)
    }

    /// Entry accepting any string
    #[must_use]
    pub fn string() -> Self {
        Self::of(ValueKind::String)
    }

    /// Restrict to an inclusive integer range
    #[must_use]
    pub fn range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.constraint = Some(Constraint::Range { min, max });
        self
    }

    /// Restrict to a set of allowed values
    #[must_use]
    pub fn one_of<V: Into<ConfigValue>>(mut self, allowed: impl IntoIterator<Item = V>) -> Self {
        self.constraint = Some(Constraint::OneOf(
            allowed.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Restrict strings to a regular expression
    pub fn pattern(mut self, pattern: &str) -> Result<Self> {
        self.constraint = Some(Constraint::Pattern(Regex::new(pattern)?));
        Ok(self)
    }

    /// Attach a description
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check a value against this entry
    pub fn check(&self, value: &ConfigValue) -> std::result::Result<(), Violation> {
        if value.kind() != self.kind {
            return Err(Violation::TypeMismatch {
                expected: self.kind,
                actual: value.kind(),
            });
        }
        match &self.constraint {
            Some(constraint) => constraint.check(value).map_err(Violation::Constraint),
            None => Ok(()),
        }
    }
}

/// Mapping from configuration key to its expected type and allowed values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    #[serde(default)]
    keys: BTreeMap<String, SchemaEntry>,
}

impl Schema {
    /// Empty schema: every key is unknown
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a key's entry
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>, entry: SchemaEntry) -> Self {
        self.keys.insert(key.into(), entry);
        self
    }

    /// Look up a key's entry
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SchemaEntry> {
        self.keys.get(key)
    }

    /// Declared keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    /// Iterate over entries in sorted key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaEntry)> {
        self.keys.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of declared keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether no key is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Find a declared key ignoring ASCII case
    #[must_use]
    pub fn find_key_ignore_case(&self, key: &str) -> Option<&str> {
        self.keys()
            .find(|declared| declared.eq_ignore_ascii_case(key))
    }

    /// Check that every constraint fits its declared type
    pub fn validate(&self) -> Result<()> {
        for (key, entry) in &self.keys {
            let Some(constraint) = &entry.constraint else {
                continue;
            };
            match constraint {
                Constraint::Range { min, max } => {
                    if entry.kind != ValueKind::Integer {
                        return Err(Error::schema(format!(
                            "Key '{}': range constraint requires type integer, found {}",
                            key, entry.kind
                        )));
                    }
                    if let (Some(min), Some(max)) = (min, max) {
                        if min > max {
                            return Err(Error::schema(format!(
                                "Key '{}': empty range {}..={}",
                                key, min, max
                            )));
                        }
                    }
                }
                Constraint::OneOf(allowed) => {
                    if let Some(bad) = allowed.iter().find(|v| v.kind() != entry.kind) {
                        return Err(Error::schema(format!(
                            "Key '{}': allowed value {} is not of type {}",
                            key, bad, entry.kind
                        )));
                    }
                }
                Constraint::Pattern(_) => {
                    if entry.kind != ValueKind::String {
                        return Err(Error::schema(format!(
                            "Key '{}': pattern constraint requires type string, found {}",
                            key, entry.kind
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Parse a schema from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let schema: Schema = toml::from_str(content)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Load a schema from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::from(e).with_context(format!("Reading schema {}", path.display())))?;

        let schema: Schema =
            toml::from_str(&content).map_err(|e| Error::config_parse(path, e))?;
        schema
            .validate()
            .context(format!("Validating schema {}", path.display()))?;

        tracing::debug!(path = %path.display(), keys = schema.len(), "Loaded schema");
        Ok(schema)
    }
}

mod regex_serde {
    use regex::Regex;
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

    pub fn serialize<S: Serializer>(re: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(re.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Regex, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Regex::new(&pattern).map_err(D::Error::custom)
    }
}

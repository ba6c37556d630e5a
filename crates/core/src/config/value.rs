//! Scalar configuration values

use serde::{Deserialize, Serialize};
use std::fmt;

/// A scalar configuration value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// Boolean flag (`isMinifyEnabled = true`)
    Boolean(bool),
    /// Integer setting (`minSdk = 23`)
    Integer(i64),
    /// Free-form string (`namespace = "com.example"`)
    String(String),
}

impl ConfigValue {
    /// Runtime type of this value
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            ConfigValue::Boolean(_) => ValueKind::Boolean,
            ConfigValue::Integer(_) => ValueKind::Integer,
            ConfigValue::String(_) => ValueKind::String,
        }
    }

    /// Infer a typed value from untyped text (environment variables, CLI flags)
    ///
    /// `true`/`false` (any case) become booleans, integer literals become
    /// integers, anything else stays a string.
    #[must_use]
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return ConfigValue::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return ConfigValue::Boolean(false);
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return ConfigValue::Integer(n);
        }
        ConfigValue::String(raw.to_string())
    }

    /// Convert untyped text to a declared kind
    ///
    /// Strings are taken verbatim. Returns `None` when the text is not a
    /// valid literal of `kind`.
    #[must_use]
    pub fn parse_as(raw: &str, kind: ValueKind) -> Option<Self> {
        match kind {
            ValueKind::String => Some(ConfigValue::String(raw.to_string())),
            ValueKind::Integer => raw.trim().parse::<i64>().ok().map(ConfigValue::Integer),
            ValueKind::Boolean => {
                let trimmed = raw.trim();
                if trimmed.eq_ignore_ascii_case("true") {
                    Some(ConfigValue::Boolean(true))
                } else if trimmed.eq_ignore_ascii_case("false") {
                    Some(ConfigValue::Boolean(false))
                } else {
                    None
                }
            }
        }
    }

    /// Get as integer
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as string slice
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Boolean(b) => write!(f, "{b}"),
            ConfigValue::Integer(n) => write!(f, "{n}"),
            ConfigValue::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Boolean(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(i64::from(value))
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

/// Expected type of a configuration key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// `true` or `false`
    Boolean,
    /// 64-bit signed integer
    Integer,
    /// UTF-8 text
    String,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Boolean => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::String => "string",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_booleans_and_integers() {
        assert_eq!(ConfigValue::infer("TRUE"), ConfigValue::Boolean(true));
        assert_eq!(ConfigValue::infer("false"), ConfigValue::Boolean(false));
        assert_eq!(ConfigValue::infer("35"), ConfigValue::Integer(35));
        assert_eq!(ConfigValue::infer("-1"), ConfigValue::Integer(-1));
    }

    #[test]
    fn test_infer_keeps_strings_verbatim() {
        assert_eq!(ConfigValue::infer("1.0"), ConfigValue::String("1.0".into()));
        assert_eq!(
            ConfigValue::infer(" VERSION_17"),
            ConfigValue::String(" VERSION_17".into())
        );
    }

    #[test]
    fn test_parse_as_declared_kind() {
        assert_eq!(
            ConfigValue::parse_as("17", ValueKind::String),
            Some(ConfigValue::String("17".into()))
        );
        assert_eq!(
            ConfigValue::parse_as(" 23 ", ValueKind::Integer),
            Some(ConfigValue::Integer(23))
        );
        assert_eq!(
            ConfigValue::parse_as("False", ValueKind::Boolean),
            Some(ConfigValue::Boolean(false))
        );
        assert_eq!(ConfigValue::parse_as("1.0", ValueKind::Integer), None);
        assert_eq!(ConfigValue::parse_as("yes", ValueKind::Boolean), None);
    }

    #[test]
    fn test_display_quotes_strings_only() {
        assert_eq!(ConfigValue::from(23).to_string(), "23");
        assert_eq!(ConfigValue::from(true).to_string(), "true");
        assert_eq!(ConfigValue::from("23").to_string(), "\"23\"");
    }

    #[test]
    fn test_untagged_json_shape() {
        let values: Vec<ConfigValue> = serde_json::from_str(r#"[true, 21, "free"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ConfigValue::Boolean(true),
                ConfigValue::Integer(21),
                ConfigValue::String("free".into())
            ]
        );
    }
}

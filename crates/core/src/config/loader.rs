//! Fragment loading from files, environment variables and CLI overrides
//!
//! Nested tables flatten into dotted keys, so the Gradle-style block
//!
//! ```toml
//! [defaultConfig]
//! minSdk = 23
//! ```
//!
//! becomes the key `defaultConfig.minSdk`.

use super::fragment::ConfigFragment;
use super::schema::Schema;
use super::value::ConfigValue;
use std::ffi::OsString;
use crate::error::{Error, ErrorCode, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default prefix for environment variable overrides
pub const ENV_PREFIX: &str = "LUNA_CONFIG_";

/// Separator between nesting levels in environment variable names
const ENV_NESTING: &str = "__";

/// Application directory name under the user config dir
const APP_NAME: &str = "luna";

/// Standard layer files, lowest precedence first
const USER_LAYER: &str = "build.toml";
const PROJECT_LAYER: &str = "luna-build.toml";
const LOCAL_LAYER: &str = "luna-build.local.toml";

/// Supported fragment file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentFormat {
    /// `.toml` and any unrecognised extension
    Toml,
    /// `.json`
    Json,
}

impl FragmentFormat {
    /// Pick a format from the file extension; anything but `.json` is TOML
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => FragmentFormat::Json,
            _ => FragmentFormat::Toml,
        }
    }
}

/// Load a fragment from a TOML or JSON file, named after the file stem
pub fn load_file(path: impl AsRef<Path>) -> Result<ConfigFragment> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("fragment")
        .to_string();
    load_file_as(path, name)
}

/// Load a fragment from a file with an explicit name
pub fn load_file_as(path: impl AsRef<Path>, name: impl Into<String>) -> Result<ConfigFragment> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::file_not_found(path));
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::from(e).with_context(format!("Reading fragment {}", path.display())))?;

    let fragment = match FragmentFormat::from_path(path) {
        FragmentFormat::Toml => parse_toml(name, &content),
        FragmentFormat::Json => parse_json(name, &content),
    }
    .map_err(|e| {
        if e.code == ErrorCode::ConfigParseError {
            Error::config_parse(path, e.message)
        } else {
            e.with_context(format!("In {}", path.display()))
        }
    })?;

    tracing::debug!(
        path = %path.display(),
        fragment = fragment.name(),
        keys = fragment.len(),
        "Loaded fragment file"
    );
    Ok(fragment)
}

/// Parse a TOML document into a flattened fragment
pub fn parse_toml(name: impl Into<String>, content: &str) -> Result<ConfigFragment> {
    let table: toml::Table = toml::from_str(content)?;
    let mut values = BTreeMap::new();
    flatten_toml(None, &table, &mut values)?;
    Ok(ConfigFragment::new(name, values))
}

fn flatten_toml(
    prefix: Option<&str>,
    table: &toml::Table,
    out: &mut BTreeMap<String, ConfigValue>,
) -> Result<()> {
    for (key, value) in table {
        let full_key = join_key(prefix, key);
        let scalar = match value {
            toml::Value::Table(nested) => {
                flatten_toml(Some(&full_key), nested, out)?;
                continue;
            }
            toml::Value::String(s) => ConfigValue::String(s.clone()),
            toml::Value::Integer(n) => ConfigValue::Integer(*n),
            toml::Value::Boolean(b) => ConfigValue::Boolean(*b),
            toml::Value::Float(_) => {
                return Err(Error::invalid_value(&full_key, "floats are not supported"));
            }
            toml::Value::Datetime(_) => {
                return Err(Error::invalid_value(&full_key, "datetimes are not supported"));
            }
            toml::Value::Array(_) => {
                return Err(Error::invalid_value(&full_key, "arrays are not supported"));
            }
        };
        insert_once(out, full_key, scalar)?;
    }
    Ok(())
}

/// Parse a JSON object into a flattened fragment
pub fn parse_json(name: impl Into<String>, content: &str) -> Result<ConfigFragment> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let serde_json::Value::Object(object) = value else {
        return Err(Error::new(
            ErrorCode::ConfigParseError,
            "JSON fragment must be an object at the top level",
        ));
    };
    let mut values = BTreeMap::new();
    flatten_json(None, &object, &mut values)?;
    Ok(ConfigFragment::new(name, values))
}

fn flatten_json(
    prefix: Option<&str>,
    object: &serde_json::Map<String, serde_json::Value>,
    out: &mut BTreeMap<String, ConfigValue>,
) -> Result<()> {
    use serde_json::Value;

    for (key, value) in object {
        let full_key = join_key(prefix, key);
        let scalar = match value {
            Value::Object(nested) => {
                flatten_json(Some(&full_key), nested, out)?;
                continue;
            }
            Value::String(s) => ConfigValue::String(s.clone()),
            Value::Bool(b) => ConfigValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ConfigValue::Integer(i),
                None => {
                    return Err(Error::invalid_value(
                        &full_key,
                        format!("{n} is not an i64 integer"),
                    ));
                }
            },
            Value::Null => return Err(Error::invalid_value(&full_key, "null is not supported")),
            Value::Array(_) => {
                return Err(Error::invalid_value(&full_key, "arrays are not supported"));
            }
        };
        insert_once(out, full_key, scalar)?;
    }
    Ok(())
}

fn insert_once(
    out: &mut BTreeMap<String, ConfigValue>,
    key: String,
    value: ConfigValue,
) -> Result<()> {
    if out.contains_key(&key) {
        return Err(Error::duplicate_key(&key));
    }
    out.insert(key, value);
    Ok(())
}

fn join_key(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{prefix}.{key}"),
        None => key.to_string(),
    }
}

/// Build a fragment from environment-style variables
///
/// Only variables starting with `prefix` are considered. `__` separates
/// nesting levels. Keys are matched against `schema` ignoring case so that
/// `LUNA_CONFIG_DEFAULTCONFIG__MINSDK` lands on `defaultConfig.minSdk`;
/// unmatched keys are lowercased. Values are typed with [`typed_value`].
pub fn from_env_vars<I, K, V>(
    name: impl Into<String>,
    prefix: &str,
    vars: I,
    schema: Option<&Schema>,
) -> ConfigFragment
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut values = BTreeMap::new();
    for (var, raw) in vars {
        let Some(rest) = var.as_ref().strip_prefix(prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let dotted = rest.split(ENV_NESTING).collect::<Vec<_>>().join(".");
        let key = schema
            .and_then(|s| s.find_key_ignore_case(&dotted))
            .map_or_else(|| dotted.to_lowercase(), str::to_string);
        let value = typed_value(schema, &key, raw.as_ref());
        values.insert(key, value);
    }
    ConfigFragment::new(name, values)
}

/// Build a fragment from the process environment
///
/// Variables outside `prefix` are never decoded. A matching variable whose
/// value is not valid Unicode is skipped with a warning.
pub fn from_process_env(prefix: &str, schema: Option<&Schema>) -> ConfigFragment {
    let vars = prefixed_vars(prefix, std::env::vars_os());
    let fragment = from_env_vars("env", prefix, vars, schema);
    tracing::debug!(prefix, keys = fragment.len(), "Loaded environment fragment");
    fragment
}

fn prefixed_vars(
    prefix: &str,
    vars: impl IntoIterator<Item = (OsString, OsString)>,
) -> Vec<(String, String)> {
    vars.into_iter()
        .filter_map(|(var, raw)| {
            let var = var.into_string().ok()?;
            if !var.starts_with(prefix) {
                return None;
            }
            match raw.into_string() {
                Ok(raw) => Some((var, raw)),
                Err(_) => {
                    tracing::warn!(var = %var, "Skipping environment variable with non-UTF-8 value");
                    None
                }
            }
        })
        .collect()
}

/// Type untyped text for `key`
///
/// Keys declared in `schema` are converted to the declared kind. Unknown keys,
/// and text that is not a literal of the declared kind, fall back to
/// [`ConfigValue::infer`] so the resolver can report the mismatch.
#[must_use]
pub fn typed_value(schema: Option<&Schema>, key: &str, raw: &str) -> ConfigValue {
    schema
        .and_then(|s| s.get(key))
        .and_then(|entry| ConfigValue::parse_as(raw, entry.kind))
        .unwrap_or_else(|| ConfigValue::infer(raw))
}

/// Build a fragment from `key=value` override strings
pub fn from_overrides<S: AsRef<str>>(
    name: impl Into<String>,
    pairs: impl IntoIterator<Item = S>,
    schema: Option<&Schema>,
) -> Result<ConfigFragment> {
    let mut values = BTreeMap::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let Some((key, raw)) = pair.split_once('=') else {
            return Err(Error::invalid_input(format!("Override '{pair}' is not key=value"))
                .with_suggestion("Use --set defaultConfig.minSdk=23"));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::invalid_input(format!("Override '{pair}' has an empty key")));
        }
        values.insert(key.to_string(), typed_value(schema, key, raw));
    }
    Ok(ConfigFragment::new(name, values))
}

/// Standard layer files that exist, lowest precedence first
///
/// Search order:
/// 1. User config (`<config_dir>/luna/build.toml`)
/// 2. Project config (`<project>/luna-build.toml`)
/// 3. Local overrides (`<project>/luna-build.local.toml`)
pub fn discover_layers(project_dir: &Path) -> Vec<PathBuf> {
    discover_layers_in(project_dir, dirs::config_dir().map(|d| d.join(APP_NAME)).as_deref())
}

/// Like [`discover_layers`] with an explicit user config directory
pub fn discover_layers_in(project_dir: &Path, user_config_dir: Option<&Path>) -> Vec<PathBuf> {
    let candidates = [
        user_config_dir.map(|d| d.join(USER_LAYER)),
        Some(project_dir.join(PROJECT_LAYER)),
        Some(project_dir.join(LOCAL_LAYER)),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter(|path| {
            let found = path.is_file();
            if !found {
                tracing::debug!(path = %path.display(), "No layer file, skipping");
            }
            found
        })
        .collect()
}

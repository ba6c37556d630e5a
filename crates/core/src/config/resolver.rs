//! Layered configuration resolution
//!
//! The [`ConfigResolver`] accumulates fragments in load order and merges them
//! with last-writer-wins precedence, validating every candidate value against
//! a [`Schema`]. A value that fails its schema entry is reported and the next
//! lower fragment's value is tried instead.
//!
//! # Example
//!
//! ```rust
//! use luna_core::config::{ConfigFragment, ConfigResolver, Schema, SchemaEntry};
//!
//! let schema = Schema::new().with_key("minSdk", SchemaEntry::integer());
//! let mut resolver = ConfigResolver::new(schema);
//! resolver.load(ConfigFragment::builder("base").set("minSdk", 21).build());
//! resolver.load(ConfigFragment::builder("release").set("minSdk", "23").build());
//!
//! let resolution = resolver.resolve();
//! assert_eq!(resolution.config.get_integer("minSdk"), Some(21));
//! assert_eq!(resolution.errors().count(), 1);
//! ```

use super::diagnostic::{Diagnostic, DiagnosticKind, Note, Severity, SeverityPolicy};
use super::fragment::ConfigFragment;
use super::schema::{Schema, Violation};
use super::value::ConfigValue;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The merged, validated configuration handed to the build pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedConfiguration {
    values: BTreeMap<String, ConfigValue>,
    /// Name of the fragment each value came from
    sources: BTreeMap<String, String>,
}

impl ResolvedConfiguration {
    /// Value for `key`, if resolved
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Integer value for `key`; `None` if absent or not an integer
    #[must_use]
    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ConfigValue::as_integer)
    }

    /// Boolean value for `key`; `None` if absent or not a boolean
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ConfigValue::as_bool)
    }

    /// String value for `key`; `None` if absent or not a string
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    /// Fragment that supplied the value for `key`
    #[must_use]
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.sources.get(key).map(String::as_str)
    }

    /// Resolved key/value pairs in sorted key order
    #[must_use]
    pub fn values(&self) -> &BTreeMap<String, ConfigValue> {
        &self.values
    }

    /// Number of resolved keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no key was resolved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render as `gradle.properties`-style `key=value` lines
    ///
    /// Keys and values are escaped the way `java.util.Properties::store`
    /// writes them, so every line reads back as the same pair.
    #[must_use]
    pub fn to_properties(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.values {
            escape_property(&mut out, key, true);
            out.push('=');
            match value {
                ConfigValue::String(s) => escape_property(&mut out, s, false),
                other => out.push_str(&other.to_string()),
            }
            out.push('\n');
        }
        out
    }

    fn insert(&mut self, key: &str, value: ConfigValue, source: &str) {
        self.values.insert(key.to_string(), value);
        self.sources.insert(key.to_string(), source.to_string());
    }
}

/// Spaces are escaped everywhere in keys, only in leading position in values
fn escape_property(out: &mut String, text: &str, is_key: bool) {
    for (i, c) in text.chars().enumerate() {
        match c {
            ' ' if is_key || i == 0 => out.push_str("\\ "),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

/// Result of a resolution: configuration, diagnostics and notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Merged configuration with provenance
    pub config: ResolvedConfiguration,
    /// Findings sorted by key, highest precedence first within a key
    pub diagnostics: Vec<Diagnostic>,
    /// Informational findings (not diagnostics)
    pub notes: Vec<Note>,
}

impl Resolution {
    /// Diagnostics with `Error` severity
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Diagnostics with `Warning` severity
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| !d.is_error())
    }

    /// Whether any diagnostic has `Error` severity
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Fail if any diagnostic has `Error` severity
    ///
    /// This is the caller-side escalation point; the resolver itself never
    /// fails.
    pub fn ensure_valid(&self) -> Result<()> {
        let messages: Vec<String> = self.errors().map(ToString::to_string).collect();
        if messages.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "Configuration has {} error(s): {}",
                messages.len(),
                messages.join("; ")
            ))
            .with_suggestion("Fix the offending fragment values or relax the schema"))
        }
    }
}

/// Merges and validates layered configuration fragments
///
/// One resolver per caller: `load` and `reset` take `&mut self`, and there is
/// no internal locking.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    schema: Schema,
    policy: SeverityPolicy,
    fragments: Vec<ConfigFragment>,
}

impl ConfigResolver {
    /// Create a resolver validating against `schema`
    ///
    /// `schema` is expected to pass [`Schema::validate`], as schemas from
    /// [`Schema::from_toml_str`] and [`android_schema`](super::android_schema)
    /// do. A constraint that does not fit its key's kind rejects every value.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            policy: SeverityPolicy::default(),
            fragments: Vec::new(),
        }
    }

    /// Use a custom severity policy
    #[must_use]
    pub fn with_policy(mut self, policy: SeverityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Append a fragment; later fragments take precedence
    pub fn load(&mut self, fragment: ConfigFragment) {
        tracing::debug!(
            fragment = fragment.name(),
            keys = fragment.len(),
            position = self.fragments.len(),
            "Loaded configuration fragment"
        );
        self.fragments.push(fragment);
    }

    /// Append several fragments in order
    pub fn load_all(&mut self, fragments: impl IntoIterator<Item = ConfigFragment>) {
        for fragment in fragments {
            self.load(fragment);
        }
    }

    /// Drop all loaded fragments
    pub fn reset(&mut self) {
        self.fragments.clear();
    }

    /// Loaded fragments, lowest precedence first
    #[must_use]
    pub fn fragments(&self) -> &[ConfigFragment] {
        &self.fragments
    }

    /// Schema every candidate value is checked against
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Merge all loaded fragments and validate the result
    ///
    /// For each key the highest-precedence schema-valid value wins. Rejected
    /// candidates each produce a diagnostic; keys with no valid candidate are
    /// omitted. Keys without a schema entry are kept with a single
    /// unknown-key diagnostic.
    #[must_use]
    pub fn resolve(&self) -> Resolution {
        let keys: BTreeSet<&str> = self.fragments.iter().flat_map(ConfigFragment::keys).collect();

        let mut config = ResolvedConfiguration::default();
        let mut diagnostics = Vec::new();

        for key in keys {
            // Highest precedence first
            let mut candidates = self
                .fragments
                .iter()
                .rev()
                .filter_map(|fragment| fragment.get(key).map(|value| (fragment.name(), value)));

            let Some(entry) = self.schema.get(key) else {
                if let Some((source, value)) = candidates.next() {
                    diagnostics.push(self.diagnostic(
                        DiagnosticKind::UnknownKey,
                        key,
                        source,
                        "no schema entry; value passed through verbatim".to_string(),
                    ));
                    config.insert(key, value.clone(), source);
                }
                continue;
            };

            for (source, value) in candidates {
                match entry.check(value) {
                    Ok(()) => {
                        config.insert(key, value.clone(), source);
                        break;
                    }
                    Err(Violation::TypeMismatch { expected, actual }) => {
                        diagnostics.push(self.diagnostic(
                            DiagnosticKind::TypeMismatch,
                            key,
                            source,
                            format!("expected {expected}, found {actual} {value}"),
                        ));
                    }
                    Err(Violation::Constraint(message)) => {
                        diagnostics.push(self.diagnostic(
                            DiagnosticKind::ConstraintViolation,
                            key,
                            source,
                            message,
                        ));
                    }
                }
            }
        }

        let mut notes = Vec::new();
        if config.is_empty() {
            notes.push(Note::EmptyResolution);
        }

        tracing::debug!(
            fragments = self.fragments.len(),
            keys = config.len(),
            diagnostics = diagnostics.len(),
            "Resolved configuration"
        );

        Resolution {
            config,
            diagnostics,
            notes,
        }
    }

    fn diagnostic(
        &self,
        kind: DiagnosticKind,
        key: &str,
        fragment: &str,
        message: String,
    ) -> Diagnostic {
        let severity = self.policy.severity_of(kind);
        match severity {
            Severity::Error => tracing::warn!(key, fragment, %kind, "{message}"),
            Severity::Warning => tracing::debug!(key, fragment, %kind, "{message}"),
        }
        Diagnostic {
            severity,
            kind,
            key: key.to_string(),
            fragment: Some(fragment.to_string()),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::SchemaEntry;
    use proptest::prelude::*;

    fn min_sdk_schema() -> Schema {
        Schema::new().with_key("minSdk", SchemaEntry::integer())
    }

    #[test]
    fn test_string_override_falls_back_to_lower_integer() {
        let mut resolver = ConfigResolver::new(min_sdk_schema());
        resolver.load(ConfigFragment::builder("base").set("minSdk", 21).build());
        resolver.load(ConfigFragment::builder("override").set("minSdk", "23").build());

        let resolution = resolver.resolve();

        assert_eq!(resolution.config.get("minSdk"), Some(&ConfigValue::Integer(21)));
        assert_eq!(resolution.config.len(), 1);
        assert_eq!(resolution.config.source_of("minSdk"), Some("base"));
        assert_eq!(resolution.diagnostics.len(), 1);
        let diagnostic = &resolution.diagnostics[0];
        assert_eq!(diagnostic.severity, Severity::Error);
        assert_eq!(diagnostic.kind, DiagnosticKind::TypeMismatch);
        assert_eq!(diagnostic.key, "minSdk");
        assert_eq!(diagnostic.fragment.as_deref(), Some("override"));
        assert!(resolution.notes.is_empty());
    }

    #[test]
    fn test_unknown_key_passes_through_with_warning() {
        let mut resolver = ConfigResolver::new(Schema::new());
        resolver.load(ConfigFragment::builder("base").set("flavor", "free").build());

        let resolution = resolver.resolve();

        assert_eq!(resolution.config.get_str("flavor"), Some("free"));
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(resolution.diagnostics[0].severity, Severity::Warning);
        assert_eq!(resolution.diagnostics[0].kind, DiagnosticKind::UnknownKey);
        assert!(!resolution.has_errors());
    }

    #[test]
    fn test_nothing_loaded_is_empty_with_note() {
        let resolver = ConfigResolver::new(min_sdk_schema());
        let resolution = resolver.resolve();

        assert!(resolution.config.is_empty());
        assert!(resolution.diagnostics.is_empty());
        assert_eq!(resolution.notes, vec![Note::EmptyResolution]);
    }

    #[test]
    fn test_all_candidates_invalid_omits_key() {
        let mut resolver = ConfigResolver::new(min_sdk_schema());
        resolver.load(ConfigFragment::builder("a").set("minSdk", true).build());
        resolver.load(ConfigFragment::builder("b").set("minSdk", "23").build());

        let resolution = resolver.resolve();

        assert!(resolution.config.is_empty());
        assert_eq!(resolution.errors().count(), 2);
        // Reported from highest precedence down
        assert_eq!(resolution.diagnostics[0].fragment.as_deref(), Some("b"));
        assert_eq!(resolution.diagnostics[1].fragment.as_deref(), Some("a"));
        assert_eq!(resolution.notes, vec![Note::EmptyResolution]);
    }

    #[test]
    fn test_constraint_violation_falls_back() {
        let schema = Schema::new().with_key(
            "defaultConfig.minSdk",
            SchemaEntry::integer().range(Some(21), Some(35)),
        );
        let mut resolver = ConfigResolver::new(schema);
        resolver.load(ConfigFragment::builder("base").set("defaultConfig.minSdk", 23).build());
        resolver.load(ConfigFragment::builder("ci").set("defaultConfig.minSdk", 19).build());

        let resolution = resolver.resolve();

        assert_eq!(resolution.config.get_integer("defaultConfig.minSdk"), Some(23));
        assert_eq!(resolution.diagnostics.len(), 1);
        assert_eq!(
            resolution.diagnostics[0].kind,
            DiagnosticKind::ConstraintViolation
        );
    }

    #[test]
    fn test_shadowed_values_are_not_checked() {
        let mut resolver = ConfigResolver::new(min_sdk_schema());
        resolver.load(ConfigFragment::builder("base").set("minSdk", "oops").build());
        resolver.load(ConfigFragment::builder("top").set("minSdk", 24).build());

        let resolution = resolver.resolve();

        assert_eq!(resolution.config.get_integer("minSdk"), Some(24));
        assert!(resolution.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_key_warned_once_across_fragments() {
        let mut resolver = ConfigResolver::new(Schema::new());
        resolver.load(ConfigFragment::builder("a").set("flavor", "free").build());
        resolver.load(ConfigFragment::builder("b").set("flavor", "pro").build());

        let resolution = resolver.resolve();

        assert_eq!(resolution.config.get_str("flavor"), Some("pro"));
        assert_eq!(resolution.config.source_of("flavor"), Some("b"));
        assert_eq!(resolution.warnings().count(), 1);
    }

    #[test]
    fn test_strict_policy_reports_unknown_keys_as_errors_but_keeps_them() {
        let mut resolver =
            ConfigResolver::new(Schema::new()).with_policy(SeverityPolicy::strict());
        resolver.load(ConfigFragment::builder("base").set("flavor", "free").build());

        let resolution = resolver.resolve();

        assert_eq!(resolution.config.get_str("flavor"), Some("free"));
        assert!(resolution.has_errors());
        assert!(resolution.ensure_valid().is_err());
    }

    #[test]
    fn test_ensure_valid_reports_error_count() {
        let mut resolver = ConfigResolver::new(min_sdk_schema());
        resolver.load(ConfigFragment::builder("base").set("minSdk", "x").build());

        let err = resolver.resolve().ensure_valid().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigValidationError);
        assert!(err.message.contains("1 error(s)"));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut resolver = ConfigResolver::new(min_sdk_schema());
        resolver.load(ConfigFragment::builder("base").set("minSdk", 21).build());
        resolver.reset();
        resolver.reset();

        assert!(resolver.fragments().is_empty());
        assert_eq!(resolver.resolve().notes, vec![Note::EmptyResolution]);
    }

    #[test]
    fn test_to_properties() {
        let mut resolver = ConfigResolver::new(Schema::new());
        resolver.load(
            ConfigFragment::builder("base")
                .set("defaultConfig.versionName", "1.0")
                .set("defaultConfig.versionCode", 1)
                .set("buildTypes.release.isMinifyEnabled", true)
                .build(),
        );

        let config = resolver.resolve().config;
        assert_eq!(config.get_bool("buildTypes.release.isMinifyEnabled"), Some(true));
        assert_eq!(
            config.to_properties(),
            "buildTypes.release.isMinifyEnabled=true\n\
             defaultConfig.versionCode=1\n\
             defaultConfig.versionName=1.0\n"
        );
    }

    #[test]
    fn test_to_properties_escapes_keys_and_values() {
        let mut resolver = ConfigResolver::new(Schema::new());
        resolver.load(
            ConfigFragment::builder("local")
                .set("my key=x", " lead")
                .set("sdk.dir", "C:\\Android\\sdk")
                .set("signing:alias", "#1!")
                .set("tabbed", "a\tb c")
                .build(),
        );

        assert_eq!(
            resolver.resolve().config.to_properties(),
            "my\\ key\\=x=\\ lead\n\
             sdk.dir=C\\:\\\\Android\\\\sdk\n\
             signing\\:alias=\\#1\\!\n\
             tabbed=a\\tb c\n"
        );
    }

    fn arb_value() -> impl Strategy<Value = ConfigValue> {
        prop_oneof![
            any::<bool>().prop_map(ConfigValue::Boolean),
            any::<i64>().prop_map(ConfigValue::Integer),
            "[a-z0-9]{0,6}".prop_map(ConfigValue::String),
        ]
    }

    fn arb_fragments() -> impl Strategy<Value = Vec<ConfigFragment>> {
        prop::collection::vec(
            prop::collection::btree_map("[a-d]", arb_value(), 0..4),
            0..5,
        )
        .prop_map(|maps| {
            maps.into_iter()
                .enumerate()
                .map(|(i, values)| ConfigFragment::new(format!("f{i}"), values))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_empty_schema_is_last_writer_wins(fragments in arb_fragments()) {
            let mut expected = BTreeMap::new();
            for fragment in &fragments {
                for (key, value) in fragment.iter() {
                    expected.insert(key.to_string(), value.clone());
                }
            }

            let mut resolver = ConfigResolver::new(Schema::new());
            resolver.load_all(fragments);
            let resolution = resolver.resolve();

            prop_assert_eq!(resolution.config.values(), &expected);
            prop_assert!(!resolution.has_errors());
        }

        #[test]
        fn prop_resolve_is_idempotent(fragments in arb_fragments()) {
            let schema = Schema::new()
                .with_key("a", SchemaEntry::integer())
                .with_key("b", SchemaEntry::boolean());
            let mut resolver = ConfigResolver::new(schema);
            resolver.load_all(fragments);

            prop_assert_eq!(resolver.resolve(), resolver.resolve());
        }

        #[test]
        fn prop_invalid_top_falls_back_to_valid_lower(lower in any::<i64>(), top in "[a-z]{1,5}") {
            let mut resolver = ConfigResolver::new(Schema::new().with_key("k", SchemaEntry::integer()));
            resolver.load(ConfigFragment::builder("lower").set("k", lower).build());
            resolver.load(ConfigFragment::builder("top").set("k", top).build());

            let resolution = resolver.resolve();

            prop_assert_eq!(resolution.config.get_integer("k"), Some(lower));
            prop_assert_eq!(resolution.errors().count(), 1);
            prop_assert_eq!(resolution.diagnostics[0].key.as_str(), "k");
        }

        #[test]
        fn prop_resolved_values_satisfy_schema(fragments in arb_fragments()) {
            let schema = Schema::new()
                .with_key("a", SchemaEntry::integer().range(Some(0), Some(100)))
                .with_key("c", SchemaEntry::string());
            let mut resolver = ConfigResolver::new(schema.clone());
            resolver.load_all(fragments);

            for (key, value) in resolver.resolve().config.values() {
                if let Some(entry) = schema.get(key) {
                    prop_assert!(entry.check(value).is_ok());
                }
            }
        }
    }
}

//! Layered build-configuration resolution
//!
//! Fragments (base, override, environment) are loaded in precedence order,
//! validated against a [`Schema`], and merged into one
//! [`ResolvedConfiguration`] plus a list of [`Diagnostic`]s.

mod android;
mod diagnostic;
mod fragment;
pub mod loader;
mod resolver;
mod schema;
mod value;

pub use android::{android_defaults, android_schema, MAX_KNOWN_SDK, MIN_SUPPORTED_SDK};
pub use diagnostic::{Diagnostic, DiagnosticKind, Note, Severity, SeverityPolicy};
pub use fragment::{ConfigFragment, FragmentBuilder};
pub use resolver::{ConfigResolver, Resolution, ResolvedConfiguration};
pub use schema::{Constraint, Schema, SchemaEntry, Violation};
pub use value::{ConfigValue, ValueKind};

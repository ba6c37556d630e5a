//! Core library for LunaTrack build tools
//!
//! This crate resolves layered build settings for the Android app variant:
//!
//! - **Fragments**: named layers of scalar key/value pairs loaded from TOML,
//!   JSON, environment variables or CLI overrides
//! - **Schema**: expected type and allowed values per key
//! - **Resolution**: last-writer-wins merge that falls back past invalid
//!   values and reports every finding as a non-fatal diagnostic
//! - **Error handling**: structured errors with codes, context and
//!   recovery suggestions for everything around resolution
//!
//! # Example
//!
//! ```rust
//! use luna_core::config::{android_defaults, android_schema, ConfigFragment, ConfigResolver};
//!
//! let mut resolver = ConfigResolver::new(android_schema()?);
//! resolver.load(android_defaults());
//! resolver.load(ConfigFragment::builder("ci").set("defaultConfig.versionCode", 42).build());
//!
//! let resolution = resolver.resolve();
//! resolution.ensure_valid()?;
//! assert_eq!(resolution.config.get_integer("defaultConfig.versionCode"), Some(42));
//! # Ok::<(), luna_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        ConfigFragment, ConfigResolver, ConfigValue, Diagnostic, Resolution,
        ResolvedConfiguration, Schema, SchemaEntry, Severity, SeverityPolicy,
    };
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
}

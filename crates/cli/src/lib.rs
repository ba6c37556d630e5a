//! CLI utilities for LunaTrack build tools
//!
//! Provides shared CLI functionality:
//! - Terminal output formatting
//! - Diagnostic and resolved-configuration rendering

#![warn(missing_docs)]

pub mod output;

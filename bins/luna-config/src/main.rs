//! LunaTrack build configuration CLI
//!
//! Merges layered build settings for the Android app module and reports
//! validation findings.

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use luna_cli::output::{self, Status};
use luna_core::config::{
    android_defaults, android_schema, loader, ConfigResolver, Resolution, Schema, SeverityPolicy,
};
use luna_core::error::exit_codes;
use luna_telemetry::{TelemetryConfig, Timer};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "luna-config")]
#[command(about = "Resolve layered build configuration for the LunaTrack Android app")]
#[command(version)]
struct Cli {
    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log line format on stderr
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge fragments and print the resolved configuration
    Resolve {
        #[command(flatten)]
        sources: SourceArgs,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Exit non-zero when any error diagnostic is reported
        #[arg(long)]
        strict: bool,
    },

    /// Validate fragments; exit non-zero on errors
    Check {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Print a schema (the built-in Android schema by default)
    Schema {
        /// TOML schema file to validate and print instead
        #[arg(long)]
        file: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum, default_value_t = SchemaFormat::Text)]
        format: SchemaFormat,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Fragment files (TOML or JSON), lowest precedence first
    files: Vec<PathBuf>,

    /// Schema: "android", "none", or a path to a TOML schema file
    #[arg(long, default_value = "android")]
    schema: String,

    /// Start from the app module's checked-in settings
    #[arg(long)]
    with_defaults: bool,

    /// Load the standard layer files (user, project, local) before FILES
    #[arg(long)]
    discover: bool,

    /// Project directory searched by --discover
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Apply overrides from environment variables
    #[arg(long)]
    env: bool,

    /// Prefix of environment variable overrides
    #[arg(long, default_value = loader::ENV_PREFIX)]
    env_prefix: String,

    /// Override a key; applied after every other source
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Report keys missing from the schema as errors
    #[arg(long)]
    deny_unknown: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Properties,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    let telemetry = TelemetryConfig::from_verbosity(cli.verbose, cli.quiet)
        .with_json(cli.log_format == LogFormat::Json);
    luna_telemetry::init_with_config(telemetry)?;

    let result = match cli.command {
        Commands::Resolve {
            sources,
            format,
            strict,
        } => run_resolve(&sources, format, strict, cli.quiet),
        Commands::Check { sources } => run_check(&sources, cli.quiet),
        Commands::Schema { file, format } => run_schema(file.as_deref(), format),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            Status::error(&e.to_string());
            e.exit_code()
        }
    };

    std::process::exit(exit_code);
}

fn load_schema(source: &str) -> luna_core::Result<Schema> {
    match source {
        "android" => android_schema(),
        "none" => Ok(Schema::new()),
        path => Schema::from_file(path),
    }
}

fn build_resolver(sources: &SourceArgs) -> luna_core::Result<ConfigResolver> {
    let policy = if sources.deny_unknown {
        SeverityPolicy::strict()
    } else {
        SeverityPolicy::default()
    };
    let mut resolver = ConfigResolver::new(load_schema(&sources.schema)?).with_policy(policy);

    if sources.with_defaults {
        resolver.load(android_defaults());
    }

    if sources.discover {
        for path in loader::discover_layers(&sources.project_dir) {
            resolver.load(loader::load_file(&path)?);
        }
    }

    for path in &sources.files {
        resolver.load(loader::load_file(path)?);
    }

    if sources.env {
        let fragment = loader::from_process_env(&sources.env_prefix, Some(resolver.schema()));
        resolver.load(fragment);
    }

    if !sources.overrides.is_empty() {
        let fragment =
            loader::from_overrides("cli", &sources.overrides, Some(resolver.schema()))?;
        resolver.load(fragment);
    }

    Ok(resolver)
}

fn resolve(sources: &SourceArgs) -> luna_core::Result<Resolution> {
    let resolver = build_resolver(sources)?;
    let timer = Timer::start("resolve");
    let resolution = resolver.resolve();
    timer.stop();
    Ok(resolution)
}

fn run_resolve(
    sources: &SourceArgs,
    format: OutputFormat,
    strict: bool,
    quiet: bool,
) -> luna_core::Result<i32> {
    let resolution = resolve(sources)?;

    match format {
        OutputFormat::Text => {
            if !quiet {
                Status::header("Resolved configuration");
                print!("{}", output::format_config_table(&resolution));
                output::print_findings(&resolution);
            } else {
                resolution.errors().for_each(output::print_diagnostic);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
        OutputFormat::Properties => {
            print!("{}", resolution.config.to_properties());
            if !quiet {
                resolution.diagnostics.iter().for_each(output::print_diagnostic);
            }
        }
    }

    if strict {
        if let Err(e) = resolution.ensure_valid() {
            tracing::debug!(code = %e.code, "Strict mode rejected configuration");
            return Ok(e.exit_code());
        }
    }

    Ok(exit_codes::SUCCESS)
}

fn run_check(sources: &SourceArgs, quiet: bool) -> luna_core::Result<i32> {
    let resolution = resolve(sources)?;

    if quiet {
        resolution.errors().for_each(output::print_diagnostic);
    } else {
        output::print_findings(&resolution);
    }

    match resolution.ensure_valid() {
        Ok(()) => Ok(exit_codes::SUCCESS),
        Err(e) => Ok(e.exit_code()),
    }
}

fn run_schema(file: Option<&Path>, format: SchemaFormat) -> luna_core::Result<i32> {
    let schema = match file {
        Some(path) => Schema::from_file(path)?,
        None => android_schema()?,
    };

    match format {
        SchemaFormat::Text => print!("{}", output::format_schema_table(&schema)),
        SchemaFormat::Json => println!("{}", serde_json::to_string_pretty(&schema)?),
    }

    Ok(exit_codes::SUCCESS)
}

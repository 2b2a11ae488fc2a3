//! Conversant CLI
//!
//! Command-line interface for converting hypermedia documents.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use conversant::{
    load_document_auto, parse_json, validate_uhf, ConvertError, HalOptions, Registry,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conversant")]
#[command(about = "Convert hypermedia documents between formats")]
#[command(version)]
struct Cli {
    /// Log degraded mappings and conversion steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a document from one format to another
    Convert {
        /// Document source: file path or URL (http:// or https://)
        input: String,

        /// Source format, by name or MIME type. Detected if omitted: an object
        /// with an object `head` (and optionally `body`) is UHF, anything else HAL
        #[arg(long)]
        from: Option<String>,

        /// Target format, by name or MIME type
        #[arg(long)]
        to: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Reject documents that embed resources deeper than this
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// List the supported formats
    Formats {
        /// Output as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Validate a UHF document
    Validate {
        /// Document source: file path or URL (http:// or https://)
        input: String,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input,
            from,
            to,
            output,
            pretty,
            max_depth,
        } => run_convert(ConvertArgs {
            input,
            from,
            to,
            output,
            pretty,
            max_depth,
        }),
        Commands::Formats { json } => run_formats(json),
        Commands::Validate { input, json } => run_validate(&input, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Logs go to stderr so stdout only carries documents.
fn init_tracing(verbose: bool) {
    let default = if verbose { "conversant=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

struct ConvertArgs {
    input: String,
    from: Option<String>,
    to: String,
    output: Option<PathBuf>,
    pretty: bool,
    max_depth: Option<usize>,
}

fn run_convert(args: ConvertArgs) -> Result<(), u8> {
    let ConvertArgs {
        input,
        from,
        to,
        output,
        pretty,
        max_depth,
    } = args;

    let options = match max_depth {
        Some(limit) => HalOptions::new().max_depth(limit),
        None => HalOptions::new(),
    };
    let registry = Registry::with_hal_options(options);

    let raw = load_document_auto(&input).map_err(fail)?;
    let converted = registry
        .convert(&raw, from.as_deref(), &to)
        .map_err(fail)?;

    let rendered = if pretty {
        serde_json::to_string_pretty(&converted)
    } else {
        serde_json::to_string(&converted)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", rendered);
        }
    }

    Ok(())
}

fn run_formats(json_output: bool) -> Result<(), u8> {
    let descriptors = Registry::with_defaults().descriptors();

    if json_output {
        let rendered = serde_json::to_string(&descriptors).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", rendered);
    } else {
        for descriptor in descriptors {
            println!("{:<6} {}", descriptor.name, descriptor.mime_type);
        }
    }

    Ok(())
}

fn run_validate(input: &str, json_output: bool) -> Result<(), u8> {
    let value = load_document_auto(input)
        .and_then(|raw| parse_json(&raw))
        .map_err(|e| {
            report_error(json_output, &e.to_string());
            e.exit_code() as u8
        })?;

    match validate_uhf(&value) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ConvertError::InvalidDocument { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

fn fail(e: ConvertError) -> u8 {
    eprintln!("Error: {}", e);
    e.exit_code() as u8
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", serde_json::json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

//! wtgtool - inspect and round-trip trigger documents

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mapkit_binary::RawCode;
use mapkit_config::CodecConfig;
use mapkit_triggers::{decode_with_config, encode_with_config, TriggerDocument};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "wtgtool", about = "Trigger document codec tool")]
struct Cli {
    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a document and print it.
    Dump {
        /// Path to the trigger document.
        file: PathBuf,
        /// Function descriptor used for parameter counts.
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Codec options file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Print JSON instead of indented text.
        #[arg(long)]
        json: bool,
    },
    /// Decode, re-encode and compare against the input bytes.
    Roundtrip {
        /// Path to the trigger document.
        file: PathBuf,
        /// Function descriptor used for parameter counts.
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Codec options file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Convert between a four-character tag and its integer value.
    Rawcode {
        /// A tag such as `hfoo`, or a decimal integer.
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Dump {
            file,
            schema,
            config,
            json,
        } => {
            let config = load_config(config.as_deref(), schema)?;
            let doc = load_document(&file, &config)?;
            if json {
                let text = serde_json::to_string_pretty(&doc).context("failed to serialize document")?;
                println!("{}", text);
            } else {
                print!("{}", doc.dump());
            }
        }
        Command::Roundtrip { file, schema, config } => {
            let config = load_config(config.as_deref(), schema)?;
            let original = fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
            let doc = decode_with_config(&original, &config)
                .with_context(|| format!("failed to decode {}", file.display()))?;
            let encoded = encode_with_config(&doc, &config)
                .with_context(|| format!("failed to re-encode {}", file.display()))?;

            match first_difference(&original, &encoded) {
                None => info!("{}: {} bytes, identical after re-encoding", file.display(), original.len()),
                Some(offset) => bail!(
                    "{}: re-encoded output differs at offset {:#x} ({} bytes in, {} bytes out)",
                    file.display(),
                    offset,
                    original.len(),
                    encoded.len()
                ),
            }
        }
        Command::Rawcode { value } => {
            let code = match value.parse::<i32>() {
                Ok(number) => RawCode::new(number),
                Err(_) => RawCode::from_tag(&value).with_context(|| format!("not a raw code: {:?}", value))?,
            };
            let tag = code.to_tag().with_context(|| format!("{} has no text form", code.get()))?;
            println!("{} = {}", tag, code.get());
        }
    }

    Ok(())
}

/// Options file first, then command line overrides
fn load_config(path: Option<&Path>, schema: Option<PathBuf>) -> Result<CodecConfig> {
    let mut config = match path {
        Some(path) => CodecConfig::load_from_file(path)
            .with_context(|| format!("failed to load options {}", path.display()))?,
        None => CodecConfig::default(),
    };

    if let Some(schema) = schema {
        config.schema_path = Some(schema);
    }

    if config.schema_path.is_none() {
        warn!("No schema given; parameter counts are inferred");
    }
    config.display();
    Ok(config)
}

fn load_document(path: &Path, config: &CodecConfig) -> Result<TriggerDocument> {
    let doc = TriggerDocument::load_file(path, config)
        .with_context(|| format!("failed to decode {}", path.display()))?;
    debug!(
        "{}: {} categories, {} variables, {} triggers, {} functions",
        path.display(),
        doc.categories.len(),
        doc.variables.len(),
        doc.triggers.len(),
        doc.function_count()
    );
    Ok(doc)
}

/// Offset of the first byte that differs, or the shorter length
fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    match a.iter().zip(b).position(|(x, y)| x != y) {
        Some(offset) => Some(offset),
        None if a.len() != b.len() => Some(a.len().min(b.len())),
        None => None,
    }
}

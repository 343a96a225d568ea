//! MapKit Configuration Management
//!
//! Loads codec options from a `key=value` text file:
//!
//! ```text
//! # codec.txt
//! schema = TriggerData.txt
//! maxdepth = 256
//! stacksize_mb = 64
//! endian = little
//! ```
//!
//! Unknown keys are ignored and unparsable values keep their defaults.

use mapkit_core::{Endian, MapKitError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default nesting limit for functions, calls and array indices
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Default stack for the decode worker thread (64 MiB)
pub const DEFAULT_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Options shared by the trigger codec entry points
#[derive(Debug, Clone, PartialEq)]
pub struct CodecConfig {
    /// Function descriptor file (from "schema" option)
    pub schema_path: Option<PathBuf>,
    /// Maximum AST nesting depth (from "maxdepth" option, default: 256)
    pub max_depth: usize,
    /// Decode worker stack in bytes (from "stacksize_mb" option, default: 64 MiB)
    pub stack_size: usize,
    /// Integer byte order (from "endian" option, default: little)
    pub endian: Endian,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            schema_path: None,
            max_depth: DEFAULT_MAX_DEPTH,
            stack_size: DEFAULT_STACK_SIZE,
            endian: Endian::Little,
        }
    }
}

impl CodecConfig {
    /// Load configuration from an options file
    ///
    /// A relative `schema` path is resolved against the options file's directory.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;

        if let Some(schema) = config.schema_path.take() {
            config.schema_path = Some(match path.parent() {
                Some(base) if schema.is_relative() => base.join(schema),
                _ => schema,
            });
        }

        tracing::debug!("Loaded codec config from {}", path.display());
        Ok(config)
    }

    /// Parse options file content
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some(eq_pos) = line.find('=') else {
                return Err(MapKitError::Config(format!(
                    "line {}: expected key=value, got {:?}",
                    number + 1,
                    line
                )));
            };

            let key = line[..eq_pos].trim();
            let value = line[eq_pos + 1..].trim();
            config.parse_option(key, value);
        }

        Ok(config)
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key {
            "schema" => {
                self.schema_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "maxdepth" => {
                self.max_depth = value
                    .parse()
                    .ok()
                    .filter(|&depth| depth > 0)
                    .unwrap_or(DEFAULT_MAX_DEPTH);
            }
            "stacksize_mb" => {
                self.stack_size = value
                    .parse::<usize>()
                    .ok()
                    .filter(|&mb| mb > 0)
                    .and_then(|mb| mb.checked_mul(1024 * 1024))
                    .unwrap_or(DEFAULT_STACK_SIZE);
            }
            "endian" => {
                self.endian = value.parse().unwrap_or_default();
            }
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    pub fn with_schema_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.schema_path = Some(path.into());
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Log the effective configuration
    pub fn display(&self) {
        tracing::info!("Codec configuration:");
        match &self.schema_path {
            Some(path) => tracing::info!("  Schema: {}", path.display()),
            None => tracing::info!("  Schema: (none, default arity)"),
        }
        tracing::info!("  Max depth: {}", self.max_depth);
        tracing::info!("  Stack: {} MiB", self.stack_size / (1024 * 1024));
        tracing::info!("  Endian: {}", self.endian);
    }
}

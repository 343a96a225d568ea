//! # MapKit Triggers
//!
//! Decoder and encoder for the map editor's trigger document.
//!
//! ## Features
//! - Categories, global variables and triggers
//! - Recursive event/condition/action functions with child blocks
//! - Inline calls and array indices nested to any depth (bounded by config)
//! - Optional function descriptor for parameter counts
//! - Indented text dump for diagnostics
//!
//! ## Usage
//!
//! ```rust
//! use mapkit_triggers::{decode, encode, TriggerDocument};
//!
//! let doc = TriggerDocument::new();
//! let bytes = encode(&doc).unwrap();
//! let decoded = decode(&bytes, None).unwrap();
//! assert_eq!(decoded, doc);
//! ```
//!
//! ## Threading
//!
//! Decoding recurses once per nesting level. [`decode_with_config`] runs the
//! traversal on a scoped worker thread with a large stack and waits for it;
//! the schema is passed down explicitly, so concurrent decodes share nothing.

pub mod error;
pub mod document;
pub mod schema;
pub mod decoder;
pub mod encoder;
pub mod dump;

pub use error::{Result, SchemaError, TriggerError};
pub use document::{
    Category, Function, FunctionCall, FunctionKind, Parameter, ParameterKind, Trigger,
    TriggerDocument, Variable,
};
pub use schema::{SchemaCatalog, DEFAULT_ARITY};
pub use decoder::DecodeContext;
pub use mapkit_config::CodecConfig;

use mapkit_binary::{ByteCursor, ByteWriter};
use std::fs;
use std::path::Path;
use std::thread;

/// Decode a trigger document with default limits
pub fn decode(bytes: &[u8], schema_path: Option<&Path>) -> Result<TriggerDocument> {
    let mut config = CodecConfig::default();
    config.schema_path = schema_path.map(Path::to_path_buf);
    decode_with_config(bytes, &config)
}

/// Decode a trigger document
///
/// Builds a fresh [`SchemaCatalog`] for this call, then decodes on a worker
/// thread with `config.stack_size` bytes of stack.
pub fn decode_with_config(bytes: &[u8], config: &CodecConfig) -> Result<TriggerDocument> {
    let schema = SchemaCatalog::load(config.schema_path.as_deref());
    let ctx = DecodeContext::new(&schema, config.max_depth);

    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("trigger-decode".into())
            .stack_size(config.stack_size)
            .spawn_scoped(scope, || {
                let mut cursor = ByteCursor::with_endian(bytes, config.endian);
                decoder::decode_document(&mut cursor, &ctx)
            })?;

        worker.join().map_err(|_| TriggerError::WorkerPanicked)?
    })
}

/// Encode a trigger document
///
/// Fails with a structural error when the document holds a shape that
/// would not decode back to itself.
pub fn encode(doc: &TriggerDocument) -> Result<Vec<u8>> {
    encode_with_config(doc, &CodecConfig::default())
}

/// Encode with the configured byte order
pub fn encode_with_config(doc: &TriggerDocument, config: &CodecConfig) -> Result<Vec<u8>> {
    let mut writer = ByteWriter::with_endian(config.endian);
    encoder::encode_document(doc, &mut writer)?;
    Ok(writer.into_vec())
}

impl TriggerDocument {
    /// Read and decode a document file
    pub fn load_file<P: AsRef<Path>>(path: P, config: &CodecConfig) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        tracing::debug!("Decoding {} ({} bytes)", path.display(), bytes.len());
        decode_with_config(&bytes, config)
    }

    /// Encode and write a document file
    pub fn save_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, encode(self)?)?;
        Ok(())
    }
}

//! Error types for the triggers crate

use mapkit_binary::BinaryError;
use mapkit_core::MapKitError;

/// Trigger document errors
///
/// Every decode-time variant is structural: it aborts the whole decode.
/// Parameter mismatches never show up here, the parser rewinds instead.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    /// Malformed document structure
    #[error("Structural error: {0}")]
    Structural(String),

    /// Trigger with an empty name
    #[error("Trigger name must not be empty")]
    EmptyName,

    /// Function kind outside Event/Condition/Action/Call
    #[error("Invalid function kind {0}")]
    InvalidFunctionKind(i32),

    /// Function enabled flag other than 0 or 1
    #[error("Function '{name}' has invalid enabled flag {value}")]
    InvalidEnabled { name: String, value: i32 },

    /// Nesting guard tripped
    #[error("Nesting depth {depth} exceeds limit of {max}")]
    DepthExceeded { depth: usize, max: usize },

    /// Buffer underrun or seek failure outside a parameter
    #[error(transparent)]
    Binary(#[from] BinaryError),

    /// File error
    #[error("File error: {0}")]
    Io(#[from] std::io::Error),

    /// The decode worker thread panicked
    #[error("Decode worker panicked")]
    WorkerPanicked,
}

impl TriggerError {
    /// Whether the error describes a corrupt or hostile document
    pub fn is_structural(&self) -> bool {
        !matches!(self, TriggerError::Io(_) | TriggerError::WorkerPanicked)
    }
}

/// Function descriptor errors
///
/// Never escape [`SchemaCatalog::load`](crate::SchemaCatalog::load), which
/// swallows them and falls back to an empty catalog.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Descriptor error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed descriptor line {line}: {text}")]
    MalformedLine { line: usize, text: String },
}

impl From<TriggerError> for MapKitError {
    fn from(err: TriggerError) -> Self {
        match err {
            TriggerError::Io(e) => MapKitError::Io(e),
            other => MapKitError::Trigger(other.to_string()),
        }
    }
}

/// Result type for trigger operations
pub type Result<T> = std::result::Result<T, TriggerError>;

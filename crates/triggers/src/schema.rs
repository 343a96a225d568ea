//! Function descriptor catalog
//!
//! Maps function names to the number of parameters they declare, read from
//! a line-oriented descriptor:
//!
//! ```text
//! [TriggerActions]
//! _CreateNUnitsAtLoc_Defaults=1,_,Player00,_,RealUnitFacing
//! CreateNUnitsAtLoc=0,integer,unitcode,player,location,degree
//!
//! [TriggerCalls]
//! GetUnitLoc=0,1,location,unit
//! ```
//!
//! ECA sections (`TriggerEvents`, `TriggerConditions`, `TriggerActions`)
//! store a version token before the argument types; `TriggerCalls` stores a
//! version, an event-response flag and the return type. A lone `nothing`
//! argument means no parameters.
//!
//! The catalog is only a hint. A missing or malformed descriptor yields an
//! empty catalog, and every lookup then answers [`DEFAULT_ARITY`].

use crate::SchemaError;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Arity assumed for functions the catalog does not know
pub const DEFAULT_ARITY: usize = 20;

/// Tokens preceding the argument list in ECA lines
const ECA_PREFIX_TOKENS: usize = 1;

/// Tokens preceding the argument list in call lines
const CALL_PREFIX_TOKENS: usize = 3;

/// Which table the current section feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Eca,
    Call,
}

impl Section {
    fn from_header(header: &str) -> Self {
        match header {
            "TriggerEvents" | "TriggerConditions" | "TriggerActions" => Section::Eca,
            "TriggerCalls" => Section::Call,
            _ => Section::None,
        }
    }
}

/// Parameter counts for ECA functions and inline calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCatalog {
    eca: HashMap<String, usize>,
    calls: HashMap<String, usize>,
}

impl SchemaCatalog {
    /// An empty catalog: every lookup returns [`DEFAULT_ARITY`]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a catalog from an optional descriptor file
    ///
    /// Never fails: any read or parse problem disables the schema.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::empty();
        };

        match Self::load_file(path) {
            Ok(catalog) => {
                debug!(
                    "Loaded schema {}: {} ECA functions, {} calls",
                    path.display(),
                    catalog.eca.len(),
                    catalog.calls.len()
                );
                catalog
            }
            Err(e) => {
                warn!("Schema {} disabled: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse descriptor text
    pub fn parse(content: &str) -> Result<Self, SchemaError> {
        let mut catalog = Self::empty();
        let mut section = Section::None;

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('_') || line.starts_with("//") {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Section::from_header(header.trim());
                continue;
            }

            let table = match section {
                Section::None => continue,
                Section::Eca => &mut catalog.eca,
                Section::Call => &mut catalog.calls,
            };

            let Some((name, tokens)) = line.split_once('=') else {
                return Err(SchemaError::MalformedLine {
                    line: number + 1,
                    text: line.to_string(),
                });
            };

            let name = name.trim();
            if name.is_empty() {
                return Err(SchemaError::MalformedLine {
                    line: number + 1,
                    text: line.to_string(),
                });
            }

            let tokens: Vec<&str> = tokens.split(',').map(str::trim).collect();
            let prefix = match section {
                Section::Call => CALL_PREFIX_TOKENS,
                _ => ECA_PREFIX_TOKENS,
            };
            table.insert(name.to_string(), arity(&tokens, prefix));
        }

        Ok(catalog)
    }

    /// Whether any descriptor entries were loaded
    pub fn is_enabled(&self) -> bool {
        !self.eca.is_empty() || !self.calls.is_empty()
    }

    /// Declared parameter count of an event, condition or action
    pub fn eca_arity(&self, name: &str) -> usize {
        self.eca.get(name).copied().unwrap_or(DEFAULT_ARITY)
    }

    /// Declared parameter count of an inline call
    pub fn call_arity(&self, name: &str) -> usize {
        self.calls.get(name).copied().unwrap_or(DEFAULT_ARITY)
    }
}

/// Argument count after `prefix` leading tokens
fn arity(tokens: &[&str], prefix: usize) -> usize {
    match tokens.get(prefix..) {
        None | Some([]) | Some(["nothing"]) => 0,
        Some(args) => args.len(),
    }
}

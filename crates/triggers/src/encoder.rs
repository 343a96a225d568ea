//! Trigger document encoder
//!
//! Field-for-field mirror of the [decoder](crate::decoder). Parameters are
//! written exactly as held in memory; arity is never re-derived.
//!
//! Shapes the decoder would read back differently are rejected with a
//! structural error instead of being written:
//! - a nested function without a block index, or a top-level one with one
//! - an inline call on a parameter that is not a `FunctionCall`
//! - a `Call` whose name differs from the parameter value
//! - a parameter value the decoder would not accept

use crate::decoder::is_plausible_value;
use crate::document::*;
use crate::{Result, TriggerError};
use mapkit_binary::ByteWriter;
use tracing::debug;

/// File magic
pub const MAGIC: &[u8; 4] = b"WTG!";

/// Format version written after the magic
pub const VERSION: i32 = 7;

/// Reserved int32 in every variable record
const VARIABLE_RESERVED: i32 = 1;

/// Encode a whole document
pub fn encode_document(doc: &TriggerDocument, w: &mut ByteWriter) -> Result<()> {
    w.write_bytes(MAGIC);
    w.write_i32(VERSION);

    w.write_i32(count(doc.categories.len()));
    for category in &doc.categories {
        write_category(w, category);
    }

    w.write_i32(doc.unknown);

    w.write_i32(count(doc.variables.len()));
    for variable in &doc.variables {
        write_variable(w, variable);
    }

    w.write_i32(count(doc.triggers.len()));
    for trigger in &doc.triggers {
        write_trigger(w, trigger)?;
    }

    debug!("Encoded {} triggers into {} bytes", doc.triggers.len(), w.position());
    Ok(())
}

fn count(len: usize) -> i32 {
    i32::try_from(len).unwrap_or(i32::MAX)
}

fn write_category(w: &mut ByteWriter, category: &Category) {
    w.write_i32(category.index);
    w.write_cstring(&category.name);
    w.write_bool_i32(category.is_comment);
}

fn write_variable(w: &mut ByteWriter, variable: &Variable) {
    w.write_cstring(variable.name());
    w.write_cstring(variable.var_type());
    w.write_i32(VARIABLE_RESERVED);
    w.write_bool_i32(variable.is_array());
    w.write_i32(variable.array_size());
    w.write_bool_i32(variable.is_initialized());
    w.write_cstring(variable.initial_value());
}

fn write_trigger(w: &mut ByteWriter, trigger: &Trigger) -> Result<()> {
    w.write_cstring(trigger.name());
    w.write_cstring(trigger.description());
    w.write_bool_i32(trigger.is_comment());
    w.write_bool_i32(trigger.is_enabled());
    w.write_bool_i32(trigger.is_custom_text());
    w.write_bool_i32(!trigger.initial_state());
    w.write_bool_i32(trigger.runs_on_map_init());
    w.write_i32(trigger.category_index());

    write_functions(w, trigger.functions(), false)
}

/// Write a counted function list; nested lists carry block indices
pub fn write_functions(w: &mut ByteWriter, functions: &[Function], nested: bool) -> Result<()> {
    w.write_i32(count(functions.len()));
    for function in functions {
        write_function(w, function, nested)?;
    }
    Ok(())
}

fn write_function(w: &mut ByteWriter, function: &Function, nested: bool) -> Result<()> {
    w.write_i32(function.kind.as_i32());
    match (nested, function.category) {
        (true, Some(block)) => w.write_i32(block),
        (false, None) => {}
        (true, None) => {
            return Err(unencodable(format!("child function '{}' has no block index", function.name)));
        }
        (false, Some(block)) => {
            return Err(unencodable(format!(
                "top-level function '{}' has block index {}",
                function.name, block
            )));
        }
    }
    w.write_cstring(&function.name);
    w.write_bool_i32(function.enabled);

    for parameter in &function.parameters {
        write_parameter(w, parameter)?;
    }

    // An empty child list is the 0 count itself
    write_functions(w, &function.children, true)
}

fn unencodable(reason: String) -> TriggerError {
    TriggerError::Structural(format!("cannot encode: {}", reason))
}

/// Reject a parameter that would not decode back to itself
fn check_parameter(parameter: &Parameter) -> Result<()> {
    if parameter.value.contains('\0') || !is_plausible_value(parameter.kind, &parameter.value) {
        return Err(unencodable(format!(
            "{} value {:?} would not read back",
            parameter.kind, parameter.value
        )));
    }

    if let Some(call) = &parameter.call {
        if parameter.kind != ParameterKind::FunctionCall {
            return Err(unencodable(format!(
                "{} parameter {:?} carries an inline call",
                parameter.kind, parameter.value
            )));
        }
        if call.kind == FunctionKind::Call && call.name != parameter.value {
            return Err(unencodable(format!(
                "call '{}' does not match parameter value {:?}",
                call.name, parameter.value
            )));
        }
    }
    Ok(())
}

/// Write one parameter with its call and index
pub fn write_parameter(w: &mut ByteWriter, parameter: &Parameter) -> Result<()> {
    check_parameter(parameter)?;

    w.write_i32(parameter.kind.as_i32());
    w.write_cstring(&parameter.value);

    match &parameter.call {
        Some(call) => {
            w.write_i32(1);
            w.write_i32(call.kind.as_i32());
            w.write_cstring(&call.name);
            w.write_i32(1);
            for nested in &call.parameters {
                write_parameter(w, nested)?;
            }
            w.write_i32(0);
        }
        None => w.write_i32(0),
    }

    match &parameter.array_index {
        Some(index) => {
            w.write_i32(1);
            write_parameter(w, index)?;
        }
        None => w.write_i32(0),
    }
    Ok(())
}

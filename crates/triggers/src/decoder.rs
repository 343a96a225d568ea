//! Trigger document decoder
//!
//! Reads the classic trigger document layout:
//!
//! ```text
//! header       "WTG!" + int32 version (skipped)
//! categories   int32 count, then { index, name, is_comment }
//! unknown      int32, kept verbatim
//! variables    int32 count, then { name, type, reserved, is_array, size, initialized, value }
//! triggers     int32 count, then { name, description, is_comment, enabled,
//!              custom_text, initially_off, run_on_init, category, functions }
//! ```
//!
//! Function lists are strict: a bad kind, a bad enabled flag or running out
//! of input aborts the decode. Parameter lists are speculative. The schema
//! arity is only an upper bound because older editors drop trailing default
//! parameters, so each parameter is tried from a checkpoint and the list
//! ends at the first one that does not parse.

use crate::document::*;
use crate::schema::SchemaCatalog;
use crate::{Result, TriggerError};
use mapkit_binary::{BinaryError, ByteCursor};
use tracing::{debug, trace};

/// Size of the magic + version header
pub const HEADER_LEN: usize = 8;

/// Start-of-parameters marker inside an inline call
const CALL_BEGIN: i32 = 1;

/// End-of-call marker
const CALL_END: i32 = 0;

/// Per-decode state threaded through every recursive call
#[derive(Debug, Clone, Copy)]
pub struct DecodeContext<'s> {
    pub schema: &'s SchemaCatalog,
    pub max_depth: usize,
}

impl<'s> DecodeContext<'s> {
    pub fn new(schema: &'s SchemaCatalog, max_depth: usize) -> Self {
        Self { schema, max_depth }
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(TriggerError::DepthExceeded {
                depth,
                max: self.max_depth,
            });
        }
        Ok(())
    }
}

/// Why a speculative parameter parse gave up
enum Abandon {
    /// Not a parameter here; rewind and stop the list
    Mismatch,
    /// Fatal regardless of context
    Fatal(TriggerError),
}

impl From<BinaryError> for Abandon {
    fn from(_: BinaryError) -> Self {
        Abandon::Mismatch
    }
}

/// Decode a whole document from the cursor's current position
pub fn decode_document(cursor: &mut ByteCursor<'_>, ctx: &DecodeContext<'_>) -> Result<TriggerDocument> {
    cursor.skip(HEADER_LEN)?;

    let category_count = read_count(cursor, "category")?;
    let mut categories = Vec::with_capacity(category_count.min(1024));
    for _ in 0..category_count {
        categories.push(read_category(cursor)?);
    }

    let unknown = cursor.read_i32()?;

    let variable_count = read_count(cursor, "variable")?;
    let mut variables = Vec::with_capacity(variable_count.min(1024));
    for _ in 0..variable_count {
        variables.push(read_variable(cursor)?);
    }

    let trigger_count = read_count(cursor, "trigger")?;
    let mut triggers = Vec::with_capacity(trigger_count.min(1024));
    for _ in 0..trigger_count {
        triggers.push(read_trigger(cursor, ctx)?);
    }

    debug!(
        "Decoded {} categories, {} variables, {} triggers",
        categories.len(),
        variables.len(),
        triggers.len()
    );

    Ok(TriggerDocument {
        categories,
        unknown,
        variables,
        triggers,
    })
}

/// Read a record count, rejecting negative values
fn read_count(cursor: &mut ByteCursor<'_>, what: &str) -> Result<usize> {
    let position = cursor.position();
    let count = cursor.read_i32()?;
    usize::try_from(count).map_err(|_| {
        TriggerError::Structural(format!("negative {} count {} at {}", what, count, position))
    })
}

/// Read a non-zero-means-true int32 flag
fn read_flag(cursor: &mut ByteCursor<'_>) -> Result<bool> {
    Ok(cursor.read_i32()? != 0)
}

fn read_category(cursor: &mut ByteCursor<'_>) -> Result<Category> {
    let index = cursor.read_i32()?;
    let name = cursor.read_cstring()?;
    let position = cursor.position();
    let is_comment = cursor.read_bool_i32()?.ok_or_else(|| {
        TriggerError::Structural(format!("category '{}' has invalid type flag at {}", name, position))
    })?;

    Ok(Category {
        index,
        name,
        is_comment,
    })
}

fn read_variable(cursor: &mut ByteCursor<'_>) -> Result<Variable> {
    let name = cursor.read_cstring()?;
    let var_type = cursor.read_cstring()?;
    // Reserved, always 1
    cursor.skip(4)?;
    let is_array = read_flag(cursor)?;
    let array_size = cursor.read_i32()?;
    let initialized = read_flag(cursor)?;
    let initial_value = cursor.read_cstring()?;

    let mut variable = Variable::new(name, var_type);
    variable.set_array(is_array);
    variable.set_array_size(array_size);
    variable.set_initialized(initialized);
    variable.set_initial_value(initial_value);
    Ok(variable)
}

fn read_trigger(cursor: &mut ByteCursor<'_>, ctx: &DecodeContext<'_>) -> Result<Trigger> {
    let position = cursor.position();
    let name = cursor.read_cstring()?;
    let mut trigger = Trigger::new(name).map_err(|_| {
        TriggerError::Structural(format!("trigger at {} has an empty name", position))
    })?;

    trigger.set_description(cursor.read_cstring()?);
    let is_comment = read_flag(cursor)?;
    trigger.set_enabled(read_flag(cursor)?);
    trigger.set_custom_text(read_flag(cursor)?);
    // Stored as "initially off"
    trigger.set_initial_state(cursor.read_i32()? == 0);
    trigger.set_run_on_map_init(read_flag(cursor)?);
    trigger.set_category_index(cursor.read_i32()?);
    trigger.set_comment(is_comment);

    *trigger.functions_mut() = parse_functions(cursor, ctx, false, 0)?;

    trace!("Trigger '{}': {} functions", trigger.name(), trigger.functions().len());
    Ok(trigger)
}

/// Parse a counted function list
///
/// Nested lists (child blocks) carry a block index on every function.
pub fn parse_functions(
    cursor: &mut ByteCursor<'_>,
    ctx: &DecodeContext<'_>,
    nested: bool,
    depth: usize,
) -> Result<Vec<Function>> {
    ctx.check_depth(depth)?;

    let count = read_count(cursor, "function")?;
    let mut functions = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        functions.push(parse_function(cursor, ctx, nested, depth)?);
    }
    Ok(functions)
}

fn parse_function(
    cursor: &mut ByteCursor<'_>,
    ctx: &DecodeContext<'_>,
    nested: bool,
    depth: usize,
) -> Result<Function> {
    let raw_kind = cursor.read_i32()?;
    let kind = FunctionKind::from_i32(raw_kind).ok_or(TriggerError::InvalidFunctionKind(raw_kind))?;

    let category = if nested {
        Some(cursor.read_i32()?)
    } else {
        None
    };

    let name = cursor.read_cstring()?;

    let enabled = match cursor.read_i32()? {
        0 => false,
        1 => true,
        value => return Err(TriggerError::InvalidEnabled { name, value }),
    };

    let arity = ctx.schema.eca_arity(&name);
    let parameters = parse_parameters(cursor, ctx, arity, depth + 1)?;

    // Child count; the nested list re-reads it
    let children = if cursor.peek_i32()? > 0 {
        parse_functions(cursor, ctx, true, depth + 1)?
    } else {
        cursor.skip(4)?;
        Vec::new()
    };

    if parameters.len() < arity && ctx.schema.is_enabled() {
        trace!("{} '{}': {} of {} parameters", kind, name, parameters.len(), arity);
    }

    Ok(Function {
        kind,
        category,
        name,
        enabled,
        parameters,
        children,
    })
}

/// Parse up to `limit` parameters
///
/// Stops at the first parameter that fails to parse, leaving the cursor
/// just past the last good one. Returning fewer than `limit` is normal.
/// An empty list (`limit == 0`) opens no nesting level.
pub fn parse_parameters(
    cursor: &mut ByteCursor<'_>,
    ctx: &DecodeContext<'_>,
    limit: usize,
    depth: usize,
) -> Result<Vec<Parameter>> {
    if limit == 0 {
        return Ok(Vec::new());
    }
    ctx.check_depth(depth)?;

    let mut parameters = Vec::new();
    for _ in 0..limit {
        match try_parse_parameter(cursor, ctx, depth)? {
            Some(parameter) => parameters.push(parameter),
            None => break,
        }
    }
    Ok(parameters)
}

/// Attempt one parameter from a checkpoint
///
/// `Ok(None)` means the bytes are not a parameter; the cursor is rewound.
pub fn try_parse_parameter(
    cursor: &mut ByteCursor<'_>,
    ctx: &DecodeContext<'_>,
    depth: usize,
) -> Result<Option<Parameter>> {
    let checkpoint = cursor.position();

    match parse_parameter(cursor, ctx, depth) {
        Ok(parameter) => Ok(Some(parameter)),
        Err(Abandon::Mismatch) => {
            trace!("No parameter at {}, rewinding", checkpoint);
            cursor.set_position(checkpoint)?;
            Ok(None)
        }
        Err(Abandon::Fatal(e)) => Err(e),
    }
}

fn parse_parameter(
    cursor: &mut ByteCursor<'_>,
    ctx: &DecodeContext<'_>,
    depth: usize,
) -> std::result::Result<Parameter, Abandon> {
    let kind = ParameterKind::from_i32(cursor.read_i32()?).ok_or(Abandon::Mismatch)?;

    let value = cursor.read_cstring()?;
    if !is_plausible_value(kind, &value) {
        return Err(Abandon::Mismatch);
    }

    let call = match cursor.read_i32()? {
        0 => None,
        1 if kind == ParameterKind::FunctionCall => Some(parse_call(cursor, ctx, &value, depth)?),
        _ => return Err(Abandon::Mismatch),
    };

    let array_index = match cursor.read_i32()? {
        0 => None,
        1 => {
            let index = parse_parameters(cursor, ctx, 1, depth + 1)
                .map_err(Abandon::Fatal)?
                .pop()
                .ok_or(Abandon::Mismatch)?;
            Some(Box::new(index))
        }
        _ => return Err(Abandon::Mismatch),
    };

    Ok(Parameter {
        kind,
        value,
        call,
        array_index,
    })
}

/// Parse the inline call following an is-call flag
fn parse_call(
    cursor: &mut ByteCursor<'_>,
    ctx: &DecodeContext<'_>,
    value: &str,
    depth: usize,
) -> std::result::Result<FunctionCall, Abandon> {
    let kind = FunctionKind::from_i32(cursor.read_i32()?).ok_or(Abandon::Mismatch)?;

    let name = cursor.read_cstring()?;
    if kind == FunctionKind::Call && name != value {
        return Err(Abandon::Mismatch);
    }

    if cursor.read_i32()? != CALL_BEGIN {
        return Err(Abandon::Mismatch);
    }

    let limit = ctx.schema.call_arity(&name);
    let parameters = parse_parameters(cursor, ctx, limit, depth + 1).map_err(Abandon::Fatal)?;

    if cursor.read_i32()? != CALL_END {
        return Err(Abandon::Mismatch);
    }

    Ok(FunctionCall {
        kind,
        name,
        parameters,
    })
}

/// Cheap sanity checks that reject bytes which cannot be a parameter value
pub(crate) fn is_plausible_value(kind: ParameterKind, value: &str) -> bool {
    let by_reference = matches!(kind, ParameterKind::Preset | ParameterKind::Variable);
    if by_reference && value.is_empty() {
        return false;
    }

    let mut chars = value.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if (c as u32) < 0x20 {
            return false;
        }
    }

    !(kind == ParameterKind::Preset && value.contains(' '))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapkit_binary::ByteWriter;

    fn write_plain(w: &mut ByteWriter, kind: ParameterKind, value: &str) {
        w.write_i32(kind.as_i32());
        w.write_cstring(value);
        w.write_i32(0);
        w.write_i32(0);
    }

    fn context(schema: &SchemaCatalog) -> DecodeContext<'_> {
        DecodeContext::new(schema, 64)
    }

    #[test]
    fn test_backtracking_stops_after_valid_parameters() {
        let mut w = ByteWriter::new();
        write_plain(&mut w, ParameterKind::Preset, "Player00");
        write_plain(&mut w, ParameterKind::Variable, "udg_Hero");
        let end_of_second = w.position();
        // Garbage: valid kind, then a truncated string
        w.write_i32(3);
        w.write_bytes(b"trunc");

        let data = w.into_vec();
        let schema = SchemaCatalog::empty();
        let mut cursor = ByteCursor::new(&data);

        let params = parse_parameters(&mut cursor, &context(&schema), 20, 0).unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params[0], Parameter::preset("Player00"));
        assert_eq!(params[1], Parameter::variable("udg_Hero"));
        assert_eq!(cursor.position(), end_of_second);
    }

    #[test]
    fn test_backtracking_on_bad_discriminants() {
        let schema = SchemaCatalog::empty();

        for garbage in [[7, 0, 0, 0], [0xFF, 0xFF, 0xFF, 0xFF]] {
            let mut w = ByteWriter::new();
            write_plain(&mut w, ParameterKind::StringLiteral, "hello");
            let end = w.position();
            w.write_bytes(&garbage);
            w.write_cstring("x");

            let data = w.into_vec();
            let mut cursor = ByteCursor::new(&data);
            let params = parse_parameters(&mut cursor, &context(&schema), 20, 0).unwrap();
            assert_eq!(params.len(), 1);
            assert_eq!(cursor.position(), end);
        }
    }

    #[test]
    fn test_value_validation() {
        assert!(!is_plausible_value(ParameterKind::Preset, ""));
        assert!(!is_plausible_value(ParameterKind::Variable, ""));
        assert!(is_plausible_value(ParameterKind::StringLiteral, ""));
        assert!(!is_plausible_value(ParameterKind::StringLiteral, "\u{1}"));
        assert!(is_plausible_value(ParameterKind::StringLiteral, "\u{1}ab"));
        assert!(!is_plausible_value(ParameterKind::Preset, "Player 00"));
        assert!(is_plausible_value(ParameterKind::StringLiteral, "Hello World"));
    }

    #[test]
    fn test_call_with_array_index() {
        let schema = SchemaCatalog::parse("[TriggerCalls]\nGetUnitLoc=0,1,location,unit\n").unwrap();

        let mut w = ByteWriter::new();
        w.write_i32(ParameterKind::FunctionCall.as_i32());
        w.write_cstring("GetUnitLoc");
        w.write_i32(1);
        w.write_i32(FunctionKind::Call.as_i32());
        w.write_cstring("GetUnitLoc");
        w.write_i32(CALL_BEGIN);
        // udg_Units[1]
        w.write_i32(ParameterKind::Variable.as_i32());
        w.write_cstring("udg_Units");
        w.write_i32(0);
        w.write_i32(1);
        write_plain(&mut w, ParameterKind::Preset, "1");
        w.write_i32(CALL_END);
        w.write_i32(0);

        let data = w.into_vec();
        let mut cursor = ByteCursor::new(&data);
        let param = try_parse_parameter(&mut cursor, &context(&schema), 0).unwrap().unwrap();

        let expected = Parameter::call(
            FunctionCall::new(FunctionKind::Call, "GetUnitLoc")
                .with_parameter(Parameter::variable("udg_Units").with_index(Parameter::preset("1"))),
        );
        assert_eq!(param, expected);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_call_name_mismatch_is_rejected() {
        let schema = SchemaCatalog::empty();

        let mut w = ByteWriter::new();
        w.write_i32(ParameterKind::FunctionCall.as_i32());
        w.write_cstring("GetUnitLoc");
        w.write_i32(1);
        w.write_i32(FunctionKind::Call.as_i32());
        w.write_cstring("GetTriggerUnit");
        w.write_i32(CALL_BEGIN);
        w.write_i32(CALL_END);
        w.write_i32(0);

        let data = w.into_vec();
        let mut cursor = ByteCursor::new(&data);
        assert!(try_parse_parameter(&mut cursor, &context(&schema), 0).unwrap().is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_call_flag_requires_function_call_kind() {
        let schema = SchemaCatalog::empty();

        let mut w = ByteWriter::new();
        w.write_i32(ParameterKind::Preset.as_i32());
        w.write_cstring("PlayerNA");
        w.write_i32(1);

        let data = w.into_vec();
        let mut cursor = ByteCursor::new(&data);
        assert!(try_parse_parameter(&mut cursor, &context(&schema), 0).unwrap().is_none());
    }

    #[test]
    fn test_array_index_depth_guard_is_fatal() {
        let schema = SchemaCatalog::empty();

        // x[x[x[...]]] nested deeper than the limit
        let mut w = ByteWriter::new();
        for _ in 0..10 {
            w.write_i32(ParameterKind::Variable.as_i32());
            w.write_cstring("x");
            w.write_i32(0);
            w.write_i32(1);
        }

        let data = w.into_vec();
        let mut cursor = ByteCursor::new(&data);
        let ctx = DecodeContext::new(&schema, 4);
        let err = parse_parameters(&mut cursor, &ctx, 1, 0).unwrap_err();
        assert!(matches!(err, TriggerError::DepthExceeded { depth: 5, max: 4 }));
    }

    #[test]
    fn test_zero_argument_call_at_depth_limit() {
        let schema = SchemaCatalog::parse("[TriggerCalls]\nGetPlayersAll=0,0,force\n").unwrap();

        let mut w = ByteWriter::new();
        w.write_i32(ParameterKind::FunctionCall.as_i32());
        w.write_cstring("GetPlayersAll");
        w.write_i32(1);
        w.write_i32(FunctionKind::Call.as_i32());
        w.write_cstring("GetPlayersAll");
        w.write_i32(CALL_BEGIN);
        w.write_i32(CALL_END);
        w.write_i32(0);

        let data = w.into_vec();
        let mut cursor = ByteCursor::new(&data);
        let ctx = DecodeContext::new(&schema, 1);
        let params = parse_parameters(&mut cursor, &ctx, 1, 1).unwrap();

        assert_eq!(params, vec![Parameter::call(FunctionCall::new(FunctionKind::Call, "GetPlayersAll"))]);
        assert!(cursor.is_at_end());
    }

    #[test]
    fn test_invalid_enabled_flag_is_fatal() {
        let schema = SchemaCatalog::empty();

        let mut w = ByteWriter::new();
        w.write_i32(1);
        w.write_i32(FunctionKind::Action.as_i32());
        w.write_cstring("DoNothing");
        w.write_i32(2);

        let data = w.into_vec();
        let mut cursor = ByteCursor::new(&data);
        let err = parse_functions(&mut cursor, &context(&schema), false, 0).unwrap_err();
        assert!(matches!(err, TriggerError::InvalidEnabled { value: 2, .. }));
        assert!(err.is_structural());
    }

    #[test]
    fn test_function_underrun_is_fatal() {
        let schema = SchemaCatalog::empty();

        let mut w = ByteWriter::new();
        w.write_i32(1);
        w.write_i32(FunctionKind::Event.as_i32());

        let data = w.into_vec();
        let mut cursor = ByteCursor::new(&data);
        let err = parse_functions(&mut cursor, &context(&schema), false, 0).unwrap_err();
        assert!(matches!(err, TriggerError::Binary(_)));
    }

    #[test]
    fn test_nested_block() {
        let schema = SchemaCatalog::parse("[TriggerActions]\nIfThenElseMultiple=0,nothing\nDoNothing=0,nothing\n").unwrap();

        let mut w = ByteWriter::new();
        w.write_i32(1);
        w.write_i32(FunctionKind::Action.as_i32());
        w.write_cstring("IfThenElseMultiple");
        w.write_i32(1);
        // one child in block 2
        w.write_i32(1);
        w.write_i32(FunctionKind::Action.as_i32());
        w.write_i32(2);
        w.write_cstring("DoNothing");
        w.write_i32(0);
        w.write_i32(0);

        let data = w.into_vec();
        let mut cursor = ByteCursor::new(&data);
        let functions = parse_functions(&mut cursor, &context(&schema), false, 0).unwrap();

        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].category, None);
        assert_eq!(functions[0].children.len(), 1);

        let child = &functions[0].children[0];
        assert_eq!(child.category, Some(2));
        assert_eq!(child.name, "DoNothing");
        assert!(!child.enabled);
        assert!(cursor.is_at_end());
    }
}

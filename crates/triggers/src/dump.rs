//! Human-readable document dump
//!
//! Diagnostic output only; the text is not meant to be parsed back.

use crate::document::*;
use mapkit_binary::RawCode;
use std::fmt::{self, Write};

const INDENT: &str = "  ";

impl TriggerDocument {
    /// Render the document as indented text
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TriggerDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Categories ({})", self.categories.len())?;
        for category in &self.categories {
            write!(f, "{}[{}] {}", INDENT, category.index, category.name)?;
            if category.is_comment {
                f.write_str(" (comment)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Unknown: {}", self.unknown)?;

        writeln!(f, "Variables ({})", self.variables.len())?;
        for variable in &self.variables {
            write!(f, "{}{} {}", INDENT, variable.var_type(), variable.name())?;
            if variable.is_array() {
                write!(f, "[{}]", variable.array_size())?;
            }
            if variable.is_initialized() {
                write!(f, " = {}", variable.initial_value())?;
            }
            writeln!(f)?;
        }

        writeln!(f, "Triggers ({})", self.triggers.len())?;
        for trigger in &self.triggers {
            write_trigger(f, trigger)?;
        }
        Ok(())
    }
}

fn write_trigger(f: &mut impl Write, trigger: &Trigger) -> fmt::Result {
    write!(f, "{}Trigger \"{}\" (category {}", INDENT, trigger.name(), trigger.category_index())?;
    if trigger.is_comment() {
        f.write_str(", comment")?;
    } else {
        f.write_str(if trigger.is_enabled() { ", enabled" } else { ", disabled" })?;
        if !trigger.initial_state() {
            f.write_str(", initially off")?;
        }
        if trigger.is_custom_text() {
            f.write_str(", custom text")?;
        }
        if trigger.runs_on_map_init() {
            f.write_str(", map init")?;
        }
    }
    writeln!(f, ")")?;

    if !trigger.description().is_empty() {
        writeln!(f, "{}// {}", INDENT.repeat(2), trigger.description())?;
    }

    for function in trigger.functions() {
        write_function(f, function, 2)?;
    }
    Ok(())
}

fn write_function(f: &mut impl Write, function: &Function, level: usize) -> fmt::Result {
    let pad = INDENT.repeat(level);
    write!(f, "{}{}", pad, function.kind)?;
    if let Some(block) = function.category {
        write!(f, "[{}]", block)?;
    }
    write!(f, " {}", function.name)?;
    if !function.enabled {
        f.write_str(" (disabled)")?;
    }
    writeln!(f)?;

    for parameter in &function.parameters {
        write_parameter(f, parameter, level + 1, None)?;
    }
    for child in &function.children {
        write_function(f, child, level + 1)?;
    }
    Ok(())
}

fn write_parameter(f: &mut impl Write, parameter: &Parameter, level: usize, label: Option<&str>) -> fmt::Result {
    let pad = INDENT.repeat(level);
    write!(f, "{}", pad)?;
    if let Some(label) = label {
        write!(f, "{} ", label)?;
    }
    write!(f, "{}: {:?}", parameter.kind, parameter.value)?;

    if let Some(codes) = parameter.raw_codes() {
        let tags: Vec<String> = codes.into_iter().map(|c| RawCode(c).to_string()).collect();
        write!(f, " <raw codes: {}>", tags.join(" "))?;
    }
    writeln!(f)?;

    if let Some(call) = &parameter.call {
        writeln!(f, "{}{}{} {}", pad, INDENT, call.kind, call.name)?;
        for nested in &call.parameters {
            write_parameter(f, nested, level + 2, None)?;
        }
    }

    if let Some(index) = &parameter.array_index {
        write_parameter(f, index, level + 1, Some("[index]"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dump_layout() {
        let mut doc = TriggerDocument::new();
        doc.categories.push(Category::new(0, "Initialization"));

        let mut var = Variable::new("udg_Units", "unit");
        var.set_array(true);
        var.set_array_size(4);
        doc.variables.push(var);

        let mut trigger = Trigger::new("Melee Initialization").unwrap();
        trigger.set_description("Default melee game initialization");
        trigger.push_function(Function::new(FunctionKind::Event, "MapInitializationEvent"));
        trigger.push_function(
            Function::new(FunctionKind::Action, "CreateNUnitsAtLoc")
                .with_parameter(Parameter::string("hfoo"))
                .with_parameter(Parameter::variable("udg_Units").with_index(Parameter::preset("1"))),
        );
        doc.triggers.push(trigger);

        let text = doc.dump();
        let expected = "\
Categories (1)
  [0] Initialization
Unknown: 2
Variables (1)
  unit udg_Units[4]
Triggers (1)
  Trigger \"Melee Initialization\" (category 0, enabled)
    // Default melee game initialization
    Event MapInitializationEvent
    Action CreateNUnitsAtLoc
      String: \"hfoo\" <raw codes: hfoo>
      Variable: \"udg_Units\"
        [index] Preset: \"1\"
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_dump_comment_and_call() {
        let mut doc = TriggerDocument::new();
        let mut note = Trigger::new("Readme").unwrap();
        note.set_comment(true);
        note.push_function(
            Function::new(FunctionKind::Action, "IfThenElseMultiple").with_child(
                Function::nested(FunctionKind::Action, 2, "RemoveLocation").with_parameter(Parameter::call(
                    FunctionCall::new(FunctionKind::Call, "GetUnitLoc"),
                )),
            ),
        );
        doc.triggers.push(note);

        let text = doc.dump();
        assert!(text.contains("Trigger \"Readme\" (category 0, comment)"));
        assert!(text.contains("      Action[2] RemoveLocation\n"));
        assert!(text.contains("        FunctionCall: \"GetUnitLoc\"\n          Call GetUnitLoc\n"));
    }
}

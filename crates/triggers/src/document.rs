//! Trigger document model
//!
//! The decoded tree is strictly hierarchical: a [`TriggerDocument`] owns its
//! triggers, triggers own their functions, functions own their parameters,
//! and parameters may own nested calls and array indices.

use crate::{Result, TriggerError};
use mapkit_binary::rawcode;
use serde::Serialize;
use std::fmt;

/// Default value of the field that follows the category list
pub const DEFAULT_UNKNOWN: i32 = 2;

/// Kind of an ECA function or inline call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FunctionKind {
    Event = 0,
    Condition = 1,
    Action = 2,
    Call = 3,
}

impl FunctionKind {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(FunctionKind::Event),
            1 => Some(FunctionKind::Condition),
            2 => Some(FunctionKind::Action),
            3 => Some(FunctionKind::Call),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for FunctionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FunctionKind::Event => "Event",
            FunctionKind::Condition => "Condition",
            FunctionKind::Action => "Action",
            FunctionKind::Call => "Call",
        };
        f.write_str(name)
    }
}

/// Kind of a function parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParameterKind {
    Preset = 0,
    Variable = 1,
    FunctionCall = 2,
    StringLiteral = 3,
}

impl ParameterKind {
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ParameterKind::Preset),
            1 => Some(ParameterKind::Variable),
            2 => Some(ParameterKind::FunctionCall),
            3 => Some(ParameterKind::StringLiteral),
            _ => None,
        }
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::Preset => "Preset",
            ParameterKind::Variable => "Variable",
            ParameterKind::FunctionCall => "FunctionCall",
            ParameterKind::StringLiteral => "String",
        };
        f.write_str(name)
    }
}

/// A trigger category (folder) in the editor tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Index referenced by `Trigger::category_index`
    pub index: i32,

    /// Display name
    pub name: String,

    /// Comment categories hold no triggers of their own
    pub is_comment: bool,
}

impl Category {
    pub fn new(index: i32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            is_comment: false,
        }
    }
}

/// A global variable declaration
///
/// Array size is clamped to at least 1 and the initial value is empty
/// whenever the variable is not initialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Variable {
    name: String,
    var_type: String,
    is_array: bool,
    array_size: i32,
    initialized: bool,
    initial_value: String,
}

impl Variable {
    /// Create an uninitialized, non-array variable
    pub fn new(name: impl Into<String>, var_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type: var_type.into(),
            is_array: false,
            array_size: 1,
            initialized: false,
            initial_value: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn var_type(&self) -> &str {
        &self.var_type
    }

    pub fn set_var_type(&mut self, var_type: impl Into<String>) {
        self.var_type = var_type.into();
    }

    pub fn is_array(&self) -> bool {
        self.is_array
    }

    pub fn set_array(&mut self, is_array: bool) {
        self.is_array = is_array;
    }

    pub fn array_size(&self) -> i32 {
        self.array_size
    }

    /// Set the array size, clamped to at least 1
    pub fn set_array_size(&mut self, size: i32) {
        self.array_size = size.max(1);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Turning initialization off clears the initial value
    pub fn set_initialized(&mut self, initialized: bool) {
        self.initialized = initialized;
        if !initialized {
            self.initial_value.clear();
        }
    }

    pub fn initial_value(&self) -> &str {
        &self.initial_value
    }

    /// Ignored unless the variable is initialized
    pub fn set_initial_value(&mut self, value: impl Into<String>) {
        if self.initialized {
            self.initial_value = value.into();
        }
    }
}

/// A trigger: metadata plus its top-level ECA functions
///
/// Comment triggers carry no behavior: while `is_comment` is set the trigger
/// is always enabled, not custom text, initially on and not run at map init.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trigger {
    name: String,
    description: String,
    is_comment: bool,
    enabled: bool,
    is_custom_text: bool,
    initial_state: bool,
    run_on_map_init: bool,
    category_index: i32,
    functions: Vec<Function>,
}

impl Trigger {
    /// Create an enabled, initially-on trigger
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TriggerError::EmptyName);
        }

        Ok(Self {
            name,
            description: String::new(),
            is_comment: false,
            enabled: true,
            is_custom_text: false,
            initial_state: true,
            run_on_map_init: false,
            category_index: 0,
            functions: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.is_empty() {
            return Err(TriggerError::EmptyName);
        }
        self.name = name;
        Ok(())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn is_comment(&self) -> bool {
        self.is_comment
    }

    /// Marking a trigger as a comment resets every behavior flag
    pub fn set_comment(&mut self, is_comment: bool) {
        self.is_comment = is_comment;
        if is_comment {
            self.enabled = true;
            self.is_custom_text = false;
            self.initial_state = true;
            self.run_on_map_init = false;
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// No effect on comment triggers
    pub fn set_enabled(&mut self, enabled: bool) {
        if !self.is_comment {
            self.enabled = enabled;
        }
    }

    pub fn is_custom_text(&self) -> bool {
        self.is_custom_text
    }

    /// No effect on comment triggers
    pub fn set_custom_text(&mut self, is_custom_text: bool) {
        if !self.is_comment {
            self.is_custom_text = is_custom_text;
        }
    }

    /// Whether the trigger starts switched on
    pub fn initial_state(&self) -> bool {
        self.initial_state
    }

    /// No effect on comment triggers
    pub fn set_initial_state(&mut self, initially_on: bool) {
        if !self.is_comment {
            self.initial_state = initially_on;
        }
    }

    pub fn runs_on_map_init(&self) -> bool {
        self.run_on_map_init
    }

    /// No effect on comment triggers
    pub fn set_run_on_map_init(&mut self, run: bool) {
        if !self.is_comment {
            self.run_on_map_init = run;
        }
    }

    pub fn category_index(&self) -> i32 {
        self.category_index
    }

    pub fn set_category_index(&mut self, index: i32) {
        self.category_index = index;
    }

    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut Vec<Function> {
        &mut self.functions
    }

    pub fn push_function(&mut self, function: Function) {
        self.functions.push(function);
    }
}

/// An ECA function or a nested function inside a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Function {
    pub kind: FunctionKind,

    /// Block index; only present on functions nested in a child block
    pub category: Option<i32>,

    pub name: String,

    pub enabled: bool,

    /// Parameters as stored; may be shorter than the schema arity
    pub parameters: Vec<Parameter>,

    /// Nested functions (e.g. the branches of an if-block)
    pub children: Vec<Function>,
}

impl Function {
    /// Create an enabled top-level function
    pub fn new(kind: FunctionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            category: None,
            name: name.into(),
            enabled: true,
            parameters: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Create an enabled function for a child block
    pub fn nested(kind: FunctionKind, category: i32, name: impl Into<String>) -> Self {
        Self {
            category: Some(category),
            ..Self::new(kind, name)
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_child(mut self, child: Function) -> Self {
        self.children.push(child);
        self
    }

    pub fn is_nested(&self) -> bool {
        self.category.is_some()
    }
}

/// An inline function call used as a parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionCall {
    pub kind: FunctionKind,
    pub name: String,
    pub parameters: Vec<Parameter>,
}

impl FunctionCall {
    pub fn new(kind: FunctionKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
}

/// A function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub kind: ParameterKind,
    pub value: String,

    /// Inline call, only meaningful for `ParameterKind::FunctionCall`
    pub call: Option<FunctionCall>,

    /// Index expression for array variables
    pub array_index: Option<Box<Parameter>>,
}

impl Parameter {
    pub fn new(kind: ParameterKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
            call: None,
            array_index: None,
        }
    }

    pub fn preset(value: impl Into<String>) -> Self {
        Self::new(ParameterKind::Preset, value)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(ParameterKind::Variable, name)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(ParameterKind::StringLiteral, value)
    }

    /// A `FunctionCall` parameter whose value is the call's name
    pub fn call(call: FunctionCall) -> Self {
        Self {
            kind: ParameterKind::FunctionCall,
            value: call.name.clone(),
            call: Some(call),
            array_index: None,
        }
    }

    pub fn with_index(mut self, index: Parameter) -> Self {
        self.array_index = Some(Box::new(index));
        self
    }

    /// Identifiers packed in the value, if it is a comma list of raw codes
    pub fn raw_codes(&self) -> Option<Vec<i32>> {
        match self.kind {
            ParameterKind::Preset | ParameterKind::StringLiteral => rawcode::decode_list(&self.value),
            _ => None,
        }
    }
}

/// A decoded trigger document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerDocument {
    pub categories: Vec<Category>,

    /// Field following the category list, kept verbatim
    pub unknown: i32,

    pub variables: Vec<Variable>,

    pub triggers: Vec<Trigger>,
}

impl Default for TriggerDocument {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            unknown: DEFAULT_UNKNOWN,
            variables: Vec::new(),
            triggers: Vec::new(),
        }
    }
}

impl TriggerDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_trigger(&self, name: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|t| t.name() == name)
    }

    pub fn find_variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name() == name)
    }

    pub fn triggers_in_category(&self, index: i32) -> impl Iterator<Item = &Trigger> {
        self.triggers.iter().filter(move |t| t.category_index() == index)
    }

    /// Total number of functions, nested blocks included
    pub fn function_count(&self) -> usize {
        fn count(functions: &[Function]) -> usize {
            functions.iter().map(|f| 1 + count(&f.children)).sum()
        }

        self.triggers.iter().map(|t| count(t.functions())).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_coercion() {
        let mut trigger = Trigger::new("Notes").unwrap();
        trigger.set_enabled(false);
        trigger.set_custom_text(true);
        trigger.set_initial_state(false);
        trigger.set_run_on_map_init(true);

        trigger.set_comment(true);

        assert!(trigger.is_comment());
        assert!(trigger.is_enabled());
        assert!(!trigger.is_custom_text());
        assert!(trigger.initial_state());
        assert!(!trigger.runs_on_map_init());

        // Behavior stays locked while it is a comment
        trigger.set_enabled(false);
        assert!(trigger.is_enabled());

        trigger.set_comment(false);
        trigger.set_enabled(false);
        assert!(!trigger.is_enabled());
    }

    #[test]
    fn test_empty_trigger_name() {
        assert!(matches!(Trigger::new(""), Err(TriggerError::EmptyName)));

        let mut trigger = Trigger::new("Init").unwrap();
        assert!(trigger.set_name("").is_err());
        assert_eq!(trigger.name(), "Init");
    }

    #[test]
    fn test_variable_invariants() {
        let mut var = Variable::new("udg_Heroes", "unit");
        var.set_array_size(0);
        assert_eq!(var.array_size(), 1);
        var.set_array_size(-5);
        assert_eq!(var.array_size(), 1);
        var.set_array_size(12);
        assert_eq!(var.array_size(), 12);

        var.set_initial_value("ignored");
        assert_eq!(var.initial_value(), "");

        var.set_initialized(true);
        var.set_initial_value("hfoo");
        assert_eq!(var.initial_value(), "hfoo");

        var.set_initialized(false);
        assert_eq!(var.initial_value(), "");
    }

    #[test]
    fn test_kind_discriminants() {
        assert_eq!(FunctionKind::from_i32(3), Some(FunctionKind::Call));
        assert_eq!(FunctionKind::from_i32(4), None);
        assert_eq!(FunctionKind::Action.as_i32(), 2);

        assert_eq!(ParameterKind::from_i32(-1), None);
        assert_eq!(ParameterKind::from_i32(2), Some(ParameterKind::FunctionCall));
        assert_eq!(ParameterKind::StringLiteral.as_i32(), 3);
    }

    #[test]
    fn test_parameter_raw_codes() {
        let units = Parameter::string("hfoo,hpea");
        assert_eq!(
            units.raw_codes(),
            Some(vec![i32::from_be_bytes(*b"hfoo"), i32::from_be_bytes(*b"hpea")])
        );

        assert_eq!(Parameter::string("Hello").raw_codes(), None);
        assert_eq!(Parameter::variable("hfoo").raw_codes(), None);
    }

    #[test]
    fn test_document_queries() {
        let mut doc = TriggerDocument::new();
        assert_eq!(doc.unknown, 2);

        let mut init = Trigger::new("Init").unwrap();
        init.set_category_index(1);
        init.push_function(
            Function::new(FunctionKind::Action, "IfThenElseMultiple")
                .with_child(Function::nested(FunctionKind::Action, 1, "DoNothing")),
        );
        doc.triggers.push(init);
        doc.triggers.push(Trigger::new("Other").unwrap());

        assert!(doc.find_trigger("Init").is_some());
        assert!(doc.find_trigger("Missing").is_none());
        assert_eq!(doc.triggers_in_category(1).count(), 1);
        assert_eq!(doc.function_count(), 2);
    }
}

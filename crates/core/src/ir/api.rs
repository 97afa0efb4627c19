//! Compiled-operation IR.
//!
//! This module defines the intermediate representation produced by the
//! compiler and consumed by codegen:
//! - CompiledOperation: one engine operation, ready to render
//! - CompiledInput / CompiledAttribute: its parameters
//! - AttrBinding: how an attribute reaches the native op handle

use super::docs::Documentation;

/// Scalar attribute kind. `list(kind)` wraps one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// `func`
    Func,
    /// `shape`
    Shape,
    /// `int`
    Int,
    /// `float`
    Float,
    /// `string`
    String,
    /// `type`
    Type,
    /// `bool`
    Bool,
    /// `tensor`
    Tensor,
}

/// Native setter invoked on the op handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Setter {
    Function,
    FunctionList,
    Shape,
    ShapeList,
    Int,
    IntList,
    Float,
    FloatList,
    String,
    StringList,
    Type,
    TypeList,
    Bool,
    BoolList,
    Tensor,
}

impl Setter {
    /// Method name on the native op handle.
    pub fn method(self) -> &'static str {
        match self {
            Setter::Function => "setAttrFunction",
            Setter::FunctionList => "setAttrFunctionList",
            Setter::Shape => "setAttrShape",
            Setter::ShapeList => "setAttrShapeList",
            Setter::Int => "setAttrInt",
            Setter::IntList => "setAttrIntList",
            Setter::Float => "setAttrFloat",
            Setter::FloatList => "setAttrFloatList",
            Setter::String => "setAttrString",
            Setter::StringList => "setAttrStringList",
            Setter::Type => "setAttrType",
            Setter::TypeList => "setAttrTypeList",
            Setter::Bool => "setAttrBool",
            Setter::BoolList => "setAttrBoolList",
            Setter::Tensor => "setAttrTensor",
        }
    }
}

/// How an attribute value is bound to the op handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrBinding {
    /// Pass the caller-supplied parameter to `setter`.
    Param {
        /// Native setter.
        setter: Setter,
        /// Parameter variable holding the value.
        var: String,
    },
    /// Set an int attribute to the runtime length of a variadic input.
    LengthOf {
        /// Variable name of the linked input.
        input_var: String,
    },
}

/// Rendered default of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultValue {
    /// Host-language literal substituted when the caller omits the value.
    pub literal: String,
    /// Human-readable form for the doc comment.
    pub doc: String,
}

/// One classified attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAttribute {
    /// Name as declared in the registry; used when binding.
    pub name: String,
    /// Host-safe parameter name.
    pub var_name: String,
    /// Scalar kind (the inner kind for lists).
    pub kind: AttrKind,
    /// Whether the declared kind was `list(...)`.
    pub is_list: bool,
    /// Host-language type annotation, e.g. `number[]`.
    pub host_type: String,
    /// Native type annotation, e.g. `int64_t`, when one exists.
    pub foreign_type: Option<String>,
    /// Default, present only when eligible.
    pub default: Option<DefaultValue>,
    /// Sorts after required attributes: a declared default on a scalar that
    /// is not a shape or tensor, or on a count attribute.
    pub optional: bool,
    /// Count attribute computed from an input; never a parameter.
    pub derived: bool,
    /// Binding statement description.
    pub binding: AttrBinding,
}

/// One input parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInput {
    /// Name as declared in the registry; used for doc lookup.
    pub name: String,
    /// Host-safe parameter name.
    pub var_name: String,
    /// Takes a sequence of wrapped values.
    pub variadic: bool,
}

impl CompiledInput {
    /// Host-language type annotation.
    pub fn host_type(&self) -> &'static str {
        if self.variadic {
            "tfl.Tensor[]"
        } else {
            "tfl.Tensor"
        }
    }
}

/// Shape of an operation's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputArity {
    /// No outputs; results are discarded.
    None,
    /// Exactly one non-variadic output.
    Single,
    /// Several outputs, or one variadic output.
    Many,
}

/// One operation, fully resolved and ready for codegen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledOperation {
    /// Registry name, passed to the native op constructor.
    pub op_name: String,
    /// Normalized host function name.
    pub fn_name: String,
    /// Inputs in declared order.
    pub inputs: Vec<CompiledInput>,
    /// Attributes, required first then defaulted, including derived ones.
    pub attrs: Vec<CompiledAttribute>,
    /// Segmented documentation.
    pub doc: Documentation,
    /// Result shape.
    pub arity: OutputArity,
}

impl CompiledOperation {
    /// Attributes the caller supplies, in signature order.
    pub fn attr_params(&self) -> impl Iterator<Item = &CompiledAttribute> {
        self.attrs.iter().filter(|a| !a.derived)
    }

    /// Full parameter list: inputs then attribute parameters.
    pub fn params(&self) -> Vec<String> {
        self.inputs
            .iter()
            .map(|i| i.var_name.clone())
            .chain(self.attr_params().map(|a| a.var_name.clone()))
            .collect()
    }
}

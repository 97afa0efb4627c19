//! Attribute classification.
//!
//! Each registry attribute is classified by kind and list-ness, mapped to its
//! host and native type annotations, given a rendered default when eligible,
//! and paired with the setter that binds it to the op handle.

use std::collections::HashMap;

use super::api::{AttrBinding, AttrKind, CompiledAttribute, DefaultValue, Setter};
use super::naming::attr_var_name;
use crate::dtype::DataType;
use crate::error::{GenerateError, GenerateResult};
use crate::registry::{AttrValue, AttributeDefinition};

/// Element-type attribute inferred by the runtime from the inputs.
pub const ELEMENT_TYPE_ATTR: &str = "T";

/// Lua constant standing in for positive infinity in default literals.
pub const INFINITY_CONSTANT: &str = "float_infinity";

impl AttrKind {
    /// Parse a scalar kind string such as `int`.
    pub fn parse(kind: &str) -> Option<Self> {
        Some(match kind {
            "func" => AttrKind::Func,
            "shape" => AttrKind::Shape,
            "int" => AttrKind::Int,
            "float" => AttrKind::Float,
            "string" => AttrKind::String,
            "type" => AttrKind::Type,
            "bool" => AttrKind::Bool,
            "tensor" => AttrKind::Tensor,
            _ => return None,
        })
    }

    /// Lua type annotation of a scalar value.
    pub fn host_type(self) -> &'static str {
        match self {
            AttrKind::Func => "tfe.TFEOp",
            AttrKind::Shape => "number[]",
            AttrKind::Int | AttrKind::Float => "number",
            AttrKind::String => "string",
            AttrKind::Type => "number|string",
            AttrKind::Bool => "boolean",
            AttrKind::Tensor => "tfl.Tensor",
        }
    }

    /// Native type annotation of a scalar value, if it has a useful one.
    pub fn foreign_type(self) -> Option<&'static str> {
        match self {
            AttrKind::Shape => Some("int64_t[]"),
            AttrKind::Int => Some("int64_t"),
            AttrKind::Float => Some("float"),
            AttrKind::Type => Some("TF_DataType"),
            AttrKind::Func | AttrKind::String | AttrKind::Bool | AttrKind::Tensor => None,
        }
    }

    /// Setter binding a value of this kind; `None` where no list form exists.
    pub fn setter(self, is_list: bool) -> Option<Setter> {
        Some(match (self, is_list) {
            (AttrKind::Func, false) => Setter::Function,
            (AttrKind::Func, true) => Setter::FunctionList,
            (AttrKind::Shape, false) => Setter::Shape,
            (AttrKind::Shape, true) => Setter::ShapeList,
            (AttrKind::Int, false) => Setter::Int,
            (AttrKind::Int, true) => Setter::IntList,
            (AttrKind::Float, false) => Setter::Float,
            (AttrKind::Float, true) => Setter::FloatList,
            (AttrKind::String, false) => Setter::String,
            (AttrKind::String, true) => Setter::StringList,
            (AttrKind::Type, false) => Setter::Type,
            (AttrKind::Type, true) => Setter::TypeList,
            (AttrKind::Bool, false) => Setter::Bool,
            (AttrKind::Bool, true) => Setter::BoolList,
            (AttrKind::Tensor, false) => Setter::Tensor,
            (AttrKind::Tensor, true) => return None,
        })
    }

    /// Whether a scalar of this kind can carry a literal default.
    fn takes_default(self) -> bool {
        !matches!(self, AttrKind::Shape | AttrKind::Tensor | AttrKind::Func)
    }
}

/// Split `list(kind)` into (`kind`, true); anything else is (`kind`, false).
pub fn split_list_kind(kind: &str) -> (&str, bool) {
    match kind.strip_prefix("list(").and_then(|k| k.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (kind, false),
    }
}

/// Classify one attribute of operation `op_name`.
///
/// `count_refs` maps count-attribute names to the variable of the input whose
/// length they carry. Returns `Ok(None)` for the element-type attribute.
pub fn compile_attribute(
    op_name: &str,
    attr: &AttributeDefinition,
    count_refs: &HashMap<String, String>,
) -> GenerateResult<Option<CompiledAttribute>> {
    if attr.name == ELEMENT_TYPE_ATTR {
        return Ok(None);
    }

    let unsupported = || GenerateError::UnsupportedAttrKind {
        op: op_name.to_string(),
        attr: attr.name.clone(),
        kind: attr.kind.clone(),
    };

    let (kind_str, is_list) = split_list_kind(&attr.kind);
    let kind = AttrKind::parse(kind_str).ok_or_else(unsupported)?;
    let var_name = attr_var_name(&attr.name);

    let mut host_type = kind.host_type().to_string();
    let mut foreign_type = kind.foreign_type().map(str::to_string);
    if is_list {
        host_type = format!("{}[]", host_type.replace('|', "[]|"));
        foreign_type = foreign_type.map(|t| format!("{t}[]"));
    }

    let (derived, binding) = match count_refs.get(&attr.name) {
        Some(input_var) => (
            true,
            AttrBinding::LengthOf {
                input_var: input_var.clone(),
            },
        ),
        None => (
            false,
            AttrBinding::Param {
                setter: kind.setter(is_list).ok_or_else(unsupported)?,
                var: var_name.clone(),
            },
        ),
    };

    let optional = attr.default.is_some()
        && (derived || (!is_list && !matches!(kind, AttrKind::Shape | AttrKind::Tensor)));
    let default = match &attr.default {
        Some(value) if !derived && !is_list && kind.takes_default() => render_default(kind, value),
        _ => None,
    };

    Ok(Some(CompiledAttribute {
        name: attr.name.clone(),
        var_name,
        kind,
        is_list,
        host_type,
        foreign_type,
        default,
        optional,
        derived,
        binding,
    }))
}

/// Render a default as (literal, doc text). Values of a mismatched shape
/// (e.g. an opaque body on an int attribute) render as no default.
fn render_default(kind: AttrKind, value: &AttrValue) -> Option<DefaultValue> {
    let same = |text: String| {
        Some(DefaultValue {
            literal: text.clone(),
            doc: text,
        })
    };
    match (kind, value) {
        (AttrKind::Int, AttrValue::Int(i)) => same(i.to_string()),
        (AttrKind::Bool, AttrValue::Bool(b)) => same(b.to_string()),
        (AttrKind::String, AttrValue::String(s)) => same(format!("\"{}\"", escape_lua_string(s))),
        (AttrKind::Float, AttrValue::Float(f)) => same(format_float(*f)),
        (AttrKind::Type, AttrValue::Type(dt)) => Some(DefaultValue {
            literal: dt.code().to_string(),
            doc: format!("\"{}\"", dt.name().to_lowercase()),
        }),
        (AttrKind::Type, AttrValue::Int(code)) => DataType::from_code(*code).map(|dt| DefaultValue {
            literal: code.to_string(),
            doc: format!("\"{}\"", dt.name().to_lowercase()),
        }),
        _ => None,
    }
}

/// Escape a string for a double-quoted Lua literal.
pub fn escape_lua_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

/// Four-digit exponential notation with a signed, two-digit exponent
/// (`1.0000e+00`). Infinities use [`INFINITY_CONSTANT`].
pub fn format_float(f: f32) -> String {
    if f.is_nan() {
        return "(0/0)".to_string();
    }
    if f.is_infinite() {
        let sign = if f.is_sign_negative() { "-" } else { "" };
        return format!("{sign}{INFINITY_CONSTANT}");
    }
    let formatted = format!("{:.4e}", f64::from(f));
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

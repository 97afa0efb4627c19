//! Reader for the protobuf JSON mapping of `OpList`.
//!
//! Field names are camelCase per the JSON mapping; the snake_case proto names
//! are accepted as aliases. 64-bit integers may be encoded as strings.

use serde::Deserialize;

use super::{AttrValue, AttributeDefinition, ArgDef, OpList, OperationDefinition, non_empty};
use crate::dtype::DataType;
use crate::error::{GenerateError, GenerateResult};

#[derive(Debug, Deserialize)]
struct OpListJson {
    #[serde(default)]
    op: Vec<OpDefJson>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpDefJson {
    name: String,
    #[serde(default, alias = "input_arg")]
    input_arg: Vec<ArgJson>,
    #[serde(default, alias = "output_arg")]
    output_arg: Vec<ArgJson>,
    #[serde(default)]
    attr: Vec<AttrJson>,
    summary: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ArgJson {
    name: String,
    #[serde(rename = "type")]
    dtype: Option<String>,
    #[serde(alias = "type_attr")]
    type_attr: Option<String>,
    #[serde(alias = "number_attr")]
    number_attr: Option<String>,
    #[serde(alias = "type_list_attr")]
    type_list_attr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttrJson {
    name: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(alias = "default_value")]
    default_value: Option<AttrValueJson>,
}

#[derive(Debug, Deserialize)]
struct AttrValueJson {
    i: Option<IntJson>,
    f: Option<FloatJson>,
    b: Option<bool>,
    s: Option<String>,
    #[serde(rename = "type")]
    dtype: Option<String>,
    shape: Option<serde_json::Value>,
    tensor: Option<serde_json::Value>,
    func: Option<serde_json::Value>,
    list: Option<serde_json::Value>,
}

/// int64 fields are strings in the canonical mapping but numbers are common.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IntJson {
    Number(i64),
    Text(String),
}

/// Non-finite floats are the strings "Infinity", "-Infinity" and "NaN".
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FloatJson {
    Number(f32),
    Text(String),
}

/// Parse a JSON-encoded `OpList`.
pub fn parse_op_list(json: &str) -> GenerateResult<OpList> {
    let list: OpListJson = serde_json::from_str(json)?;
    let ops = list
        .op
        .into_iter()
        .map(op_from)
        .collect::<GenerateResult<Vec<_>>>()?;
    Ok(OpList { ops })
}

fn op_from(op: OpDefJson) -> GenerateResult<OperationDefinition> {
    let input_args = op
        .input_arg
        .into_iter()
        .map(arg_from)
        .collect::<GenerateResult<Vec<_>>>()?;
    let output_args = op
        .output_arg
        .into_iter()
        .map(arg_from)
        .collect::<GenerateResult<Vec<_>>>()?;
    let attrs = op
        .attr
        .into_iter()
        .map(attr_from)
        .collect::<GenerateResult<Vec<_>>>()?;
    Ok(OperationDefinition {
        name: op.name,
        input_args,
        output_args,
        attrs,
        summary: non_empty(op.summary),
        description: non_empty(op.description),
    })
}

fn arg_from(arg: ArgJson) -> GenerateResult<ArgDef> {
    let dtype = match non_empty(arg.dtype) {
        Some(name) => Some(dtype_from(&name)?),
        None => None,
    };
    Ok(ArgDef {
        name: arg.name,
        dtype,
        type_attr: non_empty(arg.type_attr),
        number_attr: non_empty(arg.number_attr),
        type_list_attr: non_empty(arg.type_list_attr),
    })
}

fn attr_from(attr: AttrJson) -> GenerateResult<AttributeDefinition> {
    let default = match attr.default_value {
        Some(value) => attr_value_from(value, &attr.name)?,
        None => None,
    };
    Ok(AttributeDefinition {
        name: attr.name,
        kind: attr.kind,
        default,
    })
}

fn attr_value_from(value: AttrValueJson, attr: &str) -> GenerateResult<Option<AttrValue>> {
    let parsed = if let Some(i) = value.i {
        let i = match i {
            IntJson::Number(n) => n,
            IntJson::Text(text) => text.parse().map_err(|_| invalid(attr, &text))?,
        };
        Some(AttrValue::Int(i))
    } else if let Some(f) = value.f {
        let f = match f {
            FloatJson::Number(n) => n,
            FloatJson::Text(text) => match text.as_str() {
                "Infinity" => f32::INFINITY,
                "-Infinity" => f32::NEG_INFINITY,
                "NaN" => f32::NAN,
                _ => text.parse().map_err(|_| invalid(attr, &text))?,
            },
        };
        Some(AttrValue::Float(f))
    } else if let Some(b) = value.b {
        Some(AttrValue::Bool(b))
    } else if let Some(s) = value.s {
        Some(AttrValue::String(s))
    } else if let Some(name) = value.dtype {
        Some(AttrValue::Type(dtype_from(&name)?))
    } else if value.shape.is_some()
        || value.tensor.is_some()
        || value.func.is_some()
        || value.list.is_some()
    {
        Some(AttrValue::Opaque)
    } else {
        None
    };
    Ok(parsed)
}

fn dtype_from(name: &str) -> GenerateResult<DataType> {
    DataType::from_proto_name(name).ok_or_else(|| GenerateError::UnknownDataType {
        name: name.to_string(),
    })
}

fn invalid(attr: &str, text: &str) -> GenerateError {
    GenerateError::RegistryParse {
        line: 0,
        column: 0,
        message: format!("invalid default '{text}' for attribute '{attr}'"),
    }
}

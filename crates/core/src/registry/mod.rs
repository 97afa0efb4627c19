//! Operation registry model.
//!
//! The registry is the engine's list of operation schemas. It is read once per
//! run, either from the protobuf text format the engine ships (`ops.pbtxt`)
//! or from the protobuf JSON mapping of the same message.

mod json;
mod pbtxt;

use crate::dtype::DataType;
use crate::error::{GenerateError, GenerateResult};

/// The whole registry, in file order.
#[derive(Debug, Clone, Default)]
pub struct OpList {
    /// Operation schemas.
    pub ops: Vec<OperationDefinition>,
}

/// Schema of one engine operation.
#[derive(Debug, Clone, Default)]
pub struct OperationDefinition {
    /// Framework-native name, e.g. `ConcatV2`.
    pub name: String,
    /// Inputs in declared order.
    pub input_args: Vec<InputArg>,
    /// Outputs in declared order.
    pub output_args: Vec<OutputArg>,
    /// Attributes in declared order.
    pub attrs: Vec<AttributeDefinition>,
    /// One-line summary from the registry, if any.
    pub summary: Option<String>,
    /// Long description from the registry, if any.
    pub description: Option<String>,
}

/// An input or output argument.
#[derive(Debug, Clone, Default)]
pub struct ArgDef {
    /// Argument name as declared.
    pub name: String,
    /// Fixed element type, when the argument is not polymorphic.
    pub dtype: Option<DataType>,
    /// Attribute naming the element type, e.g. `T`.
    pub type_attr: Option<String>,
    /// Attribute holding the length of this argument.
    pub number_attr: Option<String>,
    /// Attribute holding a heterogeneous type list for this argument.
    pub type_list_attr: Option<String>,
}

/// Input argument of an operation.
pub type InputArg = ArgDef;
/// Output argument of an operation.
pub type OutputArg = ArgDef;

impl ArgDef {
    /// Whether the argument takes a sequence of values.
    pub fn is_variadic(&self) -> bool {
        self.number_attr.is_some() || self.type_list_attr.is_some()
    }
}

/// A named configuration value of an operation.
#[derive(Debug, Clone, Default)]
pub struct AttributeDefinition {
    /// Attribute name.
    pub name: String,
    /// Kind string: a scalar kind like `int`, or `list(int)`.
    pub kind: String,
    /// Declared default, if any.
    pub default: Option<AttrValue>,
}

/// Default value of an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// `i` field.
    Int(i64),
    /// `f` field.
    Float(f32),
    /// `b` field.
    Bool(bool),
    /// `s` field, decoded lossily as UTF-8.
    String(String),
    /// `type` field.
    Type(DataType),
    /// Shape, tensor, function or list bodies; carried but never rendered.
    Opaque,
}

impl OpList {
    /// Parse the protobuf text format (`op { ... }` blocks).
    pub fn from_pbtxt(text: &str) -> GenerateResult<Self> {
        pbtxt::parse_op_list(text)
    }

    /// Parse the protobuf JSON mapping (`{"op": [...]}`).
    pub fn from_json(json: &str) -> GenerateResult<Self> {
        json::parse_op_list(json)
    }

    /// Find the single registry entry called `name`.
    pub fn find(&self, name: &str) -> GenerateResult<&OperationDefinition> {
        let mut matches = self.ops.iter().filter(|op| op.name == name);
        let found = matches
            .next()
            .ok_or_else(|| GenerateError::UnresolvedOperation {
                name: name.to_string(),
            })?;
        if matches.next().is_some() {
            return Err(GenerateError::DuplicateOperation {
                name: name.to_string(),
            });
        }
        Ok(found)
    }
}

/// Treat empty strings as absent, the way the wire format does.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn list(names: &[&str]) -> OpList {
        OpList {
            ops: names
                .iter()
                .map(|name| OperationDefinition {
                    name: (*name).to_string(),
                    ..Default::default()
                })
                .collect(),
        }
    }

    #[test]
    fn find_resolves_single_entry() {
        let ops = list(&["AddV2", "ConcatV2"]);
        assert_eq!(ops.find("ConcatV2").unwrap().name, "ConcatV2");
    }

    #[test]
    fn find_reports_missing_and_duplicate() {
        let ops = list(&["AddV2", "AddV2"]);
        assert!(matches!(
            ops.find("Sub"),
            Err(GenerateError::UnresolvedOperation { name }) if name == "Sub"
        ));
        assert!(matches!(
            ops.find("AddV2"),
            Err(GenerateError::DuplicateOperation { .. })
        ));
    }

    #[test]
    fn variadic_args() {
        let mut arg = ArgDef::default();
        assert!(!arg.is_variadic());
        arg.number_attr = Some("N".into());
        assert!(arg.is_variadic());
        let arg = ArgDef {
            type_list_attr: Some("Tin".into()),
            ..Default::default()
        };
        assert!(arg.is_variadic());
    }
}

//! Lua stub generator for an operation registry.
//!
//! The pipeline is:
//! 1. Select: reflected names (or every registry op), minus private ones
//! 2. Resolve: each name to exactly one registry entry
//! 3. Normalize: entry + docstring -> CompiledOperation
//! 4. Codegen: CompiledOperation list -> LuaModule (Lua AST)
//! 5. Emit: LuaModule -> String (via Emit trait)
//!
//! The first failure aborts the run.

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, info};

use crate::error::{GenerateError, GenerateResult};
use crate::ir::docs::Documentation;
use crate::ir::{Emit, codegen_module, compile_operation};
use crate::registry::{OpList, OperationDefinition};

/// Names starting with this prefix are skipped unless configured otherwise.
pub const DEFAULT_PRIVATE_PREFIX: &str = "_";

/// Inputs of one generation run besides the registry itself.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Reflected operation names; `None` selects every registry operation.
    pub names: Option<Vec<String>>,
    /// Docstrings keyed by operation name.
    pub docs: HashMap<String, String>,
    /// Names starting with this prefix are skipped.
    pub private_prefix: String,
}

impl Default for GenerateRequest {
    fn default() -> Self {
        Self {
            names: None,
            docs: HashMap::new(),
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedModule {
    /// Complete Lua source, newline-terminated.
    pub code: String,
    /// Exported function names, in emission order.
    pub functions: Vec<String>,
}

/// Generate the Lua module for `request` against `registry`.
pub fn generate(registry: &OpList, request: &GenerateRequest) -> GenerateResult<GeneratedModule> {
    let names = select_names(registry, request);

    let mut compiled = Vec::with_capacity(names.len());
    let mut owners: HashMap<String, String> = HashMap::new();
    for name in names {
        let op = registry.find(name)?;
        let doc = Documentation::parse(doc_text(op, request).as_deref());
        let op = compile_operation(op, doc)?;

        if let Some(first) = owners.insert(op.fn_name.clone(), name.to_string()) {
            return Err(GenerateError::NameCollision {
                function: op.fn_name,
                first,
                second: name.to_string(),
            });
        }
        debug!(
            op = name,
            function = %op.fn_name,
            inputs = op.inputs.len(),
            attrs = op.attrs.len(),
            "compiled operation"
        );
        compiled.push(op);
    }

    let functions = compiled.iter().map(|op| op.fn_name.clone()).collect();
    let code = codegen_module(&compiled).emit();
    info!(operations = compiled.len(), bytes = code.len(), "generated module");
    Ok(GeneratedModule { code, functions })
}

/// Sorted, de-duplicated public names.
fn select_names<'a>(registry: &'a OpList, request: &'a GenerateRequest) -> BTreeSet<&'a str> {
    let candidates: Vec<&'a str> = match &request.names {
        Some(names) => names.iter().map(String::as_str).collect(),
        None => registry.ops.iter().map(|op| op.name.as_str()).collect(),
    };
    candidates
        .into_iter()
        .filter(|name| {
            let private =
                !request.private_prefix.is_empty() && name.starts_with(&request.private_prefix);
            if private {
                debug!(op = name, "skipping private operation");
            }
            !private
        })
        .collect()
}

/// Supplied docstring, else the registry's summary and description.
fn doc_text(op: &OperationDefinition, request: &GenerateRequest) -> Option<String> {
    if let Some(text) = request.docs.get(&op.name) {
        return Some(text.clone());
    }
    match (&op.summary, &op.description) {
        (Some(summary), Some(description)) => Some(format!("{summary}\n\n{description}")),
        (Some(text), None) | (None, Some(text)) => Some(text.clone()),
        (None, None) => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"
op {
  name: "AddV2"
  input_arg { name: "x" type_attr: "T" }
  input_arg { name: "y" type_attr: "T" }
  output_arg { name: "z" type_attr: "T" }
  attr { name: "T" type: "type" }
  summary: "Returns x + y element-wise."
}
op {
  name: "ConcatV2"
  input_arg { name: "values" type_attr: "T" number_attr: "N" }
  input_arg { name: "axis" type_attr: "Tidx" }
  output_arg { name: "output" type_attr: "T" }
  attr { name: "N" type: "int" has_minimum: true minimum: 2 }
  attr { name: "T" type: "type" }
  attr { name: "Tidx" type: "type" default_value { type: DT_INT32 } }
}
op {
  name: "NoOp"
}
op {
  name: "_Send"
  input_arg { name: "tensor" type_attr: "T" }
  attr { name: "T" type: "type" }
}
"#;

    fn registry() -> OpList {
        OpList::from_pbtxt(REGISTRY).unwrap()
    }

    #[test]
    fn generates_every_public_operation_sorted() {
        let module = generate(&registry(), &GenerateRequest::default()).unwrap();
        assert_eq!(module.functions, vec!["add_v2", "concat_v2", "no_op"]);
        let add = module.code.find("function M.add_v2(").unwrap();
        let concat = module.code.find("function M.concat_v2(").unwrap();
        let no_op = module.code.find("function M.no_op(").unwrap();
        assert!(add < concat && concat < no_op);
        assert!(!module.code.contains("_Send"));
        assert!(module.code.ends_with("\nreturn M\n"));
    }

    #[test]
    fn concat_v2_binds_count_from_values() {
        let module = generate(&registry(), &GenerateRequest::default()).unwrap();
        assert!(module.code.contains("function M.concat_v2(values, axis, Tidx)\n"));
        assert!(module.code.contains("\tif Tidx == nil then Tidx = 3 end\n"));
        assert!(module.code.contains("---@param Tidx number|string @(optional \"int32\")(TF_DataType)\n"));
        assert!(module.code.contains("\top:setAttrInt(\"N\", #values)\n"));
        assert!(module.code.contains("\top:setAttrType(\"Tidx\", Tidx)\n"));
    }

    #[test]
    fn registry_summary_is_the_fallback_doc() {
        let module = generate(&registry(), &GenerateRequest::default()).unwrap();
        assert!(module.code.contains("--- Returns x + y element-wise.\n---@param x tfl.Tensor\n"));
    }

    #[test]
    fn supplied_docs_win() {
        let mut request = GenerateRequest {
            names: Some(vec!["AddV2".into()]),
            ..Default::default()
        };
        request.docs.insert(
            "AddV2".into(),
            "Adds.\n\nArgs:\n  x: left\n  y: right\nReturns:\n  the sum".into(),
        );
        let module = generate(&registry(), &request).unwrap();
        assert!(module.code.contains(
            "--- Adds.\n---@param x tfl.Tensor @left\n---@param y tfl.Tensor @right\n---@return tfl.Tensor @ the sum\n"
        ));
    }

    #[test]
    fn names_are_filtered_sorted_and_deduplicated() {
        let request = GenerateRequest {
            names: Some(vec![
                "NoOp".into(),
                "_Send".into(),
                "AddV2".into(),
                "NoOp".into(),
            ]),
            ..Default::default()
        };
        let module = generate(&registry(), &request).unwrap();
        assert_eq!(module.functions, vec!["add_v2", "no_op"]);
    }

    #[test]
    fn empty_prefix_keeps_private_names() {
        let request = GenerateRequest {
            names: Some(vec!["_Send".into()]),
            private_prefix: String::new(),
            ..Default::default()
        };
        let module = generate(&registry(), &request).unwrap();
        assert_eq!(module.functions, vec!["__send"]);
        assert!(module.code.contains("function M.__send(input_tensor)\n"));
    }

    #[test]
    fn unresolved_name_aborts() {
        let request = GenerateRequest {
            names: Some(vec!["AddV2".into(), "Missing".into()]),
            ..Default::default()
        };
        assert!(matches!(
            generate(&registry(), &request),
            Err(GenerateError::UnresolvedOperation { name }) if name == "Missing"
        ));
    }

    #[test]
    fn colliding_function_names_abort() {
        let registry = OpList::from_pbtxt("op { name: \"TopK\" } op { name: \"Topk\" }").unwrap();
        assert!(matches!(
            generate(&registry, &GenerateRequest::default()),
            Err(GenerateError::NameCollision { function, first, second })
                if function == "topk" && first == "TopK" && second == "Topk"
        ));
    }

    #[test]
    fn conv2d_keeps_list_attributes_positional() {
        let registry = OpList::from_pbtxt(
            r#"
op {
  name: "Conv2D"
  input_arg { name: "input" type_attr: "T" }
  input_arg { name: "filter" type_attr: "T" }
  output_arg { name: "output" type_attr: "T" }
  attr { name: "T" type: "type" }
  attr { name: "strides" type: "list(int)" }
  attr { name: "use_cudnn_on_gpu" type: "bool" default_value { b: true } }
  attr { name: "padding" type: "string" }
  attr { name: "explicit_paddings" type: "list(int)" default_value { list { } } }
  attr { name: "data_format" type: "string" default_value { s: "NHWC" } }
  attr { name: "dilations" type: "list(int)" default_value { list { i: 1 i: 1 i: 1 i: 1 } } }
}
"#,
        )
        .unwrap();
        let module = generate(&registry, &GenerateRequest::default()).unwrap();
        assert!(module.code.contains(
            "function M.conv2d(input, filter, strides, padding, explicit_paddings, dilations, use_cudnn_on_gpu, data_format)\n\
             \tif use_cudnn_on_gpu == nil then use_cudnn_on_gpu = true end\n\
             \tif data_format == nil then data_format = \"NHWC\" end\n\
             \tlocal op = get_context():newOp(\"Conv2D\")\n"
        ));
        assert!(!module.code.contains("if dilations == nil"));
        assert!(!module.code.contains("if explicit_paddings == nil"));
    }

    #[test]
    fn output_is_deterministic() {
        let first = generate(&registry(), &GenerateRequest::default()).unwrap();
        let second = generate(&registry(), &GenerateRequest::default()).unwrap();
        assert_eq!(first, second);
    }
}

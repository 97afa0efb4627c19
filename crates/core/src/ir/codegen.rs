//! Code generation: compiled IR -> Lua AST.
//!
//! Converts [`CompiledOperation`]s into [`LuaFunction`]s and wraps them in the
//! module preamble. No string rendering happens here; see `emit`.

use super::api::{AttrBinding, CompiledAttribute, CompiledOperation, OutputArity, Setter};
use super::attr::INFINITY_CONSTANT;
use super::types::{DocLine, LuaExpr, LuaFunction, LuaModule, LuaStmt};

const MODULE_TABLE: &str = "M";
const MODULE_TITLE: &str = "TensorFlow raw_ops mappings";
const OP_VAR: &str = "op";
const GET_CONTEXT: &str = "get_context";
const TENSOR_CLASS: &str = "TFLTensor";
const PACK_HANDLES: &str = "pack_tfe_handle";
const WRAP_LIST: &str = "wrap_result_list";
const PARSE_RESULTS: &str = "parse_execute_results";

fn lit(text: impl Into<String>) -> LuaExpr {
    LuaExpr::Literal(text.into())
}

fn local(name: &str, init: LuaExpr) -> LuaStmt {
    LuaStmt::Local {
        name: name.to_string(),
        init,
    }
}

fn op_var() -> LuaExpr {
    LuaExpr::ident(OP_VAR)
}

// =============================================================================
// Module
// =============================================================================

/// Generate the complete module for operations in emission order.
pub fn codegen_module(ops: &[CompiledOperation]) -> LuaModule {
    LuaModule {
        title: MODULE_TITLE.to_string(),
        header: module_header(),
        helpers: vec![pack_handles_helper(), wrap_list_helper(), parse_results_helper()],
        functions: ops.iter().map(codegen_operation).collect(),
        export: MODULE_TABLE.to_string(),
    }
}

fn module_header() -> Vec<LuaStmt> {
    let require = |module: &str| LuaExpr::call("require", vec![LuaExpr::Str(module.to_string())]);
    vec![
        local(MODULE_TABLE, LuaExpr::EmptyTable),
        local(INFINITY_CONSTANT, LuaExpr::ident("math").member("huge")),
        local(GET_CONTEXT, require("tfl.context").member(GET_CONTEXT)),
        local(TENSOR_CLASS, require("tfl.Tensor")),
    ]
}

/// `ret[i] = <value>` inside `for i = 1, #<list>`, collected into `ret`.
fn map_list(list: &str, value: LuaExpr) -> Vec<LuaStmt> {
    vec![
        local("ret", LuaExpr::EmptyTable),
        LuaStmt::NumericFor {
            var: "i".to_string(),
            start: lit("1"),
            stop: LuaExpr::ident(list).len(),
            body: vec![LuaStmt::Assign {
                target: LuaExpr::ident("ret").index(LuaExpr::ident("i")),
                value,
            }],
        },
        LuaStmt::Return(LuaExpr::ident("ret")),
    ]
}

fn helper(name: &str, param: &str, body: Vec<LuaStmt>) -> LuaFunction {
    LuaFunction {
        doc: Vec::new(),
        name: name.to_string(),
        is_local: true,
        params: vec![param.to_string()],
        body,
    }
}

/// Unwraps a sequence of wrapped tensors into raw handles.
fn pack_handles_helper() -> LuaFunction {
    let element = || LuaExpr::ident("tensors").index(LuaExpr::ident("i"));
    helper(
        PACK_HANDLES,
        "tensors",
        map_list("tensors", element().member("_handle").or(element())),
    )
}

/// Wraps every raw result handle.
fn wrap_list_helper() -> LuaFunction {
    let element = LuaExpr::ident("res").index(LuaExpr::ident("i"));
    helper(
        WRAP_LIST,
        "res",
        map_list("res", LuaExpr::call(TENSOR_CLASS, vec![element])),
    )
}

/// 0 results -> nil, 1 -> wrapped tensor, more -> list.
fn parse_results_helper() -> LuaFunction {
    let count = || LuaExpr::ident("res").len();
    helper(
        PARSE_RESULTS,
        "res",
        vec![
            LuaStmt::If {
                cond: count().equals(lit("0")),
                then_body: vec![LuaStmt::Return(lit("nil"))],
            },
            LuaStmt::If {
                cond: count().equals(lit("1")),
                then_body: vec![LuaStmt::Return(LuaExpr::call(
                    TENSOR_CLASS,
                    vec![LuaExpr::ident("res").index(lit("1"))],
                ))],
            },
            LuaStmt::Return(LuaExpr::call(WRAP_LIST, vec![LuaExpr::ident("res")])),
        ],
    )
}

// =============================================================================
// Operations
// =============================================================================

/// Generate the exported function for one operation.
pub fn codegen_operation(op: &CompiledOperation) -> LuaFunction {
    LuaFunction {
        doc: doc_lines(op),
        name: format!("{}.{}", MODULE_TABLE, op.fn_name),
        is_local: false,
        params: op.params(),
        body: body(op),
    }
}

fn doc_lines(op: &CompiledOperation) -> Vec<DocLine> {
    let mut lines: Vec<DocLine> = body_text(&op.doc.body)
        .into_iter()
        .map(|line| DocLine::Text(line.to_string()))
        .collect();

    for input in &op.inputs {
        lines.push(DocLine::Param {
            name: input.var_name.clone(),
            ty: input.host_type().to_string(),
            desc: op.doc.arg(&input.name).unwrap_or_default().to_string(),
        });
    }

    for attr in op.attr_params() {
        lines.push(DocLine::Param {
            name: attr.var_name.clone(),
            ty: attr.host_type.clone(),
            desc: attr_desc(attr, op.doc.arg(&attr.name)),
        });
    }

    let ty = match op.arity {
        OutputArity::None => "nil",
        OutputArity::Single => "tfl.Tensor",
        OutputArity::Many => "tfl.Tensor[]",
    };
    lines.push(DocLine::Return {
        ty: ty.to_string(),
        desc: op.doc.returns.clone(),
    });
    lines
}

/// Body lines without surrounding blank lines or trailing whitespace.
fn body_text(body: &str) -> Vec<&str> {
    let lines: Vec<&str> = body.lines().map(str::trim_end).collect();
    let start = lines
        .iter()
        .position(|line| !line.is_empty())
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !line.is_empty())
        .map_or(start, |last| last + 1);
    lines[start..end].to_vec()
}

/// `(optional <default>)(<native type>) <text>`, each part when present.
fn attr_desc(attr: &CompiledAttribute, text: Option<&str>) -> String {
    let mut desc = String::new();
    if let Some(default) = &attr.default {
        desc.push_str(&format!("(optional {})", default.doc));
    }
    if let Some(foreign) = &attr.foreign_type {
        desc.push_str(&format!("({foreign})"));
    }
    if let Some(text) = text {
        if !desc.is_empty() {
            desc.push(' ');
        }
        desc.push_str(text);
    }
    desc
}

fn body(op: &CompiledOperation) -> Vec<LuaStmt> {
    let mut stmts = Vec::new();

    for attr in op.attr_params() {
        if let Some(default) = &attr.default {
            stmts.push(LuaStmt::If {
                cond: LuaExpr::ident(&attr.var_name).equals(lit("nil")),
                then_body: vec![LuaStmt::Assign {
                    target: LuaExpr::ident(&attr.var_name),
                    value: lit(&default.literal),
                }],
            });
        }
    }

    stmts.push(local(
        OP_VAR,
        LuaExpr::call(GET_CONTEXT, vec![])
            .method("newOp", vec![LuaExpr::Str(op.op_name.clone())]),
    ));

    for input in &op.inputs {
        let var = || LuaExpr::ident(&input.var_name);
        let stmt = if input.variadic {
            op_var().method("addInputList", vec![LuaExpr::call(PACK_HANDLES, vec![var()])])
        } else {
            op_var().method("addInput", vec![var().member("_handle").or(var())])
        };
        stmts.push(LuaStmt::Expr(stmt));
    }

    for attr in &op.attrs {
        stmts.push(LuaStmt::Expr(attr_binding(attr)));
    }

    let execute = op_var().method("execute", vec![]);
    stmts.push(match op.arity {
        OutputArity::None => LuaStmt::Expr(execute),
        OutputArity::Single => LuaStmt::Return(LuaExpr::call(PARSE_RESULTS, vec![execute])),
        OutputArity::Many => LuaStmt::Return(LuaExpr::call(WRAP_LIST, vec![execute])),
    });
    stmts
}

fn attr_binding(attr: &CompiledAttribute) -> LuaExpr {
    let name = LuaExpr::Str(attr.name.clone());
    match &attr.binding {
        AttrBinding::Param { setter, var } => {
            let value = if *setter == Setter::Tensor {
                LuaExpr::ident(var).member("_tensor").or(LuaExpr::ident(var))
            } else {
                LuaExpr::ident(var)
            };
            op_var().method(setter.method(), vec![name, value])
        }
        AttrBinding::LengthOf { input_var } => op_var().method(
            Setter::Int.method(),
            vec![name, LuaExpr::ident(input_var).len()],
        ),
    }
}

//! Lua code emission via the Emit trait.
//!
//! Each AST node renders itself to a string. Statements take an explicit
//! indentation level; one tab per level.

use super::attr::escape_lua_string;
use super::types::{DocLine, LuaBinOp, LuaExpr, LuaFunction, LuaModule, LuaStmt};

/// Trait for emitting Lua code from AST nodes.
pub trait Emit {
    /// Convert the AST node to its Lua string representation.
    fn emit(&self) -> String;
}

fn emit_args(args: &[LuaExpr]) -> String {
    args.iter().map(Emit::emit).collect::<Vec<_>>().join(", ")
}

// =============================================================================
// Expressions
// =============================================================================

impl Emit for LuaBinOp {
    fn emit(&self) -> String {
        match self {
            LuaBinOp::Eq => "==".to_string(),
            LuaBinOp::Or => "or".to_string(),
        }
    }
}

impl Emit for LuaExpr {
    fn emit(&self) -> String {
        match self {
            LuaExpr::Ident(name) | LuaExpr::Literal(name) => name.clone(),
            LuaExpr::Str(s) => format!("\"{}\"", escape_lua_string(s)),
            LuaExpr::EmptyTable => "{}".to_string(),
            LuaExpr::Call { callee, args } => {
                format!("{}({})", callee.emit(), emit_args(args))
            }
            LuaExpr::Method {
                object,
                method,
                args,
            } => format!("{}:{}({})", object.emit(), method, emit_args(args)),
            LuaExpr::Member { object, field } => format!("{}.{}", object.emit(), field),
            LuaExpr::Index { object, index } => format!("{}[{}]", object.emit(), index.emit()),
            LuaExpr::Len(inner) => format!("#{}", inner.emit()),
            LuaExpr::BinOp { left, op, right } => {
                format!("{} {} {}", left.emit(), op.emit(), right.emit())
            }
        }
    }
}

// =============================================================================
// Statements
// =============================================================================

impl Emit for LuaStmt {
    fn emit(&self) -> String {
        self.emit_indented(1)
    }
}

impl LuaStmt {
    /// Emit with specified indentation level (one tab per level)
    pub fn emit_indented(&self, indent: usize) -> String {
        let prefix = "\t".repeat(indent);
        match self {
            LuaStmt::If { cond, then_body }
                if then_body.len() == 1 && then_body[0].is_simple() =>
            {
                format!(
                    "{}if {} then {} end\n",
                    prefix,
                    cond.emit(),
                    then_body[0].emit_inline()
                )
            }
            LuaStmt::If { cond, then_body } => {
                let mut output = format!("{}if {} then\n", prefix, cond.emit());
                emit_block(&mut output, then_body, indent + 1);
                output.push_str(&format!("{prefix}end\n"));
                output
            }
            LuaStmt::NumericFor {
                var,
                start,
                stop,
                body,
            } => {
                let mut output = format!(
                    "{}for {} = {}, {} do\n",
                    prefix,
                    var,
                    start.emit(),
                    stop.emit()
                );
                emit_block(&mut output, body, indent + 1);
                output.push_str(&format!("{prefix}end\n"));
                output
            }
            _ => format!("{}{}\n", prefix, self.emit_inline()),
        }
    }

    /// Single-line form without indentation or newline.
    fn emit_inline(&self) -> String {
        match self {
            LuaStmt::Local { name, init } => format!("local {} = {}", name, init.emit()),
            LuaStmt::Assign { target, value } => format!("{} = {}", target.emit(), value.emit()),
            LuaStmt::Expr(expr) => expr.emit(),
            LuaStmt::Return(expr) => format!("return {}", expr.emit()),
            LuaStmt::If { .. } | LuaStmt::NumericFor { .. } => {
                self.emit_indented(0).trim_end().to_string()
            }
        }
    }
}

fn emit_block(output: &mut String, body: &[LuaStmt], indent: usize) {
    for stmt in body {
        output.push_str(&stmt.emit_indented(indent));
    }
}

// =============================================================================
// Functions
// =============================================================================

impl Emit for DocLine {
    fn emit(&self) -> String {
        match self {
            DocLine::Text(text) if text.is_empty() => "---".to_string(),
            DocLine::Text(text) => format!("--- {text}"),
            DocLine::Param { name, ty, desc } if desc.is_empty() => {
                format!("---@param {name} {ty}")
            }
            DocLine::Param { name, ty, desc } => format!("---@param {name} {ty} @{desc}"),
            DocLine::Return { ty, desc } if desc.is_empty() => format!("---@return {ty}"),
            DocLine::Return { ty, desc } => format!("---@return {ty} @ {desc}"),
        }
    }
}

impl Emit for LuaFunction {
    fn emit(&self) -> String {
        let mut output = String::new();
        for line in &self.doc {
            output.push_str(&line.emit());
            output.push('\n');
        }
        let local = if self.is_local { "local " } else { "" };
        output.push_str(&format!(
            "{}function {}({})\n",
            local,
            self.name,
            self.params.join(", ")
        ));
        emit_block(&mut output, &self.body, 1);
        output.push_str("end\n");
        output
    }
}

// =============================================================================
// Module
// =============================================================================

impl Emit for LuaModule {
    fn emit(&self) -> String {
        let mut output = format!("--- {}\n", self.title);
        emit_block(&mut output, &self.header, 0);
        for function in self.helpers.iter().chain(&self.functions) {
            output.push('\n');
            output.push_str(&function.emit());
        }
        output.push_str(&format!("\nreturn {}\n", self.export));
        output
    }
}

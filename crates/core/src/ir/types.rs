//! Lua AST for code generation.
//!
//! Only the constructs the generated module uses are modelled:
//! - LuaExpr: identifiers, literals, calls, method calls, member/index access
//! - LuaStmt: locals, assignment, `if`, numeric `for`, `return`
//! - LuaFunction / LuaModule: annotated functions and the module layout

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuaBinOp {
    /// `==`
    Eq,
    /// `or`
    Or,
}

/// Lua expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LuaExpr {
    /// Identifier: foo
    Ident(String),
    /// Pre-rendered literal: 42, true, nil, 1.0000e+00
    Literal(String),
    /// String literal, quoted and escaped on emit
    Str(String),
    /// Empty table constructor: {}
    EmptyTable,
    /// Function call: f(a, b)
    Call {
        /// Called expression.
        callee: Box<LuaExpr>,
        /// Arguments.
        args: Vec<LuaExpr>,
    },
    /// Method call: obj:method(a, b)
    Method {
        /// Receiver.
        object: Box<LuaExpr>,
        /// Method name.
        method: String,
        /// Arguments.
        args: Vec<LuaExpr>,
    },
    /// Field access: obj.field
    Member {
        /// Table expression.
        object: Box<LuaExpr>,
        /// Field name.
        field: String,
    },
    /// Index access: obj[key]
    Index {
        /// Table expression.
        object: Box<LuaExpr>,
        /// Key expression.
        index: Box<LuaExpr>,
    },
    /// Length operator: #expr
    Len(Box<LuaExpr>),
    /// Binary expression: a == b, a or b
    BinOp {
        /// Left operand.
        left: Box<LuaExpr>,
        /// Operator.
        op: LuaBinOp,
        /// Right operand.
        right: Box<LuaExpr>,
    },
}

impl LuaExpr {
    /// Identifier expression.
    pub fn ident(name: impl Into<String>) -> Self {
        LuaExpr::Ident(name.into())
    }

    /// `callee(args)` where callee is an identifier.
    pub fn call(callee: impl Into<String>, args: Vec<LuaExpr>) -> Self {
        LuaExpr::Call {
            callee: Box::new(LuaExpr::ident(callee)),
            args,
        }
    }

    /// `self:method(args)`.
    pub fn method(self, method: impl Into<String>, args: Vec<LuaExpr>) -> Self {
        LuaExpr::Method {
            object: Box::new(self),
            method: method.into(),
            args,
        }
    }

    /// `self.field`.
    pub fn member(self, field: impl Into<String>) -> Self {
        LuaExpr::Member {
            object: Box::new(self),
            field: field.into(),
        }
    }

    /// `self[index]`.
    pub fn index(self, index: LuaExpr) -> Self {
        LuaExpr::Index {
            object: Box::new(self),
            index: Box::new(index),
        }
    }

    /// `#self`.
    pub fn len(self) -> Self {
        LuaExpr::Len(Box::new(self))
    }

    /// `self == right`.
    pub fn equals(self, right: LuaExpr) -> Self {
        self.bin(LuaBinOp::Eq, right)
    }

    /// `self or right`.
    pub fn or(self, right: LuaExpr) -> Self {
        self.bin(LuaBinOp::Or, right)
    }

    fn bin(self, op: LuaBinOp, right: LuaExpr) -> Self {
        LuaExpr::BinOp {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }
}

/// Statement in a function body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LuaStmt {
    /// local name = init
    Local {
        /// Declared name.
        name: String,
        /// Initializer.
        init: LuaExpr,
    },
    /// target = value
    Assign {
        /// Assigned place.
        target: LuaExpr,
        /// New value.
        value: LuaExpr,
    },
    /// Expression statement (calls only, in Lua)
    Expr(LuaExpr),
    /// Return statement
    Return(LuaExpr),
    /// if cond then ... end
    If {
        /// Condition.
        cond: LuaExpr,
        /// Body.
        then_body: Vec<LuaStmt>,
    },
    /// for var = start, stop do ... end
    NumericFor {
        /// Loop variable.
        var: String,
        /// Initial value.
        start: LuaExpr,
        /// Inclusive limit.
        stop: LuaExpr,
        /// Body.
        body: Vec<LuaStmt>,
    },
}

impl LuaStmt {
    /// Whether the statement fits on one line inside an inline `if`.
    pub fn is_simple(&self) -> bool {
        matches!(
            self,
            LuaStmt::Assign { .. } | LuaStmt::Expr(_) | LuaStmt::Return(_)
        )
    }
}

/// One `---` annotation line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocLine {
    /// Free text: `--- text`
    Text(String),
    /// `---@param name type @desc`
    Param {
        /// Parameter name.
        name: String,
        /// Annotated type.
        ty: String,
        /// Description, possibly empty.
        desc: String,
    },
    /// `---@return type @ desc`
    Return {
        /// Annotated type.
        ty: String,
        /// Description, possibly empty.
        desc: String,
    },
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuaFunction {
    /// Annotation block above the definition.
    pub doc: Vec<DocLine>,
    /// Declared name, possibly dotted (`M.add_v2`).
    pub name: String,
    /// Declared with `local function`.
    pub is_local: bool,
    /// Parameter names.
    pub params: Vec<String>,
    /// Body statements.
    pub body: Vec<LuaStmt>,
}

/// Complete Lua module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuaModule {
    /// Title comment on the first line.
    pub title: String,
    /// Top-level locals declared before any function.
    pub header: Vec<LuaStmt>,
    /// Local helper functions.
    pub helpers: Vec<LuaFunction>,
    /// Exported functions.
    pub functions: Vec<LuaFunction>,
    /// Table returned at the end of the chunk.
    pub export: String,
}

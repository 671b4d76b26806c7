//! Syntax tree produced by the parser
//!
//! Names are already resolved: locals are function-wide slot indices,
//! captured variables are indices into the closure's upvalue list, and
//! everything else is a global.

use std::rc::Rc;

/// A compiled function body.
#[derive(Debug)]
pub struct FunctionProto {
    pub name: String,
    pub chunk: Rc<str>,
    pub line: usize,
    /// Slots receiving the fixed parameters, in order.
    pub params: Vec<usize>,
    pub is_vararg: bool,
    pub num_slots: usize,
    /// Declared name of each slot, for error messages.
    pub local_names: Vec<Rc<str>>,
    /// Where each captured cell comes from in the enclosing function.
    pub upvalues: Vec<UpvalueDesc>,
    pub upvalue_names: Vec<Rc<str>>,
    pub body: Block,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpvalueDesc {
    /// A local slot of the enclosing function
    Local(usize),
    /// An upvalue of the enclosing function
    Upvalue(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attrib {
    None,
    Const,
    Close,
}

#[derive(Debug, Default)]
pub struct Block {
    pub stats: Vec<Stat>,
    /// The block declares a `<close>` variable directly.
    pub has_close: bool,
}

#[derive(Debug)]
pub struct Stat {
    pub kind: StatKind,
    pub line: usize,
}

#[derive(Debug)]
pub struct LocalTarget {
    pub slot: usize,
    pub attrib: Attrib,
}

#[derive(Debug)]
pub enum StatKind {
    /// A function call used as a statement
    Expr(Expr),
    Local {
        targets: Vec<LocalTarget>,
        exprs: Vec<Expr>,
    },
    Assign {
        targets: Vec<Expr>,
        exprs: Vec<Expr>,
    },
    LocalFunction {
        slot: usize,
        func: Rc<FunctionProto>,
    },
    Do(Block),
    While {
        cond: Expr,
        body: Block,
    },
    /// The condition sees the body's locals and is evaluated before
    /// the body's scope closes.
    Repeat {
        body: Block,
        cond: Expr,
    },
    If {
        branches: Vec<(Expr, Block)>,
        otherwise: Option<Block>,
    },
    NumericFor {
        var: usize,
        start: Expr,
        limit: Expr,
        step: Option<Expr>,
        body: Block,
    },
    GenericFor {
        vars: Vec<usize>,
        exprs: Vec<Expr>,
        body: Block,
    },
    Return(Vec<Expr>),
    Break,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    Len,
}

#[derive(Debug)]
pub enum Field {
    Positional(Expr),
    Named(Rc<str>, Expr),
    Keyed(Expr, Expr),
}

#[derive(Debug)]
pub enum Expr {
    Nil,
    True,
    False,
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    Vararg,
    Local(usize),
    Upvalue(usize),
    Global(Rc<str>),
    Index(Box<Expr>, Box<Expr>),
    Call(Box<Expr>, Vec<Expr>),
    Method(Box<Expr>, Rc<str>, Vec<Expr>),
    Function(Rc<FunctionProto>),
    Table(Vec<Field>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Unary(UnOp, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    /// Parenthesized expression, truncated to one value
    Paren(Box<Expr>),
}

impl Expr {
    /// Calls and `...` produce a variable number of values in the last
    /// position of an expression list.
    pub fn is_multi(&self) -> bool {
        matches!(self, Expr::Call(..) | Expr::Method(..) | Expr::Vararg)
    }
}

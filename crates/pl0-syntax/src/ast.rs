//! Abstract syntax tree produced by the parser.

use std::cell::RefCell;
use std::rc::Rc;

use pl0_lexer::{Location, TokenKind};

use crate::scope::{Scope, SymbolRef};

/// The target of a `call` statement.
///
/// Most calls resolve immediately, but a procedure may call a sibling
/// declared later in the same block; [`crate::parser::Parser`] leaves such
/// targets empty and fills them in once the whole procedure list has been
/// declared. By the time a [`Program`] is handed to a caller the cell is
/// always populated — an unresolved forward call is a parse error.
pub struct CallTarget(RefCell<Option<SymbolRef>>);

impl CallTarget {
    pub fn unresolved() -> Self {
        CallTarget(RefCell::new(None))
    }

    pub fn resolve(&self, symbol: SymbolRef) {
        *self.0.borrow_mut() = Some(symbol);
    }

    pub fn is_resolved(&self) -> bool {
        self.0.borrow().is_some()
    }

    pub fn get(&self) -> SymbolRef {
        self.0
            .borrow()
            .clone()
            .expect("call target resolved before the parser hands out its AST")
    }
}

/// A whole compilation unit: a single top-level block terminated by `.`.
pub struct Program {
    pub block: Block,
}

/// A `const`/`var`/`procedure` declaration group followed by a statement body.
/// Every block owns the [`Scope`] its declarations were defined in.
pub struct Block {
    pub scope: Rc<Scope>,
    pub constants: Vec<SymbolRef>,
    pub variables: Vec<SymbolRef>,
    pub procedures: Vec<ProcedureDecl>,
    pub body: Box<Statement>,
}

pub struct ProcedureDecl {
    pub symbol: SymbolRef,
    pub block: Block,
}

/// A resolved use of a variable or constant by name.
pub struct VariableProxy {
    pub symbol: SymbolRef,
    pub location: Location,
}

pub enum Statement {
    StatementList(Vec<Statement>),
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    Call {
        callee: Rc<CallTarget>,
        name: String,
        location: Location,
    },
    Read {
        targets: Vec<VariableProxy>,
    },
    Write {
        expressions: Vec<Expression>,
    },
    Assign {
        target: VariableProxy,
        value: Expression,
    },
    Return {
        location: Location,
    },
    /// The empty statement, e.g. the body of `if x then ;`.
    Empty,
}

pub enum Expression {
    Literal {
        value: i64,
        location: Location,
    },
    Variable(VariableProxy),
    /// `odd <expr>` or a leading `+`/`-` applied to a `factor`.
    Unary {
        op: TokenKind,
        expr: Box<Expression>,
        location: Location,
    },
    Binary {
        op: TokenKind,
        left: Box<Expression>,
        right: Box<Expression>,
        location: Location,
    },
}

impl Expression {
    pub fn location(&self) -> Location {
        match self {
            Expression::Literal { location, .. } => *location,
            Expression::Variable(proxy) => proxy.location,
            Expression::Unary { location, .. } => *location,
            Expression::Binary { location, .. } => *location,
        }
    }
}

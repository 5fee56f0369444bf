//! Symbol table, abstract syntax tree and recursive-descent parser for PL/0.

pub mod ast;
mod parser;
mod scope;

pub use parser::{ParseError, Parser};
pub use scope::{Scope, Symbol, SymbolId, SymbolRef};

//! Bytecode format, backpatching emitter, and AST-to-bytecode compiler.

mod assembler;
mod compiler;
mod instr;

pub use assembler::{operation_for, Assembler, Handle};
pub use compiler::{compile, CompileError, Compiler};
pub use instr::{Instruction, Op, OprCode};

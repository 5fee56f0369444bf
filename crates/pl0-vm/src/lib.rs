//! Stack-machine interpreter for compiled PL/0 bytecode.

mod interpreter;

pub use interpreter::{RuntimeError, Vm};

//! Lowers a [`pl0_syntax::ast::Program`] to bytecode.

use std::collections::HashMap;

use pl0_lexer::TokenKind;
use pl0_syntax::ast::{Block, Expression, Program, Statement, VariableProxy};
use pl0_syntax::{Scope, Symbol, SymbolId, SymbolRef};
use thiserror::Error;

use crate::assembler::{operation_for, Assembler, Handle};
use crate::instr::{Instruction, OprCode};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("unresolved call to '{name}' at end of compilation")]
    UnresolvedCall { name: String },

    #[error("call to '{name}' would require a negative call level ({level})")]
    NegativeCallLevel { name: String, level: i64 },
}

type Result<T> = std::result::Result<T, CompileError>;

struct PendingCall {
    handle: Handle,
    callee: SymbolRef,
    caller_level: usize,
}

/// Compiles a whole program to a flat instruction stream.
pub struct Compiler {
    asm: Assembler,
    entry_points: HashMap<SymbolId, usize>,
    patch_list: Vec<PendingCall>,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            asm: Assembler::new(),
            entry_points: HashMap::new(),
            patch_list: Vec::new(),
        }
    }

    pub fn compile(mut self, program: &Program) -> Result<Vec<Instruction>> {
        self.compile_block(&program.block);
        self.finish()?;
        Ok(self.asm.into_instructions())
    }

    fn finish(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.patch_list);
        for call in pending {
            let callee_level = call.callee.level();
            let entry = *self
                .entry_points
                .get(&call.callee.id())
                .ok_or_else(|| CompileError::UnresolvedCall {
                    name: call.callee.name().to_string(),
                })?;
            let diff = call.caller_level as i64 - callee_level as i64;
            if diff < 0 {
                return Err(CompileError::NegativeCallLevel {
                    name: call.callee.name().to_string(),
                    level: diff,
                });
            }
            self.asm.patch_level(call.handle, diff);
            self.asm.patch_address(call.handle, entry);
        }
        Ok(())
    }

    /// Lays out one block: header allocation, body, implicit return, then
    /// its sub-procedures' code contiguously after the parent's body.
    fn compile_block(&mut self, block: &Block) {
        let level = block.scope.level();
        self.asm.enter((block.variables.len() + 3) as i64);
        self.compile_statement(&block.body, level);
        self.asm.leave();

        for procedure in &block.procedures {
            self.entry_points.insert(procedure.symbol.id(), self.asm.len());
            self.compile_block(&procedure.block);
        }
    }

    fn compile_statement(&mut self, statement: &Statement, level: usize) {
        match statement {
            Statement::StatementList(statements) => {
                for stmt in statements {
                    self.compile_statement(stmt, level);
                }
            }
            Statement::If { condition, then_branch, else_branch } => {
                self.compile_expression(condition, level);
                let jpc = self.asm.branch_if_false();
                self.compile_statement(then_branch, level);
                match else_branch {
                    Some(else_branch) => {
                        let jmp = self.asm.branch();
                        self.asm.patch_address(jpc, self.asm.len());
                        self.compile_statement(else_branch, level);
                        self.asm.patch_address(jmp, self.asm.len());
                    }
                    None => {
                        self.asm.patch_address(jpc, self.asm.len());
                    }
                }
            }
            Statement::While { condition, body } => {
                let begin = self.asm.len();
                self.compile_expression(condition, level);
                let exit = self.asm.branch_if_false();
                self.compile_statement(body, level);
                self.asm.jump(begin as i64);
                self.asm.patch_address(exit, self.asm.len());
            }
            Statement::Call { callee, .. } => {
                let symbol = callee.get();
                let handle = self.asm.call_pending(level as i64);
                self.patch_list.push(PendingCall {
                    handle,
                    callee: symbol,
                    caller_level: level,
                });
            }
            Statement::Read { targets } => {
                for target in targets {
                    self.asm.read();
                    self.compile_store(target, level);
                }
            }
            Statement::Write { expressions } => {
                for expr in expressions {
                    self.compile_expression(expr, level);
                    self.asm.write();
                }
            }
            Statement::Assign { target, value } => {
                self.compile_expression(value, level);
                self.compile_store(target, level);
            }
            Statement::Return { .. } => {
                self.asm.leave();
            }
            Statement::Empty => {}
        }
    }

    fn compile_store(&mut self, target: &VariableProxy, level: usize) {
        if let Symbol::Variable { level: decl_level, index, .. } = target.symbol.as_ref() {
            self.asm.store((level - decl_level) as i64, *index as i64);
        }
    }

    fn compile_expression(&mut self, expr: &Expression, level: usize) {
        match expr {
            Expression::Literal { value, .. } => {
                self.asm.load_literal(*value);
            }
            Expression::Variable(proxy) => match proxy.symbol.as_ref() {
                Symbol::Constant { value, .. } => {
                    self.asm.load_literal(*value);
                }
                Symbol::Variable { level: decl_level, index, .. } => {
                    self.asm.load((level - decl_level) as i64, *index as i64);
                }
                Symbol::Procedure { .. } => unreachable!("parser rejects procedures used as values"),
            },
            Expression::Unary { op: TokenKind::Minus, expr, .. } => {
                self.asm.load_literal(0);
                self.compile_expression(expr, level);
                self.asm.operation(OprCode::Sub);
            }
            Expression::Unary { op, expr, .. } => {
                self.compile_expression(expr, level);
                let code = operation_for(*op).expect("unary operator has an OPR mapping");
                self.asm.operation(code);
            }
            Expression::Binary { op, left, right, .. } => {
                self.compile_expression(left, level);
                self.compile_expression(right, level);
                let code = operation_for(*op).expect("binary operator has an OPR mapping");
                self.asm.operation(code);
            }
        }
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles a whole program to bytecode, as a free function for callers
/// that don't need to reuse a [`Compiler`].
pub fn compile(program: &Program) -> Result<Vec<Instruction>> {
    Compiler::new().compile(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr::Op;
    use pl0_syntax::Parser;

    fn compile_source(source: &str) -> Vec<Instruction> {
        let program = Parser::new(source).parse_program().unwrap();
        compile(&program).unwrap()
    }

    #[test]
    fn arithmetic_program_compiles() {
        let code = compile_source("var x; begin x := 2 + 3 * 4; write x end.");
        assert!(code.iter().any(|i| i.op == Op::Opr && i.address == OprCode::Mul as i64));
        assert!(code.iter().any(|i| i.op == Op::Opr && i.address == OprCode::Add as i64));
        assert!(code.iter().any(|i| i.op == Op::Opr && i.address == OprCode::Write as i64));
    }

    #[test]
    fn forward_call_is_backpatched_to_a_valid_address() {
        let code = compile_source(
            "procedure p1; begin call p2 end; \
             procedure p2; begin end; \
             call p1.",
        );
        for instr in &code {
            if instr.op == Op::Cal {
                assert!((instr.address as usize) < code.len());
                assert!(instr.level >= 0);
            }
        }
    }

    #[test]
    fn nested_procedure_reads_outer_variable_with_positive_level_diff() {
        let code = compile_source(
            "var x; \
             procedure outer; var y; \
               procedure inner; begin write x; write y end; \
               begin y := 2; call inner end; \
             begin x := 1; call outer end.",
        );
        let lods: Vec<_> = code.iter().filter(|i| i.op == Op::Lod).collect();
        assert!(lods.iter().any(|i| i.level == 2));
        assert!(lods.iter().any(|i| i.level == 1));
    }

    #[test]
    fn recursive_self_call_has_a_positive_level_difference() {
        // "call p." at the program's own level-0 scope calls a level-0
        // procedure (level diff 0); the recursive "call p" inside p's own
        // body runs one level deeper, so its diff is 1.
        let code = compile_source("procedure p; begin call p end; call p.");
        let calls: Vec<_> = code.iter().filter(|i| i.op == Op::Cal).collect();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].level, 0);
        assert_eq!(calls[1].level, 1);
    }
}

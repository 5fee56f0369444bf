//! Low-level emitter: turns individual operations into [`Instruction`]s and
//! hands out backpatch handles for forward jumps and forward calls.

use pl0_lexer::TokenKind;

use crate::instr::{Instruction, Op, OprCode};

/// A reference to an already-emitted instruction, usable to patch its
/// `level`/`address` fields once the target location is known. Plain
/// indices into the instruction vector, since holding a mutable reference
/// into the vector across further `emit` calls would fight the borrow
/// checker for no benefit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handle(usize);

pub struct Assembler {
    code: Vec<Instruction>,
}

impl Assembler {
    pub fn new() -> Self {
        Assembler { code: Vec::new() }
    }

    /// The address the next emitted instruction will receive.
    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    fn emit(&mut self, instruction: Instruction) -> Handle {
        let handle = Handle(self.code.len());
        self.code.push(instruction);
        handle
    }

    pub fn load_literal(&mut self, value: i64) -> Handle {
        self.emit(Instruction::lit(value))
    }

    pub fn load(&mut self, level: i64, slot: i64) -> Handle {
        self.emit(Instruction::lod(level, slot))
    }

    pub fn store(&mut self, level: i64, slot: i64) -> Handle {
        self.emit(Instruction::sto(level, slot))
    }

    /// Emits a fully-bound call.
    pub fn call(&mut self, level: i64, address: i64) -> Handle {
        self.emit(Instruction::cal(level, address))
    }

    /// Emits a call whose address is not yet known; returns a handle to
    /// patch once the callee's entry address has been recorded.
    pub fn call_pending(&mut self, level: i64) -> Handle {
        self.emit(Instruction::cal(level, 0))
    }

    pub fn enter(&mut self, cells: i64) -> Handle {
        self.emit(Instruction::int(cells))
    }

    pub fn leave(&mut self) -> Handle {
        self.emit(Instruction::opr(OprCode::Ret))
    }

    pub fn read(&mut self) -> Handle {
        self.emit(Instruction::opr(OprCode::Read))
    }

    pub fn write(&mut self) -> Handle {
        self.emit(Instruction::opr(OprCode::Write))
    }

    pub fn operation(&mut self, code: OprCode) -> Handle {
        self.emit(Instruction::opr(code))
    }

    /// Emits an unconditional jump to a known address.
    pub fn jump(&mut self, address: i64) -> Handle {
        self.emit(Instruction::jmp(address))
    }

    /// Emits an unconditional jump whose target isn't known yet.
    pub fn branch(&mut self) -> Handle {
        self.emit(Instruction::jmp(0))
    }

    /// Emits a conditional (jump-on-zero) branch whose target isn't known yet.
    pub fn branch_if_false(&mut self) -> Handle {
        self.emit(Instruction::jpc(0))
    }

    pub fn patch_address(&mut self, handle: Handle, address: usize) {
        self.code[handle.0].address = address as i64;
    }

    pub fn patch_level(&mut self, handle: Handle, level: i64) {
        self.code[handle.0].level = level;
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.code
    }
}

impl Default for Assembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a relational or arithmetic token to the `OPR` sub-opcode it compiles to.
pub fn operation_for(token: TokenKind) -> Option<OprCode> {
    match token {
        TokenKind::Plus => Some(OprCode::Add),
        TokenKind::Minus => Some(OprCode::Sub),
        TokenKind::Star => Some(OprCode::Mul),
        TokenKind::Slash => Some(OprCode::Div),
        TokenKind::Eq => Some(OprCode::Eq),
        TokenKind::Neq => Some(OprCode::Neq),
        TokenKind::Lt => Some(OprCode::Le),
        TokenKind::Leq => Some(OprCode::Leq),
        TokenKind::Gt => Some(OprCode::Ge),
        TokenKind::Geq => Some(OprCode::Geq),
        TokenKind::Odd => Some(OprCode::Odd),
        _ => None,
    }
}

//! The stack machine that executes compiled PL/0 bytecode.

use std::io::{BufRead, Write};

use pl0_bytecode::{Instruction, Op, OprCode};
use thiserror::Error;

/// Capacity of the fixed integer stack, in cells.
const STACK_SIZE: usize = 1 << 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("stack overflow")]
    StackOverflow,

    #[error("unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("expected an integer on standard input")]
    InvalidInput,
}

/// A fixed-size integer array with `pc`/`bp`/`sp` registers, executing a
/// two-link activation-record discipline: each call frame is
/// `[return_address, dynamic_link, static_link, locals...]`.
pub struct Vm {
    code: Vec<Instruction>,
    stack: Vec<i64>,
    pc: usize,
    bp: usize,
    sp: usize,
}

impl Vm {
    pub fn new(code: Vec<Instruction>) -> Self {
        let mut stack = vec![0i64; STACK_SIZE];
        // The outermost call never returns anywhere; its "return address"
        // points past the end of the program, so the final RET halts the loop.
        stack[0] = code.len() as i64;
        Vm { code, stack, pc: 0, bp: 0, sp: 0 }
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: &mut R, output: &mut W) -> Result<(), RuntimeError> {
        let mut line = String::new();
        let mut pos = 0usize;

        while self.pc < self.code.len() {
            let instr = self.code[self.pc];
            self.pc += 1;
            log::trace!("pc={} op={:?} level={} address={}", self.pc - 1, instr.op, instr.level, instr.address);

            match instr.op {
                Op::Lit => self.push(instr.address)?,
                Op::Lod => {
                    let addr = self.resolve(instr.level) + 3 + instr.address as usize;
                    self.push(self.stack[addr])?;
                }
                Op::Sto => {
                    let addr = self.resolve(instr.level) + 3 + instr.address as usize;
                    let value = self.pop()?;
                    self.stack[addr] = value;
                }
                Op::Cal => {
                    let static_link = self.resolve(instr.level);
                    self.check_capacity(self.sp + 3)?;
                    self.stack[self.sp] = self.pc as i64;
                    self.stack[self.sp + 1] = self.bp as i64;
                    self.stack[self.sp + 2] = static_link as i64;
                    self.bp = self.sp;
                    self.pc = instr.address as usize;
                }
                Op::Int => {
                    self.check_capacity(self.sp + instr.address as usize)?;
                    self.sp += instr.address as usize;
                }
                Op::Jmp => self.pc = instr.address as usize,
                Op::Jpc => {
                    if self.pop()? == 0 {
                        self.pc = instr.address as usize;
                    }
                }
                Op::Opr => self.execute_opr(instr.address, input, output, &mut line, &mut pos)?,
            }
        }
        Ok(())
    }

    /// Walks `level` static links outward from the current frame, returning
    /// the base-of-frame address of the ancestor `level` scopes up.
    fn resolve(&self, level: i64) -> usize {
        let mut base = self.bp;
        for _ in 0..level {
            base = self.stack[base + 2] as usize;
        }
        base
    }

    fn check_capacity(&self, required: usize) -> Result<(), RuntimeError> {
        if required > self.stack.len() {
            Err(RuntimeError::StackOverflow)
        } else {
            Ok(())
        }
    }

    fn push(&mut self, value: i64) -> Result<(), RuntimeError> {
        self.check_capacity(self.sp + 1)?;
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<i64, RuntimeError> {
        if self.sp == 0 {
            return Err(RuntimeError::StackOverflow);
        }
        self.sp -= 1;
        Ok(self.stack[self.sp])
    }

    fn execute_opr<R: BufRead, W: Write>(
        &mut self,
        address: i64,
        input: &mut R,
        output: &mut W,
        line: &mut String,
        pos: &mut usize,
    ) -> Result<(), RuntimeError> {
        let code = OprCode::from_i64(address).expect("compiler only ever emits known OPR codes");
        match code {
            OprCode::Ret => {
                self.pc = self.stack[self.bp] as usize;
                let static_link_slot = self.bp + 1;
                self.sp = self.bp;
                self.bp = self.stack[static_link_slot] as usize;
            }
            OprCode::Write => {
                let value = self.pop()?;
                let _ = writeln!(output, "{value}");
            }
            OprCode::Read => {
                let value = next_integer(input, line, pos)?;
                self.push(value)?;
            }
            OprCode::Odd => {
                let value = self.pop()?;
                self.push(value.rem_euclid(2))?;
            }
            _ => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                let result = match code {
                    OprCode::Add => lhs + rhs,
                    OprCode::Sub => lhs - rhs,
                    OprCode::Mul => lhs * rhs,
                    OprCode::Div => {
                        if rhs == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        lhs / rhs
                    }
                    OprCode::Le => (lhs < rhs) as i64,
                    OprCode::Leq => (lhs <= rhs) as i64,
                    OprCode::Ge => (lhs > rhs) as i64,
                    OprCode::Geq => (lhs >= rhs) as i64,
                    OprCode::Eq => (lhs == rhs) as i64,
                    OprCode::Neq => (lhs != rhs) as i64,
                    _ => unreachable!("RET/WRITE/READ/ODD handled above"),
                };
                self.push(result)?;
            }
        }
        Ok(())
    }
}

/// Pulls the next whitespace-separated decimal integer (optionally
/// negative) out of `input`, refilling `line` a line at a time.
fn next_integer<R: BufRead>(input: &mut R, line: &mut String, pos: &mut usize) -> Result<i64, RuntimeError> {
    loop {
        if *pos >= line.len() {
            line.clear();
            *pos = 0;
            let read = input.read_line(line).map_err(|_| RuntimeError::UnexpectedEndOfInput)?;
            if read == 0 {
                return Err(RuntimeError::UnexpectedEndOfInput);
            }
        }

        while *pos < line.len() && line.as_bytes()[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        if *pos >= line.len() {
            continue;
        }

        let mut end = *pos;
        if line.as_bytes()[end] == b'-' {
            end += 1;
        }
        let digits_start = end;
        while end < line.len() && line.as_bytes()[end].is_ascii_digit() {
            end += 1;
        }
        if end == digits_start {
            return Err(RuntimeError::InvalidInput);
        }

        let text = &line[*pos..end];
        let value: i64 = text.parse().map_err(|_| RuntimeError::InvalidInput)?;
        *pos = end;
        return Ok(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl0_bytecode::compile;
    use pl0_syntax::Parser;

    fn run_program(source: &str, stdin: &str) -> String {
        let program = Parser::new(source).parse_program().unwrap();
        let code = compile(&program).unwrap();
        let mut vm = Vm::new(code);
        let mut input = std::io::Cursor::new(stdin.as_bytes().to_vec());
        let mut output = Vec::new();
        vm.run(&mut input, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn arithmetic_precedence() {
        let out = run_program("var x; begin x := 2 + 3 * 4; write x end.", "");
        assert_eq!(out, "14\n");
    }

    #[test]
    fn while_loop_counts_up() {
        let out = run_program(
            "var i; begin i := 0; while i < 5 do begin write i; i := i + 1 end end.",
            "",
        );
        assert_eq!(out, "0\n1\n2\n3\n4\n");
    }

    #[test]
    fn if_else_branches_on_input() {
        assert_eq!(
            run_program("var x; begin read x; if x < 0 then write 0 else write x end.", "-7"),
            "0\n"
        );
        assert_eq!(
            run_program("var x; begin read x; if x < 0 then write 0 else write x end.", "5"),
            "5\n"
        );
    }

    #[test]
    fn nested_procedures_read_enclosing_variables() {
        let out = run_program(
            "var x; \
             procedure outer; var y; \
               procedure inner; begin write x; write y end; \
               begin y := 2; call inner end; \
             begin x := 1; call outer end.",
            "",
        );
        assert_eq!(out, "1\n2\n");
    }

    #[test]
    fn recursive_factorial() {
        let out = run_program(
            "var n, result; \
             procedure fact; \
               begin \
                 if n <= 1 then result := 1 \
                 else begin n := n - 1; call fact; n := n + 1; result := result * n end \
               end; \
             begin n := 5; call fact; write result end.",
            "",
        );
        assert_eq!(out, "120\n");
    }

    #[test]
    fn division_by_zero_is_a_runtime_error() {
        let program = Parser::new("var x; begin x := 1 / 0 end.").parse_program().unwrap();
        let code = compile(&program).unwrap();
        let mut vm = Vm::new(code);
        let mut input = std::io::Cursor::new(Vec::new());
        let mut output = Vec::new();
        assert_eq!(vm.run(&mut input, &mut output), Err(RuntimeError::DivisionByZero));
    }

    #[test]
    fn odd_predicate() {
        let out = run_program("begin if odd 3 then write 1 else write 0 end.", "");
        assert_eq!(out, "1\n");
    }
}

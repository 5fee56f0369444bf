//! The bytecode instruction format: a triple of `(op, level, address)`.

use std::fmt;

/// The eight opcodes of the stack machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Lit,
    Lod,
    Sto,
    Cal,
    Int,
    Jmp,
    Jpc,
    Opr,
}

impl Op {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Lit => "LIT",
            Op::Lod => "LOD",
            Op::Sto => "STO",
            Op::Cal => "CAL",
            Op::Int => "INT",
            Op::Jmp => "JMP",
            Op::Jpc => "JPC",
            Op::Opr => "OPR",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// The sub-opcodes an `OPR` instruction may carry in its `address` field.
/// These numeric identities are part of the wire format and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum OprCode {
    Ret = 0,
    Sub = 1,
    Add = 2,
    Div = 3,
    Mul = 4,
    Le = 5,
    Leq = 6,
    Ge = 7,
    Geq = 8,
    Eq = 9,
    Neq = 10,
    Odd = 11,
    Write = 14,
    Read = 16,
}

impl OprCode {
    pub fn from_i64(value: i64) -> Option<OprCode> {
        match value {
            0 => Some(OprCode::Ret),
            1 => Some(OprCode::Sub),
            2 => Some(OprCode::Add),
            3 => Some(OprCode::Div),
            4 => Some(OprCode::Mul),
            5 => Some(OprCode::Le),
            6 => Some(OprCode::Leq),
            7 => Some(OprCode::Ge),
            8 => Some(OprCode::Geq),
            9 => Some(OprCode::Eq),
            10 => Some(OprCode::Neq),
            11 => Some(OprCode::Odd),
            14 => Some(OprCode::Write),
            16 => Some(OprCode::Read),
            _ => None,
        }
    }
}

/// A single bytecode instruction.
///
/// `level` and `address` are overloaded depending on `op` — e.g. for `LIT`
/// the literal lives in `address` and `level` is unused, while for `LOD`
/// and `STO` both fields are meaningful. This mirrors the wire format
/// described by the reference implementation's `instruction` triple rather
/// than splitting into one Rust enum variant per opcode, so a disassembler
/// can print `level`/`address` uniformly regardless of which opcode it sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub level: i64,
    pub address: i64,
}

impl Instruction {
    pub fn lit(value: i64) -> Self {
        Instruction { op: Op::Lit, level: 0, address: value }
    }

    pub fn lod(level: i64, slot: i64) -> Self {
        Instruction { op: Op::Lod, level, address: slot }
    }

    pub fn sto(level: i64, slot: i64) -> Self {
        Instruction { op: Op::Sto, level, address: slot }
    }

    pub fn cal(level: i64, address: i64) -> Self {
        Instruction { op: Op::Cal, level, address }
    }

    pub fn int(cells: i64) -> Self {
        Instruction { op: Op::Int, level: 0, address: cells }
    }

    pub fn jmp(address: i64) -> Self {
        Instruction { op: Op::Jmp, level: 0, address }
    }

    pub fn jpc(address: i64) -> Self {
        Instruction { op: Op::Jpc, level: 0, address }
    }

    pub fn opr(code: OprCode) -> Self {
        Instruction { op: Op::Opr, level: 0, address: code as i64 }
    }
}

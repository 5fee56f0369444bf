//! Bytecode listing printer: one instruction per line, tab-separated.

use std::fmt::Write as _;

use pl0_bytecode::Instruction;

/// Formats `code` as `<index>\t<opname>\t<level>\t<address>` per line.
pub fn disassemble(code: &[Instruction]) -> String {
    let mut out = String::new();
    for (index, instr) in code.iter().enumerate() {
        writeln!(&mut out, "{}\t{}\t{}\t{}", index, instr.op.mnemonic(), instr.level, instr.address).unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pl0_bytecode::compile;
    use pl0_syntax::Parser;

    #[test]
    fn listing_has_one_tab_separated_line_per_instruction() {
        let program = Parser::new("var x; begin x := 1 end.").parse_program().unwrap();
        let code = compile(&program).unwrap();
        let listing = disassemble(&code);
        assert_eq!(listing.lines().count(), code.len());
        for (index, line) in listing.lines().enumerate() {
            let fields: Vec<_> = line.split('\t').collect();
            assert_eq!(fields.len(), 4);
            assert_eq!(fields[0], index.to_string());
        }
    }
}

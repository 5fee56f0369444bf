//! End-to-end pipeline tests: source text in, stdout out, per the
//! reference scenarios for the PL/0 toolchain.

use pl0_bytecode::compile;
use pl0_syntax::{ParseError, Parser};
use pl0_vm::Vm;

fn run(source: &str, stdin: &str) -> String {
    let program = Parser::new(source).parse_program().expect("parse");
    let code = compile(&program).expect("compile");
    let mut vm = Vm::new(code);
    let mut input = std::io::Cursor::new(stdin.as_bytes().to_vec());
    let mut output = Vec::new();
    vm.run(&mut input, &mut output).expect("run");
    String::from_utf8(output).unwrap()
}

#[test]
fn arithmetic() {
    assert_eq!(run("var x; begin x := 2 + 3 * 4; write x end.", ""), "14\n");
}

#[test]
fn while_loop() {
    assert_eq!(
        run(
            "var i; begin i := 0; while i < 5 do begin write i; i := i + 1 end end.",
            ""
        ),
        "0\n1\n2\n3\n4\n"
    );
}

#[test]
fn if_else_reads_stdin() {
    let source = "var x; begin read x; if x < 0 then write 0 else write x end.";
    assert_eq!(run(source, "-7"), "0\n");
    assert_eq!(run(source, "5"), "5\n");
}

#[test]
fn nested_procedures_share_lexical_scope() {
    let source = "var x; \
         procedure outer; var y; \
           procedure inner; begin write x; write y end; \
           begin y := 2; call inner end; \
         begin x := 1; call outer end.";
    assert_eq!(run(source, ""), "1\n2\n");
}

#[test]
fn recursive_factorial_of_five() {
    let source = "var n, r; \
         procedure fact; \
           begin \
             if n = 0 then r := 1 \
             else begin r := n; n := n - 1; call fact; r := r * (n + 1) end \
           end; \
         begin n := 5; call fact; write r end.";
    assert_eq!(run(source, ""), "120\n");
}

#[test]
fn forward_call_within_a_block() {
    let source = "procedure a; begin call b end; \
         procedure b; begin write 7 end; \
         begin call a end.";
    assert_eq!(run(source, ""), "7\n");
}

#[test]
fn undeclared_identifier_is_a_diagnostic_error() {
    let err = Parser::new("var x; begin x := y end.")
        .parse_program()
        .unwrap_err();
    match err {
        ParseError::Undeclared { name, location } => {
            assert_eq!(name, "y");
            assert_eq!(location.line, 1);
        }
        other => panic!("expected an undeclared-identifier error, got {other:?}"),
    }
}

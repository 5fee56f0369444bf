mod cli;
mod error;

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser as ClapParser;
use log::{debug, Level};

use cli::Args;
use error::CliError;
use pl0_bytecode::compile;
use pl0_fmt::{disassemble, print_program, program_to_dot};
use pl0_lexer::Lexer;
use pl0_syntax::Parser;
use pl0_vm::Vm;

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => Level::Warn,
        1 => Level::Debug,
        _ => Level::Trace,
    };
    let _ = simple_logger::init_with_level(level);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let source = std::fs::read_to_string(&args.source).map_err(|source| CliError::Io {
        path: args.source.clone(),
        source,
    })?;

    if args.show_tokens {
        show_tokens(&source);
    }

    let program = Parser::new(&source).parse_program()?;
    debug!("parsed {} top-level declaration groups", program.block.procedures.len());

    if args.show_ast {
        print!("{}", print_program(&program));
    }

    if let Some(path) = &args.plot_tree {
        let dot = program_to_dot(&program);
        std::fs::write(path, dot).map_err(|source| CliError::PlotTreeWrite {
            path: path.clone(),
            source,
        })?;
    }

    let code = compile(&program)?;
    debug!("emitted {} instructions", code.len());

    if args.show_bytecode {
        print!("{}", disassemble(&code));
    }

    if args.compile_only {
        return Ok(());
    }

    let mut vm = Vm::new(code);
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let stdout = io::stdout();
    let mut output = stdout.lock();
    vm.run(&mut input, &mut output)?;
    output.flush().ok();
    debug!("vm halted");
    Ok(())
}

fn show_tokens(source: &str) {
    let mut lexer = Lexer::new(source);
    loop {
        let location = lexer.location();
        let token = lexer.next();
        let done = matches!(token.kind, pl0_lexer::TokenKind::Eos | pl0_lexer::TokenKind::Illegal);
        println!("{location}\t{token}");
        if done {
            break;
        }
    }
}


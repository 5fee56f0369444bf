use std::path::PathBuf;

use clap::Parser;

/// Lexer, parser, bytecode compiler and interpreter for the PL/0 teaching language.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
pub struct Args {
    /// Path to a PL/0 source file
    pub source: PathBuf,

    /// Print the token stream before parsing
    #[arg(short = 'l', long = "show-tokens", default_value_t = false)]
    pub show_tokens: bool,

    /// Print the bytecode listing after compilation
    #[arg(short = 's', long = "show-bytecode", default_value_t = false)]
    pub show_bytecode: bool,

    /// Compile only; do not run the interpreter
    #[arg(short = 'c', long = "compile-only", default_value_t = false)]
    pub compile_only: bool,

    /// Print the parsed abstract syntax tree
    #[arg(short = 't', long = "show-ast", default_value_t = false)]
    pub show_ast: bool,

    /// Write a GraphViz DOT rendering of the AST to the given file
    #[arg(long = "plot-tree", value_name = "FILE")]
    pub plot_tree: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

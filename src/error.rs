//! Aggregates the per-stage error types into the single error the CLI reports,
//! and assigns each error kind the exit code its category gets in `main`.

use std::path::PathBuf;

use pl0_bytecode::CompileError;
use pl0_syntax::ParseError;
use pl0_vm::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("could not read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write '{path}': {source}")]
    PlotTreeWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl CliError {
    /// The process exit code for this error's category (§7 of the error taxonomy).
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Io { .. } | CliError::PlotTreeWrite { .. } => 1,
            CliError::Parse(ParseError::Lexical { .. }) => 2,
            CliError::Parse(ParseError::UnexpectedToken { .. }) => 3,
            CliError::Parse(ParseError::DuplicateSymbol { .. })
            | CliError::Parse(ParseError::Undeclared { .. })
            | CliError::Parse(ParseError::WrongKind { .. }) => 4,
            CliError::Compile(_) => 5,
            CliError::Runtime(_) => 6,
        }
    }
}

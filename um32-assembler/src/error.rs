//! Assembler errors

use thiserror::Error;

/// Every variant except `IoError` carries the 1-based source line.
#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("Syntax error at line {line}: {message}")]
    SyntaxError { line: usize, message: String },

    #[error("Unknown instruction at line {line}: {mnemonic}")]
    UnknownInstruction { line: usize, mnemonic: String },

    #[error("Invalid register at line {line}: {register}")]
    InvalidRegister { line: usize, register: String },

    #[error("Invalid immediate value at line {line}: {value}")]
    InvalidImmediate { line: usize, value: String },

    #[error("Wrong operand count at line {line}: {mnemonic} takes {expected}, found {found}")]
    OperandCount {
        line: usize,
        mnemonic: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid directive at line {line}: .{directive}")]
    InvalidDirective { line: usize, directive: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AssemblerError {
    pub fn line(&self) -> Option<usize> {
        match self {
            AssemblerError::SyntaxError { line, .. }
            | AssemblerError::UnknownInstruction { line, .. }
            | AssemblerError::InvalidRegister { line, .. }
            | AssemblerError::InvalidImmediate { line, .. }
            | AssemblerError::OperandCount { line, .. }
            | AssemblerError::InvalidDirective { line, .. } => Some(*line),
            AssemblerError::IoError(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssemblerError>;

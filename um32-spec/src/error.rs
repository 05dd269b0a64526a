//! # Error Types for UM32

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    // Instruction errors
    #[error("Invalid opcode: {0:#03x}")]
    InvalidOpcode(u8),

    #[error("Invalid register index: {0} (valid range: 0-7)")]
    InvalidRegister(usize),

    #[error("Immediate value {0:#x} does not fit in 25 bits")]
    ImmediateOutOfRange(u32),

    // Program format errors
    #[error("Invalid program size: {0} bytes is not a whole number of words")]
    TrailingBytes(usize),

    // I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpecError>;

//! # UM32 Specification
//!
//! 32-bit register machine with a flat program array and a word heap.
//!
//! ## Key Features
//! - 32-bit words (the only datum size)
//! - 8 general-purpose registers
//! - 14 opcodes in a 4-bit opcode field
//! - Two instruction forms: three 3-bit operands, or register + 25-bit immediate
//! - Programs stored as big-endian word streams with no header

pub mod opcode;
pub mod register;
pub mod encoding;
pub mod instruction;
pub mod fault;
pub mod error;
pub mod program;

pub use opcode::Opcode;
pub use register::{Register, NUM_REGISTERS};
pub use instruction::Instruction;
pub use fault::Fault;
pub use error::{SpecError, Result};
pub use program::Program;

/// Machine word
pub type Word = u32;

/// Word size in bytes
pub const WORD_BYTES: usize = 4;

/// Largest value the immediate form can carry (25 bits)
pub const MAX_IMMEDIATE: Word = (1 << 25) - 1;

/// Value stored by the input instruction once the reader is exhausted
pub const END_OF_INPUT: Word = Word::MAX;

/// Largest value the output instruction accepts
pub const MAX_BYTE: Word = u8::MAX as Word;

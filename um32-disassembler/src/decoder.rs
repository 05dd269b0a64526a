//! Instruction decoder

use crate::error::{DisassemblerError, Result};
use um32_spec::{Instruction, SpecError, Word};

/// Decode a 32-bit instruction word
pub fn decode(word: Word) -> Result<Instruction> {
    Instruction::decode(word).map_err(|e| match e {
        SpecError::InvalidOpcode(code) => DisassemblerError::UnknownOpcode(code),
        // decode only rejects opcodes
        _ => DisassemblerError::UnknownOpcode(um32_spec::encoding::extract_opcode(word) as u8),
    })
}

//! # Instruction Encoding Constants and Helpers
//!
//! Centralized bit positions, masks and pure extract/encode functions for
//! UM32 instruction words.
//!
//! ## Instruction Format (32-bit)
//!
//! ```text
//! Standard:  [opcode:4][unused:19][a:3][b:3][c:3]
//! Immediate: [opcode:4][reg:3][value:25]
//! ```

use crate::{Opcode, Word};

// ============================================================================
// Bit Position Constants
// ============================================================================

/// Opcode field: bits 28-31 (4 bits)
pub const OPCODE_SHIFT: u32 = 28;

/// Operand A field: bits 6-8 (3 bits)
pub const A_SHIFT: u32 = 6;

/// Operand B field: bits 3-5 (3 bits)
pub const B_SHIFT: u32 = 3;

/// Operand C field: bits 0-2 (3 bits)
pub const C_SHIFT: u32 = 0;

/// Immediate-form register field: bits 25-27 (3 bits)
pub const IMM_REGISTER_SHIFT: u32 = 25;

// ============================================================================
// Field Masks
// ============================================================================

/// Opcode mask (4 bits, after shifting)
pub const OPCODE_MASK: u32 = 0xF;

/// Register field mask (3 bits)
pub const REGISTER_MASK: u32 = 0x7;

/// Immediate value mask (25 bits)
pub const IMM_MASK: u32 = 0x01FF_FFFF;

// ============================================================================
// Field Extraction Functions
// ============================================================================

/// Extract opcode (bits 28-31)
#[inline]
pub const fn extract_opcode(word: Word) -> u32 {
    (word >> OPCODE_SHIFT) & OPCODE_MASK
}

/// Extract operand A (bits 6-8)
#[inline]
pub const fn extract_a(word: Word) -> u32 {
    (word >> A_SHIFT) & REGISTER_MASK
}

/// Extract operand B (bits 3-5)
#[inline]
pub const fn extract_b(word: Word) -> u32 {
    (word >> B_SHIFT) & REGISTER_MASK
}

/// Extract operand C (bits 0-2)
#[inline]
pub const fn extract_c(word: Word) -> u32 {
    (word >> C_SHIFT) & REGISTER_MASK
}

/// Extract the immediate-form register (bits 25-27)
#[inline]
pub const fn extract_imm_register(word: Word) -> u32 {
    (word >> IMM_REGISTER_SHIFT) & REGISTER_MASK
}

/// Extract the immediate value (bits 0-24)
#[inline]
pub const fn extract_imm_value(word: Word) -> u32 {
    word & IMM_MASK
}

// ============================================================================
// Instruction Encoding Functions
// ============================================================================

/// Encode a standard-form instruction
#[inline]
pub const fn encode_standard(opcode: Opcode, a: u32, b: u32, c: u32) -> Word {
    ((opcode.to_u8() as u32) << OPCODE_SHIFT)
        | ((a & REGISTER_MASK) << A_SHIFT)
        | ((b & REGISTER_MASK) << B_SHIFT)
        | ((c & REGISTER_MASK) << C_SHIFT)
}

/// Encode an immediate-form instruction
#[inline]
pub const fn encode_immediate(opcode: Opcode, register: u32, value: u32) -> Word {
    ((opcode.to_u8() as u32) << OPCODE_SHIFT)
        | ((register & REGISTER_MASK) << IMM_REGISTER_SHIFT)
        | (value & IMM_MASK)
}

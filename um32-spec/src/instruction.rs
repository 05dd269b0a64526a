//! UM32 Instruction Set
//!
//! Typed view of an instruction word. Operands that an opcode does not use
//! are ignored on decode and written as zero on encode.

use crate::encoding::*;
use crate::error::{Result, SpecError};
use crate::register::Register;
use crate::{Opcode, Word, MAX_IMMEDIATE};
use serde::{Deserialize, Serialize};

/// UM32 Instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Instruction {
    /// CMOV: if c != 0 then a = b
    ConditionalMove { a: Register, b: Register, c: Register },

    /// GETP: a = array(b)[c], array 0 being the program
    ArrayGet { a: Register, b: Register, c: Register },

    /// SETP: array(a)[b] = c, array 0 being the program
    ArraySet { a: Register, b: Register, c: Register },

    /// ADD: a = b + c (wrapping)
    Add { a: Register, b: Register, c: Register },

    /// MUL: a = b * c (wrapping)
    Multiply { a: Register, b: Register, c: Register },

    /// DIV: a = b / c (unsigned)
    Divide { a: Register, b: Register, c: Register },

    /// NAND: a = !(b & c)
    Nand { a: Register, b: Register, c: Register },

    /// HALT
    Halt,

    /// ALLOC: b = address of a new block of c words
    Allocate { b: Register, c: Register },

    /// FREE: release block c
    Free { c: Register },

    /// OUTB: write c as one byte
    Output { c: Register },

    /// INB: c = next input byte
    Input { c: Register },

    /// LOAD: program = copy of block b (unless b = 0), ip = c
    LoadProgram { b: Register, c: Register },

    /// LI: a = value (25 bits)
    LoadImmediate { a: Register, value: Word },
}

impl Instruction {
    /// Decode an instruction word
    ///
    /// Fails only for opcodes outside 0x0-0xD.
    pub fn decode(word: Word) -> Result<Self> {
        let code = extract_opcode(word) as u8;
        let opcode = Opcode::from_u8(code).ok_or(SpecError::InvalidOpcode(code))?;

        let a = Register::from_field(extract_a(word));
        let b = Register::from_field(extract_b(word));
        let c = Register::from_field(extract_c(word));

        Ok(match opcode {
            Opcode::ConditionalMove => Instruction::ConditionalMove { a, b, c },
            Opcode::ArrayGet => Instruction::ArrayGet { a, b, c },
            Opcode::ArraySet => Instruction::ArraySet { a, b, c },
            Opcode::Add => Instruction::Add { a, b, c },
            Opcode::Multiply => Instruction::Multiply { a, b, c },
            Opcode::Divide => Instruction::Divide { a, b, c },
            Opcode::Nand => Instruction::Nand { a, b, c },
            Opcode::Halt => Instruction::Halt,
            Opcode::Allocate => Instruction::Allocate { b, c },
            Opcode::Free => Instruction::Free { c },
            Opcode::Output => Instruction::Output { c },
            Opcode::Input => Instruction::Input { c },
            Opcode::LoadProgram => Instruction::LoadProgram { b, c },
            Opcode::LoadImmediate => Instruction::LoadImmediate {
                a: Register::from_field(extract_imm_register(word)),
                value: extract_imm_value(word),
            },
        })
    }

    /// Encode to an instruction word
    ///
    /// Immediate values wider than 25 bits are truncated; use
    /// [`Instruction::load_immediate`] to reject them instead.
    pub fn encode(&self) -> Word {
        let r = |reg: &Register| reg.field();
        match self {
            Instruction::ConditionalMove { a, b, c }
            | Instruction::ArrayGet { a, b, c }
            | Instruction::ArraySet { a, b, c }
            | Instruction::Add { a, b, c }
            | Instruction::Multiply { a, b, c }
            | Instruction::Divide { a, b, c }
            | Instruction::Nand { a, b, c } => encode_standard(self.opcode(), r(a), r(b), r(c)),
            Instruction::Halt => encode_standard(Opcode::Halt, 0, 0, 0),
            Instruction::Allocate { b, c } | Instruction::LoadProgram { b, c } => {
                encode_standard(self.opcode(), 0, r(b), r(c))
            }
            Instruction::Free { c } | Instruction::Output { c } | Instruction::Input { c } => {
                encode_standard(self.opcode(), 0, 0, r(c))
            }
            Instruction::LoadImmediate { a, value } => {
                encode_immediate(Opcode::LoadImmediate, r(a), *value)
            }
        }
    }

    /// Checked constructor for the immediate form
    pub fn load_immediate(a: Register, value: Word) -> Result<Self> {
        if value > MAX_IMMEDIATE {
            return Err(SpecError::ImmediateOutOfRange(value));
        }
        Ok(Instruction::LoadImmediate { a, value })
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::ConditionalMove { .. } => Opcode::ConditionalMove,
            Instruction::ArrayGet { .. } => Opcode::ArrayGet,
            Instruction::ArraySet { .. } => Opcode::ArraySet,
            Instruction::Add { .. } => Opcode::Add,
            Instruction::Multiply { .. } => Opcode::Multiply,
            Instruction::Divide { .. } => Opcode::Divide,
            Instruction::Nand { .. } => Opcode::Nand,
            Instruction::Halt => Opcode::Halt,
            Instruction::Allocate { .. } => Opcode::Allocate,
            Instruction::Free { .. } => Opcode::Free,
            Instruction::Output { .. } => Opcode::Output,
            Instruction::Input { .. } => Opcode::Input,
            Instruction::LoadProgram { .. } => Opcode::LoadProgram,
            Instruction::LoadImmediate { .. } => Opcode::LoadImmediate,
        }
    }
}

impl TryFrom<Word> for Instruction {
    type Error = SpecError;

    fn try_from(word: Word) -> Result<Self> {
        Instruction::decode(word)
    }
}

impl From<Instruction> for Word {
    fn from(instr: Instruction) -> Word {
        instr.encode()
    }
}

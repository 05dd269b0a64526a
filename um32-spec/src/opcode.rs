//! # UM32 Opcode Definitions
//!
//! Opcodes occupy the top 4 bits of every instruction word. Values
//! 0x0-0xD are defined; 0xE and 0xF are invalid instructions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instruction opcode (4 bits, values 0x0-0xD)
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    /// CMOV: if r[c] != 0 then r[a] = r[b]
    ConditionalMove = 0x0,
    /// GETP: r[a] = array(r[b])[r[c]]
    ArrayGet = 0x1,
    /// SETP: array(r[a])[r[b]] = r[c]
    ArraySet = 0x2,
    /// ADD: r[a] = r[b] + r[c] (mod 2^32)
    Add = 0x3,
    /// MUL: r[a] = r[b] * r[c] (mod 2^32)
    Multiply = 0x4,
    /// DIV: r[a] = r[b] / r[c] (unsigned)
    Divide = 0x5,
    /// NAND: r[a] = !(r[b] & r[c])
    Nand = 0x6,
    /// HALT: stop the machine
    Halt = 0x7,
    /// ALLOC: r[b] = new heap block of r[c] words
    Allocate = 0x8,
    /// FREE: release heap block r[c]
    Free = 0x9,
    /// OUTB: write r[c] as one byte
    Output = 0xA,
    /// INB: r[c] = next input byte, or all ones at end of input
    Input = 0xB,
    /// LOAD: replace the program with block r[b] (0 = keep) and jump to r[c]
    LoadProgram = 0xC,
    /// LI: r = 25-bit immediate
    LoadImmediate = 0xD,
}

impl Opcode {
    /// Every defined opcode, in encoding order
    pub const ALL: [Opcode; 14] = [
        Opcode::ConditionalMove,
        Opcode::ArrayGet,
        Opcode::ArraySet,
        Opcode::Add,
        Opcode::Multiply,
        Opcode::Divide,
        Opcode::Nand,
        Opcode::Halt,
        Opcode::Allocate,
        Opcode::Free,
        Opcode::Output,
        Opcode::Input,
        Opcode::LoadProgram,
        Opcode::LoadImmediate,
    ];

    #[inline]
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x0 => Some(Opcode::ConditionalMove),
            0x1 => Some(Opcode::ArrayGet),
            0x2 => Some(Opcode::ArraySet),
            0x3 => Some(Opcode::Add),
            0x4 => Some(Opcode::Multiply),
            0x5 => Some(Opcode::Divide),
            0x6 => Some(Opcode::Nand),
            0x7 => Some(Opcode::Halt),
            0x8 => Some(Opcode::Allocate),
            0x9 => Some(Opcode::Free),
            0xA => Some(Opcode::Output),
            0xB => Some(Opcode::Input),
            0xC => Some(Opcode::LoadProgram),
            0xD => Some(Opcode::LoadImmediate),
            _ => None,
        }
    }

    /// Assembly mnemonic
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::ConditionalMove => "cmov",
            Opcode::ArrayGet => "getp",
            Opcode::ArraySet => "setp",
            Opcode::Add => "add",
            Opcode::Multiply => "mul",
            Opcode::Divide => "div",
            Opcode::Nand => "nand",
            Opcode::Halt => "halt",
            Opcode::Allocate => "alloc",
            Opcode::Free => "free",
            Opcode::Output => "outb",
            Opcode::Input => "inb",
            Opcode::LoadProgram => "load",
            Opcode::LoadImmediate => "li",
        }
    }

    /// Look up an opcode by mnemonic (case-insensitive)
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        let text = text.to_ascii_lowercase();
        Self::ALL.into_iter().find(|op| op.mnemonic() == text)
    }

    /// Number of register operands in the standard form
    pub const fn operand_count(self) -> usize {
        match self {
            Opcode::ConditionalMove
            | Opcode::ArrayGet
            | Opcode::ArraySet
            | Opcode::Add
            | Opcode::Multiply
            | Opcode::Divide
            | Opcode::Nand => 3,
            Opcode::Allocate | Opcode::LoadProgram => 2,
            Opcode::Free | Opcode::Output | Opcode::Input => 1,
            Opcode::Halt => 0,
            // register + immediate
            Opcode::LoadImmediate => 2,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

//! Instruction formatting to assembly text
//!
//! Output uses the syntax the assembler accepts, so listings re-assemble.

use um32_spec::{Instruction, Register, Word};

/// Format instruction as assembly text
pub fn format(instr: &Instruction) -> String {
    let mnemonic = instr.opcode().mnemonic();
    match instr {
        Instruction::ConditionalMove { a, b, c }
        | Instruction::ArrayGet { a, b, c }
        | Instruction::ArraySet { a, b, c }
        | Instruction::Add { a, b, c }
        | Instruction::Multiply { a, b, c }
        | Instruction::Divide { a, b, c }
        | Instruction::Nand { a, b, c } => {
            format!("{:<5} {} {} {}", mnemonic, format_reg(*a), format_reg(*b), format_reg(*c))
        }
        Instruction::Halt => mnemonic.to_string(),
        Instruction::Allocate { b, c } | Instruction::LoadProgram { b, c } => {
            format!("{:<5} {} {}", mnemonic, format_reg(*b), format_reg(*c))
        }
        Instruction::Free { c } | Instruction::Output { c } | Instruction::Input { c } => {
            format!("{:<5} {}", mnemonic, format_reg(*c))
        }
        Instruction::LoadImmediate { a, value } => {
            format!("{:<5} {} $0x{:x}", mnemonic, format_reg(*a), value)
        }
    }
}

pub fn format_reg(reg: Register) -> &'static str {
    reg.name()
}

/// Raw data word, for words that do not decode to themselves
pub fn format_word(word: Word) -> String {
    format!(".word 0x{:08x}", word)
}

/// One listing line: address, then the instruction or raw word.
///
/// Words whose unused bits are set, or that otherwise differ from the
/// encoding of their decoded instruction, are listed as `.word` data.
pub fn format_line(address: usize, word: Word) -> String {
    let text = match crate::decode(word) {
        Ok(instr) if instr.encode() == word => format(&instr),
        _ => format_word(word),
    };
    format!("{:08x}: {}", address, text)
}

//! # UM32 Disassembler
//!
//! Disassemble UM32 program words into assembly listings.
//!
//! Every line has the form `xxxxxxxx: mnemonic operands`, where the prefix
//! is the word's index in the program. Words with an unknown opcode are
//! listed as `.word` data. The assembler treats the prefix as a label, so a
//! listing assembles back to the words it came from.
//!
//! ## Example
//!
//! ```rust
//! use um32_disassembler::disassemble;
//!
//! let listing = disassemble(&[0xD000_0048, 0xA000_0000, 0x7000_0000]);
//! assert!(listing.contains("outb"));
//! ```

pub mod error;
pub mod decoder;
pub mod formatter;
pub mod disassembler;

pub use error::{DisassemblerError, Result};
pub use disassembler::{disassemble, disassemble_to};
pub use decoder::decode;
pub use formatter::{format, format_line};

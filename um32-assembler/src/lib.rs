//! UM32 Assembler
//!
//! Assemble UM32 assembly language into program words.
//!
//! ## Example
//!
//! ```rust
//! use um32_assembler::assemble;
//!
//! let source = r#"
//!     li r0 $0x48   # 'H'
//!     outb r0
//!     halt
//! "#;
//!
//! let program = assemble(source).unwrap();
//! assert_eq!(program.len(), 3);
//! ```

pub mod error;
pub mod lexer;
pub mod parser;
pub mod assembler;

pub use error::{AssemblerError, Result};
pub use assembler::{assemble, assemble_from};
pub use parser::{parse_instruction, parse_line, parse_register, Statement};

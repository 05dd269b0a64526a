//! Main assembler logic

use crate::error::Result;
use crate::parser::parse_line;
use std::io::BufRead;
use um32_spec::Program;

/// Assemble source code into a program
pub fn assemble(source: &str) -> Result<Program> {
    let mut words = Vec::new();
    for (index, text) in source.lines().enumerate() {
        if let Some(statement) = parse_line(text, index + 1)? {
            words.push(statement.encode());
        }
    }
    Ok(Program::new(words))
}

/// Assemble line by line from a reader
pub fn assemble_from<R: BufRead>(input: R) -> Result<Program> {
    let mut words = Vec::new();
    for (index, text) in input.lines().enumerate() {
        if let Some(statement) = parse_line(&text?, index + 1)? {
            words.push(statement.encode());
        }
    }
    Ok(Program::new(words))
}

//! Main disassembler logic

use crate::error::Result;
use crate::formatter::format_line;
use std::io::Write;
use um32_spec::Word;

/// Disassemble program words into a listing, one line per word
pub fn disassemble(words: &[Word]) -> String {
    let mut output = String::new();
    for (address, &word) in words.iter().enumerate() {
        output.push_str(&format_line(address, word));
        output.push('\n');
    }
    output
}

/// Stream a listing to `output`
pub fn disassemble_to<W: Write>(words: &[Word], mut output: W) -> Result<()> {
    for (address, &word) in words.iter().enumerate() {
        writeln!(output, "{}", format_line(address, word))?;
    }
    output.flush()?;
    Ok(())
}

//! Assembly parser
//!
//! One statement per line:
//!
//! ```text
//! [label:] mnemonic [operands] [# comment]
//! [label:] .word value
//! ```

use crate::error::{AssemblerError, Result};
use crate::lexer::Token;
use logos::Logos;
use um32_spec::{Instruction, Opcode, Register, Word, MAX_IMMEDIATE};

/// A parsed source line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    Instruction(Instruction),
    /// Raw data word from `.word`
    Word(Word),
}

impl Statement {
    pub fn encode(&self) -> Word {
        match self {
            Statement::Instruction(instr) => instr.encode(),
            Statement::Word(word) => *word,
        }
    }
}

/// Drop the comment, then everything up to the first `:`.
fn strip(text: &str) -> &str {
    let code = text.find('#').map_or(text, |i| &text[..i]);
    let code = code.find(':').map_or(code, |i| &code[i + 1..]);
    code.trim()
}

fn tokenize(code: &str, line: usize) -> Result<Vec<(Token, &str)>> {
    let mut tokens = Vec::new();
    let mut lex = Token::lexer(code);
    while let Some(token) = lex.next() {
        match token {
            Ok(token) => tokens.push((token, lex.slice())),
            Err(()) => {
                return Err(AssemblerError::SyntaxError {
                    line,
                    message: format!("unexpected input '{}'", lex.slice()),
                })
            }
        }
    }
    Ok(tokens)
}

/// Parse one source line. Blank, comment-only and label-only lines give `None`.
pub fn parse_line(text: &str, line: usize) -> Result<Option<Statement>> {
    let tokens = tokenize(strip(text), line)?;
    let Some(((head, head_text), rest)) = tokens.split_first() else {
        return Ok(None);
    };

    // commas are optional separators
    let operands: Vec<&(Token, &str)> = rest.iter().filter(|(t, _)| *t != Token::Comma).collect();

    let statement = match head {
        Token::Identifier(mnemonic) => {
            let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| {
                AssemblerError::UnknownInstruction {
                    line,
                    mnemonic: mnemonic.clone(),
                }
            })?;
            Statement::Instruction(parse_operands(opcode, &operands, line)?)
        }
        Token::Directive(name) if name.eq_ignore_ascii_case("word") => {
            expect_count(".word", 1, operands.len(), line)?;
            Statement::Word(parse_word(operands[0], line)?)
        }
        Token::Directive(name) => {
            return Err(AssemblerError::InvalidDirective {
                line,
                directive: name.clone(),
            })
        }
        _ => {
            return Err(AssemblerError::SyntaxError {
                line,
                message: format!("expected mnemonic, found '{}'", head_text),
            })
        }
    };
    Ok(Some(statement))
}

/// Parse a single instruction with no label or comment
pub fn parse_instruction(text: &str) -> Result<Instruction> {
    match parse_line(text, 1)? {
        Some(Statement::Instruction(instr)) => Ok(instr),
        _ => Err(AssemblerError::SyntaxError {
            line: 1,
            message: format!("expected instruction, found '{}'", text.trim()),
        }),
    }
}

/// Parse register name (`r3` or `3`)
pub fn parse_register(name: &str) -> Result<Register> {
    let tokens = tokenize(name.trim(), 1)?;
    match tokens.as_slice() {
        [token] => register_operand(token, 1),
        _ => Err(AssemblerError::InvalidRegister {
            line: 1,
            register: name.trim().to_string(),
        }),
    }
}

fn expect_count(mnemonic: &str, expected: usize, found: usize, line: usize) -> Result<()> {
    if expected != found {
        return Err(AssemblerError::OperandCount {
            line,
            mnemonic: mnemonic.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

fn register_operand((token, text): &(Token, &str), line: usize) -> Result<Register> {
    let index = match token {
        Token::Register(n) | Token::Number(n) => usize::try_from(*n).ok(),
        _ => None,
    };
    index
        .and_then(Register::from_index)
        .ok_or_else(|| AssemblerError::InvalidRegister {
            line,
            register: text.to_string(),
        })
}

fn parse_word((token, text): &(Token, &str), line: usize) -> Result<Word> {
    let value = match token {
        Token::Hex(n) | Token::Number(n) => Word::try_from(*n).ok(),
        _ => None,
    };
    value.ok_or_else(|| AssemblerError::InvalidImmediate {
        line,
        value: text.to_string(),
    })
}

fn parse_operands(opcode: Opcode, operands: &[&(Token, &str)], line: usize) -> Result<Instruction> {
    expect_count(opcode.mnemonic(), opcode.operand_count(), operands.len(), line)?;

    if opcode == Opcode::LoadImmediate {
        let a = register_operand(operands[0], line)?;
        let (token, text) = operands[1];
        let invalid = || AssemblerError::InvalidImmediate {
            line,
            value: text.to_string(),
        };
        let value = match token {
            Token::Immediate(n) => Word::try_from(*n).map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };
        if value > MAX_IMMEDIATE {
            return Err(invalid());
        }
        return Instruction::load_immediate(a, value).map_err(|_| invalid());
    }

    let regs = operands
        .iter()
        .map(|op| register_operand(op, line))
        .collect::<Result<Vec<_>>>()?;

    Ok(match (opcode, regs.as_slice()) {
        (Opcode::ConditionalMove, &[a, b, c]) => Instruction::ConditionalMove { a, b, c },
        (Opcode::ArrayGet, &[a, b, c]) => Instruction::ArrayGet { a, b, c },
        (Opcode::ArraySet, &[a, b, c]) => Instruction::ArraySet { a, b, c },
        (Opcode::Add, &[a, b, c]) => Instruction::Add { a, b, c },
        (Opcode::Multiply, &[a, b, c]) => Instruction::Multiply { a, b, c },
        (Opcode::Divide, &[a, b, c]) => Instruction::Divide { a, b, c },
        (Opcode::Nand, &[a, b, c]) => Instruction::Nand { a, b, c },
        (Opcode::Allocate, &[b, c]) => Instruction::Allocate { b, c },
        (Opcode::LoadProgram, &[b, c]) => Instruction::LoadProgram { b, c },
        (Opcode::Free, &[c]) => Instruction::Free { c },
        (Opcode::Output, &[c]) => Instruction::Output { c },
        (Opcode::Input, &[c]) => Instruction::Input { c },
        (Opcode::Halt, &[]) => Instruction::Halt,
        _ => {
            return Err(AssemblerError::SyntaxError {
                line,
                message: format!("malformed operands for {}", opcode),
            })
        }
    })
}

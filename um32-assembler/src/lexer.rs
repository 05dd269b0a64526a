//! # Lexer for UM32 Assembly Language
//!
//! Works on one line at a time, after comments and labels are stripped.

use logos::Logos;

/// Tokens for UM32 assembly
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
pub enum Token {
    /// Mnemonic
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    /// Register (r0-r7; wider indices are rejected by the parser)
    #[regex(r"[rR][0-9]+", |lex| lex.slice()[1..].parse::<u64>().ok(), priority = 3)]
    Register(u64),

    /// Decimal number
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    Number(u64),

    /// Hexadecimal number
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| u64::from_str_radix(&lex.slice()[2..], 16).ok())]
    Hex(u64),

    /// Immediate operand of `li`
    #[regex(r"\$0[xX][0-9a-fA-F]+", |lex| u64::from_str_radix(&lex.slice()[3..], 16).ok())]
    #[regex(r"\$[0-9]+", |lex| lex.slice()[1..].parse::<u64>().ok())]
    Immediate(u64),

    /// Directive (.word)
    #[regex(r"\.[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Directive(String),

    #[token(",")]
    Comma,
}

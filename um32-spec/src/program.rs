//! # Program Word Stream
//!
//! A program file is a bare sequence of big-endian 32-bit words. There is no
//! header and no length prefix; end of file is end of program.

use crate::error::{Result, SpecError};
use crate::{Word, WORD_BYTES};
use std::io::{ErrorKind, Read, Write};

/// Words moved per read/write call
pub const CHUNK_WORDS: usize = 256;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Program {
    pub words: Vec<Word>,
}

impl Program {
    pub fn new(words: Vec<Word>) -> Self {
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Parse big-endian words from a byte buffer
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % WORD_BYTES != 0 {
            return Err(SpecError::TrailingBytes(bytes.len()));
        }
        let words = bytes
            .chunks_exact(WORD_BYTES)
            .map(|chunk| Word::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();
        Ok(Self { words })
    }

    /// Serialize to big-endian bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.words.iter().flat_map(|word| word.to_be_bytes()).collect()
    }

    /// Read a whole program stream, one chunk at a time
    pub fn read_from<R: Read>(mut input: R) -> Result<Self> {
        let mut words = Vec::new();
        let mut chunk = [0u8; CHUNK_WORDS * WORD_BYTES];
        let mut pending = 0usize;

        loop {
            let n = match input.read(&mut chunk[pending..]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            let filled = pending + n;
            let whole = filled - filled % WORD_BYTES;

            words.extend(
                chunk[..whole]
                    .chunks_exact(WORD_BYTES)
                    .map(|w| Word::from_be_bytes([w[0], w[1], w[2], w[3]])),
            );

            // carry a partial word into the next read
            chunk.copy_within(whole..filled, 0);
            pending = filled - whole;
        }

        if pending != 0 {
            return Err(SpecError::TrailingBytes(words.len() * WORD_BYTES + pending));
        }
        Ok(Self { words })
    }

    /// Write the program as big-endian words, one chunk at a time
    pub fn write_to<W: Write>(&self, output: W) -> Result<()> {
        write_words(&self.words, output)
    }
}

/// Write any word slice as a big-endian stream
pub fn write_words<W: Write>(words: &[Word], mut output: W) -> Result<()> {
    let mut chunk = Vec::with_capacity(CHUNK_WORDS * WORD_BYTES);
    for block in words.chunks(CHUNK_WORDS) {
        chunk.clear();
        chunk.extend(block.iter().flat_map(|word| word.to_be_bytes()));
        output.write_all(&chunk)?;
    }
    output.flush()?;
    Ok(())
}

impl From<Vec<Word>> for Program {
    fn from(words: Vec<Word>) -> Self {
        Self::new(words)
    }
}

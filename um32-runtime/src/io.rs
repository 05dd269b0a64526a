//! Byte I/O capabilities
//!
//! The machine never touches stdin/stdout itself. Hosts install a
//! [`ByteReader`] and a [`ByteWriter`]; tests use [`ScriptedInput`] and
//! [`SharedOutput`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read, Write};
use std::rc::Rc;

/// Produces the next input byte, or `None` at end of input
pub trait ByteReader {
    fn read_byte(&mut self) -> Option<u8>;
}

/// Consumes output bytes
pub trait ByteWriter {
    fn write_byte(&mut self, byte: u8);

    /// Push buffered output to its destination. Called before every input.
    fn flush(&mut self) {}
}

/// Input tape consumed front to back
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    bytes: VecDeque<u8>,
}

impl ScriptedInput {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into().into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len()
    }
}

impl ByteReader for ScriptedInput {
    fn read_byte(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }
}

/// Output recorder whose clones share one buffer
#[derive(Debug, Clone, Default)]
pub struct SharedOutput {
    bytes: Rc<RefCell<Vec<u8>>>,
}

impl SharedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> Vec<u8> {
        self.bytes.borrow().clone()
    }

    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
    }

    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.bytes.borrow_mut())
    }
}

impl ByteWriter for SharedOutput {
    fn write_byte(&mut self, byte: u8) {
        self.bytes.borrow_mut().push(byte);
    }
}

/// Adapter over any `std::io::Read`
///
/// Read errors other than interruption end the input.
pub struct StreamReader<R> {
    inner: R,
    done: bool,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, done: false }
    }
}

impl<R: Read> ByteReader for StreamReader<R> {
    fn read_byte(&mut self) -> Option<u8> {
        if self.done {
            return None;
        }
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => return Some(buf[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("input error, treating as end of input: {}", e);
                    break;
                }
            }
        }
        self.done = true;
        None
    }
}

/// Adapter over any `std::io::Write`
///
/// After the first write error further output is dropped.
pub struct StreamWriter<W: Write> {
    inner: W,
    failed: bool,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteWriter for StreamWriter<W> {
    fn write_byte(&mut self, byte: u8) {
        if self.failed {
            return;
        }
        if let Err(e) = self.inner.write_all(&[byte]) {
            tracing::warn!("output error, discarding further output: {}", e);
            self.failed = true;
        }
    }

    fn flush(&mut self) {
        if self.failed {
            return;
        }
        if let Err(e) = self.inner.flush() {
            tracing::warn!("output flush failed: {}", e);
            self.failed = true;
        }
    }
}

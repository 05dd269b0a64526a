//! Execution faults
//!
//! Every machine cycle ends in exactly one of these outcomes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum Fault {
    /// The cycle completed normally
    #[error("ok")]
    None,

    /// A halt instruction was executed
    #[error("halted")]
    Halted,

    /// The instruction pointer ran off the end of the program
    #[error("terminated")]
    Terminated,

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid instruction")]
    InvalidInstruction,

    #[error("invalid address")]
    InvalidAddress,

    #[error("invalid free")]
    InvalidFree,

    #[error("invalid byte")]
    InvalidByte,

    #[error("invalid instruction pointer")]
    InvalidInstructionPointer,

    #[error("missing reader")]
    MissingReader,

    #[error("missing writer")]
    MissingWriter,

    #[error("out of memory")]
    OutOfMemory,
}

impl Fault {
    #[inline]
    pub fn is_none(self) -> bool {
        self == Fault::None
    }

    /// Halted or terminated: the program ended and the host should stop
    /// calling `execute`.
    #[inline]
    pub fn is_stopped(self) -> bool {
        matches!(self, Fault::Halted | Fault::Terminated)
    }

    /// A program defect or host misconfiguration
    #[inline]
    pub fn is_error(self) -> bool {
        !self.is_none() && !self.is_stopped()
    }
}

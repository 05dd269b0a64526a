//! Runtime error types for UM32
//!
//! These cover resource and loading failures. Execution outcomes are
//! reported as [`um32_spec::Fault`] values, not errors.

use crate::segment::SegmentError;
use thiserror::Error;
use um32_spec::SpecError;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Spec error: {0}")]
    SpecError(#[from] SpecError),

    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] SegmentError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;

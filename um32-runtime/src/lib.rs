//! # UM32 Runtime
//!
//! Execute UM32 programs one cycle at a time.
//!
//! ## Features
//!
//! - **Growable segments**: fallible doubling growth, unchanged on failure
//! - **Heap**: header/footer blocks in a single segment, checked accesses
//! - **Byte I/O**: pluggable [`ByteReader`] / [`ByteWriter`] capabilities
//! - **Faults**: every cycle reports a [`Fault`](um32_spec::Fault) instead of aborting
//!
//! ## Example
//!
//! ```rust,no_run
//! use um32_runtime::{Machine, MachineConfig, SharedOutput};
//!
//! let output = SharedOutput::new();
//! let mut machine = Machine::new(MachineConfig::default())
//!     .unwrap()
//!     .with_writer(output.clone());
//! machine.load(&[0xD000_0048, 0xA000_0000, 0x7000_0000]).unwrap();
//! let result = machine.run();
//! println!("{:?} after {} cycles: {}", result.stop, result.cycles, output.to_string_lossy());
//! ```

pub mod error;
pub mod segment;
pub mod heap;
pub mod io;
pub mod machine;

pub use error::{Result, RuntimeError};
pub use segment::{Segment, SegmentError};
pub use heap::{Block, Heap, HeapError, HeapStats, DEFAULT_HEAP_LIMIT};
pub use io::{ByteReader, ByteWriter, ScriptedInput, SharedOutput, StreamReader, StreamWriter};
pub use machine::{ExecutionResult, Machine, MachineConfig, StopReason};

/// Simple execution helper
///
/// Runs `program` with the given input and returns what it wrote.
pub fn run(program: &[um32_spec::Word], input: &[u8]) -> Result<(ExecutionResult, Vec<u8>)> {
    let output = SharedOutput::new();
    let mut machine = Machine::new(MachineConfig::default())?
        .with_reader(ScriptedInput::new(input))
        .with_writer(output.clone());
    machine.load(program)?;
    let result = machine.run();
    Ok((result, output.take()))
}

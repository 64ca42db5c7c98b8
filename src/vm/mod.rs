//! The Intcode machine.
//!
//! This module implements the complete machine:
//! - a sparse, auto-growing memory of 64-bit signed words
//! - an instruction decoder (opcode plus three parameter modes)
//! - the fetch-decode-execute engine with cooperative I/O and cancellation

pub mod decode;
pub mod execute;
pub mod io;
pub mod memory;

pub use decode::{decode, DecodeError, Instruction, Opcode, ParamMode};
pub use execute::{ExecError, Vm, VmState};
pub use io::{input_fn, output_fn, CancelToken, InputFn, InputSource, IoError, OutputFn, OutputSink};
pub use memory::{Memory, MemoryError};

/// The machine's native integer type.
///
/// Programs routinely compute values well past the 32-bit range, so every
/// cell, address and parameter is a 64-bit signed word.
pub type Word = i64;

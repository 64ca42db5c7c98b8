//! # Intcode VM
//!
//! An interpreter for Intcode, a small virtual machine that executes
//! programs encoded as flat arrays of signed integers.
//!
//! The machine is deliberately minimal: eleven opcodes, three parameter
//! addressing modes, a sparse memory that grows on demand, and exactly two
//! points where execution can yield to the host (requesting an input value
//! and emitting an output value). Hosts supply those two operations through
//! the [`InputSource`] and [`OutputSink`] traits, so a machine can be driven
//! from a scripted input list, a closure, or a channel fed by another
//! machine instance running on its own thread.
//!
//! ```
//! use intcode::{parse_program, Vm};
//!
//! // A program that reads one value and echoes it back.
//! let program = parse_program("3,0,4,0,99").unwrap();
//! let outputs = Vm::run_collect(&program, &[42]).unwrap();
//! assert_eq!(outputs, vec![42]);
//! ```

pub mod program;
pub mod vm;

// Re-export commonly used types
pub use program::{disassemble, parse_program, ParseError};
pub use vm::{
    decode, input_fn, output_fn, CancelToken, DecodeError, ExecError, InputSource, Instruction,
    IoError, Memory, MemoryError, Opcode, OutputSink, ParamMode, Vm, VmState, Word,
};

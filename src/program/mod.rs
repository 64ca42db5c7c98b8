//! Program-text tooling.
//!
//! This module provides:
//! - The loader for the textual program format (comma-separated integers)
//! - A disassembler (integer words → readable mnemonics)

pub mod disasm;
pub mod loader;

pub use disasm::{disassemble, disassemble_instruction};
pub use loader::{parse_program, ParseError};

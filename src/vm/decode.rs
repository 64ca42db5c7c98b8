//! Instruction decoder for the Intcode machine.
//!
//! An instruction word packs an opcode into its two low decimal digits and
//! one parameter mode per digit above them, least significant first. Missing
//! mode digits default to Position, so a bare `2` decodes the same as `00002`.

use crate::vm::Word;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Parameter addressing mode.
///
/// Each instruction carries one mode per parameter, chosen independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamMode {
    /// The parameter is an address; the operand is the word stored there.
    Position,
    /// The parameter is the operand itself.
    Immediate,
    /// The parameter is an offset from the relative base register.
    Relative,
}

impl ParamMode {
    /// Create from a decimal mode digit.
    pub fn from_digit(digit: Word) -> Result<Self, DecodeError> {
        match digit {
            0 => Ok(ParamMode::Position),
            1 => Ok(ParamMode::Immediate),
            2 => Ok(ParamMode::Relative),
            _ => Err(DecodeError::InvalidParameterMode(digit)),
        }
    }

    /// Convert to a decimal mode digit.
    pub fn to_digit(self) -> Word {
        match self {
            ParamMode::Position => 0,
            ParamMode::Immediate => 1,
            ParamMode::Relative => 2,
        }
    }
}

/// The closed set of Intcode operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Opcode {
    /// `mem[out] = p1 + p2`
    Add,
    /// `mem[out] = p1 * p2`
    Multiply,
    /// `mem[out] =` next value from the input source (suspension point)
    Input,
    /// Emit `p1` to the output sink (suspension point)
    Output,
    /// `if p1 != 0 { ip = p2 }`
    JumpIfTrue,
    /// `if p1 == 0 { ip = p2 }`
    JumpIfFalse,
    /// `mem[out] = if p1 < p2 { 1 } else { 0 }`
    LessThan,
    /// `mem[out] = if p1 == p2 { 1 } else { 0 }`
    Equals,
    /// `relative_base += p1`
    AdjustBase,
    /// Stop execution
    Halt,
}

impl Opcode {
    /// All opcodes in numeric order.
    pub const ALL: [Opcode; 10] = [
        Opcode::Add,
        Opcode::Multiply,
        Opcode::Input,
        Opcode::Output,
        Opcode::JumpIfTrue,
        Opcode::JumpIfFalse,
        Opcode::LessThan,
        Opcode::Equals,
        Opcode::AdjustBase,
        Opcode::Halt,
    ];

    /// Create from the numeric opcode (the low two digits of a word).
    pub fn from_code(code: Word) -> Option<Self> {
        match code {
            1 => Some(Opcode::Add),
            2 => Some(Opcode::Multiply),
            3 => Some(Opcode::Input),
            4 => Some(Opcode::Output),
            5 => Some(Opcode::JumpIfTrue),
            6 => Some(Opcode::JumpIfFalse),
            7 => Some(Opcode::LessThan),
            8 => Some(Opcode::Equals),
            9 => Some(Opcode::AdjustBase),
            99 => Some(Opcode::Halt),
            _ => None,
        }
    }

    /// The numeric opcode.
    pub const fn code(self) -> Word {
        match self {
            Opcode::Add => 1,
            Opcode::Multiply => 2,
            Opcode::Input => 3,
            Opcode::Output => 4,
            Opcode::JumpIfTrue => 5,
            Opcode::JumpIfFalse => 6,
            Opcode::LessThan => 7,
            Opcode::Equals => 8,
            Opcode::AdjustBase => 9,
            Opcode::Halt => 99,
        }
    }

    /// The fixed number of parameters this operation takes.
    pub const fn operand_count(self) -> usize {
        match self {
            Opcode::Add | Opcode::Multiply | Opcode::LessThan | Opcode::Equals => 3,
            Opcode::JumpIfTrue | Opcode::JumpIfFalse => 2,
            Opcode::Input | Opcode::Output | Opcode::AdjustBase => 1,
            Opcode::Halt => 0,
        }
    }

    /// Short assembly-style mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Multiply => "mul",
            Opcode::Input => "in",
            Opcode::Output => "out",
            Opcode::JumpIfTrue => "jnz",
            Opcode::JumpIfFalse => "jz",
            Opcode::LessThan => "lt",
            Opcode::Equals => "eq",
            Opcode::AdjustBase => "arb",
            Opcode::Halt => "hlt",
        }
    }
}

/// A decoded instruction: operation plus one addressing mode per parameter.
///
/// Modes for parameters the operation does not take are decoded anyway (they
/// default to Position) and simply never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub opcode: Opcode,
    pub modes: [ParamMode; 3],
}

/// Decode a raw instruction word.
///
/// The low two decimal digits select the opcode; the next three digits (least
/// significant first) select the modes of parameters 1 to 3. Digits beyond
/// the fifth are ignored.
pub fn decode(word: Word) -> Result<Instruction, DecodeError> {
    let opcode = Opcode::from_code(word % 100).ok_or(DecodeError::UnknownOpcode(word % 100))?;

    let mut digits = word / 100;
    let mut modes = [ParamMode::Position; 3];
    for mode in &mut modes {
        *mode = ParamMode::from_digit(digits % 10)?;
        digits /= 10;
    }

    Ok(Instruction { opcode, modes })
}

/// Errors that can occur during instruction decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The low two digits are not a supported operation.
    #[error("unknown opcode {0}")]
    UnknownOpcode(Word),

    /// A mode digit is not 0, 1 or 2.
    #[error("invalid parameter mode digit {0}")]
    InvalidParameterMode(Word),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_opcode_only() {
        let instr = decode(2).unwrap();
        assert_eq!(instr.opcode, Opcode::Multiply);
        assert_eq!(instr.modes, [ParamMode::Position; 3]);
    }

    #[test]
    fn test_decode_mixed_modes() {
        // 1002: opcode 02, modes [Position, Immediate, Position]
        let instr = decode(1002).unwrap();
        assert_eq!(instr.opcode, Opcode::Multiply);
        assert_eq!(
            instr.modes,
            [ParamMode::Position, ParamMode::Immediate, ParamMode::Position]
        );
    }

    #[test]
    fn test_decode_relative_mode() {
        // 204: opcode 04, first parameter relative
        let instr = decode(204).unwrap();
        assert_eq!(instr.opcode, Opcode::Output);
        assert_eq!(instr.modes[0], ParamMode::Relative);
    }

    #[test]
    fn test_decode_halt() {
        assert_eq!(decode(99).unwrap().opcode, Opcode::Halt);
    }

    #[test]
    fn test_decode_unknown_opcode() {
        assert_eq!(decode(98), Err(DecodeError::UnknownOpcode(98)));
        assert_eq!(decode(0), Err(DecodeError::UnknownOpcode(0)));
        // Negative words never decode.
        assert!(matches!(decode(-1), Err(DecodeError::UnknownOpcode(_))));
    }

    #[test]
    fn test_decode_invalid_mode_digit() {
        // 302: opcode 02, first mode digit 3
        assert_eq!(decode(302), Err(DecodeError::InvalidParameterMode(3)));
    }

    #[test]
    fn test_mode_digit_roundtrip() {
        for digit in 0..3 {
            assert_eq!(ParamMode::from_digit(digit).unwrap().to_digit(), digit);
        }
    }

    proptest! {
        #[test]
        fn prop_decode_never_panics(word in any::<Word>()) {
            let _ = decode(word);
        }

        #[test]
        fn prop_valid_encodings_decode(
            op_index in 0..Opcode::ALL.len(),
            m1 in 0..3i64,
            m2 in 0..3i64,
            m3 in 0..3i64,
        ) {
            let opcode = Opcode::ALL[op_index];
            let word = opcode.code() + 100 * m1 + 1_000 * m2 + 10_000 * m3;
            let instr = decode(word).unwrap();

            prop_assert_eq!(instr.opcode, opcode);
            prop_assert_eq!(instr.modes[0].to_digit(), m1);
            prop_assert_eq!(instr.modes[1].to_digit(), m2);
            prop_assert_eq!(instr.modes[2].to_digit(), m3);
        }
    }
}

//! Disassembler for Intcode programs.
//!
//! Linear sweep: each position either decodes to an instruction (consuming
//! its parameter words) or falls back to a `dat` data directive. Data
//! interleaved with code is rendered as whatever it happens to decode to;
//! the output is a reading aid, not a round-trippable source form.

use crate::vm::decode::{decode, Instruction, ParamMode};
use crate::vm::Word;

/// Disassemble a whole program to text, one line per instruction.
pub fn disassemble(program: &[Word]) -> String {
    let mut output = String::new();
    let mut addr = 0;

    while addr < program.len() {
        let (text, consumed) = disassemble_instruction(&program[addr..]);
        output.push_str(&format!("{:4}: {}\n", addr, text));
        addr += consumed;
    }

    output
}

/// Disassemble the instruction at the start of `words`.
///
/// Returns the rendered text and the number of words consumed (at least 1).
/// Words that do not decode, and instructions whose parameters run past the
/// end of the slice, are rendered as `dat`.
pub fn disassemble_instruction(words: &[Word]) -> (String, usize) {
    let Some(&word) = words.first() else {
        return (String::new(), 0);
    };

    match decode(word) {
        Ok(instr) => {
            let count = instr.opcode.operand_count();
            if words.len() < count + 1 {
                (format!("dat {}", word), 1)
            } else {
                (format_instruction(&instr, &words[1..=count]), count + 1)
            }
        }
        Err(_) => (format!("dat {}", word), 1),
    }
}

/// Format a decoded instruction with its parameter words.
fn format_instruction(instr: &Instruction, params: &[Word]) -> String {
    let mut text = instr.opcode.mnemonic().to_string();

    for (index, &param) in params.iter().enumerate() {
        text.push_str(if index == 0 { " " } else { ", " });
        text.push_str(&format_operand(param, instr.modes[index]));
    }

    text
}

/// Format one operand with its addressing-mode notation.
fn format_operand(param: Word, mode: ParamMode) -> String {
    match mode {
        ParamMode::Immediate => format!("{}", param),
        ParamMode::Position => format!("[{}]", param),
        ParamMode::Relative if param < 0 => format!("[base-{}]", -param),
        ParamMode::Relative => format!("[base+{}]", param),
    }
}

//! Execution engine for the Intcode machine.
//!
//! Implements the fetch-decode-execute cycle and all opcode behaviors. The
//! engine is single-threaded and cooperative: the only places it can yield
//! are the input and output hooks, which may themselves block on the host.

use crate::vm::decode::{decode, DecodeError, Instruction, Opcode, ParamMode};
use crate::vm::io::{CancelToken, InputSource, IoError, OutputSink};
use crate::vm::memory::{Memory, MemoryError};
use crate::vm::Word;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::mpsc;
use thiserror::Error;

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmState {
    /// The machine is executing instructions.
    Running,
    /// The machine is blocked inside its input hook.
    AwaitingInput,
    /// The machine executed a halt instruction.
    Halted,
    /// The machine observed its cancellation token.
    Cancelled,
}

/// An Intcode machine.
///
/// Owns a private copy of the program image. A finished or cancelled machine
/// is not resumed; spawn a fresh one from the same program instead.
pub struct Vm {
    /// Machine memory.
    pub mem: Memory,
    /// Address of the next instruction.
    pub ip: Word,
    /// Base register for relative-mode parameters.
    pub relative_base: Word,
    /// Current execution state.
    pub state: VmState,
    /// Instruction count (for profiling).
    pub cycles: u64,
    /// Last executed instruction (for debugging).
    last_instr: Option<Instruction>,
    input: Option<Box<dyn InputSource>>,
    output: Option<Box<dyn OutputSink>>,
    cancel: CancelToken,
}

impl Vm {
    /// Create a machine over a copy of the given program image.
    pub fn new(program: &[Word]) -> Self {
        Self {
            mem: Memory::new(program),
            ip: 0,
            relative_base: 0,
            state: VmState::Running,
            cycles: 0,
            last_instr: None,
            input: None,
            output: None,
            cancel: CancelToken::new(),
        }
    }

    /// Connect the input hook. Replaces any previously connected source.
    pub fn connect_input(&mut self, source: impl InputSource + 'static) {
        self.input = Some(Box::new(source));
    }

    /// Connect the output hook. Replaces any previously connected sink.
    pub fn connect_output(&mut self, sink: impl OutputSink + 'static) {
        self.output = Some(Box::new(sink));
    }

    /// A clone of this machine's cancellation token.
    ///
    /// Cancelling it (from any thread) stops the machine at the next step
    /// boundary, before a further instruction executes.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Execute a single instruction.
    ///
    /// Returns the machine state after the step. Stepping a machine that is
    /// not in the Running state is an error.
    pub fn step(&mut self) -> Result<VmState, ExecError> {
        if self.state != VmState::Running {
            return Err(ExecError::NotRunning(self.state));
        }
        if self.cancel.is_cancelled() {
            debug!("cancelled at address {} after {} cycles", self.ip, self.cycles);
            self.state = VmState::Cancelled;
            return Ok(self.state);
        }

        // Fetch
        let at = self.ip;
        let raw = self.read(at, at)?;

        // Decode
        let instr = decode(raw).map_err(|err| ExecError::IllegalInstruction {
            addr: at,
            word: raw,
            source: err,
        })?;
        trace!("{:>6} @{:<6} {}", self.cycles, at, instr.opcode.mnemonic());

        // Execute
        self.execute(at, instr)?;

        self.cycles += 1;
        self.last_instr = Some(instr);

        Ok(self.state)
    }

    /// Run until halt or cancellation.
    ///
    /// Returns the terminal state ([`VmState::Halted`] or
    /// [`VmState::Cancelled`]); fatal conditions abort with an error.
    pub fn run(&mut self) -> Result<VmState, ExecError> {
        debug!("run: {} words loaded, starting at address {}", self.mem.len(), self.ip);

        while self.state == VmState::Running {
            self.step()?;
        }

        Ok(self.state)
    }

    /// Run for at most `max_cycles` instructions.
    ///
    /// Returns [`VmState::Running`] if the budget was exhausted first.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<VmState, ExecError> {
        let limit = self.cycles + max_cycles;

        while self.state == VmState::Running && self.cycles < limit {
            self.step()?;
        }

        Ok(self.state)
    }

    /// Run a fresh machine over `program` with a scripted input list and
    /// collect its entire output stream.
    pub fn run_collect(program: &[Word], inputs: &[Word]) -> Result<Vec<Word>, ExecError> {
        let (tx, rx) = mpsc::channel();

        let mut vm = Vm::new(program);
        vm.connect_input(VecDeque::from(inputs.to_vec()));
        vm.connect_output(tx);
        vm.run()?;

        Ok(rx.try_iter().collect())
    }

    /// Execute a decoded instruction.
    fn execute(&mut self, at: Word, instr: Instruction) -> Result<(), ExecError> {
        let mut next_ip = at + 1 + instr.opcode.operand_count() as Word;

        match instr.opcode {
            Opcode::Add => {
                let lhs = self.operand(at, &instr, 0)?;
                let rhs = self.operand(at, &instr, 1)?;
                let dst = self.store_address(at, &instr, 2)?;
                self.write(at, dst, lhs + rhs)?;
            }

            Opcode::Multiply => {
                let lhs = self.operand(at, &instr, 0)?;
                let rhs = self.operand(at, &instr, 1)?;
                let dst = self.store_address(at, &instr, 2)?;
                self.write(at, dst, lhs * rhs)?;
            }

            Opcode::Input => {
                let dst = self.store_address(at, &instr, 0)?;
                let mut source = self
                    .input
                    .take()
                    .ok_or(ExecError::NoInputSource { addr: at })?;
                // The hook may block; the state reflects that while it runs.
                self.state = VmState::AwaitingInput;
                let received = source.next_input();
                self.state = VmState::Running;
                self.input = Some(source);
                let value =
                    received.map_err(|err| ExecError::InputFailed { addr: at, source: err })?;
                trace!("input {} -> [{}]", value, dst);
                self.write(at, dst, value)?;
            }

            Opcode::Output => {
                let value = self.operand(at, &instr, 0)?;
                let mut sink = self
                    .output
                    .take()
                    .ok_or(ExecError::NoOutputSink { addr: at })?;
                let sent = sink.emit(value);
                self.output = Some(sink);
                sent.map_err(|err| ExecError::OutputFailed { addr: at, source: err })?;
                trace!("output {}", value);
            }

            Opcode::JumpIfTrue => {
                let cond = self.operand(at, &instr, 0)?;
                let target = self.operand(at, &instr, 1)?;
                if cond != 0 {
                    next_ip = target;
                }
            }

            Opcode::JumpIfFalse => {
                let cond = self.operand(at, &instr, 0)?;
                let target = self.operand(at, &instr, 1)?;
                if cond == 0 {
                    next_ip = target;
                }
            }

            Opcode::LessThan => {
                let lhs = self.operand(at, &instr, 0)?;
                let rhs = self.operand(at, &instr, 1)?;
                let dst = self.store_address(at, &instr, 2)?;
                self.write(at, dst, (lhs < rhs) as Word)?;
            }

            Opcode::Equals => {
                let lhs = self.operand(at, &instr, 0)?;
                let rhs = self.operand(at, &instr, 1)?;
                let dst = self.store_address(at, &instr, 2)?;
                self.write(at, dst, (lhs == rhs) as Word)?;
            }

            Opcode::AdjustBase => {
                let offset = self.operand(at, &instr, 0)?;
                self.relative_base += offset;
            }

            Opcode::Halt => {
                debug!("halt at address {} after {} cycles", at, self.cycles);
                self.state = VmState::Halted;
                return Ok(());
            }
        }

        self.ip = next_ip;
        Ok(())
    }

    /// Resolve the value of parameter `index` per its addressing mode.
    fn operand(&self, at: Word, instr: &Instruction, index: usize) -> Result<Word, ExecError> {
        let raw = self.read(at, at + 1 + index as Word)?;
        match instr.modes[index] {
            ParamMode::Position => self.read(at, raw),
            ParamMode::Immediate => Ok(raw),
            ParamMode::Relative => self.read(at, self.relative_base + raw),
        }
    }

    /// Resolve the destination address of a store parameter.
    ///
    /// Store parameters address memory; immediate mode has no meaning here.
    fn store_address(&self, at: Word, instr: &Instruction, index: usize) -> Result<Word, ExecError> {
        let raw = self.read(at, at + 1 + index as Word)?;
        match instr.modes[index] {
            ParamMode::Position => Ok(raw),
            ParamMode::Relative => Ok(self.relative_base + raw),
            ParamMode::Immediate => Err(ExecError::ImmediateStore { addr: at }),
        }
    }

    fn read(&self, at: Word, addr: Word) -> Result<Word, ExecError> {
        self.mem
            .read(addr)
            .map_err(|err| ExecError::MemoryFault { addr: at, source: err })
    }

    fn write(&mut self, at: Word, addr: Word, value: Word) -> Result<(), ExecError> {
        self.mem
            .write(addr, value)
            .map_err(|err| ExecError::MemoryFault { addr: at, source: err })
    }

    /// Get the last executed instruction.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the machine has halted.
    pub fn is_halted(&self) -> bool {
        self.state == VmState::Halted
    }

    /// Check if the machine can still execute instructions.
    pub fn is_running(&self) -> bool {
        self.state == VmState::Running
    }

    /// Check if the machine observed its cancellation token.
    pub fn is_cancelled(&self) -> bool {
        self.state == VmState::Cancelled
    }
}

impl std::fmt::Debug for Vm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vm")
            .field("state", &self.state)
            .field("ip", &self.ip)
            .field("relative_base", &self.relative_base)
            .field("cycles", &self.cycles)
            .field("mem", &self.mem)
            .finish()
    }
}

/// Errors that can occur during execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The machine is halted or cancelled and cannot step.
    #[error("machine is not running ({0:?})")]
    NotRunning(VmState),

    /// The word at the instruction pointer does not decode.
    #[error("illegal instruction word {word} at address {addr}")]
    IllegalInstruction {
        addr: Word,
        word: Word,
        #[source]
        source: DecodeError,
    },

    /// A parameter or the instruction fetch addressed invalid memory.
    #[error("memory fault in the instruction at address {addr}")]
    MemoryFault {
        addr: Word,
        #[source]
        source: MemoryError,
    },

    /// A store parameter was encoded in immediate mode.
    #[error("store parameter in immediate mode at address {addr}")]
    ImmediateStore { addr: Word },

    /// Opcode 3 executed with no input source connected.
    #[error("input requested at address {addr} but no input source is connected")]
    NoInputSource { addr: Word },

    /// Opcode 4 executed with no output sink connected.
    #[error("output emitted at address {addr} but no output sink is connected")]
    NoOutputSink { addr: Word },

    /// The input hook reported a failure.
    #[error("input request failed at address {addr}")]
    InputFailed {
        addr: Word,
        #[source]
        source: IoError,
    },

    /// The output hook reported a failure.
    #[error("output emit failed at address {addr}")]
    OutputFailed {
        addr: Word,
        #[source]
        source: IoError,
    },
}

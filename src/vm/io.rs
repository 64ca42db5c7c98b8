//! Host-side I/O contract and cancellation.
//!
//! The machine touches the outside world in exactly two places: opcode 3
//! requests a value from an [`InputSource`] and opcode 4 hands a value to an
//! [`OutputSink`]. Both hooks may block (a channel receiver waiting on a
//! value produced by another machine), which is what makes several machines
//! composable into producer/consumer chains without the engine knowing.

use crate::vm::Word;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use thiserror::Error;

/// Supplies input values to a machine, one per input instruction.
///
/// `next_input` may block until a value becomes available.
pub trait InputSource: Send {
    fn next_input(&mut self) -> Result<Word, IoError>;
}

/// Consumes output values from a machine, one per output instruction.
pub trait OutputSink: Send {
    fn emit(&mut self, value: Word) -> Result<(), IoError>;
}

/// A scripted input: values are consumed front to back.
impl InputSource for VecDeque<Word> {
    fn next_input(&mut self) -> Result<Word, IoError> {
        self.pop_front().ok_or(IoError::Exhausted)
    }
}

/// A channel-fed input: blocks until another thread sends a value.
impl InputSource for Receiver<Word> {
    fn next_input(&mut self) -> Result<Word, IoError> {
        self.recv().map_err(|_| IoError::Disconnected)
    }
}

/// A channel-backed output: values are pushed to whoever holds the receiver.
impl OutputSink for Sender<Word> {
    fn emit(&mut self, value: Word) -> Result<(), IoError> {
        self.send(value).map_err(|_| IoError::Disconnected)
    }
}

/// Adapt an infallible closure into an [`InputSource`].
pub fn input_fn<F>(f: F) -> InputFn<F>
where
    F: FnMut() -> Word + Send,
{
    InputFn(f)
}

/// An [`InputSource`] built from a closure. See [`input_fn`].
pub struct InputFn<F>(F);

impl<F> InputSource for InputFn<F>
where
    F: FnMut() -> Word + Send,
{
    fn next_input(&mut self) -> Result<Word, IoError> {
        Ok((self.0)())
    }
}

/// Adapt an infallible closure into an [`OutputSink`].
pub fn output_fn<F>(f: F) -> OutputFn<F>
where
    F: FnMut(Word) + Send,
{
    OutputFn(f)
}

/// An [`OutputSink`] built from a closure. See [`output_fn`].
pub struct OutputFn<F>(F);

impl<F> OutputSink for OutputFn<F>
where
    F: FnMut(Word) + Send,
{
    fn emit(&mut self, value: Word) -> Result<(), IoError> {
        (self.0)(value);
        Ok(())
    }
}

/// Errors surfaced by the ready-made I/O hook implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IoError {
    /// A scripted input ran out of values.
    #[error("scripted input exhausted")]
    Exhausted,

    /// The peer end of a channel hook was dropped.
    #[error("i/o channel disconnected")]
    Disconnected,
}

/// A cloneable cancellation flag shared between a machine and its host.
///
/// The engine checks the token once per step, so cancelling from another
/// thread stops the machine before it executes a further instruction.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request termination of every machine holding a clone of this token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

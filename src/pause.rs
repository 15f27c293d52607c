//! Filepath: src/pause.rs
//!
//! Operator pause points.
//!
//! The harness stops between phases so a profiler or memory monitor can be
//! attached and read. [`StdinPause`] waits for a line on standard input;
//! [`NoPause`] continues immediately, for scripted runs and tests.

use std::io::{self, BufRead, Write};

/// A point where the harness waits for the operator.
pub trait Pause {
    /// Show `prompt` and block until the operator continues.
    ///
    /// # Errors
    ///
    /// Returns any I/O error from the console.
    fn wait(&mut self, prompt: &str) -> io::Result<()>;
}

/// Prints the prompt to stdout and waits for a line on stdin.
///
/// End of input counts as "continue", so piping `/dev/null` into the binary
/// runs it straight through.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPause;

impl Pause for StdinPause {
    fn wait(&mut self, prompt: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{prompt}")?;
        stdout.flush()?;
        drop(stdout);

        let mut line: String = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }
}

/// Never waits.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPause;

impl Pause for NoPause {
    #[inline]
    fn wait(&mut self, _prompt: &str) -> io::Result<()> {
        Ok(())
    }
}

/// Records every prompt instead of waiting. Used by tests to check the
/// order of pause points.
#[derive(Debug, Default, Clone)]
pub struct RecordingPause {
    prompts: Vec<String>,
}

impl RecordingPause {
    /// Create an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            prompts: Vec::new(),
        }
    }

    /// Prompts seen so far, in order.
    #[must_use]
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Pause for RecordingPause {
    fn wait(&mut self, prompt: &str) -> io::Result<()> {
        self.prompts.push(prompt.to_owned());
        Ok(())
    }
}

impl<P: Pause + ?Sized> Pause for &mut P {
    #[inline]
    fn wait(&mut self, prompt: &str) -> io::Result<()> {
        (**self).wait(prompt)
    }
}

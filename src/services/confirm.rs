//! Operator confirmation after a failed stop.
//!
//! The controller never talks to a terminal itself; it hands a
//! [`StopFailure`] to a [`Confirmer`] and acts on the returned [`Decision`].

use std::io::{self, BufRead, StdinLock, Stderr, Write};

use crate::remote::RemoteCommandOutput;

/// Operator choice after a stop command failed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// Carry on with the remaining services.
    Continue,
    /// Abandon the whole batch.
    Abort,
}

/// Context handed to a [`Confirmer`] when a stop command fails.
#[derive(Clone, Copy, Debug)]
pub struct StopFailure<'a> {
    /// Canonical name of the service that failed to stop.
    pub service: &'a str,
    /// Command that was run.
    pub command: &'a str,
    /// Captured output of the failed command.
    pub output: &'a RemoteCommandOutput,
}

/// Decides whether a batch continues after a stop failure.
pub trait Confirmer {
    /// Reports `failure` and returns the operator's decision.
    fn confirm(&mut self, failure: &StopFailure<'_>) -> Decision;
}

impl<C: Confirmer + ?Sized> Confirmer for Box<C> {
    fn confirm(&mut self, failure: &StopFailure<'_>) -> Decision {
        (**self).confirm(failure)
    }
}

/// Confirmer that always continues, for unattended runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AssumeYes;

impl Confirmer for AssumeYes {
    fn confirm(&mut self, _failure: &StopFailure<'_>) -> Decision {
        Decision::Continue
    }
}

/// Raised for answers that are neither yes nor no.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct InvalidAnswer;

/// Interprets a typed answer.
///
/// Returns `Ok(None)` for a blank answer so the caller can apply its
/// default.
///
/// # Errors
///
/// Returns [`InvalidAnswer`] unless the first non-blank character is `y` or
/// `n`, ignoring case.
pub fn parse_answer(answer: &str) -> Result<Option<Decision>, InvalidAnswer> {
    let normalised = answer.trim().to_ascii_lowercase();
    match normalised.chars().next() {
        None => Ok(None),
        Some('y') => Ok(Some(Decision::Continue)),
        Some('n') => Ok(Some(Decision::Abort)),
        Some(_) => Err(InvalidAnswer),
    }
}

/// Prints the failed command's output and asks whether to continue.
///
/// Blank answers select the default (continue). End of input or an I/O
/// error counts as a decline.
#[derive(Debug)]
pub struct PromptConfirmer<I, O> {
    input: I,
    output: O,
}

impl PromptConfirmer<StdinLock<'static>, Stderr> {
    /// Prompts on the controlling terminal, writing to stderr.
    #[must_use]
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<I: BufRead, O: Write> PromptConfirmer<I, O> {
    /// Creates a confirmer reading answers from `input`.
    pub const fn new(input: I, output: O) -> Self {
        Self { input, output }
    }

    /// Consumes the confirmer and returns the output sink.
    pub fn into_output(self) -> O {
        self.output
    }

    fn ask(&mut self, failure: &StopFailure<'_>) -> io::Result<Decision> {
        writeln!(
            self.output,
            "stopping {} failed (`{}` exited with status {})",
            failure.service,
            failure.command,
            failure.output.status_text()
        )?;
        let details = failure.output.combined_output();
        if !details.is_empty() {
            writeln!(self.output, "{details}")?;
        }

        loop {
            write!(self.output, "Continue anyway? [Y/n] ")?;
            self.output.flush()?;

            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                writeln!(self.output)?;
                return Ok(Decision::Abort);
            }

            match parse_answer(&answer) {
                Ok(decision) => return Ok(decision.unwrap_or(Decision::Continue)),
                Err(InvalidAnswer) => writeln!(self.output, "Please type [y]es or [n]o.")?,
            }
        }
    }
}

impl<I: BufRead, O: Write> Confirmer for PromptConfirmer<I, O> {
    fn confirm(&mut self, failure: &StopFailure<'_>) -> Decision {
        self.ask(failure).unwrap_or(Decision::Abort)
    }
}

//! Interpreter-level fatal errors.
//!
//! These are the only errors the running machine itself can raise; a user
//! program's own failures are surfaced solely through `STOP(v[0])`, which
//! this crate never judges.

use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// `K` dispatched to a code below `PROGSTART` that isn't in the
    /// system-call catalogue.
    UnknownCall(i16),
    /// `X` dispatched to a micro-op code not in the table.
    UnknownExec(i16),
    /// Integer division or remainder (`X` ops `DIV`/`MOD`) by zero.
    DivisionByZero,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::UnknownCall(code) => write!(f, "UNKNOWN CALL {}", code),
            Error::UnknownExec(code) => write!(f, "UNKNOWN EXEC {}", code),
            Error::DivisionByZero => write!(f, "DIVISION BY ZERO"),
        }
    }
}

impl StdError for Error {}

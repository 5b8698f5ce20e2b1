//! CLI-driver fatal errors.

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    InvalidOption(String),
    NoIcFile,
    NoInput,
    NoOutput,
    /// An argument-parsing failure `clap` itself raised that isn't an
    /// unrecognised flag (e.g. a value missing for `-i`/`-o`); those
    /// already come with clap's own usage-aware message.
    Clap(clap::Error),
    Assemble(intasm::Error),
    Interpret(intcode::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::InvalidOption(opt) => write!(f, "INVALID OPTION {}", opt),
            Error::NoIcFile => write!(f, "NO ICFILE"),
            Error::NoInput => write!(f, "NO INPUT"),
            Error::NoOutput => write!(f, "NO OUTPUT"),
            Error::Clap(err) => write!(f, "{}", err),
            Error::Assemble(err) => write!(f, "{}", err),
            Error::Interpret(err) => write!(f, "{}", err),
        }
    }
}

impl StdError for Error {}

impl From<intasm::Error> for Error {
    fn from(err: intasm::Error) -> Error {
        Error::Assemble(err)
    }
}

impl From<intcode::Error> for Error {
    fn from(err: intcode::Error) -> Error {
        Error::Interpret(err)
    }
}

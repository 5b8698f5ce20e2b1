//! Core INTCODE machine: memory image, stream registry, formatted I/O, and
//! the fetch/decode/execute interpreter.
//!
//! This crate has no assembler in it; see the sibling `intasm` crate for
//! turning source text into a loaded memory image this crate can run.

pub mod arith;
pub mod constants;
pub mod error;
pub mod interpreter;
pub mod io;
pub mod memory;
pub mod stream;

pub use error::Error;
pub use interpreter::Interpreter;
pub use memory::Memory;
pub use stream::Streams;

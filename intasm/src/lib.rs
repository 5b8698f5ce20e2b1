//! Assembler for [intcode](../intcode/index.html) source text.
//!
//! [`assemble`] consumes one file's worth of INTCODE assembly and emits it
//! into a shared [`Memory`] image, starting at `lomem` and returning the
//! updated `lomem` for the next file. Numeric labels and their
//! forward-reference chains live in the memory image's own label vector,
//! so assembling several files back to back, as the CLI driver does,
//! lets a label defined in one file satisfy a reference made in an
//! earlier one, exactly as the original single-pass assembler intends.
//!
//! # INTCODE assembly language
//!
//! Source is a stream of ASCII bytes. `/` begins a comment that runs to
//! the next linefeed; whitespace and `$` separate tokens. At the top
//! level each construct is one of:
//!
//! - a bare decimal number, defining a numeric label at the current
//!   address;
//! - a directive: `C n` (one byte), `D n` / `DL n` (one data word, literal
//!   or label reference), `G n L m` (global-vector initialiser), `Z`
//!   (end-of-section check, clears the label vector);
//! - an instruction: one of `L S A J T F K X`, optional `I`/`P`/`G`
//!   modifiers, then either `L n` for a label operand or a decimal
//!   operand.
//!
//! See [`labels`] for the `labref` patch algorithm this crate implements.

mod directives;
mod error;
mod instructions;
mod labels;
mod scanner;

use log::trace;

use intcode::Memory;

pub use error::Error;
use scanner::Scanner;

/// Assembles `source` into `memory`, starting at word address `lomem`.
/// Returns the address just past the assembled code.
pub fn assemble(source: &str, memory: &mut Memory, lomem: i16) -> Result<i16, Error> {
    let mut scanner = Scanner::new(source);
    let mut lomem = lomem;
    let mut bytes = directives::ByteCursor::default();

    loop {
        let c = match scanner.peek() {
            Some(c) => c,
            None => break,
        };

        if c != b'C' {
            lomem = bytes.finalize(lomem);
        }

        match c {
            c if c.is_ascii_digit() => {
                let n = scanner.read_number()?;
                trace!("label {} := {}", n, lomem);
                labels::define(memory, n, lomem)?;
            }
            b'C' => {
                scanner.advance();
                let n = scanner.read_number()?;
                lomem = bytes.emit(memory, lomem, n);
            }
            b'D' => {
                scanner.advance();
                lomem = directives::data(&mut scanner, memory, lomem)?;
            }
            b'G' => {
                scanner.advance();
                directives::global(&mut scanner, memory)?;
            }
            b'Z' => {
                scanner.advance();
                labels::check_and_clear(memory)?;
            }
            c if instructions::is_instruction_letter(c) => {
                scanner.advance();
                lomem = instructions::assemble(&mut scanner, memory, c, lomem)?;
            }
            other => return Err(Error::BadCh(other)),
        }
    }

    Ok(bytes.finalize(lomem))
}

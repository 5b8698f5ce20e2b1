//! Non-instruction directives: `C`, `D`/`DL`, `G`, `Z`.

use intcode::Memory;

use crate::error::Error;
use crate::labels;
use crate::scanner::Scanner;

/// Tracks whether the current word at `lomem` already holds a low byte
/// from a prior `C` directive, so a run of `C`s packs two bytes per word
/// and any other construct finalises a half-filled word first.
#[derive(Default)]
pub struct ByteCursor {
    half_filled: bool,
}

impl ByteCursor {
    pub fn emit(&mut self, memory: &mut Memory, lomem: i16, byte: i16) -> i16 {
        let word_addr = lomem as i32;
        if self.half_filled {
            memory.write_byte(word_addr * 2 + 1, byte);
            self.half_filled = false;
            lomem + 1
        } else {
            memory.write_byte(word_addr * 2, byte);
            self.half_filled = true;
            lomem
        }
    }

    /// Rounds a half-filled word up to the next free address, leaving its
    /// untouched high byte as whatever the memory image already held there.
    pub fn finalize(&mut self, lomem: i16) -> i16 {
        if self.half_filled {
            self.half_filled = false;
            lomem + 1
        } else {
            lomem
        }
    }
}

pub fn data(scanner: &mut Scanner, memory: &mut Memory, lomem: i16) -> Result<i16, Error> {
    if scanner.peek() == Some(b'L') {
        scanner.advance();
        let label_n = scanner.read_number()?;
        memory.write_word(lomem as i32, 0);
        labels::reference(memory, label_n, lomem);
    } else {
        let n = scanner.read_number()?;
        memory.write_word(lomem as i32, n);
    }
    Ok(lomem + 1)
}

/// `G n L m`: writes 0 into (arbitrary, typically global-vector) address
/// `n` and records a label-`m` reference there. Does not consume `lomem`.
pub fn global(scanner: &mut Scanner, memory: &mut Memory) -> Result<(), Error> {
    let addr = scanner.read_number()?;
    match scanner.peek() {
        Some(b'L') => scanner.advance(),
        Some(c) => return Err(Error::BadCh(c)),
        None => return Err(Error::UnexpectedEof),
    }
    let label_n = scanner.read_number()?;
    memory.write_word(addr as i32, 0);
    labels::reference(memory, label_n, addr);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn byte_cursor_packs_two_bytes_per_word() {
        let mut memory = Memory::new();
        let mut cursor = ByteCursor::default();
        let lomem = cursor.emit(&mut memory, 500, b'H' as i16);
        assert_eq!(lomem, 500);
        let lomem = cursor.emit(&mut memory, lomem, b'I' as i16);
        assert_eq!(lomem, 501);
        assert_eq!(memory.read_byte(1000), b'H' as i16);
        assert_eq!(memory.read_byte(1001), b'I' as i16);
    }

    #[test]
    fn byte_cursor_finalize_rounds_up_half_filled_word() {
        let mut memory = Memory::new();
        let mut cursor = ByteCursor::default();
        let lomem = cursor.emit(&mut memory, 500, b'X' as i16);
        assert_eq!(cursor.finalize(lomem), 501);
    }

    #[test]
    fn dl_directive_records_a_forward_reference() {
        let mut memory = Memory::new();
        let mut scanner = Scanner::new("L12");
        let lomem = data(&mut scanner, &mut memory, 500).unwrap();
        assert_eq!(lomem, 501);
        labels::define(&mut memory, 12, 777).unwrap();
        assert_eq!(memory.read_word(500), 777);
    }

    #[test]
    fn global_directive_targets_an_arbitrary_address() {
        let mut memory = Memory::new();
        let mut scanner = Scanner::new("10 L3");
        global(&mut scanner, &mut memory).unwrap();
        labels::define(&mut memory, 3, 888).unwrap();
        assert_eq!(memory.read_word(10), 888);
    }
}

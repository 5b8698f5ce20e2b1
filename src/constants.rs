//! Layout and encoding constants for the INTCODE machine.

/// Total number of 16-bit words in the machine's memory image.
pub const WORDCOUNT: usize = 19900;

/// First word address available to assembled programs. Entries
/// `0..PROGSTART` form the global vector.
pub const PROGSTART: usize = 401;

/// Number of words reserved at the top of memory for the assembler's
/// per-label fixup chain heads.
pub const LABVCOUNT: usize = 500;

/// First word address of the label vector.
pub const LABV_BASE: usize = WORDCOUNT - LABVCOUNT;

/// Global-vector slot holding the address of the program's entry routine.
pub const K01_START: i16 = 1;

/// Global-vector slot `readn` stores its terminating character into.
pub const K71_TERMINATOR: usize = 71;

/// Sentinel returned by `rdch` at end of stream.
pub const ENDSTREAMCH: i16 = -1;

/// Stream handle denoting process standard input.
pub const STDIN_HANDLE: i16 = 1;

/// Stream handle denoting process standard output.
pub const STDOUT_HANDLE: i16 = 2;

/// Instruction word bit marking a two-word (explicit operand) encoding.
pub const FD_BIT: i16 = 1 << 5;

/// Instruction word bit marking indirect addressing (one extra dereference).
pub const FI_BIT: i16 = 1 << 3;

/// Instruction word bit marking stack-relative addressing (operand + SP).
pub const FP_BIT: i16 = 1 << 4;

/// Mask over the primary 3-bit function code occupying the low bits of an
/// instruction word.
pub const FN_MASK: i16 = 0x7;

/// Primary 3-bit opcodes selected by `fn := w & FN_MASK`.
pub mod opcode {
    pub const L: i16 = 0;
    pub const S: i16 = 1;
    pub const A: i16 = 2;
    pub const J: i16 = 3;
    pub const T: i16 = 4;
    pub const F: i16 = 5;
    pub const K: i16 = 6;
    pub const X: i16 = 7;
}

/// System-call (K-code) catalogue used by the `K` opcode dispatcher.
pub mod syscall {
    pub const START: i16 = 1;
    pub const SETPM: i16 = 2;
    pub const ABORT: i16 = 3;
    pub const BACKTRACE: i16 = 4;
    pub const SELECTINPUT: i16 = 11;
    pub const SELECTOUTPUT: i16 = 12;
    pub const RDCH: i16 = 13;
    pub const WRCH: i16 = 14;
    pub const INPUT: i16 = 16;
    pub const OUTPUT: i16 = 17;
    pub const STOP: i16 = 30;
    pub const LEVEL: i16 = 31;
    pub const LONGJUMP: i16 = 32;
    pub const APTOVEC: i16 = 40;
    pub const FINDOUTPUT: i16 = 41;
    pub const FINDINPUT: i16 = 42;
    pub const ENDREAD: i16 = 46;
    pub const ENDWRITE: i16 = 47;
    pub const WRITES: i16 = 60;
    pub const WRITEN: i16 = 62;
    pub const NEWLINE: i16 = 63;
    pub const NEWPAGE: i16 = 64;
    pub const PACKSTRING: i16 = 66;
    pub const UNPACKSTRING: i16 = 67;
    pub const WRITED: i16 = 68;
    pub const WRITEHEX: i16 = 75;
    pub const WRITEOCT: i16 = 77;
    pub const WRITEF: i16 = 76;
    pub const READN: i16 = 70;
    pub const GETBYTE: i16 = 85;
    pub const PUTBYTE: i16 = 86;
}

/// `X` (execute) micro-op selectors.
pub mod exec_op {
    pub const AT_A: i16 = 1;
    pub const NEG: i16 = 2;
    pub const NOT: i16 = 3;
    pub const RTN: i16 = 4;
    pub const MUL: i16 = 5;
    pub const DIV: i16 = 6;
    pub const MOD: i16 = 7;
    pub const ADD: i16 = 8;
    pub const SUB: i16 = 9;
    pub const EQ: i16 = 10;
    pub const NE: i16 = 11;
    pub const LT: i16 = 12;
    pub const GE: i16 = 13;
    pub const GT: i16 = 14;
    pub const LE: i16 = 15;
    pub const LSH: i16 = 16;
    pub const RSH: i16 = 17;
    pub const AND: i16 = 18;
    pub const OR: i16 = 19;
    pub const XOR: i16 = 20;
    pub const EQV: i16 = 21;
    pub const FINISH: i16 = 22;
    pub const SWITCHON: i16 = 23;
}

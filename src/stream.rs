//! Stream registry: a small table of open byte streams keyed by handle,
//! with handles 1 and 2 permanently bound to process standard input and
//! output.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use log::{debug, warn};

use crate::constants::{ENDSTREAMCH, STDIN_HANDLE, STDOUT_HANDLE};

#[cfg(windows)]
const PLATFORM_NEWLINE: &[u8] = b"\r\n";
#[cfg(not(windows))]
const PLATFORM_NEWLINE: &[u8] = b"\n";

enum Stream {
    Stdin(BufReader<io::Stdin>),
    Stdout(io::Stdout),
    InFile(BufReader<File>),
    OutFile(File),
}

/// Owns every open stream and the current input/output selection.
pub struct Streams {
    streams: HashMap<i16, Stream>,
    current_input: i16,
    current_output: i16,
    next_handle: i16,
}

impl Streams {
    pub fn new() -> Streams {
        let mut streams = HashMap::new();
        streams.insert(STDIN_HANDLE, Stream::Stdin(BufReader::new(io::stdin())));
        streams.insert(STDOUT_HANDLE, Stream::Stdout(io::stdout()));
        Streams {
            streams,
            current_input: STDIN_HANDLE,
            current_output: STDOUT_HANDLE,
            next_handle: STDOUT_HANDLE + 1,
        }
    }

    fn fresh_handle(&mut self) -> i16 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    /// Opens `name` for reading; on failure retries the lowercased name.
    /// Returns a fresh handle, or 0 on failure.
    pub fn findinput<P: AsRef<Path>>(&mut self, name: P) -> i16 {
        let name = name.as_ref();
        let file = File::open(name).or_else(|_| {
            let lowered = name.to_string_lossy().to_lowercase();
            File::open(lowered)
        });

        match file {
            Ok(f) => {
                let handle = self.fresh_handle();
                debug!("opened input stream {} -> handle {}", name.display(), handle);
                self.streams
                    .insert(handle, Stream::InFile(BufReader::new(f)));
                handle
            }
            Err(_) => 0,
        }
    }

    /// Opens `name` for writing, truncating any existing content. Returns a
    /// fresh handle, or 0 on failure.
    pub fn findoutput<P: AsRef<Path>>(&mut self, name: P) -> i16 {
        let name = name.as_ref();
        match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(name)
        {
            Ok(f) => {
                let handle = self.fresh_handle();
                debug!("opened output stream {} -> handle {}", name.display(), handle);
                self.streams.insert(handle, Stream::OutFile(f));
                handle
            }
            Err(_) => 0,
        }
    }

    pub fn selectinput(&mut self, handle: i16) {
        self.current_input = handle;
    }

    pub fn selectoutput(&mut self, handle: i16) {
        self.current_output = handle;
    }

    pub fn current_input(&self) -> i16 {
        self.current_input
    }

    pub fn current_output(&self) -> i16 {
        self.current_output
    }

    /// Closes the currently selected input stream unless it is standard
    /// input, then resets the current input to standard input. A close on
    /// an unknown or already-closed handle is silently ignored.
    pub fn endread(&mut self) {
        if self.current_input != STDIN_HANDLE {
            if self.streams.remove(&self.current_input).is_some() {
                debug!("closed input stream {}", self.current_input);
            }
        } else {
            warn!("endread on standard input ignored");
        }
        self.current_input = STDIN_HANDLE;
    }

    /// Closes the currently selected output stream unless it is standard
    /// output, then resets the current output to standard output.
    pub fn endwrite(&mut self) {
        if self.current_output != STDOUT_HANDLE {
            if self.streams.remove(&self.current_output).is_some() {
                debug!("closed output stream {}", self.current_output);
            }
        } else {
            warn!("endwrite on standard output ignored");
        }
        self.current_output = STDOUT_HANDLE;
    }

    /// Reads one raw byte from the current input stream, folding any
    /// carriage return to a line feed. Returns `ENDSTREAMCH` at end of
    /// stream, including reads against a closed or unknown handle.
    pub fn rdch(&mut self) -> i16 {
        let mut byte = [0u8; 1];
        let read = match self.streams.get_mut(&self.current_input) {
            Some(Stream::Stdin(r)) => r.read(&mut byte),
            Some(Stream::InFile(r)) => r.read(&mut byte),
            _ => return ENDSTREAMCH,
        };

        match read {
            Ok(1) => {
                if byte[0] == b'\r' {
                    b'\n' as i16
                } else {
                    byte[0] as i16
                }
            }
            _ => ENDSTREAMCH,
        }
    }

    /// Writes one byte to the current output stream. A literal line feed
    /// (10) is expanded to the platform's native newline sequence.
    pub fn wrch(&mut self, c: i16) {
        let payload: &[u8] = if c == 10 {
            PLATFORM_NEWLINE
        } else {
            &[c as u8]
        };

        let result = match self.streams.get_mut(&self.current_output) {
            Some(Stream::Stdout(w)) => w.write_all(payload),
            Some(Stream::OutFile(w)) => w.write_all(payload),
            _ => return,
        };

        if result.is_ok() && matches!(self.streams.get(&self.current_output), Some(Stream::Stdout(_))) {
            let _ = io::stdout().flush();
        }
    }
}

impl Default for Streams {
    fn default() -> Streams {
        Streams::new()
    }
}

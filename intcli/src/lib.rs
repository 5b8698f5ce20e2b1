//! Command-line driver: assembles one or more INTCODE source files into a
//! shared memory image, plants the bootstrap sequence, and runs the
//! interpreter to completion.

pub mod error;

use std::path::PathBuf;

use clap::{App, AppSettings, Arg, ErrorKind as ClapErrorKind};
use log::{debug, info};

use intcode::constants::{opcode, FI_BIT, K01_START, PROGSTART};
use intcode::{Interpreter, Memory, Streams};

pub use error::Error;

/// Parsed command-line arguments: positional source files assembled
/// in order, plus optional `-iPATH`/`-oPATH` stream redirections.
#[derive(Debug, Default)]
struct Options {
    files: Vec<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

/// Builds the `clap` argument grammar: positional `FILES` (zero or more,
/// assembled in the order given) plus `-i`/`-o`, whose values attach
/// directly to the flag with no intervening space (`-iPATH`).
fn app() -> App<'static, 'static> {
    App::new("intcli")
        .about("Assembles and runs one or more INTCODE source files")
        .setting(AppSettings::NoBinaryName)
        .arg(
            Arg::with_name("FILES")
                .help("INTCODE source files, assembled together in order")
                .multiple(true),
        )
        .arg(
            Arg::with_name("input")
                .short("i")
                .takes_value(true)
                .value_name("PATH")
                .help("Redirects the system input stream to PATH before assembly"),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .takes_value(true)
                .value_name("PATH")
                .help("Redirects the system output stream to PATH before assembly"),
        )
}

fn parse_args(args: &[String]) -> Result<Options, Error> {
    let matches = app()
        .get_matches_from_safe(args.iter().cloned())
        .map_err(|err| match err.kind {
            // Any other `-`-prefixed token is reported as an invalid option.
            ClapErrorKind::UnknownArgument => {
                let token = err
                    .info
                    .as_ref()
                    .and_then(|info| info.first())
                    .cloned()
                    .unwrap_or_default();
                Error::InvalidOption(token)
            }
            _ => Error::Clap(err),
        })?;

    let files = matches
        .values_of("FILES")
        .map(|vs| vs.map(PathBuf::from).collect())
        .unwrap_or_default();
    let input = matches.value_of("input").map(PathBuf::from);
    let output = matches.value_of("output").map(PathBuf::from);

    Ok(Options {
        files,
        input,
        output,
    })
}

/// Writes the three-word bootstrap sequence at `PROGSTART`:
/// `L I (K01_START<<8)`, `K 2`, `X 22`.
fn plant_bootstrap(memory: &mut Memory) -> i16 {
    let mut lomem = PROGSTART as i16;

    memory.write_word(lomem as i32, opcode::L | FI_BIT | (K01_START << 8));
    lomem += 1;
    memory.write_word(lomem as i32, opcode::K | (2 << 8));
    lomem += 1;
    memory.write_word(lomem as i32, opcode::X | (22 << 8));
    lomem += 1;

    lomem
}

/// Runs the driver end to end and returns the process exit code: the
/// value returned by the interpreter on success, or 1 with a diagnostic
/// on the standard error stream on any fatal error.
pub fn run(args: &[String]) -> i16 {
    if args.is_empty() {
        print_usage();
        return 0;
    }

    match run_inner(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", err);
            1
        }
    }
}

fn run_inner(args: &[String]) -> Result<i16, Error> {
    let options = parse_args(args)?;
    if options.files.is_empty() {
        return Err(Error::NoIcFile);
    }

    let mut memory = Memory::new();
    let mut streams = Streams::new();

    if let Some(path) = &options.input {
        let handle = streams.findinput(path);
        if handle == 0 {
            return Err(Error::NoInput);
        }
        streams.selectinput(handle);
        debug!("redirected system input to {}", path.display());
    }

    if let Some(path) = &options.output {
        let handle = streams.findoutput(path);
        if handle == 0 {
            return Err(Error::NoOutput);
        }
        streams.selectoutput(handle);
        debug!("redirected system output to {}", path.display());
    }

    let mut lomem = plant_bootstrap(&mut memory);

    for file in &options.files {
        let source = std::fs::read_to_string(file).map_err(|_| Error::NoIcFile)?;
        info!("assembling {}", file.display());
        lomem = intasm::assemble(&source, &mut memory, lomem)?;
    }

    let mut interpreter = Interpreter::new(memory, streams, lomem);
    let exit_code = interpreter.run()?;
    info!("program exited with code {}", exit_code);
    Ok(exit_code)
}

fn print_usage() {
    let mut app = app();
    let _ = app.print_help();
    println!();
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn dash_prefixed_unknown_flag_is_invalid_option() {
        let args = vec!["-z".to_string()];
        let err = parse_args(&args).unwrap_err();
        matches_invalid_option(&err, "-z");
    }

    fn matches_invalid_option(err: &Error, expected: &str) {
        match err {
            Error::InvalidOption(opt) => assert_eq!(opt, expected),
            other => panic!("expected InvalidOption, got {:?}", other),
        }
    }

    #[test]
    fn dash_i_and_dash_o_attach_without_a_space() {
        let args = vec![
            "-ifoo.txt".to_string(),
            "-obar.txt".to_string(),
            "prog.ic".to_string(),
        ];
        let options = parse_args(&args).unwrap();
        assert_eq!(options.input, Some(PathBuf::from("foo.txt")));
        assert_eq!(options.output, Some(PathBuf::from("bar.txt")));
        assert_eq!(options.files, vec![PathBuf::from("prog.ic")]);
    }

    #[test]
    fn missing_ic_file_is_reported() {
        let code = run(&["-ifoo".to_string()]);
        assert_eq!(code, 1);
    }

    /// A program that stores its `STOP` argument on the stack frame a
    /// zero-offset `K` call reads from, then calls it, exits with that
    /// argument and produces no output. `G 1 L 1` wires global slot 1
    /// (read indirectly by the bootstrap) to the label `1` entry point
    /// defined just below it.
    #[test]
    fn end_to_end_stop_halts_with_its_argument_as_exit_code() {
        let src = std::env::temp_dir().join("intcli_e2e_stop.ic");
        std::fs::write(&src, "G 1 L 1\n1 L 7\nS P 2\nL 30\nK 0\nZ\n").unwrap();

        let code = run(&[src.to_string_lossy().into_owned()]);
        std::fs::remove_file(&src).unwrap();

        assert_eq!(code, 7);
    }

    /// A program that writes a packed string via `WRITES` then stops with
    /// exit code 7. The packed string `"HI\n"` (length 3, then its bytes)
    /// is assembled with `C` directives under label `2`; `WRITES`'s sole
    /// argument is that label's word address.
    #[test]
    fn end_to_end_writes_packed_string_then_stops() {
        let src = std::env::temp_dir().join("intcli_e2e_writes.ic");
        let out = std::env::temp_dir().join("intcli_e2e_writes.out");
        std::fs::write(
            &src,
            "G 1 L 1\n\
             1 L L2\n\
             S P 2\n\
             L 60\n\
             K 0\n\
             L 7\n\
             S P 2\n\
             L 30\n\
             K 0\n\
             2 C 3\n\
             C 72\n\
             C 73\n\
             C 10\n\
             Z\n",
        )
        .unwrap();

        let code = run(&[
            format!("-o{}", out.display()),
            src.to_string_lossy().into_owned(),
        ]);

        let written = std::fs::read_to_string(&out).unwrap();
        std::fs::remove_file(&src).unwrap();
        std::fs::remove_file(&out).unwrap();

        assert_eq!(code, 7);
        assert_eq!(written, "HI\n");
    }
}

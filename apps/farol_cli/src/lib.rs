//! # farol-cli
//!
//! The command-line driver for the farol interpreter: it wires the lexer,
//! parser, type checker, and evaluator together, renders diagnostics as
//! `<stage>:<code> at <line>:<column>`, and enumerates solutions
//! interactively.

pub mod cli;

use std::cell::RefCell;
use std::fs;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use clap::Parser as _;

use farol_base::{Diagnostic, Interner};
use farol_compile::TypeChecker;
use farol_kernel::{Evaluator, Step};
use farol_language::{Lexer, Parser};

use crate::cli::Cli;

/// Parses arguments and runs the requested program. The `Err` variant is
/// the fully rendered diagnostic, ready for stderr.
pub fn run_cli() -> Result<(), String> {
    let cli = Cli::parse();
    run_file(&cli)
}

/// Runs the program at `cli.input`, prompting on stdin/stdout.
pub fn run_file(cli: &Cli) -> Result<(), String> {
    let source = fs::read_to_string(&cli.input)
        .map_err(|err| format!("cannot read `{}`: {}", cli.input.display(), err))?;
    let stdout = io::stdout();
    let stdin = io::stdin();
    run_source(
        &source,
        !cli.all,
        cli.limit,
        &mut stdout.lock(),
        &mut stdin.lock(),
    )
}

/// Runs a program from source. Solutions are written one per line; in
/// interactive mode a `;` prompt is written after each and a line is read
/// from `input` (`.` stops, anything else continues). Ends with `done.`
/// unless stopped early.
pub fn run_source(
    source: &str,
    interactive: bool,
    limit: Option<usize>,
    out: &mut impl Write,
    input: &mut impl BufRead,
) -> Result<(), String> {
    let render = |diagnostic: Diagnostic| diagnostic.render(source);

    let mut interner = Interner::new();
    let tokens = Lexer::new(source, &mut interner)
        .tokenize()
        .map_err(|err| render(err.into()))?;
    let mut parser = Parser::new(tokens, &mut interner);
    let program = parser.parse_program().map_err(|err| render(err.into()))?;
    let names = parser.names();

    let mut checker = TypeChecker::new(&mut interner, names);
    let program = checker
        .check_program(&program)
        .map_err(|err| render(err.into()))?;

    let interner = Rc::new(RefCell::new(interner));
    let evaluator = Evaluator::new(interner, names, &program);
    let mut stream = evaluator.strong_eval_program(&program);

    let io_err = |err: io::Error| format!("i/o error: {}", err);
    let mut produced = 0usize;
    loop {
        if let Some(limit) = limit {
            if produced >= limit {
                break;
            }
        }
        match stream.next() {
            Step::Done => break,
            Step::Fail(error) => return Err(render(error.into())),
            Step::Yield(value, rest) => {
                writeln!(out, "{}", evaluator.show_value(&value)).map_err(io_err)?;
                produced += 1;
                stream = rest;
                if interactive {
                    write!(out, "; ").map_err(io_err)?;
                    out.flush().map_err(io_err)?;
                    let mut line = String::new();
                    let read = input.read_line(&mut line).map_err(io_err)?;
                    if read == 0 || line.trim() == "." {
                        return Ok(());
                    }
                }
            }
        }
    }
    writeln!(out, "done.").map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_all(source: &str) -> Result<String, String> {
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        run_source(source, false, None, &mut out, &mut input)?;
        Ok(String::from_utf8(out).expect("output is utf-8"))
    }

    #[test]
    fn prints_solutions_and_done() {
        let output = run_all("main = (1 <> 2)").expect("run failed");
        assert_eq!(output, "1\n2\ndone.\n");
    }

    #[test]
    fn limit_bounds_the_enumeration() {
        let mut out = Vec::new();
        let mut input = Cursor::new(Vec::new());
        run_source("main = (1 <> 2)", false, Some(1), &mut out, &mut input).expect("run failed");
        let output = String::from_utf8(out).unwrap();
        assert_eq!(output, "1\ndone.\n");
    }

    #[test]
    fn interactive_stops_on_dot() {
        let mut out = Vec::new();
        let mut input = Cursor::new(b".\n".to_vec());
        run_source("main = (1 <> 2)", true, None, &mut out, &mut input).expect("run failed");
        let output = String::from_utf8(out).unwrap();
        // the first solution, the prompt, and no `done.`
        assert_eq!(output, "1\n; ");
    }

    #[test]
    fn interactive_continues_on_semicolon() {
        let mut out = Vec::new();
        let mut input = Cursor::new(b";\n;\n".to_vec());
        run_source("main = (1 <> 2)", true, None, &mut out, &mut input).expect("run failed");
        let output = String::from_utf8(out).unwrap();
        assert_eq!(output, "1\n; 2\n; done.\n");
    }

    #[test]
    fn parse_errors_carry_stage_code_and_position() {
        let err = run_all("main = )").expect_err("should fail");
        assert!(err.starts_with("parser:"), "unexpected rendering: {}", err);
        assert!(err.contains(" at 1:"), "missing position: {}", err);
    }

    #[test]
    fn type_errors_render_with_their_code() {
        let err = run_all("main = ghost").expect_err("should fail");
        assert!(
            err.starts_with("typechecker:unbound-variable"),
            "unexpected rendering: {}",
            err
        );
    }

    #[test]
    fn lexer_errors_render_with_their_code() {
        let err = run_all("main = 1 }").expect_err("should fail");
        assert!(
            err.starts_with("lexer:unmatched-brace"),
            "unexpected rendering: {}",
            err
        );
    }

    #[test]
    fn run_file_reads_from_disk() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        write!(file, "main = fresh x . (x == 5 >> x)").expect("write");
        let cli = Cli {
            input: file.path().to_path_buf(),
            all: true,
            limit: None,
        };
        run_file(&cli).expect("run failed");
    }
}

use crate::error::ImpError;
use crate::evaluator::{interpret, Environment};
use crate::lexer::tokenize;
use crate::parser::parse;
use std::io;

/// Run a whole program against a fresh environment, printing to stdout.
/// Errors are reported to stderr; returns whether the program succeeded.
pub fn run(source: &str, filename: Option<&str>) -> bool {
    let mut environment = Environment::new();
    run_in(source, filename, &mut environment)
}

/// Like `run`, but against a caller-supplied environment.
pub fn run_in(source: &str, filename: Option<&str>, environment: &mut Environment) -> bool {
    let result = parse(tokenize(source))
        .and_then(|program| interpret(&program, environment, io::stdout().lock()));

    report_failure(result, source, filename)
}

/// Print the token stream of `source`, one token per line.
pub fn dump_tokens(source: &str, filename: Option<&str>) -> bool {
    let result = tokenize(source).try_for_each(|token| {
        let token = token?;
        println!("{:>4}..{:<4} {}", token.span.start, token.span.end, token);
        Ok(())
    });

    report_failure(result, source, filename)
}

/// Print the parsed syntax tree of `source`.
pub fn dump_ast(source: &str, filename: Option<&str>) -> bool {
    let result = parse(tokenize(source)).map(|program| println!("{:#?}", program));

    report_failure(result, source, filename)
}

fn report_failure<T>(result: Result<T, ImpError>, source: &str, filename: Option<&str>) -> bool {
    match result {
        Ok(_) => true,
        Err(error) => {
            error.report(source, filename);
            false
        }
    }
}

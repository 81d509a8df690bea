use crate::evaluator::{interpret, Environment};
use crate::lexer::tokenize;
use crate::parser::parse;
use std::io::{self, Write};

/// Start an interactive session with an empty environment.
pub fn start() {
    let mut environment = Environment::new();
    start_with(&mut environment);
}

/// Start an interactive session. Every line runs against `environment`, so
/// variables persist between commands.
pub fn start_with(environment: &mut Environment) {
    println!("imp interpreter v{}", env!("CARGO_PKG_VERSION"));
    println!("Type 'exit' or press Ctrl+D to quit");
    println!();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                // EOF reached (Ctrl+D or piped input ended)
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    println!("Goodbye!");
                    break;
                }

                run_repl_command(line, environment);
            }
            Err(error) => {
                eprintln!("Error reading input: {}", error);
                break;
            }
        }
    }
}

fn run_repl_command(source: &str, environment: &mut Environment) {
    let program = match parse(tokenize(source)) {
        Ok(program) => program,
        Err(error) => {
            error.report(source, None);
            return;
        }
    };

    // A trailing bare expression is echoed
    match interpret(&program, environment, io::stdout().lock()) {
        Ok(Some(value)) => println!("{}", value),
        Ok(None) => {}
        Err(error) => error.report(source, None),
    }
}

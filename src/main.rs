use clap::{Arg, ArgAction, ArgGroup, Command};
use imp::{repl, runner, Environment};
use std::fs;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let matches = Command::new("imp")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Interpreter for a small imperative language")
        .arg(
            Arg::new("file")
                .help("The script file to execute")
                .value_name("FILE")
                .index(1),
        )
        .arg(
            Arg::new("eval")
                .short('e')
                .long("eval")
                .help("Execute the given program text")
                .value_name("SOURCE")
                .conflicts_with("file"),
        )
        .arg(
            Arg::new("interactive")
                .short('i')
                .long("interactive")
                .help("Start in interactive REPL mode (after running FILE or --eval, if given)")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("Print the token stream instead of executing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ast")
                .long("ast")
                .help("Print the syntax tree instead of executing")
                .action(ArgAction::SetTrue),
        )
        .group(ArgGroup::new("dump").args(["tokens", "ast"]).multiple(false))
        .get_matches();

    let interactive = matches.get_flag("interactive");

    let (source, filename) = if let Some(file_path) = matches.get_one::<String>("file") {
        match read_file(file_path) {
            Some(source) => (source, Some(file_path.as_str())),
            None => return ExitCode::FAILURE,
        }
    } else if let Some(source) = matches.get_one::<String>("eval") {
        (source.clone(), None)
    } else {
        repl::start();
        return ExitCode::SUCCESS;
    };

    let succeeded = if matches.get_flag("tokens") {
        runner::dump_tokens(&source, filename)
    } else if matches.get_flag("ast") {
        runner::dump_ast(&source, filename)
    } else if interactive {
        let mut environment = Environment::new();
        let succeeded = runner::run_in(&source, filename, &mut environment);
        repl::start_with(&mut environment);
        succeeded
    } else {
        runner::run(&source, filename)
    };

    if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn read_file(path: &str) -> Option<String> {
    let path = Path::new(path);

    if !path.exists() {
        eprintln!("Error: File '{}' not found", path.display());
        return None;
    }

    match fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", path.display(), e);
            None
        }
    }
}

use std::fs;
use std::io::{self, Read};
use std::process;

use clap::Parser;

use ippcode22::cli::{Cli, USAGE};
use ippcode22::error::ErrorKind;
use ippcode22::ingest::xml;
use ippcode22::interpreter::{Interpreter, StatsConfig};
use ippcode22::io::{FileInput, InputSource, StdinInput};
use ippcode22::program::Program;

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("[Error](BAD_ARG) {}", e);
            process::exit(10);
        }
    };

    if let Err(e) = cli.validate(&raw_args) {
        report_and_exit(e);
    }

    if cli.help {
        print!("{}", USAGE);
        process::exit(0);
    }

    match run(&cli, &raw_args) {
        Ok(code) => process::exit(code),
        Err(e) => report_and_exit(e),
    }
}

fn report_and_exit(e: ErrorKind) -> ! {
    eprintln!("[Error] {}", e);
    process::exit(e.exit_code());
}

fn run(cli: &Cli, raw_args: &[String]) -> Result<i32, ErrorKind> {
    let source_text = read_source(cli.source.as_deref())?;
    let instructions = xml::parse(&source_text)?;
    let program = Program::new(instructions)?;

    let input: Box<dyn InputSource> = match cli.input.as_deref() {
        Some(path) => Box::new(FileInput::open(path)?),
        None => Box::new(StdinInput::new()),
    };

    let stats_config = cli.stats.as_ref().map(|path| StatsConfig {
        path: path.clone(),
        selectors: Cli::selector_order(raw_args),
    });

    let interpreter = Interpreter::new(
        &program,
        input,
        Box::new(io::stdout()),
        Box::new(io::stderr()),
    );
    interpreter.run(stats_config)
}

fn read_source(path: Option<&str>) -> Result<String, ErrorKind> {
    match path {
        Some(path) => fs::read_to_string(path)
            .map_err(|e| ErrorKind::InputFile(format!("{}: {}", path, e))),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| ErrorKind::InputFile(e.to_string()))?;
            Ok(buf)
        }
    }
}

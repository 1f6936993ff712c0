use std::cell::Cell;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use grus::ast_printer::AstPrinter;
use grus::error::GrusError;
use grus::interpreter::Interpreter;
use grus::parser::Parser;
use grus::resolver::Resolver;
use grus::scanner::Scanner;
use grus::token::Token;

#[derive(ClapParser, Debug)]
#[command(version, about = "Grus language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: Option<PathBuf>,

        /// Emit the token stream as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Parses input from a file and prints its AST
    Parse { filename: Option<PathBuf> },

    /// Runs input from a file as a Grus program
    Run { filename: Option<PathBuf> },
}

/// Map a script file into memory. Empty files cannot be mapped and come
/// back as `None`.
fn map_file(filename: &PathBuf) -> Result<Option<Mmap>> {
    info!("Mapping file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .context(format!("Failed to stat file {:?}", filename))?
        .len();

    if len == 0 {
        info!("File {:?} is empty", filename);

        return Ok(None);
    }

    let mmap =
        unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", mmap.len(), filename);

    Ok(Some(mmap))
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module path and source line
    Builder::new()
        .format(|buf, record| {
            // Strip 'grus::' from module path
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("grus::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .init();

    info!("Logger initialized, writing to app.log");

    Ok(())
}

/// Classic "Error at 'x'" location fragment for parse/resolve diagnostics.
fn at_token(token: &Token, message: &str) -> String {
    if token.lexeme.is_empty() {
        format!("at end: {}", message)
    } else {
        format!("at '{}': {}", token.lexeme, message)
    }
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename, json } => match filename {
            Some(filename) => {
                info!("Running Tokenize subcommand");

                let mmap = map_file(&filename)?;
                let bytes: &[u8] = mmap.as_ref().map_or(&[], |m| &m[..]);

                std::str::from_utf8(bytes).context("Source is not valid UTF-8")?;

                let mut tokenized = true;

                let mut report = |line: usize, column: usize, message: &str| {
                    tokenized = false;

                    eprintln!("{}", GrusError::lex(line, column, message));
                };

                let tokens = Scanner::new(bytes, &mut report).scan_tokens();

                if json {
                    println!("{}", serde_json::to_string_pretty(&tokens)?);
                } else {
                    for token in &tokens {
                        debug!("Scanned token: {}", token);

                        println!("{}", token);
                    }
                }

                if !tokenized {
                    debug!("Tokenization failed, exiting with code 65");

                    std::process::exit(65);
                }

                info!("Tokenization completed successfully");
            }

            None => {
                info!("No filepath provided for Tokenize");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Parse { filename } => match filename {
            Some(filename) => {
                info!("Running Parse subcommand");

                let mmap = map_file(&filename)?;
                let bytes: &[u8] = mmap.as_ref().map_or(&[], |m| &m[..]);

                std::str::from_utf8(bytes).context("Source is not valid UTF-8")?;

                let had_error = Cell::new(false);

                let mut report_lex = |line: usize, column: usize, message: &str| {
                    had_error.set(true);

                    eprintln!("{}", GrusError::lex(line, column, message));
                };

                let tokens = Scanner::new(bytes, &mut report_lex).scan_tokens();

                let mut report_parse = |token: &Token, message: &str| {
                    had_error.set(true);

                    eprintln!(
                        "{}",
                        GrusError::parse(token.line, token.column, at_token(token, message))
                    );
                };

                let program = Parser::new(&tokens, &mut report_parse).parse();

                if had_error.get() {
                    debug!("Parsing failed, exiting with code 65");

                    std::process::exit(65);
                }

                println!("{}", AstPrinter.print_program(&program));

                info!("Parse subcommand completed");
            }

            None => {
                info!("No filepath provided for Parse");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },

        Commands::Run { filename } => match filename {
            Some(filename) => {
                info!("Running Run subcommand");

                let mmap = map_file(&filename)?;
                let bytes: &[u8] = mmap.as_ref().map_or(&[], |m| &m[..]);

                let text = std::str::from_utf8(bytes).context("Source is not valid UTF-8")?;

                info!("Provided input:\n{}", text);

                let had_error = Cell::new(false);

                let mut report_lex = |line: usize, column: usize, message: &str| {
                    had_error.set(true);

                    eprintln!("{}", GrusError::lex(line, column, message));
                };

                let tokens = Scanner::new(bytes, &mut report_lex).scan_tokens();

                let mut report_parse = |token: &Token, message: &str| {
                    had_error.set(true);

                    eprintln!(
                        "{}",
                        GrusError::parse(token.line, token.column, at_token(token, message))
                    );
                };

                let program = Parser::new(&tokens, &mut report_parse).parse();

                info!("Parsed {} statement(s)", program.len());

                let mut report_resolve = |token: &Token, message: &str| {
                    had_error.set(true);

                    eprintln!(
                        "{}",
                        GrusError::resolve(token.line, token.column, at_token(token, message))
                    );
                };

                let locals = Resolver::new(&mut report_resolve).resolve(&program);

                if had_error.get() {
                    debug!("Static diagnostics reported, exiting with code 65");

                    std::process::exit(65);
                }

                let mut interpreter = Interpreter::new(locals);

                let failed = Cell::new(false);

                interpreter.interpret(&program, &mut |fault| {
                    failed.set(true);

                    eprintln!("{}", GrusError::Runtime(fault.to_string()));
                });

                if failed.get() {
                    debug!("Runtime fault, exiting with code 70");

                    std::process::exit(70);
                }

                info!("Program executed successfully");
            }

            None => {
                info!("No filepath provided for Run");

                println!("No input filepath was provided. Exiting...");

                std::process::exit(0);
            }
        },
    }

    Ok(())
}

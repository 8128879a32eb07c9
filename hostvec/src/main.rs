//! hostvec CLI

use clap::{Parser, Subcommand};
use hostvec::config::RuntimeConfig;
use hostvec::error::report_error;
use hostvec::interp::Evaluator;
use hostvec::runtime::Runtime;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "hostvec", version, about = "Native vector bound to a scripted host")]
struct Cli {
    /// Runtime configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a host script
    Run {
        /// Script file
        file: PathBuf,
    },
    /// Run a host script, then print object statistics as JSON
    Stats {
        /// Script file
        file: PathBuf,
    },
    /// Start the interactive REPL
    Repl,
    /// Parse and dump the syntax tree (debug)
    Parse {
        /// Script file
        file: PathBuf,
    },
    /// Tokenize and dump tokens (debug)
    Tokens {
        /// Script file
        file: PathBuf,
    },
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: logging unavailable: {e}");
    }

    let result = load_config(cli.config.as_deref()).and_then(|config| match &cli.command {
        Command::Run { file } => run_file(file, config, false),
        Command::Stats { file } => run_file(file, config, true),
        Command::Repl => run_repl(config),
        Command::Parse { file } => parse_file(file),
        Command::Tokens { file } => tokenize_file(file),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(RuntimeConfig::load(path)?),
        None => Ok(RuntimeConfig::default()),
    }
}

fn run_file(path: &Path, config: RuntimeConfig, stats: bool) -> CliResult {
    let source = std::fs::read_to_string(path)?;
    let filename = path.display().to_string();

    let mut evaluator = Evaluator::new(Runtime::new(config));
    let result = evaluator.run_source(&source);
    for line in evaluator.take_output() {
        println!("{line}");
    }
    if let Err(e) = result {
        report_error(&filename, &source, &e)?;
        std::process::exit(1);
    }

    if stats {
        println!("{}", serde_json::to_string_pretty(&evaluator.stats())?);
    }
    Ok(())
}

fn run_repl(config: RuntimeConfig) -> CliResult {
    let mut repl = hostvec::repl::Repl::new(config)?;
    repl.run()?;
    Ok(())
}

fn parse_file(path: &Path) -> CliResult {
    let source = std::fs::read_to_string(path)?;
    let tokens = hostvec::lexer::tokenize(&source)?;
    let script = hostvec::parser::parse(tokens)?;

    println!("{}", serde_json::to_string_pretty(&script)?);
    Ok(())
}

fn tokenize_file(path: &Path) -> CliResult {
    let source = std::fs::read_to_string(path)?;

    let tokens = hostvec::lexer::tokenize(&source)?;
    for (tok, span) in &tokens {
        println!("{:?} @ {}..{}", tok, span.start, span.end);
    }

    Ok(())
}

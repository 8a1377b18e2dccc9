use hivec::codegen::DEFAULT_RETURN_STACK;
use hivec::diagnostic::{Diagnostic, Stage};
use hivec::driver::{self, Options};
use hivec::error::Result;

use clap::{Parser, ValueEnum};
use tracing::{debug, error};
use tracing_subscriber::{EnvFilter, fmt};

use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

#[derive(Parser, Debug)]
#[command(name = "hivec")]
#[command(about = "Compile hive sources into NASM assembly for x86-64 Linux")]
struct Cli {
    /// Source files to compile
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Output file, or output directory when compiling several sources
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Capacity of the return stack in bytes
    #[arg(long = "return-stack", default_value_t = DEFAULT_RETURN_STACK)]
    return_stack: usize,

    /// Print every token after lexing
    #[arg(long = "dump-tokens")]
    dump_tokens: bool,

    /// Print every procedure after parsing
    #[arg(long = "dump-procedures")]
    dump_procedures: bool,

    /// When to color diagnostics
    #[arg(long, value_enum, default_value = "auto")]
    color: Color,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn init_color(color: Color) {
    match color {
        Color::Always => yansi::enable(),
        Color::Never => yansi::disable(),
        Color::Auto => {
            if !(io::stdout().is_terminal() && io::stderr().is_terminal()) {
                yansi::disable();
            }
        }
    }
}

fn run(cli: Cli) -> Result<bool> {
    let missing: Vec<_> = cli.sources.iter().filter(|source| !source.exists()).collect();
    if !missing.is_empty() {
        for source in missing {
            Diagnostic::error(
                Stage::Main,
                format!("file `{}` does not exist!", source.display()),
            )
            .emit(None)?;
        }
        return Ok(false);
    }

    let options = Options {
        return_stack: cli.return_stack,
        dump_tokens: cli.dump_tokens,
        dump_procedures: cli.dump_procedures,
    };
    let outputs = match driver::plan_outputs(&cli.sources, cli.output.as_deref()) {
        Ok(outputs) => outputs,
        Err(collisions) => {
            for collision in collisions {
                collision.emit(None)?;
            }
            return Ok(false);
        }
    };

    let mut succeeded = true;
    for (source, output) in cli.sources.iter().zip(&outputs) {
        if !driver::compile_file(source, output, &options)? {
            debug!(source = %source.display(), "compilation failed");
            succeeded = false;
        }
    }
    Ok(succeeded)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();
    init_color(cli.color);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

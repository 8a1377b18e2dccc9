use crate::ast::Program;
use crate::codegen::{self, DEFAULT_RETURN_STACK};
use crate::diagnostic::{Diagnostic, Diagnostics, Stage};
use crate::error::{Error, Result};
use crate::{lexer, parser, typechecker};

use tracing::{debug, error, info};

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fs;
use std::path::{Path, PathBuf};


/// Output file used when a single source is compiled without `-o`.
pub const DEFAULT_OUTPUT: &str = "target.asm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub return_stack: usize,
    pub dump_tokens: bool,
    pub dump_procedures: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            return_stack: DEFAULT_RETURN_STACK,
            dump_tokens: false,
            dump_procedures: false,
        }
    }
}

/// Result of running the pipeline over one source text.
#[derive(Debug, Default)]
pub struct Outcome {
    pub assembly: Option<String>,
    pub diagnostics: Diagnostics,
}

impl Outcome {
    pub fn succeeded(&self) -> bool {
        self.assembly.is_some() && !self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Unwraps a stage result, or records its diagnostics and ends the file.
macro_rules! stage {
    ($outcome:ident, $stage:expr, $result:expr) => {
        match $result {
            Ok(value) => {
                $outcome.diagnostics.push(Diagnostic::success(
                    $stage,
                    format!("{} finished successfully!", $stage),
                ));
                value
            }
            Err(diagnostics) => {
                debug!(stage = %$stage, errors = diagnostics.len(), "stage failed");
                $outcome.diagnostics.extend(diagnostics);
                return Ok($outcome);
            }
        }
    };
}

/// Runs lexer, parser, type checker and code generator in order. Problems
/// with the program and internal translator errors end up in the outcome's
/// diagnostics.
pub fn compile_source(file: &str, source: &str, options: &Options) -> Result<Outcome> {
    let mut outcome = Outcome::default();

    let tokens = stage!(outcome, Stage::Lexer, lexer::lex(file, source));
    if options.dump_tokens {
        for token in &tokens {
            println!("{token}");
        }
    }

    let program = stage!(outcome, Stage::Parser, parser::parse(tokens));
    if options.dump_procedures {
        print!("{program}");
    }

    stage!(outcome, Stage::Validator, typechecker::check(&program));

    translate_into(&mut outcome, &program, options.return_stack)?;
    Ok(outcome)
}

/// Translates a checked program. An internal error fails only this file.
pub fn translate_into(outcome: &mut Outcome, program: &Program, return_stack: usize) -> Result<()> {
    match codegen::translate(program, return_stack) {
        Ok(assembly) => outcome.assembly = Some(assembly),
        Err(internal @ Error::Internal { .. }) => {
            error!(%internal, "translation aborted");
            outcome
                .diagnostics
                .push(Diagnostic::error(Stage::Translator, internal.to_string()));
        }
        Err(other) => return Err(other),
    }
    Ok(())
}

/// Compiles one file into `output`, printing its diagnostics. Returns
/// whether the file compiled.
pub fn compile_file(path: &Path, output: &Path, options: &Options) -> Result<bool> {
    info!(source = %path.display(), output = %output.display(), "compiling");

    let source = match lexer::read_source(path) {
        Ok(source) => source,
        Err(diagnostic) => {
            diagnostic.emit(None)?;
            return Ok(false);
        }
    };

    let mut outcome = compile_source(&path.display().to_string(), &source, options)?;
    if let Some(assembly) = &outcome.assembly {
        let written = match fs::write(output, assembly) {
            Ok(()) => Diagnostic::success(Stage::Translator, "translator finished successfully!"),
            Err(error) => Diagnostic::error(
                Stage::Translator,
                format!(
                    "failed to write assembly to `{}`! ({error})",
                    output.display()
                ),
            ),
        };
        outcome.diagnostics.push(written);
    }

    for diagnostic in &outcome.diagnostics {
        diagnostic.emit(Some(&source))?;
    }
    Ok(outcome.succeeded())
}

/// Output path for every source. A single source writes to `output` (or
/// `target.asm`); several sources write `<source>.asm`, into `output` when
/// it names a directory. Two sources may not share an output.
pub fn plan_outputs(sources: &[PathBuf], output: Option<&Path>) -> std::result::Result<Vec<PathBuf>, Diagnostics> {
    if let [_] = sources {
        return Ok(vec![output.map_or_else(|| PathBuf::from(DEFAULT_OUTPUT), Path::to_path_buf)]);
    }

    let outputs: Vec<PathBuf> = sources
        .iter()
        .map(|source| {
            let assembly = source.with_extension("asm");
            match (output, assembly.file_name()) {
                (Some(directory), Some(name)) => directory.join(name),
                _ => assembly,
            }
        })
        .collect();

    let clashes = collisions(sources, &outputs);
    if !clashes.is_empty() {
        return Err(clashes);
    }
    Ok(outputs)
}

fn collisions(sources: &[PathBuf], outputs: &[PathBuf]) -> Diagnostics {
    let mut claimed: HashMap<&Path, &Path> = HashMap::new();
    let mut collisions = vec![];

    for (source, output) in sources.iter().zip(outputs) {
        match claimed.entry(output.as_path()) {
            Entry::Occupied(first) => collisions.push(Diagnostic::error(
                Stage::Main,
                format!(
                    "sources `{}` and `{}` would both be compiled to `{}`!",
                    first.get().display(),
                    source.display(),
                    output.display()
                ),
            )),
            Entry::Vacant(slot) => {
                slot.insert(source.as_path());
            }
        }
    }
    collisions
}

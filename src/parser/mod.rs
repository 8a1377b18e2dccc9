pub mod crossref;
pub mod procedure;

use crate::ast::{Procedure, Program, StringLiteral};
use crate::diagnostic::{Diagnostic, Diagnostics, Stage};
use crate::lexer::{Lexeme, Token};

use ariadne::{Color, Fmt};
use tracing::debug;

use std::iter::Peekable;
use std::vec::IntoIter;


type TokenIter = Peekable<IntoIter<Lexeme>>;

pub struct Parser {
    tokens: TokenIter,
    procedures: Vec<Procedure>,
}

impl Parser {
    pub fn new(tokens: Vec<Lexeme>) -> Self {
        Parser {
            tokens: tokens.into_iter().peekable(),
            procedures: vec![],
        }
    }

    pub fn parse_program(mut self) -> Result<Vec<Procedure>, Diagnostics> {
        while let Some(lexeme) = self.tokens.next() {
            match lexeme.token {
                Token::KeywordProcedure => {
                    let procedure = self.parse_procedure(lexeme)?;
                    self.define(procedure)?;
                }
                _ => {
                    return Err(lexeme
                        .error(
                            Stage::Parser,
                            format!("encountered an invalid global token `{}`!", lexeme.source),
                        )
                        .with_note(format!(
                            "only {} definitions may appear at the top level",
                            "procedure".fg(Color::Yellow)
                        ))
                        .into());
                }
            }
        }

        if !self.procedures.iter().any(|procedure| procedure.is_main) {
            return Err(Diagnostic::error(Stage::Parser, "missing `main` procedure!").into());
        }
        Ok(self.procedures)
    }

    fn define(&mut self, procedure: Procedure) -> Result<(), Diagnostic> {
        if let Some(existing) = self
            .procedures
            .iter()
            .find(|existing| existing.name() == procedure.name())
        {
            return Err(procedure
                .name
                .error(
                    Stage::Parser,
                    format!(
                        "encountered an already defined procedure `{}`!",
                        procedure.name()
                    ),
                )
                .with_label(existing.name.span.clone(), "first defined here"));
        }
        debug!(procedure = procedure.name(), tokens = procedure.body.len(), "parsed procedure");
        self.procedures.push(procedure);
        Ok(())
    }
}

/// Collects every distinct string literal, keyed by its exact source text.
pub fn collect_string_literals(tokens: &[Lexeme]) -> Vec<StringLiteral> {
    let mut literals: Vec<StringLiteral> = vec![];
    for lexeme in tokens {
        if let Token::Str(bytes) = &lexeme.token {
            if !literals.iter().any(|literal| literal.source == lexeme.source) {
                literals.push(StringLiteral::new(&lexeme.source, bytes.clone()));
            }
        }
    }
    literals
}

/// Parses a whole file: literal table, procedures, then control-flow links.
pub fn parse(tokens: Vec<Lexeme>) -> Result<Program, Diagnostics> {
    let string_literals = collect_string_literals(&tokens);
    let mut procedures = Parser::new(tokens).parse_program()?;

    for procedure in &mut procedures {
        crossref::cross_reference(&mut procedure.body)?;
    }

    Ok(Program {
        procedures,
        string_literals,
    })
}

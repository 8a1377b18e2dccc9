use super::Parser;

use crate::ast::Procedure;
use crate::diagnostic::{Diagnostic, Diagnostics, Stage};
use crate::lexer::{Lexeme, Token};

use ariadne::{Color, Fmt};

fn procedure_syntax() -> String {
    format!(
        "procedure syntax: {} <name> [{} <types>] [{} <types>] {} <body> {}",
        "procedure".fg(Color::Yellow),
        "require".fg(Color::Yellow),
        "return".fg(Color::Yellow),
        "do".fg(Color::Yellow),
        "end".fg(Color::Yellow),
    )
}

impl Parser {
    pub fn parse_procedure(&mut self, keyword: Lexeme) -> Result<Procedure, Diagnostics> {
        let Some(name) = self.tokens.next() else {
            return Err(keyword
                .error(
                    Stage::Parser,
                    "missing an identifier token after the `procedure` keyword!",
                )
                .with_note(procedure_syntax())
                .into());
        };

        let is_main = match name.token {
            Token::Identifier => false,
            Token::KeywordMain => true,
            _ => {
                return Err(name
                    .error(
                        Stage::Parser,
                        format!(
                            "encountered an invalid token for procedure's name: `{}`!",
                            name.source
                        ),
                    )
                    .with_note(procedure_syntax())
                    .into());
            }
        };

        let mut required = vec![];
        let mut returned = vec![];

        let mut next = self.expect_header_token(&name)?;
        if next.token == Token::KeywordRequire {
            (required, next) = self.parse_type_list(&next, true)?;
        }
        if next.token == Token::KeywordReturn {
            (returned, next) = self.parse_type_list(&next, false)?;
        }
        if next.token != Token::KeywordDo {
            return Err(next
                .error(
                    Stage::Parser,
                    format!(
                        "encountered an invalid keyword `{}` instead of `do` keyword after procedure's definition!",
                        next.source
                    ),
                )
                .with_note(procedure_syntax())
                .into());
        }

        let body = self.parse_body(next)?;
        Ok(Procedure {
            name,
            required,
            returned,
            body,
            is_main,
        })
    }

    fn expect_header_token(&mut self, name: &Lexeme) -> Result<Lexeme, Diagnostic> {
        self.tokens.next().ok_or_else(|| {
            name.error(
                Stage::Parser,
                "expected a `do`, `require`, or `return` keyword to follow the procedure's name!",
            )
        })
    }

    /// Reads `i64`/`p64` specifiers after `require` or `return` and hands back
    /// the token that ended the list.
    fn parse_type_list(
        &mut self,
        clause: &Lexeme,
        allow_return: bool,
    ) -> Result<(Vec<Lexeme>, Lexeme), Diagnostic> {
        let mut types = vec![];
        loop {
            let Some(lexeme) = self.tokens.next() else {
                return Err(clause.error(
                    Stage::Parser,
                    format!(
                        "reached end of file while parsing `{}` types specifiers!",
                        clause.source
                    ),
                ));
            };

            match lexeme.token {
                Token::KeywordI64 | Token::KeywordP64 => types.push(lexeme),
                Token::KeywordDo => return Ok((types, lexeme)),
                Token::KeywordReturn if allow_return => return Ok((types, lexeme)),
                _ => {
                    return Err(lexeme
                        .error(
                            Stage::Parser,
                            format!(
                                "encountered invalid keyword `{}` in the place of `{}` types specifiers!",
                                lexeme.source, clause.source
                            ),
                        )
                        .with_label(clause.span.clone(), "types list starts here"));
                }
            }
        }
    }

    /// Consumes tokens up to the `end` that closes `opening`. Nested `do`
    /// blocks are kept verbatim.
    fn parse_body(&mut self, opening: Lexeme) -> Result<Vec<Lexeme>, Diagnostics> {
        let mut body: Vec<Lexeme> = vec![];
        // `None` stands for the procedure's own `do`
        let mut open: Vec<Option<usize>> = vec![None];

        while let Some(lexeme) = self.tokens.next() {
            match lexeme.token {
                Token::KeywordDo => {
                    open.push(Some(body.len()));
                    body.push(lexeme);
                }
                Token::KeywordEnd => {
                    open.pop();
                    if open.is_empty() {
                        return Ok(body);
                    }
                    body.push(lexeme);
                }
                Token::KeywordProcedure
                | Token::KeywordRequire
                | Token::KeywordReturn
                | Token::KeywordI64
                | Token::KeywordP64 => {
                    return Err(lexeme
                        .error(
                            Stage::Parser,
                            format!(
                                "encountered invalid token `{}` in procedure's body!",
                                lexeme.source
                            ),
                        )
                        .with_label(opening.span.clone(), "body opened here")
                        .into());
                }
                _ => body.push(lexeme),
            }
        }

        Err(open
            .iter()
            .rev()
            .map(|entry| {
                let unclosed = entry.map_or(&opening, |index| &body[index]);
                unclosed.error(
                    Stage::Parser,
                    format!("encountered an unhandled token `{}`!", unclosed.source),
                )
            })
            .collect())
    }
}

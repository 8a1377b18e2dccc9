use crate::diagnostic::{Diagnostic, Diagnostics, Stage};
use crate::lexer::{Lexeme, Token};

use tracing::trace;

fn link(body: &mut [Lexeme], from: usize, to: usize) {
    body[from].next_ref = Some(to);
    body[to].previous_ref = Some(from);
}

fn is_opener(token: &Token) -> bool {
    matches!(token, Token::KeywordIf | Token::KeywordWhile)
}

/// Token that introduced the block a `do` closes.
fn opener_of(body: &[Lexeme], index: usize) -> Option<&Token> {
    body[index].previous_ref.map(|opener| &body[opener].token)
}

fn misplaced(lexeme: &Lexeme, expected: &str) -> Diagnostic {
    lexeme.error(
        Stage::Parser,
        format!(
            "`{}` keyword must follow {expected}!",
            lexeme.source
        ),
    )
}

/// Links the control keywords of one procedure body through
/// `next_ref`/`previous_ref`:
///
/// - `if`/`while` -> `do`
/// - `do` -> `else` or `end`
/// - `else` -> `end`
/// - the `end` of a loop points back at its `while`
pub fn cross_reference(body: &mut [Lexeme]) -> Result<(), Diagnostics> {
    let mut open: Vec<usize> = vec![];

    for index in 0..body.len() {
        match body[index].token {
            Token::KeywordIf | Token::KeywordWhile => {
                if let Some(&top) = open.last() {
                    if is_opener(&body[top].token) {
                        return Err(body[top]
                            .error(
                                Stage::Parser,
                                format!(
                                    "encountered an invalid keyword `{}`, following the `{}` keyword!",
                                    body[index].source, body[top].source
                                ),
                            )
                            .with_label(body[index].span.clone(), "nested here")
                            .into());
                    }
                }
                open.push(index);
            }

            Token::KeywordDo => match open.pop() {
                Some(opener) if is_opener(&body[opener].token) => {
                    link(body, opener, index);
                    open.push(index);
                }
                _ => {
                    return Err(misplaced(
                        &body[index],
                        "`if <condition>` or `while <condition>` sequence",
                    )
                    .into());
                }
            },

            Token::KeywordElse => match open.pop() {
                Some(popped)
                    if body[popped].token == Token::KeywordDo
                        && opener_of(body, popped) == Some(&Token::KeywordIf) =>
                {
                    link(body, popped, index);
                    open.push(index);
                }
                _ => {
                    return Err(misplaced(&body[index], "`if <condition> do <block>` sequence").into());
                }
            },

            Token::KeywordEnd => {
                let Some(popped) = open.pop() else {
                    return Err(misplaced(
                        &body[index],
                        "`if <condition> do <block>`, `if <condition> do <block> else <block>`, or `while <condition> do <block>` sequences",
                    )
                    .into());
                };

                // Some(back edge) when the end closes a valid block
                let back_edge = match (&body[popped].token, opener_of(body, popped)) {
                    (Token::KeywordDo, Some(Token::KeywordIf)) | (Token::KeywordElse, _) => {
                        Some(None)
                    }
                    (Token::KeywordDo, Some(Token::KeywordWhile)) => {
                        Some(body[popped].previous_ref)
                    }
                    _ => None,
                };

                let Some(back_edge) = back_edge else {
                    return Err(misplaced(
                        &body[index],
                        "`if <condition> do <block>`, `if <condition> do <block> else <block>`, or `while <condition> do <block>` sequences",
                    )
                    .with_label(body[popped].span.clone(), "left open here")
                    .into());
                };
                link(body, popped, index);
                body[index].next_ref = back_edge;
            }

            _ => {}
        }
    }

    if !open.is_empty() {
        return Err(open
            .iter()
            .rev()
            .map(|&index| {
                body[index].error(
                    Stage::Parser,
                    format!("encountered an unhandled token `{}`!", body[index].source),
                )
            })
            .collect());
    }

    trace!(tokens = body.len(), "cross referenced body");
    Ok(())
}

pub mod intrinsic;


use crate::ast::{Procedure, Program, Type};
use crate::diagnostic::{Diagnostic, Diagnostics, Stage};
use crate::lexer::{Lexeme, Token};

use tracing::debug;

use std::collections::HashMap;

/// Simulates procedure bodies on a stack of abstract types.
#[derive(Debug)]
pub struct TypeEnv<'a> {
    procedures: HashMap<&'a str, &'a Procedure>,
    stack: Vec<Type>,
}

fn declared_type(lexeme: &Lexeme) -> Result<Type, Diagnostic> {
    Type::from_token(&lexeme.token).ok_or_else(|| {
        lexeme.error(
            Stage::Validator,
            format!("encountered an invalid type specifier `{}`!", lexeme.source),
        )
    })
}

fn describe(types: &[Type]) -> String {
    types
        .iter()
        .map(Type::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

impl<'a> TypeEnv<'a> {
    pub fn new(program: &'a Program) -> Self {
        TypeEnv {
            procedures: program
                .procedures
                .iter()
                .map(|procedure| (procedure.name(), procedure))
                .collect(),
            stack: vec![],
        }
    }

    #[cfg(test)]
    pub fn stack(&self) -> &[Type] {
        &self.stack
    }

    pub fn check_procedure(&mut self, procedure: &Procedure) -> Result<(), Diagnostic> {
        self.stack.clear();
        for required in &procedure.required {
            self.stack.push(declared_type(required)?);
        }

        for lexeme in &procedure.body {
            self.check_lexeme(lexeme)?;
        }

        self.check_returns(procedure)?;
        debug!(procedure = procedure.name(), "type checked procedure");
        Ok(())
    }

    fn check_lexeme(&mut self, lexeme: &Lexeme) -> Result<(), Diagnostic> {
        match &lexeme.token {
            Token::Int(_) => self.stack.push(Type::I64),
            Token::Str(_) => {
                self.stack.push(Type::I64);
                self.stack.push(Type::P64);
            }

            Token::Add => self.apply_binary(lexeme, "(i64 i64), (i64 p64), or (p64 i64)", intrinsic::add)?,
            Token::Subtract => self.apply_binary(lexeme, "(i64 i64) or (p64 i64)", intrinsic::subtract)?,
            Token::Multiply
            | Token::Divide
            | Token::Modulus
            | Token::Band
            | Token::Bor
            | Token::Shiftl
            | Token::Shiftr => self.apply_binary(lexeme, "(i64 i64)", intrinsic::integer)?,
            Token::Equal | Token::Nequal | Token::Greater | Token::Less => {
                self.apply_binary(lexeme, "(i64 i64) or (p64 p64)", intrinsic::compare)?
            }
            Token::Bnot => self.apply_bnot(lexeme)?,
            Token::Syscall0
            | Token::Syscall1
            | Token::Syscall2
            | Token::Syscall3
            | Token::Syscall4
            | Token::Syscall5
            | Token::Syscall6 => self.apply_syscall(lexeme)?,

            Token::Clone => {
                let [a] = self.pop_arguments::<1>(lexeme, "intrinsic")?;
                self.stack.extend([a, a]);
            }
            Token::Drop => {
                let [_] = self.pop_arguments::<1>(lexeme, "intrinsic")?;
            }
            Token::Over => {
                let [a, b] = self.pop_arguments::<2>(lexeme, "intrinsic")?;
                self.stack.extend([a, b, a]);
            }
            Token::Swap => {
                let [a, b] = self.pop_arguments::<2>(lexeme, "intrinsic")?;
                self.stack.extend([b, a]);
            }

            Token::KeywordDo => {
                if lexeme.previous_ref.is_some() {
                    let [condition] = self.pop_arguments::<1>(lexeme, "keyword")?;
                    if condition != Type::I64 {
                        return Err(lexeme
                            .error(
                                Stage::Validator,
                                "`do` keyword only supports (i64) sets of arguments!",
                            )
                            .with_note(format!("found ({condition})")));
                    }
                }
            }
            Token::KeywordIf | Token::KeywordElse | Token::KeywordWhile | Token::KeywordEnd => {}

            Token::Identifier => self.call(lexeme)?,

            Token::KeywordMain
            | Token::KeywordI64
            | Token::KeywordP64
            | Token::KeywordProcedure
            | Token::KeywordRequire
            | Token::KeywordReturn => {
                return Err(lexeme.error(
                    Stage::Validator,
                    format!(
                        "encountered invalid token `{}` in procedure's body!",
                        lexeme.source
                    ),
                ));
            }
        }
        Ok(())
    }

    fn call(&mut self, lexeme: &Lexeme) -> Result<(), Diagnostic> {
        let Some(&callee) = self.procedures.get(lexeme.source.as_str()) else {
            return Err(lexeme.error(
                Stage::Validator,
                format!("encountered undefined procedure `{}`!", lexeme.source),
            ));
        };

        for required in &callee.required {
            let expected = declared_type(required)?;
            let found = self.stack.pop();
            if found == Some(expected) {
                continue;
            }
            let found = found.map_or("the stack is empty".to_string(), |found| {
                format!("found `{found}`")
            });
            return Err(lexeme
                .error(
                    Stage::Validator,
                    format!(
                        "procedure `{}` requires `{expected}` type to be on the stack, but {found}!",
                        callee.name()
                    ),
                )
                .with_label(required.span.clone(), "required here"));
        }

        for returned in &callee.returned {
            self.stack.push(declared_type(returned)?);
        }
        Ok(())
    }

    /// The first listed return type has to be on top of the stack.
    fn check_returns(&mut self, procedure: &Procedure) -> Result<(), Diagnostic> {
        for returned in &procedure.returned {
            let expected = declared_type(returned)?;
            match self.stack.last() {
                Some(&found) if found == expected => {
                    self.stack.pop();
                }
                found => {
                    let found = found.map_or("the stack is empty".to_string(), |found| {
                        format!("found `{found}`")
                    });
                    return Err(returned.error(
                        Stage::Validator,
                        format!(
                            "procedure `{}` expected `{expected}` type to be on the stack, but {found}!",
                            procedure.name()
                        ),
                    ));
                }
            }
        }

        if !self.stack.is_empty() {
            return Err(procedure
                .name
                .error(
                    Stage::Validator,
                    format!("procedure's `{}` stack has an overflow!", procedure.name()),
                )
                .with_note(format!(
                    "{} value(s) left on the stack: ({})",
                    self.stack.len(),
                    describe(&self.stack)
                )));
        }
        Ok(())
    }
}

/// Checks every procedure, stopping at the first violation.
pub fn check(program: &Program) -> Result<(), Diagnostics> {
    let mut env = TypeEnv::new(program);
    for procedure in &program.procedures {
        env.check_procedure(procedure)?;
    }
    Ok(())
}

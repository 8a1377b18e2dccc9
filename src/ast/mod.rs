use crate::hash::{StableName, stable_name};
use crate::lexer::{Lexeme, Token};

use std::fmt::{self, Display, Formatter};

/// Abstract value types tracked on the simulated stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
    I64,
    P64,
}

impl Type {
    pub fn from_token(token: &Token) -> Option<Type> {
        match token {
            Token::KeywordI64 => Some(Type::I64),
            Token::KeywordP64 => Some(Type::P64),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Type::I64 => write!(f, "i64"),
            Type::P64 => write!(f, "p64"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Procedure {
    pub name: Lexeme,
    /// Input contract, pushed in order when the body is checked. Call sites
    /// pop it in order, so the first listed type is taken from the top.
    pub required: Vec<Lexeme>,
    /// Output contract; the first listed type is checked against the top.
    pub returned: Vec<Lexeme>,
    /// Tokens between the procedure's own `do` and `end`.
    pub body: Vec<Lexeme>,
    pub is_main: bool,
}

impl Procedure {
    pub fn name(&self) -> &str {
        &self.name.source
    }

    /// Assembly symbol of a non-main procedure.
    pub fn symbol(&self) -> String {
        procedure_symbol(self.name())
    }
}

pub fn procedure_symbol(name: &str) -> String {
    format!("proc_{}", stable_name(name))
}

impl Display for Procedure {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let types = |list: &[Lexeme]| {
            list.iter()
                .map(|lexeme| lexeme.source.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        };

        writeln!(
            f,
            "procedure `{}`{} at {}",
            self.name(),
            if self.is_main { " (entry point)" } else { "" },
            self.name.location
        )?;
        writeln!(f, "  require: [{}]", types(&self.required))?;
        writeln!(f, "  return: [{}]", types(&self.returned))?;
        writeln!(f, "  body:")?;
        for (index, lexeme) in self.body.iter().enumerate() {
            write!(f, "    {index:>4}: {lexeme}")?;
            if let Some(next) = lexeme.next_ref {
                write!(f, " next=`{next}`")?;
            }
            if let Some(previous) = lexeme.previous_ref {
                write!(f, " previous=`{previous}`")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral {
    /// Quoted source text, the deduplication key.
    pub source: String,
    pub bytes: Vec<u8>,
    pub label: StableName,
}

impl StringLiteral {
    pub fn new(source: &str, bytes: Vec<u8>) -> Self {
        StringLiteral {
            source: source.to_string(),
            bytes,
            label: stable_name(source),
        }
    }

    pub fn symbol(&self) -> String {
        format!("str_{}", self.label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub procedures: Vec<Procedure>,
    pub string_literals: Vec<StringLiteral>,
}

impl Program {
    pub fn procedure(&self, name: &str) -> Option<&Procedure> {
        self.procedures.iter().find(|procedure| procedure.name() == name)
    }

    pub fn string_literal(&self, source: &str) -> Option<&StringLiteral> {
        self.string_literals
            .iter()
            .find(|literal| literal.source == source)
    }
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for procedure in &self.procedures {
            write!(f, "{procedure}")?;
        }
        for literal in &self.string_literals {
            writeln!(f, "literal {} = {:?}", literal.source, literal.bytes)?;
        }
        Ok(())
    }
}

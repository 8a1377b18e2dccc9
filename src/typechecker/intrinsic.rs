use super::{TypeEnv, describe};

use crate::ast::Type;
use crate::diagnostic::{Diagnostic, Stage};
use crate::lexer::Lexeme;

/// Operand rule of a binary intrinsic. The first argument was pushed first.
pub type BinaryRule = fn(Type, Type) -> Option<Type>;

pub fn add(first: Type, second: Type) -> Option<Type> {
    match (first, second) {
        (Type::I64, Type::I64) => Some(Type::I64),
        (Type::I64, Type::P64) | (Type::P64, Type::I64) => Some(Type::P64),
        (Type::P64, Type::P64) => None,
    }
}

pub fn subtract(first: Type, second: Type) -> Option<Type> {
    match (first, second) {
        (Type::I64, Type::I64) => Some(Type::I64),
        (Type::P64, Type::I64) => Some(Type::P64),
        _ => None,
    }
}

pub fn integer(first: Type, second: Type) -> Option<Type> {
    (first == Type::I64 && second == Type::I64).then_some(Type::I64)
}

// the result keeps the operands' tag instead of a dedicated boolean
pub fn compare(first: Type, second: Type) -> Option<Type> {
    (first == second).then_some(first)
}

impl TypeEnv<'_> {
    /// Pops `N` values, deepest first.
    pub(super) fn pop_arguments<const N: usize>(
        &mut self,
        lexeme: &Lexeme,
        what: &str,
    ) -> Result<[Type; N], Diagnostic> {
        self.require(lexeme, what, N)?;
        let split = self.stack.len() - N;
        let arguments = std::array::from_fn(|index| self.stack[split + index]);
        self.stack.truncate(split);
        Ok(arguments)
    }

    fn require(&self, lexeme: &Lexeme, what: &str, count: usize) -> Result<(), Diagnostic> {
        if self.stack.len() >= count {
            return Ok(());
        }
        Err(lexeme
            .error(
                Stage::Validator,
                format!(
                    "`{}` {what} requires {count} argument{} to be on the stack!",
                    lexeme.source,
                    if count == 1 { "" } else { "s" }
                ),
            )
            .with_note(format!(
                "the stack holds {} value(s): ({})",
                self.stack.len(),
                describe(&self.stack)
            )))
    }

    pub(super) fn apply_binary(
        &mut self,
        lexeme: &Lexeme,
        supported: &str,
        rule: BinaryRule,
    ) -> Result<(), Diagnostic> {
        let [first, second] = self.pop_arguments::<2>(lexeme, "intrinsic")?;
        let Some(result) = rule(first, second) else {
            return Err(unsupported(lexeme, supported, &[first, second]));
        };
        self.stack.push(result);
        Ok(())
    }

    pub(super) fn apply_bnot(&mut self, lexeme: &Lexeme) -> Result<(), Diagnostic> {
        let [value] = self.pop_arguments::<1>(lexeme, "intrinsic")?;
        if value != Type::I64 {
            return Err(unsupported(lexeme, "(i64)", &[value]));
        }
        self.stack.push(Type::I64);
        Ok(())
    }

    /// `syscallN` consumes the call number plus `N` arguments of any type.
    pub(super) fn apply_syscall(&mut self, lexeme: &Lexeme) -> Result<(), Diagnostic> {
        let arity = lexeme.token.syscall_arity().unwrap_or_default() + 1;
        self.require(lexeme, "intrinsic", arity)?;
        self.stack.truncate(self.stack.len() - arity);
        self.stack.push(Type::I64);
        Ok(())
    }
}

fn unsupported(lexeme: &Lexeme, supported: &str, found: &[Type]) -> Diagnostic {
    lexeme
        .error(
            Stage::Validator,
            format!(
                "`{}` intrinsic only supports {supported} sets of arguments!",
                lexeme.source
            ),
        )
        .with_note(format!("found ({})", describe(found)))
}

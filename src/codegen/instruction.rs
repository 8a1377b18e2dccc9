use super::AsmCodegen;
use super::asm::{Condition, Instruction, Operand, Register};

use crate::diagnostic::Stage;
use crate::error::{Error, Result};
use crate::lexer::{Lexeme, Token};

fn address(lexeme: &Lexeme) -> String {
    format!("addr_{}", lexeme.label)
}

/// Leaves 1 in `rcx` when `condition` holds for `second-from-top <op> top`.
fn comparison(initial: i64, selected: i64, condition: Condition) -> Vec<Instruction> {
    use Instruction::*;
    use Register::*;

    vec![
        Instruction::mov(Rcx, initial),
        Instruction::mov(Rdx, selected),
        Pop(Rbx),
        Pop(Rax),
        Cmp(Rax, Rbx),
        Cmov(condition, Rcx, Rdx),
        Push(Rcx.into()),
    ]
}

/// The call number sits on top, followed by the arguments in register order.
fn syscall(arity: usize) -> Vec<Instruction> {
    use Register::*;

    let mut sequence: Vec<_> = [Rax, Rdi, Rsi, Rdx, R10, R8, R9]
        .into_iter()
        .take(arity + 1)
        .map(Instruction::Pop)
        .collect();
    sequence.push(Instruction::Syscall);
    sequence.push(Instruction::push(Rax));
    sequence
}

/// Fixed lowering of an intrinsic; `None` for every other token.
pub fn intrinsic_sequence(token: &Token) -> Option<Vec<Instruction>> {
    use Instruction::*;
    use Register::*;

    let sequence = match token {
        Token::Add => vec![Pop(Rax), Pop(Rbx), Add(Rax, Rbx), Push(Rax.into())],
        Token::Subtract => vec![Pop(Rax), Pop(Rbx), Sub(Rbx, Rax), Push(Rbx.into())],
        Token::Multiply => vec![Pop(Rax), Pop(Rbx), Mul(Rbx), Push(Rax.into())],
        Token::Divide => vec![Pop(Rbx), Pop(Rax), Cqo, Idiv(Rbx), Push(Rax.into())],
        Token::Modulus => vec![Pop(Rbx), Pop(Rax), Cqo, Idiv(Rbx), Push(Rdx.into())],

        Token::Equal => comparison(0, 1, Condition::Equal),
        Token::Nequal => comparison(1, 0, Condition::Equal),
        Token::Greater => comparison(0, 1, Condition::Greater),
        Token::Less => comparison(0, 1, Condition::Less),

        Token::Band => vec![Pop(Rax), Pop(Rbx), And(Rbx, Rax), Push(Rbx.into())],
        Token::Bor => vec![Pop(Rax), Pop(Rbx), Or(Rbx, Rax), Push(Rbx.into())],
        Token::Bnot => vec![Pop(Rax), Not(Rax), Push(Rax.into())],
        Token::Shiftl => vec![Pop(Rcx), Pop(Rbx), Shl(Rbx, Cl), Push(Rbx.into())],
        Token::Shiftr => vec![Pop(Rcx), Pop(Rbx), Shr(Rbx, Cl), Push(Rbx.into())],

        Token::Syscall0
        | Token::Syscall1
        | Token::Syscall2
        | Token::Syscall3
        | Token::Syscall4
        | Token::Syscall5
        | Token::Syscall6 => syscall(token.syscall_arity()?),

        Token::Clone => vec![Pop(Rax), Push(Rax.into()), Push(Rax.into())],
        Token::Drop => vec![Pop(Rax)],
        Token::Over => vec![
            Pop(Rax),
            Pop(Rbx),
            Push(Rbx.into()),
            Push(Rax.into()),
            Push(Rbx.into()),
        ],
        Token::Swap => vec![Pop(Rax), Pop(Rbx), Push(Rax.into()), Push(Rbx.into())],

        Token::KeywordMain
        | Token::KeywordI64
        | Token::KeywordP64
        | Token::KeywordIf
        | Token::KeywordElse
        | Token::KeywordWhile
        | Token::KeywordProcedure
        | Token::KeywordRequire
        | Token::KeywordReturn
        | Token::KeywordDo
        | Token::KeywordEnd
        | Token::Identifier
        | Token::Int(_)
        | Token::Str(_) => return None,
    };
    Some(sequence)
}

impl AsmCodegen<'_> {
    fn jump_target(&self, body: &[Lexeme], lexeme: &Lexeme) -> Result<String> {
        lexeme
            .next_ref
            .and_then(|next| body.get(next))
            .map(address)
            .ok_or_else(|| {
                Error::internal(
                    Stage::Translator,
                    format!(
                        "`{}` at {} reached code generation without a cross reference",
                        lexeme.source, lexeme.location
                    ),
                )
            })
    }

    pub fn codegen_lexeme(&mut self, body: &[Lexeme], index: usize) -> Result<()> {
        use Instruction::*;
        use Register::*;

        let lexeme = &body[index];
        self.emit(Comment(lexeme.source.clone()));

        match &lexeme.token {
            Token::KeywordIf | Token::KeywordWhile => self.emit(Label(address(lexeme))),
            Token::KeywordDo => {
                let target = self.jump_target(body, lexeme)?;
                self.emit_all([
                    Label(address(lexeme)),
                    Pop(Rax),
                    Test(Rax, Rax),
                    Jcc(Condition::Zero, target),
                ]);
            }
            Token::KeywordElse => {
                let target = self.jump_target(body, lexeme)?;
                self.emit_all([Jmp(target), Label(address(lexeme))]);
            }
            Token::KeywordEnd => {
                // loops jump back to their `while`
                if lexeme.next_ref.is_some() {
                    let head = self.jump_target(body, lexeme)?;
                    self.emit(Jmp(head));
                }
                self.emit(Label(address(lexeme)));
            }

            Token::Int(value) => {
                self.emit_all([
                    Label(address(lexeme)),
                    Instruction::mov(Rax, *value),
                    Push(Rax.into()),
                ]);
            }
            Token::Str(bytes) => {
                let Some(symbol) = self
                    .program
                    .string_literal(&lexeme.source)
                    .map(|literal| literal.symbol())
                else {
                    return Err(Error::internal(
                        Stage::Translator,
                        format!(
                            "string literal {} at {} is missing from the literal table",
                            lexeme.source, lexeme.location
                        ),
                    ));
                };
                self.emit_all([
                    Label(address(lexeme)),
                    Instruction::mov(Rax, bytes.len() as i64),
                    Push(Rax.into()),
                    Push(Operand::Symbol(symbol)),
                ]);
            }
            Token::Identifier => {
                self.emit(Label(address(lexeme)));
                self.codegen_call(lexeme)?;
            }

            token => {
                let Some(sequence) = intrinsic_sequence(token) else {
                    return Err(Error::internal(
                        Stage::Translator,
                        format!(
                            "unexpected `{}` in the body at {}",
                            lexeme.source, lexeme.location
                        ),
                    ));
                };
                self.emit(Label(address(lexeme)));
                self.emit_all(sequence);
            }
        }
        Ok(())
    }
}

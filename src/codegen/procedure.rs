use super::AsmCodegen;
use super::asm::{Instruction, Operand, Register};

use crate::ast::{Procedure, procedure_symbol};
use crate::diagnostic::Stage;
use crate::error::{Error, Result};
use crate::lexer::Lexeme;

use tracing::trace;

const RET_STACK_RSP: &str = "ret_stack_rsp";

/// Swaps `rsp` from the return stack over to the data stack parked in `rax`.
fn enter_data_stack() -> [Instruction; 2] {
    [
        Instruction::mov(Operand::Memory(RET_STACK_RSP.into()), Register::Rsp),
        Instruction::mov(Register::Rsp, Register::Rax),
    ]
}

/// Parks the data stack in `rax` and restores the return stack.
fn enter_return_stack() -> [Instruction; 2] {
    [
        Instruction::mov(Register::Rax, Register::Rsp),
        Instruction::mov(Register::Rsp, Operand::Memory(RET_STACK_RSP.into())),
    ]
}

impl AsmCodegen<'_> {
    pub fn codegen_procedure(&mut self, procedure: &Procedure) -> Result<()> {
        self.emit(Instruction::Comment(procedure.name().to_string()));
        if procedure.is_main {
            self.emit_all([
                Instruction::Global("_start".into()),
                Instruction::Label("_start".into()),
                Instruction::mov(Operand::Memory("args_ptr".into()), Register::Rsp),
                Instruction::mov(Register::Rax, Operand::Symbol("ret_stack_end".into())),
                Instruction::mov(Operand::Memory(RET_STACK_RSP.into()), Register::Rax),
            ]);
        } else {
            self.emit(Instruction::Label(procedure.symbol()));
            self.emit_all(enter_data_stack());
        }

        for index in 0..procedure.body.len() {
            self.codegen_lexeme(&procedure.body, index)?;
        }

        if procedure.is_main {
            self.emit_all([
                Instruction::Comment("end".into()),
                Instruction::mov(Register::Rax, 60_i64),
                Instruction::mov(Register::Rdi, 0_i64),
                Instruction::Syscall,
            ]);
        } else {
            self.emit_all(enter_return_stack());
            self.emit(Instruction::Ret);
        }

        trace!(procedure = procedure.name(), "generated procedure");
        Ok(())
    }

    pub(super) fn codegen_call(&mut self, lexeme: &Lexeme) -> Result<()> {
        if self.program.procedure(&lexeme.source).is_none() {
            return Err(Error::internal(
                Stage::Translator,
                format!("call to unknown procedure `{}` at {}", lexeme.source, lexeme.location),
            ));
        }

        self.emit_all(enter_return_stack());
        self.emit(Instruction::Call(procedure_symbol(&lexeme.source)));
        self.emit_all(enter_data_stack());
        Ok(())
    }
}

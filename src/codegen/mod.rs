pub mod asm;
pub mod instruction;
pub mod procedure;

#[cfg(test)]
pub mod test;

use crate::ast::Program;
use crate::error::Result;

use asm::{DataEntry, Instruction};

use tracing::debug;

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};

/// Default capacity, in bytes, of the return stack region.
pub const DEFAULT_RETURN_STACK: usize = 4096;

/// A complete NASM translation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assembly {
    pub text: Vec<Instruction>,
    pub data: Vec<DataEntry>,
    pub return_stack: usize,
}

impl Display for Assembly {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "BITS 64")?;
        writeln!(f)?;
        writeln!(f, "segment .text")?;
        for instruction in &self.text {
            writeln!(f, "{instruction}")?;
        }

        writeln!(f)?;
        writeln!(f, "segment .data")?;
        for entry in &self.data {
            writeln!(f, "{entry}")?;
        }

        writeln!(f)?;
        writeln!(f, "segment .bss")?;
        writeln!(f, "\targs_ptr: resq 1")?;
        writeln!(f, "\tret_stack_rsp: resq 1")?;
        writeln!(f, "\tret_stack: resb {}", self.return_stack)?;
        writeln!(f, "\tret_stack_end:")
    }
}

pub struct AsmCodegen<'a> {
    program: &'a Program,
    text: Vec<Instruction>,
    data: Vec<DataEntry>,
    emitted: HashSet<String>,
    return_stack: usize,
}

impl<'a> AsmCodegen<'a> {
    pub fn new(program: &'a Program, return_stack: usize) -> Self {
        AsmCodegen {
            program,
            text: vec![],
            data: vec![],
            emitted: HashSet::new(),
            return_stack,
        }
    }

    fn emit(&mut self, instruction: Instruction) {
        self.text.push(instruction);
    }

    fn emit_all(&mut self, instructions: impl IntoIterator<Item = Instruction>) {
        self.text.extend(instructions);
    }

    /// Hoists every string literal into `.data`, once per distinct symbol.
    fn codegen_data(&mut self) {
        let program = self.program;
        for literal in &program.string_literals {
            let symbol = literal.symbol();
            if self.emitted.insert(symbol.clone()) {
                self.data.push(DataEntry {
                    symbol,
                    bytes: literal.bytes.clone(),
                });
            }
        }
    }

    pub fn generate_program(mut self) -> Result<Assembly> {
        let program = self.program;
        for procedure in &program.procedures {
            self.codegen_procedure(procedure)?;
        }
        self.codegen_data();

        debug!(
            instructions = self.text.len(),
            literals = self.data.len(),
            "generated assembly"
        );
        Ok(Assembly {
            text: self.text,
            data: self.data,
            return_stack: self.return_stack,
        })
    }
}

/// Lowers a checked program to NASM source text.
pub fn translate(program: &Program, return_stack: usize) -> Result<String> {
    let assembly = AsmCodegen::new(program, return_stack).generate_program()?;
    Ok(assembly.to_string())
}

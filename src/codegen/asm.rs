use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    Rax,
    Rbx,
    Rcx,
    Rdx,
    Rsi,
    Rdi,
    Rsp,
    R8,
    R9,
    R10,
    Cl,
}

impl Display for Register {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Register::Rax => "rax",
            Register::Rbx => "rbx",
            Register::Rcx => "rcx",
            Register::Rdx => "rdx",
            Register::Rsi => "rsi",
            Register::Rdi => "rdi",
            Register::Rsp => "rsp",
            Register::R8 => "r8",
            Register::R9 => "r9",
            Register::R10 => "r10",
            Register::Cl => "cl",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Immediate(i64),
    /// Address of a label.
    Symbol(String),
    /// Quadword stored at a label.
    Memory(String),
}

impl From<Register> for Operand {
    fn from(register: Register) -> Self {
        Operand::Register(register)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Operand::Immediate(value)
    }
}

impl Display for Operand {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(f, "{register}"),
            Operand::Immediate(value) => write!(f, "{value}"),
            Operand::Symbol(symbol) => write!(f, "{symbol}"),
            Operand::Memory(symbol) => write!(f, "[{symbol}]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    Equal,
    Greater,
    Less,
    Zero,
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Equal => write!(f, "e"),
            Condition::Greater => write!(f, "g"),
            Condition::Less => write!(f, "l"),
            Condition::Zero => write!(f, "z"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Comment(String),
    Global(String),
    Label(String),

    Mov(Operand, Operand),
    Push(Operand),
    Pop(Register),

    Add(Register, Register),
    Sub(Register, Register),
    Mul(Register),
    Cqo,
    Idiv(Register),
    And(Register, Register),
    Or(Register, Register),
    Not(Register),
    Shl(Register, Register),
    Shr(Register, Register),

    Cmp(Register, Register),
    Test(Register, Register),
    Cmov(Condition, Register, Register),

    Jmp(String),
    Jcc(Condition, String),
    Call(String),
    Ret,
    Syscall,
}

impl Instruction {
    pub fn mov(destination: impl Into<Operand>, source: impl Into<Operand>) -> Self {
        Instruction::Mov(destination.into(), source.into())
    }

    pub fn push(operand: impl Into<Operand>) -> Self {
        Instruction::Push(operand.into())
    }
}

impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Comment(text) => write!(f, ";; -- {text} --"),
            Instruction::Global(symbol) => write!(f, "global {symbol}"),
            Instruction::Label(symbol) => write!(f, "{symbol}:"),

            Instruction::Mov(destination, source) => write!(f, "\tmov {destination}, {source}"),
            Instruction::Push(operand) => write!(f, "\tpush {operand}"),
            Instruction::Pop(register) => write!(f, "\tpop {register}"),

            Instruction::Add(a, b) => write!(f, "\tadd {a}, {b}"),
            Instruction::Sub(a, b) => write!(f, "\tsub {a}, {b}"),
            Instruction::Mul(register) => write!(f, "\tmul {register}"),
            Instruction::Cqo => write!(f, "\tcqo"),
            Instruction::Idiv(register) => write!(f, "\tidiv {register}"),
            Instruction::And(a, b) => write!(f, "\tand {a}, {b}"),
            Instruction::Or(a, b) => write!(f, "\tor {a}, {b}"),
            Instruction::Not(register) => write!(f, "\tnot {register}"),
            Instruction::Shl(a, b) => write!(f, "\tshl {a}, {b}"),
            Instruction::Shr(a, b) => write!(f, "\tshr {a}, {b}"),

            Instruction::Cmp(a, b) => write!(f, "\tcmp {a}, {b}"),
            Instruction::Test(a, b) => write!(f, "\ttest {a}, {b}"),
            Instruction::Cmov(condition, a, b) => write!(f, "\tcmov{condition} {a}, {b}"),

            Instruction::Jmp(symbol) => write!(f, "\tjmp {symbol}"),
            Instruction::Jcc(condition, symbol) => write!(f, "\tj{condition} {symbol}"),
            Instruction::Call(symbol) => write!(f, "\tcall {symbol}"),
            Instruction::Ret => write!(f, "\tret"),
            Instruction::Syscall => write!(f, "\tsyscall"),
        }
    }
}

/// One initialized `.data` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEntry {
    pub symbol: String,
    pub bytes: Vec<u8>,
}

impl Display for DataEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "\t{}:", self.symbol)?;
        if !self.bytes.is_empty() {
            let bytes: Vec<_> = self.bytes.iter().map(|byte| format!("{byte:#04x}")).collect();
            write!(f, " db {}", bytes.join(", "))?;
        }
        Ok(())
    }
}

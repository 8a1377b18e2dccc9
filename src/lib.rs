pub mod ast;
pub mod codegen;
pub mod diagnostic;
pub mod driver;
pub mod error;
pub mod hash;
pub mod lexer;
pub mod parser;
pub mod typechecker;

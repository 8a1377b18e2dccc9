use super::instruction::intrinsic_sequence;
use super::*;
use crate::error::Error;
use crate::hash::stable_name;
use crate::lexer::{Token, lex};
use crate::parser::parse;
use crate::typechecker::check;

fn program(source: &str) -> Program {
    let program = parse(lex("test.hive", source).unwrap()).unwrap();
    check(&program).unwrap();
    program
}

fn assemble(source: &str) -> String {
    translate(&program(source), DEFAULT_RETURN_STACK).unwrap()
}

fn lowered(token: Token) -> String {
    intrinsic_sequence(&token)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn address(program: &Program, procedure: &str, index: usize) -> String {
    let body = &program.procedure(procedure).unwrap().body;
    format!("addr_{}", body[index].label)
}

#[test]
fn test_entry_point() {
    let output = assemble("procedure main do 1 2 add drop end");
    assert!(output.starts_with("BITS 64\n\nsegment .text\n;; -- main --\nglobal _start\n_start:\n"));
    assert!(output.contains(
        "\tmov [args_ptr], rsp\n\tmov rax, ret_stack_end\n\tmov [ret_stack_rsp], rax\n"
    ));
    assert!(output.contains(";; -- end --\n\tmov rax, 60\n\tmov rdi, 0\n\tsyscall\n"));
    assert!(output.contains(";; -- 2 --\naddr_"));
    assert!(output.contains("\tmov rax, 2\n\tpush rax\n"));
    assert!(output.ends_with(
        "segment .bss\n\targs_ptr: resq 1\n\tret_stack_rsp: resq 1\n\tret_stack: resb 4096\n\tret_stack_end:\n"
    ));
}

#[test]
fn test_output_is_reproducible() {
    let source = r#"
        procedure greet require p64 i64 do 1 1 syscall3 drop end
        procedure main do "hello\n" greet while 0 do end end
    "#;
    assert_eq!(assemble(source), assemble(source));
}

#[test]
fn test_string_literals_are_hoisted_once() {
    let output = assemble(r#"procedure main do "x" drop drop "x" drop drop end"#);
    let symbol = format!("str_{}", stable_name("\"x\""));

    assert_eq!(output.matches(&format!("\t{symbol}: db 0x78\n")).count(), 1);
    assert_eq!(output.matches(&format!("\tpush {symbol}\n")).count(), 2);
    assert!(output.contains("\tmov rax, 1\n\tpush rax\n"));
}

#[test]
fn test_data_encoding() {
    let output = assemble(r#"procedure main do "a\nb" drop drop "" drop drop end"#);
    assert!(output.contains(&format!("\tstr_{}: db 0x61, 0x0a, 0x62\n", stable_name(r#""a\nb""#))));
    assert!(output.contains(&format!("\tstr_{}:\n", stable_name(r#""""#))));
}

#[test]
fn test_if_else_jumps() {
    let source = "procedure main do 1 if 1 do 2 drop else 3 drop end drop end";
    let program = program(source);
    let output = translate(&program, DEFAULT_RETURN_STACK).unwrap();

    // 1 if 1 do 2 drop else 3 drop end drop
    let (do_, else_, end) = (
        address(&program, "main", 3),
        address(&program, "main", 6),
        address(&program, "main", 9),
    );
    assert!(output.contains(&format!("{do_}:\n\tpop rax\n\ttest rax, rax\n\tjz {else_}\n")));
    assert!(output.contains(&format!(";; -- else --\n\tjmp {end}\n{else_}:\n")));
    assert!(output.contains(&format!(";; -- end --\n{end}:\n")));
}

#[test]
fn test_while_back_edge() {
    let program = program("procedure main do while 0 do end end");
    let output = translate(&program, DEFAULT_RETURN_STACK).unwrap();

    let (head, end) = (address(&program, "main", 0), address(&program, "main", 3));
    assert!(output.contains(&format!(";; -- while --\n{head}:\n")));
    assert!(output.contains(&format!("\tjz {end}\n")));
    assert!(output.contains(&format!(";; -- end --\n\tjmp {head}\n{end}:\n")));
}

#[test]
fn test_procedure_calls() {
    let output = assemble(
        "procedure twice require i64 return i64 do 2 multiply end
         procedure main do 21 twice drop end",
    );
    let symbol = format!("proc_{}", stable_name("twice"));

    assert!(output.contains(&format!(
        ";; -- twice --\n{symbol}:\n\tmov [ret_stack_rsp], rsp\n\tmov rsp, rax\n"
    )));
    assert!(output.contains("\tmov rax, rsp\n\tmov rsp, [ret_stack_rsp]\n\tret\n"));
    assert!(output.contains(&format!(
        "\tmov rax, rsp\n\tmov rsp, [ret_stack_rsp]\n\tcall {symbol}\n\tmov [ret_stack_rsp], rsp\n\tmov rsp, rax\n"
    )));
}

#[test]
fn test_return_stack_capacity() {
    let output = translate(&program("procedure main do end"), 65536).unwrap();
    assert!(output.contains("\tret_stack: resb 65536\n"));
}

#[test]
fn test_arithmetic_lowering() {
    assert_eq!(lowered(Token::Add), "\tpop rax\n\tpop rbx\n\tadd rax, rbx\n\tpush rax");
    assert_eq!(lowered(Token::Subtract), "\tpop rax\n\tpop rbx\n\tsub rbx, rax\n\tpush rbx");
    assert_eq!(lowered(Token::Divide), "\tpop rbx\n\tpop rax\n\tcqo\n\tidiv rbx\n\tpush rax");
    assert_eq!(lowered(Token::Modulus), "\tpop rbx\n\tpop rax\n\tcqo\n\tidiv rbx\n\tpush rdx");
    assert_eq!(lowered(Token::Bnot), "\tpop rax\n\tnot rax\n\tpush rax");
    assert_eq!(lowered(Token::Shiftl), "\tpop rcx\n\tpop rbx\n\tshl rbx, cl\n\tpush rbx");
}

#[test]
fn test_comparison_lowering() {
    assert_eq!(
        lowered(Token::Nequal),
        "\tmov rcx, 1\n\tmov rdx, 0\n\tpop rbx\n\tpop rax\n\tcmp rax, rbx\n\tcmove rcx, rdx\n\tpush rcx"
    );
    assert!(lowered(Token::Greater).contains("\tcmovg rcx, rdx"));
    assert!(lowered(Token::Less).contains("\tcmovl rcx, rdx"));
}

#[test]
fn test_syscall_registers() {
    assert_eq!(lowered(Token::Syscall0), "\tpop rax\n\tsyscall\n\tpush rax");
    assert_eq!(
        lowered(Token::Syscall6),
        "\tpop rax\n\tpop rdi\n\tpop rsi\n\tpop rdx\n\tpop r10\n\tpop r8\n\tpop r9\n\tsyscall\n\tpush rax"
    );
}

#[test]
fn test_stack_shuffle_lowering() {
    assert_eq!(lowered(Token::Over), "\tpop rax\n\tpop rbx\n\tpush rbx\n\tpush rax\n\tpush rbx");
    assert_eq!(lowered(Token::Swap), "\tpop rax\n\tpop rbx\n\tpush rax\n\tpush rbx");
    assert!(intrinsic_sequence(&Token::KeywordDo).is_none());
    assert!(intrinsic_sequence(&Token::Int(1)).is_none());
}

#[test]
fn test_missing_cross_reference_is_internal() {
    let mut program = program("procedure main do if 1 do end end");
    program.procedures[0].body[2].next_ref = None;

    let error = translate(&program, DEFAULT_RETURN_STACK).unwrap_err();
    assert!(matches!(error, Error::Internal { stage: crate::diagnostic::Stage::Translator, .. }));
}

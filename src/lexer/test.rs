use super::*;
use logos::Logos;

fn kinds(source: &str) -> Vec<Token> {
    lex("test.hive", source)
        .unwrap()
        .into_iter()
        .map(|lexeme| lexeme.token)
        .collect()
}

fn lex_errors(source: &str) -> Vec<String> {
    lex("test.hive", source)
        .unwrap_err()
        .into_iter()
        .map(|diagnostic| diagnostic.message)
        .collect()
}

#[test]
fn test_basic_tokens() {
    let mut lexer = Token::lexer("procedure main do 1 2 add drop end");

    assert_eq!(lexer.next(), Some(Ok(Token::KeywordProcedure)));
    assert_eq!(lexer.next(), Some(Ok(Token::KeywordMain)));
    assert_eq!(lexer.next(), Some(Ok(Token::KeywordDo)));
    assert_eq!(lexer.next(), Some(Ok(Token::Int(1))));
    assert_eq!(lexer.next(), Some(Ok(Token::Int(2))));
    assert_eq!(lexer.next(), Some(Ok(Token::Add)));
    assert_eq!(lexer.next(), Some(Ok(Token::Drop)));
    assert_eq!(lexer.next(), Some(Ok(Token::KeywordEnd)));
    assert_eq!(lexer.next(), None);
}

#[test]
fn test_keywords_are_whole_words() {
    assert_eq!(
        kinds("main mainx ?main main_ i64 p64x syscall3 syscall7"),
        vec![
            Token::KeywordMain,
            Token::Identifier,
            Token::Identifier,
            Token::Identifier,
            Token::KeywordI64,
            Token::Identifier,
            Token::Syscall3,
            Token::Identifier,
        ]
    );
}

#[test]
fn test_keywords_span_the_whole_word() {
    let tokens = lex("test.hive", "main-1 do\"x\" swap+2 end").unwrap();
    let kinds: Vec<_> = tokens
        .iter()
        .map(|lexeme| (lexeme.token.kind_name(), lexeme.source.as_str()))
        .collect();

    assert_eq!(
        kinds,
        vec![
            ("identifier", "main"),
            ("literal_i64", "-1"),
            ("identifier", "do"),
            ("literal_str", "\"x\""),
            ("identifier", "swap"),
            ("literal_i64", "+2"),
            ("keyword_end", "end"),
        ]
    );
}

#[test]
fn test_every_intrinsic() {
    let source = "add subtract multiply divide modulus equal nequal greater less band bor bnot \
                  shiftl shiftr syscall0 syscall1 syscall2 syscall3 syscall4 syscall5 syscall6 \
                  clone drop over swap";
    let tokens = kinds(source);
    assert_eq!(tokens.len(), 25);
    assert!(tokens.iter().all(Token::is_intrinsic));
    assert!(!Token::Identifier.is_intrinsic());
    assert!(Token::KeywordDo.is_keyword());
}

#[test]
fn test_integer_literals() {
    for (text, value) in [
        ("0", 0),
        ("42", 42),
        ("+7", 7),
        ("-13", -13),
        ("007", 7),
        ("9223372036854775807", i64::MAX),
        ("-9223372036854775808", i64::MIN),
    ] {
        assert_eq!(kinds(text), vec![Token::Int(value)], "literal {text}");
    }
}

#[test]
fn test_integer_overflow_is_invalid() {
    assert_eq!(
        lex_errors("9223372036854775808"),
        vec!["encountered an invalid token `9223372036854775808`!"]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(kinds(r#""a\nb""#), vec![Token::Str(vec![0x61, 0x0a, 0x62])]);
    assert_eq!(
        kinds(r#""\a\b\f\r\t\v\\\'\"\?""#),
        vec![Token::Str(vec![
            0x07, 0x08, 0x0c, b'\r', b'\t', 0x0b, b'\\', b'\'', b'"', b'?'
        ])]
    );
    assert_eq!(kinds(r#""""#), vec![Token::Str(vec![])]);
}

#[test]
fn test_doubled_quote_is_embedded() {
    assert_eq!(
        kinds(r#""say ""hi""""#),
        vec![Token::Str(b"say \"hi\"".to_vec())]
    );
}

#[test]
fn test_unknown_escape_keeps_next_character() {
    assert_eq!(kinds(r#""\q""#), vec![Token::Str(b"q".to_vec())]);
    assert_eq!(kinds(r#""x\zy""#), vec![Token::Str(b"xzy".to_vec())]);
}

#[test]
fn test_comments_and_whitespace() {
    let source = "// header comment\nprocedure main do // trailing\n\t1 drop\r\nend";
    assert_eq!(
        kinds(source),
        vec![
            Token::KeywordProcedure,
            Token::KeywordMain,
            Token::KeywordDo,
            Token::Int(1),
            Token::Drop,
            Token::KeywordEnd,
        ]
    );
}

#[test]
fn test_locations_and_ids() {
    let lexemes = lex("test.hive", "procedure main do\n  1 drop\nend").unwrap();
    let positions: Vec<_> = lexemes
        .iter()
        .map(|lexeme| (lexeme.id, lexeme.location.line, lexeme.location.column))
        .collect();
    assert_eq!(
        positions,
        vec![(0, 1, 1), (1, 1, 11), (2, 1, 16), (3, 2, 3), (4, 2, 5), (5, 3, 1)]
    );
    assert_eq!(lexemes[3].source, "1");
    assert_eq!(lexemes[4].span, 22..26);
    assert_eq!(&*lexemes[0].location.file, "test.hive");
}

#[test]
fn test_labels_are_content_derived() {
    let first = lex("a.hive", "procedure main do 1 drop end").unwrap();
    let second = lex("b.hive", "procedure main do 1 drop end").unwrap();
    for (left, right) in first.iter().zip(&second) {
        assert_eq!(left.label, right.label);
    }
    assert_eq!(first[3].label, stable_name("3_1"));
    assert_ne!(first[0].label, first[1].label);
}

#[test]
fn test_invalid_runs_are_all_reported() {
    assert_eq!(
        lex_errors("procedure main do @foo 1 #bar end"),
        vec![
            "encountered an invalid token `@foo`!",
            "encountered an invalid token `#bar`!",
        ]
    );
}

#[test]
fn test_invalid_run_has_location() {
    let scanned = scan("test.hive", "1\n  $$ 2");
    assert_eq!(scanned.len(), 3);
    let invalid = scanned[1].clone().unwrap_err();
    assert_eq!(invalid.source, "$$");
    assert_eq!(invalid.span, 4..6);
    assert_eq!((invalid.location.line, invalid.location.column), (2, 3));
    assert_eq!(scanned[2].clone().unwrap().token, Token::Int(2));
}

#[test]
fn test_empty_source() {
    assert_eq!(
        lex_errors("  // nothing here\n\n"),
        vec!["file `test.hive` was empty of compilable source!"]
    );
}

#[test]
fn test_read_source_errors() {
    let empty = read_source(Path::new("")).unwrap_err();
    assert_eq!(empty.message, "provided source file path was empty!");

    let missing = read_source(Path::new("definitely/not/here.hive")).unwrap_err();
    assert!(missing.message.starts_with("failed to open source file with path"));
}

#[test]
fn test_lexeme_display() {
    let lexemes = lex("test.hive", "swap").unwrap();
    assert_eq!(
        lexemes[0].to_string(),
        "id=`0` kind=`intrinsic_swap` source=`swap` location=`test.hive:1:1`"
    );
}

use super::*;

fn location(line: usize, column: usize) -> Location {
    Location::new(Rc::from("test.hive"), line, column)
}

#[test]
fn test_location_display() {
    assert_eq!(location(3, 7).to_string(), "test.hive:3:7");
    assert_eq!(Location::invalid().to_string(), "[no location]");
    assert_eq!(location(0, 1).to_string(), "[no location]");
}

#[test]
fn test_plain_rendering() {
    let diagnostic = Diagnostic::error(Stage::Parser, "missing `main` procedure!");
    assert_eq!(
        diagnostic.to_string(),
        "[parser]: [no location]: error: missing `main` procedure!"
    );

    let anchored = Diagnostic::error(Stage::Lexer, "encountered an invalid token `@`!")
        .at(&location(1, 5), 4..5);
    assert_eq!(
        anchored.to_string(),
        "[lexer]: test.hive:1:5: error: encountered an invalid token `@`!"
    );
    assert_eq!(anchored.span, Some(4..5));
}

#[test]
fn test_success_goes_to_stdout() {
    let diagnostic = Diagnostic::success(Stage::Translator, "translator finished successfully!");
    assert!(!diagnostic.is_error());
    assert!(!diagnostic.severity.is_stderr());
    assert!(Severity::Warning.is_stderr());
    assert!(Severity::Error.is_stderr());
    assert!(!Severity::Info.is_stderr());
}

#[test]
fn test_single_diagnostic_into_list() {
    let diagnostics: Diagnostics = Diagnostic::error(Stage::Validator, "boom").into();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].stage, Stage::Validator);
}

#[test]
fn test_emit_without_source() {
    let diagnostic = Diagnostic::error(Stage::Main, "file `nope.hive` does not exist!")
        .with_note("check the path");
    assert!(diagnostic.emit(None).is_ok());
}

#[test]
fn test_emit_with_snippet() {
    let source = "procedure main do @ end";
    let diagnostic = Diagnostic::error(Stage::Lexer, "encountered an invalid token `@`!")
        .at(&location(1, 19), 18..19)
        .with_label(0..9, "inside this procedure");
    assert!(diagnostic.emit(Some(source)).is_ok());
}

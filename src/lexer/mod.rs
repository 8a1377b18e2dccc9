use crate::diagnostic::{Diagnostic, Diagnostics, Location, Stage};
use crate::hash::{StableName, stable_name};

use logos::Logos;
use tracing::{debug, trace};

use std::fmt;
use std::fs;
use std::ops::Range;
use std::path::Path;
use std::rc::Rc;

#[cfg(test)]
pub mod test;

#[derive(Logos, Debug, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[derive(Clone)]
pub enum Token {
    #[token("main")]
    KeywordMain,

    #[token("i64")]
    KeywordI64,

    #[token("p64")]
    KeywordP64,

    #[token("if")]
    KeywordIf,

    #[token("else")]
    KeywordElse,

    #[token("while")]
    KeywordWhile,

    #[token("procedure")]
    KeywordProcedure,

    #[token("require")]
    KeywordRequire,

    #[token("return")]
    KeywordReturn,

    #[token("do")]
    KeywordDo,

    #[token("end")]
    KeywordEnd,

    #[token("add")]
    Add,

    #[token("subtract")]
    Subtract,

    #[token("multiply")]
    Multiply,

    #[token("divide")]
    Divide,

    #[token("modulus")]
    Modulus,

    #[token("equal")]
    Equal,

    #[token("nequal")]
    Nequal,

    #[token("greater")]
    Greater,

    #[token("less")]
    Less,

    #[token("band")]
    Band,

    #[token("bor")]
    Bor,

    #[token("bnot")]
    Bnot,

    #[token("shiftl")]
    Shiftl,

    #[token("shiftr")]
    Shiftr,

    #[token("syscall0")]
    Syscall0,

    #[token("syscall1")]
    Syscall1,

    #[token("syscall2")]
    Syscall2,

    #[token("syscall3")]
    Syscall3,

    #[token("syscall4")]
    Syscall4,

    #[token("syscall5")]
    Syscall5,

    #[token("syscall6")]
    Syscall6,

    #[token("clone")]
    Clone,

    #[token("drop")]
    Drop,

    #[token("over")]
    Over,

    #[token("swap")]
    Swap,

    #[regex(r"[A-Za-z_?][A-Za-z0-9_?]*")]
    Identifier,

    // out of range literals fail the callback and end up as invalid runs
    #[regex(r"[+-]?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\\n]|\\[^\n]|"")*""#, |lex| unescape(lex.slice()))]
    Str(Vec<u8>),
}

impl Token {
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
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
        )
    }

    pub fn is_intrinsic(&self) -> bool {
        !self.is_keyword() && !matches!(self, Token::Identifier | Token::Int(_) | Token::Str(_))
    }

    /// Argument count of a `syscallN` intrinsic.
    pub fn syscall_arity(&self) -> Option<usize> {
        match self {
            Token::Syscall0 => Some(0),
            Token::Syscall1 => Some(1),
            Token::Syscall2 => Some(2),
            Token::Syscall3 => Some(3),
            Token::Syscall4 => Some(4),
            Token::Syscall5 => Some(5),
            Token::Syscall6 => Some(6),
            _ => None,
        }
    }

    /// Kind name used by the token dump.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::KeywordMain => "keyword_main",
            Token::KeywordI64 => "keyword_i64",
            Token::KeywordP64 => "keyword_p64",
            Token::KeywordIf => "keyword_if",
            Token::KeywordElse => "keyword_else",
            Token::KeywordWhile => "keyword_while",
            Token::KeywordProcedure => "keyword_procedure",
            Token::KeywordRequire => "keyword_require",
            Token::KeywordReturn => "keyword_return",
            Token::KeywordDo => "keyword_do",
            Token::KeywordEnd => "keyword_end",
            Token::Add => "intrinsic_add",
            Token::Subtract => "intrinsic_subtract",
            Token::Multiply => "intrinsic_multiply",
            Token::Divide => "intrinsic_divide",
            Token::Modulus => "intrinsic_modulus",
            Token::Equal => "intrinsic_equal",
            Token::Nequal => "intrinsic_nequal",
            Token::Greater => "intrinsic_greater",
            Token::Less => "intrinsic_less",
            Token::Band => "intrinsic_band",
            Token::Bor => "intrinsic_bor",
            Token::Bnot => "intrinsic_bnot",
            Token::Shiftl => "intrinsic_shiftl",
            Token::Shiftr => "intrinsic_shiftr",
            Token::Syscall0 => "intrinsic_syscall0",
            Token::Syscall1 => "intrinsic_syscall1",
            Token::Syscall2 => "intrinsic_syscall2",
            Token::Syscall3 => "intrinsic_syscall3",
            Token::Syscall4 => "intrinsic_syscall4",
            Token::Syscall5 => "intrinsic_syscall5",
            Token::Syscall6 => "intrinsic_syscall6",
            Token::Clone => "intrinsic_clone",
            Token::Drop => "intrinsic_drop",
            Token::Over => "intrinsic_over",
            Token::Swap => "intrinsic_swap",
            Token::Identifier => "identifier",
            Token::Int(_) => "literal_i64",
            Token::Str(_) => "literal_str",
        }
    }
}

/// A scanned token together with its position and cross-reference links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub id: usize,
    pub token: Token,
    pub source: String,
    pub location: Location,
    pub span: Range<usize>,
    pub label: StableName,
    /// Index of the paired control token further along the owning body.
    pub next_ref: Option<usize>,
    /// Index of the paired control token earlier in the owning body.
    pub previous_ref: Option<usize>,
}

impl Lexeme {
    pub fn new(id: usize, token: Token, source: &str, location: Location, span: Range<usize>) -> Self {
        Lexeme {
            id,
            token,
            source: source.to_string(),
            location,
            span,
            label: stable_name(format!("{id}_{source}")),
            next_ref: None,
            previous_ref: None,
        }
    }

    pub fn error(&self, stage: Stage, message: impl Into<String>) -> Diagnostic {
        Diagnostic::error(stage, message).at(&self.location, self.span.clone())
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "id=`{}` kind=`{}` source=`{}` location=`{}`",
            self.id,
            self.token.kind_name(),
            self.source,
            self.location
        )
    }
}

/// An unrecognized run of non-whitespace characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidLexeme {
    pub id: usize,
    pub source: String,
    pub location: Location,
    pub span: Range<usize>,
}

/// Maps byte offsets to 1-based line and column.
struct LineIndex {
    file: Rc<str>,
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(file: &str, source: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(index, _)| index + 1))
            .collect();
        LineIndex {
            file: Rc::from(file),
            starts,
        }
    }

    fn locate(&self, source: &str, offset: usize) -> Location {
        let line = self.starts.partition_point(|&start| start <= offset);
        let start = self.starts[line - 1];
        let column = source[start..offset].chars().count() + 1;
        Location::new(self.file.clone(), line, column)
    }
}

pub fn read_source(path: &Path) -> Result<String, Diagnostic> {
    if path.as_os_str().is_empty() {
        return Err(Diagnostic::error(
            Stage::Lexer,
            "provided source file path was empty!",
        ));
    }
    fs::read_to_string(path).map_err(|error| {
        Diagnostic::error(
            Stage::Lexer,
            format!(
                "failed to open source file with path `{}`! ({error})",
                path.display()
            ),
        )
    })
}

/// Keywords and intrinsics must span the whole whitespace-delimited word;
/// `main-1` starts with the identifier `main`.
fn whole_word(token: Token, source: &str, end: usize) -> Token {
    let delimited = source[end..].chars().next().is_none_or(char::is_whitespace);
    if delimited || !(token.is_keyword() || token.is_intrinsic()) {
        token
    } else {
        Token::Identifier
    }
}

/// Scans the whole source. Unrecognized text is kept as `Err` entries so that
/// every offender can be reported at once.
pub fn scan(file: &str, source: &str) -> Vec<Result<Lexeme, InvalidLexeme>> {
    let lines = LineIndex::new(file, source);
    let mut lexer = Token::lexer(source);
    let mut scanned = vec![];

    while let Some(result) = lexer.next() {
        let id = scanned.len();
        let mut span = lexer.span();
        match result {
            Ok(token) => {
                let token = whole_word(token, source, span.end);
                let location = lines.locate(source, span.start);
                trace!(id, kind = token.kind_name(), "scanned token");
                scanned.push(Ok(Lexeme::new(id, token, lexer.slice(), location, span)));
            }
            Err(()) => {
                let run_end = source[span.start..]
                    .find(char::is_whitespace)
                    .map_or(source.len(), |offset| span.start + offset);
                if run_end > span.end {
                    lexer.bump(run_end - span.end);
                    span.end = run_end;
                }
                scanned.push(Err(InvalidLexeme {
                    id,
                    source: source[span.clone()].to_string(),
                    location: lines.locate(source, span.start),
                    span,
                }));
            }
        }
    }
    scanned
}

/// Fails when the scan produced nothing or contains any invalid run.
pub fn validate(file: &str, scanned: Vec<Result<Lexeme, InvalidLexeme>>) -> Result<Vec<Lexeme>, Diagnostics> {
    if scanned.is_empty() {
        return Err(vec![Diagnostic::error(
            Stage::Lexer,
            format!("file `{file}` was empty of compilable source!"),
        )]);
    }

    let (lexemes, invalid): (Vec<_>, Vec<_>) = scanned.into_iter().partition(Result::is_ok);
    if !invalid.is_empty() {
        return Err(invalid
            .into_iter()
            .filter_map(Result::err)
            .map(|lexeme| {
                Diagnostic::error(
                    Stage::Lexer,
                    format!("encountered an invalid token `{}`!", lexeme.source),
                )
                .at(&lexeme.location, lexeme.span)
            })
            .collect());
    }

    Ok(lexemes.into_iter().filter_map(Result::ok).collect())
}

pub fn lex(file: &str, source: &str) -> Result<Vec<Lexeme>, Diagnostics> {
    let lexemes = validate(file, scan(file, source))?;
    debug!(file, tokens = lexemes.len(), "lexed source");
    Ok(lexemes)
}

fn escaped_byte(byte: u8) -> Option<u8> {
    match byte {
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0c),
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'v' => Some(0x0b),
        b'\\' => Some(b'\\'),
        b'\'' => Some(b'\''),
        b'"' => Some(b'"'),
        b'?' => Some(b'?'),
        _ => None,
    }
}

/// Decodes a quoted literal. `""` is an embedded quote and an unknown escape
/// keeps only the character after the backslash.
fn unescape(quoted: &str) -> Vec<u8> {
    let inner = &quoted.as_bytes()[1..quoted.len() - 1];
    let mut bytes = Vec::with_capacity(inner.len());
    let mut index = 0;

    while index < inner.len() {
        match (inner[index], inner.get(index + 1)) {
            (b'\\', Some(&next)) => match escaped_byte(next) {
                Some(byte) => {
                    bytes.push(byte);
                    index += 2;
                }
                None => index += 1,
            },
            (b'"', Some(b'"')) => {
                bytes.push(b'"');
                index += 2;
            }
            (byte, _) => {
                bytes.push(byte);
                index += 1;
            }
        }
    }
    bytes
}

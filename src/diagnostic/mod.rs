use ariadne::{Color, ColorGenerator, Config, IndexType, Label, Report, ReportKind, Source};
use yansi::Paint;

use std::fmt;
use std::io;
use std::ops::Range;
use std::rc::Rc;

#[cfg(test)]
pub mod test;

pub type Diagnostics = Vec<Diagnostic>;

/// Pipeline stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Main,
    Lexer,
    Parser,
    Validator,
    Translator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Main => "main",
            Stage::Lexer => "lexer",
            Stage::Parser => "parser",
            Stage::Validator => "validator",
            Stage::Translator => "translator",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Success,
    Info,
    Warning,
    Error,
}

impl Severity {
    fn report_kind(self) -> ReportKind<'static> {
        match self {
            Severity::Success => ReportKind::Custom("success", Color::Green),
            Severity::Info => ReportKind::Advice,
            Severity::Warning => ReportKind::Warning,
            Severity::Error => ReportKind::Error,
        }
    }

    fn color(self) -> yansi::Color {
        match self {
            Severity::Success => yansi::Color::Green,
            Severity::Info => yansi::Color::Cyan,
            Severity::Warning => yansi::Color::Yellow,
            Severity::Error => yansi::Color::Red,
        }
    }

    /// Success and info go to stdout, everything else to stderr.
    pub fn is_stderr(self) -> bool {
        self >= Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// A 1-based position in a source file. Line `0` marks the "no location" sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn new(file: Rc<str>, line: usize, column: usize) -> Self {
        Location { file, line, column }
    }

    pub fn invalid() -> Self {
        Location {
            file: Rc::from(""),
            line: 0,
            column: 0,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.file.is_empty() && self.line > 0 && self.column > 0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}:{}:{}", self.file, self.line, self.column)
        } else {
            f.write_str("[no location]")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub severity: Severity,
    pub location: Location,
    pub span: Option<Range<usize>>,
    pub message: String,
    pub labels: Vec<(Range<usize>, String)>,
    pub note: Option<String>,
}

impl Diagnostic {
    pub fn new(stage: Stage, severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            stage,
            severity,
            location: Location::invalid(),
            span: None,
            message: message.into(),
            labels: vec![],
            note: None,
        }
    }

    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, Severity::Error, message)
    }

    pub fn success(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, Severity::Success, message)
    }

    /// Anchors the diagnostic at a source position and byte span.
    pub fn at(mut self, location: &Location, span: Range<usize>) -> Self {
        self.location = location.clone();
        self.span = Some(span);
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_label(mut self, span: Range<usize>, message: impl Into<String>) -> Self {
        self.labels.push((span, message.into()));
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn report(&self, span: Range<usize>) -> Report<'static, (String, Range<usize>)> {
        let file = self.location.file.to_string();
        let mut colors = ColorGenerator::new();

        let mut report = Report::build(self.severity.report_kind(), (file.clone(), span.clone()))
            .with_config(
                Config::default()
                    .with_color(yansi::is_enabled())
                    .with_index_type(IndexType::Byte),
            )
            .with_code(self.stage)
            .with_message(&self.message)
            .with_label(
                Label::new((file.clone(), span))
                    .with_message(&self.message)
                    .with_color(colors.next()),
            );

        for (span, message) in &self.labels {
            report = report.with_label(
                Label::new((file.clone(), span.clone()))
                    .with_message(message)
                    .with_color(colors.next()),
            );
        }
        if let Some(note) = &self.note {
            report = report.with_note(note);
        }
        report.finish()
    }

    /// Writes the diagnostic to its stream. Diagnostics anchored in `source`
    /// get a rendered snippet; the rest print as a single line.
    pub fn emit(&self, source: Option<&str>) -> io::Result<()> {
        let span = self.span.clone().filter(|_| self.location.is_valid());
        match (span, source) {
            (Some(span), Some(source)) => {
                let report = self.report(span);
                let cache = (
                    self.location.file.to_string(),
                    Source::from(source.to_string()),
                );
                if self.severity.is_stderr() {
                    report.eprint(cache)
                } else {
                    report.print(cache)
                }
            }
            _ => {
                let line = format!(
                    "[{}]: {}: {}: {}",
                    self.stage,
                    self.location,
                    self.severity.fg(self.severity.color()).bold(),
                    self.message
                );
                if self.severity.is_stderr() {
                    eprintln!("{line}");
                } else {
                    println!("{line}");
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]: {}: {}: {}",
            self.stage, self.location, self.severity, self.message
        )
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        vec![diagnostic]
    }
}

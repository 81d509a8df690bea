use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Character offsets into the source text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn single(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn to(&self, other: &Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    NameError,
    TypeError,
    DivisionError,
    OverflowError,
    OutputError,
}

impl ErrorKind {
    fn title(&self) -> &'static str {
        match self {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Parse Error",
            ErrorKind::NameError => "Name Error",
            ErrorKind::TypeError => "Type Error",
            ErrorKind::DivisionError => "Division Error",
            ErrorKind::OverflowError => "Overflow Error",
            ErrorKind::OutputError => "Output Error",
        }
    }

    fn color(&self) -> Color {
        match self {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::OutputError => Color::Blue,
            _ => Color::Magenta,
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ImpError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl ImpError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, message, help)
    }

    pub fn name_error(span: Span, name: &str) -> Self {
        Self::new_with_help(
            ErrorKind::NameError,
            span,
            format!("Variable '{}' is not defined", name),
            format!("Assign a value first, e.g. '{} = 0;'", name),
        )
    }

    pub fn type_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::TypeError, span, message)
    }

    pub fn division_error(span: Span) -> Self {
        Self::new(ErrorKind::DivisionError, span, "Division by zero".to_string())
    }

    pub fn overflow_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::OverflowError, span, message)
    }

    pub fn output_error(span: Span, err: std::io::Error) -> Self {
        Self::new(
            ErrorKind::OutputError,
            span,
            format!("Failed to write output: {}", err),
        )
    }

    /// Render a labelled diagnostic for this error to stderr.
    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<repl>");
        let color = self.kind.color();

        // Keep the label inside the source so EOF errors still point somewhere.
        let len = source.chars().count();
        let start = self.span.start.min(len);
        let end = self.span.end.min(len).max(start);

        let mut report_builder = Report::build(ReportKind::Error, filename, start)
            .with_message(format!("{}: {}", self.kind.title().fg(color), self.message))
            .with_label(
                Label::new((filename, start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        if report_builder
            .finish()
            .eprint((filename, Source::from(source)))
            .is_err()
        {
            eprintln!("{}: {}", self.kind.title(), self.message);
        }
    }
}

use std::cmp::max;
use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::sync::Arc;

use crate::types::span::Span;

/// The category of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An unterminated string literal or comment.
    Scan,
    /// An unexpected token, malformed directive or disallowed operator mix.
    Parse,
    /// A failure compiling an included template.
    Compile,
    /// A value that cannot be interpreted as a boolean.
    Coercion,
    /// A value of the wrong shape, e.g. looping over a string.
    EvalType,
    /// The context stack was popped while empty.
    StackUnderflow,
    /// Reading a template or writing the rendered output failed.
    Io,
    /// The configuration is invalid.
    Config,
    /// A host value could not be converted.
    Value,
}

/// Where in a template an error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub(crate) file: Arc<str>,
    pub(crate) line: usize,
}

/// An error that can occur during template compilation or rendering.
pub struct Error {
    kind: ErrorKind,
    msg: String,
    location: Option<Location>,
    /// The template source and the offending region of it.
    snippet: Option<(String, Span)>,
    reason: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Location {
    pub(crate) fn new(file: Arc<str>, line: usize) -> Self {
        Self { file, line }
    }

    /// The name of the template file, empty for ad-hoc templates.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// The 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl Error {
    fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            location: None,
            snippet: None,
            reason: None,
        }
    }

    fn with_source(
        kind: ErrorKind,
        msg: impl Into<String>,
        file: &Arc<str>,
        source: &str,
        span: impl Into<Span>,
    ) -> Self {
        let span = span.into();
        let mut err = Self::new(kind, msg);
        err.location = Some(Location::new(file.clone(), span.line(source)));
        err.snippet = Some((source.to_owned(), span));
        err
    }

    /// Constructs a scan error.
    pub(crate) fn scan(
        msg: impl Into<String>,
        file: &Arc<str>,
        source: &str,
        span: impl Into<Span>,
    ) -> Self {
        Self::with_source(ErrorKind::Scan, msg, file, source, span)
    }

    /// Constructs a parse error.
    pub(crate) fn syntax(
        msg: impl Into<String>,
        file: &Arc<str>,
        source: &str,
        span: impl Into<Span>,
    ) -> Self {
        Self::with_source(ErrorKind::Parse, msg, file, source, span)
    }

    /// Wraps the error from compiling an included template.
    pub(crate) fn include(path: &str, err: Error, location: Location) -> Self {
        let mut outer = Self::new(ErrorKind::Compile, format!("in include file {path}"));
        outer.location = Some(location);
        outer.reason = Some(Box::new(err));
        outer
    }

    /// Constructs a render error raised by the chunk at the given location.
    pub(crate) fn render(kind: ErrorKind, msg: impl Into<String>, location: &Location) -> Self {
        let mut err = Self::new(kind, msg);
        err.location = Some(location.clone());
        err
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, msg)
    }

    pub(crate) fn stack_underflow() -> Self {
        Self::new(
            ErrorKind::StackUnderflow,
            "context stack is empty, but a value has been requested",
        )
    }

    pub(crate) fn max_include_depth(max: usize) -> Self {
        Self::new(
            ErrorKind::Compile,
            format!("reached maximum include depth ({max})"),
        )
    }

    pub(crate) fn not_found(path: &str) -> Self {
        let mut err = Self::new(ErrorKind::Io, format!("template `{path}` not found"));
        err.reason = Some(Box::new(io::Error::from(io::ErrorKind::NotFound)));
        err
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the template location this error refers to, if any.
    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        let mut e = Self::new(ErrorKind::Io, err.to_string());
        e.reason = Some(Box::new(err));
        e
    }
}

#[cfg(feature = "serde")]
impl serde::ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: fmt::Display,
    {
        Self::new(ErrorKind::Value, msg.to_string())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.reason
            .as_ref()
            .map(|r| r.as_ref() as &(dyn StdError + 'static))
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.snippet {
            Some((source, span)) => {
                self.fmt_location(f)?;
                fmt_pretty(&self.msg, source, *span, f)
            }
            None => fmt::Display::fmt(self, f),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.snippet {
            Some((source, span)) if f.alternate() => fmt_pretty(&self.msg, source, *span, f),
            _ => {
                self.fmt_location(f)?;
                write!(f, "{}", self.msg)?;
                if self.kind == ErrorKind::Compile {
                    if let Some(reason) = &self.reason {
                        if f.alternate() {
                            write!(f, ":{reason:#}")?;
                        } else {
                            write!(f, ": {reason}")?;
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

impl Error {
    fn fmt_location(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(Location { file, line }) if file.is_empty() => write!(f, "line {line}: "),
            Some(Location { file, line }) => write!(f, "{file} (line {line}): "),
            None => Ok(()),
        }
    }
}

fn fmt_pretty(msg: &str, source: &str, span: Span, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let lines: Vec<_> = source.split_terminator('\n').collect();
    let (line, col) = to_line_col(&lines, span.m);
    let span_width = max(1, width(&source[span]));
    let code = lines
        .get(line)
        .or_else(|| lines.last())
        .copied()
        .unwrap_or_default();

    let num = (line + 1).to_string();
    let pad = width(&num);
    let pipe = "|";
    let underline = "^".repeat(span_width);

    write!(
        f,
        "\n \
        {0:pad$} {pipe}\n \
        {num:>} {pipe} {code}\n \
        {0:pad$} {pipe} {underline:>width$} {msg}\n",
        "",
        pad = pad,
        pipe = pipe,
        num = num,
        code = code,
        underline = underline,
        width = col + span_width,
        msg = msg
    )
}

fn to_line_col(lines: &[&str], offset: usize) -> (usize, usize) {
    let mut n = 0;
    for (i, line) in lines.iter().enumerate() {
        let len = line.len() + 1;
        if n + len > offset {
            return (i, width(&line[..offset - n]));
        }
        n += len;
    }
    (
        lines.len().saturating_sub(1),
        lines.last().map(|l| width(l)).unwrap_or(0),
    )
}

#[cfg(feature = "unicode")]
fn width(s: &str) -> usize {
    unicode_width::UnicodeWidthStr::width(s)
}

#[cfg(not(feature = "unicode"))]
fn width(s: &str) -> usize {
    s.chars().count()
}

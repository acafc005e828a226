//! Errors generated by the translator core.
use crate::Span;

/// Convenience wrapper to represent success or meaningful compiler error.
pub type AplanResult<T> = Result<T, Error>;

/// Errors surfaced by IR construction, link resolution, and emission.
/// Lookup misses are *not* errors; they are `Option` results consumed by
/// the caller.
pub struct Error {
    kind: Box<ErrorKind>,
    span: Option<Span>,
}

enum ErrorKind {
    /// A structural invariant of the IR was violated during construction.
    InvariantViolation(String),
    /// A counter was queried that the per-run registry never registered.
    UnknownCounter(String),
    /// A numeric or vector-size expression could not be evaluated.
    MalformedNumeric(String),
    /// An artifact could not be written.
    WriteError(String),
    /// Miscellaneous error with no structured classification.
    Misc(String),
}

impl Error {
    pub fn invariant_violation<S: ToString>(msg: S) -> Self {
        Error {
            kind: Box::new(ErrorKind::InvariantViolation(msg.to_string())),
            span: None,
        }
    }

    pub fn unknown_counter<S: ToString>(name: S) -> Self {
        Error {
            kind: Box::new(ErrorKind::UnknownCounter(name.to_string())),
            span: None,
        }
    }

    pub fn malformed_numeric<S: ToString>(msg: S) -> Self {
        Error {
            kind: Box::new(ErrorKind::MalformedNumeric(msg.to_string())),
            span: None,
        }
    }

    pub fn write_error<S: ToString>(msg: S) -> Self {
        Error {
            kind: Box::new(ErrorKind::WriteError(msg.to_string())),
            span: None,
        }
    }

    pub fn misc<S: ToString>(msg: S) -> Self {
        Error {
            kind: Box::new(ErrorKind::Misc(msg.to_string())),
            span: None,
        }
    }

    /// Attach the source span of the offending node to this error.
    pub fn with_span(mut self, span: Span) -> Self {
        if !span.is_unknown() {
            self.span = Some(span);
        }
        self
    }

    pub fn span(&self) -> Option<Span> {
        self.span
    }

    fn message(&self) -> String {
        match &*self.kind {
            ErrorKind::InvariantViolation(msg) => {
                format!("invariant violation: {msg}")
            }
            ErrorKind::UnknownCounter(name) => {
                format!("unknown counter `{name}`")
            }
            ErrorKind::MalformedNumeric(msg) => {
                format!("malformed numeric input: {msg}")
            }
            ErrorKind::WriteError(msg) => format!("write error: {msg}"),
            ErrorKind::Misc(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.span {
            Some(span) => write!(f, "{} at {}", self.message(), span),
            None => write!(f, "{}", self.message()),
        }
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::write_error(err.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Error::write_error(err.to_string())
    }
}

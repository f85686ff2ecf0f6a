//! Error types for Jaml deserialization.

use core::fmt::{self, Display};

use jaml_core::ShapeError;

/// Error type for Jaml deserialization.
///
/// Carries the specific [`JamlErrorKind`] plus the 1-based line number,
/// and the source path when the input came from a file.
#[derive(Debug)]
pub struct JamlError {
    /// The specific kind of error.
    pub kind: JamlErrorKind,
    /// 1-based line number where the error occurred.
    pub line: Option<u32>,
    /// Source path, when known.
    pub path: Option<String>,
}

impl JamlError {
    /// An error anchored to a 1-based line number.
    pub(crate) fn new(kind: JamlErrorKind, line: u32) -> Self {
        JamlError {
            kind,
            line: Some(line),
            path: None,
        }
    }

    /// An error with no line attribution (root construction, I/O).
    pub(crate) fn without_line(kind: JamlErrorKind) -> Self {
        JamlError {
            kind,
            line: None,
            path: None,
        }
    }

    /// Attach the source path for diagnostics.
    pub(crate) fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }
}

impl Display for JamlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, self.line) {
            (Some(path), Some(line)) => write!(f, "{path}:{line}: {}", self.kind),
            (Some(path), None) => write!(f, "{path}: {}", self.kind),
            (None, Some(line)) => write!(f, "line {line}: {}", self.kind),
            (None, None) => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for JamlError {}

/// Specific error kinds for Jaml deserialization.
///
/// All are fatal: the parse aborts at the first error and no partial
/// value is exposed.
#[derive(Debug)]
pub enum JamlErrorKind {
    /// A non-ignorable line does not match the structural grammar.
    Syntax {
        /// The offending line, verbatim.
        line_text: String,
    },
    /// A record line's key does not name a field of the target.
    UnknownField {
        /// The unknown key.
        field: String,
        /// Valid field names, in declaration order.
        expected: Vec<&'static str>,
        /// Closest field name, when a near-miss exists.
        suggestion: Option<&'static str>,
    },
    /// A textual value is not in the lexical form of the target scalar.
    Conversion {
        /// The text that failed to convert.
        value: String,
        /// Registered name of the target type.
        target: String,
    },
    /// A constructor-call class path is not registered.
    UnknownType {
        /// The path as written.
        path: String,
    },
    /// No registered constructor accepts the given arguments.
    NoMatchingConstructor {
        /// The constructor-call text; empty for failed
        /// default-construction.
        text: String,
        /// Registered name of the resolved type.
        target: String,
    },
    /// Constructor-call text does not match the call grammar.
    MalformedConstructor {
        /// The text that failed to parse.
        text: String,
    },
    /// A type-erased registration op failed. These are registration
    /// bugs, not input errors.
    Shape(ShapeError),
    /// Reading the source file failed.
    Io(String),
}

impl Display for JamlErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JamlErrorKind::Syntax { line_text } => {
                write!(f, "syntax error: `{line_text}` does not match `key: value`")
            }
            JamlErrorKind::UnknownField {
                field,
                expected,
                suggestion,
            } => {
                if expected.is_empty() {
                    write!(f, "unknown field `{field}`: target type has no fields")
                } else {
                    write!(f, "unknown field `{field}`, expected one of: {expected:?}")?;
                    if let Some(suggested) = suggestion {
                        write!(f, " (did you mean `{suggested}`?)")?;
                    }
                    Ok(())
                }
            }
            JamlErrorKind::Conversion { value, target } => {
                write!(f, "cannot convert `{value}` into {target}")
            }
            JamlErrorKind::UnknownType { path } => {
                write!(f, "unknown type `{path}`")
            }
            JamlErrorKind::NoMatchingConstructor { text, target } => {
                if text.is_empty() {
                    write!(f, "{target} has no zero-argument constructor")
                } else {
                    write!(f, "no constructor of {target} matches `{text}`")
                }
            }
            JamlErrorKind::MalformedConstructor { text } => {
                write!(f, "malformed constructor call `{text}`")
            }
            JamlErrorKind::Shape(err) => write!(f, "shape defect: {err}"),
            JamlErrorKind::Io(message) => write!(f, "{message}"),
        }
    }
}

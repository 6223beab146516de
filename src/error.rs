// Error handling for urit

use thiserror::Error;

/// A template could not be parsed
///
/// `position` is the byte offset into the (slash-prefixed) template text.
#[derive(Debug, Error)]
#[error("{message} at position {position}")]
pub struct ParseError {
    message: String,
    position: usize,
    #[source]
    cause: Option<regex::Error>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
            cause: None,
        }
    }

    pub fn with_cause(message: impl Into<String>, position: usize, cause: regex::Error) -> Self {
        Self {
            message: message.into(),
            position,
            cause: Some(cause),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn cause(&self) -> Option<&regex::Error> {
        self.cause.as_ref()
    }
}

/// A path or request could not be generated from a template
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no var for position {0}")]
    MissingPositional(usize),

    #[error("no var for '{0}'")]
    MissingNamed(String),

    #[error("no var for '{name}' (occurrence {occurrence})")]
    MissingNamedOccurrence { name: String, occurrence: usize },

    #[error("path var at position {position} rejected: '{value}'")]
    Rejected { position: usize, value: String },

    #[error("invalid header: {0}")]
    Header(String),

    #[error("invalid request: {0}")]
    Request(#[from] axum::http::Error),
}

/// A value was added to a path vars container of the other addressing kind
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathVarsError {
    #[error("cannot add named var to non-names vars")]
    NamedIntoPositional,

    #[error("cannot add positional var to non-positionals vars")]
    PositionalIntoNamed,
}

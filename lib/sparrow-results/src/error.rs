use json_event_parser::{JsonParseError, JsonSyntaxError};
use std::io;
use std::sync::Arc;

/// An error returned while parsing a query results file.
#[derive(Debug, thiserror::Error)]
pub enum QueryResultsParseError {
    /// I/O error during parsing (file not found...).
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error in the file syntax.
    #[error(transparent)]
    Syntax(#[from] QueryResultsSyntaxError),
}

impl From<QueryResultsParseError> for io::Error {
    #[inline]
    fn from(error: QueryResultsParseError) -> Self {
        match error {
            QueryResultsParseError::Io(error) => error,
            QueryResultsParseError::Syntax(error) => Self::new(io::ErrorKind::InvalidData, error),
        }
    }
}

#[doc(hidden)]
impl From<JsonParseError> for QueryResultsParseError {
    fn from(error: JsonParseError) -> Self {
        match error {
            JsonParseError::Syntax(error) => QueryResultsSyntaxError::from(error).into(),
            JsonParseError::Io(error) => error.into(),
        }
    }
}

#[doc(hidden)]
impl From<quick_xml::Error> for QueryResultsParseError {
    #[inline]
    fn from(error: quick_xml::Error) -> Self {
        match error {
            quick_xml::Error::Io(error) => {
                Self::Io(Arc::try_unwrap(error).unwrap_or_else(|e| io::Error::new(e.kind(), e)))
            }
            _ => Self::Syntax(QueryResultsSyntaxError(SyntaxErrorKind::Xml(error))),
        }
    }
}

/// An error in the syntax of the parsed file.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct QueryResultsSyntaxError(#[from] pub(crate) SyntaxErrorKind);

#[derive(Debug, thiserror::Error)]
pub(crate) enum SyntaxErrorKind {
    #[error(transparent)]
    Json(#[from] JsonSyntaxError),
    #[error(transparent)]
    Xml(quick_xml::Error),
    #[error("{msg}")]
    Msg { msg: String, line: Option<u64> },
}

impl QueryResultsSyntaxError {
    /// Builds an error from a printable error message.
    pub(crate) fn msg(msg: impl Into<String>) -> Self {
        Self(SyntaxErrorKind::Msg {
            msg: msg.into(),
            line: None,
        })
    }

    /// Builds an error from a printable error message and the line it was found on.
    pub(crate) fn located_msg(msg: impl Into<String>, line: u64) -> Self {
        Self(SyntaxErrorKind::Msg {
            msg: msg.into(),
            line: Some(line),
        })
    }

    /// The line (starting from 0) the error was found on, when known.
    pub fn line(&self) -> Option<u64> {
        match &self.0 {
            SyntaxErrorKind::Json(e) => Some(e.location().start.line),
            SyntaxErrorKind::Xml(_) => None,
            SyntaxErrorKind::Msg { line, .. } => *line,
        }
    }
}

#[doc(hidden)]
impl From<JsonSyntaxError> for QueryResultsSyntaxError {
    fn from(error: JsonSyntaxError) -> Self {
        Self(SyntaxErrorKind::Json(error))
    }
}

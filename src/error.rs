use std::{error::Error as StdError, fmt, io, result::Result as StdResult};

use crate::{escape::ParseError, host_ipc::NotificationClass};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The host closed the socket.
    Closed,
    Rejected {
        request: &'static str,
        message: String,
    },
    UnexpectedResponse(String),
    AlreadySubscribed(NotificationClass),
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "connection closed by host"),
            Self::Rejected { request, message } => {
                write!(f, "host rejected {request}: {message}")
            }
            Self::UnexpectedResponse(msg) => write!(f, "unexpected response: {msg}"),
            Self::AlreadySubscribed(class) => {
                write!(f, "a handler for {class} is already registered")
            }
        }
    }
}

impl StdError for ConnectionError {}

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Json(serde_json::Error),
    Connection(ConnectionError),
    Escape(ParseError),
}

impl Error {
    /// True when the host shut the connection down, as opposed to a failure.
    pub const fn is_closed(&self) -> bool {
        matches!(self, Self::Connection(ConnectionError::Closed))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Json(e) => write!(f, "JSON error: {e}"),
            Self::Connection(e) => write!(f, "Connection error: {e}"),
            Self::Escape(e) => write!(f, "Escape sequence error: {e}"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Connection(e) => Some(e),
            Self::Escape(e) => Some(e),
        }
    }
}

impl From<ConnectionError> for Error {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Escape(e)
    }
}

pub type Result<T> = StdResult<T, Error>;

use std::io;

use thiserror::Error as ThisError;

use crate::frame::{self, Frame};

/// Every failure a command can resolve to.
///
/// Variants are grouped into the coarse categories of [`ErrorKind`]; callers that only need to
/// decide between "retry later", "bug in my request" and "the store said no" should match on
/// [`Error::kind`] instead of on the variants.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("connection unavailable; {0}")]
    ConnectionUnavailable(String),
    #[error("invalid connection url {url:?}; {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("transport error; {0}")]
    Io(#[from] io::Error),
    #[error("transport error; {0}")]
    Frame(#[from] frame::Error),
    #[error("transport error; connection closed by the store")]
    ConnectionClosed,
    #[error("protocol error; expected {expected}, got {actual}")]
    UnexpectedReply { expected: String, actual: String },
    #[error("protocol error; {0}")]
    Protocol(String),
    /// An operation was attempted in a transaction state that does not allow it.
    #[error("transaction error; {0}")]
    Transaction(String),
    #[error("{0}")]
    Store(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No channel could be leased; nothing was sent.
    ConnectionUnavailable,
    /// A channel was leased but the exchange failed before a complete reply arrived.
    Transport,
    /// A reply arrived but did not have the shape the operation expects.
    ProtocolMismatch,
    /// The store answered with an error reply.
    Store,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConnectionUnavailable(_) | Error::InvalidUrl { .. } => {
                ErrorKind::ConnectionUnavailable
            }
            Error::Io(_) | Error::Frame(_) | Error::ConnectionClosed => ErrorKind::Transport,
            Error::UnexpectedReply { .. } | Error::Protocol(_) | Error::Transaction(_) => {
                ErrorKind::ProtocolMismatch
            }
            Error::Store(_) => ErrorKind::Store,
        }
    }

    /// Whether the channel that produced this error can no longer be trusted to be in sync.
    pub(crate) fn breaks_connection(&self) -> bool {
        self.kind() == ErrorKind::Transport
    }

    pub(crate) fn unexpected(expected: impl Into<String>, actual: &Frame) -> Error {
        Error::UnexpectedReply {
            expected: expected.into(),
            actual: describe(actual),
        }
    }
}

fn describe(frame: &Frame) -> String {
    match frame {
        Frame::Simple(s) => format!("status {:?}", s),
        Frame::Integer(i) => format!("integer {}", i),
        Frame::Array(items) => format!("{} of length {}", frame.kind(), items.len()),
        frame => frame.kind().to_string(),
    }
}

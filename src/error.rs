//! `Error` and `Result` types for this crate.
use std::fmt::{self, Display, Formatter};
use crate::x_error::XError;

pub(crate) type CowStr = ::std::borrow::Cow<'static, str>;

/// Different kinds of errors reported by connection-level operations.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The X server (or this build of the crate) lacks what the operation needs.
    ///
    /// For instance, sending an XFIXES request to a server that doesn't advertise `XFIXES`.
    Unsupported,
    /// Some arguments were invalid; You could retry with different ones.
    InvalidArgument,
    /// Arguments were valid, but the operation failed for other reasons:
    /// the connection broke, or the server sent a buffer too short for its type.
    Failed,
}

/// An `ErrorKind` packed with an optional `reason` string.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Error {
    /// The error kind.
    pub kind: ErrorKind,
    /// A hopefully useful reason string, or `None` if unknown or not meaningful.
    pub reason: Option<CowStr>,
}

/// Alias to `Result<T, Error>`.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Error returned when waiting for the reply of a request.
///
/// Either the connection itself failed, or the server answered with an X error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReplyError {
    /// The connection failed, or the reply could not be decoded.
    #[error(transparent)]
    Connection(#[from] Error),
    /// The X server reported an error for this request.
    #[error(transparent)]
    X(#[from] XError),
}

impl ErrorKind {
    pub(crate) fn describe_quick(&self) -> &'static str {
        match *self {
            ErrorKind::InvalidArgument => "Invalid argument(s)",
            ErrorKind::Unsupported => "Unsupported by the X server or this build",
            ErrorKind::Failed => "Operation has failed",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.describe_quick())
    }
}

impl ::std::error::Error for ErrorKind {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.kind.describe_quick())?;
        match self.reason {
            None => write!(f, " (no reason given)"),
            Some(ref s) => write!(f, ": {}", s),
        }
    }
}

impl ::std::error::Error for Error {}

#[allow(unused_imports)]
pub(crate) use self::utils::*;

mod utils {
    #![allow(dead_code)]
    use super::*;

    impl Error {
        pub(crate) fn unsupported<S: Into<CowStr>>(s: S) -> Self {
            Self { kind: ErrorKind::Unsupported, reason: Some(s.into()), }
        }
        pub(crate) fn invalid_arg<S: Into<CowStr>>(s: S) -> Self {
            Self { kind: ErrorKind::InvalidArgument, reason: Some(s.into()), }
        }
        pub(crate) fn failed<S: Into<CowStr>>(s: S) -> Self {
            Self { kind: ErrorKind::Failed, reason: Some(s.into()), }
        }
        pub(crate) fn failed_unexplained() -> Self {
            Self { kind: ErrorKind::Failed, reason: None, }
        }
    }

    pub(crate) fn unsupported<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::unsupported(s))
    }
    pub(crate) fn invalid_arg<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::invalid_arg(s))
    }
    pub(crate) fn failed<T, S: Into<CowStr>>(s: S) -> self::Result<T> {
        Err(Error::failed(s))
    }
}

use crate::{HeaderName, Method, Status};
use std::str::Utf8Error;
use thiserror::Error;

/// Concrete errors that occur within coracle's HTTP implementation
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// [`std::io::Error`]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// connection was closed before any request bytes arrived
    #[error("Connection closed by client")]
    Closed,

    /// the transport reached end of stream partway through a request head
    #[error("Unexpected eof mid-request")]
    UnexpectedEof,

    /// An incomplete or invalid HTTP head
    #[error("Partial or invalid HTTP head")]
    InvalidHead,

    /// this error describes a request that does not specify a path
    #[error("Request path missing")]
    RequestPathMissing,

    /// this request did not have a method
    #[error("Missing method")]
    MissingMethod,

    /// we were unable to parse this method
    #[error("Unrecognized method {0}")]
    UnrecognizedMethod(String),

    /// We were unable to parse a [`Version`][crate::Version]
    #[error("Invalid or missing version")]
    InvalidVersion,

    /// we were able to parse this version, but we do not speak it
    #[error("Unsupported version {0}")]
    UnsupportedVersion(String),

    /// We were unable to parse a [`HeaderName`]
    #[error("Invalid or unparseable header name")]
    InvalidHeaderName,

    /// we received a header that does not make sense in context
    #[error("Unexpected header: {0}")]
    UnexpectedHeader(HeaderName),

    /// a `Content-Length` header that does not parse as a decimal integer
    #[error("Invalid Content-Length header")]
    InvalidContentLength,

    /// a body was declared on a method that does not take one
    #[error("Http body not allowed for {0} requests")]
    UnexpectedBody(Method),

    /// to mitigate against malicious HTTP clients, we do not allow request headers beyond this
    /// length
    #[error("Headers were malformed or longer than allowed")]
    HeadersTooLong,

    /// to mitigate against malicious HTTP clients, we do not read received bodies beyond this
    /// length into memory. Longer bodies can still be streamed through the `AsyncRead`
    /// implementation on [`ReceivedBody`][crate::ReceivedBody]
    #[error("Received body too long. Maximum {0} bytes")]
    ReceivedBodyTooLong(u64),

    /// we expected utf8, but there was an encoding error
    #[error(transparent)]
    EncodingError(#[from] Utf8Error),
}

impl Error {
    /// The response status that describes this error to the peer, if there is one.
    ///
    /// Transport-level failures return None; for those there is no useful response to send.
    pub fn status(&self) -> Option<Status> {
        match self {
            Error::Io(_) | Error::Closed => None,
            Error::HeadersTooLong | Error::ReceivedBodyTooLong(_) => Some(Status::PayloadTooLarge),
            Error::UnsupportedVersion(_) => Some(Status::HttpVersionNotSupported),
            _ => Some(Status::BadRequest),
        }
    }
}

/// this crate's result type
pub type Result<T> = std::result::Result<T, Error>;

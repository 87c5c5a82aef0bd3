use std::fmt::{self, Display};

/// HTTP response status codes.
///
/// As defined by [rfc7231 section 6](https://tools.ietf.org/html/rfc7231#section-6).
#[repr(u16)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[non_exhaustive]
pub enum Status {
    /// 200 Ok
    ///
    /// The request has succeeded
    Ok = 200,

    /// 201 Created
    ///
    /// The request has succeeded and a new resource has been created as a
    /// result.
    Created = 201,

    /// 202 Accepted
    ///
    /// The request has been received but not yet acted upon.
    Accepted = 202,

    /// 204 No Content
    ///
    /// There is no content to send for this request. Responses with this
    /// status carry neither a body nor body-framing headers.
    NoContent = 204,

    /// 206 Partial Content
    ///
    /// This response code is used when the Range header is sent from the
    /// client to request only part of a resource.
    PartialContent = 206,

    /// 301 Moved Permanently
    MovedPermanently = 301,

    /// 302 Found
    Found = 302,

    /// 304 Not Modified
    ///
    /// Responses with this status carry neither a body nor body-framing
    /// headers.
    NotModified = 304,

    /// 400 Bad Request
    ///
    /// The server could not understand the request due to invalid syntax.
    BadRequest = 400,

    /// 401 Unauthorized
    Unauthorized = 401,

    /// 403 Forbidden
    Forbidden = 403,

    /// 404 Not Found
    ///
    /// The server can not find the requested resource.
    NotFound = 404,

    /// 405 Method Not Allowed
    MethodNotAllowed = 405,

    /// 413 Payload Too Large
    ///
    /// The request entity (or, here, its header block) is larger than
    /// limits defined by the server.
    PayloadTooLarge = 413,

    /// 416 Requested Range Not Satisfiable
    ///
    /// The range specified by the Range header field in the request can't
    /// be fulfilled.
    RequestedRangeNotSatisfiable = 416,

    /// 500 Internal Server Error
    InternalServerError = 500,

    /// 501 Not Implemented
    NotImplemented = 501,

    /// 502 Bad Gateway
    BadGateway = 502,

    /// 503 Service Unavailable
    ServiceUnavailable = 503,

    /// 505 HTTP Version Not Supported
    HttpVersionNotSupported = 505,
}

impl Status {
    /// The canonical reason phrase for this status code, as sent on the
    /// status line.
    pub fn canonical_reason(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::Accepted => "Accepted",
            Status::NoContent => "No Content",
            Status::PartialContent => "Partial Content",
            Status::MovedPermanently => "Moved Permanently",
            Status::Found => "Found",
            Status::NotModified => "Not Modified",
            Status::BadRequest => "Bad Request",
            Status::Unauthorized => "Unauthorized",
            Status::Forbidden => "Forbidden",
            Status::NotFound => "Not Found",
            Status::MethodNotAllowed => "Method Not Allowed",
            Status::PayloadTooLarge => "Payload Too Large",
            Status::RequestedRangeNotSatisfiable => "Requested Range Not Satisfiable",
            Status::InternalServerError => "Internal Server Error",
            Status::NotImplemented => "Not Implemented",
            Status::BadGateway => "Bad Gateway",
            Status::ServiceUnavailable => "Service Unavailable",
            Status::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }
}

impl TryFrom<u16> for Status {
    type Error = crate::Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            200 => Ok(Status::Ok),
            201 => Ok(Status::Created),
            202 => Ok(Status::Accepted),
            204 => Ok(Status::NoContent),
            206 => Ok(Status::PartialContent),
            301 => Ok(Status::MovedPermanently),
            302 => Ok(Status::Found),
            304 => Ok(Status::NotModified),
            400 => Ok(Status::BadRequest),
            401 => Ok(Status::Unauthorized),
            403 => Ok(Status::Forbidden),
            404 => Ok(Status::NotFound),
            405 => Ok(Status::MethodNotAllowed),
            413 => Ok(Status::PayloadTooLarge),
            416 => Ok(Status::RequestedRangeNotSatisfiable),
            500 => Ok(Status::InternalServerError),
            501 => Ok(Status::NotImplemented),
            502 => Ok(Status::BadGateway),
            503 => Ok(Status::ServiceUnavailable),
            505 => Ok(Status::HttpVersionNotSupported),
            _ => Err(crate::Error::InvalidHead),
        }
    }
}

impl From<Status> for u16 {
    fn from(value: Status) -> Self {
        value as u16
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u16)
    }
}

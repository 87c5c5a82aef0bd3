use crate::Error;
use std::{
    fmt::{self, Display},
    str::FromStr,
};

/// HTTP request methods.
///
/// See [RFC7231, Section 4](https://tools.ietf.org/html/rfc7231#section-4).
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Method {
    /// The CONNECT method requests a tunnel to the destination origin server.
    Connect,

    /// The DELETE method requests that the origin server remove the target resource.
    Delete,

    /// The GET method requests a representation of the specified resource. GET requests do not
    /// carry a body.
    Get,

    /// The HEAD method asks for a response identical to that of a GET request, but without the
    /// response body.
    Head,

    /// The OPTIONS method is used to describe the communication options for the target resource.
    Options,

    /// The PATCH method is used to apply partial modifications to a resource.
    Patch,

    /// The POST method is used to submit an entity to the specified resource.
    Post,

    /// The PUT method replaces the target resource with the request payload.
    Put,

    /// The TRACE method performs a message loop-back test along the path to the target resource.
    Trace,
}

impl Method {
    pub(crate) fn parse(bytes: &[u8]) -> crate::Result<Self> {
        match bytes {
            b"CONNECT" => Ok(Self::Connect),
            b"DELETE" => Ok(Self::Delete),
            b"GET" => Ok(Self::Get),
            b"HEAD" => Ok(Self::Head),
            b"OPTIONS" => Ok(Self::Options),
            b"PATCH" => Ok(Self::Patch),
            b"POST" => Ok(Self::Post),
            b"PUT" => Ok(Self::Put),
            b"TRACE" => Ok(Self::Trace),
            other => Err(Error::UnrecognizedMethod(
                String::from_utf8_lossy(other).to_string(),
            )),
        }
    }

    /// the uppercase wire representation of this method
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Connect => "CONNECT",
            Method::Delete => "DELETE",
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
            Method::Patch => "PATCH",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Trace => "TRACE",
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s.as_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_round_trips() {
        for method in [
            Method::Connect,
            Method::Delete,
            Method::Get,
            Method::Head,
            Method::Options,
            Method::Patch,
            Method::Post,
            Method::Put,
            Method::Trace,
        ] {
            assert_eq!(method.as_str().parse::<Method>().unwrap(), method);
        }
    }

    #[test]
    fn unknown_methods_are_rejected() {
        assert!(matches!(
            "get".parse::<Method>(),
            Err(Error::UnrecognizedMethod(_))
        ));
        assert!(matches!(
            "BREW".parse::<Method>(),
            Err(Error::UnrecognizedMethod(_))
        ));
    }
}

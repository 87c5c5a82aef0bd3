use crate::Error;

/// The version of the HTTP protocol in use.
///
/// Only the two HTTP/1.x versions are spoken by this crate. The
/// distinction matters for connection reuse: HTTP/1.1 connections are
/// kept alive by default, HTTP/1.0 connections close after one exchange.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum Version {
    /// HTTP/1.0
    Http1_0,

    /// HTTP/1.1
    Http1_1,
}

impl Version {
    pub(crate) fn parse(bytes: &[u8]) -> crate::Result<Self> {
        match bytes {
            b"HTTP/1.0" => Ok(Self::Http1_0),
            b"HTTP/1.1" => Ok(Self::Http1_1),
            other if other.starts_with(b"HTTP/") => Err(Error::UnsupportedVersion(
                String::from_utf8_lossy(other).to_string(),
            )),
            _ => Err(Error::InvalidVersion),
        }
    }

    /// the wire representation of this version
    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http1_0 => "HTTP/1.0",
            Version::Http1_1 => "HTTP/1.1",
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse() {
        assert_eq!(Version::parse(b"HTTP/1.1").unwrap(), Version::Http1_1);
        assert_eq!(Version::parse(b"HTTP/1.0").unwrap(), Version::Http1_0);
        assert!(matches!(
            Version::parse(b"HTTP/2"),
            Err(Error::UnsupportedVersion(_))
        ));
        assert!(matches!(Version::parse(b"ICY"), Err(Error::InvalidVersion)));
    }

    #[test]
    fn to_string() {
        let output = format!("{} {}", Version::Http1_0, Version::Http1_1);
        assert_eq!("HTTP/1.0 HTTP/1.1", output);
    }
}

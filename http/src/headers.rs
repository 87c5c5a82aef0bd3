use crate::Error;
use memchr::memmem::Finder;
use smallvec::{smallvec, SmallVec};
use smartstring::alias::String as SmartString;
use std::{
    fmt::{self, Debug, Display, Formatter},
    str::{self, FromStr},
};

/// Header names this crate interacts with directly.
///
/// Anything else arrives as an unknown name and is matched
/// case-insensitively. This is a deliberately short list; it only needs to
/// cover what the protocol engine and the file responder look at or emit.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[non_exhaustive]
pub enum KnownHeaderName {
    /// `Accept-Ranges`
    AcceptRanges,

    /// `Connection`
    Connection,

    /// `Content-Length`
    ContentLength,

    /// `Content-Range`
    ContentRange,

    /// `Content-Type`
    ContentType,

    /// `Date`
    Date,

    /// `Expect`
    Expect,

    /// `Host`
    Host,

    /// `Range`
    Range,

    /// `Server`
    Server,

    /// `Transfer-Encoding`
    TransferEncoding,
}

impl KnownHeaderName {
    /// the canonical capitalization of this header name
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownHeaderName::AcceptRanges => "Accept-Ranges",
            KnownHeaderName::Connection => "Connection",
            KnownHeaderName::ContentLength => "Content-Length",
            KnownHeaderName::ContentRange => "Content-Range",
            KnownHeaderName::ContentType => "Content-Type",
            KnownHeaderName::Date => "Date",
            KnownHeaderName::Expect => "Expect",
            KnownHeaderName::Host => "Host",
            KnownHeaderName::Range => "Range",
            KnownHeaderName::Server => "Server",
            KnownHeaderName::TransferEncoding => "Transfer-Encoding",
        }
    }

    const ALL: [KnownHeaderName; 11] = [
        KnownHeaderName::AcceptRanges,
        KnownHeaderName::Connection,
        KnownHeaderName::ContentLength,
        KnownHeaderName::ContentRange,
        KnownHeaderName::ContentType,
        KnownHeaderName::Date,
        KnownHeaderName::Expect,
        KnownHeaderName::Host,
        KnownHeaderName::Range,
        KnownHeaderName::Server,
        KnownHeaderName::TransferEncoding,
    ];
}

impl Display for KnownHeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnownHeaderName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|known| known.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or(())
    }
}

/// The name of an HTTP header.
///
/// Well-known names resolve to a [`KnownHeaderName`]; everything else is
/// retained verbatim and compared case-insensitively.
#[derive(Clone)]
pub enum HeaderName {
    /// a name from the short list this crate knows about
    Known(KnownHeaderName),

    /// any other token
    Unknown(SmartString),
}

/// a `tchar` per [RFC7230 section 3.2.6](https://tools.ietf.org/html/rfc7230#section-3.2.6)
pub(crate) fn is_tchar(c: u8) -> bool {
    matches!(
        c,
        b'a'..=b'z'
        | b'A'..=b'Z'
        | b'0'..=b'9'
        | b'!'
        | b'#'
        | b'$'
        | b'%'
        | b'&'
        | b'\''
        | b'*'
        | b'+'
        | b'-'
        | b'.'
        | b'^'
        | b'_'
        | b'`'
        | b'|'
        | b'~'
    )
}

impl HeaderName {
    /// Parse a header name from the raw bytes of a field line.
    ///
    /// Every byte must be a `tchar`; anything else is a protocol error.
    pub(crate) fn parse(bytes: &[u8]) -> crate::Result<Self> {
        if bytes.is_empty() || !bytes.iter().copied().all(is_tchar) {
            return Err(Error::InvalidHeaderName);
        }

        let s = str::from_utf8(bytes).map_err(|_| Error::InvalidHeaderName)?;
        Ok(s.parse::<KnownHeaderName>()
            .map_or_else(|()| Self::Unknown(SmartString::from(s)), Self::Known))
    }

    /// this name as a str slice
    pub fn as_str(&self) -> &str {
        match self {
            HeaderName::Known(known) => known.as_str(),
            HeaderName::Unknown(unknown) => unknown,
        }
    }

    pub(crate) fn is_valid(&self) -> bool {
        match self {
            HeaderName::Known(_) => true,
            HeaderName::Unknown(unknown) => {
                !unknown.is_empty() && unknown.bytes().all(is_tchar)
            }
        }
    }
}

impl PartialEq for HeaderName {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HeaderName::Known(a), HeaderName::Known(b)) => a == b,
            (HeaderName::Unknown(a), HeaderName::Unknown(b)) => a.eq_ignore_ascii_case(b),
            _ => false,
        }
    }
}

impl Eq for HeaderName {}

impl From<KnownHeaderName> for HeaderName {
    fn from(value: KnownHeaderName) -> Self {
        Self::Known(value)
    }
}

impl From<&str> for HeaderName {
    fn from(s: &str) -> Self {
        s.parse::<KnownHeaderName>()
            .map_or_else(|()| Self::Unknown(SmartString::from(s)), Self::Known)
    }
}

impl From<String> for HeaderName {
    fn from(s: String) -> Self {
        s.as_str().into()
    }
}

impl Debug for HeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(self.as_str(), f)
    }
}

impl Display for HeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of an HTTP header, stored as raw bytes.
#[derive(Clone, Eq, PartialEq)]
pub struct HeaderValue(Vec<u8>);

impl HeaderValue {
    /// Build a value from a field line, discarding trailing whitespace.
    /// Leading whitespace is the parser's concern.
    pub(crate) fn parse(bytes: &[u8]) -> Self {
        let end = bytes
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |index| index + 1);
        Self(bytes[..end].to_vec())
    }

    /// this value as a str slice, if it is utf8
    pub fn as_str(&self) -> Option<&str> {
        str::from_utf8(&self.0).ok()
    }

    pub(crate) fn is_valid(&self) -> bool {
        !self.0.contains(&b'\r') && !self.0.contains(&b'\n')
    }
}

impl AsRef<[u8]> for HeaderValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&'static str> for HeaderValue {
    fn from(value: &'static str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<Vec<u8>> for HeaderValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<u64> for HeaderValue {
    fn from(value: u64) -> Self {
        Self(value.to_string().into_bytes())
    }
}

impl From<usize> for HeaderValue {
    fn from(value: usize) -> Self {
        Self(value.to_string().into_bytes())
    }
}

impl Debug for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&String::from_utf8_lossy(&self.0), f)
    }
}

impl Display for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&String::from_utf8_lossy(&self.0), f)
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

/// One or more values for a single header name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeaderValues(SmallVec<[HeaderValue; 1]>);

impl HeaderValues {
    /// the first value
    pub fn one(&self) -> &HeaderValue {
        &self.0[0]
    }

    /// iterate over the values in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, HeaderValue> {
        self.0.iter()
    }

    fn push(&mut self, value: HeaderValue) {
        self.0.push(value);
    }
}

impl From<HeaderValue> for HeaderValues {
    fn from(value: HeaderValue) -> Self {
        Self(smallvec![value])
    }
}

impl<'a> IntoIterator for &'a HeaderValues {
    type Item = &'a HeaderValue;
    type IntoIter = std::slice::Iter<'a, HeaderValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Coracle's header map type.
///
/// Entries preserve insertion order, which is also wire order for parsed
/// request headers. Name lookup is always case-insensitive.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[must_use]
pub struct Headers {
    entries: Vec<(HeaderName, HeaderValues)>,
}

impl Headers {
    /// Construct an empty header map
    pub fn new() -> Self {
        Self::default()
    }

    /// the number of distinct header names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there zero headers?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &HeaderName) -> Option<&(HeaderName, HeaderValues)> {
        self.entries.iter().find(|(n, _)| n == name)
    }

    fn entry_mut(&mut self, name: &HeaderName) -> Option<&mut (HeaderName, HeaderValues)> {
        self.entries.iter_mut().find(|(n, _)| n == name)
    }

    /// Add a value for a name, retaining any values already present.
    pub fn append(&mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) {
        let name = name.into();
        let value = value.into();
        match self.entry_mut(&name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, value.into())),
        }
    }

    /// Set the value for a name, dropping any values already present.
    pub fn insert(&mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) {
        let name = name.into();
        let value = value.into();
        match self.entry_mut(&name) {
            Some(entry) => entry.1 = value.into(),
            None => self.entries.push((name, value.into())),
        }
    }

    /// Set the value for a name only if the name is not already present.
    pub fn try_insert(&mut self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) {
        let name = name.into();
        if self.entry(&name).is_none() {
            self.entries.push((name, value.into().into()));
        }
    }

    /// Like [`Headers::try_insert`], but only computes the value when it
    /// will be used.
    pub fn try_insert_with<V, F>(&mut self, name: impl Into<HeaderName>, value: F)
    where
        V: Into<HeaderValue>,
        F: FnOnce() -> V,
    {
        let name = name.into();
        if self.entry(&name).is_none() {
            self.entries.push((name, value().into().into()));
        }
    }

    /// Remove all values for a name.
    pub fn remove(&mut self, name: impl Into<HeaderName>) {
        let name = name.into();
        self.entries.retain(|(n, _)| *n != name);
    }

    /// the first value for a name, if any
    pub fn get(&self, name: impl Into<HeaderName>) -> Option<&HeaderValue> {
        let name = name.into();
        self.entry(&name).map(|(_, values)| values.one())
    }

    /// the first value for a name as a str slice, if present and utf8
    pub fn get_str(&self, name: impl Into<HeaderName>) -> Option<&str> {
        self.get(name).and_then(HeaderValue::as_str)
    }

    /// all values for a name
    pub fn get_values(&self, name: impl Into<HeaderName>) -> Option<&HeaderValues> {
        let name = name.into();
        self.entry(&name).map(|(_, values)| values)
    }

    /// predicate for the presence of a name
    pub fn has_header(&self, name: impl Into<HeaderName>) -> bool {
        let name = name.into();
        self.entry(&name).is_some()
    }

    /// Compare the first value for a name against `needle`, ignoring ascii
    /// case. Returns false if the header is absent.
    pub fn eq_ignore_ascii_case(&self, name: impl Into<HeaderName>, needle: &str) -> bool {
        self.get_str(name)
            .is_some_and(|value| value.eq_ignore_ascii_case(needle))
    }

    /// iterate over (name, values) entries in insertion order
    pub fn iter(&self) -> std::slice::Iter<'_, (HeaderName, HeaderValues)> {
        self.entries.iter()
    }

    /// Parse a block of `Name: value\r\n` field lines. A trailing blank
    /// line is tolerated, as the head locator hands us the block
    /// terminator as well.
    pub(crate) fn parse(bytes: &[u8]) -> crate::Result<Self> {
        let mut headers = Headers::new();
        let mut last_line = 0;

        for newline in Finder::new(b"\r\n").find_iter(bytes) {
            if newline == last_line {
                continue;
            }

            let token_start = last_line;
            let mut token_end = token_start;
            while token_end < newline && is_tchar(bytes[token_end]) {
                token_end += 1;
            }

            let header_name = HeaderName::parse(&bytes[token_start..token_end])?;

            if token_end >= newline || bytes[token_end] != b':' {
                return Err(Error::InvalidHeaderName);
            }

            let mut value_start = token_end + 1;
            while value_start < newline && bytes[value_start].is_ascii_whitespace() {
                value_start += 1;
            }

            let header_value = HeaderValue::parse(&bytes[value_start..newline]);
            headers.append(header_name, header_value);
            last_line = newline + 2;
        }

        Ok(headers)
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a (HeaderName, HeaderValues);
    type IntoIter = std::slice::Iter<'a, (HeaderName, HeaderValues)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (name, values) in self {
            for value in values {
                f.write_fmt(format_args!("{name}: {value}\r\n"))?;
            }
        }
        Ok(())
    }
}

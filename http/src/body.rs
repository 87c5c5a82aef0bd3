use futures_lite::{io::Cursor, ready, AsyncRead, AsyncReadExt};
use std::{
    borrow::Cow,
    fmt::Debug,
    io::{Error, ErrorKind, Result},
    pin::Pin,
    task::{Context, Poll},
};
use BodyType::{Empty, Static, Streaming};

/// A response body.
///
/// This can contain `&'static [u8]` content, `Vec<u8>` content, or a boxed
/// [`AsyncRead`] source with a known or unknown length. The length drives
/// response framing: a known length becomes a `Content-Length` header, an
/// unknown length becomes `Transfer-Encoding: chunked`.
///
/// Reading from a `Body` yields the raw content; chunked framing is
/// applied separately by the [`BodyEncoder`][crate::BodyEncoder].
#[derive(Debug, Default)]
pub struct Body(BodyType);

impl Body {
    /// Construct a new body from a streaming [`AsyncRead`] source. If the
    /// body content is already in memory, prefer [`Body::new_static`] or
    /// one of the From conversions.
    ///
    /// When `len` is provided, the source is required to yield exactly
    /// that many bytes and then end: a source that runs dry early, or
    /// that still has bytes once the declared length has been read,
    /// surfaces an [`ErrorKind::InvalidData`] error. This catches files
    /// whose size changed between stat and read, in either direction.
    pub fn new_streaming(async_read: impl AsyncRead + Send + Sync + 'static, len: Option<u64>) -> Self {
        Self(Streaming {
            async_read: Box::pin(async_read),
            len,
            done: false,
            progress: 0,
        })
    }

    /// Construct a fixed-length body from a `Vec<u8>` or `&'static [u8]`.
    pub fn new_static(content: impl Into<Cow<'static, [u8]>>) -> Self {
        Self(Static {
            content: content.into(),
            cursor: 0,
        })
    }

    /// Retrieve a borrow of the static content in this body. If this body
    /// is a streaming body or an empty body, this will return None.
    pub fn static_bytes(&self) -> Option<&[u8]> {
        match &self.0 {
            Static { content, .. } => Some(content.as_ref()),
            _ => None,
        }
    }

    /// Consume this body and return the full content, reading a streaming
    /// source to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying source errors, or if a
    /// streaming body has already been partially read.
    pub async fn into_bytes(self) -> Result<Cow<'static, [u8]>> {
        match self.0 {
            Static { content, .. } => Ok(content),

            Streaming {
                mut async_read,
                len,
                progress: 0,
                done: false,
            } => {
                let mut buf = len
                    .and_then(|len| len.try_into().ok())
                    .map(Vec::with_capacity)
                    .unwrap_or_default();

                async_read.read_to_end(&mut buf).await?;

                Ok(Cow::Owned(buf))
            }

            Empty => Ok(Cow::Borrowed(b"")),

            Streaming { .. } => Err(Error::new(
                ErrorKind::Other,
                "body already read to completion",
            )),
        }
    }

    /// the number of bytes that have been read from this body so far
    pub fn bytes_read(&self) -> u64 {
        match self.0 {
            Empty => 0,
            Static { cursor, .. } => cursor as u64,
            Streaming { progress, .. } => progress,
        }
    }

    /// the content length of this body, if known
    pub fn len(&self) -> Option<u64> {
        match self.0 {
            Empty => Some(0),
            Static { ref content, .. } => Some(content.len() as u64),
            Streaming { len, .. } => len,
        }
    }

    /// determine if this body represents no data
    pub fn is_empty(&self) -> bool {
        match self.0 {
            Empty => true,
            Static { ref content, .. } => content.is_empty(),
            Streaming { len, .. } => len == Some(0),
        }
    }

    /// determine if this body represents static content
    pub fn is_static(&self) -> bool {
        matches!(self.0, Static { .. })
    }

    /// determine if this body represents streaming content
    pub fn is_streaming(&self) -> bool {
        matches!(self.0, Streaming { .. })
    }

    /// Transform this body into a dyn [`AsyncRead`], wrapping static
    /// content in a [`Cursor`].
    pub fn into_reader(self) -> Pin<Box<dyn AsyncRead + Send + Sync>> {
        match self.0 {
            Streaming { async_read, .. } => async_read,
            Static { content, .. } => Box::pin(Cursor::new(content)),
            Empty => Box::pin(Cursor::new("")),
        }
    }
}

impl AsyncRead for Body {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<Result<usize>> {
        match &mut self.0 {
            Empty => Poll::Ready(Ok(0)),

            Static { content, cursor } => {
                let length = content.len();
                if length == *cursor {
                    return Poll::Ready(Ok(0));
                }
                let bytes = (length - *cursor).min(buf.len());
                buf[0..bytes].copy_from_slice(&content[*cursor..*cursor + bytes]);
                *cursor += bytes;
                Poll::Ready(Ok(bytes))
            }

            Streaming {
                async_read,
                len: Some(len),
                done,
                progress,
            } => {
                if *done {
                    return Poll::Ready(Ok(0));
                }

                let remaining = *len - *progress;
                if remaining == 0 {
                    // the source has to end exactly here; a file that
                    // grew after stat would otherwise be truncated
                    // without anyone noticing
                    let mut probe = [0; 1];
                    let bytes = ready!(async_read.as_mut().poll_read(cx, &mut probe))?;
                    *done = true;
                    return if bytes == 0 {
                        Poll::Ready(Ok(0))
                    } else {
                        Poll::Ready(Err(Error::new(
                            ErrorKind::InvalidData,
                            "body source continued past its declared length",
                        )))
                    };
                }

                let max_bytes_to_read = usize::try_from(remaining)
                    .unwrap_or(usize::MAX)
                    .min(buf.len());

                let bytes = ready!(async_read
                    .as_mut()
                    .poll_read(cx, &mut buf[..max_bytes_to_read]))?;

                if bytes == 0 {
                    *done = true;
                    return Poll::Ready(Err(Error::new(
                        ErrorKind::InvalidData,
                        "body source ended before its declared length",
                    )));
                }

                *progress += bytes as u64;
                Poll::Ready(Ok(bytes))
            }

            Streaming {
                async_read,
                len: None,
                done,
                progress,
            } => {
                if *done {
                    return Poll::Ready(Ok(0));
                }

                let bytes = ready!(async_read.as_mut().poll_read(cx, buf))?;

                if bytes == 0 {
                    *done = true;
                } else {
                    *progress += bytes as u64;
                }

                Poll::Ready(Ok(bytes))
            }
        }
    }
}

#[derive(Default)]
enum BodyType {
    #[default]
    Empty,

    Static {
        content: Cow<'static, [u8]>,
        cursor: usize,
    },

    Streaming {
        async_read: Pin<Box<dyn AsyncRead + Send + Sync + 'static>>,
        progress: u64,
        len: Option<u64>,
        done: bool,
    },
}

impl Debug for BodyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Empty => f.debug_tuple("BodyType::Empty").finish(),
            Static { content, cursor } => f
                .debug_struct("BodyType::Static")
                .field("content", &String::from_utf8_lossy(content))
                .field("cursor", cursor)
                .finish(),
            Streaming {
                len,
                done,
                progress,
                ..
            } => f
                .debug_struct("BodyType::Streaming")
                .field("async_read", &"..")
                .field("len", &len)
                .field("done", &done)
                .field("progress", &progress)
                .finish(),
        }
    }
}

impl From<String> for Body {
    fn from(s: String) -> Self {
        s.into_bytes().into()
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        s.as_bytes().into()
    }
}

impl From<&'static [u8]> for Body {
    fn from(content: &'static [u8]) -> Self {
        Self::new_static(content)
    }
}

impl From<Vec<u8>> for Body {
    fn from(content: Vec<u8>) -> Self {
        Self::new_static(content)
    }
}

impl From<Cow<'static, [u8]>> for Body {
    fn from(value: Cow<'static, [u8]>) -> Self {
        Self::new_static(value)
    }
}

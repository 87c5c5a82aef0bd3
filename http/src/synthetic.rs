use crate::{
    received_body::ReceivedBodyState, Conn, Headers, HttpConfig,
    KnownHeaderName::{ContentLength, Server},
    Method, ReceiveBuffer, Version,
};
use futures_lite::io::{AsyncRead, AsyncWrite, Cursor, Result};
use std::{
    pin::Pin,
    task::{Context, Poll},
};

/// Synthetic represents a simple transport that contains fixed content.
/// This is exclusively useful for testing, in which the entire request
/// body may be available immediately.
#[derive(Debug)]
pub struct Synthetic {
    data: Cursor<Vec<u8>>,
    closed: bool,
}

impl AsyncRead for Synthetic {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<Result<usize>> {
        let Synthetic { data, closed } = &mut *self;
        if *closed {
            Poll::Ready(Ok(0))
        } else {
            match Pin::new(data).poll_read(cx, buf) {
                Poll::Ready(Ok(0)) => Poll::Pending,
                other => other,
            }
        }
    }
}

impl Synthetic {
    /// the length of this synthetic transport's content
    pub fn len(&self) -> usize {
        self.data.get_ref().len()
    }

    /// predicate to determine if this synthetic contains no content
    pub fn is_empty(&self) -> bool {
        self.data.get_ref().is_empty()
    }

    /// close this connection; subsequent reads report a clean end of
    /// stream instead of pending
    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl AsyncWrite for Synthetic {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, _buf: &[u8]) -> Poll<Result<usize>> {
        Poll::Ready(Ok(0))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl From<Cursor<Vec<u8>>> for Synthetic {
    fn from(data: Cursor<Vec<u8>>) -> Self {
        Self {
            data,
            closed: false,
        }
    }
}

impl From<Vec<u8>> for Synthetic {
    fn from(v: Vec<u8>) -> Self {
        Cursor::new(v).into()
    }
}

impl From<&[u8]> for Synthetic {
    fn from(v: &[u8]) -> Self {
        v.to_owned().into()
    }
}

impl From<&str> for Synthetic {
    fn from(v: &str) -> Self {
        v.as_bytes().into()
    }
}

impl From<String> for Synthetic {
    fn from(v: String) -> Self {
        v.into_bytes().into()
    }
}

impl From<()> for Synthetic {
    fn from((): ()) -> Self {
        Vec::new().into()
    }
}

impl Conn<Synthetic> {
    /// Construct a conn as if its request head had just been parsed off a
    /// transport, with the provided content as its fixed-length request
    /// body. Useful for testing handlers without a server.
    pub fn new_synthetic(
        method: Method,
        path: impl Into<String>,
        body: impl Into<Synthetic>,
    ) -> Self {
        let transport = body.into();
        let content_length = transport.len() as u64;

        let mut request_headers = Headers::new();
        request_headers.insert(ContentLength, content_length);

        let mut response_headers = Headers::new();
        response_headers.insert(Server, crate::conn::SERVER);

        Self {
            request_headers,
            response_headers,
            path: path.into(),
            method,
            status: None,
            version: Version::Http1_1,
            response_body: None,
            transport,
            buffer: ReceiveBuffer::default(),
            request_body_state: ReceivedBodyState::Start,
            content_length: Some(content_length),
            chunked: false,
            http_config: HttpConfig::default(),
        }
    }
}

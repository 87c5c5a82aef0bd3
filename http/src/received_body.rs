use crate::{Error, HttpConfig, ReceiveBuffer};
use futures_lite::{ready, AsyncRead, AsyncReadExt};
use std::{
    fmt::{self, Debug, Formatter},
    io::{self, ErrorKind},
    pin::Pin,
    task::{Context, Poll},
};
use Poll::{Pending, Ready};
use ReceivedBodyState::{Chunked, End, FixedLength, PartialChunkSize, Start, UntilClose};

mod chunked;

/// A received http request body
///
/// This type represents a body that will be read from the underlying
/// transport. It borrows the transport, the receive buffer, and the body
/// state from the [`Conn`][crate::Conn] it came from, so the conn regains
/// exclusive use of all three once the body is dropped or read to
/// completion.
///
/// The body is a pull source: bytes are only taken from the transport
/// when this is read, and reads are strictly sequential. Once the body
/// reaches its end, every subsequent read returns zero bytes.
pub struct ReceivedBody<'conn, Transport> {
    content_length: Option<u64>,
    chunked: bool,
    buffer: &'conn mut ReceiveBuffer,
    transport: &'conn mut Transport,
    state: &'conn mut ReceivedBodyState,
    max_len: u64,
    initial_len: usize,
    copy_buffer_len: usize,
    copy_loops_per_yield: usize,
    max_preallocate: usize,
}

fn slice_from(min: u64, buf: &[u8]) -> Option<&[u8]> {
    buf.get(usize::try_from(min).unwrap_or(usize::MAX)..)
        .filter(|buf| !buf.is_empty())
}

impl<'conn, Transport> ReceivedBody<'conn, Transport>
where
    Transport: AsyncRead + Unpin,
{
    pub(crate) fn new(
        content_length: Option<u64>,
        chunked: bool,
        buffer: &'conn mut ReceiveBuffer,
        transport: &'conn mut Transport,
        state: &'conn mut ReceivedBodyState,
        config: &HttpConfig,
    ) -> Self {
        Self {
            content_length,
            chunked,
            buffer,
            transport,
            state,
            max_len: config.received_body_max_len,
            initial_len: config.received_body_initial_len,
            copy_buffer_len: config.copy_buffer_len,
            copy_loops_per_yield: config.copy_loops_per_yield,
            max_preallocate: config.received_body_max_preallocate,
        }
    }

    /// Returns the content-length of this body, if it was declared by a
    /// `Content-Length` header. Chunked and read-until-close bodies have
    /// no known length and return None.
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Set the maximum length that can be read from this body before error
    pub fn set_max_len(&mut self, max_len: u64) {
        self.max_len = max_len;
    }

    /// chainable setter for the maximum length that can be read from this body before error
    #[must_use]
    pub fn with_max_len(mut self, max_len: u64) -> Self {
        self.set_max_len(max_len);
        self
    }

    /// # Reads the entire body to `Vec<u8>`.
    ///
    /// This can only be performed once per request, as the underlying
    /// data is not cached anywhere; this is the only copy of the body
    /// contents.
    ///
    /// # Errors
    ///
    /// This will return an error if there is an IO error on the
    /// underlying transport, such as a disconnect, or if the length
    /// exceeds the maximum length, which can be adjusted with
    /// [`ReceivedBody::with_max_len`].
    pub async fn read_bytes(mut self) -> crate::Result<Vec<u8>> {
        let mut vec = if let Some(len) = self.content_length {
            if len > self.max_len {
                return Err(Error::ReceivedBodyTooLong(self.max_len));
            }

            let len = usize::try_from(len).map_err(|_| Error::ReceivedBodyTooLong(self.max_len))?;

            Vec::with_capacity(len.min(self.max_preallocate))
        } else {
            Vec::with_capacity(self.initial_len)
        };

        let max_len = self.max_len;
        self.read_to_end(&mut vec).await?;

        if vec.len() as u64 > max_len {
            return Err(Error::ReceivedBodyTooLong(max_len));
        }
        Ok(vec)
    }

    /// # Reads the entire body to `String`, requiring utf8 content.
    ///
    /// # Errors
    ///
    /// In addition to the error conditions of
    /// [`ReceivedBody::read_bytes`], this errors on invalid utf8.
    pub async fn read_string(self) -> crate::Result<String> {
        let bytes = self.read_bytes().await?;
        String::from_utf8(bytes).map_err(|e| Error::EncodingError(e.utf8_error()))
    }

    /// Consumes the remainder of this body from the underlying transport
    /// by reading it to the end and discarding the contents. This aligns
    /// the receive buffer on the next request for http1.1 keepalive, but
    /// most of the time you do not need to call this directly. It returns
    /// the number of bytes consumed.
    ///
    /// # Errors
    ///
    /// This will return an [`std::io::Result::Err`] if there is an io
    /// error on the underlying transport, such as a disconnect
    pub async fn drain(mut self) -> io::Result<u64> {
        let mut scratch = vec![0; self.copy_buffer_len];
        let mut drained = 0u64;
        loop {
            match self.read(&mut scratch).await? {
                0 => return Ok(drained),
                bytes => drained += bytes as u64,
            }
        }
    }

    fn read_raw(&mut self, cx: &mut Context<'_>, buf: &mut [u8]) -> Poll<io::Result<usize>> {
        read_buffered(self.buffer, self.transport, cx, buf)
    }

    #[inline]
    fn handle_start(&mut self) -> StateOutput {
        Ready(Ok((
            match (self.content_length, self.chunked) {
                (_, true) => Chunked {
                    remaining: 0,
                    total: 0,
                },

                (Some(0), _) => End,

                (Some(total_length), _) if total_length < self.max_len => FixedLength {
                    current_index: 0,
                    total: total_length,
                },

                (Some(_), _) => {
                    return Ready(Err(io::Error::new(
                        ErrorKind::Unsupported,
                        "content too long",
                    )));
                }

                (None, false) => UntilClose,
            },
            0,
        )))
    }

    #[inline]
    fn handle_fixed_length(
        &mut self,
        cx: &mut Context<'_>,
        buf: &mut [u8],
        current_index: u64,
        total: u64,
    ) -> StateOutput {
        let remaining = usize::try_from(total - current_index).unwrap_or(usize::MAX);
        let max = remaining.min(buf.len());
        let bytes = ready!(self.read_raw(cx, &mut buf[..max]))?;

        if bytes == 0 {
            return Ready(Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                "disconnect mid-body",
            )));
        }

        let current_index = current_index + bytes as u64;
        Ready(Ok((
            if current_index == total {
                End
            } else {
                FixedLength {
                    current_index,
                    total,
                }
            },
            bytes,
        )))
    }

    #[inline]
    fn handle_until_close(&mut self, cx: &mut Context<'_>, buf: &mut [u8]) -> StateOutput {
        let bytes = ready!(self.read_raw(cx, buf))?;
        Ready(Ok(if bytes == 0 {
            (End, 0)
        } else {
            (UntilClose, bytes)
        }))
    }
}

/// Serve bytes out of the receive buffer before pulling more from the
/// transport. This is the single point through which body readers consume
/// connection bytes, so buffered pipelined data is always drained first.
/// When the buffer only partly fills `buf`, the transport is polled once
/// for the rest, but whatever the buffer held is delivered regardless of
/// what that poll returns.
pub(crate) fn read_buffered<Transport>(
    buffer: &mut ReceiveBuffer,
    transport: &mut Transport,
    cx: &mut Context<'_>,
    buf: &mut [u8],
) -> Poll<io::Result<usize>>
where
    Transport: AsyncRead + Unpin,
{
    if buffer.is_empty() {
        return Pin::new(transport).poll_read(cx, buf);
    }

    let bytes = buffer.len().min(buf.len());
    buf[..bytes].copy_from_slice(&buffer.filled()[..bytes]);
    buffer.consume(bytes);

    if bytes == buf.len() {
        return Ready(Ok(bytes));
    }

    match Pin::new(transport).poll_read(cx, &mut buf[bytes..]) {
        Ready(Ok(additional)) => Ready(Ok(additional + bytes)),
        Pending => Ready(Ok(bytes)),
        error @ Ready(_) => error,
    }
}

type StateOutput = Poll<io::Result<(ReceivedBodyState, usize)>>;

impl<'conn, Transport> AsyncRead for ReceivedBody<'conn, Transport>
where
    Transport: AsyncRead + Unpin,
{
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        for _ in 0..self.copy_loops_per_yield {
            let (new_body_state, bytes) = ready!(match *self.state {
                Start => self.handle_start(),
                Chunked { remaining, total } => self.handle_chunked(cx, buf, remaining, total),
                PartialChunkSize { total } => self.handle_partial(cx, buf, total),
                FixedLength {
                    current_index,
                    total,
                } => self.handle_fixed_length(cx, buf, current_index, total),
                UntilClose => self.handle_until_close(cx, buf),
                End => Ready(Ok((End, 0))),
            })?;

            *self.state = new_body_state;

            if *self.state == End || bytes != 0 {
                return Ready(Ok(bytes));
            }
        }

        cx.waker().wake_by_ref();
        Pending
    }
}

impl<'conn, Transport> Debug for ReceivedBody<'conn, Transport> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReceivedBody")
            .field("state", &*self.state)
            .field("content_length", &self.content_length)
            .field("chunked", &self.chunked)
            .field("buffer", &"..")
            .finish()
    }
}

/// Where a request body is in its progression from the wire to end of
/// stream.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
#[doc(hidden)]
pub enum ReceivedBodyState {
    /// initial state
    #[default]
    Start,

    /// read state for a chunked-encoded body. the number of bytes that
    /// have been read from the current chunk is the difference between
    /// remaining and total.
    Chunked {
        /// remaining indicates the bytes left _in the current chunk_,
        /// plus the chunk's trailing crlf. initial state is zero.
        remaining: u64,

        /// total indicates the absolute number of bytes read from all
        /// chunks
        total: u64,
    },

    /// a chunk size line was cut off mid-read; bytes of it are
    /// accumulating in the receive buffer
    PartialChunkSize {
        /// the absolute number of bytes read from all chunks
        total: u64,
    },

    /// read state for a fixed-length body.
    FixedLength {
        /// the bytes that have already been read. initial state is zero
        current_index: u64,

        /// the declared length, from the content-length header
        total: u64,
    },

    /// read state for a body with neither a declared length nor chunked
    /// framing; it ends when the peer closes the connection
    UntilClose,

    /// the terminal read state
    End,
}

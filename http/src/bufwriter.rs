use futures_lite::{ready, AsyncWrite};
use std::{
    fmt,
    io::{Error, ErrorKind, Result},
    pin::Pin,
    task::{Context, Poll},
};

/// Write-side buffering for response transmission.
///
/// Constructed around the already-serialized header bytes so that small
/// response bodies coalesce with the head into a single transport write.
/// Writes that fit in the remaining capacity are buffered; anything larger
/// flushes the buffer and goes to the transport directly.
pub(crate) struct BufWriter<W> {
    inner: W,
    buffer: Vec<u8>,
    written_to_inner: usize,
}

impl<W: AsyncWrite + Unpin> BufWriter<W> {
    pub(crate) fn new_with_buffer(buffer: Vec<u8>, inner: W) -> Self {
        Self {
            inner,
            buffer,
            written_to_inner: 0,
        }
    }

    fn poll_flush_buf(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        let Self {
            inner,
            buffer,
            written_to_inner,
        } = &mut *self;

        while *written_to_inner < buffer.len() {
            match ready!(Pin::new(&mut *inner).poll_write(cx, &buffer[*written_to_inner..])) {
                Ok(0) => {
                    return Poll::Ready(Err(Error::new(
                        ErrorKind::WriteZero,
                        "failed to write buffered data",
                    )));
                }
                Ok(n) => *written_to_inner += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Poll::Ready(Err(e)),
            }
        }

        buffer.clear();
        *written_to_inner = 0;
        Poll::Ready(Ok(()))
    }
}

impl<W: fmt::Debug> fmt::Debug for BufWriter<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufWriter")
            .field("writer", &self.inner)
            .field("buffered", &self.buffer.len())
            .field("written", &self.written_to_inner)
            .finish()
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for BufWriter<W> {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<Result<usize>> {
        if self.buffer.len() + buf.len() <= self.buffer.capacity() {
            self.buffer.extend_from_slice(buf);
            return Poll::Ready(Ok(buf.len()));
        }

        ready!(self.as_mut().poll_flush_buf(cx))?;

        if buf.len() >= self.buffer.capacity() {
            Pin::new(&mut self.inner).poll_write(cx, buf)
        } else {
            self.buffer.extend_from_slice(buf);
            Poll::Ready(Ok(buf.len()))
        }
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        ready!(self.as_mut().poll_flush_buf(cx))?;
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<()>> {
        ready!(self.as_mut().poll_flush_buf(cx))?;
        Pin::new(&mut self.inner).poll_close(cx)
    }
}

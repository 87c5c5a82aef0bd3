use futures_lite::{ready, AsyncRead};
use std::{
    io::Result,
    pin::Pin,
    task::{Context, Poll},
};

/// An encoder for chunked transfer encoding.
///
/// Every read from the inner source becomes one frame, assembled in place
/// in the caller's buffer: hexadecimal size, crlf, the data, crlf. When
/// the source reports end of stream, the terminating `0\r\n\r\n` frame is
/// produced instead, after which this encoder reports end of stream
/// itself.
#[derive(Debug)]
pub struct ChunkedEncoder<R> {
    reader: R,
    done: bool,
}

impl<R: Unpin + AsyncRead> ChunkedEncoder<R> {
    /// Create a new instance.
    pub(crate) fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }
}

const TERMINATOR: &[u8] = b"0\r\n\r\n";

/// the number of hex digits needed to print `n`
fn hex_width(n: usize) -> usize {
    match n.checked_ilog2() {
        Some(bits) => bits as usize / 4 + 1,
        None => 1,
    }
}

/// How much payload a frame assembled in `buf_len` bytes can carry once
/// the size line and both crlfs are accounted for. Sized from the hex
/// width of the whole buffer, which is never smaller than the hex width
/// of the payload that ends up in the frame.
fn max_payload(buf_len: usize) -> usize {
    assert!(
        buf_len > TERMINATOR.len(),
        "chunked framing needs read buffers of more than {} bytes, got {buf_len}",
        TERMINATOR.len()
    );

    buf_len - hex_width(buf_len) - 4
}

impl<R: Unpin + AsyncRead> AsyncRead for ChunkedEncoder<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<Result<usize>> {
        if self.done {
            return Poll::Ready(Ok(0));
        }

        let payload_max = max_payload(buf.len());
        let bytes = ready!(Pin::new(&mut self.reader).poll_read(cx, &mut buf[..payload_max]))?;

        if bytes == 0 {
            self.done = true;
            buf[..TERMINATOR.len()].copy_from_slice(TERMINATOR);
            return Poll::Ready(Ok(TERMINATOR.len()));
        }

        let size_line = format!("{bytes:X}\r\n");
        let frame_len = size_line.len() + bytes + 2;
        buf.copy_within(..bytes, size_line.len());
        buf[..size_line.len()].copy_from_slice(size_line.as_bytes());
        buf[frame_len - 2..frame_len].copy_from_slice(b"\r\n");
        Poll::Ready(Ok(frame_len))
    }
}

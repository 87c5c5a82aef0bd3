use super::{
    slice_from, Chunked, End, PartialChunkSize, ReceivedBody, ReceivedBodyState, StateOutput,
};
use crate::ReceiveBuffer;
use futures_lite::{ready, AsyncRead};
use std::{
    io::{self, ErrorKind, ErrorKind::InvalidData},
    pin::Pin,
    task::{Context, Poll::Ready},
};

/// Locate and decode one chunk-size line at the front of `buf`.
///
/// Returns the number of framing bytes consumed and the chunk length
/// *including* its two trailing crlf bytes, `None` when the line is not
/// yet complete, and an error for anything that does not parse as a
/// hexadecimal chunk size. Chunk extensions are tolerated and discarded.
fn parse_chunk_size(buf: &[u8]) -> Result<Option<(usize, u64)>, ()> {
    match httparse::parse_chunk_size(buf) {
        Ok(httparse::Status::Complete((framing_bytes, chunk_size))) => chunk_size
            .checked_add(2)
            .map(|framed| (framing_bytes, framed))
            .map(Some)
            .ok_or(()),
        Ok(httparse::Status::Partial) => Ok(None),
        Err(_) => Err(()),
    }
}

impl<'conn, Transport> ReceivedBody<'conn, Transport>
where
    Transport: AsyncRead + Unpin,
{
    #[inline]
    pub(super) fn handle_chunked(
        &mut self,
        cx: &mut Context<'_>,
        buf: &mut [u8],
        remaining: u64,
        total: u64,
    ) -> StateOutput {
        let bytes = ready!(self.read_raw(cx, buf)?);

        Ready(chunk_decode(
            self.buffer,
            remaining,
            total,
            &mut buf[..bytes],
            self.max_len,
        ))
    }

    #[inline]
    pub(super) fn handle_partial(
        &mut self,
        cx: &mut Context<'_>,
        buf: &mut [u8],
        total: u64,
    ) -> StateOutput {
        let bytes = ready!(Pin::new(&mut *self.transport).poll_read(cx, buf))?;

        if bytes == 0 {
            return Ready(Err(io::Error::from(ErrorKind::ConnectionAborted)));
        }

        self.buffer.push(&buf[..bytes]);

        Ready(match parse_chunk_size(self.buffer.filled()) {
            Ok(Some((used, remaining))) => {
                self.buffer.consume(used);
                if remaining == 2 {
                    Ok((End, 0))
                } else {
                    Ok((Chunked { remaining, total }, 0))
                }
            }
            Ok(None) => Ok((PartialChunkSize { total }, 0)),
            Err(()) => Err(io::Error::new(InvalidData, "invalid chunk size")),
        })
    }
}

/// Decode as much chunked framing as `buf` holds.
///
/// `buf` contains raw wire bytes on entry; on exit its prefix holds the
/// decoded chunk data, compacted in place, and the return value carries
/// the next body state along with the decoded byte count. Bytes that
/// belong to the next request (after the terminating zero chunk) and
/// incomplete size lines are pushed back into the receive buffer.
pub(super) fn chunk_decode(
    receive_buffer: &mut ReceiveBuffer,
    remaining: u64,
    mut total: u64,
    buf: &mut [u8],
    max_len: u64,
) -> io::Result<(ReceivedBodyState, usize)> {
    if buf.is_empty() {
        return Err(io::Error::from(ErrorKind::ConnectionAborted));
    }
    let mut ranges_to_keep = vec![];
    let mut chunk_start = 0u64;
    let mut chunk_end = remaining;
    let request_body_state = loop {
        if chunk_end > 2 {
            let keep_start = usize::try_from(chunk_start).unwrap_or(usize::MAX);
            let keep_end = buf
                .len()
                .min(usize::try_from(chunk_end - 2).unwrap_or(usize::MAX));
            ranges_to_keep.push(keep_start..keep_end);
            let new_bytes = (keep_end - keep_start) as u64;
            total += new_bytes;
            if total > max_len {
                return Err(io::Error::new(ErrorKind::Unsupported, "content too long"));
            }
        }
        chunk_start = chunk_end;

        let Some(buf_to_read) = slice_from(chunk_start, buf) else {
            break Chunked {
                remaining: (chunk_start - buf.len() as u64),
                total,
            };
        };

        match parse_chunk_size(buf_to_read) {
            Ok(Some((framing_bytes, chunk_size))) => {
                chunk_start += framing_bytes as u64;
                chunk_end = chunk_start
                    .checked_add(chunk_size)
                    .ok_or_else(|| io::Error::new(InvalidData, "chunk size too long"))?;

                if chunk_size == 2 {
                    if let Some(overflow) = slice_from(chunk_end, buf) {
                        receive_buffer.push(overflow);
                    }
                    break End;
                }
            }

            Ok(None) => {
                receive_buffer.push(buf_to_read);
                break PartialChunkSize { total };
            }

            Err(()) => {
                return Err(io::Error::new(InvalidData, "invalid chunk size"));
            }
        }
    };

    let mut bytes = 0;

    for range_to_keep in ranges_to_keep {
        let new_bytes = bytes + range_to_keep.end - range_to_keep.start;
        buf.copy_within(range_to_keep, bytes);
        bytes = new_bytes;
    }

    Ok((request_body_state, bytes))
}

#[cfg(test)]
mod tests {
    use super::{chunk_decode, ReceivedBody, ReceivedBodyState};
    use crate::{http_config::DEFAULT_CONFIG, HttpConfig, ReceiveBuffer};
    use futures_lite::{future::block_on, io::Cursor, AsyncRead, AsyncReadExt};

    #[track_caller]
    fn assert_decoded(
        (remaining, input_data): (u64, &str),
        expected_output: (Option<u64>, &str, &str),
    ) {
        let mut buf = input_data.to_string().into_bytes();
        let mut receive_buffer = ReceiveBuffer::with_capacity(100);

        let (output_state, bytes) = chunk_decode(
            &mut receive_buffer,
            remaining,
            0,
            &mut buf,
            DEFAULT_CONFIG.received_body_max_len,
        )
        .unwrap();

        assert_eq!(
            (
                match output_state {
                    ReceivedBodyState::Chunked { remaining, .. } => Some(remaining),
                    ReceivedBodyState::PartialChunkSize { .. } => Some(0),
                    ReceivedBodyState::End => None,
                    _ => panic!("unexpected output state {output_state:?}"),
                },
                &*String::from_utf8_lossy(&buf[0..bytes]),
                &*String::from_utf8_lossy(receive_buffer.filled())
            ),
            expected_output
        );
    }

    async fn read_with_buffers_of_size<R>(reader: &mut R, size: usize) -> crate::Result<String>
    where
        R: AsyncRead + Unpin,
    {
        let mut return_buffer = vec![];
        loop {
            let mut buf = vec![0; size];
            match reader.read(&mut buf).await? {
                0 => break Ok(String::from_utf8_lossy(&return_buffer).into()),
                bytes_read => return_buffer.extend_from_slice(&buf[..bytes_read]),
            }
        }
    }

    async fn decode_with_config(
        input: String,
        poll_size: usize,
        config: &HttpConfig,
    ) -> crate::Result<String> {
        let mut buffer = ReceiveBuffer::with_capacity(100);
        let mut transport = Cursor::new(input.into_bytes());
        let mut state = ReceivedBodyState::Start;
        let mut rb = ReceivedBody::new(
            None,
            true,
            &mut buffer,
            &mut transport,
            &mut state,
            config,
        );
        read_with_buffers_of_size(&mut rb, poll_size).await
    }

    async fn decode(input: String, poll_size: usize) -> crate::Result<String> {
        decode_with_config(input, poll_size, &DEFAULT_CONFIG).await
    }

    #[test]
    fn test_full_decode() {
        block_on(async {
            for size in 1..50 {
                let input = "5\r\n12345\r\n1\r\na\r\n2\r\nbc\r\n3\r\ndef\r\n0\r\n";
                let output = decode(input.into(), size).await.unwrap();
                assert_eq!(output, "12345abcdef", "size: {size}");

                let input = "7\r\nMozilla\r\n9\r\nDeveloper\r\n7\r\nNetwork\r\n0\r\n\r\n";
                let output = decode(input.into(), size).await.unwrap();
                assert_eq!(output, "MozillaDeveloperNetwork", "size: {size}");

                assert!(decode(String::new(), size).await.is_err());
                assert!(decode("fffffffffffffff0\r\n".into(), size).await.is_err());
            }
        });
    }

    #[test]
    fn test_chunk_start() {
        assert_decoded((0, "5\r\n12345\r\n"), (Some(0), "12345", ""));
        assert_decoded((0, "F\r\n1"), (Some(14 + 2), "1", ""));
        assert_decoded((0, "5\r\n123"), (Some(2 + 2), "123", ""));
        assert_decoded((0, "1\r\nX\r\n1\r\nX\r\n"), (Some(0), "XX", ""));
        assert_decoded((0, "1\r\nX\r\n1\r\nX\r\n1"), (Some(0), "XX", "1"));
        assert_decoded((0, "FFF\r\n"), (Some(0xfff + 2), "", ""));
        assert_decoded((10, "hello"), (Some(5), "hello", ""));
        assert_decoded(
            (7, "hello\r\nA\r\n world"),
            (Some(4 + 2), "hello world", ""),
        );
        assert_decoded(
            (0, "e\r\ntest test test\r\n0\r\n\r\n"),
            (None, "test test test", ""),
        );
        assert_decoded(
            (0, "1\r\n_\r\n0\r\n\r\nnext request"),
            (None, "_", "next request"),
        );
        assert_decoded((7, "hello\r\n0\r\n\r\n"), (None, "hello", ""));
    }

    #[test]
    fn test_chunk_start_with_extensions() {
        assert_decoded((0, "5;abcdefg\r\n12345\r\n"), (Some(0), "12345", ""));
        assert_decoded((0, "F;aaa\taaaaa\taaa aaa\r\n1"), (Some(14 + 2), "1", ""));
        assert_decoded(
            (0, "1;   a = b\"\" \r\nX\r\n1;;;\r\nX\r\n"),
            (Some(0), "XX", ""),
        );
        assert_decoded((0, "FFF; 000\r\n"), (Some(0xfff + 2), "", ""));
        assert_decoded(
            (0, "e\r\ntest test test\r\n0;00\r\n\r\n"),
            (None, "test test test", ""),
        );
        assert_decoded((7, "hello\r\n0;\r\n\r\n"), (None, "hello", ""));
    }

    #[test]
    fn test_max_len() {
        block_on(async {
            let input = "14\r\ntest test test test \r\n0\r\n\r\n";

            for size in 4..10 {
                assert!(decode_with_config(
                    input.into(),
                    size,
                    &HttpConfig::default().with_received_body_max_len(5)
                )
                .await
                .is_err());

                assert!(
                    decode_with_config(input.into(), size, &HttpConfig::default())
                        .await
                        .is_ok()
                );
            }
        });
    }
}

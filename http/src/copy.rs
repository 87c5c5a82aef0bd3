use futures_lite::{future, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use std::io::Result;

/// Pump `reader` into `writer` through a scratch buffer of `buffer_len`
/// bytes until the reader reports end of stream, then flush the writer.
/// Yields back to the runtime every `yield_after` reads so one large
/// response cannot monopolize its task.
///
/// # Errors
///
/// This returns any io error encountered in reading or writing
pub(crate) async fn copy<R, W>(
    mut reader: R,
    mut writer: W,
    buffer_len: usize,
    yield_after: usize,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut scratch = vec![0; buffer_len];
    let mut written = 0u64;
    let mut reads = 0usize;

    loop {
        let bytes = reader.read(&mut scratch).await?;
        if bytes == 0 {
            writer.flush().await?;
            return Ok(written);
        }

        writer.write_all(&scratch[..bytes]).await?;
        written += bytes as u64;

        reads += 1;
        if yield_after != 0 && reads % yield_after == 0 {
            future::yield_now().await;
        }
    }
}

//! Module `file_ops`
//!
//! Chunked byte pumps between files and data connections.

use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Copies `reader` to `writer` in `buffer_size` chunks until end of stream.
///
/// Returns the number of bytes copied. Nothing is rolled back on error;
/// whatever was written stays written.
pub async fn copy_in_chunks<R, W>(
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
) -> io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; buffer_size.max(1)];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buffer).await?;
        if n == 0 {
            break;
        }
        writer.write_all(&buffer[..n]).await?;
        total += n as u64;
    }

    writer.flush().await?;
    Ok(total)
}

/// Writes `data` in `buffer_size` chunks.
pub async fn send_in_chunks<W>(writer: &mut W, data: &[u8], buffer_size: usize) -> io::Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    for chunk in data.chunks(buffer_size.max(1)) {
        writer.write_all(chunk).await?;
    }
    writer.flush().await?;
    Ok(data.len() as u64)
}

//! Control channel framing
//!
//! Reads CRLF-terminated command lines with a length cap and writes
//! single-line replies.

use log::debug;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::TransportError;
use crate::protocol::Reply;

/// A line-oriented wrapper over the (TLS) control stream.
pub struct ControlConnection<S> {
    stream: BufReader<S>,
    max_line: usize,
}

impl<S> ControlConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// `max_line` bounds a line's length, not counting the CRLF.
    pub fn new(stream: S, max_line: usize) -> Self {
        Self {
            stream: BufReader::new(stream),
            max_line,
        }
    }

    /// Reads the next line without its terminator.
    ///
    /// Returns `Ok(None)` at end of stream. An overlong line is consumed
    /// up to its newline and reported as [`TransportError::LineTooLong`],
    /// leaving the connection usable.
    pub async fn read_line(&mut self) -> Result<Option<String>, TransportError> {
        let limit = self.max_line as u64 + 2;
        let mut buf = Vec::new();
        let n = (&mut self.stream)
            .take(limit)
            .read_until(b'\n', &mut buf)
            .await?;
        if n == 0 {
            return Ok(None);
        }

        if !buf.ends_with(b"\n") && n as u64 == limit {
            self.discard_rest_of_line(limit).await?;
            return Err(TransportError::LineTooLong(self.max_line));
        }

        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        if buf.len() > self.max_line {
            return Err(TransportError::LineTooLong(self.max_line));
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }

    async fn discard_rest_of_line(&mut self, chunk: u64) -> Result<(), TransportError> {
        let mut scratch = Vec::new();
        loop {
            scratch.clear();
            let n = (&mut self.stream)
                .take(chunk)
                .read_until(b'\n', &mut scratch)
                .await?;
            if n == 0 || scratch.ends_with(b"\n") {
                debug!("Discarded remainder of an overlong line");
                return Ok(());
            }
        }
    }

    pub async fn send(&mut self, reply: &Reply) -> Result<(), TransportError> {
        self.send_raw(&reply.to_wire()).await
    }

    /// Writes `text` as is and flushes.
    pub async fn send_raw(&mut self, text: &str) -> Result<(), TransportError> {
        self.stream.write_all(text.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

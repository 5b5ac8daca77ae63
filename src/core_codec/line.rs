//! CRLF line framing for the control connection.

use crate::constants::MAX_LINE_LENGTH;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

#[derive(Error, Debug)]
pub enum LineError {
    /// The peer sent more than [`MAX_LINE_LENGTH`] bytes without a CRLF.
    #[error("control line exceeds {MAX_LINE_LENGTH} bytes")]
    TooLong,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reads one CRLF-terminated line and returns its payload without the CRLF.
///
/// `Ok(None)` means the stream ended before a full line arrived; partial
/// data is discarded. Callers should wrap the stream in a `BufReader` --
/// bytes are consumed one at a time so the terminator is never overshot.
pub async fn read_line<R>(reader: &mut R) -> Result<Option<String>, LineError>
where
    R: AsyncRead + Unpin,
{
    let mut buffer: Vec<u8> = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte).await?;
        if n == 0 {
            return Ok(None);
        }
        buffer.push(byte[0]);
        if buffer.ends_with(b"\r\n") {
            buffer.truncate(buffer.len() - 2);
            return Ok(Some(String::from_utf8_lossy(&buffer).into_owned()));
        }
        if buffer.len() > MAX_LINE_LENGTH {
            return Err(LineError::TooLong);
        }
    }
}

/// Writes `line` followed by exactly one CRLF and flushes.
pub async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await
}

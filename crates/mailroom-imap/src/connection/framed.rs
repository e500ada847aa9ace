//! Framed I/O for IMAP protocol.
//!
//! IMAP uses CRLF-terminated lines with support for literals.
//! This module provides buffered reading and writing with proper
//! handling of the IMAP framing.

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum line length to prevent memory exhaustion.
const MAX_LINE_LENGTH: usize = 1024 * 1024;

/// Maximum literal size to prevent memory exhaustion.
const MAX_LITERAL_SIZE: usize = 100 * 1024 * 1024;

/// Framed connection for IMAP protocol.
///
/// Owns the receive buffer. Everything it returns is an owned copy of fully
/// received bytes.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    write_buffer: BytesMut,
}

impl<S> std::fmt::Debug for FramedStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FramedStream")
            .field("pending_write", &self.write_buffer.len())
            .finish_non_exhaustive()
    }
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(DEFAULT_BUFFER_SIZE, stream),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
        }
    }

    /// Reads one CRLF-terminated line and returns it without the CRLF.
    ///
    /// # Errors
    ///
    /// [`Error::Closed`] if the peer closes the connection before the line is
    /// complete, [`Error::Protocol`] for a line over 1 MiB, and
    /// [`Error::Io`] for transport failures.
    pub async fn read_line(&mut self) -> Result<Vec<u8>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                return Err(Error::Closed);
            }

            // A CR ending the previous chunk pairs with an LF starting this one.
            if line.last() == Some(&b'\r') && buf[0] == b'\n' {
                line.pop();
                self.reader.consume(1);
                return Ok(line);
            }

            if let Some(pos) = find_crlf(buf) {
                line.extend_from_slice(&buf[..pos]);
                self.reader.consume(pos + 2);
                return Ok(line);
            }

            let len = buf.len();
            line.extend_from_slice(buf);
            self.reader.consume(len);

            if line.len() > MAX_LINE_LENGTH {
                return Err(Error::Protocol("line too long".to_string()));
            }
        }
    }

    /// Reads one response unit: a line, and while it ends in a literal
    /// announcement `{N}`, the N literal octets and the rest of the line.
    ///
    /// The unit is returned without its final CRLF; CRLFs inside it are
    /// kept.
    ///
    /// # Errors
    ///
    /// As [`FramedStream::read_line`], plus [`Error::Protocol`] for a literal
    /// over 100 MiB.
    pub async fn read_unit(&mut self) -> Result<Vec<u8>> {
        let mut unit = self.read_line().await?;

        while let Some(literal_len) = parse_literal_length(&unit) {
            if literal_len > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal too large: {literal_len} bytes (max {MAX_LITERAL_SIZE})"
                )));
            }
            unit.extend_from_slice(b"\r\n");
            let start = unit.len();
            unit.resize(start + literal_len, 0);
            self.reader
                .read_exact(&mut unit[start..])
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::UnexpectedEof => Error::Closed,
                    _ => Error::Io(e),
                })?;
            let rest = self.read_line().await?;
            unit.extend_from_slice(&rest);
        }

        Ok(unit)
    }

    /// Writes a command to the stream.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the write or flush fails.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        self.write_buffer.clear();
        self.write_buffer.extend_from_slice(data);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buffer).await?;
        stream.flush().await?;

        Ok(())
    }

    /// Writes raw data to the stream, such as a reply to a continuation.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the write or flush fails.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;

        Ok(())
    }

    /// Consumes the framed stream and returns the inner stream.
    ///
    /// Any buffered data is lost.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Finds the position of CRLF in a buffer.
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

/// Parses a literal length from the end of a line (CRLF already removed).
///
/// Matches `{123}` and the non-synchronizing `{123+}`.
fn parse_literal_length(line: &[u8]) -> Option<usize> {
    let body = line.strip_suffix(b"}")?;
    let body = body.strip_suffix(b"+").unwrap_or(body);
    let open = body.iter().rposition(|&b| b == b'{')?;
    let digits = &body[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use tokio_test::io::Builder;

    use super::*;

    #[test]
    fn test_find_crlf() {
        assert_eq!(find_crlf(b"hello\r\n"), Some(5));
        assert_eq!(find_crlf(b"\r\n"), Some(0));
        assert_eq!(find_crlf(b"no newline"), None);
        assert_eq!(find_crlf(b"just\n"), None);
        assert_eq!(find_crlf(b"just\r"), None);
    }

    #[test]
    fn test_parse_literal_length() {
        assert_eq!(parse_literal_length(b"BODY {123}"), Some(123));
        assert_eq!(parse_literal_length(b"BODY {123+}"), Some(123));
        assert_eq!(parse_literal_length(b"{0}"), Some(0));
        assert_eq!(parse_literal_length(b"{999999}"), Some(999_999));
        assert_eq!(parse_literal_length(b"no literal"), None);
        assert_eq!(parse_literal_length(b"incomplete {123"), None);
        assert_eq!(parse_literal_length(b"wrong {abc}"), None);
        assert_eq!(parse_literal_length(b"empty {}"), None);
        assert_eq!(parse_literal_length(b"sign {+}"), None);
    }

    #[tokio::test]
    async fn test_read_line_strips_crlf() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"* OK ready");
    }

    #[tokio::test]
    async fn test_read_line_across_chunks() {
        let mock = Builder::new()
            .read(b"* 3 EXI")
            .read(b"STS\r")
            .read(b"\nA1 OK done\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(framed.read_line().await.unwrap(), b"* 3 EXISTS");
        assert_eq!(framed.read_line().await.unwrap(), b"A1 OK done");
    }

    #[tokio::test]
    async fn test_eof_mid_line_is_closed() {
        let mock = Builder::new().read(b"* 3 EXI").build();
        let mut framed = FramedStream::new(mock);

        assert!(matches!(framed.read_line().await, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn test_eof_between_lines_is_closed() {
        let mock = Builder::new().read(b"* OK\r\n").build();
        let mut framed = FramedStream::new(mock);

        framed.read_line().await.unwrap();
        assert!(matches!(framed.read_line().await, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn test_read_unit_with_literal() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {5}\r\n")
            .read(b"hello)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(unit, b"* 1 FETCH (BODY[] {5}\r\nhello)");
    }

    #[tokio::test]
    async fn test_literal_containing_tag_like_line() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (RFC822 {22}\r\n")
            .read(b"A0 OK fake\r\nSubject:\r\n)\r\n")
            .read(b"A0 OK FETCH completed\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(unit, b"* 1 FETCH (RFC822 {22}\r\nA0 OK fake\r\nSubject:\r\n)");
        assert_eq!(framed.read_unit().await.unwrap(), b"A0 OK FETCH completed");
    }

    #[tokio::test]
    async fn test_several_literals_in_one_unit() {
        let mock = Builder::new()
            .read(b"* 2 FETCH (RFC822.HEADER {3}\r\nab\n RFC822.TEXT {0}\r\n)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        let unit = framed.read_unit().await.unwrap();
        assert_eq!(
            unit,
            b"* 2 FETCH (RFC822.HEADER {3}\r\nab\n RFC822.TEXT {0}\r\n)"
        );
    }

    #[tokio::test]
    async fn test_short_literal_is_closed() {
        let mock = Builder::new().read(b"* 1 FETCH (RFC822 {4}\r\n123").build();
        let mut framed = FramedStream::new(mock);

        assert!(matches!(framed.read_unit().await, Err(Error::Closed)));
    }

    #[tokio::test]
    async fn test_framed_write_command() {
        let mock = Builder::new().write(b"A0 CAPABILITY\r\n").build();
        let mut framed = FramedStream::new(mock);

        framed.write_command(b"A0 CAPABILITY\r\n").await.unwrap();
    }

    #[tokio::test]
    async fn test_literal_size_validation() {
        let literal_size = MAX_LITERAL_SIZE + 1;
        let header = format!("* 1 FETCH (BODY[] {{{literal_size}}}\r\n");

        let mock = Builder::new().read(header.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let result = framed.read_unit().await;
        assert!(result.unwrap_err().to_string().contains("literal too large"));
    }

    #[tokio::test]
    async fn test_line_length_limit() {
        let long_line = "A".repeat(MAX_LINE_LENGTH + 100);
        let mock = Builder::new().read(long_line.as_bytes()).build();
        let mut framed = FramedStream::new(mock);

        let result = framed.read_line().await;
        assert!(result.unwrap_err().to_string().contains("line too long"));
    }
}

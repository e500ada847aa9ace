//! Matches each command to the lines the server sends back for it.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::response::{ImapResponse, ResponseLine};
use crate::{Error, Result};

/// Sends tagged commands and collects their responses, one command at a time.
///
/// Methods take `&mut self`, so a second command cannot be issued while one
/// is in flight. Dropping a pending future abandons the command.
#[derive(Debug)]
pub struct Correlator<S> {
    stream: FramedStream<S>,
    tags: TagGenerator,
}

impl<S> Correlator<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps an open stream.
    pub fn new(stream: S, tag_prefix: char) -> Self {
        Self {
            stream: FramedStream::new(stream),
            tags: TagGenerator::new(tag_prefix),
        }
    }

    /// Allocates a tag and writes `<tag> <command>\r\n`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCommand`] if the command cannot be encoded, otherwise
    /// transport errors.
    pub async fn send(&mut self, command: &Command) -> Result<String> {
        let tag = self.tags.next();
        let bytes = command.serialize(&tag)?;
        debug!(tag = %tag, command = %command.redacted(), "sending command");
        self.stream.write_command(&bytes).await?;
        Ok(tag)
    }

    /// Reads the next response unit.
    ///
    /// # Errors
    ///
    /// Transport errors from [`FramedStream::read_unit`].
    pub async fn read_line(&mut self) -> Result<ResponseLine> {
        self.stream.read_unit().await.map(ResponseLine::new)
    }

    /// Writes bytes outside the command flow, such as a continuation reply.
    ///
    /// # Errors
    ///
    /// Transport errors.
    pub async fn write_raw(&mut self, data: &[u8]) -> Result<()> {
        self.stream.write_raw(data).await
    }

    /// Sends `command` and reads until its tagged completion line.
    ///
    /// The returned response may carry a NO or BAD completion; callers decide
    /// what that means.
    ///
    /// # Errors
    ///
    /// [`Error::Interrupted`] for a continuation request and
    /// [`Error::BadMessage`] for a line that is neither untagged nor tagged
    /// with this command's tag, besides send and transport errors.
    pub async fn execute(&mut self, command: &Command) -> Result<ImapResponse> {
        let tag = self.send(command).await?;
        let mut response = ImapResponse::new(tag);

        loop {
            let line = self.read_line().await?;
            if line.is_untagged() {
                response.lines.push(line);
            } else if line.is_continuation() {
                debug!(tag = %response.tag, "unexpected continuation request");
                return Err(Error::Interrupted);
            } else if line.is_tagged(&response.tag) {
                debug!(
                    tag = %response.tag,
                    lines = response.lines.len(),
                    status = ?line.status(),
                    "command completed"
                );
                response.lines.push(line);
                return Ok(response);
            } else {
                return Err(Error::BadMessage(line.text().into_owned()));
            }
        }
    }

    /// Consumes the correlator and returns the inner stream.
    pub fn into_inner(self) -> S {
        self.stream.into_inner()
    }
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
    use crate::command::{FetchCommand, FetchItem, FetchItems, SequenceSpec};
    use crate::types::Status;

    #[tokio::test]
    async fn test_execute_collects_until_tagged() {
        let mock = Builder::new()
            .write(b"A0 CAPABILITY\r\n")
            .read(b"* CAPABILITY IMAP4rev1 AUTH=XOAUTH2\r\n")
            .read(b"A0 OK Thats all she wrote!\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let response = correlator.execute(&Command::Capability).await.unwrap();
        assert_eq!(response.tag, "A0");
        assert_eq!(response.lines.len(), 2);
        assert_eq!(response.status(), Some(Status::Ok));
    }

    #[tokio::test]
    async fn test_debug_output() {
        let correlator = Correlator::new(Builder::new().build(), 'A');
        let debug = format!("{correlator:?}");
        assert!(debug.contains("FramedStream"));
        assert!(debug.contains("pending_write: 0"));
    }

    #[tokio::test]
    async fn test_tags_advance() {
        let mock = Builder::new()
            .write(b"A0 NAMESPACE\r\n")
            .read(b"A0 OK done\r\n")
            .write(b"A1 NAMESPACE\r\n")
            .read(b"A1 NO nope\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        correlator.execute(&Command::Namespace).await.unwrap();
        let second = correlator.execute(&Command::Namespace).await.unwrap();
        assert_eq!(second.status(), Some(Status::No));
    }

    #[tokio::test]
    async fn test_continuation_is_interrupted() {
        let mock = Builder::new()
            .write(b"A0 NAMESPACE\r\n")
            .read(b"+ go ahead\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let err = correlator.execute(&Command::Namespace).await.unwrap_err();
        assert!(matches!(err, Error::Interrupted));
    }

    #[tokio::test]
    async fn test_foreign_tag_is_bad_message() {
        let mock = Builder::new()
            .write(b"A0 NAMESPACE\r\n")
            .read(b"B7 OK not yours\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let err = correlator.execute(&Command::Namespace).await.unwrap_err();
        assert!(matches!(err, Error::BadMessage(ref line) if line == "B7 OK not yours"));
    }

    #[tokio::test]
    async fn test_literal_cannot_end_command_early() {
        let mock = Builder::new()
            .write(b"A0 FETCH 1:1 (RFC822)\r\n")
            .read(b"* 1 FETCH (RFC822 {12}\r\nA0 OK fake\r\n)\r\n")
            .read(b"A0 OK FETCH completed\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let command = Command::Fetch(FetchCommand::new(
            SequenceSpec::range(1, 1),
            FetchItems::Items(vec![FetchItem::Rfc822]),
        ));
        let response = correlator.execute(&command).await.unwrap();
        assert_eq!(response.lines.len(), 2);
        assert_eq!(
            response.lines[0].as_bytes(),
            b"* 1 FETCH (RFC822 {12}\r\nA0 OK fake\r\n)"
        );
    }

    #[tokio::test]
    async fn test_unencodable_command_sends_nothing() {
        let mock = Builder::new().build();
        let mut correlator = Correlator::new(mock, 'A');

        let command = Command::Select {
            mailbox: "bad\r\nname".to_string(),
        };
        let err = correlator.execute(&command).await.unwrap_err();
        assert!(matches!(err, Error::InvalidCommand(_)));
    }
}

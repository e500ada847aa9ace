//! Message-level commands: FETCH and mailbox listings.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use super::Client;
use crate::Result;
use crate::command::{Command, FetchCommand, FetchItem, FetchItems, SequenceSpec};
use crate::decode::decode_message_data;
use crate::types::{MailboxEmail, MessageAttribute, MessageDataRecord};

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Runs a FETCH and decodes every returned record.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidCommand`] for an unencodable request,
    /// [`crate::Error::No`] or [`crate::Error::Bad`] for a rejected command,
    /// decoding errors, and transport errors.
    pub async fn fetch(&mut self, fetch: &FetchCommand) -> Result<Vec<MessageDataRecord>> {
        let response = self.execute_ok(&Command::Fetch(fetch.clone())).await?;
        decode_message_data(&response.raw())
    }

    /// Fetches summaries of messages `from` through `to` (or the last
    /// message when `to` is `None`) of the selected mailbox.
    ///
    /// Records that cannot be turned into a summary are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Same as [`Client::fetch`].
    pub async fn list_items(&mut self, from: u32, to: Option<u32>) -> Result<Vec<MailboxEmail>> {
        let fetch = FetchCommand::new(
            SequenceSpec::Range { from, to },
            FetchItems::Items(vec![
                FetchItem::Uid,
                FetchItem::BodyStructure,
                FetchItem::Rfc822Header,
            ]),
        );
        let records = self.fetch(&fetch).await?;

        let mut emails = Vec::with_capacity(records.len());
        for record in &records {
            for attribute in &record.attributes {
                if !is_summary_attribute(attribute) {
                    warn!(
                        seq = record.message_number,
                        ?attribute,
                        "unexpected FETCH attribute"
                    );
                }
            }
            match MailboxEmail::from_record(record) {
                Ok(email) => emails.push(email),
                Err(err) => warn!(seq = record.message_number, %err, "skipping message"),
            }
        }
        debug!(count = emails.len(), "built message summaries");
        Ok(emails)
    }
}

const fn is_summary_attribute(attribute: &MessageAttribute) -> bool {
    matches!(
        attribute,
        MessageAttribute::Uid(_)
            | MessageAttribute::BodyStructure(_)
            | MessageAttribute::Rfc822Header(_)
            | MessageAttribute::Flags(_)
    )
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
    use crate::connection::Config;

    async fn attached(mock: tokio_test::io::Mock) -> Client<tokio_test::io::Mock> {
        let mut client = Client::new(Config::new("imap.gmail.com"));
        client.attach(mock).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_fetch_flags() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 FETCH 1:2 (FLAGS)\r\n")
            .read(b"* 1 FETCH (FLAGS (\\Seen))\r\n")
            .read(b"* 2 FETCH (FLAGS ())\r\n")
            .read(b"A0 OK Success\r\n")
            .build();
        let mut client = attached(mock).await;

        let fetch = FetchCommand::new(
            SequenceSpec::range(1, 2),
            FetchItems::Items(vec![FetchItem::Flags]),
        );
        let records = client.fetch(&fetch).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].attributes,
            vec![MessageAttribute::Flags(vec!["\\Seen".to_string()])]
        );
    }

    #[tokio::test]
    async fn test_list_items() {
        let header = "Subject: hello\r\nFrom: Ann <ann@example.com>\r\nMessage-ID: <1@example.com>\r\n\r\n";
        let fetch_line = format!(
            "* 1 FETCH (UID 42 BODYSTRUCTURE (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"7BIT\" 5 1) RFC822.HEADER {{{}}}\r\n{header})\r\n",
            header.len()
        );
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 FETCH 1:* (UID BODYSTRUCTURE RFC822.HEADER)\r\n")
            .read(fetch_line.as_bytes())
            .read(b"* 2 FETCH (UID 43)\r\n")
            .read(b"A0 OK Success\r\n")
            .build();
        let mut client = attached(mock).await;

        let emails = client.list_items(1, None).await.unwrap();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].uid, 42);
        assert_eq!(emails[0].subject.as_deref(), Some("hello"));
        assert_eq!(emails[0].message_id.as_deref(), Some("1@example.com"));
        assert!(emails[0].attachments.is_empty());
    }

    #[tokio::test]
    async fn test_list_items_closed_range() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 FETCH 3:7 (UID BODYSTRUCTURE RFC822.HEADER)\r\n")
            .read(b"A0 OK Success\r\n")
            .build();
        let mut client = attached(mock).await;

        let emails = client.list_items(3, Some(7)).await.unwrap();
        assert!(emails.is_empty());
    }

    #[test]
    fn test_summary_attributes() {
        assert!(is_summary_attribute(&MessageAttribute::Uid(1)));
        assert!(!is_summary_attribute(&MessageAttribute::Rfc822Size(10)));
    }
}

//! Mailbox-level commands: LIST and SELECT.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{info, warn};

use super::Client;
use crate::command::Command;
use crate::decode::{decode_list_line, decode_mailbox_data};
use crate::types::{ListEntry, SelectResponse};
use crate::{Result, utf7};

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Lists mailboxes matching `pattern` under `reference`.
    ///
    /// Lines that are not mailbox lists are ignored; a line that fails to
    /// decode is skipped with a warning.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NotConnected`], [`crate::Error::No`] or
    /// [`crate::Error::Bad`] for a rejected command, and transport errors.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListEntry>> {
        let command = Command::List {
            reference: reference.to_string(),
            pattern: pattern.to_string(),
        };
        let response = self.execute_ok(&command).await?;

        let mut entries = Vec::new();
        for line in response.untagged() {
            match decode_list_line(line.as_bytes()) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(err) => warn!(%err, line = %line.text(), "skipping LIST line"),
            }
        }
        info!(count = entries.len(), "listed mailboxes");
        Ok(entries)
    }

    /// Selects a mailbox and returns its state.
    ///
    /// The name is converted to modified UTF-7 unless it is already in that
    /// form.
    ///
    /// # Errors
    ///
    /// [`crate::Error::No`] for a missing mailbox, [`crate::Error::Bad`],
    /// decoding errors, and transport errors.
    pub async fn select(&mut self, mailbox: &str) -> Result<SelectResponse> {
        let command = Command::Select {
            mailbox: utf7::to_wire(mailbox),
        };
        let response = self.execute_ok(&command).await?;
        let records = decode_mailbox_data(&response.raw())?;
        let selected = SelectResponse::from_records(&records);

        info!(
            mailbox,
            exists = selected.exists,
            recent = selected.recent,
            uid_validity = selected.uid_validity,
            "mailbox selected"
        );
        Ok(selected)
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
    use crate::Error;
    use crate::connection::Config;
    use crate::types::AccessMode;

    async fn attached(mock: tokio_test::io::Mock) -> Client<tokio_test::io::Mock> {
        let mut client = Client::new(Config::new("imap.gmail.com"));
        client.attach(mock).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_list_skips_other_lines() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 LIST \"\" \"*\"\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n")
            .read(b"* 3 EXISTS\r\n")
            .read(b"* LIST (\\Noselect \\HasChildren) \"/\" \"[Gmail]\"\r\n")
            .read(b"A0 OK Success\r\n")
            .build();
        let mut client = attached(mock).await;

        let entries = client.list("", "*").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, vec!["INBOX"]);
        assert!(!entries[1].is_selectable());
    }

    #[tokio::test]
    async fn test_select_encodes_name() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 SELECT \"[Gmail]/&BBoEPgRIBDgEOg-\"\r\n")
            .read(b"* FLAGS (\\Answered \\Flagged \\Draft \\Deleted \\Seen)\r\n")
            .read(b"* 0 EXISTS\r\n")
            .read(b"* 0 RECENT\r\n")
            .read(b"* OK [UIDVALIDITY 11] UIDs valid.\r\n")
            .read(b"* OK [UIDNEXT 1] Predicted next UID.\r\n")
            .read(b"A0 OK [READ-WRITE] [Gmail]/Trash selected. (Success)\r\n")
            .build();
        let mut client = attached(mock).await;

        let selected = client.select("[Gmail]/Кошик").await.unwrap();
        assert_eq!(selected.exists, 0);
        assert_eq!(selected.uid_validity, 11);
        assert_eq!(selected.access, AccessMode::ReadWrite);
    }

    #[tokio::test]
    async fn test_select_missing_mailbox() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 SELECT \"FLAKS\"\r\n")
            .read(b"A0 NO [NONEXISTENT] Unknown Mailbox: FLAKS (Failure)\r\n")
            .build();
        let mut client = attached(mock).await;

        let err = client.select("FLAKS").await.unwrap_err();
        let Error::No(text) = err else {
            panic!("expected NO, got {err:?}");
        };
        assert_eq!(text, "[NONEXISTENT] Unknown Mailbox: FLAKS (Failure)");
    }
}

//! Integration tests for the IMAP client.
//!
//! A mock stream replays a recorded server transcript and captures what the
//! client writes, so whole sessions run without a real server.

#![allow(clippy::unwrap_used)]

use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::{Arc, Mutex, Once};
use std::task::{Context, Poll};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use mailroom_imap::{
    AccessMode, Client, Config, ConnectionState, Error, FetchCommand, FetchItem, FetchItems,
    MessageAttribute, SequenceSpec,
};
use mailroom_oauth::{AuthData, sasl};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const GREETING: &[u8] = b"* OK Gimap ready for requests from 10.0.0.1 h3mb1\r\n";

/// Mock stream that returns a canned transcript.
struct MockStream {
    /// Server bytes, read in order.
    responses: Cursor<Vec<u8>>,
    /// Everything the client wrote, shared with the test.
    sent: Arc<Mutex<Vec<u8>>>,
}

impl MockStream {
    fn new(responses: &[u8]) -> (Self, Arc<Mutex<Vec<u8>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let stream = Self {
            responses: Cursor::new(responses.to_vec()),
            sent: Arc::clone(&sent),
        };
        (stream, sent)
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let pos = usize::try_from(self.responses.position()).unwrap();
        let data = self.responses.get_ref();
        if pos >= data.len() {
            return Poll::Ready(Ok(()));
        }

        let remaining = &data[pos..];
        let to_read = remaining.len().min(buf.remaining());
        buf.put_slice(&remaining[..to_read]);
        self.responses.set_position((pos + to_read) as u64);

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "mailroom_imap=debug".into()),
            )
            .with_test_writer()
            .init();
    });
}

async fn session(transcript: &[u8]) -> (Client<MockStream>, Arc<Mutex<Vec<u8>>>) {
    init_tracing();
    let mut responses = GREETING.to_vec();
    responses.extend_from_slice(transcript);
    let (stream, sent) = MockStream::new(&responses);

    let mut client = Client::new(Config::new("imap.gmail.com"));
    client.attach(stream).await.unwrap();
    (client, sent)
}

fn sent_text(sent: &Arc<Mutex<Vec<u8>>>) -> String {
    String::from_utf8(sent.lock().unwrap().clone()).unwrap()
}

fn auth() -> AuthData {
    AuthData::new("someone@gmail.com", "ya29.token")
}

#[tokio::test]
async fn test_select_gmail_inbox() {
    let (mut client, sent) = session(
        b"* FLAGS (\\Answered \\Flagged \\Draft \\Deleted \\Seen $NotPhishing $Phishing)\r\n\
* OK [PERMANENTFLAGS (\\Answered \\Flagged \\Draft \\Deleted \\Seen $NotPhishing $Phishing \\*)] Flags permitted.\r\n\
* OK [UIDVALIDITY 1] UIDs valid.\r\n\
* 6 EXISTS\r\n\
* 0 RECENT\r\n\
* OK [UIDNEXT 184] Predicted next UID.\r\n\
* OK [HIGHESTMODSEQ 36339]\r\n\
A0 OK [READ-WRITE] INBOX selected. (Success)\r\n",
    )
    .await;
    assert_eq!(client.state(), ConnectionState::Connected);

    let inbox = client.select("INBOX").await.unwrap();
    assert_eq!(sent_text(&sent), "A0 SELECT \"INBOX\"\r\n");
    assert_eq!(inbox.exists, 6);
    assert_eq!(inbox.recent, 0);
    assert_eq!(inbox.uid_validity, 1);
    assert_eq!(inbox.uid_next, 184);
    assert_eq!(inbox.flags.len(), 7);
    assert_eq!(inbox.permanent_flags.last().map(String::as_str), Some("\\*"));
    assert_eq!(inbox.access, AccessMode::ReadWrite);
}

#[tokio::test]
async fn test_select_nonexistent() {
    let (mut client, _) =
        session(b"A0 NO [NONEXISTENT] Unknown Mailbox: FLAKS (Failure)\r\n").await;

    let err = client.select("FLAKS").await.unwrap_err();
    assert!(matches!(err, Error::No(ref text) if text.starts_with("[NONEXISTENT]")));
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_list_gmail_folders() {
    let (mut client, sent) = session(
        b"* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n\
* LIST (\\HasChildren \\Noselect) \"/\" \"[Gmail]\"\r\n\
* LIST (\\All \\HasNoChildren) \"/\" \"[Gmail]/All Mail\"\r\n\
* LIST (\\HasNoChildren \\Trash) \"/\" \"[Gmail]/&BBoEPgRIBDgEOg-\"\r\n\
* LIST (\\Drafts \\HasNoChildren) \"/\" \"[Gmail]/&BCcENQRABD0ENQRCBDoEOA-\"\r\n\
A0 OK Success\r\n",
    )
    .await;

    let entries = client.list("", "*").await.unwrap();
    assert_eq!(sent_text(&sent), "A0 LIST \"\" \"*\"\r\n");
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].path, vec!["INBOX"]);
    assert!(!entries[1].is_selectable());
    assert_eq!(entries[2].path, vec!["[Gmail]", "All Mail"]);
    assert_eq!(entries[3].path, vec!["[Gmail]", "Кошик"]);
    assert!(entries[3].has_flag("\\Trash"));
    assert_eq!(entries[4].path, vec!["[Gmail]", "Чернетки"]);
    assert_eq!(entries[4].raw_name, "[Gmail]/&BCcENQRABD0ENQRCBDoEOA-");
    assert_eq!(entries[4].delimiter, Some('/'));
}

#[tokio::test]
async fn test_fetch_with_literal_body() {
    let body = "Subject: hi\r\n\r\nA0 OK not the end\r\n";
    let transcript = format!(
        "* 1 FETCH (RFC822.SIZE {} RFC822 {{{}}}\r\n{body})\r\nA0 OK Success\r\n",
        body.len(),
        body.len()
    );
    let (mut client, sent) = session(transcript.as_bytes()).await;

    let fetch = FetchCommand::new(
        SequenceSpec::single(1),
        FetchItems::Items(vec![FetchItem::Rfc822Size, FetchItem::Rfc822]),
    );
    let records = client.fetch(&fetch).await.unwrap();

    assert_eq!(sent_text(&sent), "A0 FETCH 1:1 (RFC822.SIZE RFC822)\r\n");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].message_number, 1);
    assert_eq!(
        records[0].attributes,
        vec![
            MessageAttribute::Rfc822Size(u32::try_from(body.len()).unwrap()),
            MessageAttribute::Rfc822(body.as_bytes().to_vec()),
        ]
    );
}

#[tokio::test]
async fn test_fetch_empty_mailbox() {
    let (mut client, _) = session(b"A0 OK Success\r\n").await;

    let fetch = FetchCommand::new(SequenceSpec::Range { from: 1, to: None }, FetchItems::Fast);
    assert!(client.fetch(&fetch).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_items_with_attachment() {
    let header = "From: =?UTF-8?B?0J7Qu9C10LrRgdCw?= <olena@example.com>\r\n\
To: me@example.com\r\n\
Subject: Report\r\n\
Date: Tue, 1 Jul 2025 10:52:37 +0200\r\n\
Message-ID: <abc@example.com>\r\n\r\n";
    let transcript = format!(
        "* 1 FETCH (UID 7 BODYSTRUCTURE ((\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"7BIT\" 12 1 NIL NIL NIL)\
(\"APPLICATION\" \"PDF\" (\"NAME\" \"report.pdf\") NIL NIL \"BASE64\" 2048 NIL (\"ATTACHMENT\" (\"FILENAME\" \"report.pdf\")) NIL) \
\"MIXED\" (\"BOUNDARY\" \"xyz\") NIL NIL) RFC822.HEADER {{{}}}\r\n{header})\r\nA0 OK Success\r\n",
        header.len()
    );
    let (mut client, sent) = session(transcript.as_bytes()).await;

    let emails = client.list_items(1, Some(1)).await.unwrap();
    assert_eq!(
        sent_text(&sent),
        "A0 FETCH 1:1 (UID BODYSTRUCTURE RFC822.HEADER)\r\n"
    );
    assert_eq!(emails.len(), 1);

    let email = &emails[0];
    assert_eq!(email.uid, 7);
    assert_eq!(email.subject.as_deref(), Some("Report"));
    assert_eq!(email.from[0].name.as_deref(), Some("Олекса"));
    assert_eq!(email.from[0].address, "olena@example.com");
    assert_eq!(email.message_id.as_deref(), Some("abc@example.com"));
    assert!(email.date.is_some());
    assert_eq!(email.attachments.len(), 2);
    assert_eq!(email.attachments[0].mime_type, "text/plain");
    assert_eq!(email.attachments[1].name.as_deref(), Some("report.pdf"));
    assert_eq!(email.attachments[1].size, 2048);
}

#[tokio::test]
async fn test_xoauth2_success() {
    let (mut client, sent) = session(
        b"* CAPABILITY IMAP4rev1 UNSELECT IDLE NAMESPACE QUOTA ID XLIST CHILDREN\r\n\
A0 OK someone@gmail.com authenticated (Success)\r\n",
    )
    .await;

    client.authenticate(&auth()).await.unwrap();
    assert_eq!(client.state(), ConnectionState::Authenticated);
    assert_eq!(
        sent_text(&sent),
        format!(
            "A0 AUTHENTICATE XOAUTH2 {}\r\n",
            sasl::xoauth2_response("someone@gmail.com", "ya29.token")
        )
    );
}

#[tokio::test]
async fn test_xoauth2_failure_with_challenge() {
    let json = r#"{"status":"400","schemes":"Bearer","scope":"https://mail.google.com/"}"#;
    let transcript = format!(
        "+ {}\r\nA0 NO [AUTHENTICATIONFAILED] Invalid credentials (Failure)\r\n",
        STANDARD.encode(json)
    );
    let (mut client, sent) = session(transcript.as_bytes()).await;

    let err = client.authenticate(&auth()).await.unwrap_err();
    assert_eq!(err.auth_details().unwrap().summary, json);
    assert!(sent_text(&sent).ends_with("\r\n\r\n"));
    assert_eq!(client.state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_xoauth2_failure_without_challenge() {
    let (mut client, _) =
        session(b"A0 NO [AUTHENTICATIONFAILED] Invalid credentials (Failure)\r\n").await;

    let err = client.authenticate(&auth()).await.unwrap_err();
    let Error::Auth { text, details } = err else {
        panic!("expected auth error, got {err:?}");
    };
    assert_eq!(text, "[AUTHENTICATIONFAILED] Invalid credentials (Failure)");
    assert!(details.summary.is_empty());
}

#[tokio::test]
async fn test_full_session() {
    let (mut client, sent) = session(
        b"* CAPABILITY IMAP4rev1 SASL-IR AUTH=XOAUTH2\r\n\
A0 OK Thats all she wrote!\r\n\
A1 OK someone@gmail.com authenticated (Success)\r\n\
* NAMESPACE ((\"\" \"/\")) NIL NIL\r\n\
A2 OK Success\r\n\
* BYE LOGOUT Requested\r\n\
A3 OK 73 good day (Success)\r\n",
    )
    .await;

    let caps = client.capability().await.unwrap();
    assert!(caps.iter().any(|c| c == "AUTH=XOAUTH2"));
    client.authenticate(&auth()).await.unwrap();

    let namespace = client.namespace().await.unwrap();
    assert_eq!(namespace.untagged().count(), 1);

    client.disconnect().await.unwrap();
    assert_eq!(client.state(), ConnectionState::NotConnected);

    let written = sent_text(&sent);
    let tags: Vec<&str> = written
        .lines()
        .filter_map(|line| line.split(' ').next())
        .collect();
    assert_eq!(tags, vec!["A0", "A1", "A2", "A3"]);
}

#[tokio::test]
async fn test_bye_greeting_is_rejected() {
    init_tracing();
    let (stream, _) = MockStream::new(b"* BYE server shutting down\r\n");
    let mut client = Client::new(Config::new("imap.gmail.com"));

    let err = client.attach(stream).await.unwrap_err();
    assert!(err.is_protocol());
    assert_eq!(client.state(), ConnectionState::NotConnected);
}

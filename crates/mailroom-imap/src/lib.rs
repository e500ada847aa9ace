//! # mailroom-imap
//!
//! An IMAP4rev1 (RFC 3501) protocol engine for mail clients that sign in with
//! `OAuth2`.
//!
//! ## Features
//!
//! - **Grammar-driven decoding**: responses are matched against a PEG
//!   rendition of the RFC 3501 formal syntax, then turned into typed records
//! - **Literal-aware framing**: `{N}` literals are read as one unit, so a
//!   CRLF inside message data never ends a response early
//! - **XOAUTH2**: SASL authentication with decoded server error challenges
//! - **TLS via rustls**: implicit TLS on port 993 without OpenSSL
//! - **Modified UTF-7**: mailbox names are decoded into path segments and
//!   encoded again on SELECT
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailroom_imap::{Client, Config};
//! use mailroom_oauth::AuthData;
//!
//! # async fn run() -> mailroom_imap::Result<()> {
//! let mut client = Client::new(Config::new("imap.gmail.com"));
//! client.connect().await?;
//! client.authenticate(&AuthData::new("user@gmail.com", "ya29.a0...")).await?;
//!
//! for entry in client.list("", "*").await? {
//!     println!("{}", entry.path.join("/"));
//! }
//!
//! let inbox = client.select("INBOX").await?;
//! if inbox.exists > 0 {
//!     for email in client.list_items(1, None).await? {
//!         println!("{}: {:?}", email.uid, email.subject);
//!     }
//! }
//!
//! client.disconnect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: command encoding and tag generation
//! - [`connection`]: transport, framing, correlation and the [`Client`]
//! - [`grammar`]: the response grammar and its parse engine
//! - [`decode`]: response decoders built on the grammar
//! - [`types`]: decoded records
//! - [`utf7`]: modified UTF-7 mailbox names

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
pub mod decode;
mod error;
pub mod grammar;
pub mod response;
pub mod types;
pub mod utf7;

pub use command::{Command, FetchCommand, FetchItem, FetchItems, SequenceSpec, TagGenerator};
pub use connection::{
    Client, Config, ConfigBuilder, ConnectionState, Correlator, FramedStream, ImapStream, Security,
};
pub use error::{AuthErrorDetails, Error, Result};
pub use response::{ImapResponse, ResponseLine};
pub use types::{
    AccessMode, Attachment, Capability, ListEntry, MailboxDataRecord, MailboxEmail, MessageAttribute,
    MessageDataRecord, SelectResponse, Status,
};

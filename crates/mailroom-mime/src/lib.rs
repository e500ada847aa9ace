//! # mailroom-mime
//!
//! Header decoding for mail clients.
//!
//! ## Features
//!
//! - **Header blocks**: RFC 5322 unfolding with arrival order preserved
//! - **Encoded words**: RFC 2047 `B` and `Q` for UTF-8, US-ASCII and Latin-1
//! - **Addresses**: address lists with quoted names, comments and groups
//! - **Dates**: RFC 2822 dates via `chrono`
//!
//! ## Quick Start
//!
//! ```
//! use mailroom_mime::HeaderBlock;
//!
//! let raw = b"From: =?UTF-8?Q?Jos=C3=A9?= <jose@example.com>\r\n\
//! Subject: =?UTF-8?B?SMOpbGxv?=\r\n\
//! Message-ID: <1@example.com>\r\n\r\n";
//!
//! let headers = HeaderBlock::parse(raw)?;
//! assert_eq!(headers.subject().as_deref(), Some("Héllo"));
//! assert_eq!(headers.addresses("From")[0].name.as_deref(), Some("José"));
//! assert_eq!(headers.message_ids("Message-ID"), vec!["1@example.com"]);
//! # Ok::<(), mailroom_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod error;
mod header;

pub mod encoding;

pub use address::{Mailbox, parse_address_list};
pub use error::{Error, Result};
pub use header::HeaderBlock;

//! IMAP command builder.
//!
//! This module provides the commands the client sends and their wire form.

mod fetch;
mod tag_generator;

use crate::{Error, Result};

pub use fetch::{FetchCommand, FetchItem, FetchItems, SequenceSpec};
pub use tag_generator::TagGenerator;

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// CAPABILITY command.
    Capability,
    /// AUTHENTICATE command.
    Authenticate {
        /// Authentication mechanism.
        mechanism: String,
        /// Initial response (SASL-IR), already base64-encoded.
        initial_response: Option<String>,
    },
    /// NAMESPACE command.
    Namespace,
    /// LIST command.
    List {
        /// Reference name.
        reference: String,
        /// Mailbox pattern.
        pattern: String,
    },
    /// SELECT command. The mailbox name is sent as given, so non-ASCII names
    /// must already be modified UTF-7.
    Select {
        /// Mailbox to select.
        mailbox: String,
    },
    /// FETCH command.
    Fetch(FetchCommand),
    /// LOGOUT command.
    Logout,
}

impl Command {
    /// Encodes the command text, without tag or CRLF.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCommand`] if the command cannot be represented on the
    /// wire.
    pub fn encode(&self) -> Result<String> {
        let text = match self {
            Self::Capability => "CAPABILITY".to_string(),
            Self::Authenticate {
                mechanism,
                initial_response,
            } => {
                if !is_atom(mechanism) {
                    return Err(Error::InvalidCommand(format!(
                        "bad SASL mechanism {mechanism:?}"
                    )));
                }
                match initial_response {
                    Some(ir) => format!("AUTHENTICATE {mechanism} {ir}"),
                    None => format!("AUTHENTICATE {mechanism}"),
                }
            }
            Self::Namespace => "NAMESPACE".to_string(),
            Self::List { reference, pattern } => {
                format!("LIST {} {}", quoted(reference)?, quoted(pattern)?)
            }
            Self::Select { mailbox } => format!("SELECT {}", quoted(mailbox)?),
            Self::Fetch(fetch) => fetch.encode()?,
            Self::Logout => "LOGOUT".to_string(),
        };
        Ok(text)
    }

    /// Serializes the command to bytes with the given tag.
    ///
    /// # Errors
    ///
    /// See [`Command::encode`].
    pub fn serialize(&self, tag: &str) -> Result<Vec<u8>> {
        let text = self.encode()?;
        let mut buf = Vec::with_capacity(tag.len() + text.len() + 3);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(text.as_bytes());
        buf.extend_from_slice(b"\r\n");
        Ok(buf)
    }

    /// Returns a form of the command that is safe to log.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Authenticate {
                mechanism,
                initial_response: Some(_),
            } => format!("AUTHENTICATE {mechanism} <redacted>"),
            other => other
                .encode()
                .unwrap_or_else(|_| "<unencodable command>".to_string()),
        }
    }
}

/// Writes a quoted string, escaping `"` and `\`.
fn quoted(s: &str) -> Result<String> {
    if s.contains(['\r', '\n', '\0']) {
        return Err(Error::InvalidCommand(format!(
            "{s:?} cannot be sent as a quoted string"
        )));
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    Ok(out)
}

fn is_atom(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_graphic() && !matches!(b, b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b'\\' | b']')
        })
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
    use super::*;

    #[test]
    fn test_capability_command() {
        let cmd = Command::Capability;
        assert_eq!(cmd.serialize("A0").unwrap(), b"A0 CAPABILITY\r\n");
    }

    #[test]
    fn test_authenticate_command() {
        let cmd = Command::Authenticate {
            mechanism: "XOAUTH2".to_string(),
            initial_response: Some("dXNlcj0=".to_string()),
        };
        assert_eq!(
            cmd.serialize("A0").unwrap(),
            b"A0 AUTHENTICATE XOAUTH2 dXNlcj0=\r\n"
        );
        assert_eq!(cmd.redacted(), "AUTHENTICATE XOAUTH2 <redacted>");
    }

    #[test]
    fn test_list_command() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(cmd.serialize("A3").unwrap(), b"A3 LIST \"\" \"*\"\r\n");
    }

    #[test]
    fn test_list_escapes() {
        let cmd = Command::List {
            reference: "a\"b".to_string(),
            pattern: "c\\%".to_string(),
        };
        assert_eq!(cmd.encode().unwrap(), r#"LIST "a\"b" "c\\%""#);
    }

    #[test]
    fn test_select_command() {
        let cmd = Command::Select {
            mailbox: "INBOX".to_string(),
        };
        assert_eq!(cmd.serialize("A2").unwrap(), b"A2 SELECT \"INBOX\"\r\n");
        assert_eq!(cmd.redacted(), "SELECT \"INBOX\"");
    }

    #[test]
    fn test_select_rejects_line_breaks() {
        let cmd = Command::Select {
            mailbox: "IN\r\nA9 LOGOUT".to_string(),
        };
        assert!(matches!(cmd.encode(), Err(Error::InvalidCommand(_))));
    }

    #[test]
    fn test_fetch_command() {
        let cmd = Command::Fetch(FetchCommand::new(
            SequenceSpec::range(32, 32),
            FetchItems::Items(vec![FetchItem::BodyStructure]),
        ));
        assert_eq!(
            cmd.serialize("A4").unwrap(),
            b"A4 FETCH 32:32 (BODYSTRUCTURE)\r\n"
        );
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::Namespace.encode().unwrap(), "NAMESPACE");
        assert_eq!(Command::Logout.encode().unwrap(), "LOGOUT");
    }

    #[test]
    fn test_bad_mechanism() {
        let cmd = Command::Authenticate {
            mechanism: "X OAUTH".to_string(),
            initial_response: None,
        };
        assert!(cmd.encode().is_err());
    }
}

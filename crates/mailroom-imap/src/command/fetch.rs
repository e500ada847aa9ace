//! FETCH command model.

use std::fmt;

use crate::{Error, Result};

/// Which messages a FETCH addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceSpec {
    /// `from:to`, or `from:*` when `to` is `None`.
    Range {
        /// First sequence number (1-based).
        from: u32,
        /// Last sequence number, or the last message.
        to: Option<u32>,
    },
    /// A pre-formatted sequence set, sent as given.
    Raw(String),
}

impl SequenceSpec {
    /// A closed range `from:to`.
    #[must_use]
    pub const fn range(from: u32, to: u32) -> Self {
        Self::Range { from, to: Some(to) }
    }

    /// A single message.
    #[must_use]
    pub const fn single(n: u32) -> Self {
        Self::range(n, n)
    }

    fn encode(&self) -> Result<String> {
        match self {
            Self::Range { from: 0, .. } | Self::Range { to: Some(0), .. } => Err(
                Error::InvalidCommand("sequence numbers start at 1".to_string()),
            ),
            Self::Range { from, to: Some(to) } => Ok(format!("{from}:{to}")),
            Self::Range { from, to: None } => Ok(format!("{from}:*")),
            Self::Raw(raw) if raw.is_empty() || raw.contains([' ', '\r', '\n', '\0']) => Err(
                Error::InvalidCommand(format!("malformed sequence set {raw:?}")),
            ),
            Self::Raw(raw) => Ok(raw.clone()),
        }
    }
}

/// FETCH items to request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItems {
    /// Fetch all (equivalent to FLAGS INTERNALDATE RFC822.SIZE ENVELOPE).
    All,
    /// Fetch fast (equivalent to FLAGS INTERNALDATE RFC822.SIZE).
    Fast,
    /// Fetch full (equivalent to FLAGS INTERNALDATE RFC822.SIZE ENVELOPE BODY).
    Full,
    /// Custom list of items.
    Items(Vec<FetchItem>),
}

/// Individual FETCH item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// Non-extensible body structure.
    Body,
    /// Body structure with extension data.
    BodyStructure,
    /// Envelope structure.
    Envelope,
    /// Message flags.
    Flags,
    /// Internal date.
    InternalDate,
    /// RFC822 (full message).
    Rfc822,
    /// RFC822.HEADER.
    Rfc822Header,
    /// RFC822.SIZE.
    Rfc822Size,
    /// RFC822.TEXT.
    Rfc822Text,
    /// UID.
    Uid,
    /// Anything else, sent as given (for example `BODY.PEEK[HEADER]`).
    Raw(String),
}

impl FetchItem {
    /// Returns the wire form of the item.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Body => "BODY",
            Self::BodyStructure => "BODYSTRUCTURE",
            Self::Envelope => "ENVELOPE",
            Self::Flags => "FLAGS",
            Self::InternalDate => "INTERNALDATE",
            Self::Rfc822 => "RFC822",
            Self::Rfc822Header => "RFC822.HEADER",
            Self::Rfc822Size => "RFC822.SIZE",
            Self::Rfc822Text => "RFC822.TEXT",
            Self::Uid => "UID",
            Self::Raw(raw) => raw,
        }
    }
}

impl FetchItem {
    fn encode(&self) -> Result<&str> {
        match self {
            Self::Raw(raw) if raw.is_empty() || raw.contains(['\r', '\n', '\0']) => Err(
                Error::InvalidCommand(format!("malformed FETCH item {raw:?}")),
            ),
            _ => Ok(self.as_str()),
        }
    }
}

impl fmt::Display for FetchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchItems {
    fn encode(&self) -> Result<String> {
        match self {
            Self::All => Ok("ALL".to_string()),
            Self::Fast => Ok("FAST".to_string()),
            Self::Full => Ok("FULL".to_string()),
            Self::Items(items) if items.is_empty() => {
                Err(Error::InvalidCommand("FETCH needs at least one item".to_string()))
            }
            Self::Items(items) => {
                let names = items
                    .iter()
                    .map(FetchItem::encode)
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", names.join(" ")))
            }
        }
    }
}

/// A FETCH request: which messages, and what to return for each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCommand {
    /// Messages to fetch.
    pub sequence: SequenceSpec,
    /// Items to return.
    pub items: FetchItems,
}

impl FetchCommand {
    /// Creates a FETCH request.
    #[must_use]
    pub const fn new(sequence: SequenceSpec, items: FetchItems) -> Self {
        Self { sequence, items }
    }

    /// Encodes the command text, without tag or CRLF.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidCommand`] for an empty item list, a raw item that is
    /// empty or holds CR, LF or NUL, or a malformed sequence.
    pub fn encode(&self) -> Result<String> {
        Ok(format!(
            "FETCH {} {}",
            self.sequence.encode()?,
            self.items.encode()?
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn single_item_is_parenthesized() {
        let cmd = FetchCommand::new(
            SequenceSpec::range(32, 32),
            FetchItems::Items(vec![FetchItem::BodyStructure]),
        );
        assert_eq!(cmd.encode().unwrap(), "FETCH 32:32 (BODYSTRUCTURE)");
    }

    #[test]
    fn macros_and_lists() {
        let all = FetchCommand::new(SequenceSpec::range(1, 2), FetchItems::All);
        assert_eq!(all.encode().unwrap(), "FETCH 1:2 ALL");

        let pair = FetchCommand::new(
            SequenceSpec::range(1, 200),
            FetchItems::Items(vec![FetchItem::Body, FetchItem::Envelope]),
        );
        assert_eq!(pair.encode().unwrap(), "FETCH 1:200 (BODY ENVELOPE)");
    }

    #[test]
    fn open_range_and_raw() {
        let open = FetchCommand::new(
            SequenceSpec::Range { from: 5, to: None },
            FetchItems::Items(vec![
                FetchItem::Uid,
                FetchItem::Rfc822Size,
                FetchItem::Raw("BODY.PEEK[HEADER]".to_string()),
            ]),
        );
        assert_eq!(
            open.encode().unwrap(),
            "FETCH 5:* (UID RFC822.SIZE BODY.PEEK[HEADER])"
        );

        let raw = FetchCommand::new(SequenceSpec::Raw("1,4:6".to_string()), FetchItems::Fast);
        assert_eq!(raw.encode().unwrap(), "FETCH 1,4:6 FAST");
    }

    #[test]
    fn rejects_unsendable_requests() {
        let empty = FetchCommand::new(SequenceSpec::single(1), FetchItems::Items(Vec::new()));
        assert!(matches!(empty.encode(), Err(Error::InvalidCommand(_))));

        let zero = FetchCommand::new(SequenceSpec::range(0, 3), FetchItems::Full);
        assert!(matches!(zero.encode(), Err(Error::InvalidCommand(_))));

        let spaced = FetchCommand::new(SequenceSpec::Raw("1 2".to_string()), FetchItems::Full);
        assert!(matches!(spaced.encode(), Err(Error::InvalidCommand(_))));
    }

    #[test]
    fn raw_items_cannot_smuggle_commands() {
        let smuggled = FetchCommand::new(
            SequenceSpec::single(1),
            FetchItems::Items(vec![FetchItem::Raw(
                "UID)\r\nA9 LOGOUT\r\nA10 FETCH 1 (UID".to_string(),
            )]),
        );
        assert!(matches!(smuggled.encode(), Err(Error::InvalidCommand(_))));

        for bad in ["", "BODY[]\0", "UID\n"] {
            let cmd = FetchCommand::new(
                SequenceSpec::single(1),
                FetchItems::Items(vec![FetchItem::Uid, FetchItem::Raw(bad.to_string())]),
            );
            assert!(cmd.encode().is_err(), "accepted {bad:?}");
        }

        let nul = FetchCommand::new(SequenceSpec::Raw("1\0".to_string()), FetchItems::Fast);
        assert!(nul.encode().is_err());
    }
}

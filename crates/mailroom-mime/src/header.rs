//! RFC 5322 header blocks.

use chrono::{DateTime, FixedOffset};

use crate::address::{Mailbox, parse_address_list};
use crate::encoding::decode_rfc2047;
use crate::error::{Error, Result};

/// An unfolded header block, in arrival order.
///
/// Names keep their original case; lookups ignore it. Values are stored as
/// sent (encoded words are decoded only by the typed accessors).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    entries: Vec<(String, String)>,
}

impl HeaderBlock {
    /// Parses a header block, stopping at the first empty line.
    ///
    /// Bytes that are not UTF-8 are replaced rather than rejected. Lines
    /// that are not fields (no `:`, or a field name with whitespace, such as
    /// an mbox `From ` line) are skipped along with their continuations.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidHeader`] if the block starts with a continuation line.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        let text = String::from_utf8_lossy(raw);
        let mut entries: Vec<(String, String)> = Vec::new();
        let mut skipping = false;

        for (index, line) in text.split('\n').enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }

            if line.starts_with([' ', '\t']) {
                if index == 0 {
                    return Err(Error::InvalidHeader(format!(
                        "continuation before first field: {line}"
                    )));
                }
                if let (false, Some((_, value))) = (skipping, entries.last_mut()) {
                    value.push_str(line);
                }
                continue;
            }

            skipping = true;
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim_end();
            if name.is_empty() || name.contains(char::is_whitespace) {
                continue;
            }
            skipping = false;
            entries.push((name.to_string(), value.trim_start().to_string()));
        }

        for (_, value) in &mut entries {
            let trimmed = value.trim_end().len();
            value.truncate(trimmed);
        }
        Ok(Self { entries })
    }

    /// Returns every field as `(name, value)`.
    #[must_use]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the block has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets the first value for a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    /// Gets all values for a field, in order.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Decoded `Subject`.
    #[must_use]
    pub fn subject(&self) -> Option<String> {
        self.get("Subject").map(decode_rfc2047)
    }

    /// Parsed `Date`. A trailing zone comment such as `(PST)` is ignored.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        let value = self.get("Date")?.trim();
        DateTime::parse_from_rfc2822(value)
            .or_else(|_| {
                let without_comment = value
                    .rfind('(')
                    .filter(|_| value.ends_with(')'))
                    .map_or(value, |i| value[..i].trim_end());
                DateTime::parse_from_rfc2822(without_comment)
            })
            .ok()
    }

    /// Mailboxes from every instance of an address field.
    #[must_use]
    pub fn addresses(&self, name: &str) -> Vec<Mailbox> {
        self.get_all(name).flat_map(parse_address_list).collect()
    }

    /// Message ids from every instance of a field, without angle brackets.
    ///
    /// A value without any `<id>` token is split on whitespace instead.
    #[must_use]
    pub fn message_ids(&self, name: &str) -> Vec<String> {
        self.get_all(name).flat_map(extract_ids).collect()
    }
}

fn extract_ids(value: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut rest = value;
    while let Some(open) = rest.find('<') {
        let Some(len) = rest[open..].find('>') else {
            break;
        };
        let id = rest[open + 1..open + len].trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
        rest = &rest[open + len + 1..];
    }

    if ids.is_empty() {
        ids = value.split_whitespace().map(ToString::to_string).collect();
    }
    ids
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
    use chrono::{Datelike, Timelike};

    use super::*;

    const GMAIL_HEADER: &[u8] = b"Delivered-To: someone@gmail.com\r\n\
Received: by 2002:a05:7300:5388 with SMTP id u8csp1234;\r\n\
\tTue, 1 Jul 2025 01:52:40 -0700 (PDT)\r\n\
From: =?UTF-8?B?0J7Qu9C10LrRgdCw?= <olena@example.com>\r\n\
To: someone@gmail.com,\r\n\
\x20\"Doe, John\" <john@example.com>\r\n\
Subject: =?UTF-8?Q?=D0=97=D0=B2=D1=96=D1=82?=\r\n\
\x20=?UTF-8?Q?_=D0=B7=D0=B0_=D1=87=D0=B5=D1=80=D0=B2=D0=B5=D0=BD=D1=8C?=\r\n\
Date: Tue, 1 Jul 2025 10:52:37 +0200 (CEST)\r\n\
Message-ID: <CAF=abc@mail.gmail.com>\r\n\
In-Reply-To: <prev@example.com>\r\n\
References: <root@example.com>\r\n\
\x20<prev@example.com>\r\n\
\r\n\
body text is never reached\r\n";

    #[test]
    fn test_parse_unfolds_in_order() {
        let headers = HeaderBlock::parse(GMAIL_HEADER).unwrap();
        assert_eq!(headers.len(), 9);
        assert_eq!(headers.entries()[0].0, "Delivered-To");
        assert_eq!(
            headers.get("received"),
            Some("by 2002:a05:7300:5388 with SMTP id u8csp1234;\tTue, 1 Jul 2025 01:52:40 -0700 (PDT)")
        );
        assert_eq!(headers.get("X-Missing"), None);
    }

    #[test]
    fn test_typed_accessors() {
        let headers = HeaderBlock::parse(GMAIL_HEADER).unwrap();

        assert_eq!(headers.subject().as_deref(), Some("Звіт за червень"));

        let date = headers.date().unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2025, 7, 1));
        assert_eq!(date.hour(), 10);
        assert_eq!(date.offset().local_minus_utc(), 7200);

        let from = headers.addresses("From");
        assert_eq!(from[0].name.as_deref(), Some("Олекса"));
        assert_eq!(from[0].address, "olena@example.com");

        let to = headers.addresses("To");
        assert_eq!(to.len(), 2);
        assert_eq!(to[1].name.as_deref(), Some("Doe, John"));
        assert!(headers.addresses("Cc").is_empty());

        assert_eq!(headers.message_ids("Message-ID"), vec!["CAF=abc@mail.gmail.com"]);
        assert_eq!(
            headers.message_ids("References"),
            vec!["root@example.com", "prev@example.com"]
        );
    }

    #[test]
    fn test_get_all() {
        let headers = HeaderBlock::parse(b"X-A: 1\r\nx-a: 2\r\nX-B: 3\r\n").unwrap();
        assert_eq!(headers.get_all("X-A").collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[test]
    fn test_lf_only_and_empty() {
        let headers = HeaderBlock::parse(b"Subject: plain\nDate: nonsense\n").unwrap();
        assert_eq!(headers.subject().as_deref(), Some("plain"));
        assert!(headers.date().is_none());

        assert!(HeaderBlock::parse(b"").unwrap().is_empty());
        assert!(HeaderBlock::parse(b"\r\n").unwrap().is_empty());
    }

    #[test]
    fn test_message_ids_without_brackets() {
        let headers = HeaderBlock::parse(b"In-Reply-To: a@x b@y\r\n").unwrap();
        assert_eq!(headers.message_ids("In-Reply-To"), vec!["a@x", "b@y"]);
    }

    #[test]
    fn test_leading_continuation_rejected() {
        assert!(matches!(
            HeaderBlock::parse(b" leading continuation\r\n"),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_malformed_lines_skipped() {
        let raw = b"From someone@example.com Tue Jul  1 10:52:37 2025\r\n\
Subject: kept\r\n\
no colon here\r\n\
\tfolded onto a skipped line\r\n\
Bad Name: x\r\n\
: x\r\n\
To: ann@example.com\r\n\
\x20bob@example.com\r\n\r\n";
        let headers = HeaderBlock::parse(raw).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.subject().as_deref(), Some("kept"));
        assert_eq!(headers.get("To"), Some("ann@example.com bob@example.com"));
        assert!(headers.get("From").is_none());
    }

    #[test]
    fn test_non_utf8_replaced() {
        let headers = HeaderBlock::parse(b"Subject: caf\xe9\r\n").unwrap();
        assert_eq!(headers.subject().as_deref(), Some("caf\u{fffd}"));
    }
}

//! RFC 5322 address lists.

use std::fmt;

use crate::encoding::decode_rfc2047;

/// One mailbox from an address header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mailbox {
    /// Display name, decoded.
    pub name: Option<String>,
    /// `local@domain`.
    pub address: String,
}

impl Mailbox {
    /// Creates a mailbox.
    #[must_use]
    pub fn new(name: Option<String>, address: impl Into<String>) -> Self {
        Self {
            name,
            address: address.into(),
        }
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} <{}>", self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Parses an address list such as the value of `To`.
///
/// Group syntax (`team: a@x, b@y;`) is flattened into its members. Entries
/// without an address are dropped.
#[must_use]
pub fn parse_address_list(value: &str) -> Vec<Mailbox> {
    split_top_level(value)
        .iter()
        .filter_map(|entry| parse_mailbox(entry))
        .collect()
}

/// Splits on `,` and `;` outside quotes, angle brackets and comments. A `:`
/// at the same level ends a group name, which is discarded.
fn split_top_level(value: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    let mut escaped = false;
    let mut angle = 0usize;
    let mut paren = 0usize;

    for c in value.chars() {
        if escaped {
            escaped = false;
            current.push(c);
            continue;
        }
        match c {
            '\\' if in_quote || paren > 0 => {
                escaped = true;
                current.push(c);
            }
            '"' if paren == 0 => {
                in_quote = !in_quote;
                current.push(c);
            }
            '(' if !in_quote => {
                paren += 1;
                current.push(c);
            }
            ')' if !in_quote && paren > 0 => {
                paren -= 1;
                current.push(c);
            }
            '<' if !in_quote && paren == 0 => {
                angle += 1;
                current.push(c);
            }
            '>' if !in_quote && paren == 0 && angle > 0 => {
                angle -= 1;
                current.push(c);
            }
            ':' if !in_quote && paren == 0 && angle == 0 => current.clear(),
            ',' | ';' if !in_quote && paren == 0 && angle == 0 => {
                entries.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    entries.push(current);
    entries
}

fn parse_mailbox(entry: &str) -> Option<Mailbox> {
    let entry = entry.trim();
    if entry.is_empty() {
        return None;
    }

    if let Some(open) = entry.rfind('<') {
        let close = entry[open..].find('>').map_or(entry.len(), |i| open + i);
        let address = entry[open + 1..close].trim();
        if address.is_empty() {
            return None;
        }
        let (phrase, _) = strip_comments(&entry[..open]);
        return Some(Mailbox::new(display_name(&phrase), address));
    }

    // Bare `local@domain`, possibly with an old-style `(Name)` comment.
    let (address, comment) = strip_comments(entry);
    let address = address.trim();
    if address.is_empty() {
        return None;
    }
    Some(Mailbox::new(display_name(&comment), address))
}

/// Splits text into what lies outside `( )` comments and the comment text.
fn strip_comments(text: &str) -> (String, String) {
    let mut outside = String::new();
    let mut inside = String::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            escaped = false;
            if depth > 0 {
                inside.push(c);
            } else {
                outside.push(c);
            }
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                if depth == 0 {
                    outside.push(c);
                }
            }
            '"' if depth == 0 => {
                in_quote = !in_quote;
                outside.push(c);
            }
            '(' if !in_quote => {
                if depth > 0 {
                    inside.push(c);
                }
                depth += 1;
            }
            ')' if !in_quote && depth > 0 => {
                depth -= 1;
                if depth > 0 {
                    inside.push(c);
                }
            }
            _ if depth > 0 => inside.push(c),
            _ => outside.push(c),
        }
    }
    (outside, inside)
}

/// Unquotes and decodes a display name; blank names become `None`.
fn display_name(phrase: &str) -> Option<String> {
    let phrase = phrase.trim();
    let unquoted = match phrase
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
    {
        Some(quoted) => unescape(quoted),
        None => phrase.to_string(),
    };
    let name = decode_rfc2047(unquoted.trim());
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn unescape(quoted: &str) -> String {
    let mut out = String::with_capacity(quoted.len());
    let mut chars = quoted.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
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

    fn mailbox(name: Option<&str>, address: &str) -> Mailbox {
        Mailbox::new(name.map(ToString::to_string), address)
    }

    #[test]
    fn test_forms() {
        assert_eq!(
            parse_address_list("Ann <ann@example.com>"),
            vec![mailbox(Some("Ann"), "ann@example.com")]
        );
        assert_eq!(
            parse_address_list("bob@example.com"),
            vec![mailbox(None, "bob@example.com")]
        );
        assert_eq!(
            parse_address_list("<cy@example.org>"),
            vec![mailbox(None, "cy@example.org")]
        );
        assert_eq!(
            parse_address_list("dee@example.org (Dee Dee)"),
            vec![mailbox(Some("Dee Dee"), "dee@example.org")]
        );
    }

    #[test]
    fn test_quoted_names_with_commas() {
        let list = parse_address_list(
            r#""Doe, John" <john@example.com>, "Say \"hi\"" <hi@example.com>"#,
        );
        assert_eq!(
            list,
            vec![
                mailbox(Some("Doe, John"), "john@example.com"),
                mailbox(Some(r#"Say "hi""#), "hi@example.com"),
            ]
        );
    }

    #[test]
    fn test_encoded_name() {
        let list = parse_address_list("=?UTF-8?B?0J7Qu9C10LrRgdCw?= <olena@example.com>");
        assert_eq!(list[0].name.as_deref(), Some("Олекса"));

        let quoted = parse_address_list("\"=?utf-8?Q?Jos=C3=A9?=\" <jose@example.com>");
        assert_eq!(quoted[0].name.as_deref(), Some("José"));
    }

    #[test]
    fn test_groups() {
        let list = parse_address_list("Team: a@x.org, B <b@y.org>;, c@z.org");
        assert_eq!(
            list,
            vec![
                mailbox(None, "a@x.org"),
                mailbox(Some("B"), "b@y.org"),
                mailbox(None, "c@z.org"),
            ]
        );
        assert!(parse_address_list("undisclosed-recipients:;").is_empty());
    }

    #[test]
    fn test_empty_entries_dropped() {
        assert!(parse_address_list("").is_empty());
        assert_eq!(parse_address_list("a@x.org,, ,b@y.org").len(), 2);
        assert!(parse_address_list("Nobody <>").is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            mailbox(Some("Ann"), "ann@example.com").to_string(),
            "Ann <ann@example.com>"
        );
        assert_eq!(mailbox(None, "a@x.org").to_string(), "a@x.org");
    }
}

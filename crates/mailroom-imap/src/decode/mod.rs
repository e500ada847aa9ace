//! Decoders that turn grammar events into typed records.
//!
//! The mailbox-data decoder walks the event sequence keeping a [`PathStack`]
//! and matches records by path. The FETCH decoder moves an explicit cursor
//! over the events, each sub-parser returning the index after its subtree.
//! LIST lines go through flat mode, one line at a time.

mod list;
mod mailbox;
mod message;

use tracing::{debug, error};

use crate::grammar::{self, ParseError, Rule, RuleSet, Tree};
use crate::{Error, Result};

pub use list::{decode_list_line, split_path};
pub use mailbox::decode_mailbox_data;
pub use message::decode_message_data;

/// The rules enclosing the current event, outermost first.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathStack(Vec<Rule>);

impl PathStack {
    /// Enters a rule.
    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    /// Leaves the innermost rule.
    pub fn pop(&mut self) -> Option<Rule> {
        self.0.pop()
    }

    /// Returns true if the stack is exactly `pattern`.
    #[must_use]
    pub fn is(&self, pattern: &[Rule]) -> bool {
        self.0 == pattern
    }

    /// Returns true if `pattern` occurs in the stack as a subsequence, in order
    /// but not necessarily adjacent.
    #[must_use]
    pub fn follows(&self, pattern: &[Rule]) -> bool {
        let mut stack = self.0.iter();
        pattern.iter().all(|want| stack.any(|have| have == want))
    }
}

pub(crate) fn parse_failure(err: ParseError, what: &str) -> Error {
    if err.is_fault() {
        error!(%err, "{what}: grammar engine fault");
    } else {
        debug!(%err, "{what}: input does not match grammar");
    }
    Error::from(err)
}

pub(crate) fn parse<'i>(
    input: &'i [u8],
    start: Rule,
    record: &RuleSet,
    what: &str,
) -> Result<Tree<'i>> {
    grammar::parse_tree(input, start, record).map_err(|err| parse_failure(err, what))
}

/// Returns the first direct child of `at` matching `rule`.
pub(crate) fn child(tree: &Tree<'_>, at: usize, rule: Rule) -> Option<usize> {
    tree.children(at)
        .find(|&i| tree.get(i).is_some_and(|e| e.rule == rule))
}

/// Like [`child`], but a missing child is an extraction error.
pub(crate) fn require(tree: &Tree<'_>, at: usize, rule: Rule) -> Result<usize> {
    child(tree, at, rule).ok_or_else(|| {
        let parent = tree.get(at).map_or("?", |e| e.rule.name());
        Error::Extraction(format!("<{parent}> has no <{rule}>"))
    })
}

pub(crate) fn rule_at(tree: &Tree<'_>, at: usize) -> Option<Rule> {
    tree.get(at).map(|e| e.rule)
}

/// Resolves a quoted string's escapes, dropping the surrounding quotes.
fn unquote(bytes: &[u8]) -> Vec<u8> {
    let inner = &bytes[1..bytes.len().saturating_sub(1).max(1)];
    let mut out = Vec::with_capacity(inner.len());
    let mut escaped = false;
    for &b in inner {
        if escaped || b != b'\\' {
            out.push(b);
            escaped = false;
        } else {
            escaped = true;
        }
    }
    out
}

/// Contents of a `string` or `astring`: quoted, literal, or atom.
pub(crate) fn string_bytes(bytes: &[u8]) -> Vec<u8> {
    match bytes.first() {
        Some(b'"') => unquote(bytes),
        Some(b'{') => bytes
            .windows(2)
            .position(|w| w == b"\r\n")
            .map_or_else(Vec::new, |crlf| bytes[crlf + 2..].to_vec()),
        _ => bytes.to_vec(),
    }
}

/// Contents of an `nstring`, `None` for NIL.
pub(crate) fn nstring_bytes(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.eq_ignore_ascii_case(b"NIL") {
        None
    } else {
        Some(string_bytes(bytes))
    }
}

/// The hierarchy delimiter of a LIST line, `None` for NIL.
pub(crate) fn unquote_delimiter(bytes: &[u8]) -> Option<char> {
    nstring_bytes(bytes)?.first().copied().map(char::from)
}

pub(crate) fn nstring_text(bytes: &[u8]) -> Option<String> {
    nstring_bytes(bytes).map(lossy)
}

pub(crate) fn string_text(bytes: &[u8]) -> String {
    lossy(string_bytes(bytes))
}

pub(crate) fn lossy(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

pub(crate) fn text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Parses an unsigned decimal with no fixed width.
pub(crate) fn number(bytes: &[u8]) -> Result<u32> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| Error::Extraction(format!("not a 32-bit number: {}", text(bytes))))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn path_stack_matching() {
        let mut path = PathStack::default();
        for rule in [Rule::ResponseData, Rule::MailboxData, Rule::FlagList] {
            path.push(rule);
        }
        assert!(path.is(&[Rule::ResponseData, Rule::MailboxData, Rule::FlagList]));
        assert!(!path.is(&[Rule::MailboxData, Rule::FlagList]));
        assert!(path.follows(&[Rule::ResponseData, Rule::FlagList]));
        assert!(!path.follows(&[Rule::FlagList, Rule::MailboxData]));
        assert_eq!(path.pop(), Some(Rule::FlagList));
        assert!(path.follows(&[]));
    }

    #[test]
    fn string_forms() {
        assert_eq!(string_bytes(br#""a \"b\" \\c""#), br#"a "b" \c"#);
        assert_eq!(string_bytes(b"\"\""), b"");
        assert_eq!(string_bytes(b"{5}\r\nab\r\nc"), b"ab\r\nc");
        assert_eq!(string_bytes(b"INBOX"), b"INBOX");
        assert_eq!(nstring_bytes(b"nil"), None);
        assert_eq!(nstring_text(b"\"NIL\"").as_deref(), Some("NIL"));
        assert_eq!(unquote_delimiter(b"\"/\""), Some('/'));
        assert_eq!(unquote_delimiter(b"\"\\\\\""), Some('\\'));
        assert_eq!(unquote_delimiter(b"NIL"), None);
    }

    #[test]
    fn numbers() {
        assert_eq!(number(b"0").unwrap(), 0);
        assert_eq!(number(b"4294967295").unwrap(), u32::MAX);
        assert!(number(b"4294967296").unwrap_err().is_parse());
    }
}

//! Received lines and the responses they make up.
//!
//! A [`ResponseLine`] classifies one framed unit with whitespace-only lexing;
//! no grammar runs here. The grammar runs later, over [`ImapResponse::raw`].

use std::borrow::Cow;
use std::ops::Range;
use std::sync::OnceLock;

use crate::types::Status;
use crate::{Error, Result};

/// One line (or literal-bearing unit) from the server, without its final CRLF.
#[derive(Debug, Clone)]
pub struct ResponseLine {
    raw: Vec<u8>,
    tokens: OnceLock<Vec<Range<usize>>>,
}

impl PartialEq for ResponseLine {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for ResponseLine {}

impl ResponseLine {
    /// Wraps a received unit.
    #[must_use]
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self {
            raw: raw.into(),
            tokens: OnceLock::new(),
        }
    }

    /// Returns the raw bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Returns the line as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    fn ranges(&self) -> &[Range<usize>] {
        self.tokens.get_or_init(|| {
            let mut ranges = Vec::new();
            let mut start = 0;
            for (i, &b) in self.raw.iter().enumerate() {
                if b == b' ' {
                    if i > start {
                        ranges.push(start..i);
                    }
                    start = i + 1;
                }
            }
            if self.raw.len() > start {
                ranges.push(start..self.raw.len());
            }
            ranges
        })
    }

    /// Returns the number of space-separated tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.ranges().len()
    }

    /// Returns the token at `index`.
    #[must_use]
    pub fn token(&self, index: usize) -> Option<&[u8]> {
        self.ranges().get(index).map(|r| &self.raw[r.clone()])
    }

    /// Returns the token at `index` if it is valid UTF-8.
    #[must_use]
    pub fn token_str(&self, index: usize) -> Option<&str> {
        self.token(index).and_then(|t| std::str::from_utf8(t).ok())
    }

    /// Returns everything after the first `skip` tokens.
    #[must_use]
    pub fn rest(&self, skip: usize) -> Cow<'_, str> {
        match self.ranges().get(skip) {
            Some(range) => String::from_utf8_lossy(&self.raw[range.start..]),
            None => Cow::Borrowed(""),
        }
    }

    /// Returns true if the first token is exactly `token`.
    #[must_use]
    pub fn first_token_is(&self, token: &str) -> bool {
        self.token(0) == Some(token.as_bytes())
    }

    /// `* ...`
    #[must_use]
    pub fn is_untagged(&self) -> bool {
        self.first_token_is("*")
    }

    /// `+ ...`
    #[must_use]
    pub fn is_continuation(&self) -> bool {
        self.first_token_is("+")
    }

    /// `<tag> ...`
    #[must_use]
    pub fn is_tagged(&self, tag: &str) -> bool {
        !tag.is_empty() && self.first_token_is(tag)
    }

    /// Status keyword in the second token, for condition lines.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.token_str(1).and_then(Status::parse)
    }
}

/// All lines received for one command, ending with its tagged line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImapResponse {
    /// Tag the command was sent with.
    pub tag: String,
    /// Lines in arrival order.
    pub lines: Vec<ResponseLine>,
}

impl ImapResponse {
    /// Creates an empty response for `tag`.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            lines: Vec::new(),
        }
    }

    /// Returns the lines re-joined with CRLF, ready for the grammar.
    #[must_use]
    pub fn raw(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.lines.iter().map(|l| l.raw.len() + 2).sum());
        for line in &self.lines {
            out.extend_from_slice(&line.raw);
            out.extend_from_slice(b"\r\n");
        }
        out
    }

    /// Returns the tagged completion line.
    #[must_use]
    pub fn completion(&self) -> Option<&ResponseLine> {
        self.lines.last().filter(|l| l.is_tagged(&self.tag))
    }

    /// Returns the status of the completion line.
    #[must_use]
    pub fn status(&self) -> Option<Status> {
        self.completion().and_then(ResponseLine::status)
    }

    /// Returns the untagged lines.
    pub fn untagged(&self) -> impl Iterator<Item = &ResponseLine> {
        self.lines.iter().filter(|l| l.is_untagged())
    }

    /// Returns the text after the completion status.
    #[must_use]
    pub fn completion_text(&self) -> String {
        self.completion()
            .map(|l| l.rest(2).into_owned())
            .unwrap_or_default()
    }

    /// Turns a tagged NO or BAD into an error.
    ///
    /// # Errors
    ///
    /// [`Error::No`], [`Error::Bad`], or [`Error::Protocol`] for a missing or
    /// unknown completion status.
    pub fn ensure_ok(self) -> Result<Self> {
        match self.status() {
            Some(Status::Ok) => Ok(self),
            Some(Status::No) => Err(Error::No(self.completion_text())),
            Some(Status::Bad) => Err(Error::Bad(self.completion_text())),
            _ => Err(Error::Protocol(format!(
                "no usable completion for tag {}",
                self.tag
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tokens_collapse_repeated_spaces() {
        let line = ResponseLine::new("A1  OK   done ");
        assert_eq!(line.token_count(), 3);
        assert_eq!(line.token(0), Some(&b"A1"[..]));
        assert_eq!(line.token_str(2), Some("done"));
        assert_eq!(line.token(3), None);
    }

    #[test]
    fn classification() {
        assert!(ResponseLine::new("* 3 EXISTS").is_untagged());
        assert!(ResponseLine::new("+ eyJzdGF0dXMiOiI0MDAifQ==").is_continuation());
        assert!(ResponseLine::new("+").is_continuation());
        assert!(ResponseLine::new("A7 OK done").is_tagged("A7"));
        assert!(!ResponseLine::new("A70 OK done").is_tagged("A7"));
        assert!(!ResponseLine::new("*3 EXISTS").is_untagged());
        assert!(!ResponseLine::new("").is_tagged(""));
    }

    #[test]
    fn status_and_rest() {
        let line = ResponseLine::new("A0 NO [AUTHENTICATIONFAILED] Invalid credentials");
        assert_eq!(line.status(), Some(Status::No));
        assert_eq!(line.rest(2), "[AUTHENTICATIONFAILED] Invalid credentials");
        assert_eq!(line.rest(9), "");
    }

    #[test]
    fn raw_rejoins_with_crlf() {
        let mut response = ImapResponse::new("A1");
        response.lines.push(ResponseLine::new("* 1 EXISTS"));
        response.lines.push(ResponseLine::new("A1 OK done"));
        assert_eq!(response.raw(), b"* 1 EXISTS\r\nA1 OK done\r\n");
        assert_eq!(response.untagged().count(), 1);
        assert_eq!(response.status(), Some(Status::Ok));
    }

    #[test]
    fn ensure_ok_maps_no_and_bad() {
        let mut response = ImapResponse::new("A2");
        response.lines.push(ResponseLine::new("A2 NO [NONEXISTENT] Unknown Mailbox: FLAKS"));
        let err = response.clone().ensure_ok().unwrap_err();
        assert!(matches!(err, Error::No(ref text) if text == "[NONEXISTENT] Unknown Mailbox: FLAKS"));

        response.lines[0] = ResponseLine::new("A2 BAD Could not parse command");
        assert!(matches!(response.ensure_ok(), Err(Error::Bad(_))));
    }

    #[test]
    fn ensure_ok_without_completion_is_protocol_error() {
        let mut response = ImapResponse::new("A3");
        response.lines.push(ResponseLine::new("* OK hi"));
        assert!(matches!(response.ensure_ok(), Err(Error::Protocol(_))));
    }
}

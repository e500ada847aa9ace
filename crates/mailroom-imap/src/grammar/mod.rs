//! ABNF-driven matcher for IMAP server responses.
//!
//! The grammar is a table of [`Rule`]s built once per process. A parse starts
//! at any rule and either consumes the whole input or fails; there is no
//! partial success. Two ways to consume a parse:
//!
//! - [`parse_tree`] returns a [`Tree`]: the ordered enter/exit [`Event`]s of
//!   every rule in a caller-supplied [`RuleSet`]. Decoders walk it with a path
//!   stack or by index.
//! - [`parse_flat`] calls back once per recorded rule match with the matched
//!   bytes, for single-shot extraction.
//!
//! Literals (`{N}\r\n` + N octets) are handled by two user-defined terminals
//! that count bytes exactly, so a literal body may contain CRLF and text
//! that looks like protocol.
//!
//! # Example
//!
//! ```
//! use mailroom_imap::grammar::{self, Rule, RuleSet};
//!
//! const FLAGS: RuleSet = RuleSet::of(&[Rule::Flag]);
//!
//! let mut flags = Vec::new();
//! grammar::parse_flat(b"* FLAGS (\\Seen \\Draft)\r\n", Rule::ResponseData, &FLAGS, |_, bytes| {
//!     flags.push(String::from_utf8_lossy(bytes).into_owned());
//! })
//! .unwrap();
//! assert_eq!(flags, ["\\Seen", "\\Draft"]);
//! ```

mod engine;
mod rules;
mod terminal;

use std::sync::LazyLock;

use thiserror::Error;

pub use engine::{Children, Event, EventKind, MAX_DEPTH, Tree, parse_flat, parse_tree};
pub use rules::Rule;

use rules::Grammar;

static IMAP: LazyLock<Grammar> = LazyLock::new(Grammar::imap);

/// A set of rules whose matches are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSet([bool; Rule::COUNT]);

impl RuleSet {
    /// Reports nothing; only useful to validate input.
    pub const EMPTY: Self = Self([false; Rule::COUNT]);

    /// Reports every rule.
    pub const ALL: Self = Self([true; Rule::COUNT]);

    /// Builds a set from a list of rules.
    #[must_use]
    pub const fn of(rules: &[Rule]) -> Self {
        let mut set = [false; Rule::COUNT];
        let mut i = 0;
        while i < rules.len() {
            set[rules[i] as usize] = true;
            i += 1;
        }
        Self(set)
    }

    /// Returns true if matches of `rule` are reported.
    #[must_use]
    pub const fn contains(&self, rule: Rule) -> bool {
        self.0[rule as usize]
    }
}

/// Failure of a grammar parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The input does not match the start rule.
    #[error("input does not match <{rule}> (stopped at byte {position})")]
    NoMatch {
        /// Rule the parse started at.
        rule: Rule,
        /// Furthest byte any alternative reached.
        position: usize,
    },

    /// The start rule matched a prefix only.
    #[error("<{rule}> matched but input continues at byte {position}")]
    TrailingInput {
        /// Rule the parse started at.
        rule: Rule,
        /// End of the match.
        position: usize,
    },

    /// The matcher hit its nesting limit.
    #[error("rules nested deeper than {limit} at byte {position}")]
    TooDeep {
        /// The nesting limit.
        limit: usize,
        /// Where the limit was hit.
        position: usize,
    },
}

impl ParseError {
    /// Returns the byte position the error refers to.
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::NoMatch { position, .. }
            | Self::TrailingInput { position, .. }
            | Self::TooDeep { position, .. } => *position,
        }
    }

    /// Returns true for matcher faults, as opposed to input mismatches.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::TooDeep { .. })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rule_set_membership() {
        let set = RuleSet::of(&[Rule::Flag, Rule::Atom]);
        assert!(set.contains(Rule::Flag));
        assert!(set.contains(Rule::Atom));
        assert!(!set.contains(Rule::FlagList));
        assert!(!RuleSet::EMPTY.contains(Rule::Response));
        assert!(RuleSet::ALL.contains(Rule::NzNumber));
    }

    #[test]
    fn parse_error_positions() {
        let err = ParseError::NoMatch {
            rule: Rule::Response,
            position: 7,
        };
        assert_eq!(err.position(), 7);
        assert!(!err.is_fault());
        assert_eq!(
            err.to_string(),
            "input does not match <response> (stopped at byte 7)"
        );
    }

    #[test]
    fn greeting_with_capabilities() {
        let set = RuleSet::of(&[Rule::Capability]);
        let mut caps = Vec::new();
        parse_flat(
            b"* OK [CAPABILITY IMAP4rev1 SASL-IR AUTH=XOAUTH2] Gimap ready\r\n",
            Rule::Greeting,
            &set,
            |_, bytes| caps.push(bytes.to_vec()),
        )
        .unwrap();
        assert_eq!(caps.len(), 3);
        assert_eq!(caps[2], b"AUTH=XOAUTH2");
    }

    #[test]
    fn rfc_select_transcript_matches() {
        let input = b"* 172 EXISTS\r\n\
* 1 RECENT\r\n\
* OK [UNSEEN 12] Message 12 is first unseen\r\n\
* OK [UIDVALIDITY 3857529045] UIDs valid\r\n\
* OK [UIDNEXT 4392] Predicted next UID\r\n\
* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n\
A142 OK [READ-WRITE] SELECT completed\r\n";
        assert!(parse_tree(input, Rule::Response, &RuleSet::ALL).is_ok());
    }

    #[test]
    fn nested_bodystructure_matches() {
        let input = br#"* 1 FETCH (BODYSTRUCTURE ((("TEXT" "PLAIN" ("CHARSET" "UTF-8") NIL NIL "7BIT" 10 1 NIL NIL NIL)("TEXT" "HTML" ("CHARSET" "UTF-8") NIL NIL "QUOTED-PRINTABLE" 20 1 NIL NIL NIL) "ALTERNATIVE" ("BOUNDARY" "b1") NIL NIL)("APPLICATION" "PDF" ("NAME" "a.pdf") NIL NIL "BASE64" 300 NIL ("ATTACHMENT" ("FILENAME" "a.pdf")) NIL) "MIXED" ("BOUNDARY" "b0") NIL NIL NIL))
A1 OK FETCH completed
"#;
        let input = String::from_utf8_lossy(input).replace('\n', "\r\n");
        assert!(parse_tree(input.as_bytes(), Rule::Response, &RuleSet::EMPTY).is_ok());
    }
}

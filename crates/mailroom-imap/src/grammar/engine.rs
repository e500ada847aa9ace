//! Backtracking matcher over the rule table.

use super::rules::{Grammar, Node};
use super::terminal::LiteralState;
use super::{ParseError, Rule, RuleSet};

/// Maximum rule nesting before the matcher gives up.
pub const MAX_DEPTH: usize = 200;

/// Whether an event opens or closes a rule match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Pre-order event.
    Enter,
    /// Post-order event.
    Exit,
}

/// One rule boundary in a successful parse.
///
/// `offset` and `len` describe the bytes the rule matched and are the same on
/// the enter and exit event of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    /// The rule that matched.
    pub rule: Rule,
    /// Enter or exit.
    pub kind: EventKind,
    /// Start of the match in the input.
    pub offset: usize,
    /// Length of the match.
    pub len: usize,
    pair: usize,
}

/// Result of a tree-mode parse: the event sequence for every recorded rule,
/// in traversal order.
#[derive(Debug, Clone)]
pub struct Tree<'i> {
    input: &'i [u8],
    events: Vec<Event>,
}

impl<'i> Tree<'i> {
    /// Returns the parsed input.
    #[must_use]
    pub const fn input(&self) -> &'i [u8] {
        self.input
    }

    /// Returns all events.
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Returns the event at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Returns the bytes an event covers.
    #[must_use]
    pub fn bytes(&self, event: &Event) -> &'i [u8] {
        &self.input[event.offset..event.offset + event.len]
    }

    /// Returns the bytes covered by the event at `index`.
    #[must_use]
    pub fn bytes_at(&self, index: usize) -> &'i [u8] {
        self.events
            .get(index)
            .map_or(&[][..], |event| self.bytes(event))
    }

    /// Returns the index just past the subtree opened at `index`.
    #[must_use]
    pub fn end(&self, index: usize) -> usize {
        match self.events.get(index) {
            Some(event) if event.kind == EventKind::Enter => event.pair + 1,
            _ => index + 1,
        }
    }

    /// Iterates over the enter indices of the direct children of `index`.
    #[must_use]
    pub fn children(&self, index: usize) -> Children<'_, 'i> {
        Children {
            tree: self,
            next: index + 1,
            stop: self.end(index).saturating_sub(1),
        }
    }
}

/// Iterator returned by [`Tree::children`].
#[derive(Debug)]
pub struct Children<'t, 'i> {
    tree: &'t Tree<'i>,
    next: usize,
    stop: usize,
}

impl Iterator for Children<'_, '_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.next >= self.stop {
            return None;
        }
        let current = self.next;
        self.next = self.tree.end(current);
        Some(current)
    }
}

struct Matcher<'a> {
    grammar: &'a Grammar,
    input: &'a [u8],
    record: &'a RuleSet,
    events: Vec<Event>,
    literal: LiteralState,
    depth: usize,
    furthest: usize,
}

type Step = Result<Option<usize>, ParseError>;

impl<'a> Matcher<'a> {
    const fn new(grammar: &'a Grammar, input: &'a [u8], record: &'a RuleSet) -> Self {
        Self {
            grammar,
            input,
            record,
            events: Vec::new(),
            literal: LiteralState::new(),
            depth: 0,
            furthest: 0,
        }
    }

    fn reach(&mut self, end: usize) -> Option<usize> {
        self.furthest = self.furthest.max(end);
        Some(end)
    }

    fn rule(&mut self, rule: Rule, pos: usize) -> Step {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_DEPTH,
                position: pos,
            });
        }

        let recorded = self.record.contains(rule);
        let enter = self.events.len();
        if recorded {
            self.events.push(Event {
                rule,
                kind: EventKind::Enter,
                offset: pos,
                len: 0,
                pair: enter,
            });
        }

        let grammar = self.grammar;
        self.depth += 1;
        let outcome = self.node(grammar.definition(rule), pos)?;
        self.depth -= 1;

        match outcome {
            Some(end) => {
                if recorded {
                    let exit = self.events.len();
                    self.events[enter].len = end - pos;
                    self.events[enter].pair = exit;
                    self.events.push(Event {
                        rule,
                        kind: EventKind::Exit,
                        offset: pos,
                        len: end - pos,
                        pair: enter,
                    });
                }
                Ok(Some(end))
            }
            None => {
                self.events.truncate(enter);
                Ok(None)
            }
        }
    }

    fn node(&mut self, node: &Node, pos: usize) -> Step {
        match node {
            Node::Alt(options) => {
                for option in options {
                    let mark = self.events.len();
                    let literal = self.literal;
                    if let Some(end) = self.node(option, pos)? {
                        return Ok(Some(end));
                    }
                    self.events.truncate(mark);
                    self.literal = literal;
                }
                Ok(None)
            }
            Node::Cat(items) => {
                let mark = self.events.len();
                let mut at = pos;
                for item in items {
                    match self.node(item, at)? {
                        Some(end) => at = end,
                        None => {
                            self.events.truncate(mark);
                            return Ok(None);
                        }
                    }
                }
                Ok(Some(at))
            }
            Node::Repeat { min, max, node } => self.repeat(*min, *max, node, pos),
            Node::Rule(rule) => self.rule(*rule, pos),
            Node::Keyword(word) => {
                let end = pos + word.len();
                match self.input.get(pos..end) {
                    Some(found) if found.eq_ignore_ascii_case(word) => Ok(self.reach(end)),
                    _ => Ok(None),
                }
            }
            Node::Byte(expected) => match self.input.get(pos) {
                Some(b) if b == expected => Ok(self.reach(pos + 1)),
                _ => Ok(None),
            },
            Node::Class(class) => match self.input.get(pos) {
                Some(&b) if class.contains(b) => Ok(self.reach(pos + 1)),
                _ => Ok(None),
            },
            Node::Terminal(terminal) => {
                match terminal.matches(self.input, pos, &mut self.literal) {
                    Some(end) => Ok(self.reach(end)),
                    None => Ok(None),
                }
            }
        }
    }

    fn repeat(&mut self, min: u32, max: Option<u32>, node: &Node, pos: usize) -> Step {
        let mark = self.events.len();
        let mut count = 0;
        let mut at = pos;

        while max.is_none_or(|max| count < max) {
            let step = self.events.len();
            let literal = self.literal;
            match self.node(node, at)? {
                Some(end) if end > at => {
                    at = end;
                    count += 1;
                }
                // An empty match would repeat forever.
                Some(_) => {
                    count = count.max(min);
                    break;
                }
                None => {
                    self.events.truncate(step);
                    self.literal = literal;
                    break;
                }
            }
        }

        if count < min {
            self.events.truncate(mark);
            return Ok(None);
        }
        Ok(Some(at))
    }
}

/// Matches `input` against `start` and returns the events of every rule in
/// `record`.
///
/// The whole input must be consumed.
///
/// # Errors
///
/// [`ParseError::NoMatch`] if the input does not match,
/// [`ParseError::TrailingInput`] if it matches only a prefix, and
/// [`ParseError::TooDeep`] if nesting exceeds [`MAX_DEPTH`].
pub fn parse_tree<'i>(
    input: &'i [u8],
    start: Rule,
    record: &RuleSet,
) -> Result<Tree<'i>, ParseError> {
    let grammar: &Grammar = &super::IMAP;
    let mut matcher = Matcher::new(grammar, input, record);

    match matcher.rule(start, 0)? {
        Some(end) if end == input.len() => Ok(Tree {
            input,
            events: matcher.events,
        }),
        Some(end) => Err(ParseError::TrailingInput {
            rule: start,
            position: end,
        }),
        None => Err(ParseError::NoMatch {
            rule: start,
            position: matcher.furthest,
        }),
    }
}

/// Matches `input` against `start` and calls `on_match` once per match of a
/// rule in `record`, with the matched bytes.
///
/// Callbacks fire in post-order, after the whole input has matched.
///
/// # Errors
///
/// Same as [`parse_tree`]; no callback fires on failure.
pub fn parse_flat<F>(
    input: &[u8],
    start: Rule,
    record: &RuleSet,
    mut on_match: F,
) -> Result<(), ParseError>
where
    F: FnMut(Rule, &[u8]),
{
    let tree = parse_tree(input, start, record)?;
    for event in tree.events().iter().filter(|e| e.kind == EventKind::Exit) {
        on_match(event.rule, tree.bytes(event));
    }
    Ok(())
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
    use proptest::prelude::*;

    const LITERALS: RuleSet = RuleSet::of(&[Rule::Literal, Rule::LiteralData]);

    fn fetch(body: &[u8]) -> Vec<u8> {
        let mut input = b"* 1 FETCH (RFC822 ".to_vec();
        input.extend_from_slice(body);
        input.extend_from_slice(b")\r\nA1 OK done\r\n");
        input
    }

    #[test]
    fn literal_exact_size_matches() {
        let input = fetch(b"{4}\r\n1234");
        let tree = parse_tree(&input, Rule::Response, &LITERALS).unwrap();
        let data = tree
            .events()
            .iter()
            .find(|e| e.rule == Rule::LiteralData)
            .unwrap();
        assert_eq!(tree.bytes(data), b"1234");
    }

    #[test]
    fn literal_short_or_long_fails() {
        assert!(parse_tree(&fetch(b"{4}\r\n123"), Rule::Response, &LITERALS).is_err());
        assert!(parse_tree(&fetch(b"{4}\r\n12345"), Rule::Response, &LITERALS).is_err());
    }

    #[test]
    fn empty_literal_matches() {
        let input = fetch(b"{0}\r\n");
        let tree = parse_tree(&input, Rule::Response, &LITERALS).unwrap();
        let data = tree
            .events()
            .iter()
            .find(|e| e.rule == Rule::LiteralData)
            .unwrap();
        assert_eq!(data.len, 0);
    }

    #[test]
    fn literal_may_contain_crlf_and_tag_like_text() {
        let input = fetch(b"{22}\r\n0123\r\nA0 8901\r\n0123456");
        assert!(parse_tree(&input, Rule::Response, &LITERALS).is_ok());
    }

    #[test]
    fn events_are_paired_and_nested() {
        let record = RuleSet::of(&[Rule::FlagList, Rule::Flag]);
        let tree = parse_tree(b"* FLAGS (\\Seen $Junk)\r\nA1 OK\r\n", Rule::Response, &record)
            .unwrap();
        let kinds: Vec<_> = tree.events().iter().map(|e| (e.rule, e.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (Rule::FlagList, EventKind::Enter),
                (Rule::Flag, EventKind::Enter),
                (Rule::Flag, EventKind::Exit),
                (Rule::Flag, EventKind::Enter),
                (Rule::Flag, EventKind::Exit),
                (Rule::FlagList, EventKind::Exit),
            ]
        );
        assert_eq!(tree.end(0), 6);
        let children: Vec<_> = tree.children(0).map(|i| tree.bytes_at(i)).collect();
        assert_eq!(children, vec![&b"\\Seen"[..], &b"$Junk"[..]]);
    }

    #[test]
    fn failed_alternatives_leave_no_events() {
        // `1 EXPUNGE` first tries mailbox-data and message-data.
        let record = RuleSet::of(&[Rule::MailboxData, Rule::MessageData, Rule::MessageExpunge]);
        let tree = parse_tree(b"* 1 EXPUNGE\r\nA1 OK\r\n", Rule::Response, &record).unwrap();
        assert_eq!(tree.events().len(), 2);
        assert_eq!(tree.events()[0].rule, Rule::MessageExpunge);
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert!(parse_tree(b"* 3 exists\r\na1 ok fine\r\n", Rule::Response, &RuleSet::EMPTY).is_ok());
    }

    #[test]
    fn mismatch_reports_furthest_position() {
        let err = parse_tree(b"* FLAGS (\\Seen", Rule::ResponseData, &RuleSet::EMPTY).unwrap_err();
        assert!(matches!(err, ParseError::NoMatch { rule: Rule::ResponseData, .. }));
        assert_eq!(err.position(), 14);
    }

    #[test]
    fn trailing_input_is_reported() {
        let err = parse_tree(b"NIL NIL", Rule::Nstring, &RuleSet::EMPTY).unwrap_err();
        assert_eq!(
            err,
            ParseError::TrailingInput {
                rule: Rule::Nstring,
                position: 3
            }
        );
    }

    #[test]
    fn deep_nesting_is_a_fault() {
        let input = "(".repeat(MAX_DEPTH);
        let err = parse_tree(input.as_bytes(), Rule::Body, &RuleSet::EMPTY).unwrap_err();
        assert!(err.is_fault());
    }

    #[test]
    fn flat_mode_reports_post_order() {
        let record = RuleSet::of(&[Rule::Capability, Rule::CapabilityData]);
        let mut seen = Vec::new();
        parse_flat(
            b"* CAPABILITY IMAP4rev1 AUTH=XOAUTH2\r\n",
            Rule::ResponseData,
            &record,
            |rule, bytes| seen.push((rule, String::from_utf8_lossy(bytes).into_owned())),
        )
        .unwrap();
        assert_eq!(
            seen,
            vec![
                (Rule::Capability, "IMAP4rev1".to_string()),
                (Rule::Capability, "AUTH=XOAUTH2".to_string()),
                (
                    Rule::CapabilityData,
                    "CAPABILITY IMAP4rev1 AUTH=XOAUTH2".to_string()
                ),
            ]
        );
    }

    #[test]
    fn flat_mode_fires_nothing_on_failure() {
        let mut calls = 0;
        let result = parse_flat(b"* LIST (\\Noselect", Rule::ResponseData, &RuleSet::ALL, |_, _| {
            calls += 1;
        });
        assert!(result.is_err());
        assert_eq!(calls, 0);
    }

    proptest! {
        #[test]
        fn literal_accepts_exactly_declared_octets(data in proptest::collection::vec(1u8..=255, 0..64)) {
            let mut input = format!("{{{}}}\r\n", data.len()).into_bytes();
            input.extend_from_slice(&data);

            let tree = parse_tree(&input, Rule::Literal, &LITERALS).unwrap();
            let event = tree.events().iter().find(|e| e.rule == Rule::LiteralData).unwrap();
            prop_assert_eq!(tree.bytes(event), &data[..]);

            let mut longer = input.clone();
            longer.push(b'x');
            prop_assert!(parse_tree(&longer, Rule::Literal, &LITERALS).is_err());

            if !data.is_empty() {
                prop_assert!(parse_tree(&input[..input.len() - 1], Rule::Literal, &LITERALS).is_err());
            }
        }
    }
}

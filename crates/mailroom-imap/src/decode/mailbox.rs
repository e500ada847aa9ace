//! `mailbox-data` and response-code records (SELECT results).

use tracing::debug;

use super::{PathStack, number, parse, text};
use crate::grammar::{EventKind, Rule, RuleSet};
use crate::types::MailboxDataRecord;
use crate::{Error, Result};

const RECORDED: RuleSet = RuleSet::of(&[
    Rule::ResponseData,
    Rule::ResponseTagged,
    Rule::MailboxData,
    Rule::MailboxExists,
    Rule::MailboxRecent,
    Rule::FlagList,
    Rule::Flag,
    Rule::RespTextCode,
    Rule::CodePermanentFlags,
    Rule::FlagPerm,
    Rule::CodeUidValidity,
    Rule::CodeUidNext,
    Rule::CodeUnseen,
    Rule::CodeReadOnly,
    Rule::CodeReadWrite,
    Rule::CodeTryCreate,
    Rule::Number,
]);

const FLAGS: &[Rule] = &[Rule::ResponseData, Rule::MailboxData, Rule::FlagList];
const FLAG: &[Rule] = &[
    Rule::ResponseData,
    Rule::MailboxData,
    Rule::FlagList,
    Rule::Flag,
];
const PERMANENT_FLAG: &[Rule] = &[Rule::RespTextCode, Rule::CodePermanentFlags, Rule::FlagPerm];
const EXISTS: &[Rule] = &[
    Rule::ResponseData,
    Rule::MailboxData,
    Rule::MailboxExists,
    Rule::Number,
];
const RECENT: &[Rule] = &[
    Rule::ResponseData,
    Rule::MailboxData,
    Rule::MailboxRecent,
    Rule::Number,
];

/// Decodes mailbox state from a complete response, in server order.
///
/// # Errors
///
/// [`Error::Syntax`] if the response does not match the grammar and
/// [`Error::Extraction`] if it carries no mailbox data at all.
pub fn decode_mailbox_data(input: &[u8]) -> Result<Vec<MailboxDataRecord>> {
    let tree = parse(input, Rule::Response, &RECORDED, "mailbox-data")?;

    let mut path = PathStack::default();
    let mut flags = Vec::new();
    let mut records = Vec::new();

    for event in tree.events() {
        if event.kind == EventKind::Enter {
            path.push(event.rule);
            if path.is(FLAGS) || event.rule == Rule::CodePermanentFlags {
                flags.clear();
            }
            continue;
        }

        let bytes = tree.bytes(event);
        let record = match event.rule {
            Rule::Flag if path.is(FLAG) => {
                flags.push(text(bytes));
                None
            }
            Rule::FlagPerm if path.follows(PERMANENT_FLAG) => {
                flags.push(text(bytes));
                None
            }
            Rule::FlagList if path.is(FLAGS) => {
                Some(MailboxDataRecord::Flags(std::mem::take(&mut flags)))
            }
            Rule::CodePermanentFlags => Some(MailboxDataRecord::PermanentFlags(std::mem::take(
                &mut flags,
            ))),
            Rule::Number if path.is(EXISTS) => Some(MailboxDataRecord::Exists(number(bytes)?)),
            Rule::Number if path.is(RECENT) => Some(MailboxDataRecord::Recent(number(bytes)?)),
            Rule::Number if path.follows(&[Rule::RespTextCode, Rule::CodeUidValidity]) => {
                Some(MailboxDataRecord::UidValidity(number(bytes)?))
            }
            Rule::Number if path.follows(&[Rule::RespTextCode, Rule::CodeUidNext]) => {
                Some(MailboxDataRecord::UidNext(number(bytes)?))
            }
            Rule::Number if path.follows(&[Rule::RespTextCode, Rule::CodeUnseen]) => {
                Some(MailboxDataRecord::Unseen(number(bytes)?))
            }
            Rule::CodeReadOnly => Some(MailboxDataRecord::ReadOnly),
            Rule::CodeReadWrite => Some(MailboxDataRecord::ReadWrite),
            Rule::CodeTryCreate => Some(MailboxDataRecord::TryCreate),
            _ => None,
        };
        records.extend(record);
        path.pop();
    }

    if records.is_empty() {
        return Err(Error::Extraction(
            "response carries no mailbox data".to_string(),
        ));
    }
    debug!(count = records.len(), "decoded mailbox data");
    Ok(records)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::unreadable_literal,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use MailboxDataRecord as R;

    fn flags(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn select_transcript_in_order() {
        let input = b"* FLAGS (\\Answered \\Flagged \\Draft \\Deleted \\Seen $NotPhishing $Phishing)\r\n\
* OK [PERMANENTFLAGS (\\Answered \\Flagged \\Draft \\Deleted \\Seen $NotPhishing $Phishing \\*)] Flags permitted.\r\n\
* OK [UIDVALIDITY 1] UIDs valid.\r\n\
* 1317 EXISTS\r\n\
* 0 RECENT\r\n\
* OK [UIDNEXT 1579] Predicted next UID.\r\n\
* OK [HIGHESTMODSEQ 188741]\r\n\
A2 OK [READ-WRITE] INBOX selected. (Success)\r\n";

        let records = decode_mailbox_data(input).unwrap();
        assert_eq!(
            records,
            vec![
                R::Flags(flags(&[
                    "\\Answered",
                    "\\Flagged",
                    "\\Draft",
                    "\\Deleted",
                    "\\Seen",
                    "$NotPhishing",
                    "$Phishing"
                ])),
                R::PermanentFlags(flags(&[
                    "\\Answered",
                    "\\Flagged",
                    "\\Draft",
                    "\\Deleted",
                    "\\Seen",
                    "$NotPhishing",
                    "$Phishing",
                    "\\*"
                ])),
                R::UidValidity(1),
                R::Exists(1317),
                R::Recent(0),
                R::UidNext(1579),
                R::ReadWrite,
            ]
        );
    }

    #[test]
    fn uidvalidity_alone() {
        let records =
            decode_mailbox_data(b"* OK [UIDVALIDITY 1] UIDs valid.\r\nA3 OK Success.\r\n").unwrap();
        assert_eq!(records, vec![R::UidValidity(1)]);
    }

    #[test]
    fn repeated_exists_kept_in_order() {
        let records =
            decode_mailbox_data(b"* 9 EXISTS\r\n* 1 RECENT\r\n* 10 EXISTS\r\nA1 OK done\r\n")
                .unwrap();
        assert_eq!(records, vec![R::Exists(9), R::Recent(1), R::Exists(10)]);
    }

    #[test]
    fn unseen_read_only_and_trycreate() {
        let records = decode_mailbox_data(
            b"* OK [UNSEEN 12] first unseen\r\n* NO [TRYCREATE] no such mailbox\r\nA1 OK [READ-ONLY] done\r\n",
        )
        .unwrap();
        assert_eq!(records, vec![R::Unseen(12), R::TryCreate, R::ReadOnly]);
    }

    #[test]
    fn empty_flag_list() {
        let records = decode_mailbox_data(b"* FLAGS ()\r\nA1 OK\r\n").unwrap();
        assert_eq!(records, vec![R::Flags(Vec::new())]);
    }

    #[test]
    fn unterminated_flag_list_fails() {
        let err = decode_mailbox_data(b"* FLAGS (\\Seen\r\nA1 OK done\r\n").unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }

    #[test]
    fn missing_untagged_marker_fails_whole_response() {
        let err = decode_mailbox_data(b"* 1 RECENT\r\n 9 EXISTS\r\nA1 OK done\r\n").unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn no_records_is_extraction_error() {
        let err = decode_mailbox_data(b"* OK still here\r\nA1 OK done\r\n").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn fetch_numbers_are_not_mailbox_data() {
        let err = decode_mailbox_data(b"* 4 FETCH (UID 9)\r\nA1 OK done\r\n").unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}

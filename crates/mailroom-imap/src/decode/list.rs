//! LIST / LSUB lines, decoded one at a time in flat mode.

use super::{parse_failure, string_text, text, unquote_delimiter};
use crate::Result;
use crate::grammar::{self, Rule, RuleSet};
use crate::types::ListEntry;
use crate::utf7;

const RECORDED: RuleSet = RuleSet::of(&[
    Rule::MailboxList,
    Rule::MbxListFlag,
    Rule::Delimiter,
    Rule::Mailbox,
]);

/// Decodes one untagged line (without CRLF).
///
/// Returns `Ok(None)` for valid lines that are not LIST or LSUB data.
///
/// # Errors
///
/// [`crate::Error::Syntax`] if the line does not match `response-data`.
pub fn decode_list_line(line: &[u8]) -> Result<Option<ListEntry>> {
    let mut input = Vec::with_capacity(line.len() + 2);
    input.extend_from_slice(line);
    input.extend_from_slice(b"\r\n");

    let mut listed = false;
    let mut flags = Vec::new();
    let mut delimiter = None;
    let mut raw_name = String::new();

    grammar::parse_flat(&input, Rule::ResponseData, &RECORDED, |rule, bytes| match rule {
        Rule::MbxListFlag => flags.push(text(bytes)),
        Rule::Delimiter => delimiter = unquote_delimiter(bytes),
        Rule::Mailbox => raw_name = string_text(bytes),
        Rule::MailboxList => listed = true,
        _ => {}
    })
    .map_err(|err| parse_failure(err, "LIST"))?;

    if !listed {
        return Ok(None);
    }

    Ok(Some(ListEntry {
        path: split_path(&raw_name, delimiter),
        flags,
        delimiter,
        raw_name,
    }))
}

/// Splits a mailbox name on its delimiter and decodes each segment from
/// modified UTF-7. Empty segments are dropped; segments that are not valid
/// UTF-7 are kept as sent.
#[must_use]
pub fn split_path(raw_name: &str, delimiter: Option<char>) -> Vec<String> {
    let decode = |segment: &str| utf7::decode(segment).unwrap_or_else(|| segment.to_string());

    match delimiter {
        Some(delimiter) => raw_name
            .split(delimiter)
            .filter(|segment| !segment.is_empty())
            .map(decode)
            .collect(),
        None if raw_name.is_empty() => Vec::new(),
        None => vec![decode(raw_name)],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn entry(line: &str) -> ListEntry {
        decode_list_line(line.as_bytes()).unwrap().unwrap()
    }

    #[test]
    fn gmail_utf7_names() {
        let trash = entry(r#"* LIST (\HasNoChildren \Trash) "/" "[Gmail]/&BBoEPgRIBDgEOg-""#);
        assert_eq!(trash.path, vec!["[Gmail]", "Кошик"]);
        assert_eq!(trash.flags, vec!["\\HasNoChildren", "\\Trash"]);
        assert_eq!(trash.delimiter, Some('/'));
        assert_eq!(trash.raw_name, "[Gmail]/&BBoEPgRIBDgEOg-");

        let drafts = entry(r#"* LIST (\Drafts \HasNoChildren) "/" "[Gmail]/&BCcENQRABD0ENQRCBDoEOA-""#);
        assert_eq!(drafts.path, vec!["[Gmail]", "Чернетки"]);
    }

    #[test]
    fn rfc_examples() {
        let root = entry(r#"* LIST (\Noselect) "/" """#);
        assert!(root.path.is_empty());
        assert_eq!(root.delimiter, Some('/'));

        let news = entry(r#"* LIST (\Noselect) "." #news."#);
        assert_eq!(news.path, vec!["#news"]);

        let home = entry(r#"* LIST () "/" ~/Mail/foo"#);
        assert!(home.flags.is_empty());
        assert_eq!(home.path, vec!["~", "Mail", "foo"]);

        let lsub = entry(r#"* LSUB () "." #news.comp.mail.misc"#);
        assert_eq!(lsub.path, vec!["#news", "comp", "mail", "misc"]);
    }

    #[test]
    fn nil_delimiter_is_one_segment() {
        let flat = entry(r#"* LIST (\HasNoChildren) NIL "a/b""#);
        assert_eq!(flat.delimiter, None);
        assert_eq!(flat.path, vec!["a/b"]);
    }

    #[test]
    fn escaped_quote_delimiter_and_name() {
        let odd = entry(r#"* LIST () "\\" "a\\b\"c""#);
        assert_eq!(odd.delimiter, Some('\\'));
        assert_eq!(odd.raw_name, r#"a\b"c"#);
        assert_eq!(odd.path, vec!["a", "b\"c"]);
    }

    #[test]
    fn literal_mailbox_name() {
        let entry = decode_list_line(b"* LIST () \"/\" {7}\r\nA/B C/D").unwrap().unwrap();
        assert_eq!(entry.path, vec!["A", "B C", "D"]);
    }

    #[test]
    fn invalid_utf7_kept_verbatim() {
        let entry = entry(r#"* LIST () "/" "Inbox/&Jjo!""#);
        assert_eq!(entry.path, vec!["Inbox", "&Jjo!"]);
    }

    #[test]
    fn other_data_is_none() {
        assert_eq!(decode_list_line(b"* STATUS INBOX (MESSAGES 3)").unwrap(), None);
        assert_eq!(decode_list_line(b"* 4 EXISTS").unwrap(), None);
    }

    #[test]
    fn malformed_line_fails() {
        let err = decode_list_line(b"* LIST (\\Noselect \"/\" foo").unwrap_err();
        assert!(err.is_parse());
    }
}

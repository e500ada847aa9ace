//! `message-data` (FETCH) records.
//!
//! Sub-parsers take the index of an enter event and return what they decoded
//! together with the index just past that event's subtree.

use tracing::{debug, warn};

use super::{
    child, lossy, nstring_bytes, nstring_text, number, parse, require, rule_at, string_text,
    text,
};
use crate::grammar::{EventKind, Rule, RuleSet, Tree};
use crate::types::{
    Address, Body, BodyFields, BodyPart, Disposition, Envelope, Extension, MessageAttribute,
    MessageDataRecord, PartKind,
};
use crate::{Error, Result};

const RECORDED: RuleSet = RuleSet::of(&[
    Rule::MessageData,
    Rule::NzNumber,
    Rule::Number,
    Rule::MsgAtt,
    Rule::AttFlags,
    Rule::AttEnvelope,
    Rule::AttInternalDate,
    Rule::AttRfc822Size,
    Rule::AttRfc822Header,
    Rule::AttRfc822Text,
    Rule::AttRfc822,
    Rule::AttBodyStructure,
    Rule::AttBodySection,
    Rule::AttBody,
    Rule::AttUid,
    Rule::Flag,
    Rule::DateTime,
    Rule::Envelope,
    Rule::EnvDate,
    Rule::EnvSubject,
    Rule::EnvFrom,
    Rule::EnvSender,
    Rule::EnvReplyTo,
    Rule::EnvTo,
    Rule::EnvCc,
    Rule::EnvBcc,
    Rule::EnvInReplyTo,
    Rule::EnvMessageId,
    Rule::Address,
    Rule::AddrName,
    Rule::AddrAdl,
    Rule::AddrMailbox,
    Rule::AddrHost,
    Rule::Body,
    Rule::BodyType1Part,
    Rule::BodyTypeMpart,
    Rule::BodyTypeBasic,
    Rule::BodyTypeMsg,
    Rule::BodyTypeText,
    Rule::MediaType,
    Rule::MediaSubtype,
    Rule::BodyFields,
    Rule::BodyFldParam,
    Rule::BodyFldId,
    Rule::BodyFldDesc,
    Rule::BodyFldEnc,
    Rule::BodyFldOctets,
    Rule::BodyFldLines,
    Rule::BodyFldMd5,
    Rule::BodyFldDsp,
    Rule::BodyFldLang,
    Rule::BodyFldLoc,
    Rule::BodyExt1Part,
    Rule::BodyExtMpart,
    Rule::Section,
    Rule::SectionOrigin,
    Rule::String,
    Rule::Nstring,
]);

/// Decodes every `* N FETCH` line of a complete response.
///
/// A response without FETCH lines decodes to an empty list. A record whose
/// fields cannot be extracted is skipped with a warning unless every record
/// fails.
///
/// # Errors
///
/// [`Error::Syntax`] if the response does not match the grammar, and the
/// first [`Error::Extraction`] if no record could be extracted.
pub fn decode_message_data(input: &[u8]) -> Result<Vec<MessageDataRecord>> {
    let tree = parse(input, Rule::Response, &RECORDED, "message-data")?;

    let mut records = Vec::new();
    let mut first_error = None;
    let mut cursor = 0;

    while let Some(event) = tree.get(cursor) {
        if event.kind == EventKind::Enter && event.rule == Rule::MessageData {
            match message_data(&tree, cursor) {
                Ok((record, _)) => records.push(record),
                Err(err) => {
                    warn!(%err, "skipping FETCH record");
                    first_error.get_or_insert(err);
                }
            }
            cursor = tree.end(cursor);
        } else {
            cursor += 1;
        }
    }

    match first_error {
        Some(err) if records.is_empty() => Err(err),
        _ => {
            debug!(count = records.len(), "decoded FETCH records");
            Ok(records)
        }
    }
}

fn message_data(tree: &Tree<'_>, at: usize) -> Result<(MessageDataRecord, usize)> {
    let message_number = number(tree.bytes_at(require(tree, at, Rule::NzNumber)?))?;
    let msg_att = require(tree, at, Rule::MsgAtt)?;

    let mut attributes = Vec::new();
    let mut cursor = msg_att + 1;
    let stop = tree.end(msg_att) - 1;
    while cursor < stop {
        let (attribute, next) = attribute(tree, cursor)?;
        attributes.push(attribute);
        cursor = next;
    }

    Ok((
        MessageDataRecord {
            message_number,
            attributes,
        },
        tree.end(at),
    ))
}

fn attribute(tree: &Tree<'_>, at: usize) -> Result<(MessageAttribute, usize)> {
    let payload = |rule| require(tree, at, rule).map(|i| tree.bytes_at(i));
    let literal = |rule| payload(rule).map(|b| nstring_bytes(b).unwrap_or_default());

    let attribute = match rule_at(tree, at) {
        Some(Rule::AttFlags) => {
            MessageAttribute::Flags(tree.children(at).map(|i| text(tree.bytes_at(i))).collect())
        }
        Some(Rule::AttEnvelope) => {
            MessageAttribute::Envelope(envelope(tree, require(tree, at, Rule::Envelope)?).0)
        }
        Some(Rule::AttInternalDate) => {
            let quoted = payload(Rule::DateTime)?;
            MessageAttribute::InternalDate(text(&quoted[1..quoted.len() - 1]))
        }
        Some(Rule::AttRfc822Size) => MessageAttribute::Rfc822Size(number(payload(Rule::Number)?)?),
        Some(Rule::AttRfc822Header) => MessageAttribute::Rfc822Header(literal(Rule::Nstring)?),
        Some(Rule::AttRfc822Text) => MessageAttribute::Rfc822Text(literal(Rule::Nstring)?),
        Some(Rule::AttRfc822) => MessageAttribute::Rfc822(literal(Rule::Nstring)?),
        Some(Rule::AttBodyStructure) => {
            MessageAttribute::BodyStructure(body(tree, require(tree, at, Rule::Body)?)?.0)
        }
        Some(Rule::AttBody) => MessageAttribute::Body(body(tree, require(tree, at, Rule::Body)?)?.0),
        Some(Rule::AttBodySection) => {
            let section = payload(Rule::Section)?;
            let origin = child(tree, at, Rule::SectionOrigin)
                .map(|i| require(tree, i, Rule::Number))
                .transpose()?
                .map(|i| number(tree.bytes_at(i)))
                .transpose()?;
            MessageAttribute::BodySection {
                section: text(&section[1..section.len() - 1]),
                origin,
                data: nstring_bytes(payload(Rule::Nstring)?),
            }
        }
        Some(Rule::AttUid) => MessageAttribute::Uid(number(payload(Rule::NzNumber)?)?),
        other => {
            return Err(Error::Extraction(format!(
                "unexpected {} in msg-att",
                other.map_or("end of events", Rule::name)
            )));
        }
    };

    Ok((attribute, tree.end(at)))
}

fn envelope(tree: &Tree<'_>, at: usize) -> (Envelope, usize) {
    let mut envelope = Envelope::default();

    for i in tree.children(at) {
        let bytes = tree.bytes_at(i);
        match rule_at(tree, i) {
            Some(Rule::EnvDate) => envelope.date = nstring_text(bytes),
            Some(Rule::EnvSubject) => envelope.subject = nstring_text(bytes),
            Some(Rule::EnvFrom) => envelope.from = addresses(tree, i),
            Some(Rule::EnvSender) => envelope.sender = addresses(tree, i),
            Some(Rule::EnvReplyTo) => envelope.reply_to = addresses(tree, i),
            Some(Rule::EnvTo) => envelope.to = addresses(tree, i),
            Some(Rule::EnvCc) => envelope.cc = addresses(tree, i),
            Some(Rule::EnvBcc) => envelope.bcc = addresses(tree, i),
            Some(Rule::EnvInReplyTo) => envelope.in_reply_to = nstring_text(bytes),
            Some(Rule::EnvMessageId) => envelope.message_id = nstring_text(bytes),
            _ => {}
        }
    }

    (envelope, tree.end(at))
}

fn addresses(tree: &Tree<'_>, at: usize) -> Vec<Address> {
    tree.children(at)
        .map(|i| {
            let mut address = Address::default();
            for field in tree.children(i) {
                let value = nstring_text(tree.bytes_at(field));
                match rule_at(tree, field) {
                    Some(Rule::AddrName) => address.name = value,
                    Some(Rule::AddrAdl) => address.adl = value,
                    Some(Rule::AddrMailbox) => address.mailbox = value,
                    Some(Rule::AddrHost) => address.host = value,
                    _ => {}
                }
            }
            address
        })
        .collect()
}

/// Decodes a `body`, recursing into multipart children and message parts.
fn body(tree: &Tree<'_>, at: usize) -> Result<(Body, usize)> {
    let inner = tree
        .children(at)
        .next()
        .ok_or_else(|| Error::Extraction("empty body".to_string()))?;

    let body = match rule_at(tree, inner) {
        Some(Rule::BodyType1Part) => Body::Single(single_part(tree, inner)?),
        Some(Rule::BodyTypeMpart) => multipart(tree, inner)?,
        _ => return Err(Error::Extraction("body without a body type".to_string())),
    };

    Ok((body, tree.end(at)))
}

fn multipart(tree: &Tree<'_>, at: usize) -> Result<Body> {
    let mut parts = Vec::new();
    let mut media_subtype = String::new();
    let mut extension = None;

    let mut cursor = at + 1;
    let stop = tree.end(at) - 1;
    while cursor < stop {
        cursor = match rule_at(tree, cursor) {
            Some(Rule::Body) => {
                let (part, next) = body(tree, cursor)?;
                parts.push(part);
                next
            }
            Some(Rule::MediaSubtype) => {
                media_subtype = string_text(tree.bytes_at(cursor));
                tree.end(cursor)
            }
            Some(Rule::BodyExtMpart) => {
                extension = Some(extension_data(tree, cursor));
                tree.end(cursor)
            }
            _ => tree.end(cursor),
        };
    }

    Ok(Body::Multipart {
        parts,
        media_subtype,
        extension,
    })
}

fn single_part(tree: &Tree<'_>, at: usize) -> Result<BodyPart> {
    let mut kind = None;
    let mut extension = None;

    for i in tree.children(at) {
        match rule_at(tree, i) {
            Some(Rule::BodyTypeText) => {
                kind = Some(PartKind::Text {
                    media_subtype: string_text(tree.bytes_at(require(tree, i, Rule::MediaSubtype)?)),
                    fields: body_fields(tree, require(tree, i, Rule::BodyFields)?)?,
                    lines: number(tree.bytes_at(require(tree, i, Rule::BodyFldLines)?))?,
                });
            }
            Some(Rule::BodyTypeBasic) => {
                kind = Some(PartKind::Basic {
                    media_type: string_text(tree.bytes_at(require(tree, i, Rule::MediaType)?)),
                    media_subtype: string_text(tree.bytes_at(require(tree, i, Rule::MediaSubtype)?)),
                    fields: body_fields(tree, require(tree, i, Rule::BodyFields)?)?,
                });
            }
            Some(Rule::BodyTypeMsg) => {
                kind = Some(PartKind::Message {
                    fields: body_fields(tree, require(tree, i, Rule::BodyFields)?)?,
                    envelope: Box::new(envelope(tree, require(tree, i, Rule::Envelope)?).0),
                    body: Box::new(body(tree, require(tree, i, Rule::Body)?)?.0),
                    lines: number(tree.bytes_at(require(tree, i, Rule::BodyFldLines)?))?,
                });
            }
            Some(Rule::BodyExt1Part) => extension = Some(extension_data(tree, i)),
            _ => {}
        }
    }

    let kind = kind.ok_or_else(|| Error::Extraction("single part without a type".to_string()))?;
    Ok(BodyPart { kind, extension })
}

fn body_fields(tree: &Tree<'_>, at: usize) -> Result<BodyFields> {
    let mut fields = BodyFields::default();

    for i in tree.children(at) {
        let bytes = tree.bytes_at(i);
        match rule_at(tree, i) {
            Some(Rule::BodyFldParam) => fields.params = params(tree, i),
            Some(Rule::BodyFldId) => fields.id = nstring_text(bytes),
            Some(Rule::BodyFldDesc) => fields.description = nstring_text(bytes),
            Some(Rule::BodyFldEnc) => fields.encoding = string_text(bytes),
            Some(Rule::BodyFldOctets) => fields.octets = number(bytes)?,
            _ => {}
        }
    }

    Ok(fields)
}

/// Pairs up the strings of a `body-fld-param`; NIL yields no pairs.
fn params(tree: &Tree<'_>, at: usize) -> Vec<(String, String)> {
    let mut values = tree
        .children(at)
        .filter(|&i| rule_at(tree, i) == Some(Rule::String))
        .map(|i| string_text(tree.bytes_at(i)));

    let mut pairs = Vec::new();
    while let (Some(key), Some(value)) = (values.next(), values.next()) {
        pairs.push((key, value));
    }
    pairs
}

fn extension_data(tree: &Tree<'_>, at: usize) -> Extension {
    let mut extension = Extension::default();

    for i in tree.children(at) {
        match rule_at(tree, i) {
            Some(Rule::BodyFldMd5) => extension.md5 = nstring_text(tree.bytes_at(i)),
            Some(Rule::BodyFldParam) => extension.params = params(tree, i),
            Some(Rule::BodyFldDsp) => extension.disposition = disposition(tree, i),
            Some(Rule::BodyFldLang) => extension.language = language(tree, i),
            Some(Rule::BodyFldLoc) => extension.location = nstring_text(tree.bytes_at(i)),
            _ => {}
        }
    }

    extension
}

fn disposition(tree: &Tree<'_>, at: usize) -> Option<Disposition> {
    let kind = child(tree, at, Rule::String)?;
    Some(Disposition {
        kind: string_text(tree.bytes_at(kind)),
        params: child(tree, at, Rule::BodyFldParam)
            .map(|i| params(tree, i))
            .unwrap_or_default(),
    })
}

fn language(tree: &Tree<'_>, at: usize) -> Vec<String> {
    tree.children(at)
        .filter_map(|i| match rule_at(tree, i) {
            Some(Rule::Nstring) => nstring_bytes(tree.bytes_at(i)).map(lossy),
            Some(Rule::String) => Some(string_text(tree.bytes_at(i))),
            _ => None,
        })
        .collect()
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

    fn crlf(input: &str) -> Vec<u8> {
        input.replace('\n', "\r\n").into_bytes()
    }

    fn single(input: &str) -> MessageDataRecord {
        let mut records = decode_message_data(&crlf(input)).unwrap();
        assert_eq!(records.len(), 1);
        records.remove(0)
    }

    #[test]
    fn uid_only() {
        let record = single("* 2 FETCH (UID 2)\nA1 OK Success\n");
        assert_eq!(record.message_number, 2);
        assert_eq!(record.attributes, vec![MessageAttribute::Uid(2)]);
    }

    #[test]
    fn rfc822_literal_exact() {
        let record = single("* 1 FETCH (RFC822 {4}\n1234)\nA1 OK done\n");
        assert_eq!(record.attributes, vec![MessageAttribute::Rfc822(b"1234".to_vec())]);
    }

    #[test]
    fn rfc822_literal_wrong_size_fails() {
        for body in ["{4}\r\n123", "{4}\r\n12345"] {
            let input = format!("* 1 FETCH (RFC822 {body})\r\nA1 OK done\r\n");
            let err = decode_message_data(input.as_bytes()).unwrap_err();
            assert!(matches!(err, Error::Syntax { .. }), "{body:?}");
        }
    }

    #[test]
    fn rfc822_empty_literal() {
        let record = single("* 1 FETCH (RFC822 {0}\n)\nA1 OK done\n");
        assert_eq!(record.attributes, vec![MessageAttribute::Rfc822(Vec::new())]);
    }

    #[test]
    fn literal_containing_tag_like_line() {
        let input = b"* 1 FETCH (RFC822 {22}\r\n0123\r\nA0 8901\r\n0123456)\r\nA0 OK done\r\n";
        let records = decode_message_data(input).unwrap();
        assert_eq!(
            records[0].attributes,
            vec![MessageAttribute::Rfc822(b"0123\r\nA0 8901\r\n0123456".to_vec())]
        );
    }

    #[test]
    fn size_flags_and_date() {
        let record = single(
            "* 12 FETCH (FLAGS (\\Seen $Forwarded) INTERNALDATE \"17-Jul-1996 02:44:25 -0700\" RFC822.SIZE 4286)\nA1 OK\n",
        );
        assert_eq!(
            record.attributes,
            vec![
                MessageAttribute::Flags(vec!["\\Seen".into(), "$Forwarded".into()]),
                MessageAttribute::InternalDate("17-Jul-1996 02:44:25 -0700".into()),
                MessageAttribute::Rfc822Size(4286),
            ]
        );
    }

    #[test]
    fn envelope_rfc_example() {
        let record = single(concat!(
            "* 12 FETCH (ENVELOPE (\"Wed, 17 Jul 1996 02:23:25 -0700 (PDT)\" ",
            "\"IMAP4rev1 WG mtg summary and minutes\" ",
            "((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) ",
            "((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) ",
            "((\"Terry Gray\" NIL \"gray\" \"cac.washington.edu\")) ",
            "((NIL NIL \"imap\" \"cac.washington.edu\")) ",
            "((NIL NIL \"minutes\" \"CNRI.Reston.VA.US\")(\"John Klensin\" NIL \"KLENSIN\" \"MIT.EDU\")) ",
            "NIL NIL \"<B27397-0100000@cac.washington.edu>\"))\nA1 OK\n",
        ));
        let envelope = record.envelope().unwrap();
        assert_eq!(
            envelope.subject.as_deref(),
            Some("IMAP4rev1 WG mtg summary and minutes")
        );
        assert_eq!(envelope.from[0].name.as_deref(), Some("Terry Gray"));
        assert_eq!(envelope.from[0].email().as_deref(), Some("gray@cac.washington.edu"));
        assert_eq!(envelope.cc.len(), 2);
        assert_eq!(envelope.cc[1].mailbox.as_deref(), Some("KLENSIN"));
        assert!(envelope.bcc.is_empty());
        assert_eq!(envelope.in_reply_to, None);
        assert_eq!(
            envelope.message_id.as_deref(),
            Some("<B27397-0100000@cac.washington.edu>")
        );
    }

    #[test]
    fn envelope_subject_as_literal() {
        let input = b"* 3 FETCH (ENVELOPE (NIL {5}\r\nHi\r\nX NIL NIL NIL NIL NIL NIL NIL NIL))\r\nA1 OK\r\n";
        let records = decode_message_data(input).unwrap();
        let envelope = records[0].envelope().unwrap();
        assert_eq!(envelope.subject.as_deref(), Some("Hi\r\nX"));
        assert_eq!(envelope.date, None);
    }

    #[test]
    fn single_part_text() {
        let record = single(
            "* 32 FETCH (BODYSTRUCTURE (\"TEXT\" \"PLAIN\" (\"CHARSET\" \"US-ASCII\") NIL NIL \"7BIT\" 3028 92))\nA1 OK\n",
        );
        let Some(Body::Single(part)) = record.body_structure() else {
            panic!("expected single part");
        };
        assert_eq!(
            part.kind,
            PartKind::Text {
                media_subtype: "PLAIN".into(),
                fields: BodyFields {
                    params: vec![("CHARSET".into(), "US-ASCII".into())],
                    id: None,
                    description: None,
                    encoding: "7BIT".into(),
                    octets: 3028,
                },
                lines: 92,
            }
        );
        assert_eq!(part.extension, None);
    }

    #[test]
    fn nested_multipart_is_reconstructed() {
        let record = single(concat!(
            "* 5 FETCH (UID 40 BODYSTRUCTURE (",
            "((\"TEXT\" \"PLAIN\" (\"CHARSET\" \"UTF-8\") NIL NIL \"7BIT\" 10 1 NIL NIL NIL)",
            "(\"TEXT\" \"HTML\" (\"CHARSET\" \"UTF-8\") NIL NIL \"QUOTED-PRINTABLE\" 20 1 NIL NIL NIL) ",
            "\"ALTERNATIVE\" (\"BOUNDARY\" \"b1\") NIL NIL)",
            "(\"APPLICATION\" \"PDF\" (\"NAME\" \"report.pdf\") NIL NIL \"BASE64\" 3000 NIL ",
            "(\"ATTACHMENT\" (\"FILENAME\" \"report.pdf\")) NIL) ",
            "\"MIXED\" (\"BOUNDARY\" \"b0\") NIL NIL NIL))\nA1 OK\n",
        ));
        assert_eq!(record.uid(), Some(40));

        let Some(Body::Multipart {
            parts,
            media_subtype,
            extension,
        }) = record.body_structure()
        else {
            panic!("expected multipart");
        };
        assert_eq!(media_subtype, "MIXED");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].mime_type(), "multipart/alternative");
        assert_eq!(
            extension.as_ref().unwrap().params,
            vec![("BOUNDARY".to_string(), "b0".to_string())]
        );

        let Body::Multipart { parts: inner, .. } = &parts[0] else {
            panic!("expected nested multipart");
        };
        assert_eq!(inner[1].mime_type(), "text/html");

        let Body::Single(pdf) = &parts[1] else {
            panic!("expected single part");
        };
        assert_eq!(pdf.mime_type(), "application/pdf");
        assert_eq!(pdf.fields().param("name"), Some("report.pdf"));
        let disposition = pdf.extension.as_ref().unwrap().disposition.as_ref().unwrap();
        assert_eq!(disposition.kind, "ATTACHMENT");
        assert_eq!(disposition.params[0].1, "report.pdf");
    }

    #[test]
    fn message_rfc822_part_carries_envelope_and_body() {
        let record = single(concat!(
            "* 1 FETCH (BODYSTRUCTURE ((\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 5 1)",
            "(\"MESSAGE\" \"RFC822\" NIL NIL NIL \"7BIT\" 100 ",
            "(NIL \"inner\" NIL NIL NIL NIL NIL NIL NIL NIL) ",
            "(\"TEXT\" \"PLAIN\" NIL NIL NIL \"7BIT\" 20 2) 6) \"MIXED\"))\nA1 OK\n",
        ));
        let Some(Body::Multipart { parts, .. }) = record.body_structure() else {
            panic!("expected multipart");
        };
        let Body::Single(BodyPart {
            kind:
                PartKind::Message {
                    envelope,
                    body,
                    lines,
                    ..
                },
            ..
        }) = &parts[1]
        else {
            panic!("expected message part");
        };
        assert_eq!(envelope.subject.as_deref(), Some("inner"));
        assert_eq!(body.mime_type(), "text/plain");
        assert_eq!(*lines, 6);
    }

    #[test]
    fn body_section_with_origin() {
        let record = single(
            "* 7 FETCH (BODY[HEADER.FIELDS (SUBJECT)]<0> {10}\nSubject:\n BODY[] NIL)\nA1 OK\n",
        );
        assert_eq!(
            record.attributes,
            vec![
                MessageAttribute::BodySection {
                    section: "HEADER.FIELDS (SUBJECT)".into(),
                    origin: Some(0),
                    data: Some(b"Subject:\r\n".to_vec()),
                },
                MessageAttribute::BodySection {
                    section: String::new(),
                    origin: None,
                    data: None,
                },
            ]
        );
    }

    #[test]
    fn header_literal() {
        let record = single("* 1 FETCH (UID 9 RFC822.HEADER {12}\nSubject: x\n)\nA1 OK\n");
        assert_eq!(record.header(), Some(&b"Subject: x\r\n"[..]));
    }

    #[test]
    fn several_records_and_unsolicited_data() {
        let input = crlf("* 1 FETCH (UID 10)\n* 3 EXISTS\n* 2 FETCH (UID 11)\nA1 OK\n");
        let records = decode_message_data(&input).unwrap();
        let uids: Vec<_> = records.iter().filter_map(MessageDataRecord::uid).collect();
        assert_eq!(uids, vec![10, 11]);
    }

    #[test]
    fn no_fetch_lines_is_empty() {
        let records = decode_message_data(b"A1 OK no messages\r\n").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn grammar_mismatch_fails_whole_response() {
        let err = decode_message_data(b"* 1 FETCH (UID 10)\r\n* 2 FETCH (UID)\r\nA1 OK\r\n")
            .unwrap_err();
        assert!(matches!(err, Error::Syntax { .. }));
    }
}

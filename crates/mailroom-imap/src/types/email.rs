//! Message summaries built from FETCH data and decoded headers.

use chrono::{DateTime, FixedOffset};
use mailroom_mime::{HeaderBlock, Mailbox};

use super::{Body, BodyPart, MessageDataRecord, PartKind};
use crate::{Error, Result};

/// A message in a mailbox listing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MailboxEmail {
    /// Message UID.
    pub uid: u32,
    /// Decoded Subject.
    pub subject: Option<String>,
    /// Parsed Date.
    pub date: Option<DateTime<FixedOffset>>,
    /// From.
    pub from: Vec<Mailbox>,
    /// To.
    pub to: Vec<Mailbox>,
    /// Cc.
    pub cc: Vec<Mailbox>,
    /// Bcc.
    pub bcc: Vec<Mailbox>,
    /// Sender.
    pub sender: Vec<Mailbox>,
    /// Reply-To.
    pub reply_to: Vec<Mailbox>,
    /// Message-ID, without angle brackets.
    pub message_id: Option<String>,
    /// In-Reply-To ids.
    pub in_reply_to: Vec<String>,
    /// References ids.
    pub references: Vec<String>,
    /// Every header line, unfolded, in order.
    pub raw_headers: Vec<(String, String)>,
    /// Attachments from the body structure.
    pub attachments: Vec<Attachment>,
}

/// An attachment described by BODYSTRUCTURE.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attachment {
    /// `type/subtype`, lowercased.
    pub mime_type: String,
    /// `NAME` parameter (or disposition `FILENAME`), if any.
    pub name: Option<String>,
    /// Size in octets as transferred.
    pub size: u32,
}

impl MailboxEmail {
    /// Builds a summary from a FETCH record carrying `UID`, `RFC822.HEADER`
    /// and, optionally, `BODYSTRUCTURE`.
    ///
    /// # Errors
    ///
    /// [`Error::Extraction`] if the UID or header block is missing or the
    /// header block starts with a continuation line.
    pub fn from_record(record: &MessageDataRecord) -> Result<Self> {
        let uid = record.uid().ok_or_else(|| {
            Error::Extraction(format!("message {} has no UID", record.message_number))
        })?;
        let header = record.header().ok_or_else(|| {
            Error::Extraction(format!("message {} has no RFC822.HEADER", record.message_number))
        })?;
        let headers = HeaderBlock::parse(header)
            .map_err(|e| Error::Extraction(format!("message {uid}: {e}")))?;

        Ok(Self {
            uid,
            subject: headers.subject(),
            date: headers.date(),
            from: headers.addresses("From"),
            to: headers.addresses("To"),
            cc: headers.addresses("Cc"),
            bcc: headers.addresses("Bcc"),
            sender: headers.addresses("Sender"),
            reply_to: headers.addresses("Reply-To"),
            message_id: headers.message_ids("Message-ID").into_iter().next(),
            in_reply_to: headers.message_ids("In-Reply-To"),
            references: headers.message_ids("References"),
            raw_headers: headers.entries().to_vec(),
            attachments: record.body_structure().map(attachments).unwrap_or_default(),
        })
    }
}

/// Lists the attachments a body structure describes.
///
/// A single-part body is an attachment unless it is text. In a
/// `multipart/mixed` body every first-level single part is listed; nested
/// multiparts and encapsulated messages are not descended into.
#[must_use]
pub fn attachments(body: &Body) -> Vec<Attachment> {
    match body {
        Body::Single(part) if matches!(part.kind, PartKind::Text { .. }) => Vec::new(),
        Body::Single(part) => vec![Attachment::from_part(part)],
        Body::Multipart {
            parts,
            media_subtype,
            ..
        } if media_subtype.eq_ignore_ascii_case("MIXED") => parts
            .iter()
            .filter_map(|child| match child {
                Body::Single(part) => Some(Attachment::from_part(part)),
                Body::Multipart { .. } => None,
            })
            .collect(),
        Body::Multipart { .. } => Vec::new(),
    }
}

impl Attachment {
    fn from_part(part: &BodyPart) -> Self {
        let fields = part.fields();
        let filename = || {
            part.extension
                .as_ref()
                .and_then(|ext| ext.disposition.as_ref())
                .and_then(|dsp| {
                    dsp.params
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case("FILENAME"))
                })
                .map(|(_, value)| value.clone())
        };
        Self {
            mime_type: part.mime_type(),
            name: fields.param("NAME").map(ToString::to_string).or_else(filename),
            size: fields.octets,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{BodyFields, Disposition, Extension, MessageAttribute};

    fn part(media_type: &str, media_subtype: &str, params: &[(&str, &str)], octets: u32) -> Body {
        let fields = BodyFields {
            params: params
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            encoding: "BASE64".into(),
            octets,
            ..BodyFields::default()
        };
        let kind = if media_type == "TEXT" {
            PartKind::Text {
                media_subtype: media_subtype.into(),
                fields,
                lines: 1,
            }
        } else {
            PartKind::Basic {
                media_type: media_type.into(),
                media_subtype: media_subtype.into(),
                fields,
            }
        };
        Body::Single(BodyPart {
            kind,
            extension: None,
        })
    }

    fn multipart(subtype: &str, parts: Vec<Body>) -> Body {
        Body::Multipart {
            parts,
            media_subtype: subtype.into(),
            extension: None,
        }
    }

    #[test]
    fn single_text_part_has_no_attachments() {
        assert!(attachments(&part("TEXT", "PLAIN", &[], 12)).is_empty());
    }

    #[test]
    fn single_non_text_part_is_attachment() {
        let found = attachments(&part("APPLICATION", "PDF", &[("NAME", "a.pdf")], 4096));
        assert_eq!(
            found,
            vec![Attachment {
                mime_type: "application/pdf".into(),
                name: Some("a.pdf".into()),
                size: 4096,
            }]
        );
    }

    #[test]
    fn mixed_lists_first_level_parts_only() {
        let body = multipart(
            "MIXED",
            vec![
                multipart(
                    "ALTERNATIVE",
                    vec![part("TEXT", "PLAIN", &[], 10), part("TEXT", "HTML", &[], 20)],
                ),
                part("TEXT", "CSV", &[("NAME", "data.csv")], 30),
                part("IMAGE", "PNG", &[("NAME", "cat.png")], 40),
            ],
        );
        let found = attachments(&body);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].mime_type, "text/csv");
        assert_eq!(found[0].name.as_deref(), Some("data.csv"));
        assert_eq!(found[1].mime_type, "image/png");
        assert_eq!(found[1].size, 40);
    }

    #[test]
    fn alternative_has_no_attachments() {
        let body = multipart(
            "ALTERNATIVE",
            vec![part("TEXT", "PLAIN", &[], 10), part("TEXT", "HTML", &[], 20)],
        );
        assert!(attachments(&body).is_empty());
    }

    #[test]
    fn disposition_filename_is_fallback_name() {
        let Body::Single(mut single) = part("APPLICATION", "ZIP", &[], 7) else {
            unreachable!()
        };
        single.extension = Some(Extension {
            disposition: Some(Disposition {
                kind: "ATTACHMENT".into(),
                params: vec![("FILENAME".into(), "x.zip".into())],
            }),
            ..Extension::default()
        });
        let found = attachments(&Body::Single(single));
        assert_eq!(found[0].name.as_deref(), Some("x.zip"));
    }

    #[test]
    fn summary_from_record() {
        let record = MessageDataRecord {
            message_number: 1,
            attributes: vec![
                MessageAttribute::Uid(42),
                MessageAttribute::BodyStructure(part("TEXT", "PLAIN", &[], 5)),
                MessageAttribute::Rfc822Header(
                    b"Subject: =?UTF-8?B?0J/RgNC40LLRltGC?=\r\n\
From: Ann <ann@example.com>\r\n\
To: bob@example.com, Cy <cy@example.org>\r\n\
Message-ID: <m1@example.com>\r\n\
References: <a@x> <b@y>\r\n\
Date: Mon, 7 Feb 1994 21:52:25 -0800\r\n\r\n"
                        .to_vec(),
                ),
            ],
        };
        let email = MailboxEmail::from_record(&record).unwrap();
        assert_eq!(email.uid, 42);
        assert_eq!(email.subject.as_deref(), Some("Привіт"));
        assert_eq!(email.from[0].address, "ann@example.com");
        assert_eq!(email.from[0].name.as_deref(), Some("Ann"));
        assert_eq!(email.to.len(), 2);
        assert_eq!(email.message_id.as_deref(), Some("m1@example.com"));
        assert_eq!(email.references, vec!["a@x", "b@y"]);
        assert!(email.date.is_some());
        assert_eq!(email.raw_headers.len(), 6);
        assert!(email.attachments.is_empty());
    }

    #[test]
    fn summary_survives_mbox_envelope_line() {
        let record = MessageDataRecord {
            message_number: 2,
            attributes: vec![
                MessageAttribute::Uid(7),
                MessageAttribute::Rfc822Header(
                    b"From ann@example.com Mon Feb  7 21:52:25 1994\r\n\
From: Ann <ann@example.com>\r\n\
Subject: archived\r\n\r\n"
                        .to_vec(),
                ),
            ],
        };
        let email = MailboxEmail::from_record(&record).unwrap();
        assert_eq!(email.subject.as_deref(), Some("archived"));
        assert_eq!(email.from[0].address, "ann@example.com");
        assert_eq!(email.raw_headers.len(), 2);
    }

    #[test]
    fn summary_needs_uid_and_header() {
        let record = MessageDataRecord {
            message_number: 3,
            attributes: vec![MessageAttribute::Rfc822Header(b"Subject: x\r\n\r\n".to_vec())],
        };
        assert!(matches!(
            MailboxEmail::from_record(&record),
            Err(Error::Extraction(_))
        ));
    }
}

//! FETCH response types.

/// One `* N FETCH (...)` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDataRecord {
    /// Message sequence number (1-based, not a UID).
    pub message_number: u32,
    /// Attributes in the order the server sent them.
    pub attributes: Vec<MessageAttribute>,
}

impl MessageDataRecord {
    /// Returns the UID, if it was fetched.
    #[must_use]
    pub fn uid(&self) -> Option<u32> {
        self.attributes.iter().find_map(|a| match a {
            MessageAttribute::Uid(uid) => Some(*uid),
            _ => None,
        })
    }

    /// Returns the envelope, if it was fetched.
    #[must_use]
    pub fn envelope(&self) -> Option<&Envelope> {
        self.attributes.iter().find_map(|a| match a {
            MessageAttribute::Envelope(envelope) => Some(envelope),
            _ => None,
        })
    }

    /// Returns the body structure, if it was fetched.
    #[must_use]
    pub fn body_structure(&self) -> Option<&Body> {
        self.attributes.iter().find_map(|a| match a {
            MessageAttribute::BodyStructure(body) => Some(body),
            _ => None,
        })
    }

    /// Returns the RFC822.HEADER bytes, if they were fetched.
    #[must_use]
    pub fn header(&self) -> Option<&[u8]> {
        self.attributes.iter().find_map(|a| match a {
            MessageAttribute::Rfc822Header(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }
}

/// A FETCH attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageAttribute {
    /// `FLAGS (...)`
    Flags(Vec<String>),
    /// `ENVELOPE (...)`
    Envelope(Envelope),
    /// `INTERNALDATE "..."`, without the quotes.
    InternalDate(String),
    /// `RFC822.SIZE n`
    Rfc822Size(u32),
    /// `RFC822 {n}`: the whole message.
    Rfc822(Vec<u8>),
    /// `RFC822.HEADER {n}`
    Rfc822Header(Vec<u8>),
    /// `RFC822.TEXT {n}`
    Rfc822Text(Vec<u8>),
    /// `BODYSTRUCTURE (...)`
    BodyStructure(Body),
    /// `BODY (...)`, the non-extensible form.
    Body(Body),
    /// `BODY[section]<origin> data`
    BodySection {
        /// Section specifier between the brackets, empty for the whole message.
        section: String,
        /// Partial fetch origin.
        origin: Option<u32>,
        /// Section contents, `None` for NIL.
        data: Option<Vec<u8>>,
    },
    /// `UID n`
    Uid(u32),
}

/// Envelope fields. Strings are left undecoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Date header.
    pub date: Option<String>,
    /// Subject header.
    pub subject: Option<String>,
    /// From addresses.
    pub from: Vec<Address>,
    /// Sender addresses.
    pub sender: Vec<Address>,
    /// Reply-To addresses.
    pub reply_to: Vec<Address>,
    /// To addresses.
    pub to: Vec<Address>,
    /// Cc addresses.
    pub cc: Vec<Address>,
    /// Bcc addresses.
    pub bcc: Vec<Address>,
    /// In-Reply-To header.
    pub in_reply_to: Option<String>,
    /// Message-ID header.
    pub message_id: Option<String>,
}

/// An envelope address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Display name.
    pub name: Option<String>,
    /// Source route.
    pub adl: Option<String>,
    /// Local part, or group name.
    pub mailbox: Option<String>,
    /// Domain, `None` marks group syntax.
    pub host: Option<String>,
}

impl Address {
    /// Returns `mailbox@host`, if both are present.
    #[must_use]
    pub fn email(&self) -> Option<String> {
        match (&self.mailbox, &self.host) {
            (Some(mailbox), Some(host)) => Some(format!("{mailbox}@{host}")),
            _ => None,
        }
    }
}

/// A body structure tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// A leaf part.
    Single(BodyPart),
    /// A multipart container.
    Multipart {
        /// Child parts, in order.
        parts: Vec<Body>,
        /// Subtype such as `MIXED` or `ALTERNATIVE`.
        media_subtype: String,
        /// Extension data (BODYSTRUCTURE only).
        extension: Option<Extension>,
    },
}

impl Body {
    /// Returns `type/subtype`, lowercased.
    #[must_use]
    pub fn mime_type(&self) -> String {
        match self {
            Self::Single(part) => part.mime_type(),
            Self::Multipart { media_subtype, .. } => {
                format!("multipart/{}", media_subtype.to_ascii_lowercase())
            }
        }
    }
}

/// A non-multipart body part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyPart {
    /// What kind of part this is.
    pub kind: PartKind,
    /// Extension data (BODYSTRUCTURE only).
    pub extension: Option<Extension>,
}

impl BodyPart {
    /// Returns the fields shared by every part kind.
    #[must_use]
    pub const fn fields(&self) -> &BodyFields {
        match &self.kind {
            PartKind::Text { fields, .. }
            | PartKind::Basic { fields, .. }
            | PartKind::Message { fields, .. } => fields,
        }
    }

    /// Returns `type/subtype`, lowercased.
    #[must_use]
    pub fn mime_type(&self) -> String {
        match &self.kind {
            PartKind::Text { media_subtype, .. } => {
                format!("text/{}", media_subtype.to_ascii_lowercase())
            }
            PartKind::Basic {
                media_type,
                media_subtype,
                ..
            } => format!(
                "{}/{}",
                media_type.to_ascii_lowercase(),
                media_subtype.to_ascii_lowercase()
            ),
            PartKind::Message { .. } => "message/rfc822".to_string(),
        }
    }
}

/// The three single-part shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartKind {
    /// `TEXT/*`
    Text {
        /// Subtype such as `PLAIN`.
        media_subtype: String,
        /// Shared fields.
        fields: BodyFields,
        /// Size in lines.
        lines: u32,
    },
    /// Any other non-message type.
    Basic {
        /// Type such as `APPLICATION`.
        media_type: String,
        /// Subtype such as `PDF`.
        media_subtype: String,
        /// Shared fields.
        fields: BodyFields,
    },
    /// `MESSAGE/RFC822`, with the encapsulated message's envelope and body.
    Message {
        /// Shared fields.
        fields: BodyFields,
        /// Envelope of the inner message.
        envelope: Box<Envelope>,
        /// Body of the inner message.
        body: Box<Body>,
        /// Size in lines.
        lines: u32,
    },
}

/// `body-fields`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BodyFields {
    /// Parameters such as `CHARSET` or `NAME`.
    pub params: Vec<(String, String)>,
    /// Content-ID.
    pub id: Option<String>,
    /// Content-Description.
    pub description: Option<String>,
    /// Content-Transfer-Encoding.
    pub encoding: String,
    /// Size in octets, after transfer encoding.
    pub octets: u32,
}

impl BodyFields {
    /// Looks up a parameter case-insensitively.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Optional trailing data of a BODYSTRUCTURE part.
///
/// `md5` only occurs on single parts and `params` only on multiparts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extension {
    /// Content-MD5.
    pub md5: Option<String>,
    /// Multipart parameters such as `BOUNDARY`.
    pub params: Vec<(String, String)>,
    /// Content-Disposition.
    pub disposition: Option<Disposition>,
    /// Content-Language.
    pub language: Vec<String>,
    /// Content-Location.
    pub location: Option<String>,
}

/// `body-fld-dsp`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    /// `INLINE`, `ATTACHMENT`, ...
    pub kind: String,
    /// Parameters such as `FILENAME`.
    pub params: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(subtype: &str) -> Body {
        Body::Single(BodyPart {
            kind: PartKind::Text {
                media_subtype: subtype.into(),
                fields: BodyFields {
                    params: vec![("CHARSET".into(), "UTF-8".into())],
                    encoding: "7BIT".into(),
                    octets: 10,
                    ..BodyFields::default()
                },
                lines: 1,
            },
            extension: None,
        })
    }

    #[test]
    fn mime_types() {
        assert_eq!(text("PLAIN").mime_type(), "text/plain");
        let multi = Body::Multipart {
            parts: vec![text("PLAIN"), text("HTML")],
            media_subtype: "ALTERNATIVE".into(),
            extension: None,
        };
        assert_eq!(multi.mime_type(), "multipart/alternative");
    }

    #[test]
    fn param_lookup_is_case_insensitive() {
        let Body::Single(part) = text("PLAIN") else {
            unreachable!()
        };
        assert_eq!(part.fields().param("charset"), Some("UTF-8"));
        assert_eq!(part.fields().param("name"), None);
    }

    #[test]
    fn record_accessors() {
        let record = MessageDataRecord {
            message_number: 2,
            attributes: vec![
                MessageAttribute::Rfc822Header(b"Subject: x\r\n".to_vec()),
                MessageAttribute::Uid(7),
            ],
        };
        assert_eq!(record.uid(), Some(7));
        assert_eq!(record.header(), Some(&b"Subject: x\r\n"[..]));
        assert!(record.envelope().is_none());
        assert!(record.body_structure().is_none());
    }

    #[test]
    fn address_email() {
        let address = Address {
            mailbox: Some("fred".into()),
            host: Some("example.org".into()),
            ..Address::default()
        };
        assert_eq!(address.email().as_deref(), Some("fred@example.org"));
        assert_eq!(Address::default().email(), None);
    }
}

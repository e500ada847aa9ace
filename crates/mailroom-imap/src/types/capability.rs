//! Server capabilities and response status.

/// Status keyword of a tagged or untagged condition line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed successfully.
    Ok,
    /// Command failed (operational error).
    No,
    /// Command failed (protocol/syntax error).
    Bad,
    /// Server greeting (pre-authenticated).
    PreAuth,
    /// Server is closing connection.
    Bye,
}

impl Status {
    /// Returns true if this is a successful status.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok | Self::PreAuth)
    }

    /// Parses a status keyword, case-insensitively.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "OK" => Some(Self::Ok),
            "NO" => Some(Self::No),
            "BAD" => Some(Self::Bad),
            "PREAUTH" => Some(Self::PreAuth),
            "BYE" => Some(Self::Bye),
            _ => None,
        }
    }
}

/// Server capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `IMAP4rev1` (RFC 3501)
    Imap4Rev1,
    /// NAMESPACE command support (RFC 2342)
    Namespace,
    /// SASL initial response (RFC 4959)
    SaslIr,
    /// LITERAL+ extension (RFC 7888)
    LiteralPlus,
    /// STARTTLS support
    StartTls,
    /// LOGIN disabled
    LoginDisabled,
    /// AUTH mechanism
    Auth(String),
    /// Anything else, as sent
    Unknown(String),
}

impl Capability {
    /// Parses a capability string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let upper = s.to_ascii_uppercase();
        match upper.as_str() {
            "IMAP4REV1" => Self::Imap4Rev1,
            "NAMESPACE" => Self::Namespace,
            "SASL-IR" => Self::SaslIr,
            "LITERAL+" => Self::LiteralPlus,
            "STARTTLS" => Self::StartTls,
            "LOGINDISABLED" => Self::LoginDisabled,
            _ if upper.starts_with("AUTH=") => Self::Auth(upper[5..].to_string()),
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Returns true if this advertises the given SASL mechanism.
    #[must_use]
    pub fn is_auth(&self, mechanism: &str) -> bool {
        matches!(self, Self::Auth(m) if m.eq_ignore_ascii_case(mechanism))
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Imap4Rev1 => write!(f, "IMAP4rev1"),
            Self::Namespace => write!(f, "NAMESPACE"),
            Self::SaslIr => write!(f, "SASL-IR"),
            Self::LiteralPlus => write!(f, "LITERAL+"),
            Self::StartTls => write!(f, "STARTTLS"),
            Self::LoginDisabled => write!(f, "LOGINDISABLED"),
            Self::Auth(mech) => write!(f, "AUTH={mech}"),
            Self::Unknown(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod status_tests {
        use super::*;

        #[test]
        fn is_ok_for_ok_and_preauth() {
            assert!(Status::Ok.is_ok());
            assert!(Status::PreAuth.is_ok());
        }

        #[test]
        fn is_ok_false_for_failures() {
            assert!(!Status::No.is_ok());
            assert!(!Status::Bad.is_ok());
            assert!(!Status::Bye.is_ok());
        }

        #[test]
        fn parse_keywords() {
            assert_eq!(Status::parse("ok"), Some(Status::Ok));
            assert_eq!(Status::parse("BAD"), Some(Status::Bad));
            assert_eq!(Status::parse("PreAuth"), Some(Status::PreAuth));
            assert_eq!(Status::parse("FLAGS"), None);
        }
    }

    mod capability_parse_tests {
        use super::*;

        #[test]
        fn parse_imap4rev1() {
            assert_eq!(Capability::parse("IMAP4REV1"), Capability::Imap4Rev1);
            assert_eq!(Capability::parse("imap4rev1"), Capability::Imap4Rev1);
        }

        #[test]
        fn parse_sasl_ir() {
            assert_eq!(Capability::parse("SASL-IR"), Capability::SaslIr);
        }

        #[test]
        fn parse_auth_xoauth2() {
            let cap = Capability::parse("AUTH=xoauth2");
            assert_eq!(cap, Capability::Auth("XOAUTH2".to_string()));
            assert!(cap.is_auth("XOAUTH2"));
            assert!(!cap.is_auth("PLAIN"));
        }

        #[test]
        fn parse_unknown_keeps_case() {
            let cap = Capability::parse("X-GM-EXT-1");
            assert_eq!(cap, Capability::Unknown("X-GM-EXT-1".to_string()));
        }
    }

    #[test]
    fn display_round_trips() {
        for raw in ["IMAP4rev1", "AUTH=XOAUTH2", "SASL-IR", "X-GM-EXT-1"] {
            assert_eq!(Capability::parse(raw).to_string(), raw);
        }
    }
}

//! Mailbox types.

/// One item of mailbox state, in the order the server sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailboxDataRecord {
    /// `* FLAGS (...)`: flags defined in the mailbox.
    Flags(Vec<String>),
    /// `[PERMANENTFLAGS (...)]`: flags the client can store permanently.
    PermanentFlags(Vec<String>),
    /// `* N EXISTS`
    Exists(u32),
    /// `* N RECENT`
    Recent(u32),
    /// `[UIDVALIDITY N]`
    UidValidity(u32),
    /// `[UNSEEN N]`: first unseen message.
    Unseen(u32),
    /// `[UIDNEXT N]`
    UidNext(u32),
    /// `[READ-ONLY]`
    ReadOnly,
    /// `[READ-WRITE]`
    ReadWrite,
    /// `[TRYCREATE]`
    TryCreate,
}

/// Access mode reported for a selected mailbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    /// The server did not say.
    #[default]
    Unknown,
    /// `[READ-WRITE]`
    ReadWrite,
    /// `[READ-ONLY]`
    ReadOnly,
    /// `[TRYCREATE]`
    TryCreate,
}

/// Mailbox status after SELECT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectResponse {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// UIDVALIDITY value, 0 if not sent.
    pub uid_validity: u32,
    /// First unseen message sequence number.
    pub unseen: Option<u32>,
    /// Predicted next UID, 0 if not sent.
    pub uid_next: u32,
    /// Flags defined for this mailbox.
    pub flags: Vec<String>,
    /// Flags that can be permanently stored.
    pub permanent_flags: Vec<String>,
    /// Access mode.
    pub access: AccessMode,
}

impl SelectResponse {
    /// Folds decoded records into a status. Later values replace earlier ones.
    #[must_use]
    pub fn from_records(records: &[MailboxDataRecord]) -> Self {
        records.iter().fold(Self::default(), |mut status, record| {
            match record {
                MailboxDataRecord::Flags(flags) => status.flags.clone_from(flags),
                MailboxDataRecord::PermanentFlags(flags) => {
                    status.permanent_flags.clone_from(flags);
                }
                MailboxDataRecord::Exists(n) => status.exists = *n,
                MailboxDataRecord::Recent(n) => status.recent = *n,
                MailboxDataRecord::UidValidity(n) => status.uid_validity = *n,
                MailboxDataRecord::Unseen(n) => status.unseen = Some(*n),
                MailboxDataRecord::UidNext(n) => status.uid_next = *n,
                MailboxDataRecord::ReadOnly => status.access = AccessMode::ReadOnly,
                MailboxDataRecord::ReadWrite => status.access = AccessMode::ReadWrite,
                MailboxDataRecord::TryCreate => status.access = AccessMode::TryCreate,
            }
            status
        })
    }

    /// Returns true if the mailbox was opened read-only.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.access == AccessMode::ReadOnly
    }
}

/// One decoded LIST or LSUB line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListEntry {
    /// Name split on the hierarchy delimiter, each segment UTF-7 decoded.
    pub path: Vec<String>,
    /// Name attributes such as `\HasNoChildren`.
    pub flags: Vec<String>,
    /// Hierarchy delimiter, `None` for a flat namespace.
    pub delimiter: Option<char>,
    /// Name as the server sent it, to pass back to SELECT.
    pub raw_name: String,
}

impl ListEntry {
    /// Returns true if the entry carries `flag`, compared case-insensitively.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    /// Returns false for `\Noselect` and `\NonExistent` entries.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.has_flag("\\Noselect") && !self.has_flag("\\NonExistent")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::unreadable_literal)]
mod tests {
    use super::*;

    #[test]
    fn fold_last_value_wins() {
        let records = [
            MailboxDataRecord::Exists(3),
            MailboxDataRecord::Recent(1),
            MailboxDataRecord::Exists(5),
            MailboxDataRecord::ReadWrite,
        ];
        let status = SelectResponse::from_records(&records);
        assert_eq!(status.exists, 5);
        assert_eq!(status.recent, 1);
        assert_eq!(status.access, AccessMode::ReadWrite);
        assert_eq!(status.unseen, None);
    }

    #[test]
    fn fold_codes() {
        let records = [
            MailboxDataRecord::Flags(vec!["\\Seen".into()]),
            MailboxDataRecord::PermanentFlags(vec!["\\*".into()]),
            MailboxDataRecord::UidValidity(3857529045),
            MailboxDataRecord::UidNext(4392),
            MailboxDataRecord::Unseen(12),
            MailboxDataRecord::ReadOnly,
        ];
        let status = SelectResponse::from_records(&records);
        assert_eq!(status.flags, vec!["\\Seen"]);
        assert_eq!(status.permanent_flags, vec!["\\*"]);
        assert_eq!(status.uid_validity, 3857529045);
        assert_eq!(status.uid_next, 4392);
        assert_eq!(status.unseen, Some(12));
        assert!(status.is_read_only());
    }

    #[test]
    fn list_entry_flags() {
        let entry = ListEntry {
            path: vec!["[Gmail]".into()],
            flags: vec!["\\HasChildren".into(), "\\NoSelect".into()],
            delimiter: Some('/'),
            raw_name: "[Gmail]".into(),
        };
        assert!(entry.has_flag("\\haschildren"));
        assert!(!entry.is_selectable());
    }
}

//! User-defined terminals for IMAP literals.
//!
//! A literal (`{N}\r\n` followed by N octets) is not regular: the length of
//! the data part is only known once the size has been read. The size terminal
//! stores N in the parse state and the data terminal consumes exactly that
//! many octets, CR and LF included.

/// Terminal matchers that cannot be expressed as static grammar nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    /// A run of ASCII digits, remembered as the pending literal size.
    LiteralSize,
    /// Exactly the pending number of non-NUL octets.
    LiteralData,
}

/// Parse state shared between the two literal terminals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LiteralState {
    pending: Option<u32>,
}

impl LiteralState {
    /// State with no literal size pending.
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }
}

impl Terminal {
    /// Tries to match at `pos`, returning the end offset on success.
    pub fn matches(self, input: &[u8], pos: usize, state: &mut LiteralState) -> Option<usize> {
        match self {
            Self::LiteralSize => {
                let digits = input
                    .get(pos..)?
                    .iter()
                    .take_while(|b| b.is_ascii_digit())
                    .count();
                if digits == 0 {
                    return None;
                }
                let size = std::str::from_utf8(&input[pos..pos + digits])
                    .ok()?
                    .parse::<u32>()
                    .ok()?;
                state.pending = Some(size);
                Some(pos + digits)
            }
            Self::LiteralData => {
                let size = usize::try_from(state.pending.take()?).ok()?;
                let end = pos.checked_add(size)?;
                let data = input.get(pos..end)?;
                if data.contains(&0) {
                    return None;
                }
                Some(end)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn data_after_size(input: &[u8], size: &[u8]) -> Option<usize> {
        let mut state = LiteralState::new();
        Terminal::LiteralSize.matches(size, 0, &mut state)?;
        Terminal::LiteralData.matches(input, 0, &mut state)
    }

    #[test]
    fn data_needs_a_pending_size() {
        const FRESH: LiteralState = LiteralState::new();
        let mut state = FRESH;
        assert_eq!(state, LiteralState::default());
        assert_eq!(Terminal::LiteralData.matches(b"abc", 0, &mut state), None);
    }

    #[test]
    fn size_records_pending_value() {
        let mut state = LiteralState::default();
        assert_eq!(Terminal::LiteralSize.matches(b"{42}", 1, &mut state), Some(3));
        assert_eq!(state.pending, Some(42));
    }

    #[test]
    fn size_requires_a_digit() {
        let mut state = LiteralState::default();
        assert_eq!(Terminal::LiteralSize.matches(b"}", 0, &mut state), None);
        assert_eq!(state.pending, None);
    }

    #[test]
    fn size_rejects_overflow() {
        let mut state = LiteralState::default();
        assert_eq!(
            Terminal::LiteralSize.matches(b"99999999999", 0, &mut state),
            None
        );
    }

    #[test]
    fn data_takes_exactly_size_bytes() {
        assert_eq!(data_after_size(b"12\r\n5", b"4"), Some(4));
        assert_eq!(data_after_size(b"123", b"4"), None);
        assert_eq!(data_after_size(b"", b"0"), Some(0));
    }

    #[test]
    fn data_rejects_nul() {
        assert_eq!(data_after_size(b"1\x0023", b"4"), None);
    }

    #[test]
    fn data_without_size_fails() {
        let mut state = LiteralState::default();
        assert_eq!(Terminal::LiteralData.matches(b"abc", 0, &mut state), None);
    }

    #[test]
    fn data_consumes_pending_size() {
        let mut state = LiteralState::default();
        Terminal::LiteralSize.matches(b"1", 0, &mut state).unwrap();
        assert_eq!(Terminal::LiteralData.matches(b"a", 0, &mut state), Some(1));
        assert_eq!(Terminal::LiteralData.matches(b"a", 0, &mut state), None);
    }
}

//! Connection state of the client façade.

/// Where the connection stands.
///
/// Transitions: `connect`/`attach` move to `Connected` (or straight to
/// `Authenticated` on a PREAUTH greeting), a successful `authenticate` moves
/// to `Authenticated`, and `disconnect` or a transport failure moves back to
/// `NotConnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No stream is open.
    #[default]
    NotConnected,
    /// The greeting was received; not yet authenticated.
    Connected,
    /// Authentication succeeded.
    Authenticated,
}

impl ConnectionState {
    /// Returns true unless the state is `NotConnected`.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        !matches!(self, Self::NotConnected)
    }
}

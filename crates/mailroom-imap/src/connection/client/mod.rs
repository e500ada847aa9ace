//! IMAP client façade.
//!
//! One [`Client`] owns at most one connection and runs one command at a
//! time. Every operation takes `&mut self`, so overlapping commands are
//! rejected by the borrow checker rather than queued.

mod mailbox;
mod message;
mod states;

use mailroom_oauth::AuthData;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info};

pub use self::states::ConnectionState;
use super::auth::authenticate_xoauth2;
use super::config::Config;
use super::correlator::Correlator;
use super::stream::{self, ImapStream};
use crate::command::Command;
use crate::decode::parse_failure;
use crate::grammar::{self, Rule, RuleSet};
use crate::response::{ImapResponse, ResponseLine};
use crate::types::{Capability, Status};
use crate::{Error, Result};

/// IMAP client.
///
/// The stream type defaults to [`ImapStream`]; tests and custom transports
/// hand any other stream to [`Client::attach`].
pub struct Client<S = ImapStream> {
    config: Config,
    connection: Option<Correlator<S>>,
    state: ConnectionState,
    capabilities: Vec<Capability>,
}

impl<S> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("host", &self.config.host)
            .field("state", &self.state)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl Client<ImapStream> {
    /// Opens the configured connection and reads the greeting.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyConnected`] if a connection is open,
    /// [`Error::Timeout`] if connecting or the greeting takes longer than the
    /// connect timeout, and any error from [`Client::attach`].
    pub async fn connect(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Err(Error::AlreadyConnected);
        }
        let stream = stream::connect(&self.config).await?;
        let limit = self.config.connect_timeout;
        tokio::time::timeout(limit, self.attach(stream))
            .await
            .map_err(|_| Error::Timeout(limit))?
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a disconnected client.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            connection: None,
            state: ConnectionState::NotConnected,
            capabilities: Vec::new(),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the connection state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Returns the capabilities from the last CAPABILITY command.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Adopts an open stream and reads the server greeting from it.
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyConnected`] if a connection is open,
    /// [`Error::Syntax`] for a malformed greeting, [`Error::Protocol`] for a
    /// BYE greeting, and transport errors.
    pub async fn attach(&mut self, stream: S) -> Result<()> {
        if self.connection.is_some() {
            return Err(Error::AlreadyConnected);
        }
        let mut connection = Correlator::new(stream, self.config.tag_prefix);
        let greeting = connection.read_line().await?;
        let state = greeting_state(&greeting)?;

        info!(host = %self.config.host, greeting = %greeting.rest(2), "connected");
        self.connection = Some(connection);
        self.state = state;
        Ok(())
    }

    /// Sends CAPABILITY and returns the advertised capabilities as sent.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`], [`Error::No`]/[`Error::Bad`] for a rejected
    /// command, and transport errors.
    pub async fn capability(&mut self) -> Result<Vec<String>> {
        let response = self.execute_ok(&Command::Capability).await?;
        let names: Vec<String> = response
            .untagged()
            .filter(|line| {
                line.token_str(1)
                    .is_some_and(|t| t.eq_ignore_ascii_case("CAPABILITY"))
            })
            .flat_map(|line| {
                (2..line.token_count())
                    .filter_map(|i| line.token_str(i).map(ToString::to_string))
                    .collect::<Vec<_>>()
            })
            .collect();

        self.capabilities = names.iter().map(|name| Capability::parse(name)).collect();
        debug!(count = names.len(), "capabilities updated");
        Ok(names)
    }

    /// Authenticates with SASL XOAUTH2.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`], [`Error::Auth`] if the server rejects the
    /// token, and the other errors of the exchange.
    pub async fn authenticate(&mut self, auth: &AuthData) -> Result<()> {
        let connection = self.connection()?;
        let result = authenticate_xoauth2(connection, auth).await;
        self.settle(result)?;

        info!(user = %auth.user_email, "authenticated");
        self.state = ConnectionState::Authenticated;
        Ok(())
    }

    /// Sends NAMESPACE and returns the raw response.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`], [`Error::No`]/[`Error::Bad`] for a rejected
    /// command, and transport errors.
    pub async fn namespace(&mut self) -> Result<ImapResponse> {
        self.execute_ok(&Command::Namespace).await
    }

    /// Sends LOGOUT and closes the connection.
    ///
    /// The client is disconnected afterwards whatever the outcome.
    ///
    /// # Errors
    ///
    /// [`Error::NotConnected`] if there is no connection, otherwise errors
    /// from the LOGOUT exchange. The server closing the stream after its
    /// BYE is not an error.
    pub async fn disconnect(&mut self) -> Result<()> {
        let mut connection = self.connection.take().ok_or(Error::NotConnected)?;
        self.state = ConnectionState::NotConnected;
        self.capabilities.clear();

        let result = match connection.execute(&Command::Logout).await {
            Ok(_) | Err(Error::Closed) => Ok(()),
            Err(err) => Err(err),
        };
        if let Err(err) = connection.into_inner().shutdown().await {
            debug!(%err, "shutdown after LOGOUT failed");
        }
        info!(host = %self.config.host, "disconnected");
        result
    }

    fn connection(&mut self) -> Result<&mut Correlator<S>> {
        self.connection.as_mut().ok_or(Error::NotConnected)
    }

    /// Drops the connection after a transport failure.
    fn settle<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err @ (Error::Io(_) | Error::Closed)) = &result {
            error!(%err, "connection lost");
            self.connection = None;
            self.state = ConnectionState::NotConnected;
        }
        result
    }

    pub(crate) async fn execute(&mut self, command: &Command) -> Result<ImapResponse> {
        let result = self.connection()?.execute(command).await;
        self.settle(result)
    }

    /// Runs a command and turns a NO or BAD completion into an error.
    pub(crate) async fn execute_ok(&mut self, command: &Command) -> Result<ImapResponse> {
        self.execute(command).await?.ensure_ok().inspect_err(|err| {
            error!(%err, command = %command.redacted(), "command rejected");
        })
    }
}

/// Checks the greeting against the grammar and maps its status.
fn greeting_state(greeting: &ResponseLine) -> Result<ConnectionState> {
    let mut input = greeting.as_bytes().to_vec();
    input.extend_from_slice(b"\r\n");
    grammar::parse_tree(&input, Rule::Greeting, &RuleSet::EMPTY)
        .map_err(|err| parse_failure(err, "greeting"))?;

    match greeting.status() {
        Some(Status::PreAuth) => Ok(ConnectionState::Authenticated),
        Some(Status::Bye) => Err(Error::Protocol(format!(
            "server refused connection: {}",
            greeting.rest(2)
        ))),
        _ => Ok(ConnectionState::Connected),
    }
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
    use tokio_test::io::Builder;

    use super::*;

    fn client() -> Client<tokio_test::io::Mock> {
        Client::new(Config::new("imap.gmail.com"))
    }

    #[test]
    fn test_greeting_states() {
        let ok = ResponseLine::new("* OK Gimap ready for requests from 10.0.0.1 h3mb1");
        assert_eq!(greeting_state(&ok).unwrap(), ConnectionState::Connected);

        let preauth = ResponseLine::new("* PREAUTH [CAPABILITY IMAP4rev1] welcome back");
        assert_eq!(
            greeting_state(&preauth).unwrap(),
            ConnectionState::Authenticated
        );

        let bye = ResponseLine::new("* BYE too many connections");
        assert!(matches!(greeting_state(&bye), Err(Error::Protocol(_))));

        let garbage = ResponseLine::new("HELLO there");
        assert!(greeting_state(&garbage).unwrap_err().is_parse());
    }

    #[tokio::test]
    async fn test_not_connected() {
        let mut client = client();
        assert_eq!(client.state(), ConnectionState::NotConnected);
        assert!(matches!(
            client.capability().await,
            Err(Error::NotConnected)
        ));
        assert!(matches!(client.disconnect().await, Err(Error::NotConnected)));
    }

    #[tokio::test]
    async fn test_attach_twice() {
        let mut client = client();
        client
            .attach(Builder::new().read(b"* OK ready\r\n").build())
            .await
            .unwrap();
        assert_eq!(client.state(), ConnectionState::Connected);

        let err = client.attach(Builder::new().build()).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyConnected));
    }

    #[tokio::test]
    async fn test_capability() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 CAPABILITY\r\n")
            .read(b"* CAPABILITY IMAP4rev1 SASL-IR AUTH=XOAUTH2 AUTH=PLAIN NAMESPACE\r\n")
            .read(b"A0 OK Thats all she wrote!\r\n")
            .build();
        let mut client = client();
        client.attach(mock).await.unwrap();

        let caps = client.capability().await.unwrap();
        assert_eq!(
            caps,
            vec!["IMAP4rev1", "SASL-IR", "AUTH=XOAUTH2", "AUTH=PLAIN", "NAMESPACE"]
        );
        assert!(client.capabilities().iter().any(|c| c.is_auth("xoauth2")));
        assert!(client.capabilities().contains(&Capability::Namespace));
    }

    #[tokio::test]
    async fn test_connection_lost_resets_state() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 NAMESPACE\r\n")
            .read(b"* NAMESPACE ((\"\" \"/\")) NIL NI")
            .build();
        let mut client = client();
        client.attach(mock).await.unwrap();

        assert!(matches!(client.namespace().await, Err(Error::Closed)));
        assert_eq!(client.state(), ConnectionState::NotConnected);
    }

    #[tokio::test]
    async fn test_disconnect() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 LOGOUT\r\n")
            .read(b"* BYE LOGOUT Requested\r\n")
            .read(b"A0 OK 73 good day (Success)\r\n")
            .build();
        let mut client = client();
        client.attach(mock).await.unwrap();

        client.disconnect().await.unwrap();
        assert_eq!(client.state(), ConnectionState::NotConnected);
    }

    #[tokio::test]
    async fn test_disconnect_tolerates_close_after_bye() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"A0 LOGOUT\r\n")
            .read(b"* BYE bye\r\n")
            .build();
        let mut client = client();
        client.attach(mock).await.unwrap();

        client.disconnect().await.unwrap();
    }
}

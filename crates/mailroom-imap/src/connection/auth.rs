//! SASL XOAUTH2 exchange.
//!
//! ```text
//! C: A0 AUTHENTICATE XOAUTH2 <initial response>
//! S: + <base64 JSON error>        (only on failure)
//! C: <empty line>
//! S: A0 NO [AUTHENTICATIONFAILED] Invalid credentials (Failure)
//! ```

use mailroom_oauth::{AuthData, sasl};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error};

use super::correlator::Correlator;
use crate::command::Command;
use crate::error::AuthErrorDetails;
use crate::response::{ImapResponse, ResponseLine};
use crate::types::Status;
use crate::{Error, Result};

#[derive(Debug, PartialEq, Eq)]
enum State {
    AwaitingFirstResponse,
    ChallengeSeen { summary: String },
}

impl State {
    fn summary(self) -> String {
        match self {
            Self::AwaitingFirstResponse => String::new(),
            Self::ChallengeSeen { summary } => summary,
        }
    }
}

/// Runs `AUTHENTICATE XOAUTH2` to completion.
///
/// Untagged lines are kept in the response. At most one continuation request
/// is answered, with an empty line.
///
/// # Errors
///
/// [`Error::Auth`] when the server answers NO or BAD, carrying the decoded
/// challenge if there was one. [`Error::Protocol`] for a second challenge or
/// an unknown completion status, [`Error::BadMessage`] for a line with a
/// foreign tag, and transport errors.
pub async fn authenticate_xoauth2<S>(
    correlator: &mut Correlator<S>,
    auth: &AuthData,
) -> Result<ImapResponse>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let command = Command::Authenticate {
        mechanism: "XOAUTH2".to_string(),
        initial_response: Some(sasl::xoauth2_response(
            &auth.user_email,
            &auth.access_token,
        )),
    };
    let tag = correlator.send(&command).await?;
    let mut response = ImapResponse::new(tag);
    let mut state = State::AwaitingFirstResponse;

    loop {
        let line = correlator.read_line().await?;

        if line.is_untagged() {
            response.lines.push(line);
        } else if line.is_continuation() {
            if state != State::AwaitingFirstResponse {
                return Err(Error::Protocol(
                    "second XOAUTH2 challenge before completion".to_string(),
                ));
            }
            let summary = challenge_summary(&line);
            debug!(tag = %response.tag, "XOAUTH2 challenge received, sending empty response");
            correlator.write_raw(b"\r\n").await?;
            state = State::ChallengeSeen { summary };
        } else if line.is_tagged(&response.tag) {
            let status = line.status();
            let text = line.rest(2).into_owned();
            response.lines.push(line);
            return match status {
                Some(Status::Ok) => Ok(response),
                Some(Status::No | Status::Bad) => {
                    let details = AuthErrorDetails {
                        summary: state.summary(),
                    };
                    log_rejection(&text, &details);
                    Err(Error::Auth { text, details })
                }
                _ => Err(Error::Protocol(format!(
                    "unexpected AUTHENTICATE completion: {text}"
                ))),
            };
        } else {
            return Err(Error::BadMessage(line.text().into_owned()));
        }
    }
}

/// Decodes the payload of a challenge line. A payload that is not base64
/// text is kept as sent; a bare `+` gives an empty summary.
fn challenge_summary(line: &ResponseLine) -> String {
    let Some(payload) = line.token_str(1) else {
        return String::new();
    };
    sasl::decode_challenge(payload).unwrap_or_else(|_| line.rest(1).into_owned())
}

fn log_rejection(text: &str, details: &AuthErrorDetails) {
    match sasl::parse_oauth_error(&details.summary) {
        Ok(oauth) => error!(
            status = %oauth.status,
            schemes = %oauth.schemes,
            scope = oauth.scope.as_deref().unwrap_or(""),
            "XOAUTH2 rejected: {text}"
        ),
        Err(_) => error!(summary = %details.summary, "XOAUTH2 rejected: {text}"),
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
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use tokio_test::io::Builder;

    use super::*;

    const ERROR_JSON: &str =
        r#"{"status":"400","schemes":"Bearer","scope":"https://mail.google.com/"}"#;

    fn auth() -> AuthData {
        AuthData::new("someone@gmail.com", "ya29.token")
    }

    fn command_line() -> Vec<u8> {
        format!(
            "A0 AUTHENTICATE XOAUTH2 {}\r\n",
            sasl::xoauth2_response("someone@gmail.com", "ya29.token")
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn test_success() {
        let mock = Builder::new()
            .write(&command_line())
            .read(b"* CAPABILITY IMAP4rev1 UNSELECT IDLE NAMESPACE\r\n")
            .read(b"A0 OK someone@gmail.com authenticated (Success)\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let response = authenticate_xoauth2(&mut correlator, &auth()).await.unwrap();
        assert_eq!(response.lines.len(), 2);
        assert_eq!(response.status(), Some(Status::Ok));
    }

    #[tokio::test]
    async fn test_failure_with_challenge() {
        let challenge = format!("+ {}\r\n", STANDARD.encode(ERROR_JSON));
        let mock = Builder::new()
            .write(&command_line())
            .read(challenge.as_bytes())
            .write(b"\r\n")
            .read(b"A0 NO [AUTHENTICATIONFAILED] Invalid credentials (Failure)\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let err = authenticate_xoauth2(&mut correlator, &auth()).await.unwrap_err();
        let Error::Auth { text, details } = err else {
            panic!("expected auth error, got {err:?}");
        };
        assert_eq!(text, "[AUTHENTICATIONFAILED] Invalid credentials (Failure)");
        assert_eq!(details.summary, ERROR_JSON);
    }

    #[tokio::test]
    async fn test_failure_without_challenge() {
        let mock = Builder::new()
            .write(&command_line())
            .read(b"A0 BAD Invalid SASL argument\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let err = authenticate_xoauth2(&mut correlator, &auth()).await.unwrap_err();
        assert_eq!(err.auth_details().unwrap().summary, "");
    }

    #[tokio::test]
    async fn test_undecodable_challenge_kept_verbatim() {
        let mock = Builder::new()
            .write(&command_line())
            .read(b"+ not base64 at all\r\n")
            .write(b"\r\n")
            .read(b"A0 NO denied\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let err = authenticate_xoauth2(&mut correlator, &auth()).await.unwrap_err();
        assert_eq!(err.auth_details().unwrap().summary, "not base64 at all");
    }

    #[tokio::test]
    async fn test_second_challenge_is_protocol_error() {
        let mock = Builder::new()
            .write(&command_line())
            .read(b"+ e30=\r\n")
            .write(b"\r\n")
            .read(b"+ e30=\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let err = authenticate_xoauth2(&mut correlator, &auth()).await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_foreign_tag_is_bad_message() {
        let mock = Builder::new()
            .write(&command_line())
            .read(b"X1 OK what\r\n")
            .build();
        let mut correlator = Correlator::new(mock, 'A');

        let err = authenticate_xoauth2(&mut correlator, &auth()).await.unwrap_err();
        assert!(matches!(err, Error::BadMessage(_)));
    }
}

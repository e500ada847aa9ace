//! SASL XOAUTH2 (Google/Microsoft) encoding and challenge decoding.
//!
//! The client sends the initial response with `AUTHENTICATE XOAUTH2`. On
//! failure the server answers with a continuation request whose payload is a
//! base64 JSON object describing the error.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::Result;

/// Generates the XOAUTH2 initial response.
///
/// Format: `user=<user>\x01auth=Bearer <token>\x01\x01`, base64-encoded.
///
/// # Example
///
/// ```
/// use mailroom_oauth::sasl::xoauth2_response;
///
/// let response = xoauth2_response("user@example.com", "ya29.a0...");
/// // Send: AUTHENTICATE XOAUTH2 {response}
/// ```
#[must_use]
pub fn xoauth2_response(user: &str, token: &str) -> String {
    let auth_string = format!("user={user}\x01auth=Bearer {token}\x01\x01");
    STANDARD.encode(auth_string.as_bytes())
}

/// Decodes a continuation payload to text.
///
/// # Errors
///
/// Returns an error if the payload is not base64 or not UTF-8.
pub fn decode_challenge(payload: &str) -> Result<String> {
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Parses an `OAuth2` error response from the server.
///
/// `OAuth2` errors are JSON-encoded: `{"status":"401", "schemes":"bearer", "scope":"..."}`
///
/// # Errors
///
/// Returns an error if the response cannot be parsed.
pub fn parse_oauth_error(response: &str) -> Result<OAuthError> {
    Ok(serde_json::from_str(response)?)
}

/// `OAuth2` error response from server.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct OAuthError {
    /// HTTP status code.
    pub status: String,
    /// Authentication schemes supported.
    #[serde(default)]
    pub schemes: String,
    /// `OAuth2` scope required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
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
    use super::*;

    #[test]
    fn test_xoauth2_format() {
        let response = xoauth2_response("test@test.com", "abc");
        let decoded = STANDARD.decode(&response).unwrap();
        let decoded_str = String::from_utf8(decoded).unwrap();

        assert_eq!(decoded_str, "user=test@test.com\x01auth=Bearer abc\x01\x01");
    }

    #[test]
    fn test_response_is_base64() {
        let response = xoauth2_response("user@example.com", "token");
        assert!(!response.contains("user@example.com"));
        assert!(!response.contains("token"));
    }

    #[test]
    fn test_decode_challenge() {
        let payload = STANDARD.encode(r#"{"status":"400","schemes":"Bearer","scope":"https://mail.google.com/"}"#);
        let text = decode_challenge(&payload).unwrap();
        assert!(text.starts_with(r#"{"status":"400""#));

        assert!(decode_challenge("not base64!").is_err());
    }

    #[test]
    fn test_parse_oauth_error() {
        let json = r#"{"status":"401","schemes":"bearer","scope":"https://mail.google.com/"}"#;
        let error = parse_oauth_error(json).unwrap();

        assert_eq!(error.status, "401");
        assert_eq!(error.schemes, "bearer");
        assert_eq!(error.scope.as_deref(), Some("https://mail.google.com/"));
    }

    #[test]
    fn test_parse_oauth_error_minimal() {
        let error = parse_oauth_error(r#"{"status":"400"}"#).unwrap();
        assert_eq!(error.schemes, "");
        assert!(error.scope.is_none());
        assert!(parse_oauth_error("Invalid credentials").is_err());
    }
}

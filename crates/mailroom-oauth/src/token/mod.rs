//! `OAuth2` token data as handed to the mail protocols.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Credentials for one mail account, produced by the authorization flow.
///
/// The IMAP engine only reads `user_email` and `access_token`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthData {
    /// Account address, sent as the SASL `user`.
    pub user_email: String,
    /// Access token string.
    pub access_token: String,
    /// Token type (usually "Bearer").
    pub token_type: String,
    /// Expiration time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// `OpenID` Connect ID token, a JWT.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Granted scopes.
    #[serde(default)]
    pub scope: Vec<String>,
}

impl std::fmt::Debug for AuthData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthData")
            .field("user_email", &self.user_email)
            .field("access_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

impl AuthData {
    /// Creates bearer credentials with no expiry.
    #[must_use]
    pub fn new(user_email: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            user_email: user_email.into(),
            access_token: access_token.into(),
            token_type: "Bearer".to_string(),
            expires_at: None,
            id_token: None,
            scope: Vec::new(),
        }
    }

    /// Builds credentials from a token endpoint response.
    ///
    /// When `user_email` is `None`, the address is read from the `email`
    /// claim of the response's ID token.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidResponse`] if the response has no access token or no
    /// address can be found, and decoding errors from the ID token.
    pub fn from_response(response: TokenResponse, user_email: Option<String>) -> Result<Self> {
        if response.access_token.is_empty() {
            return Err(Error::InvalidResponse("empty access_token".to_string()));
        }
        let user_email = match user_email {
            Some(email) => email,
            None => {
                let id_token = response.id_token.as_deref().ok_or_else(|| {
                    Error::InvalidResponse("no user email and no id_token".to_string())
                })?;
                email_claim(id_token)?
            }
        };
        let expires_at = response
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(i64::from(secs)));

        Ok(Self {
            user_email,
            access_token: response.access_token,
            token_type: response.token_type,
            expires_at,
            id_token: response.id_token,
            scope: response
                .scope
                .map(|s| s.split_whitespace().map(ToString::to_string).collect())
                .unwrap_or_default(),
        })
    }

    /// Checks if the token is expired (with 60 second buffer).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|exp| Utc::now() + Duration::seconds(60) >= exp)
    }

    /// Returns the access token, or [`Error::TokenExpired`].
    ///
    /// # Errors
    ///
    /// [`Error::TokenExpired`] if the token is expired.
    pub fn valid_token(&self) -> Result<&str> {
        if self.is_expired() {
            Err(Error::TokenExpired)
        } else {
            Ok(&self.access_token)
        }
    }

    /// Sets the expiration time.
    #[must_use]
    pub const fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Reads the `email` claim from a JWT without verifying it.
fn email_claim(jwt: &str) -> Result<String> {
    #[derive(Deserialize)]
    struct Claims {
        email: Option<String>,
    }

    let payload = jwt
        .split('.')
        .nth(1)
        .ok_or_else(|| Error::InvalidResponse("id_token is not a JWT".to_string()))?;
    let claims: Claims = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload)?)?;
    claims
        .email
        .ok_or_else(|| Error::InvalidResponse("id_token has no email claim".to_string()))
}

/// Token response from `OAuth2` server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type.
    pub token_type: String,
    /// Expires in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u32>,
    /// `OpenID` Connect ID token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Space-separated scopes.
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

    fn jwt(claims: &str) -> String {
        format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(claims)
        )
    }

    #[test]
    fn test_auth_data_new() {
        let auth = AuthData::new("user@gmail.com", "ya29.token");
        assert_eq!(auth.token_type, "Bearer");
        assert!(!auth.is_expired());
        assert_eq!(auth.valid_token().unwrap(), "ya29.token");
    }

    #[test]
    fn test_expiration() {
        let expired = AuthData::new("a@b.c", "t").with_expires_at(Utc::now() - Duration::seconds(120));
        assert!(expired.is_expired());
        assert!(matches!(expired.valid_token(), Err(Error::TokenExpired)));

        let soon = AuthData::new("a@b.c", "t").with_expires_at(Utc::now() + Duration::seconds(30));
        assert!(soon.is_expired());

        let valid = AuthData::new("a@b.c", "t").with_expires_at(Utc::now() + Duration::seconds(3600));
        assert!(!valid.is_expired());
    }

    #[test]
    fn test_from_json_response() {
        let json = format!(
            r#"{{"access_token":"ya29.x","expires_in":3599,"token_type":"Bearer","scope":"https://mail.google.com/ openid email","id_token":"{}"}}"#,
            jwt(r#"{"email":"someone@gmail.com","email_verified":true}"#)
        );
        let response: TokenResponse = serde_json::from_str(&json).unwrap();
        let auth = AuthData::from_response(response, None).unwrap();

        assert_eq!(auth.user_email, "someone@gmail.com");
        assert_eq!(auth.scope, vec!["https://mail.google.com/", "openid", "email"]);
        assert!(auth.expires_at.is_some());
        assert!(!auth.is_expired());
    }

    #[test]
    fn test_explicit_email_wins() {
        let response = TokenResponse {
            access_token: "t".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: None,
            id_token: None,
            scope: None,
        };
        let auth = AuthData::from_response(response, Some("me@x.org".to_string())).unwrap();
        assert_eq!(auth.user_email, "me@x.org");
        assert!(auth.scope.is_empty());
    }

    #[test]
    fn test_missing_email() {
        let response = TokenResponse {
            access_token: "t".to_string(),
            token_type: "Bearer".to_string(),
            expires_in: None,
            id_token: Some(jwt(r#"{"sub":"123"}"#)),
            scope: None,
        };
        assert!(matches!(
            AuthData::from_response(response, None),
            Err(Error::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let auth = AuthData::new("a@b.c", "secret-token");
        assert!(!format!("{auth:?}").contains("secret-token"));
    }
}

//! # mailroom-oauth
//!
//! The `OAuth2` side of mail authentication, up to the protocol boundary.
//!
//! The browser-based authorization flow lives in the embedding application.
//! This crate holds what it produces ([`AuthData`]) and what the IMAP engine
//! needs from it: the SASL XOAUTH2 initial response and decoding of the
//! server's error challenge.
//!
//! ```
//! use mailroom_oauth::{AuthData, sasl};
//!
//! let auth = AuthData::new("user@gmail.com", "ya29.a0...");
//! let initial_response = sasl::xoauth2_response(&auth.user_email, &auth.access_token);
//! // Send: AUTHENTICATE XOAUTH2 {initial_response}
//! # assert!(!initial_response.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
pub mod sasl;
pub mod token;

pub use error::{Error, Result};
pub use token::{AuthData, TokenResponse};

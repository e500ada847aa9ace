//! Connection handling: transport, framing, command correlation, and the
//! client façade built on them.

mod auth;
mod client;
mod config;
mod correlator;
mod framed;
mod stream;

pub use auth::authenticate_xoauth2;
pub use client::{Client, ConnectionState};
pub use config::{Config, ConfigBuilder, Security};
pub use correlator::Correlator;
pub use framed::FramedStream;
pub use stream::{ImapStream, connect, connect_plain, connect_tls, create_tls_connector};

//! Message composition and session configuration

pub mod address;
pub mod builder;
pub mod config;
pub mod error;
pub mod message;
pub mod session;
pub mod transport;

pub use address::Address;
pub use builder::{BuilderState, MessageBuilder};
pub use config::{Draft, MessageConfig, NamedAddress, SessionConfig};
pub use error::{ArgumentMessages, MailError};
pub use message::{BuiltMessage, RecipientType};
pub use session::{
    Credentials, MailSession, SSL_SOCKET_FACTORY, SessionDefaults, SessionProperties,
    SessionSettings,
};
pub use transport::{DirectoryTransport, Transport, send};

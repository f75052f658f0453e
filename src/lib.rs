//! # Mailcraft
//!
//! Mailcraft composes outgoing email.
//!
//! A [`MessageBuilder`] collects recipients, headers, subject, body and SMTP
//! session settings, then produces an immutable [`BuiltMessage`] and a
//! [`MailSession`] describing how to reach the server. Delivery is left to a
//! [`Transport`].
//!
//! ## Quick Start
//!
//! ```rust
//! use mailcraft::{MessageBuilder, RecipientType};
//!
//! # fn main() -> Result<(), mailcraft::MailError> {
//! let mut builder = MessageBuilder::new();
//! builder
//!     .set_from("a@x.com")?
//!     .add_to(["b@x.com"])?
//!     .add_cc(["c@x.com"])?
//!     .add_reply_to("e@x.com", "R")?
//!     .set_host_name("smtp.example.com")?;
//! builder.set_subject("Hello").set_body("This is a message.");
//!
//! let message = builder.build()?;
//! assert_eq!(message.recipients(RecipientType::Cc).len(), 1);
//!
//! let session = builder.open_session()?;
//! assert_eq!(session.host(), "smtp.example.com");
//! # Ok(())
//! # }
//! ```
//!
//! ## Rules
//!
//! - A builder builds once. A second [`MessageBuilder::build`] fails with
//!   "The MimeMessage is already built."
//! - Building needs a From address and at least one To, Cc or Bcc recipient.
//! - Opening a session needs a host name. Afterwards the session settings
//!   are frozen.
//! - Header names and values may not be empty.
//!
//! ## Defaults
//!
//! - SMTP port 25, SSL SMTP port 465
//! - Socket and connection timeouts of 60000 ms
//! - Sent date: the moment the builder was created
//! - Body: `text/plain`, encoded as UTF-8 unless a charset is selected

pub mod logging;
mod mail;

pub use mail::{
    Address, ArgumentMessages, BuilderState, BuiltMessage, Credentials, DirectoryTransport, Draft,
    MailError, MailSession, MessageBuilder, MessageConfig, NamedAddress, RecipientType,
    SSL_SOCKET_FACTORY, SessionConfig, SessionDefaults, SessionProperties, SessionSettings,
    Transport, send,
};

//! Delivery seam between built messages and whatever carries them

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};
use ulid::Ulid;

use crate::mail::builder::MessageBuilder;
use crate::mail::error::MailError;
use crate::mail::message::BuiltMessage;
use crate::mail::session::MailSession;

/// Carries a built message over a session. Returns an identifier for the
/// delivered message.
pub trait Transport {
    fn send(&self, session: &MailSession, message: &BuiltMessage) -> Result<String, MailError>;
}

/// Open the session, build the message and hand both to `transport`.
///
/// The session opens first so a missing host name is reported before the
/// builder is spent.
pub fn send<T>(builder: &mut MessageBuilder, transport: &T) -> Result<String, MailError>
where
    T: Transport + ?Sized,
{
    let session = builder.open_session()?;
    let message = builder.build()?;
    let id = transport.send(&session, &message)?;

    info!(
        id = %id,
        host = session.host(),
        port = session.port(),
        recipients = message.all_recipients().count(),
        "message sent"
    );
    Ok(id)
}

/// Writes each message as `<ulid>.eml` into a directory
#[derive(Debug, Clone)]
pub struct DirectoryTransport {
    dir: PathBuf,
}

impl DirectoryTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Transport for DirectoryTransport {
    fn send(&self, session: &MailSession, message: &BuiltMessage) -> Result<String, MailError> {
        let bytes = message.formatted()?;
        let id = Ulid::new().to_string();
        let path = self.dir.join(format!("{id}.eml"));

        fs::write(&path, bytes).map_err(|e| MailError::Delivery {
            host: session.host().to_owned(),
            port: session.port(),
            source: Box::new(e),
        })?;

        debug!(path = %path.display(), "message written");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recording {
        sent: RefCell<Vec<(String, BuiltMessage)>>,
    }

    impl Transport for Recording {
        fn send(&self, session: &MailSession, message: &BuiltMessage) -> Result<String, MailError> {
            let mut sent = self.sent.borrow_mut();
            sent.push((session.host().to_owned(), message.clone()));
            Ok(format!("msg-{}", sent.len()))
        }
    }

    fn builder() -> MessageBuilder {
        let mut builder = MessageBuilder::new();
        builder.set_from("a@x.com").unwrap();
        builder.add_to(["b@x.com"]).unwrap();
        builder.set_host_name("smtp.example.com").unwrap();
        builder
    }

    #[test]
    fn test_send_hands_message_to_transport() {
        let transport = Recording::default();
        let id = send(&mut builder(), &transport).unwrap();

        assert_eq!(id, "msg-1");
        let sent = transport.sent.borrow();
        assert_eq!(sent[0].0, "smtp.example.com");
        assert_eq!(sent[0].1.from().email(), "a@x.com");
    }

    #[test]
    fn test_send_without_host_keeps_builder_open() {
        let mut builder = MessageBuilder::new();
        builder.set_from("a@x.com").unwrap();
        builder.add_to(["b@x.com"]).unwrap();

        let transport = Recording::default();
        assert!(matches!(
            send(&mut builder, &transport),
            Err(MailError::MissingHostName)
        ));
        assert!(transport.sent.borrow().is_empty());
        assert!(builder.build().is_ok());
    }

    #[test]
    fn test_send_twice_fails() {
        let transport = Recording::default();
        let mut builder = builder();
        send(&mut builder, &transport).unwrap();

        assert!(matches!(
            send(&mut builder, &transport),
            Err(MailError::AlreadyBuilt)
        ));
    }
}

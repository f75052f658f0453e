//! Message builder state management

use std::time::{Duration, SystemTime};

use encoding_rs::Encoding;
use lettre::message::header::ContentType;
use tracing::{debug, trace, warn};

use crate::mail::address::{self, Address};
use crate::mail::error::{ArgumentMessages, MailError};
use crate::mail::message::BuiltMessage;
use crate::mail::session::{Credentials, MailSession, SessionSettings};

const TEXT_PLAIN: &str = "text/plain";

/// Represents the lifecycle state of a builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuilderState {
    /// Accepting changes, not yet built
    Open,
    /// A message has been produced; building again is refused
    Built,
}

/// Accumulates an outgoing email and its SMTP session settings.
///
/// Setters remain usable after [`MessageBuilder::build`]; they change the
/// builder but never the message that was already produced. Session settings
/// are frozen once [`MessageBuilder::open_session`] has succeeded.
#[derive(Debug)]
pub struct MessageBuilder {
    state: BuilderState,
    from: Option<Address>,
    to: Vec<Address>,
    cc: Vec<Address>,
    bcc: Vec<Address>,
    reply_to: Vec<Address>,
    /// Unique by case-insensitive name, in insertion order
    headers: Vec<(String, String)>,
    subject: Option<String>,
    content: Option<String>,
    content_type: Option<String>,
    charset: Option<&'static Encoding>,
    sent_date: SystemTime,
    settings: SessionSettings,
    session: Option<MailSession>,
}

impl MessageBuilder {
    /// Create an empty builder. The sent date defaults to now.
    pub fn new() -> Self {
        Self {
            state: BuilderState::Open,
            from: None,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            reply_to: Vec::new(),
            headers: Vec::new(),
            subject: None,
            content: None,
            content_type: None,
            charset: None,
            sent_date: SystemTime::now(),
            settings: SessionSettings::default(),
            session: None,
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    /// Add one or more To recipients
    pub fn add_to<I, S>(&mut self, addresses: I) -> Result<&mut Self, MailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = address::parse_all(addresses)?;
        trace!(count = parsed.len(), "adding To recipients");
        self.to.extend(parsed);
        Ok(self)
    }

    /// Add one or more Cc recipients
    pub fn add_cc<I, S>(&mut self, addresses: I) -> Result<&mut Self, MailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = address::parse_all(addresses)?;
        trace!(count = parsed.len(), "adding Cc recipients");
        self.cc.extend(parsed);
        Ok(self)
    }

    /// Add one or more Bcc recipients
    pub fn add_bcc<I, S>(&mut self, addresses: I) -> Result<&mut Self, MailError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = address::parse_all(addresses)?;
        trace!(count = parsed.len(), "adding Bcc recipients");
        self.bcc.extend(parsed);
        Ok(self)
    }

    pub fn add_to_named(&mut self, address: &str, name: &str) -> Result<&mut Self, MailError> {
        let address = Address::with_name(address, name)?;
        trace!(%address, "adding To recipient");
        self.to.push(address);
        Ok(self)
    }

    pub fn add_cc_named(&mut self, address: &str, name: &str) -> Result<&mut Self, MailError> {
        let address = Address::with_name(address, name)?;
        trace!(%address, "adding Cc recipient");
        self.cc.push(address);
        Ok(self)
    }

    pub fn add_bcc_named(&mut self, address: &str, name: &str) -> Result<&mut Self, MailError> {
        let address = Address::with_name(address, name)?;
        trace!(%address, "adding Bcc recipient");
        self.bcc.push(address);
        Ok(self)
    }

    /// Add a Reply-To address with a display name
    pub fn add_reply_to(&mut self, address: &str, name: &str) -> Result<&mut Self, MailError> {
        let address = Address::with_name(address, name)?;
        trace!(%address, "adding Reply-To");
        self.reply_to.push(address);
        Ok(self)
    }

    /// Replace all To recipients
    pub fn set_to(&mut self, addresses: Vec<Address>) -> Result<&mut Self, MailError> {
        self.to = non_empty(addresses)?;
        Ok(self)
    }

    /// Replace all Cc recipients
    pub fn set_cc(&mut self, addresses: Vec<Address>) -> Result<&mut Self, MailError> {
        self.cc = non_empty(addresses)?;
        Ok(self)
    }

    /// Replace all Bcc recipients
    pub fn set_bcc(&mut self, addresses: Vec<Address>) -> Result<&mut Self, MailError> {
        self.bcc = non_empty(addresses)?;
        Ok(self)
    }

    /// Replace all Reply-To addresses
    pub fn set_reply_to(&mut self, addresses: Vec<Address>) -> Result<&mut Self, MailError> {
        self.reply_to = non_empty(addresses)?;
        Ok(self)
    }

    /// Add a custom header. A header with the same name, compared without
    /// case, is overwritten in place.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<&mut Self, MailError> {
        check_header(name, value)?;
        trace!(name, "adding header");
        insert_header(&mut self.headers, name, value);
        Ok(self)
    }

    /// Replace all custom headers. Nothing changes if any entry is invalid.
    pub fn set_headers<I, K, V>(&mut self, headers: I) -> Result<&mut Self, MailError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut replacement = Vec::new();
        for (name, value) in headers {
            let (name, value) = (name.as_ref(), value.as_ref());
            check_header(name, value)?;
            insert_header(&mut replacement, name, value);
        }
        self.headers = replacement;
        Ok(self)
    }

    pub fn set_subject(&mut self, subject: impl Into<String>) -> &mut Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set a plain text body
    pub fn set_body(&mut self, content: impl Into<String>) -> &mut Self {
        self.content = Some(content.into());
        self.content_type = Some(TEXT_PLAIN.to_owned());
        self
    }

    /// Set a body with an explicit MIME content type
    pub fn set_content(
        &mut self,
        content: impl Into<String>,
        content_type: &str,
    ) -> Result<&mut Self, MailError> {
        let content_type = content_type.trim();
        ContentType::parse(content_type)
            .map_err(|_| MailError::InvalidContentType(content_type.to_owned()))?;

        self.content = Some(content.into());
        self.content_type = Some(content_type.to_owned());
        Ok(self)
    }

    /// Select the charset text bodies are encoded in
    pub fn set_charset(&mut self, label: &str) -> Result<&mut Self, MailError> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or(MailError::InvalidArgument(ArgumentMessages::UNSUPPORTED_CHARSET))?;
        self.charset = Some(encoding);
        Ok(self)
    }

    pub fn set_from(&mut self, address: &str) -> Result<&mut Self, MailError> {
        self.from = Some(Address::new(address)?);
        Ok(self)
    }

    pub fn set_from_named(&mut self, address: &str, name: &str) -> Result<&mut Self, MailError> {
        self.from = Some(Address::with_name(address, name)?);
        Ok(self)
    }

    pub fn set_sent_date(&mut self, date: SystemTime) -> &mut Self {
        self.sent_date = date;
        self
    }

    pub fn set_host_name(&mut self, host: impl Into<String>) -> Result<&mut Self, MailError> {
        self.settings_mut()?.host_name = Some(host.into());
        Ok(self)
    }

    pub fn set_smtp_port(&mut self, port: u16) -> Result<&mut Self, MailError> {
        self.settings_mut()?.smtp_port = port;
        Ok(self)
    }

    pub fn set_ssl_smtp_port(&mut self, port: u16) -> Result<&mut Self, MailError> {
        self.settings_mut()?.ssl_smtp_port = port;
        Ok(self)
    }

    /// Socket read timeout. Zero leaves it to the transport.
    pub fn set_socket_timeout(&mut self, timeout: Duration) -> Result<&mut Self, MailError> {
        self.settings_mut()?.socket_timeout = timeout;
        Ok(self)
    }

    /// Socket connect timeout. Zero leaves it to the transport.
    pub fn set_socket_connection_timeout(
        &mut self,
        timeout: Duration,
    ) -> Result<&mut Self, MailError> {
        self.settings_mut()?.socket_connection_timeout = timeout;
        Ok(self)
    }

    pub fn set_ssl_on_connect(&mut self, ssl: bool) -> Result<&mut Self, MailError> {
        self.settings_mut()?.ssl_on_connect = ssl;
        Ok(self)
    }

    pub fn set_start_tls_enabled(&mut self, enabled: bool) -> Result<&mut Self, MailError> {
        self.settings_mut()?.start_tls_enabled = enabled;
        Ok(self)
    }

    /// Requiring STARTTLS also enables it
    pub fn set_start_tls_required(&mut self, required: bool) -> Result<&mut Self, MailError> {
        let settings = self.settings_mut()?;
        settings.start_tls_required = required;
        settings.start_tls_enabled |= required;
        Ok(self)
    }

    pub fn set_ssl_check_server_identity(&mut self, check: bool) -> Result<&mut Self, MailError> {
        self.settings_mut()?.ssl_check_server_identity = check;
        Ok(self)
    }

    pub fn set_authentication(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<&mut Self, MailError> {
        self.settings_mut()?.credentials = Some(Credentials::new(username, password));
        Ok(self)
    }

    /// Envelope sender for bounces
    pub fn set_bounce_address(&mut self, address: &str) -> Result<&mut Self, MailError> {
        let bounce = Address::new(address)?;
        self.settings_mut()?.bounce_address = Some(bounce.email().to_owned());
        Ok(self)
    }

    pub fn set_debug(&mut self, debug: bool) -> Result<&mut Self, MailError> {
        self.settings_mut()?.debug = debug;
        Ok(self)
    }

    pub fn from_address(&self) -> Option<&Address> {
        self.from.as_ref()
    }

    pub fn to_addresses(&self) -> &[Address] {
        &self.to
    }

    pub fn cc_addresses(&self) -> &[Address] {
        &self.cc
    }

    pub fn bcc_addresses(&self) -> &[Address] {
        &self.bcc
    }

    pub fn reply_to_addresses(&self) -> &[Address] {
        &self.reply_to
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn charset(&self) -> Option<&'static str> {
        self.charset.map(Encoding::name)
    }

    pub fn sent_date(&self) -> SystemTime {
        self.sent_date
    }

    pub fn host_name(&self) -> Option<&str> {
        self.settings.host_name.as_deref()
    }

    pub fn smtp_port(&self) -> u16 {
        self.settings.smtp_port
    }

    pub fn ssl_smtp_port(&self) -> u16 {
        self.settings.ssl_smtp_port
    }

    pub fn socket_timeout(&self) -> Duration {
        self.settings.socket_timeout
    }

    pub fn socket_connection_timeout(&self) -> Duration {
        self.settings.socket_connection_timeout
    }

    pub fn is_ssl_on_connect(&self) -> bool {
        self.settings.ssl_on_connect
    }

    pub fn is_start_tls_enabled(&self) -> bool {
        self.settings.start_tls_enabled
    }

    pub fn is_start_tls_required(&self) -> bool {
        self.settings.start_tls_required
    }

    pub fn is_ssl_check_server_identity(&self) -> bool {
        self.settings.ssl_check_server_identity
    }

    pub fn bounce_address(&self) -> Option<&str> {
        self.settings.bounce_address.as_deref()
    }

    pub fn is_debug(&self) -> bool {
        self.settings.debug
    }

    /// Produce the message. Succeeds at most once per builder.
    pub fn build(&mut self) -> Result<BuiltMessage, MailError> {
        if self.state == BuilderState::Built {
            warn!("refusing to build an already built message");
            return Err(MailError::AlreadyBuilt);
        }

        let from = self.from.clone().ok_or(MailError::MissingFromAddress)?;

        if self.to.is_empty() && self.cc.is_empty() && self.bcc.is_empty() {
            return Err(MailError::MissingRecipient);
        }

        let message = BuiltMessage {
            from,
            to: self.to.clone(),
            cc: self.cc.clone(),
            bcc: self.bcc.clone(),
            reply_to: self.reply_to.clone(),
            headers: self.headers.clone(),
            subject: self.subject.clone(),
            content: self.content.clone().unwrap_or_default(),
            content_type: self
                .content_type
                .clone()
                .unwrap_or_else(|| TEXT_PLAIN.to_owned()),
            charset: self.charset,
            sent_date: self.sent_date,
        };

        self.state = BuilderState::Built;
        debug!(
            from = %message.from,
            recipients = message.all_recipients().count(),
            headers = message.headers.len(),
            "message built"
        );

        Ok(message)
    }

    /// Open the mail session. The first successful call freezes the session
    /// settings; later calls return the same session.
    pub fn open_session(&mut self) -> Result<MailSession, MailError> {
        if let Some(session) = &self.session {
            return Ok(session.clone());
        }

        let session = self.settings.open()?;
        debug!(
            host = session.host(),
            port = session.port(),
            ssl = session.ssl_on_connect(),
            "mail session opened"
        );

        self.session = Some(session.clone());
        Ok(session)
    }

    fn settings_mut(&mut self) -> Result<&mut SessionSettings, MailError> {
        if self.session.is_some() {
            return Err(MailError::SessionAlreadyInitialized);
        }
        Ok(&mut self.settings)
    }
}

impl Default for MessageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(addresses: Vec<Address>) -> Result<Vec<Address>, MailError> {
    if addresses.is_empty() {
        return Err(MailError::InvalidArgument(
            ArgumentMessages::EMPTY_ADDRESS_LIST,
        ));
    }
    Ok(addresses)
}

fn check_header(name: &str, value: &str) -> Result<(), MailError> {
    if name.is_empty() {
        return Err(MailError::InvalidArgument(
            ArgumentMessages::EMPTY_HEADER_NAME,
        ));
    }
    if value.is_empty() {
        return Err(MailError::InvalidArgument(
            ArgumentMessages::EMPTY_HEADER_VALUE,
        ));
    }
    Ok(())
}

fn insert_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers
        .iter_mut()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
    {
        Some(existing) => *existing = (name.to_owned(), value.to_owned()),
        None => headers.push((name.to_owned(), value.to_owned())),
    }
}

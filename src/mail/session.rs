//! SMTP session settings and the session descriptor handed to a transport

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::mail::error::MailError;

/// Socket factory selected when SSL is negotiated on connect
pub const SSL_SOCKET_FACTORY: &str = "javax.net.ssl.SSLSocketFactory";

/// Property keys understood by the transport
pub struct SessionProperties;

impl SessionProperties {
    pub const TRANSPORT_PROTOCOL: &'static str = "mail.transport.protocol";
    pub const HOST: &'static str = "mail.smtp.host";
    pub const PORT: &'static str = "mail.smtp.port";
    pub const DEBUG: &'static str = "mail.debug";
    pub const STARTTLS_ENABLE: &'static str = "mail.smtp.starttls.enable";
    pub const STARTTLS_REQUIRED: &'static str = "mail.smtp.starttls.required";
    pub const AUTH: &'static str = "mail.smtp.auth";
    pub const SOCKET_FACTORY_PORT: &'static str = "mail.smtp.socketFactory.port";
    pub const SOCKET_FACTORY_CLASS: &'static str = "mail.smtp.socketFactory.class";
    pub const SOCKET_FACTORY_FALLBACK: &'static str = "mail.smtp.socketFactory.fallback";
    pub const CHECK_SERVER_IDENTITY: &'static str = "mail.smtp.ssl.checkserveridentity";
    pub const FROM: &'static str = "mail.smtp.from";
    pub const TIMEOUT: &'static str = "mail.smtp.timeout";
    pub const CONNECTION_TIMEOUT: &'static str = "mail.smtp.connectiontimeout";
}

/// Default SMTP ports and timeouts
pub struct SessionDefaults;

impl SessionDefaults {
    pub const SMTP_PORT: u16 = 25;

    pub const SSL_SMTP_PORT: u16 = 465;

    /// Applies to both the socket I/O timeout and the connection timeout
    pub const SOCKET_TIMEOUT: Duration = Duration::from_millis(60_000);
}

/// SMTP login
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session configuration accumulated by a builder before the session opens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub host_name: Option<String>,
    pub smtp_port: u16,
    pub ssl_smtp_port: u16,
    pub ssl_on_connect: bool,
    pub start_tls_enabled: bool,
    pub start_tls_required: bool,
    pub ssl_check_server_identity: bool,
    pub socket_timeout: Duration,
    pub socket_connection_timeout: Duration,
    pub bounce_address: Option<String>,
    pub credentials: Option<Credentials>,
    pub debug: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            host_name: None,
            smtp_port: SessionDefaults::SMTP_PORT,
            ssl_smtp_port: SessionDefaults::SSL_SMTP_PORT,
            ssl_on_connect: false,
            start_tls_enabled: false,
            start_tls_required: false,
            ssl_check_server_identity: false,
            socket_timeout: SessionDefaults::SOCKET_TIMEOUT,
            socket_connection_timeout: SessionDefaults::SOCKET_TIMEOUT,
            bounce_address: None,
            credentials: None,
            debug: false,
        }
    }
}

impl SessionSettings {
    /// Resolve the settings into a session descriptor
    pub fn open(&self) -> Result<MailSession, MailError> {
        let host = self
            .host_name
            .as_deref()
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .ok_or(MailError::MissingHostName)?;

        let port = if self.ssl_on_connect {
            self.ssl_smtp_port
        } else {
            self.smtp_port
        };

        let mut properties = BTreeMap::new();
        properties.insert(SessionProperties::TRANSPORT_PROTOCOL, "smtp".to_owned());
        properties.insert(SessionProperties::HOST, host.to_owned());
        properties.insert(SessionProperties::PORT, port.to_string());
        properties.insert(SessionProperties::DEBUG, self.debug.to_string());
        properties.insert(
            SessionProperties::STARTTLS_ENABLE,
            self.start_tls_enabled.to_string(),
        );
        properties.insert(
            SessionProperties::STARTTLS_REQUIRED,
            self.start_tls_required.to_string(),
        );

        if self.credentials.is_some() {
            properties.insert(SessionProperties::AUTH, "true".to_owned());
        }

        let socket_factory = self.ssl_on_connect.then_some(SSL_SOCKET_FACTORY);
        if let Some(factory) = socket_factory {
            properties.insert(SessionProperties::SOCKET_FACTORY_PORT, port.to_string());
            properties.insert(SessionProperties::SOCKET_FACTORY_CLASS, factory.to_owned());
            properties.insert(SessionProperties::SOCKET_FACTORY_FALLBACK, "false".to_owned());
        }

        if (self.ssl_on_connect || self.start_tls_enabled) && self.ssl_check_server_identity {
            properties.insert(SessionProperties::CHECK_SERVER_IDENTITY, "true".to_owned());
        }

        if let Some(bounce) = &self.bounce_address {
            properties.insert(SessionProperties::FROM, bounce.clone());
        }

        if !self.socket_timeout.is_zero() {
            properties.insert(
                SessionProperties::TIMEOUT,
                self.socket_timeout.as_millis().to_string(),
            );
        }

        if !self.socket_connection_timeout.is_zero() {
            properties.insert(
                SessionProperties::CONNECTION_TIMEOUT,
                self.socket_connection_timeout.as_millis().to_string(),
            );
        }

        Ok(MailSession {
            host: host.to_owned(),
            port,
            socket_timeout: self.socket_timeout,
            socket_connection_timeout: self.socket_connection_timeout,
            ssl_on_connect: self.ssl_on_connect,
            start_tls_enabled: self.start_tls_enabled,
            start_tls_required: self.start_tls_required,
            socket_factory,
            bounce_address: self.bounce_address.clone(),
            credentials: self.credentials.clone(),
            properties,
        })
    }
}

/// Everything a transport needs to reach the SMTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSession {
    host: String,
    port: u16,
    socket_timeout: Duration,
    socket_connection_timeout: Duration,
    ssl_on_connect: bool,
    start_tls_enabled: bool,
    start_tls_required: bool,
    socket_factory: Option<&'static str>,
    bounce_address: Option<String>,
    credentials: Option<Credentials>,
    properties: BTreeMap<&'static str, String>,
}

impl MailSession {
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port to connect to; the SSL port when SSL is negotiated on connect
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn socket_timeout(&self) -> Duration {
        self.socket_timeout
    }

    pub fn socket_connection_timeout(&self) -> Duration {
        self.socket_connection_timeout
    }

    pub fn ssl_on_connect(&self) -> bool {
        self.ssl_on_connect
    }

    pub fn start_tls_enabled(&self) -> bool {
        self.start_tls_enabled
    }

    pub fn start_tls_required(&self) -> bool {
        self.start_tls_required
    }

    /// The SSL socket factory, present only with SSL on connect
    pub fn socket_factory(&self) -> Option<&'static str> {
        self.socket_factory
    }

    pub fn bounce_address(&self) -> Option<&str> {
        self.bounce_address.as_deref()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Look up a single property by key
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// All properties, ordered by key
    pub fn properties(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.properties
            .iter()
            .map(|(key, value)| (*key, value.as_str()))
    }
}

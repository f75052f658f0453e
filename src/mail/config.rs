//! TOML drafts: session settings plus message content

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::mail::builder::MessageBuilder;
use crate::mail::error::{ArgumentMessages, MailError};

/// The `[session]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    pub host_name: Option<String>,
    pub smtp_port: Option<u16>,
    pub ssl_smtp_port: Option<u16>,
    pub ssl_on_connect: Option<bool>,
    pub start_tls_enabled: Option<bool>,
    pub start_tls_required: Option<bool>,
    pub ssl_check_server_identity: Option<bool>,
    pub socket_timeout_ms: Option<u64>,
    pub socket_connection_timeout_ms: Option<u64>,
    pub bounce_address: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub debug: Option<bool>,
}

impl SessionConfig {
    /// Copy every configured value onto `builder`. Unset values keep the
    /// builder's defaults.
    pub fn apply_to(&self, builder: &mut MessageBuilder) -> Result<(), MailError> {
        if let Some(host) = &self.host_name {
            builder.set_host_name(host.clone())?;
        }
        if let Some(port) = self.smtp_port {
            builder.set_smtp_port(port)?;
        }
        if let Some(port) = self.ssl_smtp_port {
            builder.set_ssl_smtp_port(port)?;
        }
        if let Some(ms) = self.socket_timeout_ms {
            builder.set_socket_timeout(Duration::from_millis(ms))?;
        }
        if let Some(ms) = self.socket_connection_timeout_ms {
            builder.set_socket_connection_timeout(Duration::from_millis(ms))?;
        }
        if let Some(bounce) = &self.bounce_address {
            builder.set_bounce_address(bounce)?;
        }

        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                builder.set_authentication(username.clone(), password.clone())?;
            }
            (None, None) => {}
            _ => {
                return Err(MailError::InvalidArgument(
                    ArgumentMessages::PARTIAL_CREDENTIALS,
                ));
            }
        }

        if let Some(ssl) = self.ssl_on_connect {
            builder.set_ssl_on_connect(ssl)?;
        }
        if let Some(enabled) = self.start_tls_enabled {
            builder.set_start_tls_enabled(enabled)?;
        }
        if let Some(required) = self.start_tls_required {
            builder.set_start_tls_required(required)?;
        }
        if let Some(check) = self.ssl_check_server_identity {
            builder.set_ssl_check_server_identity(check)?;
        }
        if let Some(debug) = self.debug {
            builder.set_debug(debug)?;
        }

        Ok(())
    }
}

/// A recipient with an optional display name
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedAddress {
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The `[message]` table
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessageConfig {
    pub from: Option<String>,
    pub from_name: Option<String>,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub reply_to: Vec<NamedAddress>,
    pub subject: Option<String>,
    pub body: Option<String>,
    pub content_type: Option<String>,
    pub charset: Option<String>,
    pub headers: BTreeMap<String, String>,
}

impl MessageConfig {
    pub fn apply_to(&self, builder: &mut MessageBuilder) -> Result<(), MailError> {
        match (&self.from, &self.from_name) {
            (Some(from), Some(name)) => {
                builder.set_from_named(from, name)?;
            }
            (Some(from), None) => {
                builder.set_from(from)?;
            }
            (None, _) => {}
        }

        builder
            .add_to(&self.to)?
            .add_cc(&self.cc)?
            .add_bcc(&self.bcc)?;

        for reply_to in &self.reply_to {
            builder.add_reply_to(&reply_to.address, reply_to.name.as_deref().unwrap_or(""))?;
        }

        for (name, value) in &self.headers {
            builder.add_header(name, value)?;
        }

        if let Some(subject) = &self.subject {
            builder.set_subject(subject.clone());
        }

        if let Some(charset) = &self.charset {
            builder.set_charset(charset)?;
        }

        match (&self.body, &self.content_type) {
            (Some(body), Some(content_type)) => {
                builder.set_content(body.clone(), content_type)?;
            }
            (Some(body), None) => {
                builder.set_body(body.clone());
            }
            (None, _) => {}
        }

        Ok(())
    }
}

/// A complete message draft as read from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Draft {
    pub session: SessionConfig,
    pub message: MessageConfig,
}

impl Draft {
    /// Read and parse a draft file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MailError> {
        let raw = fs::read_to_string(path)?;
        raw.parse()
    }

    /// A fresh builder carrying everything in the draft
    pub fn to_builder(&self) -> Result<MessageBuilder, MailError> {
        let mut builder = MessageBuilder::new();
        self.session.apply_to(&mut builder)?;
        self.message.apply_to(&mut builder)?;
        Ok(builder)
    }

    /// Build the message and render it as RFC 5322 bytes. No mail session
    /// is opened, so the session table may be incomplete.
    pub fn render(&self) -> Result<Vec<u8>, MailError> {
        self.to_builder()?.build()?.formatted()
    }
}

impl FromStr for Draft {
    type Err = MailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_draft() {
        let draft: Draft = "".parse().unwrap();
        assert_eq!(draft, Draft::default());
    }

    #[test]
    fn test_parse_session() {
        let draft: Draft = r#"
            [session]
            host_name = "smtp.example.com"
            ssl_on_connect = true
            socket_timeout_ms = 5000
        "#
        .parse()
        .unwrap();

        assert_eq!(
            draft.session,
            SessionConfig {
                host_name: Some("smtp.example.com".to_owned()),
                ssl_on_connect: Some(true),
                socket_timeout_ms: Some(5000),
                ..SessionConfig::default()
            }
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = "[session]\nhostname = \"x\"".parse::<Draft>().unwrap_err();
        assert!(matches!(err, MailError::Config(_)));
    }

    #[test]
    fn test_unset_flags_keep_builder_values() {
        let mut builder = MessageBuilder::new();
        builder
            .set_ssl_on_connect(true)
            .unwrap()
            .set_start_tls_required(true)
            .unwrap()
            .set_ssl_check_server_identity(true)
            .unwrap()
            .set_debug(true)
            .unwrap();

        SessionConfig::default().apply_to(&mut builder).unwrap();

        assert!(builder.is_ssl_on_connect());
        assert!(builder.is_start_tls_enabled());
        assert!(builder.is_start_tls_required());
        assert!(builder.is_ssl_check_server_identity());
        assert!(builder.is_debug());

        let config = SessionConfig {
            ssl_on_connect: Some(false),
            debug: Some(false),
            ..SessionConfig::default()
        };
        config.apply_to(&mut builder).unwrap();
        assert!(!builder.is_ssl_on_connect());
        assert!(!builder.is_debug());
        assert!(builder.is_start_tls_required());
    }

    #[test]
    fn test_render_ignores_blank_host() {
        let draft: Draft = r#"
            [session]
            host_name = "   "

            [message]
            from = "a@x.com"
            to = ["b@x.com"]
            body = "hello"
        "#
        .parse()
        .unwrap();

        let text = String::from_utf8(draft.render().unwrap()).unwrap();
        assert!(text.contains("hello"));
        assert!(matches!(
            draft.to_builder().unwrap().open_session(),
            Err(MailError::MissingHostName)
        ));
    }

    #[test]
    fn test_partial_credentials() {
        let config = SessionConfig {
            username: Some("user".to_owned()),
            ..SessionConfig::default()
        };
        let err = config.apply_to(&mut MessageBuilder::new()).unwrap_err();
        assert_eq!(err.to_string(), "username and password must be set together");
    }

    #[test]
    fn test_message_config_applies() {
        let config = MessageConfig {
            from: Some("a@x.com".to_owned()),
            from_name: Some("Alice".to_owned()),
            to: vec!["b@x.com".to_owned()],
            reply_to: vec![NamedAddress {
                address: "e@x.com".to_owned(),
                name: Some("R".to_owned()),
            }],
            body: Some("<b>hi</b>".to_owned()),
            content_type: Some("text/html".to_owned()),
            ..MessageConfig::default()
        };

        let mut builder = MessageBuilder::new();
        config.apply_to(&mut builder).unwrap();

        let from = builder.from_address().unwrap();
        assert_eq!(from.email(), "a@x.com");
        assert_eq!(from.name(), Some("Alice"));
        assert_eq!(builder.reply_to_addresses()[0].name(), Some("R"));
        assert_eq!(builder.content_type(), Some("text/html"));
    }
}

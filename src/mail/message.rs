//! Immutable built messages and their RFC 5322 rendering

use std::time::SystemTime;

use encoding_rs::{Encoding, UTF_8};
use lettre::Message;
use lettre::message::header::{ContentType, HeaderName, HeaderValue};

use crate::mail::address::Address;
use crate::mail::error::MailError;

/// Headers written from builder fields; custom headers may not use them
pub const RESERVED_HEADERS: [&str; 10] = [
    "Date",
    "From",
    "To",
    "Cc",
    "Bcc",
    "Reply-To",
    "Subject",
    "Content-Type",
    "Content-Transfer-Encoding",
    "MIME-Version",
];

/// Which recipient list an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipientType {
    To,
    Cc,
    Bcc,
}

/// A snapshot of a builder at the moment it was built
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltMessage {
    pub(crate) from: Address,
    pub(crate) to: Vec<Address>,
    pub(crate) cc: Vec<Address>,
    pub(crate) bcc: Vec<Address>,
    pub(crate) reply_to: Vec<Address>,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) subject: Option<String>,
    pub(crate) content: String,
    pub(crate) content_type: String,
    pub(crate) charset: Option<&'static Encoding>,
    pub(crate) sent_date: SystemTime,
}

impl BuiltMessage {
    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn recipients(&self, kind: RecipientType) -> &[Address] {
        match kind {
            RecipientType::To => &self.to,
            RecipientType::Cc => &self.cc,
            RecipientType::Bcc => &self.bcc,
        }
    }

    /// Every envelope recipient: To, then Cc, then Bcc
    pub fn all_recipients(&self) -> impl Iterator<Item = &Address> {
        self.to.iter().chain(&self.cc).chain(&self.bcc)
    }

    pub fn reply_to(&self) -> &[Address] {
        &self.reply_to
    }

    /// Custom header value, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn charset(&self) -> Option<&'static str> {
        self.charset.map(Encoding::name)
    }

    pub fn sent_date(&self) -> SystemTime {
        self.sent_date
    }

    /// Render into a transport-ready lettre message
    pub fn to_message(&self) -> Result<Message, MailError> {
        let mut builder = Message::builder()
            .from(self.from.mailbox().clone())
            .date(self.sent_date);

        for address in &self.to {
            builder = builder.to(address.mailbox().clone());
        }
        for address in &self.cc {
            builder = builder.cc(address.mailbox().clone());
        }
        for address in &self.bcc {
            builder = builder.bcc(address.mailbox().clone());
        }
        for address in &self.reply_to {
            builder = builder.reply_to(address.mailbox().clone());
        }

        if let Some(subject) = &self.subject {
            builder = builder.subject(subject.clone());
        }

        for (name, value) in &self.headers {
            if is_reserved(name) {
                return Err(MailError::ReservedHeader(name.clone()));
            }
            let header = HeaderName::new_from_ascii(name.clone())
                .map_err(|_| MailError::InvalidHeaderName(name.clone()))?;
            builder = builder.raw_header(HeaderValue::new(header, value.clone()));
        }

        let (body, content_type) = self.encode_body()?;
        let content_type = ContentType::parse(&content_type)
            .map_err(|_| MailError::InvalidContentType(content_type.clone()))?;

        Ok(builder.header(content_type).body(body)?)
    }

    /// The message as RFC 5322 bytes. Bcc recipients are not written out.
    pub fn formatted(&self) -> Result<Vec<u8>, MailError> {
        Ok(self.to_message()?.formatted())
    }

    /// Encode text bodies in the selected charset and label the content type
    /// with the charset the bytes actually use. Other bodies pass through
    /// untouched.
    fn encode_body(&self) -> Result<(Vec<u8>, String), MailError> {
        if !is_text(&self.content_type) {
            return Ok((self.content.clone().into_bytes(), self.content_type.clone()));
        }

        let declared = charset_param(&self.content_type);
        let encoding = self
            .charset
            .or_else(|| declared.and_then(|label| Encoding::for_label(label.as_bytes())))
            .unwrap_or(UTF_8);

        let (bytes, used, had_errors) = encoding.encode(&self.content);
        if had_errors {
            return Err(MailError::UnencodableContent(encoding.name()));
        }

        Ok((
            bytes.into_owned(),
            with_charset(&self.content_type, used.name()),
        ))
    }
}

fn is_reserved(name: &str) -> bool {
    RESERVED_HEADERS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(name.trim()))
}

/// Replace any charset parameter with `charset`
fn with_charset(content_type: &str, charset: &str) -> String {
    let mut parts = content_type.split(';');
    let mut result = parts.next().unwrap_or_default().trim().to_owned();
    for param in parts {
        let is_charset = param
            .split_once('=')
            .is_some_and(|(key, _)| key.trim().eq_ignore_ascii_case("charset"));
        if !is_charset && !param.trim().is_empty() {
            result.push_str("; ");
            result.push_str(param.trim());
        }
    }
    result.push_str("; charset=");
    result.push_str(charset);
    result
}

fn is_text(content_type: &str) -> bool {
    content_type
        .get(..5)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("text/"))
}

fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

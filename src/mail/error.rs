//! Error types for message composition

use lettre::address::AddressError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid address: {address}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddressError,
    },

    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("From address required")]
    MissingFromAddress,

    #[error("At least one receiver address required")]
    MissingRecipient,

    #[error("Cannot find valid hostname for mail session")]
    MissingHostName,

    #[error("The MimeMessage is already built.")]
    AlreadyBuilt,

    #[error("The mail session is already initialized")]
    SessionAlreadyInitialized,

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(String),

    #[error("Header {0} is set from the message fields and can not be added")]
    ReservedHeader(String),

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Content can not be represented in charset {0}")]
    UnencodableContent(&'static str),

    #[error("Failed to render message: {0}")]
    Render(#[from] lettre::error::Error),

    #[error("Sending the email to the following server failed : {host}:{port}")]
    Delivery {
        host: String,
        port: u16,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Fixed messages carried by [`MailError::InvalidArgument`]
pub struct ArgumentMessages;

impl ArgumentMessages {
    pub const EMPTY_HEADER_NAME: &'static str = "name can not be null or empty";

    pub const EMPTY_HEADER_VALUE: &'static str = "value can not be null or empty";

    pub const EMPTY_ADDRESS_LIST: &'static str = "Address List provided was invalid";

    pub const UNSUPPORTED_CHARSET: &'static str = "Unsupported charset";

    pub const PARTIAL_CREDENTIALS: &'static str = "username and password must be set together";
}

impl MailError {
    /// Whether the error comes from checking caller input, as opposed to
    /// rendering, I/O or delivery.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            MailError::Render(_) | MailError::Delivery { .. } | MailError::Io(_)
        )
    }
}

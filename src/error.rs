//! Error types for dyn-ip-mailer.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dyn-ip-mailer.
pub type Result<T> = std::result::Result<T, MailerError>;

/// dyn-ip-mailer error types.
#[derive(Error, Debug)]
pub enum MailerError {
    /// Configuration could not be located or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required value is absent.
    #[error("value {0} not found in config")]
    MissingKey(&'static str),

    /// A required section is absent.
    #[error("section {0} not found in config")]
    MissingSection(&'static str),

    /// A required value is present but blank.
    #[error("value {0} is empty in config")]
    EmptyKey(&'static str),

    /// Network/HTTP error while fetching the current address.
    #[error("Network error: {0}")]
    Network(String),

    /// Cache file exists but could not be read or written.
    #[error("cache file {}: {source}", path.display())]
    Cache {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Mail could not be built or delivered.
    #[error("Mail error: {0}")]
    Mail(String),
}

impl From<toml::de::Error> for MailerError {
    fn from(e: toml::de::Error) -> Self {
        MailerError::Config(e.to_string())
    }
}

impl From<lettre::error::Error> for MailerError {
    fn from(e: lettre::error::Error) -> Self {
        MailerError::Mail(e.to_string())
    }
}

impl From<lettre::address::AddressError> for MailerError {
    fn from(e: lettre::address::AddressError) -> Self {
        MailerError::Mail(format!("invalid address: {}", e))
    }
}

impl From<lettre::transport::smtp::Error> for MailerError {
    fn from(e: lettre::transport::smtp::Error) -> Self {
        MailerError::Mail(e.to_string())
    }
}

//! Errors that can happen when talking to the AppointChed server

use std::fmt::{Display, Formatter};

/// Everything that can go wrong in this crate.
///
/// None of them is fatal: callers record the message and let the user trigger the action again.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// The request could not be sent, the server answered with a non-2xx status, or its body could not be decoded
    Network {
        /// HTTP status, if the server answered at all
        status: Option<u16>,
        message: String,
    },
    /// A local check refused the action before anything was sent
    Validation(String),
    /// The configured base URL (or a path built from it) is not a valid URL
    InvalidUrl(String),
}

impl Error {
    pub fn network<S: ToString>(message: S) -> Self {
        Error::Network { status: None, message: message.to_string() }
    }

    pub fn status<S: ToString>(status: u16, message: S) -> Self {
        Error::Network { status: Some(status), message: message.to_string() }
    }

    pub fn validation<S: ToString>(message: S) -> Self {
        Error::Validation(message.to_string())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network{ .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    /// The text a UI should show in a banner or an alert
    pub fn user_message(&self) -> String {
        match self {
            Error::Network{ message, .. } => message.clone(),
            Error::Validation(message) => message.clone(),
            Error::InvalidUrl(message) => format!("Invalid server address: {}", message),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Network{ status: Some(status), message } => write!(f, "HTTP {}: {}", status, message),
            Error::Network{ status: None, message } => write!(f, "Network failure: {}", message),
            Error::Validation(message) => write!(f, "Invalid input: {}", message),
            Error::InvalidUrl(message) => write!(f, "Invalid URL: {}", message),
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::network(format!("Unexpected response body: {}", err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

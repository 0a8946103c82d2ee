use std::fmt;

use animator_core::ProviderFault;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderErrorKind {
    MissingCredential,
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::MissingCredential => write!(f, "missing credential"),
            ProviderErrorKind::InvalidUrl => write!(f, "invalid url"),
            ProviderErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            ProviderErrorKind::Timeout => write!(f, "timeout"),
            ProviderErrorKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            ProviderErrorKind::Decode => write!(f, "undecodable response"),
            ProviderErrorKind::Network => write!(f, "network error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    /// Symbolic status from the provider's error envelope, when it sent one.
    pub remote_status: Option<String>,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            remote_status: None,
        }
    }

    pub fn with_remote_status(mut self, status: Option<String>) -> Self {
        self.remote_status = status;
        self
    }
}

impl From<ProviderError> for ProviderFault {
    fn from(err: ProviderError) -> Self {
        let (code, status) = match &err.kind {
            ProviderErrorKind::HttpStatus(code) => (Some(*code), err.remote_status.clone()),
            ProviderErrorKind::MissingCredential => (None, Some("UNAUTHENTICATED".to_string())),
            _ => (None, err.remote_status.clone()),
        };
        ProviderFault {
            code,
            status,
            message: err.message,
        }
    }
}

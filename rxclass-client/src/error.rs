use crate::deduplication::DeduplicationError;
use getset::Getters;
use std::fmt::Display;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    /// The request could not be issued at all
    Dispatch,
    Transport,
    Timeout,
    /// The service answered with a non-2xx status
    Status,
    /// The response body was not a valid RxClass document
    Malformed,
}

#[derive(Debug, Clone, Getters, thiserror::Error)]
#[get = "pub"]
#[error("{kind} error for rxcui '{rxcui}': {message}")]
pub struct Error {
    kind: ErrorKind,
    rxcui: String,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, rxcui: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            rxcui: rxcui.to_string(),
            message: message.into(),
        }
    }

    pub fn dispatch(rxcui: &str, cause: impl Display) -> Self {
        Self::new(ErrorKind::Dispatch, rxcui, cause.to_string())
    }

    pub fn transport(rxcui: &str, cause: impl Display) -> Self {
        Self::new(ErrorKind::Transport, rxcui, cause.to_string())
    }

    pub fn timeout(rxcui: &str, cause: impl Display) -> Self {
        Self::new(ErrorKind::Timeout, rxcui, cause.to_string())
    }

    pub fn status(rxcui: &str, status: impl Display) -> Self {
        Self::new(
            ErrorKind::Status,
            rxcui,
            format!("RxClass request failed with status: {}", status),
        )
    }

    pub fn malformed(rxcui: &str, cause: impl Display) -> Self {
        Self::new(ErrorKind::Malformed, rxcui, cause.to_string())
    }

    pub(crate) fn from_deduplication(rxcui: &str, err: DeduplicationError) -> Self {
        match err {
            DeduplicationError::Timeout => Self::timeout(rxcui, err),
            DeduplicationError::SenderDropped => Self::transport(rxcui, err),
        }
    }

    /// Whether this failure must abort the whole batch instead of just one position
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::Dispatch
    }
}

use thiserror::Error;

use crate::history::EntryId;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything a session operation can fail with.
#[derive(Error, Debug)]
pub enum Error {
    /// Draft text is empty or whitespace-only. Resolved locally.
    #[error("nothing to synthesize: draft text is empty")]
    Validation,
    /// A synthesis call is already outstanding for this session.
    #[error("a synthesis request is already in flight")]
    Busy,
    #[error("history entry {0} not found")]
    NotFound(EntryId),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl Error {
    /// Whether the failure deserves a visible notice. Validation and
    /// re-entrancy rejections are silent; service and payload failures are not.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::Codec(_))
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request to synthesis service failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("synthesis service timed out")]
    Timeout,
    #[error("synthesis service returned {status}: {detail}")]
    Status { status: u16, detail: String },
    #[error("malformed response from synthesis service: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e)
        }
    }
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("audio payload is not valid base64: {0}")]
    InvalidBase64(#[from] base64::DecodeError),
    #[error("audio payload decoded to zero bytes")]
    Empty,
}

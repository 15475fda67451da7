use thiserror::Error;

pub type AttestResult<T> = Result<T, AttestError>;

#[derive(Debug, Error)]
pub enum AttestError {
    #[error("malformed nonce: {0}")]
    MalformedNonce(String),

    #[error("attestation decode failed: {0}")]
    DecodeFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

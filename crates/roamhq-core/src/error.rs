//! Error types for `roamhq-core`.
//!
//! Token errors never include key material, secrets, or plaintext client
//! identifiers, only a description of which step failed.

/// Errors from minting a DNS client token.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// AES-128-GCM encryption failed.
    #[error("token encryption failed: {reason}")]
    Encryption { reason: String },
}

/// Errors from reading a DNS client token back.
///
/// Every variant means the same thing to a caller: the token is not valid
/// for this secret. The variants exist for diagnostics only.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The token is not valid base64 (after transport unescaping).
    #[error("token is not valid base64: {reason}")]
    InvalidEncoding { reason: String },

    /// The decoded token is too short to contain a nonce.
    #[error("token too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// AES-GCM tag verification failed (wrong secret, tampered, or truncated).
    #[error("token authentication failed")]
    Authentication,

    /// The decrypted client identifier is not valid UTF-8.
    #[error("token payload is not valid UTF-8")]
    InvalidUtf8,
}

//! DNS client token codec.
//!
//! A token lets an external DNS-update agent identify its client without the
//! console storing per-client credentials. The token is the client name
//! sealed under a key derived from the single operator secret.
//!
//! # Format
//!
//! - Key: `SHA-256(utf8(secret))[..16]`, used as an AES-128-GCM key. No salt,
//!   no stretching: encode and decode share nothing but the secret, and
//!   tokens already issued by the JavaScript console must keep decoding.
//! - Token: `base64(nonce (12 bytes) || ciphertext || tag (16 bytes))` with
//!   the standard alphabet and padding.
//! - Every encode draws a fresh 96-bit nonce from `OsRng`.
//!
//! # Transport
//!
//! [`TokenCodec::encode`] returns plain base64. Callers that put a token in a
//! URL query string use [`to_query_value`]. Decoding tolerates the legacy
//! `%2B` escaping and `+` characters that were turned into spaces by form
//! decoding, so every token ever handed to a DNS agent still works.

use std::borrow::Cow;
use std::fmt;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes128Gcm, Key, Nonce};
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{DecodeError, EncodeError};

/// AES-128 key length.
pub const KEY_LEN: usize = 16;

/// AES-GCM nonce length (96 bits).
pub const NONCE_LEN: usize = 12;

/// Standard base64 that encodes with padding and accepts it being absent.
const TOKEN_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A 128-bit token key that is zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct TokenKey([u8; KEY_LEN]);

impl TokenKey {
    /// Derive the token key from the operator secret.
    ///
    /// Deterministic: the same secret always yields the same key.
    #[must_use]
    pub fn derive(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&digest[..KEY_LEN]);
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    ///
    /// Use with care: the caller must not log or persist these bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Encrypts client names into tokens and back, under one derived key.
///
/// Holds only immutable key material, so a single codec can be shared
/// across request handlers behind an `Arc`.
#[derive(Clone)]
pub struct TokenCodec {
    key: TokenKey,
}

impl TokenCodec {
    /// Build a codec from the operator secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            key: TokenKey::derive(secret),
        }
    }

    /// Seal a client identifier into a token.
    ///
    /// Two calls with the same input produce different tokens.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Encryption`] if the AEAD operation fails. The
    /// content of `client` never causes an error.
    pub fn encode(&self, client: &str) -> Result<String, EncodeError> {
        let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(self.key.as_bytes()));
        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let ciphertext =
            cipher
                .encrypt(&nonce, client.as_bytes())
                .map_err(|e| EncodeError::Encryption {
                    reason: e.to_string(),
                })?;

        let mut combined = Vec::with_capacity(NONCE_LEN.saturating_add(ciphertext.len()));
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        Ok(TOKEN_BASE64.encode(combined))
    }

    /// Recover the client identifier from a token.
    ///
    /// # Errors
    ///
    /// - [`DecodeError::InvalidEncoding`] if the token is not base64.
    /// - [`DecodeError::TooShort`] if it cannot hold a nonce.
    /// - [`DecodeError::Authentication`] if the tag does not verify.
    /// - [`DecodeError::InvalidUtf8`] if the plaintext is not UTF-8.
    pub fn decode(&self, token: &str) -> Result<String, DecodeError> {
        let token = unescape_transport(token)?;
        let combined =
            TOKEN_BASE64
                .decode(token.as_bytes())
                .map_err(|e| DecodeError::InvalidEncoding {
                    reason: e.to_string(),
                })?;

        if combined.len() < NONCE_LEN {
            return Err(DecodeError::TooShort {
                expected: NONCE_LEN,
                actual: combined.len(),
            });
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(self.key.as_bytes()));
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| DecodeError::Authentication)?;

        String::from_utf8(plaintext).map_err(|_| DecodeError::InvalidUtf8)
    }
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Seal `client` under a key derived from `secret`.
///
/// # Errors
///
/// See [`TokenCodec::encode`].
pub fn encode(client: &str, secret: &str) -> Result<String, EncodeError> {
    TokenCodec::new(secret).encode(client)
}

/// Recover the client sealed in `token` with a key derived from `secret`.
///
/// # Errors
///
/// See [`TokenCodec::decode`].
pub fn decode(token: &str, secret: &str) -> Result<String, DecodeError> {
    TokenCodec::new(secret).decode(token)
}

/// Percent-encode a token for use as a `?token=` query value.
#[must_use]
pub fn to_query_value(token: &str) -> Cow<'_, str> {
    urlencoding::encode(token)
}

/// Undo whatever URL handling a token went through on its way back to us.
///
/// `%2B` (or a fully percent-encoded token) is decoded, and spaces left by
/// form decoding of a raw `+` are restored. Base64 never contains `%` or
/// spaces, so this cannot alter a clean token.
fn unescape_transport(token: &str) -> Result<Cow<'_, str>, DecodeError> {
    // Spaces are kept: a leading or trailing one may be a mangled `+`.
    let token = token.trim_matches(['\r', '\n', '\t']);
    let unescaped = if token.contains('%') {
        urlencoding::decode(token).map_err(|e| DecodeError::InvalidEncoding {
            reason: e.to_string(),
        })?
    } else {
        Cow::Borrowed(token)
    };

    if unescaped.contains(' ') {
        Ok(Cow::Owned(unescaped.replace(' ', "+")))
    } else {
        Ok(unescaped)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SECRET: &str = "dns-shared-secret";

    // Minted by the JavaScript console with `SECRET`.
    const LEGACY_BEG: &str = "OlhwkIMHgzv1uWCwHPaLex3gvMMaZbuw5EbQe8tRVw==";
    const LEGACY_PHILLIPISLAND: &str = "cI+TLMI/RKMybhG+cbQeiF0RDjGkPtW0fG82s7sn3w/0b98pORW7Sok=";

    #[test]
    fn derived_key_is_truncated_sha256() {
        let key = TokenKey::derive(SECRET);
        assert_eq!(
            key.as_bytes(),
            &[
                0x4d, 0xc9, 0x27, 0x82, 0x41, 0x3d, 0xc0, 0x0b, 0xaa, 0x21, 0x38, 0x2e, 0xe2,
                0x08, 0x64, 0xee
            ]
        );
    }

    #[test]
    fn key_derivation_is_deterministic() {
        let k1 = TokenKey::derive("same");
        let k2 = TokenKey::derive("same");
        assert_eq!(k1.as_bytes(), k2.as_bytes());
        assert_ne!(k1.as_bytes(), TokenKey::derive("other").as_bytes());
    }

    #[test]
    fn encode_decode_roundtrip() {
        for client in ["beg", "phillipisland", "", "client with spaces", "ünïcødé-客户"] {
            let token = encode(client, SECRET).unwrap();
            assert_eq!(decode(&token, SECRET).unwrap(), client);
        }
    }

    #[test]
    fn encode_uses_fresh_nonce() {
        let t1 = encode("mrt", SECRET).unwrap();
        let t2 = encode("mrt", SECRET).unwrap();
        assert_ne!(t1, t2);
        assert_eq!(decode(&t1, SECRET).unwrap(), "mrt");
        assert_eq!(decode(&t2, SECRET).unwrap(), "mrt");
    }

    #[test]
    fn token_layout_is_nonce_ciphertext_tag() {
        let token = encode("beg", SECRET).unwrap();
        let raw = TOKEN_BASE64.decode(token.as_bytes()).unwrap();
        assert_eq!(raw.len(), NONCE_LEN + 3 + 16);
    }

    #[test]
    fn wrong_secret_fails_authentication() {
        let token = encode("beg", SECRET).unwrap();
        let result = decode(&token, "another-secret");
        assert!(matches!(result, Err(DecodeError::Authentication)));
    }

    #[test]
    fn decodes_legacy_tokens() {
        assert_eq!(decode(LEGACY_BEG, SECRET).unwrap(), "beg");
        assert_eq!(decode(LEGACY_PHILLIPISLAND, SECRET).unwrap(), "phillipisland");
    }

    #[test]
    fn decodes_legacy_percent_escaped_plus() {
        let escaped = LEGACY_PHILLIPISLAND.replace('+', "%2B");
        assert_eq!(decode(&escaped, SECRET).unwrap(), "phillipisland");
    }

    #[test]
    fn decodes_plus_mangled_into_space() {
        let mangled = LEGACY_PHILLIPISLAND.replace('+', " ");
        assert_eq!(decode(&mangled, SECRET).unwrap(), "phillipisland");
    }

    #[test]
    fn decodes_query_value_encoding() {
        let token = encode("swanvalley", SECRET).unwrap();
        let query = to_query_value(&token);
        assert!(!query.contains('+'));
        assert!(!query.contains('/'));
        assert_eq!(decode(&query, SECRET).unwrap(), "swanvalley");
    }

    #[test]
    fn decodes_unpadded_token() {
        let unpadded = LEGACY_BEG.trim_end_matches('=');
        assert_eq!(decode(unpadded, SECRET).unwrap(), "beg");
    }

    #[test]
    fn invalid_base64_is_a_value_not_a_panic() {
        let result = decode("not-base64!!", SECRET);
        assert!(matches!(result, Err(DecodeError::InvalidEncoding { .. })));
    }

    #[test]
    fn short_token_fails() {
        let short = TOKEN_BASE64.encode([0u8; 8]);
        let result = decode(&short, SECRET);
        assert!(matches!(
            result,
            Err(DecodeError::TooShort {
                expected: 12,
                actual: 8
            })
        ));
    }

    #[test]
    fn nonce_only_token_fails_authentication() {
        let nonce_only = TOKEN_BASE64.encode([7u8; NONCE_LEN]);
        let result = decode(&nonce_only, SECRET);
        assert!(matches!(result, Err(DecodeError::Authentication)));
    }

    #[test]
    fn tampered_token_fails_authentication() {
        let token = encode("beg", SECRET).unwrap();
        let mut raw = TOKEN_BASE64.decode(token.as_bytes()).unwrap();
        if let Some(byte) = raw.get_mut(NONCE_LEN) {
            *byte ^= 0xFF;
        }
        let tampered = TOKEN_BASE64.encode(raw);
        assert!(matches!(
            decode(&tampered, SECRET),
            Err(DecodeError::Authentication)
        ));
    }

    #[test]
    fn non_utf8_plaintext_is_rejected() {
        let key = TokenKey::derive(SECRET);
        let cipher = Aes128Gcm::new(Key::<Aes128Gcm>::from_slice(key.as_bytes()));
        let nonce = Aes128Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher.encrypt(&nonce, [0xFFu8, 0xFE].as_slice()).unwrap();
        let mut combined = nonce.to_vec();
        combined.extend_from_slice(&ciphertext);

        let result = decode(&TOKEN_BASE64.encode(combined), SECRET);
        assert!(matches!(result, Err(DecodeError::InvalidUtf8)));
    }

    #[test]
    fn debug_output_redacts_key() {
        let codec = TokenCodec::new(SECRET);
        let key_debug = format!("{:?}", TokenKey::derive(SECRET));
        assert!(key_debug.contains("[REDACTED]"));
        assert!(!format!("{codec:?}").contains("4dc9"));
    }
}

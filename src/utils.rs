use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::AuthError;

pub const MIN_VERIFIER_LENGTH: usize = 43;
pub const MAX_VERIFIER_LENGTH: usize = 128;

// RFC 7636 unreserved characters
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// Generates a PKCE code verifier.
///
/// Characters are drawn uniformly from the RFC 7636 unreserved set with the
/// thread-local CSPRNG.
///
/// # Arguments
///
/// * `length` - Number of characters, between 43 and 128 inclusive
///
/// # Returns
///
/// The verifier, or [`AuthError::InvalidParameter`] when `length` is out of
/// range.
pub fn generate_code_verifier(length: usize) -> Result<String, AuthError> {
    if !(MIN_VERIFIER_LENGTH..=MAX_VERIFIER_LENGTH).contains(&length) {
        return Err(AuthError::InvalidParameter(format!(
            "code verifier length must be between {MIN_VERIFIER_LENGTH} and {MAX_VERIFIER_LENGTH}, got {length}"
        )));
    }

    let mut rng = rand::rng();
    Ok((0..length)
        .map(|_| VERIFIER_CHARSET[rng.random_range(0..VERIFIER_CHARSET.len())] as char)
        .collect())
}

/// Derives the S256 code challenge for a verifier.
///
/// # Arguments
///
/// * `verifier` - The verifier sent later with the code exchange
///
/// # Returns
///
/// The SHA-256 digest of the verifier's bytes, base64url-encoded without
/// padding. The same verifier always yields the same challenge.
pub fn generate_code_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Random anti-forgery token sent as the `state` parameter.
pub fn generate_state() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    URL_SAFE_NO_PAD.encode(bytes)
}
